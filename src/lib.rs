//! Uniform buffer layout compiler
//!
//! Turns a uniform block layout (std140 or WGSL) into a reusable write plan
//! that copies live uniform values into a padded float buffer.
//!
//! ```
//! use uniform_sync::{SyncConfig, UniformBuffer, UniformGroup, UniformSyncCompiler, UniformType};
//!
//! let group = UniformGroup::new()
//!     .with("x", UniformType::F32, 5.0f32)
//!     .with_array("y", UniformType::VEC3_F32, 2, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]);
//!
//! let compiler = UniformSyncCompiler::new(SyncConfig::default());
//! let (layout, compiled) = compiler.compile_declarations(group.declarations()).unwrap();
//!
//! let mut buffer = UniformBuffer::for_layout(&layout);
//! buffer.sync(&compiled, &group).unwrap();
//!
//! assert_eq!(&buffer.as_slice()[4..], &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
//! ```

pub mod config;
pub mod uniform;

pub use config::{ConfigError, SyncConfig};
pub use uniform::{
    compile_layout, generate_uniform_buffer_sync_std140, generate_uniform_buffer_sync_wgsl,
    CompiledLayout, LayoutConvention, LayoutElement, LayoutError, SyncError, UniformBuffer,
    UniformDeclaration, UniformGroup, UniformLayout, UniformParsers, UniformSource,
    UniformSyncCompiler, UniformSyncFn, UniformType, UniformValue,
};
