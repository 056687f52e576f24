//! Uniform buffer sync
//!
//! Compiles a uniform block layout once into a write plan, then copies live
//! CPU-side values into a flat float buffer with the padding the layout
//! convention requires.

pub mod array_writers;
pub mod buffer;
pub mod compiler;
pub mod error;
pub mod group;
pub mod layout;
pub mod metadata;
pub mod parsers;
pub mod types;
pub mod value;
pub mod writers;

pub use array_writers::{
    std140_array_geometry, std140_row_geometry, strided_writer, wgsl_array_geometry,
    wgsl_row_geometry, ArrayWriterFactory, FnArrayWriters, RowGeometry, Std140ArrayWriters,
    WgslArrayWriters,
};
pub use buffer::UniformBuffer;
pub use compiler::{
    compile_layout, generate_uniform_buffer_sync_std140, generate_uniform_buffer_sync_wgsl,
    CompiledEntry, CompiledLayout, LayoutConvention, UniformSyncCompiler, UniformSyncFn, WriterTier,
};
pub use error::{LayoutError, SyncError};
pub use group::UniformGroup;
pub use layout::{
    build_std140_layout, build_wgsl_layout, LayoutElement, LayoutEntry, UniformDeclaration,
    UniformLayout,
};
pub use metadata::{AlignSize, Std140SizeTable, WgslAlignSizeTable};
pub use parsers::{UniformParser, UniformParsers};
pub use types::{ScalarKind, UniformType};
pub use value::{UniformSource, UniformValue};
pub use writers::{uniform_writer, BaseWriters, UniformWriteFn};
