//! Layout compilation and the per-frame sync pass
//!
//! A layout is compiled once into an ordered list of `(name, offset, writer)`
//! records. Each uniform gets the cheapest writer that handles it:
//!
//! 1. the first registered parser whose type and test accept the element
//! 2. the convention's direct writer for the type, when `size == 1`
//! 3. a freshly built strided array writer, when `size > 1`
//!
//! The compiled layout is then run against live values as often as needed.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::array_writers::{ArrayWriterFactory, Std140ArrayWriters, WgslArrayWriters};
use super::error::{LayoutError, SyncError};
use super::layout::{
    build_std140_layout, build_wgsl_layout, LayoutElement, UniformDeclaration, UniformLayout,
};
use super::metadata::{Std140SizeTable, WgslAlignSizeTable};
use super::parsers::UniformParsers;
use super::value::UniformSource;
use super::writers::{BaseWriters, UniformWriteFn};
use crate::config::SyncConfig;

/// Buffer layout rules a uniform block follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutConvention {
    /// 16-byte rows (GLSL std140 uniform blocks)
    #[default]
    Std140,
    /// Explicit per-type size and alignment (WGSL)
    Wgsl,
}

impl fmt::Display for LayoutConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutConvention::Std140 => f.write_str("std140"),
            LayoutConvention::Wgsl => f.write_str("wgsl"),
        }
    }
}

/// Which dispatch tier produced a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterTier {
    Parser(&'static str),
    Base,
    Array,
}

/// One compiled uniform
#[derive(Clone)]
pub struct CompiledEntry {
    pub name: String,
    /// Offset in floats (`byte_offset / 4`)
    pub offset: usize,
    pub tier: WriterTier,
    pub writer: UniformWriteFn,
}

impl fmt::Debug for CompiledEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledEntry")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Ordered write plan for one layout; immutable once built
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    convention: LayoutConvention,
    entries: Vec<CompiledEntry>,
}

impl CompiledLayout {
    pub fn convention(&self) -> LayoutConvention {
        self.convention
    }

    pub fn entries(&self) -> &[CompiledEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CompiledEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every uniform from `source` into `buffer`, in layout order
    ///
    /// `base_offset` (in floats) is added to every entry's offset. Stops at
    /// the first failing uniform.
    pub fn sync(
        &self,
        source: &dyn UniformSource,
        buffer: &mut [f32],
        base_offset: usize,
    ) -> Result<(), SyncError> {
        for entry in &self.entries {
            let value = source
                .get(&entry.name)
                .ok_or_else(|| SyncError::UniformNotFound {
                    name: entry.name.clone(),
                })?;
            (entry.writer)(&entry.name, &mut *buffer, base_offset + entry.offset, source, value)?;
        }
        Ok(())
    }

    /// Wrap the plan as a standalone callback
    pub fn into_sync_fn(self) -> UniformSyncFn {
        Arc::new(
            move |source: &dyn UniformSource, buffer: &mut [f32], base_offset: usize| {
                self.sync(source, buffer, base_offset)
            },
        )
    }
}

/// Callback copying live values into a buffer: `(source, buffer, base_offset)`
pub type UniformSyncFn =
    Arc<dyn Fn(&dyn UniformSource, &mut [f32], usize) -> Result<(), SyncError> + Send + Sync>;

/// Compile `layout` into a write plan
///
/// Fails on the first element no tier can write. Elements sharing a name
/// replace the earlier record in place.
pub fn compile_layout<'a>(
    layout: impl IntoIterator<Item = &'a LayoutElement>,
    parsers: &UniformParsers,
    base_writers: &BaseWriters,
    array_writers: &dyn ArrayWriterFactory,
) -> Result<CompiledLayout, LayoutError> {
    let convention = array_writers.convention();
    let mut entries: Vec<CompiledEntry> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for element in layout {
        if element.size == 0 {
            return Err(LayoutError::InvalidArraySize {
                name: element.name.clone(),
            });
        }

        let (tier, writer) = if let Some(parser) = parsers.find(element) {
            (WriterTier::Parser(parser.label), parser.write.clone())
        } else if element.size == 1 {
            let writer = base_writers
                .get(element.ty)
                .ok_or_else(|| LayoutError::UnsupportedType {
                    name: element.name.clone(),
                    ty: element.ty,
                    convention,
                })?;
            (WriterTier::Base, writer.clone())
        } else {
            (WriterTier::Array, array_writers.create(element)?)
        };

        log::trace!(
            "[UniformSync] {} ({}) @ {} -> {:?}",
            element.name,
            element.ty,
            element.byte_offset / 4,
            tier
        );

        let entry = CompiledEntry {
            name: element.name.clone(),
            offset: element.byte_offset / 4,
            tier,
            writer,
        };

        match index.get(&element.name) {
            Some(&slot) => {
                log::warn!(
                    "[UniformSync] Uniform {} appears twice in layout, keeping the later entry",
                    element.name
                );
                entries[slot] = entry;
            }
            None => {
                index.insert(element.name.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    log::debug!(
        "[UniformSync] Compiled {} uniforms ({})",
        entries.len(),
        convention
    );

    Ok(CompiledLayout {
        convention,
        entries,
    })
}

/// Sync callback for a fixed-row (std140) layout using the standard tables
pub fn generate_uniform_buffer_sync_std140(
    layout: &[LayoutElement],
    parsers: &UniformParsers,
) -> Result<UniformSyncFn, LayoutError> {
    let compiled = compile_layout(
        layout,
        parsers,
        &BaseWriters::std140(),
        &Std140ArrayWriters::new(Std140SizeTable::standard()),
    )?;
    Ok(compiled.into_sync_fn())
}

/// Sync callback for an explicit size/alignment (WGSL) layout using the
/// standard tables
pub fn generate_uniform_buffer_sync_wgsl(
    layout: &[LayoutElement],
    parsers: &UniformParsers,
) -> Result<UniformSyncFn, LayoutError> {
    let compiled = compile_layout(
        layout,
        parsers,
        &BaseWriters::wgsl(),
        &WgslArrayWriters::new(WgslAlignSizeTable::standard()),
    )?;
    Ok(compiled.into_sync_fn())
}

/// Configured front door: builds layouts and compiles them for one convention
#[derive(Debug, Clone)]
pub struct UniformSyncCompiler {
    config: SyncConfig,
    parsers: UniformParsers,
    base_writers: BaseWriters,
    std140_sizes: Std140SizeTable,
    wgsl_sizes: WgslAlignSizeTable,
}

impl UniformSyncCompiler {
    pub fn new(config: SyncConfig) -> Self {
        let base_writers = match config.convention {
            LayoutConvention::Std140 => BaseWriters::std140(),
            LayoutConvention::Wgsl => BaseWriters::wgsl(),
        };

        Self {
            config,
            parsers: UniformParsers::standard(),
            base_writers,
            std140_sizes: Std140SizeTable::standard(),
            wgsl_sizes: WgslAlignSizeTable::standard(),
        }
    }

    /// Replace the parser registry
    pub fn with_parsers(mut self, parsers: UniformParsers) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn with_std140_sizes(mut self, sizes: Std140SizeTable) -> Self {
        self.std140_sizes = sizes;
        self
    }

    pub fn with_wgsl_sizes(mut self, sizes: WgslAlignSizeTable) -> Self {
        self.wgsl_sizes = sizes;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn convention(&self) -> LayoutConvention {
        self.config.convention
    }

    /// Assign offsets to `decls` under the configured convention
    pub fn build_layout(&self, decls: &[UniformDeclaration]) -> Result<UniformLayout, LayoutError> {
        let layout = match self.config.convention {
            LayoutConvention::Std140 => build_std140_layout(decls, &self.std140_sizes)?,
            LayoutConvention::Wgsl => build_wgsl_layout(decls, &self.wgsl_sizes)?,
        };

        if self.config.log_layouts {
            log::debug!("[UniformSync] Layout:\n{}", layout.visualize());
        }

        Ok(layout)
    }

    pub fn compile<'a>(
        &self,
        layout: impl IntoIterator<Item = &'a LayoutElement>,
    ) -> Result<CompiledLayout, LayoutError> {
        let check = self.config.check_value_lengths;
        match self.config.convention {
            LayoutConvention::Std140 => {
                let factory = Std140ArrayWriters {
                    sizes: self.std140_sizes.clone(),
                    check_value_lengths: check,
                };
                compile_layout(layout, &self.parsers, &self.base_writers, &factory)
            }
            LayoutConvention::Wgsl => {
                let factory = WgslArrayWriters {
                    table: self.wgsl_sizes.clone(),
                    check_value_lengths: check,
                };
                compile_layout(layout, &self.parsers, &self.base_writers, &factory)
            }
        }
    }

    /// Build and compile in one step
    pub fn compile_declarations(
        &self,
        decls: &[UniformDeclaration],
    ) -> Result<(UniformLayout, CompiledLayout), LayoutError> {
        let layout = self.build_layout(decls)?;
        let compiled = self.compile(layout.elements())?;
        Ok((layout, compiled))
    }
}

impl Default for UniformSyncCompiler {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
