//! CPU-side destination buffer for one uniform block

use super::compiler::CompiledLayout;
use super::error::SyncError;
use super::group::UniformGroup;
use super::layout::UniformLayout;
use super::value::UniformSource;

/// Zero-initialised float storage sized for a layout
///
/// The buffer never resizes; every write is bounds-checked against its
/// length. Upload [`UniformBuffer::as_bytes`] after a sync.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBuffer {
    data: Vec<f32>,
    synced_dirty_id: Option<u64>,
}

impl UniformBuffer {
    pub fn new(float_len: usize) -> Self {
        Self {
            data: vec![0.0; float_len],
            synced_dirty_id: None,
        }
    }

    pub fn for_layout(layout: &UniformLayout) -> Self {
        log::debug!(
            "[UniformBuffer] Creating buffer for {} uniforms ({} bytes)",
            layout.entries.len(),
            layout.size
        );
        Self::new(layout.float_len())
    }

    /// Run `compiled` against `source` from the start of the buffer
    pub fn sync(
        &mut self,
        compiled: &CompiledLayout,
        source: &dyn UniformSource,
    ) -> Result<(), SyncError> {
        compiled.sync(source, &mut self.data, 0)?;
        self.synced_dirty_id = None;
        Ok(())
    }

    /// Sync from a group only if it changed since the last group sync
    ///
    /// Returns whether a write happened.
    pub fn sync_group(
        &mut self,
        compiled: &CompiledLayout,
        group: &UniformGroup,
    ) -> Result<bool, SyncError> {
        if self.synced_dirty_id == Some(group.dirty_id()) {
            return Ok(false);
        }
        compiled.sync(group, &mut self.data, 0)?;
        self.synced_dirty_id = Some(group.dirty_id());
        Ok(true)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Raw bytes ready for a GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::compiler::UniformSyncCompiler;
    use crate::uniform::types::UniformType;

    #[test]
    fn test_buffer_matches_layout_size() {
        let group = UniformGroup::new()
            .with("x", UniformType::F32, 1.0f32)
            .with("v", UniformType::VEC3_F32, [1.0f32, 2.0, 3.0]);
        let compiler = UniformSyncCompiler::default();
        let layout = compiler.build_layout(group.declarations()).unwrap();

        let buffer = UniformBuffer::for_layout(&layout);

        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.byte_len(), 32);
        assert_eq!(buffer.as_bytes().len(), 32);
    }

    #[test]
    fn test_sync_group_skips_clean_groups() {
        let mut group = UniformGroup::new().with("x", UniformType::F32, 1.0f32);
        let compiler = UniformSyncCompiler::default();
        let (layout, compiled) = compiler.compile_declarations(group.declarations()).unwrap();
        let mut buffer = UniformBuffer::for_layout(&layout);

        assert!(buffer.sync_group(&compiled, &group).unwrap());
        assert!(!buffer.sync_group(&compiled, &group).unwrap());

        group.set("x", 4.0f32).unwrap();
        assert!(buffer.sync_group(&compiled, &group).unwrap());
        assert_eq!(buffer.as_slice()[0], 4.0);
    }

    #[test]
    fn test_as_bytes_matches_native_floats() {
        let mut buffer = UniformBuffer::new(1);
        buffer.as_mut_slice()[0] = 1.0;

        assert_eq!(buffer.as_bytes(), 1.0f32.to_ne_bytes().as_slice());
    }
}
