//! Per-type size metadata for both layout conventions
//!
//! Tables are plain immutable values handed to the compiler; the
//! `standard()` constructors return the sizes the shading languages define.

use rustc_hash::FxHashMap;

use super::types::{ScalarKind, UniformType};

// ===== Fixed-row (std140) convention =====

/// Width of one std140 row in bytes
pub const STD140_ROW_BYTES: usize = 16;

/// Floats per std140 row
pub const STD140_ROW_FLOATS: usize = STD140_ROW_BYTES / 4;

/// Final buffer sizes are rounded up to this many bytes
pub const UNIFORM_BUFFER_ALIGNMENT: usize = 16;

/// Base size in bytes of each type under the fixed-row convention
#[derive(Debug, Clone, Default)]
pub struct Std140SizeTable {
    sizes: FxHashMap<UniformType, usize>,
}

impl Std140SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalars, vectors and the square float matrices
    ///
    /// Matrix columns each occupy a full 16-byte row.
    pub fn standard() -> Self {
        let mut table = Self::new();

        for kind in [ScalarKind::F32, ScalarKind::I32, ScalarKind::U32] {
            table.insert(UniformType::Scalar(kind), 4);
            table.insert(UniformType::Vector(kind, 2), 8);
            table.insert(UniformType::Vector(kind, 3), 12);
            table.insert(UniformType::Vector(kind, 4), 16);
        }

        table.insert(UniformType::MAT2X2_F32, STD140_ROW_BYTES * 2);
        table.insert(UniformType::MAT3X3_F32, STD140_ROW_BYTES * 3);
        table.insert(UniformType::MAT4X4_F32, STD140_ROW_BYTES * 4);

        table
    }

    pub fn insert(&mut self, ty: UniformType, base_size: usize) -> &mut Self {
        self.sizes.insert(ty, base_size);
        self
    }

    pub fn base_size(&self, ty: UniformType) -> Option<usize> {
        self.sizes.get(&ty).copied()
    }
}

// ===== Explicit size/alignment (WGSL) convention =====

/// Storage size and alignment of a type, both in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignSize {
    pub align: usize,
    pub size: usize,
}

impl AlignSize {
    pub const fn new(align: usize, size: usize) -> Self {
        Self { align, size }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WgslAlignSizeTable {
    entries: FxHashMap<UniformType, AlignSize>,
}

impl WgslAlignSizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// WGSL host-shareable sizes for every 32-bit type
    pub fn standard() -> Self {
        let mut table = Self::new();

        for kind in [ScalarKind::F32, ScalarKind::I32, ScalarKind::U32] {
            table.insert(UniformType::Scalar(kind), AlignSize::new(4, 4));
            table.insert(UniformType::Vector(kind, 2), AlignSize::new(8, 8));
            table.insert(UniformType::Vector(kind, 3), AlignSize::new(16, 12));
            table.insert(UniformType::Vector(kind, 4), AlignSize::new(16, 16));
        }

        // matCxR is C columns of vecR
        for columns in 2..=4u8 {
            for rows in 2..=4u8 {
                let column = if rows == 2 { AlignSize::new(8, 8) } else { AlignSize::new(16, 16) };
                table.insert(
                    UniformType::Matrix { columns, rows },
                    AlignSize::new(column.align, column.size * columns as usize),
                );
            }
        }

        table
    }

    pub fn insert(&mut self, ty: UniformType, entry: AlignSize) -> &mut Self {
        self.entries.insert(ty, entry);
        self
    }

    pub fn get(&self, ty: UniformType) -> Option<AlignSize> {
        self.entries.get(&ty).copied()
    }
}

/// Round `offset` up to the next multiple of `alignment`
#[inline]
pub fn align_to(offset: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return offset;
    }
    offset.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std140_sizes() {
        let table = Std140SizeTable::standard();

        assert_eq!(table.base_size(UniformType::F32), Some(4));
        assert_eq!(table.base_size(UniformType::VEC3_F32), Some(12));
        assert_eq!(table.base_size(UniformType::MAT2X2_F32), Some(32));
        assert_eq!(table.base_size(UniformType::MAT3X3_F32), Some(48));
        assert_eq!(table.base_size(UniformType::MAT4X4_F32), Some(64));
        assert_eq!(table.base_size(UniformType::Matrix { columns: 4, rows: 2 }), None);
    }

    #[test]
    fn test_wgsl_sizes() {
        let table = WgslAlignSizeTable::standard();

        assert_eq!(table.get(UniformType::F32), Some(AlignSize::new(4, 4)));
        assert_eq!(table.get(UniformType::VEC3_F32), Some(AlignSize::new(16, 12)));
        assert_eq!(table.get(UniformType::MAT2X2_F32), Some(AlignSize::new(8, 16)));
        assert_eq!(table.get(UniformType::MAT3X3_F32), Some(AlignSize::new(16, 48)));
        assert_eq!(table.get(UniformType::Matrix { columns: 3, rows: 2 }), Some(AlignSize::new(8, 24)));
        assert_eq!(table.get(UniformType::Matrix { columns: 2, rows: 3 }), Some(AlignSize::new(16, 32)));
        assert_eq!(table.get(UniformType::MAT4X4_F32), Some(AlignSize::new(16, 64)));
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(5, 4), 8);
        assert_eq!(align_to(16, 16), 16);
        assert_eq!(align_to(17, 16), 32);
        assert_eq!(align_to(0, 16), 0);
        assert_eq!(align_to(7, 0), 7);
    }
}
