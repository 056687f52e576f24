//! Uniform buffer layouts
//!
//! A layout places every declared uniform at a byte offset inside one
//! buffer. Layouts normally come from shader reflection, but the builders
//! here assign offsets the same way the shading languages do so a layout can
//! be produced straight from a list of declarations.

use std::fmt::Write as _;

use super::array_writers::{std140_array_geometry, wgsl_array_geometry};
use super::compiler::LayoutConvention;
use super::error::LayoutError;
use super::metadata::{
    align_to, Std140SizeTable, WgslAlignSizeTable, STD140_ROW_BYTES, UNIFORM_BUFFER_ALIGNMENT,
};
use super::types::UniformType;
use super::value::UniformValue;

/// A uniform as declared, before it has a place in a buffer
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDeclaration {
    pub name: String,
    pub ty: UniformType,
    /// 1 for a single value, N for an array of N
    pub size: usize,
    pub value: UniformValue,
}

impl UniformDeclaration {
    pub fn new(name: impl Into<String>, ty: UniformType, value: impl Into<UniformValue>) -> Self {
        Self {
            name: name.into(),
            ty,
            size: 1,
            value: value.into(),
        }
    }

    pub fn array(
        name: impl Into<String>,
        ty: UniformType,
        size: usize,
        value: impl Into<UniformValue>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            size,
            value: value.into(),
        }
    }
}

/// Where one named uniform lives in the destination buffer
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    pub name: String,
    /// Always a multiple of 4
    pub byte_offset: usize,
    pub ty: UniformType,
    pub size: usize,
    /// Sample value; only its flattened length is used, to size array rows
    pub value: UniformValue,
}

impl LayoutElement {
    pub fn new(
        name: impl Into<String>,
        byte_offset: usize,
        ty: UniformType,
        size: usize,
        value: impl Into<UniformValue>,
    ) -> Self {
        Self {
            name: name.into(),
            byte_offset,
            ty,
            size,
            value: value.into(),
        }
    }

    pub fn is_array(&self) -> bool {
        self.size > 1
    }
}

/// One placed uniform plus the number of bytes it spans
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub element: LayoutElement,
    pub byte_size: usize,
}

/// Complete layout of one uniform buffer
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    pub convention: LayoutConvention,
    pub entries: Vec<LayoutEntry>,
    /// Total size in bytes, rounded up to [`UNIFORM_BUFFER_ALIGNMENT`]
    pub size: usize,
}

impl UniformLayout {
    /// Elements in declaration order, ready for compilation
    pub fn elements(&self) -> impl Iterator<Item = &LayoutElement> {
        self.entries.iter().map(|entry| &entry.element)
    }

    /// Number of floats a destination buffer needs
    pub fn float_len(&self) -> usize {
        self.size / 4
    }

    /// Table of offsets, sizes and padding gaps
    pub fn visualize(&self) -> String {
        let mut viz = String::new();

        let _ = writeln!(viz, "=== Uniform Layout ({}, {} bytes) ===", self.convention, self.size);
        viz.push_str("Offset | Size  | Uniform\n");
        viz.push_str("-------|-------|------------------\n");

        let mut last_end = 0usize;

        for entry in &self.entries {
            let element = &entry.element;
            if element.byte_offset > last_end {
                let _ = writeln!(viz, "{:6} | {:5} | [padding]", last_end, element.byte_offset - last_end);
            }

            let ty = if element.is_array() {
                format!("array<{}, {}>", element.ty, element.size)
            } else {
                element.ty.to_string()
            };
            let _ = writeln!(
                viz,
                "{:6} | {:5} | {} : {}",
                element.byte_offset, entry.byte_size, element.name, ty
            );

            last_end = last_end.max(element.byte_offset + entry.byte_size);
        }

        if last_end < self.size {
            let _ = writeln!(viz, "{:6} | {:5} | [padding]", last_end, self.size - last_end);
        }

        viz
    }
}

fn check_array_size(decl: &UniformDeclaration) -> Result<(), LayoutError> {
    if decl.size == 0 {
        return Err(LayoutError::InvalidArraySize {
            name: decl.name.clone(),
        });
    }
    Ok(())
}

/// Assign fixed-row (std140) offsets to `decls`
///
/// Arrays take a full row per entry. A value that does not fit in what is
/// left of the current 16-byte row starts on the next row; anything else is
/// aligned to its own size.
pub fn build_std140_layout(
    decls: &[UniformDeclaration],
    sizes: &Std140SizeTable,
) -> Result<UniformLayout, LayoutError> {
    let mut entries = Vec::with_capacity(decls.len());
    let mut offset = 0usize;

    for decl in decls {
        check_array_size(decl)?;

        let mut size = sizes.base_size(decl.ty).ok_or_else(|| LayoutError::UnsupportedType {
            name: decl.name.clone(),
            ty: decl.ty,
            convention: LayoutConvention::Std140,
        })?;

        if decl.size > 1 {
            let geometry = std140_array_geometry(
                &decl.name,
                decl.ty,
                decl.size,
                decl.value.flattened_len(),
                sizes,
            )?;
            size = (size.max(STD140_ROW_BYTES) * decl.size)
                .max(align_to(geometry.span() * 4, STD140_ROW_BYTES));
        }

        // vec3 aligns like vec4
        let boundary = if size == 12 { 16 } else { size };
        let row_offset = offset % STD140_ROW_BYTES;

        if row_offset > 0 && STD140_ROW_BYTES - row_offset < boundary {
            offset += STD140_ROW_BYTES - row_offset;
        } else {
            offset += (size - row_offset % size) % size;
        }

        entries.push(LayoutEntry {
            element: LayoutElement::new(decl.name.clone(), offset, decl.ty, decl.size, decl.value.clone()),
            byte_size: size,
        });

        offset += size;
    }

    let layout = UniformLayout {
        convention: LayoutConvention::Std140,
        entries,
        size: align_to(offset, UNIFORM_BUFFER_ALIGNMENT),
    };

    log::debug!(
        "[UniformLayout] Built std140 layout: {} uniforms, {} bytes",
        layout.entries.len(),
        layout.size
    );

    Ok(layout)
}

/// Assign explicit size/alignment (WGSL) offsets to `decls`
///
/// Each value starts at the next multiple of its alignment; array entries are
/// spaced by the larger of size and alignment. An array is never given less
/// room than its row geometry writes, which only matters for custom tables
/// whose size exceeds the alignment.
pub fn build_wgsl_layout(
    decls: &[UniformDeclaration],
    table: &WgslAlignSizeTable,
) -> Result<UniformLayout, LayoutError> {
    let mut entries = Vec::with_capacity(decls.len());
    let mut offset = 0usize;

    for decl in decls {
        check_array_size(decl)?;

        let meta = table.get(decl.ty).ok_or_else(|| LayoutError::UnsupportedType {
            name: decl.name.clone(),
            ty: decl.ty,
            convention: LayoutConvention::Wgsl,
        })?;

        let mut size = meta.size;
        if decl.size > 1 {
            // Never smaller than what the array writer touches
            let geometry = wgsl_array_geometry(&decl.name, decl.ty, decl.size, table)?;
            size = (meta.size.max(meta.align) * decl.size)
                .max(align_to(geometry.span() * 4, meta.align));
        }

        offset = align_to(offset, meta.align);

        entries.push(LayoutEntry {
            element: LayoutElement::new(decl.name.clone(), offset, decl.ty, decl.size, decl.value.clone()),
            byte_size: size,
        });

        offset += size;
    }

    let layout = UniformLayout {
        convention: LayoutConvention::Wgsl,
        entries,
        size: align_to(offset, UNIFORM_BUFFER_ALIGNMENT),
    };

    log::debug!(
        "[UniformLayout] Built wgsl layout: {} uniforms, {} bytes",
        layout.entries.len(),
        layout.size
    );

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::metadata::AlignSize;

    fn offsets(layout: &UniformLayout) -> Vec<usize> {
        layout.elements().map(|e| e.byte_offset).collect()
    }

    #[test]
    fn test_std140_scalar_then_vec3_array() {
        let decls = vec![
            UniformDeclaration::new("x", UniformType::F32, 0.0f32),
            UniformDeclaration::array("y", UniformType::VEC3_F32, 2, vec![0.0f32; 6]),
        ];

        let layout = build_std140_layout(&decls, &Std140SizeTable::standard()).unwrap();

        assert_eq!(offsets(&layout), vec![0, 16]);
        assert_eq!(layout.entries[1].byte_size, 32);
        assert_eq!(layout.size, 48);
        assert_eq!(layout.float_len(), 12);
    }

    #[test]
    fn test_std140_packs_scalars_and_breaks_rows() {
        let decls = vec![
            UniformDeclaration::new("a", UniformType::F32, 0.0f32),
            UniformDeclaration::new("b", UniformType::F32, 0.0f32),
            UniformDeclaration::new("c", UniformType::VEC2_F32, [0.0f32; 2]),
            UniformDeclaration::new("d", UniformType::VEC3_F32, [0.0f32; 3]),
            UniformDeclaration::new("e", UniformType::F32, 0.0f32),
            UniformDeclaration::new("f", UniformType::MAT4X4_F32, [0.0f32; 16]),
        ];

        let layout = build_std140_layout(&decls, &Std140SizeTable::standard()).unwrap();

        // a:0 b:4 c:8 d:16 (new row) e:28 (fills vec3 slack) f:32
        assert_eq!(offsets(&layout), vec![0, 4, 8, 16, 28, 32]);
        assert_eq!(layout.size, 96);
    }

    #[test]
    fn test_wgsl_alignment() {
        let decls = vec![
            UniformDeclaration::new("a", UniformType::F32, 0.0f32),
            UniformDeclaration::new("b", UniformType::VEC3_F32, [0.0f32; 3]),
            UniformDeclaration::new("c", UniformType::F32, 0.0f32),
            UniformDeclaration::new("d", UniformType::VEC2_F32, [0.0f32; 2]),
            UniformDeclaration::array("e", UniformType::VEC3_F32, 2, vec![0.0f32; 6]),
        ];

        let layout = build_wgsl_layout(&decls, &WgslAlignSizeTable::standard()).unwrap();

        assert_eq!(offsets(&layout), vec![0, 16, 28, 32, 48]);
        assert_eq!(layout.entries[4].byte_size, 32);
        assert_eq!(layout.size, 80);
    }

    #[test]
    fn test_unsupported_type_is_reported() {
        let decls = vec![UniformDeclaration::new(
            "m",
            UniformType::Matrix { columns: 4, rows: 2 },
            [0.0f32; 8],
        )];

        let err = build_std140_layout(&decls, &Std140SizeTable::standard()).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedType { ref name, .. } if name == "m"));
    }

    #[test]
    fn test_zero_array_size_is_rejected() {
        let decls = vec![UniformDeclaration::array("z", UniformType::F32, 0, Vec::<f32>::new())];

        let err = build_wgsl_layout(&decls, &WgslAlignSizeTable::standard()).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidArraySize { .. }));
    }

    #[test]
    fn test_array_writers_stay_inside_reserved_bytes() {
        use crate::uniform::array_writers::{std140_row_geometry, wgsl_row_geometry};

        let std140 = Std140SizeTable::standard();
        let wgsl = WgslAlignSizeTable::standard();

        for ty in UniformType::all() {
            for size in [2, 3, 5] {
                let decls = vec![UniformDeclaration::array(
                    "arr",
                    ty,
                    size,
                    vec![0.0f32; size * ty.components()],
                )];

                if let Ok(layout) = build_std140_layout(&decls, &std140) {
                    let entry = &layout.entries[0];
                    let geometry = std140_row_geometry(&entry.element, &std140).unwrap();
                    assert!(geometry.span() * 4 <= entry.byte_size, "std140 {ty}[{size}]");
                }

                let layout = build_wgsl_layout(&decls, &wgsl).unwrap();
                let entry = &layout.entries[0];
                let geometry = wgsl_row_geometry(&entry.element, &wgsl).unwrap();
                assert!(geometry.span() * 4 <= entry.byte_size, "wgsl {ty}[{size}]");
            }
        }
    }

    #[test]
    fn test_wgsl_standard_array_strides() {
        let table = WgslAlignSizeTable::standard();
        let decls = vec![
            UniformDeclaration::array("m4", UniformType::MAT4X4_F32, 2, vec![0.0f32; 32]),
            UniformDeclaration::array("m3", UniformType::MAT3X3_F32, 2, vec![0.0f32; 18]),
            UniformDeclaration::array("m2", UniformType::MAT2X2_F32, 2, vec![0.0f32; 8]),
            UniformDeclaration::new("after", UniformType::VEC4_F32, [0.0f32; 4]),
        ];

        let layout = build_wgsl_layout(&decls, &table).unwrap();

        assert_eq!(offsets(&layout), vec![0, 128, 224, 256]);
        let sizes: Vec<usize> = layout.entries.iter().map(|e| e.byte_size).collect();
        assert_eq!(sizes, vec![128, 96, 32, 16]);
    }

    #[test]
    fn test_custom_wgsl_table_reserves_padded_rows() {
        let mut table = WgslAlignSizeTable::new();
        table.insert(UniformType::F32, AlignSize::new(4, 16));
        let decls = vec![
            UniformDeclaration::array("padded", UniformType::F32, 2, vec![0.0f32; 8]),
            UniformDeclaration::new("after", UniformType::F32, 0.0f32),
        ];

        let layout = build_wgsl_layout(&decls, &table).unwrap();

        // Two rows of 4 floats with 3 floats of padding between them
        assert_eq!(layout.entries[0].byte_size, 44);
        assert_eq!(offsets(&layout), vec![0, 44]);
    }

    #[test]
    fn test_visualize_shows_padding() {
        let decls = vec![
            UniformDeclaration::new("x", UniformType::F32, 0.0f32),
            UniformDeclaration::new("v", UniformType::VEC4_F32, [0.0f32; 4]),
        ];

        let layout = build_std140_layout(&decls, &Std140SizeTable::standard()).unwrap();
        let viz = layout.visualize();

        assert!(viz.contains("std140"));
        assert!(viz.contains("[padding]"));
        assert!(viz.contains("v : vec4<f32>"));
    }
}
