//! Strided writers for uniform arrays
//!
//! Both conventions reduce an array to the same [`RowGeometry`]: a number of
//! rows, the floats copied per row and the padding skipped after each row.
//! They differ only in how that geometry is derived from type metadata.

use super::compiler::LayoutConvention;
use super::error::LayoutError;
use super::layout::LayoutElement;
use super::metadata::{Std140SizeTable, WgslAlignSizeTable, STD140_ROW_BYTES, STD140_ROW_FLOATS};
use super::types::{ScalarKind, UniformType};
use super::writers::{check_span, check_value_len, uniform_writer, write_run, UniformWriteFn};

/// Row layout of one array, computed once per layout element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGeometry {
    pub rows: usize,
    pub floats_per_row: usize,
    /// Floats skipped after every row
    pub row_padding: usize,
}

impl RowGeometry {
    /// Distance in floats between the starts of two rows
    pub fn stride(&self) -> usize {
        self.floats_per_row + self.row_padding
    }

    /// Components consumed from the live value
    pub fn value_len(&self) -> usize {
        self.rows * self.floats_per_row
    }

    /// Floats from the first written slot to the last, inclusive
    pub fn span(&self) -> usize {
        match self.rows {
            0 => 0,
            rows => (rows - 1) * self.stride() + self.floats_per_row,
        }
    }
}

/// Builds the writer for an array element (dispatch tier 3)
pub trait ArrayWriterFactory {
    fn convention(&self) -> LayoutConvention;

    fn create(&self, element: &LayoutElement) -> Result<UniformWriteFn, LayoutError>;
}

/// Factory backed by a closure, for conventions outside the two built in
pub struct FnArrayWriters<F> {
    pub convention: LayoutConvention,
    pub create: F,
}

impl<F> FnArrayWriters<F>
where
    F: Fn(&LayoutElement) -> Result<UniformWriteFn, LayoutError>,
{
    pub fn new(convention: LayoutConvention, create: F) -> Self {
        Self { convention, create }
    }
}

impl<F> ArrayWriterFactory for FnArrayWriters<F>
where
    F: Fn(&LayoutElement) -> Result<UniformWriteFn, LayoutError>,
{
    fn convention(&self) -> LayoutConvention {
        self.convention
    }

    fn create(&self, element: &LayoutElement) -> Result<UniformWriteFn, LayoutError> {
        (self.create)(element)
    }
}

fn unsupported(name: &str, ty: UniformType, convention: LayoutConvention) -> LayoutError {
    LayoutError::UnsupportedType {
        name: name.to_string(),
        ty,
        convention,
    }
}

/// Padding that brings `floats` up to the next 4-float boundary
pub fn std140_row_padding(floats: usize) -> usize {
    (STD140_ROW_FLOATS - floats % STD140_ROW_FLOATS) % STD140_ROW_FLOATS
}

/// Fixed-row geometry
///
/// One array entry spans `max(base_size / 16, 1)` rows and carries
/// `sample_len / size` components, spread evenly over its rows. Every row
/// is padded up to the next 16-byte boundary.
pub fn std140_row_geometry(
    element: &LayoutElement,
    sizes: &Std140SizeTable,
) -> Result<RowGeometry, LayoutError> {
    std140_array_geometry(
        &element.name,
        element.ty,
        element.size,
        element.value.flattened_len(),
        sizes,
    )
}

/// [`std140_row_geometry`] from the parts of a declaration
pub fn std140_array_geometry(
    name: &str,
    ty: UniformType,
    size: usize,
    sample_len: usize,
    sizes: &Std140SizeTable,
) -> Result<RowGeometry, LayoutError> {
    if size == 0 {
        return Err(LayoutError::InvalidArraySize {
            name: name.to_string(),
        });
    }

    let base_size = sizes
        .base_size(ty)
        .ok_or_else(|| unsupported(name, ty, LayoutConvention::Std140))?;
    let row_size = (base_size / STD140_ROW_BYTES).max(1);

    let inconsistent = || LayoutError::InconsistentSample {
        name: name.to_string(),
        sample_len,
        size,
    };

    if sample_len == 0 || sample_len % size != 0 {
        return Err(inconsistent());
    }
    let elements_per_entry = sample_len / size;

    if elements_per_entry % row_size != 0 {
        return Err(inconsistent());
    }
    let floats_per_row = elements_per_entry / row_size;

    Ok(RowGeometry {
        rows: size * row_size,
        floats_per_row,
        row_padding: std140_row_padding(floats_per_row),
    })
}

/// Explicit size/alignment geometry
///
/// Each entry is one row of `size / 4` floats followed by the gap between
/// the type's size and its alignment. A matrix entry is its columns, each a
/// row laid out like the matching `vecR<f32>`.
pub fn wgsl_row_geometry(
    element: &LayoutElement,
    table: &WgslAlignSizeTable,
) -> Result<RowGeometry, LayoutError> {
    wgsl_array_geometry(&element.name, element.ty, element.size, table)
}

/// [`wgsl_row_geometry`] from the parts of a declaration
pub fn wgsl_array_geometry(
    name: &str,
    ty: UniformType,
    size: usize,
    table: &WgslAlignSizeTable,
) -> Result<RowGeometry, LayoutError> {
    if size == 0 {
        return Err(LayoutError::InvalidArraySize {
            name: name.to_string(),
        });
    }

    let missing = |ty| unsupported(name, ty, LayoutConvention::Wgsl);
    let meta = table.get(ty).ok_or_else(|| missing(ty))?;

    let (rows, row) = match ty {
        UniformType::Matrix { columns, rows } => {
            let column_ty = UniformType::Vector(ScalarKind::F32, rows);
            let column = table.get(column_ty).ok_or_else(|| missing(column_ty))?;
            (size * columns as usize, column)
        }
        _ => (size, meta),
    };

    Ok(RowGeometry {
        rows,
        floats_per_row: row.size / 4,
        row_padding: row.size.abs_diff(row.align) / 4,
    })
}

/// Writer copying `geometry.rows` runs out of a flat live value
///
/// The destination span is checked up front so a failing write leaves the
/// buffer untouched. With `check_value_len` the live value length is checked
/// up front as well; otherwise a short value fails at the first row it
/// cannot fill.
pub fn strided_writer(geometry: RowGeometry, check_lengths: bool) -> UniformWriteFn {
    uniform_writer(move |name, buffer, offset, _source, value| {
        if check_lengths {
            check_value_len(name, value, geometry.value_len())?;
        }

        check_span(name, buffer, offset, geometry.span())?;

        let mut values = value.iter();
        let mut offset = offset;
        for _ in 0..geometry.rows {
            write_run(name, buffer, offset, geometry.floats_per_row, &mut values, value)?;
            offset += geometry.stride();
        }

        Ok(())
    })
}

/// Tier-3 factory for the fixed-row convention
#[derive(Debug, Clone)]
pub struct Std140ArrayWriters {
    pub sizes: Std140SizeTable,
    pub check_value_lengths: bool,
}

impl Std140ArrayWriters {
    pub fn new(sizes: Std140SizeTable) -> Self {
        Self {
            sizes,
            check_value_lengths: true,
        }
    }
}

impl ArrayWriterFactory for Std140ArrayWriters {
    fn convention(&self) -> LayoutConvention {
        LayoutConvention::Std140
    }

    fn create(&self, element: &LayoutElement) -> Result<UniformWriteFn, LayoutError> {
        let geometry = std140_row_geometry(element, &self.sizes)?;
        log::trace!("[UniformSync] {} std140 rows: {:?}", element.name, geometry);
        Ok(strided_writer(geometry, self.check_value_lengths))
    }
}

/// Tier-3 factory for the explicit size/alignment convention
#[derive(Debug, Clone)]
pub struct WgslArrayWriters {
    pub table: WgslAlignSizeTable,
    pub check_value_lengths: bool,
}

impl WgslArrayWriters {
    pub fn new(table: WgslAlignSizeTable) -> Self {
        Self {
            table,
            check_value_lengths: true,
        }
    }
}

impl ArrayWriterFactory for WgslArrayWriters {
    fn convention(&self) -> LayoutConvention {
        LayoutConvention::Wgsl
    }

    fn create(&self, element: &LayoutElement) -> Result<UniformWriteFn, LayoutError> {
        let geometry = wgsl_row_geometry(element, &self.table)?;
        log::trace!("[UniformSync] {} wgsl rows: {:?}", element.name, geometry);
        Ok(strided_writer(geometry, self.check_value_lengths))
    }
}
