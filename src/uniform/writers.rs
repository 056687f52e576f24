//! Direct writers for single (non-array) uniforms
//!
//! Every writer shares one signature so the compiler can mix base writers,
//! specialised parsers and array writers freely. Writers only ever touch the
//! slots their value occupies; padding is left as the caller initialised it.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::SyncError;
use super::metadata::STD140_ROW_FLOATS;
use super::types::UniformType;
use super::value::{UniformSource, UniformValue, ValueIter};

/// Writes one uniform into the float buffer
///
/// Arguments are the uniform name, the destination buffer, the float offset
/// of the uniform inside the buffer, the whole value source and the value
/// looked up for this uniform.
pub type UniformWriteFn = Arc<
    dyn Fn(&str, &mut [f32], usize, &dyn UniformSource, &UniformValue) -> Result<(), SyncError>
        + Send
        + Sync,
>;

/// Box a closure as a [`UniformWriteFn`]
pub fn uniform_writer<F>(f: F) -> UniformWriteFn
where
    F: Fn(&str, &mut [f32], usize, &dyn UniformSource, &UniformValue) -> Result<(), SyncError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Copy `len` components from `values` into `buffer[offset..offset + len]`
///
/// Fails without writing when the run does not fit in the buffer, and with a
/// shape error when `values` runs dry.
pub(crate) fn write_run(
    name: &str,
    buffer: &mut [f32],
    offset: usize,
    len: usize,
    values: &mut ValueIter<'_>,
    value: &UniformValue,
) -> Result<(), SyncError> {
    let buffer_len = buffer.len();
    let dst = buffer
        .get_mut(offset..offset + len)
        .ok_or_else(|| SyncError::OutOfRange {
            name: name.to_string(),
            offset,
            len,
            buffer_len,
        })?;

    for slot in dst {
        *slot = values.next().ok_or_else(|| SyncError::ValueShape {
            name: name.to_string(),
            expected: len,
            actual: value.flattened_len(),
        })?;
    }

    Ok(())
}

/// Fail unless `buffer[offset..offset + len]` exists
pub(crate) fn check_span(
    name: &str,
    buffer: &[f32],
    offset: usize,
    len: usize,
) -> Result<(), SyncError> {
    if offset + len > buffer.len() {
        return Err(SyncError::OutOfRange {
            name: name.to_string(),
            offset,
            len,
            buffer_len: buffer.len(),
        });
    }
    Ok(())
}

/// Copy `values` into the buffer at `offset`, bounds-checked
pub(crate) fn write_slice(
    name: &str,
    buffer: &mut [f32],
    offset: usize,
    values: &[f32],
) -> Result<(), SyncError> {
    let buffer_len = buffer.len();
    let len = values.len();
    buffer
        .get_mut(offset..offset + len)
        .ok_or_else(|| SyncError::OutOfRange {
            name: name.to_string(),
            offset,
            len,
            buffer_len,
        })?
        .copy_from_slice(values);
    Ok(())
}

/// Check that `value` carries at least `expected` components
pub(crate) fn check_value_len(
    name: &str,
    value: &UniformValue,
    expected: usize,
) -> Result<(), SyncError> {
    let actual = value.flattened_len();
    if actual < expected {
        return Err(SyncError::ValueShape {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Writer for a scalar or vector of `components` floats
pub fn vector_writer(components: usize) -> UniformWriteFn {
    uniform_writer(move |name, buffer, offset, _source, value| {
        check_value_len(name, value, components)?;
        write_run(name, buffer, offset, components, &mut value.iter(), value)
    })
}

/// Writer for a column-major matrix whose columns start `column_stride`
/// floats apart
pub fn matrix_writer(columns: usize, rows: usize, column_stride: usize) -> UniformWriteFn {
    uniform_writer(move |name, buffer, offset, _source, value| {
        check_value_len(name, value, columns * rows)?;
        check_span(name, buffer, offset, (columns - 1) * column_stride + rows)?;
        let mut values = value.iter();
        for column in 0..columns {
            write_run(name, buffer, offset + column * column_stride, rows, &mut values, value)?;
        }
        Ok(())
    })
}

/// Type tag → direct writer, one table per layout convention
#[derive(Clone, Default)]
pub struct BaseWriters {
    writers: FxHashMap<UniformType, UniformWriteFn>,
}

impl std::fmt::Debug for BaseWriters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self.writers.keys().map(ToString::to_string).collect();
        types.sort();
        f.debug_struct("BaseWriters").field("types", &types).finish()
    }
}

impl BaseWriters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-row convention: matrix columns each take a full 4-float row
    pub fn std140() -> Self {
        let mut writers = Self::new();
        writers.insert_vectors();
        for n in 2..=4u8 {
            writers.insert(
                UniformType::Matrix { columns: n, rows: n },
                matrix_writer(n as usize, n as usize, STD140_ROW_FLOATS),
            );
        }
        writers
    }

    /// Explicit convention: `vec2` columns pack tightly, wider columns
    /// take 4 floats
    pub fn wgsl() -> Self {
        let mut writers = Self::new();
        writers.insert_vectors();
        for columns in 2..=4u8 {
            for rows in 2..=4u8 {
                let ty = UniformType::Matrix { columns, rows };
                let stride = if rows == 2 { 2 } else { 4 };
                writers.insert(ty, matrix_writer(ty.columns(), ty.rows(), stride));
            }
        }
        writers
    }

    fn insert_vectors(&mut self) {
        for ty in UniformType::all() {
            if !ty.is_matrix() {
                self.insert(ty, vector_writer(ty.components()));
            }
        }
    }

    pub fn insert(&mut self, ty: UniformType, writer: UniformWriteFn) -> &mut Self {
        self.writers.insert(ty, writer);
        self
    }

    pub fn get(&self, ty: UniformType) -> Option<&UniformWriteFn> {
        self.writers.get(&ty)
    }

    pub fn contains(&self, ty: UniformType) -> bool {
        self.writers.contains_key(&ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn run(writer: &UniformWriteFn, buffer: &mut [f32], offset: usize, value: UniformValue) -> Result<(), SyncError> {
        let source: HashMap<String, UniformValue> = HashMap::new();
        writer("u", buffer, offset, &source, &value)
    }

    #[test]
    fn test_vector_writer() {
        let writers = BaseWriters::std140();
        let mut buffer = [0.0f32; 8];

        run(writers.get(UniformType::VEC3_F32).unwrap(), &mut buffer, 4, UniformValue::Flat(vec![1.0, 2.0, 3.0])).unwrap();

        assert_eq!(buffer, [0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_std140_mat2_uses_full_rows() {
        let writers = BaseWriters::std140();
        let mut buffer = [-1.0f32; 8];

        run(writers.get(UniformType::MAT2X2_F32).unwrap(), &mut buffer, 0, UniformValue::Flat(vec![1.0, 2.0, 3.0, 4.0])).unwrap();

        assert_eq!(buffer, [1.0, 2.0, -1.0, -1.0, 3.0, 4.0, -1.0, -1.0]);
    }

    #[test]
    fn test_std140_mat3_rows() {
        let writers = BaseWriters::std140();
        let mut buffer = [0.0f32; 12];
        let value: Vec<f32> = (1..=9).map(|v| v as f32).collect();

        run(writers.get(UniformType::MAT3X3_F32).unwrap(), &mut buffer, 0, value.into()).unwrap();

        assert_eq!(buffer, [1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]);
    }

    #[test]
    fn test_wgsl_mat2_is_tight() {
        let writers = BaseWriters::wgsl();
        let mut buffer = [0.0f32; 4];

        run(writers.get(UniformType::MAT2X2_F32).unwrap(), &mut buffer, 0, UniformValue::Flat(vec![1.0, 2.0, 3.0, 4.0])).unwrap();

        assert_eq!(buffer, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_std140_has_no_rectangular_matrices() {
        assert!(!BaseWriters::std140().contains(UniformType::Matrix { columns: 4, rows: 3 }));
        assert!(BaseWriters::wgsl().contains(UniformType::Matrix { columns: 4, rows: 3 }));
    }

    #[test]
    fn test_out_of_range_write_fails_untouched() {
        let writers = BaseWriters::std140();
        let mut buffer = [0.0f32; 4];

        let err = run(writers.get(UniformType::VEC4_F32).unwrap(), &mut buffer, 2, UniformValue::Flat(vec![1.0; 4])).unwrap_err();

        assert!(matches!(err, SyncError::OutOfRange { offset: 2, len: 4, buffer_len: 4, .. }));
        assert_eq!(buffer, [0.0; 4]);
    }

    #[test]
    fn test_matrix_overrun_writes_no_column() {
        let writers = BaseWriters::std140();
        let mut buffer = [0.0f32; 10];
        let value: Vec<f32> = (1..=9).map(|v| v as f32).collect();

        let err = run(writers.get(UniformType::MAT3X3_F32).unwrap(), &mut buffer, 0, value.into()).unwrap_err();

        assert!(matches!(err, SyncError::OutOfRange { offset: 0, len: 11, buffer_len: 10, .. }));
        assert_eq!(buffer, [0.0; 10]);
    }

    #[test]
    fn test_short_value_is_a_shape_error() {
        let writers = BaseWriters::std140();
        let mut buffer = [0.0f32; 4];

        let err = run(writers.get(UniformType::VEC4_F32).unwrap(), &mut buffer, 0, UniformValue::Flat(vec![1.0, 2.0])).unwrap_err();

        assert!(matches!(err, SyncError::ValueShape { expected: 4, actual: 2, .. }));
    }
}
