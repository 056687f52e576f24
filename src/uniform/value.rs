//! CPU-side uniform values and the sources they are read from

use std::collections::HashMap;
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};

/// Current value of one uniform
///
/// Plain numeric data is either a single scalar, a flat sequence or a nested
/// sequence (one inner list per vector/matrix entry). The structured variants
/// are engine-side values that only specialised parsers know how to lay out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Scalar(f32),
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
    // Rect before Point so untagged deserialization does not stop at x/y
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Point { x: f32, y: f32 },
    Color { r: f32, g: f32, b: f32, a: f32 },
    /// 2D affine transform `| a c tx |  | b d ty |`
    Affine { a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32 },
}

impl UniformValue {
    /// Number of scalar components once flattened
    pub fn flattened_len(&self) -> usize {
        match self {
            UniformValue::Scalar(_) => 1,
            UniformValue::Flat(values) => values.len(),
            UniformValue::Nested(rows) => rows.iter().map(Vec::len).sum(),
            UniformValue::Point { .. } => 2,
            UniformValue::Rect { .. } | UniformValue::Color { .. } => 4,
            UniformValue::Affine { .. } => 6,
        }
    }

    /// Components in row-major order without allocating
    pub fn iter(&self) -> ValueIter<'_> {
        match self {
            UniformValue::Scalar(v) => ValueIter::Slice(std::slice::from_ref(v).iter()),
            UniformValue::Flat(values) => ValueIter::Slice(values.iter()),
            UniformValue::Nested(rows) => ValueIter::Nested(rows.iter().flatten()),
            UniformValue::Point { x, y } => ValueIter::fixed([*x, *y, 0.0, 0.0, 0.0, 0.0], 2),
            UniformValue::Rect { x, y, width, height } => {
                ValueIter::fixed([*x, *y, *width, *height, 0.0, 0.0], 4)
            }
            UniformValue::Color { r, g, b, a } => ValueIter::fixed([*r, *g, *b, *a, 0.0, 0.0], 4),
            UniformValue::Affine { a, b, c, d, tx, ty } => {
                ValueIter::fixed([*a, *b, *c, *d, *tx, *ty], 6)
            }
        }
    }

    pub fn flatten(&self) -> Vec<f32> {
        self.iter().collect()
    }

    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            UniformValue::Scalar(_) => "scalar",
            UniformValue::Flat(_) => "flat sequence",
            UniformValue::Nested(_) => "nested sequence",
            UniformValue::Point { .. } => "point",
            UniformValue::Rect { .. } => "rect",
            UniformValue::Color { .. } => "color",
            UniformValue::Affine { .. } => "affine transform",
        }
    }
}

/// Iterator over the flattened components of a [`UniformValue`]
#[derive(Debug, Clone)]
pub enum ValueIter<'a> {
    Slice(std::slice::Iter<'a, f32>),
    Nested(std::iter::Flatten<std::slice::Iter<'a, Vec<f32>>>),
    Fixed(std::iter::Take<std::array::IntoIter<f32, 6>>),
}

impl ValueIter<'_> {
    fn fixed(values: [f32; 6], len: usize) -> Self {
        ValueIter::Fixed(values.into_iter().take(len))
    }
}

impl Iterator for ValueIter<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self {
            ValueIter::Slice(iter) => iter.next().copied(),
            ValueIter::Nested(iter) => iter.next().copied(),
            ValueIter::Fixed(iter) => iter.next(),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Scalar(v)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(values: Vec<f32>) -> Self {
        UniformValue::Flat(values)
    }
}

impl From<&[f32]> for UniformValue {
    fn from(values: &[f32]) -> Self {
        UniformValue::Flat(values.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for UniformValue {
    fn from(values: [f32; N]) -> Self {
        UniformValue::Flat(values.to_vec())
    }
}

impl From<Vec<Vec<f32>>> for UniformValue {
    fn from(rows: Vec<Vec<f32>>) -> Self {
        UniformValue::Nested(rows)
    }
}

impl From<glam::Vec2> for UniformValue {
    fn from(v: glam::Vec2) -> Self {
        UniformValue::Flat(v.to_array().to_vec())
    }
}

impl From<glam::Vec3> for UniformValue {
    fn from(v: glam::Vec3) -> Self {
        UniformValue::Flat(v.to_array().to_vec())
    }
}

impl From<glam::Vec4> for UniformValue {
    fn from(v: glam::Vec4) -> Self {
        UniformValue::Flat(v.to_array().to_vec())
    }
}

impl From<glam::Mat2> for UniformValue {
    fn from(m: glam::Mat2) -> Self {
        UniformValue::Flat(m.to_cols_array().to_vec())
    }
}

impl From<glam::Mat3> for UniformValue {
    fn from(m: glam::Mat3) -> Self {
        UniformValue::Flat(m.to_cols_array().to_vec())
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Flat(m.to_cols_array().to_vec())
    }
}

/// Read-only lookup of live uniform values by name
pub trait UniformSource {
    fn get(&self, name: &str) -> Option<&UniformValue>;
}

impl<S: BuildHasher> UniformSource for HashMap<String, UniformValue, S> {
    fn get(&self, name: &str) -> Option<&UniformValue> {
        HashMap::get(self, name)
    }
}

impl<T: UniformSource + ?Sized> UniformSource for &T {
    fn get(&self, name: &str) -> Option<&UniformValue> {
        (**self).get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_len_matches_iter() {
        let values = [
            UniformValue::Scalar(1.0),
            UniformValue::Flat(vec![1.0, 2.0, 3.0]),
            UniformValue::Nested(vec![vec![1.0, 2.0], vec![3.0], vec![]]),
            UniformValue::Point { x: 1.0, y: 2.0 },
            UniformValue::Rect { x: 0.0, y: 0.0, width: 4.0, height: 2.0 },
            UniformValue::Color { r: 1.0, g: 0.5, b: 0.25, a: 1.0 },
            UniformValue::Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 3.0, ty: 4.0 },
        ];

        for value in &values {
            assert_eq!(value.iter().count(), value.flattened_len(), "{}", value.kind());
        }
    }

    #[test]
    fn test_nested_flattens_row_major() {
        let value = UniformValue::from(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(value.flatten(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_glam_matrices_are_column_major() {
        let m = glam::Mat2::from_cols(glam::Vec2::new(1.0, 2.0), glam::Vec2::new(3.0, 4.0));
        assert_eq!(UniformValue::from(m).flatten(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_hash_map_source() {
        let mut source: HashMap<String, UniformValue> = HashMap::new();
        source.insert("x".to_string(), UniformValue::Scalar(5.0));

        assert_eq!(UniformSource::get(&source, "x"), Some(&UniformValue::Scalar(5.0)));
        assert!(UniformSource::get(&source, "y").is_none());
    }
}
