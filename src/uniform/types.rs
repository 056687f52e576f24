//! Shading-language type tags for uniforms
//!
//! Tags are spelled the WGSL way (`f32`, `vec3<f32>`, `mat4x4<f32>`) and are
//! shared by both layout conventions. Only 32-bit component types exist here
//! since every value ends up in a float buffer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LayoutError;

/// Component type of a scalar or vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    F32,
    I32,
    U32,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::F32 => "f32",
            ScalarKind::I32 => "i32",
            ScalarKind::U32 => "u32",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "f32" => Some(ScalarKind::F32),
            "i32" => Some(ScalarKind::I32),
            "u32" => Some(ScalarKind::U32),
            _ => None,
        }
    }
}

/// Type tag of a single uniform (or of one entry of a uniform array)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UniformType {
    Scalar(ScalarKind),
    /// `vecN<T>` with N in 2..=4
    Vector(ScalarKind, u8),
    /// `matCxR<f32>`, column-major
    Matrix { columns: u8, rows: u8 },
}

impl UniformType {
    pub const F32: Self = UniformType::Scalar(ScalarKind::F32);
    pub const I32: Self = UniformType::Scalar(ScalarKind::I32);
    pub const U32: Self = UniformType::Scalar(ScalarKind::U32);
    pub const VEC2_F32: Self = UniformType::Vector(ScalarKind::F32, 2);
    pub const VEC3_F32: Self = UniformType::Vector(ScalarKind::F32, 3);
    pub const VEC4_F32: Self = UniformType::Vector(ScalarKind::F32, 4);
    pub const MAT2X2_F32: Self = UniformType::Matrix { columns: 2, rows: 2 };
    pub const MAT3X3_F32: Self = UniformType::Matrix { columns: 3, rows: 3 };
    pub const MAT4X4_F32: Self = UniformType::Matrix { columns: 4, rows: 4 };

    /// Every tag this crate knows how to spell
    pub fn all() -> Vec<UniformType> {
        let kinds = [ScalarKind::F32, ScalarKind::I32, ScalarKind::U32];
        let mut all = Vec::with_capacity(24);
        for kind in kinds {
            all.push(UniformType::Scalar(kind));
        }
        for kind in kinds {
            for n in 2..=4 {
                all.push(UniformType::Vector(kind, n));
            }
        }
        for columns in 2..=4 {
            for rows in 2..=4 {
                all.push(UniformType::Matrix { columns, rows });
            }
        }
        all
    }

    /// Number of scalar components in one value of this type
    pub fn components(self) -> usize {
        match self {
            UniformType::Scalar(_) => 1,
            UniformType::Vector(_, n) => n as usize,
            UniformType::Matrix { columns, rows } => columns as usize * rows as usize,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, UniformType::Matrix { .. })
    }

    /// Column count; scalars and vectors are a single column
    pub fn columns(self) -> usize {
        match self {
            UniformType::Matrix { columns, .. } => columns as usize,
            _ => 1,
        }
    }

    /// Components per column
    pub fn rows(self) -> usize {
        match self {
            UniformType::Matrix { rows, .. } => rows as usize,
            other => other.components(),
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformType::Scalar(kind) => f.write_str(kind.as_str()),
            UniformType::Vector(kind, n) => write!(f, "vec{}<{}>", n, kind.as_str()),
            UniformType::Matrix { columns, rows } => write!(f, "mat{}x{}<f32>", columns, rows),
        }
    }
}

impl FromStr for UniformType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || LayoutError::UnknownType {
            type_name: s.to_string(),
        };
        let trimmed = s.trim();

        if let Some(kind) = ScalarKind::parse(trimmed) {
            return Ok(UniformType::Scalar(kind));
        }

        let (head, inner) = trimmed
            .strip_suffix('>')
            .and_then(|rest| rest.split_once('<'))
            .ok_or_else(unknown)?;
        let kind = ScalarKind::parse(inner.trim()).ok_or_else(unknown)?;
        let dimension = |c: u8| (b'2'..=b'4').contains(&c).then(|| c - b'0');

        if let Some(n) = head.strip_prefix("vec") {
            let n = match n.as_bytes() {
                [c] => dimension(*c),
                _ => None,
            }
            .ok_or_else(unknown)?;
            return Ok(UniformType::Vector(kind, n));
        }

        if let Some(dims) = head.strip_prefix("mat") {
            // Matrices are float-only
            if kind != ScalarKind::F32 {
                return Err(unknown());
            }
            return match dims.as_bytes() {
                [c, b'x', r] => match (dimension(*c), dimension(*r)) {
                    (Some(columns), Some(rows)) => Ok(UniformType::Matrix { columns, rows }),
                    _ => Err(unknown()),
                },
                _ => Err(unknown()),
            };
        }

        Err(unknown())
    }
}

impl TryFrom<String> for UniformType {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UniformType> for String {
    fn from(ty: UniformType) -> Self {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_agree() {
        for ty in UniformType::all() {
            let text = ty.to_string();
            assert_eq!(text.parse::<UniformType>().unwrap(), ty, "{}", text);
        }
    }

    #[test]
    fn test_parse_known_spellings() {
        assert_eq!("f32".parse::<UniformType>().unwrap(), UniformType::F32);
        assert_eq!(
            "vec3<f32>".parse::<UniformType>().unwrap(),
            UniformType::VEC3_F32
        );
        assert_eq!(
            "vec2<u32>".parse::<UniformType>().unwrap(),
            UniformType::Vector(ScalarKind::U32, 2)
        );
        assert_eq!(
            "mat3x2<f32>".parse::<UniformType>().unwrap(),
            UniformType::Matrix { columns: 3, rows: 2 }
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["f16", "vec5<f32>", "vec3<f16>", "mat4x4<i32>", "mat4<f32>", "float", ""] {
            let err = bad.parse::<UniformType>().unwrap_err();
            assert!(matches!(err, LayoutError::UnknownType { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_components() {
        assert_eq!(UniformType::F32.components(), 1);
        assert_eq!(UniformType::VEC3_F32.components(), 3);
        assert_eq!(UniformType::MAT3X3_F32.components(), 9);
        assert_eq!(UniformType::Matrix { columns: 4, rows: 2 }.components(), 8);
    }

    #[test]
    fn test_columns_and_rows() {
        let mat = UniformType::Matrix { columns: 4, rows: 2 };
        assert_eq!((mat.columns(), mat.rows()), (4, 2));
        assert_eq!((UniformType::VEC3_F32.columns(), UniformType::VEC3_F32.rows()), (1, 3));
    }
}
