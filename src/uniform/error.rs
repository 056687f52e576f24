//! Errors raised while compiling a layout and while syncing values into it

use thiserror::Error;

use super::compiler::LayoutConvention;
use super::types::UniformType;

/// Failures detected once, when a layout is built or compiled
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Unknown uniform type tag: {type_name:?}")]
    UnknownType { type_name: String },

    #[error("Unsupported uniform type {ty} for uniform {name} ({convention} layout)")]
    UnsupportedType {
        name: String,
        ty: UniformType,
        convention: LayoutConvention,
    },

    #[error(
        "Sample value for uniform {name} has {sample_len} components, which does not split into {size} array entries"
    )]
    InconsistentSample {
        name: String,
        sample_len: usize,
        size: usize,
    },

    #[error("Uniform {name} declares an array size of zero")]
    InvalidArraySize { name: String },
}

/// Failures raised by a write pass; each pass reports its own error
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Uniform not found: {name}")]
    UniformNotFound { name: String },

    #[error(
        "Write for uniform {name} out of range: {len} floats at offset {offset}, buffer holds {buffer_len}"
    )]
    OutOfRange {
        name: String,
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    #[error("Value for uniform {name} has {actual} components, expected {expected}")]
    ValueShape {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Value for uniform {name} is not a {expected}")]
    ValueKind { name: String, expected: &'static str },
}
