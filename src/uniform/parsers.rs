//! Specialised writers for values the generic writers cannot lay out
//!
//! Parsers are tried in registration order and the first one whose type tag
//! matches and whose test accepts the layout element wins.

use super::error::SyncError;
use super::layout::LayoutElement;
use super::metadata::STD140_ROW_FLOATS;
use super::types::UniformType;
use super::value::UniformValue;
use super::writers::{check_span, uniform_writer, write_run, write_slice, UniformWriteFn};

/// One registry entry
#[derive(Clone)]
pub struct UniformParser {
    pub label: &'static str,
    pub ty: UniformType,
    pub test: fn(&LayoutElement) -> bool,
    pub write: UniformWriteFn,
}

impl std::fmt::Debug for UniformParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniformParser")
            .field("label", &self.label)
            .field("ty", &self.ty)
            .finish()
    }
}

impl UniformParser {
    pub fn matches(&self, element: &LayoutElement) -> bool {
        self.ty == element.ty && (self.test)(element)
    }
}

/// Ordered parser registry
#[derive(Debug, Clone, Default)]
pub struct UniformParsers {
    entries: Vec<UniformParser>,
}

impl UniformParsers {
    /// Empty registry; every uniform falls through to the generic writers
    pub fn new() -> Self {
        Self::default()
    }

    /// Affine transforms, rects, points and colors
    pub fn standard() -> Self {
        let mut parsers = Self::new();
        parsers
            .register(UniformParser {
                label: "affine transform",
                ty: UniformType::MAT3X3_F32,
                test: |e| e.size == 1 && matches!(e.value, UniformValue::Affine { .. }),
                write: affine_writer(),
            })
            .register(UniformParser {
                label: "rect",
                ty: UniformType::VEC4_F32,
                test: |e| e.size == 1 && matches!(e.value, UniformValue::Rect { .. }),
                write: rect_writer(),
            })
            .register(UniformParser {
                label: "point",
                ty: UniformType::VEC2_F32,
                test: |e| e.size == 1 && matches!(e.value, UniformValue::Point { .. }),
                write: point_writer(),
            })
            .register(UniformParser {
                label: "color rgba",
                ty: UniformType::VEC4_F32,
                test: |e| e.size == 1 && matches!(e.value, UniformValue::Color { .. }),
                write: color_writer(4),
            })
            .register(UniformParser {
                label: "color rgb",
                ty: UniformType::VEC3_F32,
                test: |e| e.size == 1 && matches!(e.value, UniformValue::Color { .. }),
                write: color_writer(3),
            });
        parsers
    }

    pub fn register(&mut self, parser: UniformParser) -> &mut Self {
        self.entries.push(parser);
        self
    }

    /// First parser accepting `element`
    pub fn find(&self, element: &LayoutElement) -> Option<&UniformParser> {
        self.entries.iter().find(|parser| parser.matches(element))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn wrong_kind(name: &str, expected: &'static str) -> SyncError {
    SyncError::ValueKind {
        name: name.to_string(),
        expected,
    }
}

/// Affine transform as a 3x3 matrix with 4-float columns; the third row is
/// `(0, 0, 1)`
fn affine_writer() -> UniformWriteFn {
    uniform_writer(|name, buffer, offset, _source, value| {
        let UniformValue::Affine { a, b, c, d, tx, ty } = *value else {
            return Err(wrong_kind(name, "affine transform"));
        };
        let columns = [[a, b, 0.0], [c, d, 0.0], [tx, ty, 1.0]];
        check_span(name, buffer, offset, 2 * STD140_ROW_FLOATS + 3)?;
        for (i, column) in columns.iter().enumerate() {
            write_slice(name, buffer, offset + i * STD140_ROW_FLOATS, column)?;
        }
        Ok(())
    })
}

fn rect_writer() -> UniformWriteFn {
    uniform_writer(|name, buffer, offset, _source, value| {
        if !matches!(value, UniformValue::Rect { .. }) {
            return Err(wrong_kind(name, "rect"));
        }
        write_run(name, buffer, offset, 4, &mut value.iter(), value)
    })
}

fn point_writer() -> UniformWriteFn {
    uniform_writer(|name, buffer, offset, _source, value| {
        if !matches!(value, UniformValue::Point { .. }) {
            return Err(wrong_kind(name, "point"));
        }
        write_run(name, buffer, offset, 2, &mut value.iter(), value)
    })
}

/// `components` is 3 (rgb) or 4 (rgba)
fn color_writer(components: usize) -> UniformWriteFn {
    uniform_writer(move |name, buffer, offset, _source, value| {
        if !matches!(value, UniformValue::Color { .. }) {
            return Err(wrong_kind(name, "color"));
        }
        write_run(name, buffer, offset, components, &mut value.iter(), value)
    })
}
