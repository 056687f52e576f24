//! Named uniform sets owned by a shader

use rustc_hash::FxHashMap;

use super::error::SyncError;
use super::layout::UniformDeclaration;
use super::types::UniformType;
use super::value::{UniformSource, UniformValue};

/// Ordered set of declared uniforms and their current values
///
/// `dirty_id` increases on every change so a buffer can skip syncing when
/// nothing moved since its last pass.
#[derive(Debug, Clone, Default)]
pub struct UniformGroup {
    uniforms: Vec<UniformDeclaration>,
    index: FxHashMap<String, usize>,
    dirty_id: u64,
}

impl UniformGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a single uniform; redeclaring a name replaces it
    pub fn with(
        mut self,
        name: impl Into<String>,
        ty: UniformType,
        value: impl Into<UniformValue>,
    ) -> Self {
        self.declare(UniformDeclaration::new(name, ty, value));
        self
    }

    /// Declare an array uniform of `size` entries
    pub fn with_array(
        mut self,
        name: impl Into<String>,
        ty: UniformType,
        size: usize,
        value: impl Into<UniformValue>,
    ) -> Self {
        self.declare(UniformDeclaration::array(name, ty, size, value));
        self
    }

    pub fn declare(&mut self, decl: UniformDeclaration) {
        match self.index.get(&decl.name) {
            Some(&slot) => self.uniforms[slot] = decl,
            None => {
                self.index.insert(decl.name.clone(), self.uniforms.len());
                self.uniforms.push(decl);
            }
        }
        self.dirty_id += 1;
    }

    /// Update the value of a declared uniform
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), SyncError> {
        let slot = *self
            .index
            .get(name)
            .ok_or_else(|| SyncError::UniformNotFound {
                name: name.to_string(),
            })?;
        self.uniforms[slot].value = value.into();
        self.dirty_id += 1;
        Ok(())
    }

    /// Mark the group changed without touching a value
    pub fn update(&mut self) {
        self.dirty_id += 1;
    }

    pub fn dirty_id(&self) -> u64 {
        self.dirty_id
    }

    pub fn declarations(&self) -> &[UniformDeclaration] {
        &self.uniforms
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }
}

impl UniformSource for UniformGroup {
    fn get(&self, name: &str) -> Option<&UniformValue> {
        self.index.get(name).map(|&slot| &self.uniforms[slot].value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let group = UniformGroup::new()
            .with("b", UniformType::F32, 1.0f32)
            .with("a", UniformType::VEC2_F32, [1.0f32, 2.0])
            .with("b", UniformType::F32, 3.0f32);

        let names: Vec<&str> = group.declarations().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(group.get("b"), Some(&UniformValue::Scalar(3.0)));
    }

    #[test]
    fn test_set_bumps_dirty_id() {
        let mut group = UniformGroup::new().with("x", UniformType::F32, 1.0f32);
        let before = group.dirty_id();

        group.set("x", 2.0f32).unwrap();

        assert!(group.dirty_id() > before);
        assert_eq!(group.get("x"), Some(&UniformValue::Scalar(2.0)));
    }

    #[test]
    fn test_set_unknown_uniform() {
        let mut group = UniformGroup::new();
        let err = group.set("missing", 1.0f32).unwrap_err();
        assert!(matches!(err, SyncError::UniformNotFound { .. }));
    }
}
