//! Type registry: JSON:API type tag → registered model type.

use crate::document::ResourceObject;
use crate::error::{OrmError, Result};
use crate::model::{Model, ModelType};
use crate::repository::ObjectKey;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<IndexMap<String, Arc<ModelType>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model type. Each type tag can be registered once.
    pub fn register(&self, model_type: Arc<ModelType>) -> Result<()> {
        let mut types = self.types.write();
        let type_tag = model_type.type_tag();
        if types.contains_key(type_tag) {
            return Err(OrmError::DuplicateType(type_tag.to_owned()));
        }
        info!(type_tag, fields = model_type.fields().len(), "Registered model type");
        types.insert(type_tag.to_owned(), model_type);
        Ok(())
    }

    pub fn get_model(&self, type_tag: &str) -> Result<Arc<ModelType>> {
        self.types
            .read()
            .get(type_tag)
            .cloned()
            .ok_or_else(|| OrmError::UnknownType(type_tag.to_owned()))
    }

    /// Wraps a raw resource in a fresh model of its registered type.
    pub fn get_orm_object(&self, raw: ResourceObject) -> Result<Model> {
        let key = ObjectKey::from_resource(&raw)?;
        Ok(self.get_model(&key.kind)?.from_raw(raw))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.types.read().contains_key(type_tag)
    }

    /// Registered type tags in registration order.
    pub fn type_tags(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ModelDecl;
    use std::sync::Weak;

    fn model_type(tag: &str) -> Arc<ModelType> {
        Arc::new(ModelType::new(
            ModelDecl::new(tag).attribute("name", "name"),
            Weak::new(),
        ))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TypeRegistry::new();
        registry.register(model_type("people")).unwrap();
        registry.register(model_type("articles")).unwrap();

        assert!(registry.contains("people"));
        assert_eq!(registry.type_tags(), ["people", "articles"]);
        assert_eq!(registry.get_model("articles").unwrap().type_tag(), "articles");
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let registry = TypeRegistry::new();
        registry.register(model_type("people")).unwrap();
        let err = registry.register(model_type("people")).unwrap_err();
        assert!(matches!(err, OrmError::DuplicateType(tag) if tag == "people"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.get_model("ghosts"),
            Err(OrmError::UnknownType(_))
        ));
        let raw = ResourceObject::new("ghosts").with_id("1");
        assert!(matches!(
            registry.get_orm_object(raw),
            Err(OrmError::UnknownType(_))
        ));
    }

    #[test]
    fn test_orm_object_wraps_raw_resource() {
        let registry = TypeRegistry::new();
        registry.register(model_type("people")).unwrap();

        let model = registry
            .get_orm_object(ResourceObject::new("people").with_id("9"))
            .unwrap();
        assert_eq!(model.id().as_deref(), Some("9"));
        assert!(!model.is_stub());
    }
}
