//! # Object Repository
//!
//! Turns one server response into a consistent object graph. Every `(type, id)`
//! pair maps to exactly one [`Model`]: handles the caller already holds are
//! seeded in first and updated in place, everything else is created through the
//! registry. Once all resources are known, relations are linked in a second pass.

use crate::document::{Document, ResourceIdentifier, ResourceObject};
use crate::error::{OrmError, Result};
use crate::model::{Model, ModelType};
use crate::registry::TypeRegistry;
use crate::value::Scalar;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identity of a resource. Both parts must be strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub kind: String,
    pub id: String,
}

impl ObjectKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn from_parts(kind: &Scalar, id: &Scalar) -> Result<Self> {
        match (kind.as_str(), id.as_str()) {
            (Some(kind), Some(id)) => Ok(Self::new(kind, id)),
            _ => Err(OrmError::InvalidIdentifier {
                kind: kind.value().clone(),
                id: id.value().clone(),
            }),
        }
    }

    pub fn from_resource(resource: &ResourceObject) -> Result<Self> {
        Self::from_parts(&resource.kind, &resource.id)
    }

    pub fn from_identifier(identifier: &ResourceIdentifier) -> Result<Self> {
        Self::from_parts(&identifier.kind, &identifier.id)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

pub struct Repository {
    registry: Arc<TypeRegistry>,
    objects: IndexMap<ObjectKey, Model>,
}

impl Repository {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            objects: IndexMap::new(),
        }
    }

    /// Seeds an existing handle so that a matching resource updates it in place.
    pub fn add(&mut self, model: Model) -> Result<()> {
        let key = model.key()?;
        self.objects.insert(key, model);
        Ok(())
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&Model> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &IndexMap<ObjectKey, Model> {
        &self.objects
    }

    /// Absorbs a response: primary data first, then `included`, then links relations.
    ///
    /// Every resource is checked before any handle changes, so a document that
    /// fails (an unregistered type, a non-string id) leaves all models as they
    /// were. Returns the primary models in document order.
    pub fn update_from_document(&mut self, document: &Document) -> Result<Vec<Model>> {
        let primary = document.primary();
        let staged = primary
            .iter()
            .copied()
            .chain(document.included.iter())
            .map(|raw| {
                let key = ObjectKey::from_resource(raw)?;
                let model_type = match self.objects.get(&key) {
                    Some(existing) => existing.model_type().clone(),
                    None => self.registry.get_model(&key.kind)?,
                };
                Ok((key, raw, model_type))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut models: Vec<Model> = staged
            .into_iter()
            .map(|(key, raw, model_type)| self.apply(key, raw.clone(), &model_type))
            .collect();
        models.truncate(primary.len());
        self.populate_related();
        debug!(
            primary = models.len(),
            size = self.objects.len(),
            "Repository updated"
        );
        Ok(models)
    }

    /// Seeds `model` under `key`, whatever its own raw state says.
    pub fn insert(&mut self, key: ObjectKey, model: Model) {
        self.objects.insert(key, model);
    }

    /// Updates the model already holding this key, or creates one.
    pub fn update_or_create(&mut self, raw: ResourceObject) -> Result<Model> {
        let key = ObjectKey::from_resource(&raw)?;
        let model_type = match self.objects.get(&key) {
            Some(existing) => existing.model_type().clone(),
            None => self.registry.get_model(&key.kind)?,
        };
        Ok(self.apply(key, raw, &model_type))
    }

    fn apply(&mut self, key: ObjectKey, raw: ResourceObject, model_type: &Arc<ModelType>) -> Model {
        if let Some(existing) = self.objects.get(&key) {
            existing.set_raw_object(raw);
            return existing.clone();
        }
        let model = model_type.from_raw(raw);
        self.objects.insert(key, model.clone());
        model
    }

    /// Links every known model's relations against the other known models.
    pub fn populate_related(&self) {
        for model in self.objects.values() {
            model.resolve_relations(&self.objects);
        }
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.objects.keys()).finish()
    }
}
