//! # Models
//!
//! A [`ModelType`] is a registered type: a JSON:API type tag, its declared
//! fields and a handle back to the [`OrmApi`] it belongs to. A [`Model`] is one
//! resource of that type.
//!
//! ## Handles and identity
//!
//! `Model` is a cheap, cloneable handle. Clones share state, and two handles are
//! equal only if they are the same object. Within one response each
//! `(type, id)` pair resolves to a single object, so a person referenced from
//! an article and from a comment is the same handle in both places.
//!
//! ## Stubs
//!
//! A model built from an id alone is a *stub*. The first attribute or relation
//! access on a stub fetches it from the server. `id()`, `set_id()` and
//! `type_tag()` never trigger a fetch.
//!
//! ## Cycles
//!
//! Resolved relations hold strong handles, so a graph with cycles (an article
//! whose author lists the article) keeps itself alive. Call
//! [`Model::forget_relations`] on models of such graphs when they are no longer
//! needed.

use crate::client::Endpoint;
use crate::document::{Cardinality, Document, Relationship, ResourceIdentifier, ResourceObject};
use crate::error::{OrmError, Result};
use crate::fields::{FieldDescriptor, ModelDecl, RelationField};
use crate::orm::OrmApi;
use crate::repository::ObjectKey;
use crate::value::{Alternative, List, Nullable, Scalar};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

// =============================================================================
// Model type
// =============================================================================

/// A registered model type.
pub struct ModelType {
    type_tag: String,
    fields: IndexMap<String, FieldDescriptor>,
    orm: Weak<OrmApi>,
}

impl ModelType {
    pub(crate) fn new(decl: ModelDecl, orm: Weak<OrmApi>) -> Self {
        Self {
            type_tag: decl.type_tag().to_owned(),
            fields: decl.fields().clone(),
            orm,
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Result<&FieldDescriptor> {
        self.fields.get(name).ok_or_else(|| OrmError::UnknownField {
            model: self.type_tag.clone(),
            field: name.to_owned(),
        })
    }

    /// The API this type was registered with.
    pub fn orm(&self) -> Result<Arc<OrmApi>> {
        self.orm
            .upgrade()
            .ok_or_else(|| OrmError::Detached(self.type_tag.clone()))
    }

    /// A new, unsaved model with no id.
    pub fn new_instance(self: &Arc<Self>) -> Model {
        Model::new(self.clone(), ResourceObject::new(self.type_tag.as_str()), true)
    }

    /// A stub for the resource with this id; fetched on first field access.
    pub fn from_id(self: &Arc<Self>, id: impl Into<String>) -> Model {
        let raw = ResourceObject::new(self.type_tag.as_str()).with_id(Value::String(id.into()));
        Model::new(self.clone(), raw, false)
    }

    /// A model wrapping an already fetched resource.
    pub fn from_raw(self: &Arc<Self>, raw: ResourceObject) -> Model {
        Model::new(self.clone(), raw, true)
    }

    pub fn collection_endpoint(&self) -> Result<Endpoint> {
        Ok(self.orm()?.endpoint(self.type_tag.as_str()))
    }

    /// Fetches the collection of this type.
    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag))]
    pub async fn get_list(self: &Arc<Self>) -> Result<Vec<Model>> {
        let orm = self.orm()?;
        let response = orm.endpoint(self.type_tag.as_str()).get().await?;
        let models = orm.repository().update_from_document(&response.content)?;
        info!(size = models.len(), "Fetched collection");
        Ok(models)
    }

    /// Builds the object graph of a document and returns its first primary model.
    pub fn from_document(self: &Arc<Self>, document: &Document) -> Result<Option<Model>> {
        let mut repository = self.orm()?.repository();
        Ok(repository
            .update_from_document(document)?
            .into_iter()
            .next())
    }

    /// Whether the server knows a resource with this id.
    ///
    /// Any 4xx answer means no; other failures are passed on.
    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag))]
    pub async fn exists(self: &Arc<Self>, id: &str) -> Result<bool> {
        match self.from_id(id).refresh().await {
            Ok(()) => Ok(true),
            Err(e) if e.is_client_error() => {
                debug!(error = %e, "Resource not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("type_tag", &self.type_tag)
            .field("fields", &self.fields)
            .finish()
    }
}

// =============================================================================
// Model
// =============================================================================

/// A resolved relation value.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    One(Option<Model>),
    Many(Vec<Model>),
}

impl RelationValue {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationValue::One(_) => Cardinality::ToOne,
            RelationValue::Many(_) => Cardinality::ToMany,
        }
    }

    /// The handles in this value, in order.
    pub fn models(&self) -> Vec<Model> {
        match self {
            RelationValue::One(target) => target.iter().cloned().collect(),
            RelationValue::Many(targets) => targets.clone(),
        }
    }
}

struct ModelState {
    raw: ResourceObject,
    populated: bool,
    relations: HashMap<String, RelationValue>,
}

/// Shared handle on one resource.
#[derive(Clone)]
pub struct Model {
    model_type: Arc<ModelType>,
    state: Arc<Mutex<ModelState>>,
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Model")
            .field("type", &self.model_type.type_tag)
            .field("id", state.raw.id.value())
            .field("stub", &!state.populated)
            .finish()
    }
}

impl Model {
    fn new(model_type: Arc<ModelType>, raw: ResourceObject, populated: bool) -> Self {
        Self {
            model_type,
            state: Arc::new(Mutex::new(ModelState {
                raw,
                populated,
                relations: HashMap::new(),
            })),
        }
    }

    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    pub fn type_tag(&self) -> &str {
        self.model_type.type_tag()
    }

    pub fn id(&self) -> Option<String> {
        self.state.lock().raw.id_str().map(str::to_owned)
    }

    pub fn set_id(&self, id: impl Into<String>) {
        self.state.lock().raw.id = Scalar::from(Value::String(id.into()));
    }

    pub fn is_stub(&self) -> bool {
        !self.state.lock().populated
    }

    /// Snapshot of the raw resource.
    pub fn raw_object(&self) -> ResourceObject {
        self.state.lock().raw.clone()
    }

    /// Replaces the raw resource in place. Cached relations are dropped.
    pub fn set_raw_object(&self, raw: ResourceObject) {
        let mut state = self.state.lock();
        state.raw = raw;
        state.populated = true;
        state.relations.clear();
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        let state = self.state.lock();
        ResourceIdentifier::default()
            .with_kind(self.model_type.type_tag.as_str())
            .with_id(state.raw.id.clone())
    }

    pub(crate) fn key(&self) -> Result<ObjectKey> {
        let state = self.state.lock();
        ObjectKey::from_parts(&state.raw.kind, &state.raw.id)
    }

    /// Drops cached relation handles, breaking reference cycles.
    pub fn forget_relations(&self) {
        self.state.lock().relations.clear();
    }

    /// Item endpoint, `type/id`.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let id = self
            .id()
            .ok_or_else(|| OrmError::MissingIdentifier(self.type_tag().to_owned()))?;
        Ok(self
            .model_type
            .orm()?
            .endpoint(format!("{}/{}", self.type_tag(), id)))
    }

    async fn ensure_loaded(&self) -> Result<()> {
        if self.is_stub() {
            debug!(type_tag = self.type_tag(), id = ?self.id(), "Loading stub");
            self.refresh().await?;
        }
        Ok(())
    }

    fn attribute_source(&self, name: &str) -> Result<String> {
        match self.model_type.field(name)? {
            FieldDescriptor::Attribute(field) => Ok(field.source.clone()),
            FieldDescriptor::Relation(_) => Err(OrmError::FieldKind {
                model: self.type_tag().to_owned(),
                field: name.to_owned(),
                expected: "an attribute",
            }),
        }
    }

    fn relation_field(&self, name: &str) -> Result<RelationField> {
        match self.model_type.field(name)? {
            FieldDescriptor::Relation(field) => Ok(field.clone()),
            FieldDescriptor::Attribute(_) => Err(OrmError::FieldKind {
                model: self.type_tag().to_owned(),
                field: name.to_owned(),
                expected: "a relation",
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Raw value of an attribute; `null` when the resource does not carry it.
    pub async fn attribute(&self, name: &str) -> Result<Value> {
        let source = self.attribute_source(name)?;
        self.ensure_loaded().await?;
        let state = self.state.lock();
        Ok(state
            .raw
            .attributes
            .get(&source)
            .map(|value| value.value().clone())
            .unwrap_or(Value::Null))
    }

    /// Attribute converted through its serde representation.
    pub async fn attribute_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.attribute(name).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn set_attribute<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let source = self.attribute_source(name)?;
        let value = serde_json::to_value(value)?;
        self.ensure_loaded().await?;
        self.state
            .lock()
            .raw
            .attributes
            .insert(source, Scalar::from(value));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    /// Resolves a relation, serving repeated reads from the cache.
    pub async fn relation(&self, name: &str) -> Result<RelationValue> {
        let field = self.relation_field(name)?;
        self.ensure_loaded().await?;
        let cached = self.state.lock().relations.get(name).cloned();
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = self.build_relation(name, &field)?;
        self.state
            .lock()
            .relations
            .insert(name.to_owned(), value.clone());
        Ok(value)
    }

    pub async fn to_one(&self, name: &str) -> Result<Option<Model>> {
        match self.relation(name).await? {
            RelationValue::One(target) => Ok(target),
            RelationValue::Many(_) => Err(OrmError::Cardinality {
                field: name.to_owned(),
                expected: Cardinality::ToOne.as_str(),
            }),
        }
    }

    pub async fn to_many(&self, name: &str) -> Result<Vec<Model>> {
        match self.relation(name).await? {
            RelationValue::Many(targets) => Ok(targets),
            RelationValue::One(_) => Err(OrmError::Cardinality {
                field: name.to_owned(),
                expected: Cardinality::ToMany.as_str(),
            }),
        }
    }

    pub async fn set_to_one(&self, name: &str, target: Option<&Model>) -> Result<()> {
        let field = self.relation_field(name)?;
        check_declared(name, &field, Cardinality::ToOne)?;
        self.ensure_loaded().await?;

        let data = match target {
            Some(target) => Nullable::Present(Alternative::Second(target.identifier())),
            None => Nullable::Null,
        };
        let mut state = self.state.lock();
        state
            .raw
            .relationships
            .entry(field.source)
            .or_default()
            .data = data;
        state
            .relations
            .insert(name.to_owned(), RelationValue::One(target.cloned()));
        Ok(())
    }

    pub async fn set_to_many(&self, name: &str, targets: &[Model]) -> Result<()> {
        let field = self.relation_field(name)?;
        check_declared(name, &field, Cardinality::ToMany)?;
        self.ensure_loaded().await?;

        let identifiers: List<ResourceIdentifier> = targets.iter().map(Model::identifier).collect();
        let mut state = self.state.lock();
        state
            .raw
            .relationships
            .entry(field.source)
            .or_default()
            .data = Nullable::Present(Alternative::First(identifiers));
        state
            .relations
            .insert(name.to_owned(), RelationValue::Many(targets.to_vec()));
        Ok(())
    }

    fn build_relation(&self, name: &str, field: &RelationField) -> Result<RelationValue> {
        let relationship = self
            .state
            .lock()
            .raw
            .relationships
            .get(&field.source)
            .cloned()
            .unwrap_or_default();
        let cardinality = relation_cardinality(name, field, &relationship)?;
        let registry = self.model_type.orm()?.registry().clone();

        let stubs = relationship
            .identifiers()
            .into_iter()
            .map(|identifier| {
                let key = ObjectKey::from_identifier(identifier)?;
                Ok(registry.get_model(&key.kind)?.from_id(key.id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(match cardinality {
            Cardinality::ToOne => RelationValue::One(stubs.into_iter().next()),
            Cardinality::ToMany => RelationValue::Many(stubs),
        })
    }

    /// Links relations to models in `objects`.
    ///
    /// A relation is relinked when at least one of its targets is in `objects`;
    /// targets missing from it keep their cached handle or become stubs. Relations
    /// with no target in `objects` stay as they are and resolve lazily on access.
    pub fn resolve_relations(&self, objects: &IndexMap<ObjectKey, Model>) {
        let (relationships, cached) = {
            let state = self.state.lock();
            (state.raw.relationships.clone(), state.relations.clone())
        };

        let mut resolved = Vec::new();
        for (name, descriptor) in self.model_type.fields.iter() {
            let FieldDescriptor::Relation(field) = descriptor else {
                continue;
            };
            let Some(relationship) = relationships.get(&field.source) else {
                continue;
            };
            let Ok(cardinality) = relation_cardinality(name, field, relationship) else {
                continue;
            };
            let Ok(keys) = relationship
                .identifiers()
                .into_iter()
                .map(ObjectKey::from_identifier)
                .collect::<Result<Vec<_>>>()
            else {
                continue;
            };
            if !keys.is_empty() && !keys.iter().any(|key| objects.contains_key(key)) {
                trace!(field = %name, "Relation targets not in response");
                continue;
            }

            let previous = cached.get(name);
            let targets: Option<Vec<Model>> = keys
                .iter()
                .map(|key| {
                    objects
                        .get(key)
                        .cloned()
                        .or_else(|| self.stub_for(key, previous))
                })
                .collect();
            let Some(targets) = targets else {
                continue;
            };
            let value = match cardinality {
                Cardinality::ToOne => RelationValue::One(targets.into_iter().next()),
                Cardinality::ToMany => RelationValue::Many(targets),
            };
            resolved.push((name.clone(), value));
        }
        self.state.lock().relations.extend(resolved);
    }

    /// Handle for `key`: the one already cached in `previous`, else a new stub.
    fn stub_for(&self, key: &ObjectKey, previous: Option<&RelationValue>) -> Option<Model> {
        let reused = previous.and_then(|value| {
            value
                .models()
                .into_iter()
                .find(|model| model.key().ok().as_ref() == Some(key))
        });
        reused.or_else(|| {
            let orm = self.model_type.orm().ok()?;
            let model_type = orm.registry().get_model(&key.kind).ok()?;
            Some(model_type.from_id(key.id.as_str()))
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Fetches the resource and replaces the raw state with the answer.
    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag(), id = ?self.id()))]
    pub async fn refresh(&self) -> Result<()> {
        let response = self.endpoint()?.get().await?;
        self.absorb(response.content)?;
        debug!("Refreshed");
        Ok(())
    }

    /// Creates the resource if it has no id yet, updates it otherwise.
    pub async fn save(&self) -> Result<()> {
        if self.id().is_none() {
            self.create().await
        } else {
            self.update().await
        }
    }

    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag()))]
    pub async fn create(&self) -> Result<()> {
        let endpoint = self.model_type.collection_endpoint()?;
        let response = endpoint.post(&self.raw_object()).await?;
        if response.is_created() {
            self.absorb(response.content)?;
            info!(id = ?self.id(), "Created");
        } else {
            debug!(status = response.status_code, "Created without content");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag(), id = ?self.id()))]
    pub async fn update(&self) -> Result<()> {
        let endpoint = self.endpoint()?;
        let response = endpoint.patch(&self.raw_object()).await?;
        if response.content.single().is_some() {
            self.absorb(response.content)?;
        }
        info!(status = response.status_code, "Updated");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(type_tag = %self.type_tag(), id = ?self.id()))]
    pub async fn delete(&self) -> Result<()> {
        self.endpoint()?.delete().await?;
        info!("Deleted");
        Ok(())
    }

    /// Takes over the single primary resource of a response, along with the
    /// resources it includes. Missing type or id fall back to this model's own.
    /// Handles already cached in relations are seeded too, so included
    /// resources upgrade those exact handles.
    ///
    /// Nothing changes unless the whole response can be absorbed.
    fn absorb(&self, mut document: Document) -> Result<()> {
        let Some(primary) = document.single_mut() else {
            return Ok(());
        };
        if primary.kind.is_null() {
            primary.kind = Scalar::from(self.type_tag());
        }
        if primary.id.is_null() {
            if let Some(own) = self.id() {
                primary.id = Scalar::from(own);
            }
        }
        let key = ObjectKey::from_resource(primary).ok();

        let cached_targets: Vec<Model> = self
            .state
            .lock()
            .relations
            .values()
            .flat_map(RelationValue::models)
            .collect();

        let mut repository = self.model_type.orm()?.repository();
        if let Some(key) = &key {
            repository.insert(key.clone(), self.clone());
        }
        for target in cached_targets {
            if let Ok(target_key) = target.key() {
                if !repository.contains(&target_key) {
                    repository.insert(target_key, target);
                }
            }
        }

        if key.is_some() {
            repository.update_from_document(&document)?;
            return Ok(());
        }

        // No identity on either side: take the resource over directly.
        let raw = document.data.take();
        repository.update_from_document(&document)?;
        if let Some(Alternative::Second(raw)) = raw {
            self.set_raw_object(raw);
            self.resolve_relations(repository.objects());
        }
        Ok(())
    }
}

fn check_declared(name: &str, field: &RelationField, wanted: Cardinality) -> Result<()> {
    match field.cardinality {
        Some(declared) if declared != wanted => Err(OrmError::Cardinality {
            field: name.to_owned(),
            expected: declared.as_str(),
        }),
        _ => Ok(()),
    }
}

/// Declared cardinality, else the one implied by the data, else to-one.
fn relation_cardinality(
    name: &str,
    field: &RelationField,
    relationship: &Relationship,
) -> Result<Cardinality> {
    match (field.cardinality, relationship.shape()) {
        (Some(declared), Some(found)) if declared != found => Err(OrmError::Cardinality {
            field: name.to_owned(),
            expected: declared.as_str(),
        }),
        (Some(declared), _) => Ok(declared),
        (None, Some(found)) => Ok(found),
        (None, None) => Ok(Cardinality::ToOne),
    }
}
