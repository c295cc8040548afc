//! # ORM Entry Point
//!
//! [`OrmApi`] owns the API handle and the type registry; every model type is
//! registered against exactly one of them.
//!
//! # Typed Models
//!
//! The [`ApiModel`] trait lets a domain type wrap the dynamic [`Model`] handle
//! and expose typed accessors. The trait fixes the type tag at compile time, so
//! `orm.from_id::<Article>("1")` can only ever produce an article.
//!
//! # Provided Methods
//! - [`ApiModel::id`]
//! - [`ApiModel::save`]
//! - [`ApiModel::refresh`]
//! - [`ApiModel::delete`]
//!
//! You do **not** need to implement these; they forward to the wrapped handle.

use crate::client::{Api, Endpoint};
use crate::config::ApiConfig;
use crate::document::Document;
use crate::error::{OrmError, Result};
use crate::fields::ModelDecl;
use crate::model::{Model, ModelType};
use crate::registry::TypeRegistry;
use crate::repository::Repository;
use crate::transport::Transport;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// The API plus the models registered for it.
pub struct OrmApi {
    api: Api,
    registry: Arc<TypeRegistry>,
}

impl OrmApi {
    pub fn new(transport: Arc<dyn Transport>, config: ApiConfig) -> Arc<Self> {
        Self::from_api(Api::new(transport, config))
    }

    pub fn from_api(api: Api) -> Arc<Self> {
        Arc::new(Self {
            api,
            registry: Arc::new(TypeRegistry::new()),
        })
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn endpoint(&self, path: impl Into<String>) -> Endpoint {
        self.api.endpoint(path)
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// An empty repository over this API's registry.
    pub fn repository(&self) -> Repository {
        Repository::new(self.registry.clone())
    }

    /// Registers a model type. Fails if its type tag is taken.
    pub fn register(self: &Arc<Self>, decl: ModelDecl) -> Result<Arc<ModelType>> {
        let model_type = Arc::new(ModelType::new(decl, Arc::downgrade(self)));
        self.registry.register(model_type.clone())?;
        Ok(model_type)
    }

    pub fn model(&self, type_tag: &str) -> Result<Arc<ModelType>> {
        self.registry.get_model(type_tag)
    }

    // -------------------------------------------------------------------------
    // Typed helpers
    // -------------------------------------------------------------------------

    /// Registers `M`; its declaration must use [`ApiModel::TYPE`] as type tag.
    pub fn register_model<M: ApiModel>(self: &Arc<Self>) -> Result<Arc<ModelType>> {
        let decl = M::declare();
        if decl.type_tag() != M::TYPE {
            return Err(OrmError::TypeTagMismatch {
                expected: M::TYPE.to_owned(),
                declared: decl.type_tag().to_owned(),
            });
        }
        self.register(decl)
    }

    pub fn model_type<M: ApiModel>(&self) -> Result<Arc<ModelType>> {
        self.model(M::TYPE)
    }

    /// A new, unsaved `M`.
    pub fn create_model<M: ApiModel>(&self) -> Result<M> {
        Ok(M::from_model(self.model_type::<M>()?.new_instance()))
    }

    /// A stub `M`, fetched on first field access.
    pub fn from_id<M: ApiModel>(&self, id: impl Into<String>) -> Result<M> {
        Ok(M::from_model(self.model_type::<M>()?.from_id(id)))
    }

    pub async fn get_list<M: ApiModel>(&self) -> Result<Vec<M>> {
        let models = self.model_type::<M>()?.get_list().await?;
        Ok(models.into_iter().map(M::from_model).collect())
    }

    pub async fn exists<M: ApiModel>(&self, id: &str) -> Result<bool> {
        self.model_type::<M>()?.exists(id).await
    }

    pub fn from_document<M: ApiModel>(&self, document: &Document) -> Result<Option<M>> {
        Ok(self
            .model_type::<M>()?
            .from_document(document)?
            .map(M::from_model))
    }
}

impl fmt::Debug for OrmApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrmApi")
            .field("api", &self.api)
            .field("types", &self.registry.type_tags())
            .finish()
    }
}

/// A domain type backed by a [`Model`].
///
/// # Example
///
/// ```rust
/// use jsonapi_orm::fields::ModelDecl;
/// use jsonapi_orm::model::Model;
/// use jsonapi_orm::orm::ApiModel;
/// use jsonapi_orm::error::Result;
///
/// struct Person(Model);
///
/// impl ApiModel for Person {
///     const TYPE: &'static str = "people";
///
///     fn declare() -> ModelDecl {
///         ModelDecl::new(Self::TYPE).attribute("name", "name")
///     }
///     fn from_model(model: Model) -> Self { Person(model) }
///     fn model(&self) -> &Model { &self.0 }
/// }
///
/// impl Person {
///     async fn name(&self) -> Result<Option<String>> {
///         self.0.attribute_as("name").await
///     }
/// }
/// ```
#[async_trait]
pub trait ApiModel: Send + Sync + Sized + 'static {
    /// JSON:API type tag.
    const TYPE: &'static str;

    /// Field declaration; its type tag must be [`Self::TYPE`].
    fn declare() -> ModelDecl;

    fn from_model(model: Model) -> Self;

    fn model(&self) -> &Model;

    fn id(&self) -> Option<String> {
        self.model().id()
    }

    async fn save(&self) -> Result<()> {
        self.model().save().await
    }

    async fn refresh(&self) -> Result<()> {
        self.model().refresh().await
    }

    async fn delete(&self) -> Result<()> {
        self.model().delete().await
    }
}
