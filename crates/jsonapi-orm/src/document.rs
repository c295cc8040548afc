//! # JSON:API Document Model
//!
//! The records making up a JSON:API message, declared through the schema engine.
//! Everything a server sends is preserved: decoding a document and encoding it
//! again yields the same JSON minus null members and empty optional collections.

use crate::json_record;
use crate::value::{Alternative, Dictionary, List, Nullable, Scalar};
use serde_json::Value;

/// Whether a relationship points at one resource or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::ToOne => "to-one",
            Cardinality::ToMany => "to-many",
        }
    }
}

/// Linkage data of a relationship: a list of identifiers or a single one.
pub type RelationshipData = Alternative<List<ResourceIdentifier>, ResourceIdentifier>;

/// Primary data of a document: a list of resources or a single one.
pub type PrimaryData = Alternative<List<ResourceObject>, ResourceObject>;

json_record! {
    /// A minimal `{"type", "id"}` reference to a resource.
    pub struct ResourceIdentifier {
        kind: Scalar = "type",
        id: Scalar = "id",
        meta: Scalar = "meta",
    }
}

json_record! {
    /// Linkage of one relationship. An explicit `"data": null` is kept, so an
    /// emptied to-one relation is sent as such.
    pub struct Relationship {
        data: Nullable<RelationshipData> = "data" [Always],
        links: Dictionary<Scalar> = "links",
        meta: Scalar = "meta",
    }
}

json_record! {
    /// A resource as it travels over the wire.
    pub struct ResourceObject {
        kind: Scalar = "type",
        id: Scalar = "id",
        attributes: Dictionary<Scalar> = "attributes",
        relationships: Dictionary<Relationship> = "relationships",
        links: Dictionary<Scalar> = "links",
        meta: Scalar = "meta",
    }
}

json_record! {
    /// A top-level JSON:API message.
    pub struct Document {
        data: Option<PrimaryData> = "data" [Always],
        errors: List<Scalar> = "errors",
        meta: Scalar = "meta",
        jsonapi: Scalar = "jsonapi",
        links: Dictionary<Scalar> = "links",
        included: List<ResourceObject> = "included",
    }
}

impl ResourceIdentifier {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::default()
            .with_kind(Value::String(kind.into()))
            .with_id(Value::String(id.into()))
    }

    /// True when neither a type nor an id is present.
    pub fn is_empty(&self) -> bool {
        self.kind.is_null() && self.id.is_null()
    }
}

impl Relationship {
    pub fn to_one(identifier: ResourceIdentifier) -> Self {
        Self::default().with_data(Alternative::Second(identifier))
    }

    pub fn to_many(identifiers: impl IntoIterator<Item = ResourceIdentifier>) -> Self {
        Self::default().with_data(Alternative::First(identifiers.into_iter().collect()))
    }

    /// An empty to-one relationship, `{"data": null}`.
    pub fn empty() -> Self {
        Self::default().with_data(Nullable::Null)
    }

    /// Cardinality implied by the linkage data, if there is any.
    pub fn shape(&self) -> Option<Cardinality> {
        match self.data.as_ref() {
            Some(Alternative::First(_)) => Some(Cardinality::ToMany),
            Some(Alternative::Second(_)) => Some(Cardinality::ToOne),
            None => None,
        }
    }

    /// Identifiers in the linkage data, in order. Empty identifiers are skipped.
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self.data.as_ref() {
            Some(Alternative::First(list)) => list.iter().filter(|i| !i.is_empty()).collect(),
            Some(Alternative::Second(one)) if !one.is_empty() => vec![one],
            _ => Vec::new(),
        }
    }
}

impl ResourceObject {
    pub fn new(kind: impl Into<String>) -> Self {
        Self::default().with_kind(Value::String(kind.into()))
    }

    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_str()
    }

    pub fn id_str(&self) -> Option<&str> {
        self.id.as_str()
    }

    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::default()
            .with_kind(self.kind.clone())
            .with_id(self.id.clone())
    }
}

impl Document {
    pub fn from_resource(resource: ResourceObject) -> Self {
        Self::default().with_data(Alternative::Second(resource))
    }

    pub fn from_resources(resources: impl IntoIterator<Item = ResourceObject>) -> Self {
        Self::default().with_data(Alternative::First(resources.into_iter().collect()))
    }

    /// Primary data normalized to a list.
    pub fn primary(&self) -> Vec<&ResourceObject> {
        match &self.data {
            Some(Alternative::First(list)) => list.iter().collect(),
            Some(Alternative::Second(one)) => vec![one],
            None => Vec::new(),
        }
    }

    /// The primary resource when the document carries a single one.
    pub fn single(&self) -> Option<&ResourceObject> {
        match &self.data {
            Some(Alternative::Second(one)) => Some(one),
            _ => None,
        }
    }

    pub fn single_mut(&mut self) -> Option<&mut ResourceObject> {
        match &mut self.data {
            Some(Alternative::Second(one)) => Some(one),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.data, Some(Alternative::First(_)))
    }
}
