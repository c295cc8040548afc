//! # Field Declarations
//!
//! A model type is declared as a [`ModelDecl`]: its JSON:API type tag plus a
//! table of named fields. Attributes read `attributes[source]`; relations read
//! `relationships[source]`.

use crate::document::Cardinality;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeField {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationField {
    pub source: String,
    /// When set, linkage data of the other shape is rejected on access.
    /// When unset, the shape of the data decides.
    pub cardinality: Option<Cardinality>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDescriptor {
    Attribute(AttributeField),
    Relation(RelationField),
}

impl FieldDescriptor {
    pub fn attribute(source: impl Into<String>) -> Self {
        Self::Attribute(AttributeField {
            source: source.into(),
        })
    }

    pub fn relation(source: impl Into<String>, cardinality: Option<Cardinality>) -> Self {
        Self::Relation(RelationField {
            source: source.into(),
            cardinality,
        })
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Attribute(field) => &field.source,
            Self::Relation(field) => &field.source,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }
}

/// Declaration of a model type, consumed by
/// [`OrmApi::register`](crate::orm::OrmApi::register).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDecl {
    type_tag: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl ModelDecl {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }

    pub fn attribute(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::attribute(source))
    }

    /// A relation whose cardinality follows the linkage data.
    pub fn relation(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::relation(source, None))
    }

    pub fn to_one(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::relation(source, Some(Cardinality::ToOne)))
    }

    pub fn to_many(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::relation(source, Some(Cardinality::ToMany)))
    }

    /// Takes over the fields of `base`. Fields already declared here win.
    pub fn inherit(mut self, base: &ModelDecl) -> Self {
        let mut fields = base.fields.clone();
        for (name, descriptor) in self.fields.drain(..) {
            fields.insert(name, descriptor);
        }
        self.fields = fields;
        self
    }
}
