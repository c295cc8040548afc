//! # Schema Engine
//!
//! Typed, symmetric conversion between raw JSON ([`serde_json::Value`]) and domain values.
//!
//! Every value kind implements [`JsonData`]:
//!
//! - [`Scalar`] passes any JSON value through unchanged.
//! - [`List`] decodes an array element by element; `null` decodes to an empty list.
//! - [`Dictionary`] decodes an object into a key-ordered map; `null` decodes to an empty map.
//! - `Option<T>` maps `null` to `None`.
//! - [`Nullable`] tells an explicit `null` apart from a missing member, and writes the `null` back.
//! - [`Alternative`] tries its candidates in declaration order and keeps the first that fits.
//! - Records (fixed-shape objects) are declared with [`json_record!`](crate::json_record).
//!
//! Decoded values compare equal when their encoded forms are equal, so
//! `decode(raw).as_data()` is the canonical form of `raw`.

use crate::error::{OrmError, SchemaMismatch};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Whether a record field is written out when its value is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Omit the field when the value is null or an empty collection.
    #[default]
    Optional,
    /// Keep empty collections; only absent values are omitted.
    Always,
}

/// Conversion contract shared by every value kind.
pub trait JsonData: Sized {
    /// Decodes `data`, failing if its shape does not fit.
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch>;

    /// Encodes the value back into raw JSON.
    fn as_data(&self) -> Value;

    /// Whether a record should include this value under a field with the given presence.
    fn allow_as_data(&self, presence: Presence) -> bool;

    /// Value of a record field whose key is missing. Defaults to decoding `null`.
    fn from_absent() -> Result<Self, SchemaMismatch> {
        Self::from_data(&Value::Null)
    }
}

/// Decodes a raw value into `T`.
pub fn decode<T: JsonData>(data: &Value) -> Result<T, SchemaMismatch> {
    T::from_data(data)
}

/// Parses JSON text and decodes it into `T`.
pub fn from_str<T: JsonData>(text: &str) -> Result<T, OrmError> {
    let data: Value = serde_json::from_str(text)?;
    Ok(T::from_data(&data)?)
}

// =============================================================================
// Scalar
// =============================================================================

/// Any JSON value, kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scalar(pub Value);

impl Scalar {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_owned()))
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<Option<String>> for Scalar {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl JsonData for Scalar {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        Ok(Self(data.clone()))
    }

    fn as_data(&self) -> Value {
        self.0.clone()
    }

    fn allow_as_data(&self, _presence: Presence) -> bool {
        !self.0.is_null()
    }
}

// =============================================================================
// List
// =============================================================================

/// Ordered sequence of `T`.
#[derive(Debug, Clone)]
pub struct List<T>(Vec<T>);

impl<T> List<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for List<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for List<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: JsonData> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_data() == other.as_data()
    }
}

impl<T: JsonData> JsonData for List<T> {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        match data {
            Value::Null => Ok(Self::new()),
            Value::Array(items) => items.iter().map(T::from_data).collect(),
            other => Err(SchemaMismatch::new("array", other)),
        }
    }

    fn as_data(&self) -> Value {
        Value::Array(self.0.iter().map(JsonData::as_data).collect())
    }

    fn allow_as_data(&self, presence: Presence) -> bool {
        !self.0.is_empty() || presence == Presence::Always
    }
}

// =============================================================================
// Dictionary
// =============================================================================

/// String-keyed map of `T` that keeps insertion order.
#[derive(Debug, Clone)]
pub struct Dictionary<T>(IndexMap<String, T>);

impl<T> Dictionary<T> {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn into_inner(self) -> IndexMap<String, T> {
        self.0
    }
}

impl<T> Default for Dictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Dictionary<T> {
    type Target = IndexMap<String, T>;

    fn deref(&self) -> &IndexMap<String, T> {
        &self.0
    }
}

impl<T> DerefMut for Dictionary<T> {
    fn deref_mut(&mut self) -> &mut IndexMap<String, T> {
        &mut self.0
    }
}

impl<T> From<IndexMap<String, T>> for Dictionary<T> {
    fn from(map: IndexMap<String, T>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Dictionary<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<T: JsonData> PartialEq for Dictionary<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_data() == other.as_data()
    }
}

impl<T: JsonData> JsonData for Dictionary<T> {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        match data {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => map
                .iter()
                .map(|(key, element)| Ok((key.clone(), T::from_data(element)?)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Self),
            other => Err(SchemaMismatch::new("object", other)),
        }
    }

    fn as_data(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(key, element)| (key.clone(), element.as_data()))
            .collect();
        Value::Object(map)
    }

    fn allow_as_data(&self, presence: Presence) -> bool {
        !self.0.is_empty() || presence == Presence::Always
    }
}

// =============================================================================
// Option & Alternative
// =============================================================================

impl<T: JsonData> JsonData for Option<T> {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        match data {
            Value::Null => Ok(None),
            other => T::from_data(other).map(Some),
        }
    }

    fn as_data(&self) -> Value {
        self.as_ref().map_or(Value::Null, JsonData::as_data)
    }

    fn allow_as_data(&self, presence: Presence) -> bool {
        self.as_ref().is_some_and(|value| value.allow_as_data(presence))
    }
}

/// A value that may be missing, explicitly `null`, or present.
///
/// Unlike `Option<T>`, an explicit `null` survives a round trip: it is written
/// back whenever the field is [`Presence::Always`].
#[derive(Debug, Clone, Default)]
pub enum Nullable<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Nullable<T> {
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Nullable::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Nullable::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Nullable::Present(value)
    }
}

impl<T: JsonData> JsonData for Nullable<T> {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        match data {
            Value::Null => Ok(Nullable::Null),
            other => T::from_data(other).map(Nullable::Present),
        }
    }

    fn as_data(&self) -> Value {
        self.as_ref().map_or(Value::Null, JsonData::as_data)
    }

    fn allow_as_data(&self, presence: Presence) -> bool {
        match self {
            Nullable::Absent => false,
            Nullable::Null => presence == Presence::Always,
            Nullable::Present(value) => value.allow_as_data(presence),
        }
    }

    fn from_absent() -> Result<Self, SchemaMismatch> {
        Ok(Nullable::Absent)
    }
}

impl<T: JsonData> PartialEq for Nullable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_absent() == other.is_absent() && self.as_data() == other.as_data()
    }
}

/// A value whose shape varies: decodes as `A` if possible, otherwise as `B`.
///
/// Nest `Alternative<A, Alternative<B, C>>` for more than two candidates.
#[derive(Debug, Clone)]
pub enum Alternative<A, B> {
    First(A),
    Second(B),
}

impl<A: JsonData, B: JsonData> JsonData for Alternative<A, B> {
    fn from_data(data: &Value) -> Result<Self, SchemaMismatch> {
        match A::from_data(data) {
            Ok(first) => Ok(Self::First(first)),
            Err(mismatch) => {
                trace!(%mismatch, "First alternative rejected");
                B::from_data(data).map(Self::Second)
            }
        }
    }

    fn as_data(&self) -> Value {
        match self {
            Self::First(value) => value.as_data(),
            Self::Second(value) => value.as_data(),
        }
    }

    fn allow_as_data(&self, presence: Presence) -> bool {
        match self {
            Self::First(value) => value.allow_as_data(presence),
            Self::Second(value) => value.allow_as_data(presence),
        }
    }
}

impl<A: JsonData, B: JsonData> PartialEq for Alternative<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.as_data() == other.as_data()
    }
}
