//! Fixed-shape JSON objects ("records").
//!
//! A record is declared once as a field table and gets its decoder, encoder,
//! equality and builder setters from [`json_record!`](crate::json_record):
//!
//! ```
//! use jsonapi_orm::json_record;
//! use jsonapi_orm::value::{JsonData, List, Scalar};
//!
//! json_record! {
//!     pub struct Page {
//!         title: Scalar = "title",
//!         tags: List<Scalar> = "tags" [Always],
//!     }
//! }
//!
//! let page = Page::default().with_title("Home");
//! assert_eq!(page.as_data(), serde_json::json!({"title": "Home", "tags": []}));
//! ```
//!
//! A field is omitted from the encoded object when its value reports that it
//! should not be written ([`JsonData::allow_as_data`]). A record itself counts as
//! empty, and is omitted from its parent, when none of its fields are written.

use crate::error::SchemaMismatch;
use crate::value::{JsonData, Presence};
use serde_json::{Map, Value};

/// Views `data` as the object backing a record; `null` decodes to an empty record.
pub fn record_map(data: &Value) -> Result<Option<&Map<String, Value>>, SchemaMismatch> {
    match data {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(SchemaMismatch::new("object", other)),
    }
}

/// Decodes one field; a missing key goes through [`JsonData::from_absent`].
pub fn decode_field<T: JsonData>(
    map: Option<&Map<String, Value>>,
    key: &str,
) -> Result<T, SchemaMismatch> {
    match map.and_then(|map| map.get(key)) {
        Some(raw) => T::from_data(raw),
        None => T::from_absent(),
    }
}

pub fn encode_field<T: JsonData>(
    out: &mut Map<String, Value>,
    key: &str,
    value: &T,
    presence: Presence,
) {
    if value.allow_as_data(presence) {
        out.insert(key.to_owned(), value.as_data());
    }
}

/// Declares a record type.
///
/// Each field is written `name: Type = "json-key"`, optionally followed by
/// `[Always]` to keep the field when its value is an empty collection.
#[macro_export]
macro_rules! json_record {
    (@presence) => {
        $crate::value::Presence::Optional
    };
    (@presence $presence:ident) => {
        $crate::value::Presence::$presence
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty = $key:literal $([$presence:ident])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::value::JsonData for $name {
            fn from_data(
                data: &$crate::__private::Value,
            ) -> ::std::result::Result<Self, $crate::error::SchemaMismatch> {
                let map = $crate::record::record_map(data)?;
                Ok(Self {
                    $( $field: $crate::record::decode_field(map, $key)?, )*
                })
            }

            fn as_data(&self) -> $crate::__private::Value {
                let mut out = $crate::__private::Map::new();
                $(
                    $crate::record::encode_field(
                        &mut out,
                        $key,
                        &self.$field,
                        $crate::json_record!(@presence $($presence)?),
                    );
                )*
                $crate::__private::Value::Object(out)
            }

            fn allow_as_data(&self, _presence: $crate::value::Presence) -> bool {
                match <Self as $crate::value::JsonData>::as_data(self) {
                    $crate::__private::Value::Object(map) => !map.is_empty(),
                    _ => true,
                }
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                <Self as $crate::value::JsonData>::as_data(self)
                    == <Self as $crate::value::JsonData>::as_data(other)
            }
        }

        $crate::__private::paste! {
            impl $name {
                $(
                    #[doc = concat!("Sets `", $key, "` and returns the record.")]
                    pub fn [<with_ $field>](mut self, value: impl Into<$ty>) -> Self {
                        self.$field = value.into();
                        self
                    }
                )*
            }
        }
    };
}
