//! Typed values produced by schema decoding.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::ids::Snowflake;
use crate::schema::Schema;

/// Shared `Null` handed out for declared-but-absent fields.
pub static NULL: FieldValue = FieldValue::Null;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Snowflake(Snowflake),
    Timestamp(DateTime<Utc>),
    List(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
    Model(ModelValue),
    Json(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_snowflake(&self) -> Option<Snowflake> {
        match self {
            Self::Snowflake(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelValue> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// String form usable as a map key (ids, text, integers).
    pub fn key_string(&self) -> Option<String> {
        match self {
            Self::Snowflake(id) => Some(id.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Walk a dotted path through models, maps and lists (`author.id`, `mentions.0`).
    /// An empty path returns `self`.
    pub fn lookup(&self, path: &str) -> Option<&FieldValue> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |current, segment| match current {
            Self::Model(model) => model.get(segment),
            Self::Map(entries) => entries.get(segment),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Plain JSON rendering (snowflakes as strings, timestamps as RFC 3339).
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A decoded object bound to the schema it satisfies.
///
/// Only declared fields are readable; a declared field that was absent on
/// the wire reads as [`FieldValue::Null`].
#[derive(Clone)]
pub struct ModelValue {
    schema: &'static Schema,
    fields: IndexMap<String, FieldValue>,
}

impl ModelValue {
    pub fn from_parts(schema: &'static Schema, fields: IndexMap<String, FieldValue>) -> Self {
        Self { schema, fields }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema.name()
    }

    /// `None` when the schema does not declare `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        if self.schema.declares(name) {
            Some(self.fields.get(name).unwrap_or(&NULL))
        } else {
            None
        }
    }

    /// Whether `name` was present on the wire (or defaulted).
    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Mutable access to a field that is present.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    /// Store `value` under a declared field whose type accepts it.
    /// Returns whether the write happened.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        match self.schema.field(name) {
            Some(spec) if spec.ty().accepts(&value) => {
                self.fields.insert(name.to_owned(), value);
                true
            }
            _ => false,
        }
    }

    /// Fields present on this value, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelValue")
            .field("schema", &self.schema.name())
            .field("fields", &self.fields)
            .finish()
    }
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.fields == other.fields
    }
}

impl Serialize for ModelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models;
    use serde_json::json;

    fn user(body: Value) -> ModelValue {
        match body {
            Value::Object(obj) => models::user().decode(&obj).unwrap(),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn declared_absent_fields_read_as_null() {
        let user = user(json!({"id": "9"}));
        assert_eq!(user.get("username"), Some(&FieldValue::Null));
        assert!(!user.is_set("username"));
        assert_eq!(user.get("not_a_field"), None);
    }

    #[test]
    fn set_requires_declared_field_and_matching_type() {
        let mut user = user(json!({"id": "9"}));
        assert!(user.set("username", FieldValue::Text("ada".into())));
        assert!(!user.set("username", FieldValue::Bool(true)));
        assert!(!user.set("nickname", FieldValue::Text("x".into())));
        assert_eq!(user.get("username").and_then(FieldValue::as_str), Some("ada"));
    }

    #[test]
    fn lookup_walks_models_maps_and_lists() {
        let mut entries = IndexMap::new();
        entries.insert("first".to_owned(), FieldValue::Model(user(json!({"id": "1"}))));
        let value = FieldValue::List(vec![FieldValue::Map(entries)]);
        assert_eq!(
            value.lookup("0.first.id").and_then(FieldValue::as_snowflake),
            Some(Snowflake::new(1))
        );
        assert_eq!(value.lookup("1"), None);
        assert_eq!(value.lookup(""), Some(&value));
    }

    #[test]
    fn json_rendering_uses_wire_forms() {
        let user = user(json!({"id": 9, "username": "ada", "bot": true}));
        assert_eq!(user.to_json(), json!({"id": "9", "username": "ada", "bot": true, "system": false}));
    }
}
