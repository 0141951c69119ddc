//! Declarative field schemas and JSON coercion.
//!
//! A [`Schema`] is an ordered set of [`FieldSpec`]s. Decoding reads each
//! declared field from a JSON object (by alias, then by name), coerces it
//! through its [`FieldType`], falls back to the field default when the key is
//! absent, and ignores keys the schema does not declare.
//!
//! Schemas referenced from other schemas are `'static` (see [`SchemaRef`]),
//! which lets nested values keep a pointer to the contract they satisfy.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::CoercionError;
use crate::ids::Snowflake;
use crate::value::{FieldValue, ModelValue};

/// Lazily-resolved pointer to a `'static` schema.
///
/// Holding the accessor rather than the schema lets schemas refer to each
/// other (and to themselves) while they are being initialised.
#[derive(Clone, Copy)]
pub struct SchemaRef(fn() -> &'static Schema);

impl SchemaRef {
    pub const fn new(accessor: fn() -> &'static Schema) -> Self {
        Self(accessor)
    }

    pub fn get(self) -> &'static Schema {
        (self.0)()
    }

    pub fn is(self, schema: &Schema) -> bool {
        std::ptr::eq(self.get(), schema)
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.get().name())
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.get(), other.get())
    }
}

/// Declared type of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Snowflake,
    Text,
    Int,
    Float,
    Bool,
    /// RFC 3339 string.
    Timestamp,
    /// Either a string or an integer, kept as received.
    StrOrInt,
    /// Permission bitset, sent as a decimal string.
    Permissions,
    /// Passed through untouched.
    Json,
    Model(SchemaRef),
    List(Box<FieldType>),
    /// JSON object with homogeneous values.
    Dict(Box<FieldType>),
    /// Array of models re-keyed into a map by one of their fields.
    AutoDict { model: SchemaRef, key: &'static str },
}

impl FieldType {
    pub fn model(accessor: fn() -> &'static Schema) -> Self {
        Self::Model(SchemaRef::new(accessor))
    }

    pub fn list(inner: FieldType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn list_of(accessor: fn() -> &'static Schema) -> Self {
        Self::list(Self::model(accessor))
    }

    pub fn dict(inner: FieldType) -> Self {
        Self::Dict(Box::new(inner))
    }

    pub fn auto_dict(accessor: fn() -> &'static Schema, key: &'static str) -> Self {
        Self::AutoDict {
            model: SchemaRef::new(accessor),
            key,
        }
    }

    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::StrOrInt => "string or int",
            Self::Permissions => "permissions",
            Self::Json => "json",
            Self::Model(_) => "object",
            Self::List(_) => "array",
            Self::Dict(_) => "object",
            Self::AutoDict { .. } => "array of objects",
        }
    }

    /// Coerce a raw JSON value into this type. JSON `null` is `Null` for every type.
    pub fn coerce(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if raw.is_null() {
            return Ok(FieldValue::Null);
        }

        match self {
            Self::Snowflake => coerce_snowflake(raw).map(FieldValue::Snowflake),
            Self::Text => match raw {
                Value::String(s) => Ok(FieldValue::Text(s.clone())),
                Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
                Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::Int => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .map(FieldValue::Int)
                    .ok_or_else(|| CoercionError::mismatch(self.name(), raw)),
                Value::String(s) => s
                    .parse()
                    .map(FieldValue::Int)
                    .map_err(|_| CoercionError::mismatch(self.name(), raw)),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::Float => raw
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| CoercionError::mismatch(self.name(), raw)),
            Self::Bool => raw
                .as_bool()
                .map(FieldValue::Bool)
                .ok_or_else(|| CoercionError::mismatch(self.name(), raw)),
            Self::Timestamp => match raw {
                Value::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
                    .map_err(|e| CoercionError::InvalidTimestamp {
                        raw: s.clone(),
                        reason: e.to_string(),
                    }),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::StrOrInt => match raw {
                Value::String(s) => Ok(FieldValue::Text(s.clone())),
                Value::Number(n) if n.is_i64() || n.is_u64() => n
                    .as_i64()
                    .map(FieldValue::Int)
                    .ok_or_else(|| CoercionError::mismatch(self.name(), raw)),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::Permissions => {
                let bits = match raw {
                    Value::String(s) => s.parse::<i64>().ok(),
                    Value::Number(n) => n.as_i64(),
                    _ => None,
                };
                bits.filter(|b| *b >= 0)
                    .map(FieldValue::Int)
                    .ok_or_else(|| CoercionError::mismatch(self.name(), raw))
            }
            Self::Json => Ok(FieldValue::Json(raw.clone())),
            Self::Model(schema) => match raw {
                Value::Object(obj) => schema.get().decode(obj).map(FieldValue::Model),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::List(inner) => match raw {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| inner.coerce(item).map_err(|e| e.in_field(index.to_string())))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::List),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::Dict(inner) => match raw {
                Value::Object(obj) => obj
                    .iter()
                    .map(|(key, item)| {
                        inner
                            .coerce(item)
                            .map(|v| (key.clone(), v))
                            .map_err(|e| e.in_field(key.clone()))
                    })
                    .collect::<Result<IndexMap<_, _>, _>>()
                    .map(FieldValue::Map),
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
            Self::AutoDict { model, key } => match raw {
                Value::Array(items) => {
                    let mut out = IndexMap::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let entry = match item {
                            Value::Object(obj) => model
                                .get()
                                .decode(obj)
                                .map_err(|e| e.in_field(index.to_string()))?,
                            other => {
                                return Err(CoercionError::mismatch("object", other)
                                    .in_field(index.to_string()));
                            }
                        };
                        let entry_key = entry
                            .get(key)
                            .and_then(FieldValue::key_string)
                            .ok_or_else(|| CoercionError::MissingKey {
                                key: *key,
                                entry: item.clone(),
                            })?;
                        out.insert(entry_key, FieldValue::Model(entry));
                    }
                    Ok(FieldValue::Map(out))
                }
                other => Err(CoercionError::mismatch(self.name(), other)),
            },
        }
    }

    /// Whether an already-coerced value conforms to this type.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) | (Self::Json, _) => true,
            (Self::Snowflake, FieldValue::Snowflake(_))
            | (Self::Text, FieldValue::Text(_))
            | (Self::Int, FieldValue::Int(_))
            | (Self::Float, FieldValue::Float(_) | FieldValue::Int(_))
            | (Self::Bool, FieldValue::Bool(_))
            | (Self::Timestamp, FieldValue::Timestamp(_))
            | (Self::StrOrInt, FieldValue::Text(_) | FieldValue::Int(_))
            | (Self::Permissions, FieldValue::Int(_)) => true,
            (Self::Model(schema), FieldValue::Model(model)) => schema.is(model.schema()),
            (Self::List(inner), FieldValue::List(items)) => items.iter().all(|v| inner.accepts(v)),
            (Self::Dict(inner), FieldValue::Map(entries)) => {
                entries.values().all(|v| inner.accepts(v))
            }
            (Self::AutoDict { model, .. }, FieldValue::Map(entries)) => entries
                .values()
                .all(|v| matches!(v, FieldValue::Model(m) if model.is(m.schema()))),
            _ => false,
        }
    }
}

fn coerce_snowflake(raw: &Value) -> Result<Snowflake, CoercionError> {
    let parsed = match raw {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(Snowflake::new),
        _ => None,
    };
    parsed.ok_or_else(|| CoercionError::mismatch("snowflake", raw))
}

/// One declared field: name, optional wire alias, type and default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    alias: Option<String>,
    ty: FieldType,
    default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            ty,
            default: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Value used when the key is absent from the body.
    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    /// Raw value for this field: alias first, then the field name.
    pub fn read<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Value> {
        self.alias
            .as_deref()
            .and_then(|alias| obj.get(alias))
            .or_else(|| obj.get(&self.name))
    }
}

/// Ordered, named collection of field specs.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    /// Declare a schema. A later spec with the same name replaces the earlier one.
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode the declared fields of `obj`. Absent keys without a default are
    /// left out of the result; unknown keys are ignored.
    pub fn decode_fields(
        &self,
        obj: &Map<String, Value>,
    ) -> Result<IndexMap<String, FieldValue>, CoercionError> {
        let mut out = IndexMap::with_capacity(self.fields.len());
        for spec in self.fields.values() {
            match spec.read(obj) {
                Some(raw) => {
                    let value = spec.ty.coerce(raw).map_err(|e| e.in_field(&spec.name))?;
                    out.insert(spec.name.clone(), value);
                }
                None => {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(out)
    }

    /// Decode `obj` into a model value bound to this schema.
    pub fn decode(&'static self, obj: &Map<String, Value>) -> Result<ModelValue, CoercionError> {
        self.decode_fields(obj)
            .map(|fields| ModelValue::from_parts(self, fields))
    }
}
