//! Decoded events and attribute resolution.

use std::borrow::Cow;
use std::sync::Arc;

use gatewire_protocol::value::NULL;
use gatewire_protocol::{ConnectionId, FieldValue, ModelValue};
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::VariantDescriptor;

/// Connection-level context handed to every decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub connection_id: ConnectionId,
    pub shard_id: u32,
}

impl DispatchContext {
    pub fn new(shard_id: u32) -> Self {
        Self {
            connection_id: ConnectionId::default(),
            shard_id,
        }
    }
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Outcome of the attach pass for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttachReport {
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("{event} has no attribute `{name}`")]
    NoSuchAttribute { event: String, name: String },
}

/// One decoded gateway dispatch.
///
/// Field values are owned exclusively by the event. The raw body is kept
/// as received, before any embed migration.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    descriptor: Arc<VariantDescriptor>,
    fields: IndexMap<String, FieldValue>,
    raw: Value,
    context: Arc<DispatchContext>,
    sequence: Option<u64>,
    attach: AttachReport,
}

impl DecodedEvent {
    pub(crate) fn new(
        descriptor: Arc<VariantDescriptor>,
        fields: IndexMap<String, FieldValue>,
        raw: Value,
        context: Arc<DispatchContext>,
    ) -> Self {
        Self {
            descriptor,
            fields,
            raw,
            context,
            sequence: None,
            attach: AttachReport::default(),
        }
    }

    pub(crate) fn set_sequence(&mut self, sequence: Option<u64>) {
        self.sequence = sequence;
    }

    pub(crate) fn set_attach_report(&mut self, report: AttachReport) {
        self.attach = report;
    }

    pub fn descriptor(&self) -> &VariantDescriptor {
        &self.descriptor
    }

    pub(crate) fn descriptor_arc(&self) -> Arc<VariantDescriptor> {
        Arc::clone(&self.descriptor)
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn tag(&self) -> &str {
        self.descriptor.tag()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn attach_report(&self) -> AttachReport {
        self.attach
    }

    /// Own field values that were present (or defaulted), in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn missing(&self, name: &str) -> AttributeError {
        AttributeError::NoSuchAttribute {
            event: self.descriptor.name().to_owned(),
            name: name.to_owned(),
        }
    }

    /// A field declared on the event itself. Declared but absent reads as null.
    pub fn field(&self, name: &str) -> Result<&FieldValue, AttributeError> {
        if self.descriptor.fields().declares(name) {
            Ok(self.fields.get(name).unwrap_or(&NULL))
        } else {
            Err(self.missing(name))
        }
    }

    /// `name` resolved against the proxy target's schema.
    pub fn proxied(&self, name: &str) -> Result<&FieldValue, AttributeError> {
        self.proxy_target()
            .and_then(|target| target.get(name))
            .ok_or_else(|| self.missing(name))
    }

    /// The model held by the proxy field, if one is declared and present.
    pub fn proxy_target(&self) -> Option<&ModelValue> {
        let target = self.descriptor.proxy()?;
        self.fields.get(target).and_then(FieldValue::as_model)
    }

    /// Full resolution: derived attribute, own field, then the proxy target.
    pub fn get(&self, name: &str) -> Result<Cow<'_, FieldValue>, AttributeError> {
        if let Some(derived) = self.descriptor.derived(name) {
            return Ok(Cow::Owned(derived.compute(self)));
        }
        match self.field(name) {
            Ok(value) => Ok(Cow::Borrowed(value)),
            Err(missing) => self.proxied(name).map(Cow::Borrowed).map_err(|_| missing),
        }
    }

    /// Resolve the first segment through [`get`](Self::get), then walk the rest
    /// (`message.author.id`).
    pub fn get_path(&self, path: &str) -> Result<Cow<'_, FieldValue>, AttributeError> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let root = self.get(head)?;
        let Some(rest) = rest else {
            return Ok(root);
        };
        let missing = || self.missing(path);
        match root {
            Cow::Borrowed(value) => value.lookup(rest).map(Cow::Borrowed).ok_or_else(missing),
            Cow::Owned(value) => value
                .lookup(rest)
                .cloned()
                .map(Cow::Owned)
                .ok_or_else(missing),
        }
    }

    /// Model value that an attach rule may write into: an own field holding a
    /// model, or a model-valued attribute of the proxy target.
    pub(crate) fn model_mut(&mut self, name: &str) -> Option<&mut ModelValue> {
        if self.descriptor.fields().declares(name) {
            return match self.fields.get_mut(name) {
                Some(FieldValue::Model(model)) => Some(model),
                _ => None,
            };
        }
        let target = self.descriptor.proxy()?;
        match self.fields.get_mut(target) {
            Some(FieldValue::Model(proxy)) if proxy.schema().declares(name) => {
                match proxy.get_mut(name) {
                    Some(FieldValue::Model(model)) => Some(model),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// JSON rendering of the own field values.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }
}

impl Serialize for DecodedEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DecodedEvent", 3)?;
        state.serialize_field("t", self.tag())?;
        state.serialize_field("s", &self.sequence)?;
        state.serialize_field("d", &self.fields)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewire_protocol::{FieldSpec, FieldType, Snowflake, models};
    use serde_json::json;

    fn guild_ban_add() -> Arc<VariantDescriptor> {
        Arc::new(
            VariantDescriptor::builder("GuildBanAdd")
                .field(FieldSpec::new("guild_id", FieldType::Snowflake))
                .field(FieldSpec::new("user", FieldType::model(models::user)))
                .proxy("user")
                .derived("banned", |_| FieldValue::Bool(true))
                .build()
                .unwrap(),
        )
    }

    fn decoded(body: Value) -> DecodedEvent {
        let descriptor = guild_ban_add();
        let fields = match &body {
            Value::Object(obj) => descriptor.fields().decode_fields(obj).unwrap(),
            _ => IndexMap::new(),
        };
        DecodedEvent::new(descriptor, fields, body, Arc::new(DispatchContext::default()))
    }

    #[test]
    fn own_fields_resolve_before_proxy() {
        let event = decoded(json!({"guild_id": "1", "user": {"id": "2", "username": "ada"}}));
        assert_eq!(
            event.get("guild_id").unwrap().as_snowflake(),
            Some(Snowflake::new(1))
        );
        assert_eq!(event.get("username").unwrap().as_str(), Some("ada"));
        assert_eq!(event.get("banned").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn proxied_reads_match_reading_the_target() {
        let event = decoded(json!({"user": {"id": "2", "username": "ada", "bot": true}}));
        let user = event.field("user").unwrap().as_model().unwrap();
        for name in ["id", "username", "bot", "system", "avatar"] {
            assert_eq!(event.get(name).unwrap().as_ref(), user.get(name).unwrap());
        }
    }

    #[test]
    fn unknown_attribute_names_the_event() {
        let event = decoded(json!({"user": {"id": "2"}}));
        let err = event.get("nickname").unwrap_err();
        assert_eq!(
            err,
            AttributeError::NoSuchAttribute {
                event: "GuildBanAdd".into(),
                name: "nickname".into(),
            }
        );
        assert_eq!(err.to_string(), "GuildBanAdd has no attribute `nickname`");
    }

    #[test]
    fn absent_proxy_target_surfaces_original_error() {
        let event = decoded(json!({"guild_id": "1"}));
        assert_eq!(event.field("user").unwrap(), &FieldValue::Null);
        assert!(matches!(
            event.get("username"),
            Err(AttributeError::NoSuchAttribute { name, .. }) if name == "username"
        ));
    }

    #[test]
    fn get_path_walks_nested_models() {
        let event = decoded(json!({"user": {"id": "2"}}));
        assert_eq!(
            event.get_path("user.id").unwrap().as_snowflake(),
            Some(Snowflake::new(2))
        );
        assert!(event.get_path("user.nope").is_err());
    }

    #[test]
    fn serializes_as_dispatch_shape() {
        let mut event = decoded(json!({"guild_id": "1"}));
        event.set_sequence(Some(7));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"t": "GUILD_BAN_ADD", "s": 7, "d": {"guild_id": "1"}})
        );
    }
}
