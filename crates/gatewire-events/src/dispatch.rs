//! Dispatcher: `(tag, body, context)` → [`DecodedEvent`].

use std::sync::Arc;

use gatewire_protocol::{CoercionError, RawEnvelope};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::attach;
use crate::event::{DecodedEvent, DispatchContext};
use crate::registry::EventRegistry;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("unknown event kind `{0}`")]
    UnknownEventKind(String),
    #[error("{variant}: {source}")]
    FieldCoercion {
        variant: String,
        #[source]
        source: CoercionError,
    },
}

impl DecodeError {
    /// Dotted path of the field that failed coercion.
    pub fn field_path(&self) -> Option<String> {
        match self {
            Self::FieldCoercion { source, .. } => Some(source.path()),
            Self::UnknownEventKind(_) => None,
        }
    }

    /// Raw value that failed coercion.
    pub fn offending_value(&self) -> Option<Value> {
        match self {
            Self::FieldCoercion { source, .. } => Some(source.offending_value()),
            Self::UnknownEventKind(_) => None,
        }
    }
}

/// Decodes envelopes against a frozen [`EventRegistry`].
///
/// Decoding is synchronous and side-effect free; one dispatcher can be shared
/// across tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<EventRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Decode one dispatch body.
    ///
    /// The body is retained unchanged on the event; embed migration works on
    /// a copy. Attach rules never fail the decode.
    pub fn decode(
        &self,
        tag: &str,
        body: Value,
        context: Arc<DispatchContext>,
    ) -> Result<DecodedEvent, DecodeError> {
        let descriptor = self
            .registry
            .lookup(tag)
            .ok_or_else(|| DecodeError::UnknownEventKind(tag.to_owned()))?;

        if descriptor.traces_raw() {
            debug!(tag, body = %body, "raw dispatch body");
        }

        let coerced = match (&body, descriptor.embed()) {
            (Value::Object(obj), Some(embed)) => {
                let mut working = obj.clone();
                embed.migrate(&mut working);
                descriptor.fields().decode_fields(&working)
            }
            (Value::Object(obj), None) => descriptor.fields().decode_fields(obj),
            _ => Ok(IndexMap::new()),
        };
        let fields = coerced.map_err(|source| DecodeError::FieldCoercion {
            variant: descriptor.name().to_owned(),
            source,
        })?;

        let mut event = DecodedEvent::new(Arc::clone(descriptor), fields, body, context);
        attach::apply_all(&mut event);
        Ok(event)
    }

    /// Decode an envelope, carrying its sequence number onto the event.
    pub fn decode_envelope(
        &self,
        envelope: RawEnvelope,
        context: Arc<DispatchContext>,
    ) -> Result<DecodedEvent, DecodeError> {
        let RawEnvelope {
            tag,
            body,
            sequence,
        } = envelope;
        let mut event = self.decode(&tag, body, context)?;
        event.set_sequence(sequence);
        Ok(event)
    }
}
