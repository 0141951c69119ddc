//! Error types for the gateway protocol.

use serde_json::Value;
use thiserror::Error;

/// A raw JSON value could not be coerced into its declared field type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoercionError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Value },
    #[error("invalid timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: String },
    #[error("keyed entry is missing key field `{key}`")]
    MissingKey { key: &'static str, entry: Value },
    #[error("{field}: {source}")]
    InField {
        field: String,
        #[source]
        source: Box<CoercionError>,
    },
}

impl CoercionError {
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.clone(),
        }
    }

    /// Wrap this error with the name (or list index) of the field it occurred in.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::InField {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Dotted path from the outermost field to the failing value (`author.id`).
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = self;
        while let Self::InField { field, source } = current {
            segments.push(field.as_str());
            current = &**source;
        }
        segments.join(".")
    }

    /// The innermost error, stripped of field context.
    pub fn root(&self) -> &CoercionError {
        let mut current = self;
        while let Self::InField { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// The raw value that failed coercion.
    pub fn offending_value(&self) -> Value {
        match self.root() {
            Self::TypeMismatch { found, .. } => found.clone(),
            Self::InvalidTimestamp { raw, .. } => Value::String(raw.clone()),
            Self::MissingKey { entry, .. } => entry.clone(),
            Self::InField { .. } => Value::Null,
        }
    }
}

/// Errors raised while reading wire frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown gateway opcode: {0}")]
    UnknownOpcode(u8),
}
