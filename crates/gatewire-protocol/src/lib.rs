//! # gatewire-protocol: Gateway protocol contract
//!
//! Shared types for decoding a real-time chat gateway: identifiers, wire
//! frames, the declarative schema framework and the domain schemas built on
//! it.
//!
//! No runtime dependencies (no tokio, no tracing), so it can be used as a
//! pure contract crate.
//!
//! ## Module Overview
//!
//! - [`ids`]: `Snowflake` and connection-local typed ids
//! - [`schema`]: `Schema`, `FieldSpec`, `FieldType` and JSON coercion
//! - [`value`]: `FieldValue` / `ModelValue` produced by decoding
//! - [`models`]: domain schemas (User, Guild, Channel, Message, ...)
//! - [`wire`]: `GatewayFrame`, `GatewayOpcode`, `RawEnvelope`
//! - [`error`]: `CoercionError`, `WireError`

pub mod error;
pub mod ids;
pub mod models;
pub mod schema;
pub mod value;
pub mod wire;

pub use error::{CoercionError, WireError};
pub use ids::{ConnectionId, SNOWFLAKE_EPOCH_MS, Snowflake};
pub use schema::{FieldSpec, FieldType, Schema, SchemaRef};
pub use value::{FieldValue, ModelValue};
pub use wire::{GatewayFrame, GatewayOpcode, RawEnvelope};
