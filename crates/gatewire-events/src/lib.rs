//! # gatewire-events: Gateway event decoding
//!
//! Turns raw gateway dispatches (`{t, d}`) into typed [`DecodedEvent`]s.
//!
//! ## Module Overview
//!
//! - [`naming`]: `tag_of`, PascalCase variant name → wire tag
//! - [`descriptor`]: `VariantDescriptor` with embed, proxy, attach and derived directives
//! - [`registry`]: `RegistryBuilder` / frozen `EventRegistry`
//! - [`catalog`]: every known gateway event kind
//! - [`dispatch`]: `Dispatcher::decode`
//! - [`event`]: `DecodedEvent` and attribute resolution (`field`, `proxied`, `get`)
//! - [`config`]: `DispatchPolicy`
//! - [`router`]: `EventRouter`, `EnvelopeSource`, `GatewayPump`

mod attach;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod event;
pub mod naming;
pub mod registry;
pub mod router;

pub use catalog::KNOWN_TAGS;
pub use config::{DispatchPolicy, FailurePolicy};
pub use descriptor::{
    AttachRule, DerivedFn, DescriptorBuilder, DescriptorError, Embed, VariantDescriptor,
};
pub use dispatch::{DecodeError, Dispatcher};
pub use event::{AttachReport, AttributeError, DecodedEvent, DispatchContext};
pub use naming::tag_of;
pub use registry::{EventRegistry, RegistryBuilder, RegistryError};
pub use router::{EnvelopeSource, EventRouter, GatewayPump, Handler, PumpStats, StreamSource};
