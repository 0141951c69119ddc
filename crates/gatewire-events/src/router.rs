//! Event routing: per-tag handlers, broadcast subscribers, and the pump that
//! drains a transport source through the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use gatewire_protocol::RawEnvelope;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, instrument, warn};

use crate::config::{DispatchPolicy, FailurePolicy};
use crate::dispatch::{DecodeError, Dispatcher};
use crate::event::{DecodedEvent, DispatchContext};

/// Ordered supply of dispatch envelopes from a transport.
#[async_trait]
pub trait EnvelopeSource: Send {
    /// `None` once the transport is exhausted.
    async fn next_envelope(&mut self) -> Option<Result<RawEnvelope>>;
}

#[async_trait]
impl EnvelopeSource for mpsc::Receiver<RawEnvelope> {
    async fn next_envelope(&mut self) -> Option<Result<RawEnvelope>> {
        self.recv().await.map(Ok)
    }
}

/// Adapts any fallible envelope stream into an [`EnvelopeSource`].
#[derive(Debug)]
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> EnvelopeSource for StreamSource<S>
where
    S: Stream<Item = Result<RawEnvelope>> + Unpin + Send,
{
    async fn next_envelope(&mut self) -> Option<Result<RawEnvelope>> {
        self.inner.next().await
    }
}

pub type Handler = Arc<dyn Fn(&DecodedEvent) + Send + Sync>;

/// Fans decoded events out to registered handlers and broadcast subscribers.
#[derive(Clone)]
pub struct EventRouter {
    by_tag: Arc<RwLock<HashMap<String, Vec<Handler>>>>,
    catch_all: Arc<RwLock<Vec<Handler>>>,
    sender: broadcast::Sender<Arc<DecodedEvent>>,
}

impl EventRouter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            by_tag: Arc::new(RwLock::new(HashMap::new())),
            catch_all: Arc::new(RwLock::new(Vec::new())),
            sender,
        }
    }

    /// Register `handler` for one tag.
    pub fn on<F>(&self, tag: impl Into<String>, handler: F)
    where
        F: Fn(&DecodedEvent) + Send + Sync + 'static,
    {
        self.by_tag
            .write()
            .entry(tag.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Register `handler` for every tag.
    pub fn on_any<F>(&self, handler: F)
    where
        F: Fn(&DecodedEvent) + Send + Sync + 'static,
    {
        self.catch_all.write().push(Arc::new(handler));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DecodedEvent>> {
        self.sender.subscribe()
    }

    pub fn subscribe_stream(&self) -> BroadcastStream<Arc<DecodedEvent>> {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn handler_count(&self, tag: &str) -> usize {
        self.by_tag.read().get(tag).map_or(0, Vec::len) + self.catch_all.read().len()
    }

    /// Deliver `event` to tag handlers, then catch-all handlers, then
    /// subscribers. Returns how many handlers ran.
    pub fn emit(&self, event: DecodedEvent) -> usize {
        // Snapshot so handlers may register more handlers without deadlocking.
        let mut handlers: Vec<Handler> = self
            .by_tag
            .read()
            .get(event.tag())
            .cloned()
            .unwrap_or_default();
        handlers.extend(self.catch_all.read().iter().cloned());

        for handler in &handlers {
            handler(&event);
        }
        let _ = self.sender.send(Arc::new(event));
        handlers.len()
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(DispatchPolicy::default().broadcast_capacity)
    }
}

/// Counters reported by [`GatewayPump::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpStats {
    pub decoded: u64,
    pub dropped_unknown: u64,
    pub dropped_invalid: u64,
    pub attach_applied: u64,
    pub attach_skipped: u64,
}

/// Drains an [`EnvelopeSource`] through the dispatcher into a router.
pub struct GatewayPump {
    dispatcher: Dispatcher,
    router: EventRouter,
    policy: DispatchPolicy,
    context: Arc<DispatchContext>,
}

impl GatewayPump {
    pub fn new(dispatcher: Dispatcher, router: EventRouter, policy: DispatchPolicy) -> Self {
        let context = Arc::new(DispatchContext::new(policy.shard_id));
        Self {
            dispatcher,
            router,
            policy,
            context,
        }
    }

    pub fn with_context(mut self, context: DispatchContext) -> Self {
        self.context = Arc::new(context);
        self
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    /// Pull envelopes until the source is exhausted, decoding and emitting
    /// each in arrival order.
    pub async fn run<S>(&self, source: &mut S) -> Result<PumpStats>
    where
        S: EnvelopeSource + ?Sized,
    {
        let mut stats = PumpStats::default();
        while let Some(next) = source.next_envelope().await {
            let envelope = next.context("envelope source failed")?;
            self.handle(envelope, &mut stats)?;
        }
        debug!(?stats, "envelope source exhausted");
        Ok(stats)
    }

    #[instrument(
        skip(self, envelope, stats),
        fields(tag = %envelope.tag, seq = ?envelope.sequence, shard = self.context.shard_id)
    )]
    fn handle(&self, envelope: RawEnvelope, stats: &mut PumpStats) -> Result<()> {
        match self
            .dispatcher
            .decode_envelope(envelope, Arc::clone(&self.context))
        {
            Ok(event) => {
                let report = event.attach_report();
                stats.decoded += 1;
                stats.attach_applied += report.applied as u64;
                stats.attach_skipped += report.skipped as u64;
                let handlers = self.router.emit(event);
                debug!(handlers, "event decoded");
                Ok(())
            }
            Err(err @ DecodeError::UnknownEventKind(_)) => match self.policy.on_unknown {
                FailurePolicy::Drop => {
                    warn!(error = %err, "dropping unknown event");
                    stats.dropped_unknown += 1;
                    Ok(())
                }
                FailurePolicy::Fail => Err(err.into()),
            },
            Err(err @ DecodeError::FieldCoercion { .. }) => match self.policy.on_invalid {
                FailurePolicy::Drop => {
                    warn!(
                        error = %err,
                        field = %err.field_path().unwrap_or_default(),
                        "dropping undecodable event"
                    );
                    stats.dropped_invalid += 1;
                    Ok(())
                }
                FailurePolicy::Fail => Err(err.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::Result;
    use gatewire_protocol::{FieldSpec, FieldType, models};
    use serde_json::json;

    use super::*;
    use crate::descriptor::VariantDescriptor;
    use crate::registry::EventRegistry;

    fn dispatcher() -> Dispatcher {
        let mut builder = EventRegistry::builder();
        builder
            .declare(
                VariantDescriptor::builder("GuildRoleCreate")
                    .field(FieldSpec::new("role", FieldType::model(models::role)))
                    .field(FieldSpec::new("guild_id", FieldType::Snowflake))
                    .proxy("role")
                    .attach("guild_id", "role", "guild_id"),
            )
            .unwrap()
            .declare(
                VariantDescriptor::builder("TypingStart")
                    .field(FieldSpec::new("channel_id", FieldType::Snowflake)),
            )
            .unwrap();
        Dispatcher::new(Arc::new(builder.build()))
    }

    fn envelopes() -> Vec<RawEnvelope> {
        vec![
            RawEnvelope::new("TYPING_START", json!({"channel_id": "1"})).with_sequence(1),
            RawEnvelope::new("NOT_A_REAL_EVENT", json!({})).with_sequence(2),
            RawEnvelope::new("GUILD_ROLE_CREATE", json!({"guild_id": "5", "role": {"id": "6"}}))
                .with_sequence(3),
            RawEnvelope::new("TYPING_START", json!({"channel_id": true})).with_sequence(4),
        ]
    }

    async fn channel_source(items: Vec<RawEnvelope>) -> mpsc::Receiver<RawEnvelope> {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for envelope in items {
            tx.send(envelope).await.unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn drop_policy_counts_and_continues() -> Result<()> {
        let router = EventRouter::new(16);
        let pump = GatewayPump::new(dispatcher(), router, DispatchPolicy::default());
        let mut source = channel_source(envelopes()).await;

        let stats = pump.run(&mut source).await?;
        assert_eq!(
            stats,
            PumpStats {
                decoded: 2,
                dropped_unknown: 1,
                dropped_invalid: 1,
                attach_applied: 1,
                attach_skipped: 0,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn strict_policy_stops_at_first_failure() {
        let pump = GatewayPump::new(
            dispatcher(),
            EventRouter::new(16),
            DispatchPolicy::default().strict(),
        );
        let mut source = channel_source(envelopes()).await;
        let err = pump.run(&mut source).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::UnknownEventKind(tag)) if tag == "NOT_A_REAL_EVENT"
        ));
    }

    #[tokio::test]
    async fn handlers_and_subscribers_see_events_in_order() -> Result<()> {
        let router = EventRouter::new(16);
        let typing = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));
        {
            let typing = Arc::clone(&typing);
            router.on("TYPING_START", move |_| {
                typing.fetch_add(1, Ordering::SeqCst);
            });
            let all = Arc::clone(&all);
            router.on_any(move |_| {
                all.fetch_add(1, Ordering::SeqCst);
            });
        }
        let mut events = router.subscribe();

        let pump = GatewayPump::new(dispatcher(), router.clone(), DispatchPolicy::default());
        let mut source = channel_source(envelopes()).await;
        pump.run(&mut source).await?;

        assert_eq!(typing.load(Ordering::SeqCst), 1);
        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(events.recv().await?.sequence(), Some(1));
        let role = events.recv().await?;
        assert_eq!(role.sequence(), Some(3));
        assert_eq!(role.tag(), "GUILD_ROLE_CREATE");
        Ok(())
    }

    #[tokio::test]
    async fn handlers_may_register_during_emit() {
        let router = EventRouter::new(4);
        let inner = router.clone();
        router.on("TYPING_START", move |_| {
            inner.on("TYPING_START", |_| {});
        });
        let event = dispatcher()
            .decode(
                "TYPING_START",
                json!({}),
                Arc::new(DispatchContext::default()),
            )
            .unwrap();
        assert_eq!(router.emit(event), 1);
        assert_eq!(router.handler_count("TYPING_START"), 2);
    }

    #[tokio::test]
    async fn stream_source_feeds_the_pump() -> Result<()> {
        let router = EventRouter::new(16);
        let mut stream = router.subscribe_stream();
        let pump = GatewayPump::new(dispatcher(), router, DispatchPolicy::default());
        let items: Vec<Result<RawEnvelope>> = vec![Ok(RawEnvelope::new(
            "TYPING_START",
            json!({"channel_id": "9"}),
        ))];
        let mut source = StreamSource::new(tokio_stream::iter(items));

        let stats = pump.run(&mut source).await?;
        assert_eq!(stats.decoded, 1);
        let event = stream.next().await.unwrap()?;
        assert_eq!(event.tag(), "TYPING_START");
        Ok(())
    }

    #[tokio::test]
    async fn source_errors_abort_the_run() {
        let pump = GatewayPump::new(dispatcher(), EventRouter::new(4), DispatchPolicy::default());
        let items: Vec<Result<RawEnvelope>> = vec![Err(anyhow::anyhow!("socket closed"))];
        let mut source = StreamSource::new(tokio_stream::iter(items));
        let err = pump.run(&mut source).await.unwrap_err();
        assert!(err.to_string().contains("envelope source failed"));
    }

    #[tokio::test]
    async fn pump_context_uses_configured_shard() {
        let policy = DispatchPolicy {
            shard_id: 4,
            ..DispatchPolicy::default()
        };
        let pump = GatewayPump::new(dispatcher(), EventRouter::default(), policy);
        assert_eq!(pump.context().shard_id, 4);
    }
}
