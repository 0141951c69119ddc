use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gatewire_events::{
    DecodedEvent, DispatchContext, DispatchPolicy, Dispatcher, EventRegistry, EventRouter,
    GatewayPump,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod source;

use source::FrameReader;

#[derive(Debug, Parser)]
#[command(name = "gatewired")]
#[command(about = "Replay captured gateway frames through the event decoder")]
struct Cli {
    /// JSON-lines capture of gateway frames; `-` reads stdin.
    #[arg(long, default_value = "-")]
    input: PathBuf,
    /// Dispatch policy JSON file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop at the first unknown or undecodable event.
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    log_json: bool,
    /// Print every registered tag and exit.
    #[arg(long)]
    list_tags: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

/// `name=value` pairs for the common id attributes an event resolves.
fn summary(event: &DecodedEvent) -> String {
    ["id", "guild_id", "channel_id", "user_id"]
        .into_iter()
        .filter_map(|name| {
            let value = event.get(name).ok()?;
            if value.is_null() {
                return None;
            }
            let rendered = value
                .key_string()
                .unwrap_or_else(|| value.to_json().to_string());
            Some(format!("{name}={rendered}"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render every broadcast event at debug until the router goes away.
/// Returns how many events were rendered.
async fn render_events(mut events: broadcast::Receiver<Arc<DecodedEvent>>) -> u64 {
    let mut rendered = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                let json = serde_json::to_string(&*event).unwrap_or_else(|_| "{}".to_owned());
                debug!(event = %json, "event.rendered");
                rendered += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event renderer fell behind; events not rendered");
            }
            Err(RecvError::Closed) => return rendered,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let registry = Arc::new(EventRegistry::standard().context("failed building event registry")?);
    if cli.list_tags {
        for tag in registry.tags() {
            println!("{tag}");
        }
        return Ok(());
    }

    let mut policy = match &cli.config {
        Some(path) => DispatchPolicy::from_path(path)?,
        None => DispatchPolicy::default(),
    };
    if cli.strict {
        policy = policy.strict();
    }
    info!(events = registry.len(), ?policy, "registry ready");

    let router = EventRouter::new(policy.broadcast_capacity);
    router.on_any(|event| {
        info!(
            tag = event.tag(),
            seq = ?event.sequence(),
            summary = %summary(event),
            "event.decoded"
        );
    });

    let event_task = tokio::spawn(render_events(router.subscribe()));

    let context = DispatchContext::new(policy.shard_id);
    info!(connection_id = %context.connection_id, shard = context.shard_id, "replay started");

    let pump = GatewayPump::new(Dispatcher::new(registry), router, policy).with_context(context);
    let mut reader = FrameReader::open(&cli.input).await?;
    let stats = pump.run(&mut reader).await?;

    drop(pump);
    let rendered = event_task.await.unwrap_or_default();

    info!(
        decoded = stats.decoded,
        dropped_unknown = stats.dropped_unknown,
        dropped_invalid = stats.dropped_invalid,
        attach_applied = stats.attach_applied,
        attach_skipped = stats.attach_skipped,
        rendered,
        skipped_control = reader.skipped_control(),
        skipped_malformed = reader.skipped_malformed(),
        "replay complete"
    );
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn renderer_keeps_going_after_lagging() {
        let router = EventRouter::new(2);
        let events = router.subscribe();
        let dispatcher = Dispatcher::new(Arc::new(EventRegistry::standard().unwrap()));
        for channel in 1..=5 {
            let event = dispatcher
                .decode(
                    "TYPING_START",
                    json!({"channel_id": channel.to_string()}),
                    Arc::new(DispatchContext::default()),
                )
                .unwrap();
            router.emit(event);
        }
        drop(router);

        // Three events were overwritten; the last two still render.
        assert_eq!(render_events(events).await, 2);
    }

    #[test]
    fn summary_lists_resolved_ids() {
        let dispatcher = Dispatcher::new(Arc::new(EventRegistry::standard().unwrap()));
        let event = dispatcher
            .decode(
                "MESSAGE_CREATE",
                json!({"id": "3", "channel_id": "4"}),
                Arc::new(DispatchContext::default()),
            )
            .unwrap();
        assert_eq!(summary(&event), "id=3 channel_id=4");
    }
}
