//! Media Webhooks Relay binary.
//!
//! Usage: `media-webhooks-relay [config.toml]`. Events are read from stdin,
//! one JSON object per line. End of input sends everything still queued,
//! Ctrl-C abandons it.

use media_webhooks::UrlNotifier;
use media_webhooks_relay::{load_config, relay_lines};
use tokio::io::BufReader;

const DEFAULT_CONFIG_PATH: &str = "media-webhooks-relay.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;

    tracing_subscriber::fmt().with_max_level(config.level()).init();

    let notifier = UrlNotifier::new(config.webhook)?;
    tracing::info!(url = notifier.url(), config = %path, "relaying webhook events from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        stats = relay_lines(&notifier, stdin) => {
            let stats = stats?;
            tracing::info!(
                queued = stats.queued,
                filtered = stats.filtered,
                dropped = stats.dropped,
                invalid = stats.invalid,
                "end of input, sending queued webhooks"
            );
            notifier.stop(false).await;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(queued = notifier.queued(), "interrupted, abandoning queued webhooks");
            notifier.stop(true).await;
        }
    }

    if notifier.pending_drops() > 0 {
        tracing::warn!(dropped = notifier.pending_drops(), "some webhooks were not delivered");
    }
    Ok(())
}
