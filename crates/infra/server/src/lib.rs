//! # Media Webhooks Relay
//!
//! Reads webhook events as newline-delimited JSON and queues each one on a
//! notifier. Lines use the same encoding as webhook bodies.

mod config;

pub use config::{load_config, ConfigError, RelayConfig};

use media_webhooks::{Disposition, QueuedNotifier};
use media_webhooks_events::WebhookEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Counts of what happened to relayed lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub queued: usize,
    pub filtered: usize,
    pub dropped: usize,
    /// Lines that did not decode as an event.
    pub invalid: usize,
}

/// Queues every event read from `reader` until end of input.
///
/// Blank lines are skipped. Lines that fail to decode are logged and
/// counted, they do not stop the relay.
pub async fn relay_lines<R>(notifier: &dyn QueuedNotifier, reader: R) -> std::io::Result<RelayStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = RelayStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match WebhookEvent::from_wire(line.as_bytes()) {
            Ok(event) if !event.event.is_empty() => event,
            Ok(_) => {
                tracing::warn!(line = line_no, "skipping event without a name");
                stats.invalid += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "skipping malformed event");
                stats.invalid += 1;
                continue;
            }
        };

        match notifier.queue_notify(event) {
            Disposition::Queued => stats.queued += 1,
            Disposition::Filtered => stats.filtered += 1,
            Disposition::Dropped => stats.dropped += 1,
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<WebhookEvent>>,
    }

    #[async_trait::async_trait]
    impl QueuedNotifier for RecordingNotifier {
        fn queue_notify(&self, event: WebhookEvent) -> Disposition {
            let disposition = match event.event.as_str() {
                "track_published" => Disposition::Filtered,
                "track_unpublished" => Disposition::Dropped,
                _ => Disposition::Queued,
            };
            self.events.lock().unwrap().push(event);
            disposition
        }

        async fn stop(&self, _force: bool) {}
    }

    #[tokio::test]
    async fn test_relay_counts_dispositions() {
        let input = concat!(
            r#"{"event":"room_started","room":{"sid":"RM_1","name":"a"}}"#,
            "\n",
            "\n",
            r#"{"event":"track_published"}"#,
            "\n",
            r#"{"event":"track_unpublished"}"#,
            "\n",
            "not json\n",
            r#"{"id":"EV_1"}"#,
            "\n",
            r#"{"event":"room_finished","createdAt":"1700000000"}"#,
        );
        let notifier = RecordingNotifier::default();

        let stats = relay_lines(&notifier, input.as_bytes()).await.unwrap();
        assert_eq!(
            stats,
            RelayStats {
                queued: 2,
                filtered: 1,
                dropped: 1,
                invalid: 2,
            }
        );

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].room.as_ref().unwrap().sid, "RM_1");
        assert_eq!(events[3].created_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let notifier = RecordingNotifier::default();
        let stats = relay_lines(&notifier, &b""[..]).await.unwrap();
        assert_eq!(stats, RelayStats::default());
    }
}
