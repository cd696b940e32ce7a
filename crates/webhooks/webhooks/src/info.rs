//! Per-event delivery outcome reported to hooks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use media_webhooks_events::WebhookEvent;
use serde::Serialize;

/// What happened to one event: when it was queued, how long it waited,
/// how long the send took and whether it failed or was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookInfo {
    pub event_id: String,
    pub event: String,
    pub room_sid: String,
    pub room_name: String,
    pub participant_identity: String,
    pub participant_sid: String,
    pub track_sid: String,
    pub egress_id: String,
    pub ingress_id: String,
    /// When the event occurred (unix seconds).
    pub created_at: i64,
    /// When the event was accepted into its partition.
    pub queued_at: Option<DateTime<Utc>>,
    /// Time spent waiting for a worker.
    pub queue_duration: Duration,
    /// When the send started.
    pub sent_at: Option<DateTime<Utc>>,
    /// Time spent sending, including retries.
    pub send_duration: Duration,
    pub url: String,
    /// Drops reported to the endpoint with this event.
    pub num_dropped: i32,
    /// The event was rejected by a full partition and never sent.
    pub is_dropped: bool,
    /// Final send error, if the send failed.
    pub send_error: Option<String>,
}

impl WebhookInfo {
    /// Captures the identifying fields of an event.
    pub fn for_event(event: &WebhookEvent, url: &str) -> Self {
        let room = event.room.as_ref();
        let participant = event.participant.as_ref();

        Self {
            event_id: event.id.clone(),
            event: event.event.clone(),
            room_sid: room.map(|r| r.sid.clone()).unwrap_or_default(),
            room_name: room.map(|r| r.name.clone()).unwrap_or_default(),
            participant_identity: participant.map(|p| p.identity.clone()).unwrap_or_default(),
            participant_sid: participant.map(|p| p.sid.clone()).unwrap_or_default(),
            track_sid: event.track.as_ref().map(|t| t.sid.clone()).unwrap_or_default(),
            egress_id: event
                .egress_info
                .as_ref()
                .map(|e| e.egress_id.clone())
                .unwrap_or_default(),
            ingress_id: event
                .ingress_info
                .as_ref()
                .map(|i| i.ingress_id.clone())
                .unwrap_or_default(),
            created_at: event.created_at,
            num_dropped: event.num_dropped,
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Returns true if the event reached the endpoint.
    pub fn is_delivered(&self) -> bool {
        !self.is_dropped && self.send_error.is_none()
    }
}
