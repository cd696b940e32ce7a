//! The webhook event envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{EgressInfo, IngressInfo, ParticipantInfo, Room, TrackInfo};
use crate::wire::{int64, is_default};

/// A state change delivered to a webhook endpoint.
///
/// Which context records are present depends on [`WebhookEvent::event`]:
/// room events carry `room`, participant and track events add
/// `participant` (and `track`), egress and ingress events carry their job
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event name, one of [`crate::event_names`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackInfo>,
    #[serde(default, alias = "egress_info", skip_serializing_if = "Option::is_none")]
    pub egress_info: Option<EgressInfo>,
    #[serde(default, alias = "ingress_info", skip_serializing_if = "Option::is_none")]
    pub ingress_info: Option<IngressInfo>,
    /// Unique event id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Unix seconds when the event occurred.
    #[serde(default, alias = "created_at", with = "int64", skip_serializing_if = "is_default")]
    pub created_at: i64,
    /// Events dropped since the previously delivered one. Set by the sender.
    #[serde(default, alias = "num_dropped", skip_serializing_if = "is_default")]
    pub num_dropped: i32,
}

impl WebhookEvent {
    /// Creates an event with a fresh id, stamped with the current time.
    pub fn new(event: impl Into<String>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            event: event.into(),
            id: format!("EV_{}", &suffix[..12]),
            created_at: Utc::now().timestamp(),
            ..Default::default()
        }
    }

    /// Overrides the event id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attaches the room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.room = Some(room);
        self
    }

    /// Attaches the participant.
    pub fn with_participant(mut self, participant: ParticipantInfo) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Attaches the track.
    pub fn with_track(mut self, track: TrackInfo) -> Self {
        self.track = Some(track);
        self
    }

    /// Attaches the egress job.
    pub fn with_egress(mut self, egress: EgressInfo) -> Self {
        self.egress_info = Some(egress);
        self
    }

    /// Attaches the ingress job.
    pub fn with_ingress(mut self, ingress: IngressInfo) -> Self {
        self.ingress_info = Some(ingress);
        self
    }

    /// Returns the identifier of the room this event belongs to, if any.
    ///
    /// Room names are preferred so that room, egress and ingress events for
    /// one room share a key. Ids are used only when no name is known.
    pub fn room_key(&self) -> Option<&str> {
        let ingress_room_id = self
            .ingress_info
            .as_ref()
            .and_then(|i| i.state.as_ref())
            .map(|s| s.room_id.as_str());

        [
            self.room.as_ref().map(|r| r.name.as_str()),
            self.egress_info.as_ref().map(|e| e.room_name.as_str()),
            self.ingress_info.as_ref().map(|i| i.room_name.as_str()),
            self.room.as_ref().map(|r| r.sid.as_str()),
            self.egress_info.as_ref().map(|e| e.room_id.as_str()),
            ingress_room_id,
        ]
        .into_iter()
        .flatten()
        .find(|key| !key.is_empty())
    }

    /// Encodes the event into its canonical JSON body.
    pub fn to_wire(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes an event from a JSON body.
    pub fn from_wire(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}
