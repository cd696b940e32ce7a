//! # Media Webhooks Events
//!
//! Event model for webhook notifications emitted by a real-time media
//! platform:
//! - A single envelope type, [`WebhookEvent`], tagged by event name
//! - Context records for rooms, participants, tracks, egress and ingress jobs
//! - A protobuf-JSON compatible wire encoding
//!
//! ## Example
//!
//! ```rust,ignore
//! use media_webhooks_events::{event_names, Room, WebhookEvent};
//!
//! let event = WebhookEvent::new(event_names::ROOM_STARTED)
//!     .with_room(Room::new("RM_abc", "standup"));
//!
//! let body = event.to_wire()?;
//! ```

mod event;
mod models;
mod wire;

pub use event::WebhookEvent;
pub use models::{
    EgressInfo, EgressStatus, IngressInfo, IngressState, IngressStatus, ParticipantInfo,
    ParticipantState, Room, TrackInfo, TrackSource, TrackType,
};

/// Event names carried in [`WebhookEvent::event`].
pub mod event_names {
    /// A room was created and its first participant joined.
    pub const ROOM_STARTED: &str = "room_started";
    /// A room was closed.
    pub const ROOM_FINISHED: &str = "room_finished";
    /// A participant joined a room.
    pub const PARTICIPANT_JOINED: &str = "participant_joined";
    /// A participant left a room.
    pub const PARTICIPANT_LEFT: &str = "participant_left";
    /// A participant's connection was aborted before it fully joined.
    pub const PARTICIPANT_CONNECTION_ABORTED: &str = "participant_connection_aborted";
    /// A track was published.
    pub const TRACK_PUBLISHED: &str = "track_published";
    /// A track was unpublished.
    pub const TRACK_UNPUBLISHED: &str = "track_unpublished";
    /// An egress job started.
    pub const EGRESS_STARTED: &str = "egress_started";
    /// An egress job changed state.
    pub const EGRESS_UPDATED: &str = "egress_updated";
    /// An egress job ended.
    pub const EGRESS_ENDED: &str = "egress_ended";
    /// An ingress job started.
    pub const INGRESS_STARTED: &str = "ingress_started";
    /// An ingress job ended.
    pub const INGRESS_ENDED: &str = "ingress_ended";

    /// All known event names.
    pub const ALL: &[&str] = &[
        ROOM_STARTED,
        ROOM_FINISHED,
        PARTICIPANT_JOINED,
        PARTICIPANT_LEFT,
        PARTICIPANT_CONNECTION_ABORTED,
        TRACK_PUBLISHED,
        TRACK_UNPUBLISHED,
        EGRESS_STARTED,
        EGRESS_UPDATED,
        EGRESS_ENDED,
        INGRESS_STARTED,
        INGRESS_ENDED,
    ];
}
