//! Context records attached to webhook events.

use serde::{Deserialize, Serialize};

use crate::wire::{int64, is_default};

/// A room and its current configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Server-assigned room id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
    /// Room name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Seconds an empty room is kept open.
    #[serde(default, alias = "empty_timeout", skip_serializing_if = "is_default")]
    pub empty_timeout: u32,
    /// Seconds a room is kept open after the last participant leaves.
    #[serde(default, alias = "departure_timeout", skip_serializing_if = "is_default")]
    pub departure_timeout: u32,
    /// Participant limit, 0 for unlimited.
    #[serde(default, alias = "max_participants", skip_serializing_if = "is_default")]
    pub max_participants: u32,
    /// Unix seconds when the room was created.
    #[serde(default, alias = "creation_time", with = "int64", skip_serializing_if = "is_default")]
    pub creation_time: i64,
    /// Application metadata.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,
    /// Participants currently in the room.
    #[serde(default, alias = "num_participants", skip_serializing_if = "is_default")]
    pub num_participants: u32,
}

impl Room {
    /// Creates a room record.
    pub fn new(sid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Connection state of a participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantState {
    #[default]
    Joining,
    Joined,
    Active,
    Disconnected,
}

/// A participant in a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub state: ParticipantState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata: String,
    /// Unix seconds when the participant joined.
    #[serde(default, alias = "joined_at", with = "int64", skip_serializing_if = "is_default")]
    pub joined_at: i64,
}

impl ParticipantInfo {
    /// Creates a participant record.
    pub fn new(sid: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            identity: identity.into(),
            ..Default::default()
        }
    }
}

/// Media kind of a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackType {
    #[default]
    Audio,
    Video,
    Data,
}

/// Capture source of a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackSource {
    #[default]
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

/// A published track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
    #[serde(default, rename = "type", skip_serializing_if = "is_default")]
    pub kind: TrackType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub muted: bool,
    #[serde(default, skip_serializing_if = "is_default")]
    pub source: TrackSource,
}

impl TrackInfo {
    /// Creates a track record.
    pub fn new(sid: impl Into<String>, kind: TrackType) -> Self {
        Self {
            sid: sid.into(),
            kind,
            ..Default::default()
        }
    }
}

/// Lifecycle status of an egress job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EgressStatus {
    #[default]
    EgressStarting,
    EgressActive,
    EgressEnding,
    EgressComplete,
    EgressFailed,
    EgressAborted,
    EgressLimitReached,
}

/// A recording or streaming job leaving a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressInfo {
    #[serde(default, alias = "egress_id", skip_serializing_if = "String::is_empty")]
    pub egress_id: String,
    #[serde(default, alias = "room_id", skip_serializing_if = "String::is_empty")]
    pub room_id: String,
    #[serde(default, alias = "room_name", skip_serializing_if = "String::is_empty")]
    pub room_name: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub status: EgressStatus,
    /// Unix nanoseconds.
    #[serde(default, alias = "started_at", with = "int64", skip_serializing_if = "is_default")]
    pub started_at: i64,
    /// Unix nanoseconds.
    #[serde(default, alias = "ended_at", with = "int64", skip_serializing_if = "is_default")]
    pub ended_at: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl EgressInfo {
    /// Creates an egress record bound to a room.
    pub fn new(egress_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            egress_id: egress_id.into(),
            room_id: room_id.into(),
            ..Default::default()
        }
    }
}

/// Endpoint status of an ingress job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngressStatus {
    #[default]
    EndpointInactive,
    EndpointBuffering,
    EndpointPublishing,
    EndpointError,
    EndpointComplete,
}

/// Runtime state of an ingress job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressState {
    #[serde(default, skip_serializing_if = "is_default")]
    pub status: IngressStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, alias = "room_id", skip_serializing_if = "String::is_empty")]
    pub room_id: String,
    #[serde(default, alias = "started_at", with = "int64", skip_serializing_if = "is_default")]
    pub started_at: i64,
    #[serde(default, alias = "ended_at", with = "int64", skip_serializing_if = "is_default")]
    pub ended_at: i64,
}

/// A media stream being pushed into a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressInfo {
    #[serde(default, alias = "ingress_id", skip_serializing_if = "String::is_empty")]
    pub ingress_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, alias = "room_name", skip_serializing_if = "String::is_empty")]
    pub room_name: String,
    #[serde(default, alias = "participant_identity", skip_serializing_if = "String::is_empty")]
    pub participant_identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IngressState>,
}

impl IngressInfo {
    /// Creates an ingress record targeting a room.
    pub fn new(ingress_id: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            ingress_id: ingress_id.into(),
            room_name: room_name.into(),
            ..Default::default()
        }
    }
}
