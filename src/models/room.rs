use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical room lifecycle. Forward-only: a room moves from draft towards
/// ended and never back. Self-transitions are accepted as idempotent no-ops
/// so repeated heartbeats and redelivered webhooks stay harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Draft,
    Scheduled,
    Live,
    Ended,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Draft => "draft",
            RoomStatus::Scheduled => "scheduled",
            RoomStatus::Live => "live",
            RoomStatus::Ended => "ended",
        }
    }

    pub fn can_transition_to(self, next: RoomStatus) -> bool {
        use RoomStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Draft, Scheduled)
                | (Draft, Live)
                | (Draft, Ended)
                | (Scheduled, Live)
                | (Scheduled, Ended)
                | (Live, Ended)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(RoomStatus::Draft),
            "scheduled" => Ok(RoomStatus::Scheduled),
            "live" => Ok(RoomStatus::Live),
            "ended" => Ok(RoomStatus::Ended),
            _ => Err(()),
        }
    }
}

/// Database row for a seller's live auction room. Carries the broadcast
/// secrets, so it is deliberately not serializable; clients only ever see
/// [`RoomDto`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: Uuid,
    pub seller_id: String,
    pub seller_name: String,
    pub title: String,
    pub description: Option<String>,
    pub status: RoomStatus,
    pub category: Option<String>,
    pub visibility: String,
    pub cover_url: Option<String>,
    pub stream_provider: Option<String>,
    pub stream_id: Option<String>,
    pub playback_id: Option<String>,
    pub ingest_url: Option<String>,
    pub stream_key: Option<String>,
    pub viewer_count: i64,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing room shape. `ingest_url` and `stream_key` are absent by
/// construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: Uuid,
    pub seller_id: String,
    pub seller_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub visibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<String>,
    pub viewer_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            seller_id: room.seller_id,
            seller_name: room.seller_name,
            title: room.title,
            description: room.description,
            status: room.status,
            category: room.category,
            visibility: room.visibility,
            cover_url: room.cover_url,
            stream_provider: room.stream_provider,
            playback_id: room.playback_id,
            viewer_count: room.viewer_count,
            scheduled_for: room.scheduled_for,
            started_at: room.started_at,
            ended_at: room.ended_at,
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

pub const VISIBILITIES: &[&str] = &["public", "unlisted"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_legal() {
        assert!(RoomStatus::Draft.can_transition_to(RoomStatus::Scheduled));
        assert!(RoomStatus::Draft.can_transition_to(RoomStatus::Live));
        assert!(RoomStatus::Scheduled.can_transition_to(RoomStatus::Live));
        assert!(RoomStatus::Live.can_transition_to(RoomStatus::Ended));
    }

    #[test]
    fn backward_transitions_are_rejected() {
        assert!(!RoomStatus::Ended.can_transition_to(RoomStatus::Live));
        assert!(!RoomStatus::Ended.can_transition_to(RoomStatus::Draft));
        assert!(!RoomStatus::Live.can_transition_to(RoomStatus::Scheduled));
        assert!(!RoomStatus::Live.can_transition_to(RoomStatus::Draft));
        assert!(!RoomStatus::Scheduled.can_transition_to(RoomStatus::Draft));
    }

    #[test]
    fn self_transitions_are_idempotent() {
        for s in [
            RoomStatus::Draft,
            RoomStatus::Scheduled,
            RoomStatus::Live,
            RoomStatus::Ended,
        ] {
            assert!(s.can_transition_to(s));
        }
    }

    #[test]
    fn room_dto_never_carries_broadcast_secrets() {
        let room = Room {
            id: Uuid::new_v4(),
            seller_id: "s1".into(),
            seller_name: "Jordan".into(),
            title: "Sneaker Drop".into(),
            description: None,
            status: RoomStatus::Live,
            category: None,
            visibility: "public".into(),
            cover_url: None,
            stream_provider: Some("mux".into()),
            stream_id: Some("stream-123".into()),
            playback_id: Some("play-456".into()),
            ingest_url: Some("rtmps://ingest.example/app".into()),
            stream_key: Some("super-secret-key".into()),
            viewer_count: 12,
            scheduled_for: None,
            started_at: Some(Utc::now()),
            ended_at: None,
            last_heartbeat_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&RoomDto::from(room)).unwrap();
        assert!(!json.contains("super-secret-key"));
        assert!(!json.contains("rtmps://"));
        assert!(!json.contains("streamKey"));
        assert!(!json.contains("ingestUrl"));
        assert!(json.contains("play-456"));
    }
}
