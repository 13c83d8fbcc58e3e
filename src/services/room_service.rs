//! Room lifecycle service
//!
//! Creation, listing, heartbeats, stream attachment and webhook-driven
//! status changes for auction rooms. Concurrent writes rely on row-level
//! last-write-wins; the transition table is the only guard.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::room::{Room, RoomStatus, VISIBILITIES};
use crate::models::seller::Seller;
use crate::providers::streaming::{StreamAsset, WebhookEvent, WebhookKind};
use crate::services::chat_service::ChatService;

pub const MAX_VIEWERS: i64 = 5_000_000;
pub const MAX_LIST_LIMIT: i64 = 100;
pub const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default)]
pub struct CreateRoomInput {
    pub title: String,
    pub seller_id: String,
    pub seller_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<String>,
    pub cover_url: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub limit: Option<i64>,
    pub status: Option<RoomStatus>,
    pub category: Option<String>,
    pub visibility: Option<String>,
}

/// What a verified webhook delivery did to the room.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Status transition applied (or idempotently re-applied).
    Applied { room: Room },
    /// Event carried no status change; heartbeat bumped.
    HeartbeatOnly { room: Room },
    /// Nothing matched or the transition was illegal; answered 200 so the
    /// provider does not retry-storm an event we will never accept.
    Ignored { reason: &'static str },
}

pub struct RoomService;

impl RoomService {
    pub async fn create_room(
        db: &Pool<Postgres>,
        input: CreateRoomInput,
    ) -> Result<Room, AppError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        let seller_id = input.seller_id.trim();
        let seller_name = input.seller_name.trim();
        if seller_id.is_empty() || seller_name.is_empty() {
            return Err(AppError::Validation("seller id and name are required".into()));
        }
        let visibility = validate_visibility(input.visibility.as_deref())?;

        sqlx::query("INSERT INTO sellers (id, name) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name")
            .bind(seller_id)
            .bind(seller_name)
            .execute(db)
            .await?;

        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (id, seller_id, seller_name, title, description, category, visibility, cover_url, scheduled_for) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(seller_name)
        .bind(title)
        .bind(input.description.as_deref().map(str::trim))
        .bind(input.category.as_deref().map(str::trim))
        .bind(visibility)
        .bind(input.cover_url.as_deref())
        .bind(input.scheduled_for)
        .fetch_one(db)
        .await?;

        tracing::info!(room_id = %room.id, seller_id = %room.seller_id, "room created");
        Ok(room)
    }

    pub async fn list_rooms(db: &Pool<Postgres>, filter: RoomFilter) -> Result<Vec<Room>, AppError> {
        let limit = clamp_limit(filter.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        if let Some(v) = filter.visibility.as_deref() {
            validate_visibility(Some(v))?;
        }

        let rooms = sqlx::query_as::<_, Room>(
            "SELECT * FROM rooms \
             WHERE ($1::room_status IS NULL OR status = $1) \
               AND ($2::text IS NULL OR category = $2) \
               AND ($3::text IS NULL OR visibility = $3) \
             ORDER BY created_at DESC \
             LIMIT $4",
        )
        .bind(filter.status)
        .bind(filter.category.as_deref())
        .bind(filter.visibility.as_deref())
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(rooms)
    }

    /// `None` means "no such room"; callers decide whether that is a 404.
    pub async fn get_room(db: &Pool<Postgres>, id: Uuid) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(room)
    }

    /// Seller profile as last upserted by room creation.
    pub async fn get_seller(db: &Pool<Postgres>, id: &str) -> Result<Option<Seller>, AppError> {
        let seller = sqlx::query_as::<_, Seller>("SELECT * FROM sellers WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(seller)
    }

    /// Broadcaster heartbeat: bumps the liveness timestamp and optionally
    /// moves status / viewer count. Illegal transitions are rejected with a
    /// typed error instead of silently overwriting history.
    pub async fn heartbeat(
        db: &Pool<Postgres>,
        id: Uuid,
        status: Option<RoomStatus>,
        viewers: Option<i64>,
    ) -> Result<Option<Room>, AppError> {
        let Some(current) = Self::get_room(db, id).await? else {
            return Ok(None);
        };

        if let Some(next) = status {
            if !current.status.can_transition_to(next) {
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }
        }

        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET \
                last_heartbeat_at = now(), \
                updated_at = now(), \
                viewer_count = COALESCE($2, viewer_count), \
                status = COALESCE($3, status), \
                started_at = CASE WHEN $3 = 'live'::room_status AND started_at IS NULL THEN now() ELSE started_at END, \
                ended_at   = CASE WHEN $3 = 'ended'::room_status AND ended_at IS NULL THEN now() ELSE ended_at END \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(viewers)
        .bind(status)
        .fetch_one(db)
        .await?;

        Ok(Some(room))
    }

    /// Attach provider identifiers after a successful provider-side stream
    /// creation. Ingest URL and stream key are stored, never echoed.
    pub async fn attach_stream(
        db: &Pool<Postgres>,
        id: Uuid,
        asset: &StreamAsset,
    ) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET \
                stream_provider = $2, \
                stream_id = $3, \
                playback_id = $4, \
                ingest_url = $5, \
                stream_key = $6, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(&asset.provider)
        .bind(&asset.stream_id)
        .bind(asset.playback_id.as_deref())
        .bind(asset.ingest_url.as_deref())
        .bind(asset.stream_key.as_deref())
        .fetch_optional(db)
        .await?;

        Ok(room)
    }

    /// Indexed lookup by provider stream reference.
    pub async fn find_by_stream_ref(
        db: &Pool<Postgres>,
        stream_id: Option<&str>,
        playback_id: Option<&str>,
    ) -> Result<Option<Room>, AppError> {
        if stream_id.is_none() && playback_id.is_none() {
            return Ok(None);
        }
        let room = sqlx::query_as::<_, Room>(
            "SELECT * FROM rooms \
             WHERE ($1::text IS NOT NULL AND stream_id = $1) \
                OR ($2::text IS NOT NULL AND playback_id = $2) \
             LIMIT 1",
        )
        .bind(stream_id)
        .bind(playback_id)
        .fetch_optional(db)
        .await?;
        Ok(room)
    }

    /// Apply a verified provider webhook. Deliveries are at-least-once and
    /// can arrive out of order, so everything here is idempotent and
    /// unmatchable events are ignored rather than errored.
    pub async fn apply_webhook_event(
        db: &Pool<Postgres>,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, AppError> {
        let Some(room) = Self::find_by_stream_ref(
            db,
            event.stream_id.as_deref(),
            event.playback_id.as_deref(),
        )
        .await?
        else {
            tracing::warn!(stream_id = ?event.stream_id, playback_id = ?event.playback_id, "webhook for unknown stream reference");
            return Ok(WebhookOutcome::Ignored {
                reason: "unknown stream reference",
            });
        };

        let target = match &event.kind {
            WebhookKind::Active => RoomStatus::Live,
            WebhookKind::Ended => RoomStatus::Ended,
            WebhookKind::Other(kind) => {
                tracing::debug!(room_id = %room.id, %kind, "webhook event without status effect");
                let room = Self::bump_heartbeat(db, room.id).await?;
                return Ok(WebhookOutcome::HeartbeatOnly { room });
            }
        };

        if !room.status.can_transition_to(target) {
            tracing::warn!(room_id = %room.id, from = %room.status, to = %target, "ignoring webhook with illegal transition");
            return Ok(WebhookOutcome::Ignored {
                reason: "illegal transition",
            });
        }

        // The status guard in the UPDATE decides who posts the system
        // message: redelivered or racing duplicates match zero rows and
        // only bump the heartbeat.
        match Self::set_status_if_changed(db, room.id, target).await? {
            Some(updated) => {
                let note = match target {
                    RoomStatus::Live => "Stream is live",
                    RoomStatus::Ended => "Stream ended",
                    _ => unreachable!("webhooks only target live/ended"),
                };
                ChatService::post_system_message(db, updated.id, note).await?;
                tracing::info!(room_id = %updated.id, status = %target, "room status updated via webhook");
                Ok(WebhookOutcome::Applied { room: updated })
            }
            None => {
                let room = Self::bump_heartbeat(db, room.id).await?;
                Ok(WebhookOutcome::Applied { room })
            }
        }
    }

    /// Atomically move the room to `status`, but only if it is not there
    /// already. `None` means another writer (or an earlier delivery) got
    /// there first.
    async fn set_status_if_changed(
        db: &Pool<Postgres>,
        id: Uuid,
        status: RoomStatus,
    ) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET \
                status = $2, \
                last_heartbeat_at = now(), \
                updated_at = now(), \
                started_at = CASE WHEN $2 = 'live'::room_status AND started_at IS NULL THEN now() ELSE started_at END, \
                ended_at   = CASE WHEN $2 = 'ended'::room_status AND ended_at IS NULL THEN now() ELSE ended_at END \
             WHERE id = $1 AND status <> $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(room)
    }

    async fn bump_heartbeat(db: &Pool<Postgres>, id: Uuid) -> Result<Room, AppError> {
        let room = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET last_heartbeat_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(room)
    }
}

pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

/// Viewer counts arrive as JSON numbers from the broadcaster and are
/// externally reported, so they get a hard cap.
pub fn validate_viewers(raw: f64) -> Result<i64, AppError> {
    if !raw.is_finite() || raw < 0.0 || raw > MAX_VIEWERS as f64 {
        return Err(AppError::Validation(format!(
            "viewers must be a finite number between 0 and {MAX_VIEWERS}"
        )));
    }
    Ok(raw as i64)
}

pub fn validate_visibility(raw: Option<&str>) -> Result<&str, AppError> {
    match raw {
        None => Ok("public"),
        Some(v) if VISIBILITIES.contains(&v) => Ok(v),
        Some(v) => Err(AppError::Validation(format!(
            "visibility must be one of public|unlisted, got {v:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_limit_is_clamped_into_range() {
        assert_eq!(clamp_limit(None, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 50);
        assert_eq!(clamp_limit(Some(0), DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 1);
        assert_eq!(clamp_limit(Some(-5), DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 1);
        assert_eq!(clamp_limit(Some(1000), DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 100);
        assert_eq!(clamp_limit(Some(42), DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT), 42);
    }

    #[test]
    fn viewer_counts_outside_range_are_rejected() {
        assert!(validate_viewers(-1.0).is_err());
        assert!(validate_viewers(f64::NAN).is_err());
        assert!(validate_viewers(f64::INFINITY).is_err());
        assert!(validate_viewers(5_000_001.0).is_err());
        assert_eq!(validate_viewers(0.0).unwrap(), 0);
        assert_eq!(validate_viewers(120.0).unwrap(), 120);
        assert_eq!(validate_viewers(5_000_000.0).unwrap(), MAX_VIEWERS);
    }

    #[test]
    fn visibility_is_validated_with_public_default() {
        assert_eq!(validate_visibility(None).unwrap(), "public");
        assert_eq!(validate_visibility(Some("unlisted")).unwrap(), "unlisted");
        assert!(validate_visibility(Some("secret")).is_err());
    }
}
