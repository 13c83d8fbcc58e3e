//! Chat feed service
//!
//! Append-only room chat with cursor pagination. Listing is newest-first so
//! clients can render the latest window cheaply; chronological consumers
//! reverse client-side.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::message::{Message, MessageKind};

pub const MAX_TEXT_LEN: usize = 500;
pub const MAX_PAGE_LIMIT: i64 = 200;
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default)]
pub struct PostMessageInput {
    pub text: String,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    /// Exclusive cursor: only messages strictly older are returned.
    pub before: Option<DateTime<Utc>>,
}

pub struct ChatService;

impl ChatService {
    /// The caller is responsible for having checked the room exists.
    pub async fn post_message(
        db: &Pool<Postgres>,
        room_id: Uuid,
        input: PostMessageInput,
    ) -> Result<Message, AppError> {
        let body = validate_text(&input.text)?;
        let author_id = input
            .author_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let author_name = input
            .author_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(author_id) = author_id {
            sqlx::query(
                "INSERT INTO users (id, name) VALUES ($1, $2) \
                 ON CONFLICT (id) DO UPDATE SET name = COALESCE(EXCLUDED.name, users.name)",
            )
            .bind(author_id)
            .bind(author_name)
            .execute(db)
            .await?;
        }

        Self::insert(db, room_id, author_id, author_name, MessageKind::User, body).await
    }

    /// Lifecycle notes ("Stream is live") written by the server itself.
    pub async fn post_system_message(
        db: &Pool<Postgres>,
        room_id: Uuid,
        text: &str,
    ) -> Result<Message, AppError> {
        Self::insert(db, room_id, None, None, MessageKind::System, text).await
    }

    async fn insert(
        db: &Pool<Postgres>,
        room_id: Uuid,
        author_id: Option<&str>,
        author_name: Option<&str>,
        kind: MessageKind,
        body: &str,
    ) -> Result<Message, AppError> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            "INSERT INTO messages (id, room_id, author_id, author_name, kind, body) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING created_at",
        )
        .bind(id)
        .bind(room_id)
        .bind(author_id)
        .bind(author_name)
        .bind(kind.as_str())
        .bind(body)
        .fetch_one(db)
        .await?;

        Ok(Message {
            id,
            room_id,
            author_id: author_id.map(str::to_string),
            author_name: author_name.map(str::to_string),
            kind,
            body: body.to_string(),
            created_at: row.get("created_at"),
        })
    }

    /// Newest-first page of messages, strictly older than `before` when the
    /// cursor is present. Consecutive pages using the oldest returned
    /// timestamp as the next cursor are disjoint and gap-free.
    pub async fn list_messages(
        db: &Pool<Postgres>,
        room_id: Uuid,
        query: ListMessagesQuery,
    ) -> Result<Vec<Message>, AppError> {
        let limit = crate::services::room_service::clamp_limit(
            query.limit,
            DEFAULT_PAGE_LIMIT,
            MAX_PAGE_LIMIT,
        );

        let rows = sqlx::query(
            "SELECT id, room_id, author_id, author_name, kind, body, created_at \
             FROM messages \
             WHERE room_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at < $2) \
             ORDER BY created_at DESC \
             LIMIT $3",
        )
        .bind(room_id)
        .bind(query.before)
        .bind(limit)
        .fetch_all(db)
        .await?;

        let messages = rows
            .into_iter()
            .map(|r| {
                let kind: String = r.get("kind");
                Message {
                    id: r.get("id"),
                    room_id: r.get("room_id"),
                    author_id: r.get("author_id"),
                    author_name: r.get("author_name"),
                    kind: kind.parse().unwrap_or(MessageKind::User),
                    body: r.get("body"),
                    created_at: r.get("created_at"),
                }
            })
            .collect();

        Ok(messages)
    }

    /// Idempotent delete, scoped to the room so an id alone cannot reach
    /// into another room's feed. True iff exactly one row went away.
    pub async fn delete_message(
        db: &Pool<Postgres>,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND room_id = $2")
            .bind(message_id)
            .bind(room_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// Single authoritative text rule: trimmed, non-empty, at most
/// [`MAX_TEXT_LEN`] characters.
pub fn validate_text(raw: &str) -> Result<&str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("message text is required".into()));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "message text must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Cursor timestamps arrive as RFC3339 strings.
pub fn parse_before(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("invalid before cursor: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_required() {
        assert_eq!(validate_text("  hi  ").unwrap(), "hi");
        assert!(validate_text("").is_err());
        assert!(validate_text("   \n\t ").is_err());
    }

    #[test]
    fn text_cap_is_500_characters() {
        let at_cap = "x".repeat(500);
        assert!(validate_text(&at_cap).is_ok());

        let over_cap = "x".repeat(501);
        assert!(validate_text(&over_cap).is_err());

        // multi-byte characters count as characters, not bytes
        let wide = "ü".repeat(500);
        assert!(validate_text(&wide).is_ok());
    }

    #[test]
    fn before_cursor_must_be_rfc3339() {
        assert!(parse_before("2026-08-28T12:00:00Z").is_ok());
        assert!(parse_before("2026-08-28T12:00:00+02:00").is_ok());
        assert!(parse_before("yesterday").is_err());
        assert!(parse_before("1724850000").is_err());
    }
}
