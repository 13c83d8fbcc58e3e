use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::message::MessageDto;
use crate::services::chat_service::{self, ChatService, ListMessagesQuery, PostMessageInput};
use crate::services::room_service::RoomService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    /// RFC3339 timestamp; only messages strictly older are returned.
    pub before: Option<String>,
}

#[derive(Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageDto>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MessageListResponse>, AppError> {
    if RoomService::get_room(&state.db, room_id).await?.is_none() {
        return Err(AppError::NotFound("room"));
    }

    let before = query
        .before
        .as_deref()
        .map(chat_service::parse_before)
        .transpose()?;

    let messages = ChatService::list_messages(
        &state.db,
        room_id,
        ListMessagesQuery {
            limit: query.limit,
            before,
        },
    )
    .await?;

    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageDto::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    #[serde(default)]
    pub text: String,
    pub author: Option<AuthorRef>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: MessageDto,
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if RoomService::get_room(&state.db, room_id).await?.is_none() {
        return Err(AppError::NotFound("room"));
    }

    let (author_id, author_name) = match body.author {
        Some(author) => (Some(author.id), author.name),
        None => (None, None),
    };

    let message = ChatService::post_message(
        &state.db,
        room_id,
        PostMessageInput {
            text: body.text,
            author_id,
            author_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: message.into(),
        }),
    ))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteResponse>, AppError> {
    let ok = ChatService::delete_message(&state.db, room_id, message_id).await?;
    Ok(Json(DeleteResponse { ok }))
}
