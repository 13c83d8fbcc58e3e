use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::providers::streaming::{LatencyMode, PlaybackPolicy, StreamSpec};
use crate::services::room_service::{RoomService, WebhookOutcome};
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "mux-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    pub room_id: Option<Uuid>,
    pub name: Option<String>,
    pub latency_mode: Option<String>,
    pub playback_policy: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub provider: String,
    pub stream_id: String,
    pub playback_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamResponse {
    pub ok: bool,
    pub room_id: Uuid,
    pub stream: StreamSummary,
}

/// Create a provider-side live stream and attach its identifiers to the
/// room. Ingest URL and stream key are persisted, never returned.
pub async fn create_stream(
    State(state): State<AppState>,
    Json(body): Json<CreateStreamRequest>,
) -> Result<Json<CreateStreamResponse>, AppError> {
    let room_id = body
        .room_id
        .ok_or_else(|| AppError::Validation("roomId is required".into()))?;
    let room = RoomService::get_room(&state.db, room_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("unknown room {room_id}")))?;

    let latency_mode = match body.latency_mode.as_deref() {
        None => LatencyMode::Low,
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(format!("unknown latencyMode {raw:?}")))?,
    };
    let playback_policy = match body.playback_policy.as_deref() {
        None => PlaybackPolicy::Public,
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(format!("unknown playbackPolicy {raw:?}")))?,
    };

    let asset = state
        .streaming
        .create_stream(StreamSpec {
            name: body.name.unwrap_or_else(|| room.title.clone()),
            latency_mode,
            playback_policy,
            passthrough: Some(room_id.to_string()),
        })
        .await?;

    let summary = StreamSummary {
        provider: asset.provider.clone(),
        stream_id: asset.stream_id.clone(),
        playback_id: asset.playback_id.clone(),
    };

    RoomService::attach_stream(&state.db, room_id, &asset)
        .await?
        .ok_or(AppError::NotFound("room"))?;

    Ok(Json(CreateStreamResponse {
        ok: true,
        room_id,
        stream: summary,
    }))
}

/// Provider-signed ingest callback. Unverifiable payloads get a 400 so the
/// provider redelivers; events we cannot match get a 200 so it does not.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let event = state.streaming.verify_webhook(signature, &body)?;

    match RoomService::apply_webhook_event(&state.db, &event).await? {
        WebhookOutcome::Applied { room } | WebhookOutcome::HeartbeatOnly { room } => {
            Ok(Json(json!({ "ok": true, "roomId": room.id })))
        }
        WebhookOutcome::Ignored { reason } => {
            Ok(Json(json!({ "ok": true, "ignored": true, "reason": reason })))
        }
    }
}
