use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::room::{RoomDto, RoomStatus};
use crate::services::room_service::{self, CreateRoomInput, RoomFilter, RoomService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Serialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomDto>,
}

pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<RoomListResponse>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<RoomStatus>()
                .map_err(|_| AppError::Validation(format!("unknown status {s:?}")))
        })
        .transpose()?;

    let rooms = RoomService::list_rooms(
        &state.db,
        RoomFilter {
            limit: query.limit,
            status,
            category: query.category,
            visibility: query.visibility,
        },
    )
    .await?;

    Ok(Json(RoomListResponse {
        rooms: rooms.into_iter().map(RoomDto::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub title: String,
    pub seller: Option<SellerRef>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<String>,
    pub cover_url: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct RoomResponse {
    pub room: RoomDto,
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let seller = body
        .seller
        .ok_or_else(|| AppError::Validation("seller id and name are required".into()))?;

    let room = RoomService::create_room(
        &state.db,
        CreateRoomInput {
            title: body.title,
            seller_id: seller.id,
            seller_name: seller.name,
            description: body.description,
            category: body.category,
            visibility: body.visibility,
            cover_url: body.cover_url,
            scheduled_for: body.scheduled_for,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse { room: room.into() }),
    ))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = RoomService::get_room(&state.db, room_id)
        .await?
        .ok_or(AppError::NotFound("room"))?;
    Ok(Json(RoomResponse { room: room.into() }))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub status: Option<String>,
    pub viewers: Option<f64>,
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub room: Option<RoomDto>,
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<HeartbeatRequest>,
) -> Result<(StatusCode, Json<HeartbeatResponse>), AppError> {
    let status = body
        .status
        .as_deref()
        .map(|s| {
            s.parse::<RoomStatus>()
                .map_err(|_| AppError::Validation(format!("unknown status {s:?}")))
        })
        .transpose()?;
    let viewers = body.viewers.map(room_service::validate_viewers).transpose()?;

    match RoomService::heartbeat(&state.db, room_id, status, viewers).await? {
        Some(room) => Ok((
            StatusCode::OK,
            Json(HeartbeatResponse {
                ok: true,
                room: Some(room.into()),
            }),
        )),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(HeartbeatResponse {
                ok: false,
                room: None,
            }),
        )),
    }
}
