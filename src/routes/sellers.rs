use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::AppError;
use crate::models::seller::Seller;
use crate::services::room_service::RoomService;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SellerResponse {
    pub seller: Seller,
}

pub async fn get_seller(
    State(state): State<AppState>,
    Path(seller_id): Path<String>,
) -> Result<Json<SellerResponse>, AppError> {
    let seller = RoomService::get_seller(&state.db, &seller_id)
        .await?
        .ok_or(AppError::NotFound("seller"))?;
    Ok(Json(SellerResponse { seller }))
}
