use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::providers::realtime::TokenRequest;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthRequest {
    pub client_id: Option<String>,
}

/// Mint a signed token request the browser exchanges with the pub/sub
/// provider directly; this server never proxies realtime traffic.
pub async fn mint_token(
    State(state): State<AppState>,
    body: Option<Json<TokenAuthRequest>>,
) -> Result<Json<TokenRequest>, AppError> {
    let hint = body.as_ref().and_then(|b| b.client_id.as_deref());
    let token = state.realtime.mint_token(hint)?;
    Ok(Json(token))
}
