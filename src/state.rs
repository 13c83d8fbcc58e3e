use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::providers::realtime::RealtimeAuth;
use crate::providers::streaming::StreamingProvider;

/// Shared handles for request handlers. Config slices are consumed by the
/// provider adapters at construction time, so only the adapters live here.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Postgres>,
    pub streaming: Arc<dyn StreamingProvider>,
    pub realtime: Arc<RealtimeAuth>,
}
