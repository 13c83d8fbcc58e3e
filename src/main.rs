use std::sync::Arc;

use bidly_api::providers::realtime::RealtimeAuth;
use bidly_api::providers::streaming::MuxProvider;
use bidly_api::state::AppState;
use bidly_api::{config, db, error, logging, migrations, routes};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = config::Config::from_env()?;

    let db = db::init_pool(&cfg.database_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Run embedded migrations (idempotent)
    // Treat migration failures as fatal - the database schema must be in sync
    migrations::run_all(&db)
        .await
        .map_err(|e| error::AppError::StartServer(format!("database migrations failed: {e}")))?;

    let streaming = Arc::new(MuxProvider::new(cfg.streaming.clone()));
    let realtime = Arc::new(RealtimeAuth::from_config(&cfg.realtime)?);

    let state = AppState {
        db,
        streaming,
        realtime,
    };

    let app = routes::build_router().with_state(state);

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting bidly-api");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
