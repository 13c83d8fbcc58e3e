use crate::state::AppState;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

pub mod rooms;
use rooms::{create_room, get_room, heartbeat, list_rooms};
pub mod messages;
use messages::{delete_message, list_messages, post_message};
pub mod realtime;
use realtime::mint_token;
pub mod sellers;
use sellers::get_seller;
pub mod streams;
use streams::{create_stream, webhook};

// OpenAPI endpoint handler
async fn openapi_json() -> Json<serde_json::Value> {
    use utoipa::OpenApi;
    Json(serde_json::to_value(crate::openapi::ApiDoc::openapi()).unwrap_or_default())
}

// Swagger UI handler
async fn swagger_ui() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Bidly API</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: "/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>"#,
    )
}

// Documentation entry point
async fn docs() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Bidly API</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        h1 { color: #333; }
        a { display: block; margin: 15px 0; padding: 15px; background: #28a745; color: white; text-decoration: none; border-radius: 4px; }
        a:hover { background: #218838; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Bidly API</h1>
        <p>Choose your preferred documentation viewer:</p>
        <a href="/swagger-ui">Swagger UI (Interactive)</a>
        <a href="/openapi.json">OpenAPI JSON (Raw)</a>
    </div>
</body>
</html>"#,
    )
}

// Basic service metrics; can be extended with real instrumentation later
async fn metrics() -> String {
    json!({
        "service": "bidly-api",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
    .to_string()
}

pub fn build_router() -> Router<AppState> {
    // Service introspection endpoints (no API version prefix)
    let introspection = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .route("/openapi.json", get(openapi_json))
        .route("/swagger-ui", get(swagger_ui))
        .route("/docs", get(docs));

    // API v1 endpoints (all business logic routes with /api/v1 prefix)
    let api_v1 = Router::new()
        // Rooms
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/:id", get(get_room))
        .route("/rooms/:id/heartbeat", post(heartbeat))
        // Room chat
        .route(
            "/rooms/:id/messages",
            get(list_messages).post(post_message),
        )
        .route(
            "/rooms/:id/messages/:message_id",
            axum::routing::delete(delete_message),
        )
        // Sellers
        .route("/sellers/:id", get(get_seller))
        // Realtime token minting
        .route("/realtime/auth", post(mint_token))
        // Streaming provider integration
        .route("/streams/create", post(create_stream))
        .route("/streams/webhook", post(webhook));

    let router = introspection.merge(Router::new().nest("/api/v1", api_v1));

    crate::middleware::with_defaults(router)
}
