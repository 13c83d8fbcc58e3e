/// OpenAPI documentation for the Bidly API
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bidly API",
        version = "1.0.0",
        description = "Live-commerce rooms, chat, streaming and realtime auth",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Rooms", description = "Live room lifecycle and discovery"),
        (name = "Messages", description = "Room chat feed"),
        (name = "Sellers", description = "Seller profiles"),
        (name = "Realtime", description = "Pub/sub token minting"),
        (name = "Streams", description = "Streaming provider integration"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn title() -> &'static str {
        "Bidly API"
    }

    pub fn version() -> &'static str {
        "1.0.0"
    }

    pub fn openapi_json_path() -> &'static str {
        "/openapi.json"
    }
}
