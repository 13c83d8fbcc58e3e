use dotenvy::dotenv;
use std::env;

use crate::error::AppError;

/// Realtime pub/sub provider credentials. The API key is the `name:secret`
/// pair used to sign token requests; only the name half ever leaves the
/// server.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub api_key: String,
    pub client_id_prefix: Option<String>,
    pub token_ttl_secs: u64,
}

/// Streaming provider credentials and endpoints (Mux-compatible API).
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    pub provider: String,
    pub api_base: String,
    pub ingest_base: String,
    pub token_id: String,
    pub token_secret: String,
    pub webhook_secret: String,
    pub signature_max_age_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub realtime: RealtimeConfig,
    pub streaming: StreamingConfig,
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} missing")))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let realtime = RealtimeConfig {
            api_key: required("REALTIME_API_KEY")?,
            client_id_prefix: env::var("REALTIME_CLIENT_ID_PREFIX")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            token_ttl_secs: env::var("REALTIME_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        };

        let streaming = StreamingConfig {
            provider: env::var("STREAM_PROVIDER").unwrap_or_else(|_| "mux".into()),
            api_base: env::var("STREAM_API_BASE")
                .unwrap_or_else(|_| "https://api.mux.com".into()),
            ingest_base: env::var("STREAM_INGEST_BASE")
                .unwrap_or_else(|_| "rtmps://global-live.mux.com:443/app".into()),
            token_id: required("STREAM_TOKEN_ID")?,
            token_secret: required("STREAM_TOKEN_SECRET")?,
            webhook_secret: required("STREAM_WEBHOOK_SECRET")?,
            signature_max_age_secs: env::var("STREAM_SIGNATURE_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        };

        Ok(Self {
            database_url,
            port,
            realtime,
            streaming,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            database_url: "postgres://localhost/bidly_test".into(),
            port: 8080,
            realtime: RealtimeConfig {
                api_key: "appkey.keyid:keysecret".into(),
                client_id_prefix: None,
                token_ttl_secs: 3600,
            },
            streaming: StreamingConfig {
                provider: "mux".into(),
                api_base: "https://api.mux.example".into(),
                ingest_base: "rtmps://ingest.mux.example:443/app".into(),
                token_id: "token-id".into(),
                token_secret: "token-secret".into(),
                webhook_secret: "webhook-secret".into(),
                signature_max_age_secs: 300,
            },
        }
    }
}
