//! Streaming provider adapter
//!
//! Translates Bidly's own stream-creation shape to and from a Mux-compatible
//! live video API, and verifies provider webhooks before anything trusts
//! their payloads. The concrete provider sits behind [`StreamingProvider`]
//! so it stays swappable and mockable.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;

use crate::config::StreamingConfig;
use crate::error::AppError;
use crate::retry::{with_retry, RetryConfig};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMode {
    Low,
    Standard,
}

impl LatencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyMode::Low => "low",
            LatencyMode::Standard => "standard",
        }
    }
}

impl FromStr for LatencyMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(LatencyMode::Low),
            "standard" => Ok(LatencyMode::Standard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPolicy {
    Public,
    Signed,
}

impl PlaybackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackPolicy::Public => "public",
            PlaybackPolicy::Signed => "signed",
        }
    }
}

impl FromStr for PlaybackPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PlaybackPolicy::Public),
            "signed" => Ok(PlaybackPolicy::Signed),
            _ => Err(()),
        }
    }
}

/// Provider-side stream creation request.
#[derive(Debug, Clone)]
pub struct StreamSpec {
    pub name: String,
    pub latency_mode: LatencyMode,
    pub playback_policy: PlaybackPolicy,
    /// Opaque tag echoed back in provider webhooks (room id).
    pub passthrough: Option<String>,
}

/// Normalized descriptor for a provider-side live stream. `ingest_url` and
/// `stream_key` are broadcast secrets: persisted server-side only.
#[derive(Debug, Clone)]
pub struct StreamAsset {
    pub provider: String,
    pub stream_id: String,
    pub playback_id: Option<String>,
    pub ingest_url: Option<String>,
    pub stream_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookKind {
    /// Ingest connected; the room is on air.
    Active,
    /// Ingest idle or disconnected; the broadcast is over.
    Ended,
    /// Any other provider event; only worth a heartbeat bump.
    Other(String),
}

/// Normalized webhook event after signature verification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub provider: String,
    pub kind: WebhookKind,
    pub stream_id: Option<String>,
    pub playback_id: Option<String>,
}

#[async_trait]
pub trait StreamingProvider: Send + Sync {
    async fn create_stream(&self, spec: StreamSpec) -> Result<StreamAsset, AppError>;

    /// Verify the webhook signature and normalize the payload. Fails with
    /// `AppError::SignatureInvalid` so the caller answers 400 and the
    /// provider's own retry policy redelivers.
    fn verify_webhook(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookEvent, AppError>;
}

/// Mux-compatible live video API client.
pub struct MuxProvider {
    http: reqwest::Client,
    cfg: StreamingConfig,
}

#[derive(Deserialize)]
struct MuxCreateResponse {
    data: MuxLiveStream,
}

#[derive(Deserialize)]
struct MuxLiveStream {
    id: String,
    stream_key: Option<String>,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
}

#[derive(Deserialize)]
struct MuxPlaybackId {
    id: String,
}

#[derive(Deserialize)]
struct MuxWebhookPayload {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<MuxWebhookData>,
}

#[derive(Deserialize)]
struct MuxWebhookData {
    id: Option<String>,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
    live_stream_id: Option<String>,
}

impl MuxProvider {
    pub fn new(cfg: StreamingConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, cfg }
    }

    async fn post_live_stream(&self, body: &serde_json::Value) -> Result<MuxCreateResponse, AppError> {
        let url = format!("{}/video/v1/live-streams", self.cfg.api_base);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.cfg.token_id, Some(&self.cfg.token_secret))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("live stream create request: {e}")))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(AppError::Provider(format!(
                "live stream create failed upstream: {status}"
            )));
        }
        if !status.is_success() {
            // 4xx from the provider is a permanent rejection of this request
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Validation(format!(
                "provider rejected stream create ({status}): {detail}"
            )));
        }

        resp.json::<MuxCreateResponse>()
            .await
            .map_err(|e| AppError::Provider(format!("live stream create response: {e}")))
    }

    fn parse_signature_header(header: &str) -> Option<(i64, Vec<u8>)> {
        let mut timestamp = None;
        let mut signature = None;
        for part in header.split(',') {
            let part = part.trim();
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = t.parse::<i64>().ok();
            } else if let Some(v1) = part.strip_prefix("v1=") {
                signature = hex::decode(v1).ok();
            }
        }
        Some((timestamp?, signature?))
    }
}

#[async_trait]
impl StreamingProvider for MuxProvider {
    async fn create_stream(&self, spec: StreamSpec) -> Result<StreamAsset, AppError> {
        let body = json!({
            "playback_policy": [spec.playback_policy.as_str()],
            "new_asset_settings": { "playback_policy": [spec.playback_policy.as_str()] },
            "latency_mode": spec.latency_mode.as_str(),
            "passthrough": spec.passthrough,
        });

        let created = with_retry(
            RetryConfig::default(),
            |e: &AppError| e.is_retryable(),
            || self.post_live_stream(&body),
        )
        .await?;

        let playback_id = created.data.playback_ids.into_iter().next().map(|p| p.id);
        tracing::info!(stream_id = %created.data.id, name = %spec.name, "provider live stream created");

        Ok(StreamAsset {
            provider: self.cfg.provider.clone(),
            stream_id: created.data.id,
            playback_id,
            ingest_url: Some(self.cfg.ingest_base.clone()),
            stream_key: created.data.stream_key,
        })
    }

    fn verify_webhook(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookEvent, AppError> {
        let header = signature_header
            .ok_or_else(|| AppError::SignatureInvalid("missing signature header".into()))?;
        let (timestamp, signature) = Self::parse_signature_header(header)
            .ok_or_else(|| AppError::SignatureInvalid("malformed signature header".into()))?;

        let now = chrono::Utc::now().timestamp();
        let max_age = self.cfg.signature_max_age_secs as i64;
        if (now - timestamp).abs() > max_age {
            return Err(AppError::SignatureInvalid("signature timestamp too old".into()));
        }

        let mut mac = HmacSha256::new_from_slice(self.cfg.webhook_secret.as_bytes())
            .map_err(|_| AppError::SignatureInvalid("invalid webhook secret".into()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.verify_slice(&signature)
            .map_err(|_| AppError::SignatureInvalid("signature mismatch".into()))?;

        let payload: MuxWebhookPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::SignatureInvalid(format!("unparseable payload: {e}")))?;

        let kind = match payload.event_type.as_str() {
            "video.live_stream.active" => WebhookKind::Active,
            "video.live_stream.idle" | "video.live_stream.disconnected" => WebhookKind::Ended,
            other => WebhookKind::Other(other.to_string()),
        };

        let (stream_id, playback_id) = match payload.data {
            Some(data) => {
                let stream_id = data.id.or(data.live_stream_id);
                let playback_id = data.playback_ids.into_iter().next().map(|p| p.id);
                (stream_id, playback_id)
            }
            None => (None, None),
        };

        Ok(WebhookEvent {
            provider: self.cfg.provider.clone(),
            kind,
            stream_id,
            playback_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn provider() -> MuxProvider {
        MuxProvider::new(Config::test_defaults().streaming)
    }

    fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        format!("t={},v1={}", timestamp, hex::encode(digest))
    }

    fn active_body(stream_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "type": "video.live_stream.active",
            "data": { "id": stream_id, "playback_ids": [{ "id": "pb-1" }] }
        }))
        .unwrap()
    }

    #[test]
    fn valid_signature_yields_normalized_event() {
        let p = provider();
        let body = active_body("ls-1");
        let header = sign("webhook-secret", chrono::Utc::now().timestamp(), &body);

        let event = p.verify_webhook(Some(&header), &body).unwrap();
        assert_eq!(event.kind, WebhookKind::Active);
        assert_eq!(event.stream_id.as_deref(), Some("ls-1"));
        assert_eq!(event.playback_id.as_deref(), Some("pb-1"));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let p = provider();
        let body = active_body("ls-1");
        let header = sign("webhook-secret", chrono::Utc::now().timestamp(), &body);

        let tampered = active_body("ls-2");
        let err = p.verify_webhook(Some(&header), &tampered).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let p = provider();
        let body = active_body("ls-1");
        let header = sign("not-the-secret", chrono::Utc::now().timestamp(), &body);

        assert!(p.verify_webhook(Some(&header), &body).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let p = provider();
        let body = active_body("ls-1");
        let stale = chrono::Utc::now().timestamp() - 3600;
        let header = sign("webhook-secret", stale, &body);

        let err = p.verify_webhook(Some(&header), &body).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn missing_header_is_rejected() {
        let p = provider();
        let body = active_body("ls-1");
        assert!(p.verify_webhook(None, &body).is_err());
    }

    #[test]
    fn idle_and_disconnected_map_to_ended() {
        let p = provider();
        for event_type in ["video.live_stream.idle", "video.live_stream.disconnected"] {
            let body = serde_json::to_vec(&json!({
                "type": event_type,
                "data": { "id": "ls-9" }
            }))
            .unwrap();
            let header = sign("webhook-secret", chrono::Utc::now().timestamp(), &body);
            let event = p.verify_webhook(Some(&header), &body).unwrap();
            assert_eq!(event.kind, WebhookKind::Ended);
        }
    }

    #[test]
    fn unknown_event_types_are_preserved_as_other() {
        let p = provider();
        let body = serde_json::to_vec(&json!({
            "type": "video.asset.ready",
            "data": { "live_stream_id": "ls-9" }
        }))
        .unwrap();
        let header = sign("webhook-secret", chrono::Utc::now().timestamp(), &body);

        let event = p.verify_webhook(Some(&header), &body).unwrap();
        assert_eq!(event.kind, WebhookKind::Other("video.asset.ready".into()));
        assert_eq!(event.stream_id.as_deref(), Some("ls-9"));
    }
}
