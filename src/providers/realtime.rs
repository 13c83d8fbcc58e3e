//! Realtime pub/sub token minting
//!
//! Browsers talk to the realtime provider directly for chat/presence
//! fan-out; this server only signs short-lived token requests scoped to the
//! room channel namespace. The key secret never leaves the process.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;

use crate::config::RealtimeConfig;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const CLIENT_ID_MAX_LEN: usize = 64;
const CAPABILITY: &str = r#"{"room:*":["publish","subscribe","presence"]}"#;

/// Signed token request handed to the browser, which exchanges it with the
/// pub/sub provider for a real token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub key_name: String,
    /// Token lifetime in milliseconds.
    pub ttl: i64,
    pub capability: String,
    pub client_id: String,
    /// Unix epoch milliseconds at minting time.
    pub timestamp: i64,
    pub nonce: String,
    pub mac: String,
}

pub struct RealtimeAuth {
    key_name: String,
    key_secret: String,
    client_id_prefix: Option<String>,
    token_ttl_ms: i64,
}

impl RealtimeAuth {
    pub fn from_config(cfg: &RealtimeConfig) -> Result<Self, AppError> {
        let (key_name, key_secret) = cfg
            .api_key
            .split_once(':')
            .filter(|(name, secret)| !name.is_empty() && !secret.is_empty())
            .ok_or_else(|| {
                AppError::Config("REALTIME_API_KEY must be of the form name:secret".into())
            })?;

        Ok(Self {
            key_name: key_name.to_string(),
            key_secret: key_secret.to_string(),
            client_id_prefix: cfg.client_id_prefix.clone(),
            token_ttl_ms: (cfg.token_ttl_secs as i64) * 1000,
        })
    }

    pub fn mint_token(&self, client_id_hint: Option<&str>) -> Result<TokenRequest, AppError> {
        let client_id = self.derive_client_id(client_id_hint);
        let timestamp = Utc::now().timestamp_millis();
        let nonce = random_hex(16);

        let mac = self.sign(&[
            &self.key_name,
            &self.token_ttl_ms.to_string(),
            CAPABILITY,
            &client_id,
            &timestamp.to_string(),
            &nonce,
        ])?;

        Ok(TokenRequest {
            key_name: self.key_name.clone(),
            ttl: self.token_ttl_ms,
            capability: CAPABILITY.to_string(),
            client_id,
            timestamp,
            nonce,
            mac,
        })
    }

    fn derive_client_id(&self, hint: Option<&str>) -> String {
        let sanitized = hint.map(sanitize_client_id).unwrap_or_default();
        let base = if sanitized.is_empty() {
            random_hex(8)
        } else {
            sanitized
        };
        match &self.client_id_prefix {
            Some(prefix) => truncate(&format!("{prefix}-{base}"), CLIENT_ID_MAX_LEN),
            None => base,
        }
    }

    fn sign(&self, fields: &[&str]) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|_| AppError::Config("realtime key secret unusable".into()))?;
        mac.update(fields.join("\n").as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

fn sanitize_client_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    truncate(&cleaned, CLIENT_ID_MAX_LEN)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn auth() -> RealtimeAuth {
        RealtimeAuth::from_config(&Config::test_defaults().realtime).unwrap()
    }

    #[test]
    fn rejects_key_without_secret_half() {
        let cfg = RealtimeConfig {
            api_key: "no-separator".into(),
            client_id_prefix: None,
            token_ttl_secs: 3600,
        };
        assert!(RealtimeAuth::from_config(&cfg).is_err());
    }

    #[test]
    fn token_mac_verifies_against_key_secret() {
        let auth = auth();
        let token = auth.mint_token(Some("viewer-1")).unwrap();

        let signed_text = [
            token.key_name.as_str(),
            &token.ttl.to_string(),
            &token.capability,
            &token.client_id,
            &token.timestamp.to_string(),
            &token.nonce,
        ]
        .join("\n");

        let mut mac = HmacSha256::new_from_slice(b"keysecret").unwrap();
        mac.update(signed_text.as_bytes());
        let expected = BASE64.encode(mac.finalize().into_bytes());
        assert_eq!(token.mac, expected);
    }

    #[test]
    fn key_secret_never_serializes() {
        let token = auth().mint_token(Some("viewer-1")).unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert!(!json.contains("keysecret"));
        assert_eq!(token.key_name, "appkey.keyid");
    }

    #[test]
    fn client_id_hint_is_sanitized_and_capped() {
        let token = auth().mint_token(Some("ha x!{}or\n<script>")).unwrap();
        assert_eq!(token.client_id, "haxorscript");

        let long: String = "a".repeat(200);
        let token = auth().mint_token(Some(&long)).unwrap();
        assert_eq!(token.client_id.len(), CLIENT_ID_MAX_LEN);
    }

    #[test]
    fn empty_hint_falls_back_to_random_id() {
        let a = auth().mint_token(None).unwrap();
        let b = auth().mint_token(Some("!!!")).unwrap();
        assert_eq!(a.client_id.len(), 16);
        assert_eq!(b.client_id.len(), 16);
        assert_ne!(a.client_id, b.client_id);
    }

    #[test]
    fn configured_prefix_is_applied() {
        let cfg = RealtimeConfig {
            api_key: "k:s".into(),
            client_id_prefix: Some("bidly".into()),
            token_ttl_secs: 60,
        };
        let auth = RealtimeAuth::from_config(&cfg).unwrap();
        let token = auth.mint_token(Some("viewer1")).unwrap();
        assert_eq!(token.client_id, "bidly-viewer1");
        assert_eq!(token.ttl, 60_000);
    }
}
