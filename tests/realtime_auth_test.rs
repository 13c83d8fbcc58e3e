//! Token minting as seen by the /realtime/auth route: wire shape, channel
//! capability scope and secret hygiene.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bidly_api::config::Config;
use bidly_api::providers::realtime::RealtimeAuth;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn auth() -> RealtimeAuth {
    RealtimeAuth::from_config(&Config::test_defaults().realtime).unwrap()
}

#[test]
fn token_serializes_with_camel_case_wire_fields() {
    let token = auth().mint_token(Some("viewer-1")).unwrap();
    let value: serde_json::Value = serde_json::to_value(&token).unwrap();

    for field in ["keyName", "ttl", "capability", "clientId", "timestamp", "nonce", "mac"] {
        assert!(value.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(value["keyName"], "appkey.keyid");
    assert_eq!(value["clientId"], "viewer-1");
}

#[test]
fn capability_is_scoped_to_room_channels() {
    let token = auth().mint_token(None).unwrap();
    let capability: serde_json::Value = serde_json::from_str(&token.capability).unwrap();

    let grants = capability["room:*"].as_array().unwrap();
    assert!(grants.iter().any(|g| g == "publish"));
    assert!(grants.iter().any(|g| g == "subscribe"));
    assert!(grants.iter().any(|g| g == "presence"));
    assert!(capability.get("*").is_none());
}

#[test]
fn mac_recomputes_from_the_signed_fields() {
    let token = auth().mint_token(Some("buyer-7")).unwrap();

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
    assert_eq!(token.mac, BASE64.encode(mac.finalize().into_bytes()));
}

#[test]
fn two_anonymous_tokens_never_collide() {
    let auth = auth();
    let a = auth.mint_token(None).unwrap();
    let b = auth.mint_token(None).unwrap();
    assert_ne!(a.client_id, b.client_id);
    assert_ne!(a.nonce, b.nonce);
}
