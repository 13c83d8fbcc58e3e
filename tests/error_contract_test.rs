//! Pins the JSON error contract: every failure path maps to a stable
//! status, code and error_type, and 5xx bodies never leak internals into
//! the top-level message.

use bidly_api::error::AppError;
use bidly_api::middleware::error_handling::map_error;
use bidly_api::models::room::RoomStatus;

#[test]
fn validation_maps_to_400_invalid_request() {
    let (status, body) = map_error(&AppError::Validation("title is required".into()));
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body.code, "INVALID_REQUEST");
    assert_eq!(body.error_type, "validation_error");
    assert_eq!(body.message, "title is required");
}

#[test]
fn signature_failure_maps_to_400_with_its_own_code() {
    let (status, body) = map_error(&AppError::SignatureInvalid("signature mismatch".into()));
    assert_eq!(status.as_u16(), 400);
    assert_eq!(body.code, "SIGNATURE_INVALID");
}

#[test]
fn not_found_names_the_resource() {
    let (status, body) = map_error(&AppError::NotFound("room"));
    assert_eq!(status.as_u16(), 404);
    assert_eq!(body.code, "NOT_FOUND");
    assert_eq!(body.message, "room not found");
}

#[test]
fn illegal_transition_maps_to_409_conflict() {
    let (status, body) = map_error(&AppError::InvalidTransition {
        from: RoomStatus::Ended,
        to: RoomStatus::Live,
    });
    assert_eq!(status.as_u16(), 409);
    assert_eq!(body.code, "ILLEGAL_TRANSITION");
    assert_eq!(body.error_type, "conflict_error");
    assert!(body.message.contains("ended"));
    assert!(body.message.contains("live"));
}

#[test]
fn provider_failure_maps_to_502_and_hides_detail() {
    let err = AppError::Provider("connect timeout to api.mux.com".into());
    let (status, body) = map_error(&err);
    assert_eq!(status.as_u16(), 502);
    assert_eq!(body.code, "PROVIDER_ERROR");
    assert_eq!(body.message, "upstream provider error");
    assert!(body.detail.unwrap().contains("connect timeout"));
}

#[test]
fn database_failure_gets_a_generic_message() {
    let err = AppError::Database(sqlx::Error::PoolTimedOut);
    let (status, body) = map_error(&err);
    assert_eq!(status.as_u16(), 500);
    assert_eq!(body.code, "DATABASE_ERROR");
    assert_eq!(body.message, "internal server error");
    assert!(body.detail.is_some());
}

#[test]
fn serialized_body_omits_detail_when_absent() {
    let (_, body) = map_error(&AppError::NotFound("message"));
    let json = serde_json::to_string(&body).unwrap();
    assert!(!json.contains("detail"));
}
