//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("nope"), ErrorCode::Forbidden)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("again"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
#[case(ErrorCode::NotFound)]
#[case(ErrorCode::ServiceUnavailable)]
fn blank_messages_fall_back_to_the_code_default(#[case] code: ErrorCode) {
    let error = Error::new(code, "  ");
    assert_eq!(error.message(), code.default_message());
}

#[rstest]
#[case(ErrorCode::InternalError, true, false)]
#[case(ErrorCode::ServiceUnavailable, false, true)]
#[case(ErrorCode::Conflict, false, false)]
fn code_flags(#[case] code: ErrorCode, #[case] internal: bool, #[case] retryable: bool) {
    assert_eq!(code.is_internal(), internal);
    assert_eq!(code.is_retryable(), retryable);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn serializes_code_in_snake_case_and_omits_missing_details() {
    let value = serde_json::to_value(Error::service_unavailable("store offline"))
        .expect("serialize error");

    assert_eq!(
        value,
        json!({ "code": "service_unavailable", "message": "store offline" })
    );
}

#[rstest]
fn deserialization_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": "  " });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[rstest]
fn details_survive_a_serde_round_trip() {
    let error = Error::conflict("already pending").with_details(json!({ "requestId": "r-1" }));
    let value = serde_json::to_value(&error).expect("serialize");
    let decoded: Error = serde_json::from_value(value).expect("deserialize");

    assert_eq!(decoded, error);
}
