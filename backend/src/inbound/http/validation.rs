//! Shared validation helpers for inbound HTTP adapters.

use actix_web::{HttpRequest, error::JsonPayloadError, error::QueryPayloadError};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, FollowRequestId, ProductId, SharedItemId, UserId};

/// Validation error codes reported in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    InvalidUuid,
    InvalidProductId,
    InvalidBody,
    InvalidQuery,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidProductId => "invalid_product_id",
            Self::InvalidBody => "invalid_body",
            Self::InvalidQuery => "invalid_query",
        }
    }
}

/// Name of the request field being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

fn field_error(field: FieldName, code: ValidationCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.0,
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            ValidationCode::InvalidUuid,
            format!("{} must be a valid UUID", field.0),
            value,
        )
    })
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    parse_uuid(value, field).map(UserId::from_uuid)
}

pub(crate) fn parse_shared_item_id(value: &str, field: FieldName) -> Result<SharedItemId, Error> {
    parse_uuid(value, field).map(SharedItemId::from_uuid)
}

pub(crate) fn parse_request_id(value: &str, field: FieldName) -> Result<FollowRequestId, Error> {
    parse_uuid(value, field).map(FollowRequestId::from_uuid)
}

pub(crate) fn parse_product_id(value: &str, field: FieldName) -> Result<ProductId, Error> {
    ProductId::new(value).map_err(|err| {
        field_error(
            field,
            ValidationCode::InvalidProductId,
            format!("{}: {err}", field.0),
            value,
        )
    })
}

/// Report malformed JSON bodies as domain errors.
pub(crate) fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid request body: {err}"))
        .with_details(json!({ "code": ValidationCode::InvalidBody.as_str() }))
        .into()
}

/// Report malformed query strings as domain errors.
pub(crate) fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}"))
        .with_details(json!({ "code": ValidationCode::InvalidQuery.as_str() }))
        .into()
}
