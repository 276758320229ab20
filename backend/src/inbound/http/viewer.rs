//! Acting-user extraction.
//!
//! Identity is issued upstream; the gateway forwards the authenticated user
//! id in the `X-Viewer-Id` header.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use serde_json::json;

use crate::domain::{Error, UserId};

/// Header carrying the acting user's id.
pub const VIEWER_HEADER: &str = "X-Viewer-Id";

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer(pub UserId);

impl Viewer {
    /// The viewer's id.
    pub fn id(&self) -> &UserId {
        &self.0
    }

    fn from_headers(req: &HttpRequest) -> Result<Self, Error> {
        let raw = req
            .headers()
            .get(VIEWER_HEADER)
            .ok_or_else(|| Error::unauthorized("viewer identity required"))?;
        let value = raw
            .to_str()
            .map_err(|_| invalid_viewer("header is not valid ASCII"))?;
        UserId::new(value.trim())
            .map(Self)
            .map_err(|err| invalid_viewer(&err.to_string()))
    }
}

fn invalid_viewer(reason: &str) -> Error {
    Error::invalid_request(format!("invalid {VIEWER_HEADER}: {reason}"))
        .with_details(json!({ "field": VIEWER_HEADER }))
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}
