//! Test helpers for inbound HTTP components.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use super::configure_api;
use super::viewer::VIEWER_HEADER;
use crate::domain::UserId;
use crate::test_support::MemoryHarness;

/// App serving the API over the harness's services.
pub(crate) async fn init_app(
    harness: &MemoryHarness,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(harness.http_state()))
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await
}

/// Ingestion body for one owner and one product.
pub(crate) fn ingest_body(owner: &str, product_id: &str, title: &str) -> Value {
    json!({
        "owner": { "displayName": owner },
        "items": [{ "id": product_id, "title": title }],
        "activityType": "saved",
        "source": "http-test",
    })
}

/// `(header, value)` pair identifying `user` as the viewer.
pub(crate) fn as_viewer(user: &UserId) -> (&'static str, String) {
    (VIEWER_HEADER, user.to_string())
}
