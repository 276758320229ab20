//! Catalog ingestion endpoint.
//!
//! ```text
//! POST /api/v1/ingest
//! ```
//!
//! Collectors post batches on behalf of the owner named in the body; no
//! viewer header is required.

use actix_web::{HttpResponse, post, web};

use crate::domain::IngestRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Normalize and store a batch of raw catalog records.
///
/// Per-record failures are counted in the response rather than failing the
/// batch.
#[post("/ingest")]
pub async fn ingest(
    state: web::Data<HttpState>,
    payload: web::Json<IngestRequest>,
) -> ApiResult<HttpResponse> {
    let result = state.collector.ingest(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}
