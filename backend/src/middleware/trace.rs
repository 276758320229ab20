//! Per-request tracing span and `trace-id` response header.
//!
//! Every request runs inside an `http_request` span carrying a fresh UUID, so
//! log lines emitted by handlers and services correlate with the id the
//! client sees.
//!
//! ```
//! use actix_web::{App, middleware::from_fn};
//! use curation::middleware::trace_requests;
//!
//! let _app = App::new().wrap(from_fn(trace_requests));
//! ```

use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Wrap the request in a span, log its outcome, and echo the trace id.
pub async fn trace_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let trace_id = Uuid::new_v4();
    let span = info_span!(
        "http_request",
        %trace_id,
        method = %req.method(),
        path = %req.path(),
    );

    async move {
        let started = Instant::now();
        let mut res = next.call(req).await?;
        let status = res.status().as_u16();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if res.status().is_server_error() {
            warn!(status, elapsed_ms, "request failed");
        } else {
            info!(status, elapsed_ms, "request completed");
        }

        match HeaderValue::from_str(&trace_id.to_string()) {
            Ok(value) => {
                res.headers_mut()
                    .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
            }
            Err(err) => error!(error = %err, "failed to encode trace id header"),
        }
        Ok(res)
    }
    .instrument(span)
    .await
}
