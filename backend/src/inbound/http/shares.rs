//! Shared pool and voting endpoints.
//!
//! ```text
//! POST   /api/v1/shares
//! GET    /api/v1/shares?limit=
//! DELETE /api/v1/shares/{id}
//! POST   /api/v1/shares/{id}/votes
//! GET    /api/v1/shares/{id}/tally
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, Product, VoteType};
use crate::inbound::http::ApiResult;
use crate::inbound::http::feed::LimitQuery;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_product_id, parse_shared_item_id};
use crate::inbound::http::viewer::Viewer;

/// Share request: either a full `product` or the `productId` of one of the
/// viewer's feed items.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub vote_type: VoteType,
}

const SHARE_ID: FieldName = FieldName::new("shareId");

fn ambiguous_share_source() -> Error {
    Error::invalid_request("provide exactly one of product or productId")
        .with_details(json!({ "fields": ["product", "productId"] }))
}

/// Promote a product, or one of the viewer's feed items, into the shared
/// pool.
#[post("/shares")]
pub async fn share(
    state: web::Data<HttpState>,
    viewer: Viewer,
    payload: web::Json<ShareBody>,
) -> ApiResult<HttpResponse> {
    let ShareBody {
        product,
        product_id,
        message,
    } = payload.into_inner();
    let shared = match (product, product_id) {
        (Some(product), None) => state.ledger.share(viewer.id(), product, message).await?,
        (None, Some(raw)) => {
            let product_id = parse_product_id(&raw, FieldName::new("productId"))?;
            state
                .ledger
                .share_from_feed(viewer.id(), &product_id, message)
                .await?
        }
        _ => return Err(ambiguous_share_source()),
    };
    Ok(HttpResponse::Created().json(shared))
}

/// Active shares of the viewer and everyone they follow, newest first.
#[get("/shares")]
pub async fn shared_feed(
    state: web::Data<HttpState>,
    viewer: Viewer,
    query: web::Query<LimitQuery>,
) -> ApiResult<HttpResponse> {
    let views = state
        .ledger
        .shared_feed(viewer.id(), query.into_inner().limit)
        .await?;
    Ok(HttpResponse::Ok().json(views))
}

#[delete("/shares/{share_id}")]
pub async fn unshare(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let item_id = parse_shared_item_id(&path, SHARE_ID)?;
    state.ledger.unshare(viewer.id(), &item_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Toggle the viewer's vote and return the fresh tally.
#[post("/shares/{share_id}/votes")]
pub async fn vote(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
    payload: web::Json<VoteBody>,
) -> ApiResult<HttpResponse> {
    let item_id = parse_shared_item_id(&path, SHARE_ID)?;
    let updated = state
        .ledger
        .vote(viewer.id(), &item_id, payload.vote_type)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[get("/shares/{share_id}/tally")]
pub async fn tally(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let item_id = parse_shared_item_id(&path, SHARE_ID)?;
    let counts = state.ledger.tally(viewer.id(), &item_id).await?;
    Ok(HttpResponse::Ok().json(counts))
}
