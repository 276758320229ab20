//! Feed endpoints.
//!
//! ```text
//! GET    /api/v1/feed?limit=&cursor=
//! GET    /api/v1/feed/sample
//! GET    /api/v1/feed/friends?limit=
//! DELETE /api/v1/feed/items/{productId}
//! ```

use actix_web::{HttpResponse, delete, get, web};
use serde::{Deserialize, Serialize};

use crate::domain::FeedItem;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_product_id};
use crate::inbound::http::viewer::Viewer;

/// Paging parameters for feed listings.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Limit-only query for unpaged listings.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Random pick from the viewer's recent items; `item` is null when the feed
/// is empty.
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub item: Option<FeedItem>,
}

/// One page of the viewer's ranked feed.
#[get("/feed")]
pub async fn get_feed(
    state: web::Data<HttpState>,
    viewer: Viewer,
    query: web::Query<FeedQuery>,
) -> ApiResult<HttpResponse> {
    let FeedQuery { limit, cursor } = query.into_inner();
    let page = state
        .curator
        .get_feed_page(viewer.id(), cursor, limit)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/feed/sample")]
pub async fn get_sample(state: web::Data<HttpState>, viewer: Viewer) -> ApiResult<HttpResponse> {
    let item = state.curator.get_sample(viewer.id()).await?;
    Ok(HttpResponse::Ok().json(SampleResponse { item }))
}

/// Ranked items of everyone the viewer follows.
#[get("/feed/friends")]
pub async fn get_friends_feed(
    state: web::Data<HttpState>,
    viewer: Viewer,
    query: web::Query<LimitQuery>,
) -> ApiResult<HttpResponse> {
    let items = state
        .curator
        .friends_feed(viewer.id(), query.into_inner().limit)
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

/// Hide one product from the viewer's feed.
#[delete("/feed/items/{product_id}")]
pub async fn remove_feed_item(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let product_id = parse_product_id(&path.into_inner(), FieldName::new("productId"))?;
    state
        .curator
        .remove_from_feed(viewer.id(), &product_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
