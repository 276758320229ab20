//! Follow workflow endpoints.
//!
//! ```text
//! POST   /api/v1/follow-requests
//! GET    /api/v1/follow-requests
//! POST   /api/v1/follow-requests/{id}/accept
//! POST   /api/v1/follow-requests/{id}/decline
//! POST   /api/v1/follow-requests/reconcile
//! DELETE /api/v1/following/{userId}
//! GET    /api/v1/followers
//! GET    /api/v1/following
//! GET    /api/v1/discover?q=
//! GET    /api/v1/relationships/{userId}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Decision, Relationship, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_request_id, parse_user_id};
use crate::inbound::http::viewer::Viewer;

/// Body of a new follow request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequestBody {
    pub recipient_id: UserId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    pub user_id: UserId,
    pub relationship: Relationship,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub repaired: usize,
}

/// Ask to follow another user.
#[post("/follow-requests")]
pub async fn send_follow_request(
    state: web::Data<HttpState>,
    viewer: Viewer,
    payload: web::Json<FollowRequestBody>,
) -> ApiResult<HttpResponse> {
    let FollowRequestBody {
        recipient_id,
        message,
    } = payload.into_inner();
    let request = state
        .social
        .send_request(viewer.id(), &recipient_id, message)
        .await?;
    Ok(HttpResponse::Created().json(request))
}

/// Pending requests addressed to the viewer, newest first.
#[get("/follow-requests")]
pub async fn list_follow_requests(
    state: web::Data<HttpState>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let pending = state.social.list_pending_requests(viewer.id()).await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[post("/follow-requests/reconcile")]
pub async fn reconcile_follows(
    state: web::Data<HttpState>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let repaired = state.social.reconcile(viewer.id()).await?;
    Ok(HttpResponse::Ok().json(ReconcileResponse { repaired }))
}

async fn respond(
    state: &HttpState,
    viewer: &Viewer,
    raw_id: &str,
    decision: Decision,
) -> ApiResult<HttpResponse> {
    let request_id = parse_request_id(raw_id, FieldName::new("requestId"))?;
    let resolved = state
        .social
        .respond(viewer.id(), &request_id, decision)
        .await?;
    Ok(HttpResponse::Ok().json(resolved))
}

#[post("/follow-requests/{request_id}/accept")]
pub async fn accept_follow_request(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    respond(&state, &viewer, &path, Decision::Accept).await
}

#[post("/follow-requests/{request_id}/decline")]
pub async fn decline_follow_request(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    respond(&state, &viewer, &path, Decision::Decline).await
}

/// Stop following a user or withdraw a pending request to them.
#[delete("/following/{user_id}")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let target = parse_user_id(&path, FieldName::new("userId"))?;
    state.social.unfollow(viewer.id(), &target).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/followers")]
pub async fn list_followers(
    state: web::Data<HttpState>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let followers = state.social.list_followers(viewer.id()).await?;
    Ok(HttpResponse::Ok().json(followers))
}

#[get("/following")]
pub async fn list_following(
    state: web::Data<HttpState>,
    viewer: Viewer,
) -> ApiResult<HttpResponse> {
    let following = state.social.list_following(viewer.id()).await?;
    Ok(HttpResponse::Ok().json(following))
}

/// Profiles the viewer could follow, optionally filtered by `q`.
#[get("/discover")]
pub async fn discover(
    state: web::Data<HttpState>,
    viewer: Viewer,
    query: web::Query<DiscoverQuery>,
) -> ApiResult<HttpResponse> {
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let profiles = state.social.list_discoverable(viewer.id(), filter).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

#[get("/relationships/{user_id}")]
pub async fn get_relationship(
    state: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_user_id(&path, FieldName::new("userId"))?;
    let relationship = state.social.relationship(viewer.id(), &user_id).await?;
    Ok(HttpResponse::Ok().json(RelationshipResponse {
        user_id,
        relationship,
    }))
}
