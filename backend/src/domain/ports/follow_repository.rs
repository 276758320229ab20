//! Port for follow edges and follow requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Decision, FollowEdge, FollowRequest, FollowRequestId, FollowStatus, UserId};

use super::StoreError;

/// Result of resolving a follow request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The request was pending and now carries its new status.
    Resolved(FollowRequest),
    /// The request had already been answered; it is returned unchanged.
    NotPending(FollowRequest),
    /// No request has this id.
    Missing,
}

/// Rows deleted by [`FollowRepository::remove_follow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowRemoval {
    pub edge_removed: bool,
    pub request_retired: bool,
}

impl FollowRemoval {
    /// Whether anything was deleted.
    pub fn removed_anything(self) -> bool {
        self.edge_removed || self.request_retired
    }
}

/// Storage for [`FollowRequest`] rows (unique per ordered pair) and
/// [`FollowEdge`] rows (unique per ordered pair).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Write a pending request for its pair.
    ///
    /// A previous accepted or declined row for the pair is replaced. Returns
    /// `false` without writing when the pair already has a pending request.
    async fn open_request(&self, request: &FollowRequest) -> Result<bool, StoreError>;

    /// Fetch a request by id.
    async fn find_request(
        &self,
        request_id: &FollowRequestId,
    ) -> Result<Option<FollowRequest>, StoreError>;

    /// Fetch the request row for an ordered pair.
    async fn find_request_between(
        &self,
        requester_id: &UserId,
        recipient_id: &UserId,
    ) -> Result<Option<FollowRequest>, StoreError>;

    /// Answer a pending request.
    ///
    /// Accepting marks the request accepted and inserts the follow edge in a
    /// single transaction; an edge that already exists is kept.
    async fn resolve_request(
        &self,
        request_id: &FollowRequestId,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<ResolveOutcome, StoreError>;

    /// Delete the edge and the pair's pending or accepted request in one
    /// transaction. A declined request row is kept.
    async fn remove_follow(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<FollowRemoval, StoreError>;

    /// Insert an edge unless it exists. Returns `true` when a row was added.
    async fn insert_edge(&self, edge: &FollowEdge) -> Result<bool, StoreError>;

    /// Delete an edge. Returns `false` when it did not exist.
    async fn delete_edge(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError>;

    /// Whether `follower_id` follows `following_id`.
    async fn edge_exists(
        &self,
        follower_id: &UserId,
        following_id: &UserId,
    ) -> Result<bool, StoreError>;

    /// Edges where `follower_id` is the follower.
    async fn list_following(&self, follower_id: &UserId) -> Result<Vec<FollowEdge>, StoreError>;

    /// Edges where `following_id` is being followed.
    async fn list_followers(&self, following_id: &UserId) -> Result<Vec<FollowEdge>, StoreError>;

    /// Requests addressed to `recipient_id` with the given status.
    async fn list_requests_to(
        &self,
        recipient_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError>;

    /// Requests sent by `requester_id` with the given status.
    async fn list_requests_from(
        &self,
        requester_id: &UserId,
        status: FollowStatus,
    ) -> Result<Vec<FollowRequest>, StoreError>;
}
