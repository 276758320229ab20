//! Social Graph Manager: follow requests, follow edges, and discovery.
//!
//! A follow edge only comes into existence by accepting a request; there is
//! no direct follow.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{FollowRepository, ProfileRepository, ResolveOutcome, StoreError};
use crate::domain::{
    ConnectionView, Decision, Error, FOLLOW_MESSAGE_MAX, FollowEdge, FollowRequest,
    FollowRequestId, FollowStatus, PendingRequestView, Relationship, UserId, UserProfile,
    normalize_message,
};

/// Follow workflow failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocialError {
    #[error("users cannot follow themselves")]
    CannotFollowSelf,
    #[error("unknown user {user_id}")]
    UnknownUser { user_id: UserId },
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("a follow request is already pending")]
    AlreadyPending { request_id: FollowRequestId },
    #[error("message must be at most {max} characters")]
    MessageTooLong { max: usize },
    #[error("follow request or edge not found")]
    NotFound,
    #[error("follow request was already {}", .status.as_str())]
    AlreadyResolved { status: FollowStatus },
    #[error("only the recipient may answer a follow request")]
    NotRecipient,
    #[error("social store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<SocialError> for Error {
    fn from(error: SocialError) -> Self {
        let message = error.to_string();
        match error {
            SocialError::CannotFollowSelf => Self::invalid_request(message),
            SocialError::MessageTooLong { max } => {
                Self::invalid_request(message).with_details(json!({ "field": "message", "max": max }))
            }
            SocialError::UnknownUser { user_id } => {
                Self::not_found(message).with_details(json!({ "userId": user_id }))
            }
            SocialError::NotFound => Self::not_found(message),
            SocialError::AlreadyFollowing => Self::conflict(message)
                .with_details(json!({ "code": "already_following" })),
            SocialError::AlreadyPending { request_id } => Self::conflict(message)
                .with_details(json!({ "code": "already_pending", "requestId": request_id })),
            SocialError::AlreadyResolved { status } => Self::conflict(message)
                .with_details(json!({ "code": "already_resolved", "status": status })),
            SocialError::NotRecipient => Self::forbidden(message),
            SocialError::Store(inner) => inner.into(),
        }
    }
}

/// Follow workflow service.
#[derive(Clone)]
pub struct SocialGraph {
    profiles: Arc<dyn ProfileRepository>,
    follows: Arc<dyn FollowRepository>,
    clock: Arc<dyn Clock>,
}

impl SocialGraph {
    /// Create the service over the given repositories.
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        follows: Arc<dyn FollowRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            follows,
            clock,
        }
    }

    /// Ask to follow `recipient_id`.
    ///
    /// A previously declined or retired request for the same pair is replaced
    /// by a fresh pending one with a new id.
    pub async fn send_request(
        &self,
        viewer: &UserId,
        recipient_id: &UserId,
        message: Option<String>,
    ) -> Result<FollowRequest, SocialError> {
        if viewer == recipient_id {
            return Err(SocialError::CannotFollowSelf);
        }
        let message = normalize_message(message, FOLLOW_MESSAGE_MAX)
            .map_err(|max| SocialError::MessageTooLong { max })?;
        self.require_profile(viewer).await?;
        self.require_profile(recipient_id).await?;

        if self.follows.edge_exists(viewer, recipient_id).await? {
            return Err(SocialError::AlreadyFollowing);
        }

        let request = FollowRequest::pending(*viewer, *recipient_id, message, self.clock.utc());
        let written = match self.follows.open_request(&request).await {
            Ok(written) => written,
            Err(StoreError::Conflict { constraint }) => {
                warn!(%viewer, %recipient_id, %constraint, "concurrent follow request");
                false
            }
            Err(err) => return Err(err.into()),
        };
        if !written {
            return Err(self.pending_conflict(viewer, recipient_id).await?);
        }

        info!(%viewer, %recipient_id, request_id = %request.id, "follow request sent");
        Ok(request)
    }

    /// Accept or decline a request addressed to the viewer.
    pub async fn respond(
        &self,
        viewer: &UserId,
        request_id: &FollowRequestId,
        decision: Decision,
    ) -> Result<FollowRequest, SocialError> {
        let request = self
            .follows
            .find_request(request_id)
            .await?
            .ok_or(SocialError::NotFound)?;
        if request.recipient_id != *viewer {
            return Err(SocialError::NotRecipient);
        }

        match self
            .follows
            .resolve_request(request_id, decision, self.clock.utc())
            .await?
        {
            ResolveOutcome::Resolved(resolved) => {
                info!(%viewer, %request_id, status = resolved.status.as_str(), "follow request answered");
                Ok(resolved)
            }
            ResolveOutcome::NotPending(current) => Err(SocialError::AlreadyResolved {
                status: current.status,
            }),
            ResolveOutcome::Missing => Err(SocialError::NotFound),
        }
    }

    /// Stop following `target_id`, or withdraw a pending request to them.
    ///
    /// The edge and the pair's accepted or pending request row go together,
    /// so a failed call leaves the follow in place and a new request can be
    /// sent after a successful one. Declined rows are left alone.
    pub async fn unfollow(&self, viewer: &UserId, target_id: &UserId) -> Result<(), SocialError> {
        let removal = self.follows.remove_follow(viewer, target_id).await?;
        if !removal.removed_anything() {
            return Err(SocialError::NotFound);
        }
        info!(
            %viewer,
            %target_id,
            edge_removed = removal.edge_removed,
            request_retired = removal.request_retired,
            "unfollowed"
        );
        Ok(())
    }

    /// Re-create edges missing for accepted requests involving `user_id`.
    ///
    /// Returns the number of edges repaired.
    pub async fn reconcile(&self, user_id: &UserId) -> Result<usize, SocialError> {
        let mut accepted = self
            .follows
            .list_requests_from(user_id, FollowStatus::Accepted)
            .await?;
        accepted.extend(
            self.follows
                .list_requests_to(user_id, FollowStatus::Accepted)
                .await?,
        );

        let mut repaired = 0;
        for request in accepted {
            let edge = FollowEdge {
                follower_id: request.requester_id,
                following_id: request.recipient_id,
                followed_at: request.updated_at,
            };
            if self.follows.insert_edge(&edge).await? {
                repaired += 1;
            }
        }
        if repaired > 0 {
            warn!(%user_id, repaired, "re-created missing follow edges");
        }
        Ok(repaired)
    }

    /// Users following the viewer, newest first.
    pub async fn list_followers(&self, viewer: &UserId) -> Result<Vec<ConnectionView>, SocialError> {
        let edges = self.follows.list_followers(viewer).await?;
        let pairs = edges
            .into_iter()
            .map(|edge| (edge.follower_id, edge.followed_at))
            .collect();
        self.join_profiles(pairs).await
    }

    /// Users the viewer follows, newest first.
    pub async fn list_following(&self, viewer: &UserId) -> Result<Vec<ConnectionView>, SocialError> {
        let edges = self.follows.list_following(viewer).await?;
        let pairs = edges
            .into_iter()
            .map(|edge| (edge.following_id, edge.followed_at))
            .collect();
        self.join_profiles(pairs).await
    }

    /// Pending requests addressed to the viewer, newest first.
    pub async fn list_pending_requests(
        &self,
        viewer: &UserId,
    ) -> Result<Vec<PendingRequestView>, SocialError> {
        let mut requests = self
            .follows
            .list_requests_to(viewer, FollowStatus::Pending)
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let requester_ids: Vec<UserId> = requests.iter().map(|r| r.requester_id).collect();
        let profiles = self.profile_map(&requester_ids).await?;

        Ok(requests
            .into_iter()
            .filter_map(|request| {
                profiles
                    .get(&request.requester_id)
                    .cloned()
                    .map(|requester| PendingRequestView { request, requester })
            })
            .collect())
    }

    /// Profiles the viewer could send a request to.
    ///
    /// Excludes the viewer, users already followed, and users with a pending
    /// request from the viewer. `query` filters by handle or display name,
    /// ignoring case.
    pub async fn list_discoverable(
        &self,
        viewer: &UserId,
        query: Option<&str>,
    ) -> Result<Vec<UserProfile>, SocialError> {
        let mut excluded: HashSet<UserId> = HashSet::from([*viewer]);
        excluded.extend(
            self.follows
                .list_following(viewer)
                .await?
                .into_iter()
                .map(|edge| edge.following_id),
        );
        excluded.extend(
            self.follows
                .list_requests_from(viewer, FollowStatus::Pending)
                .await?
                .into_iter()
                .map(|request| request.recipient_id),
        );

        Ok(self
            .profiles
            .list_all()
            .await?
            .into_iter()
            .filter(|profile| !excluded.contains(&profile.user_id))
            .filter(|profile| query.is_none_or(|q| profile.matches(q)))
            .collect())
    }

    /// The viewer's relationship towards `other`.
    pub async fn relationship(
        &self,
        viewer: &UserId,
        other: &UserId,
    ) -> Result<Relationship, SocialError> {
        if self.follows.edge_exists(viewer, other).await? {
            return Ok(Relationship::Following);
        }
        let pending = self
            .follows
            .find_request_between(viewer, other)
            .await?
            .is_some_and(|request| request.is_pending());
        Ok(if pending {
            Relationship::Requested
        } else {
            Relationship::None
        })
    }

    async fn require_profile(&self, user_id: &UserId) -> Result<UserProfile, SocialError> {
        self.profiles
            .find_by_id(user_id)
            .await?
            .ok_or(SocialError::UnknownUser { user_id: *user_id })
    }

    async fn pending_conflict(
        &self,
        viewer: &UserId,
        recipient_id: &UserId,
    ) -> Result<SocialError, SocialError> {
        let existing = self.follows.find_request_between(viewer, recipient_id).await?;
        Ok(match existing {
            Some(request) if request.is_pending() => SocialError::AlreadyPending {
                request_id: request.id,
            },
            Some(_) | None => {
                if self.follows.edge_exists(viewer, recipient_id).await? {
                    SocialError::AlreadyFollowing
                } else {
                    SocialError::Store(StoreError::conflict("follow_requests_requester_recipient_key"))
                }
            }
        })
    }

    async fn profile_map(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, UserProfile>, SocialError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .profiles
            .find_many(user_ids)
            .await?
            .into_iter()
            .map(|profile| (profile.user_id, profile))
            .collect())
    }

    async fn join_profiles(
        &self,
        mut pairs: Vec<(UserId, chrono::DateTime<chrono::Utc>)>,
    ) -> Result<Vec<ConnectionView>, SocialError> {
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        let ids: Vec<UserId> = pairs.iter().map(|(id, _)| *id).collect();
        let profiles = self.profile_map(&ids).await?;

        Ok(pairs
            .into_iter()
            .filter_map(|(id, since)| {
                profiles
                    .get(&id)
                    .cloned()
                    .map(|profile| ConnectionView { profile, since })
            })
            .collect())
    }
}
