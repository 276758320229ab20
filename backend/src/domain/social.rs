//! Follow edges, follow requests, and relationship state.
//!
//! Following is one-way: an accepted request lets the requester see the
//! recipient's feed and shares, nothing more. Mutual visibility needs two
//! accepted requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UserId, UserProfile};

/// Maximum follow request message length in characters.
pub const FOLLOW_MESSAGE_MAX: usize = 280;

/// Identifier of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowRequestId(Uuid);

impl FollowRequestId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for FollowRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle of a follow request.
///
/// `Pending` moves to `Accepted` or `Declined`; both are terminal for the
/// request row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    Pending,
    Accepted,
    Declined,
}

/// Error returned when parsing an unknown follow status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown follow status: {0}")]
pub struct UnknownFollowStatus(pub String);

impl FollowStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl FromStr for FollowStatus {
    type Err = UnknownFollowStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(UnknownFollowStatus(other.to_owned())),
        }
    }
}

/// Recipient's answer to a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    /// Status a pending request moves to.
    pub const fn resulting_status(self) -> FollowStatus {
        match self {
            Self::Accept => FollowStatus::Accepted,
            Self::Decline => FollowStatus::Declined,
        }
    }
}

/// A request from `requester_id` to follow `recipient_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub id: FollowRequestId,
    pub requester_id: UserId,
    pub recipient_id: UserId,
    pub status: FollowStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FollowRequest {
    /// A new pending request.
    pub fn pending(
        requester_id: UserId,
        recipient_id: UserId,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FollowRequestId::random(),
            requester_id,
            recipient_id,
            status: FollowStatus::Pending,
            message,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the request still awaits an answer.
    pub fn is_pending(&self) -> bool {
        self.status == FollowStatus::Pending
    }
}

/// Directed visibility edge: `follower_id` sees `following_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub following_id: UserId,
    pub followed_at: DateTime<Utc>,
}

/// A profile on the other end of an edge or request, with the time the
/// connection was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub profile: UserProfile,
    pub since: DateTime<Utc>,
}

/// A pending inbound request joined with the requester's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub request: FollowRequest,
    pub requester: UserProfile,
}

/// The viewer's relationship towards another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    None,
    Requested,
    Following,
}

/// Action a client takes on a relationship before the server confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowIntent {
    Request,
    Unfollow,
}

impl Relationship {
    /// State the relationship should reach once `intent` succeeds.
    pub const fn after(self, intent: FollowIntent) -> Self {
        match (self, intent) {
            (Self::None, FollowIntent::Request) => Self::Requested,
            (state, FollowIntent::Request) => state,
            (_, FollowIntent::Unfollow) => Self::None,
        }
    }
}
