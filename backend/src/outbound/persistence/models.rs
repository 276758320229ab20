//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types live here so every repository shares one decoding path.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::ports::StoreError;
use crate::domain::{
    ActivityType, FeedItem, FollowEdge, FollowRequest, FollowRequestId, FollowStatus, ProductId,
    ProductSnapshot, SharedItem, SharedItemId, UserId, UserProfile, Vote, VoteType,
};

use super::schema::{
    follow_requests, followers, item_votes, shared_items, user_feed_items, user_profiles,
};

fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::query(format!("undecodable {column}: {detail}"))
}

pub(crate) fn encode_snapshot(snapshot: &ProductSnapshot) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(snapshot).map_err(|err| StoreError::query(format!("encode snapshot: {err}")))
}

fn decode_snapshot(value: serde_json::Value) -> Result<ProductSnapshot, StoreError> {
    serde_json::from_value(value).map_err(|err| corrupt("snapshot", err))
}

fn decode_product_id(value: String) -> Result<ProductId, StoreError> {
    ProductId::new(value).map_err(|err| corrupt("product_id", err))
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub last_active: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            handle: row.handle,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            bio: row.bio,
            last_active: row.last_active,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_profiles)]
pub(crate) struct NewProfileRow<'a> {
    pub user_id: Uuid,
    pub handle: &'a str,
    pub display_name: &'a str,
    pub avatar_url: Option<&'a str>,
    pub last_active: DateTime<Utc>,
}

/// Refresh applied on conflict. A `None` avatar leaves the stored one alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_profiles)]
pub(crate) struct ProfileRefresh<'a> {
    pub handle: &'a str,
    pub display_name: &'a str,
    pub avatar_url: Option<&'a str>,
    pub last_active: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Feed items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_feed_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedItemRow {
    pub user_id: Uuid,
    pub product_id: String,
    pub snapshot: serde_json::Value,
    pub activity_type: String,
    pub source: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FeedItemRow> for FeedItem {
    type Error = StoreError;

    fn try_from(row: FeedItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            product_id: decode_product_id(row.product_id)?,
            snapshot: decode_snapshot(row.snapshot)?,
            activity_type: row
                .activity_type
                .parse::<ActivityType>()
                .map_err(|err| corrupt("activity_type", err))?,
            source: row.source,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_feed_items)]
pub(crate) struct NewFeedItemRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: &'a str,
    pub snapshot: &'a serde_json::Value,
    pub activity_type: &'a str,
    pub source: &'a str,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_feed_items)]
pub(crate) struct FeedItemOverwrite<'a> {
    pub snapshot: &'a serde_json::Value,
    pub activity_type: &'a str,
    pub source: &'a str,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Follow requests and edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = follow_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FollowRequestRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FollowRequestRow> for FollowRequest {
    type Error = StoreError;

    fn try_from(row: FollowRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: FollowRequestId::from_uuid(row.id),
            requester_id: UserId::from_uuid(row.requester_id),
            recipient_id: UserId::from_uuid(row.recipient_id),
            status: row
                .status
                .parse::<FollowStatus>()
                .map_err(|err| corrupt("status", err))?,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follow_requests)]
pub(crate) struct NewFollowRequestRow<'a> {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: &'a str,
    pub message: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a FollowRequest> for NewFollowRequestRow<'a> {
    fn from(request: &'a FollowRequest) -> Self {
        Self {
            id: *request.id.as_uuid(),
            requester_id: *request.requester_id.as_uuid(),
            recipient_id: *request.recipient_id.as_uuid(),
            status: request.status.as_str(),
            message: request.message.as_deref(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = followers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FollowEdgeRow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub followed_at: DateTime<Utc>,
}

impl From<FollowEdgeRow> for FollowEdge {
    fn from(row: FollowEdgeRow) -> Self {
        Self {
            follower_id: UserId::from_uuid(row.follower_id),
            following_id: UserId::from_uuid(row.following_id),
            followed_at: row.followed_at,
        }
    }
}

impl From<&FollowEdge> for FollowEdgeRow {
    fn from(edge: &FollowEdge) -> Self {
        Self {
            follower_id: *edge.follower_id.as_uuid(),
            following_id: *edge.following_id.as_uuid(),
            followed_at: edge.followed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared items and votes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shared_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SharedItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: String,
    pub snapshot: serde_json::Value,
    pub share_message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SharedItemRow> for SharedItem {
    type Error = StoreError;

    fn try_from(row: SharedItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SharedItemId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            product_id: decode_product_id(row.product_id)?,
            snapshot: decode_snapshot(row.snapshot)?,
            share_message: row.share_message,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shared_items)]
pub(crate) struct NewSharedItemRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: &'a str,
    pub snapshot: &'a serde_json::Value,
    pub share_message: Option<&'a str>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = item_votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub shared_item_id: Uuid,
    pub voter_id: Uuid,
    pub vote_type: String,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn decode_vote_type(value: &str) -> Result<VoteType, StoreError> {
    value.parse::<VoteType>().map_err(|err| corrupt("vote_type", err))
}

impl TryFrom<VoteRow> for Vote {
    type Error = StoreError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shared_item_id: SharedItemId::from_uuid(row.shared_item_id),
            voter_id: UserId::from_uuid(row.voter_id),
            vote_type: decode_vote_type(&row.vote_type)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = item_votes)]
pub(crate) struct NewVoteRow<'a> {
    pub id: Uuid,
    pub shared_item_id: Uuid,
    pub voter_id: Uuid,
    pub vote_type: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Collect fallible row conversions, failing on the first undecodable row.
pub(crate) fn decode_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
