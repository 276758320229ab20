//! Feed items and the fixed ranking used by the curator.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, ProductSnapshot, UserId};

/// How an item entered a user's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Recommended,
    Saved,
    Liked,
    Shared,
    Browsed,
}

/// Error returned when parsing an unknown activity type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivityType(pub String);

impl ActivityType {
    /// All activity types from highest to lowest priority.
    pub const BY_PRIORITY: [Self; 5] = [
        Self::Shared,
        Self::Saved,
        Self::Liked,
        Self::Recommended,
        Self::Browsed,
    ];

    /// Ranking weight; higher sorts first.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Shared => 5,
            Self::Saved => 4,
            Self::Liked => 3,
            Self::Recommended => 2,
            Self::Browsed => 1,
        }
    }

    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Saved => "saved",
            Self::Liked => "liked",
            Self::Shared => "shared",
            Self::Browsed => "browsed",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "recommended" => Ok(Self::Recommended),
            "saved" => Ok(Self::Saved),
            "liked" => Ok(Self::Liked),
            "shared" => Ok(Self::Shared),
            "browsed" => Ok(Self::Browsed),
            other => Err(UnknownActivityType(other.to_owned())),
        }
    }
}

/// One product in a user's personal feed.
///
/// ## Invariants
/// - At most one item exists per `(user_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub snapshot: ProductSnapshot,
    pub activity_type: ActivityType,
    pub source: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl FeedItem {
    /// Position of this item in the feed ordering.
    pub fn rank_key(&self) -> FeedRankKey {
        FeedRankKey {
            priority: self.activity_type.priority(),
            created_at: self.created_at,
            product_id: self.product_id.clone(),
        }
    }
}

/// Ordering key for feed ranking and cursors.
///
/// Orders by activity priority descending, then `created_at` descending, then
/// `product_id` ascending, so "smaller" keys appear earlier in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRankKey {
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub product_id: ProductId,
}

impl Ord for FeedRankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| self.product_id.cmp(&other.product_id))
    }
}

impl PartialOrd for FeedRankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort feed items in ranking order.
pub fn rank_feed(items: &mut [FeedItem]) {
    items.sort_by_cached_key(FeedItem::rank_key);
}
