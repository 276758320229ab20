//! Shared items, votes, and the toggle rule that drives tallies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProductId, ProductSnapshot, UserId};

/// Maximum share message length in characters.
pub const SHARE_MESSAGE_MAX: usize = 200;

/// Identifier of a shared item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedItemId(Uuid);

impl SharedItemId {
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

impl fmt::Display for SharedItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A product promoted into the shared pool by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedItem {
    pub id: SharedItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub snapshot: ProductSnapshot,
    pub share_message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A voter's opinion of a shared item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Like,
    Dislike,
}

/// Error returned when parsing an unknown vote type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vote type: {0}")]
pub struct UnknownVoteType(pub String);

impl VoteType {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl FromStr for VoteType {
    type Err = UnknownVoteType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(UnknownVoteType(other.to_owned())),
        }
    }
}

/// One voter's vote on one shared item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub shared_item_id: SharedItemId,
    pub voter_id: UserId,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// Store mutation implied by a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No prior vote: insert one.
    Insert(VoteType),
    /// Same vote repeated: remove it.
    Remove(VoteType),
    /// Opposite vote: replace in place.
    Replace { from: VoteType, to: VoteType },
}

impl VoteTransition {
    /// Resolve the toggle rule for `requested` given the voter's `existing`
    /// vote.
    ///
    /// # Examples
    /// ```
    /// use curation::domain::{VoteTransition, VoteType};
    ///
    /// assert_eq!(
    ///     VoteTransition::resolve(Some(VoteType::Like), VoteType::Like),
    ///     VoteTransition::Remove(VoteType::Like),
    /// );
    /// ```
    pub fn resolve(existing: Option<VoteType>, requested: VoteType) -> Self {
        match existing {
            None => Self::Insert(requested),
            Some(current) if current == requested => Self::Remove(current),
            Some(current) => Self::Replace {
                from: current,
                to: requested,
            },
        }
    }

    /// The voter's vote after the transition.
    pub const fn resulting_vote(self) -> Option<VoteType> {
        match self {
            Self::Insert(vote) => Some(vote),
            Self::Remove(_) => None,
            Self::Replace { to, .. } => Some(to),
        }
    }
}

/// Aggregate counts for a shared item plus the viewer's own vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub like_count: u64,
    pub dislike_count: u64,
    pub viewer_vote: Option<VoteType>,
}

impl VoteTally {
    /// Tally after applying `transition` locally.
    #[must_use]
    pub fn applying(mut self, transition: VoteTransition) -> Self {
        match transition {
            VoteTransition::Insert(vote) => self.increment(vote),
            VoteTransition::Remove(vote) => self.decrement(vote),
            VoteTransition::Replace { from, to } => {
                self.decrement(from);
                self.increment(to);
            }
        }
        self.viewer_vote = transition.resulting_vote();
        self
    }

    fn counter(&mut self, vote: VoteType) -> &mut u64 {
        match vote {
            VoteType::Like => &mut self.like_count,
            VoteType::Dislike => &mut self.dislike_count,
        }
    }

    fn increment(&mut self, vote: VoteType) {
        let counter = self.counter(vote);
        *counter = counter.saturating_add(1);
    }

    fn decrement(&mut self, vote: VoteType) {
        let counter = self.counter(vote);
        *counter = counter.saturating_sub(1);
    }
}

/// Raw like/dislike counts for one item, before attaching a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub like_count: u64,
    pub dislike_count: u64,
}

impl VoteCounts {
    /// Attach the viewer's vote.
    pub const fn for_viewer(self, viewer_vote: Option<VoteType>) -> VoteTally {
        VoteTally {
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            viewer_vote,
        }
    }
}

/// A shared item as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedItemView {
    pub item: SharedItem,
    pub tally: VoteTally,
}
