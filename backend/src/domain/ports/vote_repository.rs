//! Port for per-voter votes on shared items.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{SharedItemId, UserId, Vote, VoteCounts, VoteType};

use super::StoreError;

/// Storage for [`Vote`] rows, unique per `(shared_item_id, voter_id)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// The voter's current vote on an item.
    async fn find_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<Option<Vote>, StoreError>;

    /// Insert a first vote.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] when the voter already has a vote on the item.
    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// Change an existing vote in place. Returns `false` when no vote exists.
    async fn update_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
        vote_type: VoteType,
    ) -> Result<bool, StoreError>;

    /// Remove a vote. Returns `false` when no vote exists.
    async fn delete_vote(
        &self,
        item_id: &SharedItemId,
        voter_id: &UserId,
    ) -> Result<bool, StoreError>;

    /// Like and dislike counts per item, computed from vote rows. Items
    /// without votes are absent from the map.
    async fn counts(
        &self,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteCounts>, StoreError>;

    /// The voter's votes on the given items.
    async fn votes_by_voter(
        &self,
        voter_id: &UserId,
        item_ids: &[SharedItemId],
    ) -> Result<HashMap<SharedItemId, VoteType>, StoreError>;
}
