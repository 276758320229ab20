//! Share & Vote Ledger: the shared pool and per-voter toggle votes.
//!
//! Tallies are always recomputed from vote rows; nothing caches a counter.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    FeedItemRepository, FollowRepository, SharedItemRepository, StoreError, VoteRepository,
};
use crate::domain::{
    ActivityType, Error, FeedLimits, PendingChange, Product, ProductId, SHARE_MESSAGE_MAX,
    SharedItem, SharedItemId, SharedItemView, UserId, Vote, VoteTally, VoteTransition, VoteType,
    normalize_message,
};

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("share message must be at most {max} characters")]
    MessageTooLong { max: usize },
    #[error("product is already shared")]
    AlreadyShared { item_id: Option<SharedItemId> },
    #[error("shared item not found")]
    ItemNotFound,
    #[error("only the owner may unshare an item")]
    NotOwner,
    #[error("no such item")]
    NotFound,
    #[error("ledger store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<LedgerError> for Error {
    fn from(error: LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::MessageTooLong { max } => Self::invalid_request(message)
                .with_details(json!({ "field": "message", "max": max })),
            LedgerError::AlreadyShared { item_id } => Self::conflict(message)
                .with_details(json!({ "code": "already_shared", "sharedItemId": item_id })),
            LedgerError::ItemNotFound | LedgerError::NotFound => Self::not_found(message),
            LedgerError::NotOwner => Self::forbidden(message),
            LedgerError::Store(inner) => inner.into(),
        }
    }
}

/// A failed optimistic vote: the error plus the tally to show instead of the
/// prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRollback {
    pub error: LedgerError,
    pub tally: VoteTally,
}

/// Shared pool and vote ledger service.
#[derive(Clone)]
pub struct ShareLedger {
    shared_items: Arc<dyn SharedItemRepository>,
    votes: Arc<dyn VoteRepository>,
    follows: Arc<dyn FollowRepository>,
    feed_items: Arc<dyn FeedItemRepository>,
    limits: FeedLimits,
    clock: Arc<dyn Clock>,
}

impl ShareLedger {
    /// Create the ledger over the given repositories.
    pub fn new(
        shared_items: Arc<dyn SharedItemRepository>,
        votes: Arc<dyn VoteRepository>,
        follows: Arc<dyn FollowRepository>,
        feed_items: Arc<dyn FeedItemRepository>,
        limits: FeedLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared_items,
            votes,
            follows,
            feed_items,
            limits,
            clock,
        }
    }

    /// Promote a product into the shared pool.
    pub async fn share(
        &self,
        viewer: &UserId,
        product: Product,
        message: Option<String>,
    ) -> Result<SharedItem, LedgerError> {
        let share_message = normalize_message(message, SHARE_MESSAGE_MAX)
            .map_err(|max| LedgerError::MessageTooLong { max })?;
        let item = SharedItem {
            id: SharedItemId::random(),
            user_id: *viewer,
            product_id: product.product_id,
            snapshot: product.snapshot,
            share_message,
            is_active: true,
            created_at: self.clock.utc(),
        };

        match self.shared_items.insert(&item).await {
            Ok(()) => {
                info!(%viewer, item_id = %item.id, product_id = %item.product_id, "product shared");
                Ok(item)
            }
            Err(StoreError::Conflict { .. }) => {
                let existing = self
                    .shared_items
                    .find_active_for_product(viewer, &item.product_id)
                    .await?;
                Err(LedgerError::AlreadyShared {
                    item_id: existing.map(|shared| shared.id),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Share one of the viewer's feed items using its stored snapshot.
    ///
    /// The feed item's activity becomes `shared` on a best-effort basis.
    pub async fn share_from_feed(
        &self,
        viewer: &UserId,
        product_id: &ProductId,
        message: Option<String>,
    ) -> Result<SharedItem, LedgerError> {
        let feed_item = self
            .feed_items
            .find(viewer, product_id)
            .await?
            .filter(|item| item.is_active)
            .ok_or(LedgerError::NotFound)?;
        let product = Product {
            product_id: feed_item.product_id,
            snapshot: feed_item.snapshot,
        };
        let shared = self.share(viewer, product, message).await?;

        if let Err(err) = self
            .feed_items
            .set_activity(viewer, product_id, ActivityType::Shared)
            .await
        {
            warn!(%viewer, %product_id, error = %err, "could not mark feed item as shared");
        }
        Ok(shared)
    }

    /// Cast, remove, or flip the viewer's vote and return the fresh tally.
    ///
    /// Same vote twice removes it; the opposite vote replaces it in place.
    pub async fn vote(
        &self,
        viewer: &UserId,
        item_id: &SharedItemId,
        vote_type: VoteType,
    ) -> Result<VoteTally, LedgerError> {
        self.require_active(item_id).await?;

        let existing = self.current_vote(item_id, viewer).await?;
        let transition = VoteTransition::resolve(existing, vote_type);
        match self.apply(item_id, viewer, transition).await {
            Err(StoreError::Conflict { constraint }) => {
                debug!(%viewer, %item_id, %constraint, "vote raced; re-reading");
                let existing = self.current_vote(item_id, viewer).await?;
                let transition = VoteTransition::resolve(existing, vote_type);
                self.apply(item_id, viewer, transition).await?;
            }
            other => other?,
        }

        info!(%viewer, %item_id, vote = vote_type.as_str(), "vote recorded");
        self.tally_for(viewer, item_id).await
    }

    /// Run a vote predicted by `pending`, returning the authoritative tally on
    /// success or the rolled-back tally alongside the error.
    pub async fn commit_vote(
        &self,
        viewer: &UserId,
        item_id: &SharedItemId,
        vote_type: VoteType,
        pending: PendingChange<VoteTally>,
    ) -> Result<VoteTally, VoteRollback> {
        match self.vote(viewer, item_id, vote_type).await {
            Ok(authoritative) => Ok(pending.commit(authoritative)),
            Err(error) => Err(VoteRollback {
                error,
                tally: pending.rollback(),
            }),
        }
    }

    /// Current counts for an active item plus the viewer's vote.
    pub async fn tally(&self, viewer: &UserId, item_id: &SharedItemId) -> Result<VoteTally, LedgerError> {
        self.require_active(item_id).await?;
        self.tally_for(viewer, item_id).await
    }

    /// Soft-delete a share. Votes are kept.
    pub async fn unshare(&self, viewer: &UserId, item_id: &SharedItemId) -> Result<(), LedgerError> {
        let item = self
            .shared_items
            .find(item_id)
            .await?
            .ok_or(LedgerError::NotFound)?;
        if item.user_id != *viewer {
            return Err(LedgerError::NotOwner);
        }
        if item.is_active {
            self.shared_items.deactivate(item_id).await?;
            info!(%viewer, %item_id, "item unshared");
        }
        Ok(())
    }

    /// The viewer's own active shares plus those of everyone they follow,
    /// newest first, each with its tally for the viewer.
    pub async fn shared_feed(
        &self,
        viewer: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<SharedItemView>, LedgerError> {
        let mut owners = vec![*viewer];
        owners.extend(
            self.follows
                .list_following(viewer)
                .await?
                .into_iter()
                .map(|edge| edge.following_id),
        );

        let items = self
            .shared_items
            .list_active_by_owners(&owners, self.limits.clamp(limit))
            .await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<SharedItemId> = items.iter().map(|item| item.id).collect();
        let counts = self.votes.counts(&ids).await?;
        let own_votes = self.votes.votes_by_voter(viewer, &ids).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let tally = counts
                    .get(&item.id)
                    .copied()
                    .unwrap_or_default()
                    .for_viewer(own_votes.get(&item.id).copied());
                SharedItemView { item, tally }
            })
            .collect())
    }

    async fn require_active(&self, item_id: &SharedItemId) -> Result<SharedItem, LedgerError> {
        self.shared_items
            .find(item_id)
            .await?
            .filter(|item| item.is_active)
            .ok_or(LedgerError::ItemNotFound)
    }

    async fn current_vote(
        &self,
        item_id: &SharedItemId,
        viewer: &UserId,
    ) -> Result<Option<VoteType>, LedgerError> {
        Ok(self
            .votes
            .find_vote(item_id, viewer)
            .await?
            .map(|vote| vote.vote_type))
    }

    async fn apply(
        &self,
        item_id: &SharedItemId,
        viewer: &UserId,
        transition: VoteTransition,
    ) -> Result<(), StoreError> {
        match transition {
            VoteTransition::Insert(vote_type) => {
                let vote = Vote {
                    shared_item_id: *item_id,
                    voter_id: *viewer,
                    vote_type,
                    created_at: self.clock.utc(),
                };
                self.votes.insert_vote(&vote).await
            }
            VoteTransition::Remove(_) => self.votes.delete_vote(item_id, viewer).await.map(drop),
            VoteTransition::Replace { to, .. } => {
                if self.votes.update_vote(item_id, viewer, to).await? {
                    return Ok(());
                }
                let vote = Vote {
                    shared_item_id: *item_id,
                    voter_id: *viewer,
                    vote_type: to,
                    created_at: self.clock.utc(),
                };
                self.votes.insert_vote(&vote).await
            }
        }
    }

    async fn tally_for(&self, viewer: &UserId, item_id: &SharedItemId) -> Result<VoteTally, LedgerError> {
        let ids = [*item_id];
        let counts = self.votes.counts(&ids).await?;
        let viewer_vote = self.current_vote(item_id, viewer).await?;
        Ok(counts
            .get(item_id)
            .copied()
            .unwrap_or_default()
            .for_viewer(viewer_vote))
    }
}
