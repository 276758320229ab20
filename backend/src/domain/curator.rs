//! Feed Curator: ranked, paged, and sampled views of feed items.

use std::sync::{Arc, Mutex};

use pagination::{CursorError, Page, PageParams};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{FeedItemRepository, FollowRepository, StoreError};
use crate::domain::{Error, FeedItem, FeedRankKey, ProductId, UserId, rank_feed};

/// Limits applied to feed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLimits {
    pub default_limit: usize,
    pub max_limit: usize,
    pub sample_window: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            sample_window: 10,
        }
    }
}

impl FeedLimits {
    /// Resolve a requested limit: absent means the default, and the result is
    /// clamped to `1..=max_limit`.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }

    /// Page parameters for a cursor and requested limit.
    pub fn page(&self, cursor: Option<String>, requested: Option<usize>) -> PageParams {
        PageParams::new(cursor, requested, self.default_limit, self.max_limit)
    }
}

/// Feed read failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CuratorError {
    #[error("no feed item for product {product_id}")]
    NotFound { product_id: ProductId },
    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),
    #[error("feed store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<CuratorError> for Error {
    fn from(error: CuratorError) -> Self {
        match error {
            CuratorError::NotFound { product_id } => Self::not_found("feed item not found")
                .with_details(json!({ "productId": product_id })),
            CuratorError::InvalidCursor(inner) => Self::invalid_request(inner.to_string())
                .with_details(json!({ "field": "cursor" })),
            CuratorError::Store(inner) => inner.into(),
        }
    }
}

/// Ranked views over feed items.
pub struct FeedCurator {
    feed_items: Arc<dyn FeedItemRepository>,
    follows: Arc<dyn FollowRepository>,
    limits: FeedLimits,
    rng: Mutex<SmallRng>,
}

impl FeedCurator {
    /// Create a curator with an entropy-seeded sampler.
    pub fn new(
        feed_items: Arc<dyn FeedItemRepository>,
        follows: Arc<dyn FollowRepository>,
        limits: FeedLimits,
    ) -> Self {
        Self::with_rng(feed_items, follows, limits, SmallRng::from_entropy())
    }

    /// Create a curator whose sampler is seeded deterministically.
    pub fn with_seed(
        feed_items: Arc<dyn FeedItemRepository>,
        follows: Arc<dyn FollowRepository>,
        limits: FeedLimits,
        seed: u64,
    ) -> Self {
        Self::with_rng(feed_items, follows, limits, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(
        feed_items: Arc<dyn FeedItemRepository>,
        follows: Arc<dyn FollowRepository>,
        limits: FeedLimits,
        rng: SmallRng,
    ) -> Self {
        Self {
            feed_items,
            follows,
            limits,
            rng: Mutex::new(rng),
        }
    }

    /// Limits this curator applies.
    pub fn limits(&self) -> FeedLimits {
        self.limits
    }

    /// The user's active feed items in ranking order.
    pub async fn get_feed(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<FeedItem>, CuratorError> {
        let mut items = self.ranked(user_id).await?;
        items.truncate(self.limits.clamp(limit));
        Ok(items)
    }

    /// One page of the ranked feed.
    ///
    /// The cursor carries the [`FeedRankKey`] of the last item on the previous
    /// page; the next page starts strictly after it.
    pub async fn get_feed_page(
        &self,
        user_id: &UserId,
        cursor: Option<String>,
        limit: Option<usize>,
    ) -> Result<Page<FeedItem>, CuratorError> {
        let params = self.limits.page(cursor, limit);
        let after: Option<FeedRankKey> = params.decode_cursor()?;
        let ranked = self.ranked(user_id).await?;

        let window: Vec<FeedItem> = ranked
            .into_iter()
            .filter(|item| after.as_ref().is_none_or(|key| item.rank_key() > *key))
            .take(params.limit() + 1)
            .collect();
        Ok(Page::from_window(window, params.limit(), FeedItem::rank_key)?)
    }

    /// A uniformly random pick among the user's most recent active items.
    pub async fn get_sample(&self, user_id: &UserId) -> Result<Option<FeedItem>, CuratorError> {
        let mut items = self.feed_items.list_active(user_id).await?;
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        items.truncate(self.limits.sample_window.max(1));

        let picked = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            items.choose(&mut *rng).cloned()
        };
        Ok(picked)
    }

    /// Hide an item from the user's feed. Re-collecting the product restores
    /// it. An item that is already hidden counts as not found.
    pub async fn remove_from_feed(
        &self,
        viewer: &UserId,
        product_id: &ProductId,
    ) -> Result<(), CuratorError> {
        let hidden = self.feed_items.hide(viewer, product_id).await?;
        if !hidden {
            return Err(CuratorError::NotFound {
                product_id: product_id.clone(),
            });
        }
        info!(%viewer, %product_id, "feed item removed");
        Ok(())
    }

    /// Active feed items of everyone the viewer follows, ranked.
    pub async fn friends_feed(
        &self,
        viewer: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<FeedItem>, CuratorError> {
        let following: Vec<UserId> = self
            .follows
            .list_following(viewer)
            .await?
            .into_iter()
            .map(|edge| edge.following_id)
            .collect();
        if following.is_empty() {
            debug!(%viewer, "friends feed empty: viewer follows nobody");
            return Ok(Vec::new());
        }

        let mut items = self.feed_items.list_active_for_users(&following).await?;
        rank_feed(&mut items);
        items.truncate(self.limits.clamp(limit));
        Ok(items)
    }

    async fn ranked(&self, user_id: &UserId) -> Result<Vec<FeedItem>, CuratorError> {
        let mut items = self.feed_items.list_active(user_id).await?;
        rank_feed(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests;
