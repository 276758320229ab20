//! Port for per-user feed item persistence.

use async_trait::async_trait;

use crate::domain::{ActivityType, FeedItem, ProductId, UserId};

use super::StoreError;

/// Storage for [`FeedItem`] rows, unique per `(user_id, product_id)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedItemRepository: Send + Sync {
    /// Insert the item or overwrite the existing row for the same
    /// `(user_id, product_id)`.
    ///
    /// Overwriting replaces the snapshot, activity type, source and
    /// `created_at`, and re-activates the row.
    async fn upsert(&self, item: &FeedItem) -> Result<(), StoreError>;

    /// Fetch one row regardless of its active flag.
    async fn find(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<FeedItem>, StoreError>;

    /// Active rows owned by `user_id`, unordered.
    async fn list_active(&self, user_id: &UserId) -> Result<Vec<FeedItem>, StoreError>;

    /// Active rows owned by any of `user_ids`, unordered.
    async fn list_active_for_users(&self, user_ids: &[UserId])
    -> Result<Vec<FeedItem>, StoreError>;

    /// Hide an active row. Returns `false` when no active row matched.
    async fn hide(&self, user_id: &UserId, product_id: &ProductId)
    -> Result<bool, StoreError>;

    /// Change the activity type of an existing row. Returns `false` when no
    /// row exists.
    async fn set_activity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        activity_type: ActivityType,
    ) -> Result<bool, StoreError>;
}
