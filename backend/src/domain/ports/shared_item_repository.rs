//! Port for the shared item pool.

use async_trait::async_trait;

use crate::domain::{ProductId, SharedItem, SharedItemId, UserId};

use super::StoreError;

/// Storage for [`SharedItem`] rows.
///
/// At most one active row exists per `(user_id, product_id)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SharedItemRepository: Send + Sync {
    /// Insert a new share.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] when the owner already has an active share of
    /// the same product.
    async fn insert(&self, item: &SharedItem) -> Result<(), StoreError>;

    /// Fetch a share regardless of its active flag.
    async fn find(&self, item_id: &SharedItemId) -> Result<Option<SharedItem>, StoreError>;

    /// The owner's active share of a product, if any.
    async fn find_active_for_product(
        &self,
        owner_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Option<SharedItem>, StoreError>;

    /// Soft-delete a share. Returns `false` when it did not exist.
    async fn deactivate(&self, item_id: &SharedItemId) -> Result<bool, StoreError>;

    /// Active shares owned by any of `owner_ids`, newest first, at most
    /// `limit` rows.
    async fn list_active_by_owners(
        &self,
        owner_ids: &[UserId],
        limit: usize,
    ) -> Result<Vec<SharedItem>, StoreError>;
}
