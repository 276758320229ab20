//! Port for user profile persistence.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::StoreError;

/// Storage for [`UserProfile`] records.
///
/// Profiles are created on first sighting and never hard-deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert a profile or refresh an existing one.
    ///
    /// An existing row takes the new handle, display name and `last_active`;
    /// its avatar is replaced only when the new profile carries one, and its
    /// bio is left untouched.
    async fn upsert(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Fetch a profile by identifier.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Fetch every profile whose id appears in `user_ids`, in no particular
    /// order. Unknown ids are ignored.
    async fn find_many(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, StoreError>;

    /// All profiles ordered by display name.
    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError>;
}
