//! Driven ports for the hexagonal boundary.
//!
//! One repository trait per aggregate table. Adapters live under
//! `crate::outbound`; every port reports failures as [`StoreError`].

mod macros;
pub(crate) use macros::define_port_error;

mod feed_item_repository;
mod follow_repository;
mod profile_repository;
mod shared_item_repository;
mod store_error;
mod vote_repository;

pub use feed_item_repository::FeedItemRepository;
#[cfg(test)]
pub use feed_item_repository::MockFeedItemRepository;
pub use follow_repository::{FollowRemoval, FollowRepository, ResolveOutcome};
#[cfg(test)]
pub use follow_repository::MockFollowRepository;
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::ProfileRepository;
#[cfg(test)]
pub use shared_item_repository::MockSharedItemRepository;
pub use shared_item_repository::SharedItemRepository;
pub use store_error::StoreError;
#[cfg(test)]
pub use vote_repository::MockVoteRepository;
pub use vote_repository::VoteRepository;
