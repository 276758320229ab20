//! Domain primitives, aggregates, and services.
//!
//! Purpose: model the curation engine independently of transport and storage.
//! Services take their collaborators as `Arc<dyn Port>` so adapters can be
//! swapped between the Diesel store and the in-memory store.
//!
//! Public surface:
//! - [`EventCollector`] normalizes raw catalog records into feed items.
//! - [`FeedCurator`] ranks, pages, and samples a user's feed.
//! - [`SocialGraph`] manages follow requests and follow edges.
//! - [`ShareLedger`] records shares and toggle votes.
//! - [`Error`] / [`ErrorCode`] are the transport-agnostic failure payload.

pub mod catalog;
pub mod collector;
pub mod curator;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod optimistic;
pub mod ports;
pub mod product;
pub mod share_ledger;
pub mod social;
pub mod social_graph;
pub mod user;

pub use self::catalog::{CanonicalizeError, CatalogCanonicalizer, PlaceholderBaseError};
pub use self::collector::{CollectorError, EventCollector, IngestRequest, IngestResult};
pub use self::curator::{CuratorError, FeedCurator, FeedLimits};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::feed::{ActivityType, FeedItem, FeedRankKey, UnknownActivityType, rank_feed};
pub use self::ledger::{
    SHARE_MESSAGE_MAX, SharedItem, SharedItemId, SharedItemView, UnknownVoteType, Vote,
    VoteCounts, VoteTally, VoteTransition, VoteType,
};
pub use self::optimistic::PendingChange;
pub use self::product::{Product, ProductId, ProductSnapshot, ProductValidationError};
pub use self::share_ledger::{LedgerError, ShareLedger, VoteRollback};
pub use self::social::{
    ConnectionView, Decision, FOLLOW_MESSAGE_MAX, FollowEdge, FollowIntent, FollowRequest,
    FollowRequestId, FollowStatus, PendingRequestView, Relationship, UnknownFollowStatus,
};
pub use self::social_graph::{SocialError, SocialGraph};
pub use self::user::{ProfileSighting, UserId, UserProfile, UserValidationError, slugify};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use curation::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

/// Trim an optional free-text message, treating blank input as absent, and
/// enforce a character limit.
///
/// Returns `Err(max)` when the trimmed message is longer than `max`
/// characters.
pub(crate) fn normalize_message(message: Option<String>, max: usize) -> Result<Option<String>, usize> {
    let Some(raw) = message else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(max);
    }
    Ok(Some(trimmed.to_owned()))
}
