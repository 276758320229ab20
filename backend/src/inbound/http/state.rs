//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only talk to the domain
//! services, which keeps them testable against the in-memory store.

use std::sync::Arc;

use crate::domain::{EventCollector, FeedCurator, ShareLedger, SocialGraph};

/// Services available to HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub collector: EventCollector,
    pub curator: Arc<FeedCurator>,
    pub social: SocialGraph,
    pub ledger: ShareLedger,
}
