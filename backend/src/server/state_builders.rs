//! Builders wiring repositories into the domain services.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use curation::domain::{
    CatalogCanonicalizer, EventCollector, FeedCurator, FeedLimits, ShareLedger, SocialGraph,
};
use curation::inbound::http::state::HttpState;
use curation::outbound::Repositories;

/// Build the HTTP state over `repos` using the wall clock.
pub fn build_http_state(
    repos: &Repositories,
    canonicalizer: CatalogCanonicalizer,
    limits: FeedLimits,
) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    HttpState {
        collector: EventCollector::new(
            repos.profiles.clone(),
            repos.feed_items.clone(),
            canonicalizer,
            clock.clone(),
        ),
        curator: Arc::new(FeedCurator::new(
            repos.feed_items.clone(),
            repos.follows.clone(),
            limits,
        )),
        social: SocialGraph::new(repos.profiles.clone(), repos.follows.clone(), clock.clone()),
        ledger: ShareLedger::new(
            repos.shared_items.clone(),
            repos.votes.clone(),
            repos.follows.clone(),
            repos.feed_items.clone(),
            limits,
            clock,
        ),
    }
}
