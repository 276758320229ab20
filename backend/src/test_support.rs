//! Test utilities shared by unit tests and integration tests.
//!
//! Compiled for `cfg(test)` and for the `test-support` feature, which the
//! crate enables for its own integration tests.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    CatalogCanonicalizer, EventCollector, FeedCurator, FeedLimits, ShareLedger, SocialGraph,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::MemoryStore;

/// Base URL used for placeholder images in tests.
pub const PLACEHOLDER_BASE: &str = "https://img.test/placeholder/";

/// Fixed instant every test clock starts from.
pub fn fixture_time() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).single() {
        Some(instant) => instant,
        None => panic!("fixture timestamp must be valid"),
    }
}

/// Clock whose time only moves when a test advances it.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_time())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Canonicalizer pointing at [`PLACEHOLDER_BASE`].
pub fn canonicalizer() -> CatalogCanonicalizer {
    match CatalogCanonicalizer::new(PLACEHOLDER_BASE) {
        Ok(canonicalizer) => canonicalizer,
        Err(err) => panic!("placeholder base must parse: {err}"),
    }
}

/// All four services wired to one in-memory store and one clock.
pub struct MemoryHarness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MutableClock>,
    pub collector: EventCollector,
    pub curator: Arc<FeedCurator>,
    pub social: SocialGraph,
    pub ledger: ShareLedger,
}

impl MemoryHarness {
    /// Build the harness with default feed limits and a seeded sampler.
    pub fn new() -> Self {
        Self::with_limits(FeedLimits::default())
    }

    /// Build the harness with explicit feed limits.
    pub fn with_limits(limits: FeedLimits) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MutableClock::default());
        let collector = EventCollector::new(
            store.clone(),
            store.clone(),
            canonicalizer(),
            clock.clone(),
        );
        let curator = Arc::new(FeedCurator::with_seed(store.clone(), store.clone(), limits, 7));
        let social = SocialGraph::new(store.clone(), store.clone(), clock.clone());
        let ledger = ShareLedger::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            limits,
            clock.clone(),
        );
        Self {
            store,
            clock,
            collector,
            curator,
            social,
            ledger,
        }
    }

    /// HTTP state sharing this harness's services.
    pub fn http_state(&self) -> HttpState {
        HttpState {
            collector: self.collector.clone(),
            curator: self.curator.clone(),
            social: self.social.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl Default for MemoryHarness {
    fn default() -> Self {
        Self::new()
    }
}
