//! Storage selection shared by the binaries.
//!
//! With a database URL the Diesel repositories are used after pending
//! migrations are applied; without one every port is served by a single
//! [`MemoryStore`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{
    FeedItemRepository, FollowRepository, ProfileRepository, SharedItemRepository, VoteRepository,
};
use crate::outbound::memory::MemoryStore;
use crate::outbound::persistence::{
    DbPool, DieselFeedItemRepository, DieselFollowRepository, DieselProfileRepository,
    DieselSharedItemRepository, DieselVoteRepository, MigrationError, PoolConfig, PoolError,
    run_pending_migrations,
};

/// Failures while preparing storage.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryInitError {
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// One implementation per storage port.
#[derive(Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileRepository>,
    pub feed_items: Arc<dyn FeedItemRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub shared_items: Arc<dyn SharedItemRepository>,
    pub votes: Arc<dyn VoteRepository>,
}

impl Repositories {
    /// Every port backed by one process-local store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            profiles: store.clone(),
            feed_items: store.clone(),
            follows: store.clone(),
            shared_items: store.clone(),
            votes: store,
        }
    }

    /// Diesel repositories sharing `pool`.
    pub fn diesel(pool: DbPool) -> Self {
        Self {
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            feed_items: Arc::new(DieselFeedItemRepository::new(pool.clone())),
            follows: Arc::new(DieselFollowRepository::new(pool.clone())),
            shared_items: Arc::new(DieselSharedItemRepository::new(pool.clone())),
            votes: Arc::new(DieselVoteRepository::new(pool)),
        }
    }

    /// Migrate and connect when `pool_config` is present, otherwise fall back
    /// to the in-memory store.
    pub async fn connect(pool_config: Option<PoolConfig>) -> Result<Self, RepositoryInitError> {
        let Some(config) = pool_config else {
            warn!("no database configured; state lives in memory and is lost on exit");
            return Ok(Self::in_memory());
        };
        run_pending_migrations(config.database_url()).await?;
        let pool = DbPool::new(config).await?;
        info!("connected to PostgreSQL");
        Ok(Self::diesel(pool))
    }
}
