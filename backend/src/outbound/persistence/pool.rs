//! bb8 pool of `diesel-async` PostgreSQL connections shared by the
//! repositories.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

const DEFAULT_MAX_SIZE: u32 = 10;
const MAX_IDLE_CONNECTIONS: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// The store could not hand out a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no pooled connection available: {message}")]
    Checkout { message: String },
    #[error("could not open the connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Where the store lives and how many connections the service may hold.
///
/// ```
/// use std::time::Duration;
/// use curation::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://curation@localhost/curation")
///     .with_max_size(1)
///     .with_connection_timeout(Duration::from_secs(5));
/// assert_eq!(config.min_idle(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            connection_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap on open connections; zero is raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// How long a repository call waits for a free connection before the
    /// store counts as unavailable.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Cap on open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Idle connections kept warm, never more than the cap.
    pub fn min_idle(&self) -> u32 {
        self.max_size.min(MAX_IDLE_CONNECTIONS)
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// Cloneable handle to the pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool described by `config`.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the warm connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url());
        let inner = Pool::builder()
            .max_size(config.max_size())
            .min_idle(Some(config.min_idle()))
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// # Errors
    ///
    /// [`PoolError::Checkout`] once the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_hold_ten_connections_with_two_idle() {
        let config = PoolConfig::new("postgres://localhost/curation");

        assert_eq!(config.database_url(), "postgres://localhost/curation");
        assert_eq!(config.max_size(), 10);
        assert_eq!(config.min_idle(), 2);
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case(0, 1, 1)]
    #[case(1, 1, 1)]
    #[case(2, 2, 2)]
    #[case(8, 8, 2)]
    fn idle_connections_never_exceed_the_cap(
        #[case] requested: u32,
        #[case] max_size: u32,
        #[case] min_idle: u32,
    ) {
        let config = PoolConfig::new("postgres://localhost/curation").with_max_size(requested);

        assert_eq!(config.max_size(), max_size);
        assert_eq!(config.min_idle(), min_idle);
    }

    #[rstest]
    fn checkout_timeout_is_configurable() {
        let config = PoolConfig::new("postgres://localhost/curation")
            .with_connection_timeout(Duration::from_secs(3));

        assert_eq!(config.connection_timeout(), Duration::from_secs(3));
    }
}
