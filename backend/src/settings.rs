//! Service configuration loaded via OrthoConfig.
//!
//! Values layer from defaults, a config file, `CURATION_*` environment
//! variables, and command-line flags.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CatalogCanonicalizer, FeedLimits, PlaceholderBaseError};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PLACEHOLDER_BASE: &str = "https://images.curation.invalid/placeholder/";

/// Configuration for the curation service and its tools.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CURATION")]
pub struct CurationSettings {
    /// PostgreSQL URL. When absent the service runs on the in-memory store.
    pub database_url: Option<String>,
    /// Socket address for the HTTP listener.
    pub bind_addr: Option<SocketAddr>,
    /// Maximum pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Seconds a query waits for a pooled connection.
    #[ortho_config(default = 30)]
    pub pool_timeout_secs: u64,
    /// Feed page size when the caller gives none.
    #[ortho_config(default = 20)]
    pub default_feed_limit: usize,
    /// Largest feed page a caller may request.
    #[ortho_config(default = 100)]
    pub max_feed_limit: usize,
    /// How many recent items the sampler draws from.
    #[ortho_config(default = 10)]
    pub sample_window: usize,
    /// Base URL for images of products whose catalog record has none.
    pub placeholder_image_base: Option<String>,
}

impl CurationSettings {
    /// Listener address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)))
    }

    /// Feed limits with the maximum never below the default.
    pub fn feed_limits(&self) -> FeedLimits {
        let default_limit = self.default_feed_limit.max(1);
        FeedLimits {
            default_limit,
            max_limit: self.max_feed_limit.max(default_limit),
            sample_window: self.sample_window.max(1),
        }
    }

    /// Pool configuration when a database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_deref().map(|url| self.pool_config_for(url))
    }

    /// Pool configuration for `database_url` with the configured limits.
    pub fn pool_config_for(&self, database_url: &str) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.pool_max_size)
            .with_connection_timeout(Duration::from_secs(self.pool_timeout_secs.max(1)))
    }

    /// Placeholder image base URL.
    pub fn placeholder_image_base(&self) -> &str {
        self.placeholder_image_base
            .as_deref()
            .unwrap_or(DEFAULT_PLACEHOLDER_BASE)
    }

    /// Catalog canonicalizer built from the placeholder base.
    pub fn canonicalizer(&self) -> Result<CatalogCanonicalizer, PlaceholderBaseError> {
        CatalogCanonicalizer::new(self.placeholder_image_base())
    }
}

#[cfg(test)]
mod tests {
    //! Environment-driven loading.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "CURATION_DATABASE_URL",
        "CURATION_BIND_ADDR",
        "CURATION_POOL_MAX_SIZE",
        "CURATION_POOL_TIMEOUT_SECS",
        "CURATION_DEFAULT_FEED_LIMIT",
        "CURATION_MAX_FEED_LIMIT",
        "CURATION_SAMPLE_WINDOW",
        "CURATION_PLACEHOLDER_IMAGE_BASE",
    ];

    fn load_from_empty_args() -> CurationSettings {
        CurationSettings::load_from_iter([OsString::from("curation")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert!(settings.database_url.is_none());
        assert!(settings.pool_config().is_none());
        assert_eq!(settings.bind_addr().to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.feed_limits(), FeedLimits::default());
        assert_eq!(settings.placeholder_image_base(), DEFAULT_PLACEHOLDER_BASE);
        assert!(settings.canonicalizer().is_ok());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CURATION_DATABASE_URL", Some("postgres://db/curation".to_owned())),
            ("CURATION_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("CURATION_POOL_MAX_SIZE", Some("4".to_owned())),
            ("CURATION_POOL_TIMEOUT_SECS", Some("5".to_owned())),
            ("CURATION_DEFAULT_FEED_LIMIT", Some("5".to_owned())),
            ("CURATION_MAX_FEED_LIMIT", Some("3".to_owned())),
            ("CURATION_SAMPLE_WINDOW", Some("0".to_owned())),
            (
                "CURATION_PLACEHOLDER_IMAGE_BASE",
                Some("https://cdn.test/ph/".to_owned()),
            ),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr().to_string(), "127.0.0.1:9000");
        let pool = settings.pool_config().expect("pool config");
        assert_eq!(pool.database_url(), "postgres://db/curation");
        assert_eq!(pool.max_size(), 4);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.feed_limits(),
            FeedLimits {
                default_limit: 5,
                max_limit: 5,
                sample_window: 1,
            }
        );
        assert_eq!(settings.placeholder_image_base(), "https://cdn.test/ph/");
    }
}
