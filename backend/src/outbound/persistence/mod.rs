//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port over a shared `bb8` pool from
//! `diesel-async`. Row structs (`models.rs`) and table definitions
//! (`schema.rs`) stay private to this module; only the repositories, the
//! pool, and the migration runner are exported.
//!
//! # Example
//!
//! ```ignore
//! use curation::outbound::persistence::{DbPool, DieselVoteRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/curation")).await?;
//! let votes = DieselVoteRepository::new(pool);
//! ```

mod diesel_feed_item_repository;
mod diesel_follow_repository;
mod diesel_profile_repository;
mod diesel_shared_item_repository;
mod diesel_vote_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_feed_item_repository::DieselFeedItemRepository;
pub use diesel_follow_repository::DieselFollowRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_shared_item_repository::DieselSharedItemRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
