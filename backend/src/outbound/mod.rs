//! Outbound adapters implementing the domain's storage ports.
//!
//! - **memory**: process-local store used when no database is configured and
//!   throughout the tests.
//! - **persistence**: PostgreSQL repositories using Diesel ORM.
//! - **repositories**: picks one of the two at startup.
//!
//! Adapters translate between domain types and storage rows. They contain no
//! business logic.

pub mod memory;
pub mod persistence;
pub mod repositories;

pub use repositories::{Repositories, RepositoryInitError};
