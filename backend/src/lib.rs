//! Curation engine library: social product discovery.
//!
//! The crate follows a hexagonal layout. [`domain`] owns the model and the
//! four services, [`outbound`] holds the store adapters, and [`inbound`]
//! exposes the services over HTTP.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
