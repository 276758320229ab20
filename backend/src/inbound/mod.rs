//! Inbound adapters translating external requests into domain service calls.
//!
//! Framework details stay at this edge; [`http`] is the only transport.

pub mod http;
