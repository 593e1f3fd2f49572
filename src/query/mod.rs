//! Single-flight query orchestration for Gropius.
//!
//! This module mediates between callers submitting natural-language requests
//! and a long-lived external agent that answers with an asynchronous stream
//! of events. At most one stream is active at a time; one further request
//! may wait in a single-slot queue. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
