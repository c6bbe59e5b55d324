//! Derived "other usage" power sensors for a home-automation host.
//!
//! Given a main power meter and the sub-meters hanging off it, an entry
//! publishes the unexplained remainder (`main - sum(consumers)`) plus a
//! watt-normalized mirror of every sub-meter, and keeps them current as the
//! host reports state changes.

/// REST view of the final publications.
#[cfg(feature = "api")]
pub mod api;
/// Coercion, aggregation, and unit normalization.
pub mod calc;
pub mod cli;
pub mod config;
pub mod demo;
pub mod entry;
/// Host boundary traits and the in-memory host.
pub mod host;
pub mod io;
pub mod logging;
pub mod sensor;
