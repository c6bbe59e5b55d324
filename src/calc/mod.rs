//! Numeric core: coercion, remainder aggregation, and unit normalization.

pub mod aggregate;
pub mod coerce;
/// W/kW normalization and conversion to watts.
pub mod units;

pub use aggregate::aggregate;
pub use coerce::{NumberLike, coerce};
pub use units::{PowerUnit, WattReading, normalize_unit, to_watts};
