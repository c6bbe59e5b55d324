//! Power unit normalization.
//!
//! Sources report power in W or kW with inconsistent spelling. Every value
//! the crate republishes is expressed in watts; labels it does not recognise
//! are passed through untouched.

use std::fmt;

use super::coerce::{NumberLike, coerce};

/// Watts per kilowatt.
const WATTS_PER_KILOWATT: f64 = 1000.0;

/// A recognised power unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUnit {
    /// Watts.
    Watt,
    /// Kilowatts.
    Kilowatt,
}

impl PowerUnit {
    /// Canonical label (`"W"` or `"kW"`).
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Watt => "W",
            Self::Kilowatt => "kW",
        }
    }

    /// Factor that converts a value in this unit to watts.
    pub fn watts_factor(self) -> f64 {
        match self {
            Self::Watt => 1.0,
            Self::Kilowatt => WATTS_PER_KILOWATT,
        }
    }
}

impl fmt::Display for PowerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Maps a unit label to a [`PowerUnit`].
///
/// Matching ignores case and surrounding whitespace. `kw`, `kilowatt` and
/// `kilowatts` map to kW; `w`, `watt` and `watts` map to W. Anything else,
/// including a missing label, yields `None`.
pub fn normalize_unit(label: Option<&str>) -> Option<PowerUnit> {
    let text = label?.trim().to_lowercase();
    match text.as_str() {
        "kw" | "kilowatt" | "kilowatts" => Some(PowerUnit::Kilowatt),
        "w" | "watt" | "watts" => Some(PowerUnit::Watt),
        _ => None,
    }
}

/// A reading converted to watts together with the unit label to display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WattReading {
    /// Value in watts, or the raw value when the unit was not recognised.
    pub value: Option<f64>,
    /// `"W"` for recognised units, otherwise the raw label verbatim.
    pub unit: Option<String>,
}

/// Label shown next to a value whose source reported `label`.
fn display_unit(normalized: Option<PowerUnit>, label: Option<&str>) -> Option<String> {
    match normalized {
        Some(_) => Some(PowerUnit::Watt.symbol().to_string()),
        None => label.map(str::to_string),
    }
}

/// Converts a raw reading to watts.
///
/// The displayed unit is derived from the label even when the value cannot
/// be read, so a momentarily unavailable kW sensor still shows `W`.
///
/// # Examples
///
/// ```
/// use powermix::calc::coerce::NumberLike;
/// use powermix::calc::units::to_watts;
///
/// let reading = to_watts(&NumberLike::from(2.5), Some("kW"));
/// assert_eq!(reading.value, Some(2500.0));
/// assert_eq!(reading.unit.as_deref(), Some("W"));
///
/// let passthrough = to_watts(&NumberLike::from(3.0), Some("kWh"));
/// assert_eq!(passthrough.value, Some(3.0));
/// assert_eq!(passthrough.unit.as_deref(), Some("kWh"));
/// ```
pub fn to_watts(raw_value: &NumberLike, unit_label: Option<&str>) -> WattReading {
    let normalized = normalize_unit(unit_label);
    let value = coerce(raw_value).map(|v| match normalized {
        Some(unit) => v * unit.watts_factor(),
        None => v,
    });
    WattReading {
        value,
        unit: display_unit(normalized, unit_label),
    }
}
