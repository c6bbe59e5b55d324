//! Republished sensors: the derived remainder and the per-source mirrors.

/// Mirror of a single source sensor.
pub mod mirror;
/// Derived "Other Usage" remainder sensor.
pub mod other;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::calc::units::{WattReading, to_watts};
use crate::host::StateSource;

pub use mirror::{MirrorSensor, SensorRole};
pub use other::OtherSensor;

/// Device class attached to every publication.
pub const DEVICE_CLASS_POWER: &str = "power";
/// State class attached to every publication.
pub const STATE_CLASS_MEASUREMENT: &str = "measurement";

/// Value of an extra state attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Single text value.
    Text(String),
    /// Ordered list of values.
    List(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&[String]> for AttributeValue {
    fn from(value: &[String]) -> Self {
        Self::List(value.to_vec())
    }
}

/// Extra attributes published next to a value, ordered by key.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Everything a sensor writes to the output sink on each update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedState {
    /// Stable identifier of the republished sensor.
    pub unique_id: String,
    /// Display name.
    pub name: String,
    /// Current value (watts for recognised units).
    pub value: Option<f64>,
    /// Displayed unit label.
    pub unit: Option<String>,
    /// Always [`DEVICE_CLASS_POWER`].
    pub device_class: &'static str,
    /// Always [`STATE_CLASS_MEASUREMENT`].
    pub state_class: &'static str,
    /// Extra state attributes.
    pub attributes: Attributes,
}

impl PublishedState {
    /// Creates a power measurement publication.
    pub fn new(
        unique_id: impl Into<String>,
        name: impl Into<String>,
        value: Option<f64>,
        unit: Option<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            name: name.into(),
            value,
            unit,
            device_class: DEVICE_CLASS_POWER,
            state_class: STATE_CLASS_MEASUREMENT,
            attributes,
        }
    }
}

impl fmt::Display for PublishedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self
            .value
            .map_or_else(|| "unavailable".to_string(), |v| format!("{v:.3}"));
        write!(
            f,
            "{:<32} | {:<36} {:>12} {}",
            self.unique_id,
            self.name,
            value,
            self.unit.as_deref().unwrap_or("")
        )
    }
}

/// A republished sensor driven by host state changes.
///
/// The owner refreshes the sensor, publishes [`PowerSensor::published`], and
/// subscribes to [`PowerSensor::tracked_entities`]; every notification then
/// repeats refresh + publish.
pub trait PowerSensor {
    /// Stable identifier of this sensor.
    fn unique_id(&self) -> &str;

    /// Source sensors whose changes trigger a refresh.
    fn tracked_entities(&self) -> Vec<String>;

    /// Recomputes the sensor from the current host states.
    fn refresh(&mut self, states: &dyn StateSource);

    /// State to publish after the latest refresh.
    fn published(&self) -> PublishedState;
}

/// Reads `entity_id` and converts it to watts; `None` if the sensor is missing.
pub fn read_watts(states: &dyn StateSource, entity_id: &str) -> Option<WattReading> {
    states
        .get_state(entity_id)
        .map(|state| to_watts(&state.state, state.unit_of_measurement.as_deref()))
}

/// Lowercases `value` and replaces `.` and spaces with `_`.
pub fn slugify(value: &str) -> String {
    value.to_lowercase().replace(['.', ' '], "_")
}
