use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::{AttributeValue, Attributes, PowerSensor, PublishedState, slugify};
use crate::calc::units::to_watts;
use crate::host::StateSource;

/// Whether a mirrored source consumes or produces power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorRole {
    /// Subtracted from the main reading.
    Consumer,
    /// Permits a negative remainder.
    Producer,
}

impl SensorRole {
    /// Lowercase label used in attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Producer => "producer",
        }
    }
}

impl fmt::Display for SensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit-normalized copy of one source sensor under the entry's prefix.
///
/// The display name tracks the source's friendly name and is kept when the
/// source disappears; the value then becomes `None` while the last unit is
/// retained.
#[derive(Debug, Clone)]
pub struct MirrorSensor {
    unique_id: String,
    source_entity_id: String,
    prefix: String,
    role: SensorRole,
    name: String,
    value: Option<f64>,
    unit: Option<String>,
}

impl MirrorSensor {
    /// Creates a mirror of `source_entity_id`.
    ///
    /// The name starts as `"{prefix} {source_entity_id}"` until the source
    /// reports a friendly name.
    pub fn new(entry_id: &str, prefix: &str, source_entity_id: &str, role: SensorRole) -> Self {
        Self {
            unique_id: format!("{entry_id}_mirror_{}", slugify(source_entity_id)),
            source_entity_id: source_entity_id.to_string(),
            prefix: prefix.to_string(),
            role,
            name: format!("{prefix} {source_entity_id}"),
            value: None,
            unit: None,
        }
    }

    /// Mirrored sensor id.
    pub fn source_entity_id(&self) -> &str {
        &self.source_entity_id
    }

    pub fn role(&self) -> SensorRole {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

impl PowerSensor for MirrorSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn tracked_entities(&self) -> Vec<String> {
        vec![self.source_entity_id.clone()]
    }

    fn refresh(&mut self, states: &dyn StateSource) {
        let Some(state) = states.get_state(&self.source_entity_id) else {
            self.value = None;
            debug!(sensor = %self.unique_id, "source missing, value cleared");
            return;
        };

        let reading = to_watts(&state.state, state.unit_of_measurement.as_deref());
        self.value = reading.value;
        self.unit = reading.unit;
        if let Some(friendly) = state.friendly_name.as_deref().filter(|n| !n.is_empty()) {
            self.name = format!("{} {friendly}", self.prefix);
        }
        debug!(sensor = %self.unique_id, value = ?self.value, "mirror refreshed");
    }

    fn published(&self) -> PublishedState {
        let mut attributes = Attributes::new();
        attributes.insert(
            "source_entity_id".into(),
            AttributeValue::from(self.source_entity_id.as_str()),
        );
        attributes.insert("sensor_role".into(), AttributeValue::from(self.role.as_str()));
        PublishedState::new(
            self.unique_id.clone(),
            self.name.clone(),
            self.value,
            self.unit.clone(),
            attributes,
        )
    }
}
