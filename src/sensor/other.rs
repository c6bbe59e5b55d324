use tracing::debug;

use super::{AttributeValue, Attributes, PowerSensor, PublishedState, read_watts};
use crate::calc::aggregate::aggregate;
use crate::calc::coerce::NumberLike;
use crate::config::DerivationConfig;
use crate::host::StateSource;

/// Derived sensor exposing `main - sum(consumers)` in watts.
///
/// Producers do not enter the arithmetic: their presence only permits the
/// remainder to go negative (see [`DerivationConfig::allow_negative`]). The
/// published unit follows the main sensor.
#[derive(Debug, Clone)]
pub struct OtherSensor {
    unique_id: String,
    name: String,
    config: DerivationConfig,
    value: Option<f64>,
    unit: Option<String>,
}

impl OtherSensor {
    /// Creates the remainder sensor for one configuration entry.
    pub fn new(entry_id: &str, config: DerivationConfig) -> Self {
        Self {
            unique_id: format!("{entry_id}_other"),
            name: format!("{} Other Usage", config.prefix()),
            config,
            value: None,
            unit: None,
        }
    }

    /// Latest remainder value.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Latest displayed unit.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration the sensor was built from.
    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            "main_sensor".into(),
            AttributeValue::from(self.config.main_sensor()),
        );
        attributes.insert(
            "included_sensors".into(),
            AttributeValue::from(self.config.consumers()),
        );
        attributes.insert(
            "producer_sensors".into(),
            AttributeValue::from(self.config.producers()),
        );
        attributes
    }
}

impl PowerSensor for OtherSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Main, then consumers, then producers, without repeats.
    fn tracked_entities(&self) -> Vec<String> {
        let mut tracked: Vec<String> = Vec::new();
        let all = std::iter::once(self.config.main_sensor())
            .chain(self.config.consumers().iter().map(String::as_str))
            .chain(self.config.producers().iter().map(String::as_str));
        for id in all {
            if !tracked.iter().any(|t| t == id) {
                tracked.push(id.to_string());
            }
        }
        tracked
    }

    fn refresh(&mut self, states: &dyn StateSource) {
        let main = read_watts(states, self.config.main_sensor()).unwrap_or_default();
        let parts: Vec<NumberLike> = self
            .config
            .consumers()
            .iter()
            .map(|id| NumberLike::from(read_watts(states, id).and_then(|r| r.value)))
            .collect();

        self.value = aggregate(
            &NumberLike::from(main.value),
            &parts,
            self.config.allow_negative(),
        );
        self.unit = main.unit;
        debug!(
            sensor = %self.unique_id,
            value = ?self.value,
            allow_negative = self.config.allow_negative(),
            "remainder recomputed"
        );
    }

    fn published(&self) -> PublishedState {
        PublishedState::new(
            self.unique_id.clone(),
            self.name.clone(),
            self.value,
            self.unit.clone(),
            self.attributes(),
        )
    }
}
