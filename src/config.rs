//! TOML-based entry configuration, presets, and derivation settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix used when an entry's prefix is blank after trimming.
pub const DEFAULT_SENSOR_PREFIX: &str = "Powermix";

/// Top-level configuration parsed from TOML.
///
/// Load from TOML with [`PowermixConfig::from_toml_file`] or use
/// [`PowermixConfig::demo`] for the built-in preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowermixConfig {
    /// One derived sensor set per entry.
    #[serde(default)]
    pub entries: Vec<EntryConfig>,
    /// Synthetic event stream parameters.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// One configured breakdown: a main sensor and its known sub-readings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    /// Identifier used to build unique ids of the entry's sensors.
    pub entry_id: String,
    /// Whole-circuit power sensor.
    pub main_sensor: String,
    /// Consumers subtracted from the main reading.
    #[serde(default)]
    pub included_sensors: Vec<String>,
    /// Producers; any present allows a negative remainder.
    #[serde(default)]
    pub producer_sensors: Vec<String>,
    /// Prefix of every published name.
    #[serde(default = "default_prefix")]
    pub sensor_prefix: String,
    /// Overrides applied on top of the fields above.
    #[serde(default)]
    pub options: Option<EntryOptions>,
}

/// Later edits to an entry. Set fields replace the entry's own values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryOptions {
    pub included_sensors: Option<Vec<String>>,
    pub producer_sensors: Option<Vec<String>>,
    pub sensor_prefix: Option<String>,
}

/// Synthetic event stream parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Random seed.
    pub seed: u64,
    /// Number of update rounds to generate (must be > 0).
    pub steps: usize,
    /// Relative Gaussian noise applied to every reading.
    pub noise_std: f64,
    /// Probability that a sub-reading reports `unavailable` in a round.
    pub unavailable_probability: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 24,
            noise_std: 0.05,
            unavailable_probability: 0.05,
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_SENSOR_PREFIX.to_string()
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"entries[0].main_sensor"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Immutable settings of one derived sensor set.
///
/// Built through [`DerivationConfig::new`], which removes the main sensor
/// from both lists, drops repeated ids (first occurrence wins), and falls
/// back to [`DEFAULT_SENSOR_PREFIX`] for a blank prefix. A changed entry gets
/// a new `DerivationConfig`; existing ones are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationConfig {
    main_sensor: String,
    consumers: Vec<String>,
    producers: Vec<String>,
    prefix: String,
}

impl DerivationConfig {
    /// Normalizes and freezes a derivation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use powermix::config::DerivationConfig;
    ///
    /// let cfg = DerivationConfig::new(
    ///     "sensor.main",
    ///     &["sensor.ev", "sensor.main", "sensor.ev"],
    ///     &["sensor.pv"],
    ///     "  ",
    /// );
    /// assert_eq!(cfg.consumers(), ["sensor.ev"]);
    /// assert_eq!(cfg.prefix(), "Powermix");
    /// assert!(cfg.allow_negative());
    /// ```
    pub fn new<C, P>(main_sensor: &str, consumers: C, producers: P, prefix: &str) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let main_sensor = main_sensor.trim().to_string();
        Self {
            consumers: filter_sources(&main_sensor, consumers),
            producers: filter_sources(&main_sensor, producers),
            prefix: normalize_prefix(prefix),
            main_sensor,
        }
    }

    pub fn main_sensor(&self) -> &str {
        &self.main_sensor
    }

    pub fn consumers(&self) -> &[String] {
        &self.consumers
    }

    pub fn producers(&self) -> &[String] {
        &self.producers
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `true` iff at least one producer is configured.
    pub fn allow_negative(&self) -> bool {
        !self.producers.is_empty()
    }
}

/// Drops blanks, the main sensor, and repeats while keeping first-seen order.
fn filter_sources<I>(main_sensor: &str, ids: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut kept: Vec<String> = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        if id.is_empty() || id == main_sensor || kept.iter().any(|k| k == id) {
            continue;
        }
        kept.push(id.to_string());
    }
    kept
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        DEFAULT_SENSOR_PREFIX.to_string()
    } else {
        trimmed.to_string()
    }
}

impl EntryConfig {
    /// Creates an entry with no sub-readings and the default prefix.
    pub fn new(entry_id: impl Into<String>, main_sensor: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            main_sensor: main_sensor.into(),
            included_sensors: Vec::new(),
            producer_sensors: Vec::new(),
            sensor_prefix: default_prefix(),
            options: None,
        }
    }

    /// Returns a copy with `options` replacing the current overrides.
    pub fn with_options(mut self, options: EntryOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Merges options over the entry's own fields and normalizes the result.
    pub fn derivation(&self) -> DerivationConfig {
        let options = self.options.clone().unwrap_or_default();
        let consumers = options
            .included_sensors
            .unwrap_or_else(|| self.included_sensors.clone());
        let producers = options
            .producer_sensors
            .unwrap_or_else(|| self.producer_sensors.clone());
        let prefix = options
            .sensor_prefix
            .unwrap_or_else(|| self.sensor_prefix.clone());
        DerivationConfig::new(&self.main_sensor, consumers, producers, &prefix)
    }
}

impl PowermixConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "consumers_only"];

    /// One household: kW grid meter, two W consumers, and a PV producer.
    pub fn demo() -> Self {
        Self {
            entries: vec![EntryConfig {
                entry_id: "home".to_string(),
                main_sensor: "sensor.grid_power".to_string(),
                included_sensors: vec![
                    "sensor.heat_pump".to_string(),
                    "sensor.ev_charger".to_string(),
                ],
                producer_sensors: vec!["sensor.solar".to_string()],
                sensor_prefix: DEFAULT_SENSOR_PREFIX.to_string(),
                options: None,
            }],
            demo: DemoConfig::default(),
        }
    }

    /// Same household without production, so the remainder is clamped.
    pub fn consumers_only() -> Self {
        let mut cfg = Self::demo();
        for entry in &mut cfg.entries {
            entry.producer_sensors.clear();
        }
        cfg.demo.seed = 7;
        cfg
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "consumers_only" => Ok(Self::consumers_only()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.entries.is_empty() {
            errors.push(ConfigError::new("entries", "at least one entry is required"));
        }

        let mut seen_ids: Vec<&str> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let entry_id = entry.entry_id.trim();
            if entry_id.is_empty() {
                errors.push(ConfigError::new(
                    format!("entries[{i}].entry_id"),
                    "must not be blank",
                ));
            } else if seen_ids.contains(&entry_id) {
                errors.push(ConfigError::new(
                    format!("entries[{i}].entry_id"),
                    format!("duplicate entry id \"{entry_id}\""),
                ));
            } else {
                seen_ids.push(entry_id);
            }

            if entry.main_sensor.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("entries[{i}].main_sensor"),
                    "must not be blank",
                ));
            }
        }

        let d = &self.demo;
        if d.steps == 0 {
            errors.push(ConfigError::new("demo.steps", "must be > 0"));
        }
        if d.noise_std < 0.0 {
            errors.push(ConfigError::new("demo.noise_std", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&d.unavailable_probability) {
            errors.push(ConfigError::new(
                "demo.unavailable_probability",
                "must be in [0.0, 1.0]",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_preset_valid() {
        let cfg = PowermixConfig::demo();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "demo should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in PowermixConfig::PRESETS {
            let cfg = PowermixConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = PowermixConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn consumers_only_has_no_producers() {
        let cfg = PowermixConfig::consumers_only();
        assert!(cfg.entries.iter().all(|e| e.producer_sensors.is_empty()));
        assert!(!cfg.entries[0].derivation().allow_negative());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[[entries]]
entry_id = "house"
main_sensor = "sensor.total_power"
included_sensors = ["sensor.ev", "sensor.heat_pump"]
producer_sensors = ["sensor.pv"]
sensor_prefix = "House"

[entries.options]
included_sensors = ["sensor.ev"]

[demo]
seed = 99
steps = 48
"#;
        let cfg = PowermixConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.entries.len()), Some(1));
        assert_eq!(cfg.as_ref().map(|c| c.demo.steps), Some(48));
        // unset demo fields keep defaults
        assert_eq!(cfg.as_ref().map(|c| c.demo.noise_std), Some(0.05));

        let derivation = cfg.as_ref().map(|c| c.entries[0].derivation());
        assert_eq!(
            derivation.as_ref().map(|d| d.consumers().to_vec()),
            Some(vec!["sensor.ev".to_string()])
        );
        assert_eq!(derivation.as_ref().map(|d| d.prefix()), Some("House"));
    }

    #[test]
    fn minimal_entry_uses_defaults() {
        let toml = r#"
[[entries]]
entry_id = "a"
main_sensor = "sensor.main"
"#;
        let cfg = PowermixConfig::from_toml_str(toml).ok();
        let entry = cfg.as_ref().map(|c| &c.entries[0]);
        assert_eq!(entry.map(|e| e.sensor_prefix.as_str()), Some(DEFAULT_SENSOR_PREFIX));
        assert_eq!(entry.map(|e| e.included_sensors.len()), Some(0));
        assert_eq!(cfg.as_ref().map(|c| c.demo.seed), Some(42));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[[entries]]
entry_id = "a"
main_sensor = "sensor.main"
bogus_field = true
"#;
        assert!(PowermixConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_blank_main_sensor() {
        let mut cfg = PowermixConfig::demo();
        cfg.entries[0].main_sensor = "   ".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "entries[0].main_sensor"));
    }

    #[test]
    fn validation_catches_duplicate_entry_ids() {
        let mut cfg = PowermixConfig::demo();
        let copy = cfg.entries[0].clone();
        cfg.entries.push(copy);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "entries[1].entry_id"));
    }

    #[test]
    fn validation_catches_empty_entries_and_bad_demo() {
        let mut cfg = PowermixConfig::demo();
        cfg.entries.clear();
        cfg.demo.steps = 0;
        cfg.demo.unavailable_probability = 1.5;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"entries".to_string()));
        assert!(fields.contains(&"demo.steps".to_string()));
        assert!(fields.contains(&"demo.unavailable_probability".to_string()));
    }

    #[test]
    fn config_error_display_names_field() {
        let e = ConfigError::new("entries[0].main_sensor", "must not be blank");
        assert_eq!(
            e.to_string(),
            "config error: entries[0].main_sensor: must not be blank"
        );
    }

    #[test]
    fn derivation_filters_main_and_duplicates() {
        let cfg = DerivationConfig::new(
            "sensor.total_power",
            &["sensor.ev", "sensor.total_power", "sensor.ev"],
            &["sensor.pv", "sensor.total_power"],
            "   ",
        );
        assert_eq!(cfg.consumers(), ["sensor.ev"]);
        assert_eq!(cfg.producers(), ["sensor.pv"]);
        assert_eq!(cfg.prefix(), DEFAULT_SENSOR_PREFIX);
        assert!(cfg.allow_negative());
    }

    #[test]
    fn derivation_trims_prefix() {
        let cfg = DerivationConfig::new("sensor.m", &[] as &[&str], &[] as &[&str], " Custom Prefix ");
        assert_eq!(cfg.prefix(), "Custom Prefix");
        assert!(!cfg.allow_negative());
    }

    #[test]
    fn options_override_entry_fields() {
        let entry = EntryConfig {
            included_sensors: vec!["sensor.ev".to_string()],
            producer_sensors: vec!["sensor.pv".to_string()],
            ..EntryConfig::new("e", "sensor.total_power")
        }
        .with_options(EntryOptions {
            included_sensors: Some(vec![
                "sensor.ev".to_string(),
                "sensor.heat_pump".to_string(),
                "sensor.total_power".to_string(),
            ]),
            producer_sensors: Some(vec![
                "sensor.pv".to_string(),
                "sensor.battery".to_string(),
                "sensor.total_power".to_string(),
            ]),
            sensor_prefix: Some(" Custom Prefix ".to_string()),
        });

        let d = entry.derivation();
        assert_eq!(d.consumers(), ["sensor.ev", "sensor.heat_pump"]);
        assert_eq!(d.producers(), ["sensor.pv", "sensor.battery"]);
        assert_eq!(d.prefix(), "Custom Prefix");
    }
}
