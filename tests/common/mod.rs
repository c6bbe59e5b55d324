//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use powermix::config::EntryConfig;
use powermix::host::{MemoryHost, SourceState};

/// Household entry: kW main meter, two consumers, and a PV producer.
pub fn household_entry() -> EntryConfig {
    EntryConfig {
        included_sensors: vec!["sensor.heat_pump".to_string(), "sensor.ev".to_string()],
        producer_sensors: vec!["sensor.pv".to_string()],
        ..EntryConfig::new("home", "sensor.main")
    }
}

/// Same household without the producer.
pub fn consumers_only_entry() -> EntryConfig {
    EntryConfig {
        producer_sensors: Vec::new(),
        ..household_entry()
    }
}

/// Host seeded with a 2 kW main reading and 600 W of known consumers.
pub fn seeded_host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.set_state(
        "sensor.main",
        SourceState::new("2")
            .with_unit("kW")
            .with_friendly_name("Grid Meter"),
    );
    host.set_state(
        "sensor.heat_pump",
        SourceState::new(450).with_unit("W").with_friendly_name("Heat Pump"),
    );
    host.set_state("sensor.ev", SourceState::new(150.0).with_unit("W"));
    host
}

/// Latest value published by `unique_id`.
pub fn latest_value(host: &MemoryHost, unique_id: &str) -> Option<f64> {
    host.latest(unique_id).and_then(|s| s.value)
}
