use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::PublicationRow;
use crate::host::{MemoryHost, SourceState};

/// Column header of an event file.
pub const HEADER: &str = "step,op,entity_id,state,unit,friendly_name";

/// What an event does to the host registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOp {
    /// Stores a new state for the entity.
    Set,
    /// Removes the entity from the registry.
    Remove,
}

/// One row of an event file.
///
/// Empty `state`, `unit` and `friendly_name` cells read as `None`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReplayEvent {
    pub step: usize,
    pub op: EventOp,
    pub entity_id: String,
    pub state: Option<String>,
    pub unit: Option<String>,
    pub friendly_name: Option<String>,
}

impl ReplayEvent {
    /// Creates a `set` event with no unit or friendly name.
    pub fn set(step: usize, entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            step,
            op: EventOp::Set,
            entity_id: entity_id.into(),
            state: Some(state.into()),
            unit: None,
            friendly_name: None,
        }
    }

    /// Creates a `remove` event.
    pub fn remove(step: usize, entity_id: impl Into<String>) -> Self {
        Self {
            step,
            op: EventOp::Remove,
            entity_id: entity_id.into(),
            state: None,
            unit: None,
            friendly_name: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Host state described by a `set` row.
    pub fn source_state(&self) -> SourceState {
        SourceState {
            state: self.state.as_deref().into(),
            unit_of_measurement: self.unit.clone(),
            friendly_name: self.friendly_name.clone(),
        }
    }
}

/// Failure to load an event file.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot open event file \"{path}\": {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid event row: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads every event row from `reader`.
///
/// # Errors
///
/// Returns `ReplayError::Csv` on a malformed row, including unknown `op`
/// values.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<ReplayEvent>, ReplayError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let events = rdr
        .deserialize()
        .collect::<Result<Vec<ReplayEvent>, csv::Error>>()?;
    debug!(events = events.len(), "event file parsed");
    Ok(events)
}

/// Opens `path` and reads its events.
///
/// # Errors
///
/// Returns `ReplayError::Open` if the file cannot be opened, or
/// `ReplayError::Csv` on a malformed row.
pub fn read_events_from_path(path: &Path) -> Result<Vec<ReplayEvent>, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_events(io::BufReader::new(file))
}

/// Applies one event to `host`, returning the number of subscribers notified.
pub fn apply_event(host: &mut MemoryHost, event: &ReplayEvent) -> usize {
    match event.op {
        EventOp::Set => {
            if event.state.is_none() {
                warn!(
                    step = event.step,
                    entity_id = %event.entity_id,
                    "set event without a state, storing an absent value"
                );
            }
            host.set_state(event.entity_id.clone(), event.source_state())
        }
        EventOp::Remove => host.remove_state(&event.entity_id),
    }
}

/// Applies `events` in order and returns the publications each one caused.
///
/// Publications already pending on the host (for example from entry setup)
/// are returned first under step `0`.
pub fn replay(host: &mut MemoryHost, events: &[ReplayEvent]) -> Vec<PublicationRow> {
    let mut rows = PublicationRow::tag_all(0, host.drain_publications());
    for event in events {
        let notified = apply_event(host, event);
        debug!(step = event.step, entity_id = %event.entity_id, notified, "event applied");
        rows.extend(PublicationRow::tag_all(event.step, host.drain_publications()));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::NumberLike;
    use crate::config::EntryConfig;
    use crate::entry::EntryRuntime;
    use crate::host::StateSource;

    const EVENTS: &str = "\
step,op,entity_id,state,unit,friendly_name
1,set,sensor.main,2.5,kW,Grid Meter
1,set,sensor.ev,1200,W,
2,set,sensor.ev,unavailable,W,
3,remove,sensor.ev,,,
";

    #[test]
    fn parses_rows_with_empty_cells_as_none() {
        let events = read_events(EVENTS.as_bytes()).unwrap_or_default();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            ReplayEvent::set(1, "sensor.main", "2.5")
                .with_unit("kW")
                .with_friendly_name("Grid Meter")
        );
        assert_eq!(events[1].friendly_name, None);
        assert_eq!(events[3], ReplayEvent::remove(3, "sensor.ev"));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let bad = "step,op,entity_id,state,unit,friendly_name\n1,toggle,sensor.a,1,W,\n";
        let err = read_events(bad.as_bytes());
        assert!(matches!(err, Err(ReplayError::Csv(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_events_from_path(Path::new("/nonexistent/events.csv"));
        let msg = err.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.contains("/nonexistent/events.csv"));
    }

    #[test]
    fn set_without_state_stores_absent_value() {
        let mut host = MemoryHost::new();
        let event = ReplayEvent {
            state: None,
            ..ReplayEvent::set(1, "sensor.a", "")
        };
        apply_event(&mut host, &event);
        assert_eq!(
            host.get_state("sensor.a").map(|s| s.state.clone()),
            Some(NumberLike::Absent)
        );
    }

    #[test]
    fn replay_tags_publications_with_steps() {
        let mut host = MemoryHost::new();
        let entry = EntryConfig {
            included_sensors: vec!["sensor.ev".to_string()],
            ..EntryConfig::new("home", "sensor.main")
        };
        let _runtime = EntryRuntime::setup(&mut host, &entry);
        let events = read_events(EVENTS.as_bytes()).unwrap_or_default();

        let rows = replay(&mut host, &events);

        // setup publishes both sensors before any event
        assert_eq!(rows.iter().filter(|r| r.step == 0).count(), 2);

        let other_values: Vec<(usize, Option<f64>)> = rows
            .iter()
            .filter(|r| r.state.unique_id == "home_other")
            .map(|r| (r.step, r.state.value))
            .collect();
        assert_eq!(
            other_values,
            vec![
                (0, None),
                (1, Some(2500.0)),
                (1, Some(1300.0)),
                (2, Some(2500.0)),
                (3, Some(2500.0)),
            ]
        );
        assert_eq!(
            host.latest("home_mirror_sensor_ev").and_then(|s| s.unit.clone()),
            Some("W".to_string())
        );
    }
}
