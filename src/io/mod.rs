//! CSV input and output: event replay and publication export.

/// CSV export of the publication log.
pub mod export;
/// CSV event replay into a host.
pub mod replay;

use serde::Serialize;

use crate::sensor::PublishedState;

/// One publication tagged with the replay step that produced it.
///
/// Step `0` holds the initial publications made during entry setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationRow {
    pub step: usize,
    #[serde(flatten)]
    pub state: PublishedState,
}

impl PublicationRow {
    /// Tags every state in `states` with `step`.
    pub fn tag_all(step: usize, states: Vec<PublishedState>) -> Vec<Self> {
        states
            .into_iter()
            .map(|state| Self { step, state })
            .collect()
    }
}
