use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{
    ChangeCallback, ChangeNotifier, OutputSink, SourceState, StateChange, StateSource,
    Subscription, SubscriptionToken,
};
use crate::sensor::PublishedState;

/// Sensor states keyed by entity id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStates {
    states: BTreeMap<String, SourceState>,
}

impl StateSource for MemoryStates {
    fn get_state(&self, entity_id: &str) -> Option<&SourceState> {
        self.states.get(entity_id)
    }
}

struct Subscriber {
    entity_ids: Vec<String>,
    token: SubscriptionToken,
    callback: ChangeCallback,
}

impl Subscriber {
    fn tracks(&self, entity_id: &str) -> bool {
        self.entity_ids.iter().any(|id| id == entity_id)
    }
}

/// In-memory host: state registry, change notifications, and publication sink.
///
/// Notifications are delivered synchronously from [`MemoryHost::set_state`]
/// and [`MemoryHost::remove_state`], one subscriber at a time, and only when
/// the stored state actually changed. Each callback's returned state is
/// published to the host's own sink.
///
/// # Examples
///
/// ```
/// use powermix::host::{MemoryHost, SourceState, StateSource};
///
/// let mut host = MemoryHost::new();
/// host.set_state("sensor.main", SourceState::new("500").with_unit("W"));
/// assert!(host.get_state("sensor.main").is_some());
/// ```
#[derive(Default)]
pub struct MemoryHost {
    states: MemoryStates,
    subscribers: Vec<Subscriber>,
    latest: BTreeMap<String, PublishedState>,
    pending: Vec<PublishedState>,
}

impl MemoryHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `state` for `entity_id` and notifies subscribers if it changed.
    ///
    /// Returns the number of subscribers notified.
    pub fn set_state(&mut self, entity_id: impl Into<String>, state: SourceState) -> usize {
        let entity_id = entity_id.into();
        let old_state = self.states.states.insert(entity_id.clone(), state.clone());
        self.notify(entity_id, old_state, Some(state))
    }

    /// Removes `entity_id` and notifies subscribers if it existed.
    ///
    /// Returns the number of subscribers notified.
    pub fn remove_state(&mut self, entity_id: &str) -> usize {
        let old_state = self.states.states.remove(entity_id);
        self.notify(entity_id.to_string(), old_state, None)
    }

    fn notify(
        &mut self,
        entity_id: String,
        old_state: Option<SourceState>,
        new_state: Option<SourceState>,
    ) -> usize {
        if old_state == new_state {
            trace!(entity_id = %entity_id, "state unchanged, skipping notification");
            return 0;
        }
        let change = StateChange {
            entity_id,
            old_state,
            new_state,
        };

        self.subscribers.retain(|s| s.token.is_active());

        let mut notified = 0;
        for subscriber in &mut self.subscribers {
            if !subscriber.token.is_active() || !subscriber.tracks(&change.entity_id) {
                continue;
            }
            let published = (subscriber.callback)(&self.states, &change);
            record(&mut self.latest, &mut self.pending, published);
            notified += 1;
        }
        trace!(entity_id = %change.entity_id, notified, "state change dispatched");
        notified
    }

    /// Latest publication of the sensor with `unique_id`.
    pub fn latest(&self, unique_id: &str) -> Option<&PublishedState> {
        self.latest.get(unique_id)
    }

    /// Latest publication of every sensor, ordered by unique id.
    pub fn latest_states(&self) -> Vec<PublishedState> {
        self.latest.values().cloned().collect()
    }

    /// Takes every publication made since the previous call, in order.
    pub fn drain_publications(&mut self) -> Vec<PublishedState> {
        std::mem::take(&mut self.pending)
    }

    /// Number of subscriptions that have not been cancelled.
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.token.is_active())
            .count()
    }

    /// Read view of the stored states.
    pub fn states(&self) -> &MemoryStates {
        &self.states
    }
}

fn record(
    latest: &mut BTreeMap<String, PublishedState>,
    pending: &mut Vec<PublishedState>,
    state: PublishedState,
) {
    debug!(
        unique_id = %state.unique_id,
        value = ?state.value,
        unit = ?state.unit,
        "published"
    );
    latest.insert(state.unique_id.clone(), state.clone());
    pending.push(state);
}

impl StateSource for MemoryHost {
    fn get_state(&self, entity_id: &str) -> Option<&SourceState> {
        self.states.get_state(entity_id)
    }
}

impl ChangeNotifier for MemoryHost {
    fn subscribe(&mut self, entity_ids: &[String], callback: ChangeCallback) -> Subscription {
        let subscription = Subscription::new();
        self.subscribers.push(Subscriber {
            entity_ids: entity_ids.to_vec(),
            token: subscription.token(),
            callback,
        });
        debug!(?entity_ids, "subscribed");
        subscription
    }
}

impl OutputSink for MemoryHost {
    fn publish(&mut self, state: PublishedState) {
        record(&mut self.latest, &mut self.pending, state);
    }
}
