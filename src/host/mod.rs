//! Boundary to the platform that owns sensor states.
//!
//! The platform is modelled as three small traits: a point-in-time state
//! lookup ([`StateSource`]), a change subscription ([`ChangeNotifier`]), and
//! a publication sink ([`OutputSink`]). [`memory::MemoryHost`] implements all
//! three in memory.

/// In-memory host used by the CLI replay and the tests.
pub mod memory;

use std::cell::Cell;
use std::rc::Rc;

use crate::calc::NumberLike;
use crate::sensor::PublishedState;

pub use memory::MemoryHost;

/// Current state of one source sensor as held by the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceState {
    /// Raw state value.
    pub state: NumberLike,
    /// Reported unit label, verbatim.
    pub unit_of_measurement: Option<String>,
    /// Human-friendly label of the source.
    pub friendly_name: Option<String>,
}

impl SourceState {
    /// Creates a state with no unit and no friendly name.
    pub fn new(state: impl Into<NumberLike>) -> Self {
        Self {
            state: state.into(),
            unit_of_measurement: None,
            friendly_name: None,
        }
    }

    /// Sets the unit label.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measurement = Some(unit.into());
        self
    }

    /// Sets the friendly name.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }
}

/// Synchronous, in-memory read of the current state of a sensor.
pub trait StateSource {
    /// Returns the current state of `entity_id`, or `None` if it does not exist.
    fn get_state(&self, entity_id: &str) -> Option<&SourceState>;
}

/// Notification payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// Sensor whose state changed.
    pub entity_id: String,
    /// State before the change (`None` if the sensor did not exist).
    pub old_state: Option<SourceState>,
    /// State after the change (`None` if the sensor was removed).
    pub new_state: Option<SourceState>,
}

/// Callback invoked for every change of a tracked sensor.
///
/// Receives a read view of all current states and returns the state the
/// subscriber wants published.
pub type ChangeCallback = Box<dyn FnMut(&dyn StateSource, &StateChange) -> PublishedState>;

/// Registers callbacks for state changes of a set of sensors.
pub trait ChangeNotifier {
    /// Invokes `callback` sequentially whenever any of `entity_ids` changes.
    ///
    /// The registration lives as long as the returned [`Subscription`].
    fn subscribe(&mut self, entity_ids: &[String], callback: ChangeCallback) -> Subscription;
}

/// Receives every state a sensor publishes.
pub trait OutputSink {
    /// Publishes `state`. Assumed to always succeed.
    fn publish(&mut self, state: PublishedState);
}

/// Handle to an active change registration.
///
/// [`Subscription::cancel`] is idempotent; dropping the handle cancels it, so
/// a registration never outlives its owner.
#[derive(Debug)]
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

/// Host-side view of a [`Subscription`], used to skip cancelled callbacks.
#[derive(Debug, Clone)]
pub struct SubscriptionToken {
    active: Rc<Cell<bool>>,
}

impl SubscriptionToken {
    /// Returns `true` until the owning subscription is cancelled or dropped.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Subscription {
    /// Creates an active subscription handle.
    pub fn new() -> Self {
        Self {
            active: Rc::new(Cell::new(true)),
        }
    }

    /// Returns a token the host keeps alongside the registered callback.
    pub fn token(&self) -> SubscriptionToken {
        SubscriptionToken {
            active: Rc::clone(&self.active),
        }
    }

    /// Returns `true` until cancelled.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Deregisters the callback. Calling it again has no effect.
    pub fn cancel(&self) {
        self.active.set(false);
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
