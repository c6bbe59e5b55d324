//! Lifecycle of one configured entry: build, activate, unload, reload.

use tracing::{debug, info};

use crate::config::{DEFAULT_SENSOR_PREFIX, DerivationConfig, EntryConfig};
use crate::host::{ChangeNotifier, OutputSink, StateChange, StateSource, Subscription};
use crate::sensor::{MirrorSensor, OtherSensor, PowerSensor, SensorRole};

/// Sensors created for one entry, before activation.
#[derive(Debug, Clone)]
pub struct SensorSet {
    /// Derived remainder sensor.
    pub other: OtherSensor,
    /// Consumer mirrors followed by producer mirrors.
    pub mirrors: Vec<MirrorSensor>,
}

impl SensorSet {
    /// Unique ids in activation order.
    pub fn unique_ids(&self) -> Vec<String> {
        std::iter::once(self.other.unique_id())
            .chain(self.mirrors.iter().map(|m| m.unique_id()))
            .map(str::to_string)
            .collect()
    }
}

/// Builds one remainder sensor plus a mirror per consumer and per producer.
///
/// Unique ids never repeat: a source listed as both consumer and producer
/// (or two ids with the same slug) keeps only its first mirror.
pub fn build_sensors(entry_id: &str, config: &DerivationConfig) -> SensorSet {
    let prefix = config.prefix();
    let consumers = config.consumers().iter().map(|id| (id, SensorRole::Consumer));
    let producers = config.producers().iter().map(|id| (id, SensorRole::Producer));

    let mut mirrors: Vec<MirrorSensor> = Vec::new();
    for (id, role) in consumers.chain(producers) {
        let mirror = MirrorSensor::new(entry_id, prefix, id, role);
        if mirrors.iter().any(|m| m.unique_id() == mirror.unique_id()) {
            debug!(sensor = %mirror.unique_id(), %role, "mirror already built, skipping");
            continue;
        }
        mirrors.push(mirror);
    }

    SensorSet {
        other: OtherSensor::new(entry_id, config.clone()),
        mirrors,
    }
}

/// Refreshes `sensor`, publishes its initial state, then subscribes it.
///
/// The sensor moves into the subscription callback; every later notification
/// refreshes it against the host states and returns the state to publish.
pub fn activate<H, S>(host: &mut H, mut sensor: S) -> Subscription
where
    H: StateSource + ChangeNotifier + OutputSink,
    S: PowerSensor + 'static,
{
    sensor.refresh(&*host);
    host.publish(sensor.published());

    let tracked = sensor.tracked_entities();
    debug!(sensor = %sensor.unique_id(), ?tracked, "activating");
    host.subscribe(
        &tracked,
        Box::new(move |states: &dyn StateSource, _change: &StateChange| {
            sensor.refresh(states);
            sensor.published()
        }),
    )
}

/// Display title of an entry: `"{friendly name of main} breakdown"`.
///
/// Falls back to the main sensor id when the main state is missing or has no
/// friendly name, and to [`DEFAULT_SENSOR_PREFIX`] without a main sensor.
pub fn entry_title(states: &dyn StateSource, main_sensor: &str) -> String {
    let main_sensor = main_sensor.trim();
    if main_sensor.is_empty() {
        return DEFAULT_SENSOR_PREFIX.to_string();
    }
    let friendly = states
        .get_state(main_sensor)
        .and_then(|s| s.friendly_name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(main_sensor);
    format!("{friendly} breakdown")
}

/// A set-up entry whose sensors are subscribed to the host.
///
/// Dropping the runtime cancels every subscription; [`EntryRuntime::unload`]
/// does the same explicitly and logs it.
#[derive(Debug)]
pub struct EntryRuntime {
    entry_id: String,
    title: String,
    config: DerivationConfig,
    sensor_ids: Vec<String>,
    subscriptions: Vec<Subscription>,
}

impl EntryRuntime {
    /// Builds and activates every sensor of `entry`.
    pub fn setup<H>(host: &mut H, entry: &EntryConfig) -> Self
    where
        H: StateSource + ChangeNotifier + OutputSink,
    {
        let config = entry.derivation();
        let title = entry_title(&*host, config.main_sensor());
        let set = build_sensors(&entry.entry_id, &config);
        let sensor_ids = set.unique_ids();

        let mut subscriptions = Vec::with_capacity(set.mirrors.len() + 1);
        subscriptions.push(activate(host, set.other));
        for mirror in set.mirrors {
            subscriptions.push(activate(host, mirror));
        }

        info!(
            entry_id = %entry.entry_id,
            title = %title,
            sensors = sensor_ids.len(),
            allow_negative = config.allow_negative(),
            "entry set up"
        );
        Self {
            entry_id: entry.entry_id.clone(),
            title,
            config,
            sensor_ids,
            subscriptions,
        }
    }

    /// Cancels every subscription of the entry.
    pub fn unload(self) {
        for subscription in &self.subscriptions {
            subscription.cancel();
        }
        info!(entry_id = %self.entry_id, "entry unloaded");
    }

    /// Replaces this entry's sensors wholesale with ones built from `entry`.
    pub fn reload<H>(self, host: &mut H, entry: &EntryConfig) -> Self
    where
        H: StateSource + ChangeNotifier + OutputSink,
    {
        info!(entry_id = %self.entry_id, "reloading entry");
        self.unload();
        Self::setup(host, entry)
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalized configuration the sensors were built from.
    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    /// Unique ids of the entry's sensors, remainder first.
    pub fn sensor_ids(&self) -> &[String] {
        &self.sensor_ids
    }

    /// `true` while every subscription is still registered.
    pub fn is_active(&self) -> bool {
        self.subscriptions.iter().all(Subscription::is_active)
    }
}
