//! Seeded synthetic event stream for the built-in presets.
//!
//! Every step emits one `set` event per source sensor of every entry:
//! consumers follow a shifted daily sinusoid in watts, producers follow a
//! daylight bell curve in watts, and the main sensor reports the household
//! balance in kilowatts (consumers + unmetered base load - production). A
//! sub-reading may report `unavailable` with the configured probability.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::{DemoConfig, PowermixConfig};
use crate::io::replay::ReplayEvent;

/// Steps per simulated day.
const STEPS_PER_DAY: usize = 24;
/// Load on the main circuit that no configured consumer explains (W).
const UNMETERED_BASE_W: f64 = 350.0;
/// Mean draw of the first consumer; later ones add `CONSUMER_STEP_W` each (W).
const CONSUMER_BASE_W: f64 = 400.0;
const CONSUMER_STEP_W: f64 = 250.0;
/// Peak output of each producer at solar noon (W).
const PRODUCER_PEAK_W: f64 = 2500.0;
const SUNRISE_STEP: f64 = 6.0;
const SUNSET_STEP: f64 = 18.0;

/// Gaussian noise via the Box-Muller transform, mean 0.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}

/// Turns `sensor.heat_pump` into `Heat Pump`.
pub fn friendly_name(entity_id: &str) -> String {
    let object_id = entity_id.split_once('.').map_or(entity_id, |(_, id)| id);
    object_id
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Seeded generator of household readings.
///
/// # Examples
///
/// ```
/// use powermix::config::PowermixConfig;
/// use powermix::demo::DemoGenerator;
///
/// let cfg = PowermixConfig::demo();
/// let a = DemoGenerator::new(&cfg.demo).events(&cfg);
/// let b = DemoGenerator::new(&cfg.demo).events(&cfg);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct DemoGenerator {
    settings: DemoConfig,
    rng: StdRng,
}

impl DemoGenerator {
    pub fn new(settings: &DemoConfig) -> Self {
        Self {
            settings: settings.clone(),
            rng: StdRng::seed_from_u64(settings.seed),
        }
    }

    /// Event stream for every entry in `config`, steps numbered from 1.
    ///
    /// A sensor shared between entries is emitted once per step.
    pub fn events(mut self, config: &PowermixConfig) -> Vec<ReplayEvent> {
        let mut events = Vec::new();
        for step in 1..=self.settings.steps {
            let mut emitted: BTreeSet<String> = BTreeSet::new();
            for entry in &config.entries {
                let derivation = entry.derivation();
                let mut balance_w = UNMETERED_BASE_W * self.jitter();

                for (i, id) in derivation.consumers().iter().enumerate() {
                    let w = self.consumer_w(step, i);
                    balance_w += w;
                    self.push_sub_reading(&mut events, &mut emitted, step, id, w);
                }
                for id in derivation.producers() {
                    let w = self.producer_w(step);
                    balance_w -= w;
                    self.push_sub_reading(&mut events, &mut emitted, step, id, w);
                }

                let main = derivation.main_sensor();
                if emitted.insert(main.to_string()) {
                    events.push(
                        ReplayEvent::set(step, main, format!("{:.3}", balance_w / 1000.0))
                            .with_unit("kW")
                            .with_friendly_name(friendly_name(main)),
                    );
                }
            }
        }
        events
    }

    fn jitter(&mut self) -> f64 {
        (1.0 + gaussian_noise(&mut self.rng, self.settings.noise_std)).max(0.0)
    }

    fn consumer_w(&mut self, step: usize, index: usize) -> f64 {
        let mean = CONSUMER_BASE_W + CONSUMER_STEP_W * index as f64;
        let angle = 2.0 * PI * (step % STEPS_PER_DAY) as f64 / STEPS_PER_DAY as f64;
        let shape = 1.0 + 0.5 * (angle + index as f64).sin();
        mean * shape * self.jitter()
    }

    fn producer_w(&mut self, step: usize) -> f64 {
        let hour = (step % STEPS_PER_DAY) as f64;
        if !(SUNRISE_STEP..=SUNSET_STEP).contains(&hour) {
            return 0.0;
        }
        let daylight = (PI * (hour - SUNRISE_STEP) / (SUNSET_STEP - SUNRISE_STEP)).sin();
        PRODUCER_PEAK_W * daylight * self.jitter()
    }

    fn push_sub_reading(
        &mut self,
        events: &mut Vec<ReplayEvent>,
        emitted: &mut BTreeSet<String>,
        step: usize,
        entity_id: &str,
        watts: f64,
    ) {
        if !emitted.insert(entity_id.to_string()) {
            return;
        }
        let state = if self.rng.random_bool(self.settings.unavailable_probability) {
            "unavailable".to_string()
        } else {
            format!("{watts:.1}")
        };
        events.push(
            ReplayEvent::set(step, entity_id, state)
                .with_unit("W")
                .with_friendly_name(friendly_name(entity_id)),
        );
    }
}
