//! Position-stability gauge.
//!
//! Sampled on its own coarse cadence (1 s by default), decoupled from the
//! price tick, so it may observe any intermediate price. Reacts to the
//! relative swing since the previous sample; hitting zero is a normal
//! terminal game outcome ("bust"), not an error. The gauge resets to max
//! only when a new position opens — never on its own.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::state::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Continue,
    Busted,
}

pub struct StabilityTracker {
    cfg: Config,
    rng: StdRng,
    value: f64,
    last_sampled_price: f64,
}

impl StabilityTracker {
    pub fn new(cfg: Config, seed: u64, start_price: f64) -> Self {
        Self {
            value: cfg.stability_max,
            last_sampled_price: start_price,
            rng: StdRng::seed_from_u64(seed),
            cfg,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max(&self) -> f64 {
        self.cfg.stability_max
    }

    pub fn as_pct(&self) -> f64 {
        if self.cfg.stability_max > 0.0 {
            self.value / self.cfg.stability_max * 100.0
        } else {
            0.0
        }
    }

    /// Called when a new position opens: full gauge, fresh price baseline.
    pub fn reset(&mut self, current_price: f64) {
        self.value = self.cfg.stability_max;
        self.last_sampled_price = current_price;
    }

    /// One cadence sample. Severe drops take a randomized 25–40 hit,
    /// moderate drops a fixed 10; strong recoveries and calm both heal.
    pub fn sample(&mut self, current_price: f64) -> Verdict {
        let last = self.last_sampled_price;
        if last > 0.0 {
            let diff = (current_price - last) / last;
            if diff <= self.cfg.severe_drop {
                self.value -= self.cfg.severe_damage + self.rng.gen_range(0.0..self.cfg.severe_jitter);
            } else if diff <= self.cfg.moderate_drop {
                self.value -= self.cfg.moderate_damage;
            } else if diff >= self.cfg.recovery_rise {
                self.value += self.cfg.recovery_bonus;
            } else if diff.abs() < self.cfg.calm_band {
                self.value += self.cfg.regen_bonus;
            }
        }
        self.value = self.value.clamp(0.0, self.cfg.stability_max);
        self.last_sampled_price = current_price;
        if self.value <= 0.0 {
            Verdict::Busted
        } else {
            Verdict::Continue
        }
    }
}
