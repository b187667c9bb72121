//! Synthetic price process: a bounded random walk shaped by mood regimes,
//! momentum, trade impact and continuous mean reversion.
//!
//! Each tick: (1) roll the mood if its duration elapsed, (2) agent trades
//! land (driven by the engine, before the organic term), (3) organic
//! drift + noise + momentum, spike chance, floor bias, pump/rug shaping,
//! clamp, mean reversion, momentum decay. Deterministic given the seed.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::state::Config;

/// Named drift+volatility parameter set held for a random duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mood {
    pub name: &'static str,
    pub drift: f64,
    pub volatility: f64,
    pub min_duration_ticks: u32,
    pub max_duration_ticks: u32,
}

/// Fixed catalog the walk draws from, uniformly. Game content, not config.
pub const MOOD_CATALOG: &[Mood] = &[
    Mood { name: "sideways", drift: 0.0, volatility: 0.020, min_duration_ticks: 240, max_duration_ticks: 720 },
    Mood { name: "accumulation", drift: 0.004, volatility: 0.014, min_duration_ticks: 180, max_duration_ticks: 480 },
    Mood { name: "pump", drift: 0.030, volatility: 0.050, min_duration_ticks: 60, max_duration_ticks: 200 },
    Mood { name: "dump", drift: -0.030, volatility: 0.050, min_duration_ticks: 60, max_duration_ticks: 200 },
    Mood { name: "euphoria", drift: 0.012, volatility: 0.085, min_duration_ticks: 90, max_duration_ticks: 260 },
    Mood { name: "dread", drift: -0.012, volatility: 0.085, min_duration_ticks: 90, max_duration_ticks: 260 },
];

// Shaping thresholds. Above the ceiling upward deltas are halved; below the
// rug floor downward deltas accelerate; below the soft floor a fixed upward
// bias fights total collapse.
const PUMP_CEILING: f64 = 5.0;
const RUG_FLOOR: f64 = 0.5;
const SOFT_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Outcome of a trade submission. `executed == false` means the order was a
/// no-op (human anti-spam cooldown, or zero/negative amount).
#[derive(Debug, Clone, Copy)]
pub struct AppliedTrade {
    pub executed: bool,
    pub price: f64,
    pub impact: f64,
}

pub struct PriceEngine {
    cfg: Config,
    rng: StdRng,
    price: f64,
    momentum: f64,
    base_volatility: f64,
    mood: Mood,
    mood_ticks_elapsed: u32,
    mood_duration_ticks: u32,
    last_human_trade_ms: Option<u64>,
}

impl PriceEngine {
    pub fn new(cfg: Config, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mood = MOOD_CATALOG[rng.gen_range(0..MOOD_CATALOG.len())];
        let duration = rng.gen_range(mood.min_duration_ticks..=mood.max_duration_ticks);
        Self {
            price: cfg.start_price,
            momentum: 0.0,
            base_volatility: 0.0,
            mood,
            mood_ticks_elapsed: 0,
            mood_duration_ticks: duration,
            last_human_trade_ms: None,
            cfg,
            rng,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn base_volatility(&self) -> f64 {
        self.base_volatility
    }

    pub fn mood(&self) -> &Mood {
        &self.mood
    }

    /// Phase 1 of a tick: swap to a fresh uniformly-drawn mood once the
    /// current one has run its randomized duration.
    pub fn roll_mood_if_due(&mut self) {
        if self.mood_ticks_elapsed >= self.mood_duration_ticks {
            self.mood = MOOD_CATALOG[self.rng.gen_range(0..MOOD_CATALOG.len())];
            self.mood_duration_ticks = self
                .rng
                .gen_range(self.mood.min_duration_ticks..=self.mood.max_duration_ticks);
            self.mood_ticks_elapsed = 0;
        }
        self.mood_ticks_elapsed += 1;
    }

    /// Phase 3 of a tick: the organic term. Agent impacts must already have
    /// been applied for this tick.
    pub fn step_organic(&mut self) -> f64 {
        let vol = self.mood.volatility + self.base_volatility;
        let mut delta = self.mood.drift + self.rng.gen_range(-0.5..0.5) * vol + self.momentum;

        if self.rng.gen_bool(self.cfg.spike_prob) {
            let magnitude = self.rng.gen_range(0.0..self.cfg.spike_max);
            delta += if self.rng.gen_bool(0.5) { magnitude } else { -magnitude };
        }

        if self.price < SOFT_FLOOR {
            delta += self.cfg.floor_bias;
        }
        if self.price > PUMP_CEILING && delta > 0.0 {
            delta *= self.cfg.pump_dampen;
        }
        if self.price < RUG_FLOOR && delta < 0.0 {
            delta *= self.cfg.rug_accel;
        }

        self.price += delta;
        self.price = self.price.max(self.cfg.min_price);
        self.price -= (self.price - SOFT_FLOOR) * self.cfg.mean_reversion;
        self.momentum *= self.cfg.momentum_decay;
        self.price
    }

    /// Convert an order into a bounded multiplicative price move.
    ///
    /// Sells hit `sell_penalty`× harder than buys of equal size. Humans are
    /// throttled by an anti-spam cooldown; bots are exempt. The caller owns
    /// the candle-roll decision for executed human trades.
    pub fn apply_trade(
        &mut self,
        amount: f64,
        side: TradeSide,
        from_bot: bool,
        now_ms: u64,
    ) -> AppliedTrade {
        if !from_bot {
            if let Some(last) = self.last_human_trade_ms {
                if now_ms.saturating_sub(last) < self.cfg.human_cooldown_ms {
                    return AppliedTrade { executed: false, price: self.price, impact: 0.0 };
                }
            }
        }

        let raw = amount / self.cfg.liquidity;
        if !raw.is_finite() || amount <= 0.0 {
            // Zero/negative/degenerate amounts act as zero impact.
            return AppliedTrade { executed: false, price: self.price, impact: 0.0 };
        }
        let impact = match side {
            TradeSide::Buy => raw,
            TradeSide::Sell => -raw * self.cfg.sell_penalty,
        };

        self.price *= 1.0 + impact;
        self.momentum += impact * self.cfg.impact_momentum_gain;
        self.price -= (self.price - SOFT_FLOOR) * self.cfg.trade_snap;
        self.base_volatility =
            (self.base_volatility + impact.abs() * self.cfg.vol_cluster_gain).min(self.cfg.vol_cap);
        self.price = self.price.max(self.cfg.min_price);

        if !from_bot {
            self.last_human_trade_ms = Some(now_ms);
        }
        AppliedTrade { executed: true, price: self.price, impact }
    }
}
