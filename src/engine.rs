//! Session-root arena engine.
//!
//! One explicitly owned, long-lived object wires the subsystems together and
//! is passed by handle to consuming views — no module singletons. Tick order
//! is load-bearing: mood roll, then agent trades, then the organic step, and
//! only then does the live candle observe the price.

use serde::Serialize;
use serde_json::json;

use crate::agents::{AgentPool, AgentTrade};
use crate::camera;
use crate::candles::{Candle, CandleChart};
use crate::directives::{DirectiveEngine, EconomySnapshot, Signal, SignalLog};
use crate::price::{AppliedTrade, PriceEngine, TradeSide};
use crate::stability::{StabilityTracker, Verdict};
use crate::state::Config;

/// What one tick did, for the driver's logging.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub price: f64,
    pub candles_rolled: u32,
    pub agent_trades: Vec<AgentTrade>,
}

pub struct ArenaEngine {
    cfg: Config,
    price: PriceEngine,
    agents: AgentPool,
    chart: CandleChart,
    stability: StabilityTracker,
    directives: DirectiveEngine,
    log: SignalLog,
}

impl ArenaEngine {
    pub fn new(cfg: Config, now_ms: u64) -> Self {
        let seed = cfg.seed;
        Self::with_seed(cfg, seed, now_ms)
    }

    /// Fan the one seed out to every stochastic subsystem so a session
    /// replays exactly.
    pub fn with_seed(cfg: Config, seed: u64, now_ms: u64) -> Self {
        let price = PriceEngine::new(cfg.clone(), seed);
        let agents = AgentPool::new(seed.wrapping_add(1));
        let stability = StabilityTracker::new(cfg.clone(), seed.wrapping_add(2), price.price());
        let chart = CandleChart::new(cfg.candle_duration_ms, cfg.max_candles, price.price(), now_ms);
        let directives = DirectiveEngine::new(cfg.clone());
        let log = SignalLog::new(cfg.signal_log_cap);
        Self { price, agents, chart, stability, directives, log, cfg }
    }

    /// One step of the shared loop. Agents act before the organic term; the
    /// live candle sees the post-agent, post-drift price.
    pub fn tick(&mut self, dt_ms: u64, now_ms: u64) -> TickReport {
        self.price.roll_mood_if_due();
        let agent_trades = self.agents.step(now_ms, &mut self.price);
        let price = self.price.step_organic();
        let candles_rolled = self.chart.update(dt_ms, now_ms, price);
        TickReport { price, candles_rolled, agent_trades }
    }

    /// Human order entry. Every executed human trade gets its own candle
    /// boundary; bot trades (inside `tick`) never force one.
    pub fn apply_trade(&mut self, amount: f64, side: TradeSide, now_ms: u64) -> AppliedTrade {
        let applied = self.price.apply_trade(amount, side, false, now_ms);
        if applied.executed {
            self.chart.force_roll();
        }
        applied
    }

    /// Coarse-cadence stability sample against the current price. A `Busted`
    /// verdict is the caller's cue to force-liquidate at zero value.
    pub fn stability_sample(&mut self) -> Verdict {
        self.stability.sample(self.price.price())
    }

    /// The gauge refills only here — when the economy opens a new position.
    pub fn on_position_opened(&mut self) {
        self.stability.reset(self.price.price());
    }

    /// Run the directive rules and fold the results into the signal log.
    /// The engine supplies the log's own timestamps as the recent-traffic
    /// input; the economy layer does not track them.
    pub fn check_directives(&mut self, snapshot: &EconomySnapshot, now_ms: u64) -> Vec<Signal> {
        let mut snap = snapshot.clone();
        snap.recent_signal_ts = self.log.timestamps();
        let fresh = self.directives.check(&snap, now_ms);
        self.log.merge(fresh.clone());
        fresh
    }

    // -- read surface for renderer / UI --

    pub fn price(&self) -> f64 {
        self.price.price()
    }

    pub fn mood_name(&self) -> &'static str {
        self.price.mood().name
    }

    pub fn archived_candles(&self) -> impl Iterator<Item = &Candle> {
        self.chart.archived().iter()
    }

    pub fn live_candle(&self) -> &Candle {
        self.chart.live()
    }

    pub fn camera_offset(&self, viewport_w: f64) -> f64 {
        camera::scroll_offset(
            self.chart.visible_count(),
            self.cfg.candle_width_px,
            viewport_w,
            self.cfg.camera_origin_frac,
            self.cfg.camera_target_frac,
        )
    }

    pub fn stability_value(&self) -> f64 {
        self.stability.value()
    }

    pub fn stability_pct(&self) -> f64 {
        self.stability.as_pct()
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.log.entries().iter()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            price: self.price.price(),
            mood: self.price.mood().name,
            momentum: self.price.momentum(),
            base_volatility: self.price.base_volatility(),
            stability: self.stability.value(),
            archived_candles: self.chart.archived().len(),
            signals: self.log.entries().len(),
        }
    }
}

/// Point-in-time summary for periodic status logs.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub price: f64,
    pub mood: &'static str,
    pub momentum: f64,
    pub base_volatility: f64,
    pub stability: f64,
    pub archived_candles: usize,
    pub signals: usize,
}

impl EngineStatus {
    pub fn to_json(&self) -> String {
        json!(self).to_string()
    }
}
