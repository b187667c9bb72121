//! Demo driver for the arena core.
//!
//! One fast interval drives price ticks (agents included); a coarse 1 s
//! cadence drives stability sampling and directive evaluation against a
//! synthetic economy. This is the shape a real session host uses: it owns
//! the engine and feeds it time.

use anyhow::Result;
use tokio::time::{interval, Duration};

use arenafx::directives::{EconomySnapshot, StreamState};
use arenafx::engine::ArenaEngine;
use arenafx::logging::{json_log, obj, v_num, v_str, Domain};
use arenafx::stability::Verdict;
use arenafx::state::{now_ms, Config};

/// Stand-in for the idle-game economy layer: yield grows, fatigue creeps,
/// streams slowly gain collectors.
struct DemoEconomy {
    yps: f64,
    fatigue: f64,
    streams: Vec<StreamState>,
}

impl DemoEconomy {
    fn new() -> Self {
        Self {
            yps: 100.0,
            fatigue: 10.0,
            streams: vec![
                StreamState { level: 3, has_manager: true },
                StreamState { level: 2, has_manager: false },
                StreamState { level: 1, has_manager: false },
            ],
        }
    }

    fn advance(&mut self, price: f64) {
        // Yield scales with price so the arena visibly drives the economy.
        self.yps = (self.yps * 0.98 + 100.0 * price * 0.02).max(0.0);
        self.fatigue = (self.fatigue + 0.4) % 100.0;
        // A collector gets hired roughly once a minute.
        if self.fatigue < 0.5 {
            if let Some(s) = self.streams.iter_mut().find(|s| s.level > 0 && !s.has_manager) {
                s.has_manager = true;
            }
        }
    }

    fn snapshot(&self, stability_pct: f64) -> EconomySnapshot {
        EconomySnapshot {
            yps: self.yps,
            stability_pct,
            streams: self.streams.clone(),
            fatigue: self.fatigue,
            recent_signal_ts: Vec::new(), // the engine fills this from its log
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let max_ticks: u64 = std::env::var("MAX_TICKS").ok().and_then(|v| v.parse().ok()).unwrap_or(0);

    let start = now_ms();
    let mut engine = ArenaEngine::new(cfg.clone(), start);
    engine.on_position_opened();
    let mut economy = DemoEconomy::new();

    json_log(
        Domain::System,
        "start",
        obj(&[
            ("seed", v_num(cfg.seed as f64)),
            ("tick_ms", v_num(cfg.tick_ms as f64)),
            ("candle_ms", v_num(cfg.candle_duration_ms as f64)),
        ]),
    );

    let mut ticker = interval(Duration::from_millis(cfg.tick_ms));
    let mut last_now = start;
    let mut last_coarse = start;
    let mut last_status = start;
    let mut ticks: u64 = 0;

    loop {
        ticker.tick().await;
        let now = now_ms();
        let dt = now.saturating_sub(last_now);
        last_now = now;
        ticks += 1;

        let report = engine.tick(dt, now);
        for trade in &report.agent_trades {
            json_log(
                Domain::Agent,
                "bot_trade",
                obj(&[
                    ("agent", v_str(trade.agent)),
                    ("side", v_str(&format!("{:?}", trade.side).to_lowercase())),
                    ("amount", v_num(trade.amount)),
                    ("price", v_num(trade.price_after)),
                ]),
            );
        }
        if report.candles_rolled > 0 {
            json_log(
                Domain::Candle,
                "boundary",
                obj(&[
                    ("rolled", v_num(report.candles_rolled as f64)),
                    ("close", v_num(report.price)),
                ]),
            );
        }

        // Coarse cadence: stability sample + directive pass.
        if now.saturating_sub(last_coarse) >= cfg.stability_sample_ms {
            last_coarse = now;

            let verdict = engine.stability_sample();
            json_log(
                Domain::Stability,
                "sample",
                obj(&[
                    ("value", v_num(engine.stability_value())),
                    ("price", v_num(engine.price())),
                ]),
            );
            if verdict == Verdict::Busted {
                json_log(
                    Domain::Stability,
                    "busted",
                    obj(&[("price", v_num(engine.price()))]),
                );
                // The economy would liquidate at zero here; the demo just
                // opens the next round.
                engine.on_position_opened();
            }

            economy.advance(engine.price());
            let snapshot = economy.snapshot(engine.stability_pct());
            for signal in engine.check_directives(&snapshot, now) {
                json_log(
                    Domain::Directive,
                    "signal",
                    obj(&[
                        ("rule", v_str(signal.rule_key)),
                        ("kind", v_str(&format!("{:?}", signal.kind).to_lowercase())),
                        ("title", v_str(signal.title)),
                        ("detail", v_str(&signal.detail)),
                    ]),
                );
            }
        }

        if now.saturating_sub(last_status) >= 10_000 {
            last_status = now;
            json_log(
                Domain::System,
                "status",
                obj(&[
                    ("status", serde_json::to_value(engine.status())?),
                    ("camera_offset", v_num(engine.camera_offset(1_280.0))),
                ]),
            );
        }

        if max_ticks > 0 && ticks >= max_ticks {
            json_log(Domain::System, "stop", obj(&[("ticks", v_num(ticks as f64))]));
            return Ok(());
        }
    }
}
