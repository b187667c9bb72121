//! Directive rules: turn economy/risk measurements into deduplicated,
//! cooldown-gated notifications.
//!
//! Each rule owns an independent cooldown key; band rules additionally keep
//! previous-band memory so transitions are edge-triggered while persistence
//! re-emits on the rule's own cadence. The caller merges results into a
//! bounded newest-first [`SignalLog`].

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::state::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Info,
    Success,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub id: u64,
    pub kind: SignalKind,
    pub title: &'static str,
    pub detail: String,
    pub ts_ms: u64,
    pub rule_key: &'static str,
}

/// One owned production stream as the economy sees it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreamState {
    pub level: u32,
    pub has_manager: bool,
}

/// Snapshot the economy layer hands to [`DirectiveEngine::check`] once per
/// economy tick. The engine never reaches into economy state itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EconomySnapshot {
    pub yps: f64,
    pub stability_pct: f64,
    pub streams: Vec<StreamState>,
    pub fatigue: f64,
    pub recent_signal_ts: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StabilityBand {
    Low,
    Elevated,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutomationBand {
    Managed,
    Gap,
}

pub struct DirectiveEngine {
    cfg: Config,
    next_id: u64,
    last_emit: HashMap<&'static str, u64>,
    yps_history: VecDeque<(u64, f64)>,
    prev_stability: Option<StabilityBand>,
    prev_automation: Option<AutomationBand>,
}

impl DirectiveEngine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            next_id: 0,
            last_emit: HashMap::new(),
            yps_history: VecDeque::new(),
            prev_stability: None,
            prev_automation: None,
        }
    }

    /// Evaluate every rule against the snapshot. Returns freshly emitted
    /// signals, newest rules last; the caller merges them into its log.
    pub fn check(&mut self, snapshot: &EconomySnapshot, now_ms: u64) -> Vec<Signal> {
        let mut out = Vec::new();

        let velocity_pct = self.update_yps_window(snapshot.yps, now_ms);
        self.check_stability(snapshot.stability_pct, now_ms, &mut out);
        self.check_automation(snapshot, now_ms, &mut out);
        self.check_fatigue(snapshot.fatigue, now_ms, &mut out);
        self.check_velocity(velocity_pct, now_ms, &mut out);
        self.check_activity(&snapshot.recent_signal_ts, now_ms, &mut out);

        out
    }

    /// Rolling yps window; velocity is the percent change from the oldest
    /// retained sample to the newest. Skipped while the oldest is <= 0.
    fn update_yps_window(&mut self, yps: f64, now_ms: u64) -> Option<f64> {
        self.yps_history.push_back((now_ms, yps));
        while let Some(&(ts, _)) = self.yps_history.front() {
            if now_ms.saturating_sub(ts) > self.cfg.yps_window_ms {
                self.yps_history.pop_front();
            } else {
                break;
            }
        }
        let (_, oldest) = *self.yps_history.front()?;
        if self.yps_history.len() < 2 || oldest <= 0.0 {
            return None;
        }
        let (_, newest) = *self.yps_history.back()?;
        Some((newest - oldest) / oldest * 100.0)
    }

    fn check_stability(&mut self, pct: f64, now_ms: u64, out: &mut Vec<Signal>) {
        let band = if pct < self.cfg.band_critical_below {
            StabilityBand::Critical
        } else if pct < self.cfg.band_elevated_below {
            StabilityBand::Elevated
        } else {
            StabilityBand::Low
        };

        match band {
            StabilityBand::Critical => self.try_emit(
                out,
                "stability.critical",
                self.cfg.critical_cooldown_ms,
                now_ms,
                SignalKind::Critical,
                "Bust risk critical",
                format!("stability at {:.0}% — liquidation imminent", pct),
            ),
            StabilityBand::Elevated => self.try_emit(
                out,
                "stability.elevated",
                self.cfg.elevated_cooldown_ms,
                now_ms,
                SignalKind::Warning,
                "Bust risk elevated",
                format!("stability at {:.0}%", pct),
            ),
            StabilityBand::Low => {
                // One-time notice, only on the way down from a hot band.
                if matches!(
                    self.prev_stability,
                    Some(StabilityBand::Elevated) | Some(StabilityBand::Critical)
                ) {
                    self.try_emit(
                        out,
                        "stability.recovered",
                        0,
                        now_ms,
                        SignalKind::Info,
                        "Position stabilized",
                        format!("stability back at {:.0}%", pct),
                    );
                }
            }
        }
        self.prev_stability = Some(band);
    }

    fn check_automation(&mut self, snapshot: &EconomySnapshot, now_ms: u64, out: &mut Vec<Signal>) {
        let gap = snapshot
            .streams
            .iter()
            .filter(|s| s.level > 0 && !s.has_manager)
            .count();
        let band = if gap > 0 { AutomationBand::Gap } else { AutomationBand::Managed };

        match band {
            AutomationBand::Gap => self.try_emit(
                out,
                "automation.gap",
                self.cfg.gap_cooldown_ms,
                now_ms,
                SignalKind::Warning,
                "Streams unmanaged",
                format!("{} stream(s) producing without a collector", gap),
            ),
            AutomationBand::Managed => {
                if self.prev_automation == Some(AutomationBand::Gap) {
                    self.try_emit(
                        out,
                        "automation.managed",
                        0,
                        now_ms,
                        SignalKind::Success,
                        "Full automation",
                        "every owned stream has a collector".to_string(),
                    );
                }
            }
        }
        self.prev_automation = Some(band);
    }

    fn check_fatigue(&mut self, fatigue: f64, now_ms: u64, out: &mut Vec<Signal>) {
        if fatigue >= self.cfg.fatigue_th {
            self.try_emit(
                out,
                "fatigue.high",
                self.cfg.fatigue_cooldown_ms,
                now_ms,
                SignalKind::Warning,
                "Operator fatigue high",
                format!("fatigue at {:.0}", fatigue),
            );
        }
    }

    fn check_velocity(&mut self, velocity_pct: Option<f64>, now_ms: u64, out: &mut Vec<Signal>) {
        let Some(v) = velocity_pct else { return };
        if v >= self.cfg.velocity_pct_th {
            self.try_emit(
                out,
                "velocity.rising",
                self.cfg.velocity_cooldown_ms,
                now_ms,
                SignalKind::Success,
                "Yield rising",
                format!("yield up {:.1}% over the window", v),
            );
        } else if v <= -self.cfg.velocity_pct_th {
            self.try_emit(
                out,
                "velocity.falling",
                self.cfg.velocity_cooldown_ms,
                now_ms,
                SignalKind::Warning,
                "Yield decelerating",
                format!("yield down {:.1}% over the window", v.abs()),
            );
        }
    }

    fn check_activity(&mut self, recent_ts: &[u64], now_ms: u64, out: &mut Vec<Signal>) {
        let busy = recent_ts
            .iter()
            .any(|&ts| now_ms.saturating_sub(ts) < self.cfg.recent_signal_age_ms);
        if busy {
            self.try_emit(
                out,
                "activity.pulse",
                self.cfg.activity_cooldown_ms,
                now_ms,
                SignalKind::Info,
                "Arena systems active",
                "recent directive traffic".to_string(),
            );
        }
    }

    fn try_emit(
        &mut self,
        out: &mut Vec<Signal>,
        rule_key: &'static str,
        cooldown_ms: u64,
        now_ms: u64,
        kind: SignalKind,
        title: &'static str,
        detail: String,
    ) {
        let cooled = self
            .last_emit
            .get(rule_key)
            .map_or(true, |&last| now_ms.saturating_sub(last) >= cooldown_ms);
        if !cooled {
            return;
        }
        self.last_emit.insert(rule_key, now_ms);
        self.next_id += 1;
        out.push(Signal {
            id: self.next_id,
            kind,
            title,
            detail,
            ts_ms: now_ms,
            rule_key,
        });
    }
}

// =============================================================================
// Signal log
// =============================================================================

/// Bounded, newest-first signal feed for the UI. Merging an exact
/// `(kind, title)` match removes the stale slot and reinserts at the front
/// with the fresh timestamp.
pub struct SignalLog {
    cap: usize,
    entries: VecDeque<Signal>,
}

impl SignalLog {
    pub fn new(cap: usize) -> Self {
        Self { cap, entries: VecDeque::with_capacity(cap) }
    }

    pub fn merge(&mut self, fresh: Vec<Signal>) {
        for sig in fresh {
            self.entries
                .retain(|e| !(e.kind == sig.kind && e.title == sig.title));
            self.entries.push_front(sig);
        }
        self.entries.truncate(self.cap);
    }

    pub fn entries(&self) -> &VecDeque<Signal> {
        &self.entries
    }

    pub fn timestamps(&self) -> Vec<u64> {
        self.entries.iter().map(|s| s.ts_ms).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DirectiveEngine {
        DirectiveEngine::new(Config::from_env())
    }

    fn snap(stability_pct: f64) -> EconomySnapshot {
        EconomySnapshot {
            yps: 100.0,
            stability_pct,
            streams: vec![StreamState { level: 1, has_manager: true }],
            fatigue: 0.0,
            recent_signal_ts: vec![],
        }
    }

    fn keys(signals: &[Signal]) -> Vec<&'static str> {
        signals.iter().map(|s| s.rule_key).collect()
    }

    #[test]
    fn critical_band_emits_then_respects_cooldown() {
        let mut eng = engine();
        let first = eng.check(&snap(20.0), 1_000);
        assert_eq!(keys(&first), vec!["stability.critical"]);
        assert_eq!(first[0].kind, SignalKind::Critical);
        // Still critical 3s later: cooldown (8s) suppresses.
        assert!(eng.check(&snap(18.0), 4_000).is_empty());
        // Past the cooldown: periodic re-emit while persisting.
        assert_eq!(keys(&eng.check(&snap(18.0), 9_100)), vec!["stability.critical"]);
    }

    #[test]
    fn stabilized_fires_once_on_the_way_down() {
        let mut eng = engine();
        eng.check(&snap(50.0), 0); // elevated
        let recovered = eng.check(&snap(90.0), 1_000);
        assert_eq!(keys(&recovered), vec!["stability.recovered"]);
        assert_eq!(recovered[0].kind, SignalKind::Info);
        // Staying low emits nothing further.
        assert!(eng.check(&snap(92.0), 2_000).is_empty());
        assert!(eng.check(&snap(95.0), 60_000).is_empty());
    }

    #[test]
    fn low_band_from_cold_start_is_silent() {
        let mut eng = engine();
        assert!(eng.check(&snap(95.0), 0).is_empty());
    }

    #[test]
    fn automation_gap_warns_and_managed_congratulates_once() {
        let mut eng = engine();
        let mut s = snap(90.0);
        s.streams = vec![
            StreamState { level: 2, has_manager: false },
            StreamState { level: 0, has_manager: false }, // unowned: not a gap
            StreamState { level: 1, has_manager: true },
        ];
        let first = eng.check(&s, 0);
        assert_eq!(keys(&first), vec!["automation.gap"]);
        assert!(first[0].detail.starts_with("1 stream"));
        // Persisting inside the 15s cooldown: quiet; after: re-warn.
        assert!(eng.check(&s, 10_000).is_empty());
        assert_eq!(keys(&eng.check(&s, 16_000)), vec!["automation.gap"]);

        s.streams[0].has_manager = true;
        let managed = eng.check(&s, 17_000);
        assert_eq!(keys(&managed), vec!["automation.managed"]);
        assert_eq!(managed[0].kind, SignalKind::Success);
        assert!(eng.check(&s, 18_000).is_empty(), "managed praise is one-time");
    }

    #[test]
    fn fatigue_warns_on_its_own_cadence() {
        let mut eng = engine();
        let mut s = snap(90.0);
        s.fatigue = 70.0;
        assert_eq!(keys(&eng.check(&s, 0)), vec!["fatigue.high"]);
        assert!(eng.check(&s, 19_000).is_empty());
        assert_eq!(keys(&eng.check(&s, 20_000)), vec!["fatigue.high"]);
    }

    #[test]
    fn yps_jump_emits_rising_once_per_window() {
        let mut eng = engine();
        // Flat history [100, 100, 100]...
        eng.check(&snap(90.0), 0);
        eng.check(&snap(90.0), 1_000);
        eng.check(&snap(90.0), 2_000);
        // ...then a jump to 130: +30% velocity.
        let mut s = snap(90.0);
        s.yps = 130.0;
        let rising = eng.check(&s, 3_000);
        assert_eq!(keys(&rising), vec!["velocity.rising"]);
        assert_eq!(rising[0].kind, SignalKind::Success);
        // Velocity still above threshold, but inside the 15s cooldown.
        assert!(eng.check(&s, 4_000).is_empty());
        assert!(eng.check(&s, 17_000).is_empty());
        let again = eng.check(&s, 18_000);
        assert_eq!(keys(&again), vec!["velocity.rising"]);
    }

    #[test]
    fn yps_collapse_emits_decelerating() {
        let mut eng = engine();
        eng.check(&snap(90.0), 0);
        let mut s = snap(90.0);
        s.yps = 80.0; // -20%
        let falling = eng.check(&s, 1_000);
        assert_eq!(keys(&falling), vec!["velocity.falling"]);
        assert_eq!(falling[0].kind, SignalKind::Warning);
    }

    #[test]
    fn velocity_skipped_while_oldest_sample_is_zero() {
        let mut eng = engine();
        let mut s = snap(90.0);
        s.yps = 0.0;
        eng.check(&s, 0);
        s.yps = 50.0; // would be +inf% against a zero base
        assert!(eng.check(&s, 1_000).is_empty());
    }

    #[test]
    fn yps_window_forgets_samples_past_30s() {
        let mut eng = engine();
        eng.check(&snap(90.0), 0); // 100 yps
        let mut s = snap(90.0);
        s.yps = 104.0;
        // 40s later the 100-yps sample is gone; baseline is a fresh 104.
        eng.check(&s, 40_000);
        s.yps = 106.0; // +1.9% vs 104 — under threshold
        assert!(eng.check(&s, 41_000).is_empty());
    }

    #[test]
    fn activity_pulse_reacts_to_recent_log_traffic() {
        let mut eng = engine();
        let mut s = snap(90.0);
        s.recent_signal_ts = vec![29_500];
        let pulse = eng.check(&s, 30_000);
        assert_eq!(keys(&pulse), vec!["activity.pulse"]);
        assert_eq!(pulse[0].kind, SignalKind::Info);
        // Inside its 12s cooldown: quiet even with fresh traffic.
        s.recent_signal_ts = vec![35_000];
        assert!(eng.check(&s, 36_000).is_empty());
        // Stale traffic only: quiet too.
        s.recent_signal_ts = vec![10_000];
        assert!(eng.check(&s, 60_000).is_empty());
    }

    #[test]
    fn rule_cooldowns_are_independent() {
        let mut eng = engine();
        let mut s = snap(20.0); // critical
        s.fatigue = 80.0;
        let burst = eng.check(&s, 0);
        assert_eq!(keys(&burst), vec!["stability.critical", "fatigue.high"]);
        // Critical re-arms at 8s while fatigue (20s) stays quiet.
        let later = eng.check(&s, 9_000);
        assert_eq!(keys(&later), vec!["stability.critical"]);
    }

    // -------------------------------------------------------------------------
    // Signal log
    // -------------------------------------------------------------------------

    fn make_signal(id: u64, kind: SignalKind, title: &'static str, ts_ms: u64) -> Signal {
        Signal { id, kind, title, detail: String::new(), ts_ms, rule_key: "test" }
    }

    #[test]
    fn log_keeps_newest_first_and_truncates() {
        let mut log = SignalLog::new(10);
        for i in 0..14u64 {
            log.merge(vec![make_signal(i, SignalKind::Info, "a", i)]);
        }
        // Identical (kind, title) dedups down to a single slot.
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].ts_ms, 13);
    }

    #[test]
    fn log_dedup_is_by_kind_and_title() {
        let mut log = SignalLog::new(10);
        log.merge(vec![make_signal(1, SignalKind::Warning, "risk", 100)]);
        log.merge(vec![make_signal(2, SignalKind::Info, "risk", 200)]);
        log.merge(vec![make_signal(3, SignalKind::Warning, "other", 300)]);
        assert_eq!(log.entries().len(), 3, "same title, different kind must coexist");
        // Refresh the first: moves to front with new timestamp.
        log.merge(vec![make_signal(4, SignalKind::Warning, "risk", 400)]);
        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.entries()[0].ts_ms, 400);
        assert_eq!(log.entries()[0].title, "risk");
    }

    #[test]
    fn log_never_exceeds_capacity() {
        let mut log = SignalLog::new(10);
        let titles: [&'static str; 14] = [
            "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "t10", "t11", "t12", "t13",
        ];
        for (i, title) in titles.iter().enumerate() {
            log.merge(vec![make_signal(i as u64, SignalKind::Info, title, i as u64)]);
        }
        assert_eq!(log.entries().len(), 10);
        // Newest at index 0, oldest survivors at the tail.
        assert_eq!(log.entries()[0].title, "t13");
        assert_eq!(log.entries()[9].title, "t4");
    }
}
