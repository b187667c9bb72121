//! Shared configuration and clock helpers.
//!
//! Every tuning constant lives here with an env override and a hard default.
//! The damage/impact numbers (25–40 severe hit, fixed 10 moderate, 2% spike
//! probability, 1.25× sell asymmetry) are tuned for game feel, not derived —
//! they are configuration, not math to be corrected.

#[derive(Debug, Clone)]
pub struct Config {
    // -- price process --
    pub start_price: f64,
    pub liquidity: f64,
    pub spike_prob: f64,
    pub spike_max: f64,
    pub floor_bias: f64,
    pub pump_dampen: f64,
    pub rug_accel: f64,
    pub mean_reversion: f64,
    pub momentum_decay: f64,
    pub min_price: f64,

    // -- trade impact --
    pub sell_penalty: f64,
    pub impact_momentum_gain: f64,
    pub trade_snap: f64,
    pub vol_cluster_gain: f64,
    pub vol_cap: f64,
    pub human_cooldown_ms: u64,

    // -- candles & camera --
    pub candle_duration_ms: u64,
    pub max_candles: usize,
    pub candle_width_px: f64,
    pub camera_origin_frac: f64,
    pub camera_target_frac: f64,

    // -- stability gauge --
    pub stability_max: f64,
    pub severe_drop: f64,
    pub severe_damage: f64,
    pub severe_jitter: f64,
    pub moderate_drop: f64,
    pub moderate_damage: f64,
    pub recovery_rise: f64,
    pub recovery_bonus: f64,
    pub calm_band: f64,
    pub regen_bonus: f64,
    pub stability_sample_ms: u64,

    // -- directive rules --
    pub yps_window_ms: u64,
    pub velocity_pct_th: f64,
    pub velocity_cooldown_ms: u64,
    pub band_critical_below: f64,
    pub band_elevated_below: f64,
    pub critical_cooldown_ms: u64,
    pub elevated_cooldown_ms: u64,
    pub gap_cooldown_ms: u64,
    pub fatigue_th: f64,
    pub fatigue_cooldown_ms: u64,
    pub recent_signal_age_ms: u64,
    pub activity_cooldown_ms: u64,
    pub signal_log_cap: usize,

    // -- driver --
    pub tick_ms: u64,
    pub seed: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            start_price: std::env::var("START_PRICE").ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            liquidity: std::env::var("LIQUIDITY").ok().and_then(|v| v.parse().ok()).unwrap_or(3000.0),
            spike_prob: std::env::var("SPIKE_PROB").ok().and_then(|v| v.parse().ok()).unwrap_or(0.02),
            spike_max: std::env::var("SPIKE_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(0.15),
            floor_bias: std::env::var("FLOOR_BIAS").ok().and_then(|v| v.parse().ok()).unwrap_or(0.012),
            pump_dampen: std::env::var("PUMP_DAMPEN").ok().and_then(|v| v.parse().ok()).unwrap_or(0.5),
            rug_accel: std::env::var("RUG_ACCEL").ok().and_then(|v| v.parse().ok()).unwrap_or(1.3),
            mean_reversion: std::env::var("MEAN_REVERSION").ok().and_then(|v| v.parse().ok()).unwrap_or(0.01),
            momentum_decay: std::env::var("MOMENTUM_DECAY").ok().and_then(|v| v.parse().ok()).unwrap_or(0.9),
            min_price: std::env::var("MIN_PRICE").ok().and_then(|v| v.parse().ok()).unwrap_or(0.01),
            sell_penalty: std::env::var("SELL_PENALTY").ok().and_then(|v| v.parse().ok()).unwrap_or(1.25),
            impact_momentum_gain: std::env::var("IMPACT_MOM_GAIN").ok().and_then(|v| v.parse().ok()).unwrap_or(0.3),
            trade_snap: std::env::var("TRADE_SNAP").ok().and_then(|v| v.parse().ok()).unwrap_or(0.0025),
            vol_cluster_gain: std::env::var("VOL_CLUSTER_GAIN").ok().and_then(|v| v.parse().ok()).unwrap_or(0.02),
            vol_cap: std::env::var("VOL_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(0.2),
            human_cooldown_ms: std::env::var("HUMAN_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(180),
            candle_duration_ms: std::env::var("CANDLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(2000),
            max_candles: std::env::var("MAX_CANDLES").ok().and_then(|v| v.parse().ok()).unwrap_or(150),
            candle_width_px: std::env::var("CANDLE_WIDTH_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(26.0),
            camera_origin_frac: std::env::var("CAMERA_ORIGIN_FRAC").ok().and_then(|v| v.parse().ok()).unwrap_or(0.35),
            camera_target_frac: std::env::var("CAMERA_TARGET_FRAC").ok().and_then(|v| v.parse().ok()).unwrap_or(0.65),
            stability_max: std::env::var("STABILITY_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(100.0),
            severe_drop: std::env::var("SEVERE_DROP").ok().and_then(|v| v.parse().ok()).unwrap_or(-0.025),
            severe_damage: std::env::var("SEVERE_DAMAGE").ok().and_then(|v| v.parse().ok()).unwrap_or(25.0),
            severe_jitter: std::env::var("SEVERE_JITTER").ok().and_then(|v| v.parse().ok()).unwrap_or(15.0),
            moderate_drop: std::env::var("MODERATE_DROP").ok().and_then(|v| v.parse().ok()).unwrap_or(-0.01),
            moderate_damage: std::env::var("MODERATE_DAMAGE").ok().and_then(|v| v.parse().ok()).unwrap_or(10.0),
            recovery_rise: std::env::var("RECOVERY_RISE").ok().and_then(|v| v.parse().ok()).unwrap_or(0.02),
            recovery_bonus: std::env::var("RECOVERY_BONUS").ok().and_then(|v| v.parse().ok()).unwrap_or(8.0),
            calm_band: std::env::var("CALM_BAND").ok().and_then(|v| v.parse().ok()).unwrap_or(0.005),
            regen_bonus: std::env::var("REGEN_BONUS").ok().and_then(|v| v.parse().ok()).unwrap_or(2.0),
            stability_sample_ms: std::env::var("STABILITY_SAMPLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(1000),
            yps_window_ms: std::env::var("YPS_WINDOW_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(30_000),
            velocity_pct_th: std::env::var("VELOCITY_PCT_TH").ok().and_then(|v| v.parse().ok()).unwrap_or(10.0),
            velocity_cooldown_ms: std::env::var("VELOCITY_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(15_000),
            band_critical_below: std::env::var("BAND_CRITICAL_BELOW").ok().and_then(|v| v.parse().ok()).unwrap_or(35.0),
            band_elevated_below: std::env::var("BAND_ELEVATED_BELOW").ok().and_then(|v| v.parse().ok()).unwrap_or(70.0),
            critical_cooldown_ms: std::env::var("CRITICAL_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(8_000),
            elevated_cooldown_ms: std::env::var("ELEVATED_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(12_000),
            gap_cooldown_ms: std::env::var("GAP_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(15_000),
            fatigue_th: std::env::var("FATIGUE_TH").ok().and_then(|v| v.parse().ok()).unwrap_or(65.0),
            fatigue_cooldown_ms: std::env::var("FATIGUE_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(20_000),
            recent_signal_age_ms: std::env::var("RECENT_SIGNAL_AGE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(8_000),
            activity_cooldown_ms: std::env::var("ACTIVITY_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(12_000),
            signal_log_cap: std::env::var("SIGNAL_LOG_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(42),
        }
    }
}

/// Wall-clock epoch milliseconds. The core never calls this itself — callers
/// feed `now_ms` in so tests stay off the wall clock.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = Config::from_env();
        assert!(cfg.min_price > 0.0);
        assert!(cfg.start_price >= cfg.min_price);
        assert!(cfg.band_critical_below < cfg.band_elevated_below);
        assert!(cfg.severe_drop < cfg.moderate_drop);
        assert!(cfg.moderate_drop < 0.0);
        assert!(cfg.calm_band > 0.0 && cfg.calm_band < cfg.recovery_rise);
        assert!(cfg.vol_cap > 0.0);
        assert!(cfg.signal_log_cap > 0);
        assert!(cfg.max_candles > 1);
    }

    #[test]
    fn game_feel_constants_present() {
        // The full-sell clamp scenario depends on these exact defaults; a
        // change here changes observable game behavior.
        let cfg = Config::from_env();
        assert_eq!(cfg.liquidity, 3000.0);
        assert_eq!(cfg.sell_penalty, 1.25);
        assert_eq!(cfg.min_price, 0.01);
    }
}
