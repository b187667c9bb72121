//! OHLC candle aggregation over the continuous price.
//!
//! One mutable live candle at all times; archived candles are immutable and
//! live in a bounded FIFO. Time rolls subtract the nominal duration from the
//! elapsed accumulator so a lagging driver catches up; forced rolls (armed
//! via [`CandleChart::force_roll`], one per executed human trade) reset the
//! accumulator instead.

use std::collections::VecDeque;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub ts_open_ms: u64,
}

impl Candle {
    fn seeded(price: f64, ts_open_ms: u64) -> Self {
        Self { open: price, high: price, low: price, close: price, ts_open_ms }
    }

    /// low ≤ min(open, close) ≤ max(open, close) ≤ high
    pub fn is_well_formed(&self) -> bool {
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }
}

pub struct CandleChart {
    duration_ms: u64,
    capacity: usize,
    archived: VecDeque<Candle>,
    live: Candle,
    elapsed_ms: u64,
    roll_armed: bool,
}

impl CandleChart {
    pub fn new(duration_ms: u64, capacity: usize, price: f64, now_ms: u64) -> Self {
        Self {
            duration_ms,
            capacity,
            archived: VecDeque::with_capacity(capacity),
            live: Candle::seeded(price, now_ms),
            elapsed_ms: 0,
            roll_armed: false,
        }
    }

    /// Arm exactly one extra boundary for the next `update`, regardless of
    /// elapsed time. Ownership of the decision stays with the caller.
    pub fn force_roll(&mut self) {
        self.roll_armed = true;
    }

    /// Feed the current price into the live candle, then close out as many
    /// boundaries as are due. Returns the number of candles archived.
    pub fn update(&mut self, dt_ms: u64, now_ms: u64, price: f64) -> u32 {
        self.live.high = self.live.high.max(price);
        self.live.low = self.live.low.min(price);
        self.live.close = price;
        self.elapsed_ms += dt_ms;

        let mut rolled = 0;
        loop {
            if self.roll_armed {
                self.archive_live(price, now_ms);
                self.elapsed_ms = 0;
                self.roll_armed = false;
            } else if self.elapsed_ms >= self.duration_ms {
                self.archive_live(price, now_ms);
                self.elapsed_ms -= self.duration_ms;
            } else {
                break;
            }
            rolled += 1;
        }
        rolled
    }

    fn archive_live(&mut self, price: f64, now_ms: u64) {
        if self.archived.len() == self.capacity {
            self.archived.pop_front();
        }
        self.archived.push_back(self.live);
        self.live = Candle::seeded(price, now_ms);
    }

    pub fn archived(&self) -> &VecDeque<Candle> {
        &self.archived
    }

    pub fn live(&self) -> &Candle {
        &self.live
    }

    /// Archived + the live candle (what the renderer draws).
    pub fn visible_count(&self) -> usize {
        self.archived.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> CandleChart {
        CandleChart::new(2_000, 5, 1.0, 0)
    }

    #[test]
    fn live_candle_tracks_extremes() {
        let mut c = chart();
        c.update(100, 100, 1.2);
        c.update(100, 200, 0.8);
        c.update(100, 300, 1.05);
        let live = c.live();
        assert_eq!(live.open, 1.0);
        assert_eq!(live.high, 1.2);
        assert_eq!(live.low, 0.8);
        assert_eq!(live.close, 1.05);
        assert!(live.is_well_formed());
    }

    #[test]
    fn time_roll_archives_and_reseeds() {
        let mut c = chart();
        c.update(1_900, 1_900, 1.3);
        assert!(c.archived().is_empty());
        let rolled = c.update(100, 2_000, 1.1);
        assert_eq!(rolled, 1);
        assert_eq!(c.archived().len(), 1);
        let closed = c.archived()[0];
        assert_eq!(closed.close, 1.1);
        assert!(closed.is_well_formed());
        // New live candle is flat at the roll price.
        let live = c.live();
        assert_eq!((live.open, live.high, live.low, live.close), (1.1, 1.1, 1.1, 1.1));
        assert_eq!(live.ts_open_ms, 2_000);
    }

    #[test]
    fn lagging_driver_catches_up_with_multiple_rolls() {
        let mut c = chart();
        // 7 candle-durations elapse in one update.
        let rolled = c.update(14_000, 14_000, 1.2);
        assert_eq!(rolled, 7);
        // Bounded ring kept only the newest 5.
        assert_eq!(c.archived().len(), 5);
    }

    #[test]
    fn fifo_eviction_drops_oldest_first() {
        let mut c = chart();
        for i in 1..=8u64 {
            c.update(2_000, i * 2_000, 1.0 + i as f64 * 0.1);
        }
        assert_eq!(c.archived().len(), 5);
        // Oldest survivor is the 4th candle ever archived.
        let closes: Vec<f64> = c.archived().iter().map(|k| k.close).collect();
        let expected: Vec<f64> = (4..=8u64).map(|i| 1.0 + i as f64 * 0.1).collect();
        assert_eq!(closes, expected);
    }

    #[test]
    fn force_roll_yields_exactly_one_extra_boundary() {
        let mut c = chart();
        c.update(300, 300, 1.05);
        c.force_roll();
        let rolled = c.update(10, 310, 1.06);
        assert_eq!(rolled, 1, "armed roll must close the live candle early");
        assert_eq!(c.archived().len(), 1);
        // Elapsed was reset, so the next boundary needs a full duration again.
        assert_eq!(c.update(1_990, 2_300, 1.07), 0);
        assert_eq!(c.update(10, 2_310, 1.07), 1);
    }

    #[test]
    fn force_roll_swallows_pending_time_roll() {
        let mut c = chart();
        c.force_roll();
        // Even with 2 durations of lag, the armed roll zeroes the clock: one
        // boundary, not three.
        let rolled = c.update(4_000, 4_000, 1.0);
        assert_eq!(rolled, 1);
    }

    #[test]
    fn ohlc_invariant_holds_across_a_noisy_run() {
        let mut c = CandleChart::new(500, 150, 1.0, 0);
        let mut price = 1.0f64;
        for i in 0..5_000u64 {
            // Deterministic zig-zag with drift, no RNG needed here.
            price = (price + if i % 3 == 0 { 0.04 } else { -0.017 }).max(0.01);
            c.update(100, i * 100, price);
            assert!(c.live().is_well_formed());
            assert!(c.archived().iter().all(Candle::is_well_formed));
            assert!(c.archived().len() <= 150);
        }
    }
}
