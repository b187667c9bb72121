//! Autonomous bot traders.
//!
//! A fixed roster of agents, each independently paced, polled inline from the
//! shared tick loop — no timers, no threads. An agent whose schedule is due
//! draws a side from its bias, a size from its range, pushes the trade
//! through the price engine as a bot order, and reschedules itself.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::price::{PriceEngine, TradeSide};

#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: &'static str,
    /// Probability of buying; sells otherwise.
    pub buy_bias: f64,
    pub size_range: (f64, f64),
    pub pace_range_ms: (u64, u64),
}

/// Fixed roster. Biases and pacing shape the walk's personality: one slow
/// whale, fast small chasers on both sides, mid-size swing traders.
pub const AGENT_ROSTER: &[AgentProfile] = &[
    AgentProfile { name: "mina_whale", buy_bias: 0.50, size_range: (600.0, 2400.0), pace_range_ms: (6_000, 16_000) },
    AgentProfile { name: "fomo_felix", buy_bias: 0.85, size_range: (40.0, 260.0), pace_range_ms: (900, 2_600) },
    AgentProfile { name: "doom_dot", buy_bias: 0.15, size_range: (40.0, 260.0), pace_range_ms: (1_100, 3_000) },
    AgentProfile { name: "scalper_sol", buy_bias: 0.55, size_range: (120.0, 700.0), pace_range_ms: (1_500, 4_500) },
    AgentProfile { name: "grid_greta", buy_bias: 0.45, size_range: (120.0, 700.0), pace_range_ms: (1_500, 4_500) },
    AgentProfile { name: "degen_dex", buy_bias: 0.65, size_range: (200.0, 1_200.0), pace_range_ms: (2_500, 8_000) },
];

#[derive(Debug, Clone, Copy)]
pub struct Agent {
    pub profile: AgentProfile,
    /// 0 = not yet scheduled; first poll seeds the schedule without trading.
    pub next_trade_at_ms: u64,
}

/// A trade an agent pushed through the price engine, for logging.
#[derive(Debug, Clone, Copy)]
pub struct AgentTrade {
    pub agent: &'static str,
    pub side: TradeSide,
    pub amount: f64,
    pub price_after: f64,
}

pub struct AgentPool {
    rng: StdRng,
    agents: Vec<Agent>,
}

impl AgentPool {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            agents: AGENT_ROSTER
                .iter()
                .map(|p| Agent { profile: *p, next_trade_at_ms: 0 })
                .collect(),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Poll every agent once. Due agents trade through `price` (bot orders
    /// never force a candle roll) and reschedule. Returns executed trades in
    /// roster order.
    pub fn step(&mut self, now_ms: u64, price: &mut PriceEngine) -> Vec<AgentTrade> {
        let mut executed = Vec::new();
        for agent in self.agents.iter_mut() {
            if agent.next_trade_at_ms == 0 {
                let (lo, hi) = agent.profile.pace_range_ms;
                agent.next_trade_at_ms = now_ms + self.rng.gen_range(lo..=hi);
                continue;
            }
            if now_ms < agent.next_trade_at_ms {
                continue;
            }
            let side = if self.rng.gen_bool(agent.profile.buy_bias) {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            };
            let (min_size, max_size) = agent.profile.size_range;
            let amount = self.rng.gen_range(min_size..max_size);
            let applied = price.apply_trade(amount, side, true, now_ms);
            if applied.executed {
                executed.push(AgentTrade {
                    agent: agent.profile.name,
                    side,
                    amount,
                    price_after: applied.price,
                });
            }
            let (lo, hi) = agent.profile.pace_range_ms;
            agent.next_trade_at_ms = now_ms + self.rng.gen_range(lo..=hi);
        }
        executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Config;

    fn price_engine() -> PriceEngine {
        PriceEngine::new(Config::from_env(), 99)
    }

    #[test]
    fn first_poll_only_schedules() {
        let mut pool = AgentPool::new(5);
        let mut price = price_engine();
        let trades = pool.step(1_000, &mut price);
        assert!(trades.is_empty(), "no agent should trade on its first poll");
        for agent in pool.agents() {
            assert!(agent.next_trade_at_ms > 1_000);
        }
    }

    #[test]
    fn due_agents_trade_and_reschedule() {
        let mut pool = AgentPool::new(5);
        let mut price = price_engine();
        pool.step(0, &mut price);
        // Jump past every pace range: everyone is due.
        let trades = pool.step(20_000, &mut price);
        assert_eq!(trades.len(), AGENT_ROSTER.len());
        for agent in pool.agents() {
            assert!(agent.next_trade_at_ms > 20_000, "{} not rescheduled", agent.profile.name);
        }
        // Immediately after, nobody is due again.
        assert!(pool.step(20_001, &mut price).is_empty());
    }

    #[test]
    fn pool_is_deterministic_per_seed() {
        let run = |seed| {
            let mut pool = AgentPool::new(seed);
            let mut price = price_engine();
            let mut log = Vec::new();
            for step in 0..200u64 {
                for t in pool.step(step * 500, &mut price) {
                    log.push((t.agent, t.amount.to_bits(), t.price_after.to_bits()));
                }
            }
            log
        };
        assert_eq!(run(5), run(5));
        assert_ne!(run(5), run(6), "different seeds should diverge");
    }

    #[test]
    fn trade_sizes_respect_profile_ranges() {
        let mut pool = AgentPool::new(5);
        let mut price = price_engine();
        pool.step(0, &mut price);
        for step in 1..400u64 {
            for trade in pool.step(step * 1_000, &mut price) {
                let profile = AGENT_ROSTER.iter().find(|p| p.name == trade.agent).unwrap();
                assert!(trade.amount >= profile.size_range.0);
                assert!(trade.amount < profile.size_range.1);
            }
        }
    }
}
