//! Synthetic market arena core for an idle-game economy.
//!
//! One periodic callback drives everything: price ticks, bot polling, candle
//! aggregation and directive evaluation run synchronously on a single thread.
//! Mutation order inside a tick is load-bearing (agents act before organic
//! drift; the live candle observes the post-agent, post-drift price), so
//! correctness depends on ordering, not locking.
//!
//! The crate is a library, not a service. The session/application root owns
//! one [`engine::ArenaEngine`] and passes it by handle to consuming views.

pub mod agents;
pub mod camera;
pub mod candles;
pub mod directives;
pub mod engine;
pub mod logging;
pub mod price;
pub mod stability;
pub mod state;
