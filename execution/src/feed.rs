//! Outbound notifications of resolved rounds.

use tracing::info;
use wager_types::casino::WagerRound;

/// Receives every round the engine records, in order.
pub trait ActivityFeed {
    fn publish(&mut self, round: &WagerRound);
}

/// Drops every round.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFeed;

impl ActivityFeed for NoopFeed {
    fn publish(&mut self, _round: &WagerRound) {}
}

/// Logs every round at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFeed;

impl ActivityFeed for TracingFeed {
    fn publish(&mut self, round: &WagerRound) {
        info!(
            session = round.session_id,
            game = %round.game,
            stake = round.stake,
            payout = round.payout,
            multiplier = %round.multiplier,
            result = ?round.result,
            "round resolved"
        );
    }
}
