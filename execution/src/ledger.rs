//! Player balance and the append-only round history.

use bytes::Buf;
use commonware_codec::{Encode, Error, ReadRangeExt};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::debug;
use wager_types::casino::{SessionId, WagerRound};

/// Upper bound on rounds accepted from an exported history.
pub const MAX_EXPORTED_ROUNDS: usize = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("insufficient funds: need {needed}, have {available}")]
pub struct InsufficientFunds {
    pub needed: u64,
    pub available: u64,
}

/// Lifetime totals over recorded rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub rounds: u64,
    pub wagered: u128,
    pub paid: u128,
}

impl Totals {
    /// Paid over wagered, or `None` before the first stake.
    pub fn return_to_player(&self) -> Option<f64> {
        (self.wagered > 0).then(|| self.paid as f64 / self.wagered as f64)
    }
}

#[derive(Clone, Debug)]
pub struct Ledger {
    balance: u64,
    history: Vec<WagerRound>,
    index: HashMap<SessionId, usize>,
    totals: Totals,
}

impl Ledger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            balance: starting_balance,
            history: Vec::new(),
            index: HashMap::new(),
            totals: Totals::default(),
        }
    }

    /// Rebuild a ledger by applying `rounds` in order on top of
    /// `starting_balance`.
    pub fn replay(
        starting_balance: u64,
        rounds: impl IntoIterator<Item = WagerRound>,
    ) -> Result<Self, InsufficientFunds> {
        let mut ledger = Self::new(starting_balance);
        for round in rounds {
            ledger.debit(round.stake)?;
            ledger.credit(round.payout);
            ledger.record(round);
        }
        Ok(ledger)
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Remove `amount` from the balance, or fail leaving it untouched.
    pub fn debit(&mut self, amount: u64) -> Result<u64, InsufficientFunds> {
        let Some(remaining) = self.balance.checked_sub(amount) else {
            return Err(InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        };
        self.balance = remaining;
        debug!(amount, balance = self.balance, "debited");
        Ok(self.balance)
    }

    pub fn credit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        if amount > 0 {
            debug!(amount, balance = self.balance, "credited");
        }
        self.balance
    }

    /// Append a resolved round. Each session is recorded at most once;
    /// returns false for a repeat.
    pub fn record(&mut self, round: WagerRound) -> bool {
        if self.index.contains_key(&round.session_id) {
            debug!(session = round.session_id, "round already recorded");
            return false;
        }
        self.totals.rounds += 1;
        self.totals.wagered += round.stake as u128;
        self.totals.paid += round.payout as u128;
        self.index.insert(round.session_id, self.history.len());
        self.history.push(round);
        true
    }

    pub fn round(&self, session_id: SessionId) -> Option<&WagerRound> {
        self.index.get(&session_id).map(|i| &self.history[*i])
    }

    /// Up to `limit` rounds, most recent first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &WagerRound> {
        self.history.iter().rev().take(limit)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Encode the full history, oldest first.
    pub fn export(&self) -> Vec<u8> {
        self.history.encode().to_vec()
    }
}

/// Decode a history produced by [Ledger::export].
pub fn decode_history(mut buf: &[u8]) -> Result<Vec<WagerRound>, Error> {
    let rounds = Vec::<WagerRound>::read_range(&mut buf, 0..=MAX_EXPORTED_ROUNDS)?;
    if buf.has_remaining() {
        return Err(Error::ExtraData(buf.remaining()));
    }
    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wager_types::casino::{GameKind, Multiplier, Outcome, ResultTag};

    fn coinflip(session_id: SessionId, stake: u64, won: bool) -> WagerRound {
        use wager_types::casino::CoinSide;
        let multiplier = if won {
            Multiplier::from_hundredths(196)
        } else {
            Multiplier::ZERO
        };
        WagerRound::settle(
            session_id,
            GameKind::Coinflip,
            stake,
            multiplier,
            Outcome::Coinflip {
                choice: CoinSide::Heads,
                landed: if won { CoinSide::Heads } else { CoinSide::Tails },
            },
            session_id * 10,
        )
    }

    #[test]
    fn test_debit_and_credit() {
        let mut ledger = Ledger::new(1_000);
        assert_eq!(ledger.debit(400), Ok(600));
        assert_eq!(ledger.credit(50), 650);
        assert_eq!(
            ledger.debit(651),
            Err(InsufficientFunds {
                needed: 651,
                available: 650,
            })
        );
        assert_eq!(ledger.balance(), 650);
        assert_eq!(ledger.debit(650), Ok(0));
    }

    #[test]
    fn test_credit_saturates() {
        let mut ledger = Ledger::new(u64::MAX - 1);
        assert_eq!(ledger.credit(10), u64::MAX);
    }

    #[test]
    fn test_record_once() {
        let mut ledger = Ledger::new(1_000);
        assert!(ledger.record(coinflip(1, 100, true)));
        assert!(!ledger.record(coinflip(1, 100, false)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.round(1).unwrap().result, ResultTag::Win);
        assert!(ledger.round(2).is_none());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut ledger = Ledger::new(1_000);
        for id in 1..=5 {
            ledger.record(coinflip(id, 10, id % 2 == 0));
        }
        let ids: Vec<SessionId> = ledger.recent(3).map(|r| r.session_id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(ledger.recent(100).count(), 5);
        assert_eq!(ledger.recent(0).count(), 0);
    }

    #[test]
    fn test_totals() {
        let mut ledger = Ledger::new(1_000);
        assert_eq!(ledger.totals().return_to_player(), None);
        ledger.record(coinflip(1, 100, true));
        ledger.record(coinflip(2, 100, false));
        let totals = ledger.totals();
        assert_eq!(totals.rounds, 2);
        assert_eq!(totals.wagered, 200);
        assert_eq!(totals.paid, 196);
        assert_eq!(totals.return_to_player(), Some(0.98));
    }

    #[test]
    fn test_export_and_replay() {
        let mut ledger = Ledger::new(1_000);
        for (id, won) in [(1, true), (2, false), (3, true)] {
            let round = coinflip(id, 100, won);
            ledger.debit(round.stake).unwrap();
            ledger.credit(round.payout);
            ledger.record(round);
        }

        let rounds = decode_history(&ledger.export()).unwrap();
        assert_eq!(rounds.len(), 3);
        let replayed = Ledger::replay(1_000, rounds).unwrap();
        assert_eq!(replayed.balance(), ledger.balance());
        assert_eq!(replayed.totals(), ledger.totals());
        assert_eq!(replayed.round(2), ledger.round(2));
    }

    #[test]
    fn test_replay_rejects_overdraft() {
        let rounds = vec![coinflip(1, 600, false), coinflip(2, 600, false)];
        assert_eq!(
            Ledger::replay(1_000, rounds).unwrap_err(),
            InsufficientFunds {
                needed: 600,
                available: 400,
            }
        );
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut ledger = Ledger::new(1_000);
        ledger.record(coinflip(1, 100, true));
        let mut bytes = ledger.export();
        bytes.push(0);
        assert!(matches!(decode_history(&bytes), Err(Error::ExtraData(1))));
    }
}
