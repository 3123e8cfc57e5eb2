//! Three-reel slots.
//!
//! Every reel draws independently from the same weighted strip. Three of a
//! kind pays that symbol's triple; cherries on the first two reels with
//! anything else on the third pay the cherry pair.

use super::{
    payout::SlotTable, sample_weighted, Action, CasinoGame, GameError, GameResult, GameView,
    RandomSource, Rules, Settlement,
};
use wager_types::casino::{Multiplier, Outcome, SLOT_REELS};

/// Strip index of the cherry.
const CHERRY: u8 = 0;

/// Multiplier for a finished spin.
pub fn multiplier_for(table: &SlotTable, reels: &[u8; SLOT_REELS]) -> Multiplier {
    let [first, second, third] = *reels;
    if first == second && second == third {
        return table
            .symbols
            .get(first as usize)
            .map(|symbol| symbol.triple)
            .unwrap_or(Multiplier::ZERO);
    }
    if first == CHERRY && second == CHERRY && third != CHERRY {
        return table.cherry_pair;
    }
    Multiplier::ZERO
}

#[derive(Clone, Debug)]
pub struct Slots;

impl CasinoGame for Slots {
    type Params = ();

    fn validate(_params: &(), _stake: u64, rules: &Rules) -> Result<(), GameError> {
        if rules.payouts.slots.symbols.len() > u8::MAX as usize {
            return Err(GameError::InvalidDistribution);
        }
        Ok(())
    }

    fn init(
        _params: (),
        _stake: u64,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        Ok((Self, GameResult::Continue))
    }

    fn process_move(
        &mut self,
        action: Action,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        if action != Action::Spin {
            return Err(GameError::InvalidMove);
        }
        let table = &rules.payouts.slots;
        let mut reels = [0u8; SLOT_REELS];
        for reel in reels.iter_mut() {
            *reel = sample_weighted(rng, &table.symbols, |s| s.weight as u64)? as u8;
        }
        Ok(GameResult::Complete(Settlement::new(
            multiplier_for(table, &reels),
            Outcome::Slots { reels },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Slots
    }
}
