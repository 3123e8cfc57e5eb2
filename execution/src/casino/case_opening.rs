//! Case opening: buy a case at its tier price and draw one loot item.
//!
//! The item is drawn exactly once. The animated reveal strip is derived from
//! the drawn item alone, so showing it never consumes randomness.

use super::{
    payout::CaseTable, sample_weighted, Action, CasinoGame, GameError, GameResult, GameView,
    RandomSource, Rules, Settlement,
};
use wager_types::casino::{CaseTier, Outcome};

/// Step between filler items on the reveal strip.
const FILLER_STRIDE: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaseParams {
    pub tier: CaseTier,
}

/// Slot of the strip where the drawn item stops.
pub fn winning_slot(len: usize) -> usize {
    len.saturating_sub(1) * 3 / 4
}

/// Item indices shown on a reveal strip of `len` slots. The drawn item sits
/// at [winning_slot]; every other slot cycles through the table.
pub fn reveal_strip(case: &CaseTable, item: u8, len: usize) -> Vec<u8> {
    let items = case.items.len().max(1);
    let stop = winning_slot(len);
    (0..len)
        .map(|slot| {
            if slot == stop {
                item
            } else {
                ((slot * FILLER_STRIDE + item as usize) % items) as u8
            }
        })
        .collect()
}

fn table(rules: &Rules, tier: CaseTier) -> Result<&CaseTable, GameError> {
    rules
        .payouts
        .case(tier)
        .ok_or(GameError::InvalidParameters)
}

#[derive(Clone, Debug)]
pub struct CaseOpening {
    tier: CaseTier,
    price: u64,
}

impl CasinoGame for CaseOpening {
    type Params = CaseParams;

    fn validate(params: &CaseParams, stake: u64, rules: &Rules) -> Result<(), GameError> {
        let case = table(rules, params.tier)?;
        if case.items.len() > u8::MAX as usize {
            return Err(GameError::InvalidDistribution);
        }
        if stake != case.price {
            return Err(GameError::InvalidStake);
        }
        Ok(())
    }

    fn init(
        params: CaseParams,
        _stake: u64,
        rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        let case = table(rules, params.tier)?;
        Ok((
            Self {
                tier: params.tier,
                price: case.price,
            },
            GameResult::Continue,
        ))
    }

    fn process_move(
        &mut self,
        action: Action,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        if action != Action::Open {
            return Err(GameError::InvalidMove);
        }
        let case = table(rules, self.tier)?;
        let item = sample_weighted(rng, &case.items, |i| i.weight as u64)?;
        Ok(GameResult::Complete(Settlement::new(
            case.items[item].value,
            Outcome::CaseOpening {
                tier: self.tier,
                item: item as u8,
            },
        )))
    }

    fn view(&self) -> GameView {
        GameView::CaseOpening {
            tier: self.tier,
            price: self.price,
        }
    }
}
