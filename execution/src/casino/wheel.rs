//! Weighted-segment games: roulette, wheel and jackpot.
//!
//! Each spin draws one segment with [sample_weighted] and pays that
//! segment's multiplier. Roulette pays only when the landed colour matches
//! the player's pick. In the jackpot every entry is a segment weighted by its
//! deposit; the player's stake is entry 0.
//!
//! Result tags follow the multiplier, not the draw. A jackpot won with a pot
//! so small that the raked share is below the stake pays under 1.00x and is
//! recorded as a loss, the same as a wheel segment paying 0.60x.

use super::{
    payout::{ColorSegment, Segment},
    sample_weighted, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules,
    Settlement,
};
use wager_types::casino::{Multiplier, Outcome, RouletteColor, MULTIPLIER_SCALE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouletteParams {
    pub choice: RouletteColor,
}

/// Roulette payout for `choice` when `landed` is drawn.
pub fn roulette_multiplier(choice: RouletteColor, landed: &ColorSegment) -> Multiplier {
    if landed.color == choice {
        landed.multiplier
    } else {
        Multiplier::ZERO
    }
}

/// Jackpot payout when the player's entry wins: the pot less the rake,
/// relative to the player's stake.
pub fn jackpot_multiplier(pot: u64, stake: u64, rake_percent: u8) -> Multiplier {
    if stake == 0 {
        return Multiplier::ZERO;
    }
    let keep = 100u128.saturating_sub(rake_percent as u128);
    let hundredths = pot as u128 * keep * MULTIPLIER_SCALE as u128 / (100 * stake as u128);
    Multiplier::from_hundredths(u64::try_from(hundredths).unwrap_or(u64::MAX))
}

fn spin(rng: &mut impl RandomSource, segments: &[Segment]) -> Result<usize, GameError> {
    sample_weighted(rng, segments, |s| s.weight as u64)
}

#[derive(Clone, Debug)]
pub struct Roulette {
    choice: RouletteColor,
}

impl CasinoGame for Roulette {
    type Params = RouletteParams;

    fn validate(params: &RouletteParams, _stake: u64, rules: &Rules) -> Result<(), GameError> {
        // A colour the table never lands on can only lose.
        if !rules
            .payouts
            .roulette
            .iter()
            .any(|s| s.color == params.choice && s.weight > 0)
        {
            return Err(GameError::InvalidParameters);
        }
        Ok(())
    }

    fn init(
        params: RouletteParams,
        _stake: u64,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        Ok((
            Self {
                choice: params.choice,
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
        if action != Action::Spin {
            return Err(GameError::InvalidMove);
        }
        let segments = &rules.payouts.roulette;
        let idx = sample_weighted(rng, segments, |s| s.weight as u64)?;
        let landed = &segments[idx];
        Ok(GameResult::Complete(Settlement::new(
            roulette_multiplier(self.choice, landed),
            Outcome::Roulette {
                choice: self.choice,
                landed: landed.color,
                segment: idx as u8,
            },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Roulette {
            choice: self.choice,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Wheel {
    segments: usize,
}

impl CasinoGame for Wheel {
    type Params = ();

    fn validate(_params: &(), _stake: u64, rules: &Rules) -> Result<(), GameError> {
        if rules.payouts.wheel.len() > u8::MAX as usize {
            return Err(GameError::InvalidDistribution);
        }
        Ok(())
    }

    fn init(
        _params: (),
        _stake: u64,
        rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        Ok((
            Self {
                segments: rules.payouts.wheel.len(),
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
        if action != Action::Spin {
            return Err(GameError::InvalidMove);
        }
        let segments = &rules.payouts.wheel;
        let idx = spin(rng, segments)?;
        Ok(GameResult::Complete(Settlement::new(
            segments[idx].multiplier,
            Outcome::Wheel { segment: idx as u8 },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Wheel {
            segments: self.segments,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Jackpot {
    /// Deposits in draw order; the player is entry 0.
    entries: Vec<u64>,
    pot: u64,
}

impl Jackpot {
    fn entries_for(stake: u64, rules: &Rules) -> Result<(Vec<u64>, u64), GameError> {
        let mut entries = Vec::with_capacity(rules.payouts.jackpot.house_entries.len() + 1);
        entries.push(stake);
        entries.extend_from_slice(&rules.payouts.jackpot.house_entries);
        let pot = entries
            .iter()
            .try_fold(0u64, |acc, deposit| acc.checked_add(*deposit))
            .ok_or(GameError::InvalidDistribution)?;
        Ok((entries, pot))
    }
}

impl CasinoGame for Jackpot {
    type Params = ();

    fn validate(_params: &(), stake: u64, rules: &Rules) -> Result<(), GameError> {
        Self::entries_for(stake, rules).map(|_| ())
    }

    fn init(
        _params: (),
        stake: u64,
        rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        let (entries, pot) = Self::entries_for(stake, rules)?;
        Ok((Self { entries, pot }, GameResult::Continue))
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
        let winner = sample_weighted(rng, &self.entries, |deposit| *deposit)?;
        let multiplier = if winner == 0 {
            jackpot_multiplier(self.pot, self.entries[0], rules.payouts.jackpot.rake_percent)
        } else {
            Multiplier::ZERO
        };
        Ok(GameResult::Complete(Settlement::new(
            multiplier,
            Outcome::Jackpot {
                pot: self.pot,
                entrants: self.entries.len() as u8,
                winner: winner as u8,
            },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Jackpot {
            pot: self.pot,
            entrants: self.entries.len(),
        }
    }
}
