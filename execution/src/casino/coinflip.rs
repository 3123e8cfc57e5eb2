//! Coinflip: call a side, win the matched pot less the house rake.

use super::{
    sample_index, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules,
    Settlement,
};
use wager_types::casino::{CoinSide, Multiplier, Outcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoinflipParams {
    pub choice: CoinSide,
}

#[derive(Clone, Debug)]
pub struct Coinflip {
    choice: CoinSide,
}

impl CasinoGame for Coinflip {
    type Params = CoinflipParams;

    fn validate(_params: &CoinflipParams, _stake: u64, _rules: &Rules) -> Result<(), GameError> {
        Ok(())
    }

    fn init(
        params: CoinflipParams,
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
        if action != Action::Flip {
            return Err(GameError::InvalidMove);
        }
        let landed = match sample_index(rng, 2)? {
            0 => CoinSide::Heads,
            _ => CoinSide::Tails,
        };
        let multiplier = if landed == self.choice {
            rules.payouts.coinflip_multiplier()
        } else {
            Multiplier::ZERO
        };
        Ok(GameResult::Complete(Settlement::new(
            multiplier,
            Outcome::Coinflip {
                choice: self.choice,
                landed,
            },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Coinflip {
            choice: self.choice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FixedRandom;

    fn flip(choice: CoinSide, unit: f64) -> Settlement {
        let mut game = Coinflip { choice };
        let mut rng = FixedRandom::from_units(&[unit]);
        match game
            .process_move(Action::Flip, &Rules::default(), &mut rng)
            .unwrap()
        {
            GameResult::Complete(settlement) => settlement,
            GameResult::Continue => panic!("coinflip settles on flip"),
        }
    }

    #[test]
    fn test_winner_takes_pot_less_rake() {
        let settlement = flip(CoinSide::Heads, 0.25);
        assert_eq!(
            settlement.outcome,
            Outcome::Coinflip {
                choice: CoinSide::Heads,
                landed: CoinSide::Heads,
            }
        );
        assert_eq!(settlement.multiplier.apply(100), 196);
    }

    #[test]
    fn test_loser_gets_nothing() {
        let settlement = flip(CoinSide::Heads, 0.75);
        assert_eq!(settlement.multiplier, Multiplier::ZERO);
    }

    #[test]
    fn test_flip_only() {
        let mut game = Coinflip {
            choice: CoinSide::Tails,
        };
        let mut rng = FixedRandom::from_units(&[0.5]);
        assert_eq!(
            game.process_move(Action::Spin, &Rules::default(), &mut rng),
            Err(GameError::InvalidMove)
        );
    }
}
