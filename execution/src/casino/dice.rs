//! Dice: pick a target in `[2, 98]` and roll over or under it.
//!
//! The roll is drawn in hundredths, `floor(u × 10000)` in `[0.00, 99.99]`.
//! Under wins when `roll < target`, over wins when `roll ≥ target`, so each
//! direction wins with probability exactly `win_chance / 100`.

use super::{
    sample_uniform, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules,
    Settlement,
};
use wager_types::casino::{Direction, Multiplier, Outcome, MAX_DICE_TARGET, MIN_DICE_TARGET};

/// Return-to-player numerator: `multiplier = 98 / win_chance`.
const RETURN_PERCENT: u64 = 98;

/// Roll resolution in hundredths.
const ROLL_STEPS: u16 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiceParams {
    pub target: u8,
    pub direction: Direction,
}

/// Winning probability in whole percent. Targets above 100 count as 100.
pub(crate) fn win_chance(target: u8, direction: Direction) -> u64 {
    let target = (target as u64).min(100);
    match direction {
        Direction::Under => target,
        Direction::Over => 100 - target,
    }
}

/// `round(98 / win_chance, 2)`, half-up, in hundredths. A bet that cannot
/// win pays nothing.
pub(crate) fn multiplier_for(target: u8, direction: Direction) -> Multiplier {
    let chance = win_chance(target, direction);
    if chance == 0 {
        return Multiplier::ZERO;
    }
    let hundredths = (2 * RETURN_PERCENT * 100 + chance) / (2 * chance);
    Multiplier::from_hundredths(hundredths)
}

/// Whether `roll` (hundredths) wins.
pub fn is_win(target: u8, direction: Direction, roll: u16) -> bool {
    let line = target as u16 * 100;
    match direction {
        Direction::Under => roll < line,
        Direction::Over => roll >= line,
    }
}

#[derive(Clone, Debug)]
pub struct Dice {
    params: DiceParams,
}

impl CasinoGame for Dice {
    type Params = DiceParams;

    fn validate(params: &DiceParams, _stake: u64, _rules: &Rules) -> Result<(), GameError> {
        if !(MIN_DICE_TARGET..=MAX_DICE_TARGET).contains(&params.target) {
            return Err(GameError::InvalidParameters);
        }
        Ok(())
    }

    fn init(
        params: DiceParams,
        _stake: u64,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        Ok((Self { params }, GameResult::Continue))
    }

    fn process_move(
        &mut self,
        action: Action,
        _rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        if action != Action::Roll {
            return Err(GameError::InvalidMove);
        }

        let DiceParams { target, direction } = self.params;
        let roll = ((sample_uniform(rng) * ROLL_STEPS as f64) as u16).min(ROLL_STEPS - 1);
        let multiplier = if is_win(target, direction, roll) {
            multiplier_for(target, direction)
        } else {
            Multiplier::ZERO
        };

        Ok(GameResult::Complete(Settlement::new(
            multiplier,
            Outcome::Dice {
                target,
                direction,
                roll,
            },
        )))
    }

    fn view(&self) -> GameView {
        GameView::Dice {
            target: self.params.target,
            direction: self.params.direction,
            multiplier: multiplier_for(self.params.target, self.params.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casino::GameRng;
    use crate::mocks::{create_test_seed, FixedRandom};

    fn start(target: u8, direction: Direction) -> Dice {
        let params = DiceParams { target, direction };
        let rules = Rules::default();
        Dice::validate(&params, 100, &rules).unwrap();
        let mut rng = FixedRandom::from_units(&[0.0]);
        Dice::init(params, 100, &rules, &mut rng).unwrap().0
    }

    fn roll_with(dice: &mut Dice, unit: f64) -> Settlement {
        let mut rng = FixedRandom::from_units(&[unit]);
        match dice
            .process_move(Action::Roll, &Rules::default(), &mut rng)
            .unwrap()
        {
            GameResult::Complete(settlement) => settlement,
            GameResult::Continue => panic!("dice resolves in one roll"),
        }
    }

    #[test]
    fn test_multiplier_table() {
        assert_eq!(multiplier_for(50, Direction::Over).hundredths(), 196);
        assert_eq!(multiplier_for(50, Direction::Under).hundredths(), 196);
        // 98 / 3 = 32.666…
        assert_eq!(multiplier_for(3, Direction::Under).hundredths(), 3_267);
        // 98 / 98 = 1.00
        assert_eq!(multiplier_for(2, Direction::Over).hundredths(), 100);
        // 98 / 2 = 49.00
        assert_eq!(multiplier_for(98, Direction::Over).hundredths(), 4_900);
        // 98 / 8 = 12.25
        assert_eq!(multiplier_for(8, Direction::Under).hundredths(), 1_225);
    }

    #[test]
    fn test_out_of_range_targets_do_not_panic() {
        assert_eq!(win_chance(0, Direction::Under), 0);
        assert_eq!(multiplier_for(0, Direction::Under), Multiplier::ZERO);
        assert_eq!(win_chance(150, Direction::Over), 0);
        assert_eq!(multiplier_for(150, Direction::Over), Multiplier::ZERO);
        assert_eq!(multiplier_for(100, Direction::Over), Multiplier::ZERO);
        assert_eq!(win_chance(u8::MAX, Direction::Under), 100);
        assert_eq!(multiplier_for(u8::MAX, Direction::Under).hundredths(), 98);
    }

    #[test]
    fn test_every_target_has_an_edge() {
        for target in MIN_DICE_TARGET..=MAX_DICE_TARGET {
            for direction in [Direction::Under, Direction::Over] {
                let chance = win_chance(target, direction) as u128;
                let m = multiplier_for(target, direction).hundredths() as u128;
                assert!(chance * m < 100 * 100, "target {target} {direction:?}");
            }
        }
    }

    #[test]
    fn test_validate_target_range() {
        let rules = Rules::default();
        for target in [0, 1, 99, 100] {
            let params = DiceParams {
                target,
                direction: Direction::Under,
            };
            assert_eq!(
                Dice::validate(&params, 100, &rules),
                Err(GameError::InvalidParameters)
            );
        }
    }

    #[test]
    fn test_over_fifty_scenario() {
        let mut dice = start(50, Direction::Over);
        let settlement = roll_with(&mut dice, 0.515);
        assert_eq!(settlement.multiplier.hundredths(), 196);
        assert_eq!(settlement.multiplier.apply(100), 196);
        match settlement.outcome {
            Outcome::Dice { roll, .. } => assert_eq!(roll / 100, 51),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_boundaries() {
        assert!(is_win(50, Direction::Over, 5_000));
        assert!(!is_win(50, Direction::Over, 4_999));
        assert!(is_win(50, Direction::Under, 4_999));
        assert!(!is_win(50, Direction::Under, 5_000));
    }

    #[test]
    fn test_losing_roll() {
        let mut dice = start(30, Direction::Under);
        let settlement = roll_with(&mut dice, 0.75);
        assert_eq!(settlement.multiplier, Multiplier::ZERO);
    }

    #[test]
    fn test_wrong_action() {
        let mut dice = start(50, Direction::Over);
        let mut rng = FixedRandom::from_units(&[0.5]);
        assert_eq!(
            dice.process_move(Action::Hit, &Rules::default(), &mut rng),
            Err(GameError::InvalidMove)
        );
    }

    #[test]
    fn test_house_edge_convergence() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 3, 0);
        let rules = Rules::default();
        let stake = 1_000u64;
        let rounds = 1_000_000u64;
        let mut returned = 0u64;
        for _ in 0..rounds {
            let mut dice = Dice {
                params: DiceParams {
                    target: 50,
                    direction: Direction::Under,
                },
            };
            if let GameResult::Complete(s) = dice.process_move(Action::Roll, &rules, &mut rng).unwrap()
            {
                returned += s.multiplier.apply(stake);
            }
        }
        let ratio = returned as f64 / (stake * rounds) as f64;
        assert!(ratio < 1.0, "dice returned {ratio}");
        assert!((ratio - 0.98).abs() < 0.98 * 0.005, "dice returned {ratio}");
    }
}
