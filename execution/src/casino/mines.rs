//! Mines: uncover cells on a 5×5 grid without hitting a mine.
//!
//! Mines are placed once at start. After `k` safe reveals the survival
//! probability is `raw = Π_{i<k} (safe − i) / (25 − i)` and cashing out pays
//! `max(1, round(0.97 / raw, 2))`. The formula is evaluated exactly as
//! `Π(25 − i) × 97 / Π(safe − i)` hundredths, rounded half-up.

use super::{
    sample_distinct, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules,
    Settlement,
};
use wager_types::casino::{Multiplier, Outcome, GRID_CELLS, MAX_MINES, MIN_MINES};

/// Return-to-player, in percent.
const RETURN_PERCENT: u128 = 97;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinesParams {
    pub mines: u8,
}

/// Cash-out multiplier after `revealed` safe cells with `mines` on the grid.
pub fn multiplier_for(mines: u8, revealed: u8) -> Multiplier {
    let safe = (GRID_CELLS - mines) as u128;
    let mut numerator = RETURN_PERCENT;
    let mut denominator = 1u128;
    for i in 0..revealed as u128 {
        numerator *= GRID_CELLS as u128 - i;
        denominator *= safe - i;
    }
    let hundredths = (2 * numerator + denominator) / (2 * denominator);
    Multiplier::from_hundredths((hundredths as u64).max(Multiplier::ONE.hundredths()))
}

#[derive(Clone, Debug)]
pub struct Mines {
    mines: u8,
    mine_cells: Vec<u8>,
    revealed: Vec<u8>,
}

impl Mines {
    fn safe_cells(&self) -> u8 {
        GRID_CELLS - self.mines
    }

    fn outcome(&self, hit: Option<u8>) -> Outcome {
        Outcome::Mines {
            mines: self.mines,
            revealed: self.revealed.clone(),
            mine_cells: self.mine_cells.clone(),
            hit,
        }
    }

    fn reveal(&mut self, cell: u8) -> Result<GameResult, GameError> {
        if cell >= GRID_CELLS {
            return Err(GameError::InvalidMove);
        }
        if self.revealed.contains(&cell) {
            return Ok(GameResult::Continue);
        }
        if self.mine_cells.contains(&cell) {
            return Ok(GameResult::Complete(Settlement::lose(
                self.outcome(Some(cell)),
            )));
        }

        self.revealed.push(cell);
        let found = self.revealed.len() as u8;
        if found == self.safe_cells() {
            return Ok(GameResult::Complete(Settlement::new(
                multiplier_for(self.mines, found),
                self.outcome(None),
            )));
        }
        Ok(GameResult::Continue)
    }
}

impl CasinoGame for Mines {
    type Params = MinesParams;

    fn validate(params: &MinesParams, _stake: u64, _rules: &Rules) -> Result<(), GameError> {
        if !(MIN_MINES..=MAX_MINES).contains(&params.mines) {
            return Err(GameError::InvalidParameters);
        }
        Ok(())
    }

    fn init(
        params: MinesParams,
        _stake: u64,
        _rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        let mine_cells = sample_distinct(rng, params.mines as usize, GRID_CELLS)?;
        Ok((
            Self {
                mines: params.mines,
                mine_cells,
                revealed: Vec::new(),
            },
            GameResult::Continue,
        ))
    }

    fn process_move(
        &mut self,
        action: Action,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        match action {
            Action::Reveal(cell) => self.reveal(cell),
            Action::CashOut => {
                if self.revealed.is_empty() {
                    return Err(GameError::InvalidMove);
                }
                Ok(GameResult::Complete(Settlement::new(
                    multiplier_for(self.mines, self.revealed.len() as u8),
                    self.outcome(None),
                )))
            }
            _ => Err(GameError::InvalidMove),
        }
    }

    fn view(&self) -> GameView {
        let found = self.revealed.len() as u8;
        let multiplier = if found == 0 {
            Multiplier::ONE
        } else {
            multiplier_for(self.mines, found)
        };
        let next_multiplier =
            (found < self.safe_cells()).then(|| multiplier_for(self.mines, found + 1));
        GameView::Mines {
            mines: self.mines,
            revealed: self.revealed.clone(),
            multiplier,
            next_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FixedRandom;

    fn with_mines(mine_cells: &[u8]) -> Mines {
        Mines {
            mines: mine_cells.len() as u8,
            mine_cells: mine_cells.to_vec(),
            revealed: Vec::new(),
        }
    }

    fn act(game: &mut Mines, action: Action) -> Result<GameResult, GameError> {
        let mut rng = FixedRandom::from_units(&[0.0]);
        game.process_move(action, &Rules::default(), &mut rng)
    }

    #[test]
    fn test_five_mines_one_reveal() {
        // 25 × 0.97 / 20 = 1.2125
        assert_eq!(multiplier_for(5, 1).hundredths(), 121);
    }

    #[test]
    fn test_known_values() {
        // 25 × 0.97 / 24 = 1.0104
        assert_eq!(multiplier_for(1, 1).hundredths(), 101);
        // Single safe cell: 25 × 0.97
        assert_eq!(multiplier_for(24, 1).hundredths(), 2_425);
        // 25 × 24 × 0.97 / (20 × 19) = 1.5315…
        assert_eq!(multiplier_for(5, 2).hundredths(), 153);
    }

    #[test]
    fn test_monotonic_for_every_mine_count() {
        for mines in MIN_MINES..=MAX_MINES {
            let safe = GRID_CELLS - mines;
            let mut previous = Multiplier::ZERO;
            for k in 1..=safe {
                let current = multiplier_for(mines, k);
                assert!(current > previous, "mines {mines}, reveal {k}");
                assert!(current >= Multiplier::ONE);
                previous = current;
            }
        }
    }

    #[test]
    fn test_reveal_then_cash_out() {
        let mut game = with_mines(&[0, 1, 2, 3, 4]);
        assert_eq!(act(&mut game, Action::Reveal(10)), Ok(GameResult::Continue));
        match act(&mut game, Action::CashOut).unwrap() {
            GameResult::Complete(settlement) => {
                assert_eq!(settlement.multiplier.hundredths(), 121);
                assert_eq!(settlement.multiplier.apply(100), 121);
            }
            GameResult::Continue => panic!("cash out must settle"),
        }
    }

    #[test]
    fn test_hit_mine_loses() {
        let mut game = with_mines(&[7]);
        act(&mut game, Action::Reveal(3)).unwrap();
        match act(&mut game, Action::Reveal(7)).unwrap() {
            GameResult::Complete(settlement) => {
                assert_eq!(settlement.multiplier, Multiplier::ZERO);
                assert_eq!(
                    settlement.outcome,
                    Outcome::Mines {
                        mines: 1,
                        revealed: vec![3],
                        mine_cells: vec![7],
                        hit: Some(7),
                    }
                );
            }
            GameResult::Continue => panic!("mine must settle"),
        }
    }

    #[test]
    fn test_repeat_reveal_is_noop() {
        let mut game = with_mines(&[0]);
        act(&mut game, Action::Reveal(5)).unwrap();
        assert_eq!(act(&mut game, Action::Reveal(5)), Ok(GameResult::Continue));
        assert_eq!(game.revealed, vec![5]);
    }

    #[test]
    fn test_cash_out_needs_a_reveal() {
        let mut game = with_mines(&[0]);
        assert_eq!(act(&mut game, Action::CashOut), Err(GameError::InvalidMove));
        assert_eq!(act(&mut game, Action::Reveal(25)), Err(GameError::InvalidMove));
        assert_eq!(act(&mut game, Action::Spin), Err(GameError::InvalidMove));
    }

    #[test]
    fn test_clearing_the_grid_auto_wins() {
        let mines: Vec<u8> = (2..25).collect();
        let mut game = with_mines(&mines);
        assert_eq!(act(&mut game, Action::Reveal(0)), Ok(GameResult::Continue));
        match act(&mut game, Action::Reveal(1)).unwrap() {
            GameResult::Complete(settlement) => {
                assert_eq!(settlement.multiplier, multiplier_for(23, 2));
            }
            GameResult::Continue => panic!("last safe cell must settle"),
        }
    }

    #[test]
    fn test_init_places_mines() {
        let rules = Rules::default();
        let params = MinesParams { mines: 24 };
        Mines::validate(&params, 10, &rules).unwrap();
        let mut rng = FixedRandom::from_units(&[0.3, 0.7, 0.1]);
        let (game, result) = Mines::init(params, 10, &rules, &mut rng).unwrap();
        assert_eq!(result, GameResult::Continue);
        assert_eq!(game.mine_cells.len(), 24);

        for mines in [0, 25] {
            assert_eq!(
                Mines::validate(&MinesParams { mines }, 10, &rules),
                Err(GameError::InvalidParameters)
            );
        }
    }

    #[test]
    fn test_view_hides_mines() {
        let mut game = with_mines(&[0, 1, 2, 3, 4]);
        act(&mut game, Action::Reveal(9)).unwrap();
        assert_eq!(
            game.view(),
            GameView::Mines {
                mines: 5,
                revealed: vec![9],
                multiplier: Multiplier::from_hundredths(121),
                next_multiplier: Some(multiplier_for(5, 2)),
            }
        );
    }
}
