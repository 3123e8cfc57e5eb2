//! Dragon's Throne: a run of dragon encounters toward the throne.
//!
//! Each encounter draws a dragon tier, then a fresh uniform roll decides the
//! fight against
//!
//! `win_chance = 55 + faction_bonus + min(power / 10, 15) − tier_penalty`
//!
//! percent. A win adds the tier's multiplier increment, throne progress and
//! power. A loss ends the run with nothing. Reaching 100% progress ends the
//! run at once and doubles the multiplier. Otherwise the player may cash out
//! after any win.

use super::{
    sample_uniform, sample_weighted, Action, CasinoGame, GameError, GameResult, GameView,
    RandomSource, Rules, Settlement,
};
use wager_types::casino::{DragonTier, Encounter, Faction, Multiplier, Outcome, MAX_ENCOUNTERS};

const BASE_CHANCE: u8 = 55;
const POWER_BONUS_CAP: u32 = 15;
const THRONE_PROGRESS: u8 = 100;
const THRONE_FACTOR: u64 = 2;

/// Per-tier tables, indexed by `DragonTier as usize`.
const TIER_WEIGHTS: [u64; 4] = [40, 30, 20, 10];
const TIER_PENALTY: [u8; 4] = [0, 5, 12, 20];
const TIER_INCREMENT: [u64; 4] = [20, 40, 80, 150];
const TIER_PROGRESS: [u8; 4] = [10, 15, 25, 40];
const TIER_POWER: [u32; 4] = [10, 20, 40, 80];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThroneParams {
    pub faction: Faction,
}

pub fn faction_bonus(faction: Faction) -> u8 {
    match faction {
        Faction::Ember => 5,
        Faction::Frost => 3,
    }
}

/// Power gained from beating `tier`. Frost doubles every gain.
pub fn power_gain(faction: Faction, tier: DragonTier) -> u32 {
    let base = TIER_POWER[tier as usize];
    match faction {
        Faction::Ember => base,
        Faction::Frost => base * 2,
    }
}

/// Win chance in whole percent.
pub fn win_chance(faction: Faction, power: u32, tier: DragonTier) -> u8 {
    let power_bonus = (power / 10).min(POWER_BONUS_CAP) as u8;
    BASE_CHANCE + faction_bonus(faction) + power_bonus - TIER_PENALTY[tier as usize]
}

#[derive(Clone, Debug)]
pub struct DragonsThrone {
    faction: Faction,
    multiplier: Multiplier,
    power: u32,
    progress: u8,
    encounters: Vec<Encounter>,
}

impl DragonsThrone {
    pub fn multiplier(&self) -> Multiplier {
        self.multiplier
    }

    fn outcome(&self, throne: bool) -> Outcome {
        Outcome::DragonsThrone {
            faction: self.faction,
            encounters: self.encounters.clone(),
            progress: self.progress,
            throne,
        }
    }

    fn fight(&mut self, rng: &mut impl RandomSource) -> Result<GameResult, GameError> {
        if self.encounters.len() >= MAX_ENCOUNTERS {
            return Err(GameError::InvalidState);
        }

        let tier = DragonTier::ALL[sample_weighted(rng, &TIER_WEIGHTS, |w| *w)?];
        let chance = win_chance(self.faction, self.power, tier);
        let won = sample_uniform(rng) * 100.0 < chance as f64;
        self.encounters.push(Encounter {
            tier,
            win_chance: chance,
            won,
        });
        if !won {
            return Ok(GameResult::Complete(Settlement::lose(self.outcome(false))));
        }

        let idx = tier as usize;
        self.multiplier = self
            .multiplier
            .saturating_add(Multiplier::from_hundredths(TIER_INCREMENT[idx]));
        self.progress = (self.progress + TIER_PROGRESS[idx]).min(THRONE_PROGRESS);
        self.power += power_gain(self.faction, tier);

        if self.progress == THRONE_PROGRESS {
            return Ok(GameResult::Complete(Settlement::new(
                self.multiplier.saturating_scale(THRONE_FACTOR),
                self.outcome(true),
            )));
        }
        Ok(GameResult::Continue)
    }
}

impl CasinoGame for DragonsThrone {
    type Params = ThroneParams;

    fn validate(_params: &ThroneParams, _stake: u64, _rules: &Rules) -> Result<(), GameError> {
        Ok(())
    }

    fn init(
        params: ThroneParams,
        _stake: u64,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        Ok((
            Self {
                faction: params.faction,
                multiplier: Multiplier::ONE,
                power: 0,
                progress: 0,
                encounters: Vec::new(),
            },
            GameResult::Continue,
        ))
    }

    fn process_move(
        &mut self,
        action: Action,
        _rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        match action {
            Action::Fight => self.fight(rng),
            Action::CashOut => {
                // Every recorded encounter of a live run was won.
                if self.encounters.is_empty() {
                    return Err(GameError::InvalidMove);
                }
                Ok(GameResult::Complete(Settlement::new(
                    self.multiplier,
                    self.outcome(false),
                )))
            }
            _ => Err(GameError::InvalidMove),
        }
    }

    fn view(&self) -> GameView {
        GameView::DragonsThrone {
            faction: self.faction,
            multiplier: self.multiplier,
            power: self.power,
            progress: self.progress,
            encounters: self.encounters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casino::GameRng;
    use crate::mocks::{create_test_seed, FixedRandom};

    fn start(faction: Faction) -> DragonsThrone {
        let mut rng = FixedRandom::from_units(&[0.0]);
        DragonsThrone::init(ThroneParams { faction }, 100, &Rules::default(), &mut rng)
            .unwrap()
            .0
    }

    fn act(game: &mut DragonsThrone, action: Action, units: &[f64]) -> GameResult {
        let mut rng = FixedRandom::from_units(units);
        game.process_move(action, &Rules::default(), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_win_chance_formula() {
        assert_eq!(win_chance(Faction::Ember, 0, DragonTier::Whelp), 60);
        assert_eq!(win_chance(Faction::Frost, 0, DragonTier::Elder), 38);
        assert_eq!(win_chance(Faction::Ember, 85, DragonTier::Drake), 63);
        // Power bonus caps at 15.
        assert_eq!(win_chance(Faction::Ember, 10_000, DragonTier::Whelp), 75);
    }

    #[test]
    fn test_win_then_cash_out() {
        let mut game = start(Faction::Ember);
        // Whelp (first 40%), roll 50 < 60.
        assert_eq!(act(&mut game, Action::Fight, &[0.1, 0.5]), GameResult::Continue);
        assert_eq!(game.multiplier(), Multiplier::from_hundredths(120));
        assert_eq!(game.power, 10);
        assert_eq!(game.progress, 10);

        match act(&mut game, Action::CashOut, &[0.0]) {
            GameResult::Complete(settlement) => {
                assert_eq!(settlement.multiplier.apply(100), 120);
            }
            GameResult::Continue => panic!("cash out must settle"),
        }
    }

    #[test]
    fn test_cash_out_needs_a_win() {
        let mut game = start(Faction::Frost);
        let mut rng = FixedRandom::from_units(&[0.0]);
        assert_eq!(
            game.process_move(Action::CashOut, &Rules::default(), &mut rng),
            Err(GameError::InvalidMove)
        );
    }

    #[test]
    fn test_lost_encounter_pays_nothing() {
        let mut game = start(Faction::Ember);
        match act(&mut game, Action::Fight, &[0.1, 0.99]) {
            GameResult::Complete(settlement) => {
                assert_eq!(settlement.multiplier, Multiplier::ZERO);
                assert_eq!(
                    settlement.outcome,
                    Outcome::DragonsThrone {
                        faction: Faction::Ember,
                        encounters: vec![Encounter {
                            tier: DragonTier::Whelp,
                            win_chance: 60,
                            won: false,
                        }],
                        progress: 0,
                        throne: false,
                    }
                );
            }
            GameResult::Continue => panic!("a loss must settle"),
        }
    }

    #[test]
    fn test_frost_doubles_power() {
        let mut game = start(Faction::Frost);
        act(&mut game, Action::Fight, &[0.1, 0.0]);
        assert_eq!(game.power, 20);
        // Drake (40%..70%): 55 + 3 + 2 - 5.
        act(&mut game, Action::Fight, &[0.5, 0.0]);
        assert_eq!(game.encounters[1].win_chance, 55);
    }

    #[test]
    fn test_throne_doubles_multiplier() {
        let mut game = start(Faction::Ember);
        // Elder (last 10%) with a low roll every time: +40% progress each.
        assert_eq!(act(&mut game, Action::Fight, &[0.95, 0.1]), GameResult::Continue);
        assert_eq!(act(&mut game, Action::Fight, &[0.95, 0.1]), GameResult::Continue);
        match act(&mut game, Action::Fight, &[0.95, 0.1]) {
            GameResult::Complete(settlement) => {
                // (1.00 + 3 × 1.50) × 2
                assert_eq!(settlement.multiplier.hundredths(), 1_100);
                match settlement.outcome {
                    Outcome::DragonsThrone {
                        progress, throne, ..
                    } => {
                        assert_eq!(progress, 100);
                        assert!(throne);
                    }
                    other => panic!("unexpected outcome {other:?}"),
                }
            }
            GameResult::Continue => panic!("the throne ends the run"),
        }
    }

    fn first_win_return(faction: Faction) -> f64 {
        DragonTier::ALL
            .iter()
            .map(|&tier| {
                let p = TIER_WEIGHTS[tier as usize] as f64 / 100.0;
                let chance = win_chance(faction, 0, tier) as f64 / 100.0;
                let paid = 1.0 + TIER_INCREMENT[tier as usize] as f64 / 100.0;
                p * chance * paid
            })
            .sum()
    }

    #[test]
    fn test_first_win_strategy_has_an_edge() {
        let seed = create_test_seed();
        let rules = Rules::default();
        for faction in [Faction::Ember, Faction::Frost] {
            let expected = first_win_return(faction);
            assert!(expected < 1.0);

            let rounds = 200_000u64;
            let mut returned = 0u64;
            for session in 0..rounds {
                let mut rng = GameRng::new(&seed, session, 0);
                let (mut game, _) =
                    DragonsThrone::init(ThroneParams { faction }, 100, &rules, &mut rng).unwrap();
                let mut result = game.process_move(Action::Fight, &rules, &mut rng).unwrap();
                if result == GameResult::Continue {
                    result = game.process_move(Action::CashOut, &rules, &mut rng).unwrap();
                }
                if let GameResult::Complete(settlement) = result {
                    returned += settlement.multiplier.hundredths();
                }
            }
            let ratio = returned as f64 / (rounds as f64 * 100.0);
            assert!(ratio < 1.0, "{faction:?} returned {ratio}");
            assert!(
                (ratio - expected).abs() < 0.01,
                "{faction:?} returned {ratio}, expected {expected}"
            );
        }
    }
}
