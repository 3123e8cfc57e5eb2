//! Payout tables.
//!
//! Closed-form games (dice, mines, crash, blackjack, Dragon's Throne) keep
//! their formulas next to their state machines. Everything table-driven lives
//! here, is loaded from configuration, and can be checked exactly: every
//! expected multiplier is a rational computed in `u128`.

use serde::{Deserialize, Serialize};
use std::fmt;
use wager_types::casino::{CaseTier, Multiplier, RouletteColor, MAX_JACKPOT_ENTRANTS};

use super::{distribution::total_weight, GameError};

/// Wheel segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub weight: u32,
    pub multiplier: Multiplier,
}

/// Roulette segment; pays only when the player picked its colour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSegment {
    pub color: RouletteColor,
    pub weight: u32,
    pub multiplier: Multiplier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSymbol {
    pub name: String,
    pub weight: u32,
    /// Pay for three of this symbol.
    pub triple: Multiplier,
}

/// One strip shared by all three reels. The first symbol is the cherry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    pub symbols: Vec<SlotSymbol>,
    /// Pay for cherries on reels one and two when reel three differs.
    pub cherry_pair: Multiplier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    pub name: String,
    pub weight: u32,
    /// Item value as a multiple of the case price.
    pub value: Multiplier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTable {
    pub tier: CaseTier,
    pub price: u64,
    pub items: Vec<LootItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackpotTable {
    /// Deposits the house places alongside the player.
    pub house_entries: Vec<u64>,
    /// Share of the pot kept by the house, in percent.
    pub rake_percent: u8,
}

/// Every table-driven payout in the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTable {
    #[serde(default = "default_wheel")]
    pub wheel: Vec<Segment>,
    #[serde(default = "default_roulette")]
    pub roulette: Vec<ColorSegment>,
    #[serde(default = "default_slots")]
    pub slots: SlotTable,
    #[serde(default = "default_cases")]
    pub cases: Vec<CaseTable>,
    /// Share of a coinflip pot kept by the house, in percent.
    #[serde(default = "default_coinflip_rake")]
    pub coinflip_rake_percent: u8,
    #[serde(default = "default_jackpot")]
    pub jackpot: JackpotTable,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            wheel: default_wheel(),
            roulette: default_roulette(),
            slots: default_slots(),
            cases: default_cases(),
            coinflip_rake_percent: default_coinflip_rake(),
            jackpot: default_jackpot(),
        }
    }
}

const WHEEL_WEIGHTS: [u32; 16] = [15, 25, 15, 25, 5, 25, 15, 25, 2, 25, 15, 25, 1, 25, 15, 25];

/// Multiplier (hundredths) carried by each wheel weight class.
fn wheel_multiplier(weight: u32) -> u64 {
    match weight {
        25 => 60,
        15 => 160,
        5 => 300,
        2 => 500,
        _ => 1_000,
    }
}

fn default_wheel() -> Vec<Segment> {
    WHEEL_WEIGHTS
        .iter()
        .map(|&weight| Segment {
            weight,
            multiplier: Multiplier::from_hundredths(wheel_multiplier(weight)),
        })
        .collect()
}

fn default_roulette() -> Vec<ColorSegment> {
    vec![
        ColorSegment {
            color: RouletteColor::Red,
            weight: 7,
            multiplier: Multiplier::from_whole(2),
        },
        ColorSegment {
            color: RouletteColor::Black,
            weight: 7,
            multiplier: Multiplier::from_whole(2),
        },
        ColorSegment {
            color: RouletteColor::Green,
            weight: 1,
            multiplier: Multiplier::from_whole(14),
        },
    ]
}

fn default_slots() -> SlotTable {
    let symbol = |name: &str, weight, triple| SlotSymbol {
        name: name.to_string(),
        weight,
        triple: Multiplier::from_whole(triple),
    };
    SlotTable {
        symbols: vec![
            symbol("cherry", 30, 5),
            symbol("lemon", 25, 10),
            symbol("bell", 20, 20),
            symbol("bar", 15, 60),
            symbol("seven", 8, 300),
            symbol("diamond", 2, 2_500),
        ],
        cherry_pair: Multiplier::from_whole(2),
    }
}

fn loot(items: &[(&str, u32, u64)]) -> Vec<LootItem> {
    items
        .iter()
        .map(|&(name, weight, value)| LootItem {
            name: name.to_string(),
            weight,
            value: Multiplier::from_hundredths(value),
        })
        .collect()
}

fn default_cases() -> Vec<CaseTable> {
    vec![
        CaseTable {
            tier: CaseTier::Bronze,
            price: 100,
            items: loot(&[
                ("Rusty Dagger", 4_000, 20),
                ("Iron Shield", 3_000, 60),
                ("Steel Blade", 1_800, 120),
                ("Mithril Helm", 900, 250),
                ("Dragon Scale", 250, 600),
                ("Crown of Ages", 50, 2_500),
            ]),
        },
        CaseTable {
            tier: CaseTier::Silver,
            price: 500,
            items: loot(&[
                ("Silver Ring", 5_000, 30),
                ("Enchanted Bow", 2_800, 80),
                ("Phoenix Feather", 1_500, 150),
                ("Void Shard", 600, 300),
                ("Titan Gauntlet", 90, 1_200),
                ("Starforged Crown", 10, 8_000),
            ]),
        },
        CaseTable {
            tier: CaseTier::Gold,
            price: 2_500,
            items: loot(&[
                ("Gilded Chalice", 5_500, 20),
                ("Runed Axe", 2_500, 80),
                ("Archmage Staff", 1_400, 150),
                ("Celestial Orb", 500, 400),
                ("Eternal Flame", 90, 1_500),
                ("Throne Relic", 10, 10_000),
            ]),
        },
    ]
}

fn default_coinflip_rake() -> u8 {
    2
}

fn default_jackpot() -> JackpotTable {
    JackpotTable {
        house_entries: vec![500, 1_500, 3_000],
        rake_percent: 5,
    }
}

/// Exact expected multiplier `numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpectedValue {
    pub numerator: u128,
    pub denominator: u128,
}

impl ExpectedValue {
    /// From a sum of `weight × hundredths` over a total weight.
    fn from_hundredths(weighted: u128, total: u128) -> Self {
        Self {
            numerator: weighted,
            denominator: total * 100,
        }
    }

    pub fn below_one(&self) -> bool {
        self.numerator < self.denominator
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}", self.as_f64())
    }
}

fn weighted_sum<T>(
    entries: &[T],
    weight_of: impl Fn(&T) -> u64,
    hundredths_of: impl Fn(&T) -> u64,
) -> u128 {
    entries
        .iter()
        .map(|e| weight_of(e) as u128 * hundredths_of(e) as u128)
        .sum()
}

impl PayoutTable {
    pub fn case(&self, tier: CaseTier) -> Option<&CaseTable> {
        self.cases.iter().find(|case| case.tier == tier)
    }

    /// Multiplier paid to a coinflip winner.
    pub fn coinflip_multiplier(&self) -> Multiplier {
        Multiplier::from_hundredths(2 * 100u64.saturating_sub(self.coinflip_rake_percent as u64))
    }

    pub fn wheel_ev(&self) -> Result<ExpectedValue, GameError> {
        let total = total_weight(&self.wheel, |s| s.weight as u64)?;
        let weighted = weighted_sum(&self.wheel, |s| s.weight as u64, |s| s.multiplier.hundredths());
        Ok(ExpectedValue::from_hundredths(weighted, total as u128))
    }

    /// Expected multiplier when the player picks `choice`.
    pub fn roulette_ev(&self, choice: RouletteColor) -> Result<ExpectedValue, GameError> {
        let total = total_weight(&self.roulette, |s| s.weight as u64)?;
        let weighted = weighted_sum(
            &self.roulette,
            |s| s.weight as u64,
            |s| {
                if s.color == choice {
                    s.multiplier.hundredths()
                } else {
                    0
                }
            },
        );
        Ok(ExpectedValue::from_hundredths(weighted, total as u128))
    }

    pub fn slots_ev(&self) -> Result<ExpectedValue, GameError> {
        let symbols = &self.slots.symbols;
        let total = total_weight(symbols, |s| s.weight as u64)? as u128;
        let triples: u128 = symbols
            .iter()
            .map(|s| (s.weight as u128).pow(3) * s.triple.hundredths() as u128)
            .sum();
        let cherry = symbols.first().map(|s| s.weight as u128).unwrap_or(0);
        let pair = cherry * cherry * (total - cherry) * self.slots.cherry_pair.hundredths() as u128;
        Ok(ExpectedValue {
            numerator: triples + pair,
            denominator: total.pow(3) * 100,
        })
    }

    pub fn case_ev(&self, tier: CaseTier) -> Result<ExpectedValue, GameError> {
        let case = self.case(tier).ok_or(GameError::InvalidDistribution)?;
        let total = total_weight(&case.items, |i| i.weight as u64)?;
        let weighted = weighted_sum(&case.items, |i| i.weight as u64, |i| i.value.hundredths());
        Ok(ExpectedValue::from_hundredths(weighted, total as u128))
    }

    pub fn coinflip_ev(&self) -> ExpectedValue {
        ExpectedValue::from_hundredths(self.coinflip_multiplier().hundredths() as u128, 2)
    }

    /// Upper bound on the jackpot's expected multiplier for any stake.
    ///
    /// Winning pays `floor(pot × (100 − rake) / stake)` hundredths with
    /// probability `stake / pot`, so the expectation never exceeds
    /// `(100 − rake) / 100`.
    pub fn jackpot_ev(&self) -> Result<ExpectedValue, GameError> {
        let jackpot = &self.jackpot;
        if jackpot.rake_percent > 100 || jackpot.house_entries.len() >= MAX_JACKPOT_ENTRANTS {
            return Err(GameError::InvalidDistribution);
        }
        jackpot
            .house_entries
            .iter()
            .try_fold(0u64, |acc, deposit| acc.checked_add(*deposit))
            .ok_or(GameError::InvalidDistribution)?;
        Ok(ExpectedValue::from_hundredths(
            100 - jackpot.rake_percent as u128,
            1,
        ))
    }

    /// Expected multiplier of every table, labelled for reporting.
    pub fn expected_values(&self) -> Vec<(String, Result<ExpectedValue, GameError>)> {
        let mut values = vec![("wheel".to_string(), self.wheel_ev())];
        for color in [RouletteColor::Red, RouletteColor::Black, RouletteColor::Green] {
            values.push((
                format!("roulette/{color:?}").to_lowercase(),
                self.roulette_ev(color),
            ));
        }
        values.push(("slots".to_string(), self.slots_ev()));
        for tier in CaseTier::ALL {
            values.push((format!("case/{tier:?}").to_lowercase(), self.case_ev(tier)));
        }
        let coinflip = if self.coinflip_rake_percent > 100 {
            Err(GameError::InvalidDistribution)
        } else {
            Ok(self.coinflip_ev())
        };
        values.push(("coinflip".to_string(), coinflip));
        values.push(("jackpot".to_string(), self.jackpot_ev()));
        values
    }
}
