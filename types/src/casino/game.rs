use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::MULTIPLIER_SCALE;

/// Game families backed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum GameKind {
    Dice = 0,
    Mines = 1,
    Crash = 2,
    Roulette = 3,
    Wheel = 4,
    Jackpot = 5,
    Blackjack = 6,
    Slots = 7,
    CaseOpening = 8,
    Coinflip = 9,
    DragonsThrone = 10,
}

impl GameKind {
    pub const ALL: [GameKind; 11] = [
        GameKind::Dice,
        GameKind::Mines,
        GameKind::Crash,
        GameKind::Roulette,
        GameKind::Wheel,
        GameKind::Jackpot,
        GameKind::Blackjack,
        GameKind::Slots,
        GameKind::CaseOpening,
        GameKind::Coinflip,
        GameKind::DragonsThrone,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::Mines => "mines",
            GameKind::Crash => "crash",
            GameKind::Roulette => "roulette",
            GameKind::Wheel => "wheel",
            GameKind::Jackpot => "jackpot",
            GameKind::Blackjack => "blackjack",
            GameKind::Slots => "slots",
            GameKind::CaseOpening => "case-opening",
            GameKind::Coinflip => "coinflip",
            GameKind::DragonsThrone => "dragons-throne",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown game: {s}"))
    }
}

impl Write for GameKind {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for GameKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Dice),
            1 => Ok(Self::Mines),
            2 => Ok(Self::Crash),
            3 => Ok(Self::Roulette),
            4 => Ok(Self::Wheel),
            5 => Ok(Self::Jackpot),
            6 => Ok(Self::Blackjack),
            7 => Ok(Self::Slots),
            8 => Ok(Self::CaseOpening),
            9 => Ok(Self::Coinflip),
            10 => Ok(Self::DragonsThrone),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for GameKind {
    const SIZE: usize = 1;
}

/// Payout multiplier, stored as a whole number of hundredths.
///
/// `Multiplier::from_hundredths(196)` is 1.96x.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Multiplier(u64);

impl Multiplier {
    pub const ZERO: Multiplier = Multiplier(0);
    pub const ONE: Multiplier = Multiplier(MULTIPLIER_SCALE);

    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    pub const fn from_whole(whole: u64) -> Self {
        Self(whole.saturating_mul(MULTIPLIER_SCALE))
    }

    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// `floor(stake × self)`, saturating at `u64::MAX`. Games bound their
    /// multipliers and stakes so the saturation is never reached.
    pub fn apply(self, stake: u64) -> u64 {
        self.checked_apply(stake).unwrap_or(u64::MAX)
    }

    /// `floor(stake × self)`, or `None` if it does not fit in a `u64`.
    pub fn checked_apply(self, stake: u64) -> Option<u64> {
        let payout = (stake as u128 * self.0 as u128) / MULTIPLIER_SCALE as u128;
        u64::try_from(payout).ok()
    }

    pub fn saturating_add(self, other: Multiplier) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_scale(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / MULTIPLIER_SCALE as f64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}x",
            self.0 / MULTIPLIER_SCALE,
            self.0 % MULTIPLIER_SCALE
        )
    }
}

impl Write for Multiplier {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for Multiplier {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(u64::read(reader)?))
    }
}

impl FixedSize for Multiplier {
    const SIZE: usize = u64::SIZE;
}

/// Result of a resolved round from the player's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ResultTag {
    Win = 0,
    Lose = 1,
    Push = 2,
}

impl ResultTag {
    /// Win above 1x, push at exactly 1x, lose below.
    pub fn from_multiplier(multiplier: Multiplier) -> Self {
        match multiplier.cmp(&Multiplier::ONE) {
            std::cmp::Ordering::Greater => ResultTag::Win,
            std::cmp::Ordering::Equal => ResultTag::Push,
            std::cmp::Ordering::Less => ResultTag::Lose,
        }
    }
}

u8_enum_codec!(ResultTag { 0 => Win, 1 => Lose, 2 => Push });

/// Dice bet direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Under = 0,
    Over = 1,
}

u8_enum_codec!(Direction { 0 => Under, 1 => Over });

/// Roulette segment colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RouletteColor {
    Red = 0,
    Black = 1,
    Green = 2,
}

u8_enum_codec!(RouletteColor { 0 => Red, 1 => Black, 2 => Green });

/// Coin sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CoinSide {
    Heads = 0,
    Tails = 1,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

u8_enum_codec!(CoinSide { 0 => Heads, 1 => Tails });

/// Case tiers, each with its own price and loot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CaseTier {
    Bronze = 0,
    Silver = 1,
    Gold = 2,
}

impl CaseTier {
    pub const ALL: [CaseTier; 3] = [CaseTier::Bronze, CaseTier::Silver, CaseTier::Gold];
}

u8_enum_codec!(CaseTier { 0 => Bronze, 1 => Silver, 2 => Gold });

/// Dragon's Throne factions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Faction {
    Ember = 0,
    Frost = 1,
}

u8_enum_codec!(Faction { 0 => Ember, 1 => Frost });

/// Tier of a Dragon's Throne encounter, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DragonTier {
    Whelp = 0,
    Drake = 1,
    Wyvern = 2,
    Elder = 3,
}

impl DragonTier {
    pub const ALL: [DragonTier; 4] = [
        DragonTier::Whelp,
        DragonTier::Drake,
        DragonTier::Wyvern,
        DragonTier::Elder,
    ];
}

u8_enum_codec!(DragonTier { 0 => Whelp, 1 => Drake, 2 => Wyvern, 3 => Elder });

/// Terminal blackjack settlements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum BlackjackSettlement {
    Blackjack = 0,
    DealerBlackjack = 1,
    Win = 2,
    Lose = 3,
    Push = 4,
    Bust = 5,
    DealerBust = 6,
}

u8_enum_codec!(BlackjackSettlement {
    0 => Blackjack,
    1 => DealerBlackjack,
    2 => Win,
    3 => Lose,
    4 => Push,
    5 => Bust,
    6 => DealerBust,
});
