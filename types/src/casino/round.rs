use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};

use super::{
    BlackjackSettlement, CaseTier, CoinSide, Direction, DragonTier, Faction, GameKind, Multiplier,
    ResultTag, RouletteColor, GRID_CELLS, MAX_ENCOUNTERS, MAX_HAND_SIZE, SLOT_REELS,
};

/// Identifier handed out by the engine for each started round.
pub type SessionId = u64;

/// One Dragon's Throne encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encounter {
    pub tier: DragonTier,
    /// Win chance in whole percent, after all bonuses and penalties.
    pub win_chance: u8,
    pub won: bool,
}

impl Write for Encounter {
    fn write(&self, writer: &mut impl BufMut) {
        self.tier.write(writer);
        self.win_chance.write(writer);
        self.won.write(writer);
    }
}

impl Read for Encounter {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            tier: DragonTier::read(reader)?,
            win_chance: u8::read(reader)?,
            won: bool::read(reader)?,
        })
    }
}

impl FixedSize for Encounter {
    const SIZE: usize = DragonTier::SIZE + u8::SIZE + bool::SIZE;
}

/// Game-specific description of how a round ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Dice {
        target: u8,
        direction: Direction,
        /// Roll in hundredths, `0..=9999`.
        roll: u16,
    },
    Mines {
        mines: u8,
        revealed: Vec<u8>,
        mine_cells: Vec<u8>,
        hit: Option<u8>,
    },
    Crash {
        crash_point: Multiplier,
        cashed_out_at: Option<Multiplier>,
    },
    Roulette {
        choice: RouletteColor,
        landed: RouletteColor,
        segment: u8,
    },
    Wheel {
        segment: u8,
    },
    Jackpot {
        pot: u64,
        entrants: u8,
        /// Index of the winning entry; the player is always entry 0.
        winner: u8,
    },
    Blackjack {
        player: Vec<u8>,
        dealer: Vec<u8>,
        doubled: bool,
        settlement: BlackjackSettlement,
    },
    Slots {
        reels: [u8; SLOT_REELS],
    },
    CaseOpening {
        tier: CaseTier,
        item: u8,
    },
    Coinflip {
        choice: CoinSide,
        landed: CoinSide,
    },
    DragonsThrone {
        faction: Faction,
        encounters: Vec<Encounter>,
        progress: u8,
        throne: bool,
    },
    /// Stake was debited but the round never resolved normally.
    Forfeited,
}

impl Write for Outcome {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Outcome::Dice {
                target,
                direction,
                roll,
            } => {
                0u8.write(writer);
                target.write(writer);
                direction.write(writer);
                roll.write(writer);
            }
            Outcome::Mines {
                mines,
                revealed,
                mine_cells,
                hit,
            } => {
                1u8.write(writer);
                mines.write(writer);
                revealed.write(writer);
                mine_cells.write(writer);
                hit.write(writer);
            }
            Outcome::Crash {
                crash_point,
                cashed_out_at,
            } => {
                2u8.write(writer);
                crash_point.write(writer);
                cashed_out_at.write(writer);
            }
            Outcome::Roulette {
                choice,
                landed,
                segment,
            } => {
                3u8.write(writer);
                choice.write(writer);
                landed.write(writer);
                segment.write(writer);
            }
            Outcome::Wheel { segment } => {
                4u8.write(writer);
                segment.write(writer);
            }
            Outcome::Jackpot {
                pot,
                entrants,
                winner,
            } => {
                5u8.write(writer);
                pot.write(writer);
                entrants.write(writer);
                winner.write(writer);
            }
            Outcome::Blackjack {
                player,
                dealer,
                doubled,
                settlement,
            } => {
                6u8.write(writer);
                player.write(writer);
                dealer.write(writer);
                doubled.write(writer);
                settlement.write(writer);
            }
            Outcome::Slots { reels } => {
                7u8.write(writer);
                for symbol in reels {
                    symbol.write(writer);
                }
            }
            Outcome::CaseOpening { tier, item } => {
                8u8.write(writer);
                tier.write(writer);
                item.write(writer);
            }
            Outcome::Coinflip { choice, landed } => {
                9u8.write(writer);
                choice.write(writer);
                landed.write(writer);
            }
            Outcome::DragonsThrone {
                faction,
                encounters,
                progress,
                throne,
            } => {
                10u8.write(writer);
                faction.write(writer);
                encounters.write(writer);
                progress.write(writer);
                throne.write(writer);
            }
            Outcome::Forfeited => {
                11u8.write(writer);
            }
        }
    }
}

impl Read for Outcome {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let cells = 0..=GRID_CELLS as usize;
        match u8::read(reader)? {
            0 => Ok(Outcome::Dice {
                target: u8::read(reader)?,
                direction: Direction::read(reader)?,
                roll: u16::read(reader)?,
            }),
            1 => Ok(Outcome::Mines {
                mines: u8::read(reader)?,
                revealed: Vec::<u8>::read_range(reader, cells.clone())?,
                mine_cells: Vec::<u8>::read_range(reader, cells)?,
                hit: Option::<u8>::read(reader)?,
            }),
            2 => Ok(Outcome::Crash {
                crash_point: Multiplier::read(reader)?,
                cashed_out_at: Option::<Multiplier>::read(reader)?,
            }),
            3 => Ok(Outcome::Roulette {
                choice: RouletteColor::read(reader)?,
                landed: RouletteColor::read(reader)?,
                segment: u8::read(reader)?,
            }),
            4 => Ok(Outcome::Wheel {
                segment: u8::read(reader)?,
            }),
            5 => Ok(Outcome::Jackpot {
                pot: u64::read(reader)?,
                entrants: u8::read(reader)?,
                winner: u8::read(reader)?,
            }),
            6 => Ok(Outcome::Blackjack {
                player: Vec::<u8>::read_range(reader, 0..=MAX_HAND_SIZE)?,
                dealer: Vec::<u8>::read_range(reader, 0..=MAX_HAND_SIZE)?,
                doubled: bool::read(reader)?,
                settlement: BlackjackSettlement::read(reader)?,
            }),
            7 => {
                let mut reels = [0u8; SLOT_REELS];
                for symbol in reels.iter_mut() {
                    *symbol = u8::read(reader)?;
                }
                Ok(Outcome::Slots { reels })
            }
            8 => Ok(Outcome::CaseOpening {
                tier: CaseTier::read(reader)?,
                item: u8::read(reader)?,
            }),
            9 => Ok(Outcome::Coinflip {
                choice: CoinSide::read(reader)?,
                landed: CoinSide::read(reader)?,
            }),
            10 => Ok(Outcome::DragonsThrone {
                faction: Faction::read(reader)?,
                encounters: Vec::<Encounter>::read_range(reader, 0..=MAX_ENCOUNTERS)?,
                progress: u8::read(reader)?,
                throne: bool::read(reader)?,
            }),
            11 => Ok(Outcome::Forfeited),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Outcome {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Outcome::Dice { .. } => u8::SIZE + Direction::SIZE + u16::SIZE,
                Outcome::Mines {
                    revealed,
                    mine_cells,
                    hit,
                    ..
                } => {
                    u8::SIZE
                        + revealed.encode_size()
                        + mine_cells.encode_size()
                        + hit.encode_size()
                }
                Outcome::Crash { cashed_out_at, .. } => {
                    Multiplier::SIZE + cashed_out_at.encode_size()
                }
                Outcome::Roulette { .. } => 2 * RouletteColor::SIZE + u8::SIZE,
                Outcome::Wheel { .. } => u8::SIZE,
                Outcome::Jackpot { .. } => u64::SIZE + 2 * u8::SIZE,
                Outcome::Blackjack { player, dealer, .. } => {
                    player.encode_size()
                        + dealer.encode_size()
                        + bool::SIZE
                        + BlackjackSettlement::SIZE
                }
                Outcome::Slots { .. } => SLOT_REELS * u8::SIZE,
                Outcome::CaseOpening { .. } => CaseTier::SIZE + u8::SIZE,
                Outcome::Coinflip { .. } => 2 * CoinSide::SIZE,
                Outcome::DragonsThrone { encounters, .. } => {
                    Faction::SIZE + encounters.encode_size() + u8::SIZE + bool::SIZE
                }
                Outcome::Forfeited => 0,
            }
    }
}

/// One resolved play. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WagerRound {
    pub session_id: SessionId,
    pub game: GameKind,
    pub stake: u64,
    pub outcome: Outcome,
    pub payout: u64,
    pub multiplier: Multiplier,
    pub result: ResultTag,
    /// Engine clock in milliseconds when the round settled.
    pub timestamp: u64,
}

impl WagerRound {
    /// Builds a round whose payout and tag follow from `stake × multiplier`.
    pub fn settle(
        session_id: SessionId,
        game: GameKind,
        stake: u64,
        multiplier: Multiplier,
        outcome: Outcome,
        timestamp: u64,
    ) -> Self {
        Self {
            session_id,
            game,
            stake,
            outcome,
            payout: multiplier.apply(stake),
            multiplier,
            result: ResultTag::from_multiplier(multiplier),
            timestamp,
        }
    }

    /// Round lost to forfeiture: the stake stays debited and nothing is paid.
    pub fn forfeited(session_id: SessionId, game: GameKind, stake: u64, timestamp: u64) -> Self {
        Self::settle(
            session_id,
            game,
            stake,
            Multiplier::ZERO,
            Outcome::Forfeited,
            timestamp,
        )
    }

    /// Net change to the player's balance over the whole round.
    pub fn net(&self) -> i128 {
        self.payout as i128 - self.stake as i128
    }
}

impl Write for WagerRound {
    fn write(&self, writer: &mut impl BufMut) {
        self.session_id.write(writer);
        self.game.write(writer);
        self.stake.write(writer);
        self.outcome.write(writer);
        self.payout.write(writer);
        self.multiplier.write(writer);
        self.result.write(writer);
        self.timestamp.write(writer);
    }
}

impl Read for WagerRound {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            session_id: u64::read(reader)?,
            game: GameKind::read(reader)?,
            stake: u64::read(reader)?,
            outcome: Outcome::read(reader)?,
            payout: u64::read(reader)?,
            multiplier: Multiplier::read(reader)?,
            result: ResultTag::read(reader)?,
            timestamp: u64::read(reader)?,
        })
    }
}

impl EncodeSize for WagerRound {
    fn encode_size(&self) -> usize {
        self.session_id.encode_size()
            + self.game.encode_size()
            + self.stake.encode_size()
            + self.outcome.encode_size()
            + self.payout.encode_size()
            + self.multiplier.encode_size()
            + self.result.encode_size()
            + self.timestamp.encode_size()
    }
}
