/// Hundredths per unit of [super::Multiplier].
pub const MULTIPLIER_SCALE: u64 = 100;

/// Starting balance for a new player session.
pub const STARTING_BALANCE: u64 = 10_000;

/// Cells on the mines grid.
pub const GRID_CELLS: u8 = 25;

/// Fewest mines a round may place.
pub const MIN_MINES: u8 = 1;

/// Most mines a round may place (one safe cell must remain).
pub const MAX_MINES: u8 = GRID_CELLS - 1;

/// Lowest dice target.
pub const MIN_DICE_TARGET: u8 = 2;

/// Highest dice target.
pub const MAX_DICE_TARGET: u8 = 98;

/// Maximum cards in a blackjack hand.
pub const MAX_HAND_SIZE: usize = 11;

/// Upper bound on Dragon's Throne encounters in one run.
///
/// Every won encounter adds at least 10% throne progress, so a run ends
/// after at most ten wins plus one loss.
pub const MAX_ENCOUNTERS: usize = 16;

/// Upper bound on jackpot entrants (player plus house entries).
pub const MAX_JACKPOT_ENTRANTS: usize = 32;

/// Reels on the slot machine.
pub const SLOT_REELS: usize = 3;
