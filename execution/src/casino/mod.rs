//! Game execution.
//!
//! Every game is a small state machine implementing [CasinoGame]:
//! - Dice
//! - Mines
//! - Crash
//! - Roulette, Wheel and Jackpot (weighted segments)
//! - Blackjack
//! - Slots
//! - Case opening
//! - Coinflip
//! - Dragon's Throne
//!
//! Games never touch the balance. They turn a debited stake plus player
//! actions into a [Settlement]; the engine owns the money.

pub mod blackjack;
pub mod case_opening;
pub mod coinflip;
pub mod crash;
pub mod dice;
pub mod distribution;
pub mod dragons_throne;
pub mod mines;
pub mod payout;
pub mod slots;
pub mod wheel;

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use wager_types::casino::{
    BlackjackSettlement, CaseTier, CoinSide, Direction, Encounter, Faction, GameKind, Multiplier,
    Outcome, RouletteColor,
};

pub use distribution::{
    sample_distinct, sample_index, sample_uniform, sample_weighted, shuffle, RandomSource,
};
pub use payout::PayoutTable;

/// Engine seed every per-move generator is derived from.
pub type Seed = [u8; 32];

/// Deterministic random number generator.
///
/// Uses SHA256 hash chains seeded from the engine seed, the session id and
/// the move number, so replaying a move always reproduces its draws.
#[derive(Clone)]
pub struct GameRng {
    state: [u8; 32],
    index: usize,
}

impl GameRng {
    /// Create a new RNG from a seed, session ID, and move number.
    pub fn new(seed: &Seed, session_id: u64, move_number: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(&session_id.to_be_bytes());
        hasher.update(&move_number.to_be_bytes());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            // Rehash to get more bytes
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }
}

impl RandomSource for GameRng {
    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut() {
            *byte = self.next_byte();
        }
        u64::from_be_bytes(bytes)
    }
}

/// Everything a game reads from configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    pub payouts: PayoutTable,
    /// Time a crash round waits before its multiplier starts climbing.
    pub crash_countdown_ms: u64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            payouts: PayoutTable::default(),
            crash_countdown_ms: crash::DEFAULT_COUNTDOWN_MS,
        }
    }
}

/// Final multiplier and outcome of a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub multiplier: Multiplier,
    pub outcome: Outcome,
}

impl Settlement {
    pub fn new(multiplier: Multiplier, outcome: Outcome) -> Self {
        Self {
            multiplier,
            outcome,
        }
    }

    pub fn lose(outcome: Outcome) -> Self {
        Self::new(Multiplier::ZERO, outcome)
    }
}

/// Result of processing a game move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Game is still in progress.
    Continue,
    /// Game reached a terminal state. The engine pays
    /// `floor(total stake × multiplier)`.
    Complete(Settlement),
}

/// Error during game execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Action not valid for the current game or phase.
    InvalidMove,
    /// Player choices out of range.
    InvalidParameters,
    /// Stake not acceptable for the chosen parameters.
    InvalidStake,
    /// Empty, zero-total or overflowing weight table.
    InvalidDistribution,
    /// Deck is exhausted (no more cards to draw).
    DeckExhausted,
    /// Internal state violated an invariant.
    InvalidState,
}

/// Player action on a live round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Dice.
    Roll,
    /// Roulette, wheel, jackpot and slots.
    Spin,
    /// Case opening.
    Open,
    /// Coinflip.
    Flip,
    /// Mines: uncover a cell.
    Reveal(u8),
    /// Mines, crash and Dragon's Throne.
    CashOut,
    Hit,
    Stand,
    Double,
    /// Dragon's Throne: face the next encounter.
    Fight,
}

/// Trait for casino game implementations.
pub trait CasinoGame: Sized {
    /// Player choices fixed at start.
    type Params;

    /// Check player choices and stake before anything is debited.
    fn validate(params: &Self::Params, stake: u64, rules: &Rules) -> Result<(), GameError>;

    /// Start a round whose stake has already been debited.
    ///
    /// Some games (a natural blackjack) complete immediately.
    fn init(
        params: Self::Params,
        stake: u64,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError>;

    /// Process a player action.
    fn process_move(
        &mut self,
        action: Action,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError>;

    /// Additional stake `action` needs debited before it runs.
    fn extra_stake(&self, _action: Action, _stake: u64) -> u64 {
        0
    }

    /// Public view of the round.
    fn view(&self) -> GameView;
}

/// Games whose state moves with time.
pub trait Timed {
    /// Advance by `elapsed_ms`. The resulting state depends only on the
    /// total time advanced, however it is split across calls.
    fn advance(&mut self, elapsed_ms: u64) -> GameResult;
}

/// Choices that start a round; the variant selects the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameParams {
    Dice(dice::DiceParams),
    Mines(mines::MinesParams),
    Crash(crash::CrashParams),
    Roulette(wheel::RouletteParams),
    Wheel,
    Jackpot,
    Blackjack,
    Slots,
    CaseOpening(case_opening::CaseParams),
    Coinflip(coinflip::CoinflipParams),
    DragonsThrone(dragons_throne::ThroneParams),
}

impl GameParams {
    pub fn kind(&self) -> GameKind {
        match self {
            GameParams::Dice(_) => GameKind::Dice,
            GameParams::Mines(_) => GameKind::Mines,
            GameParams::Crash(_) => GameKind::Crash,
            GameParams::Roulette(_) => GameKind::Roulette,
            GameParams::Wheel => GameKind::Wheel,
            GameParams::Jackpot => GameKind::Jackpot,
            GameParams::Blackjack => GameKind::Blackjack,
            GameParams::Slots => GameKind::Slots,
            GameParams::CaseOpening(_) => GameKind::CaseOpening,
            GameParams::Coinflip(_) => GameKind::Coinflip,
            GameParams::DragonsThrone(_) => GameKind::DragonsThrone,
        }
    }
}

/// Live state of one round, for whichever game it belongs to.
#[derive(Clone, Debug)]
pub enum GameState {
    Dice(dice::Dice),
    Mines(mines::Mines),
    Crash(crash::Crash),
    Roulette(wheel::Roulette),
    Wheel(wheel::Wheel),
    Jackpot(wheel::Jackpot),
    Blackjack(blackjack::Blackjack),
    Slots(slots::Slots),
    CaseOpening(case_opening::CaseOpening),
    Coinflip(coinflip::Coinflip),
    DragonsThrone(dragons_throne::DragonsThrone),
}

/// Read-only view of a round. Hidden draws (mine cells, crash point, the
/// dealer's hole card) stay hidden until the round settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameView {
    Dice {
        target: u8,
        direction: Direction,
        multiplier: Multiplier,
    },
    Mines {
        mines: u8,
        revealed: Vec<u8>,
        multiplier: Multiplier,
        next_multiplier: Option<Multiplier>,
    },
    Crash {
        phase: crash::CrashPhase,
        auto_cash_out: Option<Multiplier>,
    },
    Roulette {
        choice: RouletteColor,
    },
    Wheel {
        segments: usize,
    },
    Jackpot {
        pot: u64,
        entrants: usize,
    },
    Blackjack {
        player: Vec<u8>,
        player_total: u8,
        dealer: Vec<u8>,
        doubled: bool,
        settlement: Option<BlackjackSettlement>,
    },
    Slots,
    CaseOpening {
        tier: CaseTier,
        price: u64,
    },
    Coinflip {
        choice: CoinSide,
    },
    DragonsThrone {
        faction: Faction,
        multiplier: Multiplier,
        power: u32,
        progress: u8,
        encounters: Vec<Encounter>,
    },
}

/// Check player choices for whichever game `params` selects.
pub fn validate_params(params: &GameParams, stake: u64, rules: &Rules) -> Result<(), GameError> {
    match params {
        GameParams::Dice(p) => dice::Dice::validate(p, stake, rules),
        GameParams::Mines(p) => mines::Mines::validate(p, stake, rules),
        GameParams::Crash(p) => crash::Crash::validate(p, stake, rules),
        GameParams::Roulette(p) => wheel::Roulette::validate(p, stake, rules),
        GameParams::Wheel => wheel::Wheel::validate(&(), stake, rules),
        GameParams::Jackpot => wheel::Jackpot::validate(&(), stake, rules),
        GameParams::Blackjack => blackjack::Blackjack::validate(&(), stake, rules),
        GameParams::Slots => slots::Slots::validate(&(), stake, rules),
        GameParams::CaseOpening(p) => case_opening::CaseOpening::validate(p, stake, rules),
        GameParams::Coinflip(p) => coinflip::Coinflip::validate(p, stake, rules),
        GameParams::DragonsThrone(p) => dragons_throne::DragonsThrone::validate(p, stake, rules),
    }
}

fn wrap<G>(
    started: Result<(G, GameResult), GameError>,
    into: impl FnOnce(G) -> GameState,
) -> Result<(GameState, GameResult), GameError> {
    started.map(|(game, result)| (into(game), result))
}

/// Dispatch game initialization to the appropriate game module.
pub fn init_game(
    params: GameParams,
    stake: u64,
    rules: &Rules,
    rng: &mut impl RandomSource,
) -> Result<(GameState, GameResult), GameError> {
    match params {
        GameParams::Dice(p) => wrap(dice::Dice::init(p, stake, rules, rng), GameState::Dice),
        GameParams::Mines(p) => wrap(mines::Mines::init(p, stake, rules, rng), GameState::Mines),
        GameParams::Crash(p) => wrap(crash::Crash::init(p, stake, rules, rng), GameState::Crash),
        GameParams::Roulette(p) => wrap(
            wheel::Roulette::init(p, stake, rules, rng),
            GameState::Roulette,
        ),
        GameParams::Wheel => wrap(wheel::Wheel::init((), stake, rules, rng), GameState::Wheel),
        GameParams::Jackpot => wrap(
            wheel::Jackpot::init((), stake, rules, rng),
            GameState::Jackpot,
        ),
        GameParams::Blackjack => wrap(
            blackjack::Blackjack::init((), stake, rules, rng),
            GameState::Blackjack,
        ),
        GameParams::Slots => wrap(slots::Slots::init((), stake, rules, rng), GameState::Slots),
        GameParams::CaseOpening(p) => wrap(
            case_opening::CaseOpening::init(p, stake, rules, rng),
            GameState::CaseOpening,
        ),
        GameParams::Coinflip(p) => wrap(
            coinflip::Coinflip::init(p, stake, rules, rng),
            GameState::Coinflip,
        ),
        GameParams::DragonsThrone(p) => wrap(
            dragons_throne::DragonsThrone::init(p, stake, rules, rng),
            GameState::DragonsThrone,
        ),
    }
}

impl GameState {
    pub fn kind(&self) -> GameKind {
        match self {
            GameState::Dice(_) => GameKind::Dice,
            GameState::Mines(_) => GameKind::Mines,
            GameState::Crash(_) => GameKind::Crash,
            GameState::Roulette(_) => GameKind::Roulette,
            GameState::Wheel(_) => GameKind::Wheel,
            GameState::Jackpot(_) => GameKind::Jackpot,
            GameState::Blackjack(_) => GameKind::Blackjack,
            GameState::Slots(_) => GameKind::Slots,
            GameState::CaseOpening(_) => GameKind::CaseOpening,
            GameState::Coinflip(_) => GameKind::Coinflip,
            GameState::DragonsThrone(_) => GameKind::DragonsThrone,
        }
    }

    /// Dispatch game move processing to the appropriate game module.
    pub fn process_move(
        &mut self,
        action: Action,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        match self {
            GameState::Dice(g) => g.process_move(action, rules, rng),
            GameState::Mines(g) => g.process_move(action, rules, rng),
            GameState::Crash(g) => g.process_move(action, rules, rng),
            GameState::Roulette(g) => g.process_move(action, rules, rng),
            GameState::Wheel(g) => g.process_move(action, rules, rng),
            GameState::Jackpot(g) => g.process_move(action, rules, rng),
            GameState::Blackjack(g) => g.process_move(action, rules, rng),
            GameState::Slots(g) => g.process_move(action, rules, rng),
            GameState::CaseOpening(g) => g.process_move(action, rules, rng),
            GameState::Coinflip(g) => g.process_move(action, rules, rng),
            GameState::DragonsThrone(g) => g.process_move(action, rules, rng),
        }
    }

    pub fn extra_stake(&self, action: Action, stake: u64) -> u64 {
        match self {
            GameState::Blackjack(g) => g.extra_stake(action, stake),
            _ => 0,
        }
    }

    /// Advance timed games; everything else ignores the clock.
    pub fn advance(&mut self, elapsed_ms: u64) -> GameResult {
        match self {
            GameState::Crash(g) => g.advance(elapsed_ms),
            _ => GameResult::Continue,
        }
    }

    pub fn view(&self) -> GameView {
        match self {
            GameState::Dice(g) => g.view(),
            GameState::Mines(g) => g.view(),
            GameState::Crash(g) => g.view(),
            GameState::Roulette(g) => g.view(),
            GameState::Wheel(g) => g.view(),
            GameState::Jackpot(g) => g.view(),
            GameState::Blackjack(g) => g.view(),
            GameState::Slots(g) => g.view(),
            GameState::CaseOpening(g) => g.view(),
            GameState::Coinflip(g) => g.view(),
            GameState::DragonsThrone(g) => g.view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_test_seed;

    #[test]
    fn test_game_rng_deterministic() {
        let seed = create_test_seed();

        let mut rng1 = GameRng::new(&seed, 1, 0);
        let mut rng2 = GameRng::new(&seed, 1, 0);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_game_rng_different_sessions() {
        let seed = create_test_seed();

        let mut rng1 = GameRng::new(&seed, 1, 0);
        let mut rng2 = GameRng::new(&seed, 2, 0);

        let seq1: Vec<u64> = (0..10).map(|_| rng1.next_u64()).collect();
        let seq2: Vec<u64> = (0..10).map(|_| rng2.next_u64()).collect();
        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_game_rng_different_moves() {
        let seed = create_test_seed();

        let mut rng1 = GameRng::new(&seed, 1, 0);
        let mut rng2 = GameRng::new(&seed, 1, 1);
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_game_rng_rehash() {
        let seed = create_test_seed();
        let mut rng = GameRng::new(&seed, 1, 0);

        // Four words exhaust the first digest; the fifth comes from a rehash.
        let words: Vec<u64> = (0..8).map(|_| rng.next_u64()).collect();
        assert_ne!(&words[0..4], &words[4..8]);
    }

    #[test]
    fn test_params_kind() {
        assert_eq!(GameParams::Wheel.kind(), GameKind::Wheel);
        assert_eq!(
            GameParams::Dice(dice::DiceParams {
                target: 50,
                direction: Direction::Over,
            })
            .kind(),
            GameKind::Dice
        );
    }
}
