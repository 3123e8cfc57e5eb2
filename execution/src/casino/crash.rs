//! Crash: a multiplier climbs from 1.00x until it crashes.
//!
//! The crash point `C = max(1.00, floor(100 / (1 − e)) / 100)` is drawn once
//! at start and capped at [MAX_CRASH_POINT]; stakes whose payout at the cap
//! would not fit in a `u64` are refused. After a countdown the displayed multiplier follows
//! `floor(100 · e^{0.1·t}) / 100` (`t` in seconds) and the round crashes the
//! moment it reaches `C`. Cashing out at displayed `m < C` pays `m`.
//!
//! Phases are a pure function of the total time advanced, so late or
//! coalesced ticks land in the same state.

use super::{
    sample_uniform, Action, CasinoGame, GameError, GameResult, GameView, RandomSource, Rules,
    Settlement, Timed,
};
use wager_types::casino::{Multiplier, Outcome, MULTIPLIER_SCALE};

/// Countdown before the multiplier starts climbing.
pub const DEFAULT_COUNTDOWN_MS: u64 = 5_000;

/// Exponential growth rate of the multiplier, per second.
const GROWTH_PER_SECOND: f64 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrashParams {
    /// Cash out automatically once the multiplier reaches this value.
    pub auto_cash_out: Option<Multiplier>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrashPhase {
    Waiting { remaining_ms: u64 },
    Running { multiplier: Multiplier },
    Crashed { at: Multiplier },
    CashedOut { at: Multiplier },
}

impl CrashPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrashPhase::Crashed { .. } | CrashPhase::CashedOut { .. })
    }
}

/// Highest crash point a round can draw.
pub const MAX_CRASH_POINT: Multiplier = Multiplier::from_whole(1_000_000);

/// Crash point for a uniform sample `e` in `[0, 1)`.
pub fn crash_point_for(e: f64) -> Multiplier {
    let hundredths = (MULTIPLIER_SCALE as f64 / (1.0 - e)).floor() as u64;
    Multiplier::from_hundredths(hundredths.clamp(MULTIPLIER_SCALE, MAX_CRASH_POINT.hundredths()))
}

/// Displayed multiplier after `running_ms` of climb.
pub fn multiplier_at(running_ms: u64) -> Multiplier {
    let seconds = running_ms as f64 / 1_000.0;
    let hundredths = (MULTIPLIER_SCALE as f64 * (GROWTH_PER_SECOND * seconds).exp()).floor();
    Multiplier::from_hundredths(hundredths as u64)
}

#[derive(Clone, Debug)]
pub struct Crash {
    crash_point: Multiplier,
    countdown_ms: u64,
    elapsed_ms: u64,
    auto_cash_out: Option<Multiplier>,
    phase: CrashPhase,
}

impl Crash {
    pub fn phase(&self) -> CrashPhase {
        self.phase
    }

    /// Phase after `total_ms` since the round started.
    fn phase_at(&self, total_ms: u64) -> CrashPhase {
        if total_ms < self.countdown_ms {
            return CrashPhase::Waiting {
                remaining_ms: self.countdown_ms - total_ms,
            };
        }

        let multiplier = multiplier_at(total_ms - self.countdown_ms);
        if let Some(target) = self.auto_cash_out {
            if target < self.crash_point && multiplier >= target {
                return CrashPhase::CashedOut { at: target };
            }
        }
        if multiplier >= self.crash_point {
            return CrashPhase::Crashed {
                at: self.crash_point,
            };
        }
        CrashPhase::Running { multiplier }
    }

    fn settlement(&self) -> Option<Settlement> {
        let (multiplier, cashed_out_at) = match self.phase {
            CrashPhase::CashedOut { at } => (at, Some(at)),
            CrashPhase::Crashed { .. } => (Multiplier::ZERO, None),
            _ => return None,
        };
        Some(Settlement::new(
            multiplier,
            Outcome::Crash {
                crash_point: self.crash_point,
                cashed_out_at,
            },
        ))
    }
}

impl Timed for Crash {
    fn advance(&mut self, elapsed_ms: u64) -> GameResult {
        if self.phase.is_terminal() {
            return GameResult::Continue;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        self.phase = self.phase_at(self.elapsed_ms);
        match self.settlement() {
            Some(settlement) => GameResult::Complete(settlement),
            None => GameResult::Continue,
        }
    }
}

impl CasinoGame for Crash {
    type Params = CrashParams;

    fn validate(params: &CrashParams, stake: u64, _rules: &Rules) -> Result<(), GameError> {
        if MAX_CRASH_POINT.checked_apply(stake).is_none() {
            return Err(GameError::InvalidStake);
        }
        match params.auto_cash_out {
            Some(target) if target <= Multiplier::ONE => Err(GameError::InvalidParameters),
            _ => Ok(()),
        }
    }

    fn init(
        params: CrashParams,
        _stake: u64,
        rules: &Rules,
        rng: &mut impl RandomSource,
    ) -> Result<(Self, GameResult), GameError> {
        let mut crash = Self {
            crash_point: crash_point_for(sample_uniform(rng)),
            countdown_ms: rules.crash_countdown_ms,
            elapsed_ms: 0,
            auto_cash_out: params.auto_cash_out,
            phase: CrashPhase::Waiting {
                remaining_ms: rules.crash_countdown_ms,
            },
        };
        // A zero countdown starts (and may end) the climb immediately.
        let result = crash.advance(0);
        Ok((crash, result))
    }

    fn process_move(
        &mut self,
        action: Action,
        _rules: &Rules,
        _rng: &mut impl RandomSource,
    ) -> Result<GameResult, GameError> {
        if action != Action::CashOut {
            return Err(GameError::InvalidMove);
        }
        let CrashPhase::Running { multiplier } = self.phase else {
            return Err(GameError::InvalidMove);
        };
        if multiplier >= self.crash_point {
            return Err(GameError::InvalidState);
        }

        self.phase = CrashPhase::CashedOut { at: multiplier };
        self.settlement()
            .map(GameResult::Complete)
            .ok_or(GameError::InvalidState)
    }

    fn view(&self) -> GameView {
        GameView::Crash {
            phase: self.phase,
            auto_cash_out: self.auto_cash_out,
        }
    }
}
