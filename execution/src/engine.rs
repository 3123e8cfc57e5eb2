//! Session facade.
//!
//! [Engine] owns the balance, the history and one session slot per game
//! kind. Every round moves `Committed → InProgress → Resolved` and returns to
//! idle only through [Engine::reset]. The stake is debited before the first
//! draw and the payout credited once the outcome is final.

use crate::{
    casino::{
        crash::CrashPhase, init_game, validate_params, Action, GameError, GameParams, GameResult,
        GameRng, GameState, GameView, Rules, Seed, Settlement,
    },
    feed::{ActivityFeed, NoopFeed},
    ledger::{InsufficientFunds, Ledger, Totals},
    ValidatedConfig,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use wager_types::casino::{GameKind, SessionId, WagerRound};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid stake")]
    InvalidStake,
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
    #[error("transition not allowed in the current phase")]
    InvalidTransition,
    #[error("invalid game parameters")]
    InvalidParameters,
    #[error("payout table is not a valid distribution")]
    InvalidDistribution,
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    #[error("session {0} was forfeited")]
    Forfeited(SessionId),
}

/// Maps a rejection raised before any debit.
fn rejected(error: GameError) -> EngineError {
    match error {
        GameError::InvalidStake => EngineError::InvalidStake,
        GameError::InvalidDistribution => EngineError::InvalidDistribution,
        _ => EngineError::InvalidParameters,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Stake debited, no move accepted yet.
    Committed,
    InProgress,
    Resolved,
}

/// Read-only view of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub game: GameKind,
    /// Total debited so far (a blackjack double adds to it).
    pub stake: u64,
    pub phase: Phase,
    pub view: GameView,
    /// Set once the round is resolved.
    pub round: Option<WagerRound>,
}

struct Session {
    id: SessionId,
    stake: u64,
    state: GameState,
    phase: Phase,
    round: Option<WagerRound>,
    moves: u32,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            game: self.state.kind(),
            stake: self.stake,
            phase: self.phase,
            view: self.state.view(),
            round: self.round.clone(),
        }
    }
}

pub struct Engine {
    rules: Rules,
    seed: Seed,
    ledger: Ledger,
    sessions: BTreeMap<GameKind, Session>,
    next_session: SessionId,
    clock_ms: u64,
    feed: Box<dyn ActivityFeed + Send>,
}

impl Engine {
    pub fn new(config: ValidatedConfig) -> Self {
        Self {
            rules: config.rules,
            seed: config.seed,
            ledger: Ledger::new(config.starting_balance),
            sessions: BTreeMap::new(),
            next_session: 1,
            clock_ms: 0,
            feed: Box::new(NoopFeed),
        }
    }

    /// Publish every resolved round to `feed`.
    pub fn with_feed(mut self, feed: impl ActivityFeed + Send + 'static) -> Self {
        self.feed = Box::new(feed);
        self
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn get_balance(&self) -> u64 {
        self.ledger.balance()
    }

    /// Up to `limit` resolved rounds, most recent first.
    pub fn get_history(&self, limit: usize) -> Vec<WagerRound> {
        self.ledger.recent(limit).cloned().collect()
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    /// Encoded history, oldest first.
    pub fn export_history(&self) -> Vec<u8> {
        self.ledger.export()
    }

    /// Logical time in milliseconds.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Start a round of the game `params` selects, debiting `stake`.
    ///
    /// Nothing is mutated unless the stake and parameters are accepted. If
    /// the game fails to start after the debit the round is forfeited and
    /// [EngineError::Forfeited] names it.
    pub fn start(&mut self, params: GameParams, stake: u64) -> Result<SessionId, EngineError> {
        let kind = params.kind();
        if stake == 0 {
            return Err(EngineError::InvalidStake);
        }
        if self.sessions.contains_key(&kind) {
            return Err(EngineError::InvalidTransition);
        }
        validate_params(&params, stake, &self.rules).map_err(rejected)?;
        self.ledger.debit(stake)?;

        let id = self.next_session;
        self.next_session += 1;
        let mut rng = GameRng::new(&self.seed, id, 0);
        let (state, result) = match init_game(params, stake, &self.rules, &mut rng) {
            Ok(started) => started,
            Err(e) => {
                warn!(session = id, game = %kind, ?e, "failed to start round");
                let round = WagerRound::forfeited(id, kind, stake, self.clock_ms);
                self.record(round);
                return Err(EngineError::Forfeited(id));
            }
        };
        debug!(session = id, game = %kind, stake, "round started");

        let mut session = Session {
            id,
            stake,
            state,
            phase: Phase::Committed,
            round: None,
            moves: 0,
        };
        if let GameResult::Complete(settlement) = result {
            self.settle(&mut session, settlement);
        }
        self.sessions.insert(kind, session);
        Ok(id)
    }

    fn kind_of(&self, id: SessionId) -> Result<GameKind, EngineError> {
        if let Some((kind, _)) = self.sessions.iter().find(|(_, s)| s.id == id) {
            return Ok(*kind);
        }
        if self.ledger.round(id).is_some() {
            // Resolved and reset.
            return Err(EngineError::InvalidTransition);
        }
        Err(EngineError::UnknownSession(id))
    }

    /// Apply a player action.
    ///
    /// Actions the round cannot take right now (wrong game, wrong phase,
    /// already resolved) are ignored and the unchanged snapshot returned.
    pub fn act(&mut self, id: SessionId, action: Action) -> Result<SessionSnapshot, EngineError> {
        let kind = self.kind_of(id)?;
        let Some(mut session) = self.sessions.remove(&kind) else {
            return Err(EngineError::UnknownSession(id));
        };
        let applied = self.apply(&mut session, action);
        let snapshot = session.snapshot();
        self.sessions.insert(kind, session);
        applied.map(|_| snapshot)
    }

    fn apply(&mut self, session: &mut Session, action: Action) -> Result<(), EngineError> {
        if session.phase == Phase::Resolved {
            debug!(session = session.id, ?action, "ignoring action on resolved round");
            return Ok(());
        }

        let extra = session.state.extra_stake(action, session.stake);
        if extra > 0 {
            self.ledger.debit(extra)?;
        }

        let mv = session.moves.saturating_add(1);
        let mut rng = GameRng::new(&self.seed, session.id, mv);
        match session.state.process_move(action, &self.rules, &mut rng) {
            Ok(result) => {
                session.moves = mv;
                session.stake += extra;
                match result {
                    GameResult::Continue => session.phase = Phase::InProgress,
                    GameResult::Complete(settlement) => self.settle(session, settlement),
                }
                Ok(())
            }
            Err(GameError::InvalidMove) => {
                if extra > 0 {
                    self.ledger.credit(extra);
                }
                debug!(session = session.id, ?action, "ignoring invalid action");
                Ok(())
            }
            Err(e) => {
                session.stake += extra;
                warn!(session = session.id, ?action, ?e, "round failed");
                self.forfeit(session);
                Err(EngineError::Forfeited(session.id))
            }
        }
    }

    /// Cash out a live round and return it resolved.
    pub fn cash_out(&mut self, id: SessionId) -> Result<WagerRound, EngineError> {
        self.act(id, Action::CashOut)?;
        self.resolve(id)
    }

    /// The resolved round of session `id`. Idempotent: the payout was
    /// credited when the round settled, never here.
    pub fn resolve(&self, id: SessionId) -> Result<WagerRound, EngineError> {
        if let Some(session) = self.sessions.values().find(|s| s.id == id) {
            return session.round.clone().ok_or(EngineError::InvalidTransition);
        }
        self.ledger
            .round(id)
            .cloned()
            .ok_or(EngineError::UnknownSession(id))
    }

    /// Return a resolved session's slot to idle.
    pub fn reset(&mut self, id: SessionId) -> Result<(), EngineError> {
        let kind = match self.kind_of(id) {
            Ok(kind) => kind,
            // Already idle.
            Err(EngineError::InvalidTransition) => return Ok(()),
            Err(e) => return Err(e),
        };
        match self.sessions.get(&kind) {
            Some(session) if session.phase == Phase::Resolved => {
                self.sessions.remove(&kind);
                Ok(())
            }
            Some(_) => Err(EngineError::InvalidTransition),
            None => Err(EngineError::UnknownSession(id)),
        }
    }

    /// Give up a live round. The stake stays debited and a lost round with
    /// a forfeited outcome is recorded; the slot is freed.
    pub fn abandon(&mut self, id: SessionId) -> Result<WagerRound, EngineError> {
        let kind = self.kind_of(id)?;
        let Some(mut session) = self.sessions.remove(&kind) else {
            return Err(EngineError::UnknownSession(id));
        };
        if session.phase == Phase::Resolved {
            self.sessions.insert(kind, session);
            return Err(EngineError::InvalidTransition);
        }
        self.forfeit(&mut session);
        session.round.ok_or(EngineError::InvalidTransition)
    }

    pub fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot, EngineError> {
        let kind = self.kind_of(id)?;
        self.sessions
            .get(&kind)
            .map(Session::snapshot)
            .ok_or(EngineError::UnknownSession(id))
    }

    /// Advance the logical clock and every timed round by `elapsed_ms`.
    /// Returns the rounds this tick resolved.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<WagerRound> {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms);
        let live: Vec<GameKind> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.phase != Phase::Resolved)
            .map(|(kind, _)| *kind)
            .collect();

        let mut settled = Vec::new();
        for kind in live {
            let Some(mut session) = self.sessions.remove(&kind) else {
                continue;
            };
            match session.state.advance(elapsed_ms) {
                GameResult::Complete(settlement) => {
                    self.settle(&mut session, settlement);
                    settled.extend(session.round.clone());
                }
                GameResult::Continue => {
                    if let GameView::Crash {
                        phase: CrashPhase::Running { .. },
                        ..
                    } = session.state.view()
                    {
                        session.phase = Phase::InProgress;
                    }
                }
            }
            self.sessions.insert(kind, session);
        }
        settled
    }

    fn settle(&mut self, session: &mut Session, settlement: Settlement) {
        let round = WagerRound::settle(
            session.id,
            session.state.kind(),
            session.stake,
            settlement.multiplier,
            settlement.outcome,
            self.clock_ms,
        );
        self.ledger.credit(round.payout);
        info!(
            session = round.session_id,
            game = %round.game,
            stake = round.stake,
            payout = round.payout,
            multiplier = %round.multiplier,
            "round settled"
        );
        session.round = Some(self.record(round));
        session.phase = Phase::Resolved;
    }

    fn forfeit(&mut self, session: &mut Session) {
        let round =
            WagerRound::forfeited(session.id, session.state.kind(), session.stake, self.clock_ms);
        warn!(
            session = round.session_id,
            game = %round.game,
            stake = round.stake,
            "round forfeited"
        );
        session.round = Some(self.record(round));
        session.phase = Phase::Resolved;
    }

    fn record(&mut self, round: WagerRound) -> WagerRound {
        self.feed.publish(&round);
        self.ledger.record(round.clone());
        round
    }
}
