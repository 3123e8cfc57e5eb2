//! Reports and drivers behind the `wager-simulator` binary.
//!
//! [simulate] estimates each game's house edge by playing a fixed strategy
//! over many seeded rounds in parallel. [drive_crash] runs one live crash
//! round against a real timer. [play_history] produces an exportable
//! history.

use anyhow::{anyhow, Context};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use wager_execution::{
    casino::{
        case_opening::CaseParams, coinflip::CoinflipParams, crash::CrashParams,
        dice::DiceParams, dragons_throne::ThroneParams, init_game, mines::MinesParams,
        wheel::RouletteParams, Action, GameError, GameParams, GameResult, GameRng, GameState,
        GameView, PayoutTable, Rules, Seed,
    },
    Engine,
};
use wager_types::casino::{
    CaseTier, CoinSide, Direction, Faction, GameKind, Multiplier, ResultTag, RouletteColor,
    WagerRound,
};

/// Stake used by every simulated strategy except case opening, which pays
/// the case price.
pub const BASE_STAKE: u64 = 100;

/// Step a simulated crash round advances per tick.
const SIM_TICK_MS: u64 = 100;

/// Bound on moves or ticks in one simulated round.
const MAX_STEPS: u32 = 100_000;

#[derive(Default, Clone, Debug)]
pub struct Stats {
    trials: u64,
    total_net: f64,
    total_net_sq: f64,
    total_wagered: f64,
    total_paid: f64,
}

impl Stats {
    pub fn add(&mut self, wagered: u64, paid: u64) {
        let n = paid as f64 - wagered as f64;
        self.trials += 1;
        self.total_net += n;
        self.total_net_sq += n * n;
        self.total_wagered += wagered as f64;
        self.total_paid += paid as f64;
    }

    pub fn merge(mut self, other: &Stats) -> Self {
        self.trials += other.trials;
        self.total_net += other.total_net;
        self.total_net_sq += other.total_net_sq;
        self.total_wagered += other.total_wagered;
        self.total_paid += other.total_paid;
        self
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn mean_wagered(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_wagered / self.trials as f64
        }
    }

    fn mean_net(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_net / self.trials as f64
        }
    }

    /// Paid over wagered.
    pub fn avg_return(&self) -> f64 {
        if self.total_wagered == 0.0 {
            0.0
        } else {
            self.total_paid / self.total_wagered
        }
    }

    pub fn house_edge(&self) -> f64 {
        let mw = self.mean_wagered();
        if mw == 0.0 {
            0.0
        } else {
            -self.mean_net() / mw
        }
    }

    /// Standard error of the mean net, relative to the mean stake.
    pub fn stderr(&self) -> f64 {
        if self.trials <= 1 {
            return 0.0;
        }
        let mean = self.mean_net();
        let var = (self.total_net_sq / self.trials as f64) - mean * mean;
        let var = var.max(0.0);
        let mw = self.mean_wagered();
        if mw == 0.0 {
            0.0
        } else {
            (var / self.trials as f64).sqrt() / mw
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportRow {
    pub game: String,
    pub strategy: String,
    pub trials: u64,
    pub avg_wagered: f64,
    pub avg_return: f64,
    pub house_edge: f64,
    pub stderr: f64,
}

impl ReportRow {
    pub const CSV_HEADER: &'static str = "game,trials,avg_return,house_edge,stderr";

    pub fn csv(&self) -> String {
        format!(
            "{},{},{:.6},{:.6},{:.6}",
            self.game,
            self.trials,
            self.avg_return,
            self.house_edge,
            self.stderr
        )
    }
}

/// Exact expected multiplier of one payout table.
#[derive(Clone, Debug, Serialize)]
pub struct ExactRow {
    pub table: String,
    pub expected: f64,
    pub house_edge: f64,
}

pub fn exact_edges(payouts: &PayoutTable) -> anyhow::Result<Vec<ExactRow>> {
    payouts
        .expected_values()
        .into_iter()
        .map(|(table, ev)| {
            let ev = ev.map_err(|e| anyhow!("{table}: {e:?}"))?;
            Ok(ExactRow {
                table,
                expected: ev.as_f64(),
                house_edge: 1.0 - ev.as_f64(),
            })
        })
        .collect()
}

/// Parameters, stake and a label for the strategy simulated for `kind`.
fn setup(kind: GameKind, rules: &Rules) -> Result<(GameParams, u64, &'static str), GameError> {
    Ok(match kind {
        GameKind::Dice => (
            GameParams::Dice(DiceParams {
                target: 50,
                direction: Direction::Over,
            }),
            BASE_STAKE,
            "over 50",
        ),
        GameKind::Mines => (
            GameParams::Mines(MinesParams { mines: 3 }),
            BASE_STAKE,
            "3 mines, cash out after 3",
        ),
        GameKind::Crash => (
            GameParams::Crash(CrashParams {
                auto_cash_out: Some(Multiplier::from_whole(2)),
            }),
            BASE_STAKE,
            "auto cash out 2.00x",
        ),
        GameKind::Roulette => (
            GameParams::Roulette(RouletteParams {
                choice: RouletteColor::Red,
            }),
            BASE_STAKE,
            "red",
        ),
        GameKind::Wheel => (GameParams::Wheel, BASE_STAKE, "spin"),
        GameKind::Jackpot => (GameParams::Jackpot, BASE_STAKE, "enter"),
        GameKind::Blackjack => (GameParams::Blackjack, BASE_STAKE, "hit below 17"),
        GameKind::Slots => (GameParams::Slots, BASE_STAKE, "spin"),
        GameKind::CaseOpening => {
            let case = rules
                .payouts
                .case(CaseTier::Bronze)
                .ok_or(GameError::InvalidParameters)?;
            (
                GameParams::CaseOpening(CaseParams {
                    tier: CaseTier::Bronze,
                }),
                case.price,
                "bronze",
            )
        }
        GameKind::Coinflip => (
            GameParams::Coinflip(CoinflipParams {
                choice: CoinSide::Heads,
            }),
            BASE_STAKE,
            "heads",
        ),
        GameKind::DragonsThrone => (
            GameParams::DragonsThrone(ThroneParams {
                faction: Faction::Ember,
            }),
            BASE_STAKE,
            "ember, cash out after first win",
        ),
    })
}

/// Next action of the simulated strategy.
fn next_action(state: &GameState) -> Action {
    match state.view() {
        GameView::Dice { .. } => Action::Roll,
        GameView::Roulette { .. }
        | GameView::Wheel { .. }
        | GameView::Jackpot { .. }
        | GameView::Slots => Action::Spin,
        GameView::CaseOpening { .. } => Action::Open,
        GameView::Coinflip { .. } => Action::Flip,
        GameView::Mines { revealed, .. } => {
            if revealed.len() >= 3 {
                Action::CashOut
            } else {
                Action::Reveal(revealed.len() as u8)
            }
        }
        GameView::Blackjack { player_total, .. } => {
            if player_total < 17 {
                Action::Hit
            } else {
                Action::Stand
            }
        }
        GameView::DragonsThrone { encounters, .. } => {
            if encounters.is_empty() {
                Action::Fight
            } else {
                Action::CashOut
            }
        }
        GameView::Crash { .. } => Action::CashOut,
    }
}

/// Play one round of `kind` as session `session`. Returns the total
/// wagered and the payout.
pub fn play_round(
    rules: &Rules,
    seed: &Seed,
    kind: GameKind,
    session: u64,
) -> Result<(u64, u64), GameError> {
    let (params, stake, _) = setup(kind, rules)?;
    let mut rng = GameRng::new(seed, session, 0);
    let (mut state, mut result) = init_game(params, stake, rules, &mut rng)?;
    let mut wagered = stake;
    let mut mv = 0u32;

    loop {
        if let GameResult::Complete(settlement) = result {
            return Ok((wagered, settlement.multiplier.apply(wagered)));
        }
        if mv >= MAX_STEPS {
            return Err(GameError::InvalidState);
        }
        mv += 1;
        if kind == GameKind::Crash {
            result = state.advance(SIM_TICK_MS);
            continue;
        }
        let action = next_action(&state);
        wagered += state.extra_stake(action, stake);
        let mut rng = GameRng::new(seed, session, mv);
        result = state.process_move(action, rules, &mut rng)?;
    }
}

/// Monte-Carlo house edge of `kind` over `trials` seeded rounds.
pub fn simulate(
    rules: &Rules,
    seed: &Seed,
    kind: GameKind,
    trials: u64,
) -> anyhow::Result<ReportRow> {
    let (_, _, strategy) = setup(kind, rules).map_err(|e| anyhow!("{kind}: {e:?}"))?;
    let stats = (0..trials)
        .into_par_iter()
        .try_fold(Stats::default, |mut stats, session| {
            let (wagered, paid) = play_round(rules, seed, kind, session)?;
            stats.add(wagered, paid);
            Ok::<_, GameError>(stats)
        })
        .try_reduce(Stats::default, |a, b| Ok(a.merge(&b)))
        .map_err(|e| anyhow!("{kind}: {e:?}"))?;

    Ok(ReportRow {
        game: kind.to_string(),
        strategy: strategy.to_string(),
        trials: stats.trials(),
        avg_wagered: stats.mean_wagered(),
        avg_return: stats.avg_return(),
        house_edge: stats.house_edge(),
        stderr: stats.stderr(),
    })
}

/// Drive one crash round with a real interval of `tick_ms`, advancing the
/// engine's clock by the same step each tick, until it resolves.
pub async fn drive_crash(
    engine: &mut Engine,
    stake: u64,
    auto_cash_out: Option<Multiplier>,
    tick_ms: u64,
) -> anyhow::Result<WagerRound> {
    let id = engine
        .start(GameParams::Crash(CrashParams { auto_cash_out }), stake)
        .context("failed to start crash round")?;
    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));

    loop {
        let snapshot = engine.snapshot(id)?;
        if let Some(round) = snapshot.round {
            return Ok(round);
        }
        if let GameView::Crash { phase, .. } = snapshot.view {
            info!(session = id, clock = engine.clock_ms(), ?phase, "tick");
        }
        interval.tick().await;
        engine.tick(tick_ms);
    }
}

/// Play `rounds` dice rounds at `stake` and return the encoded history.
pub fn play_history(engine: &mut Engine, rounds: u64, stake: u64) -> anyhow::Result<Vec<u8>> {
    let params = GameParams::Dice(DiceParams {
        target: 50,
        direction: Direction::Over,
    });
    for i in 0..rounds {
        let id = engine
            .start(params.clone(), stake)
            .with_context(|| format!("round {i}"))?;
        engine.act(id, Action::Roll)?;
        engine.reset(id)?;
    }
    Ok(engine.export_history())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub rounds: u64,
    pub wins: u64,
    pub losses: u64,
    pub pushes: u64,
    pub wagered: u128,
    pub paid: u128,
}

pub fn summarize(rounds: &[WagerRound]) -> HistorySummary {
    rounds.iter().fold(HistorySummary::default(), |mut s, r| {
        s.rounds += 1;
        match r.result {
            ResultTag::Win => s.wins += 1,
            ResultTag::Lose => s.losses += 1,
            ResultTag::Push => s.pushes += 1,
        }
        s.wagered += r.stake as u128;
        s.paid += r.payout as u128;
        s
    })
}
