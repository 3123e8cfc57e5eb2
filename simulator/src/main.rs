use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use wager_execution::{Config, Engine, TracingFeed};
use wager_simulator::{
    drive_crash, exact_edges, play_history, simulate, summarize, ReportRow,
};
use wager_types::casino::{GameKind, Multiplier};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print reports as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate each game's house edge.
    Edge {
        #[arg(short, long, default_value_t = 100_000)]
        trials: u64,

        /// Only simulate this game.
        #[arg(short, long)]
        game: Option<GameKind>,
    },
    /// Play one live crash round.
    Crash {
        #[arg(short, long, default_value_t = 100)]
        stake: u64,

        /// Cash out automatically at this multiplier (e.g. 2.5).
        #[arg(short, long)]
        auto: Option<f64>,

        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },
    /// Play dice rounds and write the encoded history.
    History {
        #[arg(short, long, default_value_t = 100)]
        rounds: u64,

        #[arg(short, long, default_value_t = 10)]
        stake: u64,

        #[arg(short, long)]
        out: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Config::from_yaml(&yaml).with_context(|| format!("failed to parse {}", path.display()))
}

fn to_multiplier(value: f64) -> anyhow::Result<Multiplier> {
    if !value.is_finite() || value <= 1.0 {
        return Err(anyhow!("auto cash out must be above 1.00, got {value}"));
    }
    Ok(Multiplier::from_hundredths((value * 100.0).round() as u64))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load and validate config
    let config = load_config(args.config.as_ref())?
        .validate()
        .context("invalid configuration")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    match args.command {
        Command::Edge { trials, game } => {
            let games: Vec<GameKind> = match game {
                Some(kind) => vec![kind],
                None => GameKind::ALL.to_vec(),
            };
            let rows = games
                .into_iter()
                .map(|kind| simulate(&config.rules, &config.seed, kind, trials))
                .collect::<anyhow::Result<Vec<ReportRow>>>()?;
            let exact = exact_edges(&config.rules.payouts)?;
            for row in &exact {
                info!(table = %row.table, expected = row.expected, "exact return");
            }

            if args.json {
                let report = serde_json::json!({ "simulated": rows, "exact": exact });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", ReportRow::CSV_HEADER);
                for row in &rows {
                    println!("{}", row.csv());
                }
            }
        }
        Command::Crash {
            stake,
            auto,
            tick_ms,
        } => {
            let auto = auto.map(to_multiplier).transpose()?;
            let mut engine = Engine::new(config).with_feed(TracingFeed);
            let round = drive_crash(&mut engine, stake, auto, tick_ms).await?;
            if args.json {
                let report = serde_json::json!({
                    "session": round.session_id,
                    "stake": round.stake,
                    "multiplier": round.multiplier.to_string(),
                    "payout": round.payout,
                    "balance": engine.get_balance(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "crash round {}: staked {}, paid {} at {} (balance {})",
                    round.session_id,
                    round.stake,
                    round.payout,
                    round.multiplier,
                    engine.get_balance()
                );
            }
        }
        Command::History { rounds, stake, out } => {
            let mut engine = Engine::new(config);
            let bytes = play_history(&mut engine, rounds, stake)?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), bytes = bytes.len(), "history written");

            let summary = summarize(&engine.get_history(rounds as usize));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} rounds ({} won, {} lost), wagered {}, paid {}",
                    summary.rounds, summary.wins, summary.losses, summary.wagered, summary.paid
                );
            }
        }
    }

    Ok(())
}
