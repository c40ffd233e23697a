//! Dice10k command line
//!
//! `play` runs an interactive round loop on stdin against an in-memory
//! ledger, `simulate` prints a JSON report of many greedy rounds and
//! `init-config` writes a sample configuration file.

use clap::{Parser, Subcommand};
use dice10k::{
    common::{
        config::{generate_sample_config, ConfigLoader},
        memory::{InMemoryHistoryLog, InMemoryLedger, TracingNotificationSink},
        traits::Ledger,
    },
    config::GameConfig,
    games::{
        simulation::{simulate, SimulationConfig},
        ActionReport, GameEvent, GameSession, Phase, RngDieSource, RoundSnapshot,
    },
    logging::init_logging,
};
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Dice10k CLI
#[derive(Parser)]
#[command(name = "dice10k")]
#[command(about = "Single-player 10,000 dice game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively on stdin
    Play {
        /// Seed for the dice; random when omitted
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Simulate rounds with a greedy strategy
    Simulate {
        /// Number of rounds
        #[arg(short, long, default_value = "1000")]
        rounds: usize,

        /// Dice seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Stake per round
        #[arg(long, default_value = "100")]
        stake: u64,
    },

    /// Write a sample configuration file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "dice10k.toml")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    init_logging(level);

    match cli.command {
        Commands::Play { seed } => run_play(config, seed).await,
        Commands::Simulate { rounds, seed, stake } => {
            let report = simulate(
                &config,
                SimulationConfig {
                    rounds,
                    seed,
                    stake,
                    ..Default::default()
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::InitConfig { path } => {
            generate_sample_config(&path)?;
            println!("Sample configuration written to {}", path);
            Ok(())
        }
    }
}

const HELP: &str = "commands: bet [amount] | + | - | toggle <1-6> | roll | bank | retry | state | balance | help | quit";

async fn run_play(config: GameConfig, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let dice = match seed {
        Some(seed) => RngDieSource::seeded(seed),
        None => RngDieSource::from_entropy(),
    };
    let ledger = Arc::new(InMemoryLedger::new(config.betting.starting_balance));
    let mut session = GameSession::new(
        &config,
        dice,
        ledger.clone(),
        Arc::new(InMemoryHistoryLog::new()),
        Arc::new(TracingNotificationSink),
    );

    info!(balance = config.betting.starting_balance, "Table open");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else { continue };
        let arg = words.next();

        let result = match command {
            "bet" => match arg.map(str::parse::<u64>) {
                Some(Ok(amount)) => session.place_bet(amount).await,
                Some(Err(_)) => {
                    println!("bet amount must be a number");
                    continue;
                }
                None => session.place_current_bet().await,
            },
            "+" => {
                match session.increase_bet().await {
                    Ok(amount) => println!("bet: {}", amount),
                    Err(e) => println!("{}", e),
                }
                continue;
            }
            "-" => {
                match session.decrease_bet() {
                    Ok(amount) => println!("bet: {}", amount),
                    Err(e) => println!("{}", e),
                }
                continue;
            }
            "toggle" | "t" => match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(n) if n >= 1 => session.toggle_selection(n - 1),
                _ => {
                    println!("toggle needs a die number 1-6");
                    continue;
                }
            },
            "roll" | "r" => session.roll_again().await,
            "bank" | "b" => session.bank_score().await,
            "retry" => session.retry_settlement().await,
            "state" | "s" => {
                print_snapshot(&session.snapshot());
                continue;
            }
            "balance" => {
                println!("balance: {}", ledger.balance().await?);
                continue;
            }
            "help" | "?" => {
                println!("{}", HELP);
                continue;
            }
            "quit" | "q" => break,
            other => {
                println!("unknown command: {}", other);
                continue;
            }
        };

        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                error!(error = %e, "Action rejected");
                println!("{}", e);
            }
        }

        if let Some(deadline) = session.reset_deadline() {
            tokio::time::sleep_until(deadline).await;
            if let Some(report) = session.tick(tokio::time::Instant::now())? {
                print_report(&report);
            }
            println!("balance: {}", ledger.balance().await?);
        }
    }

    Ok(())
}

fn print_report(report: &ActionReport) {
    for event in &report.events {
        match event {
            GameEvent::Farkle { lost_score } => println!("FARKLE! lost {} points", lost_score),
            GameEvent::Won { banked_score } => println!("WIN with {} points", banked_score),
            GameEvent::Banked { points, banked_score, .. } => {
                println!("banked {} (total {})", points, banked_score)
            }
            GameEvent::Rolled { hot_dice: true, .. } => println!("hot dice!"),
            GameEvent::RoundFinished { settlement } => {
                println!("round over: {} pays {}", settlement.outcome, settlement.payout)
            }
            _ => {}
        }
    }
    print_snapshot(&report.snapshot);
}

fn print_snapshot(snapshot: &RoundSnapshot) {
    let state = &snapshot.state;
    if state.phase != Phase::Rolling {
        println!("[{}] stake {}", state.phase, state.stake);
        return;
    }

    let dice: Vec<String> = (0..state.dice.dice().len())
        .map(|p| {
            let face = state.dice.get(p);
            if state.held.contains(p) {
                format!("({})", face)
            } else if state.selected.contains(p) {
                format!("[{}]", face)
            } else {
                format!(" {} ", face)
            }
        })
        .collect();

    println!("dice: {}", dice.join(""));
    println!(
        "banked {} | selection {} | need {} | remaining {}",
        state.banked_score, snapshot.selection_score, state.min_to_board, snapshot.dice_remaining
    );
    match &snapshot.bank_blocker {
        None => println!("bank available"),
        Some(blocker) => println!("cannot bank: {}", blocker),
    }
}
