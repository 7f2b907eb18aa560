//! Fairplay CLI
//!
//! Publish commitments, play seeded rounds and verify revealed outcomes.

use clap::{Parser, Subcommand, ValueEnum};
use fairplay::{
    config::{generate_sample_config, ConfigLoader},
    games::{
        baccarat::{BaccaratParams, BaccaratSide},
        dice::{DiceDirection, DiceParams},
        limbo::LimboParams,
        mines::{Coord, MinesParams},
    },
    seed::{hash_server_seed, SeedSession, ServerSeed},
    BetParams, BetRequest, EngineConfig, FairnessEngine, VerificationRecord, Verifier,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Provably-fair outcome engine
#[derive(Parser)]
#[command(name = "fairplay")]
#[command(about = "Commit, play and verify provably-fair game outcomes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SHA-256 commitment of a server seed
    Commit {
        /// Server seed, hex
        #[arg(long)]
        server_seed: String,
    },

    /// Open a session, play bets, rotate and print verification records
    Play {
        #[command(subcommand)]
        game: GameArgs,

        /// Number of bets
        #[arg(short, long, default_value = "1")]
        bets: u64,

        /// Amount per bet
        #[arg(short, long, default_value = "1.0")]
        amount: f64,

        /// Client seed (random when omitted)
        #[arg(long)]
        client_seed: Option<String>,

        /// Server seed, hex (random when omitted)
        #[arg(long)]
        server_seed: Option<String>,
    },

    /// Verify records written by `play`
    Verify {
        /// File with one record, or one record per line
        #[arg(short, long)]
        record: PathBuf,
    },

    /// Write the default configuration
    SampleConfig {
        #[arg(short, long, default_value = "fairplay.toml")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum GameArgs {
    Dice {
        #[arg(short, long)]
        target: f64,
        #[arg(short, long, value_enum, default_value = "under")]
        direction: Direction,
    },
    Limbo {
        #[arg(short, long)]
        target: f64,
    },
    Baccarat {
        #[arg(short, long, value_enum)]
        side: Side,
    },
    Mines {
        #[arg(long, default_value = "5")]
        width: u32,
        #[arg(long, default_value = "5")]
        height: u32,
        #[arg(short, long, default_value = "3")]
        mines: u32,
        /// Tiles to open in order, e.g. "0,0;1,2"
        #[arg(short, long)]
        picks: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Under,
    Over,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Player,
    Banker,
    Tie,
}

impl GameArgs {
    fn into_params(self) -> Result<BetParams, Box<dyn std::error::Error>> {
        Ok(match self {
            GameArgs::Dice { target, direction } => BetParams::Dice(DiceParams {
                target,
                direction: match direction {
                    Direction::Under => DiceDirection::Under,
                    Direction::Over => DiceDirection::Over,
                },
            }),
            GameArgs::Limbo { target } => BetParams::Limbo(LimboParams { target }),
            GameArgs::Baccarat { side } => BetParams::Baccarat(BaccaratParams {
                side: match side {
                    Side::Player => BaccaratSide::Player,
                    Side::Banker => BaccaratSide::Banker,
                    Side::Tie => BaccaratSide::Tie,
                },
            }),
            GameArgs::Mines {
                width,
                height,
                mines,
                picks,
            } => BetParams::Mines(MinesParams {
                width,
                height,
                mines,
                picks: parse_picks(&picks)?,
            }),
        })
    }
}

fn parse_picks(picks: &str) -> Result<Vec<Coord>, Box<dyn std::error::Error>> {
    picks
        .split(';')
        .filter(|p| !p.trim().is_empty())
        .map(|pair| -> Result<Coord, Box<dyn std::error::Error>> {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("pick '{}' must look like x,y", pair))?;
            Ok(Coord::new(x.trim().parse()?, y.trim().parse()?))
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "fairplay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    match cli.command {
        Commands::Commit { server_seed } => {
            let seed = ServerSeed::from_hex(&server_seed)?;
            println!("{}", hash_server_seed(seed.as_bytes()));
            Ok(())
        }
        Commands::Play {
            game,
            bets,
            amount,
            client_seed,
            server_seed,
        } => play(config, game, bets, amount, client_seed, server_seed),
        Commands::Verify { record } => verify(config, &record),
        Commands::SampleConfig { out } => {
            generate_sample_config(&out.to_string_lossy())?;
            info!("Wrote sample configuration to {}", out.display());
            Ok(())
        }
    }
}

fn play(
    config: EngineConfig,
    game: GameArgs,
    bets: u64,
    amount: f64,
    client_seed: Option<String>,
    server_seed: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = FairnessEngine::new(config)?;
    let commitment = match server_seed {
        Some(hex_seed) => {
            let client_seed = client_seed.unwrap_or_else(|| fairplay::seed::random_client_seed(16));
            engine.open_session(SeedSession::with_seeds(ServerSeed::from_hex(&hex_seed)?, client_seed)?)
        }
        None => engine.create_session(client_seed)?,
    };
    info!(
        "Session {} committed to {}",
        commitment.session_id, commitment.hashed_server_seed
    );

    let bet = BetRequest::new(amount, game.into_params()?);
    let mut outcomes = Vec::with_capacity(bets as usize);
    for nonce in 0..bets {
        let receipt = engine.resolve(commitment.session_id, nonce, &bet)?;
        outcomes.push(receipt.outcome);
    }

    let rotation = engine.rotate_seeds(commitment.session_id, None)?;
    info!("Revealed server seed {}", rotation.revealed_server_seed);

    for outcome in outcomes {
        let record = VerificationRecord {
            server_seed: rotation.revealed_server_seed.clone(),
            client_seed: outcome.client_seed.clone(),
            nonce: outcome.nonce,
            bet: bet.clone(),
            claimed: outcome,
        };
        println!("{}", serde_json::to_string(&record)?);
    }

    let totals = engine.metrics();
    info!("Played {} bets", totals.total_bets);
    Ok(())
}

fn verify(config: EngineConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<VerificationRecord> = match serde_json::from_str::<VerificationRecord>(&content) {
        Ok(record) => vec![record],
        Err(_) => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<VerificationRecord>)
            .collect::<Result<_, _>>()?,
    };

    let verifier = Verifier::new(config);
    let mut failures = 0;
    for record in &records {
        let report = verifier.verify(record);
        if !report.matches {
            failures += 1;
        }
        println!("{}", serde_json::to_string(&report)?);
    }

    if failures > 0 {
        return Err(format!("{} of {} records failed verification", failures, records.len()).into());
    }
    info!("All {} records verified", records.len());
    Ok(())
}
