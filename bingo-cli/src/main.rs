mod commands;

use bingo_core::config::DEFAULT_CONFIG_PATH;
use bingo_core::BingoError;
use bingo_game::GameError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bingo")]
#[command(about = "On-chain bingo bot - player wallets, tickets and round monitoring")]
#[command(version)]
struct Cli {
    /// Path of the JSON configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the game contract until Ctrl-C
    Run,

    /// Show the deterministic wallet address of players
    Address {
        /// Player IDs
        #[arg(required = true)]
        players: Vec<u64>,
    },

    /// Export a player's wallet as a PEM file
    Pem {
        /// Player ID
        player: u64,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the current round
    Round {
        /// Print the round as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a ticket payload
    Ticket {
        /// Hex encoded ticket
        ticket: String,
        /// Hex encoded extracted-number set to strike through
        #[arg(short, long)]
        extracted: Option<String>,
    },

    /// Buy tickets for a player and wait for them to settle
    Buy {
        /// Player ID
        player: u64,
        /// Number of tickets
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "bingo={l},bingo_core={l},bingo_game={l}",
            l = log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ctx = commands::Context::new(cli.config_path);

    // Execute command
    let result = match cli.command {
        Commands::Run => commands::game::run(&ctx).await,
        Commands::Address { players } => commands::wallet::show_addresses(&ctx, &players).await,
        Commands::Pem { player, output } => {
            commands::wallet::export_pem(&ctx, player, output.as_deref()).await
        }
        Commands::Round { json } => commands::game::show_round(&ctx, json).await,
        Commands::Ticket { ticket, extracted } => {
            commands::ticket::show_ticket(&ticket, extracted.as_deref())
        }
        Commands::Buy { player, count } => commands::game::buy(&ctx, player, count).await,
    };

    if let Err(e) = result {
        let core = e.downcast_ref::<BingoError>().or_else(|| match e.downcast_ref::<GameError>() {
            Some(GameError::Core(inner)) => Some(inner),
            _ => None,
        });

        match (e.downcast_ref::<GameError>(), core) {
            (Some(GameError::InsufficientBalance { need, available, unit }), _) => {
                eprintln!("Error: Insufficient balance");
                eprintln!("Need: {} {}, Available: {} {}", need, unit, available, unit);
            }
            (Some(GameError::WatchTimeout { hash, attempts }), _) => {
                eprintln!("Error: Transaction {} did not settle after {} polls", hash, attempts);
            }
            (_, Some(BingoError::Config(msg))) => {
                eprintln!("Error: Invalid configuration: {}", msg);
                eprintln!("Check {}", ctx.config_path().display());
            }
            (_, Some(BingoError::Derivation(msg))) => {
                eprintln!("Error: Cannot derive wallets: {}", msg);
                eprintln!("Check the seed phrase in {}", ctx.config_path().display());
            }
            _ => {
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
