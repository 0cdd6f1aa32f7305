//! Giftwire - Gift Exchange Simulation
//!
//! Narrated demonstrations of box management, concurrent delivery, and
//! trait matching over a shared in-memory register.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use giftwire_simulation::scenarios;

#[derive(Parser)]
#[command(
    name = "giftwire",
    about = "Cross-game gift exchange simulation",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the narrated two-player exchange with a refund
    Exchange,

    /// Hammer one gift box with concurrent senders
    Concurrent {
        /// Number of concurrent senders
        #[arg(short, long, default_value = "4")]
        senders: usize,

        /// Gifts sent by each sender
        #[arg(short, long, default_value = "5")]
        gifts: usize,
    },

    /// Match sample gifts against registered trait wishes
    Matching,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Exchange => {
            scenarios::run_exchange_scenario().await?;
        }
        Commands::Concurrent { senders, gifts } => {
            let summary = scenarios::run_concurrent_scenario(senders, gifts).await?;
            if summary.landed != summary.expected {
                anyhow::bail!(
                    "lost gifts under contention: {} of {} landed",
                    summary.landed,
                    summary.expected
                );
            }
        }
        Commands::Matching => {
            scenarios::run_matching_scenario();
        }
    }

    Ok(())
}
