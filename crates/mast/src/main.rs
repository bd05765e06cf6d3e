use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mast::teams::{CycleScheduler, PaperExchange};

#[derive(Parser, Debug)]
#[command(name = "mast", about = "MAST - Master Agent Strategy Teams trading daemon")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/mast.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the cycle scheduler until interrupted
    Run,
    /// Execute a single cycle and print its summary
    Cycle {
        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Replace the active objective
    SetObjective { text: String },
    /// Show the active objective
    Objective,
    /// List recent decisions
    Decisions {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG; audit output goes to the store, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = mast::load_config(&cli.config)?;
    let store = mast::open_store(&config)?;

    match cli.command {
        Command::Run => {
            if !config.scheduler.enabled {
                tracing::warn!("scheduler is disabled in config, nothing to do");
                return Ok(());
            }
            let runtime =
                mast::build_runtime(&config, store, Arc::new(PaperExchange::new()));
            let scheduler = CycleScheduler::new(runtime);
            scheduler.start(config.scheduler.interval_seconds).await;

            tokio::signal::ctrl_c().await?;
            tracing::info!("received shutdown signal");
            scheduler.stop().await;
        }
        Command::Cycle { pretty } => {
            let runtime =
                mast::build_runtime(&config, store, Arc::new(PaperExchange::new()));
            let cycle = runtime.run_cycle().await;
            let output = if pretty {
                serde_json::to_string_pretty(&cycle)?
            } else {
                serde_json::to_string(&cycle)?
            };
            println!("{output}");
        }
        Command::SetObjective { text } => {
            let objective = store.set_active_objective(&text)?;
            println!("{}", serde_json::to_string_pretty(&objective)?);
        }
        Command::Objective => match store.active_objective()? {
            Some(objective) => println!("{}", serde_json::to_string_pretty(&objective)?),
            None => println!("no active objective"),
        },
        Command::Decisions { limit } => {
            let decisions = store.list_recent_decisions(limit)?;
            println!("{}", serde_json::to_string_pretty(&decisions)?);
        }
    }

    Ok(())
}
