//! Red Queen CLI - Command-line interface
//!
//! Commands:
//! - evolve: Run the red/blue coevolution loop
//! - battle: Fight a single battle between two lineups
//! - bench: Fight many seeded battles in parallel and tally the results

mod battle_cmd;
mod bench;
mod evolve;
mod lineup;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redqueen")]
#[command(about = "Red Queen coevolution of red and blue tank squads")]
#[command(version)]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coevolution loop
    Evolve(evolve::EvolveArgs),
    /// Fight a single battle
    Battle(battle_cmd::BattleArgs),
    /// Fight many seeded battles between fixed lineups
    Bench(bench::BenchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Evolve(args) => evolve::run(args, cli.seed).await,
        Commands::Battle(args) => battle_cmd::run(args, cli.seed).await,
        Commands::Bench(args) => bench::run(args, cli.seed),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
