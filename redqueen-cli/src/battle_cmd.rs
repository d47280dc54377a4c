//! Battle command - fight a single battle between two lineups
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load lineups, fight(), report_results()
//! - Level 3: print_team()

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use redqueen_core::{classify, BattleRecord, BattleResult, BattleSimulator, Genome, Team};
use redqueen_evolve::genome_name;
use redqueen_lab::{run_battle, BattleRun, ControlHandle, LabConfig};

use crate::lineup::{load_config, load_lineup};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BattleArgs {
    /// Red lineup: archetype name or genome JSON file
    #[arg(long, default_value = "berserker")]
    pub red: String,

    /// Blue lineup: archetype name or genome JSON file
    #[arg(long, default_value = "guardian")]
    pub blue: String,

    /// Tanks per side when a lineup is a single genome
    #[arg(long, default_value = "3")]
    pub count: usize,

    /// JSON config file for battle and runner settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the full battle result as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run battle command
///
/// 1. Load config and both lineups
/// 2. Drive one battle to completion
/// 3. Report the result
pub async fn run(args: BattleArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let red = load_lineup(&args.red, args.count).context("Failed to load red lineup")?;
    let blue = load_lineup(&args.blue, args.count).context("Failed to load blue lineup")?;
    let seed = seed.unwrap_or_else(rand::random);

    tracing::info!("Battle: {} red vs {} blue (seed {})", red.len(), blue.len(), seed);
    let run = fight(&config, &red, &blue, seed).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run.result)?);
    } else {
        report_results(&run, &red, &blue);
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

async fn fight(config: &LabConfig, red: &[Genome], blue: &[Genome], seed: u64) -> Result<BattleRun> {
    let mut sim = BattleSimulator::new(config.battle.clone(), seed);
    let run = run_battle(&mut sim, red, blue, &config.runner, &ControlHandle::running()).await?;
    Ok(run)
}

fn report_results(run: &BattleRun, red: &[Genome], blue: &[Genome]) {
    let result = &run.result;
    let record = BattleRecord::from_result(result, red, blue, 0, 0);

    println!();
    println!("=== Battle Result (seed {}) ===", result.seed);
    println!(
        "Winner: {:?} by {:?} after {:.1}s ({} ticks)",
        result.winner, result.victory_type, result.duration, result.ticks
    );
    if let Some(reason) = run.forced {
        println!("Forced stop: {:?}", reason);
    }
    println!("Survivors: red {} | blue {}", result.survivors.red, result.survivors.blue);

    print_team(result, Team::Red, red);
    print_team(result, Team::Blue, blue);

    let hill = &result.control_point_summary;
    println!();
    println!(
        "Hill: red {:.1}s | blue {:.1}s | contested {:.1}s | {} changes",
        hill.red_control_time, hill.blue_control_time, hill.contested_time, hill.control_changes
    );

    if let Some(team) = record.tactic_team {
        let tags: Vec<&str> = record.tactics.iter().map(|t| t.name()).collect();
        if !tags.is_empty() {
            println!("Tactics ({}): {}", team, tags.join(", "));
        }
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn print_team(result: &BattleResult, team: Team, lineup: &[Genome]) {
    let stats = result.team_stats(team);
    let tactics = result.tactical_metrics.get(team);

    println!();
    println!("{} team", team);
    println!(
        "  shots {}/{} ({:.0}%) | damage {:.0} dealt, {:.0} taken | kills {} | avg survival {:.1}s",
        stats.shots_hit,
        stats.shots_fired,
        stats.accuracy() * 100.0,
        stats.damage_dealt,
        stats.damage_taken,
        stats.kills,
        stats.average_survival_time
    );
    println!(
        "  coordination {:.2} | adaptability {:.2} | diversity {:.2}",
        tactics.coordination, tactics.adaptability, tactics.diversity
    );
    for (i, genome) in lineup.iter().enumerate() {
        println!("  [{}] {} ({})", i, genome_name(genome), classify(genome).name());
    }
}
