//! Evolution command - run the red/blue coevolution loop
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), run_evolution(), save_results()
//! - Level 3: import_candidates(), summarize(), champion()
//! - Level 4: file I/O, formatting utilities

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use redqueen_core::{classify, Archetype, CandidateRecord, Genome, Team, Winner};
use redqueen_evolve::candidate_label;
use redqueen_lab::{LabConfig, Orchestrator};

use crate::lineup::load_config;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct EvolveArgs {
    /// JSON config file (missing fields take defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of experiments (battles) to run
    #[arg(long, default_value = "50")]
    pub experiments: u64,

    /// Experiments per generation
    #[arg(long)]
    pub experiments_per_generation: Option<u32>,

    /// Genomes proposed per team per experiment
    #[arg(long)]
    pub proposals: Option<usize>,

    /// Per-trait mutation rate (0.0-1.0)
    #[arg(long)]
    pub mutation_rate: Option<f32>,

    /// Crossover rate (0.0-1.0)
    #[arg(long)]
    pub crossover_rate: Option<f32>,

    /// Share of proposals kept as unmutated elites (0.0-1.0)
    #[arg(long)]
    pub elite_fraction: Option<f32>,

    /// Tournament size for parent selection
    #[arg(long)]
    pub tournament_size: Option<usize>,

    /// Candidates kept per team
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Battle time limit in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Seed the pool from a JSON array of candidate records
    #[arg(long, value_name = "FILE")]
    pub import: Option<PathBuf>,

    /// Write the run summary to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

/// Best candidate of one team at the end of a run
#[derive(Serialize)]
struct Champion {
    /// Team-prefixed name, e.g. "red:iron-wolf"
    label: String,
    fitness: f32,
    archetype: Archetype,
    battles: u32,
    wins: u32,
    genome: Genome,
}

/// What a run produced, written as JSON
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    finished_at: String,
    seed: u64,
    experiments: u64,
    generations: u32,
    red_wins: u32,
    blue_wins: u32,
    draws: u32,
    timeouts: u32,
    forced_stops: u32,
    best_red: Option<Champion>,
    best_blue: Option<Champion>,
    pool: Vec<CandidateRecord>,
}

#[derive(Default)]
struct Tally {
    red_wins: u32,
    blue_wins: u32,
    draws: u32,
    timeouts: u32,
    forced_stops: u32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run evolution command
///
/// This function reads like a table of contents:
/// 1. Build the lab configuration
/// 2. Create the orchestrator and import candidates
/// 3. Run experiments until done or interrupted
/// 4. Save and print results
pub async fn run(args: EvolveArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;
    tracing::info!(
        "Starting evolution: seed={}, experiments={}, {} per generation",
        config.seed,
        args.experiments,
        config.experiments_per_generation
    );

    let mut orchestrator = Orchestrator::new(config);
    if let Some(path) = &args.import {
        import_candidates(&mut orchestrator, path)?;
    }

    let tally = run_evolution(&mut orchestrator, &args).await?;
    let summary = summarize(&orchestrator, &tally);

    save_results(&summary, &args)?;
    print_summary(&summary);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file (or defaults), then command-line overrides
fn build_config(args: &EvolveArgs, seed: Option<u64>) -> Result<LabConfig> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(s) = seed {
        config.seed = s;
    }
    if let Some(k) = args.experiments_per_generation {
        config.experiments_per_generation = k;
    }
    if let Some(n) = args.proposals {
        config.research.proposals_per_team = n;
    }
    if let Some(rate) = args.mutation_rate {
        config.research.mutation.rate = rate;
    }
    if let Some(rate) = args.crossover_rate {
        config.research.crossover_rate = rate;
    }
    if let Some(fraction) = args.elite_fraction {
        config.research.elite_fraction = fraction;
    }
    if let Some(k) = args.tournament_size {
        config.research.tournament_size = k;
    }
    if let Some(n) = args.pool_size {
        config.pool.per_team_cap = n;
    }
    if let Some(d) = args.max_duration {
        config.battle.max_duration = d;
    }

    config.validate().context("Invalid evolution settings")?;
    Ok(config)
}

/// Step the orchestrator with a progress bar; Ctrl-C stops after the current battle
async fn run_evolution(orchestrator: &mut Orchestrator, args: &EvolveArgs) -> Result<Tally> {
    let progress = create_progress_bar(args.experiments, args.quiet);
    let control = orchestrator.control();

    // Checked between battles; the handle stays running
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current battle");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let mut tally = Tally::default();
    control.start();
    for _ in 0..args.experiments {
        if interrupted.load(Ordering::SeqCst) {
            break;
        }
        let report = orchestrator.step().await?;

        match report.result.winner {
            Winner::Red => tally.red_wins += 1,
            Winner::Blue => tally.blue_wins += 1,
            Winner::Draw => tally.draws += 1,
            Winner::Timeout => tally.timeouts += 1,
        }
        if report.forced.is_some() {
            tally.forced_stops += 1;
        }

        progress.inc(1);
        progress.set_message(format!(
            "gen {} | {:?} in {:.1}s",
            orchestrator.generation(),
            report.result.winner,
            report.result.duration
        ));
    }
    control.pause();
    progress.finish_with_message(format!("{} generations", orchestrator.generation()));

    Ok(tally)
}

/// Write the summary file and/or print JSON
fn save_results(summary: &RunSummary, args: &EvolveArgs) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;

    if let Some(path) = &args.output {
        write_file(path, &json)?;
        tracing::info!("Saved summary to {}", path.display());
    }
    if args.json {
        println!("{}", json);
    }

    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Load candidate records and hand them to the pool
fn import_candidates(orchestrator: &mut Orchestrator, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<CandidateRecord> =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse candidates in {}", path.display()))?;
    let offered = records.len();
    let accepted = orchestrator.import(records);
    tracing::info!("Imported {}/{} candidates from {}", accepted, offered, path.display());
    Ok(())
}

fn summarize(orchestrator: &Orchestrator, tally: &Tally) -> RunSummary {
    RunSummary {
        finished_at: chrono::Utc::now().to_rfc3339(),
        seed: orchestrator.config().seed,
        experiments: orchestrator.experiment(),
        generations: orchestrator.generation(),
        red_wins: tally.red_wins,
        blue_wins: tally.blue_wins,
        draws: tally.draws,
        timeouts: tally.timeouts,
        forced_stops: tally.forced_stops,
        best_red: champion(orchestrator, Team::Red),
        best_blue: champion(orchestrator, Team::Blue),
        pool: orchestrator.pool().records(),
    }
}

fn champion(orchestrator: &Orchestrator, team: Team) -> Option<Champion> {
    orchestrator.pool().best(team).map(|c| Champion {
        label: candidate_label(team, c.genome()),
        fitness: c.fitness(),
        archetype: classify(c.genome()),
        battles: c.battles(),
        wins: c.wins(),
        genome: *c.genome(),
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Evolution Summary ===");
    println!("Experiments: {} ({} generations)", summary.experiments, summary.generations);
    println!(
        "Outcomes:    red {} | blue {} | draw {} | timeout {}",
        summary.red_wins, summary.blue_wins, summary.draws, summary.timeouts
    );
    if summary.forced_stops > 0 {
        println!("Forced:      {}", summary.forced_stops);
    }
    for (label, champ) in [("Best red", &summary.best_red), ("Best blue", &summary.best_blue)] {
        if let Some(c) = champ {
            println!(
                "{:<12} {} ({}) fitness={:.3} wins={}/{}",
                format!("{}:", label),
                c.label,
                c.archetype.name(),
                c.fitness,
                c.wins,
                c.battles
            );
        }
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn create_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> EvolveArgs {
        EvolveArgs {
            config: None,
            experiments: 10,
            experiments_per_generation: Some(2),
            proposals: Some(4),
            mutation_rate: Some(1.5),
            crossover_rate: None,
            elite_fraction: None,
            tournament_size: Some(5),
            pool_size: Some(6),
            max_duration: Some(60.0),
            import: None,
            output: None,
            json: false,
            quiet: true,
        }
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let config = build_config(&args(), Some(7)).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.experiments_per_generation, 2);
        assert_eq!(config.research.proposals_per_team, 4);
        assert_eq!(config.research.tournament_size, 5);
        assert_eq!(config.pool.per_team_cap, 6);
        assert_eq!(config.battle.max_duration, 60.0);
        // Out-of-range rates are clamped by validation
        assert_eq!(config.research.mutation.rate, 1.0);
    }

    #[test]
    fn test_champion_is_labelled_by_team() {
        let orchestrator = Orchestrator::new(LabConfig::default());
        for team in Team::ALL {
            let champ = champion(&orchestrator, team).unwrap();
            assert!(champ.label.starts_with(&format!("{}:", team)));
            assert_eq!(champ.archetype, classify(&champ.genome));
        }
    }
}
