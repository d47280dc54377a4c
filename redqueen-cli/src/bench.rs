//! Bench command - many seeded battles between two fixed lineups
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_bench / run_bench_parallel (library), report_results()
//! - Level 4: timing utilities, formatting

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use redqueen_lab::{run_bench, run_bench_parallel, BenchResult};

use crate::lineup::{load_config, load_lineup};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Red lineup: archetype name or genome JSON file
    #[arg(long, default_value = "berserker")]
    pub red: String,

    /// Blue lineup: archetype name or genome JSON file
    #[arg(long, default_value = "guardian")]
    pub blue: String,

    /// Tanks per side when a lineup is a single genome
    #[arg(long, default_value = "3")]
    pub count: usize,

    /// Number of battles
    #[arg(long, default_value = "100")]
    pub battles: usize,

    /// Run battles on one thread
    #[arg(long)]
    pub sequential: bool,

    /// JSON config file for battle and runner settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BenchReport {
    base_seed: u64,
    parallel: bool,
    elapsed_ms: u128,
    battles_per_second: f64,
    result: BenchResult,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// 1. Load config and both lineups
/// 2. Fight the battles, timed
/// 3. Report the tally
pub fn run(args: BenchArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let red = load_lineup(&args.red, args.count).context("Failed to load red lineup")?;
    let blue = load_lineup(&args.blue, args.count).context("Failed to load blue lineup")?;
    let base_seed = seed.unwrap_or_else(rand::random);
    let frame_dt = config.runner.frame_dt;

    tracing::info!(
        "Bench: {} battles, {} red vs {} blue, base seed {}",
        args.battles,
        red.len(),
        blue.len(),
        base_seed
    );

    let started = Instant::now();
    let result = if args.sequential {
        run_bench(&config.battle, &red, &blue, args.battles, base_seed, frame_dt)
    } else {
        run_bench_parallel(&config.battle, &red, &blue, args.battles, base_seed, frame_dt)
    };
    let elapsed = started.elapsed();

    let report = BenchReport {
        base_seed,
        parallel: !args.sequential,
        elapsed_ms: elapsed.as_millis(),
        battles_per_second: per_second(result.battles_played as usize, elapsed),
        result,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report_results(&report, &args);
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn report_results(report: &BenchReport, args: &BenchArgs) {
    let r = &report.result;
    println!();
    println!("=== Bench: {} vs {} ===", args.red, args.blue);
    println!("{:<12} {:>8} {:>8}", "Outcome", "Count", "Rate");
    println!("{}", "-".repeat(30));
    println!("{:<12} {:>8} {:>7.1}%", "Red wins", r.red_wins, r.red_win_rate() * 100.0);
    println!("{:<12} {:>8} {:>7.1}%", "Blue wins", r.blue_wins, r.blue_win_rate() * 100.0);
    println!("{:<12} {:>8} {:>7.1}%", "Unresolved", r.draws + r.timeouts, r.unresolved_rate() * 100.0);
    println!("{}", "-".repeat(30));
    println!("Hill victories: {}", r.control_wins);
    println!("Avg duration:   {:.1}s", r.avg_duration);
    println!(
        "Throughput:     {:.1} battles/s ({}, {} ms)",
        report.battles_per_second,
        if report.parallel { "parallel" } else { "sequential" },
        report.elapsed_ms
    );
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn per_second(count: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
