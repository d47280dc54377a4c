//! Bench - many independent battles between two fixed lineups
//!
//! Level 2 - Phase-level implementation
//!
//! Battles are seeded `base_seed + i`, so sequential and parallel runs
//! agree. The bench never touches a candidate pool.

use rayon::prelude::*;
use redqueen_core::{BattleConfig, BattleResult, BattleSimulator, BattleState, Genome, VictoryType, Winner};
use serde::Serialize;

/// Tally of a batch of battles
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BenchResult {
    pub red_wins: u32,
    pub blue_wins: u32,
    pub draws: u32,
    pub timeouts: u32,
    /// Wins (either side) decided by holding the hill
    pub control_wins: u32,
    pub avg_duration: f32,
    pub battles_played: u32,
}

impl BenchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold one finished battle into the tally
    fn record(&mut self, result: &BattleResult) {
        let total = self.battles_played + 1;
        self.avg_duration = (self.avg_duration * self.battles_played as f32 + result.duration) / total as f32;
        self.battles_played = total;

        match result.winner {
            Winner::Red => self.red_wins += 1,
            Winner::Blue => self.blue_wins += 1,
            Winner::Draw => self.draws += 1,
            Winner::Timeout => self.timeouts += 1,
        }
        if result.victory_type == VictoryType::Control {
            self.control_wins += 1;
        }
    }

    pub fn red_win_rate(&self) -> f32 {
        rate(self.red_wins, self.battles_played)
    }

    pub fn blue_win_rate(&self) -> f32 {
        rate(self.blue_wins, self.battles_played)
    }

    /// Share of battles that ended without an eliminating or hill-holding winner
    pub fn unresolved_rate(&self) -> f32 {
        rate(self.draws + self.timeouts, self.battles_played)
    }
}

fn rate(count: u32, total: u32) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32
    }
}

/// Play `battles` battles one after another
pub fn run_bench(
    config: &BattleConfig,
    red: &[Genome],
    blue: &[Genome],
    battles: usize,
    base_seed: u64,
    frame_dt: f32,
) -> BenchResult {
    let results: Vec<BattleResult> = (0..battles)
        .filter_map(|i| play_single_battle(config, red, blue, base_seed.wrapping_add(i as u64), frame_dt))
        .collect();
    aggregate_results(&results)
}

/// Play `battles` battles across the rayon thread pool
pub fn run_bench_parallel(
    config: &BattleConfig,
    red: &[Genome],
    blue: &[Genome],
    battles: usize,
    base_seed: u64,
    frame_dt: f32,
) -> BenchResult {
    let results: Vec<BattleResult> = (0..battles)
        .into_par_iter()
        .filter_map(|i| play_single_battle(config, red, blue, base_seed.wrapping_add(i as u64), frame_dt))
        .collect();
    aggregate_results(&results)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Run one battle to the end on the calling thread
pub fn play_single_battle(
    config: &BattleConfig,
    red: &[Genome],
    blue: &[Genome],
    seed: u64,
    frame_dt: f32,
) -> Option<BattleResult> {
    let mut sim = BattleSimulator::new(config.clone(), seed);
    sim.start(red, blue);

    // Clock guard and max duration bound the battle; this bounds a stuck one
    let frame_dt = frame_dt.clamp(1e-3, config.max_dt.max(1e-3));
    let frame_cap = ((config.max_duration * 4.0) / frame_dt).ceil() as u64 + 1;
    let mut frames = 0u64;
    while sim.tick(frame_dt) != BattleState::Ended {
        frames += 1;
        if frames >= frame_cap {
            sim.force_timeout();
            break;
        }
    }

    let result = sim.take_result();
    if result.is_none() {
        tracing::warn!(seed, "Battle ended without a result");
    }
    result
}

fn aggregate_results(results: &[BattleResult]) -> BenchResult {
    let mut tally = BenchResult::empty();
    for r in results {
        tally.record(r);
    }
    tally
}
