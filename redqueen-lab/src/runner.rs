//! Battle runner - drives one simulator to completion as a future
//!
//! Level 3 - Step-level implementation
//!
//! The simulator has no clock of its own. The runner feeds it fixed
//! frames, yields to the executor every few frames, and forces a timeout
//! if the battle outlives its frame or wall-clock budget. While the
//! control handle is paused the simulator is paused too and no frames
//! are fed; paused time does not count against the wall-clock budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redqueen_core::{BattleResult, BattleSimulator, BattleState, Genome};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::config::RunnerConfig;

// ============================================================================
// CONTROL
// ============================================================================

/// Shared running flag; clones control the same loop and battle
#[derive(Clone, Debug, Default)]
pub struct ControlHandle {
    running: Arc<AtomicBool>,
    resumed: Arc<Notify>,
}

impl ControlHandle {
    /// A handle that starts out running, for standalone battles
    pub fn running() -> Self {
        let handle = Self::default();
        handle.start();
        handle
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Resolve once the handle is running
    pub async fn wait_running(&self) {
        loop {
            // Register before checking so a start() in between is not missed
            let resumed = self.resumed.notified();
            if self.is_running() {
                return;
            }
            resumed.await;
        }
    }
}

// ============================================================================
// RUNNER
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("battle ended without producing a result")]
    MissingResult,
}

/// Why the runner cut a battle short
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForcedStop {
    WallClock,
    FrameCap,
}

/// Outcome of one driven battle
#[derive(Clone, Debug)]
pub struct BattleRun {
    pub result: BattleResult,
    /// Frames fed to the simulator
    pub frames: u64,
    pub forced: Option<ForcedStop>,
    /// Time spent running, excluding pauses
    pub wall_time: Duration,
}

/// Start a battle and await its completion.
///
/// # Arguments
/// * `sim` - Simulator; any battle in progress is discarded
/// * `red` - Red lineup
/// * `blue` - Blue lineup
/// * `config` - Frame size, yield cadence and budgets
/// * `control` - Pausing it suspends the battle on its current clock
///
/// # Returns
/// The battle result, natural or forced
pub async fn run_battle(
    sim: &mut BattleSimulator,
    red: &[Genome],
    blue: &[Genome],
    config: &RunnerConfig,
    control: &ControlHandle,
) -> Result<BattleRun, RunnerError> {
    let began = Instant::now();
    let mut deadline = began + Duration::from_millis(config.wall_clock_limit_ms);
    let mut paused_for = Duration::ZERO;
    let yield_every = u64::from(config.yield_every.max(1));

    sim.start(red, blue);
    let mut frames = 0u64;
    let mut forced = None;

    while sim.state() != BattleState::Ended {
        if !control.is_running() {
            sim.pause();
            tracing::debug!(frames, elapsed = sim.elapsed(), "Battle paused");
            let paused_at = Instant::now();
            control.wait_running().await;
            let waited = paused_at.elapsed();
            paused_for += waited;
            deadline += waited;
            sim.resume();
            tracing::debug!(frames, elapsed = sim.elapsed(), "Battle resumed");
        }
        if frames >= config.max_frames {
            tracing::warn!(frames, "Battle hit frame cap");
            forced = Some(ForcedStop::FrameCap);
            sim.force_timeout();
            break;
        }
        if Instant::now() >= deadline {
            tracing::warn!(frames, "Battle hit wall-clock limit");
            forced = Some(ForcedStop::WallClock);
            sim.force_timeout();
            break;
        }
        sim.tick(config.frame_dt);
        frames += 1;
        if frames % yield_every == 0 {
            tokio::task::yield_now().await;
        }
    }

    let result = sim.take_result().ok_or(RunnerError::MissingResult)?;
    tracing::debug!(
        winner = ?result.winner,
        duration = result.duration,
        frames,
        "Battle finished"
    );

    Ok(BattleRun {
        result,
        frames,
        forced,
        wall_time: began.elapsed().saturating_sub(paused_for),
    })
}
