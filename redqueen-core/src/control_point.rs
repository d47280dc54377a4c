//! Control point ("hill") - capture-and-hold objective
//!
//! Progress always belongs to `controlling_team`. A lone team on the hill
//! raises its own progress, or first wears down the other team's progress
//! before taking over. Holding 100% accrues control time and a streak; a
//! long enough streak wins the battle.

use serde::{Deserialize, Serialize};

use crate::arena::Vec2;
use crate::team::Team;

/// Maximum capture progress
pub const FULL_CONTROL: f32 = 100.0;

/// Decay multiplier while both teams contest the hill
const CONTEST_DECAY: f32 = 0.5;

/// Decay multiplier while the hill is empty
const IDLE_DECAY: f32 = 0.1;

/// Ownership change, recorded for the battle timeline
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    pub time: f32,
    pub team: Team,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlPoint {
    pub position: Vec2,
    pub radius: f32,
    /// Seconds for a lone team to go from 0 to 100
    capture_time: f32,
    controlling_team: Option<Team>,
    /// Last team to take ownership, survives progress draining to zero
    last_owner: Option<Team>,
    progress: f32,
    control_time: [f32; 2],
    current_streak: f32,
    max_streak: [f32; 2],
    control_changes: u32,
    contested_time: f32,
    timeline: Vec<ControlEvent>,
}

impl ControlPoint {
    pub fn new(position: Vec2, radius: f32, capture_time: f32) -> Self {
        Self {
            position,
            radius,
            capture_time: capture_time.max(0.1),
            controlling_team: None,
            last_owner: None,
            progress: 0.0,
            control_time: [0.0; 2],
            current_streak: 0.0,
            max_streak: [0.0; 2],
            control_changes: 0,
            contested_time: 0.0,
            timeline: Vec::new(),
        }
    }

    /// Restore the start-of-battle state, keeping geometry
    pub fn reset(&mut self) {
        *self = Self::new(self.position, self.radius, self.capture_time);
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.position.distance(p) <= self.radius
    }

    // ========================================================================
    // TICK
    // ========================================================================

    /// Advance by `dt` seconds given how many living tanks of each team are
    /// inside the radius. `now` is the battle clock, used for the timeline.
    pub fn update(&mut self, red_present: usize, blue_present: usize, dt: f32, now: f32) {
        let rate = FULL_CONTROL / self.capture_time;

        match (red_present > 0, blue_present > 0) {
            (true, true) => {
                self.contested_time += dt;
                self.decay(rate * CONTEST_DECAY * dt);
            }
            (false, false) => {
                self.decay(rate * IDLE_DECAY * dt);
            }
            (true, false) => self.advance(Team::Red, rate * dt, dt, now),
            (false, true) => self.advance(Team::Blue, rate * dt, dt, now),
        }

        self.progress = self.progress.clamp(0.0, FULL_CONTROL);
    }

    fn advance(&mut self, team: Team, amount: f32, dt: f32, now: f32) {
        match self.controlling_team {
            Some(owner) if owner != team => {
                // Neutralise the other team's claim first
                self.progress -= amount;
                self.current_streak = 0.0;
                if self.progress <= 0.0 {
                    self.progress = 0.0;
                    self.take_ownership(team, now);
                }
            }
            Some(_) => {
                self.progress = (self.progress + amount).min(FULL_CONTROL);
                if self.progress >= FULL_CONTROL {
                    self.accrue(team, dt);
                }
            }
            None => {
                self.take_ownership(team, now);
                self.progress = (self.progress + amount).min(FULL_CONTROL);
            }
        }
    }

    fn take_ownership(&mut self, team: Team, now: f32) {
        self.controlling_team = Some(team);
        if self.last_owner != Some(team) {
            self.control_changes += 1;
            self.last_owner = Some(team);
            self.timeline.push(ControlEvent { time: now, team });
        }
        self.current_streak = 0.0;
    }

    fn accrue(&mut self, team: Team, dt: f32) {
        let i = team.index();
        self.control_time[i] += dt;
        self.current_streak += dt;
        if self.current_streak > self.max_streak[i] {
            self.max_streak[i] = self.current_streak;
        }
    }

    fn decay(&mut self, amount: f32) {
        self.current_streak = 0.0;
        if self.controlling_team.is_none() {
            return;
        }
        self.progress -= amount;
        if self.progress <= 0.0 {
            self.progress = 0.0;
            self.controlling_team = None;
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn controlling_team(&self) -> Option<Team> {
        self.controlling_team
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn control_changes(&self) -> u32 {
        self.control_changes
    }

    pub fn control_time(&self, team: Team) -> f32 {
        self.control_time[team.index()]
    }

    pub fn max_streak(&self, team: Team) -> f32 {
        self.max_streak[team.index()]
    }

    /// Team currently holding at full progress with its streak length
    pub fn holder(&self) -> Option<(Team, f32)> {
        match self.controlling_team {
            Some(team) if self.progress >= FULL_CONTROL => Some((team, self.current_streak)),
            _ => None,
        }
    }

    pub fn timeline(&self) -> &[ControlEvent] {
        &self.timeline
    }

    pub fn summary(&self) -> ControlPointSummary {
        ControlPointSummary {
            controlling_team: self.controlling_team,
            final_progress: self.progress,
            red_control_time: self.control_time[0],
            blue_control_time: self.control_time[1],
            red_max_streak: self.max_streak[0],
            blue_max_streak: self.max_streak[1],
            control_changes: self.control_changes,
            contested_time: self.contested_time,
            timeline: self.timeline.clone(),
        }
    }
}

/// End-of-battle view of the control point
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPointSummary {
    pub controlling_team: Option<Team>,
    pub final_progress: f32,
    pub red_control_time: f32,
    pub blue_control_time: f32,
    pub red_max_streak: f32,
    pub blue_max_streak: f32,
    pub control_changes: u32,
    pub contested_time: f32,
    pub timeline: Vec<ControlEvent>,
}

impl ControlPointSummary {
    pub fn control_time(&self, team: Team) -> f32 {
        match team {
            Team::Red => self.red_control_time,
            Team::Blue => self.blue_control_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hill() -> ControlPoint {
        ControlPoint::new(Vec2::new(500.0, 300.0), 60.0, 5.0)
    }

    fn run(cp: &mut ControlPoint, red: usize, blue: usize, seconds: f32) {
        let dt = 0.05;
        let steps = (seconds / dt).round() as usize;
        for i in 0..steps {
            cp.update(red, blue, dt, i as f32 * dt);
        }
    }

    #[test]
    fn test_lone_team_captures() {
        let mut cp = hill();
        run(&mut cp, 1, 0, 5.5);
        assert_eq!(cp.controlling_team(), Some(Team::Red));
        assert_eq!(cp.progress(), FULL_CONTROL);
        assert!(cp.control_time(Team::Red) > 0.0);
        assert_eq!(cp.control_changes(), 1);
    }

    #[test]
    fn test_contested_decays() {
        let mut cp = hill();
        run(&mut cp, 1, 0, 2.5);
        let before = cp.progress();
        run(&mut cp, 2, 2, 1.0);
        assert!(cp.progress() < before);
        assert_eq!(cp.control_changes(), 1);
    }

    #[test]
    fn test_switch_counts_exactly_once() {
        let mut cp = hill();
        run(&mut cp, 1, 0, 6.0);
        assert_eq!(cp.control_changes(), 1);
        // Blue neutralises then captures
        run(&mut cp, 0, 1, 12.0);
        assert_eq!(cp.controlling_team(), Some(Team::Blue));
        assert_eq!(cp.control_changes(), 2);
        assert_eq!(cp.timeline().len(), 2);
        assert_eq!(cp.timeline()[1].team, Team::Blue);
    }

    #[test]
    fn test_recapture_after_drain_is_not_a_switch() {
        let mut cp = hill();
        run(&mut cp, 1, 0, 1.0);
        run(&mut cp, 0, 0, 60.0);
        assert_eq!(cp.controlling_team(), None);
        run(&mut cp, 1, 0, 1.0);
        assert_eq!(cp.controlling_team(), Some(Team::Red));
        assert_eq!(cp.control_changes(), 1);
    }

    #[test]
    fn test_progress_stays_in_bounds() {
        let mut cp = hill();
        let pattern = [(1, 0), (0, 1), (1, 1), (0, 0), (3, 0), (0, 2)];
        for (i, &(r, b)) in pattern.iter().cycle().take(600).enumerate() {
            cp.update(r, b, 0.1, i as f32 * 0.1);
            assert!(cp.progress() >= 0.0 && cp.progress() <= FULL_CONTROL);
        }
    }

    #[test]
    fn test_streak_resets_when_contested() {
        let mut cp = hill();
        run(&mut cp, 1, 0, 8.0);
        let (_, streak) = cp.holder().unwrap();
        assert!(streak > 2.0);
        cp.update(1, 1, 0.05, 8.0);
        assert!(cp.holder().is_none() || cp.holder().unwrap().1 == 0.0);
        assert!(cp.max_streak(Team::Red) > 2.0);
    }
}
