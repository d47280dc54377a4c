//! Battle results - the immutable record produced once per battle

use serde::{Deserialize, Serialize};

use crate::control_point::ControlPointSummary;
use crate::tank::CombatStats;
use crate::team::Team;

/// Final outcome of a battle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Red,
    Blue,
    Draw,
    Timeout,
}

impl Winner {
    pub fn from_team(team: Team) -> Self {
        match team {
            Team::Red => Winner::Red,
            Team::Blue => Winner::Blue,
        }
    }

    /// Winning team, if the battle was decisive
    pub fn team(self) -> Option<Team> {
        match self {
            Winner::Red => Some(Team::Red),
            Winner::Blue => Some(Team::Blue),
            Winner::Draw | Winner::Timeout => None,
        }
    }

    /// Outcome from one team's point of view
    pub fn outcome_for(self, team: Team) -> Outcome {
        match self {
            Winner::Draw => Outcome::Draw,
            Winner::Timeout => Outcome::Timeout,
            w if w.team() == Some(team) => Outcome::Win,
            _ => Outcome::Loss,
        }
    }
}

/// Per-team view of a [`Winner`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    Timeout,
}

/// How the battle was decided
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VictoryType {
    Elimination,
    Control,
    Timeout,
}

/// Aggregate combat numbers for one team
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub tanks: usize,
    pub survivors: usize,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub kills: u32,
    pub average_survival_time: f32,
}

impl TeamStats {
    /// Fold per-tank stats into team totals
    pub fn aggregate<'a>(agents: impl Iterator<Item = &'a AgentReport>) -> Self {
        let mut stats = TeamStats::default();
        let mut survival_sum = 0.0;
        for a in agents {
            stats.tanks += 1;
            if a.alive {
                stats.survivors += 1;
            }
            stats.shots_fired += a.stats.shots_fired;
            stats.shots_hit += a.stats.shots_hit;
            stats.damage_dealt += a.stats.damage_dealt;
            stats.damage_taken += a.stats.damage_taken;
            stats.kills += a.stats.kills;
            survival_sum += a.stats.survival_time;
        }
        if stats.tanks > 0 {
            stats.average_survival_time = survival_sum / stats.tanks as f32;
        }
        stats
    }

    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }

    pub fn survival_ratio(&self) -> f32 {
        if self.tanks == 0 {
            0.0
        } else {
            self.survivors as f32 / self.tanks as f32
        }
    }
}

/// One tank's end-of-battle report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReport {
    pub id: usize,
    pub team: Team,
    pub genome_index: usize,
    pub alive: bool,
    pub stats: CombatStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Survivors {
    pub red: usize,
    pub blue: usize,
}

impl Survivors {
    pub fn get(&self, team: Team) -> usize {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }
}

/// Tactical scores for one team, each in `[0, 1]`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamTactics {
    /// How tightly the team moved together
    pub coordination: f32,
    /// How often tanks changed mode in response to the fight
    pub adaptability: f32,
    /// Genome spread within the team
    pub diversity: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TacticalMetrics {
    pub red: TeamTactics,
    pub blue: TeamTactics,
}

impl TacticalMetrics {
    pub fn get(&self, team: Team) -> &TeamTactics {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
}

/// Battle completion payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub winner: Winner,
    pub victory_type: VictoryType,
    /// Seconds of battle clock
    pub duration: f32,
    pub red_team_stats: TeamStats,
    pub blue_team_stats: TeamStats,
    pub survivors: Survivors,
    pub tactical_metrics: TacticalMetrics,
    pub control_point_summary: ControlPointSummary,
    pub agents: Vec<AgentReport>,
    pub seed: u64,
    pub ticks: u64,
}

impl BattleResult {
    pub fn team_stats(&self, team: Team) -> &TeamStats {
        match team {
            Team::Red => &self.red_team_stats,
            Team::Blue => &self.blue_team_stats,
        }
    }

    pub fn outcome_for(&self, team: Team) -> Outcome {
        self.winner.outcome_for(team)
    }

    /// Reports for every tank built from one genome of one team
    pub fn agents_for(&self, team: Team, genome_index: usize) -> impl Iterator<Item = &AgentReport> {
        self.agents
            .iter()
            .filter(move |a| a.team == team && a.genome_index == genome_index)
    }

    /// Team with more survivors at the end, `None` on a tie
    pub fn survivor_leader(&self) -> Option<Team> {
        match self.survivors.red.cmp(&self.survivors.blue) {
            std::cmp::Ordering::Greater => Some(Team::Red),
            std::cmp::Ordering::Less => Some(Team::Blue),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for() {
        assert_eq!(Winner::Red.outcome_for(Team::Red), Outcome::Win);
        assert_eq!(Winner::Red.outcome_for(Team::Blue), Outcome::Loss);
        assert_eq!(Winner::Draw.outcome_for(Team::Blue), Outcome::Draw);
        assert_eq!(Winner::Timeout.outcome_for(Team::Red), Outcome::Timeout);
    }

    #[test]
    fn test_aggregate() {
        let agents = vec![
            AgentReport {
                id: 0,
                team: Team::Red,
                genome_index: 0,
                alive: true,
                stats: CombatStats { shots_fired: 10, shots_hit: 5, survival_time: 30.0, ..Default::default() },
            },
            AgentReport {
                id: 1,
                team: Team::Red,
                genome_index: 1,
                alive: false,
                stats: CombatStats { shots_fired: 10, shots_hit: 3, survival_time: 10.0, ..Default::default() },
            },
        ];
        let stats = TeamStats::aggregate(agents.iter());
        assert_eq!(stats.tanks, 2);
        assert_eq!(stats.survivors, 1);
        assert!((stats.accuracy() - 0.4).abs() < 1e-6);
        assert!((stats.average_survival_time - 20.0).abs() < 1e-6);
    }
}
