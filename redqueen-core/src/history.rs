//! Battle history - compact per-battle records for opponent analysis

use serde::{Deserialize, Serialize};

use crate::genome::Genome;
use crate::result::{BattleResult, VictoryType, Winner};
use crate::team::Team;

/// Tactic recognised in the side that came out ahead
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TacticTag {
    HighAggression,
    FormationFighting,
    Rushing,
    Sniping,
    HillControl,
    Attrition,
}

impl TacticTag {
    pub fn name(self) -> &'static str {
        match self {
            TacticTag::HighAggression => "high-aggression",
            TacticTag::FormationFighting => "formation-fighting",
            TacticTag::Rushing => "rushing",
            TacticTag::Sniping => "sniping",
            TacticTag::HillControl => "hill-control",
            TacticTag::Attrition => "attrition",
        }
    }
}

/// What the researcher remembers about one battle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecord {
    pub experiment: u64,
    pub generation: u32,
    pub winner: Winner,
    pub victory_type: VictoryType,
    pub duration: f32,
    pub red_mean: Genome,
    pub blue_mean: Genome,
    /// Side the tactics were read from: the winner, or the survivor leader on timeout
    pub tactic_team: Option<Team>,
    pub tactics: Vec<TacticTag>,
}

impl BattleRecord {
    pub fn from_result(
        result: &BattleResult,
        red: &[Genome],
        blue: &[Genome],
        experiment: u64,
        generation: u32,
    ) -> Self {
        let red_mean = Genome::mean(red).unwrap_or_default();
        let blue_mean = Genome::mean(blue).unwrap_or_default();

        let tactic_team = match result.winner {
            Winner::Red => Some(Team::Red),
            Winner::Blue => Some(Team::Blue),
            Winner::Timeout => result.survivor_leader(),
            Winner::Draw => None,
        };

        let tactics = tactic_team
            .map(|team| {
                let mean = match team {
                    Team::Red => &red_mean,
                    Team::Blue => &blue_mean,
                };
                detect_tactics(mean, result, team)
            })
            .unwrap_or_default();

        Self {
            experiment,
            generation,
            winner: result.winner,
            victory_type: result.victory_type,
            duration: result.duration,
            red_mean,
            blue_mean,
            tactic_team,
            tactics,
        }
    }

    pub fn mean_genome(&self, team: Team) -> &Genome {
        match team {
            Team::Red => &self.red_mean,
            Team::Blue => &self.blue_mean,
        }
    }

    /// Tactics credited to `team` in this battle
    pub fn tactics_of(&self, team: Team) -> &[TacticTag] {
        if self.tactic_team == Some(team) {
            &self.tactics
        } else {
            &[]
        }
    }
}

/// Read the tactics a side used from its mean genome and battle metrics
pub fn detect_tactics(mean: &Genome, result: &BattleResult, team: Team) -> Vec<TacticTag> {
    let mut tags = Vec::new();
    let tactics = result.tactical_metrics.get(team);

    if mean.aggression() > 0.6 {
        tags.push(TacticTag::HighAggression);
    }
    if tactics.coordination > 0.6 || mean.teamwork() > 0.7 {
        tags.push(TacticTag::FormationFighting);
    }
    if mean.speed() > 0.7 && result.duration < 30.0 {
        tags.push(TacticTag::Rushing);
    }
    if mean.accuracy() > 0.7 && result.team_stats(team).accuracy() > 0.3 {
        tags.push(TacticTag::Sniping);
    }
    if result.victory_type == VictoryType::Control
        || result.control_point_summary.control_time(team) > result.duration * 0.3
    {
        tags.push(TacticTag::HillControl);
    }
    if result.victory_type == VictoryType::Timeout {
        tags.push(TacticTag::Attrition);
    }

    tags
}
