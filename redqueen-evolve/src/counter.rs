//! Counter-evolution - bias new genomes against the opponent's recent play
//!
//! The opponent is summarised from the last few battle records: mean
//! aggression, speed and accuracy of its lineups plus any tactics it won
//! with. Each detected tendency nudges specific traits of a child genome.

use redqueen_core::{BattleRecord, Genome, TacticTag, Team, Trait};

/// Mean trait value assumed when there is no history to read
pub const NEUTRAL_BASELINE: f32 = 0.5;

/// Trait mean above which a tendency is considered present
const HIGH_TENDENCY: f32 = 0.6;

/// Trait mean below which the opponent is considered passive
const LOW_TENDENCY: f32 = 0.4;

/// Summary of how the opponent has been playing
#[derive(Clone, Debug, PartialEq)]
pub struct OpponentProfile {
    pub team: Team,
    pub avg_aggression: f32,
    pub avg_speed: f32,
    pub avg_accuracy: f32,
    /// Tactics the opponent won with, in order of first appearance
    pub tactics: Vec<TacticTag>,
    /// Number of battle records the averages were taken over
    pub sample_size: usize,
}

impl OpponentProfile {
    /// Profile used when nothing is known about `team`
    pub fn neutral(team: Team) -> Self {
        Self {
            team,
            avg_aggression: NEUTRAL_BASELINE,
            avg_speed: NEUTRAL_BASELINE,
            avg_accuracy: NEUTRAL_BASELINE,
            tactics: Vec::new(),
            sample_size: 0,
        }
    }

    /// Summarise `opponent` over the most recent `window` records
    pub fn from_history(opponent: Team, history: &[BattleRecord], window: usize) -> Self {
        let start = history.len().saturating_sub(window);
        let recent = &history[start..];

        if recent.is_empty() {
            tracing::warn!("No battle history for {}, using neutral opponent profile", opponent);
            return Self::neutral(opponent);
        }

        let means: Vec<Genome> = recent.iter().map(|r| *r.mean_genome(opponent)).collect();
        let avg = Genome::mean(&means).unwrap_or_default();

        let mut tactics = Vec::new();
        for tag in recent.iter().flat_map(|r| r.tactics_of(opponent)) {
            if !tactics.contains(tag) {
                tactics.push(*tag);
            }
        }

        Self {
            team: opponent,
            avg_aggression: avg.aggression(),
            avg_speed: avg.speed(),
            avg_accuracy: avg.accuracy(),
            tactics,
            sample_size: recent.len(),
        }
    }

    /// Trait nudges that counter this profile, scaled by `strength`
    pub fn counter_adjustments(&self, strength: f32) -> Vec<(Trait, f32)> {
        let mut adjustments: Vec<(Trait, f32)> = Vec::new();

        if self.avg_aggression > HIGH_TENDENCY {
            adjustments.extend([(Trait::Defense, 0.1), (Trait::Adaptability, 0.05), (Trait::Learning, 0.05)]);
        } else if self.avg_aggression < LOW_TENDENCY {
            adjustments.extend([(Trait::Aggression, 0.1), (Trait::RiskTaking, 0.05)]);
        }
        if self.avg_speed > HIGH_TENDENCY {
            adjustments.extend([(Trait::Accuracy, 0.1), (Trait::Teamwork, 0.05)]);
        }
        if self.avg_accuracy > HIGH_TENDENCY {
            adjustments.extend([(Trait::Evasion, 0.1), (Trait::Speed, 0.05)]);
        }

        for tag in &self.tactics {
            adjustments.extend_from_slice(tactic_counter(*tag));
        }

        for adj in adjustments.iter_mut() {
            adj.1 *= strength;
        }
        adjustments
    }

    /// Nudge `genome` to counter this profile
    pub fn counter(&self, genome: &mut Genome, strength: f32) {
        for (t, delta) in self.counter_adjustments(strength) {
            genome.nudge(t, delta);
        }
    }
}

fn tactic_counter(tag: TacticTag) -> &'static [(Trait, f32)] {
    match tag {
        TacticTag::HighAggression => &[(Trait::Defense, 0.05), (Trait::Teamwork, 0.05)],
        TacticTag::FormationFighting => &[(Trait::Evasion, 0.05), (Trait::Adaptability, 0.05), (Trait::Speed, 0.03)],
        TacticTag::Rushing => &[(Trait::Defense, 0.05), (Trait::Accuracy, 0.05)],
        TacticTag::Sniping => &[(Trait::Evasion, 0.05), (Trait::Speed, 0.05)],
        TacticTag::HillControl => &[(Trait::Aggression, 0.05), (Trait::Teamwork, 0.05)],
        TacticTag::Attrition => &[(Trait::RiskTaking, 0.05), (Trait::Aggression, 0.05)],
    }
}
