//! Fitness evaluation for evolution
//!
//! Level 2 - Phase-level implementation
//!
//! Fitness is a weighted sum of five terms, each clamped to `[0, 1]`:
//! battle outcome, the genome's own tanks, the whole team, diversity
//! against the team pool, and tactical complexity of the genome.

use redqueen_core::{
    classify, contradictions, Archetype, BattleResult, Genome, Outcome, Team, TeamStats,
};
use serde::{Deserialize, Serialize};

use crate::config::FitnessWeights;

/// Survival time that earns full survival credit
const FULL_SURVIVAL_SECONDS: f32 = 60.0;

/// Kills per tank that earn full kill credit
const FULL_KILLS: f32 = 3.0;

/// Shots per tank that count as fully engaged
const FULL_ENGAGEMENT_SHOTS: f32 = 15.0;

/// Mean distance to the team pool that counts as fully novel
const FULL_RARITY_DISTANCE: f32 = 1.5;

/// Specialized traits (far from neutral) that earn full specialization credit
const FULL_SPECIALIZATION: f32 = 4.0;

/// Per-term scores and the weighted total
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub outcome: f32,
    pub individual: f32,
    pub team: f32,
    pub diversity: f32,
    pub complexity: f32,
    pub total: f32,
}

/// Scores one genome's showing in one battle
#[derive(Clone, Debug)]
pub struct FitnessEvaluator {
    weights: FitnessWeights,
    /// Battle length used to judge speed of victory
    max_duration: f32,
}

impl FitnessEvaluator {
    pub fn new(weights: FitnessWeights, max_duration: f32) -> Self {
        Self {
            weights,
            max_duration: max_duration.max(f32::EPSILON),
        }
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Evaluate one genome of `team`
    ///
    /// # Arguments
    /// * `team` - Side the genome fought for
    /// * `genome_index` - Position of the genome in that side's lineup
    /// * `genome` - The genome itself
    /// * `result` - Finished battle
    /// * `team_pool` - Genomes already in the team's pool, for rarity
    ///
    /// # Returns
    /// Per-term scores with `total` in `[0, 1]`
    pub fn evaluate(
        &self,
        team: Team,
        genome_index: usize,
        genome: &Genome,
        result: &BattleResult,
        team_pool: &[Genome],
    ) -> FitnessBreakdown {
        let outcome = outcome_score(result, team);
        let individual = individual_score(&self.individual_stats(team, genome_index, result));
        let team_term = self.team_score(result, team);
        let diversity = diversity_score(genome, team_pool);
        let complexity = complexity_score(genome);

        let w = &self.weights;
        let total_weight = w.total();
        let total = if total_weight > 0.0 {
            (w.outcome * outcome
                + w.individual * individual
                + w.team * team_term
                + w.diversity * diversity
                + w.complexity * complexity)
                / total_weight
        } else {
            0.0
        };

        FitnessBreakdown {
            outcome,
            individual,
            team: team_term,
            diversity,
            complexity,
            total: total.clamp(0.0, 1.0),
        }
    }

    /// Stats of the tanks built from one genome, or the team's when it has none
    fn individual_stats(&self, team: Team, genome_index: usize, result: &BattleResult) -> TeamStats {
        let stats = TeamStats::aggregate(result.agents_for(team, genome_index));
        if stats.tanks == 0 {
            result.team_stats(team).clone()
        } else {
            stats
        }
    }

    /// Speed to victory (winners only) and engagement level
    fn team_score(&self, result: &BattleResult, team: Team) -> f32 {
        let stats = result.team_stats(team);
        let speed = if result.outcome_for(team) == Outcome::Win {
            (1.0 - result.duration / self.max_duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let engagement = if stats.tanks == 0 {
            0.0
        } else {
            (stats.shots_fired as f32 / (stats.tanks as f32 * FULL_ENGAGEMENT_SHOTS)).min(1.0)
        };
        (0.5 * speed + 0.5 * engagement).clamp(0.0, 1.0)
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Bucketed battle outcome
pub fn outcome_score(result: &BattleResult, team: Team) -> f32 {
    let own = result.team_stats(team);
    let score = match result.outcome_for(team) {
        Outcome::Win => 1.0,
        Outcome::Draw => 0.35,
        Outcome::Timeout => {
            let mine = result.survivors.get(team) as f32;
            let theirs = result.survivors.get(team.opponent()) as f32;
            let share = if mine + theirs > 0.0 { mine / (mine + theirs) } else { 0.5 };
            0.3 + 0.4 * share
        }
        Outcome::Loss => 0.1 * own.survival_ratio(),
    };
    score.clamp(0.0, 1.0)
}

/// Survival, accuracy, damage ratio and kills of a genome's tanks
pub fn individual_score(stats: &TeamStats) -> f32 {
    let tanks = stats.tanks.max(1) as f32;
    let survival = (stats.average_survival_time / FULL_SURVIVAL_SECONDS).clamp(0.0, 1.0);
    let accuracy = stats.accuracy().clamp(0.0, 1.0);
    let exchanged = stats.damage_dealt + stats.damage_taken;
    let damage = if exchanged > 0.0 { stats.damage_dealt / exchanged } else { 0.0 };
    let kills = (stats.kills as f32 / (tanks * FULL_KILLS)).clamp(0.0, 1.0);

    (0.3 * survival + 0.25 * accuracy + 0.25 * damage + 0.2 * kills).clamp(0.0, 1.0)
}

/// Specialization plus rarity against the rest of the team pool
pub fn diversity_score(genome: &Genome, team_pool: &[Genome]) -> f32 {
    let specialization = (genome.specialization_count() as f32 / FULL_SPECIALIZATION).min(1.0);
    let rarity = if team_pool.is_empty() {
        0.5
    } else {
        let mean = team_pool.iter().map(|g| genome.distance(g)).sum::<f32>() / team_pool.len() as f32;
        (mean / FULL_RARITY_DISTANCE).min(1.0)
    };
    (0.5 * specialization + 0.5 * rarity).clamp(0.0, 1.0)
}

/// Recognized archetypes score up, contradictory trait pairs score down
pub fn complexity_score(genome: &Genome) -> f32 {
    let archetype = if classify(genome) == Archetype::Balanced { 0.0 } else { 0.3 };
    (0.5 + archetype - 0.25 * contradictions(genome) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redqueen_core::{
        AgentReport, CombatStats, ControlPointSummary, Survivors, TacticalMetrics, VictoryType, Winner,
    };

    fn result(winner: Winner, victory_type: VictoryType, red_alive: bool) -> BattleResult {
        let stats = CombatStats {
            shots_fired: 10,
            shots_hit: 8,
            damage_dealt: 90.0,
            damage_taken: 20.0,
            survival_time: 60.0,
            kills: 1,
            distance_travelled: 200.0,
        };
        let agents = vec![
            AgentReport { id: 0, team: Team::Red, genome_index: 0, alive: red_alive, stats },
            AgentReport { id: 1, team: Team::Blue, genome_index: 0, alive: true, stats: CombatStats::default() },
        ];
        let red_team_stats = TeamStats::aggregate(agents.iter().filter(|a| a.team == Team::Red));
        let blue_team_stats = TeamStats::aggregate(agents.iter().filter(|a| a.team == Team::Blue));
        BattleResult {
            winner,
            victory_type,
            duration: 60.0,
            survivors: Survivors { red: red_alive as usize, blue: 1 },
            red_team_stats,
            blue_team_stats,
            tactical_metrics: TacticalMetrics::default(),
            control_point_summary: ControlPointSummary::default(),
            agents,
            seed: 0,
            ticks: 1200,
        }
    }

    #[test]
    fn test_win_beats_identical_loss() {
        let evaluator = FitnessEvaluator::new(FitnessWeights::default(), 120.0);
        let genome = Genome::default();
        let won = result(Winner::Red, VictoryType::Control, true);
        let lost = result(Winner::Blue, VictoryType::Control, true);

        let win = evaluator.evaluate(Team::Red, 0, &genome, &won, &[]);
        let loss = evaluator.evaluate(Team::Red, 0, &genome, &lost, &[]);
        assert!(win.total > loss.total, "win {:?} loss {:?}", win, loss);
        assert_eq!(win.individual, loss.individual);
    }

    #[test]
    fn test_total_in_unit_range() {
        let evaluator = FitnessEvaluator::new(FitnessWeights::default(), 120.0);
        for winner in [Winner::Red, Winner::Blue, Winner::Draw, Winner::Timeout] {
            let r = result(winner, VictoryType::Timeout, false);
            for g in [Genome::uniform(0.0), Genome::uniform(1.0), Archetype::Sniper.preset()] {
                let f = evaluator.evaluate(Team::Red, 0, &g, &r, &[Genome::default()]);
                assert!((0.0..=1.0).contains(&f.total));
            }
        }
    }

    #[test]
    fn test_outcome_buckets() {
        assert_eq!(outcome_score(&result(Winner::Red, VictoryType::Elimination, true), Team::Red), 1.0);
        assert_eq!(outcome_score(&result(Winner::Draw, VictoryType::Elimination, false), Team::Red), 0.35);
        // One survivor each on timeout: half share
        let timeout = outcome_score(&result(Winner::Timeout, VictoryType::Timeout, true), Team::Red);
        assert!((timeout - 0.5).abs() < 1e-6);
        let loss = outcome_score(&result(Winner::Blue, VictoryType::Elimination, false), Team::Red);
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn test_rarity_rewards_novel_genomes() {
        let pool = vec![Genome::default(); 3];
        let common = diversity_score(&Genome::default(), &pool);
        let novel = diversity_score(&Archetype::Berserker.preset(), &pool);
        assert!(novel > common);
    }

    #[test]
    fn test_archetype_beats_contradiction() {
        let sniper = complexity_score(&Archetype::Sniper.preset());
        let mut muddled = Genome::default();
        muddled.set(redqueen_core::Trait::Aggression, 0.95);
        muddled.set(redqueen_core::Trait::RiskTaking, 0.05);
        muddled.set(redqueen_core::Trait::Accuracy, 0.05);
        assert!(sniper > complexity_score(&muddled));
    }

    #[test]
    fn test_missing_agents_fall_back_to_team_stats() {
        let evaluator = FitnessEvaluator::new(FitnessWeights::default(), 120.0);
        let r = result(Winner::Red, VictoryType::Elimination, true);
        let own = evaluator.evaluate(Team::Red, 0, &Genome::default(), &r, &[]);
        let absent = evaluator.evaluate(Team::Red, 7, &Genome::default(), &r, &[]);
        assert_eq!(own.individual, absent.individual);
    }
}
