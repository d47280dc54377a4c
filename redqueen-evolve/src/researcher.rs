//! Researcher - proposes the next genomes for one team
//!
//! # Architecture
//!
//! Level 1 - Orchestration:
//!   - propose() - build a team's proposals for one experiment
//!
//! Level 2 - Phases:
//!   - parent_pool() - own-team subpool, padded with team-biased genomes
//!   - elites() - unmutated copies of the best parents
//!   - offspring() - selection, crossover, mutation, counter, emergent
//!
//! Teams never mix: every parent comes from the proposing team's lineage.

use rand::Rng;
use redqueen_core::{BattleRecord, Candidate, Genome, Team};
use serde::{Deserialize, Serialize};

use crate::counter::OpponentProfile;
use crate::crossover::crossover_genomes;
use crate::emergent::{inject_emergent, DEFAULT_EMERGENT_PROBABILITY};
use crate::mutation::{mutate_genome, MutationConfig};
use crate::naming::genome_name;
use crate::selection::{select_elite, tournament_select};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Knobs for genome proposal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Genomes proposed per team per experiment
    pub proposals_per_team: usize,
    pub tournament_size: usize,
    pub crossover_rate: f32,
    /// Standard deviation of the noise added during crossover
    pub crossover_jitter: f32,
    pub mutation: MutationConfig,
    /// Share of proposals that are unmutated copies of the best parents
    pub elite_fraction: f32,
    /// Subpool size below which team-biased genomes are synthesized
    pub min_parents: usize,
    /// Only candidates from this many recent generations count as parents
    pub recent_generations: u32,
    /// Battle records summarised for counter-evolution
    pub history_window: usize,
    pub counter_strength: f32,
    pub emergent_probability: f64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            proposals_per_team: 3,
            tournament_size: 3,
            crossover_rate: 0.7,
            crossover_jitter: 0.1,
            mutation: MutationConfig::default(),
            elite_fraction: 0.2,
            min_parents: 4,
            recent_generations: 5,
            history_window: 5,
            counter_strength: 1.0,
            emergent_probability: DEFAULT_EMERGENT_PROBABILITY,
        }
    }
}

impl ResearchConfig {
    /// Number of elite slots among the proposals
    pub fn elite_count(&self) -> usize {
        let n = (self.proposals_per_team as f32 * self.elite_fraction.clamp(0.0, 1.0)).round() as usize;
        n.min(self.proposals_per_team)
    }
}

// ============================================================================
// PROPOSALS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalOrigin {
    Elite,
    Offspring,
}

/// A genome the researcher wants evaluated
#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    pub genome: Genome,
    pub origin: ProposalOrigin,
    /// Emergent rules that fired while building this genome
    pub emergent: Vec<&'static str>,
}

// ============================================================================
// RESEARCHER
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct Researcher {
    config: ResearchConfig,
}

impl Researcher {
    pub fn new(config: ResearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Propose genomes for `team`.
    ///
    /// # Arguments
    /// * `team` - Team to propose for
    /// * `candidates` - Pool members; other teams and impure entries are ignored
    /// * `history` - Battle records, oldest first, for counter-evolution
    /// * `generation` - Current generation counter
    /// * `rng` - Random number generator
    ///
    /// # Returns
    /// `proposals_per_team` proposals, elites first
    pub fn propose<R: Rng>(
        &self,
        team: Team,
        candidates: &[Candidate],
        history: &[BattleRecord],
        generation: u32,
        rng: &mut R,
    ) -> Vec<Proposal> {
        let parents = self.parent_pool(team, candidates, generation, rng);
        let profile = OpponentProfile::from_history(team.opponent(), history, self.config.history_window);

        let total = self.config.proposals_per_team;
        let mut proposals = self.elites(&parents, self.config.elite_count());

        while proposals.len() < total {
            match self.offspring(&parents, &profile, rng) {
                Some(p) => proposals.push(p),
                None => break,
            }
        }

        for p in &proposals {
            tracing::debug!(
                "{} proposal {} ({:?}){}",
                team,
                genome_name(&p.genome),
                p.origin,
                if p.emergent.is_empty() { String::new() } else { format!(" emergent: {}", p.emergent.join(", ")) }
            );
        }
        proposals
    }

    /// Own-team parents from recent generations.
    ///
    /// Falls back to older own-team candidates, then to synthesized
    /// team-biased genomes, until `min_parents` is reached.
    pub fn parent_pool<R: Rng>(&self, team: Team, candidates: &[Candidate], generation: u32, rng: &mut R) -> Vec<Candidate> {
        let oldest = generation.saturating_sub(self.config.recent_generations);
        let own: Vec<&Candidate> = candidates.iter().filter(|c| c.team() == team && c.is_pure()).collect();

        let mut parents: Vec<Candidate> = own.iter().filter(|c| c.generation() >= oldest).map(|c| (*c).clone()).collect();
        if parents.len() < self.config.min_parents {
            parents.extend(own.iter().filter(|c| c.generation() < oldest).map(|c| (*c).clone()));
        }

        let synthesized = self.config.min_parents.saturating_sub(parents.len());
        if synthesized > 0 {
            tracing::debug!("{} subpool has {} parents, synthesizing {}", team, parents.len(), synthesized);
        }
        for _ in 0..synthesized {
            parents.push(Candidate::new(team, Genome::team_biased(team, rng), generation));
        }

        parents
    }

    fn elites(&self, parents: &[Candidate], n: usize) -> Vec<Proposal> {
        select_elite(parents, n)
            .into_iter()
            .map(|c| Proposal {
                genome: *c.genome(),
                origin: ProposalOrigin::Elite,
                emergent: Vec::new(),
            })
            .collect()
    }

    fn offspring<R: Rng>(
        &self,
        parents: &[Candidate],
        profile: &OpponentProfile,
        rng: &mut R,
    ) -> Option<Proposal> {
        let k = self.config.tournament_size;
        let p1 = tournament_select(parents, k, rng)?;
        let p2 = tournament_select(parents, k, rng)?;

        let crossover_rate = f64::from(self.config.crossover_rate.clamp(0.0, 1.0));
        let child = if rng.gen_bool(crossover_rate) {
            crossover_genomes(p1.genome(), p2.genome(), self.config.crossover_jitter, rng)
        } else {
            *p1.genome()
        };

        let mut child = mutate_genome(&child, &self.config.mutation, rng);
        profile.counter(&mut child, self.config.counter_strength);
        let emergent = inject_emergent(&mut child, self.config.emergent_probability, rng);

        Some(Proposal {
            genome: child,
            origin: ProposalOrigin::Offspring,
            emergent,
        })
    }
}
