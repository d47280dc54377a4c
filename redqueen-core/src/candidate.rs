//! Candidate - a pool-resident genome with fitness and provenance
//!
//! Lineage is fixed to the team at construction and never changes, so a
//! `Candidate` value cannot migrate between teams. External records carry
//! both fields separately and are validated on the way in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archetype::{classify, Archetype};
use crate::genome::Genome;
use crate::team::Team;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("candidate of team {team} carries {lineage} lineage")]
    LineageMismatch { team: Team, lineage: Team },
}

/// A genome tracked by the candidate pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "CandidateRecord", try_from = "CandidateRecord")]
pub struct Candidate {
    genome: Genome,
    fitness: f32,
    team: Team,
    lineage: Team,
    generation: u32,
    battles: u32,
    wins: u32,
    strategy_tag: Archetype,
}

impl Candidate {
    /// Create an unevaluated candidate for `team`
    pub fn new(team: Team, genome: Genome, generation: u32) -> Self {
        Self {
            strategy_tag: classify(&genome),
            genome,
            fitness: 0.0,
            team,
            lineage: team,
            generation,
            battles: 0,
            wins: 0,
        }
    }

    /// Record the outcome of a single battle
    pub fn with_outcome(mut self, fitness: f32, won: bool) -> Self {
        self.fitness = clamp_fitness(fitness);
        self.battles += 1;
        if won {
            self.wins += 1;
        }
        self
    }

    /// Set fitness without touching the battle counters
    pub fn with_fitness(mut self, fitness: f32) -> Self {
        self.fitness = clamp_fitness(fitness);
        self
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn lineage(&self) -> Team {
        self.lineage
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn battles(&self) -> u32 {
        self.battles
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn strategy_tag(&self) -> Archetype {
        self.strategy_tag
    }

    pub fn win_rate(&self) -> f32 {
        if self.battles == 0 {
            0.0
        } else {
            self.wins as f32 / self.battles as f32
        }
    }

    /// Team and lineage agree
    pub fn is_pure(&self) -> bool {
        self.team == self.lineage
    }

    /// Fold a near-duplicate into this candidate.
    ///
    /// Keeps the best fitness seen (and the genome that earned it) and adds
    /// the other candidate's battle and win counts.
    pub fn absorb(&mut self, other: &Candidate) {
        debug_assert_eq!(self.team, other.team);
        if other.fitness > self.fitness {
            self.fitness = other.fitness;
            self.genome = other.genome;
            self.strategy_tag = other.strategy_tag;
        }
        self.battles += other.battles;
        self.wins += other.wins;
        self.generation = self.generation.max(other.generation);
    }
}

fn clamp_fitness(f: f32) -> f32 {
    if f.is_finite() {
        f.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ============================================================================
// EXTERNAL RECORD
// ============================================================================

/// Wire form of a candidate, with team and lineage as independent fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub genome: Genome,
    #[serde(default)]
    pub fitness: f32,
    pub team: Team,
    pub lineage: Team,
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub battles: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub strategy_tag: Option<Archetype>,
}

impl TryFrom<CandidateRecord> for Candidate {
    type Error = CandidateError;

    fn try_from(record: CandidateRecord) -> Result<Self, Self::Error> {
        if record.team != record.lineage {
            return Err(CandidateError::LineageMismatch {
                team: record.team,
                lineage: record.lineage,
            });
        }

        Ok(Self {
            strategy_tag: record.strategy_tag.unwrap_or_else(|| classify(&record.genome)),
            genome: record.genome,
            fitness: clamp_fitness(record.fitness),
            team: record.team,
            lineage: record.lineage,
            generation: record.generation,
            battles: record.battles,
            wins: record.wins.min(record.battles),
        })
    }
}

impl From<Candidate> for CandidateRecord {
    fn from(c: Candidate) -> Self {
        Self {
            genome: c.genome,
            fitness: c.fitness,
            team: c.team,
            lineage: c.lineage,
            generation: c.generation,
            battles: c.battles,
            wins: c.wins,
            strategy_tag: Some(c.strategy_tag),
        }
    }
}
