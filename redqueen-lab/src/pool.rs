//! Candidate pool - ranked, team-segregated storage of evaluated genomes
//!
//! Level 2 - Phase-level implementation
//!
//! Invariants after every batch:
//! - every member has `team == lineage`
//! - each team partition holds at most `per_team_cap` members, best first
//! - near-duplicates only ever merge within the same team and lineage

use rand::Rng;
use redqueen_core::{Candidate, CandidateRecord, Genome, Team};

use crate::config::PoolConfig;

/// What `add_to_pool` did with a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// Folded into the existing member at this index
    Merged(usize),
    Inserted,
    /// Team and lineage disagreed
    Rejected,
}

#[derive(Clone, Debug, Default)]
pub struct CandidatePool {
    config: PoolConfig,
    members: Vec<Candidate>,
    /// Best candidates trimmed from full partitions, per team
    reserve: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            members: Vec::new(),
            reserve: Vec::new(),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // ========================================================================
    // INSERTION
    // ========================================================================

    /// Merge into a near-duplicate of the same team and lineage, or insert.
    ///
    /// Does not rank or trim; call [`CandidatePool::rebalance`] afterwards,
    /// or use [`CandidatePool::add_batch`].
    pub fn add_to_pool(&mut self, candidate: Candidate) -> AddOutcome {
        if !candidate.is_pure() {
            tracing::warn!(
                "Rejecting candidate with team {} but lineage {}",
                candidate.team(),
                candidate.lineage()
            );
            return AddOutcome::Rejected;
        }

        let threshold = self.config.merge_similarity;
        let nearest = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.team() == candidate.team() && m.lineage() == candidate.lineage())
            .map(|(i, m)| (i, m.genome().similarity(candidate.genome())))
            .filter(|&(_, s)| s > threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match nearest {
            Some((i, similarity)) => {
                tracing::debug!("Merging {} candidate into member {} (similarity {:.3})", candidate.team(), i, similarity);
                self.members[i].absorb(&candidate);
                AddOutcome::Merged(i)
            }
            None => {
                self.members.push(candidate);
                AddOutcome::Inserted
            }
        }
    }

    /// Add several candidates, then rank and trim
    pub fn add_batch(&mut self, candidates: impl IntoIterator<Item = Candidate>) -> Vec<AddOutcome> {
        let outcomes = candidates.into_iter().map(|c| self.add_to_pool(c)).collect();
        self.rebalance();
        outcomes
    }

    /// Ingest external records, dropping any whose lineage differs from its team
    ///
    /// # Returns
    /// Number of records accepted
    pub fn import(&mut self, records: impl IntoIterator<Item = CandidateRecord>) -> usize {
        let mut accepted = Vec::new();
        for record in records {
            match Candidate::try_from(record) {
                Ok(c) => accepted.push(c),
                Err(e) => tracing::warn!("Skipping imported candidate: {}", e),
            }
        }
        let count = accepted.len();
        self.add_batch(accepted);
        count
    }

    /// Seed `count` team-biased random candidates for `team`
    pub fn seed_initial<R: Rng>(&mut self, team: Team, count: usize, generation: u32, rng: &mut R) {
        let seeds: Vec<Candidate> = (0..count)
            .map(|_| Candidate::new(team, Genome::team_biased(team, rng), generation))
            .collect();
        self.add_batch(seeds);
    }

    // ========================================================================
    // RANKING
    // ========================================================================

    /// Rebuild the pool from strict per-team partitions.
    ///
    /// Impure members are logged and dropped. Each partition is sorted by
    /// fitness and capped; the overflow tops up that team's reserve.
    pub fn rebalance(&mut self) {
        let members = std::mem::take(&mut self.members);
        let reserve = std::mem::take(&mut self.reserve);

        let mut rebuilt = Vec::with_capacity(self.config.per_team_cap * Team::ALL.len());
        let mut new_reserve = Vec::new();

        for team in Team::ALL {
            let mut partition: Vec<Candidate> = Vec::new();
            for c in members.iter().filter(|c| c.team() == team) {
                if c.is_pure() {
                    partition.push(c.clone());
                } else {
                    tracing::warn!("Dropping {} candidate with foreign lineage {}", team, c.lineage());
                }
            }
            sort_by_fitness(&mut partition);

            let mut overflow = if partition.len() > self.config.per_team_cap {
                partition.split_off(self.config.per_team_cap)
            } else {
                Vec::new()
            };
            overflow.extend(reserve.iter().filter(|c| c.team() == team && c.is_pure()).cloned());
            sort_by_fitness(&mut overflow);
            overflow.truncate(self.config.reserve_per_team);

            rebuilt.extend(partition);
            new_reserve.extend(overflow);
        }

        self.members = rebuilt;
        self.reserve = new_reserve;
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn team(&self, team: Team) -> impl Iterator<Item = &Candidate> {
        self.members.iter().filter(move |c| c.team() == team)
    }

    pub fn team_len(&self, team: Team) -> usize {
        self.team(team).count()
    }

    pub fn reserve(&self, team: Team) -> impl Iterator<Item = &Candidate> {
        self.reserve.iter().filter(move |c| c.team() == team)
    }

    /// Highest-fitness member of a team
    pub fn best(&self, team: Team) -> Option<&Candidate> {
        self.team(team)
            .max_by(|a, b| a.fitness().partial_cmp(&b.fitness()).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn genomes(&self, team: Team) -> Vec<Genome> {
        self.team(team).map(|c| *c.genome()).collect()
    }

    /// Team members, topped up from the reserve when fewer than `min`
    pub fn parents_for(&self, team: Team, min: usize) -> Vec<Candidate> {
        let mut parents: Vec<Candidate> = self.team(team).cloned().collect();
        if parents.len() < min {
            parents.extend(self.reserve(team).take(min - parents.len()).cloned());
        }
        parents
    }

    /// Export every member as a wire record
    pub fn records(&self) -> Vec<CandidateRecord> {
        self.members.iter().cloned().map(CandidateRecord::from).collect()
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.reserve.clear();
    }
}

fn sort_by_fitness(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.fitness().partial_cmp(&a.fitness()).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn candidate(team: Team, value: f32, fitness: f32) -> Candidate {
        Candidate::new(team, Genome::uniform(value), 0).with_outcome(fitness, fitness > 0.5)
    }

    fn assert_invariants(pool: &CandidatePool) {
        for c in pool.members() {
            assert_eq!(c.team(), c.lineage());
        }
        for team in Team::ALL {
            assert!(pool.team_len(team) <= pool.config().per_team_cap);
            let fitness: Vec<f32> = pool.team(team).map(|c| c.fitness()).collect();
            assert!(fitness.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_near_duplicate_merges() {
        let mut pool = CandidatePool::new(PoolConfig::default());
        assert_eq!(pool.add_to_pool(candidate(Team::Red, 0.5, 0.4)), AddOutcome::Inserted);

        let mut close = Genome::uniform(0.5);
        close.set(redqueen_core::Trait::Speed, 0.55);
        let dup = Candidate::new(Team::Red, close, 1).with_outcome(0.7, true);
        assert_eq!(pool.add_to_pool(dup), AddOutcome::Merged(0));

        assert_eq!(pool.len(), 1);
        let merged = &pool.members()[0];
        assert_eq!(merged.battles(), 2);
        assert_eq!(merged.wins(), 1);
        assert!((merged.fitness() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_no_merge_across_teams() {
        let mut pool = CandidatePool::new(PoolConfig::default());
        pool.add_to_pool(candidate(Team::Red, 0.5, 0.4));
        assert_eq!(pool.add_to_pool(candidate(Team::Blue, 0.5, 0.4)), AddOutcome::Inserted);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_caps_and_reserve() {
        // Uniform genomes 1/11 apart sit at similarity ~0.909, so raise the bar
        let config = PoolConfig { merge_similarity: 0.99, ..PoolConfig::default() };
        let mut pool = CandidatePool::new(config);
        let batch: Vec<Candidate> = (0..12).map(|i| candidate(Team::Blue, i as f32 / 11.0, i as f32 / 12.0)).collect();
        pool.add_batch(batch);
        pool.add_batch(vec![candidate(Team::Red, 0.2, 0.9)]);

        assert_invariants(&pool);
        assert_eq!(pool.team_len(Team::Red), 1);
        assert_eq!(pool.team_len(Team::Blue), 8);
        assert_eq!(pool.reserve(Team::Blue).count(), 2);
        assert_eq!(pool.reserve(Team::Red).count(), 0);

        let worst_kept = pool.team(Team::Blue).last().map(|c| c.fitness()).unwrap_or(0.0);
        for r in pool.reserve(Team::Blue) {
            assert!(r.fitness() <= worst_kept);
        }
    }

    #[test]
    fn test_random_batches_keep_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pool = CandidatePool::new(PoolConfig::default());
        for round in 0..20 {
            let batch: Vec<Candidate> = (0..6)
                .map(|i| {
                    let team = Team::ALL[i % 2];
                    Candidate::new(team, Genome::random(&mut rng), round).with_outcome(rng.gen(), rng.gen_bool(0.5))
                })
                .collect();
            pool.add_batch(batch);
            assert_invariants(&pool);
        }
        assert!(pool.best(Team::Red).is_some());
    }

    #[test]
    fn test_import_filters_lineage_mismatch() {
        let mut pool = CandidatePool::new(PoolConfig::default());
        let good: CandidateRecord = candidate(Team::Blue, 0.3, 0.5).into();
        let mut bad: CandidateRecord = candidate(Team::Red, 0.9, 0.9).into();
        bad.lineage = Team::Blue;

        assert_eq!(pool.import(vec![good, bad]), 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.team_len(Team::Red), 0);
    }

    #[test]
    fn test_parents_for_uses_reserve() {
        let config = PoolConfig { per_team_cap: 1, reserve_per_team: 2, ..PoolConfig::default() };
        let mut pool = CandidatePool::new(config);
        pool.add_batch(vec![
            candidate(Team::Red, 0.0, 0.9),
            candidate(Team::Red, 0.5, 0.5),
            candidate(Team::Red, 1.0, 0.1),
        ]);
        assert_eq!(pool.team_len(Team::Red), 1);
        assert_eq!(pool.parents_for(Team::Red, 4).len(), 3);
        assert_eq!(pool.parents_for(Team::Red, 1).len(), 1);
    }

    #[test]
    fn test_seed_and_clear() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pool = CandidatePool::new(PoolConfig::default());
        pool.seed_initial(Team::Red, 4, 0, &mut rng);
        pool.seed_initial(Team::Blue, 4, 0, &mut rng);
        assert!(pool.team_len(Team::Red) >= 1);
        assert!(pool.members().iter().filter(|c| c.team() == Team::Red).all(|c| c.lineage() == Team::Red));
        pool.clear();
        assert!(pool.is_empty());
    }
}
