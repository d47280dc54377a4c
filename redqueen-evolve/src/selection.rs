//! Parent and elite selection over pool candidates
//!
//! Candidates are ranked by fitness. Ties go to the candidate with more
//! wins, then to the more recent generation, so a proven genome beats a
//! fresh one that merely matched its score.

use std::cmp::Ordering;

use rand::Rng;
use redqueen_core::Candidate;

/// Ranking order: `Less` when `a` should come before `b`
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.fitness()
        .total_cmp(&a.fitness())
        .then_with(|| b.wins().cmp(&a.wins()))
        .then_with(|| b.generation().cmp(&a.generation()))
}

/// Tournament selection over candidates.
///
/// Draws `tournament_size` entrants uniformly with replacement and keeps
/// the best ranked.
///
/// # Arguments
/// * `candidates` - Parent pool for one team
/// * `tournament_size` - Entrants per tournament (0 is treated as 1)
/// * `rng` - Random number generator
///
/// # Returns
/// The winner, or `None` for an empty pool
pub fn tournament_select<'a, R: Rng>(
    candidates: &'a [Candidate],
    tournament_size: usize,
    rng: &mut R,
) -> Option<&'a Candidate> {
    if candidates.is_empty() {
        return None;
    }

    let mut winner = &candidates[rng.gen_range(0..candidates.len())];
    for _ in 1..tournament_size.max(1) {
        let entrant = &candidates[rng.gen_range(0..candidates.len())];
        if rank_order(entrant, winner) == Ordering::Less {
            winner = entrant;
        }
    }
    Some(winner)
}

/// The `n` best ranked candidates, best first.
///
/// A genome appears at most once, so merged duplicates in the pool do not
/// crowd out the next distinct elite.
pub fn select_elite(candidates: &[Candidate], n: usize) -> Vec<&Candidate> {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| rank_order(a, b));

    let mut elite: Vec<&Candidate> = Vec::with_capacity(n.min(ranked.len()));
    for c in ranked {
        if elite.len() == n {
            break;
        }
        if elite.iter().all(|e| e.genome() != c.genome()) {
            elite.push(c);
        }
    }
    elite
}
