//! Crossover operators for genome evolution
//!
//! Combines two parent genomes to produce offspring that inherit
//! traits from both parents.

use rand::Rng;
use rand_distr::StandardNormal;
use redqueen_core::{Genome, TRAIT_COUNT};

/// Uniform crossover with Gaussian jitter.
///
/// Each trait is taken from either parent with equal probability, then
/// perturbed by `N(0, jitter)`. The child is clamped to `[0, 1]`.
///
/// # Arguments
/// * `a` - First parent genome
/// * `b` - Second parent genome
/// * `jitter` - Standard deviation of the per-trait noise
/// * `rng` - Random number generator
///
/// # Returns
/// New genome combining traits from both parents
pub fn crossover_genomes<R: Rng>(a: &Genome, b: &Genome, jitter: f32, rng: &mut R) -> Genome {
    let pa = a.to_array();
    let pb = b.to_array();
    let mut child = [0.0f32; TRAIT_COUNT];

    for (i, slot) in child.iter_mut().enumerate() {
        let inherited = if rng.gen_bool(0.5) { pa[i] } else { pb[i] };
        let noise: f32 = rng.sample(StandardNormal);
        *slot = inherited + noise * jitter;
    }

    Genome::from_array(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_crossover_without_jitter_picks_parent_traits() {
        let a = Genome::uniform(0.1);
        let b = Genome::uniform(0.9);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let child = crossover_genomes(&a, &b, 0.0, &mut rng);
        for (_, v) in child.iter() {
            assert!(v == 0.1 || v == 0.9, "trait {} came from neither parent", v);
        }
    }

    #[test]
    fn test_crossover_mixes_both_parents() {
        let a = Genome::uniform(0.0);
        let b = Genome::uniform(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut saw_a = false;
        let mut saw_b = false;
        for _ in 0..20 {
            let child = crossover_genomes(&a, &b, 0.0, &mut rng);
            saw_a |= child.iter().any(|(_, v)| v == 0.0);
            saw_b |= child.iter().any(|(_, v)| v == 1.0);
        }
        assert!(saw_a && saw_b);
    }

    #[test]
    fn test_crossover_stays_in_bounds_with_heavy_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let a = Genome::random(&mut rng);
            let b = Genome::random(&mut rng);
            let child = crossover_genomes(&a, &b, 2.0, &mut rng);
            assert!(child.iter().all(|(_, v)| (0.0..=1.0).contains(&v)));
        }
    }
}
