//! Mutation operators for genome evolution
//!
//! Each trait mutates independently with probability `rate` by adding
//! Gaussian noise `scale * N(0, 1)`. Results are clamped to `[0, 1]`.

use rand::Rng;
use rand_distr::StandardNormal;
use redqueen_core::{Genome, Trait};
use serde::{Deserialize, Serialize};

/// Configuration for mutation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Per-trait mutation probability
    pub rate: f32,
    /// Standard deviation multiplier of the Gaussian step
    pub scale: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            rate: 0.3,
            scale: 0.2,
        }
    }
}

/// Apply Gaussian point mutations to a genome.
///
/// # Arguments
/// * `genome` - Genome to mutate
/// * `config` - Mutation configuration
/// * `rng` - Random number generator
///
/// # Returns
/// New genome with zero or more traits perturbed
pub fn mutate_genome<R: Rng>(genome: &Genome, config: &MutationConfig, rng: &mut R) -> Genome {
    let mut result = *genome;
    let rate = f64::from(config.rate.clamp(0.0, 1.0));

    for t in Trait::ALL {
        if rng.gen_bool(rate) {
            let noise: f32 = rng.sample(StandardNormal);
            result.nudge(t, noise * config.scale);
        }
    }

    result
}
