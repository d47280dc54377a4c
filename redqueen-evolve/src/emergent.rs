//! Emergent behaviors - rare jumps that combine existing strengths
//!
//! Each rule has trait prerequisites. When a genome meets them, the rule
//! fires with a small probability and pushes a related trait further.
//! This lets populations discover combinations that plain mutation would
//! take many generations to reach.

use rand::Rng;
use redqueen_core::{Genome, Trait};

/// Default per-rule firing probability
pub const DEFAULT_EMERGENT_PROBABILITY: f64 = 0.05;

/// A single emergent rule
#[derive(Clone, Copy, Debug)]
pub struct EmergentRule {
    pub name: &'static str,
    /// Traits that must all exceed their threshold
    pub requires: &'static [(Trait, f32)],
    /// Nudges applied when the rule fires
    pub effects: &'static [(Trait, f32)],
}

impl EmergentRule {
    pub fn applies_to(&self, genome: &Genome) -> bool {
        self.requires.iter().all(|&(t, threshold)| genome.get(t) > threshold)
    }
}

pub const EMERGENT_RULES: [EmergentRule; 5] = [
    EmergentRule {
        name: "hit-and-run",
        requires: &[(Trait::Aggression, 0.7), (Trait::Speed, 0.7)],
        effects: &[(Trait::Evasion, 0.15)],
    },
    EmergentRule {
        name: "overwatch",
        requires: &[(Trait::Accuracy, 0.7), (Trait::Teamwork, 0.6)],
        effects: &[(Trait::Defense, 0.1), (Trait::Learning, 0.05)],
    },
    EmergentRule {
        name: "phalanx",
        requires: &[(Trait::Defense, 0.7), (Trait::Teamwork, 0.7)],
        effects: &[(Trait::Aggression, 0.1)],
    },
    EmergentRule {
        name: "improvise",
        requires: &[(Trait::Adaptability, 0.7), (Trait::Learning, 0.6)],
        effects: &[(Trait::Accuracy, 0.1), (Trait::Evasion, 0.05)],
    },
    EmergentRule {
        name: "calculated-risk",
        requires: &[(Trait::RiskTaking, 0.7), (Trait::Accuracy, 0.6)],
        effects: &[(Trait::Speed, 0.1)],
    },
];

/// Roll every applicable rule against `genome`
///
/// # Returns
/// Names of the rules that fired, in rule order
pub fn inject_emergent<R: Rng>(genome: &mut Genome, probability: f64, rng: &mut R) -> Vec<&'static str> {
    let probability = probability.clamp(0.0, 1.0);
    let mut fired = Vec::new();

    for rule in EMERGENT_RULES.iter() {
        if !rule.applies_to(genome) {
            continue;
        }
        if rng.gen_bool(probability) {
            for &(t, delta) in rule.effects {
                genome.nudge(t, delta);
            }
            fired.push(rule.name);
        }
    }

    if !fired.is_empty() {
        tracing::debug!("Emergent behaviors fired: {}", fired.join(", "));
    }
    fired
}
