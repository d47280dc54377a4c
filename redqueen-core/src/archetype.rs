//! Archetypes - recognised synergistic trait combinations
//!
//! Classification is rule based and deterministic. The first matching rule
//! wins, so the order of `RULES` matters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::genome::{Genome, Trait};

/// Recognised tactical archetype of a genome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// High accuracy and defense, low aggression
    Sniper,
    /// High aggression, speed and risk taking
    Berserker,
    /// High defense and teamwork
    Guardian,
    /// High speed and evasion
    Skirmisher,
    /// High adaptability and learning with some teamwork
    Tactician,
    /// No recognised synergy
    Balanced,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Sniper,
        Archetype::Berserker,
        Archetype::Guardian,
        Archetype::Skirmisher,
        Archetype::Tactician,
        Archetype::Balanced,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Sniper => "sniper",
            Archetype::Berserker => "berserker",
            Archetype::Guardian => "guardian",
            Archetype::Skirmisher => "skirmisher",
            Archetype::Tactician => "tactician",
            Archetype::Balanced => "balanced",
        }
    }

    pub fn from_name(name: &str) -> Option<Archetype> {
        Archetype::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Representative genome for this archetype (used by presets and tests)
    pub fn preset(self) -> Genome {
        match self {
            Archetype::Sniper => Genome::from_array([0.2, 0.4, 0.9, 0.8, 0.5, 0.5, 0.6, 0.3, 0.4]),
            Archetype::Berserker => Genome::from_array([0.9, 0.8, 0.4, 0.3, 0.3, 0.4, 0.4, 0.9, 0.5]),
            Archetype::Guardian => Genome::from_array([0.4, 0.4, 0.6, 0.9, 0.8, 0.5, 0.5, 0.3, 0.3]),
            Archetype::Skirmisher => Genome::from_array([0.6, 0.9, 0.5, 0.3, 0.4, 0.6, 0.5, 0.6, 0.8]),
            Archetype::Tactician => Genome::from_array([0.5, 0.5, 0.6, 0.5, 0.6, 0.8, 0.8, 0.4, 0.5]),
            Archetype::Balanced => Genome::default(),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// (archetype, [(trait, threshold, wants_high)])
type Rule = (Archetype, &'static [(Trait, f32, bool)]);

const RULES: &[Rule] = &[
    (
        Archetype::Sniper,
        &[(Trait::Accuracy, 0.7, true), (Trait::Defense, 0.6, true), (Trait::Aggression, 0.4, false)],
    ),
    (
        Archetype::Berserker,
        &[(Trait::Aggression, 0.7, true), (Trait::Speed, 0.6, true), (Trait::RiskTaking, 0.6, true)],
    ),
    (
        Archetype::Guardian,
        &[(Trait::Defense, 0.7, true), (Trait::Teamwork, 0.6, true)],
    ),
    (
        Archetype::Skirmisher,
        &[(Trait::Speed, 0.7, true), (Trait::Evasion, 0.6, true)],
    ),
    (
        Archetype::Tactician,
        &[(Trait::Adaptability, 0.6, true), (Trait::Learning, 0.6, true), (Trait::Teamwork, 0.5, true)],
    ),
];

/// Pairs of traits that work against each other when both sit at an extreme
/// (trait_a, a_high, trait_b, b_high)
const CONTRADICTIONS: &[(Trait, bool, Trait, bool)] = &[
    // Charges in but refuses to take risks
    (Trait::Aggression, true, Trait::RiskTaking, false),
    // Fast and heavily armoured at once
    (Trait::Speed, true, Trait::Defense, true),
    // Fires constantly without aiming
    (Trait::Aggression, true, Trait::Accuracy, false),
    // Reckless yet glued to the formation
    (Trait::RiskTaking, true, Trait::Teamwork, true),
    // Learns but never adapts what it learned
    (Trait::Learning, true, Trait::Adaptability, false),
];

fn matches(g: &Genome, t: Trait, threshold: f32, wants_high: bool) -> bool {
    if wants_high {
        g.get(t) >= threshold
    } else {
        g.get(t) <= threshold
    }
}

/// Classify a genome into its archetype
pub fn classify(genome: &Genome) -> Archetype {
    RULES
        .iter()
        .find(|(_, conds)| conds.iter().all(|&(t, th, high)| matches(genome, t, th, high)))
        .map(|(a, _)| *a)
        .unwrap_or(Archetype::Balanced)
}

/// Number of contradictory trait pairs present in a genome
pub fn contradictions(genome: &Genome) -> usize {
    CONTRADICTIONS
        .iter()
        .filter(|&&(a, a_high, b, b_high)| {
            extreme(genome.get(a), a_high) && extreme(genome.get(b), b_high)
        })
        .count()
}

fn extreme(v: f32, high: bool) -> bool {
    if high {
        v > 0.8
    } else {
        v < 0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_classify_as_themselves() {
        for archetype in Archetype::ALL {
            assert_eq!(classify(&archetype.preset()), archetype, "{}", archetype);
        }
    }

    #[test]
    fn test_neutral_is_balanced() {
        assert_eq!(classify(&Genome::default()), Archetype::Balanced);
        assert_eq!(contradictions(&Genome::default()), 0);
    }

    #[test]
    fn test_contradictions_counted() {
        let mut g = Genome::default();
        g.set(Trait::Aggression, 0.95);
        g.set(Trait::RiskTaking, 0.05);
        g.set(Trait::Accuracy, 0.1);
        assert_eq!(contradictions(&g), 2);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Archetype::from_name("Sniper"), Some(Archetype::Sniper));
        assert_eq!(Archetype::from_name("wizard"), None);
    }
}
