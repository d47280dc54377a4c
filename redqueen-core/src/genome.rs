//! Genome - the nine-trait behaviour vector
//!
//! A genome is the only thing a tank inherits. It is a fixed, ordered set of
//! nine traits, each a real number in `[0, 1]`. Every constructor and every
//! mutator clamps, so a `Genome` value can never hold an out-of-range trait.
//!
//! The exchange format is a plain 9-element array in canonical order.
//! Object-keyed genomes (`{"aggression": 0.7, ...}`) are a legacy form and are
//! normalised once on ingress by [`Genome::from_value`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::team::Team;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of traits in a genome
pub const TRAIT_COUNT: usize = 9;

/// Value used for any trait that is missing or malformed on ingress
pub const NEUTRAL_TRAIT: f32 = 0.5;

/// Largest possible Euclidean distance between two genomes (sqrt(9))
const MAX_DISTANCE: f32 = 3.0;

/// Threshold above which a trait counts as specialised high
pub const HIGH_TRAIT: f32 = 0.7;

/// Threshold below which a trait counts as specialised low
pub const LOW_TRAIT: f32 = 0.3;

// ============================================================================
// TRAITS
// ============================================================================

/// Named genome traits, in canonical order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trait {
    Aggression = 0,
    Speed = 1,
    Accuracy = 2,
    Defense = 3,
    Teamwork = 4,
    Adaptability = 5,
    Learning = 6,
    RiskTaking = 7,
    Evasion = 8,
}

impl Trait {
    pub const ALL: [Trait; TRAIT_COUNT] = [
        Trait::Aggression,
        Trait::Speed,
        Trait::Accuracy,
        Trait::Defense,
        Trait::Teamwork,
        Trait::Adaptability,
        Trait::Learning,
        Trait::RiskTaking,
        Trait::Evasion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Trait::Aggression => "aggression",
            Trait::Speed => "speed",
            Trait::Accuracy => "accuracy",
            Trait::Defense => "defense",
            Trait::Teamwork => "teamwork",
            Trait::Adaptability => "adaptability",
            Trait::Learning => "learning",
            Trait::RiskTaking => "riskTaking",
            Trait::Evasion => "evasion",
        }
    }

    /// Parse a trait name leniently (`riskTaking`, `risk_taking`, `Risk-Taking`)
    pub fn from_name(name: &str) -> Option<Trait> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Trait::ALL.iter().copied().find(|t| t.name().to_ascii_lowercase() == key)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Shape problems found while reading an external genome.
///
/// These are diagnostics, not failures: the lenient constructors always
/// recover by coercion and only log the error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenomeError {
    #[error("expected {expected} traits, found {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("trait {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("unknown trait name `{0}`")]
    UnknownTrait(String),

    #[error("genome must be an array or an object, found {0}")]
    WrongShape(&'static str),
}

// ============================================================================
// GENOME
// ============================================================================

/// Nine-trait behaviour vector, every component in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "[f32; TRAIT_COUNT]")]
pub struct Genome {
    aggression: f32,
    speed: f32,
    accuracy: f32,
    defense: f32,
    teamwork: f32,
    adaptability: f32,
    learning: f32,
    risk_taking: f32,
    evasion: f32,
}

impl Default for Genome {
    fn default() -> Self {
        Self::uniform(NEUTRAL_TRAIT)
    }
}

impl Genome {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Genome with every trait set to `value` (clamped)
    pub fn uniform(value: f32) -> Self {
        Self::from_array([value; TRAIT_COUNT])
    }

    /// Build from a canonical array, clamping each component
    pub fn from_array(values: [f32; TRAIT_COUNT]) -> Self {
        let v = values.map(clamp_trait);
        Self {
            aggression: v[0],
            speed: v[1],
            accuracy: v[2],
            defense: v[3],
            teamwork: v[4],
            adaptability: v[5],
            learning: v[6],
            risk_taking: v[7],
            evasion: v[8],
        }
    }

    /// Strict ingress: reject anything that is not exactly nine finite numbers
    pub fn try_from_slice(values: &[f32]) -> Result<Self, GenomeError> {
        if values.len() != TRAIT_COUNT {
            return Err(GenomeError::WrongLength {
                expected: TRAIT_COUNT,
                found: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(GenomeError::NonFinite { index });
        }

        let mut array = [NEUTRAL_TRAIT; TRAIT_COUNT];
        array.copy_from_slice(values);
        Ok(Self::from_array(array))
    }

    /// Lenient ingress: missing or non-finite traits become neutral,
    /// extra values are dropped. Never fails.
    pub fn from_slice(values: &[f32]) -> Self {
        match Self::try_from_slice(values) {
            Ok(genome) => genome,
            Err(e) => {
                tracing::warn!("Malformed genome ({}), coercing to defaults", e);
                let mut array = [NEUTRAL_TRAIT; TRAIT_COUNT];
                for (slot, v) in array.iter_mut().zip(values.iter()) {
                    if v.is_finite() {
                        *slot = *v;
                    }
                }
                Self::from_array(array)
            }
        }
    }

    /// Normalise any JSON value into a genome.
    ///
    /// Arrays are read positionally, objects by trait name. Anything else
    /// yields the neutral genome.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                let values: Vec<f32> = items
                    .iter()
                    .map(|item| item.as_f64().map(|f| f as f32).unwrap_or(f32::NAN))
                    .collect();
                Self::from_slice(&values)
            }
            Value::Object(map) => {
                let mut array = [NEUTRAL_TRAIT; TRAIT_COUNT];
                for (key, item) in map {
                    match (Trait::from_name(key), item.as_f64()) {
                        (Some(t), Some(f)) if f.is_finite() => array[t.index()] = f as f32,
                        (Some(t), _) => {
                            tracing::warn!("{}", GenomeError::NonFinite { index: t.index() });
                        }
                        (None, _) => {
                            tracing::warn!("{}", GenomeError::UnknownTrait(key.clone()));
                        }
                    }
                }
                Self::from_array(array)
            }
            other => {
                tracing::warn!("{}, using neutral genome", GenomeError::WrongShape(json_kind(other)));
                Self::default()
            }
        }
    }

    /// Uniformly random genome
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut array = [0.0; TRAIT_COUNT];
        for slot in array.iter_mut() {
            *slot = rng.gen::<f32>();
        }
        Self::from_array(array)
    }

    /// Random genome skewed toward a team's doctrine.
    ///
    /// Red leans on aggression, speed and risk with low defense.
    /// Blue leans on accuracy, defense and teamwork with low aggression.
    pub fn team_biased<R: Rng>(team: Team, rng: &mut R) -> Self {
        let mut genome = Self::random(rng);
        let (high, low): (&[Trait], &[Trait]) = match team {
            Team::Red => (&[Trait::Aggression, Trait::Speed, Trait::RiskTaking], &[Trait::Defense]),
            Team::Blue => (&[Trait::Accuracy, Trait::Defense, Trait::Teamwork], &[Trait::Aggression]),
        };

        for &t in high {
            genome.set(t, 0.6 + 0.4 * rng.gen::<f32>());
        }
        for &t in low {
            genome.set(t, 0.4 * rng.gen::<f32>());
        }
        genome
    }

    /// Component-wise mean, `None` for an empty slice
    pub fn mean(genomes: &[Genome]) -> Option<Genome> {
        if genomes.is_empty() {
            return None;
        }
        let mut sum = [0.0f32; TRAIT_COUNT];
        for g in genomes {
            for (acc, v) in sum.iter_mut().zip(g.to_array()) {
                *acc += v;
            }
        }
        let n = genomes.len() as f32;
        Some(Self::from_array(sum.map(|s| s / n)))
    }

    // ========================================================================
    // ACCESS
    // ========================================================================

    /// Canonical array form (exchange format)
    pub fn to_array(&self) -> [f32; TRAIT_COUNT] {
        [
            self.aggression,
            self.speed,
            self.accuracy,
            self.defense,
            self.teamwork,
            self.adaptability,
            self.learning,
            self.risk_taking,
            self.evasion,
        ]
    }

    pub fn get(&self, t: Trait) -> f32 {
        match t {
            Trait::Aggression => self.aggression,
            Trait::Speed => self.speed,
            Trait::Accuracy => self.accuracy,
            Trait::Defense => self.defense,
            Trait::Teamwork => self.teamwork,
            Trait::Adaptability => self.adaptability,
            Trait::Learning => self.learning,
            Trait::RiskTaking => self.risk_taking,
            Trait::Evasion => self.evasion,
        }
    }

    /// Set a trait, clamped to `[0, 1]`
    pub fn set(&mut self, t: Trait, value: f32) {
        let value = clamp_trait(value);
        let slot = match t {
            Trait::Aggression => &mut self.aggression,
            Trait::Speed => &mut self.speed,
            Trait::Accuracy => &mut self.accuracy,
            Trait::Defense => &mut self.defense,
            Trait::Teamwork => &mut self.teamwork,
            Trait::Adaptability => &mut self.adaptability,
            Trait::Learning => &mut self.learning,
            Trait::RiskTaking => &mut self.risk_taking,
            Trait::Evasion => &mut self.evasion,
        };
        *slot = value;
    }

    /// Add `delta` to a trait, clamped to `[0, 1]`
    pub fn nudge(&mut self, t: Trait, delta: f32) {
        self.set(t, self.get(t) + delta);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, f32)> + '_ {
        Trait::ALL.iter().map(move |&t| (t, self.get(t)))
    }

    pub fn aggression(&self) -> f32 {
        self.aggression
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }

    pub fn defense(&self) -> f32 {
        self.defense
    }

    pub fn teamwork(&self) -> f32 {
        self.teamwork
    }

    pub fn adaptability(&self) -> f32 {
        self.adaptability
    }

    pub fn learning(&self) -> f32 {
        self.learning
    }

    pub fn risk_taking(&self) -> f32 {
        self.risk_taking
    }

    pub fn evasion(&self) -> f32 {
        self.evasion
    }

    // ========================================================================
    // COMPARISON
    // ========================================================================

    /// Euclidean distance in trait space
    pub fn distance(&self, other: &Genome) -> f32 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }

    /// Similarity in `[0, 1]`: 1 for identical genomes, 0 for opposite corners
    pub fn similarity(&self, other: &Genome) -> f32 {
        (1.0 - self.distance(other) / MAX_DISTANCE).clamp(0.0, 1.0)
    }

    /// Number of traits pushed to either extreme
    pub fn specialization_count(&self) -> usize {
        self.iter()
            .filter(|&(_, v)| v >= HIGH_TRAIT || v <= LOW_TRAIT)
            .count()
    }
}

impl From<Value> for Genome {
    fn from(value: Value) -> Self {
        Genome::from_value(&value)
    }
}

impl From<Genome> for [f32; TRAIT_COUNT] {
    fn from(genome: Genome) -> Self {
        genome.to_array()
    }
}

impl From<[f32; TRAIT_COUNT]> for Genome {
    fn from(values: [f32; TRAIT_COUNT]) -> Self {
        Genome::from_array(values)
    }
}

fn clamp_trait(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        NEUTRAL_TRAIT
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_from_array_clamps() {
        let g = Genome::from_array([-1.0, 2.0, 0.5, f32::NAN, 0.0, 1.0, 0.3, 0.7, 5.0]);
        for (_, v) in g.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
        assert_eq!(g.aggression(), 0.0);
        assert_eq!(g.speed(), 1.0);
        assert_eq!(g.defense(), NEUTRAL_TRAIT);
    }

    #[test]
    fn test_short_slice_coerced_to_neutral() {
        let g = Genome::from_slice(&[0.9, 0.1]);
        assert_eq!(g.aggression(), 0.9);
        assert_eq!(g.speed(), 0.1);
        assert_eq!(g.evasion(), NEUTRAL_TRAIT);
        assert!(Genome::try_from_slice(&[0.9, 0.1]).is_err());
    }

    #[test]
    fn test_keyed_legacy_form() {
        let value = serde_json::json!({
            "aggression": 0.8,
            "risk_taking": 0.9,
            "Evasion": 0.2,
            "bogus": 1.0
        });
        let g = Genome::from_value(&value);
        assert_eq!(g.aggression(), 0.8);
        assert_eq!(g.risk_taking(), 0.9);
        assert_eq!(g.evasion(), 0.2);
        assert_eq!(g.speed(), NEUTRAL_TRAIT);
    }

    #[test]
    fn test_serde_array_format() {
        let g = Genome::from_array([0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875, 1.0]);
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, "[0.0,0.125,0.25,0.375,0.5,0.625,0.75,0.875,1.0]");
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_garbage_deserializes_to_neutral() {
        let g: Genome = serde_json::from_str("\"not a genome\"").unwrap();
        assert_eq!(g, Genome::default());
    }

    #[test]
    fn test_similarity_bounds() {
        let a = Genome::uniform(0.0);
        let b = Genome::uniform(1.0);
        assert_eq!(a.similarity(&a), 1.0);
        assert!(a.similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn test_team_bias() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let red = Genome::team_biased(Team::Red, &mut rng);
            assert!(red.aggression() >= 0.6);
            assert!(red.defense() <= 0.4);

            let blue = Genome::team_biased(Team::Blue, &mut rng);
            assert!(blue.defense() >= 0.6);
            assert!(blue.aggression() <= 0.4);
        }
    }

    #[test]
    fn test_trait_name_parsing() {
        assert_eq!(Trait::from_name("riskTaking"), Some(Trait::RiskTaking));
        assert_eq!(Trait::from_name("RISK-TAKING"), Some(Trait::RiskTaking));
        assert_eq!(Trait::from_name("speed"), Some(Trait::Speed));
        assert_eq!(Trait::from_name("armor"), None);
    }

    #[test]
    fn test_mean() {
        let a = Genome::uniform(0.2);
        let b = Genome::uniform(0.6);
        let m = Genome::mean(&[a, b]).unwrap();
        assert!((m.teamwork() - 0.4).abs() < 1e-6);
        assert!(Genome::mean(&[]).is_none());
    }
}
