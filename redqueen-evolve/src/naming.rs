//! Genome naming - Human-readable identifiers for tracking lineages
//!
//! Generates memorable two-word names (e.g., "iron-wolf", "swift-tower")
//! from genomes. Traits are quantized to tenths before hashing, so small
//! mutations usually keep the name and a real shift in behavior changes it.

use redqueen_core::{Genome, Team};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

// 64 adjectives + 64 nouns = 4096 unique names
const ADJECTIVES: [&str; 64] = [
    "red", "blue", "gold", "dark", "pale", "wild", "calm", "bold",
    "swift", "slow", "warm", "cold", "soft", "hard", "deep", "high",
    "iron", "silk", "jade", "ruby", "onyx", "opal", "amber", "coral",
    "quick", "still", "bright", "dim", "fresh", "old", "new", "lost",
    "stone", "glass", "steel", "brass", "copper", "silver", "bronze", "chrome",
    "sharp", "blunt", "keen", "dull", "pure", "mixed", "raw", "fine",
    "north", "south", "east", "west", "inner", "outer", "upper", "lower",
    "first", "last", "prime", "dual", "twin", "lone", "true", "void",
];

const NOUNS: [&str; 64] = [
    "wolf", "bear", "hawk", "lion", "fox", "owl", "elk", "ram",
    "oak", "pine", "elm", "ash", "fern", "moss", "vine", "root",
    "storm", "flame", "frost", "tide", "wind", "dust", "mist", "haze",
    "crown", "blade", "shield", "helm", "lance", "bow", "staff", "ring",
    "tower", "gate", "wall", "bridge", "path", "road", "trail", "pass",
    "dawn", "dusk", "noon", "night", "moon", "star", "sun", "sky",
    "peak", "vale", "cave", "lake", "river", "shore", "cliff", "ridge",
    "forge", "anvil", "hammer", "arrow", "spear", "axe", "sword", "torch",
];

/// Quantized signature of a genome, one digit per trait.
///
/// Two genomes whose traits round to the same tenths share a signature.
pub fn genome_signature(genome: &Genome) -> String {
    genome
        .to_array()
        .iter()
        .map(|v| format!("{}", (v * 10.0).round() as u8))
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert a genome signature to a deterministic two-word name.
pub fn signature_to_name(sig: &str) -> String {
    let mut hasher = DefaultHasher::new();
    sig.hash(&mut hasher);
    let h = hasher.finish();

    let adj_idx = ((h >> 6) & 0x3F) as usize; // bits 6-11 -> adjective (0-63)
    let noun_idx = (h & 0x3F) as usize; // bits 0-5 -> noun (0-63)

    format!("{}-{}", ADJECTIVES[adj_idx], NOUNS[noun_idx])
}

/// Memorable two-word name for a genome
pub fn genome_name(genome: &Genome) -> String {
    signature_to_name(&genome_signature(genome))
}

/// Name prefixed with the team, e.g. "red:iron-wolf"
pub fn candidate_label(team: Team, genome: &Genome) -> String {
    format!("{}:{}", team, genome_name(genome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redqueen_core::{Archetype, Trait};

    #[test]
    fn test_signature_quantizes() {
        let mut a = Genome::default();
        let mut b = Genome::default();
        a.set(Trait::Speed, 0.71);
        b.set(Trait::Speed, 0.69);
        assert_eq!(genome_signature(&a), genome_signature(&b));
        assert_eq!(genome_signature(&Genome::default()), "5.5.5.5.5.5.5.5.5");
    }

    #[test]
    fn test_name_deterministic() {
        let g = Archetype::Sniper.preset();
        assert_eq!(genome_name(&g), genome_name(&g));
    }

    #[test]
    fn test_name_format() {
        let name = genome_name(&Archetype::Guardian.preset());
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 2, "Name should have two parts: {}", name);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NOUNS.contains(&parts[1]));
    }

    #[test]
    fn test_label_has_team() {
        let label = candidate_label(Team::Blue, &Genome::default());
        assert!(label.starts_with("blue:"));
    }
}
