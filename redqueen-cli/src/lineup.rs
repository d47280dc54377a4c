//! Lineup loading shared by the battle and bench commands
//!
//! Level 4 - file I/O utilities

use std::path::Path;

use anyhow::{bail, Context, Result};
use redqueen_core::{Archetype, Genome};
use redqueen_lab::LabConfig;
use serde_json::Value;

/// Resolve a lineup from an archetype name or a JSON file.
///
/// The file may hold one genome (repeated `count` times) or an array of
/// genomes. Genomes are canonical 9-element arrays; keyed objects are
/// normalized on the way in.
pub fn load_lineup(source: &str, count: usize) -> Result<Vec<Genome>> {
    if let Some(archetype) = Archetype::from_name(source) {
        return Ok(vec![archetype.preset(); count.max(1)]);
    }

    let path = Path::new(source);
    if !path.exists() {
        bail!(
            "'{}' is neither an archetype ({}) nor a file",
            source,
            Archetype::ALL.iter().map(|a| a.name()).collect::<Vec<_>>().join(", ")
        );
    }

    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(genomes_from_value(&value, count))
}

fn genomes_from_value(value: &Value, count: usize) -> Vec<Genome> {
    match value {
        Value::Array(items) if items.iter().all(|v| v.is_array() || v.is_object()) && !items.is_empty() => {
            items.iter().map(Genome::from_value).collect()
        }
        other => vec![Genome::from_value(other); count.max(1)],
    }
}

/// Config from file, or defaults
pub fn load_config(path: Option<&Path>) -> Result<LabConfig> {
    match path {
        Some(p) => LabConfig::load(p).with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(LabConfig::default()),
    }
}
