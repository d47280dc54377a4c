//! Red Queen Core - genomes and the battle simulator
//!
//! This crate provides the substrate both populations evolve on:
//! - Genome (nine-trait vector) and archetype classification
//! - Candidates with team-locked lineage
//! - Battlefield geometry with seeded obstacles
//! - Tanks, projectiles and the capture-the-point objective
//! - Tick-based battle state machine producing a `BattleResult`
//! - Compact battle history for opponent analysis

pub mod team;
pub mod genome;
pub mod archetype;
pub mod candidate;
pub mod arena;
pub mod tank;
pub mod projectile;
pub mod control_point;
pub mod result;
pub mod battle;
pub mod history;

// Re-exports for convenient access
pub use team::Team;
pub use genome::{Genome, GenomeError, Trait, TRAIT_COUNT};
pub use archetype::{classify, contradictions, Archetype};
pub use candidate::{Candidate, CandidateError, CandidateRecord};
pub use arena::{Arena, Obstacle, Vec2};
pub use tank::{Behavior, CombatStats, Tank, TankMode};
pub use control_point::{ControlPoint, ControlPointSummary, ControlEvent};
pub use result::{
    AgentReport, BattleResult, Outcome, Survivors, TacticalMetrics, TeamStats, TeamTactics, VictoryType, Winner,
};
pub use battle::{BattleConfig, BattleSimulator, BattleState};
pub use history::{BattleRecord, TacticTag};
