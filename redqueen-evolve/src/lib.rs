//! Red Queen Evolution - genetic operators and the researcher
//!
//! This crate provides the proposal side of the coevolution loop:
//! - Selection (tournament, elitism)
//! - Crossover and mutation operators
//! - Counter-evolution against the opponent's recent play
//! - Emergent-trait injection
//! - Deterministic genome names
//! - The Researcher, which combines all of the above per team

pub mod selection;
pub mod crossover;
pub mod mutation;
pub mod counter;
pub mod emergent;
pub mod naming;
pub mod researcher;

pub use selection::{rank_order, select_elite, tournament_select};
pub use crossover::crossover_genomes;
pub use mutation::{mutate_genome, MutationConfig};
pub use counter::OpponentProfile;
pub use emergent::{inject_emergent, EmergentRule, EMERGENT_RULES};
pub use naming::{candidate_label, genome_name, genome_signature};
pub use researcher::{Proposal, ProposalOrigin, ResearchConfig, Researcher};
