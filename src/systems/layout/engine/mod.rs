// layout search and optimization engine, no bevy systems in here

pub mod error;
pub mod evolution;
pub mod generator;
pub mod layout;
pub mod model;
pub mod params;
pub mod rules;
pub mod score;

pub use error::ConfigError;
pub use evolution::{EvolutionOutcome, GenerationStats, Optimizer};
pub use generator::{GenerationOutcome, Generator, StopReason};
pub use layout::{rank, Layout};
pub use model::{Building, BuildingType, Plaza, RuleConfig, Site};
pub use params::{EvolutionParams, RunParams, SearchParams};
pub use rules::{RuleKind, ValidationReport, Violation};
pub use score::{ScoreBreakdown, ScoreWeights};
