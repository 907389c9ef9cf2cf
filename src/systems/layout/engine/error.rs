use thiserror::Error;

/// Configuration problems are fatal for a run and are reported before any
/// search begins. Rule violations and exhausted searches are not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("site must have positive dimensions, got {width} x {depth}")]
    InvalidSite { width: f32, depth: f32 },

    #[error("setback {setback} leaves no buildable region on a {width} x {depth} site")]
    SetbackTooLarge { setback: f32, width: f32, depth: f32 },

    #[error("{name} must be non-negative and finite, got {value}")]
    NegativeValue { name: &'static str, value: f32 },

    #[error("plaza ({x}, {y}) {width} x {depth} must have positive size and lie inside the site")]
    InvalidPlaza { x: f32, y: f32, width: f32, depth: f32 },

    #[error("at least two building types are required, got {0}")]
    TooFewBuildingTypes(usize),

    #[error("building type '{label}' footprint {width} x {depth} does not fit the {region_width} x {region_depth} buildable region")]
    FootprintTooLarge {
        label: String,
        width: f32,
        depth: f32,
        region_width: f32,
        region_depth: f32,
    },

    #[error("min_buildings ({min}) is greater than max_buildings ({max})")]
    InvalidCountRange { min: usize, max: usize },

    #[error("{0} must be at least 1")]
    ZeroParameter(&'static str),

    #[error("{name} must lie in {range}, got {value}")]
    OutOfRange { name: &'static str, range: &'static str, value: f32 },

    #[error("violation penalty must be positive, got {0}")]
    InvalidPenalty(f32),

    #[error("failed to read rule configuration: {0}")]
    Read(String),
}
