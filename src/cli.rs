//! Command line for the viewer and the headless batch run.

use clap::Parser;
use std::path::PathBuf;

use crate::config::*;
use crate::systems::batch::{BatchJob, OutputOptions};
use crate::systems::layout::engine::{
    ConfigError, EvolutionParams, RuleConfig, RunParams, ScoreWeights, SearchParams,
};

/// Plaza layout generator
///
/// Places towers of several footprint types on a rectangular site around a
/// central plaza, checks every placement rule and ranks the results.
#[derive(Parser, Debug, Clone)]
#[command(name = "pl_gen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run the batch without opening a window
    #[arg(long)]
    pub headless: bool,

    /// Number of independent layouts to generate
    #[arg(short = 'n', long, default_value_t = LAYOUT_COUNT)]
    pub layouts: usize,

    #[arg(long, default_value_t = MIN_BUILDINGS)]
    pub min_buildings: usize,

    #[arg(long, default_value_t = MAX_BUILDINGS)]
    pub max_buildings: usize,

    /// Random positions tried per building slot
    #[arg(long, default_value_t = ATTEMPTS_PER_BUILDING)]
    pub attempts_per_building: usize,

    /// Extra buildings placed greedily after the main pass
    #[arg(long, default_value_t = FILL_EXTRA)]
    pub fill_extra: usize,

    /// Full drafts per layout before the best try is kept
    #[arg(long, default_value_t = MAX_TRIES)]
    pub max_tries: usize,

    /// Run seed, drawn at random when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Refine every layout with the evolutionary optimizer
    #[arg(long)]
    pub evolve: bool,

    #[arg(long, default_value_t = GENERATIONS)]
    pub generations: usize,

    #[arg(long, default_value_t = POPULATION_SIZE)]
    pub population_size: usize,

    #[arg(long, default_value_t = MUTATION_RATE)]
    pub mutation_rate: f32,

    /// Rule configuration file (JSON), replaces the default rules
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Directory for exported files
    #[arg(short, long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Write one JSON document per layout
    #[arg(long)]
    pub export_json: bool,

    /// Write a CSV summary of the run
    #[arg(long)]
    pub export_csv: bool,
}

impl Cli {
    pub fn run_params(&self, seed: u64) -> RunParams {
        RunParams {
            layouts: self.layouts,
            seed,
            search: SearchParams {
                min_buildings: self.min_buildings,
                max_buildings: self.max_buildings,
                attempts_per_building: self.attempts_per_building,
                fill_extra: self.fill_extra,
                max_tries: self.max_tries,
            },
            evolution: EvolutionParams {
                enabled: self.evolve,
                generations: self.generations,
                population_size: self.population_size,
                mutation_rate: self.mutation_rate,
                ..EvolutionParams::default()
            },
        }
    }

    /// Loads the rules and checks every parameter, so an invalid configuration
    /// fails before any search starts.
    pub fn resolve(&self) -> Result<BatchJob, ConfigError> {
        let rules = match &self.rules {
            Some(path) => RuleConfig::from_json_file(path)?,
            None => RuleConfig::default(),
        };
        let seed = self.seed.unwrap_or_else(rand::random);

        let job = BatchJob {
            rules,
            weights: ScoreWeights::default(),
            run: self.run_params(seed),
            output: OutputOptions {
                output_dir: self.output_dir.clone(),
                export_json: self.export_json,
                export_csv: self.export_csv,
            },
        };
        job.validate()?;
        Ok(job)
    }
}
