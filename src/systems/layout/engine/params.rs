// run parameters, validated once before any search starts

use crate::config::*;
use super::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    pub min_buildings: usize,
    pub max_buildings: usize,
    pub attempts_per_building: usize,
    pub fill_extra: usize,
    pub max_tries: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_buildings: MIN_BUILDINGS,
            max_buildings: MAX_BUILDINGS,
            attempts_per_building: ATTEMPTS_PER_BUILDING,
            fill_extra: FILL_EXTRA,
            max_tries: MAX_TRIES,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_buildings > self.max_buildings {
            return Err(ConfigError::InvalidCountRange {
                min: self.min_buildings,
                max: self.max_buildings,
            });
        }
        if self.attempts_per_building == 0 {
            return Err(ConfigError::ZeroParameter("attempts_per_building"));
        }
        if self.max_tries == 0 {
            return Err(ConfigError::ZeroParameter("max_tries"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvolutionParams {
    pub enabled: bool,
    pub generations: usize,
    pub population_size: usize,
    pub mutation_rate: f32,
    /// Share of each generation kept as parents.
    pub elite_fraction: f32,
    /// Standard deviation of the move mutation.
    pub jitter: f32,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            generations: GENERATIONS,
            population_size: POPULATION_SIZE,
            mutation_rate: MUTATION_RATE,
            elite_fraction: ELITE_FRACTION,
            jitter: MOVE_JITTER,
        }
    }
}

impl EvolutionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::ZeroParameter("population_size"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::OutOfRange {
                name: "mutation_rate",
                range: "[0, 1]",
                value: self.mutation_rate,
            });
        }
        if !(self.elite_fraction > 0.0 && self.elite_fraction <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "elite_fraction",
                range: "(0, 1]",
                value: self.elite_fraction,
            });
        }
        if !(self.jitter > 0.0) || !self.jitter.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "jitter",
                range: "(0, inf)",
                value: self.jitter,
            });
        }
        Ok(())
    }

    /// Number of parents kept per generation, at least one. Leaves at least
    /// one child slot whenever the population has more than one member.
    pub fn elite_count(&self) -> usize {
        let cap = self.population_size.saturating_sub(1).max(1);
        ((self.population_size as f32 * self.elite_fraction).ceil() as usize).clamp(1, cap)
    }
}

/// Everything a run needs besides the rules and weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunParams {
    pub layouts: usize,
    pub seed: u64,
    pub search: SearchParams,
    pub evolution: EvolutionParams,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            layouts: LAYOUT_COUNT,
            seed: INITIAL_SEED,
            search: SearchParams::default(),
            evolution: EvolutionParams::default(),
        }
    }
}

impl RunParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layouts == 0 {
            return Err(ConfigError::ZeroParameter("layouts"));
        }
        self.search.validate()?;
        if self.evolution.enabled {
            self.evolution.validate()?;
        }
        Ok(())
    }

    /// Sub-seed for request `index`, each request owns its own generator.
    pub fn request_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_count_range_is_rejected() {
        let params = SearchParams { min_buildings: 9, max_buildings: 4, ..SearchParams::default() };
        assert_eq!(
            params.validate(),
            Err(ConfigError::InvalidCountRange { min: 9, max: 4 })
        );
    }

    #[test]
    fn mutation_rate_must_be_a_probability() {
        let params = EvolutionParams { mutation_rate: 1.5, ..EvolutionParams::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn evolution_params_only_checked_when_enabled() {
        let mut run = RunParams::default();
        run.evolution.population_size = 0;
        assert!(run.validate().is_ok());
        run.evolution.enabled = true;
        assert_eq!(run.validate(), Err(ConfigError::ZeroParameter("population_size")));
    }

    #[test]
    fn elite_count_is_clamped() {
        let mut params = EvolutionParams { population_size: 20, elite_fraction: 0.5, ..EvolutionParams::default() };
        assert_eq!(params.elite_count(), 10);
        params.elite_fraction = 0.01;
        assert_eq!(params.elite_count(), 1);
        params.elite_fraction = 1.0;
        assert_eq!(params.elite_count(), 19);
    }

    #[test]
    fn single_member_population_keeps_itself_as_elite() {
        let params = EvolutionParams { population_size: 1, elite_fraction: 1.0, ..EvolutionParams::default() };
        assert_eq!(params.elite_count(), 1);
        let params = EvolutionParams { population_size: 2, elite_fraction: 1.0, ..EvolutionParams::default() };
        assert_eq!(params.elite_count(), 1);
    }

    #[test]
    fn request_seeds_are_distinct() {
        let run = RunParams { seed: u64::MAX, ..RunParams::default() };
        assert_eq!(run.request_seed(0), u64::MAX);
        assert_eq!(run.request_seed(1), 0);
    }
}
