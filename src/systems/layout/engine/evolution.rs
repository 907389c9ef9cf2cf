// elitist hill climbing over a population of layouts
// no recombination: every child comes from one parent and replaces it only if it scores at least as well

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use super::error::ConfigError;
use super::generator::Generator;
use super::layout::{rank, Layout};
use super::model::Building;
use super::params::EvolutionParams;
use super::rules::{admits, nearest_other_kind};

/// Population summary after one evaluation step. Generation 0 is the seed population.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f32,
    pub mean: f32,
    pub valid: usize,
}

#[derive(Clone, Debug)]
pub struct EvolutionOutcome {
    pub best: Layout,
    pub history: Vec<GenerationStats>,
}

impl EvolutionOutcome {
    pub fn initial_best(&self) -> f32 {
        self.history.first().map(|s| s.best).unwrap_or(f32::NEG_INFINITY)
    }

    pub fn improvement(&self) -> f32 {
        self.best.score() - self.initial_best()
    }
}

pub struct Optimizer<'g, 'a> {
    generator: &'g Generator<'a>,
    params: EvolutionParams,
    jitter: Normal<f32>,
}

impl<'g, 'a> Optimizer<'g, 'a> {
    pub fn new(generator: &'g Generator<'a>, params: EvolutionParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let jitter = Normal::new(0.0, params.jitter).map_err(|_| ConfigError::OutOfRange {
            name: "jitter",
            range: "(0, inf)",
            value: params.jitter,
        })?;
        Ok(Self { generator, params, jitter })
    }

    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    /// Runs all generations and returns the best layout seen.
    /// `seed` (usually the generator's output for this request) becomes the
    /// first member; the rest of the population comes from fresh searches.
    pub fn run(&self, seed: Option<Layout>, rng: &mut StdRng) -> EvolutionOutcome {
        let mut population = self.initial_population(seed, rng);
        rank(&mut population);

        let mut history = vec![stats(0, &population)];
        let mut best = population[0].clone();
        let elite_count = self.params.elite_count();

        for generation in 1..=self.params.generations {
            population = self.next_generation(&population[..elite_count], rng);
            rank(&mut population);

            if population[0].score() > best.score() {
                best = population[0].clone();
            }
            history.push(stats(generation, &population));
        }

        debug!(
            "evolution finished: best {:.1} ({} buildings, valid {}) after {} generations",
            best.score(),
            best.len(),
            best.is_valid(),
            self.params.generations
        );
        EvolutionOutcome { best, history }
    }

    pub fn initial_population(&self, seed: Option<Layout>, rng: &mut StdRng) -> Vec<Layout> {
        let size = self.params.population_size;
        let mut population = Vec::with_capacity(size);
        population.extend(seed);
        while population.len() < size {
            population.push(self.generator.generate(rng).layout);
        }
        population
    }

    /// Elites survive unchanged, the remaining slots are filled with
    /// children of randomly chosen elites. A population of one has no free
    /// slot, so its member is replaced by its own child when that is not worse.
    pub fn next_generation(&self, elites: &[Layout], rng: &mut StdRng) -> Vec<Layout> {
        if elites.len() >= self.params.population_size {
            return elites
                .iter()
                .map(|parent| self.child_or_parent(parent, rng))
                .collect();
        }

        let mut next = Vec::with_capacity(self.params.population_size);
        next.extend_from_slice(elites);

        while next.len() < self.params.population_size {
            let parent = &elites[rng.random_range(0..elites.len())];
            next.push(self.child_or_parent(parent, rng));
        }
        next
    }

    fn child_or_parent(&self, parent: &Layout, rng: &mut StdRng) -> Layout {
        let child = self.mutate(parent, rng);
        if child.score() >= parent.score() {
            child
        } else {
            parent.clone()
        }
    }

    /// Each operator fires independently with probability `mutation_rate`
    /// (type swap at half of it).
    pub fn mutate(&self, parent: &Layout, rng: &mut StdRng) -> Layout {
        let rate = self.params.mutation_rate as f64;
        let mut buildings = parent.buildings().to_vec();

        if !buildings.is_empty() && rng.random_bool(rate) {
            let idx = rng.random_range(0..buildings.len());
            buildings.remove(idx);
        }

        if !buildings.is_empty() && rng.random_bool(rate) {
            let idx = rng.random_range(0..buildings.len());
            self.move_building(&mut buildings, idx, rng);
        }

        if !buildings.is_empty() && rng.random_bool(rate * 0.5) {
            let idx = rng.random_range(0..buildings.len());
            self.swap_kind(&mut buildings, idx, rng);
        }

        if rng.random_bool(rate) {
            if let Some(building) = self.propose_addition(&buildings, rng) {
                buildings.push(building);
            }
        }

        self.generator.evaluate(buildings)
    }

    /// Gaussian jitter around the current spot first, then uniform
    /// re-sampling. The building stays put if nothing admissible is found.
    fn move_building(&self, buildings: &mut [Building], idx: usize, rng: &mut StdRng) {
        let rules = self.generator.rules();
        let attempts = self.generator.params().attempts_per_building;
        let current = buildings[idx];
        let others: Vec<Building> = buildings
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, b)| *b)
            .collect();

        for attempt in 0..attempts {
            let origin = if attempt < attempts / 2 {
                let offset = Vec2::new(self.jitter.sample(rng), self.jitter.sample(rng));
                rules.clamp_origin(current.kind, current.origin + offset)
            } else {
                self.generator.random_origin(current.kind, rng)
            };
            let candidate = rules.building_at(current.kind, origin);
            if admits(&candidate, &others, rules) {
                buildings[idx] = candidate;
                return;
            }
        }
    }

    /// Replace the footprint with another type around the same center.
    fn swap_kind(&self, buildings: &mut [Building], idx: usize, rng: &mut StdRng) {
        let rules = self.generator.rules();
        let current = buildings[idx];
        let choices: Vec<usize> = (0..rules.building_types.len())
            .filter(|&k| k != current.kind)
            .collect();
        let Some(&kind) = choices.choose(rng) else {
            return;
        };

        let size = rules.building_type(kind).size();
        let origin = rules.clamp_origin(kind, current.center() - size * 0.5);
        let candidate = rules.building_at(kind, origin);

        let others: Vec<Building> = buildings
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, b)| *b)
            .collect();
        if admits(&candidate, &others, rules) {
            buildings[idx] = candidate;
        }
    }

    /// Prefer covering a building that lacks a neighbor of another type by
    /// placing one within the radius; otherwise place a building anywhere.
    pub fn propose_addition(&self, buildings: &[Building], rng: &mut StdRng) -> Option<Building> {
        let rules = self.generator.rules();
        let radius = rules.neighbor_radius;

        let uncovered: Vec<usize> = (0..buildings.len())
            .filter(|&i| !matches!(nearest_other_kind(i, buildings), Some(d) if d <= radius))
            .collect();

        if let Some(&anchor_idx) = uncovered.choose(rng) {
            let anchor = buildings[anchor_idx];
            let kinds: Vec<usize> = (0..rules.building_types.len())
                .filter(|&k| k != anchor.kind)
                .collect();
            let attempts = self.generator.params().attempts_per_building;

            for _ in 0..attempts {
                let Some(&kind) = kinds.choose(rng) else { break };
                let size = rules.building_type(kind).size();

                // center-to-center offset that keeps the edge gap between spacing_min and radius
                let reach = (anchor.size + size).length() * 0.5;
                let lo = rules.spacing_min + reach * 0.5;
                let hi = (radius + reach * 0.5).max(lo);
                let distance = rng.random_range(lo..=hi);
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let center = anchor.center() + Vec2::new(angle.cos(), angle.sin()) * distance;

                let origin = rules.clamp_origin(kind, center - size * 0.5);
                let candidate = rules.building_at(kind, origin);
                if admits(&candidate, buildings, rules) {
                    return Some(candidate);
                }
            }
        }

        let kind = self.generator.sample_kind(buildings, rng);
        self.generator.place(kind, buildings, rng)
    }
}

fn stats(generation: usize, population: &[Layout]) -> GenerationStats {
    let best = population
        .iter()
        .map(Layout::score)
        .fold(f32::NEG_INFINITY, f32::max);
    let mean = population.iter().map(Layout::score).sum::<f32>() / population.len().max(1) as f32;
    let valid = population.iter().filter(|l| l.is_valid()).count();
    GenerationStats { generation, best, mean, valid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::layout::engine::model::RuleConfig;
    use crate::systems::layout::engine::params::SearchParams;
    use crate::systems::layout::engine::score::ScoreWeights;

    fn quick_params() -> EvolutionParams {
        EvolutionParams {
            enabled: true,
            generations: 15,
            population_size: 8,
            ..EvolutionParams::default()
        }
    }

    fn quick_search() -> SearchParams {
        SearchParams { max_tries: 50, ..SearchParams::default() }
    }

    #[test]
    fn best_score_never_drops_between_generations() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let optimizer = Optimizer::new(&generator, quick_params()).unwrap();

        let outcome = optimizer.run(None, &mut StdRng::seed_from_u64(9));
        assert_eq!(outcome.history.len(), 16);
        for pair in outcome.history.windows(2) {
            assert!(pair[1].best >= pair[0].best, "{:?}", pair);
        }
        assert_eq!(outcome.best.score(), outcome.history.last().unwrap().best);
        assert!(outcome.improvement() >= 0.0);
    }

    #[test]
    fn evolved_layout_is_at_least_as_good_as_its_seed() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let optimizer = Optimizer::new(&generator, quick_params()).unwrap();
        let mut rng = StdRng::seed_from_u64(21);

        let seed = generator.generate(&mut rng).layout;
        let seed_score = seed.score();
        let outcome = optimizer.run(Some(seed), &mut rng);
        assert!(outcome.best.score() >= seed_score);
    }

    #[test]
    fn children_never_replace_a_better_parent() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let optimizer = Optimizer::new(&generator, quick_params()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let parent = generator.generate(&mut rng).layout;
        let next = optimizer.next_generation(std::slice::from_ref(&parent), &mut rng);
        assert_eq!(next.len(), 8);
        assert!(next.iter().all(|l| l.score() >= parent.score()));
    }

    #[test]
    fn same_seed_gives_same_evolution() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let optimizer = Optimizer::new(&generator, quick_params()).unwrap();

        let first = optimizer.run(None, &mut StdRng::seed_from_u64(77));
        let second = optimizer.run(None, &mut StdRng::seed_from_u64(77));
        assert_eq!(first.best, second.best);
        assert_eq!(first.history, second.history);
    }

    #[test]
    fn addition_covers_a_lonely_building() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let optimizer = Optimizer::new(&generator, quick_params()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let lonely = [rules.building_at(0, Vec2::new(20.0, 20.0)), rules.building_at(0, Vec2::new(20.0, 90.0))];
        let added = optimizer.propose_addition(&lonely, &mut rng).unwrap();
        assert_eq!(added.kind, 1);
        assert!(admits(&added, &lonely, &rules));
    }

    #[test]
    fn single_member_population_still_mutates() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let params = EvolutionParams { population_size: 1, mutation_rate: 1.0, generations: 1, ..quick_params() };
        let optimizer = Optimizer::new(&generator, params).unwrap();

        // the add operator always fires, so the empty seed gains a building
        let outcome = optimizer.run(Some(Layout::empty(&rules, &weights)), &mut StdRng::seed_from_u64(6));
        assert_eq!(outcome.history.len(), 2);
        assert!(!outcome.best.is_empty());
        assert!(outcome.best.is_valid());
        assert!(outcome.improvement() > 0.0);
    }

    #[test]
    fn full_elite_fraction_leaves_room_for_a_child() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let params = EvolutionParams { population_size: 4, elite_fraction: 1.0, mutation_rate: 1.0, ..quick_params() };
        let optimizer = Optimizer::new(&generator, params).unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let population = vec![Layout::empty(&rules, &weights); 4];
        let elites = &population[..params.elite_count()];
        let next = optimizer.next_generation(elites, &mut rng);
        assert_eq!(next.len(), 4);
        assert_eq!(next.iter().filter(|l| l.is_empty()).count(), 3);
        assert!(!next[3].is_empty());
    }

    #[test]
    fn zero_population_is_rejected() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let generator = Generator::new(&rules, &weights, quick_search()).unwrap();
        let params = EvolutionParams { population_size: 0, ..quick_params() };
        assert!(Optimizer::new(&generator, params).is_err());
    }
}
