// randomized placement search
// builds one layout per call, retrying the whole draft until it validates

use bevy::prelude::*;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;

use super::error::ConfigError;
use super::layout::Layout;
use super::model::{Building, RuleConfig};
use super::params::SearchParams;
use super::rules::admits;
use super::score::ScoreWeights;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// A try passed full validation with at least `min_buildings`.
    Accepted,
    /// `max_tries` ran out, the best try seen is returned.
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub layout: Layout,
    /// Building count drawn for the returned try.
    pub target: usize,
    pub tries: usize,
    pub stop: StopReason,
}

impl GenerationOutcome {
    pub fn is_accepted(&self) -> bool {
        self.stop == StopReason::Accepted
    }

    pub fn under_target(&self) -> bool {
        self.layout.len() < self.target
    }
}

pub struct Generator<'a> {
    rules: &'a RuleConfig,
    weights: &'a ScoreWeights,
    params: SearchParams,
}

impl<'a> Generator<'a> {
    pub fn new(
        rules: &'a RuleConfig,
        weights: &'a ScoreWeights,
        params: SearchParams,
    ) -> Result<Self, ConfigError> {
        rules.validate()?;
        weights.validate()?;
        params.validate()?;
        Ok(Self { rules, weights, params })
    }

    pub fn rules(&self) -> &'a RuleConfig {
        self.rules
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn evaluate(&self, buildings: Vec<Building>) -> Layout {
        Layout::evaluate(buildings, self.rules, self.weights)
    }

    /// Always returns a layout; when no try is accepted the highest scoring
    /// try is returned with its violations recorded.
    pub fn generate(&self, rng: &mut StdRng) -> GenerationOutcome {
        let mut best: Option<(Layout, usize)> = None;

        for tries in 1..=self.params.max_tries {
            let target = rng.random_range(self.params.min_buildings..=self.params.max_buildings);
            let mut buildings = self.draft(target, rng);
            self.densify(&mut buildings, rng);

            let layout = self.evaluate(buildings);
            if layout.is_valid() && layout.len() >= self.params.min_buildings {
                return GenerationOutcome { layout, target, tries, stop: StopReason::Accepted };
            }

            // earliest try wins ties
            let better = best.as_ref().is_none_or(|(b, _)| layout.score() > b.score());
            if better {
                best = Some((layout, target));
            }
        }

        let (layout, target) = match best {
            Some(found) => found,
            None => (Layout::empty(self.rules, self.weights), self.params.min_buildings),
        };
        debug!(
            "search exhausted after {} tries: {} of {} buildings, {} violations",
            self.params.max_tries,
            layout.len(),
            target,
            layout.violations().len()
        );
        GenerationOutcome {
            layout,
            target,
            tries: self.params.max_tries,
            stop: StopReason::Exhausted,
        }
    }

    /// Main pass: one slot per target building, a slot whose attempts all
    /// fail is skipped.
    pub fn draft(&self, target: usize, rng: &mut StdRng) -> Vec<Building> {
        let mut placed = Vec::with_capacity(target);
        for _ in 0..target {
            let kind = self.sample_kind(&placed, rng);
            if let Some(building) = self.place(kind, &placed, rng) {
                placed.push(building);
            }
        }
        placed
    }

    /// Greedy densification, up to `fill_extra` more buildings without
    /// exceeding `max_buildings`. Stops at the first slot that cannot be placed.
    pub fn densify(&self, placed: &mut Vec<Building>, rng: &mut StdRng) {
        for _ in 0..self.params.fill_extra {
            if placed.len() >= self.params.max_buildings {
                break;
            }
            let kind = self.sample_kind(placed, rng);
            match self.place(kind, placed, rng) {
                Some(building) => placed.push(building),
                None => break,
            }
        }
    }

    /// Types already used often are drawn less often, weight 1 / (1 + count).
    pub fn sample_kind(&self, placed: &[Building], rng: &mut StdRng) -> usize {
        let type_count = self.rules.building_types.len();
        let mut counts = vec![0usize; type_count];
        for building in placed {
            counts[building.kind] += 1;
        }

        let weights: Vec<f32> = counts.iter().map(|&c| 1.0 / (1.0 + c as f32)).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.random_range(0..type_count),
        }
    }

    /// Uniform origin inside the setback region for a footprint of `kind`.
    pub fn random_origin(&self, kind: usize, rng: &mut StdRng) -> Vec2 {
        let range = self.rules.origin_range(kind);
        Vec2::new(
            rng.random_range(range.min.x..=range.max.x),
            rng.random_range(range.min.y..=range.max.y),
        )
    }

    /// Up to `attempts_per_building` random candidates checked against
    /// `placed` only.
    pub fn place(&self, kind: usize, placed: &[Building], rng: &mut StdRng) -> Option<Building> {
        (0..self.params.attempts_per_building).find_map(|_| {
            let candidate = self.rules.building_at(kind, self.random_origin(kind, rng));
            admits(&candidate, placed, self.rules).then_some(candidate)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::layout::engine::rules::{edge_distance, fits_in_site, overlaps_plaza};

    fn setup() -> (RuleConfig, ScoreWeights) {
        (RuleConfig::default(), ScoreWeights::default())
    }

    #[test]
    fn invalid_config_fails_before_search() {
        let (rules, weights) = setup();
        let params = SearchParams { min_buildings: 6, max_buildings: 3, ..SearchParams::default() };
        assert!(matches!(
            Generator::new(&rules, &weights, params),
            Err(ConfigError::InvalidCountRange { .. })
        ));
    }

    #[test]
    fn accepted_layouts_respect_every_rule() {
        let (rules, weights) = setup();
        let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = generator.generate(&mut rng);
            assert!(outcome.is_accepted(), "seed {} exhausted", seed);

            let layout = &outcome.layout;
            assert!(layout.is_valid());
            assert!(layout.len() >= 5 && layout.len() <= 12);
            let buildings = layout.buildings();
            for (i, b) in buildings.iter().enumerate() {
                assert!(fits_in_site(b, &rules.site, rules.setback));
                assert!(!overlaps_plaza(b, &rules.plaza));
                for other in &buildings[i + 1..] {
                    assert!(edge_distance(b, other) >= rules.spacing_min);
                }
            }
        }
    }

    #[test]
    fn same_seed_gives_same_placements() {
        let (rules, weights) = setup();
        let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();

        let first = generator.generate(&mut StdRng::seed_from_u64(42));
        let second = generator.generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(first.layout, second.layout);
        assert_eq!(first.tries, second.tries);
    }

    #[test]
    fn draft_only_places_admissible_buildings() {
        let (rules, weights) = setup();
        let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let placed = generator.draft(10, &mut rng);
        assert!(placed.len() <= 10);
        for (i, b) in placed.iter().enumerate() {
            assert!(admits(b, &placed[..i], &rules));
        }
    }

    #[test]
    fn densify_adds_fill_extra_buildings() {
        let (rules, weights) = setup();
        let params = SearchParams { min_buildings: 2, max_buildings: 12, fill_extra: 5, ..SearchParams::default() };
        let generator = Generator::new(&rules, &weights, params).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut placed = generator.draft(2, &mut rng);
        let before = placed.len();
        generator.densify(&mut placed, &mut rng);
        assert_eq!(placed.len(), before + 5.min(12 - before));
        for (i, b) in placed.iter().enumerate() {
            assert!(admits(b, &placed[..i], &rules));
        }
    }

    #[test]
    fn densify_stops_at_max() {
        let (rules, weights) = setup();
        let params = SearchParams { min_buildings: 2, max_buildings: 4, fill_extra: 10, ..SearchParams::default() };
        let generator = Generator::new(&rules, &weights, params).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let mut placed = generator.draft(2, &mut rng);
        generator.densify(&mut placed, &mut rng);
        assert_eq!(placed.len(), 4);
    }

    #[test]
    fn sampling_favours_the_missing_type() {
        let (rules, weights) = setup();
        let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let placed: Vec<Building> = (0..6)
            .map(|i| rules.building_at(0, Vec2::new(10.0 + i as f32, 10.0)))
            .collect();

        // weights 1/7 against 1
        let b_draws = (0..1000).filter(|_| generator.sample_kind(&placed, &mut rng) == 1).count();
        assert!(b_draws > 750, "{}", b_draws);
    }

    #[test]
    fn random_origins_stay_in_range() {
        let (rules, weights) = setup();
        let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let b = rules.building_at(0, generator.random_origin(0, &mut rng));
            assert!(fits_in_site(&b, &rules.site, rules.setback));
        }
    }
}
