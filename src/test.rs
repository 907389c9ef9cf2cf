// end-to-end scenarios on the default site
// 200 x 140, setback 10, spacing 15, 40 x 40 plaza centered, radius 60, A = 30 x 20, B = 20 x 20

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::systems::batch::{self, BatchJob, OutputOptions};
use crate::systems::layout::engine::rules::{edge_distance, fits_in_site, overlaps_plaza, validate};
use crate::systems::layout::engine::*;

fn place(rules: &RuleConfig, kind: usize, x: f32, y: f32) -> Building {
    rules.building_at(kind, Vec2::new(x, y))
}

fn evaluate(buildings: Vec<Building>, rules: &RuleConfig) -> Layout {
    Layout::evaluate(buildings, rules, &ScoreWeights::default())
}

#[test]
fn close_pair_is_a_spacing_violation() {
    let rules = RuleConfig::default();
    let layout = evaluate(vec![place(&rules, 0, 20.0, 20.0), place(&rules, 0, 20.0, 37.0)], &rules);

    assert!(!layout.is_valid());
    assert!(layout.violations().iter().any(|v| matches!(
        v,
        Violation::Spacing { first: 0, second: 1, distance, .. } if *distance < rules.spacing_min
    )));
}

#[test]
fn distant_mixed_pair_is_a_neighbor_mix_violation() {
    let rules = RuleConfig::default();
    // far corners, edge distance well past the radius
    let a = place(&rules, 0, 10.0, 10.0);
    let b = place(&rules, 1, 170.0, 110.0);
    assert!(edge_distance(&a, &b) > rules.neighbor_radius);

    let layout = evaluate(vec![a, b], &rules);
    assert_eq!(layout.report().count(RuleKind::NeighborMix), 2);
    assert!(layout.report().geometry_ok());
    assert!(!layout.is_valid());
}

#[test]
fn single_building_inside_setback_is_valid() {
    let rules = RuleConfig::default();
    for (kind, x, y) in [(0, 10.0, 10.0), (1, 170.0, 110.0), (0, 160.0, 15.0)] {
        let layout = evaluate(vec![place(&rules, kind, x, y)], &rules);
        assert!(layout.violations().is_empty(), "{:?}", layout.violations());
    }
}

// policy choice: once two or more buildings exist, mixing is mandatory, so a
// single-type layout fails neighbor-mix even when geometry is fine
#[test]
fn policy_single_type_layout_violates_neighbor_mix() {
    let rules = RuleConfig::default();
    let layout = evaluate(vec![place(&rules, 0, 10.0, 10.0), place(&rules, 0, 60.0, 10.0)], &rules);

    assert!(layout.report().geometry_ok());
    assert_eq!(layout.report().count(RuleKind::NeighborMix), 2);
    assert!(layout.violations().iter().all(|v| matches!(v, Violation::NeighborMix { nearest: None, .. })));
}

#[test]
fn infeasible_target_returns_short_but_geometrically_clean_layout() {
    // a 200 x 20 strip: at most six footprints fit with 15 m spacing
    let mut rules = RuleConfig::default();
    rules.site = Site { width: 220.0, depth: 40.0 };
    rules.plaza = Plaza { x: 0.0, y: 0.0, width: 1.0, depth: 1.0 };

    let params = SearchParams {
        min_buildings: 8,
        max_buildings: 8,
        attempts_per_building: 200,
        fill_extra: 0,
        max_tries: 20,
    };
    let weights = ScoreWeights::default();
    let generator = Generator::new(&rules, &weights, params).unwrap();
    let outcome = generator.generate(&mut StdRng::seed_from_u64(3));

    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert!(outcome.layout.len() <= 6);
    assert!(outcome.under_target());
    assert!(outcome.layout.report().geometry_ok());
}

#[test]
fn generated_valid_layouts_hold_every_rule() {
    let rules = RuleConfig::default();
    let weights = ScoreWeights::default();
    let generator = Generator::new(&rules, &weights, SearchParams::default()).unwrap();

    for seed in 100..105 {
        let outcome = generator.generate(&mut StdRng::seed_from_u64(seed));
        let layout = &outcome.layout;
        if !layout.is_valid() {
            continue;
        }
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
fn valid_layouts_outscore_invalid_ones() {
    let rules = RuleConfig::default();
    let valid = evaluate(vec![place(&rules, 0, 10.0, 10.0)], &rules);
    let invalid = [
        evaluate(vec![place(&rules, 0, 20.0, 20.0), place(&rules, 0, 20.0, 37.0)], &rules),
        evaluate(vec![place(&rules, 0, 10.0, 10.0), place(&rules, 1, 170.0, 110.0)], &rules),
        evaluate(vec![place(&rules, 1, 90.0, 60.0)], &rules),
    ];
    assert!(valid.is_valid());
    for layout in &invalid {
        assert!(!layout.is_valid());
        assert!(valid.score() > layout.score());
    }
}

#[test]
fn validate_is_idempotent() {
    let rules = RuleConfig::default();
    let buildings = vec![
        place(&rules, 0, 20.0, 20.0),
        place(&rules, 0, 20.0, 37.0),
        place(&rules, 1, 90.0, 60.0),
        place(&rules, 1, 175.0, 5.0),
    ];
    let first = validate(&buildings, &rules);
    let second = validate(&buildings, &rules);
    assert_eq!(first, second);
    assert!(!first.is_valid());
}

#[test]
fn same_seed_reproduces_the_whole_run() {
    let mut run = RunParams { layouts: 3, seed: 2024, ..RunParams::default() };
    run.evolution = EvolutionParams { enabled: true, generations: 4, population_size: 5, ..EvolutionParams::default() };
    let job = BatchJob {
        rules: RuleConfig::default(),
        weights: ScoreWeights::default(),
        run,
        output: OutputOptions::default(),
    };

    let first = batch::run(&job).unwrap();
    let second = batch::run(&job).unwrap();
    let placements = |report: &batch::RunReport| -> Vec<Vec<Building>> {
        report.results.iter().map(|r| r.layout.buildings().to_vec()).collect()
    };
    assert_eq!(placements(&first), placements(&second));
}

#[test]
fn best_of_generation_never_drops() {
    let rules = RuleConfig::default();
    let weights = ScoreWeights::default();
    let generator = Generator::new(&rules, &weights, SearchParams { max_tries: 50, ..SearchParams::default() }).unwrap();
    let params = EvolutionParams { enabled: true, generations: 15, population_size: 8, ..EvolutionParams::default() };
    let optimizer = Optimizer::new(&generator, params).unwrap();

    let outcome = optimizer.run(None, &mut StdRng::seed_from_u64(8));
    assert_eq!(outcome.history.len(), 16);
    for pair in outcome.history.windows(2) {
        assert!(pair[1].best >= pair[0].best);
    }
}

#[test]
fn oversized_footprint_is_rejected_up_front() {
    let mut rules = RuleConfig::default();
    rules.building_types[0] = BuildingType::new("A", 190.0, 20.0);
    let weights = ScoreWeights::default();
    assert!(matches!(
        Generator::new(&rules, &weights, SearchParams::default()),
        Err(ConfigError::FootprintTooLarge { .. })
    ));
}
