use super::model::{Building, RuleConfig};
use super::rules::{validate, ValidationReport, Violation};
use super::score::{breakdown, ScoreBreakdown, ScoreWeights};

/// Ordered buildings plus the validation and score derived from them.
/// The derived state is rebuilt whenever the buildings change, so a layout
/// never carries stale violations.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    buildings: Vec<Building>,
    report: ValidationReport,
    score: ScoreBreakdown,
}

impl Layout {
    pub fn evaluate(buildings: Vec<Building>, rules: &RuleConfig, weights: &ScoreWeights) -> Self {
        let report = validate(&buildings, rules);
        let score = breakdown(
            &buildings,
            &report,
            &rules.site,
            rules.building_types.len(),
            weights,
        );
        Self { buildings, report, score }
    }

    pub fn empty(rules: &RuleConfig, weights: &ScoreWeights) -> Self {
        Self::evaluate(Vec::new(), rules, weights)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn into_buildings(self) -> Vec<Building> {
        self.buildings
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn violations(&self) -> &[Violation] {
        &self.report.violations
    }

    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }

    pub fn score(&self) -> f32 {
        self.score.total
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.score
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn count_of(&self, kind: usize) -> usize {
        self.buildings.iter().filter(|b| b.kind == kind).count()
    }

    pub fn total_area(&self) -> f32 {
        self.buildings.iter().map(Building::area).sum()
    }
}

/// Orders layouts best first. Stable, so equal scores keep request order.
pub fn rank(layouts: &mut [Layout]) {
    layouts.sort_by(|a, b| b.score().total_cmp(&a.score()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    #[test]
    fn derived_state_follows_buildings() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let a = rules.building_at(0, Vec2::new(20.0, 20.0));
        let b = rules.building_at(1, Vec2::new(20.0, 60.0));

        let layout = Layout::evaluate(vec![a, b], &rules, &weights);
        assert!(layout.is_valid());
        assert_eq!(layout.count_of(0), 1);
        assert_eq!(layout.total_area(), 1000.0);

        let mut buildings = layout.into_buildings();
        buildings[1].origin.y = 45.0;
        let moved = Layout::evaluate(buildings, &rules, &weights);
        assert!(!moved.is_valid());
        assert!(moved.score() < 0.0);
    }

    #[test]
    fn rank_puts_best_first() {
        let rules = RuleConfig::default();
        let weights = ScoreWeights::default();
        let one = Layout::evaluate(vec![rules.building_at(0, Vec2::new(20.0, 20.0))], &rules, &weights);
        let empty = Layout::empty(&rules, &weights);
        let mut layouts = vec![empty.clone(), one.clone()];
        rank(&mut layouts);
        assert_eq!(layouts, vec![one, empty]);
    }
}
