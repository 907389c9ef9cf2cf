// placement rules
// every rule is an independent predicate over footprints, plus the relational neighbor-mix rule

use bevy::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

use super::model::{Building, Plaza, RuleConfig, Site};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Boundary,
    Plaza,
    Spacing,
    NeighborMix,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Boundary,
        RuleKind::Plaza,
        RuleKind::Spacing,
        RuleKind::NeighborMix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Boundary => "boundary",
            RuleKind::Plaza => "plaza",
            RuleKind::Spacing => "spacing",
            RuleKind::NeighborMix => "neighbor_mix",
        }
    }
}

/// One broken rule with the measured value that broke it.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    /// `clearance` is the smallest distance from the footprint to a site edge.
    Boundary { index: usize, clearance: f32, setback: f32 },
    /// `distance` is the signed edge distance to the plaza, must be > 0.
    Plaza { index: usize, distance: f32 },
    Spacing { first: usize, second: usize, distance: f32, minimum: f32 },
    /// `nearest` is the edge distance to the closest building of another type.
    NeighborMix { index: usize, nearest: Option<f32>, radius: f32 },
}

impl Violation {
    pub fn kind(&self) -> RuleKind {
        match self {
            Violation::Boundary { .. } => RuleKind::Boundary,
            Violation::Plaza { .. } => RuleKind::Plaza,
            Violation::Spacing { .. } => RuleKind::Spacing,
            Violation::NeighborMix { .. } => RuleKind::NeighborMix,
        }
    }

    pub fn indices(&self) -> Vec<usize> {
        match *self {
            Violation::Boundary { index, .. }
            | Violation::Plaza { index, .. }
            | Violation::NeighborMix { index, .. } => vec![index],
            Violation::Spacing { first, second, .. } => vec![first, second],
        }
    }

    /// None when no building of another type exists at all.
    pub fn measured(&self) -> Option<f32> {
        match *self {
            Violation::Boundary { clearance, .. } => Some(clearance),
            Violation::Plaza { distance, .. } => Some(distance),
            Violation::Spacing { distance, .. } => Some(distance),
            Violation::NeighborMix { nearest, .. } => nearest,
        }
    }

    pub fn threshold(&self) -> f32 {
        match *self {
            Violation::Boundary { setback, .. } => setback,
            Violation::Plaza { .. } => 0.0,
            Violation::Spacing { minimum, .. } => minimum,
            Violation::NeighborMix { radius, .. } => radius,
        }
    }

    pub fn involves(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Boundary { index, clearance, setback } => {
                write!(f, "#{} boundary clearance {:.1} < {:.1}", index, clearance, setback)
            }
            Violation::Plaza { index, distance } => {
                write!(f, "#{} plaza clearance {:.1} <= 0", index, distance)
            }
            Violation::Spacing { first, second, distance, minimum } => {
                write!(f, "#{}-#{} spacing {:.1} < {:.1}", first, second, distance, minimum)
            }
            Violation::NeighborMix { index, nearest: Some(d), radius } => {
                write!(f, "#{} nearest other type {:.1} > {:.1}", index, d, radius)
            }
            Violation::NeighborMix { index, nearest: None, .. } => {
                write!(f, "#{} no building of another type", index)
            }
        }
    }
}

/// Result of a full validation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn rule_ok(&self, kind: RuleKind) -> bool {
        !self.violations.iter().any(|v| v.kind() == kind)
    }

    pub fn count(&self, kind: RuleKind) -> usize {
        self.violations.iter().filter(|v| v.kind() == kind).count()
    }

    pub fn affected_indices(&self) -> BTreeSet<usize> {
        self.violations.iter().flat_map(|v| v.indices()).collect()
    }

    pub fn for_building(&self, index: usize) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.involves(index))
    }

    /// True when only the relational rule is broken.
    pub fn geometry_ok(&self) -> bool {
        self.violations.iter().all(|v| v.kind() == RuleKind::NeighborMix)
    }
}

/// Signed edge-to-edge distance between two axis-aligned rectangles.
/// Zero when touching, negative (minus the smaller penetration) when overlapping.
pub fn rect_distance(a: Rect, b: Rect) -> f32 {
    let gap_x = (b.min.x - a.max.x).max(a.min.x - b.max.x);
    let gap_y = (b.min.y - a.max.y).max(a.min.y - b.max.y);

    match (gap_x > 0.0, gap_y > 0.0) {
        (true, true) => gap_x.hypot(gap_y),
        (true, false) => gap_x,
        (false, true) => gap_y,
        (false, false) => gap_x.max(gap_y),
    }
}

pub fn edge_distance(b1: &Building, b2: &Building) -> f32 {
    rect_distance(b1.rect(), b2.rect())
}

/// Smallest distance from the footprint to any site edge, negative when outside.
pub fn site_clearance(building: &Building, site: &Site) -> f32 {
    let r = building.rect();
    let s = site.rect();
    (r.min.x - s.min.x)
        .min(r.min.y - s.min.y)
        .min(s.max.x - r.max.x)
        .min(s.max.y - r.max.y)
}

pub fn fits_in_site(building: &Building, site: &Site, setback: f32) -> bool {
    let r = building.rect();
    let region = site.buildable(setback);
    r.min.x >= region.min.x
        && r.min.y >= region.min.y
        && r.max.x <= region.max.x
        && r.max.y <= region.max.y
}

// touching edges count as overlap
pub fn overlaps_plaza(building: &Building, plaza: &Plaza) -> bool {
    let r = building.rect();
    let p = plaza.rect();
    r.min.x <= p.max.x && p.min.x <= r.max.x && r.min.y <= p.max.y && p.min.y <= r.max.y
}

/// Edge distance from `buildings[index]` to the closest building of another type.
pub fn nearest_other_kind(index: usize, buildings: &[Building]) -> Option<f32> {
    let subject = &buildings[index];
    buildings
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != index && other.kind != subject.kind)
        .map(|(_, other)| edge_distance(subject, other))
        .min_by(|a, b| a.total_cmp(b))
}

/// Whether `buildings[index]` has a building of another type within `radius`.
/// A layout of a single building is exempt; a single-type layout of two or
/// more buildings never satisfies the rule.
pub fn satisfies_neighbor_mix(index: usize, buildings: &[Building], radius: f32) -> bool {
    if buildings.len() < 2 {
        return true;
    }
    matches!(nearest_other_kind(index, buildings), Some(d) if d <= radius)
}

/// Incremental check used during placement: the rules that only involve
/// `candidate` and the buildings already placed. Neighbor-mix is skipped,
/// it can only be judged once the layout is complete.
pub fn admits(candidate: &Building, placed: &[Building], rules: &RuleConfig) -> bool {
    fits_in_site(candidate, &rules.site, rules.setback)
        && !overlaps_plaza(candidate, &rules.plaza)
        && placed
            .iter()
            .all(|other| edge_distance(candidate, other) >= rules.spacing_min)
}

/// Recomputes every rule over the whole layout.
/// Order: boundary and plaza per building, spacing per pair (i < j), neighbor-mix per building.
pub fn validate(buildings: &[Building], rules: &RuleConfig) -> ValidationReport {
    let mut violations = Vec::new();

    for (index, building) in buildings.iter().enumerate() {
        if !fits_in_site(building, &rules.site, rules.setback) {
            violations.push(Violation::Boundary {
                index,
                clearance: site_clearance(building, &rules.site),
                setback: rules.setback,
            });
        }
        if overlaps_plaza(building, &rules.plaza) {
            violations.push(Violation::Plaza {
                index,
                distance: rect_distance(building.rect(), rules.plaza.rect()),
            });
        }
    }

    for i in 0..buildings.len() {
        for j in (i + 1)..buildings.len() {
            let distance = edge_distance(&buildings[i], &buildings[j]);
            if distance < rules.spacing_min {
                violations.push(Violation::Spacing {
                    first: i,
                    second: j,
                    distance,
                    minimum: rules.spacing_min,
                });
            }
        }
    }

    if buildings.len() >= 2 {
        for index in 0..buildings.len() {
            if !satisfies_neighbor_mix(index, buildings, rules.neighbor_radius) {
                violations.push(Violation::NeighborMix {
                    index,
                    nearest: nearest_other_kind(index, buildings),
                    radius: rules.neighbor_radius,
                });
            }
        }
    }

    ValidationReport { violations }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleConfig {
        RuleConfig::default()
    }

    fn a(x: f32, y: f32) -> Building {
        rules().building_at(0, Vec2::new(x, y))
    }

    fn b(x: f32, y: f32) -> Building {
        rules().building_at(1, Vec2::new(x, y))
    }

    #[test]
    fn distance_of_separated_rects() {
        // horizontal gap only
        assert_eq!(edge_distance(&b(10.0, 10.0), &b(45.0, 10.0)), 15.0);
        // diagonal gap 3-4-5
        assert_eq!(edge_distance(&b(10.0, 10.0), &b(33.0, 34.0)), 5.0);
    }

    #[test]
    fn distance_of_touching_and_overlapping_rects() {
        assert_eq!(edge_distance(&b(10.0, 10.0), &b(30.0, 10.0)), 0.0);
        // overlap of 3 on y, 30 on x
        assert_eq!(edge_distance(&a(20.0, 20.0), &a(20.0, 37.0)), -3.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [(a(20.0, 20.0), b(70.0, 90.0)), (a(100.0, 12.0), b(95.0, 20.0))];
        for (p, q) in pairs {
            assert_eq!(edge_distance(&p, &q), edge_distance(&q, &p));
        }
    }

    #[test]
    fn setback_edges_are_inclusive() {
        let r = rules();
        assert!(fits_in_site(&a(10.0, 10.0), &r.site, r.setback));
        assert!(fits_in_site(&a(160.0, 110.0), &r.site, r.setback));
        assert!(!fits_in_site(&a(9.9, 10.0), &r.site, r.setback));
        assert!(!fits_in_site(&a(160.5, 50.0), &r.site, r.setback));
    }

    #[test]
    fn plaza_touch_counts_as_overlap() {
        let r = rules();
        // plaza spans x 80..120, y 50..90
        assert!(overlaps_plaza(&b(60.0, 60.0), &r.plaza));
        assert!(!overlaps_plaza(&b(59.9, 60.0), &r.plaza));
        assert!(overlaps_plaza(&a(90.0, 60.0), &r.plaza));
    }

    #[test]
    fn single_building_is_exempt_from_neighbor_mix() {
        let buildings = [a(20.0, 20.0)];
        assert!(satisfies_neighbor_mix(0, &buildings, 60.0));
    }

    #[test]
    fn single_type_layout_breaks_neighbor_mix() {
        // mixing is mandatory once there is more than one building
        let buildings = [a(20.0, 20.0), a(20.0, 70.0)];
        assert!(!satisfies_neighbor_mix(0, &buildings, 60.0));
        let report = validate(&buildings, &rules());
        assert_eq!(report.count(RuleKind::NeighborMix), 2);
        assert!(report.for_building(1).all(|v| v.measured().is_none()));
    }

    #[test]
    fn neighbor_mix_is_symmetric() {
        let buildings = [a(20.0, 20.0), b(160.0, 100.0), b(20.0, 60.0)];
        // a and the near b cover each other, the far b is alone
        assert!(satisfies_neighbor_mix(0, &buildings, 60.0));
        assert!(satisfies_neighbor_mix(2, &buildings, 60.0));
        assert!(!satisfies_neighbor_mix(1, &buildings, 60.0));
    }

    #[test]
    fn admits_ignores_neighbor_mix() {
        let r = rules();
        let placed = [a(20.0, 20.0)];
        assert!(admits(&a(20.0, 60.0), &placed, &r));
        assert!(!admits(&a(20.0, 50.0), &placed, &r)); // gap 10 < 15
        assert!(!admits(&b(90.0, 60.0), &[], &r)); // plaza
        assert!(!admits(&b(5.0, 60.0), &[], &r)); // setback
    }

    #[test]
    fn gap_of_exactly_spacing_min_is_allowed() {
        let r = rules();
        let pair = [b(10.0, 10.0), b(45.0, 10.0)];
        assert_eq!(edge_distance(&pair[0], &pair[1]), r.spacing_min);

        let report = validate(&pair, &r);
        assert_eq!(report.count(RuleKind::Spacing), 0);
        assert!(report.geometry_ok());
        assert!(admits(&pair[1], &pair[..1], &r));
    }

    #[test]
    fn violation_payloads_expose_measured_and_threshold() {
        let report = validate(&[a(20.0, 20.0), a(20.0, 37.0)], &rules());
        let spacing = report
            .violations
            .iter()
            .find(|v| v.kind() == RuleKind::Spacing)
            .unwrap();
        assert_eq!(spacing.indices(), vec![0, 1]);
        assert_eq!(spacing.measured(), Some(-3.0));
        assert_eq!(spacing.threshold(), 15.0);
    }

    #[test]
    fn boundary_violation_reports_clearance() {
        let report = validate(&[b(4.0, 50.0)], &rules());
        assert_eq!(
            report.violations,
            vec![Violation::Boundary { index: 0, clearance: 4.0, setback: 10.0 }]
        );
        assert!(!report.geometry_ok());
    }

    #[test]
    fn validate_is_idempotent() {
        let buildings = [a(20.0, 20.0), a(20.0, 37.0), b(85.0, 55.0), b(170.0, 100.0)];
        let r = rules();
        assert_eq!(validate(&buildings, &r), validate(&buildings, &r));
    }
}
