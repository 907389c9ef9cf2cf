// fitness of a layout
// valid layouts score >= 0, invalid ones always below -penalty / 2

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::*;
use super::error::ConfigError;
use super::model::{Building, Site};
use super::rules::ValidationReport;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub count: f32,
    pub area: f32,
    pub distribution: f32,
    pub balance: f32,
    pub violation_penalty: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            count: WEIGHT_COUNT,
            area: WEIGHT_AREA,
            distribution: WEIGHT_DISTRIBUTION,
            balance: WEIGHT_BALANCE,
            violation_penalty: VIOLATION_PENALTY,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("weight count", self.count),
            ("weight area", self.area),
            ("weight distribution", self.distribution),
            ("weight balance", self.balance),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::NegativeValue { name, value });
            }
        }
        if !(self.violation_penalty > 0.0) || !self.violation_penalty.is_finite() {
            return Err(ConfigError::InvalidPenalty(self.violation_penalty));
        }
        Ok(())
    }
}

/// The individual terms, kept for exporters and the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub count: f32,
    pub area: f32,
    pub distribution: f32,
    pub balance: f32,
    pub quality: f32,
    pub violations: usize,
    pub total: f32,
}

// both halves in [0, 1]: bounding spread of centers and occupied quadrants
pub fn distribution(buildings: &[Building], site: &Site) -> f32 {
    if buildings.is_empty() {
        return 0.0;
    }

    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    let mut quadrants = [false; 4];
    let half = Vec2::new(site.width, site.depth) * 0.5;

    for building in buildings {
        let c = building.center();
        min = min.min(c);
        max = max.max(c);
        let q = (c.x >= half.x) as usize + 2 * (c.y >= half.y) as usize;
        quadrants[q] = true;
    }

    let spread = ((max.x - min.x) / site.width + (max.y - min.y) / site.depth) * 0.5;
    let occupied = quadrants.iter().filter(|&&q| q).count() as f32 / 4.0;
    (spread.clamp(0.0, 1.0) + occupied) * 0.5
}

/// `1 - (max_count - min_count) / n` over all configured types.
pub fn balance(buildings: &[Building], type_count: usize) -> f32 {
    if buildings.is_empty() || type_count == 0 {
        return 0.0;
    }
    let mut counts = vec![0usize; type_count];
    for building in buildings {
        if let Some(c) = counts.get_mut(building.kind) {
            *c += 1;
        }
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    let min = counts.iter().copied().min().unwrap_or(0);
    1.0 - (max - min) as f32 / buildings.len() as f32
}

pub fn breakdown(
    buildings: &[Building],
    report: &ValidationReport,
    site: &Site,
    type_count: usize,
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    let count = buildings.len() as f32 * weights.count;
    let area = buildings.iter().map(Building::area).sum::<f32>() * weights.area;
    let distribution = distribution(buildings, site) * weights.distribution;
    let balance = balance(buildings, type_count) * weights.balance;
    let quality = count + area + distribution + balance;

    let violations = report.violations.len();
    let total = if violations == 0 {
        quality
    } else {
        let penalty = weights.violation_penalty;
        -penalty * violations as f32 + penalty * 0.5 * (quality / (quality + 1.0))
    };

    ScoreBreakdown { count, area, distribution, balance, quality, violations, total }
}
