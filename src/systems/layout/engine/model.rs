// site, plaza, footprints and the rule configuration shared by every component

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::*;
use super::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub width: f32,
    pub depth: f32,
}

impl Site {
    pub fn rect(&self) -> Rect {
        Rect {
            min: Vec2::ZERO,
            max: Vec2::new(self.width, self.depth),
        }
    }

    /// Site shrunk by `setback` on all four sides.
    pub fn buildable(&self, setback: f32) -> Rect {
        Rect {
            min: Vec2::splat(setback),
            max: Vec2::new(self.width - setback, self.depth - setback),
        }
    }
}

// no-build clearance zone, (x, y) is its minimum corner
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plaza {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub depth: f32,
}

impl Plaza {
    pub fn centered(site: &Site, width: f32, depth: f32) -> Self {
        Self {
            x: (site.width - width) * 0.5,
            y: (site.depth - depth) * 0.5,
            width,
            depth,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            min: Vec2::new(self.x, self.y),
            max: Vec2::new(self.x + self.width, self.y + self.depth),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub label: String,
    pub width: f32,
    pub depth: f32,
}

impl BuildingType {
    pub fn new(label: impl Into<String>, width: f32, depth: f32) -> Self {
        Self { label: label.into(), width, depth }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }
}

/// A placed building. `kind` indexes `RuleConfig::building_types`,
/// `origin` is the minimum corner of the axis-aligned footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Building {
    pub kind: usize,
    pub origin: Vec2,
    pub size: Vec2,
}

impl Building {
    pub fn new(kind: usize, origin: Vec2, size: Vec2) -> Self {
        Self { kind, origin, size }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            min: self.origin,
            max: self.origin + self.size,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }
}

// immutable for the whole run, passed by reference into every component
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub site: Site,
    pub setback: f32,
    pub spacing_min: f32,
    pub plaza: Plaza,
    pub neighbor_radius: f32,
    pub building_types: Vec<BuildingType>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        let site = Site { width: SITE_WIDTH, depth: SITE_DEPTH };
        Self {
            site,
            setback: SETBACK,
            spacing_min: MIN_SPACING,
            plaza: Plaza::centered(&site, PLAZA_SIZE, PLAZA_SIZE),
            neighbor_radius: NEIGHBOR_RADIUS,
            building_types: vec![
                BuildingType::new("A", TOWER_A.0, TOWER_A.1),
                BuildingType::new("B", TOWER_B.0, TOWER_B.1),
            ],
        }
    }
}

impl RuleConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let rules: RuleConfig = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn buildable(&self) -> Rect {
        self.site.buildable(self.setback)
    }

    pub fn building_type(&self, kind: usize) -> &BuildingType {
        &self.building_types[kind]
    }

    pub fn label(&self, kind: usize) -> &str {
        self.building_types.get(kind).map(|t| t.label.as_str()).unwrap_or("?")
    }

    /// Box of valid minimum-corner positions for a footprint of `kind`.
    /// Every origin inside it keeps the footprint within the setback region.
    pub fn origin_range(&self, kind: usize) -> Rect {
        let region = self.buildable();
        Rect {
            min: region.min,
            max: region.max - self.building_type(kind).size(),
        }
    }

    /// Clamp a candidate origin into `origin_range(kind)`.
    pub fn clamp_origin(&self, kind: usize, origin: Vec2) -> Vec2 {
        let range = self.origin_range(kind);
        origin.clamp(range.min, range.max)
    }

    pub fn building_at(&self, kind: usize, origin: Vec2) -> Building {
        Building::new(kind, origin, self.building_type(kind).size())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let site = self.site;
        if !(site.width > 0.0 && site.depth > 0.0) || !site.width.is_finite() || !site.depth.is_finite() {
            return Err(ConfigError::InvalidSite { width: site.width, depth: site.depth });
        }

        for (name, value) in [
            ("setback", self.setback),
            ("spacing_min", self.spacing_min),
            ("neighbor_radius", self.neighbor_radius),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::NegativeValue { name, value });
            }
        }

        let region = self.buildable();
        if region.max.x <= region.min.x || region.max.y <= region.min.y {
            return Err(ConfigError::SetbackTooLarge {
                setback: self.setback,
                width: site.width,
                depth: site.depth,
            });
        }

        let plaza = self.plaza;
        let plaza_rect = plaza.rect();
        let site_rect = site.rect();
        if !(plaza.width > 0.0 && plaza.depth > 0.0)
            || plaza_rect.min.x < site_rect.min.x
            || plaza_rect.min.y < site_rect.min.y
            || plaza_rect.max.x > site_rect.max.x
            || plaza_rect.max.y > site_rect.max.y
        {
            return Err(ConfigError::InvalidPlaza {
                x: plaza.x,
                y: plaza.y,
                width: plaza.width,
                depth: plaza.depth,
            });
        }

        if self.building_types.len() < 2 {
            return Err(ConfigError::TooFewBuildingTypes(self.building_types.len()));
        }

        let region_size = region.size();
        for ty in &self.building_types {
            let fits = ty.width > 0.0
                && ty.depth > 0.0
                && ty.width <= region_size.x
                && ty.depth <= region_size.y;
            if !fits {
                return Err(ConfigError::FootprintTooLarge {
                    label: ty.label.clone(),
                    width: ty.width,
                    depth: ty.depth,
                    region_width: region_size.x,
                    region_depth: region_size.y,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_valid() {
        let rules = RuleConfig::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.plaza.rect().center(), Vec2::new(100.0, 70.0));
    }

    #[test]
    fn oversized_footprint_is_rejected() {
        let mut rules = RuleConfig::default();
        rules.building_types[1] = BuildingType::new("B", 20.0, 130.0);
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::FootprintTooLarge { .. })
        ));
    }

    #[test]
    fn setback_swallowing_the_site_is_rejected() {
        let mut rules = RuleConfig::default();
        rules.setback = 70.0;
        assert!(matches!(rules.validate(), Err(ConfigError::SetbackTooLarge { .. })));
    }

    #[test]
    fn plaza_outside_site_is_rejected() {
        let mut rules = RuleConfig::default();
        rules.plaza.x = 180.0;
        assert!(matches!(rules.validate(), Err(ConfigError::InvalidPlaza { .. })));
    }

    #[test]
    fn single_type_is_rejected() {
        let mut rules = RuleConfig::default();
        rules.building_types.truncate(1);
        assert_eq!(rules.validate(), Err(ConfigError::TooFewBuildingTypes(1)));
    }

    #[test]
    fn origin_range_keeps_footprint_inside_setback() {
        let rules = RuleConfig::default();
        let range = rules.origin_range(0);
        assert_eq!(range.min, Vec2::new(10.0, 10.0));
        assert_eq!(range.max, Vec2::new(160.0, 110.0));

        let clamped = rules.clamp_origin(0, Vec2::new(500.0, -3.0));
        assert_eq!(clamped, Vec2::new(160.0, 10.0));
    }

    #[test]
    fn rules_round_trip_through_json() {
        let rules = RuleConfig::default();
        let text = serde_json::to_string(&rules).unwrap();
        let parsed: RuleConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, rules);
    }
}
