// saves layouts as json documents and a csv summary table

use bevy::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::systems::batch::RankedLayout;
use crate::systems::layout::engine::{Layout, RuleConfig, RuleKind, ScoreBreakdown, Violation};
use crate::systems::layout::{CurrentLayout, LayoutSettings};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

// export event
#[derive(Event)]
pub struct ExportEvent {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct BuildingRecord {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub depth: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub area: f32,
}

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total_buildings: usize,
    pub target_buildings: usize,
    pub under_target: bool,
    pub counts: BTreeMap<String, usize>,
    pub total_built_area: f32,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct ViolationRecord {
    pub kind: RuleKind,
    pub indices: Vec<usize>,
    pub measured: Option<f32>,
    pub threshold: f32,
    pub message: String,
}

impl From<&Violation> for ViolationRecord {
    fn from(violation: &Violation) -> Self {
        Self {
            kind: violation.kind(),
            indices: violation.indices(),
            measured: violation.measured(),
            threshold: violation.threshold(),
            message: violation.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutDocument {
    pub layout_id: usize,
    pub seed: u64,
    pub score: f32,
    pub score_breakdown: ScoreBreakdown,
    pub buildings: Vec<BuildingRecord>,
    pub statistics: Statistics,
    pub rule_validation: BTreeMap<&'static str, bool>,
    pub violations: Vec<ViolationRecord>,
}

impl LayoutDocument {
    pub fn new(layout_id: usize, seed: u64, target: usize, layout: &Layout, rules: &RuleConfig) -> Self {
        let buildings = layout
            .buildings()
            .iter()
            .enumerate()
            .map(|(id, b)| BuildingRecord {
                id,
                kind: rules.label(b.kind).to_string(),
                x: b.origin.x,
                y: b.origin.y,
                width: b.size.x,
                depth: b.size.y,
                center_x: b.center().x,
                center_y: b.center().y,
                area: b.area(),
            })
            .collect();

        let counts = rules
            .building_types
            .iter()
            .enumerate()
            .map(|(kind, ty)| (ty.label.clone(), layout.count_of(kind)))
            .collect();

        let report = layout.report();
        let rule_validation = RuleKind::ALL
            .iter()
            .map(|&kind| (kind.name(), report.rule_ok(kind)))
            .collect();

        Self {
            layout_id,
            seed,
            score: layout.score(),
            score_breakdown: *layout.breakdown(),
            buildings,
            statistics: Statistics {
                total_buildings: layout.len(),
                target_buildings: target,
                under_target: layout.len() < target,
                counts,
                total_built_area: layout.total_area(),
                valid: layout.is_valid(),
            },
            rule_validation,
            violations: layout.violations().iter().map(ViolationRecord::from).collect(),
        }
    }

    pub fn from_ranked(entry: &RankedLayout, rules: &RuleConfig) -> Self {
        Self::new(entry.rank, entry.seed, entry.target, &entry.layout, rules)
    }
}

pub fn write_layout_json(path: &Path, document: &LayoutDocument) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn summary_header(rules: &RuleConfig) -> Vec<String> {
    let mut header = vec![
        "layout_id".to_string(),
        "seed".to_string(),
        "score".to_string(),
        "total_buildings".to_string(),
        "target_buildings".to_string(),
    ];
    header.extend(rules.building_types.iter().map(|ty| format!("count_{}", ty.label)));
    header.push("total_area".to_string());
    header.push("valid".to_string());
    header.extend(RuleKind::ALL.iter().map(|kind| format!("rule_{}", kind.name())));
    header.push("under_target".to_string());
    header
}

// one row per ranked layout
pub fn write_summary<W: Write>(writer: W, entries: &[RankedLayout], rules: &RuleConfig) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(summary_header(rules))?;

    for entry in entries {
        let layout = &entry.layout;
        let mut row = vec![
            entry.rank.to_string(),
            entry.seed.to_string(),
            format!("{:.2}", layout.score()),
            layout.len().to_string(),
            entry.target.to_string(),
        ];
        row.extend((0..rules.building_types.len()).map(|kind| layout.count_of(kind).to_string()));
        row.push(format!("{:.1}", layout.total_area()));
        row.push(layout.is_valid().to_string());
        row.extend(RuleKind::ALL.iter().map(|&kind| layout.report().rule_ok(kind).to_string()));
        row.push(entry.under_target().to_string());
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, entries: &[RankedLayout], rules: &RuleConfig) -> Result<(), ExportError> {
    write_summary(File::create(path)?, entries, rules)
}

// handle export events, writes the layout shown in the viewer
pub fn handle_export(
    mut events: EventReader<ExportEvent>,
    current: Res<CurrentLayout>,
    settings: Res<LayoutSettings>,
) {
    for event in events.read() {
        let document = LayoutDocument::new(
            1,
            current.seed,
            current.outcome.target,
            current.layout(),
            &settings.rules,
        );
        match write_layout_json(Path::new(&event.filename), &document) {
            Ok(()) => info!("export successful: {}", event.filename),
            Err(e) => error!("export failed: {}", e),
        }
    }
}
