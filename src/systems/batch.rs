// headless run: N independent requests, optional evolution, ranking and summary
// each request owns a generator seeded from the run seed, so results are reproducible

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

use crate::systems::export;
use crate::systems::layout::engine::*;

#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    pub export_json: bool,
    pub export_csv: bool,
}

/// Fully resolved run configuration, validated before any search starts.
#[derive(Resource, Clone, Debug)]
pub struct BatchJob {
    pub rules: RuleConfig,
    pub weights: ScoreWeights,
    pub run: RunParams,
    pub output: OutputOptions,
}

impl BatchJob {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.weights.validate()?;
        self.run.validate()
    }
}

#[derive(Clone, Debug)]
pub struct RankedLayout {
    pub rank: usize,
    pub request: usize,
    pub seed: u64,
    pub layout: Layout,
    pub target: usize,
    pub stop: StopReason,
    /// Score before and after evolution, when it ran.
    pub evolution: Option<(f32, f32)>,
}

impl RankedLayout {
    pub fn under_target(&self) -> bool {
        self.layout.len() < self.target
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub mean: f32,
    pub median: f32,
    pub min: f32,
    pub max: f32,
    pub std_dev: f32,
}

impl Stats {
    pub fn of(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f32>() / n as f32;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) * 0.5
        } else {
            sorted[n / 2]
        };
        // sample deviation, zero for a single value
        let std_dev = if n > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1) as f32).sqrt()
        } else {
            0.0
        };

        Self { mean, median, min: sorted[0], max: sorted[n - 1], std_dev }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub score: Stats,
    pub buildings: Stats,
    pub area: Stats,
    pub valid: usize,
    pub accepted: usize,
    /// Mean building count per type, in type order.
    pub type_means: Vec<f32>,
    /// First type over second type, only for two-type rules with some of the second.
    pub type_ratio: Option<f32>,
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub seed: u64,
    pub results: Vec<RankedLayout>,
    pub summary: RunSummary,
}

pub fn run(job: &BatchJob) -> Result<RunReport, ConfigError> {
    job.validate()?;
    let generator = Generator::new(&job.rules, &job.weights, job.run.search)?;
    let optimizer = if job.run.evolution.enabled {
        Some(Optimizer::new(&generator, job.run.evolution)?)
    } else {
        None
    };

    let mut results = Vec::with_capacity(job.run.layouts);
    for request in 0..job.run.layouts {
        let seed = job.run.request_seed(request);
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = generator.generate(&mut rng);
        if !outcome.is_accepted() {
            warn!(
                "request {}: search exhausted, keeping best try ({} buildings, {} violations)",
                request,
                outcome.layout.len(),
                outcome.layout.violations().len()
            );
        }

        let (layout, evolution) = match &optimizer {
            Some(optimizer) => {
                let before = outcome.layout.score();
                let evolved = optimizer.run(Some(outcome.layout.clone()), &mut rng);
                debug!("request {}: evolved {:.1} -> {:.1}", request, before, evolved.best.score());
                let after = evolved.best.score();
                (evolved.best, Some((before, after)))
            }
            None => (outcome.layout.clone(), None),
        };

        results.push(RankedLayout {
            rank: 0,
            request,
            seed,
            layout,
            target: outcome.target,
            stop: outcome.stop,
            evolution,
        });
    }

    results.sort_by(|a, b| b.layout.score().total_cmp(&a.layout.score()));
    for (i, entry) in results.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    let summary = summarize(&results, job.rules.building_types.len());
    Ok(RunReport { seed: job.run.seed, results, summary })
}

pub fn summarize(results: &[RankedLayout], type_count: usize) -> RunSummary {
    let type_means: Vec<f32> = (0..type_count)
        .map(|kind| {
            let counts: Vec<f32> = results.iter().map(|r| r.layout.count_of(kind) as f32).collect();
            Stats::of(&counts).mean
        })
        .collect();
    let type_ratio = match type_means.as_slice() {
        [first, second] if *second > 0.0 => Some(first / second),
        _ => None,
    };

    let scores: Vec<f32> = results.iter().map(|r| r.layout.score()).collect();
    let buildings: Vec<f32> = results.iter().map(|r| r.layout.len() as f32).collect();
    let areas: Vec<f32> = results.iter().map(|r| r.layout.total_area()).collect();
    RunSummary {
        score: Stats::of(&scores),
        buildings: Stats::of(&buildings),
        area: Stats::of(&areas),
        valid: results.iter().filter(|r| r.layout.is_valid()).count(),
        accepted: results.iter().filter(|r| r.stop == StopReason::Accepted).count(),
        type_means,
        type_ratio,
    }
}

pub fn print_report(report: &RunReport, rules: &RuleConfig) {
    let rule = "=".repeat(70);
    println!("\n{}", rule);
    println!("Generated {} layouts (seed {}, ranked by score)", report.results.len(), report.seed);
    println!("{}\n", rule);

    for entry in &report.results {
        let layout = &entry.layout;
        let counts: Vec<String> = rules
            .building_types
            .iter()
            .enumerate()
            .map(|(kind, ty)| format!("{}={}", ty.label, layout.count_of(kind)))
            .collect();
        println!(
            "Layout {}: Score={:.1} | {} | Area={:.0} m² | Buildings={}/{} | Valid={}",
            entry.rank,
            layout.score(),
            counts.join(" "),
            layout.total_area(),
            layout.len(),
            entry.target,
            layout.is_valid(),
        );
        if let Some((before, after)) = entry.evolution {
            println!("  evolved {:.1} -> {:.1}", before, after);
        }
        for violation in layout.violations() {
            println!("  ! {}", violation);
        }
    }

    let s = &report.summary;
    println!("\n{}", rule);
    println!("Aggregate Statistics:");
    println!("{}", rule);
    println!("  Valid layouts: {} of {}", s.valid, report.results.len());
    println!("  Accepted searches: {} of {}", s.accepted, report.results.len());
    for (name, stats) in [("Quality score", s.score), ("Buildings", s.buildings), ("Built area (m²)", s.area)] {
        println!(
            "  {:<16} mean {:>9.1} | median {:>9.1} | min {:>9.1} | max {:>9.1} | sd {:>7.1}",
            name, stats.mean, stats.median, stats.min, stats.max, stats.std_dev
        );
    }

    println!("  Tower mix:");
    for (ty, mean) in rules.building_types.iter().zip(&s.type_means) {
        println!("    avg {:<8} {:.1}", ty.label, mean);
    }
    if let (Some(ratio), [first, second]) = (s.type_ratio, rules.building_types.as_slice()) {
        println!("    {}/{} ratio   {:.2}", first.label, second.label, ratio);
    }
    println!();
}

fn write_outputs(report: &RunReport, job: &BatchJob) -> Result<(), export::ExportError> {
    let output = &job.output;
    if !(output.export_json || output.export_csv) {
        return Ok(());
    }
    std::fs::create_dir_all(&output.output_dir)?;

    if output.export_json {
        for entry in &report.results {
            let path = output.output_dir.join(format!("layout_{}.json", entry.rank));
            export::write_layout_json(&path, &export::LayoutDocument::from_ranked(entry, &job.rules))?;
            info!("wrote {}", path.display());
        }
    }
    if output.export_csv {
        let path = output.output_dir.join("summary.csv");
        export::write_summary_csv(&path, &report.results, &job.rules)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

// startup system of the headless app
pub fn run_batch(job: Res<BatchJob>, mut exit: EventWriter<AppExit>) {
    info!(
        "running {} requests with seed {} (evolution {})",
        job.run.layouts,
        job.run.seed,
        if job.run.evolution.enabled { "on" } else { "off" }
    );

    let report = match run(&job) {
        Ok(report) => report,
        Err(e) => {
            error!("invalid configuration: {}", e);
            exit.write(AppExit::error());
            return;
        }
    };

    print_report(&report, &job.rules);

    match write_outputs(&report, &job) {
        Ok(()) => {
            exit.write(AppExit::Success);
        }
        Err(e) => {
            error!("export failed: {}", e);
            exit.write(AppExit::error());
        }
    }
}
