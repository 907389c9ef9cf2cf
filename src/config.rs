// Configuration file, All measurements in site units (1 unit = 1 meter)
// This controls the default rule set and run parameter settings

// Site
pub const SITE_WIDTH: f32 = 200.0;
pub const SITE_DEPTH: f32 = 140.0;
pub const SETBACK: f32 = 10.0;      // clearance to every site edge
pub const MIN_SPACING: f32 = 15.0;  // edge-to-edge distance between buildings
pub const NEIGHBOR_RADIUS: f32 = 60.0;

// Plaza, centered in the site
pub const PLAZA_SIZE: f32 = 40.0;

// Building footprints (width x depth)
pub const TOWER_A: (f32, f32) = (30.0, 20.0);
pub const TOWER_B: (f32, f32) = (20.0, 20.0);

// Random search
pub const INITIAL_SEED: u64 = 1512086461918454205;
pub const LAYOUT_COUNT: usize = 4;
pub const MIN_BUILDINGS: usize = 5;
pub const MAX_BUILDINGS: usize = 12;
pub const ATTEMPTS_PER_BUILDING: usize = 120;
pub const FILL_EXTRA: usize = 2;
pub const MAX_TRIES: usize = 800;

// Evolution
pub const GENERATIONS: usize = 100;
pub const POPULATION_SIZE: usize = 20;
pub const MUTATION_RATE: f32 = 0.3;
pub const ELITE_FRACTION: f32 = 0.5;
pub const MOVE_JITTER: f32 = 10.0;  // std deviation of the move mutation

// Score weights
pub const WEIGHT_COUNT: f32 = 100.0;
pub const WEIGHT_AREA: f32 = 0.1;
pub const WEIGHT_DISTRIBUTION: f32 = 50.0;
pub const WEIGHT_BALANCE: f32 = 30.0;
pub const VIOLATION_PENALTY: f32 = 10_000.0;

// Viewer only
pub const TOWER_A_HEIGHT: f32 = 36.0;
pub const TOWER_B_HEIGHT: f32 = 24.0;
pub const FOOTPRINT_HEIGHT: f32 = 0.3;
