pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const FRAME_MS: f32 = 1000.0 / SIM_HZ;

pub const WORLD_WIDTH: f32 = 1920.0;
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

pub const SPAWN_Y: f32 = -20.0;
pub const SPAWN_WIDTH_MIN: f32 = 0.8;
pub const SPAWN_WIDTH_MAX: f32 = 1.2;
pub const SPAWN_HEIGHT_MIN: f32 = 0.5;
pub const SPAWN_HEIGHT_MAX: f32 = 0.9;
pub const EMISSION_FRAMES_PER_UNIT: f32 = 10.0;
pub const AREA_NORMALIZER: f32 = 100.0;
pub const LEGACY_PARTICLE_SIZE_MAX: f32 = 10.0;
pub const LEGACY_PARTICLE_SIZE_RESET: f32 = 4.0;

pub const MAX_PHYSICS_BODIES: usize = 1200;
pub const BAKE_MIN_STUCK: usize = 500;
pub const BAKE_MIN_AGE_FRAMES: u64 = 60;

pub const STICKY_NORMAL_Y_MIN: f32 = 0.5;
pub const STICKY_FALLBACK_CHANCE: f64 = 0.2;

pub const STATS_INTERVAL_FRAMES: u64 = 20;

pub const LOOP_FRAMES: u64 = 1800;
pub const RECORDING_SECS: u64 = 30;

pub const OBSTACLE_FRICTION: f32 = 1.0;
pub const FLOOR_OFFSET: f32 = 100.0;
pub const FLOOR_THICKNESS: f32 = 200.0;
/// How far past the floor a falling body may travel before it is dropped.
pub const CULL_MARGIN: f32 = 200.0;

pub const BODY_DENSITY: f32 = 0.05;
pub const INERTIA_SCALE: f32 = 16.0;
pub const GRAVITY_SCALE: f32 = 0.001 * FRAME_MS * FRAME_MS;
pub const AIR_FRICTION: f32 = 0.001;
pub const MAX_LINEAR_SPEED: f32 = 60.0;
pub const MAX_ANGULAR_SPEED: f32 = 0.6;
pub const CONTACT_SLOP: f32 = 0.05;

pub const CELL_SIZE: f32 = 24.0;

pub const DEFAULT_SEED: u64 = 0x5EED;

/// Fill colors, picked uniformly per spawned particle.
pub const PALETTE: [[u8; 3]; 3] = [[0xD1, 0x00, 0x00], [0xF2, 0xF2, 0xF2], [0xFF, 0xD7, 0x00]];
