pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE as f32;

pub const STARTING_LIVES: u32 = 3;
pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const GHOST_BASE_POINTS: u32 = 200;
pub const FRIGHTENED_DURATION_SECS: f32 = 6.0;

pub const PACMAN_SPEED: f32 = 6.0;
pub const GHOST_SPEED: f32 = 5.5;
pub const FRIGHTENED_GHOST_SPEED: f32 = 4.2;
pub const EATEN_GHOST_SPEED: f32 = 8.0;

pub const COLLISION_RADIUS: f32 = 0.45;
pub const GHOST_CENTER_TOLERANCE: f32 = 0.01;

pub const SCATTER_DURATIONS: [f32; 4] = [7.0, 7.0, 5.0, 5.0];
pub const CHASE_DURATIONS: [f32; 4] = [20.0, 20.0, 20.0, 999.0];

pub const FRUIT_SPAWN_THRESHOLD: usize = 120;
pub const FRUIT_LIFETIME_SECS: f32 = 10.0;
pub const FRUIT_POINTS: u32 = 100;
pub const FRUIT_PICKUP_RADIUS: f32 = 0.5;

// Timers at or below this are treated as expired, so that accumulated
// float error from fixed-step ticks never leaves a timer a hair above zero.
pub const TIMER_EPSILON: f32 = 1e-4;

pub fn pacman_center_tolerance(cell_size: f32) -> f32 {
    (cell_size * 0.05).max(0.01)
}

pub fn ghost_chain_points(base: u32, chain: u32) -> u32 {
    if chain == 0 {
        return 0;
    }
    base.saturating_mul(1u32 << (chain - 1).min(31))
}

pub fn phase_duration(durations: &[f32], phase: usize) -> f32 {
    if durations.is_empty() {
        return f32::MAX;
    }
    durations[phase.min(durations.len() - 1)]
}
