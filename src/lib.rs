//! Slope Runner - simulation core of a side-scrolling endless slope runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain synthesis, rider physics, restart flow)
//! - `config`: Data-driven tuning with validation
//! - `error`: Configuration errors
//!
//! The host owns the main loop and calls [`sim::World::tick_variable`] once per
//! rendered frame and [`sim::World::tick_fixed`] at the fixed physics rate.

pub mod config;
pub mod error;
pub mod sim;

pub use config::{
    BodyConfig, PlayerConfig, RunnerConfig, ScoringConfig, SlopeModeConfig, TerrainConfig,
};
pub use error::ConfigError;

use glam::Vec2;

/// Simulation timing constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the clock will account for (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Normals shorter than this are treated as physics-engine noise
    pub const MIN_NORMAL_LENGTH: f32 = 1.0e-4;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Move `current` toward `target` by at most `max_delta` (never overshoots)
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

/// Rotate angle `current` toward `target` along the shortest arc, by at most `max_delta` radians
#[inline]
pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = normalize_angle(target - current);
    let step = delta.clamp(-max_delta, max_delta);
    normalize_angle(current + step)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `value` between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Up vector of a body rotated counter-clockwise by `orientation` radians
#[inline]
pub fn up_from_orientation(orientation: f32) -> Vec2 {
    Vec2::new(-orientation.sin(), orientation.cos())
}

/// Orientation (radians) whose up vector points along `up`
#[inline]
pub fn orientation_from_up(up: Vec2) -> f32 {
    (-up.x).atan2(up.y)
}
