//! Procedural ground curve
//!
//! The ground is a bounded random walk over slope angle. Long Downhill runs
//! alternate with short Ramps; each mode entry draws a target angle and a
//! segment budget, and the current angle eases toward the target at separate
//! climb/descent rates. Points are appended at the frontier and pruned from
//! the head, so memory stays bounded by the lookahead + trailing window.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{SlopeModeConfig, TerrainConfig};
use crate::error::ConfigError;
use crate::{inverse_lerp, lerp, move_towards};

/// Tangent length factor at zero slope (crest/valley flattening)
const FLAT_TANGENT_FACTOR: f32 = 0.25;

/// Player x beyond which the curve is no longer extended
pub const MAX_TERRAIN_X: f32 = 1.0e6;

/// Long-run terrain phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeMode {
    Downhill,
    Ramp,
}

impl SlopeMode {
    pub fn flipped(self) -> Self {
        match self {
            SlopeMode::Downhill => SlopeMode::Ramp,
            SlopeMode::Ramp => SlopeMode::Downhill,
        }
    }
}

/// One point of the ground curve
///
/// Tangents are relative to `position`: `entry_tangent` points back toward the
/// previous point, `exit_tangent` forward toward the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainPoint {
    pub position: Vec2,
    pub entry_tangent: Vec2,
    pub exit_tangent: Vec2,
    /// Slope angle (degrees) of the segment that produced this point
    pub slope_angle: f32,
    /// Mode that produced this point
    pub mode: SlopeMode,
}

impl TerrainPoint {
    fn origin(position: Vec2) -> Self {
        Self {
            position,
            entry_tangent: Vec2::ZERO,
            exit_tangent: Vec2::ZERO,
            slope_angle: 0.0,
            mode: SlopeMode::Downhill,
        }
    }
}

/// Slope random-walk state (angles in degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeModeState {
    pub mode: SlopeMode,
    pub current_angle: f32,
    pub target_angle: f32,
    pub segments_remaining: u32,
}

/// Ground height and outward normal at some x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSample {
    pub height: f32,
    pub normal: Vec2,
}

/// Anything a body can be resolved against
pub trait GroundQuery {
    /// `None` when `x` lies outside the materialized geometry
    fn sample(&self, x: f32) -> Option<GroundSample>;
}

/// Owns the ground point sequence; extends it ahead of the player and prunes it behind
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    config: TerrainConfig,
    seed: u64,
    rng: Pcg32,
    points: VecDeque<TerrainPoint>,
    slope: SlopeModeState,
    /// Position of the last appended point
    frontier: Vec2,
    segments_generated: u64,
}

impl TerrainGenerator {
    /// Validate `config` and build the initial lookahead window
    pub fn new(config: TerrainConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut terrain = Self {
            rng: Pcg32::seed_from_u64(seed),
            points: VecDeque::new(),
            slope: SlopeModeState {
                mode: SlopeMode::Downhill,
                current_angle: 0.0,
                target_angle: 0.0,
                segments_remaining: 0,
            },
            frontier: Vec2::ZERO,
            segments_generated: 0,
            config,
            seed,
        };
        terrain.initialize();
        Ok(terrain)
    }

    /// Clear the curve and regenerate it from the stored seed
    fn initialize(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.points.clear();
        self.segments_generated = 0;
        self.frontier = Vec2::ZERO;

        let downhill = &self.config.downhill;
        self.slope = SlopeModeState {
            mode: SlopeMode::Downhill,
            current_angle: 0.0_f32
                .clamp(self.config.min_slope_angle, self.config.max_slope_angle),
            target_angle: draw_target_angle(&mut self.rng, downhill),
            segments_remaining: draw_segment_budget(&mut self.rng, downhill),
        };

        self.points.push_back(TerrainPoint::origin(self.frontier));
        for _ in 0..self.config.initial_segments {
            self.append_segment();
        }

        log::info!(
            "Terrain initialized: seed={} points={} frontier_x={:.1}",
            self.seed,
            self.points.len(),
            self.frontier.x
        );
    }

    /// Regenerate from the original configuration and seed (identical course)
    pub fn reset(&mut self) {
        self.initialize();
    }

    /// Regenerate with a new seed
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.initialize();
    }

    /// Append segments until the frontier is `lookahead_margin` past `player_x`
    ///
    /// Loops rather than single-stepping so fast motion never outruns the curve.
    /// Positions past [`MAX_TERRAIN_X`] are ignored. Returns the number of
    /// segments appended.
    pub fn extend_if_needed(&mut self, player_x: f32) -> usize {
        if !player_x.is_finite() {
            log::trace!("extend_if_needed: ignoring non-finite player_x");
            return 0;
        }
        if player_x > MAX_TERRAIN_X {
            log::warn!("extend_if_needed: player_x={player_x} is past the terrain limit");
            return 0;
        }

        let mut appended = 0;
        while player_x + self.config.lookahead_margin > self.frontier.x {
            self.append_segment();
            appended += 1;
        }
        appended
    }

    /// Generate one segment and append its end point
    pub fn append_segment(&mut self) -> TerrainPoint {
        if self.slope.segments_remaining == 0 {
            self.switch_mode();
        }

        let mode_config = self.config.mode(self.slope.mode);
        let rate = mode_config.rate_toward(self.slope.current_angle, self.slope.target_angle);
        let angle = move_towards(self.slope.current_angle, self.slope.target_angle, rate)
            .clamp(self.config.min_slope_angle, self.config.max_slope_angle);
        self.slope.current_angle = angle;

        let radians = angle.to_radians();
        let segment_length = self.config.segment_length;
        let height_delta = radians.tan() * segment_length;
        self.frontier += Vec2::new(segment_length, height_delta);

        // Tangents follow the slope direction, not the chord, and shrink near
        // zero slope so crests and valleys don't overshoot.
        let slope_dir = Vec2::new(radians.cos(), radians.sin());
        let slope_factor = inverse_lerp(0.0, self.config.flatten_reference_angle, angle.abs());
        let tangent_length = segment_length
            * self.config.tangent_strength
            * lerp(FLAT_TANGENT_FACTOR, 1.0, slope_factor);

        if let Some(previous) = self.points.back_mut() {
            previous.exit_tangent = slope_dir * tangent_length;
        }

        let point = TerrainPoint {
            position: self.frontier,
            entry_tangent: -slope_dir * tangent_length,
            // Provisional; replaced when the next point is appended
            exit_tangent: slope_dir * tangent_length,
            slope_angle: angle,
            mode: self.slope.mode,
        };
        self.points.push_back(point);

        self.slope.segments_remaining = self.slope.segments_remaining.saturating_sub(1);
        self.segments_generated += 1;
        point
    }

    fn switch_mode(&mut self) {
        let mode = self.slope.mode.flipped();
        let mode_config = self.config.mode(mode);
        self.slope.mode = mode;
        self.slope.target_angle = draw_target_angle(&mut self.rng, mode_config);
        self.slope.segments_remaining = draw_segment_budget(&mut self.rng, mode_config);

        log::debug!(
            "Slope mode -> {:?}: target {:.1}° for {} segments",
            mode,
            self.slope.target_angle,
            self.slope.segments_remaining
        );
    }

    /// Drop head points whose successor is more than `trailing_margin` behind `player_x`
    ///
    /// Never shrinks the curve below two points. Returns the number removed.
    pub fn cleanup(&mut self, player_x: f32) -> usize {
        if !player_x.is_finite() {
            log::trace!("cleanup: ignoring non-finite player_x");
            return 0;
        }

        let mut removed = 0;
        while self.points.len() > 2 {
            let second_x = self.points[1].position.x;
            if player_x - second_x > self.config.trailing_margin {
                self.points.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Linear height and chord normal at `x`
    pub fn query(&self, x: f32) -> Option<GroundSample> {
        let (first, last) = (self.points.front()?, self.points.back()?);
        if self.points.len() < 2 || !(first.position.x..=last.position.x).contains(&x) {
            return None;
        }

        let upper = self.points.partition_point(|p| p.position.x <= x);
        let index = upper.saturating_sub(1).min(self.points.len() - 2);
        let a = self.points[index].position;
        let b = self.points[index + 1].position;

        let t = (x - a.x) / (b.x - a.x);
        let chord = b - a;
        Some(GroundSample {
            height: lerp(a.y, b.y, t),
            // chord.x > 0, so the left-hand perpendicular always points up
            normal: Vec2::new(-chord.y, chord.x).normalize(),
        })
    }

    /// Point on the smoothed curve between points `index` and `index + 1`
    ///
    /// Cubic Bézier with control points taken from each end's tangent.
    pub fn curve_point(&self, index: usize, t: f32) -> Option<Vec2> {
        let a = self.points.get(index)?;
        let b = self.points.get(index + 1)?;

        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let c0 = a.position;
        let c1 = a.position + a.exit_tangent;
        let c2 = b.position + b.entry_tangent;
        let c3 = b.position;

        Some(c0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + c3 * (t * t * t))
    }

    /// Polyline approximation of the whole smoothed curve (for renderers)
    pub fn sample_curve(&self, steps_per_segment: usize) -> Vec<Vec2> {
        let steps = steps_per_segment.max(1);
        let segments = self.points.len().saturating_sub(1);
        let mut out = Vec::with_capacity(segments * steps + 1);

        for index in 0..segments {
            for step in 0..steps {
                let t = step as f32 / steps as f32;
                if let Some(p) = self.curve_point(index, t) {
                    out.push(p);
                }
            }
        }
        if let Some(last) = self.points.back() {
            out.push(last.position);
        }
        out
    }

    pub fn points(&self) -> &VecDeque<TerrainPoint> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// x of the last generated point
    pub fn frontier_x(&self) -> f32 {
        self.frontier.x
    }

    pub fn slope_state(&self) -> &SlopeModeState {
        &self.slope
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Segments generated since the last (re)initialization
    pub fn segments_generated(&self) -> u64 {
        self.segments_generated
    }
}

impl GroundQuery for TerrainGenerator {
    fn sample(&self, x: f32) -> Option<GroundSample> {
        self.query(x)
    }
}

fn draw_target_angle(rng: &mut Pcg32, mode: &SlopeModeConfig) -> f32 {
    let (min, max) = mode.angle_range;
    rng.random_range(min..=max)
}

/// Upper bound exclusive
fn draw_segment_budget(rng: &mut Pcg32, mode: &SlopeModeConfig) -> u32 {
    let (min, max) = mode.segment_range;
    rng.random_range(min..max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn terrain(seed: u64) -> TerrainGenerator {
        TerrainGenerator::new(TerrainConfig::default(), seed).unwrap()
    }

    fn assert_strictly_increasing(terrain: &TerrainGenerator) {
        let xs: Vec<f32> = terrain.points().iter().map(|p| p.position.x).collect();
        assert!(xs.len() >= 2, "curve shrank below two points");
        for pair in xs.windows(2) {
            assert!(pair[1] > pair[0], "x not increasing: {pair:?}");
        }
    }

    /// Reproducibility tuning: 5-unit segments, slopes in [-15°, 10°], 4° per segment
    fn determinism_config() -> TerrainConfig {
        TerrainConfig {
            segment_length: 5.0,
            min_slope_angle: -15.0,
            max_slope_angle: 10.0,
            downhill: SlopeModeConfig {
                angle_range: (-15.0, -8.0),
                segment_range: (4, 8),
                climb_rate: 4.0,
                descent_rate: 4.0,
            },
            ramp: SlopeModeConfig {
                angle_range: (3.0, 10.0),
                segment_range: (2, 4),
                climb_rate: 4.0,
                descent_rate: 4.0,
            },
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_initialize_builds_lookahead_window() {
        let terrain = terrain(1);
        let config = TerrainConfig::default();
        assert_eq!(terrain.len(), config.initial_segments as usize + 1);
        assert_eq!(terrain.points()[0].position, Vec2::ZERO);
        let expected_x = config.segment_length * config.initial_segments as f32;
        assert!((terrain.frontier_x() - expected_x).abs() < 1e-3);
        assert_strictly_increasing(&terrain);
    }

    #[test]
    fn test_initial_run_is_downhill() {
        // Shorter than the smallest downhill budget, so no switch can happen yet
        let config = TerrainConfig {
            initial_segments: 5,
            ..TerrainConfig::default()
        };
        let terrain = TerrainGenerator::new(config, 1).unwrap();
        assert_eq!(terrain.slope_state().mode, SlopeMode::Downhill);
        assert!(terrain.points().iter().all(|p| p.mode == SlopeMode::Downhill));
        assert!(terrain.slope_state().target_angle <= -10.0);
    }

    #[test]
    fn test_segment_budget_excludes_upper_bound() {
        let mut terrain = terrain(1);
        let mut previous = terrain.slope_state().mode;
        let (mut max_downhill, mut max_ramp) = (0, 0);

        for _ in 0..5000 {
            terrain.append_segment();
            let state = terrain.slope_state();
            if state.mode != previous {
                // Budget drawn on entry, one segment already spent
                let budget = state.segments_remaining + 1;
                let (min, max) = terrain.config().mode(state.mode).segment_range;
                assert!((min..max).contains(&budget), "budget {budget} not in {min}..{max}");
                match state.mode {
                    SlopeMode::Downhill => max_downhill = max_downhill.max(budget),
                    SlopeMode::Ramp => max_ramp = max_ramp.max(budget),
                }
                previous = state.mode;
            }
        }

        assert_eq!(max_downhill, 9);
        assert_eq!(max_ramp, 4);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = TerrainConfig::default();
        config.min_slope_angle = 5.0;
        config.max_slope_angle = -5.0;
        assert!(TerrainGenerator::new(config, 1).is_err());
    }

    #[test]
    fn test_extend_loops_under_fast_motion() {
        let mut terrain = terrain(2);
        let appended = terrain.extend_if_needed(500.0);
        assert!(appended > 1);
        assert!(terrain.frontier_x() >= 500.0 + terrain.config().lookahead_margin);
        assert_strictly_increasing(&terrain);

        // Already far enough ahead: nothing to do
        assert_eq!(terrain.extend_if_needed(500.0), 0);
    }

    #[test]
    fn test_extend_refuses_positions_past_limit() {
        let mut terrain = terrain(2);
        let before = terrain.len();
        assert_eq!(terrain.extend_if_needed(1.0e9), 0);
        assert_eq!(terrain.extend_if_needed(MAX_TERRAIN_X * 2.0), 0);
        assert_eq!(terrain.len(), before);
    }

    #[test]
    fn test_extend_ignores_non_finite_player_x() {
        let mut terrain = terrain(2);
        let before = terrain.len();
        assert_eq!(terrain.extend_if_needed(f32::INFINITY), 0);
        assert_eq!(terrain.extend_if_needed(f32::NAN), 0);
        assert_eq!(terrain.len(), before);
    }

    #[test]
    fn test_cleanup_never_below_two_points() {
        let mut terrain = terrain(3);
        terrain.cleanup(1.0e6);
        assert_eq!(terrain.len(), 2);
        assert_strictly_increasing(&terrain);
    }

    #[test]
    fn test_cleanup_only_removes_trailing_points() {
        let mut terrain = terrain(4);
        let player_x = 60.0;
        terrain.extend_if_needed(player_x);
        let removed = terrain.cleanup(player_x);
        assert!(removed > 0);

        let trailing = terrain.config().trailing_margin;
        let second_x = terrain.points()[1].position.x;
        assert!(player_x - second_x <= trailing);
        assert!(terrain.points()[0].position.x < player_x);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let a = TerrainGenerator::new(determinism_config(), 0xDEADBEEF).unwrap();
        let b = TerrainGenerator::new(determinism_config(), 0xDEADBEEF).unwrap();

        let bits = |t: &TerrainGenerator| -> Vec<(u32, u32)> {
            t.points()
                .iter()
                .take(21)
                .map(|p| (p.position.x.to_bits(), p.position.y.to_bits()))
                .collect()
        };
        assert_eq!(bits(&a).len(), 21);
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = terrain(10);
        let b = terrain(11);
        let ys = |t: &TerrainGenerator| -> Vec<f32> {
            t.points().iter().map(|p| p.position.y).collect()
        };
        assert_ne!(ys(&a), ys(&b));
    }

    #[test]
    fn test_reset_replays_same_course() {
        let mut terrain = terrain(5);
        let original: Vec<TerrainPoint> = terrain.points().iter().copied().collect();

        terrain.extend_if_needed(300.0);
        terrain.cleanup(300.0);
        terrain.reset();

        let replayed: Vec<TerrainPoint> = terrain.points().iter().copied().collect();
        assert_eq!(original, replayed);
        assert_eq!(terrain.segments_generated(), TerrainConfig::default().initial_segments as u64);
    }

    #[test]
    fn test_reset_with_seed_changes_course() {
        let mut terrain = terrain(5);
        let original: Vec<TerrainPoint> = terrain.points().iter().copied().collect();
        terrain.reset_with_seed(6);
        assert_eq!(terrain.seed(), 6);
        assert_eq!(terrain.points()[0].position, Vec2::ZERO);
        let reseeded: Vec<TerrainPoint> = terrain.points().iter().copied().collect();
        assert_ne!(original, reseeded);
    }

    #[test]
    fn test_mode_switch_draws_from_mode_ranges() {
        let mut terrain = terrain(7);
        let mut saw_ramp = false;
        for _ in 0..400 {
            terrain.append_segment();
            let state = terrain.slope_state().clone();
            let mode_config = terrain.config().mode(state.mode);
            let (min, max) = mode_config.angle_range;
            assert!((min..=max).contains(&state.target_angle));
            assert!(state.segments_remaining + 1 < mode_config.segment_range.1);
            saw_ramp |= state.mode == SlopeMode::Ramp;
        }
        assert!(saw_ramp, "never left Downhill in 400 segments");
    }

    #[test]
    fn test_climb_faster_than_descent() {
        // Default tuning: ramps recover at 4°/segment, descents ease in at 1.2°/segment
        let mut terrain = terrain(8);
        for _ in 0..400 {
            let before = terrain.slope_state().current_angle;
            let target = terrain.slope_state().target_angle;
            let point = terrain.append_segment();
            let delta = point.slope_angle - before;
            if terrain.slope_state().target_angle == target {
                if delta > 0.0 {
                    assert!(delta <= 4.0 + 1e-4);
                } else {
                    assert!(-delta <= 1.2 + 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_tangents_follow_slope_direction() {
        let terrain = terrain(9);
        let config = terrain.config();
        let base = config.segment_length * config.tangent_strength;
        let points = terrain.points();

        for i in 1..points.len() {
            let prev = points[i - 1];
            let point = points[i];
            assert!((prev.exit_tangent + point.entry_tangent).length() < 1e-5);

            let radians = point.slope_angle.to_radians();
            let dir = Vec2::new(radians.cos(), radians.sin());
            assert!(prev.exit_tangent.normalize().dot(dir) > 0.9999);

            let factor = inverse_lerp(0.0, config.flatten_reference_angle, point.slope_angle.abs());
            let expected = base * lerp(0.25, 1.0, factor);
            assert!((prev.exit_tangent.length() - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tangent_flattened_near_zero_slope() {
        let terrain = terrain(9);
        let base = terrain.config().segment_length * terrain.config().tangent_strength;
        // First segment eases from 0° by at most 1.2°, far below the 12° reference
        let first = terrain.points()[1];
        assert!(first.slope_angle.abs() <= 1.2 + 1e-5);
        assert!(first.entry_tangent.length() < base * 0.4);
    }

    #[test]
    fn test_query_interpolates_between_points() {
        let terrain = terrain(12);
        let a = terrain.points()[3].position;
        let b = terrain.points()[4].position;
        let mid = (a.x + b.x) * 0.5;

        let sample = terrain.query(mid).unwrap();
        assert!((sample.height - (a.y + b.y) * 0.5).abs() < 1e-4);
        assert!(sample.normal.y > 0.0);
        assert!((sample.normal.length() - 1.0).abs() < 1e-5);
        assert!(sample.normal.dot(b - a).abs() < 1e-4);

        // Exactly on a point
        let on_point = terrain.query(a.x).unwrap();
        assert!((on_point.height - a.y).abs() < 1e-4);
    }

    #[test]
    fn test_query_outside_curve_is_none() {
        let terrain = terrain(12);
        assert!(terrain.query(-1.0).is_none());
        assert!(terrain.query(terrain.frontier_x() + 1.0).is_none());
        assert!(terrain.sample(terrain.frontier_x()).is_some());
    }

    #[test]
    fn test_curve_passes_through_points() {
        let terrain = terrain(13);
        let points = terrain.points();
        for i in 0..points.len() - 1 {
            let start = terrain.curve_point(i, 0.0).unwrap();
            let end = terrain.curve_point(i, 1.0).unwrap();
            assert!((start - points[i].position).length() < 1e-3);
            assert!((end - points[i + 1].position).length() < 1e-3);
        }
        assert!(terrain.curve_point(points.len() - 1, 0.5).is_none());

        let polyline = terrain.sample_curve(8);
        assert_eq!(polyline.len(), (points.len() - 1) * 8 + 1);
    }

    proptest! {
        #[test]
        fn prop_geometry_invariants_hold(seed in any::<u64>(), segments in 1usize..300) {
            let mut terrain = terrain(seed);
            for _ in 0..segments {
                terrain.append_segment();
            }

            let config = terrain.config().clone();
            let points = terrain.points();
            prop_assert!(points.len() >= 2);
            for pair in points.iter().collect::<Vec<_>>().windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(b.position.x > a.position.x);
                prop_assert!(b.slope_angle >= config.min_slope_angle);
                prop_assert!(b.slope_angle <= config.max_slope_angle);
                if a.mode == b.mode && a.position != Vec2::ZERO {
                    let max_delta = config.mode(b.mode).max_angle_delta();
                    prop_assert!((b.slope_angle - a.slope_angle).abs() <= max_delta + 1e-4);
                }
            }
        }

        #[test]
        fn prop_global_clamp_caps_mode_targets(seed in any::<u64>(), segments in 1usize..300) {
            // Both mode ranges lie outside the global window
            let config = TerrainConfig {
                min_slope_angle: -15.0,
                max_slope_angle: 5.0,
                downhill: SlopeModeConfig {
                    angle_range: (-30.0, -20.0),
                    descent_rate: 4.0,
                    ..SlopeModeConfig::downhill()
                },
                ramp: SlopeModeConfig {
                    angle_range: (8.0, 20.0),
                    ..SlopeModeConfig::ramp()
                },
                ..TerrainConfig::default()
            };
            let mut terrain = TerrainGenerator::new(config, seed).unwrap();
            for _ in 0..segments {
                terrain.append_segment();
            }

            let mut reached_floor = false;
            for point in terrain.points().iter().skip(1) {
                prop_assert!((-15.0..=5.0).contains(&point.slope_angle));
                reached_floor |= point.slope_angle == -15.0;
            }
            let state = terrain.slope_state();
            prop_assert!((-15.0..=5.0).contains(&state.current_angle));
            // The first downhill run lasts at least 6 segments at 4°/segment
            prop_assert!(reached_floor);
        }

        #[test]
        fn prop_trailing_window_is_never_pruned(
            seed in any::<u64>(),
            steps in prop::collection::vec(0.0f32..40.0, 1..60),
        ) {
            let mut terrain = terrain(seed);
            let trailing = terrain.config().trailing_margin;
            let mut player_x = 0.0f32;

            for step in steps {
                player_x += step;
                terrain.extend_if_needed(player_x);

                let protected: Vec<f32> = terrain
                    .points()
                    .iter()
                    .map(|p| p.position.x)
                    .filter(|x| player_x - *x <= trailing)
                    .collect();

                terrain.cleanup(player_x);

                prop_assert!(terrain.len() >= 2);
                prop_assert!(terrain.frontier_x() >= player_x + terrain.config().lookahead_margin);
                for x in protected {
                    prop_assert!(terrain.points().iter().any(|p| p.position.x == x));
                }
            }
        }
    }
}
