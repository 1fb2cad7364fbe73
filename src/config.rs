//! Tuning for terrain synthesis, rider physics and scoring
//!
//! Pure data. Every section derives serde with `#[serde(default)]`, so a JSON
//! tuning file only needs the fields it wants to override. Angles are degrees.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::terrain::SlopeMode;

/// Steepest slope the generator accepts; tan() blows up near 90°
pub const MAX_ABS_SLOPE_ANGLE: f32 = 80.0;

/// Shortest segment that still advances f32 x everywhere below the terrain x limit
pub const MIN_SEGMENT_LENGTH: f32 = 0.1;
pub const MAX_SEGMENT_LENGTH: f32 = 1000.0;

/// Tuning for one slope mode (Downhill or Ramp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeModeConfig {
    /// Target angle range drawn once per mode entry (degrees, inclusive)
    pub angle_range: (f32, f32),
    /// Segment budget range drawn once per mode entry (min inclusive, max exclusive)
    pub segment_range: (u32, u32),
    /// Max change per segment when moving toward a higher angle (degrees)
    pub climb_rate: f32,
    /// Max change per segment when moving toward a lower angle (degrees)
    pub descent_rate: f32,
}

impl Default for SlopeModeConfig {
    fn default() -> Self {
        Self::downhill()
    }
}

impl SlopeModeConfig {
    /// Long descents that ease in slowly
    pub fn downhill() -> Self {
        Self {
            angle_range: (-16.0, -10.0),
            segment_range: (6, 10),
            climb_rate: 4.0,
            descent_rate: 1.2,
        }
    }

    /// Short kickers that recover quickly
    pub fn ramp() -> Self {
        Self {
            angle_range: (6.0, 12.0),
            segment_range: (3, 5),
            climb_rate: 4.0,
            descent_rate: 1.2,
        }
    }

    /// Largest per-segment angle change this mode can produce (degrees)
    pub fn max_angle_delta(&self) -> f32 {
        self.climb_rate.max(self.descent_rate)
    }

    /// Per-segment rate for a move from `current` toward `target`
    pub fn rate_toward(&self, current: f32, target: f32) -> f32 {
        if target > current {
            self.climb_rate
        } else {
            self.descent_rate
        }
    }

    fn validate(&self, mode: SlopeMode) -> Result<(), ConfigError> {
        let (angle_field, segment_field, climb_field, descent_field) = match mode {
            SlopeMode::Downhill => (
                "terrain.downhill.angle_range",
                "terrain.downhill.segment_range",
                "terrain.downhill.climb_rate",
                "terrain.downhill.descent_rate",
            ),
            SlopeMode::Ramp => (
                "terrain.ramp.angle_range",
                "terrain.ramp.segment_range",
                "terrain.ramp.climb_rate",
                "terrain.ramp.descent_rate",
            ),
        };

        check_range(angle_field, self.angle_range)?;
        let (min, max) = self.segment_range;
        if min == 0 || min >= max {
            return Err(ConfigError::InvalidCount {
                field: segment_field,
                min,
                max,
            });
        }
        check_positive(climb_field, self.climb_rate)?;
        check_positive(descent_field, self.descent_rate)?;
        Ok(())
    }
}

/// Ground curve generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Horizontal distance between consecutive points
    pub segment_length: f32,
    /// Segments generated by initialization
    pub initial_segments: u32,
    /// Terrain must exist this far ahead of the player
    pub lookahead_margin: f32,
    /// Terrain may be pruned once it is this far behind the player
    pub trailing_margin: f32,
    /// Global clamp on the generated slope angle (degrees)
    pub min_slope_angle: f32,
    pub max_slope_angle: f32,
    pub downhill: SlopeModeConfig,
    pub ramp: SlopeModeConfig,
    /// Base tangent length as a fraction of segment length
    pub tangent_strength: f32,
    /// Slope magnitude (degrees) at which tangents reach full length
    pub flatten_reference_angle: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        let segment_length = 4.0;
        Self {
            segment_length,
            initial_segments: 20,
            lookahead_margin: segment_length * 15.0,
            trailing_margin: segment_length * 5.0,
            min_slope_angle: -20.0,
            max_slope_angle: 15.0,
            downhill: SlopeModeConfig::downhill(),
            ramp: SlopeModeConfig::ramp(),
            tangent_strength: 0.5,
            flatten_reference_angle: 12.0,
        }
    }
}

impl TerrainConfig {
    pub fn mode(&self, mode: SlopeMode) -> &SlopeModeConfig {
        match mode {
            SlopeMode::Downhill => &self.downhill,
            SlopeMode::Ramp => &self.ramp,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("terrain.segment_length", self.segment_length)?;
        check_bounds(
            "terrain.segment_length",
            self.segment_length,
            MIN_SEGMENT_LENGTH,
            MAX_SEGMENT_LENGTH,
        )?;
        if self.initial_segments == 0 {
            return Err(ConfigError::NonPositive {
                field: "terrain.initial_segments",
                value: 0.0,
            });
        }
        check_positive("terrain.lookahead_margin", self.lookahead_margin)?;
        check_non_negative("terrain.trailing_margin", self.trailing_margin)?;

        check_range(
            "terrain.slope_angle",
            (self.min_slope_angle, self.max_slope_angle),
        )?;
        check_bounds(
            "terrain.min_slope_angle",
            self.min_slope_angle,
            -MAX_ABS_SLOPE_ANGLE,
            MAX_ABS_SLOPE_ANGLE,
        )?;
        check_bounds(
            "terrain.max_slope_angle",
            self.max_slope_angle,
            -MAX_ABS_SLOPE_ANGLE,
            MAX_ABS_SLOPE_ANGLE,
        )?;

        self.downhill.validate(SlopeMode::Downhill)?;
        self.ramp.validate(SlopeMode::Ramp)?;

        check_non_negative("terrain.tangent_strength", self.tangent_strength)?;
        check_positive(
            "terrain.flatten_reference_angle",
            self.flatten_reference_angle,
        )?;
        Ok(())
    }
}

/// Rider movement, tricks and landing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed along the slope is clamped to [min_slope_speed, max_slope_speed]
    pub min_slope_speed: f32,
    pub max_slope_speed: f32,
    /// Gravity magnitude projected onto the slope tangent (units/s²)
    pub slope_gravity: f32,
    /// Vertical velocity set by a jump (replaces, does not add)
    pub jump_speed: f32,
    /// Trick rotation while holding the primary action in the air (degrees/second)
    pub air_rotation_speed: f32,
    /// Minimum dot(up, ground normal) for a clean landing
    pub landing_threshold: f32,
    /// Shorter hops skip landing validation (seconds)
    pub min_air_time_for_landing: f32,
    /// Minimum "up" component of a contact normal to count as ground
    pub ground_normal_threshold: f32,
    /// Contact must be missing this long before passive ungrounding (seconds)
    pub min_time_off_ground: f32,
    /// Constant acceleration into the surface while grounded (units/s²)
    pub adhesion_force: f32,
    /// Grounded normal velocity is held at or below -this value
    pub max_snap_upward_normal_velocity: f32,
    /// Rate the visual orientation follows the ground normal (degrees/second)
    pub slope_align_speed: f32,
    /// Hard cap on orientation change per fixed tick (degrees)
    pub max_align_step: f32,
    /// Crash-to-restart input lockout (seconds)
    pub restart_delay: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            min_slope_speed: 6.0,
            max_slope_speed: 22.0,
            slope_gravity: 20.0,
            jump_speed: 12.0,
            air_rotation_speed: 360.0,
            landing_threshold: 0.85,
            min_air_time_for_landing: 0.1,
            ground_normal_threshold: 0.5,
            min_time_off_ground: 0.1,
            adhesion_force: 30.0,
            max_snap_upward_normal_velocity: 0.5,
            slope_align_speed: 540.0,
            max_align_step: 10.0,
            restart_delay: 0.5,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("player.min_slope_speed", self.min_slope_speed)?;
        check_range(
            "player.slope_speed",
            (self.min_slope_speed, self.max_slope_speed),
        )?;
        check_non_negative("player.slope_gravity", self.slope_gravity)?;
        check_positive("player.jump_speed", self.jump_speed)?;
        check_non_negative("player.air_rotation_speed", self.air_rotation_speed)?;
        check_bounds("player.landing_threshold", self.landing_threshold, -1.0, 1.0)?;
        check_non_negative(
            "player.min_air_time_for_landing",
            self.min_air_time_for_landing,
        )?;
        check_positive(
            "player.ground_normal_threshold",
            self.ground_normal_threshold,
        )?;
        check_bounds(
            "player.ground_normal_threshold",
            self.ground_normal_threshold,
            0.0,
            1.0,
        )?;
        check_non_negative("player.min_time_off_ground", self.min_time_off_ground)?;
        check_non_negative("player.adhesion_force", self.adhesion_force)?;
        check_non_negative(
            "player.max_snap_upward_normal_velocity",
            self.max_snap_upward_normal_velocity,
        )?;
        check_positive("player.slope_align_speed", self.slope_align_speed)?;
        check_positive("player.max_align_step", self.max_align_step)?;
        check_non_negative("player.restart_delay", self.restart_delay)?;
        Ok(())
    }
}

/// Reference rigid-body collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// World gravity (units/s²)
    pub gravity: Vec2,
    /// Distance above the surface that still counts as touching
    pub contact_skin: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -15.0),
            contact_skin: 0.05,
        }
    }
}

impl BodyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "body.gravity",
            });
        }
        check_non_negative("body.contact_skin", self.contact_skin)
    }
}

/// Points awarded for tricks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Awarded the moment a full rotation completes
    pub flip_points: u64,
    /// Awarded per flip when the jump ends in a clean landing
    pub clean_landing_points: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            flip_points: 100,
            clean_landing_points: 50,
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Terrain RNG seed
    pub seed: u64,
    /// Derive a fresh terrain seed for every restart instead of replaying the same course
    pub reseed_on_restart: bool,
    /// Player pose applied at startup and on every restart
    pub start_position: Vec2,
    /// Start orientation (degrees, counter-clockwise)
    pub start_orientation: f32,
    pub terrain: TerrainConfig,
    pub player: PlayerConfig,
    pub body: BodyConfig,
    pub scoring: ScoringConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_CAFE,
            reseed_on_restart: false,
            start_position: Vec2::new(2.0, 1.5),
            start_orientation: 0.0,
            terrain: TerrainConfig::default(),
            player: PlayerConfig::default(),
            body: BodyConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start_position.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "start_position",
            });
        }
        check_finite("start_orientation", self.start_orientation)?;
        self.terrain.validate()?;
        self.player.validate()?;
        self.body.validate()?;
        Ok(())
    }

    /// Parse a (possibly partial) JSON tuning document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn check_range(field: &'static str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    check_finite(field, min)?;
    check_finite(field, max)?;
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { field, min, max })
    }
}

fn check_bounds(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfBounds {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        RunnerConfig::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_slope_range_names_field() {
        let mut config = RunnerConfig::default();
        config.terrain.min_slope_angle = 20.0;
        config.terrain.max_slope_angle = -20.0;
        match config.validate() {
            Err(ConfigError::InvalidRange { field, .. }) => {
                assert_eq!(field, "terrain.slope_angle")
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_segment_length_rejected() {
        let mut config = TerrainConfig::default();
        config.segment_length = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "terrain.segment_length",
                ..
            })
        ));

        config.segment_length = 0.01;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfBounds {
                field: "terrain.segment_length",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_mode_ranges_rejected() {
        let mut config = TerrainConfig::default();
        config.ramp.angle_range = (12.0, 6.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange {
                field: "terrain.ramp.angle_range",
                ..
            })
        ));

        let mut config = TerrainConfig::default();
        config.downhill.segment_range = (10, 6);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCount {
                field: "terrain.downhill.segment_range",
                min: 10,
                max: 6,
            })
        ));

        let mut config = TerrainConfig::default();
        config.downhill.segment_range = (0, 3);
        assert!(config.validate().is_err());

        // Upper bound is exclusive, so an empty range cannot produce a budget
        let mut config = TerrainConfig::default();
        config.ramp.segment_range = (4, 4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCount {
                field: "terrain.ramp.segment_range",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_rejected_not_clamped() {
        let mut config = PlayerConfig::default();
        config.jump_speed = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "player.jump_speed"
            })
        ));
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let json = r#"{ "seed": 7, "terrain": { "segment_length": 5.0 } }"#;
        let config = RunnerConfig::from_json(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.terrain.segment_length, 5.0);
        assert_eq!(config.terrain.initial_segments, 20);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn test_json_validation_runs() {
        let json = r#"{ "player": { "min_slope_speed": 30.0, "max_slope_speed": 10.0 } }"#;
        assert!(matches!(
            RunnerConfig::from_json(json),
            Err(ConfigError::InvalidRange {
                field: "player.slope_speed",
                ..
            })
        ));
        assert!(matches!(
            RunnerConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_preserves_tuning() {
        let mut config = RunnerConfig::default();
        config.terrain.ramp.segment_range = (2, 4);
        config.reseed_on_restart = true;
        let json = config.to_json_pretty().unwrap();
        assert_eq!(RunnerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_mode_rate_selection() {
        let mode = SlopeModeConfig::downhill();
        assert_eq!(mode.rate_toward(0.0, 5.0), 4.0);
        assert_eq!(mode.rate_toward(0.0, -5.0), 1.2);
        assert_eq!(mode.max_angle_delta(), 4.0);
    }
}
