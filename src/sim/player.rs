//! Rider movement state machine
//!
//! Three phases: Grounded, Airborne and Crashed (terminal until restart).
//! The variable-rate tick handles input, trick rotation and timers; the
//! fixed-rate tick handles slope following, adhesion, orientation and the
//! passive-ungrounding hysteresis. Contacts arrive from the physics
//! collaborator through [`PlayerPhysics::on_contact`] after each fixed step.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::PhysicsPort;
use crate::config::PlayerConfig;
use crate::consts::MIN_NORMAL_LENGTH;
use crate::error::ConfigError;
use crate::{move_towards_angle, normalize_angle, orientation_from_up, up_from_orientation};

/// Direction of travel
pub const FORWARD: Vec2 = Vec2::X;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    Grounded,
    Airborne,
    /// Terminal until an explicit restart
    Crashed,
}

/// Input sampled once per variable-rate tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Primary action pressed this frame (jump)
    pub primary_down: bool,
    /// Primary action held (trick rotation while airborne)
    pub primary_held: bool,
    /// Secondary action pressed this frame (restart after a crash)
    pub secondary_down: bool,
}

/// Position plus orientation (radians, counter-clockwise)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub orientation: f32,
}

impl Pose {
    pub fn new(position: Vec2, orientation: f32) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Things the rider reports to the rest of the game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    Jumped,
    /// `alignment` is `None` when the hop was too short to validate
    Landed {
        alignment: Option<f32>,
        flips: u32,
    },
    /// A full rotation finished mid-air (reported immediately, not on landing)
    FlipCompleted { total: u32 },
    Crashed,
    RestartRequested,
}

/// State-machine variables; reset atomically on restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub phase: PlayerPhase,
    /// Body velocity as of the end of the last fixed tick
    pub velocity: Vec2,
    /// Visual orientation (radians, counter-clockwise, 0 = upright)
    pub orientation: f32,
    /// Last ground normal, kept while grounded
    pub ground_normal: Vec2,
    pub was_grounded_last_tick: bool,
    /// Open from a jump until vertical velocity turns non-positive
    pub jump_authority_active: bool,
    pub air_time: f32,
    pub time_off_ground: f32,
    /// Trick rotation toward the next flip (radians)
    pub air_rotation_accumulated: f32,
    pub completed_flips: u32,
    pub time_since_crash: f32,
}

impl PlayerState {
    /// Grounded-eligible baseline: airborne with every timer cleared, so the
    /// first upward contact grounds without landing validation.
    pub fn baseline(orientation: f32) -> Self {
        Self {
            phase: PlayerPhase::Airborne,
            velocity: Vec2::ZERO,
            orientation: normalize_angle(orientation),
            ground_normal: Vec2::Y,
            was_grounded_last_tick: false,
            jump_authority_active: false,
            air_time: 0.0,
            time_off_ground: 0.0,
            air_rotation_accumulated: 0.0,
            completed_flips: 0,
            time_since_crash: 0.0,
        }
    }

    pub fn up(&self) -> Vec2 {
        up_from_orientation(self.orientation)
    }
}

/// dot(normalize(up), normalize(ground_normal)); 1.0 is a perfect landing
pub fn landing_alignment(up: Vec2, ground_normal: Vec2) -> f32 {
    up.normalize_or_zero().dot(ground_normal.normalize_or_zero())
}

/// Unit tangent of `normal` whose direction agrees with [`FORWARD`]
pub fn forward_tangent(normal: Vec2) -> Vec2 {
    let tangent = Vec2::new(normal.y, -normal.x);
    if tangent.dot(FORWARD) < 0.0 {
        -tangent
    } else {
        tangent
    }
}

/// Owns [`PlayerState`] and drives the body through a [`PhysicsPort`]
#[derive(Debug, Clone)]
pub struct PlayerPhysics {
    config: PlayerConfig,
    state: PlayerState,
    /// Qualifying ground contact since the last fixed tick
    contact_this_step: bool,
    events: Vec<PlayerEvent>,
}

impl PlayerPhysics {
    pub fn new(config: PlayerConfig, orientation: f32) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: PlayerState::baseline(orientation),
            contact_this_step: false,
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn phase(&self) -> PlayerPhase {
        self.state.phase
    }

    pub fn is_grounded(&self) -> bool {
        self.state.phase == PlayerPhase::Grounded
    }

    pub fn has_crashed(&self) -> bool {
        self.state.phase == PlayerPhase::Crashed
    }

    /// Take every event raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Variable-rate tick: input, trick rotation, air/crash timers
    pub fn tick_variable(&mut self, dt: f32, input: &FrameInput, body: &mut dyn PhysicsPort) {
        if !dt.is_finite() || dt < 0.0 {
            log::trace!("tick_variable: ignoring dt={dt}");
            return;
        }

        if self.state.phase == PlayerPhase::Crashed {
            self.state.time_since_crash += dt;
            if input.secondary_down && self.state.time_since_crash >= self.config.restart_delay {
                self.events.push(PlayerEvent::RestartRequested);
            }
            return;
        }

        if input.primary_down && self.state.phase == PlayerPhase::Grounded {
            self.jump(body);
        }

        if self.state.phase == PlayerPhase::Airborne {
            if input.primary_held {
                self.rotate_trick(dt);
            }
            self.state.air_time += dt;
        }
    }

    /// Fixed-rate tick: hysteresis, slope following, adhesion, orientation
    pub fn tick_fixed(&mut self, dt: f32, body: &mut dyn PhysicsPort) {
        if self.state.phase == PlayerPhase::Crashed {
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            log::trace!("tick_fixed: ignoring dt={dt}");
            return;
        }

        if self.state.jump_authority_active && body.velocity().y <= 0.0 {
            self.state.jump_authority_active = false;
        }

        if self.state.phase == PlayerPhase::Grounded {
            if self.contact_this_step {
                self.state.time_off_ground = 0.0;
            } else {
                self.state.time_off_ground += dt;
                if self.state.time_off_ground >= self.config.min_time_off_ground
                    && !self.state.jump_authority_active
                {
                    self.state.phase = PlayerPhase::Airborne;
                    self.state.air_time = self.state.time_off_ground;
                    log::debug!(
                        "Left ground after {:.3}s without contact",
                        self.state.time_off_ground
                    );
                }
            }
        }

        if self.state.phase == PlayerPhase::Grounded {
            self.follow_slope(dt, body);
            self.align_to_ground(dt);
        }

        self.contact_this_step = false;
        self.state.velocity = body.velocity();
        self.state.was_grounded_last_tick = self.state.phase == PlayerPhase::Grounded;
    }

    /// Contact report from the collision step; only the first contact is used
    ///
    /// Empty reports and zero-length normals are engine noise and change nothing.
    pub fn on_contact(&mut self, normals: &[Vec2], body: &mut dyn PhysicsPort) {
        if self.state.phase == PlayerPhase::Crashed {
            return;
        }
        let Some(&normal) = normals.first() else {
            log::trace!("on_contact: empty contact report");
            return;
        };
        if !normal.is_finite() || normal.length() < MIN_NORMAL_LENGTH {
            log::trace!("on_contact: degenerate normal {normal:?}");
            return;
        }

        let normal = normal.normalize();
        if normal.y < self.config.ground_normal_threshold {
            log::trace!("on_contact: {normal:?} is not ground");
            return;
        }

        match self.state.phase {
            PlayerPhase::Grounded => {
                self.state.ground_normal = normal;
                self.state.time_off_ground = 0.0;
                self.contact_this_step = true;
            }
            PlayerPhase::Airborne => {
                if self.state.jump_authority_active {
                    if body.velocity().y > 0.0 {
                        return;
                    }
                    self.state.jump_authority_active = false;
                }
                self.land(normal, body);
            }
            PlayerPhase::Crashed => {}
        }
    }

    /// Stop the rider for good (until restart). Repeated calls are no-ops.
    pub fn crash(&mut self, body: &mut dyn PhysicsPort) {
        if self.state.phase == PlayerPhase::Crashed {
            return;
        }

        self.state.phase = PlayerPhase::Crashed;
        self.state.jump_authority_active = false;
        self.state.time_since_crash = 0.0;
        self.state.velocity = Vec2::ZERO;
        self.contact_this_step = false;

        body.set_velocity(Vec2::ZERO);
        body.set_simulated(false);

        log::info!(
            "CRASH at x={:.1} (orientation {:.0}°)",
            body.position().x,
            self.state.orientation.to_degrees()
        );
        self.events.push(PlayerEvent::Crashed);
    }

    /// Clear all transient state and place the rider at `pose`
    pub fn restart(&mut self, pose: Pose, body: &mut dyn PhysicsPort) {
        if self.state.phase != PlayerPhase::Crashed {
            log::debug!("Restart requested while {:?}", self.state.phase);
        }

        self.state = PlayerState::baseline(pose.orientation);
        self.contact_this_step = false;

        body.set_position(pose.position);
        body.set_velocity(Vec2::ZERO);
        body.set_simulated(true);

        log::info!("Rider restarted at ({:.1}, {:.1})", pose.position.x, pose.position.y);
    }

    fn jump(&mut self, body: &mut dyn PhysicsPort) {
        let velocity = body.velocity();
        body.set_velocity(Vec2::new(velocity.x, self.config.jump_speed));

        self.state.phase = PlayerPhase::Airborne;
        self.state.jump_authority_active = true;
        self.state.air_time = 0.0;
        self.state.time_off_ground = 0.0;
        self.state.air_rotation_accumulated = 0.0;
        self.state.completed_flips = 0;
        self.contact_this_step = false;

        log::debug!("Jump at x={:.1}", body.position().x);
        self.events.push(PlayerEvent::Jumped);
    }

    fn rotate_trick(&mut self, dt: f32) {
        let step = self.config.air_rotation_speed.to_radians() * dt;
        self.state.orientation = normalize_angle(self.state.orientation + step);
        self.state.air_rotation_accumulated += step;

        while self.state.air_rotation_accumulated >= TAU {
            self.state.air_rotation_accumulated -= TAU;
            self.state.completed_flips += 1;
            log::debug!("Flip! Total: {}", self.state.completed_flips);
            self.events.push(PlayerEvent::FlipCompleted {
                total: self.state.completed_flips,
            });
        }
    }

    fn land(&mut self, normal: Vec2, body: &mut dyn PhysicsPort) {
        self.state.phase = PlayerPhase::Grounded;
        self.state.ground_normal = normal;
        self.state.time_off_ground = 0.0;
        self.contact_this_step = true;

        let alignment = if self.state.air_time >= self.config.min_air_time_for_landing {
            let alignment = landing_alignment(self.state.up(), normal);
            if alignment < self.config.landing_threshold {
                log::debug!("Bad landing: alignment {alignment:.2}");
                self.crash(body);
                return;
            }
            log::debug!("Clean landing! Alignment: {alignment:.2}");
            Some(alignment)
        } else {
            None
        };

        self.events.push(PlayerEvent::Landed {
            alignment,
            flips: self.state.completed_flips,
        });
        self.state.air_time = 0.0;
        self.state.air_rotation_accumulated = 0.0;
        self.state.completed_flips = 0;
    }

    /// Rebuild velocity along the ground tangent, then press into the surface
    fn follow_slope(&mut self, dt: f32, body: &mut dyn PhysicsPort) {
        let normal = self.state.ground_normal;
        let tangent = forward_tangent(normal);

        // -tangent.y is the sine of the downhill angle: positive going down
        let slope_accel = self.config.slope_gravity * -tangent.y;
        let speed = (body.velocity().dot(tangent) + slope_accel * dt)
            .clamp(self.config.min_slope_speed, self.config.max_slope_speed);

        let mut velocity = tangent * speed;
        let floor = -self.config.max_snap_upward_normal_velocity;
        let normal_speed = velocity.dot(normal);
        if normal_speed > floor {
            velocity -= normal * (normal_speed - floor);
        }

        body.set_velocity(velocity);
        body.apply_impulse(-normal * self.config.adhesion_force * dt);
    }

    fn align_to_ground(&mut self, dt: f32) {
        let target = orientation_from_up(self.state.ground_normal);
        let max_step = (self.config.slope_align_speed.to_radians() * dt)
            .min(self.config.max_align_step.to_radians());
        self.state.orientation = move_towards_angle(self.state.orientation, target, max_step);
    }
}
