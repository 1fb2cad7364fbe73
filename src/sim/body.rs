//! Physics collaborator port
//!
//! The rider state machine never integrates positions itself. It drives a
//! rigid body through [`PhysicsPort`] and is told about ground contacts by
//! whoever resolves collisions. [`RiderBody`] is the reference implementation:
//! a point body under gravity resolved against any [`GroundQuery`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::terrain::GroundQuery;
use crate::config::BodyConfig;

/// What the rider needs from a physics engine
pub trait PhysicsPort {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
    /// Instantaneous velocity change (mass-independent)
    fn apply_impulse(&mut self, impulse: Vec2);
    /// Disabled bodies neither integrate nor report contacts
    fn set_simulated(&mut self, simulated: bool);
    fn is_simulated(&self) -> bool;
}

/// Point body integrated with semi-implicit Euler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub simulated: bool,
    config: BodyConfig,
}

impl RiderBody {
    pub fn new(position: Vec2, config: BodyConfig) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            simulated: true,
            config,
        }
    }

    /// Integrate one fixed step and resolve against the ground
    ///
    /// Returns the contact normals touched this step (empty when airborne or
    /// disabled). Penetration is corrected by projecting onto the surface and
    /// removing the into-surface velocity component.
    pub fn step(&mut self, dt: f32, ground: &impl GroundQuery) -> Vec<Vec2> {
        if !self.simulated || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }

        self.velocity += self.config.gravity * dt;
        self.position += self.velocity * dt;

        let Some(sample) = ground.sample(self.position.x) else {
            return Vec::new();
        };

        let gap = self.position.y - sample.height;
        if gap > self.config.contact_skin {
            return Vec::new();
        }

        if gap < 0.0 {
            self.position.y = sample.height;
            let into_surface = self.velocity.dot(sample.normal);
            if into_surface < 0.0 {
                self.velocity -= sample.normal * into_surface;
            }
        }

        vec![sample.normal]
    }
}

impl PhysicsPort for RiderBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        if self.simulated {
            self.velocity += impulse;
        }
    }

    fn set_simulated(&mut self, simulated: bool) {
        self.simulated = simulated;
    }

    fn is_simulated(&self) -> bool {
        self.simulated
    }
}
