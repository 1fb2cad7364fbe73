//! Simulation root: owns every component and routes messages between them

use std::collections::VecDeque;

use glam::Vec2;

use super::body::{PhysicsPort, RiderBody};
use super::events::{EventBus, GameMessage, MessageKind, SubscriptionId};
use super::player::{FrameInput, PlayerEvent, PlayerPhysics, Pose};
use super::restart::RestartCoordinator;
use super::score::Scoreboard;
use super::terrain::TerrainGenerator;
use crate::config::RunnerConfig;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::ConfigError;

/// Fixed-step accumulator for hosts that only know frame durations
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp a raw frame duration to what the simulation will accept
    pub fn clamp_frame(frame_dt: f32) -> f32 {
        if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        }
    }

    /// Bank `frame_dt` and return how many fixed steps are due
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += Self::clamp_frame(frame_dt);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Fraction of a fixed step left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

pub struct World {
    config: RunnerConfig,
    terrain: TerrainGenerator,
    player: PlayerPhysics,
    body: RiderBody,
    coordinator: RestartCoordinator,
    scoreboard: Scoreboard,
    bus: EventBus,
    clock: FrameClock,
    pending: VecDeque<GameMessage>,
    fixed_ticks: u64,
}

impl World {
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let start_pose = Pose::new(config.start_position, config.start_orientation.to_radians());
        let terrain = TerrainGenerator::new(config.terrain.clone(), config.seed)?;
        let player = PlayerPhysics::new(config.player.clone(), start_pose.orientation)?;
        let body = RiderBody::new(start_pose.position, config.body.clone());
        let coordinator =
            RestartCoordinator::new(start_pose, config.seed, config.reseed_on_restart);
        let scoreboard = Scoreboard::new(config.scoring.clone());

        log::info!(
            "World ready: seed {}, start ({:.1}, {:.1})",
            config.seed,
            start_pose.position.x,
            start_pose.position.y
        );

        Ok(Self {
            config,
            terrain,
            player,
            body,
            coordinator,
            scoreboard,
            bus: EventBus::new(),
            clock: FrameClock::new(),
            pending: VecDeque::new(),
            fixed_ticks: 0,
        })
    }

    /// Per-frame tick: input, trick rotation, timers
    pub fn tick_variable(&mut self, dt: f32, input: &FrameInput) {
        self.player.tick_variable(dt, input, &mut self.body);
        self.dispatch();
    }

    /// Fixed-rate tick: terrain upkeep, rider physics, collision
    pub fn tick_fixed(&mut self, dt: f32) {
        self.terrain.extend_if_needed(self.body.position.x);

        self.player.tick_fixed(dt, &mut self.body);
        let contacts = self.body.step(dt, &self.terrain);
        if !contacts.is_empty() {
            self.player.on_contact(&contacts, &mut self.body);
        }

        self.terrain.cleanup(self.body.position.x);
        self.fixed_ticks += 1;
        self.dispatch();
    }

    /// Run one rendered frame: a variable tick, then whatever fixed steps are due
    pub fn advance(&mut self, frame_dt: f32, input: &FrameInput) -> u32 {
        self.tick_variable(FrameClock::clamp_frame(frame_dt), input);

        let steps = self.clock.advance(frame_dt);
        for _ in 0..steps {
            self.tick_fixed(SIM_DT);
        }
        steps
    }

    /// External restart request (e.g. a UI button); honored only after a crash
    pub fn request_restart(&mut self) {
        self.pending.push_back(GameMessage::RestartRequested);
        self.dispatch();
    }

    pub fn subscribe(
        &mut self,
        kind: MessageKind,
        handler: impl FnMut(&GameMessage) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    pub fn player(&self) -> &PlayerPhysics {
        &self.player
    }

    pub fn body(&self) -> &RiderBody {
        &self.body
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn score(&self) -> u64 {
        self.scoreboard.score
    }

    pub fn restarts(&self) -> u32 {
        self.coordinator.restarts()
    }

    pub fn fixed_ticks(&self) -> u64 {
        self.fixed_ticks
    }

    pub fn render_alpha(&self) -> f32 {
        self.clock.alpha()
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.body.position(), self.player.state().orientation)
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Translate rider events, then deliver everything queued
    ///
    /// Internal consumers (restart, scoring) see a message before external
    /// subscribers; anything they raise is queued behind it.
    fn dispatch(&mut self) {
        for event in self.player.drain_events() {
            let message = match event {
                PlayerEvent::Jumped => GameMessage::PlayerJumped,
                PlayerEvent::Landed { alignment, flips } => {
                    GameMessage::PlayerLanded { alignment, flips }
                }
                PlayerEvent::FlipCompleted { .. } => GameMessage::ScoreChanged {
                    score: self.scoreboard.award_flip(),
                },
                PlayerEvent::Crashed => GameMessage::PlayerCrashed,
                PlayerEvent::RestartRequested => GameMessage::RestartRequested,
            };
            self.pending.push_back(message);
        }

        while let Some(message) = self.pending.pop_front() {
            let restarted = self.coordinator.handle(
                &message,
                &mut self.terrain,
                &mut self.player,
                &mut self.body,
            );
            if restarted {
                self.scoreboard.reset();
                self.clock.reset();
                self.pending.push_back(GameMessage::ScoreChanged { score: 0 });
            }
            if let Some(score) = self.scoreboard.observe(&message) {
                self.pending.push_back(GameMessage::ScoreChanged { score });
            }

            log::debug!("-> {message:?}");
            self.bus.publish(&message);
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("phase", &self.player.phase())
            .field("position", &self.body.position)
            .field("score", &self.scoreboard.score)
            .field("fixed_ticks", &self.fixed_ticks)
            .field("bus", &self.bus)
            .finish()
    }
}
