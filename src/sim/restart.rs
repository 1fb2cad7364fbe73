//! Crash/restart glue between the rider and the terrain

use super::body::PhysicsPort;
use super::events::GameMessage;
use super::player::{PlayerPhysics, Pose};
use super::terrain::TerrainGenerator;

/// Seed for the `restarts`-th course when every restart gets a new layout
pub fn derive_seed(base: u64, restarts: u32) -> u64 {
    u64::from(restarts)
        .wrapping_mul(2654435761)
        .wrapping_add(base)
}

/// Armed by a crash, fired by the next restart request
#[derive(Debug, Clone)]
pub struct RestartCoordinator {
    start_pose: Pose,
    armed: bool,
    base_seed: u64,
    reseed: bool,
    restarts: u32,
}

impl RestartCoordinator {
    pub fn new(start_pose: Pose, base_seed: u64, reseed: bool) -> Self {
        Self {
            start_pose,
            armed: false,
            base_seed,
            reseed,
            restarts: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn start_pose(&self) -> Pose {
        self.start_pose
    }

    /// React to a published message. Returns true when a restart ran.
    pub fn handle(
        &mut self,
        message: &GameMessage,
        terrain: &mut TerrainGenerator,
        player: &mut PlayerPhysics,
        body: &mut dyn PhysicsPort,
    ) -> bool {
        match message {
            GameMessage::PlayerCrashed => {
                self.armed = true;
                false
            }
            GameMessage::RestartRequested if self.armed => {
                self.restarts += 1;
                if self.reseed {
                    terrain.reset_with_seed(derive_seed(self.base_seed, self.restarts));
                } else {
                    terrain.reset();
                }
                player.restart(self.start_pose, body);
                self.armed = false;
                log::info!("Restart #{} (seed {})", self.restarts, terrain.seed());
                true
            }
            GameMessage::RestartRequested => {
                log::trace!("Restart requested while not armed");
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BodyConfig, PlayerConfig, TerrainConfig};
    use crate::sim::body::RiderBody;
    use crate::sim::player::PlayerPhase;
    use glam::Vec2;

    struct Fixture {
        coord: RestartCoordinator,
        terrain: TerrainGenerator,
        player: PlayerPhysics,
        body: RiderBody,
    }

    impl Fixture {
        fn new(reseed: bool) -> Self {
            let pose = Pose::new(Vec2::new(2.0, 1.5), 0.0);
            Self {
                coord: RestartCoordinator::new(pose, 7, reseed),
                terrain: TerrainGenerator::new(TerrainConfig::default(), 7).unwrap(),
                player: PlayerPhysics::new(PlayerConfig::default(), 0.0).unwrap(),
                body: RiderBody::new(Vec2::new(40.0, -10.0), BodyConfig::default()),
            }
        }

        fn send(&mut self, message: GameMessage) -> bool {
            self.coord.handle(
                &message,
                &mut self.terrain,
                &mut self.player,
                &mut self.body,
            )
        }
    }

    #[test]
    fn test_request_without_crash_is_ignored() {
        let mut f = Fixture::new(false);
        assert!(!f.send(GameMessage::RestartRequested));
        assert_eq!(f.body.position, Vec2::new(40.0, -10.0));
    }

    #[test]
    fn test_crash_then_request_resets_both() {
        let mut f = Fixture::new(false);
        let original: Vec<_> = f.terrain.points().iter().copied().collect();

        f.terrain.extend_if_needed(500.0);
        f.terrain.cleanup(500.0);
        f.player.crash(&mut f.body);

        f.send(GameMessage::PlayerCrashed);
        assert!(f.coord.is_armed());
        assert!(f.send(GameMessage::RestartRequested));

        assert!(!f.coord.is_armed());
        assert_eq!(f.player.phase(), PlayerPhase::Airborne);
        assert_eq!(f.body.position, Vec2::new(2.0, 1.5));
        assert!(f.body.simulated);
        let replayed: Vec<_> = f.terrain.points().iter().copied().collect();
        assert_eq!(replayed, original);

        // Disarmed: a second request does nothing
        assert!(!f.send(GameMessage::RestartRequested));
        assert_eq!(f.coord.restarts(), 1);
    }

    #[test]
    fn test_reseed_changes_course() {
        let mut f = Fixture::new(true);
        let original = f.terrain.points()[10].position;

        f.send(GameMessage::PlayerCrashed);
        f.send(GameMessage::RestartRequested);

        assert_eq!(f.terrain.seed(), derive_seed(7, 1));
        assert_ne!(f.terrain.points()[10].position, original);
    }

    #[test]
    fn test_derive_seed_distinct() {
        assert_eq!(derive_seed(42, 0), 42);
        assert_ne!(derive_seed(42, 1), derive_seed(42, 2));
    }
}
