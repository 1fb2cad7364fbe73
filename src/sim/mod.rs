//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep for physics, variable timestep only for input and timers
//! - Seeded RNG only (terrain)
//! - Synchronous, ordered message dispatch
//! - No rendering or platform dependencies

pub mod body;
pub mod events;
pub mod player;
pub mod restart;
pub mod score;
pub mod terrain;
pub mod world;

pub use body::{PhysicsPort, RiderBody};
pub use events::{EventBus, GameMessage, MessageKind, SubscriptionId};
pub use player::{
    FrameInput, PlayerEvent, PlayerPhase, PlayerPhysics, PlayerState, Pose, forward_tangent,
    landing_alignment,
};
pub use restart::{RestartCoordinator, derive_seed};
pub use score::Scoreboard;
pub use terrain::{
    GroundQuery, GroundSample, SlopeMode, SlopeModeState, TerrainGenerator, TerrainPoint,
};
pub use world::{FrameClock, World};
