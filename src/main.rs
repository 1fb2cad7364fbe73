//! Slope Runner - headless demo
//!
//! Drives the simulation with a scripted rider for a fixed number of frames
//! and logs what happens. Pass a JSON tuning file as the first argument to
//! override the defaults; `RUST_LOG=debug` shows every state transition.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use slope_runner::RunnerConfig;

    env_logger::init();
    log::info!("Slope Runner (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };

    demo::run(config)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library; hosts embed `slope_runner::sim::World`
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use slope_runner::RunnerConfig;
    use slope_runner::sim::{FrameInput, GameMessage, MessageKind, PlayerPhase, World};

    const FRAME_DT: f32 = 1.0 / 60.0;
    const FRAMES: u32 = 60 * 60;

    #[derive(Debug, Default)]
    struct RunStats {
        jumps: u32,
        landings: u32,
        crashes: u32,
        best_score: u64,
    }

    /// Rides for a while, jumps, holds the trick for exactly one flip, and
    /// asks for a restart after a crash
    struct Trickster {
        flip_frames: u32,
        grounded_frames: u32,
        spin_frames: u32,
        crashed_frames: u32,
    }

    impl Trickster {
        const RIDE_FRAMES: u32 = 90;

        fn new(air_rotation_speed: f32) -> Self {
            // One frame of margin so float accumulation still completes the turn
            let flip_frames = (360.0 / air_rotation_speed.max(1.0) / FRAME_DT).ceil() as u32 + 1;
            Self {
                flip_frames,
                grounded_frames: 0,
                spin_frames: 0,
                crashed_frames: 0,
            }
        }

        fn input(&mut self, phase: PlayerPhase) -> FrameInput {
            let mut input = FrameInput::default();
            match phase {
                PlayerPhase::Crashed => {
                    self.crashed_frames += 1;
                    self.spin_frames = 0;
                    input.secondary_down = self.crashed_frames % 30 == 0;
                }
                PlayerPhase::Grounded => {
                    self.crashed_frames = 0;
                    self.spin_frames = 0;
                    self.grounded_frames += 1;
                    if self.grounded_frames >= Self::RIDE_FRAMES {
                        self.grounded_frames = 0;
                        self.spin_frames = 1;
                        input.primary_down = true;
                        input.primary_held = true;
                    }
                }
                PlayerPhase::Airborne => {
                    if (1..self.flip_frames).contains(&self.spin_frames) {
                        self.spin_frames += 1;
                        input.primary_held = true;
                    }
                }
            }
            input
        }
    }

    pub fn run(config: RunnerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let mut world = World::new(config)?;
        let stats = Rc::new(RefCell::new(RunStats::default()));

        {
            let stats = Rc::clone(&stats);
            world.subscribe(MessageKind::PlayerJumped, move |_| stats.borrow_mut().jumps += 1);
        }
        {
            let stats = Rc::clone(&stats);
            world.subscribe(MessageKind::PlayerLanded, move |_| stats.borrow_mut().landings += 1);
        }
        {
            let stats = Rc::clone(&stats);
            world.subscribe(MessageKind::PlayerCrashed, move |_| stats.borrow_mut().crashes += 1);
        }
        {
            let stats = Rc::clone(&stats);
            world.subscribe(MessageKind::ScoreChanged, move |msg| {
                if let GameMessage::ScoreChanged { score } = msg {
                    let mut stats = stats.borrow_mut();
                    stats.best_score = stats.best_score.max(*score);
                }
            });
        }

        let mut trickster = Trickster::new(world.config().player.air_rotation_speed);
        for frame in 0..FRAMES {
            let input = trickster.input(world.player().phase());
            world.advance(FRAME_DT, &input);

            if frame % 600 == 0 {
                let pose = world.pose();
                log::info!(
                    "t={:>4.1}s x={:>7.1} y={:>7.1} {:?} score={} points={}",
                    frame as f32 * FRAME_DT,
                    pose.position.x,
                    pose.position.y,
                    world.player().phase(),
                    world.score(),
                    world.terrain().len()
                );
            }
        }

        let stats = stats.borrow();
        log::info!(
            "Done: {} fixed ticks, {} restarts, {} segments generated",
            world.fixed_ticks(),
            world.restarts(),
            world.terrain().segments_generated()
        );
        println!(
            "jumps={} landings={} crashes={} best_score={} final_x={:.1}",
            stats.jumps,
            stats.landings,
            stats.crashes,
            stats.best_score,
            world.position().x
        );
        Ok(())
    }
}
