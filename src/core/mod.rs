//=========================================================================
// Core Systems Orchestrator
//
// Central coordinator running a `World` on the logic thread.
//
// Responsibilities:
// - Own the world for the lifetime of the runtime
// - Receive caller commands through a bounded channel
// - Maintain deterministic pacing using a fixed tick rate (TPS)
// - Ship each frame's effects back through an outbound channel
//
// Notes:
// The orchestrator runs independently from its callers. It owns the
// world directly and updates it at a fixed rate in a background thread.
// Communication happens only through message passing, so the world
// itself never needs locking.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod command_bridge;
pub mod config;
pub mod effects;
pub mod entity;
pub mod error;
pub mod math;
pub mod message_bus;
pub mod object;
pub mod power;
pub mod shield;
pub mod time;
pub mod twin;
pub mod world;

//=== Public API ==========================================================

pub use command_bridge::WorldCommand;
pub use config::WorldConfig;
pub use effects::{AudioCue, EffectBatch, GameFlow, ResidueEffect, VisualEffect};
pub use entity::{Body, Entity, EntityId};
pub use error::{WorldError, WorldResult};
pub use math::{Pose, Quat, Vec3};
pub use object::{ObjectCondition, ObjectSettings};
pub use time::TimeState;
pub use world::{EntityBuilder, World};

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use command_bridge::{CommandCollector, TickControl};

//=== CoreSystemsOrchestrator =============================================

/// Owns the world and schedules its updates on the logic thread.
pub(crate) struct CoreSystemsOrchestrator {
    world: World,
}

impl CoreSystemsOrchestrator {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(config: WorldConfig) -> Self {
        Self { world: World::new(config) }
    }

    /// Mutable access for setup before the thread starts.
    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    //--- spawn_core_thread() ----------------------------------------------
    //
    // Spawns the logic thread ticking the world at a fixed rate.
    //
    // Each tick:
    //  1. Collects caller commands
    //  2. Applies them, logging the rejected ones
    //  3. Ticks timers, doors and the clock, then runs the physics hook
    //  4. Sends the frame's effects out
    //  5. Sleeps to maintain fixed pacing
    //
    // The thread hands the world back when it exits.
    //
    pub(crate) fn spawn_core_thread(
        self,
        commands: Receiver<WorldCommand>,
        effects: Sender<EffectBatch>,
        tps: f64,
    ) -> thread::JoinHandle<World> {
        let frame_duration = Duration::from_secs_f64(1.0 / tps);

        thread::spawn(move || {
            let mut world = self.world;
            let mut collector = CommandCollector::new(commands);
            let mut frames: u64 = 0;

            loop {
                let frame_start = Instant::now();

                //--- Step 1: Gather commands -------------------------------
                let control = collector.collect_frame();

                //--- Step 2: Apply them ------------------------------------
                if !collector.commands().is_empty() {
                    debug!("Applying {} commands", collector.commands().len());
                }
                for command in collector.take_commands() {
                    if let Err(e) = world.apply(command) {
                        warn!("Rejected command: {}", e);
                    }
                }

                //--- Step 3: Advance the world -----------------------------
                world.tick(frame_duration);
                world.fixed_update();
                frames += 1;

                //--- Step 4: Publish effects -------------------------------
                let batch = world.drain_effects();
                if !batch.is_empty() && effects.send(batch).is_err() {
                    warn!("Effect receiver dropped; discarding effects");
                }

                if control == TickControl::Exit {
                    info!("Core thread exiting after {} frames", frames);
                    break;
                }

                //--- Step 5: Maintain deterministic pacing -----------------
                let elapsed = frame_start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }

            world
        })
    }
}
