//=========================================================================
// Timeshift Engine
//
// Main entry point and coordinator for the runtime.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  EngineHandle
//         │                          │                     │
//         ├─ with_tps()              ├─ init()             ├─ send()
//         ├─ with_channel_capacity() └─ spawns logic       ├─ effects()
//         └─ with_world_config()        thread             └─ shutdown()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{error, info};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::{CoreSystemsOrchestrator, EffectBatch, World, WorldCommand, WorldConfig};

//=== EngineError =========================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The logic thread is gone and no longer takes commands.
    #[error("logic thread has stopped")]
    Stopped,

    #[error("logic thread panicked")]
    LogicThreadPanicked,
}

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (logic updates per second)
/// - **Channel capacity**: 128 commands
/// - **World config**: [`WorldConfig::default`]
///
/// # Examples
///
/// ```
/// use timeshift_engine::EngineBuilder;
///
/// let engine = EngineBuilder::new()
///     .with_tps(120.0)              // Finer timer resolution
///     .with_channel_capacity(256)   // Extra buffering
///     .build();
/// let world = engine.run().shutdown().unwrap();
/// assert!(world.entities().next().is_none());
/// ```
pub struct EngineBuilder {
    tps: f64,
    channel_capacity: usize,
    config: WorldConfig,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            channel_capacity: 128,
            config: WorldConfig::default(),
        }
    }

    /// Sets the target ticks per second for the logic thread.
    ///
    /// Each tick advances timers, door motion and the timeline cooldown by
    /// one fixed frame, so higher values give finer timer resolution at
    /// the cost of CPU time.
    ///
    /// Default: 60.0
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets the capacity of the caller → logic thread command channel.
    ///
    /// Default: 128
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    pub fn with_world_config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine instance with an empty world.
    pub fn build(self) -> Engine {
        info!("Building engine (TPS: {}, channel: {})", self.tps, self.channel_capacity);

        Engine {
            orchestrator: CoreSystemsOrchestrator::new(self.config),
            tps: self.tps,
            channel_capacity: self.channel_capacity,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Timeshift runtime, not yet started.
///
/// # Architecture
///
/// ```text
/// Caller thread
///   │  WorldCommand (bounded)
///   ▼
/// CoreSystemsOrchestrator (Logic Thread @ TPS)
///   │  owns World: clock, stage, scheduler
///   │  EffectBatch (unbounded)
///   ▼
/// Caller thread (renderer, audio, UI)
/// ```
pub struct Engine {
    orchestrator: CoreSystemsOrchestrator,
    tps: f64,
    channel_capacity: usize,
}

impl Engine {
    //--- Initialization ---------------------------------------------------

    /// Populates the world before the logic thread starts.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeshift_engine::EngineBuilder;
    /// use timeshift_engine::core::EntityBuilder;
    ///
    /// let engine = EngineBuilder::new().build().init(|world| {
    ///     world.spawn(EntityBuilder::new("crate").timeline_object().pickable());
    /// });
    /// let world = engine.run().shutdown().unwrap();
    /// assert_eq!(world.entities().count(), 1);
    /// ```
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut World),
    {
        info!("Initializing world");

        init_fn(self.orchestrator.world_mut());

        info!("World initialization complete");
        self
    }

    //--- Execution --------------------------------------------------------

    /// Starts the logic thread and returns a handle to drive it.
    ///
    /// # Lifecycle
    ///
    /// 1. Creates the command and effect channels
    /// 2. Spawns the logic thread running at the configured TPS
    /// 3. Returns immediately; the caller talks to the world through
    ///    [`EngineHandle`] until [`EngineHandle::shutdown`]
    pub fn run(self) -> EngineHandle {
        info!("Starting engine runtime (TPS: {})", self.tps);

        //--- 1. Create communication channels ----------------------------
        let (command_tx, command_rx): (Sender<WorldCommand>, Receiver<WorldCommand>) =
            bounded(self.channel_capacity);
        let (effect_tx, effect_rx) = unbounded();

        info!("Command channel created (capacity: {})", self.channel_capacity);

        //--- 2. Spawn the core logic thread -------------------------------
        let core_handle = self.orchestrator.spawn_core_thread(command_rx, effect_tx, self.tps);
        info!("Core logic thread spawned");

        EngineHandle {
            commands: command_tx,
            effects: effect_rx,
            core_handle,
        }
    }
}

//=== EngineHandle ========================================================

/// Caller side of a running engine.
pub struct EngineHandle {
    commands: Sender<WorldCommand>,
    effects: Receiver<EffectBatch>,
    core_handle: std::thread::JoinHandle<World>,
}

impl EngineHandle {
    /// Queues a command for the next tick. Blocks while the channel is full.
    pub fn send(&self, command: WorldCommand) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::Stopped)
    }

    /// Effect batches, one per tick that produced any.
    pub fn effects(&self) -> &Receiver<EffectBatch> {
        &self.effects
    }

    /// Stops the logic thread after it applies everything already queued,
    /// and hands the world back.
    pub fn shutdown(self) -> Result<World, EngineError> {
        if self.commands.send(WorldCommand::Shutdown).is_err() {
            info!("Logic thread already stopped");
        }
        drop(self.commands);

        match self.core_handle.join() {
            Ok(world) => {
                info!("Engine shutdown complete");
                Ok(world)
            }
            Err(e) => {
                error!("Core thread panicked: {:?}", e);
                Err(EngineError::LogicThreadPanicked)
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
