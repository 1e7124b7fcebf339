//=========================================================================
// Timeshift Engine — Library Root
//
// Timeline-consistency core for a two-timeline puzzle game.
//
// Responsibilities:
// - Expose the runtime facade (`Engine`, `EngineHandle`)
// - Expose the `World` and its building blocks for direct, synchronous use
// - Keep the logic-thread plumbing internal
//
// Typical usage:
// ```no_run
// use timeshift_engine::prelude::*;
//
// let handle = EngineBuilder::new()
//     .build()
//     .init(|world| {
//         world.spawn(EntityBuilder::new("vase").timeline_object());
//     })
//     .run();
// handle.send(WorldCommand::ToggleTime).unwrap();
// let world = handle.shutdown().unwrap();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the clock, timeline objects, twins, power routing and
// the `World` that ties them together. It is usable on its own, without
// the threaded runtime.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the threaded runtime entry point.
//
mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder, EngineError, EngineHandle};
