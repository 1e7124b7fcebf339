//=========================================================================
// Command Bridge
//=========================================================================
//
// Bridges caller threads with the logic thread running a `World`.
//
// Components:
// - `interface`: the command vocabulary (the contract)
// - `command_collector`: core-side collection and buffering
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod command_collector;
pub(crate) mod interface;

//=== Public API ==========================================================

pub use interface::WorldCommand;

pub(crate) use command_collector::{CommandCollector, TickControl};
