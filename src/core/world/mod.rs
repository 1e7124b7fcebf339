//=========================================================================
// World
//=========================================================================
//
// The explicitly constructed context that owns the clock, the entity
// arena, the door-system registry, the timers and the effect bus.
//
//=========================================================================

//=== Module Declarations =================================================

mod builder;
mod hold;
mod stage;
#[allow(clippy::module_inception)]
mod world;

#[cfg(test)]
mod scenarios;

//=== Public API ==========================================================

pub use builder::EntityBuilder;
pub use stage::{Facet, ObserverKey};
pub use world::World;

pub(crate) use stage::{Stage, TimedAction};
