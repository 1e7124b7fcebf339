//=========================================================================
// Power Graph
//=========================================================================
//
// Switches, wires, shield holders, doors and consoles, joined by system id,
// plus the standalone battery charger.
//
// Architecture:
//   HolderShield ──main switch──→ RotateEnergy ──next──→ RotateEnergy ...
//        │                            │
//   default sinks                 phase outputs
//        ↓                            ↓
//   TimeDoor / CardConsole      sinks + WireTime
//
//   DoorSystemRegistry joins doors and consoles to the holder and
//   rotator of their system, in any registration order.
//
//=========================================================================

//=== Module Declarations =================================================

mod charger;
mod door;
mod holder;
mod registry;
mod switch;
mod wire;

//=== Public API ==========================================================

pub use charger::{TimeBattery, TimeCharger};
pub use door::{CardConsole, ConsoleScreen, DoorMotion, TimeDoor};
pub use holder::HolderShield;
pub use registry::{DoorSystemRegistry, Link, SystemRecord};
pub use switch::{PhaseOutput, RotateEnergy, PHASE_COUNT};
pub use wire::WireTime;
