//=========================================================================
// Time System
//=========================================================================
//
// Global timeline state, two-pass observer notification and tick-driven
// timers.
//
//=========================================================================

//=== Module Declarations =================================================

mod clock;
mod state;
mod timer;

//=== Public API ==========================================================

pub use clock::{TimeObserverHost, TimelineClock};
pub use state::{ClockView, TimeState};
pub use timer::{Cooldown, Scheduler};
