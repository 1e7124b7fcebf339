//=========================================================================
// Time State
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== TimeState ===========================================================

/// The two linked timelines.
///
/// `Origin` is the present and the default playable state; `L1` is the
/// alternate timeline reached by time travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeState {
    #[default]
    Origin,
    L1,
}

impl TimeState {
    /// Returns the opposite timeline.
    pub fn toggled(self) -> Self {
        match self {
            TimeState::Origin => TimeState::L1,
            TimeState::L1 => TimeState::Origin,
        }
    }
}

impl fmt::Display for TimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeState::Origin => f.write_str("Origin"),
            TimeState::L1 => f.write_str("L1"),
        }
    }
}

//=== ClockView ===========================================================

/// Read-only snapshot of the clock handed to observers.
///
/// `current` is the global timeline at notification time. During a
/// single-object portal trip it stays at the global value even though the
/// travelling object is told about a different target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockView {
    pub current: TimeState,
    pub previous: TimeState,
}

impl ClockView {
    pub fn new(current: TimeState, previous: TimeState) -> Self {
        Self { current, previous }
    }

    /// View of a clock that has never changed.
    pub fn settled(current: TimeState) -> Self {
        Self { current, previous: current }
    }
}

//=========================================================================
// Tests
//=========================================================================
