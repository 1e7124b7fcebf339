//=========================================================================
// Timers
//=========================================================================
//
// Tick-driven replacements for delayed callbacks.
//
// Architecture:
//   schedule(delay, action) → pending list
//                                ↓
//   tick(dt) ──────────────→ due actions (FIFO by due time)
//
// Nothing here sleeps; time only advances when the owner ticks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== Cooldown ============================================================

/// A single resettable countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    remaining: Option<Duration>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self { remaining: None }
    }

    /// Starts (or restarts) the countdown. A zero duration leaves it idle.
    pub fn start(&mut self, duration: Duration) {
        self.remaining = (!duration.is_zero()).then_some(duration);
    }

    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Advances the countdown. Returns `true` on the tick it expires.
    pub fn tick(&mut self, dt: Duration) -> bool {
        match self.remaining {
            Some(left) if left <= dt => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - dt);
                false
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }
}

//=== Scheduler ===========================================================

/// Queue of actions that fire after a delay.
pub struct Scheduler<T> {
    pending: Vec<(Duration, T)>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn schedule(&mut self, delay: Duration, action: T) {
        self.pending.push((delay, action));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending action matching the predicate.
    pub fn cancel_where<F>(&mut self, mut pred: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.pending.retain(|(_, action)| !pred(action));
    }

    pub fn contains<F>(&self, mut pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.pending.iter().any(|(_, action)| pred(action))
    }

    /// Advances all timers and returns actions that became due, earliest first.
    pub fn tick(&mut self, dt: Duration) -> Vec<T> {
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.pending.len());

        for (left, action) in self.pending.drain(..) {
            if left <= dt {
                due.push((left, action));
            } else {
                waiting.push((left - dt, action));
            }
        }

        self.pending = waiting;
        // Stable sort keeps scheduling order for equal deadlines
        due.sort_by_key(|(left, _)| *left);
        due.into_iter().map(|(_, action)| action).collect()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
