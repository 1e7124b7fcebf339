//=========================================================================
// Timeline Clock
//=========================================================================
//
// Owns the single global timeline and notifies observers in two passes.
//
// Architecture:
//   change_time(new)
//     ├─ pass 1: pre_time_change(new)  → every observer
//     ├─ pass 2: on_time_changed(new)  → every observer
//     └─ cooldown.start(delay)
//   tick(dt) → cooldown released → caller resumes gameplay
//
// Observers are opaque keys; the host resolves a key to whatever entity
// or facet it names. The clock never holds references into the host, so
// the host can be borrowed mutably while the clock drives it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt::Debug;
use std::time::Duration;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::state::{ClockView, TimeState};
use super::timer::Cooldown;

//=== TimeObserverHost ====================================================

/// Receiver of clock notifications, addressed by observer key.
pub trait TimeObserverHost<K> {
    /// Pass 1. Lets objects other objects depend on (shields, twins)
    /// establish preconditions before anyone reacts.
    fn pre_time_change(&mut self, observer: K, new_state: TimeState, clock: ClockView);

    /// Pass 2. Normal reaction to the new timeline.
    fn on_time_changed(&mut self, observer: K, new_state: TimeState, clock: ClockView);

    /// Called once before a single-object trip is broadcast.
    fn portal_entry(&mut self, _observer: K, _target: TimeState, _clock: ClockView) {}
}

//=== TimelineClock =======================================================

/// Global timeline state with cooldown and ordered observer list.
pub struct TimelineClock<K> {
    current: TimeState,
    previous: TimeState,
    travel_delay: Duration,
    cooldown: Cooldown,
    observers: Vec<K>,
}

impl<K: Copy + PartialEq + Debug> TimelineClock<K> {
    //--- Construction -----------------------------------------------------

    /// Creates a clock in `Origin` with the given post-travel cooldown.
    pub fn new(travel_delay: Duration) -> Self {
        Self {
            current: TimeState::Origin,
            previous: TimeState::Origin,
            travel_delay,
            cooldown: Cooldown::new(),
            observers: Vec::new(),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn current(&self) -> TimeState {
        self.current
    }

    pub fn previous(&self) -> TimeState {
        self.previous
    }

    pub fn view(&self) -> ClockView {
        ClockView::new(self.current, self.previous)
    }

    /// True while time travel is locked after a transition.
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_active()
    }

    pub fn observers(&self) -> &[K] {
        &self.observers
    }

    //--- Observer Registration --------------------------------------------

    /// Adds an observer. Registering twice keeps a single entry.
    pub fn register_observer(&mut self, observer: K) {
        if !self.observers.contains(&observer) {
            self.observers.push(observer);
        }
    }

    /// Removes an observer. Unknown observers are ignored.
    pub fn unregister_observer(&mut self, observer: K) {
        if let Some(pos) = self.observers.iter().position(|o| *o == observer) {
            self.observers.remove(pos);
        }
    }

    //--- Transitions ------------------------------------------------------

    /// Flips Origin ↔ L1. Returns `false` (and does nothing) during cooldown.
    pub fn toggle_time<H>(&mut self, host: &mut H) -> bool
    where
        H: TimeObserverHost<K>,
    {
        if self.cooldown.is_active() {
            debug!("Time toggle ignored: cooldown active");
            return false;
        }

        self.change_time(self.current.toggled(), host);
        true
    }

    /// Sets the global timeline and runs both notification passes.
    pub fn change_time<H>(&mut self, new_state: TimeState, host: &mut H)
    where
        H: TimeObserverHost<K>,
    {
        self.previous = self.current;
        self.current = new_state;
        info!("Timeline change {} -> {}", self.previous, self.current);

        let view = self.view();
        // Snapshot: observers may unregister themselves while reacting
        let observers = self.observers.clone();

        for observer in &observers {
            host.pre_time_change(*observer, new_state, view);
        }
        for observer in &observers {
            host.on_time_changed(*observer, new_state, view);
        }

        self.cooldown.start(self.travel_delay);
    }

    /// Sends a single observer to `target` without moving the global clock.
    ///
    /// Every observer gets the pre-pass with `target`; the traveller gets
    /// `on_time_changed(target)`; everyone else is told the unchanged
    /// global timeline. Returns `false` during cooldown.
    pub fn request_object_time_travel<H>(
        &mut self,
        traveller: K,
        target: TimeState,
        host: &mut H,
    ) -> bool
    where
        H: TimeObserverHost<K>,
    {
        if self.cooldown.is_active() {
            debug!("Portal trip for {:?} ignored: cooldown active", traveller);
            return false;
        }

        info!("Portal: {:?} travels to {}", traveller, target);
        let view = self.view();

        host.portal_entry(traveller, target, view);

        let observers = self.observers.clone();
        for observer in &observers {
            host.pre_time_change(*observer, target, view);
        }

        host.on_time_changed(traveller, target, view);

        for observer in observers.iter().filter(|o| **o != traveller) {
            host.on_time_changed(*observer, self.current, view);
        }

        true
    }

    //--- Update Loop ------------------------------------------------------

    /// Advances the cooldown. Returns `true` on the tick it is released.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let released = self.cooldown.tick(dt);
        if released {
            debug!("Time travel unlocked");
        }
        released
    }
}

//=========================================================================
// Tests
//=========================================================================
