//=========================================================================
// World Configuration
//=========================================================================
//
// Tunables for timing, ranges and thresholds.
//
// Defaults mirror the values the game shipped with. Setters validate
// their input and panic on nonsense, as the engine builder does.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== WorldConfig =========================================================

/// Timing and range settings shared by every system in a world.
///
/// # Default Values
///
/// - **Time travel cooldown**: 3.0 s
/// - **Drop notification delay**: 0.3 s
/// - **Holder ready delay / disconnect cooldown**: 0.5 s / 1.0 s
/// - **Shield reattach cooldown**: 1.5 s
/// - **Inspect / interact range**: 3.0 / 2.5
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use timeshift_engine::core::WorldConfig;
///
/// let config = WorldConfig::new()
///     .with_time_travel_delay(Duration::from_secs(1))
///     .with_ranges(4.0, 2.0);
/// assert_eq!(config.inspect_range, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Lock on toggling time after a global transition.
    pub time_travel_delay: Duration,

    /// Delay between releasing a pickable and notifying its twin link.
    pub drop_notify_delay: Duration,

    /// Holder refuses a new shield for this long after accepting one.
    pub holder_ready_delay: Duration,

    /// Holder refuses a new shield for this long after a time-travel detach.
    pub holder_disconnect_cooldown: Duration,

    /// Shield refuses to attach for this long after a manual detach.
    pub shield_reattach_cooldown: Duration,

    /// A shield further than this from its socket is detached on entering L1.
    pub socket_detach_threshold: f32,

    /// Camera distance within which the inspect icon shows.
    pub inspect_range: f32,

    /// Camera distance within which interact/grab icons show.
    pub interact_range: f32,

    /// Popup stays up this long after focus is lost.
    pub popup_hide_delay: Duration,

    /// Squared distance the past half must move before it dictates the present.
    pub past_move_sq_threshold: f32,

    /// Rotation (degrees) the past half must turn before it dictates the present.
    pub past_turn_threshold: f32,
}

impl WorldConfig {
    pub fn new() -> Self {
        Self {
            time_travel_delay: Duration::from_secs(3),
            drop_notify_delay: Duration::from_millis(300),
            holder_ready_delay: Duration::from_millis(500),
            holder_disconnect_cooldown: Duration::from_secs(1),
            shield_reattach_cooldown: Duration::from_millis(1500),
            socket_detach_threshold: 0.2,
            inspect_range: 3.0,
            interact_range: 2.5,
            popup_hide_delay: Duration::from_secs(1),
            past_move_sq_threshold: 0.0004,
            past_turn_threshold: 0.5,
        }
    }

    pub fn with_time_travel_delay(mut self, delay: Duration) -> Self {
        self.time_travel_delay = delay;
        self
    }

    pub fn with_drop_notify_delay(mut self, delay: Duration) -> Self {
        self.drop_notify_delay = delay;
        self
    }

    pub fn with_holder_timing(mut self, ready: Duration, disconnect_cooldown: Duration) -> Self {
        self.holder_ready_delay = ready;
        self.holder_disconnect_cooldown = disconnect_cooldown;
        self
    }

    pub fn with_shield_reattach_cooldown(mut self, cooldown: Duration) -> Self {
        self.shield_reattach_cooldown = cooldown;
        self
    }

    /// Sets inspect and interact ranges.
    ///
    /// # Panics
    ///
    /// Panics if either range is negative.
    pub fn with_ranges(mut self, inspect: f32, interact: f32) -> Self {
        assert!(inspect >= 0.0 && interact >= 0.0, "Ranges must be non-negative");
        self.inspect_range = inspect;
        self.interact_range = interact;
        self
    }

    /// # Panics
    ///
    /// Panics if the threshold is negative.
    pub fn with_socket_detach_threshold(mut self, threshold: f32) -> Self {
        assert!(threshold >= 0.0, "Socket threshold must be non-negative");
        self.socket_detach_threshold = threshold;
        self
    }

    pub fn with_popup_hide_delay(mut self, delay: Duration) -> Self {
        self.popup_hide_delay = delay;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
