//=========================================================================
// Doors & Consoles
//=========================================================================
//
// Sliding time door and the card console that drives it.
//
// Door motion:
//   open:  Idle → PreOpen(delay) → Sliding{opening} → snap → Idle
//   close: Idle → Sliding{closing} → snap → PostClose(delay) → Idle
//
// The open state seen in L1 is remembered and restored on every timeline
// crossing. Crossing mid-motion cancels the motion and snaps the leaves
// to the restored state.
//
// Consoles are protectable sinks like doors. A console works in L1, or in
// Origin while protected, and toggles its linked door once a card is in.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::effects::{AudioCue, VisualEffect};
use crate::core::entity::EntityId;
use crate::core::object::ObjectCondition;
use crate::core::time::{Cooldown, TimeState};
use crate::core::world::Stage;

//=== Constants ===========================================================

/// Leaves closer than this to their target snap onto it.
const SNAP_DISTANCE: f32 = 0.01;

//=== DoorMotion ==========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoorMotion {
    Idle,
    /// Waiting before the leaves start to slide open.
    PreOpen { remaining: Duration },
    Sliding { opening: bool },
    /// Settling after the leaves closed.
    PostClose { remaining: Duration },
}

/// What a motion step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoorStep {
    Waiting,
    SlideStarted { opening: bool },
    Moved,
    Settled,
}

//=== TimeDoor ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TimeDoor {
    pub system_id: u32,
    pub phase: usize,
    pub slide_distance: f32,
    pub slide_speed: f32,
    pub pre_open_delay: Duration,
    pub post_close_delay: Duration,
    is_open: bool,
    last_l1_open: bool,
    last_seen: TimeState,
    motion: DoorMotion,
    offset: f32,
}

impl TimeDoor {
    pub fn new(system_id: u32, phase: usize, open: bool) -> Self {
        Self {
            system_id,
            phase,
            slide_distance: 1.0,
            slide_speed: 1.0,
            pre_open_delay: Duration::from_secs(1),
            post_close_delay: Duration::from_millis(500),
            is_open: open,
            last_l1_open: open,
            last_seen: TimeState::Origin,
            motion: DoorMotion::Idle,
            offset: if open { 1.0 } else { 0.0 },
        }
    }

    /// # Panics
    ///
    /// Panics if distance or speed is not positive.
    pub fn with_slide(mut self, distance: f32, speed: f32) -> Self {
        assert!(distance > 0.0 && speed > 0.0, "Door slide must be positive");
        self.slide_distance = distance;
        self.slide_speed = speed;
        self.offset = self.rest_offset();
        self
    }

    pub fn with_delays(mut self, pre_open: Duration, post_close: Duration) -> Self {
        self.pre_open_delay = pre_open;
        self.post_close_delay = post_close;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn last_l1_open(&self) -> bool {
        self.last_l1_open
    }

    pub fn motion(&self) -> DoorMotion {
        self.motion
    }

    /// How far the leaves are slid open.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_busy(&self) -> bool {
        self.motion != DoorMotion::Idle
    }

    fn rest_offset(&self) -> f32 {
        if self.is_open {
            self.slide_distance
        } else {
            0.0
        }
    }

    /// Marks the timeline the door was spawned in.
    pub(crate) fn settle_in(&mut self, state: TimeState) {
        self.last_seen = state;
    }

    /// Stops any motion and puts the leaves where `is_open` says.
    pub fn cancel(&mut self) {
        self.motion = DoorMotion::Idle;
        self.offset = self.rest_offset();
    }

    /// Forces the open state, optionally as the remembered L1 state.
    pub fn set_state(&mut self, open: bool, save_l1: bool) {
        self.is_open = open;
        if save_l1 {
            self.last_l1_open = open;
        }
        if !self.is_busy() {
            self.offset = self.rest_offset();
        }
    }

    fn advance(&mut self, dt: Duration, in_l1: bool) -> DoorStep {
        match self.motion {
            DoorMotion::Idle => DoorStep::Waiting,
            DoorMotion::PreOpen { remaining } if remaining > dt => {
                self.motion = DoorMotion::PreOpen { remaining: remaining - dt };
                DoorStep::Waiting
            }
            DoorMotion::PreOpen { .. } => {
                self.motion = DoorMotion::Sliding { opening: true };
                DoorStep::SlideStarted { opening: true }
            }
            DoorMotion::Sliding { opening } => {
                let target = if opening { self.slide_distance } else { 0.0 };
                let step = self.slide_speed * dt.as_secs_f32();
                let gap = target - self.offset;

                if gap.abs() <= step || (gap.abs() - step) <= SNAP_DISTANCE {
                    self.offset = target;
                    self.is_open = opening;
                    if in_l1 {
                        self.last_l1_open = opening;
                    }
                    self.motion = if opening {
                        DoorMotion::Idle
                    } else {
                        DoorMotion::PostClose { remaining: self.post_close_delay }
                    };
                } else {
                    self.offset += step * gap.signum();
                }
                DoorStep::Moved
            }
            DoorMotion::PostClose { remaining } if remaining > dt => {
                self.motion = DoorMotion::PostClose { remaining: remaining - dt };
                DoorStep::Waiting
            }
            DoorMotion::PostClose { .. } => {
                self.motion = DoorMotion::Idle;
                DoorStep::Settled
            }
        }
    }

    /// Restores the remembered L1 state when the timeline actually flips.
    fn cross_to(&mut self, new_state: TimeState) -> bool {
        if new_state == self.last_seen {
            return false;
        }
        self.last_seen = new_state;
        self.is_open = self.last_l1_open;
        self.cancel();
        true
    }
}

//=== ConsoleScreen =======================================================

/// Material state of a console screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleScreen {
    #[default]
    Off,
    /// Working, waiting for a card.
    OnNeed,
    /// Working, card inserted.
    Ready,
    /// Just toggled its door.
    Open,
    /// Used without a card.
    Denied,
}

//=== CardConsole =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CardConsole {
    pub system_id: u32,
    pub phase: usize,
    pub linked_door: Option<EntityId>,
    pub use_cooldown: Duration,
    pub denied_duration: Duration,
    card: Option<EntityId>,
    cooldown: Cooldown,
    screen: ConsoleScreen,
}

impl CardConsole {
    pub fn new(system_id: u32, phase: usize, linked_door: Option<EntityId>) -> Self {
        Self {
            system_id,
            phase,
            linked_door,
            use_cooldown: Duration::from_secs(2),
            denied_duration: Duration::from_secs(1),
            card: None,
            cooldown: Cooldown::new(),
            screen: ConsoleScreen::Off,
        }
    }

    pub fn card(&self) -> Option<EntityId> {
        self.card
    }

    pub fn screen(&self) -> ConsoleScreen {
        self.screen
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown.is_active()
    }
}

//=== Stage: door operations ==============================================

impl Stage {
    fn door_mut(&mut self, id: EntityId) -> Option<&mut TimeDoor> {
        self.entities.get_mut(id).and_then(|e| e.door.as_mut())
    }

    fn condition_of(&self, id: EntityId) -> ObjectCondition {
        self.entities
            .get(id)
            .and_then(|e| e.object.as_ref())
            .map(|o| o.condition())
            .unwrap_or_default()
    }

    /// Working doors open anywhere; protected doors also open in Origin.
    pub(crate) fn door_can_be_opened(&self, id: EntityId) -> bool {
        let condition = self.condition_of(id);
        (self.current() == TimeState::Origin && condition.is_protected()) || !condition.is_broken()
    }

    /// Starts opening. Returns `false` if open, moving or not openable.
    pub(crate) fn open_door(&mut self, id: EntityId) -> bool {
        let openable = self.door_can_be_opened(id);
        let Some(door) = self.door_mut(id) else {
            return false;
        };
        if door.is_open || door.is_busy() || !openable {
            debug!("Door {} refused to open", id);
            return false;
        }

        door.motion = DoorMotion::PreOpen { remaining: door.pre_open_delay };
        true
    }

    /// Starts closing. Returns `false` if closed or moving.
    pub(crate) fn close_door(&mut self, id: EntityId) -> bool {
        let Some(door) = self.door_mut(id) else {
            return false;
        };
        if !door.is_open || door.is_busy() {
            return false;
        }

        door.motion = DoorMotion::Sliding { opening: false };
        self.bus.publish(AudioCue::DoorClosing { door: id });
        true
    }

    pub(crate) fn toggle_door(&mut self, id: EntityId) -> bool {
        match self.entities.get(id).and_then(|e| e.door.as_ref()) {
            Some(door) if door.is_open => self.close_door(id),
            Some(_) => self.open_door(id),
            None => false,
        }
    }

    pub(crate) fn set_door_state(&mut self, id: EntityId, open: bool, save_l1: bool) {
        if let Some(door) = self.door_mut(id) {
            door.set_state(open, save_l1);
            self.refresh_door_leaves(id);
        }
    }

    pub(crate) fn tick_doors(&mut self, dt: Duration) {
        let in_l1 = self.current() == TimeState::L1;
        let doors: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, e)| e.door.as_ref().is_some_and(TimeDoor::is_busy))
            .map(|(id, _)| id)
            .collect();

        for id in doors {
            let Some(step) = self.door_mut(id).map(|d| d.advance(dt, in_l1)) else {
                continue;
            };
            match step {
                DoorStep::SlideStarted { opening: true } => {
                    self.bus.publish(AudioCue::DoorOpening { door: id });
                }
                DoorStep::Moved => self.refresh_door_leaves(id),
                DoorStep::Settled => debug!("Door {} settled", id),
                DoorStep::SlideStarted { opening: false } | DoorStep::Waiting => {}
            }
        }
    }

    pub(crate) fn door_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        let Some(door) = self.door_mut(id) else {
            return;
        };
        if door.cross_to(new_state) {
            debug!("Door {} restored to open={}", id, door.is_open);
        }
        self.refresh_door_leaves(id);
    }

    /// Reports which leaves are shown and how far they are open.
    pub(crate) fn refresh_door_leaves(&mut self, id: EntityId) {
        let l1_variant = self.current() == TimeState::L1 || self.is_protected(id);
        let Some(offset) = self.entities.get(id).and_then(|e| e.door.as_ref()).map(TimeDoor::offset)
        else {
            return;
        };
        self.bus.publish(VisualEffect::DoorLeaves { entity: id, l1_variant, offset });
    }

    //--- Consoles ---------------------------------------------------------

    fn console_mut(&mut self, id: EntityId) -> Option<&mut CardConsole> {
        self.entities.get_mut(id).and_then(|e| e.console.as_mut())
    }

    pub(crate) fn console_operational(&self, id: EntityId) -> bool {
        match self.current() {
            TimeState::L1 => true,
            TimeState::Origin => self.is_protected(id),
        }
    }

    fn set_screen(&mut self, id: EntityId, screen: ConsoleScreen) {
        if let Some(console) = self.console_mut(id) {
            if console.screen != screen {
                console.screen = screen;
                self.bus.publish(VisualEffect::ConsoleScreen { entity: id, screen });
            }
        }
    }

    pub(crate) fn rest_screen(&mut self, id: EntityId) {
        let condition = self.condition_of(id);
        let has_card = self.entities.get(id).and_then(|e| e.console.as_ref()).is_some_and(|c| c.card.is_some());

        let screen = if condition.is_broken() || !self.console_operational(id) {
            ConsoleScreen::Off
        } else if has_card {
            ConsoleScreen::Ready
        } else {
            ConsoleScreen::OnNeed
        };
        self.set_screen(id, screen);
    }

    /// Locks `card` into the console. Returns `false` if refused.
    pub(crate) fn insert_card(&mut self, id: EntityId, card: EntityId) -> bool {
        if self.condition_of(card).is_broken() {
            debug!("Console {} refused broken card {}", id, card);
            return false;
        }
        if !self.console_operational(id) {
            return false;
        }
        let Some(slot) = self.entities.get(id).map(|e| e.pose) else {
            return false;
        };
        let Some(console) = self.console_mut(id) else {
            return false;
        };
        if console.card.is_some() {
            return false;
        }
        console.card = Some(card);

        if let Some(body) = self.entities.get_mut(card).and_then(|e| e.body.as_mut()) {
            body.freeze();
        }
        self.move_to(card, slot);
        self.set_screen(id, ConsoleScreen::Ready);
        true
    }

    /// Toggles the linked door if the console works and holds a card.
    pub(crate) fn interact_console(&mut self, id: EntityId) {
        let broken = self.condition_of(id).is_broken();
        let operational = self.console_operational(id);
        let Some(console) = self.console_mut(id) else {
            return;
        };
        if console.cooldown.is_active() || broken || !operational {
            return;
        }

        if console.card.is_none() {
            let denied = console.denied_duration;
            console.cooldown.start(denied);
            self.set_screen(id, ConsoleScreen::Denied);
            return;
        }

        let Some(door) = console.linked_door else {
            warn!("Console {} has no linked door", id);
            return;
        };
        let cooldown = console.use_cooldown;
        console.cooldown.start(cooldown);
        self.set_screen(id, ConsoleScreen::Open);
        self.toggle_door(door);
    }

    pub(crate) fn tick_consoles(&mut self, dt: Duration) {
        let expired: Vec<EntityId> = self
            .entities
            .ids()
            .into_iter()
            .filter(|id| self.console_mut(*id).is_some_and(|c| c.cooldown.tick(dt)))
            .collect();

        for id in expired {
            self.rest_screen(id);
        }
    }

    pub(crate) fn console_on_time_changed(&mut self, id: EntityId) {
        let Some(console) = self.console_mut(id) else {
            return;
        };
        console.cooldown.cancel();
        self.rest_screen(id);
    }
}

//=========================================================================
// Tests
//=========================================================================
