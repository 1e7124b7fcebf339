//=========================================================================
// Shield Holder
//=========================================================================
//
// Socket that powers a system while a shield is plugged in.
//
// Architecture:
//   attach   → protect defaults + power main switch → not ready (0.5 s)
//   detach   → withdraw power
//              └─ caused by time travel → cooldown (1.0 s)
//   enter L1 → shield saved away from socket → time-travel detach
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::effects::AudioCue;
use crate::core::entity::EntityId;
use crate::core::math::Pose;
use crate::core::time::TimeState;
use crate::core::world::{Stage, TimedAction};

//=== HolderShield ========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct HolderShield {
    pub system_id: u32,
    pub default_protection: Vec<EntityId>,
    pub main_switch: Option<EntityId>,
    /// Where an attached shield sits.
    pub socket: Pose,
    shield: Option<EntityId>,
    ready: bool,
    cooling_down: bool,
}

impl HolderShield {
    pub fn new(system_id: u32, socket: Pose) -> Self {
        Self {
            system_id,
            default_protection: Vec::new(),
            main_switch: None,
            socket,
            shield: None,
            ready: true,
            cooling_down: false,
        }
    }

    pub fn with_main_switch(mut self, switch: EntityId) -> Self {
        self.main_switch = Some(switch);
        self
    }

    pub fn with_default_protection(mut self, sinks: Vec<EntityId>) -> Self {
        self.default_protection = sinks;
        self
    }

    pub fn shield(&self) -> Option<EntityId> {
        self.shield
    }

    pub fn has_shield(&self) -> bool {
        self.shield.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    pub fn can_accept(&self) -> bool {
        self.ready && self.shield.is_none() && !self.cooling_down
    }
}

//=== Stage: holder operations ============================================

impl Stage {
    fn holder_mut(&mut self, id: EntityId) -> Option<&mut HolderShield> {
        self.entities.get_mut(id).and_then(|e| e.holder.as_mut())
    }

    pub(crate) fn holder_can_accept(&self, id: EntityId) -> bool {
        self.entities
            .get(id)
            .and_then(|e| e.holder.as_ref())
            .is_some_and(HolderShield::can_accept)
    }

    /// Protects or releases the default sinks and drives the main switch.
    pub(crate) fn holder_power(&mut self, id: EntityId, on: bool) {
        let Some(holder) = self.holder_mut(id) else {
            return;
        };
        let sinks = holder.default_protection.clone();
        let main = holder.main_switch;

        for sink in sinks {
            if !self.entities.contains(sink) {
                warn!("Holder {} protects missing sink {}", id, sink);
                continue;
            }
            self.set_protected(sink, on);
        }
        if let Some(main) = main {
            self.set_switch_powered(main, on, None);
        }
    }

    pub(crate) fn on_shield_attached(&mut self, id: EntityId, shield: EntityId) {
        let delay = self.config.holder_ready_delay;
        let Some(holder) = self.holder_mut(id) else {
            warn!("Shield {} attached to {} which is not a holder", shield, id);
            return;
        };
        holder.shield = Some(shield);
        holder.ready = false;
        debug!("Holder {} received shield {}", id, shield);

        self.holder_power(id, true);
        self.bus.publish(AudioCue::ShieldInserted { holder: id });
        self.scheduler.schedule(delay, TimedAction::HolderReady(id));
    }

    pub(crate) fn on_shield_detached(&mut self, id: EntityId, time_travel: bool) {
        self.holder_power(id, false);

        let cooldown = self.config.holder_disconnect_cooldown;
        let Some(holder) = self.holder_mut(id) else {
            return;
        };
        holder.shield = None;
        debug!("Holder {} lost its shield (time travel: {})", id, time_travel);

        if time_travel {
            holder.cooling_down = true;
            self.bus.publish(AudioCue::ShieldTimeDisconnect { holder: id });
            self.scheduler.schedule(cooldown, TimedAction::HolderCooldownEnd(id));
        }
    }

    pub(crate) fn holder_ready(&mut self, id: EntityId) {
        if let Some(holder) = self.holder_mut(id) {
            holder.ready = true;
        }
    }

    pub(crate) fn holder_cooldown_end(&mut self, id: EntityId) {
        if let Some(holder) = self.holder_mut(id) {
            holder.cooling_down = false;
        }
    }

    /// Adds a sink the holder protects. Applies at once while a shield is in.
    pub(crate) fn add_to_default_protection(&mut self, id: EntityId, sink: EntityId) {
        let Some(holder) = self.holder_mut(id) else {
            return;
        };
        if holder.default_protection.contains(&sink) {
            return;
        }
        holder.default_protection.push(sink);

        if holder.has_shield() {
            self.set_protected(sink, true);
        }
    }

    /// Unplugs a shield whose L1 position drifted off the socket.
    pub(crate) fn holder_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        if new_state != TimeState::L1 {
            return;
        }
        let Some(holder) = self.entities.get(id).and_then(|e| e.holder.as_ref()) else {
            return;
        };
        let Some(shield) = holder.shield else {
            return;
        };
        let socket = holder.socket.position;

        let Some(saved) = self
            .entities
            .get(shield)
            .and_then(|e| e.object.as_ref())
            .map(|o| o.last_l1_pose().position)
        else {
            warn!("Holder {} references missing shield {}", id, shield);
            return;
        };

        if saved.distance(socket) > self.config.socket_detach_threshold {
            debug!("Shield {} was not in holder {} in L1", shield, id);
            self.detach_shield(shield, true);
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
