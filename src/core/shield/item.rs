//=========================================================================
// Shield Item
//=========================================================================
//
// Pickable shield that plugs into a holder.
//
// Architecture:
//   attach_shield(shield, holder)
//     ├─ drop from hand, snap to socket, go kinematic
//     ├─ switch the protective zone off (unless it is kept)
//     └─ holder powers its system
//
//   detach_shield(shield, time_travel)
//     ├─ holder withdraws power
//     ├─ dynamic again, zone back on
//     └─ manual detach → not ready to attach for a while
//
// Shields never break and never take protection.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::time::TimeState;
use crate::core::world::{Stage, TimedAction};

//=== ShieldItem ==========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldItem {
    pub zone: Option<EntityId>,
    /// Keep the zone running while plugged in.
    pub maintain_effect: bool,
    holder: Option<EntityId>,
    ready_to_attach: bool,
}

impl ShieldItem {
    pub fn new(zone: Option<EntityId>) -> Self {
        Self { zone, maintain_effect: false, holder: None, ready_to_attach: true }
    }

    pub fn holder(&self) -> Option<EntityId> {
        self.holder
    }

    pub fn is_in_panel(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_ready_to_attach(&self) -> bool {
        self.ready_to_attach
    }
}

//=== Stage: shield operations ============================================

impl Stage {
    fn shield_mut(&mut self, id: EntityId) -> Option<&mut ShieldItem> {
        self.entities.get_mut(id).and_then(|e| e.shield.as_mut())
    }

    /// Plugs `shield` into `holder`. Returns `false` if either refuses.
    pub(crate) fn attach_shield(&mut self, shield: EntityId, holder: EntityId) -> bool {
        let can_accept = self.holder_can_accept(holder);
        let Some(socket) = self.entities.get(holder).and_then(|e| e.holder.as_ref()).map(|h| h.socket)
        else {
            warn!("{} is not a holder", holder);
            return false;
        };
        let Some(item) = self.shield_mut(shield) else {
            warn!("{} is not a shield", shield);
            return false;
        };
        if !item.ready_to_attach || item.holder.is_some() || !can_accept {
            debug!("Shield {} cannot attach to {}", shield, holder);
            return false;
        }
        item.holder = Some(holder);
        let (zone, keep_zone) = (item.zone, item.maintain_effect);

        if self.entities.get(shield).is_some_and(|e| e.is_held()) {
            self.force_release(shield);
        }

        self.move_to(shield, socket);
        if let Some(body) = self.entities.get_mut(shield).and_then(|e| e.body.as_mut()) {
            body.kinematic = true;
            body.clear_velocity();
        }

        if !keep_zone {
            if let Some(zone) = zone {
                self.set_zone_active(zone, false);
            }
        }

        if self.current() == TimeState::L1 {
            if let Some(object) = self.entities.get_mut(shield).and_then(|e| e.object.as_mut()) {
                object.save_l1_pose(socket);
            }
        }

        self.on_shield_attached(holder, shield);
        true
    }

    /// Unplugs `shield`. A manual detach starts the reattach cooldown.
    pub(crate) fn detach_shield(&mut self, shield: EntityId, time_travel: bool) {
        let delay = self.config.shield_reattach_cooldown;
        let Some(item) = self.shield_mut(shield) else {
            return;
        };
        let Some(holder) = item.holder.take() else {
            return;
        };
        let zone = item.zone;
        if !time_travel {
            item.ready_to_attach = false;
        }

        self.on_shield_detached(holder, time_travel);

        if let Some(body) = self.entities.get_mut(shield).and_then(|e| e.body.as_mut()) {
            body.kinematic = false;
        }
        if let Some(zone) = zone {
            self.set_zone_active(zone, true);
        }
        if !time_travel {
            self.scheduler.schedule(delay, TimedAction::ShieldReattachReady(shield));
        }
    }

    pub(crate) fn shield_reattach_ready(&mut self, shield: EntityId) {
        if let Some(item) = self.shield_mut(shield) {
            item.ready_to_attach = true;
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
