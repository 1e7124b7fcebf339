//=========================================================================
// Holding, Focus & Timers
//=========================================================================
//
// Stage operations driven by the player's hand and gaze, and the
// dispatcher for delayed actions.
//
// Architecture:
//   grab ──→ cancel pending drop notice ──→ leave socket ──→ twin.notify_grabbed
//   drop ──→ object.release ──→ (drop delay) ──→ twin.notify_dropped
//
//   focus   ──→ highlight + popup shown (cancels pending hide)
//   unfocus ──→ highlight off + popup hidden after a delay
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::stage::{Stage, TimedAction};
use crate::core::entity::{Entity, EntityId};
use crate::core::math::Vec3;

//=== Stage: holding ======================================================

impl Stage {
    /// Puts the entity in the player's hand. Returns `false` if it is not
    /// pickable or already held.
    pub(crate) fn grab(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            return false;
        };
        if entity.pickable.is_none() || entity.is_held() {
            return false;
        }
        let socketed = entity.shield.as_ref().is_some_and(|s| s.is_in_panel());
        let charger = entity.battery.as_ref().and_then(|b| b.charger());

        self.scheduler
            .cancel_where(|a| *a == TimedAction::NotifyTwinDropped(id));

        if socketed {
            self.detach_shield(id, false);
        }
        if let Some(charger) = charger {
            self.remove_battery(charger);
        }

        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        if let Some(pickable) = entity.pickable.as_mut() {
            pickable.held = true;
        }
        if let Some(body) = entity.body.as_mut() {
            body.kinematic = true;
            body.clear_velocity();
        }
        let hide = entity.object.as_mut().is_some_and(|o| o.request_popup_hide());
        let twinned = entity.twin.is_some();
        debug!("{} grabbed", id);

        if hide {
            let delay = self.config.popup_hide_delay;
            self.scheduler.schedule(delay, TimedAction::HidePopup(id));
        }
        if twinned {
            self.notify_grabbed(id);
        }
        true
    }

    /// Lets go of the entity. The twin link hears about it after the
    /// drop delay. Returns `false` if it was not held.
    pub(crate) fn drop_held(&mut self, id: EntityId) -> bool {
        let current = self.current();
        let delay = self.config.drop_notify_delay;
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        if !entity.is_held() {
            return false;
        }

        if let Some(pickable) = entity.pickable.as_mut() {
            pickable.held = false;
        }
        if let Some(body) = entity.body.as_mut() {
            body.release();
        }

        let look = Self::look_of(entity, id);
        let twinned = entity.twin.is_some();
        if let Some(object) = entity.object.as_mut() {
            object.release(look, current, &mut self.bus);
        }
        debug!("{} dropped", id);

        if twinned {
            self.scheduler.schedule(delay, TimedAction::NotifyTwinDropped(id));
        }
        true
    }

    /// Drops the entity if it is in a hand, for devices that take it over.
    pub(crate) fn force_release(&mut self, id: EntityId) {
        if self.drop_held(id) {
            debug!("{} forced out of the hand", id);
        }
    }

    /// Drops a held entity that ended up too far from the hand.
    pub(crate) fn force_drop_if_out_of_reach(&mut self, id: EntityId, hand: Vec3) -> bool {
        let out = self.entities.get(id).is_some_and(|e| {
            e.is_held() && e.pickable.as_ref().is_some_and(|p| p.out_of_reach(e.pose.position, hand))
        });
        out && self.drop_held(id)
    }

    //--- Focus & Popup ----------------------------------------------------

    fn camera_distance(&self, entity: &Entity) -> Option<f32> {
        self.camera.map(|c| c.distance(entity.pose.position))
    }

    pub(crate) fn focus(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let distance = self.camera.map(|c| c.distance(entity.pose.position));
        let Some(object) = entity.object.as_mut() else {
            return;
        };

        object.focus(id, &mut self.bus);
        let cancel_hide = match distance {
            Some(d) => object.show_popup(id, d, &self.config, &mut self.bus),
            None => false,
        };
        if cancel_hide {
            self.scheduler.cancel_where(|a| *a == TimedAction::HidePopup(id));
        }
    }

    pub(crate) fn unfocus(&mut self, id: EntityId) {
        let Some(object) = self.entities.get_mut(id).and_then(|e| e.object.as_mut()) else {
            return;
        };

        object.unfocus(id, &mut self.bus);
        if object.request_popup_hide() {
            let delay = self.config.popup_hide_delay;
            self.scheduler.schedule(delay, TimedAction::HidePopup(id));
        }
    }

    /// Re-evaluates every visible popup against the camera.
    pub(crate) fn refresh_popups(&mut self) {
        let tracked: Vec<(EntityId, f32)> = self
            .entities
            .iter()
            .filter(|(_, e)| e.object.as_ref().is_some_and(|o| o.popup().is_active()))
            .filter_map(|(id, e)| self.camera_distance(e).map(|d| (id, d)))
            .collect();

        for (id, distance) in tracked {
            if let Some(object) = self.entities.get_mut(id).and_then(|e| e.object.as_mut()) {
                object.refresh_popup(id, distance, &self.config, &mut self.bus);
            }
        }
    }

    //--- Timed Actions ----------------------------------------------------

    pub(crate) fn run_timed(&mut self, action: TimedAction) {
        match action {
            TimedAction::NotifyTwinDropped(id) => self.notify_dropped(id),
            TimedAction::HolderReady(id) => self.holder_ready(id),
            TimedAction::HolderCooldownEnd(id) => self.holder_cooldown_end(id),
            TimedAction::ShieldReattachReady(id) => self.shield_reattach_ready(id),
            TimedAction::ChargeComplete(id) => self.charge_complete(id),
            TimedAction::ChargerCooldownEnd(id) => self.charger_cooldown_end(id),
            TimedAction::HidePopup(id) => {
                if let Some(object) = self.entities.get_mut(id).and_then(|e| e.object.as_mut()) {
                    object.hide_popup(id, &mut self.bus);
                }
            }
        }
    }
}
