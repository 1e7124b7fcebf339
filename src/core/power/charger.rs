//=========================================================================
// Battery Charger
//=========================================================================
//
// Socket that charges one battery at a time.
//
// Architecture:
//   insert  → drop from hand, snap to socket, position saving off
//             └─ intact battery → light ready + charge timer (3 s)
//   charged → battery charged unless broken by then
//   remove  → stop charging, dynamic again, light open, cooldown (1.5 s)
//   any crossing → battery saved away from socket in L1 → remove
//
//   Origin-native battery halves lose their charge entering Origin
//   unprotected.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::effects::VisualEffect;
use crate::core::entity::EntityId;
use crate::core::math::Pose;
use crate::core::time::TimeState;
use crate::core::world::{Stage, TimedAction};

//=== TimeCharger =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TimeCharger {
    /// Where an inserted battery sits.
    pub socket: Pose,
    pub charge_time: Duration,
    pub cooldown: Duration,
    battery: Option<EntityId>,
    charging: bool,
    cooling_down: bool,
}

impl TimeCharger {
    pub fn new(socket: Pose) -> Self {
        Self {
            socket,
            charge_time: Duration::from_secs(3),
            cooldown: Duration::from_millis(1500),
            battery: None,
            charging: false,
            cooling_down: false,
        }
    }

    pub fn with_timing(mut self, charge_time: Duration, cooldown: Duration) -> Self {
        self.charge_time = charge_time;
        self.cooldown = cooldown;
        self
    }

    pub fn battery(&self) -> Option<EntityId> {
        self.battery
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    pub fn can_accept(&self) -> bool {
        self.battery.is_none() && !self.cooling_down
    }

    /// Status line for the inspection text.
    pub fn status(&self, broken: bool) -> &'static str {
        match (self.battery.is_some(), broken) {
            (true, true) => "It has a battery inserted but it's not charging because the charger is broken.",
            (true, false) => "The charger is currently charging a battery.",
            (false, true) => "It is useless.",
            (false, false) => "The charger is ready to receive a battery.",
        }
    }
}

//=== TimeBattery =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBattery {
    pub charged_description: String,
    pub drained_description: String,
    charged: bool,
    charger: Option<EntityId>,
}

impl TimeBattery {
    pub fn new() -> Self {
        Self {
            charged_description: "The battery is fully charged and ready to use.".into(),
            drained_description: "The battery is drained. It needs recharging.".into(),
            charged: false,
            charger: None,
        }
    }

    /// A battery that starts out full.
    pub fn charged() -> Self {
        Self { charged: true, ..Self::new() }
    }

    pub fn is_charged(&self) -> bool {
        self.charged
    }

    pub fn charger(&self) -> Option<EntityId> {
        self.charger
    }

    /// Usable as a power source: charged and intact.
    pub fn is_functional(&self, broken: bool) -> bool {
        self.charged && !broken
    }

    pub fn status(&self) -> &str {
        if self.charged {
            &self.charged_description
        } else {
            &self.drained_description
        }
    }
}

impl Default for TimeBattery {
    fn default() -> Self {
        Self::new()
    }
}

//=== Stage: charger operations ===========================================

impl Stage {
    fn charger_mut(&mut self, id: EntityId) -> Option<&mut TimeCharger> {
        self.entities.get_mut(id).and_then(|e| e.charger.as_mut())
    }

    fn battery_mut(&mut self, id: EntityId) -> Option<&mut TimeBattery> {
        self.entities.get_mut(id).and_then(|e| e.battery.as_mut())
    }

    fn is_broken(&self, id: EntityId) -> bool {
        self.entities
            .get(id)
            .and_then(|e| e.object.as_ref())
            .is_some_and(|o| o.condition().is_broken())
    }

    fn set_charged(&mut self, battery: EntityId, charged: bool) {
        let Some(item) = self.battery_mut(battery) else {
            return;
        };
        if item.charged != charged {
            item.charged = charged;
            self.bus.publish(VisualEffect::BatteryCharge { entity: battery, charged });
        }
    }

    /// Locks `battery` into `charger`. Returns `false` if either refuses.
    pub(crate) fn insert_battery(&mut self, charger: EntityId, battery: EntityId) -> bool {
        let Some(device) = self.entities.get(charger).and_then(|e| e.charger.as_ref()) else {
            warn!("{} is not a charger", charger);
            return false;
        };
        let (socket, charge_time, can_accept) = (device.socket, device.charge_time, device.can_accept());
        let Some(item) = self.battery_mut(battery) else {
            warn!("{} is not a battery", battery);
            return false;
        };
        if item.charger.is_some() || !can_accept {
            debug!("Battery {} cannot go into charger {}", battery, charger);
            return false;
        }
        item.charger = Some(charger);

        if self.entities.get(battery).is_some_and(|e| e.is_held()) {
            self.force_release(battery);
        }

        self.move_to(battery, socket);
        let current = self.current();
        if let Some(entity) = self.entities.get_mut(battery) {
            if let Some(body) = entity.body.as_mut() {
                body.kinematic = true;
                body.clear_velocity();
            }
            if let Some(object) = entity.object.as_mut() {
                object.set_position_saving(false);
                if current == TimeState::L1 {
                    object.save_l1_pose(socket);
                }
            }
        }

        let intact = !self.is_broken(battery);
        if let Some(device) = self.charger_mut(charger) {
            device.battery = Some(battery);
            device.charging = intact;
        }
        debug!("Charger {} received battery {} (charging: {})", charger, battery, intact);

        if intact {
            self.bus.publish(VisualEffect::ChargerLight { entity: charger, ready: true });
            self.scheduler.schedule(charge_time, TimedAction::ChargeComplete(charger));
        }
        true
    }

    /// Releases the inserted battery, if any, and starts the cooldown.
    pub(crate) fn remove_battery(&mut self, charger: EntityId) {
        let Some(device) = self.charger_mut(charger) else {
            return;
        };
        let Some(battery) = device.battery.take() else {
            return;
        };
        device.charging = false;
        device.cooling_down = true;
        let cooldown = device.cooldown;

        self.scheduler
            .cancel_where(|a| *a == TimedAction::ChargeComplete(charger));

        if let Some(entity) = self.entities.get_mut(battery) {
            if let Some(item) = entity.battery.as_mut() {
                item.charger = None;
            }
            if let Some(body) = entity.body.as_mut() {
                body.kinematic = false;
            }
            if let Some(object) = entity.object.as_mut() {
                object.set_position_saving(true);
            }
        }
        debug!("Charger {} released battery {}", charger, battery);

        self.bus.publish(VisualEffect::ChargerLight { entity: charger, ready: false });
        self.scheduler.schedule(cooldown, TimedAction::ChargerCooldownEnd(charger));
    }

    pub(crate) fn charge_complete(&mut self, charger: EntityId) {
        let Some(device) = self.charger_mut(charger) else {
            return;
        };
        if !device.charging {
            return;
        }
        device.charging = false;
        let Some(battery) = device.battery else {
            return;
        };

        if self.is_broken(battery) {
            debug!("Battery {} broke while charging in {}", battery, charger);
            return;
        }
        self.set_charged(battery, true);
    }

    pub(crate) fn charger_cooldown_end(&mut self, charger: EntityId) {
        if let Some(device) = self.charger_mut(charger) {
            device.cooling_down = false;
        }
    }

    /// Releases a battery whose L1 position drifted off the socket.
    pub(crate) fn charger_on_time_changed(&mut self, id: EntityId) {
        let Some(device) = self.entities.get(id).and_then(|e| e.charger.as_ref()) else {
            return;
        };
        let Some(battery) = device.battery else {
            return;
        };
        let socket = device.socket.position;

        let Some(saved) = self
            .entities
            .get(battery)
            .and_then(|e| e.object.as_ref())
            .map(|o| o.last_l1_pose().position)
        else {
            warn!("Charger {} references missing battery {}", id, battery);
            return;
        };

        if saved.distance(socket) > self.config.socket_detach_threshold {
            debug!("Battery {} was not in charger {} in L1", battery, id);
            self.remove_battery(id);
        }
    }

    /// Origin-native battery halves drain when Origin arrives unprotected.
    pub(crate) fn battery_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        if entity.battery.is_none() || new_state != TimeState::Origin {
            return;
        }
        let origin_half = entity.twin.as_ref().is_some_and(|t| t.native == TimeState::Origin);
        if origin_half && !entity.is_protected() {
            self.set_charged(id, false);
        }
    }

    /// Status line appended to a charger's or battery's description.
    pub(crate) fn device_status(&self, id: EntityId) -> Option<&str> {
        let entity = self.entities.get(id)?;
        if let Some(device) = entity.charger.as_ref() {
            return Some(device.status(self.is_broken(id)));
        }
        entity.battery.as_ref().map(TimeBattery::status)
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_charger_accepts() {
        let c = TimeCharger::new(Pose::default());
        assert!(c.can_accept());
        assert_eq!(c.charge_time, Duration::from_secs(3));
        assert_eq!(c.cooldown, Duration::from_millis(1500));
    }

    #[test]
    fn busy_or_cooling_charger_refuses() {
        let mut c = TimeCharger::new(Pose::default());
        c.cooling_down = true;
        assert!(!c.can_accept());

        c.cooling_down = false;
        c.battery = Some(EntityId::from_raw(2));
        assert!(!c.can_accept());
    }

    #[test]
    fn charger_status_follows_battery_and_condition() {
        let mut c = TimeCharger::new(Pose::default());
        assert_eq!(c.status(false), "The charger is ready to receive a battery.");
        assert_eq!(c.status(true), "It is useless.");

        c.battery = Some(EntityId::from_raw(2));
        assert_eq!(c.status(false), "The charger is currently charging a battery.");
        assert!(c.status(true).contains("not charging"));
    }

    #[test]
    fn broken_battery_is_not_functional() {
        let b = TimeBattery::charged();
        assert!(b.is_functional(false));
        assert!(!b.is_functional(true));
        assert!(!TimeBattery::new().is_functional(false));
        assert_eq!(TimeBattery::new().status(), "The battery is drained. It needs recharging.");
    }
}
