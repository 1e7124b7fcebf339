//=========================================================================
// Stage
//=========================================================================
//
// Shared data every system operates on, and the clock's observer host.
//
// Architecture:
//   Stage
//     ├─ entities:  EntityStore (arena, id-addressed)
//     ├─ bus:       MessageBus (outgoing effects)
//     ├─ scheduler: Scheduler<TimedAction> (delayed callbacks)
//     ├─ registry:  DoorSystemRegistry (system-id joins)
//     └─ now:       ClockView (read-only copy of the global clock)
//
//   TimelineClock ──ObserverKey──→ Stage::{pre_time_change, on_time_changed}
//                                    ├─ Facet::Object → TimelineObject + devices
//                                    └─ Facet::Twin   → twin reconciliation
//
// The clock lives beside the stage in `World`, so the stage can be
// borrowed mutably while the clock drives it.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::config::WorldConfig;
use crate::core::effects::VisualEffect;
use crate::core::entity::{Entity, EntityId, EntityStore};
use crate::core::math::{Pose, Vec3};
use crate::core::message_bus::MessageBus;
use crate::core::object::{Look, Presence};
use crate::core::power::DoorSystemRegistry;
use crate::core::time::{ClockView, Scheduler, TimeObserverHost, TimeState};

//=== ObserverKey =========================================================

/// Which part of an entity a clock notification addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    /// The timeline object and any device built on it.
    Object,
    Twin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverKey {
    pub entity: EntityId,
    pub facet: Facet,
}

impl ObserverKey {
    pub fn object(entity: EntityId) -> Self {
        Self { entity, facet: Facet::Object }
    }

    pub fn twin(entity: EntityId) -> Self {
        Self { entity, facet: Facet::Twin }
    }
}

//=== TimedAction =========================================================

/// Delayed callbacks driven by `World::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    NotifyTwinDropped(EntityId),
    HolderReady(EntityId),
    HolderCooldownEnd(EntityId),
    ShieldReattachReady(EntityId),
    ChargeComplete(EntityId),
    ChargerCooldownEnd(EntityId),
    HidePopup(EntityId),
}

impl TimedAction {
    pub fn entity(self) -> EntityId {
        match self {
            TimedAction::NotifyTwinDropped(e)
            | TimedAction::HolderReady(e)
            | TimedAction::HolderCooldownEnd(e)
            | TimedAction::ShieldReattachReady(e)
            | TimedAction::ChargeComplete(e)
            | TimedAction::ChargerCooldownEnd(e)
            | TimedAction::HidePopup(e) => e,
        }
    }
}

//=== Stage ===============================================================

/// Everything the world owns except the clock.
pub struct Stage {
    pub(crate) entities: EntityStore,
    pub(crate) bus: MessageBus,
    pub(crate) config: WorldConfig,
    pub(crate) scheduler: Scheduler<TimedAction>,
    pub(crate) registry: DoorSystemRegistry,
    pub(crate) camera: Option<Vec3>,
    pub(crate) now: ClockView,
}

impl Stage {
    pub(crate) fn new(config: WorldConfig) -> Self {
        Self {
            entities: EntityStore::new(),
            bus: MessageBus::new(),
            config,
            scheduler: Scheduler::new(),
            registry: DoorSystemRegistry::new(),
            camera: None,
            now: ClockView::default(),
        }
    }

    pub(crate) fn current(&self) -> TimeState {
        self.now.current
    }

    //--- Lookups ----------------------------------------------------------

    pub(crate) fn look_of(entity: &Entity, id: EntityId) -> Look {
        Look {
            entity: id,
            twin_native: entity.twin.as_ref().map(|t| t.native),
            energized: entity.wire.as_ref().map(|w| w.is_energized()),
        }
    }

    pub(crate) fn is_protected(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(Entity::is_protected)
    }

    //--- Shared Mutations -------------------------------------------------

    /// Grants or withdraws protection on any protectable entity.
    ///
    /// Unknown ids and entities without a timeline object are skipped.
    pub(crate) fn set_protected(&mut self, id: EntityId, protected: bool) -> bool {
        let current = self.current();
        let Some(entity) = self.entities.get_mut(id) else {
            warn!("Protection change for missing entity {}", id);
            return false;
        };
        let look = Self::look_of(entity, id);
        let Some(object) = entity.object.as_mut() else {
            debug!("{} has nothing to protect", id);
            return false;
        };

        let changed = object.set_protected(protected, look, current, &mut self.bus);
        if changed {
            debug!("{} protected={}", id, protected);
            self.refresh_door_leaves(id);
            if look.twin_native.is_some() {
                self.refresh_twin_visibility(id);
            }
        }
        changed
    }

    pub(crate) fn set_broken(&mut self, id: EntityId, broken: bool) {
        if let Some(object) = self.entities.get_mut(id).and_then(|e| e.object.as_mut()) {
            object.set_broken(broken);
        }
    }

    /// Breaks or repairs the object and reselects its look.
    pub(crate) fn set_broken_visibly(&mut self, id: EntityId, broken: bool) {
        let current = self.current();
        if let Some(entity) = self.entities.get_mut(id) {
            let look = Self::look_of(entity, id);
            if let Some(object) = entity.object.as_mut() {
                if broken {
                    object.break_object(look, current, &mut self.bus);
                } else {
                    object.repair(look, current, &mut self.bus);
                }
            }
        }
        self.refresh_door_leaves(id);
        self.rest_screen(id);
    }

    pub(crate) fn refresh_visuals(&mut self, id: EntityId) {
        let current = self.current();
        if let Some(entity) = self.entities.get_mut(id) {
            let look = Self::look_of(entity, id);
            if let Some(object) = entity.object.as_mut() {
                object.refresh_visuals(look, current, &mut self.bus);
            }
        }
    }

    /// Teleports an entity and reports the move.
    pub(crate) fn move_to(&mut self, id: EntityId, pose: Pose) {
        if let Some(entity) = self.entities.get_mut(id) {
            if entity.pose != pose {
                entity.pose = pose;
                self.bus.publish(VisualEffect::Moved { entity: id, pose });
            }
        }
    }

    pub(crate) fn set_active(&mut self, id: EntityId, active: bool) {
        if let Some(entity) = self.entities.get_mut(id) {
            if entity.active != active {
                entity.active = active;
                self.bus.publish(VisualEffect::Active { entity: id, active });
            }
        }
    }

    /// Toggles colliders and renderers. Hidden bodies freeze; shown
    /// bodies resume from rest.
    pub(crate) fn set_visible(&mut self, id: EntityId, visible: bool) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };

        if let Some(body) = entity.body.as_mut() {
            if visible {
                body.release();
            } else {
                body.freeze();
            }
        }

        if entity.visible != visible {
            entity.visible = visible;
            self.bus.publish(VisualEffect::Visibility { entity: id, visible });
        }
    }

    //--- Object Facet -----------------------------------------------------

    fn object_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        let Some(entity) = self.entities.get_mut(id) else {
            warn!("Clock notified missing entity {}", id);
            return;
        };

        let look = Self::look_of(entity, id);
        let held = entity.is_held();
        let Entity { object, pose, body, .. } = entity;
        let Some(object) = object.as_mut() else {
            return;
        };

        object.on_time_changed(
            new_state,
            Presence { look, pose, body: body.as_mut(), held },
            &mut self.bus,
        );

        self.battery_on_time_changed(id, new_state);
        if held {
            return;
        }

        self.holder_on_time_changed(id, new_state);
        self.charger_on_time_changed(id);
        self.door_on_time_changed(id, new_state);
        self.console_on_time_changed(id);
    }
}

//=== TimeObserverHost ====================================================

impl TimeObserverHost<ObserverKey> for Stage {
    fn pre_time_change(&mut self, observer: ObserverKey, new_state: TimeState, clock: ClockView) {
        self.now = clock;
        if observer.facet == Facet::Twin {
            self.twin_pre_time_change(observer.entity, new_state);
        }
    }

    fn on_time_changed(&mut self, observer: ObserverKey, new_state: TimeState, clock: ClockView) {
        self.now = clock;
        match observer.facet {
            Facet::Object => self.object_on_time_changed(observer.entity, new_state),
            Facet::Twin => self.twin_on_time_changed(observer.entity, new_state),
        }
    }

    fn portal_entry(&mut self, observer: ObserverKey, target: TimeState, clock: ClockView) {
        self.now = clock;
        let twinned = self
            .entities
            .get(observer.entity)
            .is_some_and(|e| e.twin.is_some());
        if twinned {
            self.handle_automatic_portal_entry(observer.entity, target);
        }
    }
}
