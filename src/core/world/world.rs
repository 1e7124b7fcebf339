//=========================================================================
// World
//=========================================================================
//
// Explicit context owning the clock and everything the clock drives.
//
// Architecture:
//   World
//     ├─ clock: TimelineClock<ObserverKey>
//     └─ stage: Stage (entities, bus, scheduler, registry, camera)
//
//   tick(dt)
//     ├─ 1. clock cooldown    → GameFlow::Resumed on release
//     ├─ 2. scheduled actions → drop notices, holder/shield readiness,
//     │                        charging, popups
//     ├─ 3. door motion + console cooldowns
//     └─ 4. popup icons against the camera
//
//   fixed_update() → past dominance for every twin half
//
// Every public operation validates ids and components and returns a
// `WorldError` for caller mistakes. Misconfiguration found while
// propagating (dangling twins, missing sinks) is logged and skipped.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::builder::EntityBuilder;
use crate::core::command_bridge::WorldCommand;
use super::stage::{ObserverKey, Stage, TimedAction};
use crate::core::config::WorldConfig;
use crate::core::effects::{EffectBatch, GameFlow};
use crate::core::entity::{Entity, EntityId};
use crate::core::error::{WorldError, WorldResult};
use crate::core::math::{Pose, Vec3};
use crate::core::object::{PopupState, TimelineObject};
use crate::core::power::{DoorSystemRegistry, Link, PHASE_COUNT};
use crate::core::time::{TimeState, TimelineClock};
use crate::core::twin::TwinLink;

//=== World ===============================================================

/// The timeline-consistency world.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use timeshift_engine::core::{EntityBuilder, TimeState, World, WorldConfig};
///
/// let mut world = World::new(WorldConfig::new().with_time_travel_delay(Duration::ZERO));
/// let lamp = world.spawn(EntityBuilder::new("lamp").timeline_object());
///
/// assert!(world.toggle_time());
/// assert_eq!(world.current_time(), TimeState::L1);
/// assert!(!world.entity(lamp).unwrap().object.as_ref().unwrap().condition().is_broken());
/// ```
pub struct World {
    clock: TimelineClock<ObserverKey>,
    stage: Stage,
}

impl World {
    //--- Construction -----------------------------------------------------

    pub fn new(config: WorldConfig) -> Self {
        info!("Creating world (time travel delay: {:?})", config.time_travel_delay);
        let clock = TimelineClock::new(config.time_travel_delay);
        let mut stage = Stage::new(config);
        stage.now = clock.view();

        Self { clock, stage }
    }

    //--- Queries ----------------------------------------------------------

    pub fn config(&self) -> &WorldConfig {
        &self.stage.config
    }

    pub fn current_time(&self) -> TimeState {
        self.clock.current()
    }

    pub fn previous_time(&self) -> TimeState {
        self.clock.previous()
    }

    pub fn is_cooling_down(&self) -> bool {
        self.clock.is_cooling_down()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.stage.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.stage.entities.iter()
    }

    pub fn registry(&self) -> &DoorSystemRegistry {
        &self.stage.registry
    }

    /// Number of observers the clock notifies.
    pub fn observer_count(&self) -> usize {
        self.clock.observers().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.stage.scheduler.len()
    }

    fn get(&self, id: EntityId) -> WorldResult<&Entity> {
        self.stage.entities.get(id).ok_or(WorldError::UnknownEntity(id))
    }

    fn object(&self, id: EntityId) -> WorldResult<&TimelineObject> {
        self.get(id)?.object.as_ref().ok_or(WorldError::missing(id, "timeline object"))
    }

    fn require<F>(&self, id: EntityId, component: &'static str, has: F) -> WorldResult<()>
    where
        F: FnOnce(&Entity) -> bool,
    {
        if has(self.get(id)?) {
            Ok(())
        } else {
            Err(WorldError::missing(id, component))
        }
    }

    fn check_phase(phase: usize) -> WorldResult<()> {
        if phase < PHASE_COUNT {
            Ok(())
        } else {
            Err(WorldError::InvalidPhase { phase, max: PHASE_COUNT })
        }
    }

    fn sync_clock(&mut self) {
        self.stage.now = self.clock.view();
    }

    //--- Lifecycle --------------------------------------------------------

    /// Creates the entity in the current timeline, registers it with the
    /// clock and joins it to its door system.
    pub fn spawn(&mut self, builder: EntityBuilder) -> EntityId {
        let current = self.clock.current();
        let settings = builder.resolved_settings();
        let EntityBuilder {
            name,
            pose,
            body,
            pickable,
            twin,
            switch,
            wire,
            holder,
            mut door,
            console,
            charger,
            shield,
            zone,
            battery,
            ..
        } = builder;

        if let Some(door) = door.as_mut() {
            door.settle_in(current);
        }

        let entity = Entity {
            object: settings.map(|s| TimelineObject::new(s, current, pose)),
            body,
            pickable,
            twin: twin.map(|(twin_id, native)| TwinLink::new(twin_id, native, pose)),
            switch,
            wire,
            holder,
            door,
            console,
            charger,
            shield,
            zone,
            battery,
            ..Entity::new(name, pose)
        };
        let has_object = entity.object.is_some();
        let has_twin = entity.twin.is_some();
        let id = self.stage.entities.insert(entity);
        debug!("Spawned {} in {}", id, current);

        if has_object {
            self.clock.register_observer(ObserverKey::object(id));
            self.stage.refresh_visuals(id);
        }
        if has_twin {
            self.clock.register_observer(ObserverKey::twin(id));
            self.stage.refresh_twin_visibility(id);
        }

        self.join_door_system(id);
        self.stage.refresh_door_leaves(id);
        self.stage.rest_screen(id);
        id
    }

    fn join_door_system(&mut self, id: EntityId) {
        let Some(entity) = self.stage.entities.get(id) else {
            return;
        };
        let registry = &mut self.stage.registry;
        let mut links = Vec::new();

        if let Some(holder) = entity.holder.as_ref() {
            links.extend(registry.register_holder(holder.system_id, id));
        }
        if let Some(switch) = entity.switch.as_ref() {
            links.extend(registry.register_rotator(switch.system_id, id));
        }
        if let Some(door) = entity.door.as_ref() {
            links.extend(registry.register_door(door.system_id, id, door.phase));
        }
        if let Some(console) = entity.console.as_ref() {
            links.extend(registry.register_console(console.system_id, id, console.phase));
        }

        for link in links {
            match link {
                Link::HolderDefault { holder, sink } => {
                    self.stage.add_to_default_protection(holder, sink);
                }
                Link::RotatorPhase { rotator, sink, phase } if phase < PHASE_COUNT => {
                    self.stage.assign_sink_to_phase(rotator, sink, phase);
                }
                Link::RotatorPhase { sink, phase, .. } => {
                    warn!("{} registered on phase {} which no switch has", sink, phase);
                }
            }
        }
    }

    /// Removes the entity and everything that refers to it.
    pub fn destroy(&mut self, id: EntityId) -> WorldResult<()> {
        let entity = self.get(id)?;
        let in_panel = entity.shield.as_ref().is_some_and(|s| s.is_in_panel());
        let zone = entity.zone.is_some();
        let sibling = entity.twin.as_ref().and_then(|t| t.twin);
        let charger = entity.battery.as_ref().and_then(|b| b.charger());
        let loaded = entity.charger.as_ref().is_some_and(|c| c.battery().is_some());

        if in_panel {
            self.stage.detach_shield(id, true);
        }
        if let Some(charger) = charger {
            self.stage.remove_battery(charger);
        }
        if loaded {
            self.stage.remove_battery(id);
        }
        if zone {
            self.stage.zone_disable_all(id);
        }
        self.stage.switch_destroyed(id);

        self.clock.unregister_observer(ObserverKey::object(id));
        self.clock.unregister_observer(ObserverKey::twin(id));
        self.stage.registry.unregister_door(id);
        self.stage.registry.unregister_console(id);
        self.stage.scheduler.cancel_where(|a| a.entity() == id);

        if let Some(link) = sibling.and_then(|s| self.stage.entities.get_mut(s)).and_then(|e| e.twin.as_mut()) {
            link.twin = None;
        }

        self.stage.entities.remove(id);
        let entities = &self.stage.entities;
        self.stage.registry.clean_stale(|e| entities.contains(e));
        debug!("Destroyed {}", id);
        Ok(())
    }

    /// Binds two twin halves to each other.
    pub fn link_twins(&mut self, a: EntityId, b: EntityId) -> WorldResult<()> {
        if a == b {
            return Err(WorldError::SelfLink(a));
        }
        let native_a = self.get(a)?.twin.as_ref().ok_or(WorldError::missing(a, "twin link"))?.native;
        let native_b = self.get(b)?.twin.as_ref().ok_or(WorldError::missing(b, "twin link"))?.native;
        if native_a == native_b {
            return Err(WorldError::SameTimelineTwins { a, b });
        }

        if let Some((ea, eb)) = self.stage.entities.pair_mut(a, b) {
            if let (Some(la), Some(lb)) = (ea.twin.as_mut(), eb.twin.as_mut()) {
                la.twin = Some(b);
                lb.twin = Some(a);
            }
        }
        debug!("Linked twins {} <-> {}", a, b);

        self.stage.refresh_twin_visibility(a);
        self.stage.refresh_twin_visibility(b);
        Ok(())
    }

    //--- Timeline ---------------------------------------------------------

    /// Flips the global timeline. Returns `false` during the cooldown.
    pub fn toggle_time(&mut self) -> bool {
        let from = self.clock.current();
        let changed = self.clock.toggle_time(&mut self.stage);
        self.sync_clock();

        if changed {
            let to = self.clock.current();
            self.stage.bus.publish(GameFlow::TimeChanged { from, to });
        }
        changed
    }

    /// Sets the global timeline regardless of the cooldown.
    pub fn change_time(&mut self, new_state: TimeState) {
        let from = self.clock.current();
        self.clock.change_time(new_state, &mut self.stage);
        self.sync_clock();
        self.stage.bus.publish(GameFlow::TimeChanged { from, to: new_state });
    }

    /// Sends one object through a portal to `target`.
    ///
    /// A twinned entity travels as its twin link; its timeline object
    /// stays on the global timeline like every other observer.
    pub fn request_object_time_travel(&mut self, id: EntityId, target: TimeState) -> WorldResult<bool> {
        let traveller = if self.get(id)?.twin.is_some() {
            ObserverKey::twin(id)
        } else {
            self.object(id)?;
            ObserverKey::object(id)
        };

        let travelled = self
            .clock
            .request_object_time_travel(traveller, target, &mut self.stage);
        self.sync_clock();

        if travelled {
            self.stage.bus.publish(GameFlow::ObjectTravelled { entity: id, target });
        }
        Ok(travelled)
    }

    //--- Update Loop ------------------------------------------------------

    pub fn tick(&mut self, dt: Duration) {
        if self.clock.tick(dt) {
            info!("Time travel cooldown over, resuming");
            self.stage.bus.publish(GameFlow::Resumed);
        }
        self.sync_clock();

        for action in self.stage.scheduler.tick(dt) {
            self.stage.run_timed(action);
        }

        self.stage.tick_doors(dt);
        self.stage.tick_consoles(dt);
        self.stage.refresh_popups();
    }

    /// Physics-step hook: past halves dictate their present siblings.
    pub fn fixed_update(&mut self) {
        let twins: Vec<EntityId> = self
            .stage
            .entities
            .iter()
            .filter(|(_, e)| e.twin.is_some())
            .map(|(id, _)| id)
            .collect();

        for id in twins {
            self.stage.twin_fixed_update(id);
        }
    }

    /// Everything published since the last drain.
    pub fn drain_effects(&mut self) -> EffectBatch {
        EffectBatch::drain_from(&mut self.stage.bus)
    }

    //--- Hand -------------------------------------------------------------

    pub fn grab(&mut self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "pickable", |e| e.pickable.is_some())?;
        Ok(self.stage.grab(id))
    }

    pub fn drop_held(&mut self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "pickable", |e| e.pickable.is_some())?;
        Ok(self.stage.drop_held(id))
    }

    pub fn force_drop_if_out_of_reach(&mut self, id: EntityId, hand: Vec3) -> WorldResult<bool> {
        self.require(id, "pickable", |e| e.pickable.is_some())?;
        Ok(self.stage.force_drop_if_out_of_reach(id, hand))
    }

    /// Reports where the physics collaborator moved the entity.
    pub fn move_entity(&mut self, id: EntityId, pose: Pose) -> WorldResult<()> {
        self.stage
            .entities
            .get_mut(id)
            .ok_or(WorldError::UnknownEntity(id))?
            .pose = pose;
        Ok(())
    }

    //--- Devices ----------------------------------------------------------

    /// Player interaction: turns switches, uses consoles, toggles doors.
    pub fn interact(&mut self, id: EntityId) -> WorldResult<()> {
        let entity = self.get(id)?;
        if entity.switch.is_some() {
            self.stage.interact_switch(id);
        } else if entity.console.is_some() {
            self.stage.interact_console(id);
        } else if entity.door.is_some() {
            self.stage.toggle_door(id);
        } else {
            return Err(WorldError::missing(id, "interactable"));
        }
        Ok(())
    }

    pub fn set_powered(&mut self, id: EntityId, on: bool) -> WorldResult<()> {
        self.require(id, "switch", |e| e.switch.is_some())?;
        self.stage.set_switch_powered(id, on, None);
        Ok(())
    }

    pub fn assign_sink_to_phase(&mut self, switch: EntityId, sink: EntityId, phase: usize) -> WorldResult<()> {
        Self::check_phase(phase)?;
        self.require(switch, "switch", |e| e.switch.is_some())?;
        self.get(sink)?;
        self.stage.assign_sink_to_phase(switch, sink, phase);
        Ok(())
    }

    pub fn assign_wire_to_phase(&mut self, switch: EntityId, wire: EntityId, phase: usize) -> WorldResult<()> {
        Self::check_phase(phase)?;
        self.require(switch, "switch", |e| e.switch.is_some())?;
        self.require(wire, "wire", |e| e.wire.is_some())?;
        self.stage.assign_wire_to_phase(switch, wire, phase);
        Ok(())
    }

    pub fn set_next_switch(&mut self, switch: EntityId, phase: usize, next: Option<EntityId>) -> WorldResult<()> {
        Self::check_phase(phase)?;
        self.require(switch, "switch", |e| e.switch.is_some())?;
        if let Some(next) = next {
            self.require(next, "switch", |e| e.switch.is_some())?;
        }
        self.stage.set_next_switch(switch, phase, next);
        Ok(())
    }

    pub fn add_to_default_protection(&mut self, holder: EntityId, sink: EntityId) -> WorldResult<()> {
        self.require(holder, "holder", |e| e.holder.is_some())?;
        self.get(sink)?;
        self.stage.add_to_default_protection(holder, sink);
        Ok(())
    }

    /// Plugs a shield into a holder. `Ok(false)` if either refuses.
    pub fn attach_shield(&mut self, shield: EntityId, holder: EntityId) -> WorldResult<bool> {
        self.require(shield, "shield", |e| e.shield.is_some())?;
        self.require(holder, "holder", |e| e.holder.is_some())?;
        Ok(self.stage.attach_shield(shield, holder))
    }

    pub fn detach_shield(&mut self, shield: EntityId) -> WorldResult<()> {
        self.require(shield, "shield", |e| e.shield.is_some())?;
        self.stage.detach_shield(shield, false);
        Ok(())
    }

    pub fn zone_enter(&mut self, zone: EntityId, target: EntityId) -> WorldResult<()> {
        self.require(zone, "shield zone", |e| e.zone.is_some())?;
        self.get(target)?;
        self.stage.zone_enter(zone, target);
        Ok(())
    }

    pub fn zone_exit(&mut self, zone: EntityId, target: EntityId) -> WorldResult<()> {
        self.require(zone, "shield zone", |e| e.zone.is_some())?;
        self.stage.zone_exit(zone, target);
        Ok(())
    }

    pub fn open_door(&mut self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "door", |e| e.door.is_some())?;
        Ok(self.stage.open_door(id))
    }

    pub fn close_door(&mut self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "door", |e| e.door.is_some())?;
        Ok(self.stage.close_door(id))
    }

    pub fn toggle_door(&mut self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "door", |e| e.door.is_some())?;
        Ok(self.stage.toggle_door(id))
    }

    pub fn set_door_state(&mut self, id: EntityId, open: bool, save_l1: bool) -> WorldResult<()> {
        self.require(id, "door", |e| e.door.is_some())?;
        self.stage.set_door_state(id, open, save_l1);
        Ok(())
    }

    pub fn can_door_be_opened(&self, id: EntityId) -> WorldResult<bool> {
        self.require(id, "door", |e| e.door.is_some())?;
        Ok(self.stage.door_can_be_opened(id))
    }

    /// Locks a card into a console. The card leaves the hand first.
    pub fn insert_card(&mut self, console: EntityId, card: EntityId) -> WorldResult<bool> {
        self.require(console, "console", |e| e.console.is_some())?;
        self.get(card)?;
        self.stage.force_release(card);
        Ok(self.stage.insert_card(console, card))
    }

    /// Locks a battery into a charger. `Ok(false)` if either refuses.
    pub fn insert_battery(&mut self, charger: EntityId, battery: EntityId) -> WorldResult<bool> {
        self.require(charger, "charger", |e| e.charger.is_some())?;
        self.require(battery, "battery", |e| e.battery.is_some())?;
        Ok(self.stage.insert_battery(charger, battery))
    }

    pub fn remove_battery(&mut self, charger: EntityId) -> WorldResult<()> {
        self.require(charger, "charger", |e| e.charger.is_some())?;
        self.stage.remove_battery(charger);
        Ok(())
    }

    /// Charged and intact.
    pub fn is_battery_functional(&self, battery: EntityId) -> WorldResult<bool> {
        self.require(battery, "battery", |e| e.battery.is_some())?;
        let broken = self.object(battery)?.condition().is_broken();
        Ok(self.get(battery)?.battery.as_ref().is_some_and(|b| b.is_functional(broken)))
    }

    //--- Object State -----------------------------------------------------

    pub fn set_protected(&mut self, id: EntityId, protected: bool) -> WorldResult<bool> {
        self.object(id)?;
        Ok(self.stage.set_protected(id, protected))
    }

    pub fn break_object(&mut self, id: EntityId) -> WorldResult<()> {
        self.object(id)?;
        self.stage.set_broken_visibly(id, true);
        Ok(())
    }

    pub fn repair(&mut self, id: EntityId) -> WorldResult<()> {
        self.object(id)?;
        self.stage.set_broken_visibly(id, false);
        Ok(())
    }

    /// Clears travel bookkeeping and settles the body.
    pub fn reset_object(&mut self, id: EntityId) -> WorldResult<()> {
        self.object(id)?;
        if let Some(entity) = self.stage.entities.get_mut(id) {
            if let Some(object) = entity.object.as_mut() {
                object.reset(entity.body.as_mut());
            }
        }
        Ok(())
    }

    //--- Focus & Inspection -----------------------------------------------

    pub fn set_camera(&mut self, camera: Option<Vec3>) {
        self.stage.camera = camera;
    }

    pub fn focus(&mut self, id: EntityId) -> WorldResult<()> {
        self.object(id)?;
        self.stage.focus(id);
        Ok(())
    }

    pub fn unfocus(&mut self, id: EntityId) -> WorldResult<()> {
        self.object(id)?;
        self.stage.unfocus(id);
        Ok(())
    }

    pub fn popup(&self, id: EntityId) -> WorldResult<PopupState> {
        Ok(*self.object(id)?.popup())
    }

    pub fn describe(&self, id: EntityId) -> WorldResult<String> {
        let status = self.stage.device_status(id);
        Ok(self.object(id)?.describe_with(self.current_time(), status))
    }

    pub fn can_be_inspected(&self, id: EntityId) -> WorldResult<bool> {
        let active = self.get(id)?.active;
        Ok(self.object(id)?.can_be_inspected(active))
    }

    pub fn inspection_display_duration(&self, id: EntityId) -> WorldResult<Duration> {
        Ok(self.object(id)?.inspection_display_duration(self.current_time()))
    }

    //--- Commands ---------------------------------------------------------

    /// Runs one command received over the engine's channel.
    pub fn apply(&mut self, command: WorldCommand) -> WorldResult<()> {
        match command {
            WorldCommand::ToggleTime => {
                self.toggle_time();
            }
            WorldCommand::ChangeTime(state) => self.change_time(state),
            WorldCommand::ObjectTimeTravel { entity, target } => {
                self.request_object_time_travel(entity, target)?;
            }
            WorldCommand::Grab(id) => {
                self.grab(id)?;
            }
            WorldCommand::Drop(id) => {
                self.drop_held(id)?;
            }
            WorldCommand::ForceDropIfOutOfReach { entity, hand } => {
                self.force_drop_if_out_of_reach(entity, hand)?;
            }
            WorldCommand::MoveEntity { entity, pose } => self.move_entity(entity, pose)?,
            WorldCommand::Interact(id) => self.interact(id)?,
            WorldCommand::SetPowered { switch, on } => self.set_powered(switch, on)?,
            WorldCommand::AttachShield { shield, holder } => {
                self.attach_shield(shield, holder)?;
            }
            WorldCommand::DetachShield(id) => self.detach_shield(id)?,
            WorldCommand::ZoneEnter { zone, target } => self.zone_enter(zone, target)?,
            WorldCommand::ZoneExit { zone, target } => self.zone_exit(zone, target)?,
            WorldCommand::OpenDoor(id) => {
                self.open_door(id)?;
            }
            WorldCommand::CloseDoor(id) => {
                self.close_door(id)?;
            }
            WorldCommand::InsertCard { console, card } => {
                self.insert_card(console, card)?;
            }
            WorldCommand::InsertBattery { charger, battery } => {
                self.insert_battery(charger, battery)?;
            }
            WorldCommand::RemoveBattery(charger) => self.remove_battery(charger)?,
            WorldCommand::SetProtected { entity, protected } => {
                self.set_protected(entity, protected)?;
            }
            WorldCommand::Break(id) => self.break_object(id)?,
            WorldCommand::Repair(id) => self.repair(id)?,
            WorldCommand::SetCamera(camera) => self.set_camera(camera),
            WorldCommand::Focus(id) => self.focus(id)?,
            WorldCommand::Unfocus(id) => self.unfocus(id)?,
            WorldCommand::Shutdown => {}
        }
        Ok(())
    }

    //--- Maintenance ------------------------------------------------------

    /// Drops registry entries whose entities are gone.
    pub fn clean_stale_systems(&mut self) {
        let entities = &self.stage.entities;
        self.stage.registry.clean_stale(|e| entities.contains(e));
    }

    /// True if a drop notice for `id` is still pending.
    pub fn drop_notice_pending(&self, id: EntityId) -> bool {
        self.stage
            .scheduler
            .contains(|a| *a == TimedAction::NotifyTwinDropped(id))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
