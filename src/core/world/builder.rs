//=========================================================================
// Entity Builder
//=========================================================================
//
// Fluent description of an entity to spawn into a `World`.
//
// Devices (switches, wires, holders, doors, consoles, chargers, shields,
// batteries) are
// timeline objects too; the builder gives them default object settings
// when none are supplied.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::Body;
use crate::core::math::Pose;
use crate::core::object::{ObjectSettings, Pickable, VisualSet};
use crate::core::power::{
    CardConsole, HolderShield, RotateEnergy, TimeBattery, TimeCharger, TimeDoor, WireTime,
};
use crate::core::shield::{ShieldItem, ShieldZone};
use crate::core::time::TimeState;

//=== EntityBuilder =======================================================

/// Description of an entity before it exists.
///
/// # Examples
///
/// ```
/// use timeshift_engine::core::{EntityBuilder, TimeState, World};
///
/// let mut world = World::default();
/// let vase = world.spawn(
///     EntityBuilder::new("vase")
///         .timeline_object()
///         .pickable()
///         .twin("vase", TimeState::L1),
/// );
/// assert!(world.entity(vase).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    pub(crate) name: String,
    pub(crate) pose: Pose,
    pub(crate) body: Option<Body>,
    pub(crate) object: Option<ObjectSettings>,
    pub(crate) pickable: Option<Pickable>,
    pub(crate) twin: Option<(String, TimeState)>,
    pub(crate) switch: Option<RotateEnergy>,
    pub(crate) wire: Option<WireTime>,
    pub(crate) holder: Option<HolderShield>,
    pub(crate) door: Option<TimeDoor>,
    pub(crate) console: Option<CardConsole>,
    pub(crate) charger: Option<TimeCharger>,
    pub(crate) shield: Option<ShieldItem>,
    pub(crate) zone: Option<ShieldZone>,
    pub(crate) battery: Option<TimeBattery>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn at(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Gives the entity a dynamic rigid body.
    pub fn with_body(mut self) -> Self {
        self.body = Some(Body::dynamic());
        self
    }

    pub fn object(mut self, settings: ObjectSettings) -> Self {
        self.object = Some(settings);
        self
    }

    pub fn timeline_object(self) -> Self {
        self.object(ObjectSettings::default())
    }

    /// Pickable with the default grab distance. Adds a body if missing.
    pub fn pickable(self) -> Self {
        self.pickable_with_reach(Pickable::default().max_grab_distance)
    }

    pub fn pickable_with_reach(mut self, max_grab_distance: f32) -> Self {
        self.pickable = Some(Pickable::new(max_grab_distance));
        self.body.get_or_insert_with(Body::dynamic);
        self
    }

    /// Marks the entity as one half of the `twin_id` pair.
    pub fn twin(mut self, twin_id: impl Into<String>, native: TimeState) -> Self {
        self.twin = Some((twin_id.into(), native));
        self
    }

    pub fn switch(mut self, switch: RotateEnergy) -> Self {
        self.switch = Some(switch);
        self
    }

    pub fn wire(mut self) -> Self {
        self.wire = Some(WireTime::new());
        self
    }

    pub fn holder(mut self, holder: HolderShield) -> Self {
        self.holder = Some(holder);
        self
    }

    pub fn door(mut self, door: TimeDoor) -> Self {
        self.door = Some(door);
        self
    }

    pub fn console(mut self, console: CardConsole) -> Self {
        self.console = Some(console);
        self
    }

    pub fn charger(mut self, charger: TimeCharger) -> Self {
        self.charger = Some(charger);
        self
    }

    /// Pickable battery.
    pub fn battery(mut self, battery: TimeBattery) -> Self {
        self.battery = Some(battery);
        self.pickable()
    }

    /// Pickable shield item carrying `zone`.
    pub fn shield(mut self, shield: ShieldItem) -> Self {
        self.shield = Some(shield);
        self.pickable()
    }

    pub fn zone(mut self) -> Self {
        self.zone = Some(ShieldZone::new());
        self
    }

    /// Final object settings after device defaults are applied.
    pub(crate) fn resolved_settings(&self) -> Option<ObjectSettings> {
        let is_device = self.switch.is_some()
            || self.wire.is_some()
            || self.holder.is_some()
            || self.door.is_some()
            || self.console.is_some()
            || self.charger.is_some()
            || self.shield.is_some()
            || self.battery.is_some();

        let mut settings = match (&self.object, is_device) {
            (Some(settings), _) => settings.clone(),
            (None, true) => ObjectSettings::default(),
            (None, false) => return None,
        };

        if self.wire.is_some() && self.object.is_none() {
            settings.visuals = VisualSet::WIRE;
        }
        if self.shield.is_some() {
            settings.shield = true;
        }
        Some(settings)
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_entity_has_no_object() {
        assert!(EntityBuilder::new("rock").resolved_settings().is_none());
    }

    #[test]
    fn devices_get_default_objects() {
        let wire = EntityBuilder::new("wire").wire().resolved_settings().unwrap();
        assert_eq!(wire.visuals, VisualSet::WIRE);

        let shield = EntityBuilder::new("shield").shield(ShieldItem::new(None));
        assert!(shield.resolved_settings().unwrap().shield);
        assert!(shield.pickable.is_some());
        assert!(shield.body.is_some());
    }

    #[test]
    fn batteries_are_pickable_devices() {
        let battery = EntityBuilder::new("battery").battery(TimeBattery::new());
        assert!(battery.resolved_settings().is_some());
        assert!(battery.pickable.is_some());

        let charger = EntityBuilder::new("charger").charger(TimeCharger::new(Pose::default()));
        assert!(charger.resolved_settings().is_some());
        assert!(charger.pickable.is_none());
    }
}
