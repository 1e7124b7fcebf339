//=========================================================================
// Entity Store
//=========================================================================
//
// Arena of entities addressed by `EntityId`.
//
// Architecture:
//   EntityStore { slots: Vec<Option<Entity>> }
//       │
//       ├─ Entity: pose + body proxy + optional components
//       └─ ids are slot indices; destroyed slots stay `None`
//
// Every cross-entity reference in the core is an `EntityId` resolved
// through the store, so a dangling reference is a failed lookup rather
// than a crash.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use crate::core::math::{Pose, Vec3};
use crate::core::object::{Pickable, TimelineObject};
use crate::core::power::{
    CardConsole, HolderShield, RotateEnergy, TimeBattery, TimeCharger, TimeDoor, WireTime,
};
use crate::core::shield::{ShieldItem, ShieldZone};
use crate::core::twin::TwinLink;

//=== EntityId ============================================================

/// Handle to an entity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//=== Body ================================================================

/// Rigid-body proxy. The physics collaborator simulates; the core only
/// flips these flags and clears velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub kinematic: bool,
    pub asleep: bool,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Body {
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn clear_velocity(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Kinematic, asleep and motionless.
    pub fn freeze(&mut self) {
        self.kinematic = true;
        self.asleep = true;
        self.clear_velocity();
    }

    /// Back to dynamic simulation from rest.
    pub fn release(&mut self) {
        self.kinematic = false;
        self.asleep = false;
        self.clear_velocity();
    }
}

//=== Entity ==============================================================

/// One game entity and whichever components it carries.
#[derive(Debug, Default)]
pub struct Entity {
    pub name: String,
    pub active: bool,
    pub visible: bool,
    pub pose: Pose,
    pub body: Option<Body>,

    pub object: Option<TimelineObject>,
    pub pickable: Option<Pickable>,
    pub twin: Option<TwinLink>,

    pub switch: Option<RotateEnergy>,
    pub wire: Option<WireTime>,
    pub holder: Option<HolderShield>,
    pub door: Option<TimeDoor>,
    pub console: Option<CardConsole>,
    pub charger: Option<TimeCharger>,

    pub shield: Option<ShieldItem>,
    pub zone: Option<ShieldZone>,
    pub battery: Option<TimeBattery>,
}

impl Entity {
    pub fn new(name: impl Into<String>, pose: Pose) -> Self {
        Self {
            name: name.into(),
            active: true,
            visible: true,
            pose,
            ..Self::default()
        }
    }

    pub fn is_held(&self) -> bool {
        self.pickable.as_ref().is_some_and(|p| p.held)
    }

    pub fn is_protected(&self) -> bool {
        self.object.as_ref().is_some_and(|o| o.condition().is_protected())
    }
}

//=== EntityStore =========================================================

/// Slot arena of entities.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Option<Entity>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(Some(entity));
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Mutable access to two distinct live entities at once.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        if a == b {
            return None;
        }

        let (lo, hi, swapped) = if a < b { (a, b, false) } else { (b, a, true) };
        if hi.index() >= self.slots.len() {
            return None;
        }

        let (left, right) = self.slots.split_at_mut(hi.index());
        let first = left[lo.index()].as_mut()?;
        let second = right[0].as_mut()?;

        Some(if swapped { (second, first) } else { (first, second) })
    }

    /// Ids of every live entity, ascending.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EntityId(i as u32), e)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//=========================================================================
// Tests
//=========================================================================
