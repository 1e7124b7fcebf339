//=========================================================================
// Shield Zone
//=========================================================================
//
// Protective volume carried by a shield item. Entities inside are
// protected; leaving the volume or switching it off withdraws protection.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::world::Stage;

//=== ShieldZone ==========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldZone {
    members: Vec<EntityId>,
    active: bool,
}

impl ShieldZone {
    pub fn new() -> Self {
        Self { members: Vec::new(), active: true }
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Default for ShieldZone {
    fn default() -> Self {
        Self::new()
    }
}

//=== Stage: zone operations ==============================================

impl Stage {
    fn zone_mut(&mut self, id: EntityId) -> Option<&mut ShieldZone> {
        self.entities.get_mut(id).and_then(|e| e.zone.as_mut())
    }

    /// `target` entered the volume. Inactive zones ignore it.
    pub(crate) fn zone_enter(&mut self, zone: EntityId, target: EntityId) {
        let Some(z) = self.zone_mut(zone) else {
            return;
        };
        if !z.active || target == zone {
            return;
        }
        if !z.members.contains(&target) {
            z.members.push(target);
        }
        self.set_protected(target, true);
    }

    pub(crate) fn zone_exit(&mut self, zone: EntityId, target: EntityId) {
        let Some(z) = self.zone_mut(zone) else {
            return;
        };
        let Some(pos) = z.members.iter().position(|m| *m == target) else {
            return;
        };
        z.members.remove(pos);
        self.set_protected(target, false);
    }

    /// Withdraws protection from everything inside.
    pub(crate) fn zone_disable_all(&mut self, zone: EntityId) {
        let Some(z) = self.zone_mut(zone) else {
            return;
        };
        let members = std::mem::take(&mut z.members);
        debug!("Zone {} releasing {} members", zone, members.len());

        for member in members {
            self.set_protected(member, false);
        }
    }

    pub(crate) fn set_zone_active(&mut self, zone: EntityId, active: bool) {
        let Some(z) = self.zone_mut(zone) else {
            return;
        };
        z.active = active;
        if !active {
            self.zone_disable_all(zone);
        }
        self.set_active(zone, active);
    }
}

//=========================================================================
// Tests
//=========================================================================
