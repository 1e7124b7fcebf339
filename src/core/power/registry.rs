//=========================================================================
// Door System Registry
//=========================================================================
//
// Joins doors and consoles to the holder and rotator sharing their
// system id, whatever order they register in.
//
// Architecture:
//   register_*(id, ...) ──→ SystemRecord { holder, rotator, doors, consoles }
//                               │
//                               └─→ Vec<Link> for the caller to apply
//
//   Link::HolderDefault  → holder protects the sink while a shield is in
//   Link::RotatorPhase   → rotator protects the sink on that phase
//
// System id 0 means "not part of a system" and is ignored everywhere.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;

//=== Link ================================================================

/// A wiring the registry asks the world to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    HolderDefault { holder: EntityId, sink: EntityId },
    RotatorPhase { rotator: EntityId, sink: EntityId, phase: usize },
}

//=== SystemRecord ========================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemRecord {
    pub system_id: u32,
    pub holder: Option<EntityId>,
    pub rotator: Option<EntityId>,
    /// Doors with their phase.
    pub doors: Vec<(EntityId, usize)>,
    /// Consoles with their phase.
    pub consoles: Vec<(EntityId, usize)>,
}

impl SystemRecord {
    fn new(system_id: u32) -> Self {
        Self { system_id, ..Self::default() }
    }

    fn sinks(&self) -> impl Iterator<Item = (EntityId, usize)> + '_ {
        self.doors.iter().chain(self.consoles.iter()).copied()
    }

    fn links_for_sink(&self, sink: EntityId, phase: usize) -> Vec<Link> {
        let mut links = Vec::new();
        if let Some(holder) = self.holder {
            links.push(Link::HolderDefault { holder, sink });
        }
        if let Some(rotator) = self.rotator {
            links.push(Link::RotatorPhase { rotator, sink, phase });
        }
        links
    }
}

//=== DoorSystemRegistry ==================================================

#[derive(Debug, Clone, Default)]
pub struct DoorSystemRegistry {
    systems: Vec<SystemRecord>,
}

impl DoorSystemRegistry {
    pub fn new() -> Self {
        Self { systems: Vec::new() }
    }

    fn record_mut(&mut self, system_id: u32) -> &mut SystemRecord {
        match self.systems.iter().position(|r| r.system_id == system_id) {
            Some(i) => &mut self.systems[i],
            None => {
                debug!("New door system {}", system_id);
                self.systems.push(SystemRecord::new(system_id));
                let last = self.systems.len() - 1;
                &mut self.systems[last]
            }
        }
    }

    //--- Registration -----------------------------------------------------

    /// Sets the system's holder and links every known sink to it.
    pub fn register_holder(&mut self, system_id: u32, holder: EntityId) -> Vec<Link> {
        if system_id == 0 {
            return Vec::new();
        }

        let record = self.record_mut(system_id);
        record.holder = Some(holder);
        record
            .sinks()
            .map(|(sink, _)| Link::HolderDefault { holder, sink })
            .collect()
    }

    /// Sets the system's rotator and links every known sink on its phase.
    pub fn register_rotator(&mut self, system_id: u32, rotator: EntityId) -> Vec<Link> {
        if system_id == 0 {
            return Vec::new();
        }

        let record = self.record_mut(system_id);
        record.rotator = Some(rotator);
        record
            .sinks()
            .map(|(sink, phase)| Link::RotatorPhase { rotator, sink, phase })
            .collect()
    }

    pub fn register_door(&mut self, system_id: u32, door: EntityId, phase: usize) -> Vec<Link> {
        if system_id == 0 {
            return Vec::new();
        }

        let record = self.record_mut(system_id);
        if record.doors.iter().any(|(d, _)| *d == door) {
            return Vec::new();
        }
        record.doors.push((door, phase));
        record.links_for_sink(door, phase)
    }

    pub fn register_console(&mut self, system_id: u32, console: EntityId, phase: usize) -> Vec<Link> {
        if system_id == 0 {
            return Vec::new();
        }

        let record = self.record_mut(system_id);
        if record.consoles.iter().any(|(c, _)| *c == console) {
            return Vec::new();
        }
        record.consoles.push((console, phase));
        record.links_for_sink(console, phase)
    }

    //--- Removal ----------------------------------------------------------

    pub fn unregister_door(&mut self, door: EntityId) {
        for record in &mut self.systems {
            record.doors.retain(|(d, _)| *d != door);
        }
    }

    pub fn unregister_console(&mut self, console: EntityId) {
        for record in &mut self.systems {
            record.consoles.retain(|(c, _)| *c != console);
        }
    }

    /// Drops every reference for which `alive` returns false.
    pub fn clean_stale<F>(&mut self, mut alive: F)
    where
        F: FnMut(EntityId) -> bool,
    {
        for record in &mut self.systems {
            record.holder = record.holder.filter(|h| alive(*h));
            record.rotator = record.rotator.filter(|r| alive(*r));
            record.doors.retain(|(d, _)| alive(*d));
            record.consoles.retain(|(c, _)| alive(*c));
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn system(&self, system_id: u32) -> Option<&SystemRecord> {
        self.systems.iter().find(|r| r.system_id == system_id)
    }

    pub fn system_exists(&self, system_id: u32) -> bool {
        self.system(system_id).is_some()
    }
}

//=========================================================================
// Tests
//=========================================================================
