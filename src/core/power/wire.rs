//=========================================================================
// Wire
//=========================================================================
//
// A protectable cable energized while at least one switch feeds it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeSet;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::world::Stage;

//=== WireTime ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTime {
    sources: BTreeSet<EntityId>,
    /// Wires that ignore switches stay dark unless protected.
    pub receives_energy: bool,
    energized: bool,
}

impl WireTime {
    pub fn new() -> Self {
        Self { sources: BTreeSet::new(), receives_energy: true, energized: false }
    }

    /// Adds or removes `source`. Returns `true` if the energized state flipped.
    pub fn add_wire_energy(&mut self, source: EntityId, on: bool) -> bool {
        if !self.receives_energy {
            return false;
        }

        if on {
            self.sources.insert(source);
        } else {
            self.sources.remove(&source);
        }

        let energized = !self.sources.is_empty();
        let changed = energized != self.energized;
        self.energized = energized;
        changed
    }

    pub fn clear_energy_sources(&mut self) {
        self.sources.clear();
        self.energized = false;
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }

    pub fn sources(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.sources.iter().copied()
    }
}

impl Default for WireTime {
    fn default() -> Self {
        Self::new()
    }
}

//=== Stage: wire operations ==============================================

impl Stage {
    pub(crate) fn add_wire_energy(&mut self, wire: EntityId, source: EntityId, on: bool) {
        let Some(w) = self.entities.get_mut(wire).and_then(|e| e.wire.as_mut()) else {
            warn!("Switch {} feeds {} which is not a wire", source, wire);
            return;
        };

        if w.add_wire_energy(source, on) {
            debug!("Wire {} energized={}", wire, w.is_energized());
            self.refresh_visuals(wire);
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
