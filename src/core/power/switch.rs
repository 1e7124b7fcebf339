//=========================================================================
// Rotary Switch
//=========================================================================
//
// Four-phase switch routing energy to the outputs of its active phase.
//
// Architecture:
//   interact ─→ phase = (phase + 1) % 4 ─→ update_energy_flow
//   set_powered(state, source) ─→ update_energy_flow
//
//   update_energy_flow:
//     every phase: unprotect sinks, drain wires, unpower next switch
//     if powered:  protect active sinks, feed wires, power next switch
//
// Chains may loop back on themselves. Propagation stops at the switch
// that fed us, at ourselves, and at any switch already propagating.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::effects::VisualEffect;
use crate::core::entity::EntityId;
use crate::core::world::Stage;

//=== Constants ===========================================================

/// Positions on the rotary dial.
pub const PHASE_COUNT: usize = 4;

//=== PhaseOutput =========================================================

/// What one dial position feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseOutput {
    pub protected: Vec<EntityId>,
    pub wires: Vec<EntityId>,
    pub next_switch: Option<EntityId>,
}

//=== RotateEnergy ========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateEnergy {
    pub system_id: u32,
    phase: usize,
    powered: bool,
    processing: bool,
    energy_source: Option<EntityId>,
    outputs: [PhaseOutput; PHASE_COUNT],
}

impl RotateEnergy {
    pub fn new(system_id: u32) -> Self {
        Self {
            system_id,
            phase: 0,
            powered: false,
            processing: false,
            energy_source: None,
            outputs: Default::default(),
        }
    }

    /// Replaces the static outputs of a phase.
    ///
    /// # Panics
    ///
    /// Panics if `phase` is not below `PHASE_COUNT`.
    pub fn with_output(mut self, phase: usize, output: PhaseOutput) -> Self {
        assert!(phase < PHASE_COUNT, "Switch phase out of range");
        self.outputs[phase] = output;
        self
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn energy_source(&self) -> Option<EntityId> {
        self.energy_source
    }

    pub fn output(&self, phase: usize) -> Option<&PhaseOutput> {
        self.outputs.get(phase)
    }

    /// Dial angle around Z for the current phase.
    pub fn target_z_rotation(&self) -> f32 {
        self.phase as f32 * 90.0
    }

    pub(crate) fn wires(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.outputs.iter().flat_map(|o| o.wires.iter().copied())
    }
}

//=== Stage: switch operations ============================================

impl Stage {
    fn switch(&self, id: EntityId) -> Option<&RotateEnergy> {
        self.entities.get(id).and_then(|e| e.switch.as_ref())
    }

    fn switch_mut(&mut self, id: EntityId) -> Option<&mut RotateEnergy> {
        self.entities.get_mut(id).and_then(|e| e.switch.as_mut())
    }

    /// Turns the dial one step. Unpowered switches do not turn.
    pub(crate) fn interact_switch(&mut self, id: EntityId) {
        let Some(switch) = self.switch_mut(id) else {
            return;
        };
        if !switch.powered {
            debug!("Switch {} unpowered: interaction ignored", id);
            return;
        }

        switch.phase = (switch.phase + 1) % PHASE_COUNT;
        let z_degrees = switch.target_z_rotation();
        debug!("Switch {} -> phase {}", id, switch.phase);

        self.bus.publish(VisualEffect::SwitchRotation { entity: id, z_degrees });
        self.update_energy_flow(id);
    }

    /// Powers the switch on or off on behalf of `source`.
    pub(crate) fn set_switch_powered(&mut self, id: EntityId, state: bool, source: Option<EntityId>) {
        let Some(switch) = self.switch_mut(id) else {
            warn!("Power change for {} which is not a switch", id);
            return;
        };
        if switch.powered == state || source == Some(id) || switch.processing {
            return;
        }

        switch.processing = true;
        switch.powered = state;
        switch.energy_source = source;
        debug!("Switch {} powered={} (from {:?})", id, state, source);

        self.update_energy_flow(id);

        if let Some(switch) = self.switch_mut(id) {
            switch.processing = false;
        }
    }

    fn update_energy_flow(&mut self, id: EntityId) {
        let Some(switch) = self.switch(id) else {
            return;
        };
        let outputs = switch.outputs.clone();
        let (powered, phase, source) = (switch.powered, switch.phase, switch.energy_source);

        for output in &outputs {
            self.drive_output(id, output, false, source);
        }

        if powered {
            self.drive_output(id, &outputs[phase], true, source);
        }
    }

    fn drive_output(&mut self, id: EntityId, output: &PhaseOutput, on: bool, source: Option<EntityId>) {
        for sink in &output.protected {
            if !self.entities.contains(*sink) {
                warn!("Switch {} feeds missing sink {}", id, sink);
                continue;
            }
            self.set_protected(*sink, on);
        }
        for wire in &output.wires {
            self.add_wire_energy(*wire, id, on);
        }
        if let Some(next) = output.next_switch.filter(|n| Some(*n) != source) {
            self.set_switch_powered(next, on, Some(id));
        }
    }

    fn phase_is_live(&self, id: EntityId, phase: usize) -> bool {
        self.switch(id).is_some_and(|s| s.powered && s.phase == phase)
    }

    //--- Wiring -----------------------------------------------------------

    /// Adds a protectable sink to a phase. Applies at once if that phase is live.
    pub(crate) fn assign_sink_to_phase(&mut self, id: EntityId, sink: EntityId, phase: usize) {
        let Some(output) = self.switch_mut(id).and_then(|s| s.outputs.get_mut(phase)) else {
            return;
        };
        if output.protected.contains(&sink) {
            return;
        }
        output.protected.push(sink);

        if self.phase_is_live(id, phase) {
            self.set_protected(sink, true);
        }
    }

    pub(crate) fn assign_wire_to_phase(&mut self, id: EntityId, wire: EntityId, phase: usize) {
        let Some(output) = self.switch_mut(id).and_then(|s| s.outputs.get_mut(phase)) else {
            return;
        };
        if output.wires.contains(&wire) {
            return;
        }
        output.wires.push(wire);

        if self.phase_is_live(id, phase) {
            self.add_wire_energy(wire, id, true);
        }
    }

    pub(crate) fn set_next_switch(&mut self, id: EntityId, phase: usize, next: Option<EntityId>) {
        let Some(output) = self.switch_mut(id).and_then(|s| s.outputs.get_mut(phase)) else {
            return;
        };
        output.next_switch = next;

        if self.phase_is_live(id, phase) {
            if let Some(next) = next {
                self.set_switch_powered(next, true, Some(id));
            }
        }
    }

    /// Withdraws this switch's energy from every wire it feeds.
    pub(crate) fn switch_destroyed(&mut self, id: EntityId) {
        let wires: Vec<EntityId> = match self.switch(id) {
            Some(s) => s.wires().collect(),
            None => return,
        };
        for wire in wires {
            self.add_wire_energy(wire, id, false);
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_angle_follows_phase() {
        let mut s = RotateEnergy::new(0);
        assert_eq!(s.target_z_rotation(), 0.0);
        s.phase = 3;
        assert_eq!(s.target_z_rotation(), 270.0);
    }

    #[test]
    fn outputs_default_to_empty() {
        let s = RotateEnergy::new(4);
        assert!((0..PHASE_COUNT).all(|p| s.output(p) == Some(&PhaseOutput::default())));
        assert!(s.output(PHASE_COUNT).is_none());
    }

    #[test]
    #[should_panic(expected = "Switch phase out of range")]
    fn with_output_rejects_phase_four() {
        RotateEnergy::new(0).with_output(4, PhaseOutput::default());
    }
}
