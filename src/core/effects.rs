//=========================================================================
// Effects
//=========================================================================
//
// Records of side effects the core asks external collaborators to perform.
//
// Architecture:
//   Core systems ──publish──→ MessageBus
//                                 │
//        ┌────────────┬───────────┼────────────┐
//        ↓            ↓           ↓            ↓
//   VisualEffect   AudioCue  ResidueEffect  GameFlow
//   (renderer)     (audio)   (spawner)      (game state)
//
// Each tick the world drains the bus into an `EffectBatch`.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::math::Pose;
use crate::core::message_bus::MessageBus;
use crate::core::object::{PopupIcons, VisualBucket};
use crate::core::power::ConsoleScreen;
use crate::core::time::TimeState;

//=== VisualEffect ========================================================

/// Renderer-facing changes.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualEffect {
    /// Exactly this bucket (or none) is now active for the entity.
    BucketChanged {
        entity: EntityId,
        bucket: Option<VisualBucket>,
    },

    /// Protection material appended to / removed from the bucket's renderers.
    ProtectionOverlay {
        entity: EntityId,
        bucket: VisualBucket,
        applied: bool,
    },

    /// Focus highlight appended / removed.
    Highlight { entity: EntityId, applied: bool },

    /// Colliders and renderers toggled together.
    Visibility { entity: EntityId, visible: bool },

    /// Whole entity enabled / disabled.
    Active { entity: EntityId, active: bool },

    /// Entity teleported by the core.
    Moved { entity: EntityId, pose: Pose },

    /// World popup shown with the given icons.
    PopupShown { entity: EntityId, icons: PopupIcons },

    PopupHidden { entity: EntityId },

    /// Door leaves: which variant is shown and how far they slid open.
    DoorLeaves {
        entity: EntityId,
        l1_variant: bool,
        offset: f32,
    },

    /// Rotary switch should turn toward this Z angle.
    SwitchRotation { entity: EntityId, z_degrees: f32 },

    ConsoleScreen { entity: EntityId, screen: ConsoleScreen },

    /// Charger material: ready while charging, open once emptied.
    ChargerLight { entity: EntityId, ready: bool },

    BatteryCharge { entity: EntityId, charged: bool },
}

//=== AudioCue ============================================================

/// Audio collaborator requests. The core only asks for play/stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    ShieldInserted { holder: EntityId },
    ShieldTimeDisconnect { holder: EntityId },
    DoorOpening { door: EntityId },
    DoorClosing { door: EntityId },
}

//=== ResidueEffect =======================================================

/// Residue marker lifecycle requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResidueEffect {
    /// Leave a marker at `pose`, styled broken or intact.
    Spawn {
        entity: EntityId,
        pose: Pose,
        was_broken: bool,
    },

    Clear { entity: EntityId },
}

//=== GameFlow ============================================================

/// Higher-level game state notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameFlow {
    /// Global timeline switched; gameplay is paused for the cooldown.
    TimeChanged { from: TimeState, to: TimeState },

    /// Cooldown elapsed; gameplay resumes.
    Resumed,

    /// A single object went through a portal.
    ObjectTravelled { entity: EntityId, target: TimeState },
}

//=== EffectBatch =========================================================

/// Everything published during one tick, grouped by collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectBatch {
    pub visuals: Vec<VisualEffect>,
    pub audio: Vec<AudioCue>,
    pub residue: Vec<ResidueEffect>,
    pub flow: Vec<GameFlow>,
}

impl EffectBatch {
    /// Drains every effect queue from the bus.
    pub fn drain_from(bus: &mut MessageBus) -> Self {
        Self {
            visuals: bus.drain::<VisualEffect>(),
            audio: bus.drain::<AudioCue>(),
            residue: bus.drain::<ResidueEffect>(),
            flow: bus.drain::<GameFlow>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
            && self.audio.is_empty()
            && self.residue.is_empty()
            && self.flow.is_empty()
    }

    pub fn len(&self) -> usize {
        self.visuals.len() + self.audio.len() + self.residue.len() + self.flow.len()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_groups_by_collaborator() {
        let mut bus = MessageBus::new();
        let e = EntityId::from_raw(1);
        bus.publish(VisualEffect::Visibility { entity: e, visible: false });
        bus.publish(AudioCue::DoorOpening { door: e });
        bus.publish(GameFlow::Resumed);

        let batch = EffectBatch::drain_from(&mut bus);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.flow, vec![GameFlow::Resumed]);
        assert!(batch.residue.is_empty());
        assert_eq!(bus.total(), 0);
    }

    #[test]
    fn empty_bus_gives_empty_batch() {
        let mut bus = MessageBus::new();
        assert!(EffectBatch::drain_from(&mut bus).is_empty());
    }
}
