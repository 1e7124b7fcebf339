//=========================================================================
// Visual Buckets
//=========================================================================
//
// Selection of the single active visual representation of an object, and
// bookkeeping for the overlays layered on top of it.
//
//   (timeline, condition, twin native) ──select_bucket──→ VisualBucket
//
// The renderer owns the actual meshes; this module only decides which
// bucket is on and publishes the change.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::condition::ObjectCondition;
use crate::core::effects::VisualEffect;
use crate::core::entity::EntityId;
use crate::core::message_bus::MessageBus;
use crate::core::time::TimeState;

//=== VisualBucket ========================================================

/// One of the mutually exclusive visual representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualBucket {
    /// Intact L1 look.
    L1,
    /// Broken Origin look.
    OriginBroken,
    /// Intact Origin look (L1 object seen from Origin).
    OriginOk,
    /// Energized wire in L1.
    L1Active,
    /// Energized wire in Origin.
    OriginActive,
}

//=== VisualSet ===========================================================

/// Which buckets an object actually has art for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualSet {
    pub l1: bool,
    pub origin_broken: bool,
    pub origin_ok: bool,
    pub l1_active: bool,
    pub origin_active: bool,
}

impl VisualSet {
    /// Standard three-bucket object.
    pub const STANDARD: VisualSet = VisualSet {
        l1: true,
        origin_broken: true,
        origin_ok: true,
        l1_active: false,
        origin_active: false,
    };

    /// Wire with energized variants.
    pub const WIRE: VisualSet = VisualSet {
        l1: true,
        origin_broken: true,
        origin_ok: true,
        l1_active: true,
        origin_active: true,
    };

    pub const NONE: VisualSet = VisualSet {
        l1: false,
        origin_broken: false,
        origin_ok: false,
        l1_active: false,
        origin_active: false,
    };

    pub fn has(&self, bucket: VisualBucket) -> bool {
        match bucket {
            VisualBucket::L1 => self.l1,
            VisualBucket::OriginBroken => self.origin_broken,
            VisualBucket::OriginOk => self.origin_ok,
            VisualBucket::L1Active => self.l1_active,
            VisualBucket::OriginActive => self.origin_active,
        }
    }

    fn pick(&self, bucket: VisualBucket) -> Option<VisualBucket> {
        self.has(bucket).then_some(bucket)
    }
}

impl Default for VisualSet {
    fn default() -> Self {
        Self::STANDARD
    }
}

//=== Selection ===========================================================

/// Chooses the bucket for a timeline object.
///
/// Twin halves defer to their native timeline: an Origin-native half
/// seen in L1 shows the broken look, an L1-native half seen in Origin
/// shows its L1 look.
pub fn select_bucket(
    state: TimeState,
    condition: ObjectCondition,
    twin_native: Option<TimeState>,
    set: &VisualSet,
) -> Option<VisualBucket> {
    match state {
        TimeState::L1 => {
            if twin_native == Some(TimeState::Origin) {
                set.pick(VisualBucket::OriginBroken)
            } else {
                set.pick(VisualBucket::L1).or_else(|| set.pick(VisualBucket::OriginOk))
            }
        }
        TimeState::Origin => {
            if twin_native == Some(TimeState::L1) {
                set.pick(VisualBucket::L1)
            } else if condition.is_broken() {
                set.pick(VisualBucket::OriginBroken)
                    .or_else(|| set.pick(VisualBucket::OriginOk))
            } else {
                set.pick(VisualBucket::OriginOk)
            }
        }
    }
}

/// Chooses the bucket for a wire. Energy or protection lights it up.
pub fn select_wire_bucket(
    state: TimeState,
    condition: ObjectCondition,
    energized: bool,
    set: &VisualSet,
) -> Option<VisualBucket> {
    if energized || condition.is_protected() {
        return match state {
            TimeState::L1 => set.pick(VisualBucket::L1Active),
            TimeState::Origin => set.pick(VisualBucket::OriginActive),
        };
    }

    match state {
        TimeState::L1 => set.pick(VisualBucket::L1),
        TimeState::Origin if condition.is_broken() => set.pick(VisualBucket::OriginBroken),
        TimeState::Origin => set.pick(VisualBucket::OriginOk),
    }
}

//=== VisualState =========================================================

/// Active bucket plus overlay flags for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    active: Option<VisualBucket>,
    protection_overlay: bool,
    highlighted: bool,
}

impl VisualState {
    pub fn active(&self) -> Option<VisualBucket> {
        self.active
    }

    pub fn has_protection_overlay(&self) -> bool {
        self.protection_overlay
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Deactivates the current bucket and activates `bucket`.
    ///
    /// The overlay is stripped from the old bucket and re-applied to the
    /// new one when `protected`.
    pub fn switch_to(
        &mut self,
        entity: EntityId,
        bucket: Option<VisualBucket>,
        protected: bool,
        bus: &mut MessageBus,
    ) {
        self.remove_protection(entity, bus);

        if self.active != bucket {
            self.active = bucket;
            bus.publish(VisualEffect::BucketChanged { entity, bucket });
        }

        if protected {
            self.apply_protection(entity, bus);
        }
    }

    /// Appends the protection overlay to the active bucket, at most once.
    pub fn apply_protection(&mut self, entity: EntityId, bus: &mut MessageBus) {
        if self.protection_overlay || self.highlighted {
            return;
        }
        let Some(bucket) = self.active else {
            return;
        };

        self.protection_overlay = true;
        bus.publish(VisualEffect::ProtectionOverlay { entity, bucket, applied: true });
    }

    pub fn remove_protection(&mut self, entity: EntityId, bus: &mut MessageBus) {
        if !self.protection_overlay {
            return;
        }

        self.protection_overlay = false;
        if let Some(bucket) = self.active {
            bus.publish(VisualEffect::ProtectionOverlay { entity, bucket, applied: false });
        }
    }

    pub fn set_highlight(&mut self, entity: EntityId, on: bool, bus: &mut MessageBus) {
        if self.highlighted == on || self.active.is_none() {
            return;
        }

        self.highlighted = on;
        bus.publish(VisualEffect::Highlight { entity, applied: on });
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ObjectCondition::*;

    const SET: VisualSet = VisualSet::STANDARD;

    #[test]
    fn plain_objects_follow_condition() {
        assert_eq!(select_bucket(TimeState::L1, Functional, None, &SET), Some(VisualBucket::L1));
        assert_eq!(
            select_bucket(TimeState::Origin, Broken, None, &SET),
            Some(VisualBucket::OriginBroken)
        );
        assert_eq!(
            select_bucket(TimeState::Origin, Protected { was_broken: true }, None, &SET),
            Some(VisualBucket::OriginOk)
        );
    }

    #[test]
    fn twins_defer_to_native_timeline() {
        assert_eq!(
            select_bucket(TimeState::L1, Functional, Some(TimeState::Origin), &SET),
            Some(VisualBucket::OriginBroken)
        );
        assert_eq!(
            select_bucket(TimeState::Origin, Broken, Some(TimeState::L1), &SET),
            Some(VisualBucket::L1)
        );
    }

    #[test]
    fn missing_art_falls_back() {
        let set = VisualSet { l1: false, origin_broken: false, ..VisualSet::STANDARD };
        assert_eq!(select_bucket(TimeState::L1, Functional, None, &set), Some(VisualBucket::OriginOk));
        assert_eq!(select_bucket(TimeState::Origin, Broken, None, &set), Some(VisualBucket::OriginOk));
        assert_eq!(select_bucket(TimeState::L1, Functional, None, &VisualSet::NONE), None);
    }

    #[test]
    fn wire_lights_up_when_energized_or_protected() {
        let w = VisualSet::WIRE;
        assert_eq!(select_wire_bucket(TimeState::L1, Functional, true, &w), Some(VisualBucket::L1Active));
        assert_eq!(
            select_wire_bucket(TimeState::Origin, Protected { was_broken: true }, false, &w),
            Some(VisualBucket::OriginActive)
        );
        assert_eq!(
            select_wire_bucket(TimeState::Origin, Broken, false, &w),
            Some(VisualBucket::OriginBroken)
        );
    }

    #[test]
    fn overlay_is_never_applied_twice() {
        let mut bus = MessageBus::new();
        let e = EntityId::from_raw(1);
        let mut v = VisualState::default();

        v.switch_to(e, Some(VisualBucket::OriginOk), true, &mut bus);
        v.apply_protection(e, &mut bus);
        v.apply_protection(e, &mut bus);

        let overlays = bus
            .read::<VisualEffect>()
            .iter()
            .filter(|fx| matches!(fx, VisualEffect::ProtectionOverlay { applied: true, .. }))
            .count();
        assert_eq!(overlays, 1);
    }

    #[test]
    fn switching_moves_overlay_to_new_bucket() {
        let mut bus = MessageBus::new();
        let e = EntityId::from_raw(1);
        let mut v = VisualState::default();

        v.switch_to(e, Some(VisualBucket::OriginOk), true, &mut bus);
        bus.clear_all();
        v.switch_to(e, Some(VisualBucket::L1), true, &mut bus);

        assert_eq!(
            bus.read::<VisualEffect>(),
            &[
                VisualEffect::ProtectionOverlay { entity: e, bucket: VisualBucket::OriginOk, applied: false },
                VisualEffect::BucketChanged { entity: e, bucket: Some(VisualBucket::L1) },
                VisualEffect::ProtectionOverlay { entity: e, bucket: VisualBucket::L1, applied: true },
            ]
        );
    }

    #[test]
    fn highlight_blocks_protection_overlay() {
        let mut bus = MessageBus::new();
        let e = EntityId::from_raw(1);
        let mut v = VisualState::default();
        v.switch_to(e, Some(VisualBucket::L1), false, &mut bus);
        v.set_highlight(e, true, &mut bus);
        v.apply_protection(e, &mut bus);
        assert!(!v.has_protection_overlay());
    }
}
