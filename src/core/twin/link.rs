//=========================================================================
// Twin Link State
//=========================================================================
//
// Data held by one half of a twin pair, plus the pure visibility rules.
//
//   L1 half:      visible ⇔ (global Origin ∧ resides in Origin)
//                          ∨ (global L1 ∧ resides in L1)
//   Origin half:  visible ⇔ ¬suppressed ∧ (global Origin ∨ (global L1 ∧ protected))
//   either half:  held ⇒ visible
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::math::Pose;
use crate::core::time::TimeState;

//=== TwinLink ============================================================

/// One half of a prop that exists in both timelines.
#[derive(Debug, Clone, PartialEq)]
pub struct TwinLink {
    pub twin_id: String,
    /// Timeline this half natively belongs to.
    pub native: TimeState,
    /// The other half. Non-owning; may dangle after destruction.
    pub twin: Option<EntityId>,

    /// The counterpart has been brought into this half's place.
    pub suppressed_in_own_timeline: bool,
    /// Origin half visible while the player stands in L1.
    pub illegal_visible_in_other_timeline: bool,
    pub stabilized_by_shield: bool,
    pub held: bool,

    /// `Some` ⇔ the L1 half physically resides in Origin at this pose.
    pub saved_origin_pose: Option<Pose>,
    /// Last pose the L1 half propagated to its Origin sibling.
    pub last_pose: Pose,
}

impl TwinLink {
    pub fn new(twin_id: impl Into<String>, native: TimeState, pose: Pose) -> Self {
        Self {
            twin_id: twin_id.into(),
            native,
            twin: None,
            suppressed_in_own_timeline: false,
            illegal_visible_in_other_timeline: false,
            stabilized_by_shield: false,
            held: false,
            saved_origin_pose: None,
            last_pose: pose,
        }
    }

    /// Timeline this half currently occupies physically.
    pub fn physical_timeline(&self) -> TimeState {
        match self.native {
            TimeState::L1 if self.saved_origin_pose.is_some() => TimeState::Origin,
            TimeState::Origin if self.suppressed_in_own_timeline => TimeState::L1,
            native => native,
        }
    }

    /// Whether the rules put this half on screen under `current`.
    pub fn visible_by_rules(&self, current: TimeState, self_protected: bool) -> bool {
        let by_rule = match self.native {
            TimeState::L1 => {
                let in_origin = self.saved_origin_pose.is_some();
                (current == TimeState::Origin && in_origin) || (current == TimeState::L1 && !in_origin)
            }
            TimeState::Origin => {
                !self.suppressed_in_own_timeline
                    && (current == TimeState::Origin || (current == TimeState::L1 && self_protected))
            }
        };

        by_rule || self.held
    }
}

//=========================================================================
// Tests
//=========================================================================
