//=========================================================================
// Pickable
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::math::Vec3;

//=== Pickable ============================================================

/// Hold state of an object the player can carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickable {
    pub held: bool,
    /// Hand further than this from the object forces a drop.
    pub max_grab_distance: f32,
}

impl Pickable {
    pub fn new(max_grab_distance: f32) -> Self {
        Self { held: false, max_grab_distance }
    }

    /// True if a held object has lost contact with the hand.
    pub fn out_of_reach(&self, object: Vec3, hand: Vec3) -> bool {
        self.held && object.distance(hand) > self.max_grab_distance
    }
}

impl Default for Pickable {
    fn default() -> Self {
        Self::new(4.0)
    }
}

//=========================================================================
// Tests
//=========================================================================
