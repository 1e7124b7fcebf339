//=========================================================================
// Command Bridge Interface
//=========================================================================
//
// Caller-to-core contract: the commands other threads may send to a
// running world.
//
// Every variant maps onto one `World` operation. Commands that name a
// missing entity or component are rejected by the world and logged on
// the logic thread; they never stop the loop.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;
use crate::core::math::{Pose, Vec3};
use crate::core::time::TimeState;

//=== WorldCommand ========================================================

/// Requests sent to the logic thread over the command channel.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCommand {
    //--- Timeline ---
    ToggleTime,
    ChangeTime(TimeState),
    ObjectTimeTravel { entity: EntityId, target: TimeState },

    //--- Hand ---
    Grab(EntityId),
    Drop(EntityId),
    ForceDropIfOutOfReach { entity: EntityId, hand: Vec3 },
    /// Physics collaborator reports where an entity ended up.
    MoveEntity { entity: EntityId, pose: Pose },

    //--- Devices ---
    Interact(EntityId),
    SetPowered { switch: EntityId, on: bool },
    AttachShield { shield: EntityId, holder: EntityId },
    DetachShield(EntityId),
    ZoneEnter { zone: EntityId, target: EntityId },
    ZoneExit { zone: EntityId, target: EntityId },
    OpenDoor(EntityId),
    CloseDoor(EntityId),
    InsertCard { console: EntityId, card: EntityId },
    InsertBattery { charger: EntityId, battery: EntityId },
    RemoveBattery(EntityId),

    //--- Object State ---
    SetProtected { entity: EntityId, protected: bool },
    Break(EntityId),
    Repair(EntityId),

    //--- Gaze ---
    SetCamera(Option<Vec3>),
    Focus(EntityId),
    Unfocus(EntityId),

    /// Stops the logic thread after the current frame.
    Shutdown,
}
