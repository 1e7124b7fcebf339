//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types.
//
// Usage:
//   use timeshift_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Runtime
pub use crate::engine::{Engine, EngineBuilder, EngineError, EngineHandle};

// World
pub use crate::core::{EntityBuilder, EntityId, World, WorldCommand, WorldConfig};
pub use crate::core::{WorldError, WorldResult};

// Timeline
pub use crate::core::TimeState;

// Effects
pub use crate::core::{AudioCue, EffectBatch, GameFlow, ResidueEffect, VisualEffect};

// Geometry
pub use crate::core::{Pose, Quat, Vec3};
