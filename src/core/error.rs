//=========================================================================
// World Errors
//=========================================================================
//
// Errors returned at the World API boundary.
//
// Only caller mistakes surface here (unknown ids, missing components,
// out-of-range phases). Misconfiguration discovered while propagating
// inside the world is logged and skipped instead.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::entity::EntityId;

//=== WorldError ==========================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    #[error("phase {phase} out of range (switches have {max} phases)")]
    InvalidPhase { phase: usize, max: usize },

    #[error("entity {0} cannot be linked to itself")]
    SelfLink(EntityId),

    #[error("twins {a} and {b} share native timeline")]
    SameTimelineTwins { a: EntityId, b: EntityId },
}

impl WorldError {
    pub(crate) fn missing(entity: EntityId, component: &'static str) -> Self {
        WorldError::MissingComponent { entity, component }
    }
}

/// Result alias for World operations.
pub type WorldResult<T> = Result<T, WorldError>;

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = WorldError::missing(EntityId::from_raw(4), "twin");
        assert_eq!(err.to_string(), "entity #4 has no twin component");
        assert_eq!(
            WorldError::UnknownEntity(EntityId::from_raw(2)).to_string(),
            "entity #2 does not exist"
        );
    }
}
