//=========================================================================
// Object Condition
//=========================================================================
//
// Single tagged state replacing independent broken/protected/shield flags.
//
//   Functional ──break──→ Broken
//       │                   │
//   protect(true)       protect(true)
//       ↓                   ↓
//   Protected{was_broken: false / true}
//       │
//   protect(false) → back to Functional / Broken
//
//   ShieldException: absorbs every transition.
//
//=========================================================================

/// Condition of a timeline object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectCondition {
    #[default]
    Functional,

    Broken,

    /// Shielded from breaking. `was_broken` is what remains once the
    /// protection is withdrawn.
    Protected { was_broken: bool },

    /// Shield items: never broken, never protected.
    ShieldException,
}

impl ObjectCondition {
    /// Condition of a freshly spawned object. Anything unprotected that
    /// wakes up in Origin starts broken.
    pub fn initial(in_origin: bool, start_protected: bool, shield: bool) -> Self {
        match (shield, start_protected) {
            (true, _) => ObjectCondition::ShieldException,
            (false, true) => ObjectCondition::Protected { was_broken: false },
            (false, false) if in_origin => ObjectCondition::Broken,
            (false, false) => ObjectCondition::Functional,
        }
    }

    pub fn is_broken(self) -> bool {
        matches!(self, ObjectCondition::Broken)
    }

    pub fn is_protected(self) -> bool {
        matches!(self, ObjectCondition::Protected { .. })
    }

    pub fn is_shield(self) -> bool {
        matches!(self, ObjectCondition::ShieldException)
    }

    /// Sets or clears the broken state, keeping protection.
    pub fn with_broken(self, broken: bool) -> Self {
        match self {
            ObjectCondition::ShieldException => self,
            ObjectCondition::Protected { .. } => ObjectCondition::Protected { was_broken: broken },
            _ if broken => ObjectCondition::Broken,
            _ => ObjectCondition::Functional,
        }
    }

    /// Grants or withdraws protection.
    pub fn with_protected(self, protected: bool) -> Self {
        match (self, protected) {
            (ObjectCondition::ShieldException, _) => self,
            (ObjectCondition::Functional, true) => ObjectCondition::Protected { was_broken: false },
            (ObjectCondition::Broken, true) => ObjectCondition::Protected { was_broken: true },
            (ObjectCondition::Protected { was_broken }, false) => {
                if was_broken {
                    ObjectCondition::Broken
                } else {
                    ObjectCondition::Functional
                }
            }
            (same, _) => same,
        }
    }

    /// Entering Origin breaks everything that is not protected.
    pub fn entering_origin(self) -> Self {
        match self {
            ObjectCondition::Functional | ObjectCondition::Broken => ObjectCondition::Broken,
            other => other,
        }
    }

    /// Entering L1 repairs everything.
    pub fn entering_l1(self) -> Self {
        self.with_broken(false)
    }
}

//=========================================================================
// Tests
//=========================================================================
