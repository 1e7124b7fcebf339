//=========================================================================
// Twin Reconciliation
//=========================================================================
//
// Decides which half of a twin pair is present, visible and simulated.
//
// Entry points:
//   notify_grabbed / notify_dropped    ← pickable hold changes
//   twin_pre_time_change               ← clock pass 1
//   twin_on_time_changed               ← clock pass 2
//   twin_fixed_update                  ← every physics step (past dominance)
//   handle_automatic_portal_entry      ← single-object portal trip
//
// A missing sibling is logged and the step degrades to a no-op.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::link::TwinLink;
use crate::core::entity::EntityId;
use crate::core::math::Pose;
use crate::core::time::TimeState;
use crate::core::world::Stage;

//=== Stage: twin operations ==============================================

impl Stage {
    //--- Lookups ----------------------------------------------------------

    fn link(&self, id: EntityId) -> Option<&TwinLink> {
        self.entities.get(id).and_then(|e| e.twin.as_ref())
    }

    fn link_mut(&mut self, id: EntityId) -> Option<&mut TwinLink> {
        self.entities.get_mut(id).and_then(|e| e.twin.as_mut())
    }

    /// The live sibling of `id`, if any.
    fn sibling(&self, id: EntityId) -> Option<EntityId> {
        let twin = self.link(id)?.twin;
        match twin {
            Some(t) if self.link(t).is_some() => Some(t),
            Some(t) => {
                warn!("Twin {} of {} is gone", t, id);
                None
            }
            None => {
                warn!("{} has no twin assigned", id);
                None
            }
        }
    }

    fn set_suppressed(&mut self, id: EntityId, suppressed: bool) {
        if let Some(link) = self.link_mut(id) {
            link.suppressed_in_own_timeline = suppressed;
        }
    }

    /// Applies the visibility rules to one half.
    pub(crate) fn refresh_twin_visibility(&mut self, id: EntityId) {
        let current = self.current();
        let protected = self.is_protected(id);
        let Some(visible) = self.link(id).map(|l| l.visible_by_rules(current, protected)) else {
            return;
        };
        self.set_visible(id, visible);
    }

    fn suppress_sibling(&mut self, id: EntityId, suppressed: bool, refresh: bool) {
        if let Some(twin) = self.sibling(id) {
            self.set_suppressed(twin, suppressed);
            if refresh {
                self.refresh_twin_visibility(twin);
            }
        }
    }

    //--- Hold Notifications -----------------------------------------------

    pub(crate) fn notify_grabbed(&mut self, id: EntityId) {
        let current = self.current();
        let Some(link) = self.link_mut(id) else {
            return;
        };
        link.held = true;
        let native = link.native;
        debug!("{} grabbed (global {}, native {})", id, current, native);

        if current == native {
            return;
        }

        match native {
            TimeState::Origin => {
                link.illegal_visible_in_other_timeline = true;
            }
            TimeState::L1 => {
                // Picked up where it was left in Origin
                link.saved_origin_pose = None;
                self.suppress_sibling(id, true, true);
            }
        }
        self.set_visible(id, true);
    }

    pub(crate) fn notify_dropped(&mut self, id: EntityId) {
        let current = self.current();
        let protected_here = self.is_protected(id);
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let pose = entity.pose;
        let Some(link) = entity.twin.as_mut() else {
            return;
        };
        link.held = false;
        let native = link.native;
        debug!("{} dropped (global {}, native {})", id, current, native);

        if current != native {
            match native {
                TimeState::Origin => {
                    link.stabilized_by_shield = protected_here;
                    link.illegal_visible_in_other_timeline = protected_here;

                    if !protected_here {
                        debug!("{} dropped unprotected in L1: deactivated", id);
                        self.set_visible(id, false);
                        self.set_active(id, false);
                        return;
                    }
                    self.suppress_sibling(id, false, true);
                }
                TimeState::L1 => {
                    link.saved_origin_pose = Some(pose);
                    self.suppress_sibling(id, true, true);
                }
            }
        }

        self.refresh_twin_visibility(id);
    }

    //--- Clock Passes -----------------------------------------------------

    pub(crate) fn twin_pre_time_change(&mut self, id: EntityId, new_state: TimeState) {
        let Some(link) = self.link_mut(id) else {
            return;
        };
        let (held, native) = (link.held, link.native);

        if held && new_state != native {
            match native {
                TimeState::Origin => link.illegal_visible_in_other_timeline = true,
                TimeState::L1 => self.suppress_sibling(id, true, false),
            }
        } else if held && native == TimeState::L1 {
            // Carried home: the Origin sibling may exist again
            self.suppress_sibling(id, false, false);
        }

        if !held && new_state == native && native == TimeState::Origin {
            let Some(twin) = self.sibling(id) else {
                return;
            };
            let twin_protected = self.is_protected(twin);
            self.set_protected(id, twin_protected);
            self.set_broken(id, !twin_protected);
        }
    }

    pub(crate) fn twin_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        let protected_here = self.is_protected(id);
        let Some(link) = self.link_mut(id) else {
            return;
        };
        link.stabilized_by_shield = protected_here;
        if link.held {
            return;
        }
        let native = link.native;

        match (native, new_state) {
            (TimeState::Origin, TimeState::Origin) => {
                let Some(twin) = self.sibling(id) else {
                    self.finish_on_time_changed(id, new_state);
                    return;
                };
                if self.is_protected(twin) {
                    self.set_protected(id, true);
                }
                self.set_active(id, true);
                if let Some(twin_pose) = self.entities.get(twin).map(|e| e.pose) {
                    self.move_to(id, twin_pose);
                }
            }
            (TimeState::Origin, TimeState::L1) => {
                if protected_here {
                    let twin_protected = self.sibling(id).is_some_and(|t| self.is_protected(t));
                    if !twin_protected {
                        self.set_protected(id, false);
                        self.set_broken(id, true);
                    }
                }
            }
            (TimeState::L1, TimeState::Origin) => {
                let saved = self.link(id).and_then(|l| l.saved_origin_pose);
                if let Some(saved) = saved {
                    let physical = self.link(id).map(TwinLink::physical_timeline);
                    if physical == Some(TimeState::Origin) {
                        self.move_to(id, saved);
                        self.set_broken(id, false);
                    }
                }
                if protected_here {
                    if let Some(link) = self.link_mut(id) {
                        link.saved_origin_pose = None;
                    }
                }
            }
            (TimeState::L1, TimeState::L1) => {
                let (in_origin, last) = match self.link(id) {
                    Some(l) => (l.saved_origin_pose.is_some(), l.last_pose),
                    None => return,
                };
                if !in_origin {
                    self.suppress_sibling(id, false, true);
                    self.move_to(id, last);
                }
            }
        }

        self.finish_on_time_changed(id, new_state);
    }

    /// Clears per-visit flags on arriving home, then applies the rules.
    fn finish_on_time_changed(&mut self, id: EntityId, new_state: TimeState) {
        let Some(link) = self.link_mut(id) else {
            return;
        };

        if new_state == link.native {
            link.illegal_visible_in_other_timeline = false;
            if link.native == TimeState::L1 {
                link.stabilized_by_shield = false;
                self.set_protected(id, false);
            }
        }

        self.refresh_twin_visibility(id);
    }

    //--- Past Dominance ---------------------------------------------------

    /// Physics-step rule: a moving L1 half dictates its Origin sibling's pose.
    pub(crate) fn twin_fixed_update(&mut self, id: EntityId) {
        let current = self.current();
        let protected = self.is_protected(id);
        let (max_sq, max_deg) = (self.config.past_move_sq_threshold, self.config.past_turn_threshold);
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let pose = entity.pose;
        let Some(link) = entity.twin.as_mut() else {
            return;
        };
        let native = link.native;

        if native == TimeState::L1 && current != TimeState::Origin {
            if pose.differs_from(&link.last_pose, max_sq, max_deg) {
                link.last_pose = pose;
                if let Some(twin) = self.sibling(id) {
                    self.apply_past_authoritative_pose(twin, pose);
                }
            }
        } else if native == TimeState::Origin && current == TimeState::L1 && !protected {
            self.refresh_twin_visibility(id);
        }
    }

    /// Copies the past pose onto an Origin half that is not being held.
    pub(crate) fn apply_past_authoritative_pose(&mut self, id: EntityId, pose: Pose) {
        let current = self.current();
        let Some(link) = self.link_mut(id) else {
            return;
        };
        if link.native != TimeState::Origin || link.held {
            return;
        }

        let stale = link.illegal_visible_in_other_timeline || link.stabilized_by_shield;
        if current == TimeState::L1 && stale {
            link.illegal_visible_in_other_timeline = false;
            link.stabilized_by_shield = false;
            self.move_to(id, pose);
            self.set_visible(id, false);
        } else {
            self.move_to(id, pose);
        }
    }

    //--- Portals ----------------------------------------------------------

    /// Walks one half through a portal toward `target`.
    pub(crate) fn handle_automatic_portal_entry(&mut self, id: EntityId, target: TimeState) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let pose = entity.pose;
        let Some(link) = entity.twin.as_ref() else {
            return;
        };
        let (native, in_origin, suppressed) =
            (link.native, link.saved_origin_pose.is_some(), link.suppressed_in_own_timeline);
        debug!("{} portal {} -> {} (physical {})", id, native, target, link.physical_timeline());

        match (native, target) {
            (TimeState::L1, TimeState::L1) if in_origin => {
                if let Some(link) = self.link_mut(id) {
                    link.saved_origin_pose = None;
                }
                self.suppress_sibling(id, false, true);
            }
            (TimeState::L1, TimeState::Origin) if !in_origin => {
                if let Some(link) = self.link_mut(id) {
                    link.saved_origin_pose = Some(pose);
                }
                self.suppress_sibling(id, true, true);
            }
            (TimeState::Origin, TimeState::L1) => {
                let Some(twin) = self.sibling(id) else {
                    warn!("{} cannot follow its twin through the portal", id);
                    self.refresh_twin_visibility(id);
                    return;
                };
                if let Some(twin_pose) = self.entities.get(twin).map(|e| e.pose) {
                    self.move_to(id, twin_pose);
                }
                if let Some(link) = self.link_mut(twin) {
                    link.saved_origin_pose = None;
                }
                self.set_suppressed(id, false);
                self.set_visible(id, true);
                self.refresh_twin_visibility(twin);
            }
            (TimeState::Origin, TimeState::Origin) if suppressed => {
                self.set_suppressed(id, false);
                if let Some(twin) = self.sibling(id) {
                    let twin_pose = self.entities.get(twin).map(|e| e.pose);
                    if let Some(link) = self.link_mut(twin) {
                        link.saved_origin_pose = twin_pose;
                    }
                    self.refresh_twin_visibility(twin);
                }
            }
            _ => {}
        }

        self.refresh_twin_visibility(id);
    }
}
