//=========================================================================
// Timeline Object
//=========================================================================
//
// Per-entity reaction to timeline changes.
//
// Architecture:
//   on_time_changed(new)
//     ├─ held?            → remember as deferred, stop
//     ├─ entering L1      → repair, snapshot Origin pose, residue, jump to L1 pose
//     ├─ entering Origin  → break unless protected, remember L1 pose
//     └─ always           → reselect visual bucket, settle dynamic body
//
// Everything observable leaves through the message bus as effects.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::debug;

//=== Internal Dependencies ===============================================

use super::condition::ObjectCondition;
use super::popup::{popup_icons, Capabilities, PopupState};
use super::visuals::{select_bucket, select_wire_bucket, VisualSet, VisualState};
use crate::core::config::WorldConfig;
use crate::core::effects::{ResidueEffect, VisualEffect};
use crate::core::entity::{Body, EntityId};
use crate::core::math::Pose;
use crate::core::message_bus::MessageBus;
use crate::core::time::TimeState;

//=== Descriptions ========================================================

/// Inspection text per condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptions {
    pub name: String,
    /// Shown in Origin when intact.
    pub origin: String,
    /// Shown in Origin when broken.
    pub broken: String,
    pub l1: String,
    pub additional: Vec<String>,
}

impl Default for Descriptions {
    fn default() -> Self {
        Self {
            name: "Object".to_string(),
            origin: String::new(),
            broken: String::new(),
            l1: String::new(),
            additional: Vec::new(),
        }
    }
}

//=== ObjectSettings ======================================================

/// Static configuration of a timeline object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSettings {
    pub use_focus: bool,
    pub start_protected: bool,
    pub use_position_saving: bool,
    pub capabilities: Capabilities,
    pub use_world_popup: bool,
    pub popup_text: String,
    /// Leave a residue marker when travelling away from a moved Origin pose.
    pub residue_marker: bool,
    pub residue_threshold: f32,
    pub visuals: VisualSet,
    pub descriptions: Descriptions,
    pub custom_inspection_duration: Option<Duration>,
    /// Shield items never break and never take protection.
    pub shield: bool,
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            use_focus: true,
            start_protected: false,
            use_position_saving: true,
            capabilities: Capabilities::default(),
            use_world_popup: false,
            popup_text: String::new(),
            residue_marker: false,
            residue_threshold: 0.1,
            visuals: VisualSet::STANDARD,
            descriptions: Descriptions::default(),
            custom_inspection_duration: None,
            shield: false,
        }
    }
}

//=== Look / Presence =====================================================

/// What visual selection needs to know about the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Look {
    pub entity: EntityId,
    /// Native timeline of the twin half, if twinned.
    pub twin_native: Option<TimeState>,
    /// `Some` for wires: whether any source energizes them.
    pub energized: Option<bool>,
}

impl Look {
    pub fn plain(entity: EntityId) -> Self {
        Self { entity, twin_native: None, energized: None }
    }
}

/// Mutable view of the owning entity during a transition.
pub struct Presence<'a> {
    pub look: Look,
    pub pose: &'a mut Pose,
    pub body: Option<&'a mut Body>,
    pub held: bool,
}

//=== TimelineObject ======================================================

/// Timeline state machine of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineObject {
    settings: ObjectSettings,
    condition: ObjectCondition,
    last_l1_pose: Pose,
    origin_pose_before_travel: Option<Pose>,
    residue_active: bool,
    visuals: VisualState,
    deferred: Option<TimeState>,
    popup: PopupState,
}

impl TimelineObject {
    //--- Construction -----------------------------------------------------

    /// Creates the object as it wakes up in `current` at `pose`.
    pub fn new(settings: ObjectSettings, current: TimeState, pose: Pose) -> Self {
        let condition = ObjectCondition::initial(
            current == TimeState::Origin,
            settings.start_protected,
            settings.shield,
        );

        Self {
            settings,
            condition,
            last_l1_pose: pose,
            origin_pose_before_travel: None,
            residue_active: false,
            visuals: VisualState::default(),
            deferred: None,
            popup: PopupState::default(),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn condition(&self) -> ObjectCondition {
        self.condition
    }

    pub fn settings(&self) -> &ObjectSettings {
        &self.settings
    }

    pub fn visuals(&self) -> &VisualState {
        &self.visuals
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn last_l1_pose(&self) -> Pose {
        self.last_l1_pose
    }

    /// Socketed devices hold their item in place across timelines.
    pub fn set_position_saving(&mut self, on: bool) {
        self.settings.use_position_saving = on;
    }

    /// Records `pose` as where the object stands in L1.
    pub fn save_l1_pose(&mut self, pose: Pose) {
        self.last_l1_pose = pose;
    }

    pub fn origin_pose_before_travel(&self) -> Option<Pose> {
        self.origin_pose_before_travel
    }

    pub fn has_residue(&self) -> bool {
        self.residue_active
    }

    /// Timeline update postponed while held.
    pub fn deferred(&self) -> Option<TimeState> {
        self.deferred
    }

    //--- Timeline Reaction ------------------------------------------------

    pub fn on_time_changed(
        &mut self,
        new_state: TimeState,
        presence: Presence<'_>,
        bus: &mut MessageBus,
    ) {
        let Presence { look, pose, body, held } = presence;

        if held {
            debug!("{} held: timeline update to {} deferred", look.entity, new_state);
            self.deferred = Some(new_state);
            return;
        }
        self.deferred = None;

        let twinned = look.twin_native.is_some();

        match new_state {
            TimeState::L1 => {
                // Origin halves of a twin keep their condition here
                if look.twin_native != Some(TimeState::Origin) {
                    let was_broken = self.condition.is_broken();
                    self.condition = self.condition.entering_l1();

                    if self.settings.use_position_saving && !twinned {
                        self.leave_origin(look.entity, pose, was_broken, bus);
                    }
                }
            }
            TimeState::Origin => {
                self.condition = self.condition.entering_origin();

                if self.settings.use_position_saving && !twinned {
                    self.last_l1_pose = *pose;
                    self.clear_residue(look.entity, bus);
                }
            }
        }

        self.refresh_visuals(look, new_state, bus);

        if self.settings.use_position_saving {
            if let Some(body) = body.filter(|b| !b.kinematic) {
                body.clear_velocity();
            }
        }
    }

    /// Applies the update deferred while held, for the current timeline.
    ///
    /// The object stays where it was dropped.
    pub fn release(&mut self, look: Look, current: TimeState, bus: &mut MessageBus) {
        let Some(missed) = self.deferred.take() else {
            return;
        };

        debug!("{} released: applying deferred {} as {}", look.entity, missed, current);
        self.condition = match current {
            TimeState::L1 if look.twin_native == Some(TimeState::Origin) => self.condition,
            TimeState::L1 => self.condition.entering_l1(),
            TimeState::Origin => self.condition.entering_origin(),
        };
        self.refresh_visuals(look, current, bus);
    }

    fn leave_origin(
        &mut self,
        entity: EntityId,
        pose: &mut Pose,
        was_broken: bool,
        bus: &mut MessageBus,
    ) {
        let before = *pose;
        self.origin_pose_before_travel = Some(before);

        let moved = before.position.distance(self.last_l1_pose.position);
        if self.settings.residue_marker && moved > self.settings.residue_threshold {
            self.residue_active = true;
            bus.publish(ResidueEffect::Spawn { entity, pose: before, was_broken });
        }

        *pose = self.last_l1_pose;
        if before != *pose {
            bus.publish(VisualEffect::Moved { entity, pose: *pose });
        }
    }

    fn clear_residue(&mut self, entity: EntityId, bus: &mut MessageBus) {
        if self.residue_active {
            self.residue_active = false;
            bus.publish(ResidueEffect::Clear { entity });
        }
    }

    //--- Condition --------------------------------------------------------

    /// Grants or withdraws protection. Returns `true` if it changed.
    ///
    /// Regular objects get the overlay toggled on the active bucket;
    /// wires reselect their bucket instead.
    pub fn set_protected(
        &mut self,
        protected: bool,
        look: Look,
        current: TimeState,
        bus: &mut MessageBus,
    ) -> bool {
        let next = self.condition.with_protected(protected);
        if next == self.condition {
            return false;
        }
        self.condition = next;

        if look.energized.is_some() {
            self.refresh_visuals(look, current, bus);
        } else if protected {
            self.visuals.apply_protection(look.entity, bus);
        } else {
            self.visuals.remove_protection(look.entity, bus);
        }
        true
    }

    /// Sets the broken flag without touching visuals.
    pub fn set_broken(&mut self, broken: bool) {
        self.condition = self.condition.with_broken(broken);
    }

    pub fn break_object(&mut self, look: Look, current: TimeState, bus: &mut MessageBus) {
        self.set_broken(true);
        self.refresh_visuals(look, current, bus);
    }

    pub fn repair(&mut self, look: Look, current: TimeState, bus: &mut MessageBus) {
        self.set_broken(false);
        self.refresh_visuals(look, current, bus);
    }

    /// Forgets travel bookkeeping and settles the body.
    pub fn reset(&mut self, body: Option<&mut Body>) {
        self.origin_pose_before_travel = None;
        self.deferred = None;
        if self.settings.use_position_saving {
            if let Some(body) = body.filter(|b| !b.kinematic) {
                body.clear_velocity();
            }
        }
    }

    /// Reselects the active bucket for `current`.
    pub fn refresh_visuals(&mut self, look: Look, current: TimeState, bus: &mut MessageBus) {
        let set = &self.settings.visuals;
        let (bucket, overlay) = match look.energized {
            Some(energized) => (select_wire_bucket(current, self.condition, energized, set), false),
            None => (
                select_bucket(current, self.condition, look.twin_native, set),
                self.condition.is_protected(),
            ),
        };
        self.visuals.switch_to(look.entity, bucket, overlay, bus);
    }

    //--- Inspection -------------------------------------------------------

    pub fn describe(&self, current: TimeState) -> String {
        self.describe_with(current, None)
    }

    /// Description with one extra status line after the additional info.
    pub fn describe_with(&self, current: TimeState, status: Option<&str>) -> String {
        let d = &self.settings.descriptions;
        let base = match current {
            TimeState::Origin if self.condition.is_broken() => &d.broken,
            TimeState::Origin => &d.origin,
            TimeState::L1 => &d.l1,
        };

        let additional = d
            .additional
            .iter()
            .map(String::as_str)
            .chain(status)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        format!("{base}\n\n{additional}")
    }

    /// How long the inspection text stays up: custom if set, otherwise
    /// scaled by word count into 3..=10 seconds.
    pub fn inspection_display_duration(&self, current: TimeState) -> Duration {
        if let Some(custom) = self.settings.custom_inspection_duration.filter(|d| !d.is_zero()) {
            return custom;
        }

        let words = self.describe(current).split(' ').count() as f32;
        Duration::from_secs_f32((2.0 + words * 0.4).clamp(3.0, 10.0))
    }

    pub fn can_be_inspected(&self, active: bool) -> bool {
        self.settings.capabilities.inspectable && active
    }

    //--- Focus & Popup ----------------------------------------------------

    /// Highlights the active bucket. Protected objects are never highlighted.
    pub fn focus(&mut self, entity: EntityId, bus: &mut MessageBus) {
        if !self.settings.use_focus || self.condition.is_protected() {
            return;
        }
        self.visuals.set_highlight(entity, true, bus);
    }

    pub fn unfocus(&mut self, entity: EntityId, bus: &mut MessageBus) {
        if !self.settings.use_focus {
            return;
        }
        self.visuals.set_highlight(entity, false, bus);
    }

    /// Shows the popup if the camera is within inspect range.
    ///
    /// Returns `true` if a pending hide must be cancelled.
    pub fn show_popup(
        &mut self,
        entity: EntityId,
        distance: f32,
        config: &WorldConfig,
        bus: &mut MessageBus,
    ) -> bool {
        if !self.settings.use_focus || !self.settings.use_world_popup {
            return false;
        }
        if distance > config.inspect_range {
            return false;
        }

        let cancelled = std::mem::take(&mut self.popup.hide_pending);
        self.popup.active = true;
        self.update_popup(entity, distance, config, bus, true);
        cancelled
    }

    /// Marks the popup for delayed hiding. Returns `true` if the caller
    /// should schedule the hide.
    pub fn request_popup_hide(&mut self) -> bool {
        if !self.settings.use_focus || !self.settings.use_world_popup {
            return false;
        }
        if !self.popup.active || self.popup.hide_pending {
            return false;
        }

        self.popup.hide_pending = true;
        true
    }

    pub fn hide_popup(&mut self, entity: EntityId, bus: &mut MessageBus) {
        self.popup.hide_pending = false;
        if self.popup.active {
            self.popup.active = false;
            bus.publish(VisualEffect::PopupHidden { entity });
        }
    }

    /// Re-evaluates icons while the popup tracks the camera.
    pub fn refresh_popup(
        &mut self,
        entity: EntityId,
        distance: f32,
        config: &WorldConfig,
        bus: &mut MessageBus,
    ) {
        if self.popup.active {
            self.update_popup(entity, distance, config, bus, false);
        }
    }

    fn update_popup(
        &mut self,
        entity: EntityId,
        distance: f32,
        config: &WorldConfig,
        bus: &mut MessageBus,
        force: bool,
    ) {
        let icons = popup_icons(
            distance,
            self.settings.capabilities,
            config.inspect_range,
            config.interact_range,
        );

        match icons {
            None => {
                self.popup.hide_pending = false;
                self.popup.active = false;
                bus.publish(VisualEffect::PopupHidden { entity });
            }
            Some(icons) if icons.any() && (force || icons != self.popup.icons) => {
                self.popup.icons = icons;
                bus.publish(VisualEffect::PopupShown { entity, icons });
            }
            Some(icons) => self.popup.icons = icons,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vec3;
    use crate::core::object::VisualBucket;

    fn id() -> EntityId {
        EntityId::from_raw(3)
    }

    fn look() -> Look {
        Look::plain(id())
    }

    fn travel(
        obj: &mut TimelineObject,
        to: TimeState,
        pose: &mut Pose,
        bus: &mut MessageBus,
    ) {
        obj.on_time_changed(to, Presence { look: look(), pose, body: None, held: false }, bus);
    }

    #[test]
    fn origin_breaks_and_l1_repairs() {
        let mut bus = MessageBus::new();
        let mut pose = Pose::default();
        let mut obj = TimelineObject::new(ObjectSettings::default(), TimeState::Origin, pose);
        assert!(obj.condition().is_broken());

        travel(&mut obj, TimeState::L1, &mut pose, &mut bus);
        assert!(!obj.condition().is_broken());
        assert_eq!(obj.visuals().active(), Some(VisualBucket::L1));

        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        assert!(obj.condition().is_broken());
        assert_eq!(obj.visuals().active(), Some(VisualBucket::OriginBroken));
    }

    #[test]
    fn protected_object_survives_origin() {
        let mut bus = MessageBus::new();
        let mut pose = Pose::default();
        let settings = ObjectSettings { start_protected: true, ..ObjectSettings::default() };
        let mut obj = TimelineObject::new(settings, TimeState::Origin, pose);

        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        assert!(!obj.condition().is_broken());
        assert_eq!(obj.visuals().active(), Some(VisualBucket::OriginOk));
        assert!(obj.visuals().has_protection_overlay());
    }

    #[test]
    fn round_trip_lands_on_saved_l1_pose() {
        let mut bus = MessageBus::new();
        let start = Pose::at(Vec3::new(1.0, 0.0, 0.0));
        let mut obj = TimelineObject::new(ObjectSettings::default(), TimeState::Origin, start);

        // Origin pose drifts before the first trip; the L1 pose stays put
        let mut pose = Pose::at(Vec3::new(4.0, 0.0, 0.0));
        travel(&mut obj, TimeState::L1, &mut pose, &mut bus);
        assert_eq!(pose, start);
        assert_eq!(obj.origin_pose_before_travel(), Some(Pose::at(Vec3::new(4.0, 0.0, 0.0))));

        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        assert_eq!(obj.last_l1_pose(), start);
        travel(&mut obj, TimeState::L1, &mut pose, &mut bus);
        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        assert_eq!(pose, start);
    }

    #[test]
    fn residue_spawns_only_past_threshold() {
        let mut bus = MessageBus::new();
        let settings = ObjectSettings { residue_marker: true, ..ObjectSettings::default() };
        let mut pose = Pose::default();
        let mut obj = TimelineObject::new(settings, TimeState::Origin, pose);

        pose.position = Vec3::new(0.05, 0.0, 0.0);
        travel(&mut obj, TimeState::L1, &mut pose, &mut bus);
        assert!(!obj.has_residue());

        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        pose.position = Vec3::new(2.0, 0.0, 0.0);
        bus.clear_all();
        travel(&mut obj, TimeState::L1, &mut pose, &mut bus);
        assert!(obj.has_residue());
        assert!(matches!(
            bus.read::<ResidueEffect>(),
            [ResidueEffect::Spawn { was_broken: true, .. }]
        ));

        travel(&mut obj, TimeState::Origin, &mut pose, &mut bus);
        assert!(!obj.has_residue());
        assert_eq!(bus.read::<ResidueEffect>().last(), Some(&ResidueEffect::Clear { entity: id() }));
    }

    #[test]
    fn held_object_defers_and_is_not_moved() {
        let mut bus = MessageBus::new();
        let mut pose = Pose::at(Vec3::new(9.0, 0.0, 0.0));
        let mut obj = TimelineObject::new(ObjectSettings::default(), TimeState::Origin, Pose::default());

        obj.on_time_changed(
            TimeState::L1,
            Presence { look: look(), pose: &mut pose, body: None, held: true },
            &mut bus,
        );
        assert_eq!(pose.position.x, 9.0);
        assert!(obj.condition().is_broken());
        assert_eq!(obj.deferred(), Some(TimeState::L1));

        obj.release(look(), TimeState::L1, &mut bus);
        assert!(!obj.condition().is_broken());
        assert_eq!(obj.deferred(), None);
        assert_eq!(pose.position.x, 9.0);
    }

    #[test]
    fn dynamic_body_velocity_cleared_after_transition() {
        let mut bus = MessageBus::new();
        let mut pose = Pose::default();
        let mut body = Body::dynamic();
        body.velocity = Vec3::new(0.0, -3.0, 0.0);
        let mut obj = TimelineObject::new(ObjectSettings::default(), TimeState::Origin, pose);

        obj.on_time_changed(
            TimeState::L1,
            Presence { look: look(), pose: &mut pose, body: Some(&mut body), held: false },
            &mut bus,
        );
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn description_joins_additional_lines() {
        let settings = ObjectSettings {
            descriptions: Descriptions {
                broken: "A broken lamp".into(),
                l1: "A lamp".into(),
                additional: vec!["Glows".into(), String::new(), "Hums".into()],
                ..Descriptions::default()
            },
            ..ObjectSettings::default()
        };
        let obj = TimelineObject::new(settings, TimeState::Origin, Pose::default());

        assert_eq!(obj.describe(TimeState::Origin), "A broken lamp\n\nGlows\nHums");
        assert_eq!(obj.describe(TimeState::L1), "A lamp\n\nGlows\nHums");
        assert_eq!(obj.describe_with(TimeState::L1, Some("Charged")), "A lamp\n\nGlows\nHums\nCharged");
    }

    #[test]
    fn inspection_duration_is_clamped() {
        let short = TimelineObject::new(ObjectSettings::default(), TimeState::L1, Pose::default());
        assert_eq!(short.inspection_display_duration(TimeState::L1), Duration::from_secs(3));

        let long_text = vec!["word"; 40].join(" ");
        let settings = ObjectSettings {
            descriptions: Descriptions { l1: long_text, ..Descriptions::default() },
            ..ObjectSettings::default()
        };
        let long = TimelineObject::new(settings, TimeState::L1, Pose::default());
        assert_eq!(long.inspection_display_duration(TimeState::L1), Duration::from_secs(10));

        let settings = ObjectSettings {
            custom_inspection_duration: Some(Duration::from_millis(1500)),
            ..ObjectSettings::default()
        };
        let custom = TimelineObject::new(settings, TimeState::L1, Pose::default());
        assert_eq!(custom.inspection_display_duration(TimeState::L1), Duration::from_millis(1500));
    }

    #[test]
    fn protected_objects_refuse_focus_highlight() {
        let mut bus = MessageBus::new();
        let settings = ObjectSettings { start_protected: true, ..ObjectSettings::default() };
        let mut obj = TimelineObject::new(settings, TimeState::L1, Pose::default());
        obj.refresh_visuals(look(), TimeState::L1, &mut bus);

        obj.focus(id(), &mut bus);
        assert!(!obj.visuals().is_highlighted());
    }

    #[test]
    fn popup_hide_is_requested_once() {
        let mut bus = MessageBus::new();
        let cfg = WorldConfig::default();
        let settings = ObjectSettings { use_world_popup: true, ..ObjectSettings::default() };
        let mut obj = TimelineObject::new(settings, TimeState::L1, Pose::default());

        assert!(!obj.request_popup_hide());
        obj.show_popup(id(), 1.0, &cfg, &mut bus);
        assert!(obj.popup().is_active());
        assert!(obj.request_popup_hide());
        assert!(!obj.request_popup_hide());
        assert!(obj.show_popup(id(), 1.0, &cfg, &mut bus));

        obj.refresh_popup(id(), 50.0, &cfg, &mut bus);
        assert!(!obj.popup().is_active());
    }

    #[test]
    fn shield_ignores_protection() {
        let mut bus = MessageBus::new();
        let settings = ObjectSettings { shield: true, ..ObjectSettings::default() };
        let mut obj = TimelineObject::new(settings, TimeState::Origin, Pose::default());
        assert!(!obj.set_protected(true, look(), TimeState::Origin, &mut bus));
        assert!(!obj.condition().is_broken());
    }
}
