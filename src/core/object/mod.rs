//=========================================================================
// Timeline Objects
//=========================================================================
//
// Per-entity timeline state: condition, visual buckets, popup gating and
// hold state.
//
//=========================================================================

//=== Module Declarations =================================================

mod condition;
mod pickable;
mod popup;
mod timeline_object;
mod visuals;

//=== Public API ==========================================================

pub use condition::ObjectCondition;
pub use pickable::Pickable;
pub use popup::{popup_icons, Capabilities, PopupIcons, PopupState};
pub use timeline_object::{Descriptions, Look, ObjectSettings, Presence, TimelineObject};
pub use visuals::{select_bucket, select_wire_bucket, VisualBucket, VisualSet, VisualState};
