//=========================================================================
// Twin Links
//=========================================================================
//
// Two entities representing one prop in both timelines.
//
//=========================================================================

//=== Module Declarations =================================================

mod link;
mod reconcile;

//=== Public API ==========================================================

pub use link::TwinLink;
