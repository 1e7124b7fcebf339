//=========================================================================
// Shields
//=========================================================================
//
// The pickable shield item and the protective zone it carries.
//
//=========================================================================

//=== Module Declarations =================================================

mod item;
mod zone;

//=== Public API ==========================================================

pub use item::ShieldItem;
pub use zone::ShieldZone;
