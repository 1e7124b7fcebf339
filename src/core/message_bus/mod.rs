//=========================================================================
// Message Bus
//=========================================================================

//=== Module Declarations =================================================

mod message_bus;
mod message_queue;

//=== Public API ==========================================================

pub use message_bus::{Message, MessageBus};
