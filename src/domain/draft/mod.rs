// ============================================================================
// Draft Domain - the in-progress order before submission
// ============================================================================
//
// - Value objects (MenuId, AddonId, OrderInstance, OrderDraft)
// - Instance identity (InstanceKey)
// - Actions (DraftAction)
// - Reducer (pure transitions)
// - Errors (DraftError)
// - Handler (DraftHandler: action -> reducer -> storage)
//
// ============================================================================

pub mod value_objects;
pub mod instance_key;
pub mod actions;
pub mod errors;
pub mod reducer;
pub mod handler;

pub use value_objects::*;
pub use instance_key::*;
pub use actions::*;
pub use errors::*;
pub use reducer::*;
pub use handler::*;
