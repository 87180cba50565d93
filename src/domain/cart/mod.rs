// ============================================================================
// Cart Domain
// ============================================================================
//
// - Value objects (LineItemId, LineItemDraft, LineItem, image previews)
// - Errors (ValidationError)
// - Cart model (add / remove / seal)
//
// ============================================================================

pub mod errors;
pub mod model;
pub mod value_objects;

pub use errors::*;
pub use model::*;
pub use value_objects::*;
