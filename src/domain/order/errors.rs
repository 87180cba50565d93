// ============================================================================
// Order Business Rule Errors
// ============================================================================

/// Submission attempted with nothing in the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Your cart is empty")]
pub struct EmptyCartError;
