// ============================================================================
// Cart Validation Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a drug name")]
    EmptyDrugName,

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
}

impl ValidationError {
    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::EmptyDrugName => "empty_drug_name",
            ValidationError::InvalidQuantity(_) => "invalid_quantity",
        }
    }
}
