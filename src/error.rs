//! Error types for the pricing core
//!
//! Item-level failures (`InvalidInput`, `ProfileNotFound`) are captured into the
//! batch result for that item. `ProviderUnavailable` aborts a batch before any
//! item is priced.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PricingError>;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Non-positive cost, non-positive or non-finite rate, bad quotation date, bad profile field
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Exchange rate provider failed or returned unusable values
    #[error("exchange rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PricingError::InvalidInput(message.into())
    }

    /// Whether this error is confined to a single priced item
    pub fn is_item_local(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidInput(_) | PricingError::ProfileNotFound(_)
        )
    }
}
