use thiserror::Error;

#[derive(Debug, Error)]
pub enum EsppError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// `when` is the requested date, or "latest" for a live quote.
    #[error("Price unavailable for {symbol} ({when}): {reason}")]
    PriceUnavailable {
        symbol: String,
        when: String,
        reason: String,
    },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EsppError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        EsppError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Arithmetic on `field` left the range a `Decimal` can hold.
    pub(crate) fn out_of_range(field: &str) -> Self {
        Self::invalid(field, "value out of range")
    }
}

impl From<serde_json::Error> for EsppError {
    fn from(e: serde_json::Error) -> Self {
        EsppError::SerializationError(e.to_string())
    }
}
