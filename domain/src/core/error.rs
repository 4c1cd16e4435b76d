//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid hypothesis: {0}")]
    InvalidHypothesis(String),

    #[error("Invalid instrument profile: {0}")]
    InvalidInstrument(String),

    #[error("Invalid citation: {0}")]
    InvalidCitation(String),

    #[error("Query contains no searchable terms")]
    EmptyQuery,
}

impl DomainError {
    /// Check if this error came from hypothesis validation
    pub fn is_invalid_hypothesis(&self) -> bool {
        matches!(self, DomainError::InvalidHypothesis(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_display() {
        let error = DomainError::EmptyQuery;
        assert_eq!(error.to_string(), "Query contains no searchable terms");
    }

    #[test]
    fn test_is_invalid_hypothesis_check() {
        assert!(DomainError::InvalidHypothesis("no title".to_string()).is_invalid_hypothesis());
        assert!(!DomainError::EmptyQuery.is_invalid_hypothesis());
        assert!(!DomainError::InvalidInstrument("x".to_string()).is_invalid_hypothesis());
    }
}
