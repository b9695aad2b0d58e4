//! Error types for patch-qa-core

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the data-model layer
#[derive(Debug, Error)]
pub enum Error {
    /// Ticket key has no row in the registry
    #[error("ticket {ticket} not found in {registry}")]
    TicketNotFound {
        /// The ticket key that was looked up
        ticket: String,
        /// Path of the registry that was searched
        registry: String,
    },

    /// Registry file is structurally unusable
    #[error("registry error: {0}")]
    Registry(String),

    /// Field-level validation failure
    #[error("validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_not_found_display() {
        let err = Error::TicketNotFound {
            ticket: "EAK-76".to_string(),
            registry: "pr_states.csv".to_string(),
        };
        assert!(err.to_string().contains("EAK-76"));
        assert!(err.to_string().contains("pr_states.csv"));
    }

    #[test]
    fn test_registry_error_display() {
        let err = Error::Registry("missing header".to_string());
        assert!(err.to_string().contains("missing header"));
    }
}
