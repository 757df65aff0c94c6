//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are grouped into
//! four [`ErrorKind`]s so the transport layer can decide how to report them without
//! matching on individual variants.

use thiserror::Error;

/// Broad classification of an [`Error`], used when reporting it to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User input was malformed or incomplete
    Validation,
    /// A page, slug, transaction or organization did not resolve
    NotFound,
    /// The target is not in a state that allows the operation
    StateConflict,
    /// Unexpected failure in a collaborator (database, environment, I/O)
    Internal,
}

/// All errors produced by the service.
#[derive(Debug, Error)]
pub enum Error {
    /// A builder edit left no collectible field
    #[error("At least one section with one field is required.")]
    EmptyBuilder,

    /// No payment method was supplied
    #[error("Payment method is required.")]
    MissingPaymentMethod,

    /// The payment method is not one of the accepted methods
    #[error("Unsupported payment method: {method}")]
    InvalidMethod {
        /// The method the payer sent
        method: String,
    },

    /// Required fields were left blank, in section-then-field order
    #[error("Missing required fields: {}.", .labels.join(", "))]
    MissingRequiredFields {
        /// Human-readable labels of the blank fields
        labels: Vec<String>,
    },

    /// A page without builder sections needs the four identity fields directly
    #[error("Full name, student ID, department, and year group are required for this PayPoint.")]
    MissingLegacyFields,

    /// No payer name could be resolved from the submission
    #[error("Full name is required to process this payment.")]
    MissingPayerName,

    /// A page creation or update request was rejected
    #[error("Invalid payment page: {message}")]
    InvalidPage {
        /// Why the request was rejected
        message: String,
    },

    /// An unknown page or transaction status was requested
    #[error("Status must be one of: {expected}. Got '{status}'.")]
    InvalidStatus {
        /// The status that was requested
        status: String,
        /// The statuses that are accepted
        expected: &'static str,
    },

    /// The page is not accepting payments in its current status
    #[error("This PayPoint is not currently accepting payments (status: {status}).")]
    NotAcceptingPayments {
        /// Current page status
        status: String,
    },

    /// Page lookup by id or slug failed
    #[error("PayPoint not found: {reference}")]
    PageNotFound {
        /// The id or slug that was looked up
        reference: String,
    },

    /// Transaction lookup failed
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Transaction id
        id: i64,
    },

    /// Organization lookup failed
    #[error("Organization not found: {id}")]
    OrganizationNotFound {
        /// Organization id
        id: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
    },

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure (listener, config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable was missing or invalid
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Classifies this error for reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyBuilder
            | Self::MissingPaymentMethod
            | Self::InvalidMethod { .. }
            | Self::MissingRequiredFields { .. }
            | Self::MissingLegacyFields
            | Self::MissingPayerName
            | Self::InvalidPage { .. }
            | Self::InvalidStatus { .. } => ErrorKind::Validation,
            Self::PageNotFound { .. }
            | Self::TransactionNotFound { .. }
            | Self::OrganizationNotFound { .. } => ErrorKind::NotFound,
            Self::NotAcceptingPayments { .. } => ErrorKind::StateConflict,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::EnvVar(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_labels_in_order() {
        let err = Error::MissingRequiredFields {
            labels: vec!["Full Name".to_string(), "Department".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: Full Name, Department."
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::NotAcceptingPayments {
                status: "draft".to_string()
            }
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            Error::PageNotFound {
                reference: "x".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Internal
        );
    }
}
