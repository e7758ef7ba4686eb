//! Posting error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::engine::AccountRole;
use tally_shared::error::AppError;

/// Errors that can occur while building or validating postings.
#[derive(Debug, Error)]
pub enum PostingError {
    // ========== Validation Errors ==========
    /// Total debits and credits differ.
    #[error("Transaction is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Transaction produced no ledger entries.
    #[error("Transaction must have at least one ledger entry")]
    EmptyTransaction,

    /// Entry amount must be positive.
    #[error("Entry amount must be positive")]
    InvalidAmount,

    /// The transaction type requires a customer or vendor.
    #[error("A contact is required for {0} transactions")]
    MissingContact(super::types::TransactionType),

    /// A line item has no account to post against.
    #[error("Line item {index} has no account")]
    MissingLineAccount {
        /// Zero-based line index.
        index: usize,
    },

    /// The transaction type requires a bank or payment account.
    #[error("A bank or payment account is required for {0} transactions")]
    MissingPaymentAccount(super::types::TransactionType),

    // ========== Configuration Errors ==========
    /// A required chart-of-accounts role is not configured.
    #[error("No account configured for role {role}")]
    MissingAccountRole {
        /// The missing role.
        role: AccountRole,
    },

    /// A sales tax component has no target account.
    #[error("Sales tax component {name} has no tax-payable account")]
    MissingTaxAccount {
        /// The component name.
        name: String,
    },

    /// Tax was charged but no component has a non-zero calculated share.
    #[error("Tax amount {amount} charged with zero calculated tax basis")]
    ZeroTaxBasis {
        /// The charged tax amount.
        amount: Decimal,
    },
}

impl PostingError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unbalanced { .. }
            | Self::EmptyTransaction
            | Self::InvalidAmount
            | Self::MissingContact(_)
            | Self::MissingLineAccount { .. }
            | Self::MissingPaymentAccount(_) => "VALIDATION_ERROR",
            Self::MissingAccountRole { .. }
            | Self::MissingTaxAccount { .. }
            | Self::ZeroTaxBasis { .. } => "CONFIGURATION_ERROR",
        }
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err.error_code() {
            "CONFIGURATION_ERROR" => Self::Configuration(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::types::TransactionType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PostingError::Unbalanced {
                debit: dec!(100),
                credit: dec!(50),
            }
            .error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            PostingError::MissingAccountRole {
                role: AccountRole::AccountsReceivable,
            }
            .error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            PostingError::ZeroTaxBasis { amount: dec!(10) }.error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_display() {
        let err = PostingError::Unbalanced {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Transaction is not balanced. Debit: 100.00, Credit: 50.00"
        );

        let err = PostingError::MissingContact(TransactionType::Invoice);
        assert_eq!(
            err.to_string(),
            "A contact is required for invoice transactions"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = PostingError::EmptyTransaction.into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = PostingError::MissingTaxAccount {
            name: "GST".to_string(),
        }
        .into();
        assert_eq!(app.error_code(), "CONFIGURATION_ERROR");
    }
}
