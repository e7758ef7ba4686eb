//! Allocation error types.

use rust_decimal::Decimal;
use tally_shared::error::AppError;
use tally_shared::types::TransactionId;
use thiserror::Error;

/// Errors that can occur while composing an allocation plan.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The amounts applied to one obligation exceed its remaining balance.
    #[error(
        "Applying {requested} to {invoice_id} exceeds its remaining balance of {remaining}"
    )]
    OverApplied {
        /// The obligation transaction.
        invoice_id: TransactionId,
        /// Total amount requested against it in this operation.
        requested: Decimal,
        /// Its remaining balance.
        remaining: Decimal,
    },

    /// A funding source is asked for more than it has left.
    #[error("Drawing {requested} from credit {credit_id} exceeds its remaining {remaining}")]
    InsufficientCredit {
        /// The funding transaction.
        credit_id: TransactionId,
        /// Amount requested from it.
        requested: Decimal,
        /// Its remaining consumable value.
        remaining: Decimal,
    },

    /// Total contributed funds differ from total requested payments.
    #[error("Contributed funds {contributed} do not equal requested payments {requested}")]
    FundsMismatch {
        /// Sum of all funding contributions.
        contributed: Decimal,
        /// Sum of all requested obligation payments.
        requested: Decimal,
    },

    /// The plan has no funding sources or no obligations.
    #[error("Allocation plan needs at least one funding source and one obligation")]
    EmptyPlan,

    /// A contribution or requested amount is zero or negative.
    #[error("Allocation amounts must be positive")]
    NonPositiveAmount,
}

impl AllocationError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OverApplied { .. } | Self::InsufficientCredit { .. } => "OVER_APPLICATION",
            Self::FundsMismatch { .. } | Self::EmptyPlan | Self::NonPositiveAmount => {
                "VALIDATION_ERROR"
            }
        }
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err.error_code() {
            "OVER_APPLICATION" => Self::OverApplication(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
