//! Double-entry balance validation.

use rust_decimal::Decimal;
use tally_shared::types::to_cents;

use super::error::PostingError;
use super::types::{EntryType, PostingLine};

/// Validates that a set of posting lines forms a balanced transaction.
///
/// Totals are accumulated in integer cents, so a set of lines that rounds to
/// balanced at 2 decimal places passes.
///
/// # Errors
///
/// Returns an error if the lines are empty, carry a non-positive amount, or
/// do not balance.
pub fn validate_lines(lines: &[PostingLine]) -> Result<(), PostingError> {
    if lines.is_empty() {
        return Err(PostingError::EmptyTransaction);
    }

    let mut debit_cents = 0i64;
    let mut credit_cents = 0i64;

    for line in lines {
        if line.amount <= Decimal::ZERO {
            return Err(PostingError::InvalidAmount);
        }
        match line.entry_type {
            EntryType::Debit => debit_cents += to_cents(line.amount),
            EntryType::Credit => credit_cents += to_cents(line.amount),
        }
    }

    if debit_cents != credit_cents {
        return Err(PostingError::Unbalanced {
            debit: tally_shared::types::from_cents(debit_cents),
            credit: tally_shared::types::from_cents(credit_cents),
        });
    }

    Ok(())
}
