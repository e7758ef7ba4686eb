//! Per-type sign conventions and lifecycle transitions for unapplied credits.
//!
//! Funding transactions track unconsumed value in their `balance`, with a
//! sign convention that depends on the transaction type: deposits, customer
//! credits, and vendor credits store a negative balance (value owed back),
//! while cheques and payments store a positive balance (leftover usable
//! cash). The duality is an explicit per-type policy, not something to
//! unify: callers always move through `remaining_value`/`signed_balance`
//! instead of touching the sign directly.

use rust_decimal::Decimal;
use tally_shared::types::{is_settled, round2};

use crate::posting::types::{TransactionStatus, TransactionType};

/// True for types whose unconsumed value is stored as a negative balance.
const fn has_negative_balance(transaction_type: TransactionType) -> bool {
    matches!(
        transaction_type,
        TransactionType::Deposit
            | TransactionType::CustomerCredit
            | TransactionType::VendorCredit
    )
}

/// Converts a stored signed balance into the unconsumed value (always
/// non-negative for a healthy row).
#[must_use]
pub fn remaining_value(transaction_type: TransactionType, balance: Decimal) -> Decimal {
    if has_negative_balance(transaction_type) {
        -balance
    } else {
        balance
    }
}

/// Converts an unconsumed value back into the type's stored sign.
#[must_use]
pub fn signed_balance(transaction_type: TransactionType, remaining: Decimal) -> Decimal {
    if has_negative_balance(transaction_type) {
        -remaining
    } else {
        remaining
    }
}

/// Status for a funding transaction with the given unconsumed value.
#[must_use]
pub fn status_for(remaining: Decimal) -> TransactionStatus {
    if is_settled(remaining) {
        TransactionStatus::Completed
    } else {
        TransactionStatus::UnappliedCredit
    }
}

/// Applies a consumption against a funding transaction's stored balance.
///
/// Returns the new stored balance and status. A remainder within the
/// settlement tolerance collapses to zero/completed.
#[must_use]
pub fn consume(
    transaction_type: TransactionType,
    balance: Decimal,
    amount: Decimal,
) -> (Decimal, TransactionStatus) {
    let remaining = round2(remaining_value(transaction_type, balance) - amount);
    state_from_remaining(transaction_type, remaining)
}

/// Adds consumed value back to a funding transaction's stored balance.
///
/// The amount is added to the current balance, not reset to the original
/// amount, so a credit partially consumed by several obligations stays
/// correct when only one of them is deleted.
#[must_use]
pub fn restore(
    transaction_type: TransactionType,
    balance: Decimal,
    amount: Decimal,
) -> (Decimal, TransactionStatus) {
    let remaining = round2(remaining_value(transaction_type, balance) + amount);
    state_from_remaining(transaction_type, remaining)
}

fn state_from_remaining(
    transaction_type: TransactionType,
    remaining: Decimal,
) -> (Decimal, TransactionStatus) {
    if is_settled(remaining) {
        (Decimal::ZERO, TransactionStatus::Completed)
    } else {
        (
            signed_balance(transaction_type, remaining),
            TransactionStatus::UnappliedCredit,
        )
    }
}

/// Initial balance and status for a newly created transaction.
///
/// Obligations open with their full amount outstanding. Funding types open
/// as unapplied credits carrying their full value in the type's sign; a
/// deposit or cheque without a contact is a plain transfer with nothing to
/// consume, as are the immediately-settled types.
#[must_use]
pub fn initial_state(
    transaction_type: TransactionType,
    amount: Decimal,
    has_contact: bool,
) -> (TransactionStatus, Decimal) {
    let amount = round2(amount);
    match transaction_type {
        TransactionType::Invoice | TransactionType::Bill => (TransactionStatus::Open, amount),
        TransactionType::Payment => (TransactionStatus::UnappliedCredit, amount),
        TransactionType::Cheque | TransactionType::Deposit if has_contact => (
            TransactionStatus::UnappliedCredit,
            signed_balance(transaction_type, amount),
        ),
        TransactionType::CustomerCredit | TransactionType::VendorCredit => (
            TransactionStatus::UnappliedCredit,
            signed_balance(transaction_type, amount),
        ),
        _ => (TransactionStatus::Completed, Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(TransactionType::Deposit, dec!(-1000), dec!(1000))]
    #[case(TransactionType::CustomerCredit, dec!(-250), dec!(250))]
    #[case(TransactionType::VendorCredit, dec!(-80), dec!(80))]
    #[case(TransactionType::Cheque, dec!(150), dec!(150))]
    #[case(TransactionType::Payment, dec!(500), dec!(500))]
    fn test_sign_convention_round_trip(
        #[case] transaction_type: TransactionType,
        #[case] balance: Decimal,
        #[case] remaining: Decimal,
    ) {
        assert_eq!(remaining_value(transaction_type, balance), remaining);
        assert_eq!(signed_balance(transaction_type, remaining), balance);
    }

    #[test]
    fn test_consume_partial_keeps_unapplied() {
        let (balance, status) = consume(TransactionType::Deposit, dec!(-1000), dec!(600));
        assert_eq!(balance, dec!(-400));
        assert_eq!(status, TransactionStatus::UnappliedCredit);

        let (balance, status) = consume(TransactionType::Cheque, dec!(150), dec!(150));
        assert_eq!(balance, Decimal::ZERO);
        assert_eq!(status, TransactionStatus::Completed);
    }

    #[test]
    fn test_consume_within_tolerance_completes() {
        let (balance, status) = consume(TransactionType::Payment, dec!(100), dec!(99.995));
        assert_eq!(balance, Decimal::ZERO);
        assert_eq!(status, TransactionStatus::Completed);
    }

    #[test]
    fn test_restore_adds_to_current_balance() {
        // A deposit partially consumed by two invoices: deleting one adds
        // only that invoice's share back.
        let (balance, status) = restore(TransactionType::Deposit, dec!(-400), dec!(600));
        assert_eq!(balance, dec!(-1000));
        assert_eq!(status, TransactionStatus::UnappliedCredit);
    }

    #[test]
    fn test_restore_from_completed() {
        let (balance, status) = restore(TransactionType::Cheque, Decimal::ZERO, dec!(150));
        assert_eq!(balance, dec!(150));
        assert_eq!(status, TransactionStatus::UnappliedCredit);
    }

    #[rstest]
    #[case(TransactionType::Invoice, dec!(500), true, TransactionStatus::Open, dec!(500))]
    #[case(TransactionType::Bill, dec!(300), true, TransactionStatus::Open, dec!(300))]
    #[case(
        TransactionType::Payment,
        dec!(500),
        true,
        TransactionStatus::UnappliedCredit,
        dec!(500)
    )]
    #[case(
        TransactionType::Deposit,
        dec!(1000),
        true,
        TransactionStatus::UnappliedCredit,
        dec!(-1000)
    )]
    #[case(TransactionType::Deposit, dec!(1000), false, TransactionStatus::Completed, dec!(0))]
    #[case(
        TransactionType::Cheque,
        dec!(150),
        true,
        TransactionStatus::UnappliedCredit,
        dec!(150)
    )]
    #[case(TransactionType::Cheque, dec!(150), false, TransactionStatus::Completed, dec!(0))]
    #[case(
        TransactionType::CustomerCredit,
        dec!(250),
        true,
        TransactionStatus::UnappliedCredit,
        dec!(-250)
    )]
    #[case(TransactionType::Expense, dec!(75), false, TransactionStatus::Completed, dec!(0))]
    #[case(
        TransactionType::JournalEntry,
        dec!(75),
        false,
        TransactionStatus::Completed,
        dec!(0)
    )]
    fn test_initial_state(
        #[case] transaction_type: TransactionType,
        #[case] amount: Decimal,
        #[case] has_contact: bool,
        #[case] expected_status: TransactionStatus,
        #[case] expected_balance: Decimal,
    ) {
        let (status, balance) = initial_state(transaction_type, amount, has_contact);
        assert_eq!(status, expected_status);
        assert_eq!(balance, expected_balance);
    }

    #[test]
    fn test_status_for_threshold() {
        assert_eq!(status_for(dec!(0.004)), TransactionStatus::Completed);
        assert_eq!(status_for(dec!(0.01)), TransactionStatus::UnappliedCredit);
    }
}
