//! Property-based tests for allocation plan composition.
//!
//! - Conservation: row totals equal contributions, column totals equal
//!   requested amounts, for any viable plan.
//! - Rejection: over-application and fund mismatches never produce a plan.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::from_cents;

use super::error::AllocationError;
use super::plan::{compose_plan, FundingSource, ObligationTarget};
use tally_shared::types::TransactionId;

/// Strategy for requested obligation amounts in cents ($0.01 to $50,000).
fn requested_cents() -> impl Strategy<Value = i64> {
    1i64..5_000_000
}

/// Splits a total into `parts` positive cent amounts.
fn split_total(total: i64, parts: usize) -> Vec<i64> {
    let parts = parts.min(usize::try_from(total).unwrap_or(1)).max(1);
    let base = total / i64::try_from(parts).unwrap_or(1);
    let mut amounts = vec![base; parts];
    let mut leftover = total - base * i64::try_from(parts).unwrap_or(1);
    let mut index = 0;
    while leftover > 0 {
        amounts[index % parts] += 1;
        leftover -= 1;
        index += 1;
    }
    amounts.retain(|&a| a > 0);
    amounts
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A viable plan conserves every row and column total exactly.
    #[test]
    fn prop_plan_conserves_rows_and_columns(
        requested in proptest::collection::vec(requested_cents(), 1..6),
        source_count in 1usize..5,
    ) {
        let total: i64 = requested.iter().sum();
        let contributions = split_total(total, source_count);

        let targets: Vec<ObligationTarget> = requested
            .iter()
            .map(|&cents| ObligationTarget {
                id: TransactionId::new(),
                requested: from_cents(cents),
                remaining: from_cents(cents),
            })
            .collect();
        let sources: Vec<FundingSource> = contributions
            .iter()
            .map(|&cents| FundingSource {
                id: TransactionId::new(),
                contribution: from_cents(cents),
                available: from_cents(cents),
            })
            .collect();

        let plan = compose_plan(&sources, &targets).unwrap();

        for source in &sources {
            prop_assert_eq!(plan.drawn_from(source.id), source.contribution);
        }
        for target in &targets {
            prop_assert_eq!(plan.applied_to(target.id), target.requested);
        }
        prop_assert!(plan.applications.iter().all(|a| a.amount > Decimal::ZERO));
    }

    /// Requesting more than an obligation's remaining balance is always
    /// rejected, regardless of how the funding side is arranged.
    #[test]
    fn prop_over_application_rejected(
        remaining in requested_cents(),
        excess in 1i64..100_000,
    ) {
        let requested = remaining + excess;
        let sources = [FundingSource {
            id: TransactionId::new(),
            contribution: from_cents(requested),
            available: from_cents(requested),
        }];
        let targets = [ObligationTarget {
            id: TransactionId::new(),
            requested: from_cents(requested),
            remaining: from_cents(remaining),
        }];

        prop_assert!(matches!(
            compose_plan(&sources, &targets),
            Err(AllocationError::OverApplied { .. })
        ));
    }

    /// Contributions that do not add up to the requested total are always
    /// rejected.
    #[test]
    fn prop_funds_mismatch_rejected(
        requested in requested_cents(),
        delta in 1i64..100_000,
    ) {
        let sources = [FundingSource {
            id: TransactionId::new(),
            contribution: from_cents(requested + delta),
            available: from_cents(requested + delta),
        }];
        let targets = [ObligationTarget {
            id: TransactionId::new(),
            requested: from_cents(requested),
            remaining: from_cents(requested),
        }];

        prop_assert!(matches!(
            compose_plan(&sources, &targets),
            Err(AllocationError::FundsMismatch { .. })
        ));
    }
}
