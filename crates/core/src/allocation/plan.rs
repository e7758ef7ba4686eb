//! Allocation plan composition.
//!
//! A plan assigns funding-source value to obligations. Composition validates
//! every capacity limit up front, so either the whole plan is viable or
//! nothing is written. Splitting a source across several obligations uses
//! proportional shares with the exact remainder going to the final open
//! obligation, accumulated in integer cents.

use rust_decimal::Decimal;
use tally_shared::types::{from_cents, round2, to_cents, TransactionId};

use super::error::AllocationError;

/// A caller's request to apply an amount to one obligation.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    /// The obligation transaction (invoice or bill).
    pub invoice_id: TransactionId,
    /// Amount to apply.
    pub amount: Decimal,
}

/// One side supplying value: cash from a payment, or an unapplied credit.
#[derive(Debug, Clone)]
pub struct FundingSource {
    /// The funding transaction.
    pub id: TransactionId,
    /// How much this source contributes to the plan.
    pub contribution: Decimal,
    /// How much consumable value the source has left.
    pub available: Decimal,
}

/// One side consuming value: an obligation with remaining balance.
#[derive(Debug, Clone)]
pub struct ObligationTarget {
    /// The obligation transaction.
    pub id: TransactionId,
    /// Amount requested against it in this operation.
    pub requested: Decimal,
    /// Its remaining balance before this operation.
    pub remaining: Decimal,
}

/// A planned (funding source, obligation) application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedApplication {
    /// The funding transaction.
    pub source_id: TransactionId,
    /// The obligation transaction.
    pub obligation_id: TransactionId,
    /// Amount the source covers for this obligation.
    pub amount: Decimal,
}

/// The composed plan: one application per (source, obligation) pair used.
#[derive(Debug, Clone, Default)]
pub struct AllocationPlan {
    /// Planned applications, in source order then obligation order.
    pub applications: Vec<PlannedApplication>,
}

impl AllocationPlan {
    /// Total planned value.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.applications.iter().map(|a| a.amount).sum()
    }

    /// Total planned against one obligation.
    #[must_use]
    pub fn applied_to(&self, obligation_id: TransactionId) -> Decimal {
        self.applications
            .iter()
            .filter(|a| a.obligation_id == obligation_id)
            .map(|a| a.amount)
            .sum()
    }

    /// Total planned out of one funding source.
    #[must_use]
    pub fn drawn_from(&self, source_id: TransactionId) -> Decimal {
        self.applications
            .iter()
            .filter(|a| a.source_id == source_id)
            .map(|a| a.amount)
            .sum()
    }

    /// Collapses the plan to one amount per obligation, preserving obligation
    /// order of first appearance. Used when all sources are recorded under a
    /// single funding transaction.
    #[must_use]
    pub fn merged_by_obligation(&self) -> Vec<(TransactionId, Decimal)> {
        let mut merged: Vec<(TransactionId, Decimal)> = Vec::new();
        for application in &self.applications {
            match merged
                .iter_mut()
                .find(|(id, _)| *id == application.obligation_id)
            {
                Some((_, amount)) => *amount += application.amount,
                None => merged.push((application.obligation_id, application.amount)),
            }
        }
        merged
    }
}

/// Composes an allocation plan from funding sources and obligation targets.
///
/// Validation order:
/// 1. Every contribution and requested amount must be positive.
/// 2. Per obligation, requested must not exceed its remaining balance.
/// 3. Per source, its contribution must not exceed its available value.
/// 4. Total contributions must equal total requested payments.
///
/// Each source is then split across the still-open obligations in proportion
/// to their remaining requested amounts; the final open obligation receives
/// the exact remainder, and the last source absorbs whatever the earlier
/// splits left, so row and column totals are both exact in cents.
///
/// # Errors
///
/// Returns the first violated constraint; nothing is partially composed.
pub fn compose_plan(
    sources: &[FundingSource],
    targets: &[ObligationTarget],
) -> Result<AllocationPlan, AllocationError> {
    if sources.is_empty() || targets.is_empty() {
        return Err(AllocationError::EmptyPlan);
    }

    for target in targets {
        if target.requested <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveAmount);
        }
        if to_cents(target.requested) > to_cents(target.remaining) {
            return Err(AllocationError::OverApplied {
                invoice_id: target.id,
                requested: target.requested,
                remaining: target.remaining,
            });
        }
    }

    for source in sources {
        if source.contribution <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveAmount);
        }
        if to_cents(source.contribution) > to_cents(source.available) {
            return Err(AllocationError::InsufficientCredit {
                credit_id: source.id,
                requested: source.contribution,
                remaining: source.available,
            });
        }
    }

    let requested_cents: i64 = targets.iter().map(|t| to_cents(t.requested)).sum();
    let contributed_cents: i64 = sources.iter().map(|s| to_cents(s.contribution)).sum();
    if requested_cents != contributed_cents {
        return Err(AllocationError::FundsMismatch {
            contributed: from_cents(contributed_cents),
            requested: from_cents(requested_cents),
        });
    }

    let mut open: Vec<i64> = targets.iter().map(|t| to_cents(t.requested)).collect();
    let mut applications = Vec::new();

    for (source_index, source) in sources.iter().enumerate() {
        let contribution = to_cents(source.contribution);
        let row = if source_index + 1 == sources.len() {
            // The last source covers exactly what the earlier splits left.
            open.clone()
        } else {
            split_source(source, contribution, &open)
        };

        for (target_index, &cents) in row.iter().enumerate() {
            open[target_index] -= cents;
            if cents > 0 {
                applications.push(PlannedApplication {
                    source_id: source.id,
                    obligation_id: targets[target_index].id,
                    amount: from_cents(cents),
                });
            }
        }
    }

    Ok(AllocationPlan { applications })
}

/// Splits one source's contribution across the open obligation amounts,
/// proportional shares for all but the final open obligation, which takes
/// the remainder. Shares never exceed an obligation's open amount; rounding
/// spill moves to the next obligation with room.
fn split_source(source: &FundingSource, contribution: i64, open: &[i64]) -> Vec<i64> {
    let total_open: i64 = open.iter().sum();
    let last_open = open.iter().rposition(|&cents| cents > 0);
    let mut row = vec![0i64; open.len()];
    let mut distributed = 0i64;

    for (index, &open_cents) in open.iter().enumerate() {
        if open_cents == 0 {
            continue;
        }
        let share = if Some(index) == last_open {
            (contribution - distributed).min(open_cents)
        } else {
            let proportional = round2(
                source.contribution * from_cents(open_cents) / from_cents(total_open),
            );
            to_cents(proportional)
                .min(open_cents)
                .min(contribution - distributed)
        };
        row[index] = share;
        distributed += share;
    }

    let mut leftover = contribution - distributed;
    for (index, &open_cents) in open.iter().enumerate() {
        if leftover == 0 {
            break;
        }
        let room = open_cents - row[index];
        let add = room.min(leftover);
        row[index] += add;
        leftover -= add;
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn source(contribution: Decimal, available: Decimal) -> FundingSource {
        FundingSource {
            id: TransactionId::new(),
            contribution,
            available,
        }
    }

    fn target(requested: Decimal, remaining: Decimal) -> ObligationTarget {
        ObligationTarget {
            id: TransactionId::new(),
            requested,
            remaining,
        }
    }

    #[test]
    fn test_single_source_single_target() {
        let sources = [source(dec!(500), dec!(500))];
        let targets = [target(dec!(500), dec!(500))];
        let plan = compose_plan(&sources, &targets).unwrap();
        assert_eq!(plan.applications.len(), 1);
        assert_eq!(plan.applications[0].amount, dec!(500));
    }

    #[test]
    fn test_cash_and_cheque_across_two_bills() {
        // $350 cash + $150 cheque paying bill A $300 and bill B $200:
        // cash splits proportionally 210/140, the cheque covers the rest.
        let cash = source(dec!(350), dec!(350));
        let cheque = source(dec!(150), dec!(150));
        let bill_a = target(dec!(300), dec!(300));
        let bill_b = target(dec!(200), dec!(200));
        let plan =
            compose_plan(&[cash.clone(), cheque.clone()], &[bill_a.clone(), bill_b.clone()])
                .unwrap();

        assert_eq!(plan.applied_to(bill_a.id), dec!(300));
        assert_eq!(plan.applied_to(bill_b.id), dec!(200));
        assert_eq!(plan.drawn_from(cash.id), dec!(350));
        assert_eq!(plan.drawn_from(cheque.id), dec!(150));

        let cash_to_a = plan
            .applications
            .iter()
            .find(|a| a.source_id == cash.id && a.obligation_id == bill_a.id)
            .unwrap();
        assert_eq!(cash_to_a.amount, dec!(210));
    }

    #[test]
    fn test_over_application_rejected() {
        let sources = [source(dec!(250), dec!(250))];
        let targets = [target(dec!(250), dec!(200))];
        let result = compose_plan(&sources, &targets);
        assert!(matches!(
            result,
            Err(AllocationError::OverApplied { requested, remaining, .. })
                if requested == dec!(250) && remaining == dec!(200)
        ));
    }

    #[test]
    fn test_insufficient_credit_rejected() {
        let sources = [source(dec!(100), dec!(40))];
        let targets = [target(dec!(100), dec!(100))];
        assert!(matches!(
            compose_plan(&sources, &targets),
            Err(AllocationError::InsufficientCredit { .. })
        ));
    }

    #[test]
    fn test_funds_mismatch_rejected() {
        let sources = [source(dec!(400), dec!(400))];
        let targets = [target(dec!(500), dec!(500))];
        assert!(matches!(
            compose_plan(&sources, &targets),
            Err(AllocationError::FundsMismatch { contributed, requested })
                if contributed == dec!(400) && requested == dec!(500)
        ));
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!(matches!(
            compose_plan(&[], &[target(dec!(10), dec!(10))]),
            Err(AllocationError::EmptyPlan)
        ));
        assert!(matches!(
            compose_plan(&[source(dec!(10), dec!(10))], &[]),
            Err(AllocationError::EmptyPlan)
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        assert!(matches!(
            compose_plan(
                &[source(dec!(10), dec!(10))],
                &[target(Decimal::ZERO, dec!(10))]
            ),
            Err(AllocationError::NonPositiveAmount)
        ));
        assert!(matches!(
            compose_plan(
                &[source(dec!(-5), dec!(10))],
                &[target(dec!(10), dec!(10))]
            ),
            Err(AllocationError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_partial_application_allowed() {
        // Applying less than the remaining balance is fine.
        let sources = [source(dec!(100), dec!(100))];
        let targets = [target(dec!(100), dec!(600))];
        let plan = compose_plan(&sources, &targets).unwrap();
        assert_eq!(plan.total(), dec!(100));
    }

    #[test]
    fn test_rounding_keeps_row_and_column_totals_exact() {
        // Three sources over three obligations with awkward proportions.
        let sources = [
            source(dec!(100.01), dec!(200)),
            source(dec!(33.33), dec!(50)),
            source(dec!(0.03), dec!(1)),
        ];
        let targets = [
            target(dec!(44.45), dec!(100)),
            target(dec!(44.46), dec!(100)),
            target(dec!(44.46), dec!(100)),
        ];
        let plan = compose_plan(&sources, &targets).unwrap();

        for s in &sources {
            assert_eq!(plan.drawn_from(s.id), s.contribution);
        }
        for t in &targets {
            assert_eq!(plan.applied_to(t.id), t.requested);
        }
        assert!(plan.applications.iter().all(|a| a.amount > Decimal::ZERO));
    }

    #[test]
    fn test_merged_by_obligation() {
        let cash = source(dec!(60), dec!(60));
        let credit = source(dec!(40), dec!(40));
        let invoice = target(dec!(100), dec!(100));
        let plan = compose_plan(&[cash, credit], &[invoice.clone()]).unwrap();

        let merged = plan.merged_by_obligation();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], (invoice.id, dec!(100)));
    }
}
