//! Payment application engine.
//!
//! The single entry point for applying funding value to obligations. Every
//! path (customer payment, direct credit application, composite bill
//! payment) composes one allocation plan in `tally-core`, writes the
//! application rows it produced, and hands the touched rows to balance
//! recalculation. Either the whole operation commits or nothing is
//! written.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use tally_core::allocation::{
    compose_plan, AllocationError, AllocationRequest, FundingSource, ObligationTarget,
};
use tally_core::credit;
use tally_shared::types::{
    from_cents, to_cents, CompanyId, PaymentApplicationId, TransactionId,
};

use crate::entities::{line_items, payment_applications, transactions};
use crate::error::StoreError;
use crate::repositories::recalculation::{
    applied_against, applied_by, consumed_via_line_items, recalculate_funding_in,
    recalculate_obligation_in,
};
use crate::repositories::transaction::find_in_company;

/// A pre-existing unapplied credit contributing to a bill payment.
#[derive(Debug, Clone)]
pub struct CreditContribution {
    /// The credit transaction (e.g. an unapplied cheque).
    pub credit_id: TransactionId,
    /// How much of it this payment consumes.
    pub amount: Decimal,
}

/// A composite bill payment: cash and pre-existing credits across bills.
#[derive(Debug, Clone)]
pub struct BillPaymentInput {
    /// The funding transaction carrying the cash portion.
    pub payment_id: TransactionId,
    /// Cash contributed (zero when the bills are covered by credits alone).
    pub cash: Decimal,
    /// Pre-existing unapplied credits contributing funds.
    pub credits: Vec<CreditContribution>,
    /// Requested payment per bill.
    pub bills: Vec<AllocationRequest>,
}

/// Payment application repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Applies a customer payment across invoices.
    ///
    /// The payment's negative line items name the credits it consumes; the
    /// cash portion is the requested total minus those credits. All
    /// application rows are recorded under the payment's id, the consumed
    /// credits and the payment itself are recomputed, and every touched
    /// invoice is recalculated.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unresolved payment or invoice,
    /// `OverApplied` when an invoice would be driven past its remaining
    /// balance, and `FundsMismatch` when the consumed credits exceed the
    /// requested total. Nothing is written on error.
    pub async fn apply_payment(
        &self,
        company_id: CompanyId,
        payment_id: TransactionId,
        requests: &[AllocationRequest],
    ) -> Result<Vec<payment_applications::Model>, StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;

        let payment = find_in_company(&txn, company_id, payment_id).await?;
        if payment.kind()? != tally_core::posting::TransactionType::Payment {
            return Err(StoreError::NotFound {
                entity: "payment",
                id: payment_id.into_inner(),
            });
        }

        let consumed = consumed_credits_of(&txn, payment_id).await?;
        let consumed_total: i64 = consumed.iter().map(|(_, cents)| cents).sum();
        let requested_total: i64 = requests.iter().map(|r| to_cents(r.amount)).sum();
        let cash_cents = requested_total - consumed_total;
        if cash_cents < 0 {
            return Err(StoreError::Allocation(AllocationError::FundsMismatch {
                contributed: from_cents(consumed_total),
                requested: from_cents(requested_total),
            }));
        }

        let mut sources = Vec::with_capacity(consumed.len() + 1);
        if cash_cents > 0 {
            let own_capacity =
                payment.amount_cents - applied_by(&txn, payment_id).await? - consumed_total;
            sources.push(FundingSource {
                id: payment_id,
                contribution: from_cents(cash_cents),
                available: from_cents(own_capacity),
            });
        }
        for &(credit_id, cents) in &consumed {
            let credit = find_in_company(&txn, company_id, credit_id).await?;
            if !credit.kind()?.is_funding() {
                return Err(StoreError::NotFound {
                    entity: "credit",
                    id: credit_id.into_inner(),
                });
            }
            // The payment's own line items are already on disk; they must
            // not count against the credit while funding this very plan.
            let available =
                funding_available(&txn, &credit).await? + from_cents(cents);
            sources.push(FundingSource {
                id: credit_id,
                contribution: from_cents(cents),
                available,
            });
        }

        let targets = load_targets(&txn, company_id, requests).await?;
        let plan = compose_plan(&sources, &targets).map_err(StoreError::Allocation)?;

        let mut rows = Vec::new();
        for (invoice_id, amount) in plan.merged_by_obligation() {
            rows.push(insert_application(&txn, company_id, payment_id, invoice_id, amount).await?);
        }

        for &(credit_id, _) in &consumed {
            recalculate_funding_in(&txn, company_id, credit_id).await?;
        }
        recalculate_funding_in(&txn, company_id, payment_id).await?;
        for target in &targets {
            recalculate_obligation_in(&txn, company_id, target.id).await?;
        }

        txn.commit().await?;
        Ok(rows)
    }

    /// Applies an existing unapplied credit directly across invoices,
    /// decrementing its remaining balance through the credit lifecycle
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unresolved credit or invoice,
    /// `InsufficientCredit` when the credit cannot cover the requested
    /// total, and `OverApplied` when an invoice would be over-applied.
    /// Nothing is written on error.
    pub async fn apply_credit(
        &self,
        company_id: CompanyId,
        credit_id: TransactionId,
        requests: &[AllocationRequest],
    ) -> Result<Vec<payment_applications::Model>, StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;

        let credit = find_in_company(&txn, company_id, credit_id).await?;
        let kind = credit.kind()?;
        if !kind.is_funding() {
            return Err(StoreError::NotFound {
                entity: "credit",
                id: credit_id.into_inner(),
            });
        }

        let requested_total: i64 = requests.iter().map(|r| to_cents(r.amount)).sum();
        let sources = [FundingSource {
            id: credit_id,
            contribution: from_cents(requested_total),
            available: funding_available(&txn, &credit).await?,
        }];
        let targets = load_targets(&txn, company_id, requests).await?;
        let plan = compose_plan(&sources, &targets).map_err(StoreError::Allocation)?;

        let mut rows = Vec::new();
        for (invoice_id, amount) in plan.merged_by_obligation() {
            rows.push(insert_application(&txn, company_id, credit_id, invoice_id, amount).await?);
        }

        let (balance, status) =
            credit::consume(kind, credit.balance(), from_cents(requested_total));
        let mut active: transactions::ActiveModel = credit.into();
        active.balance_cents = Set(to_cents(balance));
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        for target in &targets {
            recalculate_obligation_in(&txn, company_id, target.id).await?;
        }

        txn.commit().await?;
        Ok(rows)
    }

    /// Applies a composite bill payment: cash plus pre-existing credits
    /// across several bills.
    ///
    /// One application row is written per (funding source, bill) pair the
    /// plan actually uses; each source's contribution is split across the
    /// bills proportionally with the exact remainder on the last.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unresolved transactions, `FundsMismatch`
    /// when contributed funds differ from the requested bill payments, and
    /// `OverApplied`/`InsufficientCredit` on capacity violations. Nothing
    /// is written on error.
    pub async fn apply_bill_payment(
        &self,
        company_id: CompanyId,
        input: BillPaymentInput,
    ) -> Result<Vec<payment_applications::Model>, StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;

        let payment = find_in_company(&txn, company_id, input.payment_id).await?;
        if !payment.kind()?.is_funding() {
            return Err(StoreError::NotFound {
                entity: "payment",
                id: input.payment_id.into_inner(),
            });
        }

        let mut sources = Vec::with_capacity(input.credits.len() + 1);
        if input.cash > Decimal::ZERO {
            sources.push(FundingSource {
                id: input.payment_id,
                contribution: input.cash,
                available: funding_available(&txn, &payment).await?,
            });
        }
        for contribution in &input.credits {
            let credit = find_in_company(&txn, company_id, contribution.credit_id).await?;
            if !credit.kind()?.is_funding() {
                return Err(StoreError::NotFound {
                    entity: "credit",
                    id: contribution.credit_id.into_inner(),
                });
            }
            sources.push(FundingSource {
                id: contribution.credit_id,
                contribution: contribution.amount,
                available: funding_available(&txn, &credit).await?,
            });
        }

        let targets = load_targets(&txn, company_id, &input.bills).await?;
        let plan = compose_plan(&sources, &targets).map_err(StoreError::Allocation)?;

        let mut rows = Vec::with_capacity(plan.applications.len());
        for application in &plan.applications {
            rows.push(
                insert_application(
                    &txn,
                    company_id,
                    application.source_id,
                    application.obligation_id,
                    application.amount,
                )
                .await?,
            );
        }

        for source in &sources {
            recalculate_funding_in(&txn, company_id, source.id).await?;
        }
        for target in &targets {
            recalculate_obligation_in(&txn, company_id, target.id).await?;
        }

        txn.commit().await?;
        Ok(rows)
    }
}

/// The credits a payment consumes, aggregated from its negative line items.
async fn consumed_credits_of<C: ConnectionTrait>(
    conn: &C,
    payment_id: TransactionId,
) -> Result<Vec<(TransactionId, i64)>, StoreError> {
    let lines = line_items::Entity::find()
        .filter(line_items::Column::TransactionId.eq(payment_id.into_inner()))
        .filter(line_items::Column::AmountCents.lt(0))
        .all(conn)
        .await?;

    let mut consumed: Vec<(TransactionId, i64)> = Vec::new();
    for line in lines {
        let Some(source) = line.source_transaction_id else {
            continue;
        };
        let credit_id = TransactionId::from_uuid(source);
        match consumed.iter_mut().find(|(id, _)| *id == credit_id) {
            Some((_, cents)) => *cents += -line.amount_cents,
            None => consumed.push((credit_id, -line.amount_cents)),
        }
    }
    Ok(consumed)
}

/// Structural remaining value of a funding transaction: its amount minus
/// application rows minus consumption tagged in other transactions' lines.
async fn funding_available<C: ConnectionTrait>(
    conn: &C,
    funding: &transactions::Model,
) -> Result<Decimal, StoreError> {
    let id = TransactionId::from_uuid(funding.id);
    let consumed = applied_by(conn, id).await? + consumed_via_line_items(conn, id).await?;
    Ok(from_cents(funding.amount_cents - consumed))
}

/// Loads obligation targets with their structural remaining balances,
/// merging duplicate requests against the same obligation so the
/// over-application guard sees the combined total.
async fn load_targets<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    requests: &[AllocationRequest],
) -> Result<Vec<ObligationTarget>, StoreError> {
    let mut merged: Vec<(TransactionId, i64)> = Vec::new();
    for request in requests {
        match merged.iter_mut().find(|(id, _)| *id == request.invoice_id) {
            Some((_, cents)) => *cents += to_cents(request.amount),
            None => merged.push((request.invoice_id, to_cents(request.amount))),
        }
    }

    let mut targets = Vec::with_capacity(merged.len());
    for (invoice_id, requested_cents) in merged {
        let invoice = find_in_company(conn, company_id, invoice_id).await?;
        if !invoice.kind()?.is_obligation() {
            return Err(StoreError::NotFound {
                entity: "obligation",
                id: invoice_id.into_inner(),
            });
        }
        let applied = applied_against(conn, invoice_id).await?;
        targets.push(ObligationTarget {
            id: invoice_id,
            requested: from_cents(requested_cents),
            remaining: from_cents(invoice.amount_cents - applied),
        });
    }
    Ok(targets)
}

/// Writes one application row.
async fn insert_application<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    payment_id: TransactionId,
    invoice_id: TransactionId,
    amount: Decimal,
) -> Result<payment_applications::Model, StoreError> {
    let row = payment_applications::ActiveModel {
        id: Set(PaymentApplicationId::new().into_inner()),
        company_id: Set(company_id.into_inner()),
        payment_id: Set(payment_id.into_inner()),
        invoice_id: Set(invoice_id.into_inner()),
        amount_applied_cents: Set(to_cents(amount)),
        created_at: Set(Utc::now().into()),
    };
    Ok(row.insert(conn).await?)
}
