//! Authoritative balance/status recomputation.
//!
//! `payment_applications` rows are the sole source of truth for
//! consumption; the balance and status written here supersede any
//! optimistic increment performed mid-operation. Recomputation is
//! idempotent: repeated calls with no intervening writes are no-ops.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use tally_core::credit;
use tally_core::posting::TransactionStatus;
use tally_shared::types::{from_cents, is_settled, to_cents, CompanyId, TransactionId};

use crate::entities::{line_items, payment_applications, transactions};
use crate::error::StoreError;
use crate::repositories::transaction::find_in_company;

/// Balance recalculation service.
#[derive(Debug, Clone)]
pub struct RecalculationService {
    db: DatabaseConnection,
}

impl RecalculationService {
    /// Creates a new recalculation service.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Authoritatively recomputes an obligation's balance and status from
    /// its application rows: `balance = amount - sum(applied)`; settled
    /// balances are written as zero with status paid.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id is not an invoice or bill in the
    /// company.
    pub async fn recalculate_invoice_balance(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<transactions::Model, StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;
        let updated = recalculate_obligation_in(&txn, company_id, id).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Recomputes every obligation in the company sequentially. Each row's
    /// recompute is independently atomic and idempotent, so a failure is
    /// logged and the batch resumes with the next row.
    ///
    /// Returns the number of rows recomputed successfully.
    ///
    /// # Errors
    ///
    /// Returns an error only if the obligation listing itself fails.
    pub async fn recalculate_all(&self, company_id: CompanyId) -> Result<usize, StoreError> {
        let obligations = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id.into_inner()))
            .filter(
                transactions::Column::TransactionType.is_in(["invoice", "bill"]),
            )
            .all(&self.db)
            .await?;

        let mut recalculated = 0usize;
        for obligation in obligations {
            let id = TransactionId::from_uuid(obligation.id);
            match self.recalculate_invoice_balance(company_id, id).await {
                Ok(_) => recalculated += 1,
                Err(err) => {
                    tracing::warn!(
                        transaction_id = %id,
                        error = %err,
                        "balance recomputation failed; resuming with next row"
                    );
                }
            }
        }
        Ok(recalculated)
    }
}

/// Recomputes an obligation's balance/status on any connection.
pub(crate) async fn recalculate_obligation_in<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: TransactionId,
) -> Result<transactions::Model, StoreError> {
    let transaction = find_in_company(conn, company_id, id).await?;
    if !transaction.kind()?.is_obligation() {
        return Err(StoreError::NotFound {
            entity: "obligation",
            id: id.into_inner(),
        });
    }

    let applied_cents = applied_against(conn, id).await?;
    let remaining_cents = transaction.amount_cents - applied_cents;

    // An obligation within a cent of zero counts as settled.
    let (balance_cents, status) = if remaining_cents <= 1 {
        (0, TransactionStatus::Paid)
    } else if applied_cents > 0 {
        (remaining_cents, TransactionStatus::Partial)
    } else {
        (remaining_cents, TransactionStatus::Open)
    };

    let mut active: transactions::ActiveModel = transaction.into();
    active.balance_cents = Set(balance_cents);
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Recomputes a funding transaction's remaining value on any connection.
///
/// Consumption is the sum of its application rows plus any negative line
/// items on other transactions tagging it as their source; the remaining
/// value is stored with the type's sign convention.
pub(crate) async fn recalculate_funding_in<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: TransactionId,
) -> Result<transactions::Model, StoreError> {
    let transaction = find_in_company(conn, company_id, id).await?;
    let kind = transaction.kind()?;
    if !kind.is_funding() {
        return Err(StoreError::NotFound {
            entity: "funding transaction",
            id: id.into_inner(),
        });
    }

    let consumed_cents = applied_by(conn, id).await? + consumed_via_line_items(conn, id).await?;
    let remaining = from_cents(transaction.amount_cents - consumed_cents);

    let (balance, status) = if is_settled(remaining) {
        (Decimal::ZERO, TransactionStatus::Completed)
    } else {
        (
            credit::signed_balance(kind, remaining),
            TransactionStatus::UnappliedCredit,
        )
    };

    let mut active: transactions::ActiveModel = transaction.into();
    active.balance_cents = Set(to_cents(balance));
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Total cents applied against an obligation.
pub(crate) async fn applied_against<C: ConnectionTrait>(
    conn: &C,
    invoice_id: TransactionId,
) -> Result<i64, StoreError> {
    let rows = payment_applications::Entity::find()
        .filter(payment_applications::Column::InvoiceId.eq(invoice_id.into_inner()))
        .all(conn)
        .await?;
    Ok(rows.iter().map(|row| row.amount_applied_cents).sum())
}

/// Total cents a funding transaction has supplied through application rows.
pub(crate) async fn applied_by<C: ConnectionTrait>(
    conn: &C,
    payment_id: TransactionId,
) -> Result<i64, StoreError> {
    let rows = payment_applications::Entity::find()
        .filter(payment_applications::Column::PaymentId.eq(payment_id.into_inner()))
        .all(conn)
        .await?;
    Ok(rows.iter().map(|row| row.amount_applied_cents).sum())
}

/// Total cents of a credit consumed through negative line items on other
/// transactions (a customer payment funding itself from the credit).
pub(crate) async fn consumed_via_line_items<C: ConnectionTrait>(
    conn: &C,
    credit_id: TransactionId,
) -> Result<i64, StoreError> {
    let rows = line_items::Entity::find()
        .filter(line_items::Column::SourceTransactionId.eq(credit_id.into_inner()))
        .filter(line_items::Column::AmountCents.lt(0))
        .all(conn)
        .await?;
    Ok(rows.iter().map(|row| -row.amount_cents).sum())
}
