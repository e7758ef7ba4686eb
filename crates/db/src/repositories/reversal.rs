//! Deletion/reversal engine.
//!
//! Deleting a transaction atomically undoes its ledger and allocation
//! effects: counterpart balances are restored before any row disappears,
//! all inside one database transaction. The same algorithm applies to
//! every id uniformly. An application row whose counterpart no longer
//! exists is skipped with a logged warning rather than aborting the whole
//! reversal.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use tally_core::credit;
use tally_core::posting::TransactionType;
use tally_shared::types::{from_cents, to_cents, CompanyId, TransactionId};

use crate::entities::{line_items, payment_applications, transactions};
use crate::error::StoreError;
use crate::repositories::recalculation::{
    applied_by, consumed_via_line_items, recalculate_funding_in, recalculate_obligation_in,
};
use crate::repositories::transaction::{delete_rows_in, find_in_company};

/// Deletion/reversal engine.
#[derive(Debug, Clone)]
pub struct ReversalEngine {
    db: DatabaseConnection,
}

impl ReversalEngine {
    /// Creates a new reversal engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deletes a transaction, reversing its effects by type.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unresolved id and `Dependency` when the
    /// row's lifecycle is owned by another transaction.
    pub async fn delete_transaction(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<(), StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;
        let transaction = find_in_company(&txn, company_id, id).await?;

        match transaction.kind()? {
            TransactionType::Payment | TransactionType::Cheque => {
                reverse_funding(&txn, company_id, &transaction).await?;
            }
            TransactionType::Deposit => {
                guard_not_system_generated(&transaction)?;
                reverse_funding(&txn, company_id, &transaction).await?;
            }
            TransactionType::Invoice | TransactionType::Bill => {
                reverse_obligation(&txn, company_id, &transaction).await?;
            }
            TransactionType::CustomerCredit | TransactionType::VendorCredit => {
                guard_credit_unconsumed(&txn, &transaction).await?;
                delete_rows_in(&txn, company_id, id).await?;
            }
            TransactionType::Expense
            | TransactionType::JournalEntry
            | TransactionType::Transfer
            | TransactionType::SalesReceipt => {
                delete_rows_in(&txn, company_id, id).await?;
            }
        }

        txn.commit().await?;
        tracing::info!(transaction_id = %id, "transaction deleted");
        Ok(())
    }

    /// Deletes a payment or cheque, restoring every obligation it funded
    /// and every credit it consumed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id is not a payment or cheque in the
    /// company.
    pub async fn delete_payment(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<(), StoreError> {
        self.delete_expecting(company_id, id, |kind| {
            matches!(kind, TransactionType::Payment | TransactionType::Cheque)
        })
        .await
    }

    /// Deletes a deposit, restoring every invoice it funded. A deposit
    /// generated as the byproduct of a payment refuses deletion; the
    /// parent payment owns it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id is not a deposit in the company and
    /// `Dependency` for a system-generated deposit.
    pub async fn delete_deposit(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<(), StoreError> {
        self.delete_expecting(company_id, id, |kind| kind == TransactionType::Deposit)
            .await
    }

    /// Deletes an invoice or bill, restoring the remaining balance of
    /// every funding transaction that was applied to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id is not an invoice or bill in the
    /// company.
    pub async fn delete_invoice(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<(), StoreError> {
        self.delete_expecting(company_id, id, TransactionType::is_obligation)
            .await
    }

    async fn delete_expecting(
        &self,
        company_id: CompanyId,
        id: TransactionId,
        accepts: impl Fn(TransactionType) -> bool,
    ) -> Result<(), StoreError> {
        let found = find_in_company(&self.db, company_id, id).await?;
        if !accepts(found.kind()?) {
            return Err(StoreError::NotFound {
                entity: "transaction",
                id: id.into_inner(),
            });
        }
        self.delete_transaction(company_id, id).await
    }
}

/// Reverses a funding transaction (payment, cheque, deposit): restores the
/// obligations its application rows funded, restores the credits its
/// negative line items consumed, then removes its rows.
async fn reverse_funding<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    transaction: &transactions::Model,
) -> Result<(), StoreError> {
    let id = TransactionId::from_uuid(transaction.id);

    let applications = payment_applications::Entity::find()
        .filter(payment_applications::Column::PaymentId.eq(transaction.id))
        .all(conn)
        .await?;

    // The credits this transaction consumed, read before its lines go.
    let consumed = consumed_credits_from_lines(conn, id).await?;

    payment_applications::Entity::delete_many()
        .filter(payment_applications::Column::PaymentId.eq(transaction.id))
        .exec(conn)
        .await?;
    delete_rows_in(conn, company_id, id).await?;

    for application in &applications {
        let invoice_id = TransactionId::from_uuid(application.invoice_id);
        match recalculate_obligation_in(conn, company_id, invoice_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(
                    invoice_id = %invoice_id,
                    amount = %application.amount_applied(),
                    "application references a missing obligation; skipping restore"
                );
            }
            Err(err) => return Err(err),
        }
    }

    for (credit_id, consumed_cents) in consumed {
        match find_in_company(conn, company_id, credit_id).await {
            Ok(credit_row) => {
                let kind = credit_row.kind()?;
                let (balance, status) =
                    credit::restore(kind, credit_row.balance(), from_cents(consumed_cents));
                let mut active: transactions::ActiveModel = credit_row.into();
                active.balance_cents = Set(to_cents(balance));
                active.status = Set(status.as_str().to_string());
                active.updated_at = Set(Utc::now().into());
                active.update(conn).await?;
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(
                    credit_id = %credit_id,
                    "consumed credit no longer exists; skipping restore"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Reverses an obligation (invoice, bill): removes its application rows
/// and recomputes each funding transaction's remaining balance from its
/// allocations to other obligations.
async fn reverse_obligation<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    transaction: &transactions::Model,
) -> Result<(), StoreError> {
    let id = TransactionId::from_uuid(transaction.id);

    let applications = payment_applications::Entity::find()
        .filter(payment_applications::Column::InvoiceId.eq(transaction.id))
        .all(conn)
        .await?;

    let mut funding_ids: Vec<TransactionId> = Vec::new();
    for application in &applications {
        let funding_id = TransactionId::from_uuid(application.payment_id);
        if !funding_ids.contains(&funding_id) {
            funding_ids.push(funding_id);
        }
    }

    payment_applications::Entity::delete_many()
        .filter(payment_applications::Column::InvoiceId.eq(transaction.id))
        .exec(conn)
        .await?;
    delete_rows_in(conn, company_id, id).await?;

    for funding_id in funding_ids {
        match recalculate_funding_in(conn, company_id, funding_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(
                    funding_id = %funding_id,
                    "application references a missing funding transaction; skipping restore"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// The credits a transaction consumed, aggregated from its negative line
/// items.
async fn consumed_credits_from_lines<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<Vec<(TransactionId, i64)>, StoreError> {
    let lines = line_items::Entity::find()
        .filter(line_items::Column::TransactionId.eq(id.into_inner()))
        .filter(line_items::Column::AmountCents.lt(0))
        .all(conn)
        .await?;

    let mut consumed: Vec<(TransactionId, i64)> = Vec::new();
    for line in lines {
        let Some(source) = line.source_transaction_id else {
            continue;
        };
        let credit_id = TransactionId::from_uuid(source);
        match consumed.iter_mut().find(|(existing, _)| *existing == credit_id) {
            Some((_, cents)) => *cents += -line.amount_cents,
            None => consumed.push((credit_id, -line.amount_cents)),
        }
    }
    Ok(consumed)
}

fn guard_not_system_generated(transaction: &transactions::Model) -> Result<(), StoreError> {
    if let Some(parent) = transaction.source_transaction_id {
        return Err(StoreError::Dependency(format!(
            "deposit {} was generated by payment {parent}; delete the payment instead",
            transaction.id
        )));
    }
    Ok(())
}

/// A credit that has been (partially) consumed cannot be deleted; the
/// consuming obligations own its remaining lifecycle.
async fn guard_credit_unconsumed<C: ConnectionTrait>(
    conn: &C,
    transaction: &transactions::Model,
) -> Result<(), StoreError> {
    let id = TransactionId::from_uuid(transaction.id);
    let consumed_cents = applied_by(conn, id).await? + consumed_via_line_items(conn, id).await?;
    if consumed_cents > 0 {
        return Err(StoreError::Dependency(format!(
            "credit {} has {} applied against obligations; delete those first",
            transaction.id,
            from_cents(consumed_cents)
        )));
    }
    Ok(())
}
