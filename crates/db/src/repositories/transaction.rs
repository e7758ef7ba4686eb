//! Transaction store: atomic CRUD for headers, line items, and ledger
//! entries.
//!
//! The store persists what the posting engine built and never reaches
//! across transactions: restoring counterpart balances on deletion is the
//! reversal engine's job, which calls back into the raw row removal here.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::credit;
use tally_core::posting::{
    validate_lines, EntryType, ItemLine, PostingLine, TransactionDraft, TransactionStatus,
    TransactionType,
};
use tally_shared::types::{
    to_cents, to_fixed4, AccountId, CompanyId, ContactId, LedgerEntryId, LineItemId, ProductId,
    SalesTaxId, TransactionId,
};

use crate::entities::{ledger_entries, line_items, payment_applications, transactions};
use crate::error::StoreError;
use crate::repositories::recalculation;

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Filter by status.
    pub status: Option<TransactionStatus>,
    /// Filter by contact.
    pub contact_id: Option<ContactId>,
    /// Filter by date range start.
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end.
    pub date_to: Option<NaiveDate>,
}

/// A transaction header with its child rows.
#[derive(Debug, Clone)]
pub struct TransactionWithChildren {
    /// Transaction header.
    pub transaction: transactions::Model,
    /// Line items in position order.
    pub line_items: Vec<line_items::Model>,
    /// Ledger entries in position order.
    pub ledger_entries: Vec<ledger_entries::Model>,
}

/// Replacement children supplied on update.
#[derive(Debug, Clone)]
pub struct RebuildChildren {
    /// New total amount.
    pub amount: Decimal,
    /// New subtotal before tax.
    pub sub_total: Decimal,
    /// New tax charged.
    pub tax_amount: Decimal,
    /// Replacement line items.
    pub lines: Vec<ItemLine>,
    /// Replacement ledger entries, already built by the posting engine.
    pub entries: Vec<PostingLine>,
}

/// Header field updates; children are replaced when `rebuild` is supplied.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New transaction date.
    pub transaction_date: Option<NaiveDate>,
    /// New description.
    pub description: Option<String>,
    /// New reference number.
    pub reference: Option<String>,
    /// Replacement amounts and children.
    pub rebuild: Option<RebuildChildren>,
}

/// Transaction repository for atomic CRUD operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a transaction header with its line items and ledger entries
    /// atomically.
    ///
    /// The ledger entries must already be built by the posting engine; the
    /// generated header id is resolved into every child row. When the draft
    /// carries no reference, the next number for the company and type is
    /// assigned.
    ///
    /// # Errors
    ///
    /// Returns `Unbalanced` (via the posting validation) when debits and
    /// credits differ, `DuplicateReference` when the reference is taken,
    /// and a database error if persistence fails.
    pub async fn create_transaction(
        &self,
        company_id: CompanyId,
        draft: &TransactionDraft,
        entries: &[PostingLine],
    ) -> Result<transactions::Model, StoreError> {
        validate_lines(entries)?;

        let txn = crate::begin_serializable(&self.db).await?;

        let reference = match &draft.reference {
            Some(reference) => reference.clone(),
            None => next_reference(&txn, company_id, draft.transaction_type).await?,
        };
        let taken = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id.into_inner()))
            .filter(transactions::Column::TransactionType.eq(draft.transaction_type.as_str()))
            .filter(transactions::Column::Reference.eq(reference.as_str()))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(StoreError::DuplicateReference { reference });
        }

        let now = Utc::now().into();
        let transaction_id = TransactionId::new();
        let (status, balance) = credit::initial_state(
            draft.transaction_type,
            draft.amount,
            draft.contact_id.is_some(),
        );

        let header = transactions::ActiveModel {
            id: Set(transaction_id.into_inner()),
            company_id: Set(company_id.into_inner()),
            transaction_type: Set(draft.transaction_type.as_str().to_string()),
            reference: Set(reference),
            transaction_date: Set(draft.date),
            contact_id: Set(draft.contact_id.map(ContactId::into_inner)),
            amount_cents: Set(to_cents(draft.amount)),
            sub_total_cents: Set(to_cents(draft.sub_total)),
            tax_amount_cents: Set(draft.tax.as_ref().map_or(0, |tax| to_cents(tax.amount))),
            balance_cents: Set(to_cents(balance)),
            status: Set(status.as_str().to_string()),
            description: Set(draft.description.clone()),
            source_transaction_id: Set(draft
                .source_transaction_id
                .map(TransactionId::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let header = header.insert(&txn).await?;

        insert_children(&txn, transaction_id, &draft.lines, entries).await?;

        txn.commit().await?;
        Ok(header)
    }

    /// Gets a transaction header by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn get_transaction(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<transactions::Model, StoreError> {
        find_in_company(&self.db, company_id, id).await
    }

    /// Gets a transaction with its line items and ledger entries.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn get_with_children(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<TransactionWithChildren, StoreError> {
        let transaction = find_in_company(&self.db, company_id, id).await?;
        let line_items = self.line_items_for(id).await?;
        let ledger_entries = self.ledger_entries_for(id).await?;
        Ok(TransactionWithChildren {
            transaction,
            line_items,
            ledger_entries,
        })
    }

    /// Lists transactions with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        company_id: CompanyId,
        filter: TransactionFilter,
    ) -> Result<Vec<transactions::Model>, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id.into_inner()));

        if let Some(transaction_type) = filter.transaction_type {
            query =
                query.filter(transactions::Column::TransactionType.eq(transaction_type.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(contact_id) = filter.contact_id {
            query = query.filter(transactions::Column::ContactId.eq(contact_id.into_inner()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::TransactionDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::TransactionDate.lte(date_to));
        }

        Ok(query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Updates header fields; when replacement children are supplied, the
    /// line items and ledger entries are swapped atomically and the balance
    /// invariant revalidated.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unresolved id and `Unbalanced` when the
    /// replacement entries do not balance.
    pub async fn update_transaction(
        &self,
        company_id: CompanyId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, StoreError> {
        if let Some(rebuild) = &input.rebuild {
            validate_lines(&rebuild.entries)?;
        }

        let txn = crate::begin_serializable(&self.db).await?;
        let existing = find_in_company(&txn, company_id, id).await?;
        let kind = existing.kind()?;

        let mut active: transactions::ActiveModel = existing.into();
        if let Some(date) = input.transaction_date {
            active.transaction_date = Set(date);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(reference) = input.reference {
            active.reference = Set(reference);
        }

        if let Some(rebuild) = input.rebuild {
            delete_children(&txn, id).await?;
            insert_children(&txn, id, &rebuild.lines, &rebuild.entries).await?;
            active.amount_cents = Set(to_cents(rebuild.amount));
            active.sub_total_cents = Set(to_cents(rebuild.sub_total));
            active.tax_amount_cents = Set(to_cents(rebuild.tax_amount));
        }

        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        // A changed amount moves the derived balance/status with it.
        let updated = if kind.is_obligation() {
            recalculation::recalculate_obligation_in(&txn, company_id, id).await?
        } else if kind.is_funding() {
            recalculation::recalculate_funding_in(&txn, company_id, id).await?
        } else {
            updated
        };

        txn.commit().await?;
        Ok(updated)
    }

    /// Removes a transaction's rows (children then header) with no
    /// cross-transaction reversal. The deletion/reversal engine is the
    /// caller that restores counterpart balances first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn delete_transaction_rows(
        &self,
        company_id: CompanyId,
        id: TransactionId,
    ) -> Result<(), StoreError> {
        let txn = crate::begin_serializable(&self.db).await?;
        delete_rows_in(&txn, company_id, id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Line items of a transaction in position order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn line_items_for(
        &self,
        id: TransactionId,
    ) -> Result<Vec<line_items::Model>, StoreError> {
        Ok(line_items::Entity::find()
            .filter(line_items::Column::TransactionId.eq(id.into_inner()))
            .order_by_asc(line_items::Column::Position)
            .all(&self.db)
            .await?)
    }

    /// Ledger entries of a transaction in position order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ledger_entries_for(
        &self,
        id: TransactionId,
    ) -> Result<Vec<ledger_entries::Model>, StoreError> {
        Ok(ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TransactionId.eq(id.into_inner()))
            .order_by_asc(ledger_entries::Column::Position)
            .all(&self.db)
            .await?)
    }

    /// Applications funded by a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn applications_for_payment(
        &self,
        id: TransactionId,
    ) -> Result<Vec<payment_applications::Model>, StoreError> {
        Ok(payment_applications::Entity::find()
            .filter(payment_applications::Column::PaymentId.eq(id.into_inner()))
            .order_by_asc(payment_applications::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Applications consuming against an obligation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn applications_for_invoice(
        &self,
        id: TransactionId,
    ) -> Result<Vec<payment_applications::Model>, StoreError> {
        Ok(payment_applications::Entity::find()
            .filter(payment_applications::Column::InvoiceId.eq(id.into_inner()))
            .order_by_asc(payment_applications::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

/// Finds a transaction inside a company on any connection.
pub(crate) async fn find_in_company<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: TransactionId,
) -> Result<transactions::Model, StoreError> {
    transactions::Entity::find_by_id(id.into_inner())
        .filter(transactions::Column::CompanyId.eq(company_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "transaction",
            id: id.into_inner(),
        })
}

/// Deletes a transaction's children and header on any connection.
pub(crate) async fn delete_rows_in<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    id: TransactionId,
) -> Result<(), StoreError> {
    let header = find_in_company(conn, company_id, id).await?;
    delete_children(conn, id).await?;
    transactions::Entity::delete_by_id(header.id)
        .exec(conn)
        .await?;
    Ok(())
}

async fn delete_children<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<(), StoreError> {
    ledger_entries::Entity::delete_many()
        .filter(ledger_entries::Column::TransactionId.eq(id.into_inner()))
        .exec(conn)
        .await?;
    line_items::Entity::delete_many()
        .filter(line_items::Column::TransactionId.eq(id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

/// Inserts line items and ledger entries for a transaction.
async fn insert_children<C: ConnectionTrait>(
    conn: &C,
    transaction_id: TransactionId,
    lines: &[ItemLine],
    entries: &[PostingLine],
) -> Result<(), StoreError> {
    let now = Utc::now().into();

    for (position, line) in lines.iter().enumerate() {
        let item = line_items::ActiveModel {
            id: Set(LineItemId::new().into_inner()),
            transaction_id: Set(transaction_id.into_inner()),
            description: Set(line.description.clone()),
            quantity_fixed4: Set(to_fixed4(line.quantity)),
            unit_price_cents: Set(to_cents(line.unit_price)),
            amount_cents: Set(to_cents(line.amount)),
            account_id: Set(line.account_id.map(AccountId::into_inner)),
            sales_tax_id: Set(line.sales_tax_id.map(SalesTaxId::into_inner)),
            product_id: Set(line.product_id.map(ProductId::into_inner)),
            source_transaction_id: Set(line
                .source_transaction_id
                .map(TransactionId::into_inner)),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            created_at: Set(now),
        };
        item.insert(conn).await?;
    }

    for (position, entry) in entries.iter().enumerate() {
        let (debit_cents, credit_cents) = match entry.entry_type {
            EntryType::Debit => (to_cents(entry.amount), 0),
            EntryType::Credit => (0, to_cents(entry.amount)),
        };
        let row = ledger_entries::ActiveModel {
            id: Set(LedgerEntryId::new().into_inner()),
            transaction_id: Set(transaction_id.into_inner()),
            account_id: Set(entry.account_id.into_inner()),
            debit_cents: Set(debit_cents),
            credit_cents: Set(credit_cents),
            memo: Set(entry.memo.clone()),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            created_at: Set(now),
        };
        row.insert(conn).await?;
    }

    Ok(())
}

/// Next reference number for a company and type: one past the highest
/// numeric reference in use, starting at 1.
async fn next_reference<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    transaction_type: TransactionType,
) -> Result<String, StoreError> {
    let existing = transactions::Entity::find()
        .filter(transactions::Column::CompanyId.eq(company_id.into_inner()))
        .filter(transactions::Column::TransactionType.eq(transaction_type.as_str()))
        .all(conn)
        .await?;

    let highest = existing
        .iter()
        .filter_map(|t| t.reference.parse::<i64>().ok())
        .max()
        .unwrap_or(0);
    Ok((highest + 1).to_string())
}
