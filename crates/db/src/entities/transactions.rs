//! `SeaORM` entity for transaction headers.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::posting::{TransactionStatus, TransactionType};
use tally_shared::types::from_cents;

use crate::error::StoreError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub transaction_type: String,
    pub reference: String,
    pub transaction_date: Date,
    pub contact_id: Option<Uuid>,
    pub amount_cents: i64,
    pub sub_total_cents: i64,
    pub tax_amount_cents: i64,
    /// Signed remainder; sign convention depends on the transaction type.
    pub balance_cents: i64,
    pub status: String,
    pub description: Option<String>,
    /// Set on system-generated byproducts (e.g. the deposit a payment
    /// creates); such rows are deleted through their parent.
    pub source_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_items::Entity")]
    LineItems,
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
}

impl Related<super::line_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The transaction type.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` when the stored value is not a known type.
    pub fn kind(&self) -> Result<TransactionType, StoreError> {
        self.transaction_type.parse().map_err(StoreError::Corrupted)
    }

    /// The settlement status.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` when the stored value is not a known status.
    pub fn state(&self) -> Result<TransactionStatus, StoreError> {
        self.status.parse().map_err(StoreError::Corrupted)
    }

    /// Total amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        from_cents(self.amount_cents)
    }

    /// Subtotal before tax.
    #[must_use]
    pub fn sub_total(&self) -> Decimal {
        from_cents(self.sub_total_cents)
    }

    /// Tax charged.
    #[must_use]
    pub fn tax_amount(&self) -> Decimal {
        from_cents(self.tax_amount_cents)
    }

    /// Signed remaining balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        from_cents(self.balance_cents)
    }

    /// True when this row was generated as a byproduct of another
    /// transaction and must be deleted through it.
    #[must_use]
    pub fn is_system_generated(&self) -> bool {
        self.source_transaction_id.is_some()
    }
}
