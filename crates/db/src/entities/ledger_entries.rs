//! `SeaORM` entity for ledger entries.
//!
//! Exactly one of `debit_cents`/`credit_cents` is non-zero per row, and the
//! rows of one transaction always sum to equal debits and credits.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::from_cents;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub memo: Option<String>,
    pub position: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Debit amount (zero for credit rows).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        from_cents(self.debit_cents)
    }

    /// Credit amount (zero for debit rows).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        from_cents(self.credit_cents)
    }
}
