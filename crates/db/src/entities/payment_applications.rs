//! `SeaORM` entity for payment applications.
//!
//! The structured record of how much of a funding transaction a given
//! obligation consumed, and the sole source of truth for consumption. The
//! columns reference transactions by id without foreign keys: during
//! reversal one side may already be gone, and the row must tolerate that.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::from_cents;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    /// The funding transaction (payment, deposit, cheque, or credit memo).
    pub payment_id: Uuid,
    /// The obligation transaction (invoice or bill).
    pub invoice_id: Uuid,
    pub amount_applied_cents: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Amount of the funding transaction this obligation consumed.
    #[must_use]
    pub fn amount_applied(&self) -> Decimal {
        from_cents(self.amount_applied_cents)
    }
}
