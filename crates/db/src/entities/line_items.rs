//! `SeaORM` entity for transaction line items.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::{from_cents, from_fixed4};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub description: Option<String>,
    /// Quantity, 4-decimal fixed point.
    pub quantity_fixed4: i64,
    pub unit_price_cents: i64,
    /// Signed; a negative amount tags consumption of an existing credit.
    pub amount_cents: i64,
    pub account_id: Option<Uuid>,
    pub sales_tax_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    /// The credit transaction a negative line consumes.
    pub source_transaction_id: Option<Uuid>,
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
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Line amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        from_cents(self.amount_cents)
    }

    /// Quantity.
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        from_fixed4(self.quantity_fixed4)
    }

    /// Price per unit.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        from_cents(self.unit_price_cents)
    }

    /// True if this line records consumption of an existing credit.
    #[must_use]
    pub fn is_credit_consumption(&self) -> bool {
        self.amount_cents < 0 && self.source_transaction_id.is_some()
    }
}
