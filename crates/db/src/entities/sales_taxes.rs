//! `SeaORM` entity for sales tax definitions.
//!
//! A composite tax is a parent row whose components reference it through
//! `parent_tax_id`; the components carry the tax-payable target accounts.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::from_fixed4;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_taxes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    /// Rate in percent, 4-decimal fixed point.
    pub rate_fixed4: i64,
    pub account_id: Option<Uuid>,
    pub parent_tax_id: Option<Uuid>,
    pub position: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentTaxId",
        to = "Column::Id"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The rate in percent.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        from_fixed4(self.rate_fixed4)
    }

    /// True for a composite parent (components reference it).
    #[must_use]
    pub fn is_composite_parent(&self) -> bool {
        self.parent_tax_id.is_none() && self.account_id.is_none()
    }
}
