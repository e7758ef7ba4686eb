//! `SeaORM` entity for customers and vendors.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub contact_kind: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Customer/vendor classification for AR/AP association checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    /// Buys from the company (associated with receivables).
    Customer,
    /// Sells to the company (associated with payables).
    Vendor,
}

impl ContactKind {
    /// Returns the snake_case name used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }
}

impl std::str::FromStr for ContactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            other => Err(format!("unknown contact kind: {other}")),
        }
    }
}

impl Model {
    /// The contact's classification.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` when the stored value is not a known kind.
    pub fn kind(&self) -> Result<ContactKind, StoreError> {
        self.contact_kind.parse().map_err(StoreError::Corrupted)
    }
}
