//! `SeaORM` entity for the chart of accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::posting::{AccountRole, EntryType};

use crate::error::StoreError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub system_role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Chart-of-accounts classification, deciding the normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Resources owned (bank, receivables).
    Asset,
    /// Obligations owed (payables, tax payable).
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountKind {
    /// Returns the snake_case name used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// The entry side that increases this kind of account.
    #[must_use]
    pub const fn normal_balance(self) -> EntryType {
        match self {
            Self::Asset | Self::Expense => EntryType::Debit,
            Self::Liability | Self::Equity | Self::Revenue => EntryType::Credit,
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

impl Model {
    /// The account's classification.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` when the stored value is not a known kind.
    pub fn kind(&self) -> Result<AccountKind, StoreError> {
        self.account_type.parse().map_err(StoreError::Corrupted)
    }

    /// The system role this account fills, if any.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` when the stored value is not a known role.
    pub fn role(&self) -> Result<Option<AccountRole>, StoreError> {
        self.system_role
            .as_deref()
            .map(|role| role.parse().map_err(StoreError::Corrupted))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_balance_by_kind() {
        assert_eq!(AccountKind::Asset.normal_balance(), EntryType::Debit);
        assert_eq!(AccountKind::Expense.normal_balance(), EntryType::Debit);
        assert_eq!(AccountKind::Liability.normal_balance(), EntryType::Credit);
        assert_eq!(AccountKind::Equity.normal_balance(), EntryType::Credit);
        assert_eq!(AccountKind::Revenue.normal_balance(), EntryType::Credit);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("revenue".parse::<AccountKind>().unwrap(), AccountKind::Revenue);
        assert!("receivable".parse::<AccountKind>().is_err());
    }
}
