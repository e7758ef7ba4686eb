//! Account repository for chart-of-accounts database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tally_core::posting::{AccountResolver, AccountRole};
use tally_shared::types::{AccountId, CompanyId};

use crate::entities::accounts::{self, AccountKind};
use crate::error::StoreError;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Account code (unique per company).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub kind: AccountKind,
    /// System role this account fills, if any.
    pub system_role: Option<AccountRole>,
}

/// Chart-of-accounts repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, StoreError> {
        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            company_id: Set(input.company_id.into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.kind.as_str().to_string()),
            system_role: Set(input.system_role.map(|role| role.as_str().to_string())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(account.insert(&self.db).await?)
    }

    /// Gets an account by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn get_account(
        &self,
        company_id: CompanyId,
        id: AccountId,
    ) -> Result<accounts::Model, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "account",
                id: id.into_inner(),
            })
    }

    /// Lists a company's accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<accounts::Model>, StoreError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Finds the active account filling a system role, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_role(
        &self,
        company_id: CompanyId,
        role: AccountRole,
    ) -> Result<Option<accounts::Model>, StoreError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::SystemRole.eq(role.as_str()))
            .filter(accounts::Column::IsActive.eq(true))
            .one(&self.db)
            .await?)
    }

    /// Resolves every configured system role for the posting engine.
    ///
    /// Missing roles stay `None`; the engine reports a configuration error
    /// only when it actually needs one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn resolver_for(
        &self,
        company_id: CompanyId,
    ) -> Result<AccountResolver, StoreError> {
        let role_accounts = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::SystemRole.is_not_null())
            .filter(accounts::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        let mut resolver = AccountResolver::default();
        for account in role_accounts {
            let id = AccountId::from_uuid(account.id);
            match account.role()? {
                Some(AccountRole::AccountsReceivable) => {
                    resolver.accounts_receivable = Some(id);
                }
                Some(AccountRole::AccountsPayable) => resolver.accounts_payable = Some(id),
                Some(AccountRole::UndepositedFunds) => resolver.undeposited_funds = Some(id),
                None => {}
            }
        }
        Ok(resolver)
    }
}
