//! Sales tax repository.
//!
//! Resolves a sales tax definition into the component set the posting
//! engine distributes a charged amount across. A composite tax is a parent
//! row; its components reference it through `parent_tax_id` and carry the
//! tax-payable target accounts.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tally_core::posting::{TaxBreakdown, TaxComponent};
use tally_shared::types::{to_fixed4, AccountId, CompanyId, SalesTaxId};

use crate::entities::sales_taxes;
use crate::error::StoreError;

/// Input for creating a sales tax definition.
#[derive(Debug, Clone)]
pub struct CreateSalesTaxInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name (e.g. "GST").
    pub name: String,
    /// Rate in percent.
    pub rate: Decimal,
    /// Tax-payable target account. Required for simple taxes and composite
    /// components; absent on a composite parent.
    pub account_id: Option<AccountId>,
    /// The composite parent this row is a component of, if any.
    pub parent_tax_id: Option<SalesTaxId>,
    /// Ordering among sibling components.
    pub position: i32,
}

/// Sales tax directory repository.
#[derive(Debug, Clone)]
pub struct SalesTaxRepository {
    db: DatabaseConnection,
}

impl SalesTaxRepository {
    /// Creates a new sales tax repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a sales tax definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_sales_tax(
        &self,
        input: CreateSalesTaxInput,
    ) -> Result<sales_taxes::Model, StoreError> {
        let now = Utc::now().into();
        let sales_tax = sales_taxes::ActiveModel {
            id: Set(SalesTaxId::new().into_inner()),
            company_id: Set(input.company_id.into_inner()),
            name: Set(input.name),
            rate_fixed4: Set(to_fixed4(input.rate)),
            account_id: Set(input.account_id.map(AccountId::into_inner)),
            parent_tax_id: Set(input.parent_tax_id.map(SalesTaxId::into_inner)),
            position: Set(input.position),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(sales_tax.insert(&self.db).await?)
    }

    /// Gets a sales tax definition by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn get_sales_tax(
        &self,
        company_id: CompanyId,
        id: SalesTaxId,
    ) -> Result<sales_taxes::Model, StoreError> {
        sales_taxes::Entity::find_by_id(id.into_inner())
            .filter(sales_taxes::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "sales_tax",
                id: id.into_inner(),
            })
    }

    /// Resolves a sales tax into its posting components.
    ///
    /// A composite parent resolves to its components in position order; a
    /// simple tax resolves to itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn components_of(
        &self,
        company_id: CompanyId,
        id: SalesTaxId,
    ) -> Result<Vec<TaxComponent>, StoreError> {
        let parent = self.get_sales_tax(company_id, id).await?;

        let children = sales_taxes::Entity::find()
            .filter(sales_taxes::Column::ParentTaxId.eq(id.into_inner()))
            .order_by_asc(sales_taxes::Column::Position)
            .all(&self.db)
            .await?;

        let rows = if children.is_empty() {
            vec![parent]
        } else {
            children
        };

        Ok(rows
            .into_iter()
            .map(|row| TaxComponent {
                sales_tax_id: SalesTaxId::from_uuid(row.id),
                name: row.name.clone(),
                rate: row.rate(),
                account_id: row.account_id.map(AccountId::from_uuid),
            })
            .collect())
    }

    /// Builds the tax breakdown for a charged amount, which may be a manual
    /// override of the calculated total.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn breakdown_for(
        &self,
        company_id: CompanyId,
        id: SalesTaxId,
        charged: Decimal,
    ) -> Result<TaxBreakdown, StoreError> {
        Ok(TaxBreakdown {
            amount: charged,
            components: self.components_of(company_id, id).await?,
        })
    }
}
