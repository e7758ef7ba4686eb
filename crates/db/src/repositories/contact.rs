//! Contact repository for customer/vendor database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tally_shared::types::{CompanyId, ContactId};

use crate::entities::contacts::{self, ContactKind};
use crate::error::StoreError;

/// Input for creating a contact.
#[derive(Debug, Clone)]
pub struct CreateContactInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Customer or vendor.
    pub kind: ContactKind,
}

/// Customer/vendor directory repository.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_contact(
        &self,
        input: CreateContactInput,
    ) -> Result<contacts::Model, StoreError> {
        let now = Utc::now().into();
        let contact = contacts::ActiveModel {
            id: Set(ContactId::new().into_inner()),
            company_id: Set(input.company_id.into_inner()),
            name: Set(input.name),
            contact_kind: Set(input.kind.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(contact.insert(&self.db).await?)
    }

    /// Gets a contact by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not resolve in the company.
    pub async fn get_contact(
        &self,
        company_id: CompanyId,
        id: ContactId,
    ) -> Result<contacts::Model, StoreError> {
        contacts::Entity::find_by_id(id.into_inner())
            .filter(contacts::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "contact",
                id: id.into_inner(),
            })
    }

    /// Lists a company's contacts ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_contacts(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<contacts::Model>, StoreError> {
        Ok(contacts::Entity::find()
            .filter(contacts::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(contacts::Column::Name)
            .all(&self.db)
            .await?)
    }
}
