//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger schema
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use error::StoreError;
pub use repositories::{
    AccountRepository, ContactRepository, PaymentRepository, RecalculationService,
    ReversalEngine, SalesTaxRepository, TransactionRepository,
};

use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    IsolationLevel, TransactionTrait,
};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Begins a database transaction at the isolation level the engine needs.
///
/// Every mutating ledger operation runs inside one of these. Two concurrent
/// applications reading the same stale balance could jointly over-apply, so
/// on Postgres the transaction is SERIALIZABLE; SQLite serializes writers by
/// construction and rejects explicit isolation levels, so it gets a plain
/// transaction.
///
/// # Errors
///
/// Returns an error if the transaction cannot be started.
pub async fn begin_serializable(
    db: &DatabaseConnection,
) -> Result<DatabaseTransaction, DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            db.begin_with_config(Some(IsolationLevel::Serializable), None)
                .await
        }
        _ => db.begin().await,
    }
}
