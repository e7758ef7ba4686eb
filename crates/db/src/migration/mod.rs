//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the
//! portable schema DSL, so the same schema runs on Postgres in deployment
//! and on in-memory SQLite in the integration tests.

pub use sea_orm_migration::prelude::*;

mod m20260801_000001_initial;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260801_000001_initial::Migration)]
    }
}
