//! `SeaORM` entity definitions for the ledger schema.
//!
//! Monetary columns are stored as integer cents; quantities and tax rates
//! as 4-decimal fixed point. Each entity carries accessors that convert
//! back to `Decimal` and to the core domain enums.

pub mod accounts;
pub mod contacts;
pub mod ledger_entries;
pub mod line_items;
pub mod payment_applications;
pub mod sales_taxes;
pub mod transactions;
