//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every mutating operation runs inside one database transaction.

pub mod account;
pub mod contact;
pub mod payment;
pub mod recalculation;
pub mod reversal;
pub mod sales_tax;
pub mod transaction;

pub use account::{AccountRepository, CreateAccountInput};
pub use contact::{ContactRepository, CreateContactInput};
pub use payment::{BillPaymentInput, CreditContribution, PaymentRepository};
pub use recalculation::RecalculationService;
pub use reversal::ReversalEngine;
pub use sales_tax::{CreateSalesTaxInput, SalesTaxRepository};
pub use transaction::{
    RebuildChildren, TransactionFilter, TransactionRepository, TransactionWithChildren,
    UpdateTransactionInput,
};
