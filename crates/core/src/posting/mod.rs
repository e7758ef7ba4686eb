//! Ledger posting logic.
//!
//! This module implements the core posting functionality:
//! - Domain types for transaction drafts and posting lines
//! - The posting engine building balanced entries per transaction type
//! - Proportional sales-tax distribution
//! - Double-entry balance validation
//! - Error types for posting operations

pub mod engine;
pub mod error;
pub mod tax;
pub mod types;
pub mod validation;

pub use engine::{AccountResolver, AccountRole, PostingEngine};
pub use error::PostingError;
pub use tax::{distribute_tax, TaxBreakdown, TaxComponent, TaxShare};
pub use types::{
    EntryType, ItemLine, PostingLine, TransactionDraft, TransactionStatus, TransactionType,
};
pub use validation::validate_lines;
