//! Core business logic for Tally.
//!
//! This crate implements the double-entry ledger engine:
//! - Posting engine building balanced ledger entries per transaction type
//! - Proportional sales-tax distribution
//! - Payment allocation planning (cash and credits across obligations)
//! - Credit lifecycle policy (per-type sign conventions and transitions)
//!
//! It has zero web or database dependencies; persistence lives in `tally-db`.

pub mod allocation;
pub mod credit;
pub mod posting;
