//! Unapplied-credit lifecycle policy.

pub mod policy;

pub use policy::{
    consume, initial_state, remaining_value, restore, signed_balance, status_for,
};
