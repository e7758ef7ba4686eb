//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{from_cents, from_fixed4, is_settled, round2, to_cents, to_fixed4};
