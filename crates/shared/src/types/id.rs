//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ContactId` where an
//! `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

typed_id!(CompanyId, "Unique identifier for a company.");
typed_id!(
    AccountId,
    "Unique identifier for a chart of accounts entry."
);
typed_id!(ContactId, "Unique identifier for a customer or vendor.");
typed_id!(SalesTaxId, "Unique identifier for a sales tax definition.");
typed_id!(TransactionId, "Unique identifier for a transaction.");
typed_id!(LineItemId, "Unique identifier for a line item.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");
typed_id!(
    PaymentApplicationId,
    "Unique identifier for a payment application."
);
typed_id!(ProductId, "Unique identifier for a product.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_round_trip_through_uuid() {
        let id = AccountId::new();
        let uuid = id.into_inner();
        assert_eq!(AccountId::from_uuid(uuid), id);
        assert_eq!(AccountId::from(uuid), id);
    }

    #[test]
    fn test_display_and_parse() {
        let id = ContactId::new();
        let parsed = ContactId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TransactionId::from_str("not-a-uuid").is_err());
    }
}
