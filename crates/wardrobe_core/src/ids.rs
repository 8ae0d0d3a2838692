//! # Identifiers
//!
//! Asset and inventory item identifiers. Both are 128-bit UUIDs on the wire;
//! the all-zero value means "none".

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Content identity of a wearable asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

/// Identity of an inventory record.
///
/// Worn items only hold this id. The inventory owns the record and its
/// lifetime; lookups go through the inventory index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

macro_rules! uuid_newtype {
    ($name:ident) => {
        impl $name {
            /// The null id.
            pub const NULL: Self = Self(Uuid::nil());

            /// Wraps a UUID.
            #[inline]
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Builds an id from its 16 raw bytes.
            #[inline]
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            /// Generates a random (v4) id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns true for the all-zero id.
            #[inline]
            #[must_use]
            pub fn is_null(&self) -> bool {
                self.0.is_nil()
            }

            /// Raw bytes in wire order.
            #[inline]
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// The underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_newtype!(AssetId);
uuid_newtype!(ItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_ids() {
        assert!(AssetId::NULL.is_null());
        assert!(ItemId::default().is_null());
        assert!(!AssetId::generate().is_null());
    }

    #[test]
    fn test_bytes_are_wire_order() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let id = AssetId::from_bytes(bytes);
        assert_eq!(id.as_bytes(), &bytes);
        assert_eq!(id.to_string(), "01020304-0506-0708-090a-0b0c0d0e0f10");
    }
}
