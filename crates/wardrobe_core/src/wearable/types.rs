//! # Wearable Type Dictionary
//!
//! The fixed set of wearable categories. Discriminants are the wire values
//! and must never be reordered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of clothing layers per wearable type.
pub const MAX_PER_TYPE: usize = 5;

/// Asset class of a wearable type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Exactly one slot (shape, skin, hair, eyes).
    BodyPart,
    /// Stackable layers, bounded by [`MAX_PER_TYPE`].
    Clothing,
}

/// Wearable category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WearableType {
    /// Body shape.
    Shape = 0,
    /// Skin.
    Skin = 1,
    /// Hair.
    Hair = 2,
    /// Eyes.
    Eyes = 3,
    /// Shirt.
    Shirt = 4,
    /// Pants.
    Pants = 5,
    /// Shoes.
    Shoes = 6,
    /// Socks.
    Socks = 7,
    /// Jacket.
    Jacket = 8,
    /// Gloves.
    Gloves = 9,
    /// Undershirt.
    Undershirt = 10,
    /// Underpants.
    Underpants = 11,
    /// Skirt.
    Skirt = 12,
    /// Alpha mask.
    Alpha = 13,
    /// Tattoo layer.
    Tattoo = 14,
    /// Avatar physics.
    Physics = 15,
}

/// (name, default new name) per type, in wire order.
static NAMES: [(&str, &str); WearableType::COUNT] = [
    ("shape", "New Shape"),
    ("skin", "New Skin"),
    ("hair", "New Hair"),
    ("eyes", "New Eyes"),
    ("shirt", "New Shirt"),
    ("pants", "New Pants"),
    ("shoes", "New Shoes"),
    ("socks", "New Socks"),
    ("jacket", "New Jacket"),
    ("gloves", "New Gloves"),
    ("undershirt", "New Undershirt"),
    ("underpants", "New Underpants"),
    ("skirt", "New Skirt"),
    ("alpha", "New Alpha"),
    ("tattoo", "New Tattoo"),
    ("physics", "New Physics"),
];

impl WearableType {
    /// Number of wearable types.
    pub const COUNT: usize = 16;

    /// All types in wire order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Shape,
        Self::Skin,
        Self::Hair,
        Self::Eyes,
        Self::Shirt,
        Self::Pants,
        Self::Shoes,
        Self::Socks,
        Self::Jacket,
        Self::Gloves,
        Self::Undershirt,
        Self::Underpants,
        Self::Skirt,
        Self::Alpha,
        Self::Tattoo,
        Self::Physics,
    ];

    /// The four body-part types.
    pub const BODY_PARTS: [Self; 4] = [Self::Shape, Self::Skin, Self::Hair, Self::Eyes];

    /// Converts a wire value, `None` when out of range.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::COUNT {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Wire value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Dense index into per-type tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase type name ("shape", "shirt", ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        NAMES[self.index()].0
    }

    /// Name given to a freshly created wearable of this type.
    #[must_use]
    pub fn default_new_name(self) -> &'static str {
        NAMES[self.index()].1
    }

    /// Asset class.
    #[must_use]
    pub const fn asset_class(self) -> AssetClass {
        if self.is_body_part() {
            AssetClass::BodyPart
        } else {
            AssetClass::Clothing
        }
    }

    /// Returns true for shape, skin, hair and eyes.
    #[inline]
    #[must_use]
    pub const fn is_body_part(self) -> bool {
        matches!(self, Self::Shape | Self::Skin | Self::Hair | Self::Eyes)
    }

    /// Returns true when more than one layer may be worn.
    #[inline]
    #[must_use]
    pub const fn allows_multiwear(self) -> bool {
        !self.is_body_part()
    }

    /// Maximum number of items a slot list of this type may hold.
    #[inline]
    #[must_use]
    pub const fn capacity(self) -> usize {
        if self.is_body_part() {
            1
        } else {
            MAX_PER_TYPE
        }
    }

    /// Editing this type keeps the camera where it is.
    #[must_use]
    pub const fn disables_camera_switch(self) -> bool {
        matches!(self, Self::Physics)
    }

    /// Looks a type up by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for WearableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
