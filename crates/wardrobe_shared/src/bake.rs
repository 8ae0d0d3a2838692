//! # Baked Regions
//!
//! The avatar surfaces the server composites into baked textures, and the
//! 16-byte fingerprint that keys the server's bake cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use wardrobe_core::WearableType;

/// A baked texture region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BakeRegion {
    /// Head and face.
    Head = 0,
    /// Torso and arms.
    UpperBody = 1,
    /// Legs and feet.
    LowerBody = 2,
    /// Eyes.
    Eyes = 3,
    /// Skirt.
    Skirt = 4,
    /// Hair.
    Hair = 5,
}

use wardrobe_core::WearableType::{
    Alpha, Eyes, Gloves, Hair, Jacket, Pants, Shape, Shirt, Shoes, Skin, Skirt, Socks, Tattoo,
    Underpants, Undershirt,
};

const HEAD_TYPES: &[WearableType] = &[Shape, Skin, Hair, Tattoo, Alpha];
const UPPER_TYPES: &[WearableType] = &[Shape, Skin, Shirt, Jacket, Gloves, Undershirt, Tattoo, Alpha];
const LOWER_TYPES: &[WearableType] = &[
    Shape, Skin, Pants, Shoes, Socks, Jacket, Underpants, Tattoo, Alpha,
];
const EYES_TYPES: &[WearableType] = &[Eyes, Alpha];
const SKIRT_TYPES: &[WearableType] = &[Skirt];
const HAIR_TYPES: &[WearableType] = &[Hair, Alpha];

impl BakeRegion {
    /// Number of regions.
    pub const COUNT: usize = 6;

    /// All regions in wire order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Head,
        Self::UpperBody,
        Self::LowerBody,
        Self::Eyes,
        Self::Skirt,
        Self::Hair,
    ];

    /// Wearable types that feed this region, in hashing order.
    #[must_use]
    pub const fn contributing_types(self) -> &'static [WearableType] {
        match self {
            Self::Head => HEAD_TYPES,
            Self::UpperBody => UPPER_TYPES,
            Self::LowerBody => LOWER_TYPES,
            Self::Eyes => EYES_TYPES,
            Self::Skirt => SKIRT_TYPES,
            Self::Hair => HAIR_TYPES,
        }
    }

    /// Returns true if a change to `wearable_type` invalidates this region.
    #[must_use]
    pub fn depends_on(self, wearable_type: WearableType) -> bool {
        self.contributing_types().contains(&wearable_type)
    }

    /// Salt mixed into the fingerprint after the asset ids.
    ///
    /// The server's bake cache is keyed with the same per-region ids, so
    /// these must match the grid's region table.
    #[must_use]
    pub const fn salt(self) -> Uuid {
        match self {
            Self::Head => Uuid::from_u128(0xa4b9_dc38_e13b_4df9_b284_751e_fb05_66ff),
            Self::UpperBody => Uuid::from_u128(0x5943_ff64_d26c_4a90_a8c0_d61f_56bd_98d4),
            Self::LowerBody => Uuid::from_u128(0x2944_ee70_90a7_425d_a5fb_d749_c782_ed7d),
            Self::Eyes => Uuid::from_u128(0x27b1_bc0f_979f_4b13_95fe_b981_c2ba_9788),
            Self::Skirt => Uuid::from_u128(0x03e7_e8cb_1368_483b_b6f3_7485_0838_ba63),
            Self::Hair => Uuid::from_u128(0xa60e_85a9_74e8_48d8_8a2d_8129_f28d_9b61),
        }
    }

    /// Index of the baked texture this region produces.
    #[inline]
    #[must_use]
    pub const fn texture_index(self) -> u8 {
        match self {
            Self::Head => 8,
            Self::UpperBody => 9,
            Self::LowerBody => 10,
            Self::Eyes => 11,
            Self::Skirt => 19,
            Self::Hair => 20,
        }
    }

    /// Region whose baked texture has the given index.
    #[must_use]
    pub fn from_texture_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.texture_index() == index)
    }

    /// Regions affected by a change to any of `types`.
    pub fn affected_by(types: &[WearableType]) -> impl Iterator<Item = Self> + '_ {
        Self::ALL
            .into_iter()
            .filter(move |r| types.iter().any(|t| r.depends_on(*t)))
    }
}

impl fmt::Display for BakeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::Eyes => "eyes",
            Self::Skirt => "skirt",
            Self::Hair => "hair",
        })
    }
}

/// 16-byte bake cache key. All zeroes means "nothing to query".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// The null fingerprint.
    pub const NULL: Self = Self([0; 16]);

    /// Wraps raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns true for the null fingerprint.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0; 16]
    }

    /// The fingerprint as a UUID, the form it takes on the wire.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_uuid(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_indices_unique() {
        for region in BakeRegion::ALL {
            assert_eq!(BakeRegion::from_texture_index(region.texture_index()), Some(region));
        }
        assert_eq!(BakeRegion::from_texture_index(0), None);
    }

    #[test]
    fn test_salt_text_form() {
        assert_eq!(
            BakeRegion::Head.salt().to_string(),
            "a4b9dc38-e13b-4df9-b284-751efb0566ff"
        );
        assert_eq!(
            BakeRegion::Skirt.salt().to_string(),
            "03e7e8cb-1368-483b-b6f3-74850838ba63"
        );
    }

    #[test]
    fn test_affected_regions() {
        let regions: Vec<_> = BakeRegion::affected_by(&[WearableType::Skirt]).collect();
        assert_eq!(regions, vec![BakeRegion::Skirt]);

        let regions: Vec<_> = BakeRegion::affected_by(&[WearableType::Alpha]).collect();
        assert_eq!(regions.len(), 5);
        assert!(!regions.contains(&BakeRegion::Skirt));

        assert_eq!(BakeRegion::affected_by(&[WearableType::Physics]).count(), 0);
    }

    #[test]
    fn test_null_fingerprint() {
        assert!(Fingerprint::NULL.is_null());
        assert!(Fingerprint::default().is_null());
        assert!(!Fingerprint::from_bytes([1; 16]).is_null());
    }
}
