//! # Bake Fingerprints
//!
//! Deterministic per-region cache keys.
//!
//! For each contributing type in the region's fixed order, and each worn
//! item of that type in store order, the 16 asset-id bytes are fed to an
//! MD5 digest. The region salt goes last (then the avatar salt for the
//! poisoned variant) and the 16-byte digest is the fingerprint. This is the
//! key the server's bake cache is indexed by, so the feed order is part of
//! the protocol. A region with no contributing items has the null
//! fingerprint.

use md5::{Digest, Md5};
use uuid::Uuid;
use wardrobe_core::WearableStore;
use wardrobe_shared::{BakeRegion, Fingerprint};

/// Fingerprint of `region` for the current store contents.
#[must_use]
pub fn compute_fingerprint(store: &WearableStore, region: BakeRegion) -> Fingerprint {
    digest(store, region, None)
}

/// Fingerprint that can never match a shared cache entry, forcing the
/// region to be rebaked and uploaded.
#[must_use]
pub fn compute_poisoned_fingerprint(
    store: &WearableStore,
    region: BakeRegion,
    avatar_salt: Uuid,
) -> Fingerprint {
    digest(store, region, Some(avatar_salt))
}

fn digest(store: &WearableStore, region: BakeRegion, avatar_salt: Option<Uuid>) -> Fingerprint {
    let mut hasher = Md5::new();
    let mut contributed = false;
    for t in region.contributing_types() {
        for item in store.items(*t) {
            hasher.update(item.asset_id.as_bytes());
            contributed = true;
        }
    }
    if !contributed {
        return Fingerprint::NULL;
    }

    hasher.update(region.salt().as_bytes());
    if let Some(salt) = avatar_salt {
        hasher.update(salt.as_bytes());
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hasher.finalize());
    Fingerprint::from_bytes(bytes)
}

/// Last known fingerprint of every region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionFingerprints([Fingerprint; BakeRegion::COUNT]);

impl RegionFingerprints {
    /// Computes every region from scratch.
    #[must_use]
    pub fn compute(store: &WearableStore) -> Self {
        let mut set = Self::default();
        for region in BakeRegion::ALL {
            set.0[region as usize] = compute_fingerprint(store, region);
        }
        set
    }

    /// Fingerprint of one region.
    #[inline]
    #[must_use]
    pub const fn get(&self, region: BakeRegion) -> Fingerprint {
        self.0[region as usize]
    }

    /// Regions and fingerprints that are not null.
    pub fn non_null(&self) -> impl Iterator<Item = (BakeRegion, Fingerprint)> + '_ {
        BakeRegion::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, fp)| !fp.is_null())
    }

    /// Recomputes `regions` and returns those whose fingerprint changed.
    pub fn refresh(
        &mut self,
        store: &WearableStore,
        regions: &[BakeRegion],
    ) -> Vec<(BakeRegion, Fingerprint)> {
        let mut changed = Vec::new();
        for &region in regions {
            let fingerprint = compute_fingerprint(store, region);
            if self.0[region as usize] != fingerprint {
                self.0[region as usize] = fingerprint;
                changed.push((region, fingerprint));
            }
        }
        changed
    }
}
