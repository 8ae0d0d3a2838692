//! # Bake Cache Queries
//!
//! Before rebaking, the client asks the server whether textures for the
//! current fingerprints are already cached. Each query carries a serial
//! number; only the response to the latest query is acted on.

use uuid::Uuid;
use wardrobe_shared::{BakeRegion, Fingerprint};

use crate::error::{AppearanceError, AppearanceResult};
use crate::fingerprint::RegionFingerprints;

/// One region in a cache query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheQueryEntry {
    /// Region queried.
    pub region: BakeRegion,
    /// Its fingerprint.
    pub fingerprint: Fingerprint,
}

impl CacheQueryEntry {
    /// Baked texture index sent on the wire.
    #[inline]
    #[must_use]
    pub const fn texture_index(&self) -> u8 {
        self.region.texture_index()
    }
}

/// A cache query ready to be encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheQuery {
    /// Serial number the response must echo.
    pub serial: u32,
    /// Regions with a non-null fingerprint.
    pub entries: Vec<CacheQueryEntry>,
}

/// One line of a cache response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheResponseEntry {
    /// Baked texture index.
    pub texture_index: u8,
    /// Cached texture, nil on a miss.
    pub texture_id: Uuid,
}

/// Server answer to a [`CacheQuery`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheResponse {
    /// Serial of the query being answered.
    pub serial: u32,
    /// Per-region results.
    pub entries: Vec<CacheResponseEntry>,
}

/// What the server knows about one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheVerdict {
    /// A baked texture exists and can be used as is.
    Hit {
        /// Region.
        region: BakeRegion,
        /// Cached texture.
        texture_id: Uuid,
    },
    /// Nothing cached; the region must be baked and uploaded.
    Miss {
        /// Region.
        region: BakeRegion,
    },
}

/// Tracks query serials and outstanding regions.
#[derive(Debug, Default)]
pub struct BakeCacheTracker {
    serial: u32,
    outstanding: usize,
}

impl BakeCacheTracker {
    /// Creates a tracker with no query sent yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serial of the most recent query.
    #[inline]
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Regions queried whose answer has not arrived.
    #[inline]
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Builds a query for every non-null fingerprint. Returns `None` when
    /// there is nothing to ask.
    pub fn build_query(&mut self, fingerprints: &RegionFingerprints) -> Option<CacheQuery> {
        let entries: Vec<CacheQueryEntry> = fingerprints
            .non_null()
            .map(|(region, fingerprint)| CacheQueryEntry {
                region,
                fingerprint,
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        self.serial = self.serial.wrapping_add(1);
        self.outstanding = entries.len();
        tracing::debug!(serial = self.serial, regions = entries.len(), "bake cache query built");
        Some(CacheQuery {
            serial: self.serial,
            entries,
        })
    }

    /// Classifies a response. A response to an older serial yields no
    /// verdicts. Unknown texture indices are skipped and logged.
    ///
    /// # Errors
    ///
    /// [`AppearanceError::UnknownTextureIndex`] if no entry could be
    /// classified.
    pub fn process_response(&mut self, response: &CacheResponse) -> AppearanceResult<Vec<CacheVerdict>> {
        if response.serial != self.serial {
            tracing::trace!(
                got = response.serial,
                expected = self.serial,
                "stale bake cache response discarded"
            );
            return Ok(Vec::new());
        }

        let mut verdicts = Vec::with_capacity(response.entries.len());
        let mut first_unknown = None;
        for entry in &response.entries {
            let Some(region) = BakeRegion::from_texture_index(entry.texture_index) else {
                tracing::warn!(texture_index = entry.texture_index, "unknown baked texture index");
                first_unknown.get_or_insert(entry.texture_index);
                continue;
            };
            verdicts.push(if entry.texture_id.is_nil() {
                CacheVerdict::Miss { region }
            } else {
                CacheVerdict::Hit {
                    region,
                    texture_id: entry.texture_id,
                }
            });
        }
        self.outstanding = self.outstanding.saturating_sub(verdicts.len());

        match first_unknown {
            Some(index) if verdicts.is_empty() => Err(AppearanceError::UnknownTextureIndex(index)),
            _ => Ok(verdicts),
        }
    }
}
