//! # Outfit Resolver
//!
//! Fan-out/fan-in over asset fetches for one outfit request at a time.
//!
//! ## State Machine
//!
//! ```text
//! (none) ──request──> AwaitingAssets ──all in / deadline──> AllResolved ──> Composed
//!                           │
//!                           └──superseded──> Cancelled
//! ```
//!
//! Fetch completions may be produced on any thread. They are posted to a
//! channel and only applied when the owner calls [`OutfitResolver::poll`] on
//! the main context, so the request never needs a lock.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wardrobe_core::{AssetId, ItemId, WearableType};
use wardrobe_shared::RequestId;

use crate::collaborators::{AssetData, AssetFetchError, AssetStore};
use crate::config::ResolverConfig;

/// One `(item, asset, type)` line of an outfit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutfitEntry {
    /// Inventory item being worn.
    pub item_id: ItemId,
    /// Asset to fetch.
    pub asset_id: AssetId,
    /// Type the item is worn as.
    pub wearable_type: WearableType,
}

impl OutfitEntry {
    /// Creates an entry.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, asset_id: AssetId, wearable_type: WearableType) -> Self {
        Self {
            item_id,
            asset_id,
            wearable_type,
        }
    }
}

/// Shared flag that invalidates a superseded request.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every holder of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of an outfit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    /// Fetches outstanding.
    AwaitingAssets,
    /// Every entry resolved or marked missing; batch handed out.
    AllResolved,
    /// The batch was applied to the store.
    Composed,
    /// Superseded before composition.
    Cancelled,
}

#[derive(Debug)]
struct FetchOutcome {
    request_id: RequestId,
    entry_index: usize,
    result: Result<AssetData, AssetFetchError>,
}

/// Completion handle for one asset fetch.
///
/// Consumed by [`FetchCompletion::complete`]. Dropping it without completing
/// reports [`AssetFetchError::Abandoned`].
#[derive(Debug)]
pub struct FetchCompletion {
    request_id: RequestId,
    entry_index: usize,
    asset_id: AssetId,
    wearable_type: WearableType,
    token: CancellationToken,
    sender: Sender<FetchOutcome>,
    posted: bool,
}

impl FetchCompletion {
    /// Request this fetch belongs to.
    #[inline]
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Asset being fetched.
    #[inline]
    #[must_use]
    pub const fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Type the asset is expected to be.
    #[inline]
    #[must_use]
    pub const fn wearable_type(&self) -> WearableType {
        self.wearable_type
    }

    /// Returns true if the owning request was superseded; the result will be
    /// ignored, so the fetch may be skipped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Delivers the fetch result.
    pub fn complete(mut self, result: Result<AssetData, AssetFetchError>) {
        self.post(result);
    }

    fn post(&mut self, result: Result<AssetData, AssetFetchError>) {
        self.posted = true;
        // A closed channel means the resolver is gone; nobody is waiting.
        let _ = self.sender.send(FetchOutcome {
            request_id: self.request_id,
            entry_index: self.entry_index,
            result,
        });
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if !self.posted {
            self.post(Err(AssetFetchError::Abandoned));
        }
    }
}

/// Final outcome of one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// The requested entry.
    pub entry: OutfitEntry,
    /// Fetched asset, or why it is missing.
    pub outcome: Result<AssetData, AssetFetchError>,
}

impl ResolvedEntry {
    /// Returns true if the asset could not be fetched.
    #[inline]
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.outcome.is_err()
    }
}

/// A fully resolved outfit request, in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOutfit {
    /// Request id.
    pub request_id: RequestId,
    /// Entries in the order they were requested.
    pub entries: Vec<ResolvedEntry>,
    /// Keep currently worn clothing.
    pub append: bool,
    /// Replace the clothing types this batch supplies.
    pub replace: bool,
}

impl ResolvedOutfit {
    /// Number of entries whose asset is missing.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_missing()).count()
    }
}

#[derive(Debug)]
struct OutfitRequest {
    id: RequestId,
    entries: Vec<OutfitEntry>,
    outcomes: Vec<Option<Result<AssetData, AssetFetchError>>>,
    retries: Vec<u32>,
    pending: usize,
    append: bool,
    replace: bool,
    token: CancellationToken,
    deadline: Option<Instant>,
    state: RequestState,
}

impl OutfitRequest {
    fn new(
        id: RequestId,
        entries: Vec<OutfitEntry>,
        append: bool,
        replace: bool,
        deadline: Option<Instant>,
    ) -> Self {
        let n = entries.len();
        Self {
            id,
            entries,
            outcomes: vec![None; n],
            retries: vec![0; n],
            pending: n,
            append,
            replace,
            token: CancellationToken::new(),
            deadline,
            state: RequestState::AwaitingAssets,
        }
    }

    fn record(&mut self, index: usize, outcome: Result<AssetData, AssetFetchError>) {
        if let Some(slot) = self.outcomes.get_mut(index) {
            if slot.is_none() {
                *slot = Some(outcome);
                self.pending -= 1;
            }
        }
    }

    fn expire(&mut self) {
        tracing::warn!(request = %self.id, pending = self.pending, "outfit request timed out");
        for slot in self.outcomes.iter_mut().filter(|o| o.is_none()) {
            *slot = Some(Err(AssetFetchError::TimedOut));
        }
        self.pending = 0;
    }

    fn to_resolved(&self) -> ResolvedOutfit {
        let entries = self
            .entries
            .iter()
            .zip(&self.outcomes)
            .map(|(entry, outcome)| ResolvedEntry {
                entry: *entry,
                outcome: outcome.clone().unwrap_or(Err(AssetFetchError::TimedOut)),
            })
            .collect();
        ResolvedOutfit {
            request_id: self.id,
            entries,
            append: self.append,
            replace: self.replace,
        }
    }
}

/// Resolves outfit requests against an [`AssetStore`].
///
/// At most one request is active. Starting a new one cancels the previous
/// request in place.
///
/// Fetched assets are kept for the life of the session so re-wearing an
/// item never fetches it twice. Wearable assets are small and an avatar
/// cycles through few of them; nothing is evicted unless the caller drops
/// an entry with [`forget_asset`](Self::forget_asset).
#[derive(Debug)]
pub struct OutfitResolver {
    config: ResolverConfig,
    sender: Sender<FetchOutcome>,
    receiver: Receiver<FetchOutcome>,
    next_id: u64,
    active: Option<OutfitRequest>,
    cache: HashMap<AssetId, AssetData>,
}

impl OutfitResolver {
    /// Creates an idle resolver.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            config,
            sender,
            receiver,
            next_id: 0,
            active: None,
            cache: HashMap::new(),
        }
    }

    /// Starts resolving `items`. Returns immediately.
    ///
    /// An empty list is ignored and returns `None`. Any request still in
    /// flight is cancelled; its late completions are discarded. Assets
    /// already in the cache resolve without a fetch.
    pub fn request_wear_outfit(
        &mut self,
        items: Vec<OutfitEntry>,
        append: bool,
        replace: bool,
        assets: &mut dyn AssetStore,
        now: Instant,
    ) -> Option<RequestId> {
        if items.is_empty() {
            tracing::debug!("empty outfit request ignored");
            return None;
        }
        self.cancel();

        self.next_id += 1;
        let id = RequestId(self.next_id);
        let deadline = self.config.timeout().map(|timeout| now + timeout);
        let mut request = OutfitRequest::new(id, items, append, replace, deadline);

        let hits: Vec<(usize, AssetData)> = request
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| self.cache.get(&e.asset_id).map(|d| (i, d.clone())))
            .collect();
        for (index, data) in hits {
            request.record(index, Ok(data));
        }
        let to_fetch: Vec<usize> = (0..request.entries.len())
            .filter(|&i| request.outcomes[i].is_none())
            .collect();

        tracing::info!(
            request = %id,
            entries = request.entries.len(),
            cached = request.entries.len() - to_fetch.len(),
            append,
            replace,
            "outfit request started"
        );

        for index in to_fetch {
            dispatch(&self.sender, &request, index, assets);
        }
        self.active = Some(request);
        Some(id)
    }

    /// Applies queued completions and returns the resolved batch once, when
    /// every entry is in or the deadline has passed.
    pub fn poll(&mut self, assets: &mut dyn AssetStore, now: Instant) -> Option<ResolvedOutfit> {
        while let Ok(outcome) = self.receiver.try_recv() {
            self.apply(outcome, assets);
        }

        let request = self.active.as_mut()?;
        if request.state != RequestState::AwaitingAssets {
            return None;
        }
        if request.pending > 0 {
            match request.deadline {
                Some(deadline) if now >= deadline => request.expire(),
                _ => return None,
            }
        }

        request.state = RequestState::AllResolved;
        let resolved = request.to_resolved();
        tracing::info!(
            request = %request.id,
            missing = resolved.missing_count(),
            "outfit request resolved"
        );
        Some(resolved)
    }

    /// Records that the batch of `request_id` was applied to the store.
    /// Returns false if it is not the resolved active request.
    pub fn mark_composed(&mut self, request_id: RequestId) -> bool {
        match self.active.as_mut() {
            Some(request)
                if request.id == request_id && request.state == RequestState::AllResolved =>
            {
                request.state = RequestState::Composed;
                true
            }
            _ => false,
        }
    }

    /// Cancels the active request unless it was already composed. Returns its
    /// id if one was cancelled.
    pub fn cancel(&mut self) -> Option<RequestId> {
        let request = self
            .active
            .as_mut()
            .filter(|r| matches!(r.state, RequestState::AwaitingAssets | RequestState::AllResolved))?;
        request.state = RequestState::Cancelled;
        request.token.cancel();
        tracing::info!(request = %request.id, pending = request.pending, "outfit request cancelled");
        Some(request.id)
    }

    /// The active request and its state.
    #[must_use]
    pub fn state(&self) -> Option<(RequestId, RequestState)> {
        self.active.as_ref().map(|r| (r.id, r.state))
    }

    /// Fetches still outstanding for the active request.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.active
            .as_ref()
            .filter(|r| r.state == RequestState::AwaitingAssets)
            .map_or(0, |r| r.pending)
    }

    /// A previously fetched asset.
    #[must_use]
    pub fn cached_asset(&self, asset_id: AssetId) -> Option<&AssetData> {
        self.cache.get(&asset_id)
    }

    /// Number of cached assets.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drops a cached asset so the next request fetches it again.
    pub fn forget_asset(&mut self, asset_id: AssetId) {
        self.cache.remove(&asset_id);
    }

    fn apply(&mut self, outcome: FetchOutcome, assets: &mut dyn AssetStore) {
        let Some(request) = self
            .active
            .as_mut()
            .filter(|r| r.id == outcome.request_id && r.state == RequestState::AwaitingAssets)
        else {
            tracing::trace!(request = %outcome.request_id, "stale fetch completion discarded");
            return;
        };
        let index = outcome.entry_index;
        let Some(entry) = request.entries.get(index).copied() else {
            return;
        };
        if request.outcomes[index].is_some() {
            tracing::trace!(request = %request.id, index, "duplicate fetch completion discarded");
            return;
        }

        match outcome.result {
            Ok(data) => {
                self.cache.insert(entry.asset_id, data.clone());
                request.record(index, Ok(data));
            }
            Err(err) if err.is_retryable() && request.retries[index] < self.config.max_fetch_retries => {
                request.retries[index] += 1;
                tracing::debug!(
                    asset_id = %entry.asset_id,
                    attempt = request.retries[index],
                    %err,
                    "retrying asset fetch"
                );
                dispatch(&self.sender, request, index, assets);
            }
            Err(err) => {
                tracing::warn!(asset_id = %entry.asset_id, wearable_type = %entry.wearable_type, %err, "asset fetch failed");
                request.record(index, Err(err));
            }
        }
    }
}

fn dispatch(
    sender: &Sender<FetchOutcome>,
    request: &OutfitRequest,
    index: usize,
    assets: &mut dyn AssetStore,
) {
    let entry = request.entries[index];
    let completion = FetchCompletion {
        request_id: request.id,
        entry_index: index,
        asset_id: entry.asset_id,
        wearable_type: entry.wearable_type,
        token: request.token.clone(),
        sender: sender.clone(),
        posted: false,
    };
    assets.fetch_asset(entry.asset_id, entry.wearable_type, completion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct DeferredStore {
        handles: Vec<FetchCompletion>,
        requested: Vec<AssetId>,
    }

    impl AssetStore for DeferredStore {
        fn fetch_asset(&mut self, asset_id: AssetId, _: WearableType, completion: FetchCompletion) {
            self.requested.push(asset_id);
            self.handles.push(completion);
        }
    }

    fn succeed(completion: FetchCompletion) {
        let data = AssetData {
            asset_id: completion.asset_id(),
            wearable_type: completion.wearable_type(),
            name: "asset".into(),
        };
        completion.complete(Ok(data));
    }

    fn entries(types: &[WearableType]) -> Vec<OutfitEntry> {
        types
            .iter()
            .map(|t| OutfitEntry::new(ItemId::generate(), AssetId::generate(), *t))
            .collect()
    }

    fn resolver(retries: u32) -> OutfitResolver {
        OutfitResolver::new(ResolverConfig {
            timeout_ms: 1_000,
            max_fetch_retries: retries,
        })
    }

    #[test]
    fn test_empty_request_is_noop() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        assert_eq!(resolver.request_wear_outfit(Vec::new(), true, false, &mut store, now), None);
        assert_eq!(resolver.state(), None);
        assert!(resolver.poll(&mut store, now).is_none());
    }

    #[test]
    fn test_order_independent_of_arrival() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        let items = entries(&[WearableType::Shape, WearableType::Shirt, WearableType::Pants]);
        let id = resolver
            .request_wear_outfit(items.clone(), false, false, &mut store, now)
            .unwrap();
        assert_eq!(resolver.pending_count(), 3);

        while let Some(handle) = store.handles.pop() {
            assert!(resolver.poll(&mut store, now).is_none());
            succeed(handle);
        }
        let resolved = resolver.poll(&mut store, now).unwrap();
        assert_eq!(resolved.request_id, id);
        let order: Vec<_> = resolved.entries.iter().map(|e| e.entry).collect();
        assert_eq!(order, items);
        assert_eq!(resolved.missing_count(), 0);

        // Handed out exactly once.
        assert!(resolver.poll(&mut store, now).is_none());
        assert_eq!(resolver.state(), Some((id, RequestState::AllResolved)));
        assert!(resolver.mark_composed(id));
        assert_eq!(resolver.state(), Some((id, RequestState::Composed)));
    }

    #[test]
    fn test_superseded_completions_ignored() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        resolver.request_wear_outfit(entries(&[WearableType::Hair]), false, false, &mut store, now);
        let old = store.handles.pop().unwrap();

        let b = resolver
            .request_wear_outfit(entries(&[WearableType::Eyes]), false, false, &mut store, now)
            .unwrap();
        assert!(old.is_cancelled());
        succeed(old);
        assert!(resolver.poll(&mut store, now).is_none());
        assert_eq!(resolver.pending_count(), 1);

        succeed(store.handles.pop().unwrap());
        let resolved = resolver.poll(&mut store, now).unwrap();
        assert_eq!(resolved.request_id, b);
        assert_eq!(resolved.entries[0].entry.wearable_type, WearableType::Eyes);
    }

    #[test]
    fn test_abandoned_fetch_retried_then_missing() {
        let mut resolver = resolver(1);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        resolver.request_wear_outfit(entries(&[WearableType::Skin]), false, false, &mut store, now);

        store.handles.clear();
        assert!(resolver.poll(&mut store, now).is_none());
        assert_eq!(store.requested.len(), 2);

        store.handles.clear();
        let resolved = resolver.poll(&mut store, now).unwrap();
        assert_eq!(resolved.entries[0].outcome, Err(AssetFetchError::Abandoned));
        assert_eq!(store.requested.len(), 2);
    }

    #[test]
    fn test_not_found_is_final() {
        let mut resolver = resolver(3);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        resolver.request_wear_outfit(entries(&[WearableType::Gloves]), true, false, &mut store, now);
        store.handles.pop().unwrap().complete(Err(AssetFetchError::NotFound));
        let resolved = resolver.poll(&mut store, now).unwrap();
        assert!(resolved.entries[0].is_missing());
        assert_eq!(store.requested.len(), 1);
    }

    #[test]
    fn test_deadline_marks_pending_missing() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        resolver.request_wear_outfit(
            entries(&[WearableType::Shirt, WearableType::Socks]),
            true,
            false,
            &mut store,
            now,
        );
        succeed(store.handles.remove(0));
        assert!(resolver.poll(&mut store, now + Duration::from_millis(999)).is_none());

        let resolved = resolver.poll(&mut store, now + Duration::from_secs(1)).unwrap();
        assert!(resolved.entries[0].outcome.is_ok());
        assert_eq!(resolved.entries[1].outcome, Err(AssetFetchError::TimedOut));

        // The straggler arrives after the deadline and changes nothing.
        succeed(store.handles.remove(0));
        assert!(resolver.poll(&mut store, now + Duration::from_secs(2)).is_none());
    }

    #[test]
    fn test_cached_assets_skip_fetch() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        let items = entries(&[WearableType::Tattoo]);
        resolver.request_wear_outfit(items.clone(), true, false, &mut store, now);
        succeed(store.handles.pop().unwrap());
        let first = resolver.poll(&mut store, now).unwrap();
        assert!(resolver.mark_composed(first.request_id));
        assert!(resolver.cached_asset(items[0].asset_id).is_some());

        let second = resolver
            .request_wear_outfit(items, true, false, &mut store, now)
            .unwrap();
        assert_eq!(store.requested.len(), 1);
        let resolved = resolver.poll(&mut store, now).unwrap();
        assert_eq!(resolved.request_id, second);
        assert!(resolved.entries[0].outcome.is_ok());
    }

    #[test]
    fn test_forgotten_asset_is_fetched_again() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        let items = entries(&[WearableType::Gloves, WearableType::Socks]);
        resolver.request_wear_outfit(items.clone(), true, false, &mut store, now);
        for completion in store.handles.drain(..) {
            succeed(completion);
        }
        resolver.poll(&mut store, now).unwrap();
        assert_eq!(resolver.cached_count(), 2);

        resolver.forget_asset(items[0].asset_id);
        assert_eq!(resolver.cached_count(), 1);
        assert!(resolver.cached_asset(items[0].asset_id).is_none());

        resolver.request_wear_outfit(items.clone(), true, false, &mut store, now);
        assert_eq!(store.requested.len(), 3);
        assert_eq!(store.requested[2], items[0].asset_id);
    }

    #[test]
    fn test_cancel_flips_token() {
        let mut resolver = resolver(0);
        let mut store = DeferredStore::default();
        let now = Instant::now();
        resolver.request_wear_outfit(entries(&[WearableType::Alpha]), true, false, &mut store, now);
        let id = resolver.cancel().unwrap();
        assert_eq!(resolver.state(), Some((id, RequestState::Cancelled)));
        assert_eq!(resolver.pending_count(), 0);
        assert_eq!(resolver.cancel(), None);
        assert!(store.handles[0].is_cancelled());
    }
}
