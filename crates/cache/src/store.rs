//! In-memory cache for decoded images and volumes.
//!
//! [`ResourceCache`] owns the authoritative maps for both resource kinds and
//! composes the byte budget, the eviction policy and the in-flight load
//! registry. All completion handling (size accounting, eviction, map
//! mutation, event queueing) for one cache instance runs inside a single
//! critical section, so concurrent load completions can never jointly exceed
//! the byte budget.
//!
//! The cache is passive: loads run on the calling thread, and eviction
//! happens lazily when an insert needs space. Entries with a non-zero
//! reference count are pinned and never selected for eviction; if pinned
//! entries leave too little reclaimable space for a new entry, the insert
//! fails with [`CacheError::CapacityExceeded`] instead of overshooting the
//! budget.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, warn};

use crate::budget::ByteBudget;
use crate::config::CacheConfig;
use crate::entry::{
    DecodedImage, EntryInfo, ImageEntry, ImageHandle, ResourceId, VolumeDescriptor, VolumeEntry,
    VolumeHandle,
};
use crate::error::{CacheError, LoadError};
use crate::events::{CacheEvent, EventFanout, EventSink, ResourceKind};
use crate::eviction::{select_victims, VictimCandidate};
use crate::inflight::InflightLoads;

/// Snapshot of cache health counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of resident images.
    pub image_count: usize,
    /// Number of resident volumes.
    pub volume_count: usize,
    /// Total bytes committed against the budget.
    pub bytes_used: u64,
    /// Configured budget in bytes.
    pub max_bytes: u64,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries evicted to make room.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate budget utilization (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        if self.max_bytes == 0 {
            0.0
        } else {
            self.bytes_used as f64 / self.max_bytes as f64
        }
    }
}

/// State guarded by the cache's single critical section: both resource maps,
/// the byte accounting, the logical access clock and the counters.
struct CacheState {
    images: HashMap<ResourceId, ImageEntry>,
    volumes: HashMap<ResourceId, VolumeEntry>,
    budget: ByteBudget,
    /// Logical clock bumped on every access; strictly increasing under the
    /// lock, so LRU order is total.
    clock: u64,
    /// Insertion sequence, the deterministic tie-break for victim selection.
    sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn new(max_bytes: u64) -> Self {
        Self {
            images: HashMap::new(),
            volumes: HashMap::new(),
            budget: ByteBudget::new(max_bytes),
            clock: 0,
            sequence: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Snapshot of every resident entry for victim selection.
    fn candidates(&self) -> Vec<VictimCandidate> {
        let images = self.images.iter().map(|(id, e)| VictimCandidate {
            id: id.clone(),
            kind: ResourceKind::Image,
            byte_size: e.byte_size,
            last_access: e.last_access,
            sequence: e.sequence,
            pinned: e.ref_count > 0,
        });
        let volumes = self.volumes.iter().map(|(id, e)| VictimCandidate {
            id: id.clone(),
            kind: ResourceKind::Volume,
            byte_size: e.byte_size,
            last_access: e.last_access,
            sequence: e.sequence,
            pinned: e.ref_count > 0,
        });
        images.chain(volumes).collect()
    }

    /// Remove an entry and release its accounted bytes, reconciling the
    /// recorded size against the actual buffer first. Callers are
    /// responsible for pin checks.
    fn remove_entry(&mut self, id: &str, kind: ResourceKind) -> Result<u64, CacheError> {
        let (recorded, actual) = match kind {
            ResourceKind::Image => {
                let entry = self
                    .images
                    .get(id)
                    .ok_or_else(|| CacheError::NotFound(id.to_string()))?;
                (entry.byte_size, entry.pixels.len() as u64)
            }
            ResourceKind::Volume => {
                let entry = self
                    .volumes
                    .get(id)
                    .ok_or_else(|| CacheError::NotFound(id.to_string()))?;
                (entry.byte_size, entry.voxels.read().unwrap().len() as u64)
            }
        };
        if recorded != actual {
            return Err(CacheError::Consistency(format!(
                "entry `{id}` records {recorded} bytes but its buffer holds {actual}"
            )));
        }
        match kind {
            ResourceKind::Image => {
                self.images.remove(id);
            }
            ResourceKind::Volume => {
                self.volumes.remove(id);
            }
        }
        self.budget.release(recorded)?;
        Ok(recorded)
    }

    /// Evict unpinned entries until `incoming` bytes fit under the budget.
    ///
    /// Victims are selected up front; if the eligible set cannot cover the
    /// shortfall, nothing is evicted and the pending insert fails, leaving
    /// usage unchanged.
    fn make_room(
        &mut self,
        incoming: u64,
        events: &mut Vec<CacheEvent>,
    ) -> Result<(), CacheError> {
        let shortfall = self.budget.shortfall(incoming);
        if shortfall == 0 {
            return Ok(());
        }
        let selection = select_victims(self.candidates(), shortfall);
        if !selection.sufficient {
            return Err(CacheError::CapacityExceeded {
                needed_bytes: shortfall,
                reclaimable_bytes: selection.freed_bytes,
            });
        }
        for (id, kind) in selection.victims {
            let freed = self.remove_entry(&id, kind)?;
            self.evictions += 1;
            debug!("evicted {kind:?} `{id}` ({freed} bytes)");
            events.push(CacheEvent::ResourceRemoved { id, kind });
        }
        Ok(())
    }
}

/// Byte-budgeted cache of decoded images and volumes with in-flight load
/// deduplication, LRU eviction and lifecycle events.
///
/// # Example
///
/// ```
/// use image_viewer_cache::{CacheConfig, DecodedImage, ResourceCache};
///
/// let cache = ResourceCache::new(CacheConfig::new(256));
///
/// let handle = cache
///     .get_or_load_image("series-1/slice-40", || {
///         // Decode/network work happens here, exactly once per id even
///         // under concurrent requests.
///         Ok(DecodedImage::new(vec![0u8; 512 * 512 * 2], 512, 512))
///     })
///     .unwrap();
///
/// assert_eq!(handle.pixels().len(), 512 * 512 * 2);
/// assert_eq!(cache.usage(), 512 * 512 * 2);
/// ```
pub struct ResourceCache {
    state: Mutex<CacheState>,
    events: EventFanout,
    inflight_images: InflightLoads<Result<ImageHandle, CacheError>>,
    inflight_volumes: InflightLoads<Result<VolumeHandle, CacheError>>,
}

impl ResourceCache {
    /// Create a cache with the given configuration and no event sink.
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a cache that delivers lifecycle events to `sink`.
    pub fn with_event_sink(config: CacheConfig, sink: Arc<dyn EventSink>) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: CacheConfig, sink: Option<Arc<dyn EventSink>>) -> Self {
        Self {
            state: Mutex::new(CacheState::new(config.max_bytes)),
            events: EventFanout::new(sink),
            inflight_images: InflightLoads::new(),
            inflight_volumes: InflightLoads::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Look up a resident image, updating its recency. Does not trigger a
    /// load.
    pub fn get_image(&self, id: &str) -> Option<ImageHandle> {
        let mut state = self.state.lock().unwrap();
        let tick = state.tick();
        if let Some(entry) = state.images.get_mut(id) {
            entry.last_access = tick;
            let handle = entry.handle(id);
            state.hits += 1;
            Some(handle)
        } else {
            state.misses += 1;
            None
        }
    }

    /// Look up a resident volume, updating its recency. Does not trigger a
    /// load.
    pub fn get_volume(&self, id: &str) -> Option<VolumeHandle> {
        let mut state = self.state.lock().unwrap();
        let tick = state.tick();
        if let Some(entry) = state.volumes.get_mut(id) {
            entry.last_access = tick;
            let handle = entry.handle(id);
            state.hits += 1;
            Some(handle)
        } else {
            state.misses += 1;
            None
        }
    }

    /// Whether a resource of either kind is resident. Does not update
    /// recency.
    pub fn contains(&self, id: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.images.contains_key(id) || state.volumes.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Return the cached image for `id`, loading it if absent.
    ///
    /// Concurrent calls for the same absent id invoke `loader` exactly once;
    /// every caller receives the same outcome. A loader failure caches
    /// nothing and a subsequent call is a fresh load.
    pub fn get_or_load_image<F>(&self, id: &str, loader: F) -> Result<ImageHandle, CacheError>
    where
        F: FnOnce() -> Result<DecodedImage, LoadError>,
    {
        if let Some(handle) = self.get_image(id) {
            return Ok(handle);
        }
        self.inflight_images
            .run_or_join(id, || self.load_image_leader(id, loader))
    }

    fn load_image_leader<F>(&self, id: &str, loader: F) -> Result<ImageHandle, CacheError>
    where
        F: FnOnce() -> Result<DecodedImage, LoadError>,
    {
        // Another leader may have finished between our miss and taking
        // leadership.
        if let Some(handle) = self.get_image(id) {
            return Ok(handle);
        }
        match loader() {
            Ok(image) => self.insert_image(id, image),
            Err(err) => {
                warn!("loader for image `{id}` failed: {err}");
                let error = CacheError::LoadFailed {
                    id: id.to_string(),
                    reason: err.message().to_string(),
                };
                {
                    let _state = self.state.lock().unwrap();
                    self.events.enqueue([CacheEvent::LoadFailed {
                        id: id.to_string(),
                        reason: err.message().to_string(),
                    }]);
                }
                self.events.flush();
                Err(error)
            }
        }
    }

    /// Insertion path for a freshly decoded image: evict to fit, commit
    /// bytes, insert, emit the added event.
    fn insert_image(&self, id: &str, image: DecodedImage) -> Result<ImageHandle, CacheError> {
        let byte_size = image.byte_size();
        let handle = {
            let mut state = self.state.lock().unwrap();
            let mut events = Vec::new();
            if let Err(err) = state.make_room(byte_size, &mut events) {
                warn!("cannot admit image `{id}`: {err}");
                events.push(CacheEvent::LoadFailed {
                    id: id.to_string(),
                    reason: err.to_string(),
                });
                self.events.enqueue(events);
                drop(state);
                self.events.flush();
                // The decoded buffer is dropped here, uncommitted.
                return Err(err);
            }
            state.budget.commit(byte_size);
            let last_access = state.tick();
            let sequence = state.next_sequence();
            let entry = ImageEntry {
                pixels: Arc::new(image.pixels),
                width: image.width,
                height: image.height,
                byte_size,
                last_access,
                sequence,
                ref_count: 0,
            };
            let handle = entry.handle(id);
            state.images.insert(id.to_string(), entry);
            events.push(CacheEvent::ResourceAdded {
                id: id.to_string(),
                kind: ResourceKind::Image,
            });
            self.events.enqueue(events);
            handle
        };
        self.events.flush();
        Ok(handle)
    }

    /// Return the cached volume for `id`, loading it if absent.
    ///
    /// The full allocation described by `descriptor` is made and accounted
    /// at load initiation; `loader` then streams frames through the provided
    /// [`VolumeWriter`]. Progress events fire per frame and a fully-loaded
    /// event fires exactly once when the last frame arrives. A mid-stream
    /// failure releases the full reservation and removes the entry.
    ///
    /// Concurrent calls for the same absent id share one load, as for
    /// images. The entry is pinned for the duration of the load so that a
    /// concurrent insert cannot evict a volume that is still streaming.
    pub fn get_or_load_volume<F>(
        &self,
        id: &str,
        descriptor: &VolumeDescriptor,
        loader: F,
    ) -> Result<VolumeHandle, CacheError>
    where
        F: FnOnce(&VolumeWriter<'_>) -> Result<(), LoadError>,
    {
        if let Some(handle) = self.get_volume(id) {
            return Ok(handle);
        }
        self.inflight_volumes
            .run_or_join(id, || self.load_volume_leader(id, descriptor, loader))
    }

    fn load_volume_leader<F>(
        &self,
        id: &str,
        descriptor: &VolumeDescriptor,
        loader: F,
    ) -> Result<VolumeHandle, CacheError>
    where
        F: FnOnce(&VolumeWriter<'_>) -> Result<(), LoadError>,
    {
        if let Some(handle) = self.get_volume(id) {
            return Ok(handle);
        }
        self.allocate_volume(id, descriptor)?;

        let writer = VolumeWriter { cache: self, id };
        match loader(&writer) {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                let tick = state.tick();
                // A force-removal may have taken the entry out from under the
                // load's pin; that is a recoverable race, not accounting
                // drift.
                let Some(entry) = state.volumes.get_mut(id) else {
                    return Err(CacheError::LoadFailed {
                        id: id.to_string(),
                        reason: "volume was removed while its load was in progress".to_string(),
                    });
                };
                // Drop the load's own pin; the entry stays resident for
                // future consumers.
                entry.ref_count = entry.ref_count.saturating_sub(1);
                entry.last_access = tick;
                Ok(entry.handle(id))
            }
            Err(err) => {
                warn!("loader for volume `{id}` failed: {err}");
                self.discard_failed_volume(id, err.message())?;
                Err(CacheError::LoadFailed {
                    id: id.to_string(),
                    reason: err.message().to_string(),
                })
            }
        }
    }

    /// Reserve and insert the zero-filled full-volume allocation, pinned by
    /// the in-progress load.
    fn allocate_volume(&self, id: &str, descriptor: &VolumeDescriptor) -> Result<(), CacheError> {
        let total = descriptor.total_bytes();
        {
            let mut state = self.state.lock().unwrap();
            let mut events = Vec::new();
            if let Err(err) = state.make_room(total, &mut events) {
                warn!("cannot admit volume `{id}`: {err}");
                events.push(CacheEvent::LoadFailed {
                    id: id.to_string(),
                    reason: err.to_string(),
                });
                self.events.enqueue(events);
                drop(state);
                self.events.flush();
                return Err(err);
            }
            state.budget.commit(total);
            let last_access = state.tick();
            let sequence = state.next_sequence();
            let entry = VolumeEntry {
                frame_of_reference_id: descriptor.frame_of_reference_id.clone(),
                number_of_frames: descriptor.number_of_frames,
                frames_processed: 0,
                frames_written: vec![false; descriptor.number_of_frames as usize],
                voxels: Arc::new(RwLock::new(vec![0u8; total as usize])),
                frame_byte_size: descriptor.frame_byte_size,
                byte_size: total,
                last_access,
                sequence,
                ref_count: 1,
            };
            state.volumes.insert(id.to_string(), entry);
            events.push(CacheEvent::ResourceAdded {
                id: id.to_string(),
                kind: ResourceKind::Volume,
            });
            self.events.enqueue(events);
        }
        self.events.flush();
        Ok(())
    }

    /// Remove a volume whose load failed mid-stream, releasing the full
    /// reservation. The failure event fires before the removal event.
    fn discard_failed_volume(&self, id: &str, reason: &str) -> Result<(), CacheError> {
        {
            let mut state = self.state.lock().unwrap();
            let mut events = vec![CacheEvent::LoadFailed {
                id: id.to_string(),
                reason: reason.to_string(),
            }];
            if state.volumes.contains_key(id) {
                state.remove_entry(id, ResourceKind::Volume)?;
                events.push(CacheEvent::ResourceRemoved {
                    id: id.to_string(),
                    kind: ResourceKind::Volume,
                });
            }
            self.events.enqueue(events);
        }
        self.events.flush();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove a resource of either kind.
    ///
    /// A pinned entry is only removed when `force` is true; otherwise the
    /// call fails with [`CacheError::Pinned`] and the caller must release
    /// its references first.
    pub fn remove(&self, id: &str, force: bool) -> Result<(), CacheError> {
        {
            let mut state = self.state.lock().unwrap();
            let (kind, ref_count) = if let Some(entry) = state.images.get(id) {
                (ResourceKind::Image, entry.ref_count)
            } else if let Some(entry) = state.volumes.get(id) {
                (ResourceKind::Volume, entry.ref_count)
            } else {
                return Err(CacheError::NotFound(id.to_string()));
            };
            if ref_count > 0 && !force {
                return Err(CacheError::Pinned(id.to_string()));
            }
            state.remove_entry(id, kind)?;
            self.events.enqueue([CacheEvent::ResourceRemoved {
                id: id.to_string(),
                kind,
            }]);
        }
        self.events.flush();
        Ok(())
    }

    /// Bulk removal of every entry matching `predicate`, e.g. all volumes
    /// for a given frame of reference. Pinned entries are skipped unless
    /// `force` is set. Returns the ids actually removed.
    pub fn remove_matching<P>(&self, predicate: P, force: bool) -> Result<Vec<ResourceId>, CacheError>
    where
        P: Fn(&EntryInfo<'_>) -> bool,
    {
        let removed = {
            let mut state = self.state.lock().unwrap();
            let mut matches: Vec<(ResourceId, ResourceKind)> = Vec::new();
            for (id, entry) in &state.images {
                let info = EntryInfo {
                    id,
                    kind: ResourceKind::Image,
                    frame_of_reference_id: None,
                    byte_size: entry.byte_size,
                    ref_count: entry.ref_count,
                };
                if predicate(&info) && (force || entry.ref_count == 0) {
                    matches.push((id.clone(), ResourceKind::Image));
                }
            }
            for (id, entry) in &state.volumes {
                let info = EntryInfo {
                    id,
                    kind: ResourceKind::Volume,
                    frame_of_reference_id: Some(&entry.frame_of_reference_id),
                    byte_size: entry.byte_size,
                    ref_count: entry.ref_count,
                };
                if predicate(&info) && (force || entry.ref_count == 0) {
                    matches.push((id.clone(), ResourceKind::Volume));
                }
            }

            let mut events = Vec::new();
            let mut removed = Vec::new();
            for (id, kind) in matches {
                state.remove_entry(&id, kind)?;
                events.push(CacheEvent::ResourceRemoved {
                    id: id.clone(),
                    kind,
                });
                removed.push(id);
            }
            self.events.enqueue(events);
            removed
        };
        self.events.flush();
        Ok(removed)
    }

    /// Remove every unpinned entry. Pinned entries survive.
    pub fn purge(&self) -> Result<Vec<ResourceId>, CacheError> {
        self.remove_matching(|_| true, false)
    }

    // ------------------------------------------------------------------
    // Pinning
    // ------------------------------------------------------------------

    /// Register an active holder (e.g. a viewport displaying the resource).
    /// While the count is non-zero the entry is never evicted. Returns the
    /// new count.
    pub fn retain(&self, id: &str) -> Result<u32, CacheError> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.images.get_mut(id) {
            entry.ref_count += 1;
            return Ok(entry.ref_count);
        }
        if let Some(entry) = state.volumes.get_mut(id) {
            entry.ref_count += 1;
            return Ok(entry.ref_count);
        }
        Err(CacheError::NotFound(id.to_string()))
    }

    /// Drop an active holder. Reaching zero does not evict immediately;
    /// eviction happens lazily on the next insert that needs space. The
    /// count saturates at zero so viewport teardown is idempotent. Returns
    /// the new count.
    pub fn release(&self, id: &str) -> Result<u32, CacheError> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.images.get_mut(id) {
            entry.ref_count = entry.ref_count.saturating_sub(1);
            return Ok(entry.ref_count);
        }
        if let Some(entry) = state.volumes.get_mut(id) {
            entry.ref_count = entry.ref_count.saturating_sub(1);
            return Ok(entry.ref_count);
        }
        Err(CacheError::NotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Budget
    // ------------------------------------------------------------------

    /// Total bytes currently committed.
    pub fn usage(&self) -> u64 {
        self.state.lock().unwrap().budget.used()
    }

    /// The configured budget in bytes.
    pub fn budget(&self) -> u64 {
        self.state.lock().unwrap().budget.max_bytes()
    }

    /// Change the budget.
    ///
    /// Shrinking below current usage evicts least-recently-used unpinned
    /// entries down to the new ceiling first. If pinned entries make that
    /// impossible the call fails with [`CacheError::CapacityExceeded`] and
    /// neither the budget nor the resident set changes.
    pub fn set_budget(&self, max_bytes: u64) -> Result<(), CacheError> {
        {
            let mut state = self.state.lock().unwrap();
            let used = state.budget.used();
            let mut events = Vec::new();
            if used > max_bytes {
                let shortfall = used - max_bytes;
                let selection = select_victims(state.candidates(), shortfall);
                if !selection.sufficient {
                    return Err(CacheError::CapacityExceeded {
                        needed_bytes: shortfall,
                        reclaimable_bytes: selection.freed_bytes,
                    });
                }
                for (id, kind) in selection.victims {
                    let freed = state.remove_entry(&id, kind)?;
                    state.evictions += 1;
                    debug!("evicted {kind:?} `{id}` ({freed} bytes) for budget shrink");
                    events.push(CacheEvent::ResourceRemoved { id, kind });
                }
            }
            state.budget.set_max(max_bytes);
            debug!("cache budget set to {max_bytes} bytes");
            self.events.enqueue(events);
        }
        self.events.flush();
        Ok(())
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap();
        CacheStats {
            image_count: state.images.len(),
            volume_count: state.volumes.len(),
            bytes_used: state.budget.used(),
            max_bytes: state.budget.max_bytes(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }
}

/// Frame sink handed to a volume loader.
///
/// The loader calls [`VolumeWriter::write_frame`] once per frame, in any
/// order; each call fires a progress event, and the call completing the last
/// frame fires the fully-loaded event.
pub struct VolumeWriter<'a> {
    cache: &'a ResourceCache,
    id: &'a str,
}

impl VolumeWriter<'_> {
    /// The id of the volume being loaded.
    pub fn id(&self) -> &str {
        self.id
    }

    /// Copy one decoded frame into the volume's allocation.
    ///
    /// `bytes` must be exactly one frame long and `frame_index` must be in
    /// range; each frame must be delivered at most once (the loader
    /// collaborator's contract). Violations are consistency errors.
    pub fn write_frame(&self, frame_index: u32, bytes: &[u8]) -> Result<(), CacheError> {
        let id = self.id;
        {
            let mut state = self.cache.state.lock().unwrap();
            let entry = state
                .volumes
                .get_mut(id)
                .ok_or_else(|| CacheError::NotFound(id.to_string()))?;
            if frame_index >= entry.number_of_frames {
                return Err(CacheError::Consistency(format!(
                    "frame index {frame_index} out of range for volume `{id}` with {} frames",
                    entry.number_of_frames
                )));
            }
            if bytes.len() as u64 != entry.frame_byte_size {
                return Err(CacheError::Consistency(format!(
                    "frame of {} bytes written to volume `{id}` with frame size {}",
                    bytes.len(),
                    entry.frame_byte_size
                )));
            }
            if entry.frames_written[frame_index as usize] {
                return Err(CacheError::Consistency(format!(
                    "frame {frame_index} delivered more than once to volume `{id}`"
                )));
            }

            let offset = frame_index as usize * entry.frame_byte_size as usize;
            {
                let mut voxels = entry.voxels.write().unwrap();
                voxels[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            entry.frames_written[frame_index as usize] = true;
            entry.frames_processed += 1;

            let mut events = vec![CacheEvent::VolumeProgress {
                id: id.to_string(),
                frames_processed: entry.frames_processed,
                number_of_frames: entry.number_of_frames,
            }];
            if entry.frames_processed == entry.number_of_frames {
                events.push(CacheEvent::VolumeFullyLoaded { id: id.to_string() });
            }
            self.cache.events.enqueue(events);
        }
        self.cache.events.flush();
        Ok(())
    }
}
