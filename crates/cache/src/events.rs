//! Lifecycle events emitted by the cache.
//!
//! Downstream layers (rendering, prefetch tooling) observe cache mutations
//! through an injected [`EventSink`]. Delivery is fire-and-forget: the sink
//! is invoked after the cache's critical section has been released, so a slow
//! subscriber never blocks a mutation. Events for a single resource id are
//! delivered in causal order (added before removed, progress strictly
//! increasing); no cross-resource ordering is guaranteed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::entry::ResourceId;

/// The two kinds of cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A single decoded 2-D image.
    Image,
    /// A multi-frame 3-D volume.
    Volume,
}

/// A cache lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An entry became resident (image load completed, or volume allocation
    /// at load initiation).
    ResourceAdded { id: ResourceId, kind: ResourceKind },
    /// An entry left the cache (explicit removal or eviction).
    ResourceRemoved { id: ResourceId, kind: ResourceKind },
    /// A load failed; the resource is not cached.
    LoadFailed { id: ResourceId, reason: String },
    /// One more frame of a volume was filled in.
    VolumeProgress {
        id: ResourceId,
        frames_processed: u32,
        number_of_frames: u32,
    },
    /// All frames of a volume have arrived. Fired exactly once per load.
    VolumeFullyLoaded { id: ResourceId },
}

impl CacheEvent {
    /// The resource id this event concerns.
    pub fn resource_id(&self) -> &str {
        match self {
            CacheEvent::ResourceAdded { id, .. }
            | CacheEvent::ResourceRemoved { id, .. }
            | CacheEvent::LoadFailed { id, .. }
            | CacheEvent::VolumeProgress { id, .. }
            | CacheEvent::VolumeFullyLoaded { id } => id,
        }
    }
}

/// Receiver of cache lifecycle events.
///
/// Implementations must be cheap or hand the event off to their own queue;
/// the cache delivers events synchronously from the mutating thread (outside
/// its critical section) and does not retry failed deliveries.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &CacheEvent);
}

/// Ordered event fan-out.
///
/// Events are queued while the cache state lock is held, which fixes their
/// global order at mutation time. After the state lock is released the queue
/// is drained behind a dispatch lock, so concurrent mutators cannot
/// interleave deliveries out of queue order.
pub(crate) struct EventFanout {
    sink: Option<Arc<dyn EventSink>>,
    queue: Mutex<VecDeque<CacheEvent>>,
    dispatch: Mutex<()>,
}

impl EventFanout {
    pub fn new(sink: Option<Arc<dyn EventSink>>) -> Self {
        Self {
            sink,
            queue: Mutex::new(VecDeque::new()),
            dispatch: Mutex::new(()),
        }
    }

    /// Queue events for delivery. Call while holding the cache state lock.
    pub fn enqueue(&self, events: impl IntoIterator<Item = CacheEvent>) {
        if self.sink.is_none() {
            return;
        }
        let mut queue = self.queue.lock().unwrap();
        queue.extend(events);
    }

    /// Drain the queue and deliver to the sink. Call after releasing the
    /// cache state lock.
    pub fn flush(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let _dispatching = self.dispatch.lock().unwrap();
        loop {
            // Re-lock per event so enqueue from other threads is never held
            // up by a slow sink.
            let event = { self.queue.lock().unwrap().pop_front() };
            match event {
                Some(event) => sink.notify(&event),
                None => break,
            }
        }
    }
}
