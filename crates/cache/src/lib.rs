//! Byte-budgeted in-memory cache for decoded imaging resources.
//!
//! Viewers decode images and volumes that are expensive to produce and large
//! in memory. This crate keeps decoded buffers resident under a configurable
//! byte budget, deduplicates concurrent loads of the same resource, evicts
//! least-recently-used entries when an insert needs space, and reports
//! lifecycle transitions to an [`EventSink`].
//!
//! # Quick start
//!
//! ```
//! use image_viewer_cache::{CacheConfig, DecodedImage, ResourceCache};
//!
//! let cache = ResourceCache::new(CacheConfig::new(512));
//!
//! let handle = cache
//!     .get_or_load_image("study-1/series-2/slice-10", || {
//!         Ok(DecodedImage::new(vec![0u8; 256 * 256 * 2], 256, 256))
//!     })?;
//! assert_eq!(handle.width, 256);
//! # Ok::<(), image_viewer_cache::CacheError>(())
//! ```
//!
//! Entries displayed by a viewport should be pinned with
//! [`ResourceCache::retain`] so eviction cannot reclaim them, and released
//! with [`ResourceCache::release`] on teardown.

pub mod budget;
pub mod config;
pub mod entry;
pub mod error;
pub mod events;
mod eviction;
mod inflight;
pub mod store;

pub use config::{CacheConfig, ConfigError, DEFAULT_MAX_BYTES};
pub use entry::{
    DecodedImage, EntryInfo, ImageHandle, ResourceId, VolumeDescriptor, VolumeHandle,
};
pub use error::{CacheError, LoadError};
pub use events::{CacheEvent, EventSink, ResourceKind};
pub use store::{CacheStats, ResourceCache, VolumeWriter};
