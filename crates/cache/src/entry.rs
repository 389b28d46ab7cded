//! Cached resource entries and the handles consumers receive.
//!
//! The cache is the sole owner of a resident entry's buffer. Consumers get
//! snapshot handles that share the allocation without owning the cache slot:
//! a handle stays readable for as long as it is held, but only a non-zero
//! reference count (see `ResourceCache::retain`) guarantees the entry itself
//! stays resident.

use std::sync::{Arc, RwLock};

use crate::events::ResourceKind;

/// Opaque identifier for an image or volume, stable for the lifetime of the
/// resource. Image and volume ids share one namespace.
pub type ResourceId = String;

/// A decoded single-frame image produced by a loader collaborator.
///
/// Ownership of the pixel buffer transfers into the cache on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Raw pixel data. The entry's byte size is exactly this buffer's length.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DecodedImage {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Exact memory size of the decoded buffer in bytes.
    pub fn byte_size(&self) -> u64 {
        self.pixels.len() as u64
    }
}

/// Fixed-size description of a volume, known before any frame arrives.
///
/// The full allocation is made (and byte-accounted) from this descriptor at
/// load initiation; frames then fill the buffer in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDescriptor {
    /// DICOM frame-of-reference the volume belongs to.
    pub frame_of_reference_id: String,
    /// Total number of frames in the volume.
    pub number_of_frames: u32,
    /// Byte size of one frame.
    pub frame_byte_size: u64,
}

impl VolumeDescriptor {
    pub fn new(
        frame_of_reference_id: impl Into<String>,
        number_of_frames: u32,
        frame_byte_size: u64,
    ) -> Self {
        Self {
            frame_of_reference_id: frame_of_reference_id.into(),
            number_of_frames,
            frame_byte_size,
        }
    }

    /// Size of the full-volume allocation in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.number_of_frames as u64 * self.frame_byte_size
    }
}

/// Resident image entry. Cache-internal.
pub(crate) struct ImageEntry {
    pub pixels: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    /// Recorded at insert; reconciled against the buffer on removal.
    pub byte_size: u64,
    pub last_access: u64,
    pub sequence: u64,
    pub ref_count: u32,
}

impl ImageEntry {
    pub fn handle(&self, id: &str) -> ImageHandle {
        ImageHandle {
            id: id.to_string(),
            pixels: Arc::clone(&self.pixels),
            width: self.width,
            height: self.height,
            byte_size: self.byte_size,
        }
    }
}

/// Resident volume entry. Cache-internal.
pub(crate) struct VolumeEntry {
    pub frame_of_reference_id: String,
    pub number_of_frames: u32,
    /// Monotonically non-decreasing; equals `number_of_frames` only when the
    /// volume is fully loaded.
    pub frames_processed: u32,
    /// One flag per frame, set on delivery; a second delivery of the same
    /// index is rejected rather than counted toward completion.
    pub frames_written: Vec<bool>,
    /// Allocated once at full size; frames are copied in place as they
    /// arrive. Behind a `RwLock` because consumers may read while frames are
    /// still streaming in.
    pub voxels: Arc<RwLock<Vec<u8>>>,
    pub frame_byte_size: u64,
    pub byte_size: u64,
    pub last_access: u64,
    pub sequence: u64,
    pub ref_count: u32,
}

impl VolumeEntry {
    pub fn handle(&self, id: &str) -> VolumeHandle {
        VolumeHandle {
            id: id.to_string(),
            frame_of_reference_id: self.frame_of_reference_id.clone(),
            number_of_frames: self.number_of_frames,
            frames_processed: self.frames_processed,
            voxels: Arc::clone(&self.voxels),
            byte_size: self.byte_size,
        }
    }
}

/// Non-owning snapshot of a cached image.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub id: ResourceId,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pixels: Arc<Vec<u8>>,
}

impl ImageHandle {
    /// The decoded pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Non-owning snapshot of a cached volume.
///
/// `frames_processed` is the count observed when the handle was taken; the
/// voxel buffer itself is shared, so frames arriving later are visible
/// through [`VolumeHandle::read_voxels`].
#[derive(Debug, Clone)]
pub struct VolumeHandle {
    pub id: ResourceId,
    pub frame_of_reference_id: String,
    pub number_of_frames: u32,
    pub frames_processed: u32,
    pub byte_size: u64,
    voxels: Arc<RwLock<Vec<u8>>>,
}

impl VolumeHandle {
    /// Read access to the voxel buffer. Frames not yet arrived read as
    /// zeroes.
    pub fn read_voxels(&self) -> std::sync::RwLockReadGuard<'_, Vec<u8>> {
        self.voxels.read().unwrap()
    }

    /// Whether every frame had arrived when this snapshot was taken.
    pub fn is_fully_loaded(&self) -> bool {
        self.frames_processed == self.number_of_frames
    }
}

/// Read-only view of a resident entry, handed to bulk-removal predicates.
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo<'a> {
    pub id: &'a str,
    pub kind: ResourceKind,
    /// Present for volumes only.
    pub frame_of_reference_id: Option<&'a str>,
    pub byte_size: u64,
    pub ref_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_image_byte_size() {
        let image = DecodedImage::new(vec![0u8; 512 * 512 * 2], 512, 512);
        assert_eq!(image.byte_size(), 512 * 512 * 2);
    }

    #[test]
    fn test_volume_descriptor_total_bytes() {
        let desc = VolumeDescriptor::new("for-1.2.3", 80, 512 * 512 * 2);
        assert_eq!(desc.total_bytes(), 80 * 512 * 512 * 2);
    }

    #[test]
    fn test_image_handle_shares_buffer() {
        let entry = ImageEntry {
            pixels: Arc::new(vec![7u8; 16]),
            width: 4,
            height: 4,
            byte_size: 16,
            last_access: 1,
            sequence: 1,
            ref_count: 0,
        };
        let handle = entry.handle("img-1");
        assert_eq!(handle.id, "img-1");
        assert_eq!(handle.pixels(), &[7u8; 16][..]);
        // Snapshot shares the allocation instead of copying it.
        assert!(Arc::ptr_eq(&handle.pixels, &entry.pixels));
    }

    #[test]
    fn test_volume_handle_snapshot() {
        let entry = VolumeEntry {
            frame_of_reference_id: "for-1".to_string(),
            number_of_frames: 4,
            frames_processed: 2,
            frames_written: vec![true, true, false, false],
            voxels: Arc::new(RwLock::new(vec![0u8; 64])),
            frame_byte_size: 16,
            byte_size: 64,
            last_access: 1,
            sequence: 1,
            ref_count: 0,
        };
        let handle = entry.handle("vol-1");
        assert!(!handle.is_fully_loaded());
        assert_eq!(handle.frames_processed, 2);
        assert_eq!(handle.read_voxels().len(), 64);
    }
}
