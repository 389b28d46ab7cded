//! Error types for the resource cache.
//!
//! All cache operations return [`CacheError`]. The enum is `Clone` because a
//! single load outcome is fanned out to every caller joined to the same
//! in-flight load.

use thiserror::Error;

/// Error produced by a loader collaborator (decode/network layer).
///
/// The cache does not interpret the payload; it is carried through to every
/// joined waiter and into the load-failed event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    /// Create a loader error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error payload supplied by the loader.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Lets a loader propagate a frame-write rejection with `?` instead of
/// mapping it by hand.
impl From<CacheError> for LoadError {
    fn from(err: CacheError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The loader collaborator rejected the load. Recoverable: a retry is a
    /// fresh load. Also delivered as a load-failed event.
    #[error("load of `{id}` failed: {reason}")]
    LoadFailed { id: String, reason: String },

    /// Even after evicting every eligible entry the new entry cannot fit.
    /// Recoverable: the caller may retry after releasing references
    /// elsewhere.
    #[error(
        "cannot free {needed_bytes} bytes within budget (only {reclaimable_bytes} reclaimable)"
    )]
    CapacityExceeded {
        needed_bytes: u64,
        reclaimable_bytes: u64,
    },

    /// No resident entry with this id.
    #[error("no cached resource with id `{0}`")]
    NotFound(String),

    /// Non-forced removal of an entry with a non-zero reference count.
    #[error("resource `{0}` is pinned; release references or remove with force")]
    Pinned(String),

    /// Byte accounting drifted from the resident buffers. This indicates a
    /// programming error in size computation and is never silently absorbed.
    #[error("byte accounting inconsistency: {0}")]
    Consistency(String),
}

impl CacheError {
    /// True for errors a caller can recover from by retrying or releasing
    /// references; false only for [`CacheError::Consistency`].
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CacheError::Consistency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_message() {
        let err = LoadError::new("connection reset");
        assert_eq!(err.message(), "connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::LoadFailed {
            id: "ct-1".to_string(),
            reason: "decode failed".to_string(),
        };
        assert_eq!(err.to_string(), "load of `ct-1` failed: decode failed");

        let err = CacheError::CapacityExceeded {
            needed_bytes: 100,
            reclaimable_bytes: 40,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("40"));
    }

    #[test]
    fn test_recoverability() {
        assert!(CacheError::NotFound("x".to_string()).is_recoverable());
        assert!(CacheError::Pinned("x".to_string()).is_recoverable());
        assert!(!CacheError::Consistency("drift".to_string()).is_recoverable());
    }
}
