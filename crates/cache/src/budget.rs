//! Byte accounting for the cache budget.
//!
//! [`ByteBudget`] is pure bookkeeping: it tracks bytes currently committed
//! against the configured ceiling and answers how far a prospective
//! allocation overshoots. It owns no policy; victim selection lives in the
//! eviction module and the decision to evict lives in the store.
//!
//! The counters are plain integers rather than atomics because the budget is
//! only ever touched inside the store's critical section, which guards the
//! resource maps and these counters jointly. Two load completions racing to
//! insert therefore can never jointly overshoot the ceiling.

use crate::error::CacheError;

/// Running byte total against a configured ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBudget {
    used: u64,
    max: u64,
}

impl ByteBudget {
    /// Create a budget with the given ceiling in bytes.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            used: 0,
            max: max_bytes,
        }
    }

    /// Bytes currently committed.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// The configured ceiling in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max
    }

    /// Bytes still available under the ceiling.
    pub fn available(&self) -> u64 {
        self.max.saturating_sub(self.used)
    }

    /// Current utilization ratio (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.used as f64 / self.max as f64
        }
    }

    /// Whether `bytes` fits under the ceiling without freeing anything.
    pub fn would_fit(&self, bytes: u64) -> bool {
        self.used.saturating_add(bytes) <= self.max
    }

    /// How many bytes must be freed before `bytes` can be committed.
    /// Zero when the allocation already fits.
    pub fn shortfall(&self, bytes: u64) -> u64 {
        self.used.saturating_add(bytes).saturating_sub(self.max)
    }

    /// Commit bytes to the running total. The caller must have freed any
    /// shortfall first; committing is unconditional.
    pub fn commit(&mut self, bytes: u64) {
        self.used += bytes;
    }

    /// Release previously committed bytes.
    ///
    /// Releasing more than is committed means an entry's recorded size
    /// drifted from what was accounted at insert; that is a fatal
    /// [`CacheError::Consistency`], not a saturating subtraction.
    pub fn release(&mut self, bytes: u64) -> Result<(), CacheError> {
        if bytes > self.used {
            return Err(CacheError::Consistency(format!(
                "release of {bytes} bytes exceeds committed total of {}",
                self.used
            )));
        }
        self.used -= bytes;
        Ok(())
    }

    /// Change the ceiling. Pure bookkeeping: the store is responsible for
    /// evicting down to a shrunken ceiling before calling this.
    pub fn set_max(&mut self, max_bytes: u64) {
        self.max = max_bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_budget_is_empty() {
        let budget = ByteBudget::new(100);
        assert_eq!(budget.used(), 0);
        assert_eq!(budget.max_bytes(), 100);
        assert_eq!(budget.available(), 100);
        assert_eq!(budget.utilization(), 0.0);
    }

    #[test]
    fn test_commit_and_release() {
        let mut budget = ByteBudget::new(100);
        budget.commit(60);
        assert_eq!(budget.used(), 60);
        assert_eq!(budget.available(), 40);
        assert!((budget.utilization() - 0.6).abs() < 1e-9);

        budget.release(20).unwrap();
        assert_eq!(budget.used(), 40);

        budget.release(40).unwrap();
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_would_fit() {
        let mut budget = ByteBudget::new(100);
        assert!(budget.would_fit(100));
        assert!(!budget.would_fit(101));

        budget.commit(70);
        assert!(budget.would_fit(30));
        assert!(!budget.would_fit(31));
    }

    #[test]
    fn test_shortfall() {
        let mut budget = ByteBudget::new(100);
        assert_eq!(budget.shortfall(100), 0);
        assert_eq!(budget.shortfall(150), 50);

        budget.commit(80);
        assert_eq!(budget.shortfall(10), 0);
        assert_eq!(budget.shortfall(30), 10);
    }

    #[test]
    fn test_release_underflow_is_consistency_error() {
        let mut budget = ByteBudget::new(100);
        budget.commit(10);

        let err = budget.release(11).unwrap_err();
        assert!(matches!(err, CacheError::Consistency(_)));
        assert!(!err.is_recoverable());
        // The running total is untouched by the failed release.
        assert_eq!(budget.used(), 10);
    }

    #[test]
    fn test_set_max_does_not_touch_usage() {
        let mut budget = ByteBudget::new(100);
        budget.commit(80);

        budget.set_max(50);
        assert_eq!(budget.max_bytes(), 50);
        assert_eq!(budget.used(), 80);
        assert_eq!(budget.available(), 0);
        assert_eq!(budget.shortfall(0), 30);
    }

    #[test]
    fn test_zero_budget() {
        let budget = ByteBudget::new(0);
        assert!(budget.would_fit(0));
        assert!(!budget.would_fit(1));
        assert_eq!(budget.utilization(), 0.0);
    }
}
