//! LRU victim selection.
//!
//! Pure policy: given a snapshot of the resident entries, pick the set of
//! unpinned entries to remove so that a required number of bytes comes free.
//! The store applies the selection (buffer release, accounting, events); this
//! module never mutates anything.

use crate::entry::ResourceId;
use crate::events::ResourceKind;

/// Snapshot of one resident entry, as seen by the eviction policy.
#[derive(Debug, Clone)]
pub(crate) struct VictimCandidate {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub byte_size: u64,
    /// Logical access clock value at the entry's most recent read.
    pub last_access: u64,
    /// Insertion sequence number, used as the tie-break for equal access
    /// times so selection is deterministic.
    pub sequence: u64,
    /// Entries with a non-zero reference count are never selected.
    pub pinned: bool,
}

/// Outcome of a victim selection pass.
#[derive(Debug, Clone)]
pub(crate) struct VictimSelection {
    /// Victims in eviction order (least recently used first).
    pub victims: Vec<(ResourceId, ResourceKind)>,
    /// Combined byte size of the victims.
    pub freed_bytes: u64,
    /// False when the eligible set was exhausted before covering the
    /// requested bytes; the caller must then fail the pending operation
    /// rather than exceed the budget.
    pub sufficient: bool,
}

/// Select least-recently-used unpinned entries until `bytes_needed` is
/// covered or the eligible set runs out.
pub(crate) fn select_victims(
    mut candidates: Vec<VictimCandidate>,
    bytes_needed: u64,
) -> VictimSelection {
    if bytes_needed == 0 {
        return VictimSelection {
            victims: Vec::new(),
            freed_bytes: 0,
            sufficient: true,
        };
    }

    candidates.retain(|c| !c.pinned);
    candidates.sort_by_key(|c| (c.last_access, c.sequence));

    let mut victims = Vec::new();
    let mut freed_bytes = 0u64;
    for candidate in candidates {
        if freed_bytes >= bytes_needed {
            break;
        }
        freed_bytes += candidate.byte_size;
        victims.push((candidate.id, candidate.kind));
    }

    VictimSelection {
        victims,
        freed_bytes,
        sufficient: freed_bytes >= bytes_needed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, byte_size: u64, last_access: u64, pinned: bool) -> VictimCandidate {
        VictimCandidate {
            id: id.to_string(),
            kind: ResourceKind::Image,
            byte_size,
            last_access,
            sequence: last_access,
            pinned,
        }
    }

    #[test]
    fn test_nothing_needed_selects_nothing() {
        let selection = select_victims(vec![candidate("a", 10, 1, false)], 0);
        assert!(selection.victims.is_empty());
        assert!(selection.sufficient);
    }

    #[test]
    fn test_least_recent_selected_first() {
        let selection = select_victims(
            vec![
                candidate("b", 10, 2, false),
                candidate("a", 10, 1, false),
                candidate("c", 10, 3, false),
            ],
            10,
        );
        assert_eq!(selection.victims.len(), 1);
        assert_eq!(selection.victims[0].0, "a");
        assert_eq!(selection.freed_bytes, 10);
        assert!(selection.sufficient);
    }

    #[test]
    fn test_accumulates_until_covered() {
        let selection = select_victims(
            vec![
                candidate("a", 10, 1, false),
                candidate("b", 10, 2, false),
                candidate("c", 10, 3, false),
            ],
            15,
        );
        let ids: Vec<_> = selection.victims.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(selection.freed_bytes, 20);
        assert!(selection.sufficient);
    }

    #[test]
    fn test_pinned_entries_never_selected() {
        let selection = select_victims(
            vec![
                candidate("pinned-old", 10, 1, true),
                candidate("b", 10, 2, false),
            ],
            10,
        );
        let ids: Vec<_> = selection.victims.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_insufficient_reports_partial_set() {
        let selection = select_victims(
            vec![
                candidate("a", 10, 1, false),
                candidate("pinned", 100, 2, true),
            ],
            50,
        );
        assert!(!selection.sufficient);
        assert_eq!(selection.freed_bytes, 10);
        assert_eq!(selection.victims.len(), 1);
    }

    #[test]
    fn test_equal_access_tie_breaks_by_insertion_order() {
        let mut first = candidate("first", 10, 5, false);
        first.sequence = 1;
        let mut second = candidate("second", 10, 5, false);
        second.sequence = 2;

        let selection = select_victims(vec![second, first], 10);
        assert_eq!(selection.victims[0].0, "first");
    }

    #[test]
    fn test_empty_candidate_set() {
        let selection = select_victims(Vec::new(), 1);
        assert!(!selection.sufficient);
        assert_eq!(selection.freed_bytes, 0);
    }
}
