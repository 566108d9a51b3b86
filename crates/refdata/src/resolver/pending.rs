//! Insertion-ordered, key-deduplicated accumulation buffer.
//!
//! Every resolver buffers facts between add and flush. The buffer pairs a
//! seen-set with a row vector so repeat keys collapse while first-seen order
//! survives into the store submission.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug)]
pub struct PendingSet<K, R> {
    seen: HashSet<K>,
    rows: Vec<R>,
}

impl<K, R> PendingSet<K, R> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Buffered rows in first-seen order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.rows.clear();
    }
}

impl<K: Eq + Hash, R> PendingSet<K, R> {
    /// Buffer `row` under `key`. Returns false and drops the row when the
    /// key is already buffered.
    pub fn insert(&mut self, key: K, row: R) -> bool {
        if self.seen.insert(key) {
            self.rows.push(row);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }
}

impl<K, R> Default for PendingSet<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_collapse() {
        let mut pending: PendingSet<String, u32> = PendingSet::new();
        assert!(pending.insert("a".to_string(), 1));
        assert!(!pending.insert("a".to_string(), 2));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.rows(), &[1]);
    }

    #[test]
    fn test_first_seen_order_survives_interleaved_duplicates() {
        let mut pending: PendingSet<&str, &str> = PendingSet::new();
        pending.insert("b", "row-b");
        pending.insert("a", "row-a");
        pending.insert("b", "row-b-again");
        pending.insert("c", "row-c");
        assert_eq!(pending.rows(), &["row-b", "row-a", "row-c"]);
    }

    #[test]
    fn test_clear_allows_reinsert() {
        let mut pending: PendingSet<&str, u32> = PendingSet::new();
        pending.insert("a", 1);
        pending.clear();
        assert!(pending.is_empty());
        assert!(!pending.contains(&"a"));
        assert!(pending.insert("a", 2));
        assert_eq!(pending.rows(), &[2]);
    }
}
