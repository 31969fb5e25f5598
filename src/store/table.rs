//! Chained hash table holding the parsed configuration.
//!
//! # Responsibilities
//! - Map a key to its current value and owning section
//! - Bucket keys with the djb2 string hash
//! - Iterate deterministically (bucket order, then chain order)
//!
//! # Design Decisions
//! - Identity is the key alone; the section travels with the value
//! - No locking here: the reload coordinator serializes every access
//! - Bucket count is fixed at construction, chains grow without rehashing

use thiserror::Error;

/// Bucket count used when the daemon settings do not name one.
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Error type for table construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("bucket count must be greater than zero")]
    ZeroBuckets,
}

/// One key/value/section triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// `None` when the assignment appeared before any section header.
    pub section: Option<String>,
}

impl Entry {
    /// Section name as written to the log, empty when unset.
    pub fn section_name(&self) -> &str {
        self.section.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={} in [{}]", self.key, self.value, self.section_name())
    }
}

/// In-memory configuration table.
#[derive(Debug, Clone)]
pub struct Store {
    buckets: Vec<Vec<Entry>>,
    count: usize,
}

impl Store {
    /// Create a table with `bucket_count` empty chains.
    pub fn new(bucket_count: usize) -> Result<Self, StoreError> {
        if bucket_count == 0 {
            return Err(StoreError::ZeroBuckets);
        }

        Ok(Self {
            buckets: vec![Vec::new(); bucket_count],
            count: 0,
        })
    }

    /// Insert `key`, or overwrite its value and section if already present.
    ///
    /// Returns `true` when a new entry was created.
    pub fn insert_or_update(&mut self, key: &str, value: &str, section: Option<&str>) -> bool {
        let index = self.index_of(key);
        let chain = &mut self.buckets[index];

        if let Some(entry) = chain.iter_mut().find(|e| e.key == key) {
            entry.value = value.to_string();
            entry.section = section.map(str::to_string);
            return false;
        }

        chain.push(Entry {
            key: key.to_string(),
            value: value.to_string(),
            section: section.map(str::to_string),
        });
        self.count += 1;
        true
    }

    /// Find the entry stored under `key`.
    pub fn lookup(&self, key: &str) -> Option<&Entry> {
        self.buckets[self.index_of(key)].iter().find(|e| e.key == key)
    }

    /// Visit every entry in bucket order, then chain order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Entry),
    {
        for entry in self.iter() {
            f(entry);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.buckets.iter().flat_map(|chain| chain.iter())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// An empty table with the same bucket count.
    pub fn empty_like(&self) -> Self {
        Self {
            buckets: vec![Vec::new(); self.buckets.len()],
            count: 0,
        }
    }

    fn index_of(&self, key: &str) -> usize {
        (djb2(key) % self.buckets.len() as u64) as usize
    }
}

impl Default for Store {
    fn default() -> Self {
        Self {
            buckets: vec![Vec::new(); DEFAULT_BUCKET_COUNT],
            count: 0,
        }
    }
}

/// djb2 string hash: `h = h * 33 + byte`, seeded with 5381.
pub fn djb2(key: &str) -> u64 {
    key.bytes().fold(5381u64, |h, b| {
        (h << 5).wrapping_add(h).wrapping_add(u64::from(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_known_values() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("a"), 5381 * 33 + 97);
        assert_eq!(djb2("ab"), (5381 * 33 + 97) * 33 + 98);
    }

    #[test]
    fn zero_buckets_rejected() {
        assert_eq!(Store::new(0).unwrap_err(), StoreError::ZeroBuckets);
    }

    #[test]
    fn insert_then_update_keeps_latest() {
        let mut store = Store::new(16).unwrap();
        assert!(store.insert_or_update("name", "demo", Some("General")));
        assert!(!store.insert_or_update("name", "other", Some("Network")));

        let entry = store.lookup("name").unwrap();
        assert_eq!(entry.value, "other");
        assert_eq!(entry.section.as_deref(), Some("Network"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn count_tracks_distinct_keys_in_one_bucket() {
        // Every key shares the single chain.
        let mut store = Store::new(1).unwrap();
        for key in ["a", "b", "c", "a", "b"] {
            store.insert_or_update(key, "v", None);
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.iter().count(), 3);
        assert!(store.lookup("c").is_some());
        assert!(store.lookup("d").is_none());
    }

    #[test]
    fn iteration_follows_bucket_then_chain_order() {
        let mut store = Store::new(4).unwrap();
        let keys = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
        for key in keys {
            store.insert_or_update(key, key, None);
        }

        let mut expected: Vec<(u64, usize, &str)> = keys
            .iter()
            .enumerate()
            .map(|(pos, k)| (djb2(k) % 4, pos, *k))
            .collect();
        expected.sort();
        let expected: Vec<&str> = expected.into_iter().map(|(_, _, k)| k).collect();

        let mut seen = Vec::new();
        store.for_each(|e| seen.push(e.key.clone()));
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_like_keeps_bucket_layout() {
        let mut store = Store::new(7).unwrap();
        store.insert_or_update("k", "v", Some("s"));

        let fresh = store.empty_like();
        assert!(fresh.is_empty());
        assert!(fresh.lookup("k").is_none());
        assert_eq!(fresh.bucket_count(), 7);
        assert_eq!(store.len(), 1);
        assert_eq!(Store::default().bucket_count(), DEFAULT_BUCKET_COUNT);
    }

    #[test]
    fn display_uses_log_format() {
        let entry = Entry {
            key: "port".into(),
            value: "8080".into(),
            section: Some("Network".into()),
        };
        assert_eq!(entry.to_string(), "port=8080 in [Network]");

        let bare = Entry { section: None, ..entry };
        assert_eq!(bare.to_string(), "port=8080 in []");
    }
}
