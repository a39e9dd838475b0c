use async_trait::async_trait;
use dashmap::DashMap;
use seqcode_core::error::{Result, StorageError};
use seqcode_core::repository::{CodeLookup, CounterRecord, CounterStore};
use seqcode_core::sequence::SequenceName;
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct Counter {
    value: u64,
    prefix: String,
}

/// In-memory implementation of [`CounterStore`] using DashMap.
///
/// The increment runs while holding the write lock of the entry's shard, so
/// concurrent increments of the same sequence never observe the same value.
/// State lives only as long as the process; use it for tests and
/// single-process tools.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    counters: DashMap<SequenceName, Counter>,
}

impl InMemoryCounterStore {
    /// Creates a new, empty counter store.
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    /// Seeds `sequence` with `value` as its last allocated number.
    pub fn with_counter(self, sequence: SequenceName, value: u64) -> Self {
        self.counters.insert(
            sequence,
            Counter {
                value,
                prefix: String::new(),
            },
        );
        self
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, sequence: &SequenceName, prefix: &str) -> Result<u64> {
        let mut entry = self
            .counters
            .entry(sequence.clone())
            .or_insert_with(|| Counter {
                value: 0,
                prefix: prefix.to_owned(),
            });

        let next = entry.value.checked_add(1).ok_or_else(|| {
            StorageError::InvalidData(format!("counter '{}' overflowed", sequence))
        })?;
        entry.value = next;

        Ok(next)
    }

    async fn current(&self, sequence: &SequenceName) -> Result<Option<CounterRecord>> {
        Ok(self.counters.get(sequence).map(|entry| CounterRecord {
            sequence: sequence.clone(),
            value: entry.value,
            prefix: entry.prefix.clone(),
        }))
    }
}

/// In-memory stand-in for a target collection, holding the codes stored
/// under each field.
///
/// [`InMemoryCollection::insert`] rejects duplicates the way a unique index
/// on the code field would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollection {
    fields: DashMap<String, HashSet<String>>,
}

impl InMemoryCollection {
    /// Creates a new, empty collection.
    pub fn new() -> Self {
        Self {
            fields: DashMap::new(),
        }
    }

    /// Stores `code` under `field`. Returns `Err(Conflict)` if it is already
    /// present.
    pub fn insert(&self, field: impl Into<String>, code: impl Into<String>) -> Result<()> {
        let code = code.into();
        let mut codes = self.fields.entry(field.into()).or_default();
        if codes.contains(&code) {
            return Err(StorageError::Conflict(code));
        }
        codes.insert(code);
        Ok(())
    }

    /// Removes `code` from `field`. Returns `true` if it was present.
    pub fn remove(&self, field: &str, code: &str) -> bool {
        self.fields
            .get_mut(field)
            .is_some_and(|mut codes| codes.remove(code))
    }

    /// Returns the number of codes stored under `field`.
    pub fn len(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, |codes| codes.len())
    }

    pub fn is_empty(&self, field: &str) -> bool {
        self.len(field) == 0
    }
}

#[async_trait]
impl CodeLookup for InMemoryCollection {
    async fn code_exists(&self, field: &str, code: &str) -> Result<bool> {
        Ok(self
            .fields
            .get(field)
            .is_some_and(|codes| codes.contains(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seq(name: &str) -> SequenceName {
        SequenceName::new(name).unwrap()
    }

    #[tokio::test]
    async fn increment_creates_counter_from_zero() {
        let store = InMemoryCounterStore::new();

        assert!(store.current(&seq("lugares")).await.unwrap().is_none());
        assert_eq!(store.increment(&seq("lugares"), "LUG-").await.unwrap(), 1);

        let record = store.current(&seq("lugares")).await.unwrap().unwrap();
        assert_eq!(record.value, 1);
        assert_eq!(record.prefix, "LUG-");
    }

    #[tokio::test]
    async fn increment_keeps_first_prefix() {
        let store = InMemoryCounterStore::new();

        store.increment(&seq("lugares"), "LUG-").await.unwrap();
        store.increment(&seq("lugares"), "OTHER-").await.unwrap();

        let record = store.current(&seq("lugares")).await.unwrap().unwrap();
        assert_eq!(record.value, 2);
        assert_eq!(record.prefix, "LUG-");
    }

    #[tokio::test]
    async fn seeded_counter_continues() {
        let store = InMemoryCounterStore::new().with_counter(seq("cuentas"), 41);
        assert_eq!(store.increment(&seq("cuentas"), "CTA-").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn overflow_is_reported() {
        let store = InMemoryCounterStore::new().with_counter(seq("full"), u64::MAX);
        let err = store.increment(&seq("full"), "").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[tokio::test]
    async fn concurrent_increments_are_distinct() {
        let store = Arc::new(InMemoryCounterStore::new());
        let mut handles = vec![];

        for _ in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment(&seq("fletes"), "FLT-").await.unwrap()
            }));
        }

        let mut values = vec![];
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();

        assert_eq!(values, (1..=64).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn collection_insert_and_probe() {
        let collection = InMemoryCollection::new();

        assert!(!collection
            .code_exists("codigo_lugar", "LUG-000001")
            .await
            .unwrap());

        collection.insert("codigo_lugar", "LUG-000001").unwrap();

        assert!(collection
            .code_exists("codigo_lugar", "LUG-000001")
            .await
            .unwrap());
        assert!(!collection.code_exists("codigo", "LUG-000001").await.unwrap());
        assert_eq!(collection.len("codigo_lugar"), 1);
    }

    #[tokio::test]
    async fn collection_rejects_duplicates() {
        let collection = InMemoryCollection::new();
        collection.insert("codigo_lugar", "LUG-000001").unwrap();

        let err = collection.insert("codigo_lugar", "LUG-000001").unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn collection_remove() {
        let collection = InMemoryCollection::new();
        collection.insert("codigo_lugar", "LUG-000001").unwrap();

        assert!(collection.remove("codigo_lugar", "LUG-000001"));
        assert!(!collection.remove("codigo_lugar", "LUG-000001"));
        assert!(collection.is_empty("codigo_lugar"));
    }
}
