use crate::error::Result;
use crate::sequence::SequenceName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A persisted counter, one per sequence name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// The logical counter this record belongs to.
    pub sequence: SequenceName,
    /// The last allocated value. Zero means nothing was allocated yet.
    pub value: u64,
    /// The prefix recorded when the counter was first created.
    pub prefix: String,
}

/// Persistent storage for named counters.
///
/// Implementations must perform [`CounterStore::increment`] as one atomic
/// read-modify-write on the backend. A read followed by a separate write
/// lets two callers observe the same value.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Increments the counter for `sequence` and returns the new value.
    ///
    /// A missing counter is created with value 1, recording `prefix`.
    /// The prefix of an existing counter is never changed.
    async fn increment(&self, sequence: &SequenceName, prefix: &str) -> Result<u64>;

    /// Reads the counter for `sequence` without modifying it.
    /// Returns `None` if nothing was ever allocated from it.
    async fn current(&self, sequence: &SequenceName) -> Result<Option<CounterRecord>>;
}

/// Existence probe against the collection a generated code will be stored in.
#[async_trait]
pub trait CodeLookup: Send + Sync {
    /// Checks whether any document has `field` equal to `code`.
    async fn code_exists(&self, field: &str, code: &str) -> Result<bool>;
}

#[async_trait]
impl<T: CounterStore + ?Sized> CounterStore for Arc<T> {
    async fn increment(&self, sequence: &SequenceName, prefix: &str) -> Result<u64> {
        (**self).increment(sequence, prefix).await
    }

    async fn current(&self, sequence: &SequenceName) -> Result<Option<CounterRecord>> {
        (**self).current(sequence).await
    }
}

#[async_trait]
impl<T: CodeLookup + ?Sized> CodeLookup for Arc<T> {
    async fn code_exists(&self, field: &str, code: &str) -> Result<bool> {
        (**self).code_exists(field, code).await
    }
}
