//! Storage backends for counters and target-collection probes.

pub mod memory;
pub mod mysql;
pub mod redis;

pub use memory::{InMemoryCollection, InMemoryCounterStore};
pub use mysql::{MySqlCollection, MySqlCounterStore};
pub use crate::redis::RedisCounterStore;
pub use seqcode_core::{CodeLookup, CounterRecord, CounterStore, StorageError};
