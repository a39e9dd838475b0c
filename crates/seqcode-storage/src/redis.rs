use async_trait::async_trait;
use seqcode_core::error::{Result, StorageError};
use seqcode_core::repository::{CounterRecord, CounterStore};
use seqcode_core::sequence::SequenceName;
use tracing::{trace, warn};

/// Key prefix used by [`RedisCounterStore::new`].
pub const DEFAULT_KEY_PREFIX: &str = "seqcode:counter:";

/// A Redis implementation of [`CounterStore`].
///
/// Each sequence owns two keys: `<key_prefix><sequence>:value`, advanced with
/// `INCR` (atomic on the server), and `<key_prefix><sequence>:prefix`,
/// written once with `SETNX`. Both commands run in one `MULTI`/`EXEC`
/// pipeline.
///
/// Redis only stores counters; the target-collection probe must come from
/// the database that holds the entities.
#[derive(Debug, Clone)]
pub struct RedisCounterStore {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

impl RedisCounterStore {
    /// Creates a new Redis counter store.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Creates a new Redis counter store with a custom key prefix.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid Redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    fn value_key(&self, sequence: &SequenceName) -> String {
        format!("{}{}:value", self.key_prefix, sequence)
    }

    fn prefix_key(&self, sequence: &SequenceName) -> String {
        format!("{}{}:prefix", self.key_prefix, sequence)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, sequence: &SequenceName, prefix: &str) -> Result<u64> {
        let mut conn = self.conn.clone();

        let (value,): (u64,) = redis::pipe()
            .atomic()
            .incr(self.value_key(sequence), 1_u64)
            .set_nx(self.prefix_key(sequence), prefix)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                warn!(sequence = %sequence, error = %e, "Redis error on increment");
                map_redis_error("failed to increment counter in Redis", e)
            })?;

        trace!(sequence = %sequence, value, "Incremented Redis counter");
        Ok(value)
    }

    async fn current(&self, sequence: &SequenceName) -> Result<Option<CounterRecord>> {
        let mut conn = self.conn.clone();

        let (value, prefix): (Option<u64>, Option<String>) = redis::pipe()
            .get(self.value_key(sequence))
            .get(self.prefix_key(sequence))
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to read counter from Redis", e))?;

        Ok(value.map(|value| CounterRecord {
            sequence: sequence.clone(),
            value,
            prefix: prefix.unwrap_or_default(),
        }))
    }
}
