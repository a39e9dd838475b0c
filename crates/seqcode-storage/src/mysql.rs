use async_trait::async_trait;
use seqcode_core::error::{Result, StorageError};
use seqcode_core::repository::{CodeLookup, CounterRecord, CounterStore};
use seqcode_core::sequence::SequenceName;
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};

/// Table used by [`MySqlCounterStore::new`].
pub const DEFAULT_COUNTER_TABLE: &str = "sequence_counters";

const MAX_IDENTIFIER_LENGTH: usize = 64;

/// MySQL implementation of [`CounterStore`].
///
/// Counters live in one row per sequence name (see
/// `ddl/mysql/sequence_counters.sql`). The increment is a single
/// `INSERT ... ON DUPLICATE KEY UPDATE` that stores the post-increment value
/// in the connection's `LAST_INSERT_ID()`, which is read back on the same
/// connection. No row lock outlives the statement.
#[derive(Debug, Clone)]
pub struct MySqlCounterStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlCounterStore {
    /// Creates a store over [`DEFAULT_COUNTER_TABLE`].
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            table: DEFAULT_COUNTER_TABLE.to_string(),
        }
    }

    /// Creates a store over a custom counter table.
    pub fn with_table(pool: MySqlPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the counter table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS `{}` (
                sequence_name VARCHAR(64) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL,
                value BIGINT UNSIGNED NOT NULL DEFAULT 0,
                prefix VARCHAR(64) NOT NULL DEFAULT '',
                PRIMARY KEY (sequence_name)
            )
            "#,
            self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(table = %self.table, "Counter table is ready");
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MySqlCounterStore {
    async fn increment(&self, sequence: &SequenceName, prefix: &str) -> Result<u64> {
        let upsert = format!(
            r#"
            INSERT INTO `{}` (sequence_name, value, prefix)
            VALUES (?, LAST_INSERT_ID(1), ?)
            ON DUPLICATE KEY UPDATE value = LAST_INSERT_ID(value + 1)
            "#,
            self.table
        );

        // LAST_INSERT_ID() is per connection, so both statements must run on
        // the same one.
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;

        sqlx::query(&upsert)
            .bind(sequence.as_str())
            .bind(prefix)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        let value: u64 = sqlx::query_scalar("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        trace!(sequence = %sequence, value, "Incremented MySQL counter");
        Ok(value)
    }

    async fn current(&self, sequence: &SequenceName) -> Result<Option<CounterRecord>> {
        let select = format!(
            r#"
            SELECT value, prefix
            FROM `{}`
            WHERE sequence_name = ?
            LIMIT 1
            "#,
            self.table
        );

        let row = sqlx::query(&select)
            .bind(sequence.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: u64 = row.try_get("value").map_err(map_sqlx_error)?;
        let prefix: String = row.try_get("prefix").map_err(map_sqlx_error)?;

        Ok(Some(CounterRecord {
            sequence: sequence.clone(),
            value,
            prefix,
        }))
    }
}

/// A MySQL table that generated codes are inserted into, probed by
/// [`CodeLookup::code_exists`].
#[derive(Debug, Clone)]
pub struct MySqlCollection {
    pool: MySqlPool,
    table: String,
}

impl MySqlCollection {
    /// Creates a probe over `table`. Table and field names are spliced into
    /// the query, so only `[A-Za-z0-9_]` identifiers are accepted.
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self { pool, table })
    }
}

#[async_trait]
impl CodeLookup for MySqlCollection {
    async fn code_exists(&self, field: &str, code: &str) -> Result<bool> {
        validate_identifier(field)?;

        let select = format!(
            "SELECT 1 FROM `{}` WHERE `{}` = ? LIMIT 1",
            self.table, field
        );

        let exists = sqlx::query(&select)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .is_some();

        Ok(exists)
    }
}

fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LENGTH
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(format!(
            "'{name}' must be 1-{MAX_IDENTIFIER_LENGTH} characters of [A-Za-z0-9_]"
        )))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    if is_unique_violation(&err) {
        return StorageError::Conflict(message);
    }

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}
