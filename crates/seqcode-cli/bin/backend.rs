use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use async_trait::async_trait;
use seqcode_core::{CodeLookup, CounterStore};
use seqcode_storage::{
    InMemoryCollection, InMemoryCounterStore, MySqlCollection, MySqlCounterStore,
    RedisCounterStore,
};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether the command may change storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Never creates tables; a missing counter table is reported by the read.
    ReadOnly,
    /// Creates a missing MySQL counter table before use.
    ReadWrite,
}

/// Storage handles selected by the command line.
pub struct Backend {
    storage: StorageBackendArg,
    counters: Arc<dyn CounterStore>,
    mysql: Option<MySqlPool>,
}

impl Backend {
    /// Connects to the configured backend. With [`Access::ReadWrite`] a
    /// missing MySQL counter table is created.
    pub async fn open(config: &CLI, access: Access) -> anyhow::Result<Self> {
        let (counters, mysql) = match config.storage {
            StorageBackendArg::InMemory => {
                warn!("in-memory counters are discarded on exit; every run starts from zero");
                let counters: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
                (counters, None)
            }
            StorageBackendArg::Mysql => {
                let pool = connect_mysql(config).await?;
                let store =
                    MySqlCounterStore::with_table(pool.clone(), config.counter_table.as_str())?;
                if access == Access::ReadWrite {
                    store
                        .ensure_schema()
                        .await
                        .with_context(|| format!("failed to create table '{}'", store.table()))?;
                }
                let counters: Arc<dyn CounterStore> = Arc::new(store);
                (counters, Some(pool))
            }
            StorageBackendArg::Redis => {
                let url = config
                    .redis_url
                    .as_deref()
                    .context("redis url is required when storage backend is redis")?;
                let store = RedisCounterStore::connect(url)
                    .await
                    .context("failed to connect to Redis")?;

                // Redis holds counters only; codes are probed in MySQL when a
                // DSN is given.
                let mysql = match config.mysql_dsn {
                    Some(_) => Some(connect_mysql(config).await?),
                    None => None,
                };
                let counters: Arc<dyn CounterStore> = Arc::new(store);
                (counters, mysql)
            }
        };

        debug!(storage = %config.storage, probe_in_mysql = mysql.is_some(), "Storage backend ready");

        Ok(Self {
            storage: config.storage,
            counters,
            mysql,
        })
    }

    pub fn counters(&self) -> Arc<dyn CounterStore> {
        Arc::clone(&self.counters)
    }

    /// Returns the probe for `collection` on this backend.
    pub fn lookup(&self, collection: &str) -> anyhow::Result<Box<dyn CodeLookup>> {
        if let Some(pool) = &self.mysql {
            let collection = MySqlCollection::new(pool.clone(), collection)?;
            return Ok(Box::new(collection));
        }

        match self.storage {
            StorageBackendArg::InMemory => Ok(Box::new(InMemoryCollection::new())),
            StorageBackendArg::Mysql | StorageBackendArg::Redis => {
                warn!(
                    collection,
                    "no database configured for the target collection; codes are not probed"
                );
                Ok(Box::new(SkipProbe))
            }
        }
    }
}

async fn connect_mysql(config: &CLI) -> anyhow::Result<MySqlPool> {
    let dsn = config
        .mysql_dsn
        .as_deref()
        .context("mysql dsn is required when storage backend is mysql")?;
    MySqlPool::connect(dsn)
        .await
        .context("failed to connect to MySQL")
}

/// A probe that reports every code as free.
struct SkipProbe;

#[async_trait]
impl CodeLookup for SkipProbe {
    async fn code_exists(&self, _field: &str, _code: &str) -> seqcode_core::error::Result<bool> {
        Ok(false)
    }
}
