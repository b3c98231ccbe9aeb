//! Environment driven database settings

use std::env;
use std::time::Duration;

use log::warn;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::constants::{DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};
use crate::services::db::Store;
use crate::services::options::{IsolationLevel, TxOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Default options for every transaction the store runs
    pub tx_options: TxOptions,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            tx_options: TxOptions::default(),
        }
    }
}

impl DbConfig {
    /// Read `DATABASE_URL`, `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS`,
    /// `DB_ISOLATION_LEVEL` and `DB_TX_DEADLINE_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparseable values keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DbConfig::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.database_url);

        let max_connections = parse_positive(&lookup, "DB_MAX_CONNECTIONS")
            .unwrap_or(defaults.max_connections);

        let acquire_timeout = parse_positive::<u64, _>(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.acquire_timeout);

        let isolation = lookup("DB_ISOLATION_LEVEL").and_then(|raw| {
            raw.parse::<IsolationLevel>()
                .map_err(|e| warn!("Ignoring DB_ISOLATION_LEVEL: {}", e))
                .ok()
        });

        let deadline = parse_positive::<u64, _>(&lookup, "DB_TX_DEADLINE_SECS").map(Duration::from_secs);

        DbConfig {
            database_url,
            max_connections,
            acquire_timeout,
            tx_options: TxOptions {
                isolation,
                deadline,
                ..defaults.tx_options
            },
        }
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }

    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        self.pool_options().connect(&self.database_url).await
    }

    /// Pool that opens connections on first use
    pub fn connect_lazy(&self) -> Result<PgPool, sqlx::Error> {
        self.pool_options().connect_lazy(&self.database_url)
    }

    pub async fn open_store(&self) -> Result<Store, sqlx::Error> {
        let pool = self.connect().await?;
        Ok(Store::with_options(pool, self.tx_options))
    }
}

fn parse_positive<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!("Ignoring {}={:?}: expected a positive number", key, raw);
            None
        }
    }
}
