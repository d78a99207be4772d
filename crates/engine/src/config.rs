use std::time::Duration;

use deckstore_db::PoolSettings;

/// Default number of workers draining the operation queue.
pub const DEFAULT_WORKERS: usize = 8;

/// Default capacity of the bounded operation queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Postgres connection URL.
    pub database_url: String,
    /// sqlx pool sizing.
    pub pool: PoolSettings,
    /// Fixed number of workers (default: `8`).
    pub workers: usize,
    /// Operations that may wait in the queue before callers block (default: `64`).
    pub queue_capacity: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default  |
    /// |----------------------------|----------|
    /// | `DATABASE_URL`             | required |
    /// | `DB_MAX_CONNECTIONS`       | `25`     |
    /// | `DB_ACQUIRE_TIMEOUT_SECS`  | `5`      |
    /// | `DECKSTORE_WORKERS`        | `8`      |
    /// | `DECKSTORE_QUEUE_CAPACITY` | `64`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let defaults = PoolSettings::default();
        let max_connections: u32 =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let acquire_timeout_secs: u64 = parse_or(
            &lookup,
            "DB_ACQUIRE_TIMEOUT_SECS",
            defaults.acquire_timeout.as_secs(),
        )?;
        let workers: usize = parse_or(&lookup, "DECKSTORE_WORKERS", DEFAULT_WORKERS)?;
        let queue_capacity: usize =
            parse_or(&lookup, "DECKSTORE_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;

        if max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", max_connections));
        }
        if workers == 0 {
            return Err(invalid("DECKSTORE_WORKERS", workers));
        }
        if queue_capacity == 0 {
            return Err(invalid("DECKSTORE_QUEUE_CAPACITY", queue_capacity));
        }

        Ok(Self {
            database_url,
            pool: PoolSettings {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            workers,
            queue_capacity,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn invalid(var: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply() {
        let lookup = lookup_from(&[("DATABASE_URL", "postgres://localhost/deckstore")]);
        let config = EngineConfig::from_lookup(lookup).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/deckstore");
        assert_eq!(config.pool.max_connections, 25);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn overrides_apply() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/deckstore"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
            ("DECKSTORE_WORKERS", " 2 "),
            ("DECKSTORE_QUEUE_CAPACITY", "16"),
        ]))
        .unwrap();
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(1));
        assert_eq!(config.workers, 2);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(
            EngineConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn garbage_and_zero_are_rejected() {
        assert_matches!(
            EngineConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db"),
                ("DECKSTORE_WORKERS", "many"),
            ])),
            Err(ConfigError::Invalid { var: "DECKSTORE_WORKERS", .. })
        );
        assert_matches!(
            EngineConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db"),
                ("DECKSTORE_QUEUE_CAPACITY", "0"),
            ])),
            Err(ConfigError::Invalid { var: "DECKSTORE_QUEUE_CAPACITY", .. })
        );
    }
}
