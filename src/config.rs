use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::db::PoolSettings;
use crate::infrastructure::kafka::KafkaSettings;

pub const DEFAULT_EXCHANGE: &str = "order.exchange";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool: PoolSettings,
    /// `None` runs without a broker.
    pub kafka: Option<KafkaSettings>,
    pub publish_queue_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let send_timeout = Duration::from_millis(parse_or(&var, "PUBLISH_TIMEOUT_MS", 5000)?);

        let kafka = match var("KAFKA_BROKERS") {
            Some(brokers) => Some(KafkaSettings {
                brokers,
                topic: var("ORDER_EXCHANGE").unwrap_or_else(|| DEFAULT_EXCHANGE.to_string()),
                partitions: parse_or(&var, "KAFKA_TOPIC_PARTITIONS", 3)?,
                replication_factor: parse_or(&var, "KAFKA_REPLICATION_FACTOR", 1)?,
                send_timeout,
            }),
            None => None,
        };

        Ok(AppConfig {
            database_url,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 8080)?,
            pool: PoolSettings {
                max_size: parse_or(&var, "DB_POOL_SIZE", 10)?,
                connect_timeout: Duration::from_millis(parse_or(
                    &var,
                    "DB_CONNECT_TIMEOUT_MS",
                    5000,
                )?),
                statement_timeout: Duration::from_millis(parse_or(
                    &var,
                    "DB_STATEMENT_TIMEOUT_MS",
                    5000,
                )?),
            },
            kafka,
            publish_queue_capacity: parse_or(&var, "PUBLISH_QUEUE_CAPACITY", 1024)?,
        })
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
