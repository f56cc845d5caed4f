use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

// Где живут места
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

// Параметры вагона и дедлайн операций с хранилищем
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub capacity: i32,
    pub store_deadline_ms: u64,
}

impl BookingConfig {
    pub fn store_deadline(&self) -> Duration {
        Duration::from_millis(self.store_deadline_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn var_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = var_or(name, default);
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8000")?,
                rust_log: var_or("RUST_LOG", "train_booking=debug,tower_http=debug"),
            },
            store: StoreConfig {
                backend: parse_var("SEAT_STORE", "postgres")?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok(),
                pool_size: parse_var("DB_POOL_SIZE", "20")?,
            },
            booking: BookingConfig {
                capacity: parse_var("SEAT_CAPACITY", "80")?,
                store_deadline_ms: parse_var("STORE_DEADLINE_MS", "5000")?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing { name: "DATABASE_URL" });
        }
        if self.booking.capacity < 1 {
            return Err(ConfigError::Invalid {
                name: "SEAT_CAPACITY",
                value: self.booking.capacity.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.booking.store_deadline_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "STORE_DEADLINE_MS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Адрес для bind'а сервера.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                rust_log: "train_booking=debug".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            database: DatabaseConfig {
                url: None,
                pool_size: 20,
            },
            booking: BookingConfig {
                capacity: 80,
                store_deadline_ms: 5000,
            },
        }
    }
}
