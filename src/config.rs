//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/boxoffice/config.toml`).
//! Every field has a default, so an empty or missing file is a valid
//! configuration.

use std::path::{Path, PathBuf};

use chrono::Duration;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::{
    AdmissionConfig, ReservationSettings, SeatMapLayout, SectionLayout,
};
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;
use crate::shared::utils::RetryConfig;

/// Upper bound for every minute-valued setting: one week
pub const MAX_CONFIG_MINUTES: i64 = 7 * 24 * 60;

/// Upper bound for retry delays
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boxoffice")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseSettings,
    pub reservations: ReservationConfig,
    pub checkout: CheckoutConfig,
    pub waiting_room: WaitingRoomConfig,
    pub seat_map: SeatMapConfig,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or any EnvFilter directive)
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SeaORM connection URL. Unset keeps everything in memory.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl DatabaseSettings {
    /// Human-readable backend description
    pub fn connection_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| "in-memory".to_string())
    }

    pub fn to_database_config(&self) -> Option<DatabaseConfig> {
        self.url.as_ref().map(|url| DatabaseConfig {
            url: url.clone(),
            max_connections: self.max_connections,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    pub hold_minutes: i64,
    /// Interval of the background expiry sweep; 0 disables it
    pub sweep_interval_secs: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_minutes: 10,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub service_fee_percent: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            service_fee_percent: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitingRoomConfig {
    pub max_active_per_event: usize,
    pub session_minutes: i64,
    pub wait_minutes_per_position: i64,
}

impl Default for WaitingRoomConfig {
    fn default() -> Self {
        Self {
            max_active_per_event: 5,
            session_minutes: 10,
            wait_minutes_per_position: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatMapConfig {
    pub rows: u32,
    pub seats_per_row: u32,
    pub sections: Vec<SectionConfig>,
}

impl Default for SeatMapConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            seats_per_row: 10,
            sections: vec![
                SectionConfig {
                    name: "A".to_string(),
                    price: 50_000.0,
                },
                SectionConfig {
                    name: "B".to_string(),
                    price: 30_000.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            backoff_multiplier: defaults.backoff_multiplier,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))
    }

    /// Reject values that parse but make no sense.
    pub fn validate(&self) -> Result<(), InfraError> {
        let fail = |msg: &str| Err(InfraError::Config(msg.to_string()));

        let minutes = [
            ("reservations.hold_minutes", self.reservations.hold_minutes, 1),
            ("waiting_room.session_minutes", self.waiting_room.session_minutes, 1),
            (
                "waiting_room.wait_minutes_per_position",
                self.waiting_room.wait_minutes_per_position,
                0,
            ),
        ];
        for (name, value, min) in minutes {
            if !(min..=MAX_CONFIG_MINUTES).contains(&value) {
                return Err(InfraError::Config(format!(
                    "{name} must be between {min} and {MAX_CONFIG_MINUTES}"
                )));
            }
        }
        if self.waiting_room.max_active_per_event == 0 {
            return fail("waiting_room.max_active_per_event must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            return fail("retry.max_attempts must be at least 1");
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return fail("retry.backoff_multiplier must be a finite number >= 1.0");
        }
        if self.retry.max_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(InfraError::Config(format!(
                "retry.max_delay_ms must not exceed {MAX_RETRY_DELAY_MS}"
            )));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return fail("retry.initial_delay_ms must not exceed retry.max_delay_ms");
        }
        if !matches!(self.logging.format.to_lowercase().as_str(), "text" | "json") {
            return fail("logging.format must be \"text\" or \"json\"");
        }
        for section in &self.seat_map.sections {
            if section.name.trim().is_empty() {
                return fail("seat_map.sections[].name must not be empty");
            }
            if !section.price.is_finite() || section.price < 0.0 {
                return fail("seat_map.sections[].price must be a non-negative number");
            }
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: std::time::Duration::from_millis(self.retry.initial_delay_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
            max_delay: std::time::Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn reservation_settings(&self) -> ReservationSettings {
        ReservationSettings {
            hold: Duration::minutes(self.reservations.hold_minutes),
            service_fee_percent: self.checkout.service_fee_percent,
            retry: self.retry_config(),
        }
    }

    pub fn admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_active_per_event: self.waiting_room.max_active_per_event,
            session_duration: Duration::minutes(self.waiting_room.session_minutes),
            wait_per_position: Duration::minutes(self.waiting_room.wait_minutes_per_position),
        }
    }

    pub fn seat_map_layout(&self) -> SeatMapLayout {
        SeatMapLayout {
            sections: self
                .seat_map
                .sections
                .iter()
                .map(|s| SectionLayout {
                    name: s.name.clone(),
                    price: Decimal::from_f64(s.price)
                        .unwrap_or_default()
                        .round_dp(2),
                })
                .collect(),
            rows: self.seat_map.rows,
            seats_per_row: self.seat_map.seats_per_row,
        }
    }
}
