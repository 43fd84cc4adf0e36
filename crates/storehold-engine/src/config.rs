//! # Engine Configuration
//!
//! Configuration management for the fulfillment engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREHOLD_DB_PATH=/var/lib/storehold/storehold.db                  │
//! │     STOREHOLD_ORDER_EXPIRY_HOURS=48                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storehold/storehold.toml (Linux)                         │
//! │     ~/Library/Application Support/com.storehold.storehold/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ORD / RCPT prefixes, 24 h expiry, 300 s sweep, UTC business day    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storehold.toml
//! [database]
//! path = "/var/lib/storehold/storehold.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [orders]
//! number_prefix = "ORD"
//! expiry_hours = 24
//! sweep_interval_secs = 300
//!
//! [sales]
//! receipt_prefix = "RCPT"
//! default_website_payment = "TRANSFER"
//!
//! [calendar]
//! utc_offset_minutes = 60
//!
//! [catalog]
//! low_stock_threshold = 5
//! max_media_per_product = 3
//!
//! [receipts]
//! store_name = "Storehold"
//! queue_capacity = 64
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use storehold_core::validation::validate_number_prefix;
use storehold_core::{
    BusinessCalendar, PaymentMethod, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_ORDER_EXPIRY_HOURS,
    DEFAULT_ORDER_PREFIX, DEFAULT_RECEIPT_PREFIX, MAX_PRODUCT_MEDIA,
};
use storehold_db::DbConfig;

use crate::error::ConfigError;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the SQLite file lives and how the pool behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the write lock (seconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "storehold", "storehold")
        .map(|dirs| dirs.data_dir().join("storehold.db"))
        .unwrap_or_else(|| PathBuf::from("storehold.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl DatabaseSettings {
    /// Pool configuration for [`storehold_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

// =============================================================================
// Order Settings
// =============================================================================

/// Website order numbering and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Prefix of `ORD-20260207-0001`.
    #[serde(default = "default_order_prefix")]
    pub number_prefix: String,

    /// Hours an order may stay PENDING_PAYMENT before the sweeper cancels it.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,

    /// Interval between expiry sweeps (seconds).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_order_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}

fn default_expiry_hours() -> i64 {
    DEFAULT_ORDER_EXPIRY_HOURS
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            number_prefix: default_order_prefix(),
            expiry_hours: default_expiry_hours(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl OrderSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expiry_hours)
    }
}

// =============================================================================
// Sale Settings
// =============================================================================

/// Receipt numbering and website payment defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Prefix of `RCPT-20260207-0001`.
    #[serde(default = "default_receipt_prefix")]
    pub receipt_prefix: String,

    /// Payment method recorded when an order is marked paid without one.
    #[serde(default = "default_website_payment")]
    pub default_website_payment: PaymentMethod,
}

fn default_receipt_prefix() -> String {
    DEFAULT_RECEIPT_PREFIX.to_string()
}

fn default_website_payment() -> PaymentMethod {
    PaymentMethod::Transfer
}

impl Default for SaleSettings {
    fn default() -> Self {
        SaleSettings {
            receipt_prefix: default_receipt_prefix(),
            default_website_payment: default_website_payment(),
        }
    }
}

// =============================================================================
// Calendar, Catalog and Receipt Settings
// =============================================================================

/// The store's business day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Minutes east of UTC (Lagos is 60). No DST.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CalendarSettings {
    pub fn calendar(&self) -> Result<BusinessCalendar, ConfigError> {
        BusinessCalendar::from_offset_minutes(self.utc_offset_minutes)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Available units at or below which the dashboard flags a product.
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,

    #[serde(default = "default_max_media")]
    pub max_media_per_product: i64,
}

fn default_low_stock() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_max_media() -> i64 {
    MAX_PRODUCT_MEDIA
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            low_stock_threshold: default_low_stock(),
            max_media_per_product: default_max_media(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Printed at the top of every receipt.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Bounded capacity of the background render queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_store_name() -> String {
    "Storehold".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            store_name: default_store_name(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub sales: SaleSettings,

    #[serde(default)]
    pub calendar: CalendarSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub receipts: ReceiptSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storehold.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.to_string()))
        };

        validate_number_prefix("orders.number_prefix", &self.orders.number_prefix)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        validate_number_prefix("sales.receipt_prefix", &self.sales.receipt_prefix)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.database.max_connections == 0 {
            return invalid("database.max_connections must be greater than 0");
        }
        if self.orders.expiry_hours <= 0 {
            return invalid("orders.expiry_hours must be greater than 0");
        }
        if self.orders.sweep_interval_secs == 0 {
            return invalid("orders.sweep_interval_secs must be greater than 0");
        }
        if self.catalog.low_stock_threshold < 0 {
            return invalid("catalog.low_stock_threshold must not be negative");
        }
        if self.catalog.max_media_per_product <= 0 {
            return invalid("catalog.max_media_per_product must be greater than 0");
        }
        if self.receipts.queue_capacity == 0 {
            return invalid("receipts.queue_capacity must be greater than 0");
        }

        self.calendar.calendar()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    ///
    /// `ORDER_EXPIRY_HOURS` is accepted as a fallback for
    /// `STOREHOLD_ORDER_EXPIRY_HOURS`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("STOREHOLD_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(prefix) = lookup("STOREHOLD_ORDER_PREFIX") {
            self.orders.number_prefix = prefix;
        }

        if let Some(prefix) = lookup("STOREHOLD_RECEIPT_PREFIX") {
            self.sales.receipt_prefix = prefix;
        }

        let expiry = lookup("STOREHOLD_ORDER_EXPIRY_HOURS").or_else(|| lookup("ORDER_EXPIRY_HOURS"));
        if let Some(hours) = expiry {
            match hours.trim().parse::<i64>() {
                Ok(h) => {
                    debug!(hours = h, "Overriding order expiry from environment");
                    self.orders.expiry_hours = h;
                }
                Err(_) => warn!(value = %hours, "Ignoring non-numeric order expiry hours"),
            }
        }

        if let Some(secs) = lookup("STOREHOLD_SWEEP_INTERVAL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(s) => self.orders.sweep_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric sweep interval"),
            }
        }

        if let Some(offset) = lookup("STOREHOLD_UTC_OFFSET_MINUTES") {
            match offset.trim().parse::<i32>() {
                Ok(m) => self.calendar.utc_offset_minutes = m,
                Err(_) => warn!(value = %offset, "Ignoring non-numeric UTC offset"),
            }
        }

        if let Some(name) = lookup("STOREHOLD_STORE_NAME") {
            self.receipts.store_name = name;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storehold", "storehold")
            .map(|dirs| dirs.config_dir().join("storehold.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.orders.number_prefix, "ORD");
        assert_eq!(config.orders.expiry_hours, 24);
        assert_eq!(config.orders.sweep_interval_secs, 300);
        assert_eq!(config.sales.receipt_prefix, "RCPT");
        assert_eq!(config.sales.default_website_payment, PaymentMethod::Transfer);
        assert_eq!(config.catalog.max_media_per_product, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [orders]
            expiry_hours = 48

            [sales]
            default_website_payment = "POS"

            [calendar]
            utc_offset_minutes = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.orders.expiry_hours, 48);
        assert_eq!(config.orders.number_prefix, "ORD");
        assert_eq!(config.sales.default_website_payment, PaymentMethod::Pos);
        assert_eq!(config.receipts.queue_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.orders.expiry_hours = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.sales.receipt_prefix = "RC PT".into();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.calendar.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOREHOLD_DB_PATH", "/tmp/test.db"),
            ("ORDER_EXPIRY_HOURS", "12"),
            ("STOREHOLD_RECEIPT_PREFIX", "JD-RCPT"),
            ("STOREHOLD_SWEEP_INTERVAL_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.orders.expiry_hours, 12);
        assert_eq!(config.sales.receipt_prefix, "JD-RCPT");
        assert_eq!(config.orders.sweep_interval_secs, 300);
    }

    #[test]
    fn test_prefixed_expiry_wins() {
        let mut config = EngineConfig::default();
        config.apply_overrides(|key| match key {
            "STOREHOLD_ORDER_EXPIRY_HOURS" => Some("6".into()),
            "ORDER_EXPIRY_HOURS" => Some("12".into()),
            _ => None,
        });
        assert_eq!(config.orders.expiry_hours, 6);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storehold.toml");

        let mut config = EngineConfig::default();
        config.receipts.store_name = "Lekki Branch".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[receipts]"));

        let loaded: EngineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.receipts.store_name, "Lekki Branch");
    }
}
