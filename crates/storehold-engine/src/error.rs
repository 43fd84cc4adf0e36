//! # Engine Error Types
//!
//! What callers of the engine see when an operation fails.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    NotFound     │  │ InsufficientStock│ │   InvalidTransition     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ ProductNotFound │  │ guard rejected  │  │ PAID → CANCELLED        │ │
//! │  │ OrderNotFound   │  │ a stock delta   │  │ * → PENDING_PAYMENT     │ │
//! │  │ SaleNotFound    │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │  BusinessRule   │  │   DependencyFailure     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ EmptyOrder      │  │ ArchiveBlocked  │  │ storage errors          │ │
//! │  │ bad discount    │  │ MediaLimit      │  │ receipt rendering       │ │
//! │  │ bad date filter │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use storehold_core::{CoreError, ValidationError};
use storehold_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Any failure an engine operation can report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed underneath the operation.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The receipt renderer failed.
    ///
    /// ## When This Occurs
    /// - Explicit `render_for_sale` / `render_for_order` calls
    /// - Never from a committed order or sale; background failures are
    ///   logged by the worker instead
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error reported by a [`crate::receipts::ReceiptRenderer`].
#[derive(Debug, Clone, Error)]
#[error("Receipt rendering failed: {0}")]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        RenderError(message.into())
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written.
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`crate::config::EngineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Commit and begin failures surface as raw sqlx errors.
impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InsufficientStock,
    InvalidTransition,
    Validation,
    BusinessRule,
    DependencyFailure,
}

impl EngineError {
    /// Maps the error onto the caller-facing taxonomy.
    ///
    /// ## Mapping
    /// ```text
    /// CoreError::{Product,Order,Sale}NotFound, DbError::NotFound ─► NotFound
    /// CoreError::InsufficientStock ────────────────────────────► InsufficientStock
    /// CoreError::InvalidTransition ────────────────────────────► InvalidTransition
    /// EmptyOrder, EmptySale, QuantityTooLarge, Validation ─────► Validation
    /// ArchiveBlocked, MediaLimitReached ───────────────────────► BusinessRule
    /// other DbError, RenderError ──────────────────────────────► DependencyFailure
    /// ConfigError ─────────────────────────────────────────────► Validation
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => match err {
                CoreError::ProductNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::SaleNotFound(_) => ErrorKind::NotFound,
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                CoreError::EmptyOrder
                | CoreError::EmptySale
                | CoreError::QuantityTooLarge { .. }
                | CoreError::Validation(_) => ErrorKind::Validation,
                CoreError::ArchiveBlocked(_) | CoreError::MediaLimitReached { .. } => {
                    ErrorKind::BusinessRule
                }
            },
            EngineError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Db(_) | EngineError::Render(_) => ErrorKind::DependencyFailure,
            EngineError::Config(_) => ErrorKind::Validation,
        }
    }

    /// True when the write lost a lock race and may simply be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Db(err) if err.is_busy())
    }
}
