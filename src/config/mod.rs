//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, APM_* env overrides)
//!     → AppConfig
//!     → ApmConfig handed to the middleware factory
//!     → validation.rs (defaults substituted, credential checked)
//!     → immutable for the lifetime of the layer
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - An invalid APM section disables instrumentation instead of failing startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ApmConfig, AppConfig, LogFormat, ObservabilityConfig, ServerConfig, TransportKind};
pub use validation::{normalize, ValidationError};
