//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs env overrides (SELLER_API_BASE_URL)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to HttpClient::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the base URL is read once at start-up
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    ApiConfig, ClientConfig, LogoutPolicy, ObservabilityConfig, PollerConfig, RecoveryConfig,
    SessionConfig, TimeoutConfig, BASE_URL_ENV,
};
pub use validation::ValidationError;
