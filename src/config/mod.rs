//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! aegis.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConnectorSettings (immutable)
//!
//! On initialize:
//!     explicit values (file / CLI flags)
//!     → resolve.rs (explicit ?? environment ?? built-in)
//!     → ResolvedConfig, frozen until the next initialize
//!
//! After deploy:
//!     env_file.rs rewrites CONTRACT_ADDRESS in .env
//! ```

pub mod env_file;
pub mod loader;
pub mod resolve;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use resolve::{resolve, EnvDefaults, InitConfig, ResolvedConfig};
pub use schema::{ConnectorSettings, NetworkConfig, ObservabilityConfig};
