//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use nexus_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Server: {}", cfg.stream.base_url);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, read_config, save_config, ConfigError};
pub use schema::{CliConfig, Config, StreamConfig};
