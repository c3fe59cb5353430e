//! Clarity Configuration System
//!
//! Loads `clarity.toml` for the test runner:
//! - output format and color
//! - console printer widths
//! - test libraries to load and where to search for them
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.clarity/config.toml)
//! 2. Project config (clarity.toml, found by walking up from the start directory)
//! 3. Environment variables (CLARITY_*, NO_COLOR)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use clarity_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("color: {}", config.color());
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use project::{ClarityConfig, LoaderConfig, OutputConfig, OutputFormat, PrinterWidths};
