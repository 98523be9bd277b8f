//! Parsing and validation of `lockstep.toml` suite files.
//!
//! A suite file selects which circuits are verified, with which parameter
//! sets, and how scenarios are run. Every section is optional; an empty file
//! yields the stock parametrizations.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
