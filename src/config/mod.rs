//! Configuration loading and management for the worksheet engine.
//!
//! This module loads the engine settings and the organization directory
//! seed from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use worksheet_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Factory offset: {}", config.utc_offset());
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, parse_utc_offset};
pub use types::{EngineConfig, EngineSettings, OrganizationConfig};
