//! Configuration loading and parsing for chlg.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Merging the cascade into effective settings

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, NO_USER_CONFIG_ENV_VAR, discover_configs, load_settings, merge_configs,
	user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, EntrySettings, LoadedConfig};
