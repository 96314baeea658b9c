use crate::config::parser::parse_config_file;
use crate::config::types::{EntrySettings, LoadedConfig};
use crate::error::{ChlgError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".chlg.toml";

/// Environment variable that, if truthy, skips ~/.chlg.toml lookup.
pub const NO_USER_CONFIG_ENV_VAR: &str = "CHLG_NO_USER_CONFIG";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.chlg.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.chlg.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	// Walk up the directory tree
	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			debug!(path = %config_path.display(), "loading config");
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.chlg.toml if it exists and isn't disabled.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	if is_env_truthy(NO_USER_CONFIG_ENV_VAR) {
		return Ok(None);
	}

	let user_config_path = user_config_path()?;

	// Already picked up while walking a home-relative working directory
	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.exists() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge configs into effective settings.
///
/// Each key is taken from the most specific config that sets it, falling back
/// to the built-in defaults. A relative `file` is resolved against the
/// directory of the config that set it.
pub fn merge_configs(configs: &[LoadedConfig]) -> EntrySettings {
	let mut settings = EntrySettings::default();

	if let Some(loaded) = configs.iter().find(|c| c.config.file.is_some())
		&& let Some(ref file) = loaded.config.file
	{
		settings.file = match loaded.path.parent() {
			Some(dir) if file.is_relative() => dir.join(file),
			_ => file.clone(),
		};
	}

	if let Some(pattern) = configs.iter().find_map(|c| c.config.unreleased_pattern.clone()) {
		settings.unreleased_pattern = pattern;
	}

	if let Some(pattern) = configs.iter().find_map(|c| c.config.section_pattern.clone()) {
		settings.section_pattern = pattern;
	}

	if let Some(format) = configs.iter().find_map(|c| c.config.entry_format.clone()) {
		settings.entry_format = format;
	}

	settings
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_settings(start_dir: &Path) -> Result<EntrySettings> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(ChlgError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
