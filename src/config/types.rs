use crate::error::{ChlgError, Result};
use crate::insert::compile_regex;
use serde::Deserialize;
use std::path::PathBuf;

/// Default changelog file name.
pub const DEFAULT_FILE: &str = "CHANGELOG.md";

/// Default pattern locating the heading of the unreleased version.
pub const DEFAULT_UNRELEASED_PATTERN: &str = r"(?i)^##\s+\[?unreleased\]?";

/// Default pattern template locating a section heading.
pub const DEFAULT_SECTION_PATTERN: &str = r"(?i)^###\s+{section}\s*$";

/// Default template for a new entry line.
pub const DEFAULT_ENTRY_FORMAT: &str = "- {message}";

/// Placeholder substituted with the regex-escaped section name.
pub const SECTION_PLACEHOLDER: &str = "{section}";

/// Placeholder substituted with the entry text.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Top-level configuration from a `.chlg.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop the directory cascade here and jump directly to ~/.chlg.toml.
	#[serde(default)]
	pub root: bool,

	/// Changelog path; a relative path is resolved against the directory
	/// containing the config file.
	pub file: Option<PathBuf>,

	/// Regex matching the heading of the unreleased version.
	pub unreleased_pattern: Option<String>,

	/// Regex template matching a section heading. Must contain `{section}`.
	pub section_pattern: Option<String>,

	/// Template for the inserted entry. Must contain `{message}`.
	pub entry_format: Option<String>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Effective settings after merging the cascade and applying defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySettings {
	pub file: PathBuf,
	pub unreleased_pattern: String,
	pub section_pattern: String,
	pub entry_format: String,
}

impl Default for EntrySettings {
	fn default() -> Self {
		EntrySettings {
			file: PathBuf::from(DEFAULT_FILE),
			unreleased_pattern: DEFAULT_UNRELEASED_PATTERN.to_string(),
			section_pattern: DEFAULT_SECTION_PATTERN.to_string(),
			entry_format: DEFAULT_ENTRY_FORMAT.to_string(),
		}
	}
}

impl Config {
	/// Validate patterns and templates that are set.
	pub fn validate(&self) -> Result<()> {
		if let Some(ref pattern) = self.unreleased_pattern {
			compile_regex(pattern)?;
		}

		if let Some(ref template) = self.section_pattern {
			require_placeholder("section-pattern", template, SECTION_PLACEHOLDER)?;
			// Any literal text compiles the same way an escaped section name would
			compile_regex(&template.replace(SECTION_PLACEHOLDER, "section"))?;
		}

		if let Some(ref template) = self.entry_format {
			require_placeholder("entry-format", template, MESSAGE_PLACEHOLDER)?;
		}

		Ok(())
	}
}

/// Fail with `InvalidTemplate` unless `template` contains `placeholder`.
pub fn require_placeholder(field: &str, template: &str, placeholder: &str) -> Result<()> {
	if template.contains(placeholder) {
		Ok(())
	} else {
		Err(ChlgError::InvalidTemplate {
			field: field.to_string(),
			placeholder: placeholder.to_string(),
			template: template.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_settings() {
		let settings = EntrySettings::default();
		assert_eq!(settings.file, PathBuf::from("CHANGELOG.md"));
		assert!(settings.section_pattern.contains(SECTION_PLACEHOLDER));
		assert!(settings.entry_format.contains(MESSAGE_PLACEHOLDER));
	}

	#[test]
	fn test_validate_accepts_defaults() {
		let config = Config {
			unreleased_pattern: Some(DEFAULT_UNRELEASED_PATTERN.to_string()),
			section_pattern: Some(DEFAULT_SECTION_PATTERN.to_string()),
			entry_format: Some(DEFAULT_ENTRY_FORMAT.to_string()),
			..Default::default()
		};
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_validate_requires_section_placeholder() {
		let config = Config {
			section_pattern: Some("^### Added$".to_string()),
			..Default::default()
		};
		match config.validate().unwrap_err() {
			ChlgError::InvalidTemplate { field, placeholder, .. } => {
				assert_eq!(field, "section-pattern");
				assert_eq!(placeholder, "{section}");
			}
			other => panic!("Expected InvalidTemplate error, got {other:?}"),
		}
	}

	#[test]
	fn test_validate_rejects_bad_unreleased_regex() {
		let config = Config {
			unreleased_pattern: Some("^## [".to_string()),
			..Default::default()
		};
		assert!(matches!(
			config.validate(),
			Err(ChlgError::InvalidRegex { .. })
		));
	}
}
