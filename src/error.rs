use std::path::PathBuf;

/// Library-level structured errors for chlg.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ChlgError {
	#[error("Insertion content must contain at least one line")]
	EmptyInsertion,

	#[error("Match criteria must contain at least one pattern")]
	EmptyCriteria,

	#[error("Invalid regex pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Template for {field} is missing the {placeholder} placeholder: {template}")]
	InvalidTemplate {
		field: String,
		placeholder: String,
		template: String,
	},

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Changelog not found: {path}")]
	ChangelogNotFound { path: PathBuf },

	#[error("Failed to update changelog: {path}")]
	ChangelogIo {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Section \"{section}\" not found under the unreleased heading of {path}")]
	SectionNotFound { section: String, path: PathBuf },

	#[error("{path} already exists")]
	AlreadyExists { path: PathBuf },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using ChlgError.
pub type Result<T> = std::result::Result<T, ChlgError>;
