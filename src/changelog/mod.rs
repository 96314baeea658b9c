//! Changelog entry insertion.
//!
//! This module handles:
//! - Deriving match criteria and entry text from settings
//! - Rewriting a changelog file in place through the insertion transform
//! - Creating a skeleton changelog

use crate::config::EntrySettings;
use crate::config::types::{MESSAGE_PLACEHOLDER, SECTION_PLACEHOLDER, require_placeholder};
use crate::error::{ChlgError, Result};
use crate::insert::{
	Criteria, LinePattern, Placement, StreamInsert, StreamStats, compile_regex, insert_stream,
};
use regex::Regex;
use std::cell::Cell;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Contents written by `init_changelog`.
pub const CHANGELOG_TEMPLATE: &str = "\
# Changelog

All notable changes to this project will be documented in this file.

The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.1.0/).

## [Unreleased]

### Added

### Changed

### Deprecated

### Removed

### Fixed

### Security
";

/// Headings that end the unreleased version: `#` or `##`, never deeper.
const VERSION_BOUNDARY_PATTERN: &str = r"^#{1,2}\s";

/// Section heading that only matches inside the unreleased version.
///
/// Only sees lines after the unreleased heading has matched. The first
/// version-level heading closes it for the rest of the stream.
struct UnreleasedSection {
	heading: Regex,
	boundary: Regex,
	closed: Cell<bool>,
}

impl LinePattern for UnreleasedSection {
	fn test(&self, line: &str) -> bool {
		if self.closed.get() {
			return false;
		}
		if self.boundary.is_match(line) {
			debug!(line, "left the unreleased version");
			self.closed.set(true);
			return false;
		}
		self.heading.is_match(line)
	}

	fn describe(&self) -> String {
		format!("/{}/ before /{}/", self.heading.as_str(), self.boundary.as_str())
	}
}

/// Build the transform that inserts `message` under `section` of the
/// unreleased version.
pub fn build_transform(settings: &EntrySettings, section: &str, message: &str) -> Result<StreamInsert> {
	require_placeholder("section-pattern", &settings.section_pattern, SECTION_PLACEHOLDER)?;
	require_placeholder("entry-format", &settings.entry_format, MESSAGE_PLACEHOLDER)?;

	let unreleased = compile_regex(&settings.unreleased_pattern)?;
	let heading = settings
		.section_pattern
		.replace(SECTION_PLACEHOLDER, &regex::escape(section.trim()));
	let heading = compile_regex(&heading)?;

	let entry = settings.entry_format.replace(MESSAGE_PLACEHOLDER, message);
	let lines: Vec<String> = entry.lines().map(str::to_string).collect();

	debug!(unreleased = %unreleased, heading = %heading, ?lines, "built changelog criteria");
	StreamInsert::new(
		lines,
		Criteria::new().then(unreleased).then(UnreleasedSection {
			heading,
			boundary: compile_regex(VERSION_BOUNDARY_PATTERN)?,
			closed: Cell::new(false),
		}),
		Placement::Append,
	)
}

/// Insert an entry into the changelog named by `settings`.
///
/// Fails with `SectionNotFound`, leaving the file untouched, when the section
/// heading does not follow the unreleased heading.
pub fn insert_entry(settings: &EntrySettings, section: &str, message: &str) -> Result<StreamStats> {
	let transform = build_transform(settings, section, message)?;
	let stats = rewrite_file(&settings.file, transform)?;

	if !stats.inserted() {
		return Err(section_not_found(settings, section));
	}

	info!(file = %settings.file.display(), section, "inserted changelog entry");
	Ok(stats)
}

/// Write the changelog with the entry inserted to `out` instead of the file.
///
/// Nothing reaches `out` unless the entry was inserted.
pub fn render_entry<W: Write>(
	settings: &EntrySettings,
	section: &str,
	message: &str,
	mut out: W,
) -> Result<StreamStats> {
	let transform = build_transform(settings, section, message)?;
	let source = open_changelog(&settings.file)?;
	let mut rendered = Vec::new();
	let stats = insert_stream(BufReader::new(source), &mut rendered, transform)
		.map_err(|source| io_error(&settings.file, source))?;

	if !stats.inserted() {
		return Err(section_not_found(settings, section));
	}

	out.write_all(&rendered)
		.map_err(|source| io_error(&settings.file, source))?;
	Ok(stats)
}

/// Stream `path` through `transform` into a sibling temp file, then replace
/// `path` with it if anything was inserted.
pub fn rewrite_file(path: &Path, transform: StreamInsert) -> Result<StreamStats> {
	let source = open_changelog(path)?;
	let permissions = source
		.metadata()
		.map_err(|source| io_error(path, source))?
		.permissions();

	let dir = match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir,
		_ => Path::new("."),
	};
	let temp = NamedTempFile::new_in(dir).map_err(|source| io_error(path, source))?;

	let stats = insert_stream(
		BufReader::new(source),
		BufWriter::new(temp.as_file()),
		transform,
	)
	.map_err(|source| io_error(path, source))?;

	if !stats.inserted() {
		debug!(path = %path.display(), "nothing inserted, discarding temp file");
		return Ok(stats);
	}

	fs::set_permissions(temp.path(), permissions).map_err(|source| io_error(path, source))?;
	temp.persist(path).map_err(|err| io_error(path, err.error))?;

	Ok(stats)
}

/// Create a skeleton changelog at `path`.
pub fn init_changelog(path: &Path, force: bool) -> Result<()> {
	if path.exists() && !force {
		return Err(ChlgError::AlreadyExists {
			path: path.to_path_buf(),
		});
	}

	fs::write(path, CHANGELOG_TEMPLATE).map_err(|source| io_error(path, source))?;
	info!(path = %path.display(), "created changelog");
	Ok(())
}

fn open_changelog(path: &Path) -> Result<File> {
	File::open(path).map_err(|source| {
		if source.kind() == ErrorKind::NotFound {
			ChlgError::ChangelogNotFound {
				path: path.to_path_buf(),
			}
		} else {
			io_error(path, source)
		}
	})
}

fn io_error(path: &Path, source: std::io::Error) -> ChlgError {
	ChlgError::ChangelogIo {
		path: path.to_path_buf(),
		source,
	}
}

fn section_not_found(settings: &EntrySettings, section: &str) -> ChlgError {
	ChlgError::SectionNotFound {
		section: section.to_string(),
		path: settings.file.clone(),
	}
}
