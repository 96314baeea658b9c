use crate::error::{ChlgError, Result};
use regex::Regex;
use std::fmt;

/// Synthetic line fed through the criteria once the real input is exhausted.
///
/// ASCII ETX never shows up in a changelog, so only patterns written to match
/// it on purpose (`EndOfStream`, or a regex like `\x03`) can be satisfied by it.
pub const END_OF_STREAM: &str = "\u{3}";

/// A test applied to a single line of input.
///
/// The line never includes its `\n` terminator.
pub trait LinePattern {
	/// Whether the line matches.
	fn test(&self, line: &str) -> bool;

	/// Human-readable form used in logs and `Debug` output.
	fn describe(&self) -> String;
}

impl LinePattern for Regex {
	fn test(&self, line: &str) -> bool {
		self.is_match(line)
	}

	fn describe(&self) -> String {
		format!("/{}/", self.as_str())
	}
}

/// Matches a line equal to the given text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(pub String);

impl Literal {
	pub fn new(text: impl Into<String>) -> Self {
		Literal(text.into())
	}
}

impl LinePattern for Literal {
	fn test(&self, line: &str) -> bool {
		line == self.0
	}

	fn describe(&self) -> String {
		format!("{:?}", self.0)
	}
}

/// Matches only the end-of-stream sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndOfStream;

impl LinePattern for EndOfStream {
	fn test(&self, line: &str) -> bool {
		line == END_OF_STREAM
	}

	fn describe(&self) -> String {
		"<end of stream>".to_string()
	}
}

/// Wraps an arbitrary predicate.
pub struct Predicate<F> {
	name: String,
	test: F,
}

impl<F> Predicate<F>
where
	F: Fn(&str) -> bool,
{
	pub fn new(name: impl Into<String>, test: F) -> Self {
		Predicate {
			name: name.into(),
			test,
		}
	}
}

impl<F> LinePattern for Predicate<F>
where
	F: Fn(&str) -> bool,
{
	fn test(&self, line: &str) -> bool {
		(self.test)(line)
	}

	fn describe(&self) -> String {
		self.name.clone()
	}
}

/// Ordered sequence of patterns that must each match some line, in order.
#[derive(Default)]
pub struct Criteria {
	patterns: Vec<Box<dyn LinePattern>>,
}

impl Criteria {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a pattern to the end of the sequence.
	pub fn then(mut self, pattern: impl LinePattern + 'static) -> Self {
		self.patterns.push(Box::new(pattern));
		self
	}

	/// Compile each string as a regex, in order.
	pub fn from_patterns(patterns: &[&str]) -> Result<Self> {
		let mut criteria = Criteria::new();
		for pattern in patterns {
			criteria = criteria.then(compile_regex(pattern)?);
		}
		Ok(criteria)
	}

	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&dyn LinePattern> {
		self.patterns.get(index).map(|p| p.as_ref())
	}
}

impl fmt::Debug for Criteria {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.patterns.iter().map(|p| p.describe()))
			.finish()
	}
}

impl From<Regex> for Criteria {
	fn from(regex: Regex) -> Self {
		Criteria::new().then(regex)
	}
}

impl From<Vec<Regex>> for Criteria {
	fn from(regexes: Vec<Regex>) -> Self {
		regexes.into_iter().fold(Criteria::new(), Criteria::then)
	}
}

impl From<Literal> for Criteria {
	fn from(literal: Literal) -> Self {
		Criteria::new().then(literal)
	}
}

impl From<EndOfStream> for Criteria {
	fn from(sentinel: EndOfStream) -> Self {
		Criteria::new().then(sentinel)
	}
}

/// Lines inserted as a unit each time the criteria complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insertion {
	lines: Vec<String>,
}

impl Insertion {
	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}
}

impl From<&str> for Insertion {
	fn from(line: &str) -> Self {
		Insertion {
			lines: vec![line.to_string()],
		}
	}
}

impl From<String> for Insertion {
	fn from(line: String) -> Self {
		Insertion { lines: vec![line] }
	}
}

impl From<Vec<String>> for Insertion {
	fn from(lines: Vec<String>) -> Self {
		Insertion { lines }
	}
}

impl From<Vec<&str>> for Insertion {
	fn from(lines: Vec<&str>) -> Self {
		lines.as_slice().into()
	}
}

impl From<&[&str]> for Insertion {
	fn from(lines: &[&str]) -> Self {
		Insertion {
			lines: lines.iter().map(|l| l.to_string()).collect(),
		}
	}
}

/// Where insertion content goes relative to the trigger line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
	/// After the trigger line.
	#[default]
	Append,
	/// Before the trigger line.
	Prepend,
}

/// Compile a regex pattern string.
pub fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| ChlgError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}
