use crate::error::{ChlgError, Result};
use crate::insert::pattern::{Criteria, END_OF_STREAM, Insertion, Placement};
use std::borrow::Cow;
use tracing::{debug, trace};

/// Ordered-match insertion transform.
///
/// Consumes arbitrarily chunked input, reassembles it into lines and forwards
/// each one, inserting the configured lines around every line that completes the
/// criteria sequence. The transform is sans-IO: callers hand it chunks and
/// receive ready output in a buffer, so it can sit in any pipeline.
///
/// Matching is a small state machine over `0..criteria.len()`. A line that
/// matches the active pattern advances the cursor, any other line leaves it
/// where it is, and reaching the end of the sequence triggers an insertion and
/// resets the cursor to zero. Once the input ends, the `END_OF_STREAM` sentinel
/// goes through the same transition so criteria can target end of file.
#[derive(Debug)]
pub struct StreamInsert {
	insertion: Insertion,
	criteria: Criteria,
	placement: Placement,
	cursor: usize,
	/// Undelimited tail of the input seen so far.
	pending: Vec<u8>,
	/// Output emitted so far does not end with a newline.
	unterminated: bool,
	line_number: usize,
}

impl StreamInsert {
	/// Create a transform, rejecting empty insertion content or criteria.
	pub fn new(
		insertion: impl Into<Insertion>,
		criteria: impl Into<Criteria>,
		placement: Placement,
	) -> Result<Self> {
		let insertion = insertion.into();
		let criteria = criteria.into();

		if insertion.is_empty() {
			return Err(ChlgError::EmptyInsertion);
		}
		if criteria.is_empty() {
			return Err(ChlgError::EmptyCriteria);
		}

		Ok(StreamInsert {
			insertion,
			criteria,
			placement,
			cursor: 0,
			pending: Vec::new(),
			unterminated: false,
			line_number: 0,
		})
	}

	/// Number of criteria satisfied since the last full match.
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// Consume a chunk of input, appending any ready output to `out`.
	///
	/// Only the trailing fragment not yet terminated by `\n` is retained.
	pub fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
		let mut rest = chunk;

		while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
			let (line, tail) = rest.split_at(pos + 1);

			if self.pending.is_empty() {
				self.emit_line(line, out);
			} else {
				let mut buffered = std::mem::take(&mut self.pending);
				buffered.extend_from_slice(line);
				self.emit_line(&buffered, out);
				// Keep the allocation for the next fragment
				buffered.clear();
				self.pending = buffered;
			}

			rest = tail;
		}

		self.pending.extend_from_slice(rest);
	}

	/// Signal end of input, appending the remaining output to `out`.
	///
	/// Forwards the unterminated final line (if any), then evaluates the
	/// end-of-stream sentinel. The transform is reset afterwards and can be
	/// reused for a new stream.
	pub fn finish(&mut self, out: &mut Vec<u8>) {
		if !self.pending.is_empty() {
			let last = std::mem::take(&mut self.pending);
			self.emit_final_line(&last, out);
		}

		if self.advance(END_OF_STREAM) {
			debug!("criteria completed at end of stream");
			if self.unterminated {
				out.push(b'\n');
				self.emit_insertion(out, false);
			} else {
				self.emit_insertion(out, true);
			}
		}

		self.reset();
	}

	/// Drop buffered state without emitting anything.
	pub fn reset(&mut self) {
		self.cursor = 0;
		self.pending.clear();
		self.unterminated = false;
		self.line_number = 0;
	}

	/// Feed one line through the state machine, returning true when it
	/// completes the criteria sequence.
	fn advance(&mut self, line: &str) -> bool {
		let Some(pattern) = self.criteria.get(self.cursor) else {
			return false;
		};

		if !pattern.test(line) {
			return false;
		}

		trace!(
			line = self.line_number,
			criterion = self.cursor,
			pattern = %pattern.describe(),
			"criterion matched"
		);

		self.cursor += 1;
		if self.cursor == self.criteria.len() {
			self.cursor = 0;
			return true;
		}

		false
	}

	/// Handle a complete line, `\n` included.
	fn emit_line(&mut self, line: &[u8], out: &mut Vec<u8>) {
		self.line_number += 1;
		let content = &line[..line.len() - 1];

		if !self.advance(&line_text(content)) {
			out.extend_from_slice(line);
			return;
		}

		debug!(line = self.line_number, placement = ?self.placement, "inserting");
		match self.placement {
			Placement::Append => {
				out.extend_from_slice(line);
				self.emit_insertion(out, true);
			}
			Placement::Prepend => {
				self.emit_insertion(out, true);
				out.extend_from_slice(line);
			}
		}
	}

	/// Handle the final line of a stream that does not end with `\n`.
	fn emit_final_line(&mut self, line: &[u8], out: &mut Vec<u8>) {
		self.line_number += 1;

		if !self.advance(&line_text(line)) {
			out.extend_from_slice(line);
			self.unterminated = true;
			return;
		}

		debug!(line = self.line_number, placement = ?self.placement, "inserting on final line");
		match self.placement {
			Placement::Append => {
				out.extend_from_slice(line);
				out.push(b'\n');
				self.emit_insertion(out, false);
			}
			Placement::Prepend => {
				self.emit_insertion(out, true);
				out.extend_from_slice(line);
				self.unterminated = true;
			}
		}
	}

	/// Write the insertion lines; the last one gets a newline only when
	/// `terminate_last` is set.
	fn emit_insertion(&mut self, out: &mut Vec<u8>, terminate_last: bool) {
		let lines = self.insertion.lines();
		for (i, line) in lines.iter().enumerate() {
			out.extend_from_slice(line.as_bytes());
			if terminate_last || i + 1 < lines.len() {
				out.push(b'\n');
			}
		}
		self.unterminated = !terminate_last;
	}
}

fn line_text(content: &[u8]) -> Cow<'_, str> {
	String::from_utf8_lossy(content)
}
