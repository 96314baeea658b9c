use crate::insert::transform::StreamInsert;
use std::io::{self, ErrorKind, Read, Write};
use tracing::debug;

const CHUNK_SIZE: usize = 8 * 1024;

/// Byte counts for one pass through the transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
	pub bytes_read: u64,
	pub bytes_written: u64,
}

impl StreamStats {
	/// Whether the transform added anything to the stream.
	pub fn inserted(&self) -> bool {
		self.bytes_written > self.bytes_read
	}
}

/// A `Write` filter that runs everything written through a `StreamInsert`
/// before passing it to the wrapped sink.
///
/// Call `finish` once the input is complete. Dropping the writer without
/// finishing discards any buffered partial line and emits nothing more.
pub struct InsertWriter<W: Write> {
	inner: W,
	transform: StreamInsert,
	scratch: Vec<u8>,
	bytes_written: u64,
}

impl<W: Write> InsertWriter<W> {
	pub fn new(inner: W, transform: StreamInsert) -> Self {
		InsertWriter {
			inner,
			transform,
			scratch: Vec::with_capacity(CHUNK_SIZE),
			bytes_written: 0,
		}
	}

	pub fn get_ref(&self) -> &W {
		&self.inner
	}

	/// Bytes handed to the wrapped sink so far.
	pub fn bytes_written(&self) -> u64 {
		self.bytes_written
	}

	/// End the stream: emit the final line and any end-of-stream insertion,
	/// flush, and return the wrapped sink.
	pub fn finish(mut self) -> io::Result<W> {
		self.end()?;
		Ok(self.inner)
	}

	fn end(&mut self) -> io::Result<()> {
		self.scratch.clear();
		self.transform.finish(&mut self.scratch);
		self.write_scratch()?;
		self.inner.flush()
	}

	fn write_scratch(&mut self) -> io::Result<()> {
		if self.scratch.is_empty() {
			return Ok(());
		}
		self.inner.write_all(&self.scratch)?;
		self.bytes_written += self.scratch.len() as u64;
		Ok(())
	}
}

impl<W: Write> Write for InsertWriter<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.scratch.clear();
		self.transform.push(buf, &mut self.scratch);
		self.write_scratch()?;
		Ok(buf.len())
	}

	/// Flushes the sink only; a buffered partial line stays buffered until
	/// more input or `finish` arrives.
	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

/// Copy `reader` into `writer` through the transform.
///
/// I/O errors on either side abort the pass immediately.
pub fn insert_stream<R, W>(mut reader: R, writer: W, transform: StreamInsert) -> io::Result<StreamStats>
where
	R: Read,
	W: Write,
{
	let mut filter = InsertWriter::new(writer, transform);
	let mut buf = [0u8; CHUNK_SIZE];
	let mut bytes_read = 0u64;

	loop {
		let n = match reader.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) if e.kind() == ErrorKind::Interrupted => continue,
			Err(e) => return Err(e),
		};
		bytes_read += n as u64;
		filter.write_all(&buf[..n])?;
	}

	filter.end()?;

	let stats = StreamStats {
		bytes_read,
		bytes_written: filter.bytes_written(),
	};
	debug!(?stats, "stream complete");
	Ok(stats)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::insert::pattern::{EndOfStream, Placement, compile_regex};

	fn transform(pattern: &str, placement: Placement) -> StreamInsert {
		StreamInsert::new("Appended line", compile_regex(pattern).unwrap(), placement).unwrap()
	}

	/// Reader that yields one byte per call, interleaved with interruptions.
	struct Trickle<'a> {
		data: &'a [u8],
		interrupt: bool,
	}

	impl Read for Trickle<'_> {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			self.interrupt = !self.interrupt;
			if self.interrupt {
				return Err(io::Error::from(ErrorKind::Interrupted));
			}
			match self.data.split_first() {
				Some((&b, rest)) if !buf.is_empty() => {
					buf[0] = b;
					self.data = rest;
					Ok(1)
				}
				_ => Ok(0),
			}
		}
	}

	struct FailingReader;

	impl Read for FailingReader {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::other("disk gone"))
		}
	}

	struct FailingWriter;

	impl Write for FailingWriter {
		fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
			Err(io::Error::new(ErrorKind::BrokenPipe, "closed"))
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn test_insert_stream_reports_stats() {
		let input = b"Line 1\nLine 2\nLine 3";
		let mut out = Vec::new();
		let stats =
			insert_stream(&input[..], &mut out, transform("^Line 2$", Placement::Append)).unwrap();

		assert_eq!(out, b"Line 1\nLine 2\nAppended line\nLine 3");
		assert_eq!(stats.bytes_read, input.len() as u64);
		assert_eq!(stats.bytes_written, out.len() as u64);
		assert!(stats.inserted());
	}

	#[test]
	fn test_insert_stream_no_match_is_not_an_error() {
		let input = b"Line 1\nLine 2\n";
		let mut out = Vec::new();
		let stats =
			insert_stream(&input[..], &mut out, transform("^nope$", Placement::Append)).unwrap();

		assert_eq!(out, input);
		assert!(!stats.inserted());
	}

	#[test]
	fn test_insert_stream_handles_interrupted_single_byte_reads() {
		let reader = Trickle {
			data: b"Line 1\nLine 2\nLine 3",
			interrupt: false,
		};
		let mut out = Vec::new();
		insert_stream(reader, &mut out, transform("^Line 2$", Placement::Prepend)).unwrap();
		assert_eq!(out, b"Line 1\nAppended line\nLine 2\nLine 3");
	}

	#[test]
	fn test_insert_stream_propagates_read_error() {
		let mut out = Vec::new();
		let err = insert_stream(FailingReader, &mut out, transform("x", Placement::Append))
			.unwrap_err();
		assert_eq!(err.to_string(), "disk gone");
		assert!(out.is_empty());
	}

	#[test]
	fn test_insert_stream_propagates_write_error() {
		let input = b"Line 1\nLine 2\n";
		let err = insert_stream(&input[..], FailingWriter, transform("x", Placement::Append))
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::BrokenPipe);
	}

	#[test]
	fn test_writer_in_pipeline() {
		let insert = StreamInsert::new("Appended line", EndOfStream, Placement::Append).unwrap();
		let mut writer = InsertWriter::new(Vec::new(), insert);

		io::copy(&mut &b"Line 1\n"[..], &mut writer).unwrap();
		writer.write_all(b"Line 2\n").unwrap();
		writer.flush().unwrap();
		assert_eq!(writer.get_ref(), b"Line 1\nLine 2\n");

		let out = writer.finish().unwrap();
		assert_eq!(out, b"Line 1\nLine 2\nAppended line\n");
	}

	#[test]
	fn test_dropped_writer_emits_nothing_more() {
		let mut sink = Vec::new();
		{
			let insert = StreamInsert::new("Appended line", EndOfStream, Placement::Append).unwrap();
			let mut writer = InsertWriter::new(&mut sink, insert);
			writer.write_all(b"Line 1\nLine").unwrap();
			assert_eq!(writer.bytes_written(), 7);
		}
		assert_eq!(sink, b"Line 1\n");
	}
}
