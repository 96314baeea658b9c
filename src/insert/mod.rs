//! Ordered-match line insertion.
//!
//! This module handles:
//! - Line patterns and the ordered criteria they form
//! - The streaming insertion transform
//! - `Read`/`Write` adapters for driving the transform over real I/O

pub mod io;
pub mod pattern;
pub mod transform;

pub use io::{InsertWriter, StreamStats, insert_stream};
pub use pattern::{
	Criteria, END_OF_STREAM, EndOfStream, Insertion, LinePattern, Literal, Placement, Predicate,
	compile_regex,
};
pub use transform::StreamInsert;
