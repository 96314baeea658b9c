//! chlg - CLI tool for inserting entries into changelogs.
//!
//! This library provides the core functionality for chlg, including:
//! - A streaming transform that inserts lines wherever an ordered sequence of
//!   patterns is matched
//! - `Read`/`Write` adapters for running the transform over real I/O
//! - Configuration file parsing and cascade discovery
//! - Changelog entry insertion built on the transform
//!
//! # Example
//!
//! ```
//! use chlg_cli::insert::{Placement, StreamInsert, compile_regex, insert_stream};
//!
//! let input = "Line 1\nLine 2\nLine 3\n";
//! let criteria = compile_regex("^Line 2$").unwrap();
//! let transform = StreamInsert::new("Appended line", criteria, Placement::Append).unwrap();
//!
//! let mut output = Vec::new();
//! insert_stream(input.as_bytes(), &mut output, transform).unwrap();
//!
//! assert_eq!(output, b"Line 1\nLine 2\nAppended line\nLine 3\n");
//! ```

pub mod changelog;
pub mod config;
pub mod error;
pub mod insert;

pub use error::{ChlgError, Result};
