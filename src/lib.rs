#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! An in-memory store for INI documents.
//!
//! A [`Document`] holds named sections of string key/value pairs. It is built incrementally by
//! selecting a section and inserting entries into it, which is exactly what [`Parser`] does for
//! each line of INI text:
//!
//! ```
//! use mini::Document;
//!
//! let mut document = Document::new("cfg");
//! document
//!     .select_section("server")?
//!     .insert_entry("host", "localhost")?
//!     .insert_entry("host", "ignored")?;
//!
//! assert_eq!(document.value_of("server", "host"), Some("localhost"));
//! # Ok::<(), mini::DocumentError>(())
//! ```

mod document;
mod error;
mod parser;

pub use document::{Document, Entry, Section};
pub use error::{DocumentError, ParseError, ParseErrorKind};
pub use parser::{Parser, decode};

/// Parse raw file contents into a document called `name`.
pub fn parse(name: impl Into<String>, data: &[u8]) -> Result<Document, ParseError> {
    let text = decode(data);
    Parser::new(&text).into_document(name)
}
