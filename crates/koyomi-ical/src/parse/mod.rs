//! iCalendar parsing (RFC 5545 §3.1, §3.4).
//!
//! [`parse`] turns a document into a [`crate::core::CalendarDocument`].
//! The lexer and value parsers are exposed for callers that work below
//! the document level.

mod error;
pub mod lexer;
mod parser;
pub mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult, ValueError};
pub use parser::parse;
