//! iCalendar (RFC 5545) document parsing.
//!
//! This crate turns raw ICS text into a structural component/property tree
//! with typed values. It performs no semantic interpretation: time zone
//! resolution and recurrence expansion live in `koyomi-engine`.
//!
//! - `core`: type definitions for components, properties, and values
//! - `parse`: the content-line lexer and document parser
//!
//! ## Example
//!
//! ```rust
//! use koyomi_ical::parse;
//!
//! let input = "\
//! BEGIN:VCALENDAR\r\n\
//! VERSION:2.0\r\n\
//! BEGIN:VEVENT\r\n\
//! UID:demo@example.com\r\n\
//! DTSTART:20240101T090000Z\r\n\
//! SUMMARY:New year planning\r\n\
//! END:VEVENT\r\n\
//! END:VCALENDAR\r\n";
//!
//! let doc = parse(input).unwrap();
//! assert_eq!(doc.events().count(), 1);
//! ```

pub mod core;
pub mod parse;

pub use core::{CalendarDocument, Component, ComponentKind, Parameter, Property};
pub use parse::{ParseError, ParseResult, parse};
