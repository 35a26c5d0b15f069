//! iCalendar parsing error types.
//!
//! Two error families are kept separate on purpose. [`ParseError`] is
//! structural: the document's line or component grammar is broken and
//! parsing cannot continue. [`ValueError`] is local to one property
//! value; the parser reacts to it by keeping the property with its raw
//! text instead of failing the document.

use std::fmt;

/// Result type for structural iCalendar parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error for a structurally malformed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Line number where the error occurred (1-based).
    pub line: usize,
    /// Column number where the error occurred (1-based).
    pub column: usize,
    /// Additional context about the error.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind, self.line, self.column
        )?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kinds of structural parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input is empty or contains no content lines.
    EmptyDocument,
    /// Missing property name.
    MissingPropertyName,
    /// Invalid property name character.
    InvalidPropertyName,
    /// Missing colon separator.
    MissingColon,
    /// Invalid parameter format.
    InvalidParameter,
    /// Unclosed quoted string.
    UnclosedQuote,
    /// The document does not start with BEGIN:VCALENDAR.
    MissingCalendarBegin,
    /// An END line names a different component than the open BEGIN.
    MismatchedEnd,
    /// An END line appeared with no component open.
    UnexpectedEnd,
    /// A component was still open at end of input.
    UnterminatedComponent,
    /// A content line appeared outside any component.
    PropertyOutsideComponent,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "empty document"),
            Self::MissingPropertyName => write!(f, "missing property name"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::MissingColon => write!(f, "missing colon separator"),
            Self::InvalidParameter => write!(f, "invalid parameter format"),
            Self::UnclosedQuote => write!(f, "unclosed quoted string"),
            Self::MissingCalendarBegin => {
                write!(f, "document does not start with BEGIN:VCALENDAR")
            }
            Self::MismatchedEnd => write!(f, "mismatched BEGIN/END"),
            Self::UnexpectedEnd => write!(f, "END without matching BEGIN"),
            Self::UnterminatedComponent => write!(f, "component not terminated by END"),
            Self::PropertyOutsideComponent => {
                write!(f, "content line outside any component")
            }
        }
    }
}

/// Error for a single property value that failed its type's grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// DATE value did not match `YYYYMMDD`.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// TIME value did not match `HHMMSS[Z]`.
    #[error("invalid time: {0:?}")]
    InvalidTime(String),

    /// DATE-TIME value did not match `YYYYMMDDTHHMMSS[Z]`.
    #[error("invalid date-time: {0:?}")]
    InvalidDateTime(String),

    /// DURATION value did not match the RFC 5545 duration grammar.
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    /// RECUR value did not match the RFC 5545 recurrence grammar.
    #[error("invalid recurrence rule: {0}")]
    InvalidRRule(String),

    /// UTC-OFFSET value did not match `[+-]HHMM[SS]`.
    #[error("invalid UTC offset: {0:?}")]
    InvalidUtcOffset(String),

    /// INTEGER value did not parse.
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),
}
