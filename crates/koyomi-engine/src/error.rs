//! Engine error types.

use koyomi_ical::ParseError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced while turning a calendar document into an agenda.
///
/// Only structural document damage surfaces as [`MalformedDocument`];
/// per-event problems carry the event identity so callers can report
/// which entry was at fault.
///
/// [`MalformedDocument`]: EngineError::MalformedDocument
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The document's line or component grammar is broken.
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] ParseError),

    /// An event carries a recurrence rule that cannot be interpreted.
    #[error("event {uid}: invalid recurrence rule: {detail}")]
    InvalidRecurrenceRule {
        /// UID of the offending event, or a placeholder if absent.
        uid: String,
        /// What was wrong with the rule.
        detail: String,
    },

    /// An event is missing or damaged beyond use, e.g. no usable DTSTART.
    #[error("event {uid}: {reason}")]
    MalformedEvent {
        /// UID of the offending event, or a placeholder if absent.
        uid: String,
        /// Why the event cannot be used.
        reason: String,
    },

    /// A requested time zone cannot be resolved to a known zone.
    #[error("unresolvable time zone {tzid:?}")]
    UnresolvableZone {
        /// The identifier that failed to resolve.
        tzid: String,
    },
}
