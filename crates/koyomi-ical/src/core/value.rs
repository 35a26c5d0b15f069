//! iCalendar property value representation.

use std::fmt;

use super::{Date, DateTime, Duration, RRule};

/// UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Used by TZOFFSETFROM and TZOFFSETTO inside VTIMEZONE observances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    /// Whether the offset is west of UTC.
    pub negative: bool,
    /// Hours component (0-23).
    pub hours: u8,
    /// Minutes component (0-59).
    pub minutes: u8,
    /// Seconds component (0-59), rarely used.
    pub seconds: u8,
}

impl UtcOffset {
    /// Returns the offset in seconds east of UTC. Offsets west of UTC
    /// are negative.
    #[must_use]
    pub fn total_seconds(&self) -> i32 {
        let magnitude = i32::from(self.hours) * 3600
            + i32::from(self.minutes) * 60
            + i32::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{:02}",
            if self.negative { "-" } else { "+" },
            self.hours,
            self.minutes
        )?;
        if self.seconds > 0 {
            write!(f, "{:02}", self.seconds)?;
        }
        Ok(())
    }
}

/// A typed iCalendar property value.
///
/// The parser interprets values according to the property name and the
/// VALUE parameter. When a value fails its type's grammar, the property
/// is kept with [`Value::Unknown`] holding the raw text rather than
/// failing the whole document; consumers that need the typed form decide
/// how to react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// DATE value.
    Date(Date),
    /// Multiple DATE values (comma-separated, e.g. all-day EXDATE).
    DateList(Vec<Date>),
    /// DATE-TIME value.
    DateTime(DateTime),
    /// Multiple DATE-TIME values (comma-separated, e.g. EXDATE, RDATE).
    DateTimeList(Vec<DateTime>),
    /// DURATION value.
    Duration(Duration),
    /// INTEGER value.
    Integer(i64),
    /// RECUR value.
    Recur(RRule),
    /// TEXT value, with escapes already resolved.
    Text(String),
    /// UTC-OFFSET value.
    UtcOffset(UtcOffset),
    /// Raw text of a value that did not match its expected grammar, or
    /// whose property has no registered type.
    Unknown(String),
}

impl Value {
    /// Returns the text content, if this is a TEXT value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the recurrence rule, if this is a RECUR value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(rrule) => Some(rrule),
            _ => None,
        }
    }
}
