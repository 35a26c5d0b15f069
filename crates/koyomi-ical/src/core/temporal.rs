//! iCalendar DATE, TIME, and DATE-TIME value types (RFC 5545 §3.3.4, §3.3.5, §3.3.12).

use std::fmt;

/// DATE value (RFC 5545 §3.3.4).
///
/// A calendar date without a time component. In iCalendar this marks an
/// all-day value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// Year (e.g., 2024).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    /// Creates a new date.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// TIME value (RFC 5545 §3.3.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-60, allowing for leap seconds).
    pub second: u8,
    /// Whether this time carries the UTC designator (`Z` suffix).
    pub is_utc: bool,
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}", self.hour, self.minute, self.second)?;
        if self.is_utc {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// Zone reference of a DATE-TIME value (RFC 5545 §3.3.5).
///
/// iCalendar DATE-TIME values come in three mutually exclusive forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRef {
    /// Floating time: same wall-clock time wherever it is displayed.
    ///
    /// Example: `19980118T230000`
    Floating,

    /// UTC time: an absolute instant, indicated by the `Z` suffix.
    ///
    /// Example: `19980119T070000Z`
    Utc,

    /// Local time in a named zone, referenced by the TZID parameter.
    ///
    /// Example: `TZID=America/New_York:19980119T020000`
    Named {
        /// The zone identifier exactly as declared.
        tzid: String,
    },
}

/// DATE-TIME value (RFC 5545 §3.3.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    /// Year (e.g., 2024).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-60, allowing for leap seconds).
    pub second: u8,
    /// The zone reference (floating, UTC, or named).
    pub zone: ZoneRef,
}

impl DateTime {
    /// Creates a floating DATE-TIME.
    #[must_use]
    pub fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            zone: ZoneRef::Floating,
        }
    }

    /// Creates a UTC DATE-TIME.
    #[must_use]
    pub fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            zone: ZoneRef::Utc,
        }
    }

    /// Creates a DATE-TIME in a named zone.
    #[must_use]
    pub fn named(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        tzid: impl Into<String>,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            zone: ZoneRef::Named { tzid: tzid.into() },
        }
    }

    /// Returns whether this value is in UTC.
    #[must_use]
    pub fn is_utc(&self) -> bool {
        matches!(self.zone, ZoneRef::Utc)
    }

    /// Returns whether this value is floating.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self.zone, ZoneRef::Floating)
    }

    /// Returns the zone identifier if this value references a named zone.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.zone {
            ZoneRef::Named { tzid } => Some(tzid),
            _ => None,
        }
    }

    /// Returns the date part of this value.
    #[must_use]
    pub const fn date(&self) -> Date {
        Date {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// A date or date-time value as it appears in the source document.
///
/// Distinguishes date-only (all-day) values from date-time values. The
/// date-only flag is carried here, never inferred from a missing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Temporal {
    /// A date-only (all-day) value.
    Date(Date),
    /// A date-time value, with its zone reference.
    DateTime(DateTime),
}

impl Temporal {
    /// Returns whether this is a date-only (all-day) value.
    #[must_use]
    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the zone identifier of a named-zone date-time, if any.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => dt.tzid(),
        }
    }

    /// Returns the calendar date of this value.
    #[must_use]
    pub const fn date(&self) -> Date {
        match self {
            Self::Date(d) => *d,
            Self::DateTime(dt) => dt.date(),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_display() {
        assert_eq!(Date::new(2024, 1, 23).to_string(), "20240123");
    }

    #[test]
    fn datetime_display() {
        let dt = DateTime::utc(2024, 1, 23, 12, 0, 0);
        assert_eq!(dt.to_string(), "20240123T120000Z");

        let dt = DateTime::floating(2024, 1, 23, 12, 0, 0);
        assert_eq!(dt.to_string(), "20240123T120000");
    }

    #[test]
    fn temporal_zone_accessors() {
        let all_day = Temporal::Date(Date::new(2024, 1, 1));
        assert!(all_day.is_date_only());
        assert_eq!(all_day.tzid(), None);

        let zoned = Temporal::DateTime(DateTime::named(2024, 1, 1, 9, 0, 0, "Europe/Paris"));
        assert!(!zoned.is_date_only());
        assert_eq!(zoned.tzid(), Some("Europe/Paris"));
    }
}
