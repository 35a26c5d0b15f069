//! iCalendar DURATION value type (RFC 5545 §3.3.6).

use std::fmt;

/// Duration value (RFC 5545 §3.3.6).
///
/// Either week-based (`P2W`) or day/time-based (`P1DT2H30M`). iCalendar
/// durations have no year or month designators because months have
/// variable lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    /// Whether this duration is negative.
    pub negative: bool,
    /// Number of weeks (mutually exclusive with the other components).
    pub weeks: u32,
    /// Number of days.
    pub days: u32,
    /// Number of hours.
    pub hours: u32,
    /// Number of minutes.
    pub minutes: u32,
    /// Number of seconds.
    pub seconds: u32,
}

impl Duration {
    /// Creates a zero duration.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// Creates a duration from days.
    #[must_use]
    pub const fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::zero()
        }
    }

    /// Creates a duration from hours.
    #[must_use]
    pub const fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::zero()
        }
    }

    /// Returns the total length in seconds, sign included.
    #[must_use]
    pub fn total_seconds(&self) -> i64 {
        let magnitude = i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.weeks > 0 {
            return write!(f, "{}W", self.weeks);
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        } else if self.days == 0 {
            // Zero duration still needs a designator
            write!(f, "T0S")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_display() {
        assert_eq!(Duration::hours(8).to_string(), "PT8H");
        assert_eq!(
            Duration {
                days: 1,
                hours: 2,
                minutes: 30,
                ..Duration::zero()
            }
            .to_string(),
            "P1DT2H30M"
        );
        assert_eq!(
            Duration {
                weeks: 2,
                ..Duration::zero()
            }
            .to_string(),
            "P2W"
        );
        assert_eq!(Duration::zero().to_string(), "PT0S");
    }

    #[test]
    fn duration_total_seconds() {
        assert_eq!(Duration::hours(1).total_seconds(), 3600);
        let negative = Duration {
            negative: true,
            minutes: 15,
            ..Duration::zero()
        };
        assert_eq!(negative.total_seconds(), -900);
    }
}
