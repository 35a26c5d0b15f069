//! iCalendar RECUR value type (RFC 5545 §3.3.10, §3.8.5.3).

use std::fmt;

use super::{Date, DateTime};

/// Recurrence frequency (RFC 5545 §3.3.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from its two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday with optional occurrence number, used in BYDAY.
///
/// Examples: `MO` (every Monday), `1MO` (first Monday), `-1FR` (last
/// Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL bound of a recurrence rule: either DATE or DATE-TIME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRuleUntil {
    /// Date-only bound (inclusive).
    Date(Date),
    /// Date-time bound (inclusive).
    DateTime(DateTime),
}

impl fmt::Display for RRuleUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Recurrence rule (RFC 5545 §3.3.10, §3.8.5.3).
///
/// Defines how an event repeats. `freq` is required by the grammar but
/// kept optional here so the parser can represent a rule that omitted
/// it; interpretation rejects such rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RRule {
    /// Recurrence frequency.
    pub freq: Option<Frequency>,

    /// Recurrence interval (default 1).
    pub interval: Option<u32>,

    /// End bound (mutually exclusive with `count`).
    pub until: Option<RRuleUntil>,

    /// Number of occurrences (mutually exclusive with `until`).
    pub count: Option<u32>,

    /// Week start day (default Monday).
    pub wkst: Option<Weekday>,

    /// By-day list with optional occurrence numbers.
    pub by_day: Vec<WeekdayNum>,

    /// By-monthday list (-31 to 31, excluding 0).
    pub by_monthday: Vec<i8>,

    /// By-month list (1-12).
    pub by_month: Vec<u8>,

    /// By-setpos list (-366 to 366, excluding 0).
    pub by_setpos: Vec<i16>,
}

impl RRule {
    /// Creates a new empty recurrence rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(freq) = self.freq {
            parts.push(format!("FREQ={freq}"));
        }

        if let Some(interval) = self.interval
            && interval != 1
        {
            parts.push(format!("INTERVAL={interval}"));
        }

        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }

        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }

        if let Some(wkst) = self.wkst {
            parts.push(format!("WKST={wkst}"));
        }

        if !self.by_day.is_empty() {
            let s: Vec<_> = self.by_day.iter().map(ToString::to_string).collect();
            parts.push(format!("BYDAY={}", s.join(",")));
        }

        if !self.by_monthday.is_empty() {
            let s: Vec<_> = self.by_monthday.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTHDAY={}", s.join(",")));
        }

        if !self.by_month.is_empty() {
            let s: Vec<_> = self.by_month.iter().map(ToString::to_string).collect();
            parts.push(format!("BYMONTH={}", s.join(",")));
        }

        if !self.by_setpos.is_empty() {
            let s: Vec<_> = self.by_setpos.iter().map(ToString::to_string).collect();
            parts.push(format!("BYSETPOS={}", s.join(",")));
        }

        write!(f, "{}", parts.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrule_display_basic() {
        let rrule = RRule {
            freq: Some(Frequency::Daily),
            count: Some(10),
            ..RRule::new()
        };
        assert_eq!(rrule.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn rrule_display_weekly_byday() {
        let rrule = RRule {
            freq: Some(Frequency::Weekly),
            by_day: vec![
                WeekdayNum {
                    ordinal: None,
                    weekday: Weekday::Monday,
                },
                WeekdayNum {
                    ordinal: Some(-1),
                    weekday: Weekday::Friday,
                },
            ],
            ..RRule::new()
        };
        assert_eq!(rrule.to_string(), "FREQ=WEEKLY;BYDAY=MO,-1FR");
    }

    #[test]
    fn rrule_display_interval_of_one_is_elided() {
        let rrule = RRule {
            freq: Some(Frequency::Weekly),
            interval: Some(1),
            ..RRule::new()
        };
        assert_eq!(rrule.to_string(), "FREQ=WEEKLY");
    }

    #[test]
    fn weekday_parse() {
        assert_eq!(Weekday::parse("MO"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse("fr"), Some(Weekday::Friday));
        assert_eq!(Weekday::parse("XX"), None);
    }

    #[test]
    fn frequency_parse() {
        assert_eq!(Frequency::parse("DAILY"), Some(Frequency::Daily));
        assert_eq!(Frequency::parse("weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse("INVALID"), None);
    }
}
