//! Value type parsers for iCalendar (RFC 5545 §3.3).
//!
//! Each parser covers one value grammar and fails with a [`ValueError`]
//! scoped to that value. None of them abort document parsing; the
//! content-line parser decides what a failure means.

use super::error::ValueError;
use crate::core::{
    Date, DateTime, Duration, Frequency, RRule, RRuleUntil, Time, UtcOffset, Weekday, WeekdayNum,
    ZoneRef,
};

fn digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a DATE value: `YYYYMMDD`.
///
/// ## Errors
/// Returns an error if the value is not eight digits or encodes an
/// out-of-range month or day.
pub fn parse_date(s: &str) -> Result<Date, ValueError> {
    let err = || ValueError::InvalidDate(s.to_string());
    if s.len() != 8 || !digits(s) {
        return Err(err());
    }
    let year: u16 = s[..4].parse().map_err(|_| err())?;
    let month: u8 = s[4..6].parse().map_err(|_| err())?;
    let day: u8 = s[6..8].parse().map_err(|_| err())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(err());
    }
    Ok(Date { year, month, day })
}

/// Parses a TIME value: `HHMMSS` with optional `Z` suffix.
///
/// ## Errors
/// Returns an error if the value is not six digits (plus optional `Z`)
/// or encodes an out-of-range component.
pub fn parse_time(s: &str) -> Result<Time, ValueError> {
    let err = || ValueError::InvalidTime(s.to_string());
    let (body, is_utc) = match s.strip_suffix(['Z', 'z']) {
        Some(body) => (body, true),
        None => (s, false),
    };
    if body.len() != 6 || !digits(body) {
        return Err(err());
    }
    let hour: u8 = body[..2].parse().map_err(|_| err())?;
    let minute: u8 = body[2..4].parse().map_err(|_| err())?;
    let second: u8 = body[4..6].parse().map_err(|_| err())?;
    // Second 60 is allowed for leap seconds
    if hour > 23 || minute > 59 || second > 60 {
        return Err(err());
    }
    Ok(Time {
        hour,
        minute,
        second,
        is_utc,
    })
}

/// Parses a DATE-TIME value: `YYYYMMDDTHHMMSS` with optional `Z` suffix.
///
/// The result is floating or UTC; a TZID parameter is applied by the
/// caller, which knows the property's parameters.
///
/// ## Errors
/// Returns an error if the value does not match the grammar.
pub fn parse_datetime(s: &str) -> Result<DateTime, ValueError> {
    let err = || ValueError::InvalidDateTime(s.to_string());
    let (date_part, time_part) = s.split_once(['T', 't']).ok_or_else(err)?;
    let date = parse_date(date_part).map_err(|_| err())?;
    let time = parse_time(time_part).map_err(|_| err())?;
    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour: time.hour,
        minute: time.minute,
        second: time.second,
        zone: if time.is_utc {
            ZoneRef::Utc
        } else {
            ZoneRef::Floating
        },
    })
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Accepts `[+/-]P[nW]` or `[+/-]P[nD][T[nH][nM][nS]]`. Year and month
/// designators do not exist in iCalendar durations.
///
/// ## Errors
/// Returns an error if the value does not match the grammar or carries
/// no designator at all.
pub fn parse_duration(s: &str) -> Result<Duration, ValueError> {
    let err = || ValueError::InvalidDuration(s.to_string());

    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let rest = rest.strip_prefix(['P', 'p']).ok_or_else(err)?;

    let mut duration = Duration {
        negative,
        ..Duration::zero()
    };
    let mut in_time = false;
    let mut saw_designator = false;
    let mut number = String::new();

    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' | 't' => {
                if in_time || !number.is_empty() {
                    return Err(err());
                }
                in_time = true;
            }
            _ => {
                let n: u32 = number.parse().map_err(|_| err())?;
                number.clear();
                match (c.to_ascii_uppercase(), in_time) {
                    ('W', false) => duration.weeks = n,
                    ('D', false) => duration.days = n,
                    ('H', true) => duration.hours = n,
                    ('M', true) => duration.minutes = n,
                    ('S', true) => duration.seconds = n,
                    _ => return Err(err()),
                }
                saw_designator = true;
            }
        }
    }

    if !number.is_empty() || !saw_designator {
        return Err(err());
    }
    Ok(duration)
}

/// Parses a UTC-OFFSET value: `[+-]HHMM` with optional seconds.
///
/// ## Errors
/// Returns an error if the value does not match the grammar.
pub fn parse_utc_offset(s: &str) -> Result<UtcOffset, ValueError> {
    let err = || ValueError::InvalidUtcOffset(s.to_string());

    let (negative, body) = match s.as_bytes().first() {
        Some(b'+') => (false, &s[1..]),
        Some(b'-') => (true, &s[1..]),
        _ => return Err(err()),
    };
    if !matches!(body.len(), 4 | 6) || !digits(body) {
        return Err(err());
    }
    let hours: u8 = body[..2].parse().map_err(|_| err())?;
    let minutes: u8 = body[2..4].parse().map_err(|_| err())?;
    let seconds: u8 = if body.len() == 6 {
        body[4..6].parse().map_err(|_| err())?
    } else {
        0
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(err());
    }
    // -0000 is forbidden by the grammar
    if negative && hours == 0 && minutes == 0 && seconds == 0 {
        return Err(err());
    }
    Ok(UtcOffset {
        negative,
        hours,
        minutes,
        seconds,
    })
}

/// Parses an INTEGER value.
///
/// ## Errors
/// Returns an error if the value is not a decimal integer.
pub fn parse_integer(s: &str) -> Result<i64, ValueError> {
    s.parse()
        .map_err(|_| ValueError::InvalidInteger(s.to_string()))
}

/// Resolves TEXT escapes (RFC 5545 §3.3.11): `\\n`/`\\N` become a
/// newline, `\\,` `\\;` `\\\\` become the literal character. Unknown
/// escapes keep the backslash.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(escaped @ (',' | ';' | '\\')) => result.push(escaped),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Parses a RECUR value (RFC 5545 §3.3.10): semicolon-separated
/// `KEY=VALUE` parts.
///
/// ## Errors
/// Returns an error if a part is malformed, a known key carries an
/// invalid value, FREQ is missing, or both UNTIL and COUNT are present.
/// Unknown keys are ignored.
pub fn parse_rrule(s: &str) -> Result<RRule, ValueError> {
    let mut rrule = RRule::new();

    for part in s.split(';') {
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            return Err(ValueError::InvalidRRule(format!(
                "part {part:?} is not KEY=VALUE"
            )));
        };

        match key.to_ascii_uppercase().as_str() {
            "FREQ" => {
                rrule.freq = Some(Frequency::parse(value).ok_or_else(|| {
                    ValueError::InvalidRRule(format!("unknown frequency {value:?}"))
                })?);
            }
            "INTERVAL" => {
                let interval: u32 = value.parse().map_err(|_| {
                    ValueError::InvalidRRule(format!("invalid INTERVAL {value:?}"))
                })?;
                if interval == 0 {
                    return Err(ValueError::InvalidRRule("INTERVAL must be positive".into()));
                }
                rrule.interval = Some(interval);
            }
            "COUNT" => {
                rrule.count = Some(value.parse().map_err(|_| {
                    ValueError::InvalidRRule(format!("invalid COUNT {value:?}"))
                })?);
            }
            "UNTIL" => {
                let until = if value.len() == 8 {
                    RRuleUntil::Date(parse_date(value).map_err(|_| {
                        ValueError::InvalidRRule(format!("invalid UNTIL {value:?}"))
                    })?)
                } else {
                    RRuleUntil::DateTime(parse_datetime(value).map_err(|_| {
                        ValueError::InvalidRRule(format!("invalid UNTIL {value:?}"))
                    })?)
                };
                rrule.until = Some(until);
            }
            "WKST" => {
                rrule.wkst = Some(Weekday::parse(value).ok_or_else(|| {
                    ValueError::InvalidRRule(format!("unknown weekday {value:?}"))
                })?);
            }
            "BYDAY" => {
                for item in value.split(',') {
                    rrule.by_day.push(parse_weekday_num(item)?);
                }
            }
            "BYMONTHDAY" => {
                for item in value.split(',') {
                    let n: i8 = item.parse().map_err(|_| {
                        ValueError::InvalidRRule(format!("invalid BYMONTHDAY {item:?}"))
                    })?;
                    if n == 0 || !(-31..=31).contains(&n) {
                        return Err(ValueError::InvalidRRule(format!(
                            "BYMONTHDAY {n} out of range"
                        )));
                    }
                    rrule.by_monthday.push(n);
                }
            }
            "BYMONTH" => {
                for item in value.split(',') {
                    let n: u8 = item.parse().map_err(|_| {
                        ValueError::InvalidRRule(format!("invalid BYMONTH {item:?}"))
                    })?;
                    if !(1..=12).contains(&n) {
                        return Err(ValueError::InvalidRRule(format!("BYMONTH {n} out of range")));
                    }
                    rrule.by_month.push(n);
                }
            }
            "BYSETPOS" => {
                for item in value.split(',') {
                    let n: i16 = item.parse().map_err(|_| {
                        ValueError::InvalidRRule(format!("invalid BYSETPOS {item:?}"))
                    })?;
                    if n == 0 || !(-366..=366).contains(&n) {
                        return Err(ValueError::InvalidRRule(format!(
                            "BYSETPOS {n} out of range"
                        )));
                    }
                    rrule.by_setpos.push(n);
                }
            }
            // BYHOUR, BYMINUTE and friends are valid RECUR keys this
            // library does not interpret; skip rather than reject.
            _ => {}
        }
    }

    if rrule.freq.is_none() {
        return Err(ValueError::InvalidRRule("missing FREQ".into()));
    }
    if rrule.until.is_some() && rrule.count.is_some() {
        return Err(ValueError::InvalidRRule(
            "UNTIL and COUNT are mutually exclusive".into(),
        ));
    }

    Ok(rrule)
}

fn parse_weekday_num(s: &str) -> Result<WeekdayNum, ValueError> {
    let err = || ValueError::InvalidRRule(format!("invalid BYDAY entry {s:?}"));
    if s.len() < 2 {
        return Err(err());
    }
    let (ordinal_part, day_part) = s.split_at(s.len() - 2);
    let weekday = Weekday::parse(day_part).ok_or_else(err)?;
    let ordinal = if ordinal_part.is_empty() {
        None
    } else {
        let n: i8 = ordinal_part.parse().map_err(|_| err())?;
        if n == 0 || !(-53..=53).contains(&n) {
            return Err(err());
        }
        Some(n)
    };
    Ok(WeekdayNum { ordinal, weekday })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_valid() {
        let date = parse_date("20240123").unwrap();
        assert_eq!((date.year, date.month, date.day), (2024, 1, 23));
    }

    #[test]
    fn date_invalid() {
        assert!(parse_date("2024012").is_err());
        assert!(parse_date("20241323").is_err());
        assert!(parse_date("2024-01-23").is_err());
    }

    #[test]
    fn datetime_utc_and_floating() {
        let utc = parse_datetime("20240123T120000Z").unwrap();
        assert!(utc.is_utc());
        assert_eq!(utc.hour, 12);

        let floating = parse_datetime("20240123T120000").unwrap();
        assert!(floating.is_floating());
    }

    #[test]
    fn datetime_invalid() {
        assert!(parse_datetime("20240123").is_err());
        assert!(parse_datetime("20240123T250000").is_err());
        assert!(parse_datetime("20240123 120000").is_err());
    }

    #[test]
    fn duration_forms() {
        assert_eq!(parse_duration("PT1H").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("P2W").unwrap().weeks, 2);
        let dt = parse_duration("P1DT2H30M").unwrap();
        assert_eq!((dt.days, dt.hours, dt.minutes), (1, 2, 30));
        assert!(parse_duration("-PT15M").unwrap().negative);
    }

    #[test]
    fn duration_invalid() {
        assert!(parse_duration("P").is_err());
        assert!(parse_duration("PT").is_err());
        assert!(parse_duration("1H").is_err());
        assert!(parse_duration("P1H").is_err());
        assert!(parse_duration("PT1").is_err());
    }

    #[test]
    fn utc_offset_forms() {
        assert_eq!(parse_utc_offset("+0100").unwrap().total_seconds(), 3600);
        assert_eq!(parse_utc_offset("-0500").unwrap().total_seconds(), -18_000);
        assert_eq!(parse_utc_offset("+001932").unwrap().total_seconds(), 1172);
    }

    #[test]
    fn utc_offset_invalid() {
        assert!(parse_utc_offset("0100").is_err());
        assert!(parse_utc_offset("-0000").is_err());
        assert!(parse_utc_offset("+25000").is_err());
    }

    #[test]
    fn text_unescaping() {
        assert_eq!(unescape_text(r"line1\nline2"), "line1\nline2");
        assert_eq!(unescape_text(r"a\, b\; c\\d"), r"a, b; c\d");
        assert_eq!(unescape_text(r"odd\x"), r"odd\x");
    }

    #[test]
    fn rrule_basic() {
        let rrule = parse_rrule("FREQ=DAILY;COUNT=5").unwrap();
        assert_eq!(rrule.freq, Some(Frequency::Daily));
        assert_eq!(rrule.count, Some(5));
    }

    #[test]
    fn rrule_byday_ordinals() {
        let rrule = parse_rrule("FREQ=MONTHLY;BYDAY=2SU,-1FR").unwrap();
        assert_eq!(rrule.by_day.len(), 2);
        assert_eq!(rrule.by_day[0].ordinal, Some(2));
        assert_eq!(rrule.by_day[0].weekday, Weekday::Sunday);
        assert_eq!(rrule.by_day[1].ordinal, Some(-1));
    }

    #[test]
    fn rrule_until_date_and_datetime() {
        let rrule = parse_rrule("FREQ=WEEKLY;UNTIL=20240601").unwrap();
        assert!(matches!(rrule.until, Some(RRuleUntil::Date(_))));

        let rrule = parse_rrule("FREQ=WEEKLY;UNTIL=20240601T000000Z").unwrap();
        assert!(matches!(rrule.until, Some(RRuleUntil::DateTime(_))));
    }

    #[test]
    fn rrule_rejects_missing_freq() {
        assert!(parse_rrule("COUNT=5").is_err());
    }

    #[test]
    fn rrule_rejects_until_count_conflict() {
        assert!(parse_rrule("FREQ=DAILY;UNTIL=20240601;COUNT=5").is_err());
    }

    #[test]
    fn rrule_rejects_garbage() {
        assert!(parse_rrule("FREQ=SOMETIMES").is_err());
        assert!(parse_rrule("FREQ=DAILY;INTERVAL=0").is_err());
        assert!(parse_rrule("notakeyvalue").is_err());
    }

    #[test]
    fn rrule_ignores_unknown_keys() {
        let rrule = parse_rrule("FREQ=DAILY;BYHOUR=9;X-CUSTOM=1").unwrap();
        assert_eq!(rrule.freq, Some(Frequency::Daily));
    }
}
