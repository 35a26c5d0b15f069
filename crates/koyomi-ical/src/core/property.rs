//! iCalendar content line and property types (RFC 5545 §3.1).

use std::fmt;

use super::{Duration, Parameter, RRule, Temporal, Value};

/// A raw content line after unfolding and splitting.
///
/// This is the lexer's output: the property name, its parameters, and
/// the still-uninterpreted value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Property parameters, in declaration order.
    pub parameters: Vec<Parameter>,
    /// Raw value text, exactly as written after the `:` separator.
    pub raw_value: String,
    /// One-based line number of the (unfolded) line in the source.
    pub line: usize,
}

/// A parsed iCalendar property.
///
/// Carries both the typed value and the raw source text. The raw text is
/// what the producer wrote; `value` is the parser's interpretation of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Property parameters, in declaration order.
    pub parameters: Vec<Parameter>,
    /// The interpreted value.
    pub value: Value,
    /// Raw value text as it appeared in the source.
    pub raw_value: String,
}

impl Property {
    /// Returns the first parameter with the given name, if present.
    /// Parameter names are matched case-insensitively.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the TZID parameter value, if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.parameter("TZID").and_then(Parameter::value)
    }

    /// Returns the value as a date or date-time, if it is one.
    #[must_use]
    pub fn as_temporal(&self) -> Option<Temporal> {
        match &self.value {
            Value::Date(d) => Some(Temporal::Date(*d)),
            Value::DateTime(dt) => Some(Temporal::DateTime(dt.clone())),
            _ => None,
        }
    }

    /// Returns every date or date-time the value holds, flattening
    /// single values and lists. Used for EXDATE and RDATE, which may
    /// carry comma-separated lists and repeat across properties.
    #[must_use]
    pub fn as_temporals(&self) -> Vec<Temporal> {
        match &self.value {
            Value::Date(d) => vec![Temporal::Date(*d)],
            Value::DateTime(dt) => vec![Temporal::DateTime(dt.clone())],
            Value::DateList(dates) => dates.iter().copied().map(Temporal::Date).collect(),
            Value::DateTimeList(dts) => dts.iter().cloned().map(Temporal::DateTime).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the text content, if this is a TEXT value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    /// Returns the duration, if this is a DURATION value.
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match &self.value {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the recurrence rule, if this is a RECUR value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        self.value.as_recur()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for param in &self.parameters {
            write!(f, ";{param}")?;
        }
        write!(f, ":{}", self.raw_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Date, DateTime};

    fn property(name: &str, value: Value, raw: &str) -> Property {
        Property {
            name: name.to_owned(),
            parameters: Vec::new(),
            value,
            raw_value: raw.to_owned(),
        }
    }

    #[test]
    fn as_temporal_on_date_value() {
        let prop = property("DTSTART", Value::Date(Date::new(2024, 3, 1)), "20240301");
        let temporal = prop.as_temporal().unwrap();
        assert!(temporal.is_date_only());
    }

    #[test]
    fn as_temporals_flattens_lists() {
        let prop = property(
            "EXDATE",
            Value::DateTimeList(vec![
                DateTime::utc(2024, 3, 1, 9, 0, 0),
                DateTime::utc(2024, 3, 8, 9, 0, 0),
            ]),
            "20240301T090000Z,20240308T090000Z",
        );
        assert_eq!(prop.as_temporals().len(), 2);
    }

    #[test]
    fn as_temporal_rejects_text() {
        let prop = property("SUMMARY", Value::Text("Standup".into()), "Standup");
        assert!(prop.as_temporal().is_none());
        assert_eq!(prop.as_text(), Some("Standup"));
    }

    #[test]
    fn tzid_parameter_lookup() {
        let prop = Property {
            name: "DTSTART".into(),
            parameters: vec![Parameter::tzid("America/New_York")],
            value: Value::DateTime(DateTime::named(2024, 1, 23, 12, 0, 0, "America/New_York")),
            raw_value: "20240123T120000".into(),
        };
        assert_eq!(prop.tzid(), Some("America/New_York"));
    }

    #[test]
    fn display_round_trips_raw_value() {
        let prop = Property {
            name: "DTSTART".into(),
            parameters: vec![Parameter::tzid("Europe/Paris")],
            value: Value::DateTime(DateTime::named(2024, 1, 23, 12, 0, 0, "Europe/Paris")),
            raw_value: "20240123T120000".into(),
        };
        assert_eq!(prop.to_string(), "DTSTART;TZID=Europe/Paris:20240123T120000");
    }
}
