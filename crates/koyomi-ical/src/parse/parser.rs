//! iCalendar document parser (RFC 5545 §3.4, §3.6).
//!
//! Builds the component tree from content lines. Only structural
//! problems fail the parse: broken line grammar, unbalanced BEGIN/END,
//! or a document that is not a VCALENDAR. A property value that fails
//! its type's grammar is kept as [`Value::Unknown`] with the raw text,
//! so one bad value never discards the rest of the document.

use tracing::debug;

use super::error::{ParseError, ParseErrorKind, ParseResult, ValueError};
use super::lexer::{parse_content_line, split_lines};
use super::values;
use crate::core::{
    CalendarDocument, Component, ContentLine, Date, DateTime, Parameter, Property, Value, ZoneRef,
};

/// Properties whose value is TEXT and should have escapes resolved.
const TEXT_PROPERTIES: &[&str] = &[
    "CALSCALE",
    "CATEGORIES",
    "CLASS",
    "COMMENT",
    "DESCRIPTION",
    "LOCATION",
    "METHOD",
    "PRODID",
    "STATUS",
    "SUMMARY",
    "TRANSP",
    "TZID",
    "TZNAME",
    "UID",
    "VERSION",
];

/// Parses an iCalendar document into its component tree.
///
/// ## Errors
/// Returns a [`ParseError`] if the input is empty, a content line is
/// malformed, BEGIN/END markers are unbalanced, or the root component
/// is not a VCALENDAR.
pub fn parse(input: &str) -> ParseResult<CalendarDocument> {
    let lines = split_lines(input);
    if lines.is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyDocument, 1, 1));
    }

    let mut stack: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;

    for (line_num, line) in &lines {
        let content = parse_content_line(line, *line_num)?;

        match content.name.as_str() {
            "BEGIN" => {
                let name = content.raw_value.trim();
                if stack.is_empty() {
                    if root.is_some() {
                        return Err(ParseError::new(
                            ParseErrorKind::PropertyOutsideComponent,
                            *line_num,
                            1,
                        )
                        .with_context("content after the VCALENDAR ended"));
                    }
                    if !name.eq_ignore_ascii_case("VCALENDAR") {
                        return Err(ParseError::new(
                            ParseErrorKind::MissingCalendarBegin,
                            *line_num,
                            1,
                        )
                        .with_context(format!("found BEGIN:{name}")));
                    }
                }
                stack.push(Component::new(name));
            }
            "END" => {
                let name = content.raw_value.trim();
                let Some(component) = stack.pop() else {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedEnd,
                        *line_num,
                        1,
                    ));
                };
                if !component.name.eq_ignore_ascii_case(name) {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedEnd,
                        *line_num,
                        1,
                    )
                    .with_context(format!(
                        "END:{name} closes BEGIN:{}",
                        component.name
                    )));
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(component);
                } else {
                    root = Some(component);
                }
            }
            _ => {
                let Some(current) = stack.last_mut() else {
                    return Err(ParseError::new(
                        ParseErrorKind::PropertyOutsideComponent,
                        *line_num,
                        1,
                    )
                    .with_context(content.name));
                };
                current.properties.push(interpret(content));
            }
        }
    }

    if let Some(open) = stack.last() {
        let last_line = lines.last().map_or(1, |(n, _)| *n);
        return Err(
            ParseError::new(ParseErrorKind::UnterminatedComponent, last_line, 1)
                .with_context(open.name.clone()),
        );
    }

    let root = root.ok_or_else(|| ParseError::new(ParseErrorKind::EmptyDocument, 1, 1))?;
    Ok(CalendarDocument { root })
}

/// Interprets a content line's value according to its property name and
/// VALUE parameter. A value that fails its grammar degrades to
/// [`Value::Unknown`] carrying the raw text.
fn interpret(line: ContentLine) -> Property {
    let value = match interpret_value(&line) {
        Ok(value) => value,
        Err(error) => {
            debug!(
                property = %line.name,
                line = line.line,
                %error,
                "keeping raw value for property that failed its grammar"
            );
            Value::Unknown(line.raw_value.clone())
        }
    };
    Property {
        name: line.name,
        parameters: line.parameters,
        value,
        raw_value: line.raw_value,
    }
}

fn interpret_value(line: &ContentLine) -> Result<Value, ValueError> {
    let value_type = line
        .parameters
        .iter()
        .find(|p| p.name == "VALUE")
        .and_then(Parameter::value)
        .map(str::to_ascii_uppercase);
    let tzid = line
        .parameters
        .iter()
        .find(|p| p.name == "TZID")
        .and_then(Parameter::value);

    match line.name.as_str() {
        "DTSTART" | "DTEND" | "DUE" | "RECURRENCE-ID" => {
            if is_date_value(value_type.as_deref(), &line.raw_value) {
                Ok(Value::Date(values::parse_date(&line.raw_value)?))
            } else {
                let dt = values::parse_datetime(&line.raw_value)?;
                Ok(Value::DateTime(apply_tzid(dt, tzid)))
            }
        }
        "EXDATE" | "RDATE" => {
            if is_date_value(value_type.as_deref(), &line.raw_value) {
                let dates = line
                    .raw_value
                    .split(',')
                    .map(values::parse_date)
                    .collect::<Result<Vec<Date>, _>>()?;
                Ok(Value::DateList(dates))
            } else {
                let datetimes = line
                    .raw_value
                    .split(',')
                    .map(|item| values::parse_datetime(item).map(|dt| apply_tzid(dt, tzid)))
                    .collect::<Result<Vec<DateTime>, _>>()?;
                Ok(Value::DateTimeList(datetimes))
            }
        }
        "DURATION" => Ok(Value::Duration(values::parse_duration(&line.raw_value)?)),
        "RRULE" => Ok(Value::Recur(values::parse_rrule(&line.raw_value)?)),
        "TZOFFSETFROM" | "TZOFFSETTO" => {
            Ok(Value::UtcOffset(values::parse_utc_offset(&line.raw_value)?))
        }
        "PRIORITY" | "REPEAT" | "SEQUENCE" => {
            Ok(Value::Integer(values::parse_integer(&line.raw_value)?))
        }
        name if TEXT_PROPERTIES.contains(&name) => {
            Ok(Value::Text(values::unescape_text(&line.raw_value)))
        }
        _ => Ok(Value::Unknown(line.raw_value.clone())),
    }
}

/// Whether the value should be read as a DATE. An explicit VALUE
/// parameter wins; otherwise an eight-digit value with no time part is
/// a DATE. List values sniff their first element.
fn is_date_value(value_type: Option<&str>, raw: &str) -> bool {
    match value_type {
        Some("DATE") => true,
        Some(_) => false,
        None => {
            let first = raw.split(',').next().unwrap_or(raw);
            first.len() == 8 && first.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

/// Applies a TZID parameter to a parsed DATE-TIME. A `Z`-suffixed value
/// is already absolute, so a TZID alongside it is ignored.
fn apply_tzid(mut dt: DateTime, tzid: Option<&str>) -> DateTime {
    if let Some(tzid) = tzid
        && dt.is_floating()
    {
        dt.zone = ZoneRef::Named {
            tzid: tzid.to_string(),
        };
    }
    dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComponentKind, Temporal};

    const SIMPLE: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        PRODID:-//Example//Test//EN\r\n\
        BEGIN:VEVENT\r\n\
        UID:1@example.com\r\n\
        SUMMARY:Team Meeting\r\n\
        DTSTART:20240123T120000Z\r\n\
        DTEND:20240123T130000Z\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test]
    fn parse_simple_calendar() {
        let document = parse(SIMPLE).unwrap();
        assert_eq!(document.root.kind, ComponentKind::Calendar);
        let event = document.events().next().unwrap();
        assert_eq!(
            event.property("SUMMARY").unwrap().as_text(),
            Some("Team Meeting")
        );
        let start = event.property("DTSTART").unwrap().as_temporal().unwrap();
        assert!(matches!(start, Temporal::DateTime(ref dt) if dt.is_utc()));
    }

    #[test]
    fn parse_applies_tzid_parameter() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART;TZID=America/New_York:20240123T090000\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        let start = event.property("DTSTART").unwrap().as_temporal().unwrap();
        assert_eq!(start.tzid(), Some("America/New_York"));
    }

    #[test]
    fn parse_date_value_parameter() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART;VALUE=DATE:20240301\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        let start = event.property("DTSTART").unwrap().as_temporal().unwrap();
        assert!(start.is_date_only());
    }

    #[test]
    fn parse_date_value_without_parameter_is_sniffed() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART:20240301\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        assert!(
            event
                .property("DTSTART")
                .unwrap()
                .as_temporal()
                .unwrap()
                .is_date_only()
        );
    }

    #[test]
    fn parse_exdate_list() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART:20240301T090000Z\r\n\
            EXDATE:20240308T090000Z,20240315T090000Z\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        let exdates = event.property("EXDATE").unwrap().as_temporals();
        assert_eq!(exdates.len(), 2);
    }

    #[test_log::test]
    fn bad_value_degrades_to_unknown() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            DTSTART:not-a-date\r\n\
            RRULE:FREQ=SOMETIMES\r\n\
            SUMMARY:Still here\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        assert_eq!(
            event.property("DTSTART").unwrap().value,
            Value::Unknown("not-a-date".into())
        );
        assert_eq!(
            event.property("RRULE").unwrap().value,
            Value::Unknown("FREQ=SOMETIMES".into())
        );
        assert_eq!(event.property("SUMMARY").unwrap().as_text(), Some("Still here"));
    }

    #[test]
    fn parse_nested_timezone() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VTIMEZONE\r\n\
            TZID:America/New_York\r\n\
            BEGIN:STANDARD\r\n\
            DTSTART:20231105T020000\r\n\
            TZOFFSETFROM:-0400\r\n\
            TZOFFSETTO:-0500\r\n\
            END:STANDARD\r\n\
            END:VTIMEZONE\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let tz = document.timezones().next().unwrap();
        assert_eq!(tz.property("TZID").unwrap().as_text(), Some("America/New_York"));
        let standard = tz.children_of_kind(ComponentKind::Standard).next().unwrap();
        assert!(matches!(
            standard.property("TZOFFSETTO").unwrap().value,
            Value::UtcOffset(o) if o.total_seconds() == -18_000
        ));
    }

    #[test]
    fn parse_rejects_unbalanced_components() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nEND:VCALENDAR\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedEnd);

        let input = "BEGIN:VCALENDAR\r\nSUMMARY:x\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComponent);
    }

    #[test]
    fn parse_rejects_non_calendar_root() {
        let input = "BEGIN:VEVENT\r\nEND:VEVENT\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingCalendarBegin);
    }

    #[test]
    fn parse_rejects_empty_input() {
        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyDocument);
    }

    #[test]
    fn parse_unfolds_long_summary() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            SUMMARY:A summary that was fol\r\n ded across two lines\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let document = parse(input).unwrap();
        let event = document.events().next().unwrap();
        assert_eq!(
            event.property("SUMMARY").unwrap().as_text(),
            Some("A summary that was folded across two lines")
        );
    }
}
