//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::core::{ContentLine, Parameter};

/// Splits input into logical content lines, merging folded continuations.
///
/// Per RFC 5545 §3.1, a line break followed by SPACE or HTAB is a fold:
/// unfolding removes the break and the single whitespace character,
/// inserting nothing. Both CRLF and bare LF breaks are accepted. Blank
/// lines are skipped. Each returned entry carries the 1-based line
/// number where the logical line started.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            continue;
        }

        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                // Continuation with nothing to continue: keep it as its
                // own line and let the content-line parser report it.
                lines.push((i + 1, continuation.to_string()));
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    lines
}

/// Parses a single unfolded content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the name is missing or contains invalid
/// characters, a parameter is malformed, or no colon separates the
/// value.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut name_end = None;
    for (i, c) in line.char_indices() {
        match c {
            ';' | ':' => {
                name_end = Some(i);
                break;
            }
            c if c.is_ascii_alphanumeric() || c == '-' => {}
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidPropertyName,
                    line_num,
                    i + 1,
                ));
            }
        }
    }

    let Some(name_end) = name_end else {
        return Err(ParseError::new(
            ParseErrorKind::MissingColon,
            line_num,
            line.len(),
        ));
    };
    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = line[..name_end].to_ascii_uppercase();

    let mut parameters = Vec::new();
    let mut chars = line[name_end..].char_indices().peekable();
    let value_start = loop {
        match chars.next() {
            Some((_, ':')) => {
                // char_indices is relative to the slice
                break name_end
                    + chars.peek().map_or(line.len() - name_end, |&(i, _)| i);
            }
            Some((_, ';')) => {
                let param = parse_parameter(&mut chars, line, name_end, line_num)?;
                parameters.push(param);
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    };

    Ok(ContentLine {
        name,
        parameters,
        raw_value: line[value_start..].to_string(),
        line: line_num,
    })
}

/// Parses a single parameter from the character stream, leaving the
/// stream positioned on the `;` or `:` that follows it.
fn parse_parameter(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    offset: usize,
    line_num: usize,
) -> ParseResult<Parameter> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| offset + i);

    let mut name_end = start;
    loop {
        match chars.peek() {
            Some(&(i, '=')) => {
                name_end = offset + i;
                chars.next();
                break;
            }
            Some(&(_, c)) if c.is_ascii_alphanumeric() || c == '-' => {
                chars.next();
            }
            Some(&(i, _)) => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidParameter,
                    line_num,
                    offset + i + 1,
                ));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = &line[start..name_end];

    let mut values = Vec::new();
    loop {
        values.push(parse_param_value(chars, line, offset, line_num)?);
        match chars.peek() {
            Some(&(_, ',')) => {
                chars.next();
            }
            Some(&(_, ';' | ':')) => {
                return Ok(Parameter::with_values(param_name, values));
            }
            Some(&(i, c)) => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidParameter,
                    line_num,
                    offset + i + 1,
                )
                .with_context(format!("unexpected character '{c}'")));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value, possibly quoted.
///
/// Quoted values may contain `:`, `;` and `,`, and use RFC 6868 caret
/// encoding for characters a quoted string cannot hold: `^^` for `^`,
/// `^n` for a newline, and `^'` for `"`.
fn parse_param_value(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    offset: usize,
    line_num: usize,
) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    if first == '"' {
        chars.next();
        let mut value = String::new();

        loop {
            match chars.next() {
                Some((_, '"')) => return Ok(value),
                Some((_, '^')) => match chars.peek() {
                    Some(&(_, '^')) => {
                        value.push('^');
                        chars.next();
                    }
                    Some(&(_, 'n')) => {
                        value.push('\n');
                        chars.next();
                    }
                    Some(&(_, '\'')) => {
                        value.push('"');
                        chars.next();
                    }
                    // Not a caret escape, keep the caret itself
                    _ => value.push('^'),
                },
                Some((_, c)) => value.push(c),
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnclosedQuote,
                        line_num,
                        offset + start + 1,
                    ));
                }
            }
        }
    } else {
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if matches!(c, ',' | ';' | ':') {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        Ok(line[offset + start..offset + end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_merges_folded_lines() {
        let input = "DESCRIPTION:This is a long description\r\n  that continues here";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].1,
            "DESCRIPTION:This is a long description that continues here"
        );
    }

    #[test]
    fn split_handles_bare_lf_and_tab_folds() {
        let input = "DESCRIPTION:First\n Second\n\tThird";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "DESCRIPTION:FirstSecondThird");
    }

    #[test]
    fn split_skips_blank_lines_and_numbers_logical_lines() {
        let input = "LINE1:a\r\n\r\nLINE2:b\r\n folded";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "LINE1:a".to_string()));
        assert_eq!(lines[1], (3, "LINE2:bfolded".to_string()));
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("SUMMARY:Team Meeting", 1).unwrap();
        assert_eq!(result.name, "SUMMARY");
        assert!(result.parameters.is_empty());
        assert_eq!(result.raw_value, "Team Meeting");
    }

    #[test]
    fn parse_line_with_params() {
        let result =
            parse_content_line("DTSTART;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(result.name, "DTSTART");
        assert_eq!(result.parameters.len(), 1);
        assert_eq!(result.parameters[0].name, "TZID");
        assert_eq!(result.parameters[0].value(), Some("America/New_York"));
        assert_eq!(result.raw_value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_quoted_param() {
        let result =
            parse_content_line("ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com", 1).unwrap();
        assert_eq!(result.parameters[0].value(), Some("Doe, Jane"));
        assert_eq!(result.raw_value, "mailto:jane@example.com");
    }

    #[test]
    fn parse_line_with_multiple_param_values() {
        let result = parse_content_line(
            "ATTENDEE;ROLE=REQ-PARTICIPANT,OPT-PARTICIPANT:mailto:test@example.com",
            1,
        )
        .unwrap();
        assert_eq!(
            result.parameters[0].values,
            ["REQ-PARTICIPANT", "OPT-PARTICIPANT"]
        );
    }

    #[test]
    fn parse_line_with_caret_encoding() {
        let result =
            parse_content_line("ATTENDEE;CN=\"Test^nName^'\":mailto:test@example.com", 1).unwrap();
        assert_eq!(result.parameters[0].value(), Some("Test\nName\""));
    }

    #[test]
    fn parse_line_empty_value() {
        let result = parse_content_line("DESCRIPTION:", 1).unwrap();
        assert_eq!(result.raw_value, "");
    }

    #[test]
    fn parse_line_unclosed_quote() {
        let err = parse_content_line("ATTENDEE;CN=\"Unclosed", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
    }

    #[test]
    fn parse_line_missing_colon() {
        let err = parse_content_line("INVALID", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
    }

    #[test]
    fn parse_line_reports_position() {
        let err = parse_content_line("BAD NAME:value", 3).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 4);
    }
}
