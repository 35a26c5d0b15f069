//! iCalendar property parameter type (RFC 5545 §3.2).

use std::fmt;

/// A single iCalendar property parameter.
///
/// Parameters modify or provide metadata for a property value. For
/// example, in `DTSTART;TZID=America/New_York:20240123T120000` the
/// parameter `TZID` carries the value `America/New_York`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values. Most parameters carry one value, but some can
    /// hold multiple comma-separated values.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a new parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a new parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first (and usually only) value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Creates a TZID parameter.
    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new("TZID", tzid)
    }

    /// Creates a VALUE parameter.
    #[must_use]
    pub fn value_type(value_type: impl Into<String>) -> Self {
        Self::new("VALUE", value_type)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.values.is_empty() {
            write!(f, "=")?;
            for (i, value) in self.values.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                if value.chars().any(|c| matches!(c, ':' | ';' | ',' | '"')) {
                    write!(f, "\"{value}\"")?;
                } else {
                    write!(f, "{value}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_display_simple() {
        let param = Parameter::new("TZID", "America/New_York");
        assert_eq!(param.to_string(), "TZID=America/New_York");
    }

    #[test]
    fn parameter_display_quoted() {
        let param = Parameter::new("CN", "Doe; Jane");
        assert_eq!(param.to_string(), "CN=\"Doe; Jane\"");
    }

    #[test]
    fn parameter_name_normalized() {
        let param = Parameter::new("tzid", "Europe/London");
        assert_eq!(param.name, "TZID");
    }
}
