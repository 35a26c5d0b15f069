//! VEVENT extraction.
//!
//! Pulls the scheduling-relevant properties out of a VEVENT component
//! and validates the ones the engine cannot work without.

use chrono::TimeDelta;
use koyomi_ical::core::{Component, Duration, Property, RRule, Temporal, Value};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::zone::ZoneResolver;

/// The scheduling data of a single VEVENT.
#[derive(Debug, Clone, PartialEq)]
pub struct VEvent {
    /// UID property, if present.
    pub uid: Option<String>,
    /// SUMMARY property, if present.
    pub summary: Option<String>,
    /// Start of the first occurrence.
    pub start: Temporal,
    /// Explicit end (DTEND), if declared.
    pub end: Option<Temporal>,
    /// Explicit DURATION, if declared. Mutually exclusive with `end`
    /// per RFC 5545; when both appear, `end` wins.
    pub duration: Option<Duration>,
    /// Recurrence rule, if the event repeats.
    pub rrule: Option<RRule>,
    /// Excluded occurrence starts.
    pub exdates: Vec<Temporal>,
    /// Additional occurrence starts.
    pub rdates: Vec<Temporal>,
}

impl VEvent {
    /// Extracts an event from a VEVENT component.
    ///
    /// ## Errors
    /// Returns [`EngineError::MalformedEvent`] if DTSTART is missing or
    /// unusable, and [`EngineError::InvalidRecurrenceRule`] if an RRULE
    /// is present but failed the recurrence grammar.
    pub fn from_component(component: &Component) -> EngineResult<Self> {
        let uid = component
            .property("UID")
            .and_then(Property::as_text)
            .map(String::from);
        let summary = component
            .property("SUMMARY")
            .and_then(Property::as_text)
            .map(String::from);
        let label = uid
            .clone()
            .or_else(|| summary.clone())
            .unwrap_or_else(|| "<unidentified>".to_string());

        let Some(start_property) = component.property("DTSTART") else {
            return Err(EngineError::MalformedEvent {
                uid: label,
                reason: "missing DTSTART".to_string(),
            });
        };
        let Some(start) = start_property.as_temporal() else {
            return Err(EngineError::MalformedEvent {
                uid: label,
                reason: format!("unusable DTSTART {:?}", start_property.raw_value),
            });
        };

        let rrule = match component.property("RRULE") {
            None => None,
            Some(property) => match &property.value {
                Value::Recur(rrule) => Some(rrule.clone()),
                _ => {
                    return Err(EngineError::InvalidRecurrenceRule {
                        uid: label,
                        detail: format!("unparsable RRULE {:?}", property.raw_value),
                    });
                }
            },
        };

        // A damaged DTEND or DURATION degrades to an open end rather
        // than discarding the event
        let end = match component.property("DTEND") {
            None => None,
            Some(property) => {
                let end = property.as_temporal();
                if end.is_none() {
                    debug!(
                        event = %label,
                        raw = %property.raw_value,
                        "ignoring unusable DTEND"
                    );
                }
                end
            }
        };
        let duration = component.property("DURATION").and_then(Property::as_duration);

        let exdates = component
            .properties("EXDATE")
            .flat_map(Property::as_temporals)
            .collect();
        let rdates = component
            .properties("RDATE")
            .flat_map(Property::as_temporals)
            .collect();

        Ok(Self {
            uid,
            summary,
            start,
            end,
            duration,
            rrule,
            exdates,
            rdates,
        })
    }

    /// The event's identity for error reporting.
    #[must_use]
    pub fn label(&self) -> &str {
        self.uid
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or("<unidentified>")
    }

    /// The occurrence length, derived from DTEND minus DTSTART or from
    /// DURATION. DTSTART and DTEND may sit in different zones, so the
    /// delta is taken on their resolved instants when both denote one;
    /// date-only and floating pairs fall back to the wall-clock
    /// difference. `None` when the event declares neither; no end is
    /// synthesized for such events.
    #[must_use]
    pub fn occurrence_length(&self, resolver: &mut ZoneResolver) -> Option<TimeDelta> {
        if let Some(end) = &self.end {
            let (start, _) = resolver.resolve(&self.start, None, "");
            let (end_value, _) = resolver.resolve(end, None, "");
            if let (Some(start), Some(end)) = (start.instant(), end_value.instant()) {
                return Some(end - start);
            }
            let start = crate::expand::temporal_wall_time(&self.start);
            let end = crate::expand::temporal_wall_time(end);
            return Some(end - start);
        }
        self.duration
            .map(|d| TimeDelta::seconds(d.total_seconds()))
    }
}
