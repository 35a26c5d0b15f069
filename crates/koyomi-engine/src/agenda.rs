//! Agenda assembly.
//!
//! [`build_agenda`] is the engine's front door: parse a document,
//! expand every event, resolve every occurrence, and aggregate the set
//! of zones the document touches.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::error::EngineResult;
use crate::event::VEvent;
use crate::expand::{expand_event, temporal_plus};
use crate::zone::{ResolvedTemporal, TargetZone, ZoneResolver};

/// Default per-event occurrence cap for unbounded recurrences.
pub const DEFAULT_OCCURRENCE_CAP: u16 = 50;

/// What to do with an event that cannot be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidEventPolicy {
    /// Skip the event and record a warning. The default.
    #[default]
    Skip,
    /// Fail the whole document.
    Fail,
}

/// Options controlling agenda assembly.
#[derive(Debug, Clone)]
pub struct AgendaOptions {
    /// Zone to convert UTC values into. Values that carry their own
    /// named zone keep it. `None` leaves UTC values in UTC.
    pub target_zone: Option<String>,
    /// Label reported for floating and all-day values, which have no
    /// zone of their own. Callers that know the viewer's zone pass it
    /// here.
    pub default_zone: String,
    /// Per-event occurrence cap.
    pub max_occurrences: u16,
    /// Policy for events that cannot be interpreted.
    pub invalid_events: InvalidEventPolicy,
}

impl Default for AgendaOptions {
    fn default() -> Self {
        Self {
            target_zone: None,
            default_zone: "UTC".to_string(),
            max_occurrences: DEFAULT_OCCURRENCE_CAP,
            invalid_events: InvalidEventPolicy::default(),
        }
    }
}

/// One displayable occurrence of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// SUMMARY of the owning event, if present.
    pub title: Option<String>,
    /// Occurrence start.
    pub start: ResolvedTemporal,
    /// Occurrence end, absent when the event declares neither DTEND
    /// nor DURATION.
    pub end: Option<ResolvedTemporal>,
    /// Whether this is an all-day occurrence.
    pub all_day: bool,
    /// Display zone label: `UTC` for unconverted UTC values, the zone
    /// name for zoned values, the caller's default zone for floating
    /// and all-day values.
    pub zone: String,
}

/// The normalized agenda of a calendar document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agenda {
    /// Occurrences, chronological within each event, events in
    /// document order.
    pub occurrences: Vec<Occurrence>,
    /// Every zone the document's values touch, sorted and
    /// deduplicated. All-day values have no zone and contribute
    /// nothing here.
    pub zones: BTreeSet<String>,
    /// Everything that was degraded, capped, or skipped along the way.
    pub warnings: Vec<String>,
}

/// Parses a calendar document and assembles its agenda.
///
/// ## Errors
/// Returns [`MalformedDocument`](crate::error::EngineError::MalformedDocument)
/// for structural damage,
/// [`UnresolvableZone`](crate::error::EngineError::UnresolvableZone) if the
/// requested target zone is unknown, and per-event errors when
/// `invalid_events` is [`InvalidEventPolicy::Fail`].
pub fn build_agenda(input: &str, options: &AgendaOptions) -> EngineResult<Agenda> {
    let document = koyomi_ical::parse(input)?;

    let mut resolver = ZoneResolver::from_document(&document);
    let target = options
        .target_zone
        .as_deref()
        .map(TargetZone::new)
        .transpose()?;

    let mut occurrences = Vec::new();
    let mut zones = BTreeSet::new();
    let mut warnings = Vec::new();

    for component in document.events() {
        let outcome = VEvent::from_component(component).and_then(|event| {
            expand_event(&event, &mut resolver, options.max_occurrences)
                .map(|expansion| (event, expansion))
        });
        let (event, expansion) = match outcome {
            Ok(pair) => pair,
            Err(error) => match options.invalid_events {
                InvalidEventPolicy::Fail => return Err(error),
                InvalidEventPolicy::Skip => {
                    warn!(%error, "skipping uninterpretable event");
                    warnings.push(format!("skipping event: {error}"));
                    continue;
                }
            },
        };
        if expansion.truncated {
            warnings.push(format!(
                "event {}: occurrence list capped at {}",
                event.label(),
                options.max_occurrences
            ));
        }

        let length = event.occurrence_length(&mut resolver);
        for start in &expansion.starts {
            let end = length.map(|delta| temporal_plus(start, delta));

            let (resolved_start, start_zone) =
                resolver.resolve(start, target.as_ref(), &options.default_zone);
            if let Some(zone) = &start_zone {
                zones.insert(zone.clone());
            }
            let resolved_end = end.map(|end| {
                let (resolved, end_zone) =
                    resolver.resolve(&end, target.as_ref(), &options.default_zone);
                if let Some(zone) = end_zone {
                    zones.insert(zone);
                }
                resolved
            });

            occurrences.push(Occurrence {
                title: event.summary.clone(),
                all_day: resolved_start.is_date_only(),
                // Date-only starts have no zone contribution; their
                // display label falls back like floating values do
                zone: start_zone.unwrap_or_else(|| options.default_zone.clone()),
                start: resolved_start,
                end: resolved_end,
            });
        }
    }

    warnings.extend(resolver.take_warnings());

    Ok(Agenda {
        occurrences,
        zones,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = AgendaOptions::default();
        assert_eq!(options.max_occurrences, 50);
        assert_eq!(options.default_zone, "UTC");
        assert_eq!(options.invalid_events, InvalidEventPolicy::Skip);
        assert!(options.target_zone.is_none());
    }

    #[test]
    fn agenda_serializes_to_json() {
        let input = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            UID:1@example.com\r\n\
            SUMMARY:Standup\r\n\
            DTSTART:20240123T090000Z\r\n\
            DTEND:20240123T091500Z\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let agenda = build_agenda(input, &AgendaOptions::default()).unwrap();
        let json = serde_json::to_value(&agenda).unwrap();
        assert_eq!(json["occurrences"][0]["title"], "Standup");
        assert_eq!(json["occurrences"][0]["start"], "2024-01-23T09:00:00Z");
        assert_eq!(json["occurrences"][0]["zone"], "UTC");
        assert_eq!(json["zones"], serde_json::json!(["UTC"]));
    }
}
