//! Recurrence expansion.
//!
//! Expansion runs on the `rrule` crate. Each event's occurrences are
//! generated on a carrier timeline chosen from the start value's
//! classification, then mapped back to the source form:
//!
//! - date-only events ride midnight-UTC carriers,
//! - UTC events ride the real UTC timeline,
//! - floating events and events in document-defined or unknown zones
//!   ride their wall-clock time stamped as UTC, which keeps the wall
//!   clock stable across the whole series,
//! - events in IANA zones ride that zone's timeline, so a weekly 09:00
//!   stays 09:00 across DST transitions.

use chrono::{DateTime, Datelike, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use koyomi_ical::core::{Date, DateTime as IcalDateTime, Temporal, ZoneRef};
use rrule::{RRule as RRuleExpander, Tz as CarrierTz, Unvalidated};

use crate::error::{EngineError, EngineResult};
use crate::event::VEvent;
use crate::zone::{ZoneKind, ZoneResolver, ical_naive};

/// The expanded starts of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Occurrence starts in chronological order, in the source form.
    pub starts: Vec<Temporal>,
    /// Whether the occurrence cap cut the series short.
    pub truncated: bool,
}

/// The carrier timeline an event's series runs on.
enum Shape {
    AllDay,
    Utc,
    Floating,
    /// Document-defined or unknown zone: wall-clock carrier, named
    /// values out.
    NamedWall(String),
    /// IANA zone: zone-aware carrier.
    NamedIana(String, Tz),
}

impl Shape {
    fn of(start: &Temporal, resolver: &mut ZoneResolver) -> Self {
        match start {
            Temporal::Date(_) => Self::AllDay,
            Temporal::DateTime(dt) => match &dt.zone {
                ZoneRef::Utc => Self::Utc,
                ZoneRef::Floating => Self::Floating,
                ZoneRef::Named { tzid } => match resolver.kind(tzid) {
                    ZoneKind::Iana(tz) => Self::NamedIana(tzid.clone(), tz),
                    ZoneKind::Definition | ZoneKind::Unknown => Self::NamedWall(tzid.clone()),
                },
            },
        }
    }
}

/// Expands an event into its occurrence starts, honoring RRULE, RDATE,
/// and EXDATE, capped at `cap` occurrences. Without an RRULE the start
/// and the RDATEs are merged chronologically on the carrier timeline,
/// duplicates collapsed, with EXDATEs matched by carrier instant.
///
/// ## Errors
/// Returns [`EngineError::InvalidRecurrenceRule`] if the rule is
/// rejected by the expander, e.g. an UNTIL whose type contradicts the
/// start value.
pub fn expand_event(
    event: &VEvent,
    resolver: &mut ZoneResolver,
    cap: u16,
) -> EngineResult<Expansion> {
    let shape = Shape::of(&event.start, resolver);

    let Some(rrule) = &event.rrule else {
        let exdates: Vec<_> = event
            .exdates
            .iter()
            .map(|t| to_carrier(&shape, t, resolver))
            .collect();
        let mut keyed: Vec<_> = std::iter::once(&event.start)
            .chain(event.rdates.iter())
            .map(|start| (to_carrier(&shape, start, resolver), start.clone()))
            .collect();
        keyed.retain(|(instant, _)| !exdates.contains(instant));
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);
        let truncated = keyed.len() > usize::from(cap);
        keyed.truncate(usize::from(cap));
        return Ok(Expansion {
            starts: keyed.into_iter().map(|(_, start)| start).collect(),
            truncated,
        });
    };

    let invalid = |detail: String| EngineError::InvalidRecurrenceRule {
        uid: event.label().to_string(),
        detail,
    };

    let dt_start = to_carrier(&shape, &event.start, resolver);

    let expander = rrule
        .to_string()
        .parse::<RRuleExpander<Unvalidated>>()
        .map_err(|err| invalid(err.to_string()))?;
    let mut set = expander
        .build(dt_start)
        .map_err(|err| invalid(err.to_string()))?;

    if !event.rdates.is_empty() {
        let rdates = event
            .rdates
            .iter()
            .map(|t| to_carrier(&shape, t, resolver))
            .collect();
        set = set.set_rdates(rdates);
    }
    if !event.exdates.is_empty() {
        let exdates = event
            .exdates
            .iter()
            .map(|t| to_carrier(&shape, t, resolver))
            .collect();
        set = set.set_exdates(exdates);
    }

    let result = set.all(cap);
    let starts = result
        .dates
        .iter()
        .map(|date| from_carrier(&shape, *date))
        .collect();

    Ok(Expansion {
        starts,
        truncated: result.limited,
    })
}

/// Places a temporal on the event's carrier timeline.
fn to_carrier(
    shape: &Shape,
    temporal: &Temporal,
    resolver: &mut ZoneResolver,
) -> DateTime<CarrierTz> {
    match shape {
        Shape::AllDay | Shape::Floating | Shape::NamedWall(_) => {
            wall_as_utc(temporal_wall_time(temporal)).with_timezone(&CarrierTz::UTC)
        }
        Shape::Utc => {
            // Exception dates may themselves be zoned; convert to the
            // real instant when the zone is known
            let (resolved, _) = resolver.resolve(temporal, None, "");
            resolved
                .instant()
                .unwrap_or_else(|| wall_as_utc(temporal_wall_time(temporal)))
                .with_timezone(&CarrierTz::UTC)
        }
        Shape::NamedIana(_, tz) => {
            let carrier = CarrierTz::Tz(*tz);
            match temporal {
                Temporal::DateTime(dt) if dt.is_utc() => {
                    wall_as_utc(ical_naive(dt)).with_timezone(&carrier)
                }
                _ => local_in_zone(temporal_wall_time(temporal), carrier),
            }
        }
    }
}

/// Maps a carrier occurrence back to the source form.
fn from_carrier(shape: &Shape, date: DateTime<CarrierTz>) -> Temporal {
    match shape {
        Shape::AllDay => {
            let d = date.naive_utc().date();
            Temporal::Date(Date::new(
                u16::try_from(d.year()).unwrap_or_default(),
                u8::try_from(d.month()).unwrap_or_default(),
                u8::try_from(d.day()).unwrap_or_default(),
            ))
        }
        Shape::Utc => Temporal::DateTime(naive_to_ical(date.naive_utc(), ZoneRef::Utc)),
        Shape::Floating => Temporal::DateTime(naive_to_ical(date.naive_utc(), ZoneRef::Floating)),
        Shape::NamedWall(tzid) => Temporal::DateTime(naive_to_ical(
            date.naive_utc(),
            ZoneRef::Named { tzid: tzid.clone() },
        )),
        Shape::NamedIana(tzid, _) => Temporal::DateTime(naive_to_ical(
            date.naive_local(),
            ZoneRef::Named { tzid: tzid.clone() },
        )),
    }
}

/// The wall-clock reading of a temporal, ignoring its zone. Date-only
/// values read as midnight.
pub(crate) fn temporal_wall_time(temporal: &Temporal) -> NaiveDateTime {
    match temporal {
        Temporal::Date(d) => {
            let date = chrono::NaiveDate::from_ymd_opt(
                i32::from(d.year),
                u32::from(d.month),
                u32::from(d.day),
            )
            .unwrap_or_default();
            date.and_hms_opt(0, 0, 0).unwrap_or_default()
        }
        Temporal::DateTime(dt) => ical_naive(dt),
    }
}

/// Shifts a temporal by a delta, preserving its classification. An
/// all-day start shifted by whole days stays date-only; a fractional
/// shift forces a floating date-time.
pub(crate) fn temporal_plus(start: &Temporal, delta: TimeDelta) -> Temporal {
    let wall = temporal_wall_time(start) + delta;
    match start {
        Temporal::Date(_) if delta.num_seconds() % 86_400 == 0 => {
            let d = wall.date();
            Temporal::Date(Date::new(
                u16::try_from(d.year()).unwrap_or_default(),
                u8::try_from(d.month()).unwrap_or_default(),
                u8::try_from(d.day()).unwrap_or_default(),
            ))
        }
        Temporal::Date(_) => Temporal::DateTime(naive_to_ical(wall, ZoneRef::Floating)),
        Temporal::DateTime(dt) => Temporal::DateTime(naive_to_ical(wall, dt.zone.clone())),
    }
}

fn wall_as_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Interprets a wall time in a zone, taking the first occurrence of an
/// ambiguous time and shifting forward out of a DST gap.
fn local_in_zone(naive: NaiveDateTime, tz: CarrierTz) -> DateTime<CarrierTz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => {
            let shifted = naive + TimeDelta::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
                LocalResult::None => wall_as_utc(shifted).with_timezone(&tz),
            }
        }
    }
}

fn naive_to_ical(naive: NaiveDateTime, zone: ZoneRef) -> IcalDateTime {
    IcalDateTime {
        year: u16::try_from(naive.year()).unwrap_or_default(),
        month: u8::try_from(naive.month()).unwrap_or_default(),
        day: u8::try_from(naive.day()).unwrap_or_default(),
        hour: u8::try_from(naive.hour()).unwrap_or_default(),
        minute: u8::try_from(naive.minute()).unwrap_or_default(),
        second: u8::try_from(naive.second()).unwrap_or_default(),
        zone,
    }
}
