//! VTIMEZONE interpretation (RFC 5545 §3.6.5).
//!
//! A document may carry its own zone definitions, which take precedence
//! over the IANA database for the TZIDs they declare. This module turns
//! a VTIMEZONE component into an offset table usable for local-to-UTC
//! conversion.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use koyomi_ical::core::{Component, ComponentKind, Frequency, Property, RRule, Temporal, Value};

/// Error while interpreting a VTIMEZONE component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TzDefinitionError {
    /// Missing required TZID property.
    #[error("missing required TZID property")]
    MissingTzid,

    /// No STANDARD or DAYLIGHT sub-component.
    #[error("VTIMEZONE must have at least one STANDARD or DAYLIGHT component")]
    NoObservances,

    /// Missing required property in an observance.
    #[error("missing required property {0} in {1} component")]
    MissingProperty(&'static str, &'static str),

    /// A property carried an uninterpretable value.
    #[error("invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// A single observance rule: when a given UTC offset takes effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Observance {
    /// Offset in seconds east of UTC while this observance is in effect.
    pub offset_to: i32,
    /// Offset in effect just before this observance's onsets.
    pub offset_from: i32,
    /// First onset, in the zone's local time.
    pub onset: NaiveDateTime,
    /// Yearly recurrence of the onset, if the zone transitions.
    pub rrule: Option<RRule>,
    /// Additional explicit onsets.
    pub rdates: Vec<NaiveDateTime>,
}

/// A zone definition assembled from a VTIMEZONE component.
#[derive(Debug, Clone, PartialEq)]
pub struct TzDefinition {
    /// The declared TZID, verbatim.
    pub tzid: String,
    /// Observance rules in declaration order.
    pub observances: Vec<Observance>,
}

impl TzDefinition {
    /// Builds a zone definition from a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns an error if the TZID is missing, no observance is
    /// declared, or an observance lacks its required properties.
    pub fn from_component(component: &Component) -> Result<Self, TzDefinitionError> {
        let tzid = component
            .property("TZID")
            .and_then(Property::as_text)
            .ok_or(TzDefinitionError::MissingTzid)?
            .to_string();

        let mut observances = Vec::new();
        for child in &component.children {
            let kind_str = match child.kind {
                ComponentKind::Standard => "STANDARD",
                ComponentKind::Daylight => "DAYLIGHT",
                _ => continue,
            };
            observances.push(parse_observance(child, kind_str)?);
        }

        if observances.is_empty() {
            return Err(TzDefinitionError::NoObservances);
        }

        Ok(Self { tzid, observances })
    }

    /// Returns the offset in seconds east of UTC in effect at the given
    /// local time.
    ///
    /// The observance with the most recent onset at or before the time
    /// wins. For times before every onset, the earliest observance's
    /// `offset_from` applies.
    #[must_use]
    pub fn offset_at(&self, local: NaiveDateTime) -> i32 {
        let mut best: Option<(&Observance, NaiveDateTime)> = None;

        for observance in &self.observances {
            if let Some(onset) = latest_onset(observance, local) {
                match &best {
                    Some((_, best_onset)) if onset <= *best_onset => {}
                    _ => best = Some((observance, onset)),
                }
            }
        }

        best.map_or_else(
            || {
                self.observances
                    .iter()
                    .min_by_key(|o| o.onset)
                    .map_or(0, |o| o.offset_from)
            },
            |(observance, _)| observance.offset_to,
        )
    }

    /// Converts a local time in this zone to naive UTC.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - TimeDelta::seconds(i64::from(self.offset_at(local)))
    }
}

fn parse_observance(
    component: &Component,
    kind_str: &'static str,
) -> Result<Observance, TzDefinitionError> {
    let onset_property = component
        .property("DTSTART")
        .ok_or(TzDefinitionError::MissingProperty("DTSTART", kind_str))?;
    let onset = onset_property
        .as_temporal()
        .and_then(|t| temporal_to_naive(&t))
        .ok_or_else(|| {
            TzDefinitionError::InvalidValue("DTSTART", onset_property.raw_value.clone())
        })?;

    let offset_to = observance_offset(component, "TZOFFSETTO", kind_str)?;
    let offset_from = observance_offset(component, "TZOFFSETFROM", kind_str)?;

    let rrule = component.property("RRULE").and_then(Property::as_recur).cloned();

    let rdates = component
        .properties("RDATE")
        .flat_map(Property::as_temporals)
        .filter_map(|t| temporal_to_naive(&t))
        .collect();

    Ok(Observance {
        offset_to,
        offset_from,
        onset,
        rrule,
        rdates,
    })
}

fn observance_offset(
    component: &Component,
    name: &'static str,
    kind_str: &'static str,
) -> Result<i32, TzDefinitionError> {
    let property = component
        .property(name)
        .ok_or(TzDefinitionError::MissingProperty(name, kind_str))?;
    match &property.value {
        Value::UtcOffset(offset) => Ok(offset.total_seconds()),
        _ => Err(TzDefinitionError::InvalidValue(
            name,
            property.raw_value.clone(),
        )),
    }
}

fn temporal_to_naive(temporal: &Temporal) -> Option<NaiveDateTime> {
    match temporal {
        Temporal::Date(d) => {
            let date = NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day))?;
            Some(date.and_hms_opt(0, 0, 0)?)
        }
        Temporal::DateTime(dt) => {
            let date = NaiveDate::from_ymd_opt(
                i32::from(dt.year),
                u32::from(dt.month),
                u32::from(dt.day),
            )?;
            let time = NaiveTime::from_hms_opt(
                u32::from(dt.hour),
                u32::from(dt.minute),
                u32::from(dt.second),
            )?;
            Some(NaiveDateTime::new(date, time))
        }
    }
}

/// The most recent onset of an observance at or before the given time,
/// considering the initial onset, RDATEs, and a yearly RRULE.
fn latest_onset(observance: &Observance, at: NaiveDateTime) -> Option<NaiveDateTime> {
    if at < observance.onset {
        return None;
    }

    let mut best = observance.onset;
    for rdate in &observance.rdates {
        if *rdate <= at && *rdate > best {
            best = *rdate;
        }
    }

    if let Some(rrule) = &observance.rrule
        && let Some(occurrence) = latest_rrule_onset(observance, rrule, at)
        && occurrence > best
    {
        best = occurrence;
    }

    Some(best)
}

/// The most recent occurrence of a zone transition rule at or before a
/// given time. Only the shape real zone rules use is handled:
/// `FREQ=YEARLY` with BYMONTH and an ordinal BYDAY.
fn latest_rrule_onset(
    observance: &Observance,
    rrule: &RRule,
    at: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if rrule.freq != Some(Frequency::Yearly) {
        return None;
    }
    let month = u32::from(*rrule.by_month.first()?);
    let byday = rrule.by_day.first()?;
    let ordinal = i32::from(byday.ordinal?);
    let weekday = match byday.weekday {
        koyomi_ical::core::Weekday::Sunday => chrono::Weekday::Sun,
        koyomi_ical::core::Weekday::Monday => chrono::Weekday::Mon,
        koyomi_ical::core::Weekday::Tuesday => chrono::Weekday::Tue,
        koyomi_ical::core::Weekday::Wednesday => chrono::Weekday::Wed,
        koyomi_ical::core::Weekday::Thursday => chrono::Weekday::Thu,
        koyomi_ical::core::Weekday::Friday => chrono::Weekday::Fri,
        koyomi_ical::core::Weekday::Saturday => chrono::Weekday::Sat,
    };

    let time = observance.onset.time();
    let mut best: Option<NaiveDateTime> = None;
    for year in observance.onset.year()..=at.year() {
        if let Some(occurrence) = nth_weekday_of_month(year, month, weekday, ordinal, time)
            && occurrence <= at
            && best.is_none_or(|b| occurrence > b)
        {
            best = Some(occurrence);
        }
    }
    best
}

/// The nth occurrence of a weekday in a month; negative `ordinal`
/// counts from the end (-1 is the last).
fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: chrono::Weekday,
    ordinal: i32,
    time: NaiveTime,
) -> Option<NaiveDateTime> {
    if ordinal == 0 {
        return None;
    }

    let date = if ordinal > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let days_until = (i64::from(weekday.num_days_from_monday())
            - i64::from(first.weekday().num_days_from_monday())
            + 7)
            % 7;
        let day_offset = days_until + i64::from(ordinal - 1) * 7;
        let date = first + TimeDelta::days(day_offset);
        if date.month() == month { date } else { return None }
    } else {
        let last = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        }
        .pred_opt()?;
        let days_back = (i64::from(last.weekday().num_days_from_monday())
            - i64::from(weekday.num_days_from_monday())
            + 7)
            % 7;
        let day_offset = days_back + i64::from(-ordinal - 1) * 7;
        let date = last - TimeDelta::days(day_offset);
        if date.month() == month { date } else { return None }
    };

    Some(NaiveDateTime::new(date, time))
}
