//! Time zone resolution and resolved temporal values.
//!
//! [`ZoneResolver`] turns the zone references found in a document into
//! concrete offsets, preferring the document's own VTIMEZONE
//! definitions over the IANA database. [`ResolvedTemporal`] is the
//! output form: a value that knows its classification and renders as
//! ISO 8601.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use koyomi_ical::core::{CalendarDocument, Temporal, ZoneRef};
use serde::Serialize;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::vtimezone::TzDefinition;

/// A temporal value after zone resolution.
///
/// The four classifications of the source model survive resolution:
/// date-only values never gain a zone, UTC values are absolute, zoned
/// values carry their local wall time plus the offset in effect, and
/// floating values stay bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTemporal {
    /// A date-only (all-day) value.
    Date(NaiveDate),
    /// An absolute UTC instant.
    Utc(DateTime<Utc>),
    /// A local wall time in a named zone, with the offset in effect at
    /// that wall time.
    Zoned {
        /// Local wall-clock time.
        local: NaiveDateTime,
        /// Offset in seconds east of UTC.
        offset_secs: i32,
        /// The zone's display name.
        zone: String,
    },
    /// A floating value: no zone, same wall time everywhere.
    Floating(NaiveDateTime),
}

impl ResolvedTemporal {
    /// Returns the absolute instant, if this value denotes one.
    /// Date-only and floating values do not.
    #[must_use]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(_) | Self::Floating(_) => None,
            Self::Utc(dt) => Some(*dt),
            Self::Zoned {
                local, offset_secs, ..
            } => {
                let utc = *local - TimeDelta::seconds(i64::from(*offset_secs));
                Some(DateTime::from_naive_utc_and_offset(utc, Utc))
            }
        }
    }

    /// Returns whether this is a date-only value.
    #[must_use]
    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Parses an ISO 8601 rendering back into its classification:
    /// `YYYY-MM-DD` is date-only, a trailing `Z` is UTC, a trailing
    /// `±HH:MM` offset is zoned, and a bare date-time is floating.
    #[must_use]
    pub fn parse_iso(s: &str) -> Option<Self> {
        if s.len() == 10 {
            return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self::Date);
        }
        if let Some(body) = s.strip_suffix('Z') {
            let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S").ok()?;
            return Some(Self::Utc(DateTime::from_naive_utc_and_offset(naive, Utc)));
        }
        // A zoned rendering ends with +HH:MM or -HH:MM
        if s.len() > 6 {
            let (body, offset_part) = s.split_at(s.len() - 6);
            if let Some(offset_secs) = parse_iso_offset(offset_part) {
                let local = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S").ok()?;
                return Some(Self::Zoned {
                    local,
                    offset_secs,
                    zone: offset_part.to_string(),
                });
            }
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(Self::Floating)
    }
}

fn parse_iso_offset(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let sign = match bytes.first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    if bytes.len() != 6 || bytes[3] != b':' {
        return None;
    }
    let hours: i32 = s.get(1..3)?.parse().ok()?;
    let minutes: i32 = s.get(4..6)?.parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for ResolvedTemporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Utc(dt) => write!(f, "{}Z", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Zoned {
                local, offset_secs, ..
            } => {
                let sign = if *offset_secs < 0 { '-' } else { '+' };
                let magnitude = offset_secs.abs();
                write!(
                    f,
                    "{}{sign}{:02}:{:02}",
                    local.format("%Y-%m-%dT%H:%M:%S"),
                    magnitude / 3600,
                    magnitude % 3600 / 60
                )
            }
            Self::Floating(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl Serialize for ResolvedTemporal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated conversion target for UTC values.
#[derive(Debug, Clone)]
pub struct TargetZone {
    name: String,
    tz: Tz,
}

impl TargetZone {
    /// Resolves a zone name into a conversion target.
    ///
    /// ## Errors
    /// Returns [`EngineError::UnresolvableZone`] if the name is not a
    /// known zone.
    pub fn new(name: &str) -> EngineResult<Self> {
        let tz = Tz::from_str(normalize_tzid(name)).map_err(|_| EngineError::UnresolvableZone {
            tzid: name.to_string(),
        })?;
        Ok(Self {
            name: tz.name().to_string(),
            tz,
        })
    }

    /// The canonical zone name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How a TZID resolves for this document.
#[derive(Debug, Clone)]
pub enum ZoneKind {
    /// The document defines this zone with a VTIMEZONE.
    Definition,
    /// An IANA zone.
    Iana(Tz),
    /// Nothing matches this identifier.
    Unknown,
}

/// Resolves TZIDs against document VTIMEZONE definitions first, then
/// the IANA database. Collects warnings for anything that had to be
/// degraded.
#[derive(Debug, Default)]
pub struct ZoneResolver {
    definitions: HashMap<String, TzDefinition>,
    iana_cache: HashMap<String, Tz>,
    unresolvable: HashSet<String>,
    warnings: Vec<String>,
}

impl ZoneResolver {
    /// Creates a resolver with no document definitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from a document, registering every valid
    /// VTIMEZONE. An invalid VTIMEZONE is skipped with a warning; the
    /// TZIDs it would have covered fall back to IANA resolution.
    #[must_use]
    pub fn from_document(document: &CalendarDocument) -> Self {
        let mut resolver = Self::new();
        for component in document.timezones() {
            match TzDefinition::from_component(component) {
                Ok(definition) => {
                    resolver
                        .definitions
                        .insert(definition.tzid.clone(), definition);
                }
                Err(error) => {
                    warn!(%error, "skipping invalid VTIMEZONE");
                    resolver
                        .warnings
                        .push(format!("skipping invalid VTIMEZONE: {error}"));
                }
            }
        }
        resolver
    }

    /// Classifies a TZID: document definition, IANA zone, or unknown.
    pub fn kind(&mut self, tzid: &str) -> ZoneKind {
        if self.definitions.contains_key(tzid) {
            return ZoneKind::Definition;
        }
        match self.resolve_iana(tzid) {
            Some(tz) => ZoneKind::Iana(tz),
            None => ZoneKind::Unknown,
        }
    }

    /// Resolves a source temporal to its output form.
    ///
    /// Returns the resolved value and the zone name it contributes to
    /// the document's zone set, if any. Date-only values contribute
    /// nothing; floating values contribute the caller's default zone
    /// label.
    pub fn resolve(
        &mut self,
        temporal: &Temporal,
        target: Option<&TargetZone>,
        default_zone: &str,
    ) -> (ResolvedTemporal, Option<String>) {
        match temporal {
            Temporal::Date(d) => {
                let date = NaiveDate::from_ymd_opt(
                    i32::from(d.year),
                    u32::from(d.month),
                    u32::from(d.day),
                )
                .unwrap_or_default();
                (ResolvedTemporal::Date(date), None)
            }
            Temporal::DateTime(dt) => {
                let naive = ical_naive(dt);
                match &dt.zone {
                    ZoneRef::Utc => {
                        let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(naive, Utc);
                        match target {
                            Some(target) => {
                                let local = utc.with_timezone(&target.tz);
                                (
                                    ResolvedTemporal::Zoned {
                                        local: local.naive_local(),
                                        offset_secs: local.offset().fix().local_minus_utc(),
                                        zone: target.name.clone(),
                                    },
                                    Some(target.name.clone()),
                                )
                            }
                            None => (ResolvedTemporal::Utc(utc), Some("UTC".to_string())),
                        }
                    }
                    ZoneRef::Named { tzid } => self.resolve_named(naive, tzid, default_zone),
                    ZoneRef::Floating => (
                        ResolvedTemporal::Floating(naive),
                        Some(default_zone.to_string()),
                    ),
                }
            }
        }
    }

    /// Drains the warnings accumulated so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn resolve_named(
        &mut self,
        naive: NaiveDateTime,
        tzid: &str,
        default_zone: &str,
    ) -> (ResolvedTemporal, Option<String>) {
        if let Some(definition) = self.definitions.get(tzid) {
            return (
                ResolvedTemporal::Zoned {
                    local: naive,
                    offset_secs: definition.offset_at(naive),
                    zone: tzid.to_string(),
                },
                Some(tzid.to_string()),
            );
        }

        if let Some(tz) = self.resolve_iana(tzid) {
            let (local, offset_secs) = match tz.from_local_datetime(&naive) {
                // RFC 5545 §3.3.5: an ambiguous time denotes its first
                // (pre-transition) occurrence
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    (naive, dt.offset().fix().local_minus_utc())
                }
                LocalResult::None => {
                    let shifted = naive + TimeDelta::hours(1);
                    let message = format!(
                        "{naive} does not exist in {tzid} (DST gap), shifted to {shifted}"
                    );
                    warn!("{message}");
                    self.warnings.push(message);
                    let offset = match tz.from_local_datetime(&shifted) {
                        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                            dt.offset().fix().local_minus_utc()
                        }
                        LocalResult::None => 0,
                    };
                    (shifted, offset)
                }
            };
            let name = tz.name().to_string();
            return (
                ResolvedTemporal::Zoned {
                    local,
                    offset_secs,
                    zone: name.clone(),
                },
                Some(name),
            );
        }

        if self.unresolvable.insert(tzid.to_string()) {
            let message = format!("unknown time zone {tzid:?}, treating value as floating");
            warn!("{message}");
            self.warnings.push(message);
        }
        (
            ResolvedTemporal::Floating(naive),
            Some(default_zone.to_string()),
        )
    }

    fn resolve_iana(&mut self, tzid: &str) -> Option<Tz> {
        if let Some(tz) = self.iana_cache.get(tzid) {
            return Some(*tz);
        }
        let tz = Tz::from_str(normalize_tzid(tzid)).ok()?;
        self.iana_cache.insert(tzid.to_string(), tz);
        Some(tz)
    }
}

/// Strips the vendor prefixes some producers put on otherwise-standard
/// TZIDs, e.g. `/mozilla.org/20070129_1/Europe/Paris`.
fn normalize_tzid(tzid: &str) -> &str {
    for prefix in ["/mozilla.org/", "/softwarestudio.org/"] {
        if let Some(stripped) = tzid.strip_prefix(prefix) {
            // The vendor prefix may carry a date segment before the
            // IANA name
            let mut rest = stripped;
            while let Some((head, tail)) = rest.split_once('/') {
                if head.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    rest = tail;
                } else {
                    break;
                }
            }
            return rest;
        }
    }
    tzid
}

/// Converts a parsed date-time's fields to a chrono naive value.
pub(crate) fn ical_naive(dt: &koyomi_ical::core::DateTime) -> NaiveDateTime {
    let date = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))
        .unwrap_or_default();
    let time =
        NaiveTime::from_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
            .unwrap_or_default();
    NaiveDateTime::new(date, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use koyomi_ical::core::DateTime as IcalDateTime;

    fn resolve_one(temporal: &Temporal) -> ResolvedTemporal {
        ZoneResolver::new().resolve(temporal, None, "Local").0
    }

    #[test]
    fn utc_value_renders_with_z() {
        let temporal = Temporal::DateTime(IcalDateTime::utc(2024, 1, 23, 12, 0, 0));
        let resolved = resolve_one(&temporal);
        assert_eq!(resolved.to_string(), "2024-01-23T12:00:00Z");
    }

    #[test]
    fn utc_value_converts_to_target_zone() {
        let target = TargetZone::new("Europe/Paris").unwrap();
        let temporal = Temporal::DateTime(IcalDateTime::utc(2024, 1, 23, 12, 0, 0));
        let (resolved, zone) = ZoneResolver::new().resolve(&temporal, Some(&target), "Local");
        // Paris in January is UTC+1
        assert_eq!(resolved.to_string(), "2024-01-23T13:00:00+01:00");
        assert_eq!(zone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn named_zone_offsets_have_correct_sign() {
        let paris = Temporal::DateTime(IcalDateTime::named(2024, 1, 23, 9, 0, 0, "Europe/Paris"));
        assert_eq!(resolve_one(&paris).to_string(), "2024-01-23T09:00:00+01:00");

        let new_york =
            Temporal::DateTime(IcalDateTime::named(2024, 1, 23, 9, 0, 0, "America/New_York"));
        assert_eq!(
            resolve_one(&new_york).to_string(),
            "2024-01-23T09:00:00-05:00"
        );
    }

    #[test]
    fn date_only_never_gains_a_zone() {
        let temporal = Temporal::Date(koyomi_ical::core::Date::new(2024, 3, 1));
        let (resolved, zone) =
            ZoneResolver::new().resolve(&temporal, Some(&TargetZone::new("UTC").unwrap()), "Local");
        assert_eq!(resolved.to_string(), "2024-03-01");
        assert_eq!(zone, None);
    }

    #[test]
    fn floating_value_contributes_default_zone() {
        let temporal = Temporal::DateTime(IcalDateTime::floating(2024, 1, 23, 9, 0, 0));
        let (resolved, zone) = ZoneResolver::new().resolve(&temporal, None, "Asia/Tokyo");
        assert_eq!(resolved.to_string(), "2024-01-23T09:00:00");
        assert_eq!(zone.as_deref(), Some("Asia/Tokyo"));
    }

    #[test_log::test]
    fn unknown_tzid_degrades_to_floating_with_warning() {
        let temporal =
            Temporal::DateTime(IcalDateTime::named(2024, 1, 23, 9, 0, 0, "Nowhere/Imaginary"));
        let mut resolver = ZoneResolver::new();
        let (resolved, _) = resolver.resolve(&temporal, None, "Local");
        assert!(matches!(resolved, ResolvedTemporal::Floating(_)));
        assert_eq!(resolver.take_warnings().len(), 1);
    }

    #[test_log::test]
    fn dst_gap_shifts_forward_with_warning() {
        // 2024-03-10 02:30 does not exist in New York
        let temporal =
            Temporal::DateTime(IcalDateTime::named(2024, 3, 10, 2, 30, 0, "America/New_York"));
        let mut resolver = ZoneResolver::new();
        let (resolved, _) = resolver.resolve(&temporal, None, "Local");
        assert_eq!(resolved.to_string(), "2024-03-10T03:30:00-04:00");
        assert_eq!(resolver.take_warnings().len(), 1);
    }

    #[test]
    fn dst_fold_picks_first_occurrence() {
        // 2024-11-03 01:30 occurs twice in New York; the first is EDT (-4)
        let temporal =
            Temporal::DateTime(IcalDateTime::named(2024, 11, 3, 1, 30, 0, "America/New_York"));
        assert_eq!(
            resolve_one(&temporal).to_string(),
            "2024-11-03T01:30:00-04:00"
        );
    }

    #[test]
    fn vendor_prefix_is_stripped() {
        assert_eq!(
            normalize_tzid("/mozilla.org/20070129_1/Europe/Paris"),
            "Europe/Paris"
        );
        assert_eq!(
            normalize_tzid("/softwarestudio.org/America/New_York"),
            "America/New_York"
        );
        assert_eq!(normalize_tzid("Europe/Paris"), "Europe/Paris");
    }

    #[test]
    fn iso_round_trip_preserves_classification() {
        let cases = [
            "2024-03-01",
            "2024-01-23T12:00:00Z",
            "2024-01-23T09:00:00+01:00",
            "2024-01-23T09:00:00-05:00",
            "2024-01-23T09:00:00",
        ];
        for case in cases {
            let parsed = ResolvedTemporal::parse_iso(case).unwrap();
            assert_eq!(parsed.to_string(), case);
        }
        assert!(matches!(
            ResolvedTemporal::parse_iso("2024-01-23T12:00:00Z"),
            Some(ResolvedTemporal::Utc(_))
        ));
        assert!(matches!(
            ResolvedTemporal::parse_iso("2024-01-23T09:00:00+01:00"),
            Some(ResolvedTemporal::Zoned { offset_secs: 3600, .. })
        ));
        assert!(matches!(
            ResolvedTemporal::parse_iso("2024-01-23T09:00:00"),
            Some(ResolvedTemporal::Floating(_))
        ));
    }

    #[test]
    fn instant_accounts_for_offset() {
        let zoned = ResolvedTemporal::parse_iso("2024-01-23T09:00:00+01:00").unwrap();
        let utc = ResolvedTemporal::parse_iso("2024-01-23T08:00:00Z").unwrap();
        assert_eq!(zoned.instant(), utc.instant());
        assert_eq!(ResolvedTemporal::parse_iso("2024-03-01").unwrap().instant(), None);
    }

    #[test]
    fn target_zone_rejects_unknown_names() {
        assert!(matches!(
            TargetZone::new("Not/A_Zone"),
            Err(EngineError::UnresolvableZone { .. })
        ));
        assert!(TargetZone::new("UTC").is_ok());
    }
}
