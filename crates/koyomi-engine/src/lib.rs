//! Calendar normalization engine.
//!
//! Takes iCalendar text and produces a normalized agenda: every event's
//! occurrences expanded, every time value resolved against its zone,
//! and the set of zones the document touches aggregated. Parsing is
//! delegated to `koyomi-ical`; this crate owns the semantics.
//!
//! ```rust
//! use koyomi_engine::{AgendaOptions, build_agenda};
//!
//! let input = "\
//! BEGIN:VCALENDAR\r\n\
//! BEGIN:VEVENT\r\n\
//! UID:standup@example.com\r\n\
//! SUMMARY:Standup\r\n\
//! DTSTART:20240101T090000Z\r\n\
//! RRULE:FREQ=DAILY;COUNT=3\r\n\
//! END:VEVENT\r\n\
//! END:VCALENDAR\r\n";
//!
//! let agenda = build_agenda(input, &AgendaOptions::default()).unwrap();
//! assert_eq!(agenda.occurrences.len(), 3);
//! assert!(agenda.zones.contains("UTC"));
//! ```

pub mod agenda;
pub mod error;
pub mod event;
pub mod expand;
pub mod vtimezone;
pub mod zone;

pub use agenda::{
    Agenda, AgendaOptions, DEFAULT_OCCURRENCE_CAP, InvalidEventPolicy, Occurrence, build_agenda,
};
pub use error::{EngineError, EngineResult};
pub use event::VEvent;
pub use expand::{Expansion, expand_event};
pub use zone::{ResolvedTemporal, TargetZone, ZoneResolver};
