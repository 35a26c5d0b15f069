//! iCalendar core models (RFC 5545).
//!
//! These types represent parsed iCalendar content structurally. Properties
//! keep both their typed value and the original raw text, so higher layers
//! can reject a bad value without losing what the producer wrote.

mod component;
mod duration;
mod parameter;
mod property;
mod rrule;
mod temporal;
mod value;

pub use component::{CalendarDocument, Component, ComponentKind};
pub use duration::Duration;
pub use parameter::Parameter;
pub use property::{ContentLine, Property};
pub use rrule::{Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};
pub use temporal::{Date, DateTime, Temporal, Time, ZoneRef};
pub use value::{UtcOffset, Value};
