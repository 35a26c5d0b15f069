//! iCalendar component tree (RFC 5545 §3.6).

use std::fmt;

use super::Property;

/// Known iCalendar component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR, the root component.
    Calendar,
    /// VEVENT.
    Event,
    /// VTODO.
    Todo,
    /// VJOURNAL.
    Journal,
    /// VFREEBUSY.
    FreeBusy,
    /// VTIMEZONE.
    Timezone,
    /// VALARM.
    Alarm,
    /// STANDARD observance inside a VTIMEZONE.
    Standard,
    /// DAYLIGHT observance inside a VTIMEZONE.
    Daylight,
    /// Any component this library does not model. The original name is
    /// preserved on the [`Component`].
    Unknown,
}

impl ComponentKind {
    /// Maps a component name (as written after `BEGIN:`) to its kind.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// A parsed iCalendar component: a name, properties, and child
/// components, preserved in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// The recognized kind, or [`ComponentKind::Unknown`].
    pub kind: ComponentKind,
    /// The component name exactly as written after `BEGIN:`.
    pub name: String,
    /// Properties in declaration order.
    pub properties: Vec<Property>,
    /// Nested components in declaration order.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates an empty component with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: ComponentKind::from_name(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the first property with the given name, if present.
    /// Property names are matched case-insensitively.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns every property with the given name, in declaration order.
    pub fn properties(&self, name: &str) -> impl Iterator<Item = &Property> {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns child components of the given kind, in declaration order.
    pub fn children_of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A parsed iCalendar document: the VCALENDAR root component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument {
    /// The root VCALENDAR component.
    pub root: Component,
}

impl CalendarDocument {
    /// Returns the VEVENT components, in document order.
    pub fn events(&self) -> impl Iterator<Item = &Component> {
        self.root.children_of_kind(ComponentKind::Event)
    }

    /// Returns the VTIMEZONE components, in document order.
    pub fn timezones(&self) -> impl Iterator<Item = &Component> {
        self.root.children_of_kind(ComponentKind::Timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn component_kind_from_name() {
        assert_eq!(ComponentKind::from_name("VEVENT"), ComponentKind::Event);
        assert_eq!(ComponentKind::from_name("vevent"), ComponentKind::Event);
        assert_eq!(
            ComponentKind::from_name("X-CUSTOM-THING"),
            ComponentKind::Unknown
        );
    }

    #[test]
    fn property_lookup_is_case_insensitive() {
        let mut component = Component::new("VEVENT");
        component.properties.push(Property {
            name: "SUMMARY".into(),
            parameters: Vec::new(),
            value: Value::Text("Standup".into()),
            raw_value: "Standup".into(),
        });
        assert!(component.property("summary").is_some());
        assert!(component.property("DESCRIPTION").is_none());
    }

    #[test]
    fn document_order_is_preserved() {
        let mut root = Component::new("VCALENDAR");
        for summary in ["first", "second", "third"] {
            let mut event = Component::new("VEVENT");
            event.properties.push(Property {
                name: "SUMMARY".into(),
                parameters: Vec::new(),
                value: Value::Text(summary.into()),
                raw_value: summary.into(),
            });
            root.children.push(event);
        }
        let document = CalendarDocument { root };
        let summaries: Vec<_> = document
            .events()
            .filter_map(|e| e.property("SUMMARY").and_then(Property::as_text))
            .collect();
        assert_eq!(summaries, ["first", "second", "third"]);
    }
}
