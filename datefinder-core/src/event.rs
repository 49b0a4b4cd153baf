//! The event aggregate: one poll over a window of candidate dates.
//!
//! An event document round-trips losslessly through a store backend as JSON.
//! Dates stay `YYYY-MM-DD` strings end to end; `created_at` is a millisecond
//! UNIX timestamp on the wire.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date_window::DateWindow;
use crate::error::DateFinderResult;

/// Opaque participant key, generated once per device.
pub type ParticipantId = String;

/// One voter: a display name and the set of dates that work for them.
///
/// The date set is only ever replaced wholesale, never patched. A participant
/// who unmarks everything keeps their entry with an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub dates: BTreeSet<NaiveDate>,
}

/// Candidate dates for an event: either explicit bounds or the legacy
/// whole-month shape older documents carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventWindow {
    Range { window: DateWindow },
    LegacyMonth { month: u32, year: i32 },
}

impl EventWindow {
    /// The effective window; legacy `{month, year}` resolves to the first
    /// through last day of that month.
    pub fn resolve(&self) -> DateFinderResult<DateWindow> {
        match *self {
            EventWindow::Range { window } => Ok(window),
            EventWindow::LegacyMonth { month, year } => DateWindow::month(year, month),
        }
    }
}

/// The aggregate root: everything a store backend persists per event.
///
/// Participant ids are unique by construction (map key). Ordered maps keep
/// every read of the document deterministic regardless of who wrote it last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub window: EventWindow,
    #[serde(default)]
    pub participants: BTreeMap<ParticipantId, Participant>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl EventData {
    /// A fresh event containing exactly one participant: the creator, with an
    /// empty date set.
    pub fn new(name: &str, window: DateWindow, creator_name: &str, creator_id: &str) -> Self {
        let mut participants = BTreeMap::new();
        participants.insert(
            creator_id.to_string(),
            Participant {
                name: creator_name.to_string(),
                dates: BTreeSet::new(),
            },
        );

        EventData {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            window: EventWindow::Range { window },
            participants,
            // Millisecond precision: the wire format stores a UNIX ms timestamp
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// A participant's current date set; empty if they are not registered yet.
    pub fn participant_dates(&self, participant_id: &str) -> BTreeSet<NaiveDate> {
        self.participants
            .get(participant_id)
            .map(|p| p.dates.clone())
            .unwrap_or_default()
    }

    /// The replacement set after flipping one date for a participant.
    ///
    /// Pure: the aggregate itself is never mutated in place — the caller sends
    /// the returned set through the store as a full replacement.
    pub fn toggled_dates(&self, participant_id: &str, date: NaiveDate) -> BTreeSet<NaiveDate> {
        let mut dates = self.participant_dates(participant_id);
        toggle(&mut dates, date);
        dates
    }
}

/// Flip one date in a selection. Returns true when the date is now selected.
pub fn toggle(dates: &mut BTreeSet<NaiveDate>, date: NaiveDate) -> bool {
    if dates.remove(&date) {
        false
    } else {
        dates.insert(date);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::new(date("2026-05-01"), date("2026-05-31")).unwrap()
    }

    #[test]
    fn test_new_event_contains_only_the_creator_with_empty_set() {
        let event = EventData::new("BBQ", window(), "Alice", "creator-1");
        assert_eq!(event.participants.len(), 1);
        let creator = &event.participants["creator-1"];
        assert_eq!(creator.name, "Alice");
        assert!(creator.dates.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_original_set() {
        let mut event = EventData::new("BBQ", window(), "Alice", "creator-1");
        let original = event.participant_dates("creator-1");

        let selected = event.toggled_dates("creator-1", date("2026-05-10"));
        assert!(selected.contains(&date("2026-05-10")));
        event.participants.get_mut("creator-1").unwrap().dates = selected;

        let unselected = event.toggled_dates("creator-1", date("2026-05-10"));
        assert_eq!(unselected, original);
    }

    #[test]
    fn test_unknown_participant_has_empty_dates() {
        let event = EventData::new("BBQ", window(), "Alice", "creator-1");
        assert!(event.participant_dates("nobody").is_empty());
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let mut event = EventData::new("BBQ", window(), "Alice", "creator-1");
        event
            .participants
            .get_mut("creator-1")
            .unwrap()
            .dates
            .insert(date("2026-05-10"));

        let json = serde_json::to_string(&event).unwrap();
        let back: EventData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(json.contains("2026-05-10"));
    }

    #[test]
    fn test_legacy_month_document_resolves_to_full_month() {
        let json = r#"{
            "id": "abc1234",
            "name": "Picnic",
            "month": 6,
            "year": 2026,
            "participants": {
                "p1": { "name": "Ann", "dates": ["2026-06-05"] }
            },
            "created_at": 1750000000000
        }"#;

        let event: EventData = serde_json::from_str(json).unwrap();
        let window = event.window.resolve().unwrap();
        assert_eq!(window.start(), date("2026-06-01"));
        assert_eq!(window.end(), date("2026-06-30"));
        assert_eq!(event.participants["p1"].dates.len(), 1);
    }

    #[test]
    fn test_missing_participants_field_defaults_to_empty() {
        let json = r#"{
            "id": "abc1234",
            "name": "Picnic",
            "window": { "start": "2026-06-01", "end": "2026-06-30" },
            "created_at": 1750000000000
        }"#;

        let event: EventData = serde_json::from_str(json).unwrap();
        assert!(event.participants.is_empty());
    }
}
