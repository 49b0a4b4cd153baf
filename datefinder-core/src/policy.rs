//! Per-day selectability rules.
//!
//! The write path is gated here: only selectable dates may be toggled. The
//! aggregation read path deliberately does not re-check — a snapshot may
//! contain out-of-window dates (e.g. written before the rules tightened) and
//! they still count.

use chrono::NaiveDate;

use crate::date_window::DateWindow;
use crate::error::{DateFinderError, DateFinderResult};

/// Why a day can or cannot be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    /// Inside the window and not in the past. `is_today` is a display hint,
    /// not a separate classification.
    Selectable { is_today: bool },
    /// Strictly before today, even when inside the window.
    PastDate,
    /// On or after today but outside the event window.
    OutsideWindow,
}

impl DayClass {
    pub fn is_selectable(self) -> bool {
        matches!(self, DayClass::Selectable { .. })
    }
}

/// Classify one day. Past-ness takes precedence over window membership.
pub fn classify(date: NaiveDate, window: DateWindow, today: NaiveDate) -> DayClass {
    if date < today {
        DayClass::PastDate
    } else if !window.contains(date) {
        DayClass::OutsideWindow
    } else {
        DayClass::Selectable {
            is_today: date == today,
        }
    }
}

/// Reject a toggle of a non-selectable date.
pub fn ensure_selectable(
    date: NaiveDate,
    window: DateWindow,
    today: NaiveDate,
) -> DateFinderResult<()> {
    match classify(date, window, today) {
        DayClass::Selectable { .. } => Ok(()),
        DayClass::PastDate => Err(DateFinderError::InvalidSelection {
            date,
            reason: "it is in the past".to_string(),
        }),
        DayClass::OutsideWindow => Err(DateFinderError::InvalidSelection {
            date,
            reason: format!("it is outside the event window {window}"),
        }),
    }
}
