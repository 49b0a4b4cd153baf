//! The inclusive range of calendar dates offered for selection in one event.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DateFinderError, DateFinderResult};

/// Inclusive `[start, end]` range of selectable dates.
///
/// The bounds are fixed when the event is created and never resized.
/// Construction enforces `start <= end`; deserialization re-checks it, so a
/// window read back from a store carries the same guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds", into = "WindowBounds")]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// Raw serde form of a window, before the invariant check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct WindowBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<WindowBounds> for DateWindow {
    type Error = DateFinderError;

    fn try_from(bounds: WindowBounds) -> DateFinderResult<Self> {
        DateWindow::new(bounds.start, bounds.end)
    }
}

impl From<DateWindow> for WindowBounds {
    fn from(window: DateWindow) -> Self {
        WindowBounds {
            start: window.start,
            end: window.end,
        }
    }
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DateFinderResult<Self> {
        if start > end {
            return Err(DateFinderError::InvalidRange { start, end });
        }
        Ok(DateWindow { start, end })
    }

    /// Window covering a whole calendar month (month is 1-12).
    ///
    /// Legacy events carry `{month, year}` instead of explicit bounds; they
    /// resolve to the first through last day of that month.
    pub fn month(year: i32, month: u32) -> DateFinderResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(DateFinderError::InvalidMonth { month, year })?;
        let end = last_day_of_month(year, month)
            .ok_or(DateFinderError::InvalidMonth { month, year })?;
        DateWindow::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the window, start to end. Finite; a fresh iterator on
    /// each call.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = DateWindow::new(date("2026-03-10"), date("2026-03-01")).unwrap_err();
        assert!(matches!(err, DateFinderError::InvalidRange { .. }));
    }

    #[test]
    fn test_single_day_window_is_valid() {
        let window = DateWindow::new(date("2026-03-10"), date("2026-03-10")).unwrap();
        assert!(window.contains(date("2026-03-10")));
        assert_eq!(window.days().count(), 1);
    }

    #[test]
    fn test_contains_is_inclusive_on_both_bounds() {
        let window = DateWindow::new(date("2026-03-01"), date("2026-03-31")).unwrap();
        assert!(window.contains(date("2026-03-01")));
        assert!(window.contains(date("2026-03-31")));
        assert!(!window.contains(date("2026-02-28")));
        assert!(!window.contains(date("2026-04-01")));
    }

    #[test]
    fn test_days_is_restartable() {
        let window = DateWindow::new(date("2026-03-01"), date("2026-03-03")).unwrap();
        let first: Vec<_> = window.days().collect();
        let second: Vec<_> = window.days().collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![date("2026-03-01"), date("2026-03-02"), date("2026-03-03")]
        );
    }

    #[test]
    fn test_month_window_covers_whole_month() {
        let window = DateWindow::month(2026, 2).unwrap();
        assert_eq!(window.start(), date("2026-02-01"));
        assert_eq!(window.end(), date("2026-02-28"));

        let december = DateWindow::month(2025, 12).unwrap();
        assert_eq!(december.end(), date("2025-12-31"));
    }

    #[test]
    fn test_month_window_rejects_bad_month() {
        assert!(DateWindow::month(2026, 13).is_err());
        assert!(DateWindow::month(2026, 0).is_err());
    }

    #[test]
    fn test_serde_rejects_inverted_bounds() {
        let json = r#"{"start":"2026-03-10","end":"2026-03-01"}"#;
        assert!(serde_json::from_str::<DateWindow>(json).is_err());
    }

    #[test]
    fn test_serde_uses_iso_dates() {
        let window = DateWindow::new(date("2026-03-01"), date("2026-03-31")).unwrap();
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start":"2026-03-01","end":"2026-03-31"}"#);
        let back: DateWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }
}
