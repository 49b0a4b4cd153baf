//! Terminal rendering for event snapshots.
//!
//! A month-grid heatmap of the vote counts plus the ranked best-dates view,
//! colored with owo_colors.

use chrono::{Datelike, NaiveDate};
use datefinder_core::aggregate::{Aggregation, DateTally, HeatLevel, DEFAULT_RANKED_LIMIT};
use datefinder_core::event::EventData;
use datefinder_core::policy::{self, DayClass};
use datefinder_core::DateWindow;
use owo_colors::OwoColorize;

// Each grid column is 4 chars wide: 2-digit day, own-pick marker, separator
const WEEKDAY_HEADER: &str = "Mo  Tu  We  Th  Fr  Sa  Su";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The full calendar view: header, one grid per month the window touches,
/// and a legend.
pub fn render_calendar(
    event: &EventData,
    window: DateWindow,
    viewer_id: Option<&str>,
    today: NaiveDate,
) -> String {
    let aggregation = Aggregation::of(&event.participants);
    let own_dates = viewer_id
        .map(|id| event.participant_dates(id))
        .unwrap_or_default();

    let mut lines = Vec::new();
    lines.push(format!(
        "{}  {}",
        event.name.bold(),
        format!(
            "({} participant{})",
            aggregation.participant_count(),
            plural(aggregation.participant_count())
        )
        .dimmed()
    ));
    lines.push(format!("{}", format!("Window: {window}").dimmed()));
    lines.push(String::new());

    for (year, month) in months_of(window) {
        lines.push(render_month(
            year,
            month,
            window,
            &aggregation,
            &own_dates,
            today,
        ));
    }

    lines.push(legend());
    lines.join("\n")
}

/// One month as a Monday-first grid. Each cell is the day number, colored by
/// heat, with `*` marking the viewer's own picks.
fn render_month(
    year: i32,
    month: u32,
    window: DateWindow,
    aggregation: &Aggregation,
    own_dates: &std::collections::BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        MONTH_NAMES[(month - 1) as usize].bold(),
        year.bold()
    ));
    lines.push(WEEKDAY_HEADER.dimmed().to_string());

    // The first day of the month may start mid-week
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or(window.start());
    let mut row = "    ".repeat(first.weekday().num_days_from_monday() as usize);

    for day in first.iter_days().take_while(|d| d.month() == month) {
        row.push_str(&render_day(day, window, aggregation, own_dates, today));
        if day.weekday().num_days_from_monday() == 6 {
            lines.push(row.trim_end().to_string());
            row = String::new();
        } else {
            row.push(' ');
        }
    }
    if !row.trim().is_empty() {
        lines.push(row.trim_end().to_string());
    }
    lines.push(String::new());

    lines.join("\n")
}

fn render_day(
    day: NaiveDate,
    window: DateWindow,
    aggregation: &Aggregation,
    own_dates: &std::collections::BTreeSet<NaiveDate>,
    today: NaiveDate,
) -> String {
    let mark = if own_dates.contains(&day) { '*' } else { ' ' };
    let cell = format!("{:>2}", day.day());

    let colored = match policy::classify(day, window, today) {
        DayClass::PastDate | DayClass::OutsideWindow => cell.dimmed().to_string(),
        DayClass::Selectable { is_today } => {
            let heated = match aggregation.heat(day) {
                HeatLevel::None => cell.clone(),
                HeatLevel::Low => cell.cyan().to_string(),
                HeatLevel::Medium => cell.blue().to_string(),
                HeatLevel::High => cell.blue().bold().to_string(),
            };
            if is_today {
                heated.underline().to_string()
            } else {
                heated
            }
        }
    };

    format!("{colored}{mark}")
}

fn legend() -> String {
    format!(
        "{} your pick   {} today   {}/{}/{} more votes   {} unavailable",
        "*".bold(),
        "_".underline(),
        "low".cyan(),
        "mid".blue(),
        "high".blue().bold(),
        "dim".dimmed(),
    )
}

/// The ranked best-dates view with per-date voters and absentees, followed by
/// the participant list.
pub fn render_results(event: &EventData) -> String {
    let aggregation = Aggregation::of(&event.participants);
    let ranked = aggregation.ranked(DEFAULT_RANKED_LIMIT);

    let mut lines = Vec::new();
    lines.push("Best dates".bold().to_string());

    if ranked.is_empty() {
        lines.push("  No votes yet".dimmed().to_string());
    } else {
        for (index, tally) in ranked.iter().enumerate() {
            lines.push(render_tally(index, tally));
        }
    }

    lines.push(String::new());
    lines.push(
        format!("Participants ({})", aggregation.participant_count())
            .bold()
            .to_string(),
    );
    for participant in event.participants.values() {
        let count = participant.dates.len();
        lines.push(format!(
            "  {}  {}",
            participant.name,
            format!("{count} date{}", plural(count)).dimmed()
        ));
    }

    lines.join("\n")
}

fn render_tally(index: usize, tally: &DateTally) -> String {
    let bar = "█".repeat(tally.count);
    let mut line = format!(
        "  {}. {}  {} {}",
        index + 1,
        tally.date,
        bar.blue(),
        tally.count
    );

    if tally.absent_names.is_empty() {
        line.push_str(&format!("  {}", "everyone can make it".green()));
    } else {
        line.push_str(&format!(
            "  {}",
            format!("missing: {}", tally.absent_names.join(", ")).red()
        ));
    }

    line
}

/// Every (year, month) pair the window touches, in order.
fn months_of(window: DateWindow) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (window.start().year(), window.start().month());
    let last = (window.end().year(), window.end().month());

    loop {
        months.push((year, month));
        if (year, month) == last {
            break;
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    months
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_months_of_spans_year_boundary() {
        let window = DateWindow::new(date("2026-11-15"), date("2027-01-10")).unwrap();
        assert_eq!(months_of(window), vec![(2026, 11), (2026, 12), (2027, 1)]);
    }

    #[test]
    fn test_months_of_single_month() {
        let window = DateWindow::new(date("2026-05-01"), date("2026-05-31")).unwrap();
        assert_eq!(months_of(window), vec![(2026, 5)]);
    }

    #[test]
    fn test_render_results_lists_absentees() {
        let window = DateWindow::new(date("2026-05-01"), date("2026-05-31")).unwrap();
        let mut event = EventData::new("BBQ", window, "Alice", "p1");
        event
            .participants
            .get_mut("p1")
            .unwrap()
            .dates
            .insert(date("2026-05-10"));
        event.participants.insert(
            "p2".to_string(),
            datefinder_core::event::Participant {
                name: "Bob".to_string(),
                dates: Default::default(),
            },
        );

        let output = render_results(&event);
        assert!(output.contains("2026-05-10"));
        assert!(output.contains("Bob"));
    }
}
