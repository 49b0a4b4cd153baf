//! Vote aggregation over all participants' date selections.
//!
//! Everything here is derived data, recomputed from a full snapshot on every
//! read and never persisted. The participant mapping and per-participant date
//! sets are ordered collections, so two reads of the same snapshot always
//! produce identical output, whatever order the entries were written in.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::event::{Participant, ParticipantId};

/// Default cutoff for the ranked best-dates list.
pub const DEFAULT_RANKED_LIMIT: usize = 10;

/// Heatmap severity for one day, derived from the share of participants who
/// picked it. Rendering only; thresholds are closed on the upper bound, so a
/// share of exactly 0.25 stays in the lowest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeatLevel {
    None,
    Low,
    Medium,
    High,
}

/// One entry of the ranked best-dates list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTally {
    pub date: NaiveDate,
    /// Number of participants whose set contains the date.
    pub count: usize,
    /// Display names of the voters, in participant-id order.
    pub voter_names: Vec<String>,
    /// Names of everyone who did not vote for this date.
    ///
    /// Computed by name, not id: all participant names minus the voter names.
    /// Two participants sharing a display name are indistinguishable here.
    pub absent_names: Vec<String>,
}

/// Aggregated view over one snapshot of the participant mapping.
pub struct Aggregation {
    participant_count: usize,
    /// All display names in participant-id order, duplicates preserved.
    all_names: Vec<String>,
    /// date -> (count, voter names in participant-id order). Dates nobody
    /// picked are absent.
    tallies: BTreeMap<NaiveDate, (usize, Vec<String>)>,
    counts: BTreeMap<NaiveDate, usize>,
}

impl Aggregation {
    /// Compute the aggregation for a snapshot. Pure; tolerates any date in
    /// any set, including dates outside the event window.
    pub fn of(participants: &BTreeMap<ParticipantId, Participant>) -> Self {
        let all_names: Vec<String> = participants.values().map(|p| p.name.clone()).collect();

        let mut tallies: BTreeMap<NaiveDate, (usize, Vec<String>)> = BTreeMap::new();
        for participant in participants.values() {
            for &date in &participant.dates {
                let entry = tallies.entry(date).or_default();
                entry.0 += 1;
                entry.1.push(participant.name.clone());
            }
        }

        let counts = tallies
            .iter()
            .map(|(&date, &(count, _))| (date, count))
            .collect();

        Aggregation {
            participant_count: participants.len(),
            all_names,
            tallies,
            counts,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    /// Votes per date. Dates with zero votes are absent from the map.
    pub fn vote_counts(&self) -> &BTreeMap<NaiveDate, usize> {
        &self.counts
    }

    /// Votes for one date; 0 when nobody picked it.
    pub fn count(&self, date: NaiveDate) -> usize {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    /// Heatmap bucket for one date.
    pub fn heat(&self, date: NaiveDate) -> HeatLevel {
        let intensity = self.count(date) as f64 / self.participant_count.max(1) as f64;
        if intensity <= 0.25 {
            HeatLevel::None
        } else if intensity <= 0.5 {
            HeatLevel::Low
        } else if intensity <= 0.75 {
            HeatLevel::Medium
        } else {
            HeatLevel::High
        }
    }

    /// The best dates: every date somebody picked, most votes first, earliest
    /// date breaking ties, truncated to `limit`.
    pub fn ranked(&self, limit: usize) -> Vec<DateTally> {
        let mut ranked: Vec<DateTally> = self
            .tallies
            .iter()
            .map(|(&date, (count, voter_names))| {
                let voters: BTreeSet<&str> = voter_names.iter().map(String::as_str).collect();
                let absent_names = self
                    .all_names
                    .iter()
                    .filter(|name| !voters.contains(name.as_str()))
                    .cloned()
                    .collect();

                DateTally {
                    date,
                    count: *count,
                    voter_names: voter_names.clone(),
                    absent_names,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.date.cmp(&b.date)));
        ranked.truncate(limit);
        ranked
    }
}
