//! Event documents on the local filesystem.
//!
//! One JSON file per event under `<data_dir>/events/`. Writes go through a
//! temp file and an atomic rename, so a concurrent watcher never observes a
//! torn document; whichever write lands last wins.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use datefinder_core::event::EventData;

const EVENTS_DIR: &str = "events";

pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        FileStore {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn events_dir(&self) -> PathBuf {
        self.data_dir.join(EVENTS_DIR)
    }

    pub fn event_path(&self, event_id: &str) -> PathBuf {
        self.events_dir().join(format!("{event_id}.json"))
    }

    /// Read one event document; `None` when it does not exist.
    pub fn read_event(&self, event_id: &str) -> Result<Option<EventData>> {
        let path = self.event_path(event_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let event: EventData = serde_json::from_str(&content)
            .with_context(|| format!("Malformed event document {}", path.display()))?;
        Ok(Some(event))
    }

    /// Write one event document atomically (temp file + rename).
    pub fn write_event(&self, event: &EventData) -> Result<()> {
        let dir = self.events_dir();
        std::fs::create_dir_all(&dir)?;

        let path = self.event_path(&event.id);
        let temp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(event)?;
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    /// Persist a new event aggregate; returns its id.
    pub fn create_event(&self, event: &EventData) -> Result<String> {
        self.write_event(event)?;
        Ok(event.id.clone())
    }

    /// Replace one participant's entire entry. The entry is created if the
    /// participant is new; the event itself must already exist.
    pub fn replace_participant_dates(
        &self,
        event_id: &str,
        participant_id: &str,
        participant_name: &str,
        dates: BTreeSet<NaiveDate>,
    ) -> Result<()> {
        let Some(mut event) = self.read_event(event_id)? else {
            bail!("Event not found: {event_id}");
        };

        event.participants.insert(
            participant_id.to_string(),
            datefinder_core::event::Participant {
                name: participant_name.to_string(),
                dates,
            },
        );

        self.write_event(&event)
    }

    /// Observable state of an event file, for change polling.
    pub fn fingerprint(&self, event_id: &str) -> Option<std::time::SystemTime> {
        std::fs::metadata(self.event_path(event_id))
            .and_then(|m| m.modified())
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datefinder_core::DateWindow;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_event() -> EventData {
        let window =
            DateWindow::new(date("2026-05-01"), date("2026-05-31")).unwrap();
        EventData::new("BBQ", window, "Alice", "creator-1")
    }

    #[test]
    fn test_event_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let event = sample_event();
        let id = store.create_event(&event).unwrap();
        assert_eq!(id, event.id);

        let back = store.read_event(&id).unwrap().unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_missing_event_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read_event("nope").unwrap().is_none());
    }

    #[test]
    fn test_replace_participant_dates_is_whole_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let event = sample_event();
        store.create_event(&event).unwrap();

        let dates: BTreeSet<NaiveDate> =
            [date("2026-05-10"), date("2026-05-11")].into_iter().collect();
        store
            .replace_participant_dates(&event.id, "p2", "Bob", dates.clone())
            .unwrap();

        let back = store.read_event(&event.id).unwrap().unwrap();
        assert_eq!(back.participants.len(), 2);
        assert_eq!(back.participants["p2"].dates, dates);

        // Replacing again with a smaller set drops the unlisted date
        let fewer: BTreeSet<NaiveDate> = [date("2026-05-11")].into_iter().collect();
        store
            .replace_participant_dates(&event.id, "p2", "Bob", fewer.clone())
            .unwrap();
        let back = store.read_event(&event.id).unwrap().unwrap();
        assert_eq!(back.participants["p2"].dates, fewer);
    }

    #[test]
    fn test_replace_on_missing_event_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store
            .replace_participant_dates("ghost", "p1", "Ann", BTreeSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("Event not found"));
    }
}
