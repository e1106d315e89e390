//! Durable repetition history.
//!
//! An append-only log of completed repetitions kept in a key-value
//! string store as a JSON list of `{"timestamp": ...}` objects. The log
//! is re-read from the backend on every operation — the backend is a
//! shared resource and its contents may change between calls.

use crate::{Error, RepCompletedEvent, Result, StringStore};
use chrono::{DateTime, Utc};

/// Storage key the log lives under.
pub const HISTORY_KEY: &str = "pushup_history";

/// Stable human-readable timestamp format used for display and CSV export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Format a repetition timestamp for display and export.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Append-only repetition log over a [`StringStore`] backend.
///
/// Entries are never reordered or individually removed; the only
/// destructive operation is a whole-log [`clear`](Self::clear).
pub struct HistoryStore<S: StringStore> {
    store: S,
    key: String,
}

impl<S: StringStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the full log from the backend.
    ///
    /// Unparsable stored data is treated as an empty log (fail open):
    /// history cannot be reconstructed, and blocking the counter on it
    /// would be worse than losing it.
    fn read_log(&self) -> Result<Vec<RepCompletedEvent>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(events) => Ok(events),
            Err(e) => {
                tracing::warn!("Stored history is unreadable ({}), treating as empty", e);
                Ok(Vec::new())
            }
        }
    }

    /// Append one event to the end of the persisted log.
    ///
    /// Storage failures surface as [`Error::Persistence`]; the caller's
    /// in-session counter has already advanced and stays valid.
    pub fn append(&mut self, event: &RepCompletedEvent) -> Result<()> {
        let mut log = self.read_log()?;
        log.push(event.clone());
        self.store.set(&self.key, &serde_json::to_string(&log)?)?;
        tracing::debug!(total = log.len(), "Appended repetition to history");
        Ok(())
    }

    /// The full log in append order, fresh from the backend.
    pub fn list(&self) -> Result<Vec<RepCompletedEvent>> {
        self.read_log()
    }

    /// Number of recorded repetitions.
    pub fn count(&self) -> Result<u64> {
        Ok(self.read_log()?.len() as u64)
    }

    /// Remove all entries.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(&self.key)?;
        tracing::info!("Cleared repetition history");
        Ok(())
    }

    /// Render the log as CSV: `Repetition,Timestamp` header, 1-based
    /// index, timestamps in [`TIMESTAMP_FORMAT`].
    ///
    /// Fails with [`Error::EmptyHistory`] when there is nothing to
    /// export; callers must surface a notice instead of producing an
    /// empty download.
    pub fn export_csv(&self) -> Result<String> {
        let log = self.read_log()?;
        if log.is_empty() {
            return Err(Error::EmptyHistory);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Repetition", "Timestamp"])?;
        for (index, event) in log.iter().enumerate() {
            writer.write_record([
                (index + 1).to_string(),
                format_timestamp(&event.timestamp),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Other(format!("CSV writer: {e}")))?;
        String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn test_history() -> (TempDir, HistoryStore<FileStore>) {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(FileStore::new(temp_dir.path()));
        (temp_dir, history)
    }

    fn event_at(secs: u32) -> RepCompletedEvent {
        RepCompletedEvent::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, secs).unwrap())
    }

    #[test]
    fn test_append_then_list_preserves_order() {
        let (_dir, mut history) = test_history();

        history.append(&event_at(1)).unwrap();
        history.append(&event_at(2)).unwrap();
        history.append(&event_at(3)).unwrap();

        let log = history.list().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], event_at(1));
        assert_eq!(log[2], event_at(3));
    }

    #[test]
    fn test_empty_store_lists_empty() {
        let (_dir, history) = test_history();
        assert!(history.list().unwrap().is_empty());
        assert_eq!(history.count().unwrap(), 0);
    }

    #[test]
    fn test_clear_empties_log() {
        let (_dir, mut history) = test_history();

        history.append(&event_at(1)).unwrap();
        history.clear().unwrap();

        assert!(history.list().unwrap().is_empty());
        assert_eq!(history.count().unwrap(), 0);
    }

    #[test]
    fn test_export_empty_history_is_an_error() {
        let (_dir, history) = test_history();
        assert!(matches!(history.export_csv(), Err(Error::EmptyHistory)));
    }

    #[test]
    fn test_export_csv_exact_output() {
        let (_dir, mut history) = test_history();
        history.append(&event_at(5)).unwrap();
        history.append(&event_at(9)).unwrap();

        let csv = history.export_csv().unwrap();
        assert_eq!(
            csv,
            "Repetition,Timestamp\n\
             1,2024-06-01 12:00:05 UTC\n\
             2,2024-06-01 12:00:09 UTC\n"
        );
    }

    #[test]
    fn test_corrupted_log_fails_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set(HISTORY_KEY, "{ not a list }").unwrap();

        let mut history = HistoryStore::new(store);
        assert!(history.list().unwrap().is_empty());

        // Appending starts a fresh log rather than failing
        history.append(&event_at(1)).unwrap();
        assert_eq!(history.count().unwrap(), 1);
    }

    #[test]
    fn test_stored_encoding_is_a_timestamp_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut history = HistoryStore::new(FileStore::new(temp_dir.path()));
        history.append(&event_at(0)).unwrap();

        let raw = std::fs::read_to_string(
            temp_dir.path().join(format!("{HISTORY_KEY}.json")),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.is_array());
        assert!(parsed[0]["timestamp"].is_string());
    }

    #[test]
    fn test_external_clear_visible_on_next_list() {
        // No in-process caching: a clear through another handle shows up.
        let temp_dir = tempfile::tempdir().unwrap();
        let mut history = HistoryStore::new(FileStore::new(temp_dir.path()));
        history.append(&event_at(1)).unwrap();

        let mut other = HistoryStore::new(FileStore::new(temp_dir.path()));
        other.clear().unwrap();

        assert!(history.list().unwrap().is_empty());
    }
}
