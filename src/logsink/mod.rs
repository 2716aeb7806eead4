//! Interaction logging sinks
//!
//! One JSON record per completed exchange. Sinks are best-effort
//! collaborators; the orchestrator guards every emit so a sink failure
//! cannot break an exchange.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Local, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Receives one JSON-serializable record per completed exchange.
pub trait InteractionSink: Send + Sync {
    fn record(&self, entry: &Value) -> io::Result<()>;
}

/// Sink that drops every record. For tests and disabled logging.
#[derive(Debug, Default)]
pub struct NullSink;

impl InteractionSink for NullSink {
    fn record(&self, _entry: &Value) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each record as a pretty-printed JSON file, by default under a
/// subfolder named for the current date.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    root: PathBuf,
    dated_subfolder: bool,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dated_subfolder: true,
        }
    }

    /// Write directly into `root` without the dated subfolder.
    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dated_subfolder: false,
        }
    }

    /// `{utc timestamp}-{uuid}.json`, presumed unique.
    fn filename() -> String {
        format!("{}-{}.json", Utc::now().format("%Y%m%d%H%M%S%f"), Uuid::new_v4())
    }
}

impl InteractionSink for JsonFileSink {
    fn record(&self, entry: &Value) -> io::Result<()> {
        let mut folder = self.root.clone();
        if self.dated_subfolder {
            folder = folder.join(Local::now().format("%Y-%m-%d").to_string());
        }
        fs::create_dir_all(&folder)?;

        let path = folder.join(Self::filename());
        let text = serde_json::to_string_pretty(entry)?;
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("yapbox-logsink-{tag}-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_flat_sink_writes_one_json_file() {
        let dir = scratch_dir("flat");
        let sink = JsonFileSink::flat(&dir);

        sink.record(&json!({"question": "Q", "answer": "A"}))
            .unwrap();

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let path = entries[0].as_ref().unwrap().path();
        assert_eq!(path.extension().unwrap(), "json");
        let written: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["answer"], "A");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_dated_sink_creates_date_subfolder() {
        let dir = scratch_dir("dated");
        let sink = JsonFileSink::new(&dir);

        sink.record(&json!({"k": "v"})).unwrap();

        let expected = dir.join(Local::now().format("%Y-%m-%d").to_string());
        assert!(expected.is_dir());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_null_sink_accepts_anything() {
        assert!(NullSink.record(&json!(null)).is_ok());
    }
}
