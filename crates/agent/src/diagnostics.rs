//! File-backed diagnostic sink: append-only JSON lines.
//!
//! Each line is one JSON-encoded [`DiagnosticRecord`]. The file is opened in
//! append mode once and kept open; write failures are logged and swallowed
//! because the interpreter never depends on the diagnostic trail.

use culturedrone_core::diagnostic::{DiagnosticRecord, DiagnosticSink};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Appends every record to a JSONL file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Diagnostic log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiagnosticSink for JsonlSink {
    fn record(&self, record: &DiagnosticRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode diagnostic record");
                return;
            }
        };

        let Ok(mut file) = self.file.lock() else {
            warn!("Diagnostic log lock poisoned");
            return;
        };

        if let Err(e) = writeln!(file, "{line}") {
            warn!(path = %self.path.display(), error = %e, "Failed to write diagnostic record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use culturedrone_core::diagnostic::DiagnosticEvent;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("drone_api.jsonl");
        let sink = JsonlSink::open(&path).unwrap();

        sink.record(&DiagnosticRecord::now(DiagnosticEvent::RawReply {
            text: "```json {} ```".into(),
        }));
        sink.record(&DiagnosticRecord::now(DiagnosticEvent::Parsed {
            response_text: "hi".into(),
            action: "none".into(),
        }));

        let lines = read_lines(sink.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "raw_reply");
        assert_eq!(lines[0]["text"], "```json {} ```");
        assert_eq!(lines[1]["event"], "parsed");
        assert_eq!(lines[1]["action"], "none");
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drone_api.jsonl");

        JsonlSink::open(&path).unwrap().record(&DiagnosticRecord::now(DiagnosticEvent::Emitted {
            message: "first".into(),
        }));
        JsonlSink::open(&path).unwrap().record(&DiagnosticRecord::now(DiagnosticEvent::Emitted {
            message: "second".into(),
        }));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["message"], "second");
    }

    #[test]
    fn records_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drone_api.jsonl");
        let sink = JsonlSink::open(&path).unwrap();
        sink.record(&DiagnosticRecord::now(DiagnosticEvent::RepetitionDetected {
            similarity: 0.9,
            previous: "I'm Mavvik.".into(),
        }));

        let content = std::fs::read_to_string(&path).unwrap();
        let record: DiagnosticRecord = serde_json::from_str(content.trim()).unwrap();
        assert!(matches!(
            record.event,
            DiagnosticEvent::RepetitionDetected { ref previous, .. } if previous == "I'm Mavvik."
        ));
    }
}
