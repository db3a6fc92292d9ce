//! Diagnostic records: a write-only trail of what the oracle said and what
//! the interpreter made of it.
//!
//! Sinks are injected into the interpreter so the state machine can be tested
//! without touching the filesystem. Nothing in the interpreter ever reads a
//! sink back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A single diagnostic entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DiagnosticEvent,
}

impl DiagnosticRecord {
    pub fn now(event: DiagnosticEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Things worth recording while normalizing a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Unmodified assistant text as returned by the provider
    RawReply { text: String },
    /// Cleaned text that could not be parsed
    MalformedReply { text: String, reason: String },
    /// Parsing failed after the corrective retry; the text is spoken as-is
    FallbackUsed { text: String },
    /// Candidate was too close to the previous turn
    RepetitionDetected { similarity: f64, previous: String },
    /// Session repetition budget ran out; the duplicate is accepted
    RepetitionBudgetExhausted { similarity: f64 },
    /// Command accepted for dispatch
    Parsed {
        response_text: String,
        action: String,
    },
    /// Message spoken by the drone
    Emitted { message: String },
    /// The provider call failed
    TransportFailure { error: String },
}

/// Trait for diagnostic sinks (where records are written).
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, record: &DiagnosticRecord);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _record: &DiagnosticRecord) {}
}

/// A tracing-based sink that logs records via `tracing::debug!`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: &DiagnosticRecord) {
        tracing::debug!(event = ?record.event, "diagnostic");
    }
}

/// Keeps records in memory. Useful for tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.records
            .lock()
            .map(|records| records.iter().map(|r| r.event.clone()).collect())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl DiagnosticSink for InMemorySink {
    fn record(&self, record: &DiagnosticRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_keeps_order() {
        let sink = InMemorySink::new();
        sink.record(&DiagnosticRecord::now(DiagnosticEvent::RawReply { text: "a".into() }));
        sink.record(&DiagnosticRecord::now(DiagnosticEvent::Emitted { message: "b".into() }));

        assert_eq!(sink.count(), 2);
        let events = sink.events();
        assert_eq!(events[0], DiagnosticEvent::RawReply { text: "a".into() });
        assert_eq!(events[1], DiagnosticEvent::Emitted { message: "b".into() });
    }

    #[test]
    fn record_serializes_flat_with_event_tag() {
        let record = DiagnosticRecord::now(DiagnosticEvent::TransportFailure {
            error: "connection refused".into(),
        });
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"], "transport_failure");
        assert_eq!(json["error"], "connection refused");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn null_sink_accepts_anything() {
        NullSink.record(&DiagnosticRecord::now(DiagnosticEvent::RepetitionBudgetExhausted {
            similarity: 0.93,
        }));
    }
}
