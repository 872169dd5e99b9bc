//! Typed suite activity events and the sinks that receive them.
//!
//! The coordinator owns one `Box<dyn ActivitySink>`; every state transition
//! emits an [`ActivityEvent`]. Sinks never fail the caller.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::core::config::LoggingConfig;
use crate::logger::jsonl::JsonlWriter;

/// Events emitted by the suite coordinator. Serialized with the variant name
/// under `"event"`; none of them carries a raw answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivityEvent {
    SuiteOpened {
        config_hash: String,
    },
    TestStarted {
        test_id: String,
        trial_count: usize,
    },
    ResponseRecorded {
        test_id: String,
        trial_index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_correct: Option<bool>,
    },
    TestCompleted {
        test_id: String,
        outcome: String,
    },
    TestAborted {
        test_id: String,
        trial_index: usize,
        reason: AbortReason,
    },
    ResultsReset {
        cleared: usize,
    },
    ContractViolation {
        code: String,
        message: String,
    },
}

impl ActivityEvent {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ContractViolation { .. } => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Why a session ended without recording a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// User pressed "Back" mid-test.
    UserBack,
    /// Another test was selected while this one was running.
    Replaced,
    /// The suite was reset while this test was running.
    SuiteReset,
    /// The controller rejected an out-of-phase operation.
    ContractViolation,
}

/// Destination for activity events.
pub trait ActivitySink {
    /// Record one event. Must not panic or block on I/O failures.
    fn record(&mut self, event: &ActivityEvent);
}

/// Discards everything; used when logging is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActivitySink for NullSink {
    fn record(&mut self, _event: &ActivityEvent) {}
}

/// Shared in-memory buffer. Clones observe the same event list.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ActivitySink for MemorySink {
    fn record(&mut self, event: &ActivityEvent) {
        self.events.lock().push(event.clone());
    }
}

/// One JSONL line: timestamp and severity ahead of the event's own fields.
#[derive(Debug, Serialize)]
struct LogLine<'a> {
    ts: String,
    severity: Severity,
    #[serde(flatten)]
    event: &'a ActivityEvent,
}

impl<'a> LogLine<'a> {
    fn stamp(event: &'a ActivityEvent) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            severity: event.severity(),
            event,
        }
    }
}

impl ActivitySink for JsonlWriter {
    fn record(&mut self, event: &ActivityEvent) {
        self.append(&LogLine::stamp(event));
    }
}

/// Build the sink described by the `[logging]` config section.
#[must_use]
pub fn sink_from_config(cfg: &LoggingConfig) -> Box<dyn ActivitySink> {
    if cfg.enabled {
        Box::new(JsonlWriter::open(cfg))
    } else {
        Box::new(NullSink)
    }
}
