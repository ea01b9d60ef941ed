//! Progress event emission system.
//!
//! Provides lightweight, structured progress events for CLI and agent
//! consumers watching a batch run. Events are dispatched through an
//! in-process event bus that supports multiple subscribers and JSONL
//! formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{mpsc, Arc, Mutex};

/// Standard progress event names.
pub mod event_names {
    pub const BATCH_STARTED: &str = "batch_started";
    pub const BATCH_COMPLETE: &str = "batch_complete";

    pub const GROUPING_STARTED: &str = "grouping_started";
    pub const GROUPING_COMPLETE: &str = "grouping_complete";

    pub const FORECAST_STARTED: &str = "forecast_started";
    pub const FORECAST_PROGRESS: &str = "forecast_progress";
    pub const FORECAST_COMPLETE: &str = "forecast_complete";

    pub const ASSESS_COMPLETE: &str = "assess_complete";
}

/// High-level pipeline phase for a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Batch,
    Group,
    Sequence,
    Forecast,
    Assess,
}

/// Progress counters for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Structured progress event for CLI consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl ProgressEvent {
    pub fn new(event: impl Into<String>, phase: Phase) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            batch_id: None,
            phase,
            progress: None,
            details: HashMap::new(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn with_progress(mut self, current: u64, total: Option<u64>) -> Self {
        self.progress = Some(Progress { current, total });
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Trait for emitting progress events.
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Broadcast event bus supporting multiple subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Mutex<Vec<mpsc::Sender<ProgressEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to receive progress events.
    pub fn subscribe(&self) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel();
        let mut senders = self.senders.lock().unwrap();
        senders.push(tx);
        rx
    }

    /// Emit a progress event to all subscribers.
    pub fn emit(&self, event: ProgressEvent) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl ProgressEmitter for EventBus {
    fn emit(&self, event: ProgressEvent) {
        self.emit(event);
    }
}

/// JSONL writer for progress events (CLI-friendly).
pub struct JsonlWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> ProgressEmitter for JsonlWriter<W> {
    fn emit(&self, event: ProgressEvent) {
        let line = event.to_jsonl();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

/// Progress emitter that ensures a batch ID is attached to each event.
pub struct BatchEmitter {
    batch_id: String,
    inner: Arc<dyn ProgressEmitter>,
}

impl BatchEmitter {
    pub fn new(batch_id: impl Into<String>, inner: Arc<dyn ProgressEmitter>) -> Self {
        Self {
            batch_id: batch_id.into(),
            inner,
        }
    }
}

impl ProgressEmitter for BatchEmitter {
    fn emit(&self, mut event: ProgressEvent) {
        if event.batch_id.is_none() {
            event.batch_id = Some(self.batch_id.clone());
        }
        self.inner.emit(event);
    }
}
