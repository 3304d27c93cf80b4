//! InMemoryTelemetry - 開発・テスト用のテレメトリ
//!
//! scope のイベントをメモリに貯めるだけ。本番のシンクは別実装で差し替える。

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::DispatchError;
use crate::ports::{TelemetryScope, TelemetryService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    ExecutionStarted,
    Warning(String),
    Canceled,
    Exception(String),
    /// The scope was dropped.
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub method: String,
    pub language: String,
    pub event: TelemetryEvent,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTelemetry {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl InMemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().clone()
    }

    /// Events for one method, in the order they were recorded.
    pub fn events_for(&self, method: &str) -> Vec<TelemetryEvent> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .map(|r| r.event.clone())
            .collect()
    }
}

impl TelemetryService for InMemoryTelemetry {
    fn begin_scope(&self, method: &str, language: &str) -> Box<dyn TelemetryScope> {
        Box::new(InMemoryScope {
            method: method.to_string(),
            language: language.to_string(),
            records: Arc::clone(&self.records),
        })
    }
}

struct InMemoryScope {
    method: String,
    language: String,
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl InMemoryScope {
    fn push(&self, event: TelemetryEvent) {
        self.records.lock().push(TelemetryRecord {
            method: self.method.clone(),
            language: self.language.clone(),
            event,
        });
    }
}

impl TelemetryScope for InMemoryScope {
    fn record_execution_start(&self) {
        self.push(TelemetryEvent::ExecutionStarted);
    }

    fn record_warning(&self, message: &str) {
        self.push(TelemetryEvent::Warning(message.to_string()));
    }

    fn record_cancellation(&self) {
        self.push(TelemetryEvent::Canceled);
    }

    fn record_exception(&self, error: &DispatchError) {
        self.push(TelemetryEvent::Exception(error.to_string()));
    }
}

impl Drop for InMemoryScope {
    fn drop(&mut self) {
        self.push(TelemetryEvent::Released);
    }
}
