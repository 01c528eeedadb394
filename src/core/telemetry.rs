use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::core::DomainValue;

/// A single executed action, as reported to a telemetry sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    /// The session id of the run.
    pub run_id: String,
    pub action: String,
    pub inputs: DomainValue,
    /// `None` when the action failed.
    pub output: Option<DomainValue>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub metadata: HashMap<String, String>,
}

impl TraceEntry {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Trait for recording execution traces.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);

    fn flush(&self) {}
}

/// Simple in-memory collector for traces.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<TraceEntry>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_telemetry_collects_in_order() {
        let telemetry = MemoryTelemetry::new();
        for (action, error) in [("find", None), ("research", Some("timeout".to_string()))] {
            telemetry.record(TraceEntry {
                timestamp: Utc::now(),
                run_id: "run-1".to_string(),
                action: action.to_string(),
                inputs: json!({}),
                output: error.is_none().then(|| json!("ok")),
                error,
                elapsed_ms: 1,
                metadata: HashMap::new(),
            });
        }
        telemetry.flush();

        let traces = telemetry.get_traces();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].action, "find");
        assert!(traces[0].succeeded());
        assert!(!traces[1].succeeded());
    }
}
