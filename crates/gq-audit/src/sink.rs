use gq_backtest::{RunEvent, RunEventSink, SinkError};
use uuid::Uuid;

use crate::writer::AuditWriter;

/// Records backtest events into an `AuditWriter`, one line per event.
/// `event_type` is the event's snake_case kind.
pub struct AuditTrailSink {
    writer: AuditWriter,
    run_id: Uuid,
}

impl AuditTrailSink {
    pub fn new(writer: AuditWriter, run_id: Uuid) -> Self {
        Self { writer, run_id }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn events_written(&self) -> u64 {
        self.writer.seq()
    }

    pub fn into_writer(self) -> AuditWriter {
        self.writer
    }
}

impl RunEventSink for AuditTrailSink {
    fn on_event(&mut self, event: &RunEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_value(event).map_err(|e| SinkError::new(e.to_string()))?;
        self.writer
            .append(self.run_id, event.kind(), event.ts(), payload)
            .map(|_| ())
            .map_err(|e| SinkError::new(format!("{:#}", e)))
    }
}
