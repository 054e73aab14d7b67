//! Audit sink
//!
//! The executor emits plan metadata, every step-record transition, and the
//! final output through [`StepSink`]. The engine does not define storage:
//! hosts bridge these callbacks to their persistence layer. [`MemorySink`]
//! is the in-process reference used by tests and embedders without storage.

use super::StepExecutionRecord;
use crate::planner::{PlanMetadata, PlanStep};
use std::sync::Mutex;

/// Receiver for audit events of one run.
///
/// Callbacks are invoked inline from the executor loop, in order: `on_plan`
/// once, `on_step` at every record transition (including the initial pending
/// snapshot), `on_final` once on clean completion.
pub trait StepSink: Send + Sync {
    fn on_plan(&self, _metadata: &PlanMetadata, _steps: &[PlanStep]) {}

    fn on_step(&self, _record: &StepExecutionRecord) {}

    fn on_final(&self, _output: &str) {}
}

/// Sink that discards everything.
pub struct NullSink;

impl StepSink for NullSink {}

/// In-memory sink retaining every snapshot, for tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    plan: Mutex<Option<(PlanMetadata, Vec<PlanStep>)>>,
    snapshots: Mutex<Vec<StepExecutionRecord>>,
    final_output: Mutex<Option<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan metadata recorded for this run, if any.
    pub fn plan(&self) -> Option<(PlanMetadata, Vec<PlanStep>)> {
        self.plan.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// All record snapshots in emission order.
    pub fn snapshots(&self) -> Vec<StepExecutionRecord> {
        self.snapshots.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The latest snapshot per step number, ordered by step number.
    pub fn latest_records(&self) -> Vec<StepExecutionRecord> {
        let snapshots = self.snapshots();
        let mut latest: Vec<StepExecutionRecord> = Vec::new();
        for snapshot in snapshots {
            match latest
                .iter_mut()
                .find(|r| r.step_number == snapshot.step_number)
            {
                Some(existing) => *existing = snapshot,
                None => latest.push(snapshot),
            }
        }
        latest.sort_by_key(|r| r.step_number);
        latest
    }

    /// The final output, when the run completed cleanly.
    pub fn final_output(&self) -> Option<String> {
        self.final_output.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl StepSink for MemorySink {
    fn on_plan(&self, metadata: &PlanMetadata, steps: &[PlanStep]) {
        if let Ok(mut plan) = self.plan.lock() {
            *plan = Some((metadata.clone(), steps.to_vec()));
        }
    }

    fn on_step(&self, record: &StepExecutionRecord) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.push(record.clone());
        }
    }

    fn on_final(&self, output: &str) {
        if let Ok(mut final_output) = self.final_output.lock() {
            *final_output = Some(output.to_string());
        }
    }
}
