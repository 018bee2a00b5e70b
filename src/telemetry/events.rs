//! Step Events
//!
//! Structured progress stream emitted by the orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// Provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Authenticate,
    DeleteRealm,
    Realm,
    Client,
    User,
    Credential,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::DeleteRealm => "delete_realm",
            Self::Realm => "realm",
            Self::Client => "client",
            Self::User => "user",
            Self::Credential => "credential",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Created,
    AlreadyExists,
    Skipped,
    Failed,
}

impl StepStatus {
    /// Anything but `Failed`.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// One step result.
#[derive(Debug, Clone, Serialize)]
pub struct StepEvent {
    pub step: Step,
    pub status: StepStatus,
    /// Resource name, id, or the raw failure diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl StepEvent {
    /// Event stamped with the current time.
    pub fn new(step: Step, status: StepStatus, detail: Option<String>) -> Self {
        Self {
            step,
            status,
            detail,
            at: Utc::now(),
        }
    }
}

/// Consumer of step events.
pub trait EventSink: Send + Sync {
    /// Receive one event.
    fn emit(&self, event: &StepEvent);
}

/// Discards every event.
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &StepEvent) {}
}

/// Forwards events to `tracing`.
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &StepEvent) {
        let detail = event.detail.as_deref().unwrap_or("");
        match event.status {
            StepStatus::Failed => {
                tracing::error!(step = %event.step, status = ?event.status, detail, "step failed")
            }
            StepStatus::Skipped => {
                tracing::warn!(step = %event.step, status = ?event.status, detail, "step skipped")
            }
            _ => tracing::info!(step = %event.step, status = ?event.status, detail, "step completed"),
        }
    }
}

/// Keeps events in memory.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<StepEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all events.
    pub fn get_events(&self) -> Vec<StepEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Steps in emission order.
    pub fn steps(&self) -> Vec<Step> {
        self.events.lock().unwrap().iter().map(|e| e.step).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: &StepEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
