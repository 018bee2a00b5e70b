//! Telemetry
//!
//! Observability for provisioning runs.
//!
//! - **Events**: structured per-step results consumed by the embedding tool
//! - **Logging**: `tracing-subscriber` initialisation

pub mod events;
pub mod logging;

pub use events::{
    EventSink, InMemoryEventSink, NoOpEventSink, Step, StepEvent, StepStatus, TracingEventSink,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
