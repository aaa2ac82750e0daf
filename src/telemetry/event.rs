//! Typed telemetry event union (spec §4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Where a `plan:cache` event originated (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEventSource {
    Core,
    Session,
}

/// The action a `plan:cache` event reports (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheAction {
    Hit,
    Miss,
    Store,
    Delete,
    Clear,
}

/// A single typed telemetry event (spec §4.3). Producers construct one of
/// these; the bus fans it out to listeners without interpreting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PreprocessStart { request_id: String },
    PreprocessFinish { request_id: String },
    ArchitectStart { request_id: String },
    ArchitectFinish { request_id: String },
    ExtractorStart { request_id: String },
    ExtractorFinish { request_id: String },
    FieldResolved { request_id: String, field: String },
    PlanCache {
        request_id: Option<String>,
        action: CacheAction,
        source: CacheEventSource,
    },
    ParseStart { request_id: String },
    ParseFinish { request_id: String, success: bool },
    FallbackInvoked { request_id: String, field: String },
    FallbackReused { request_id: String, field: String },
    FallbackSkipped { request_id: String, field: String },
}

impl Event {
    /// The event's `requestId`, when it carries one (`plan:cache` events
    /// emitted outside a parse may have none).
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Event::PreprocessStart { request_id }
            | Event::PreprocessFinish { request_id }
            | Event::ArchitectStart { request_id }
            | Event::ArchitectFinish { request_id }
            | Event::ExtractorStart { request_id }
            | Event::ExtractorFinish { request_id }
            | Event::FieldResolved { request_id, .. }
            | Event::ParseStart { request_id }
            | Event::ParseFinish { request_id, .. }
            | Event::FallbackInvoked { request_id, .. }
            | Event::FallbackReused { request_id, .. }
            | Event::FallbackSkipped { request_id, .. } => Some(request_id.as_str()),
            Event::PlanCache { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// An envelope around an `Event`, adding the timestamp and free-form
/// payload every telemetry emission carries (spec §4.3, §6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event: Event,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

impl TelemetryEvent {
    /// Wrap an `Event` with the current timestamp and no extra metadata.
    #[must_use]
    pub fn new(event: Event) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Wrap an `Event` with an explicit metadata payload.
    #[must_use]
    pub fn with_metadata(event: Event, metadata: JsonValue) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            metadata: Some(metadata),
        }
    }
}
