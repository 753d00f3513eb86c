//! Event type definitions and the event payload handed to handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types the host platform emits.
///
/// The host knows many more event names than are listed here; anything not
/// listed round-trips through [`EventType::Other`]. Registry lookups always
/// go through [`EventType::name`], so an `Other("PATIENT_CREATED")` and a
/// `PatientCreated` address the same handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Catch-all event with no clinical meaning; used by tests and smoke checks.
    Unknown,

    // ── Plugin lifecycle ──
    /// A plugin was installed.
    PluginCreated,
    /// A plugin was updated.
    PluginUpdated,

    // ── Patient ──
    /// A patient record was created.
    PatientCreated,
    /// A patient record was updated.
    PatientUpdated,

    // ── Notes and encounters ──
    /// A note changed state (locked, unlocked, signed...).
    NoteStateChangeEventCreated,
    /// An encounter was created.
    EncounterCreated,
    /// An encounter was updated.
    EncounterUpdated,

    // ── Scheduling ──
    /// An appointment was booked.
    AppointmentCreated,
    /// An appointment was updated.
    AppointmentUpdated,
    /// A label was added to an appointment.
    AppointmentLabelAdded,

    // ── Tasks ──
    /// A task was created.
    TaskCreated,
    /// A task was updated.
    TaskUpdated,

    // ── Clinical data ──
    /// A condition was created.
    ConditionCreated,
    /// A condition was updated.
    ConditionUpdated,
    /// A condition was resolved.
    ConditionResolved,
    /// An observation was created.
    ObservationCreated,
    /// A lab report was received.
    LabReportCreated,
    /// A medication list item was created.
    MedicationListItemCreated,
    /// A document was received.
    DocumentReceived,

    // ── Integration ──
    /// An inbound HTTP request addressed to a plugin's simple API.
    SimpleApiRequest,
    /// A scheduled tick.
    Cron,

    /// Any event name not listed above.
    Other(String),
}

impl EventType {
    /// Returns the wire name of this event type.
    pub fn name(&self) -> &str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::PluginCreated => "PLUGIN_CREATED",
            Self::PluginUpdated => "PLUGIN_UPDATED",
            Self::PatientCreated => "PATIENT_CREATED",
            Self::PatientUpdated => "PATIENT_UPDATED",
            Self::NoteStateChangeEventCreated => "NOTE_STATE_CHANGE_EVENT_CREATED",
            Self::EncounterCreated => "ENCOUNTER_CREATED",
            Self::EncounterUpdated => "ENCOUNTER_UPDATED",
            Self::AppointmentCreated => "APPOINTMENT_CREATED",
            Self::AppointmentUpdated => "APPOINTMENT_UPDATED",
            Self::AppointmentLabelAdded => "APPOINTMENT_LABEL_ADDED",
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskUpdated => "TASK_UPDATED",
            Self::ConditionCreated => "CONDITION_CREATED",
            Self::ConditionUpdated => "CONDITION_UPDATED",
            Self::ConditionResolved => "CONDITION_RESOLVED",
            Self::ObservationCreated => "OBSERVATION_CREATED",
            Self::LabReportCreated => "LAB_REPORT_CREATED",
            Self::MedicationListItemCreated => "MEDICATION_LIST_ITEM_CREATED",
            Self::DocumentReceived => "DOCUMENT_RECEIVED",
            Self::SimpleApiRequest => "SIMPLE_API_REQUEST",
            Self::Cron => "CRON",
            Self::Other(name) => name,
        }
    }

    /// Parses a wire name. Never fails: unlisted names become `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "UNKNOWN" => Self::Unknown,
            "PLUGIN_CREATED" => Self::PluginCreated,
            "PLUGIN_UPDATED" => Self::PluginUpdated,
            "PATIENT_CREATED" => Self::PatientCreated,
            "PATIENT_UPDATED" => Self::PatientUpdated,
            "NOTE_STATE_CHANGE_EVENT_CREATED" => Self::NoteStateChangeEventCreated,
            "ENCOUNTER_CREATED" => Self::EncounterCreated,
            "ENCOUNTER_UPDATED" => Self::EncounterUpdated,
            "APPOINTMENT_CREATED" => Self::AppointmentCreated,
            "APPOINTMENT_UPDATED" => Self::AppointmentUpdated,
            "APPOINTMENT_LABEL_ADDED" => Self::AppointmentLabelAdded,
            "TASK_CREATED" => Self::TaskCreated,
            "TASK_UPDATED" => Self::TaskUpdated,
            "CONDITION_CREATED" => Self::ConditionCreated,
            "CONDITION_UPDATED" => Self::ConditionUpdated,
            "CONDITION_RESOLVED" => Self::ConditionResolved,
            "OBSERVATION_CREATED" => Self::ObservationCreated,
            "LAB_REPORT_CREATED" => Self::LabReportCreated,
            "MEDICATION_LIST_ITEM_CREATED" => Self::MedicationListItemCreated,
            "DOCUMENT_RECEIVED" => Self::DocumentReceived,
            "SIMPLE_API_REQUEST" => Self::SimpleApiRequest,
            "CRON" => Self::Cron,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.name().to_string()
    }
}

/// An incoming notification from the host platform.
///
/// Built once per request and consumed by exactly one dispatch pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Identifier of the record the event is about.
    #[serde(default)]
    pub target: Option<String>,
    /// Kind of the target record (`"Patient"`, `"Note"`...).
    #[serde(default)]
    pub target_type: Option<String>,
    /// Free-form payload.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
    /// When the runner received the event.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Event {
    /// Creates an event with no target and an empty context.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            target: None,
            target_type: None,
            context: serde_json::Map::new(),
            received_at: Utc::now(),
        }
    }

    /// Sets the target record.
    pub fn with_target(mut self, target: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self.target_type = Some(target_type.into());
        self
    }

    /// Inserts a context value.
    pub fn with_context(mut self, key: &str, value: serde_json::Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    /// Gets a context value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }

    /// Gets a string context value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(|v| v.as_str())
    }

    /// Gets an i64 context value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.context.get(key).and_then(|v| v.as_i64())
    }

    /// Gets a bool context value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.context.get(key).and_then(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_names_round_trip_through_other() {
        let ty = EventType::from_name("CLAIM_CREATED");
        assert_eq!(ty, EventType::Other("CLAIM_CREATED".to_string()));
        assert_eq!(ty.name(), "CLAIM_CREATED");
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "type": "PATIENT_CREATED",
            "target": "b2bd0672-ab36-4eca-b105-884f976ae810",
            "context": { "patient": { "id": 5 } }
        }))
        .unwrap();

        assert_eq!(event.event_type, EventType::PatientCreated);
        assert_eq!(
            event.target.as_deref(),
            Some("b2bd0672-ab36-4eca-b105-884f976ae810")
        );
        assert!(event.target_type.is_none());
        assert_eq!(event.get("patient").unwrap()["id"], 5);
    }
}
