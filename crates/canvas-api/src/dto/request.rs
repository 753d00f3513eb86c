//! Request DTOs.

use serde::{Deserialize, Serialize};

use canvas_core::error::AppError;
use canvas_plugin::events::definitions::{Event, EventType};

/// Body of `POST /api/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleEventRequest {
    /// Event type name, e.g. `PATIENT_CREATED`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Identifier of the record the event is about.
    #[serde(default)]
    pub target: Option<String>,
    /// Kind of the target record.
    #[serde(default)]
    pub target_type: Option<String>,
    /// Free-form payload.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl HandleEventRequest {
    /// Validates the request and builds the event.
    pub fn into_event(self) -> Result<Event, AppError> {
        let name = self.event_type.trim();
        if name.is_empty() {
            return Err(AppError::validation("Event type must not be empty"));
        }

        let mut event = Event::new(EventType::from_name(name));
        event.target = self.target;
        event.target_type = self.target_type;
        event.context = self.context;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_event() {
        let req: HandleEventRequest = serde_json::from_value(serde_json::json!({
            "type": "PATIENT_CREATED",
            "target": "p-1",
            "context": {"first_name": "Ada"}
        }))
        .unwrap();
        let event = req.into_event().unwrap();
        assert_eq!(event.event_type, EventType::PatientCreated);
        assert_eq!(event.get_string("first_name"), Some("Ada"));
    }

    #[test]
    fn test_blank_type_is_rejected() {
        let req = HandleEventRequest {
            event_type: "  ".into(),
            target: None,
            target_type: None,
            context: serde_json::Map::new(),
        };
        assert!(req.into_event().is_err());
    }
}
