//! Task creation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use canvas_plugin::error::HandlerError;
use canvas_plugin::events::effects::EffectType;

use super::{EffectBuilder, require};

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not done yet.
    Open,
    /// Done.
    Completed,
    /// Abandoned.
    Closed,
}

/// Creates a task, optionally about a patient.
#[derive(Debug, Clone, Serialize)]
pub struct AddTask {
    /// Task title.
    pub title: String,
    /// Patient the task is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// Due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Status.
    pub status: TaskStatus,
    /// Free-form labels.
    pub labels: Vec<String>,
}

impl AddTask {
    /// Creates an open task.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            patient_id: None,
            due: None,
            status: TaskStatus::Open,
            labels: Vec::new(),
        }
    }

    /// Attaches the task to a patient.
    pub fn for_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Sets the due date.
    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    /// Adds a label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

impl EffectBuilder for AddTask {
    fn effect_type(&self) -> EffectType {
        EffectType::CreateTask
    }

    fn validate(&self) -> Result<(), HandlerError> {
        require("title", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_payload() {
        let effect = AddTask::new("Call patient")
            .for_patient("p-1")
            .label("outreach")
            .apply()
            .unwrap();

        let payload: serde_json::Value = serde_json::from_str(&effect.payload).unwrap();
        assert_eq!(payload["data"]["status"], "OPEN");
        assert_eq!(payload["data"]["labels"], serde_json::json!(["outreach"]));
        assert!(payload["data"].get("due").is_none());

        assert!(AddTask::new("  ").apply().is_err());
    }
}
