//! Follow-up task after an appointment is booked.

use canvas_plugin_sdk::prelude::*;
use chrono::{Duration, Utc};

/// Secret holding the team label tasks are filed under.
pub const TEAM_SECRET: &str = "FOLLOWUP_TEAM";

/// Creates a follow-up task for the patient of every new appointment.
#[derive(Debug, Clone)]
pub struct AppointmentFollowUp {
    /// Days from now until the task is due.
    pub due_in_days: i64,
}

impl Default for AppointmentFollowUp {
    fn default() -> Self {
        Self { due_in_days: 2 }
    }
}

#[async_trait]
impl PluginHandler for AppointmentFollowUp {
    fn responds_to(&self) -> Vec<EventType> {
        vec![EventType::AppointmentCreated]
    }

    async fn compute(&self, event: &Event, ctx: &HandlerContext) -> HandlerResult {
        let Some(patient_id) = event.get_string("patient_id") else {
            // Appointments without a patient (blocks, admin time) need no follow-up.
            return Ok(HandlerOutput::Empty);
        };

        let mut task = AddTask::new("Confirm appointment details with patient")
            .for_patient(patient_id)
            .due(Utc::now() + Duration::days(self.due_in_days))
            .label("follow-up");
        if let Some(team) = ctx.secret(TEAM_SECRET) {
            task = task.label(team);
        }

        Ok(task.apply()?.into())
    }
}
