use super::UserSummary;
use crate::types::AppointmentStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: DateTime<Utc>,
    pub notes: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn involves(&self, user_id: i64) -> bool {
        self.doctor_id == user_id || self.patient_id == user_id
    }
}

/// An appointment with both participants' names.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: UserSummary,
    pub patient: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
