use super::{Validate, changed_text, optional_text, required, required_text};
use crate::models::Appointment;
use crate::types::{AppointmentStatus, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

const NOTES_MAX: usize = 1000;
const REASON_MAX: usize = 250;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    /// RFC 3339 timestamp, must be in the future
    pub appointment_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_time: DateTime<Utc>,
    pub notes: String,
    pub reason: Option<String>,
}

impl Validate for CreateAppointmentRequest {
    type Valid = NewAppointment;

    fn validate(self) -> Result<NewAppointment, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let doctor_id = required(&mut errors, "doctor_id", self.doctor_id);
        let patient_id = required(&mut errors, "patient_id", self.patient_id);
        let appointment_time = required(&mut errors, "appointment_time", self.appointment_time);
        let notes = required_text(&mut errors, "notes", self.notes, NOTES_MAX);
        let reason = optional_text(&mut errors, "reason", self.reason, REASON_MAX);
        check_future(&mut errors, appointment_time);

        if let (Some(doctor_id), Some(patient_id)) = (doctor_id, patient_id)
            && doctor_id == patient_id
        {
            errors.add("patient_id", "Doctor and patient must be different users.");
        }

        match (doctor_id, patient_id, appointment_time, notes) {
            (Some(doctor_id), Some(patient_id), Some(appointment_time), Some(notes))
                if errors.is_empty() =>
            {
                Ok(NewAppointment {
                    doctor_id,
                    patient_id,
                    appointment_time,
                    notes,
                    reason,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub appointment_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub appointment_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentChanges {
    pub fn apply(self, appointment: &mut Appointment) {
        if let Some(time) = self.appointment_time {
            appointment.appointment_time = time;
        }
        if let Some(notes) = self.notes {
            appointment.notes = notes;
        }
        if let Some(reason) = self.reason {
            appointment.reason = Some(reason);
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
    }
}

impl Validate for UpdateAppointmentRequest {
    type Valid = AppointmentChanges;

    fn validate(self) -> Result<AppointmentChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = AppointmentChanges {
            appointment_time: self.appointment_time,
            notes: changed_text(&mut errors, "notes", self.notes, NOTES_MAX),
            reason: optional_text(&mut errors, "reason", self.reason, REASON_MAX),
            status: self.status,
        };
        check_future(&mut errors, changes.appointment_time);

        errors.into_result().map(|_| changes)
    }
}

fn check_future(errors: &mut ValidationErrors, time: Option<DateTime<Utc>>) {
    if let Some(time) = time
        && time <= Utc::now()
    {
        errors.add("appointment_time", "Appointment time must be in the future.");
    }
}
