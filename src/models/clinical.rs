use super::UserSummary;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Diagnosis {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_name: String,
    pub diagnosis_code: Option<String>,
    pub diagnosis_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A diagnosis with the names of the patient and the diagnosing doctor.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DiagnosisDetail {
    #[serde(flatten)]
    pub diagnosis: Diagnosis,
    pub patient: UserSummary,
    pub doctor: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Medication {
    pub id: i64,
    pub patient_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub prescribed_by_id: Option<i64>,
    /// Prescriber name at the time of prescription
    pub prescribed_by_name: Option<String>,
    pub active: bool,
    /// Always set when `active` is false
    pub deactivation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Goal {
    pub id: i64,
    pub patient_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: String,
    pub target_date: NaiveDate,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
}
