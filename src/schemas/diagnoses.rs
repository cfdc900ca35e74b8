use super::{Validate, changed_text, optional_text, required, required_text};
use crate::models::Diagnosis;
use crate::types::ValidationErrors;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

const NAME_MAX: usize = 150;
const CODE_MAX: usize = 50;
const NOTES_MAX: usize = 5000;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateDiagnosisRequest {
    pub diagnosis_name: Option<String>,
    /// e.g. an ICD-10 code
    pub diagnosis_code: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDiagnosis {
    pub diagnosis_name: String,
    pub diagnosis_code: Option<String>,
    pub diagnosis_date: NaiveDate,
    pub notes: String,
}

impl Validate for CreateDiagnosisRequest {
    type Valid = NewDiagnosis;

    fn validate(self) -> Result<NewDiagnosis, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let diagnosis_name = required_text(&mut errors, "diagnosis_name", self.diagnosis_name, NAME_MAX);
        let diagnosis_code = optional_text(&mut errors, "diagnosis_code", self.diagnosis_code, CODE_MAX);
        let diagnosis_date = required(&mut errors, "diagnosis_date", self.diagnosis_date);
        let notes = required_text(&mut errors, "notes", self.notes, NOTES_MAX);
        check_date(&mut errors, diagnosis_date);

        match (diagnosis_name, diagnosis_date, notes) {
            (Some(diagnosis_name), Some(diagnosis_date), Some(notes)) if errors.is_empty() => {
                Ok(NewDiagnosis {
                    diagnosis_name,
                    diagnosis_code,
                    diagnosis_date,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDiagnosisRequest {
    pub diagnosis_name: Option<String>,
    pub diagnosis_code: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DiagnosisChanges {
    pub diagnosis_name: Option<String>,
    pub diagnosis_code: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl DiagnosisChanges {
    pub fn apply(self, diagnosis: &mut Diagnosis) {
        if let Some(name) = self.diagnosis_name {
            diagnosis.diagnosis_name = name;
        }
        if let Some(code) = self.diagnosis_code {
            diagnosis.diagnosis_code = Some(code);
        }
        if let Some(date) = self.diagnosis_date {
            diagnosis.diagnosis_date = date;
        }
        if let Some(notes) = self.notes {
            diagnosis.notes = notes;
        }
    }
}

impl Validate for UpdateDiagnosisRequest {
    type Valid = DiagnosisChanges;

    fn validate(self) -> Result<DiagnosisChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = DiagnosisChanges {
            diagnosis_name: changed_text(&mut errors, "diagnosis_name", self.diagnosis_name, NAME_MAX),
            diagnosis_code: optional_text(&mut errors, "diagnosis_code", self.diagnosis_code, CODE_MAX),
            diagnosis_date: self.diagnosis_date,
            notes: changed_text(&mut errors, "notes", self.notes, NOTES_MAX),
        };
        check_date(&mut errors, changes.diagnosis_date);

        errors.into_result().map(|_| changes)
    }
}

fn check_date(errors: &mut ValidationErrors, date: Option<NaiveDate>) {
    if let Some(date) = date
        && date > Utc::now().date_naive()
    {
        errors.add("diagnosis_date", "Diagnosis date cannot be in the future.");
    }
}
