use super::{Validate, changed_text, optional_text, required_text};
use crate::models::Medication;
use crate::types::ValidationErrors;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

const NAME_MAX: usize = 150;
const DOSAGE_MAX: usize = 100;
const FREQUENCY_MAX: usize = 100;
const REASON_MAX: usize = 500;

const REASON_REQUIRED: &str = "Deactivation reason is required when medication is inactive";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    /// Defaults to `true`
    pub active: Option<bool>,
    /// Required when `active` is `false`
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub active: bool,
    pub deactivation_reason: Option<String>,
}

impl Validate for CreateMedicationRequest {
    type Valid = NewMedication;

    fn validate(self) -> Result<NewMedication, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name, NAME_MAX);
        let dosage = optional_text(&mut errors, "dosage", self.dosage, DOSAGE_MAX);
        let frequency = optional_text(&mut errors, "frequency", self.frequency, FREQUENCY_MAX);
        let reason = optional_text(
            &mut errors,
            "deactivation_reason",
            self.deactivation_reason,
            REASON_MAX,
        );
        let active = self.active.unwrap_or(true);

        let deactivation_reason = if active {
            None
        } else {
            if reason.is_none() && !errors.contains("deactivation_reason") {
                errors.add("deactivation_reason", REASON_REQUIRED);
            }
            reason
        };

        match name {
            Some(name) if errors.is_empty() => Ok(NewMedication {
                name,
                dosage,
                frequency,
                active,
                deactivation_reason,
            }),
            _ => Err(errors),
        }
    }
}

/// Partial medication update. Setting `active` to `false` requires a
/// `deactivation_reason`; setting it back to `true` clears the reason. A
/// reason sent for a medication that stays active is ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub active: Option<bool>,
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicationChanges {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub active: Option<bool>,
    pub deactivation_reason: Option<String>,
}

impl MedicationChanges {
    /// Merges the changes into `medication`, then re-checks the
    /// inactive-needs-reason rule on the result. Active medications never
    /// keep a reason.
    pub fn apply(self, medication: &mut Medication) -> Result<(), ValidationErrors> {
        if let Some(name) = self.name {
            medication.name = name;
        }
        if let Some(dosage) = self.dosage {
            medication.dosage = Some(dosage);
        }
        if let Some(frequency) = self.frequency {
            medication.frequency = Some(frequency);
        }
        if let Some(active) = self.active {
            medication.active = active;
        }
        // A reason only belongs on an inactive medication.
        if medication.active {
            medication.deactivation_reason = None;
        } else if let Some(reason) = self.deactivation_reason {
            medication.deactivation_reason = Some(reason);
        }

        let mut errors = ValidationErrors::new();
        if !medication.active && medication.deactivation_reason.is_none() {
            errors.add("deactivation_reason", REASON_REQUIRED);
        }
        errors.into_result()
    }
}

impl Validate for UpdateMedicationRequest {
    type Valid = MedicationChanges;

    fn validate(self) -> Result<MedicationChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = MedicationChanges {
            name: changed_text(&mut errors, "name", self.name, NAME_MAX),
            dosage: optional_text(&mut errors, "dosage", self.dosage, DOSAGE_MAX),
            frequency: optional_text(&mut errors, "frequency", self.frequency, FREQUENCY_MAX),
            active: self.active,
            deactivation_reason: optional_text(
                &mut errors,
                "deactivation_reason",
                self.deactivation_reason,
                REASON_MAX,
            ),
        };

        errors.into_result().map(|_| changes)
    }
}

/// Query string for listing a patient's medications.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MedicationQuery {
    /// Only return active (`true`) or inactive (`false`) medications
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn medication() -> Medication {
        Medication {
            id: 1,
            patient_id: 2,
            name: "Metformin".into(),
            dosage: Some("500mg".into()),
            frequency: Some("twice daily".into()),
            prescribed_by_id: Some(3),
            prescribed_by_name: Some("Dr. House".into()),
            active: true,
            deactivation_reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_inactive_medication_requires_reason() {
        let errors = CreateMedicationRequest {
            name: Some("Aspirin".into()),
            active: Some(false),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            errors.messages("deactivation_reason"),
            [REASON_REQUIRED.to_string()]
        );
    }

    #[test]
    fn test_active_medication_drops_reason() {
        let medication = CreateMedicationRequest {
            name: Some("Aspirin".into()),
            deactivation_reason: Some("ignored".into()),
            ..Default::default()
        }
        .validate()
        .expect("should validate");

        assert!(medication.active);
        assert_eq!(medication.deactivation_reason, None);
    }

    #[test]
    fn test_deactivate_without_reason_fails() {
        let mut med = medication();
        let changes = UpdateMedicationRequest {
            active: Some(false),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert!(changes.apply(&mut med).is_err());
    }

    #[test]
    fn test_deactivate_with_reason() {
        let mut med = medication();
        UpdateMedicationRequest {
            active: Some(false),
            deactivation_reason: Some("Side effects".into()),
            ..Default::default()
        }
        .validate()
        .unwrap()
        .apply(&mut med)
        .expect("should apply");

        assert!(!med.active);
        assert_eq!(med.deactivation_reason.as_deref(), Some("Side effects"));
    }

    #[test]
    fn test_reactivation_clears_reason() {
        let mut med = medication();
        med.active = false;
        med.deactivation_reason = Some("Paused".into());

        UpdateMedicationRequest {
            active: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap()
        .apply(&mut med)
        .expect("should apply");

        assert!(med.active);
        assert_eq!(med.deactivation_reason, None);
    }

    #[test]
    fn test_reason_alone_does_not_stick_to_active_medication() {
        let mut med = medication();
        UpdateMedicationRequest {
            deactivation_reason: Some("stale".into()),
            ..Default::default()
        }
        .validate()
        .unwrap()
        .apply(&mut med)
        .expect("should apply");

        assert!(med.active);
        assert_eq!(med.deactivation_reason, None);
    }

    #[test]
    fn test_reason_can_be_revised_while_inactive() {
        let mut med = medication();
        med.active = false;
        med.deactivation_reason = Some("Paused".into());

        UpdateMedicationRequest {
            deactivation_reason: Some("Allergic reaction".into()),
            ..Default::default()
        }
        .validate()
        .unwrap()
        .apply(&mut med)
        .expect("should apply");

        assert!(!med.active);
        assert_eq!(med.deactivation_reason.as_deref(), Some("Allergic reaction"));
    }
}
