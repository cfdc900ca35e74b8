//! Request schemas and validation.
//!
//! Request bodies are deserialized with serde (which handles type coercion
//! for dates, enums and numbers) and then validated into domain inputs with
//! per-field messages. Handlers receive them through [`ValidatedJson`].
//!
//! ```ignore
//! async fn create_user(ValidatedJson(new_user): ValidatedJson<CreateUserRequest>) { ... }
//! ```

pub mod appointments;
pub mod diagnoses;
pub mod goals;
pub mod medications;
pub mod users;

use crate::types::{AppError, ValidationErrors};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

pub use appointments::{
    AppointmentChanges, CreateAppointmentRequest, NewAppointment, UpdateAppointmentRequest,
};
pub use diagnoses::{CreateDiagnosisRequest, DiagnosisChanges, NewDiagnosis, UpdateDiagnosisRequest};
pub use goals::{CreateGoalRequest, GoalChanges, NewGoal, UpdateGoalRequest};
pub use medications::{
    CreateMedicationRequest, MedicationChanges, MedicationQuery, NewMedication,
    UpdateMedicationRequest,
};
pub use users::{CreateUserRequest, ListUsersQuery, NewUser, UpdateUserRequest, UserChanges};

/// A request schema that can be checked and turned into a domain input.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationErrors>;
}

/// JSON body extractor that answers 400 (instead of axum's 415/422) when
/// the body is missing, malformed or has the wrong types.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
        Ok(Self(body))
    }
}

/// JSON body extractor that also runs the schema's [`Validate`] impl.
pub struct ValidatedJson<T: Validate>(pub T::Valid);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(body) = JsonBody::<T>::from_request(req, state).await?;
        Ok(Self(body.validate()?))
    }
}

// ============= Field Helpers =============

pub(crate) const MISSING: &str = "Missing data for required field.";

/// Trims a required text field and checks its length.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, MISSING);
            None
        }
        Some(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                errors.add(field, "Field may not be blank.");
                None
            } else {
                check_length(errors, field, text, max_len)
            }
        }
    }
}

/// Trims an optional text field; blank becomes `None`.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    let text = value?.trim().to_string();
    if text.is_empty() {
        return None;
    }
    check_length(errors, field, text, max_len)
}

/// Like [`required_text`], but for a field that may be absent from a partial update.
pub(crate) fn changed_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    match value {
        None => None,
        some => required_text(errors, field, some, max_len),
    }
}

pub(crate) fn required<T>(errors: &mut ValidationErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, MISSING);
    }
    value
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &str,
    text: String,
    max_len: usize,
) -> Option<String> {
    if text.chars().count() > max_len {
        errors.add(field, format!("Longer than maximum length {}.", max_len));
        None
    } else {
        Some(text)
    }
}
