use crate::{
    AppState,
    auth::{middleware::AuthUser, policy::Action},
    db::{self, diagnoses, users},
    models::{Diagnosis, DiagnosisDetail},
    schemas::{CreateDiagnosisRequest, UpdateDiagnosisRequest, ValidatedJson},
    types::{AppError, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Record a diagnosis for a patient
///
/// The calling doctor is recorded as the diagnosing doctor.
#[utoipa::path(
    post,
    path = "/diagnoses/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = CreateDiagnosisRequest,
    responses(
        (status = 201, description = "Diagnosis recorded", body = Diagnosis),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Doctor or admin role required"),
        (status = 404, description = "Patient not found"),
        (status = 409, description = "Diagnosis already recorded")
    ),
    tag = "diagnoses",
    security(("bearer" = []))
)]
pub async fn create_diagnosis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    ValidatedJson(new): ValidatedJson<CreateDiagnosisRequest>,
) -> Result<(StatusCode, Json<Diagnosis>)> {
    caller.authorize(Action::CreateDiagnosis)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let patient = users::get_patient(&tx, patient_id).await?;
        diagnoses::insert(&tx, patient.id, caller.user_id(), &new).await
    }
    .await;
    let diagnosis = db::finish(tx, outcome).await?;

    tracing::info!(
        diagnosis_id = diagnosis.id,
        patient_id,
        doctor_id = caller.user_id(),
        "recorded diagnosis"
    );
    Ok((StatusCode::CREATED, Json(diagnosis)))
}

/// List a patient's diagnoses
#[utoipa::path(
    get,
    path = "/diagnoses/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Diagnoses with patient and doctor names", body = Vec<DiagnosisDetail>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "diagnoses",
    security(("bearer" = []))
)]
pub async fn list_patient_diagnoses(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<DiagnosisDetail>>> {
    caller.authorize_for(Action::ViewDiagnoses, patient_id)?;

    let conn = state.db.connection().await?;
    let patient = users::get_patient(&conn, patient_id).await?;
    Ok(Json(diagnoses::list_for_patient(&conn, patient.id).await?))
}

/// Find every diagnosis with the given name
#[utoipa::path(
    get,
    path = "/diagnoses/by-name/{diagnosis_name}",
    params(("diagnosis_name" = String, Path, description = "Diagnosis name, case-insensitive")),
    responses(
        (status = 200, description = "Matching diagnoses", body = Vec<DiagnosisDetail>),
        (status = 403, description = "Doctor or admin role required")
    ),
    tag = "diagnoses",
    security(("bearer" = []))
)]
pub async fn search_diagnoses(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(diagnosis_name): Path<String>,
) -> Result<Json<Vec<DiagnosisDetail>>> {
    caller.authorize(Action::SearchDiagnoses)?;

    let name = diagnosis_name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Diagnosis name is required".to_string()));
    }

    let conn = state.db.connection().await?;
    Ok(Json(diagnoses::search_by_name(&conn, name).await?))
}

/// Get a diagnosis by ID
#[utoipa::path(
    get,
    path = "/diagnoses/{id}",
    params(("id" = i64, Path, description = "Diagnosis ID")),
    responses(
        (status = 200, description = "Diagnosis", body = Diagnosis),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Diagnosis not found")
    ),
    tag = "diagnoses",
    security(("bearer" = []))
)]
pub async fn get_diagnosis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Diagnosis>> {
    caller.authorize(Action::ViewDiagnoses)?;

    let conn = state.db.connection().await?;
    let diagnosis = diagnoses::get(&conn, id).await?;
    caller.authorize_for(Action::ViewDiagnoses, diagnosis.patient_id)?;

    Ok(Json(diagnosis))
}

/// Update a diagnosis
#[utoipa::path(
    patch,
    path = "/diagnoses/{id}",
    params(("id" = i64, Path, description = "Diagnosis ID")),
    request_body = UpdateDiagnosisRequest,
    responses(
        (status = 200, description = "Updated diagnosis", body = Diagnosis),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Doctor or admin role required"),
        (status = 404, description = "Diagnosis not found"),
        (status = 409, description = "Diagnosis already recorded")
    ),
    tag = "diagnoses",
    security(("bearer" = []))
)]
pub async fn update_diagnosis(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<UpdateDiagnosisRequest>,
) -> Result<Json<Diagnosis>> {
    caller.authorize(Action::UpdateDiagnosis)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let mut diagnosis = diagnoses::get(&tx, id).await?;
        changes.apply(&mut diagnosis);
        diagnoses::update(&tx, &diagnosis).await?;
        Ok::<_, AppError>(diagnosis)
    }
    .await;
    let diagnosis = db::finish(tx, outcome).await?;

    tracing::info!(diagnosis_id = id, by = caller.user_id(), "updated diagnosis");
    Ok(Json(diagnosis))
}
