use crate::{
    AppState,
    auth::{middleware::AuthUser, policy::Action},
    db::{self, medications, notifications, users},
    models::Medication,
    schemas::{CreateMedicationRequest, MedicationQuery, UpdateMedicationRequest, ValidatedJson},
    types::{AppError, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// Prescribe a medication to a patient
///
/// The caller is recorded as the prescriber and the patient is notified.
#[utoipa::path(
    post,
    path = "/medications/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = CreateMedicationRequest,
    responses(
        (status = 201, description = "Medication prescribed", body = Medication),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Doctor or admin role required"),
        (status = 404, description = "Patient not found")
    ),
    tag = "medications",
    security(("bearer" = []))
)]
pub async fn create_medication(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    ValidatedJson(new): ValidatedJson<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Medication>)> {
    caller.authorize(Action::PrescribeMedication)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let patient = users::get_patient(&tx, patient_id).await?;
        let prescriber = users::get(&tx, caller.user_id()).await?;
        let medication = medications::insert(&tx, patient.id, &prescriber, &new).await?;

        notifications::insert(
            &tx,
            patient.id,
            &format!(
                "New medication prescribed: {} by {}",
                medication.name, prescriber.name
            ),
        )
        .await?;

        Ok::<_, AppError>(medication)
    }
    .await;
    let medication = db::finish(tx, outcome).await?;

    tracing::info!(
        medication_id = medication.id,
        patient_id,
        prescriber_id = caller.user_id(),
        "prescribed medication"
    );
    Ok((StatusCode::CREATED, Json(medication)))
}

/// List a patient's medications
#[utoipa::path(
    get,
    path = "/medications/patients/{patient_id}",
    params(
        ("patient_id" = i64, Path, description = "Patient ID"),
        MedicationQuery
    ),
    responses(
        (status = 200, description = "Medications, newest first", body = Vec<Medication>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "medications",
    security(("bearer" = []))
)]
pub async fn list_patient_medications(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    Query(query): Query<MedicationQuery>,
) -> Result<Json<Vec<Medication>>> {
    caller.authorize_for(Action::ViewMedications, patient_id)?;

    let conn = state.db.connection().await?;
    let patient = users::get_patient(&conn, patient_id).await?;
    Ok(Json(
        medications::list_for_patient(&conn, patient.id, query.active).await?,
    ))
}

/// Get a medication by ID
#[utoipa::path(
    get,
    path = "/medications/{id}",
    params(("id" = i64, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication", body = Medication),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Medication not found")
    ),
    tag = "medications",
    security(("bearer" = []))
)]
pub async fn get_medication(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Medication>> {
    caller.authorize(Action::ViewMedications)?;

    let conn = state.db.connection().await?;
    let medication = medications::get(&conn, id).await?;
    caller.authorize_for(Action::ViewMedications, medication.patient_id)?;

    Ok(Json(medication))
}

/// Update a medication
///
/// Deactivating requires a `deactivation_reason`; reactivating clears it.
#[utoipa::path(
    patch,
    path = "/medications/{id}",
    params(("id" = i64, Path, description = "Medication ID")),
    request_body = UpdateMedicationRequest,
    responses(
        (status = 200, description = "Updated medication", body = Medication),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Doctor or admin role required"),
        (status = 404, description = "Medication not found")
    ),
    tag = "medications",
    security(("bearer" = []))
)]
pub async fn update_medication(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<UpdateMedicationRequest>,
) -> Result<Json<Medication>> {
    caller.authorize(Action::UpdateMedication)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let mut medication = medications::get(&tx, id).await?;
        changes.apply(&mut medication)?;
        medications::update(&tx, &medication).await?;
        Ok::<_, AppError>(medication)
    }
    .await;
    let medication = db::finish(tx, outcome).await?;

    tracing::info!(
        medication_id = id,
        active = medication.active,
        by = caller.user_id(),
        "updated medication"
    );
    Ok(Json(medication))
}
