//! Vital-sign endpoints.
//!
//! Every kind shares the same two operations, implemented once over
//! [`Vital`]; the per-kind functions below only bind them to a route and
//! document them.

use crate::{
    AppState,
    auth::{middleware::AuthUser, policy::Action},
    db::{self, users, vitals},
    models::{
        BloodPressure, BloodPressureRecord, Glucose, GlucoseRecord, HeartRate, HeartRateRecord,
        Temperature, TemperatureRecord, Vital, VitalRecord, Weight, WeightRecord,
    },
    schemas::JsonBody,
    types::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

type Created<V> = (StatusCode, Json<VitalRecord<V>>);

async fn record<V: Vital>(
    state: AppState,
    caller: AuthUser,
    patient_id: i64,
    reading: V,
) -> Result<Created<V>> {
    caller.authorize_for(Action::RecordVital, patient_id)?;
    reading.validate()?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let patient = users::get_patient(&tx, patient_id).await?;
        vitals::insert(&tx, patient.id, &reading).await
    }
    .await;
    let record = db::finish(tx, outcome).await?;

    tracing::info!(
        kind = V::LABEL,
        patient_id,
        by = caller.user_id(),
        "recorded vital"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list<V: Vital>(
    state: AppState,
    caller: AuthUser,
    patient_id: i64,
) -> Result<Json<Vec<VitalRecord<V>>>> {
    caller.authorize_for(Action::ViewVitals, patient_id)?;

    let conn = state.db.connection().await?;
    let patient = users::get_patient(&conn, patient_id).await?;
    Ok(Json(vitals::list_for_patient::<V>(&conn, patient.id).await?))
}

// ============= Blood Pressure =============

/// Record a blood pressure reading
#[utoipa::path(
    post,
    path = "/bp/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = BloodPressure,
    responses(
        (status = 201, description = "Reading recorded", body = BloodPressureRecord),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn record_blood_pressure(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    JsonBody(reading): JsonBody<BloodPressure>,
) -> Result<Created<BloodPressure>> {
    record(state, caller, patient_id, reading).await
}

/// List a patient's blood pressure readings
#[utoipa::path(
    get,
    path = "/bp/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Readings, newest first", body = Vec<BloodPressureRecord>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn list_blood_pressure(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<VitalRecord<BloodPressure>>>> {
    list(state, caller, patient_id).await
}

// ============= Heart Rate =============

/// Record a heart rate reading
#[utoipa::path(
    post,
    path = "/heartrate/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = HeartRate,
    responses(
        (status = 201, description = "Reading recorded", body = HeartRateRecord),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn record_heart_rate(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    JsonBody(reading): JsonBody<HeartRate>,
) -> Result<Created<HeartRate>> {
    record(state, caller, patient_id, reading).await
}

/// List a patient's heart rate readings
#[utoipa::path(
    get,
    path = "/heartrate/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Readings, newest first", body = Vec<HeartRateRecord>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn list_heart_rate(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<VitalRecord<HeartRate>>>> {
    list(state, caller, patient_id).await
}

// ============= Weight =============

/// Record a weight reading
#[utoipa::path(
    post,
    path = "/weight/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = Weight,
    responses(
        (status = 201, description = "Reading recorded", body = WeightRecord),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn record_weight(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    JsonBody(reading): JsonBody<Weight>,
) -> Result<Created<Weight>> {
    record(state, caller, patient_id, reading).await
}

/// List a patient's weight readings
#[utoipa::path(
    get,
    path = "/weight/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Readings, newest first", body = Vec<WeightRecord>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn list_weight(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<VitalRecord<Weight>>>> {
    list(state, caller, patient_id).await
}

// ============= Glucose =============

/// Record a blood glucose reading
#[utoipa::path(
    post,
    path = "/glucose/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = Glucose,
    responses(
        (status = 201, description = "Reading recorded", body = GlucoseRecord),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn record_glucose(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    JsonBody(reading): JsonBody<Glucose>,
) -> Result<Created<Glucose>> {
    record(state, caller, patient_id, reading).await
}

/// List a patient's blood glucose readings
#[utoipa::path(
    get,
    path = "/glucose/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Readings, newest first", body = Vec<GlucoseRecord>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn list_glucose(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<VitalRecord<Glucose>>>> {
    list(state, caller, patient_id).await
}

// ============= Temperature =============

/// Record a body temperature reading
#[utoipa::path(
    post,
    path = "/temperature/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = Temperature,
    responses(
        (status = 201, description = "Reading recorded", body = TemperatureRecord),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn record_temperature(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    JsonBody(reading): JsonBody<Temperature>,
) -> Result<Created<Temperature>> {
    record(state, caller, patient_id, reading).await
}

/// List a patient's body temperature readings
#[utoipa::path(
    get,
    path = "/temperature/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Readings, newest first", body = Vec<TemperatureRecord>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "vitals",
    security(("bearer" = []))
)]
pub async fn list_temperature(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<VitalRecord<Temperature>>>> {
    list(state, caller, patient_id).await
}
