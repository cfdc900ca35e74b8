use crate::{
    AppState,
    auth::{
        middleware::AuthUser,
        policy::{Access, Action},
    },
    db::{self, appointments, notifications, users},
    models::{Appointment, AppointmentDetail},
    schemas::{CreateAppointmentRequest, UpdateAppointmentRequest, ValidatedJson},
    types::{AppError, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use libsql::Connection;

/// Both participants own an appointment, so `OwnOnly` means "is one of them".
fn authorize_participant(caller: &AuthUser, action: Action, appointment: &Appointment) -> Result<()> {
    match caller.authorize(action)? {
        Access::OwnOnly if !appointment.involves(caller.user_id()) => Err(AppError::Forbidden(
            "Not allowed to access another user's records".to_string(),
        )),
        _ => Ok(()),
    }
}

fn display_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

async fn notify_participants(conn: &Connection, appointment: &Appointment, message: &str) -> Result<()> {
    notifications::insert(conn, appointment.patient_id, message).await?;
    notifications::insert(conn, appointment.doctor_id, message).await?;
    Ok(())
}

/// Schedule an appointment
///
/// Patients and doctors may only schedule appointments they take part in.
#[utoipa::path(
    post,
    path = "/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment scheduled", body = Appointment),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Doctor or patient not found"),
        (status = 409, description = "Doctor already booked at that time")
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(new): ValidatedJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>)> {
    if caller.authorize(Action::ScheduleAppointment)? == Access::OwnOnly
        && caller.user_id() != new.doctor_id
        && caller.user_id() != new.patient_id
    {
        return Err(AppError::Forbidden(
            "Appointments can only be scheduled by a participant".to_string(),
        ));
    }

    let tx = state.db.begin().await?;
    let outcome = async {
        let doctor = users::get_doctor(&tx, new.doctor_id).await?;
        let patient = users::get_patient(&tx, new.patient_id).await?;
        let appointment = appointments::insert(&tx, &new).await?;

        let when = display_time(&appointment.appointment_time);
        notifications::insert(
            &tx,
            patient.id,
            &format!("Appointment scheduled with {} on {}", doctor.name, when),
        )
        .await?;
        notifications::insert(
            &tx,
            doctor.id,
            &format!("Appointment scheduled with {} on {}", patient.name, when),
        )
        .await?;

        Ok::<_, AppError>(appointment)
    }
    .await;
    let appointment = db::finish(tx, outcome).await?;

    tracing::info!(
        appointment_id = appointment.id,
        doctor_id = appointment.doctor_id,
        patient_id = appointment.patient_id,
        by = caller.user_id(),
        "scheduled appointment"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// List the caller's appointments
#[utoipa::path(
    get,
    path = "/appointments/mine",
    responses(
        (status = 200, description = "Appointments the caller takes part in, soonest first", body = Vec<AppointmentDetail>)
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn my_appointments(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<AppointmentDetail>>> {
    caller.authorize(Action::ViewAppointments)?;

    let conn = state.db.connection().await?;
    Ok(Json(
        appointments::list_for_participant(&conn, caller.user_id()).await?,
    ))
}

/// Get an appointment by ID
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Appointment not found")
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>> {
    caller.authorize(Action::ViewAppointments)?;

    let conn = state.db.connection().await?;
    let appointment = appointments::get(&conn, id).await?;
    authorize_participant(&caller, Action::ViewAppointments, &appointment)?;

    Ok(Json(appointment))
}

/// Update an appointment
///
/// Only scheduled appointments can change. A status change notifies both
/// participants.
#[utoipa::path(
    patch,
    path = "/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment is no longer scheduled, or the new slot is taken")
    ),
    tag = "appointments",
    security(("bearer" = []))
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>> {
    caller.authorize(Action::UpdateAppointment)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let mut appointment = appointments::get(&tx, id).await?;
        authorize_participant(&caller, Action::UpdateAppointment, &appointment)?;

        if appointment.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Appointment is already {}",
                appointment.status.as_str()
            )));
        }

        let previous = appointment.status;
        changes.apply(&mut appointment);
        appointments::update(&tx, &appointment).await?;

        if appointment.status != previous {
            let message = format!(
                "Appointment on {} is now {}",
                display_time(&appointment.appointment_time),
                appointment.status.as_str()
            );
            notify_participants(&tx, &appointment, &message).await?;
        }

        Ok::<_, AppError>(appointment)
    }
    .await;
    let appointment = db::finish(tx, outcome).await?;

    tracing::info!(
        appointment_id = id,
        status = appointment.status.as_str(),
        by = caller.user_id(),
        "updated appointment"
    );
    Ok(Json(appointment))
}
