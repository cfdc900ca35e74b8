use super::{collect, first, get_timestamp, is_unique_violation, opt_text, params, returning, text, timestamp};
use crate::models::{Appointment, AppointmentDetail, UserSummary};
use crate::schemas::NewAppointment;
use crate::types::{AppError, AppointmentStatus, Result};
use libsql::{Connection, Row, Value};

const COLUMNS: &str =
    "id, doctor_id, patient_id, appointment_time, notes, status, reason, created_at";

const DETAIL_SELECT: &str = "SELECT a.id, a.doctor_id, a.patient_id, a.appointment_time, \
                             a.notes, a.status, a.reason, a.created_at, doc.name, p.name \
                             FROM appointments a \
                             JOIN users doc ON doc.id = a.doctor_id \
                             JOIN users p ON p.id = a.patient_id";

fn from_row(row: &Row) -> Result<Appointment> {
    let status: String = row.get(5)?;

    Ok(Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_time: get_timestamp(row, 3)?,
        notes: row.get(4)?,
        status: AppointmentStatus::parse(&status).ok_or_else(|| {
            AppError::Database(format!("Unknown appointment status '{}'", status))
        })?,
        reason: row.get(6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

fn detail_from_row(row: &Row) -> Result<AppointmentDetail> {
    let appointment = from_row(row)?;
    Ok(AppointmentDetail {
        doctor: UserSummary {
            id: appointment.doctor_id,
            name: row.get(8)?,
        },
        patient: UserSummary {
            id: appointment.patient_id,
            name: row.get(9)?,
        },
        appointment,
    })
}

fn slot_taken(err: libsql::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Doctor already has an appointment scheduled at that time".to_string())
    } else {
        err.into()
    }
}

pub async fn insert(conn: &Connection, new: &NewAppointment) -> Result<Appointment> {
    returning(
        conn,
        &format!(
            "INSERT INTO appointments
             (doctor_id, patient_id, appointment_time, notes, status, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            Value::Integer(new.doctor_id),
            Value::Integer(new.patient_id),
            text(timestamp(&new.appointment_time)),
            text(new.notes.as_str()),
            text(AppointmentStatus::Scheduled.as_str()),
            opt_text(new.reason.as_deref()),
            text(timestamp(&super::now())),
        ],
        slot_taken,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

pub async fn find(conn: &Connection, id: i64) -> Result<Option<Appointment>> {
    let rows = conn
        .query(&format!("SELECT {} FROM appointments WHERE id = ?1", COLUMNS), [id])
        .await?;
    first(rows, from_row).await
}

pub async fn get(conn: &Connection, id: i64) -> Result<Appointment> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment with ID {} not found", id)))
}

pub async fn update(conn: &Connection, appointment: &Appointment) -> Result<()> {
    conn.execute(
        "UPDATE appointments
         SET appointment_time = ?1, notes = ?2, reason = ?3, status = ?4
         WHERE id = ?5",
        params(vec![
            text(timestamp(&appointment.appointment_time)),
            text(appointment.notes.as_str()),
            opt_text(appointment.reason.as_deref()),
            text(appointment.status.as_str()),
            Value::Integer(appointment.id),
        ]),
    )
    .await
    .map_err(slot_taken)?;

    Ok(())
}

/// Appointments where `user_id` is the doctor or the patient, soonest first.
pub async fn list_for_participant(conn: &Connection, user_id: i64) -> Result<Vec<AppointmentDetail>> {
    let rows = conn
        .query(
            &format!(
                "{} WHERE a.doctor_id = ?1 OR a.patient_id = ?1 ORDER BY a.appointment_time, a.id",
                DETAIL_SELECT
            ),
            [user_id],
        )
        .await?;
    collect(rows, detail_from_row).await
}
