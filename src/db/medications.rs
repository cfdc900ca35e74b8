use super::{collect, first, flag, get_flag, get_timestamp, opt_text, params, returning, text, timestamp};
use crate::models::{Medication, User};
use crate::schemas::NewMedication;
use crate::types::{AppError, Result};
use libsql::{Connection, Row, Value};

const COLUMNS: &str = "id, patient_id, name, dosage, frequency, prescribed_by_id, \
                       prescribed_by_name, active, deactivation_reason, created_at";

fn from_row(row: &Row) -> Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        prescribed_by_id: row.get(5)?,
        prescribed_by_name: row.get(6)?,
        active: get_flag(row, 7)?,
        deactivation_reason: row.get(8)?,
        created_at: get_timestamp(row, 9)?,
    })
}

/// Records a prescription, snapshotting the prescriber's current name.
pub async fn insert(
    conn: &Connection,
    patient_id: i64,
    prescriber: &User,
    new: &NewMedication,
) -> Result<Medication> {
    returning(
        conn,
        &format!(
            "INSERT INTO medications
             (patient_id, name, dosage, frequency, prescribed_by_id, prescribed_by_name,
              active, deactivation_reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            Value::Integer(patient_id),
            text(new.name.as_str()),
            opt_text(new.dosage.as_deref()),
            opt_text(new.frequency.as_deref()),
            Value::Integer(prescriber.id),
            text(prescriber.name.as_str()),
            flag(new.active),
            opt_text(new.deactivation_reason.as_deref()),
            text(timestamp(&super::now())),
        ],
        AppError::from,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

pub async fn find(conn: &Connection, id: i64) -> Result<Option<Medication>> {
    let rows = conn
        .query(&format!("SELECT {} FROM medications WHERE id = ?1", COLUMNS), [id])
        .await?;
    first(rows, from_row).await
}

pub async fn get(conn: &Connection, id: i64) -> Result<Medication> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Medication with ID {} not found", id)))
}

pub async fn update(conn: &Connection, medication: &Medication) -> Result<()> {
    conn.execute(
        "UPDATE medications
         SET name = ?1, dosage = ?2, frequency = ?3, active = ?4, deactivation_reason = ?5
         WHERE id = ?6",
        params(vec![
            text(medication.name.as_str()),
            opt_text(medication.dosage.as_deref()),
            opt_text(medication.frequency.as_deref()),
            flag(medication.active),
            opt_text(medication.deactivation_reason.as_deref()),
            Value::Integer(medication.id),
        ]),
    )
    .await?;

    Ok(())
}

/// A patient's medications, newest first, optionally filtered on `active`.
pub async fn list_for_patient(
    conn: &Connection,
    patient_id: i64,
    active: Option<bool>,
) -> Result<Vec<Medication>> {
    let rows = match active {
        Some(active) => {
            conn.query(
                &format!(
                    "SELECT {} FROM medications WHERE patient_id = ?1 AND active = ?2
                     ORDER BY created_at DESC, id DESC",
                    COLUMNS
                ),
                params(vec![Value::Integer(patient_id), flag(active)]),
            )
            .await?
        }
        None => {
            conn.query(
                &format!(
                    "SELECT {} FROM medications WHERE patient_id = ?1
                     ORDER BY created_at DESC, id DESC",
                    COLUMNS
                ),
                [patient_id],
            )
            .await?
        }
    };

    collect(rows, from_row).await
}
