use super::{
    collect, date, first, get_date, get_timestamp, is_unique_violation, opt_text, params,
    returning, text, timestamp,
};
use crate::models::{Diagnosis, DiagnosisDetail, UserSummary};
use crate::schemas::NewDiagnosis;
use crate::types::{AppError, Result};
use libsql::{Connection, Row, Value};

const COLUMNS: &str =
    "id, patient_id, doctor_id, diagnosis_name, diagnosis_code, diagnosis_date, notes, created_at";

/// Listing query: every diagnosis column followed by both participants' names.
const DETAIL_SELECT: &str = "SELECT d.id, d.patient_id, d.doctor_id, d.diagnosis_name, \
                             d.diagnosis_code, d.diagnosis_date, d.notes, d.created_at, \
                             p.name, doc.name \
                             FROM diagnoses d \
                             JOIN users p ON p.id = d.patient_id \
                             JOIN users doc ON doc.id = d.doctor_id";

fn from_row(row: &Row) -> Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        diagnosis_name: row.get(3)?,
        diagnosis_code: row.get(4)?,
        diagnosis_date: get_date(row, 5)?,
        notes: row.get(6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

fn detail_from_row(row: &Row) -> Result<DiagnosisDetail> {
    let diagnosis = from_row(row)?;
    Ok(DiagnosisDetail {
        patient: UserSummary {
            id: diagnosis.patient_id,
            name: row.get(8)?,
        },
        doctor: UserSummary {
            id: diagnosis.doctor_id,
            name: row.get(9)?,
        },
        diagnosis,
    })
}

fn duplicate_name(name: &str) -> impl Fn(libsql::Error) -> AppError + '_ {
    move |err| {
        if is_unique_violation(&err) {
            AppError::Conflict(format!(
                "Diagnosis '{}' already recorded for this patient by this doctor",
                name
            ))
        } else {
            err.into()
        }
    }
}

pub async fn insert(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    new: &NewDiagnosis,
) -> Result<Diagnosis> {
    returning(
        conn,
        &format!(
            "INSERT INTO diagnoses
             (patient_id, doctor_id, diagnosis_name, diagnosis_code, diagnosis_date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            Value::Integer(patient_id),
            Value::Integer(doctor_id),
            text(new.diagnosis_name.as_str()),
            opt_text(new.diagnosis_code.as_deref()),
            text(date(&new.diagnosis_date)),
            text(new.notes.as_str()),
            text(timestamp(&super::now())),
        ],
        duplicate_name(&new.diagnosis_name),
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

pub async fn find(conn: &Connection, id: i64) -> Result<Option<Diagnosis>> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM diagnoses WHERE id = ?1", COLUMNS),
            [id],
        )
        .await?;
    first(rows, from_row).await
}

pub async fn get(conn: &Connection, id: i64) -> Result<Diagnosis> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Diagnosis with ID {} not found", id)))
}

pub async fn update(conn: &Connection, diagnosis: &Diagnosis) -> Result<()> {
    conn.execute(
        "UPDATE diagnoses
         SET diagnosis_name = ?1, diagnosis_code = ?2, diagnosis_date = ?3, notes = ?4
         WHERE id = ?5",
        params(vec![
            text(diagnosis.diagnosis_name.as_str()),
            opt_text(diagnosis.diagnosis_code.as_deref()),
            text(date(&diagnosis.diagnosis_date)),
            text(diagnosis.notes.as_str()),
            Value::Integer(diagnosis.id),
        ]),
    )
    .await
    .map_err(duplicate_name(&diagnosis.diagnosis_name))?;

    Ok(())
}

pub async fn list_for_patient(conn: &Connection, patient_id: i64) -> Result<Vec<DiagnosisDetail>> {
    let rows = conn
        .query(
            &format!(
                "{} WHERE d.patient_id = ?1 ORDER BY d.diagnosis_date DESC, d.id DESC",
                DETAIL_SELECT
            ),
            [patient_id],
        )
        .await?;
    collect(rows, detail_from_row).await
}

/// Every diagnosis with this name, compared case-insensitively.
pub async fn search_by_name(conn: &Connection, name: &str) -> Result<Vec<DiagnosisDetail>> {
    let rows = conn
        .query(
            &format!(
                "{} WHERE d.diagnosis_name = ?1 COLLATE NOCASE ORDER BY d.diagnosis_date DESC, d.id DESC",
                DETAIL_SELECT
            ),
            [name],
        )
        .await?;
    collect(rows, detail_from_row).await
}
