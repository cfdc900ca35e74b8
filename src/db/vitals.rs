//! Storage for every [`Vital`] kind.
//!
//! SQL is assembled from the trait's table and column constants, which are
//! compile-time strings, never request data.

use super::{collect, get_timestamp, returning, text, timestamp};
use crate::models::{Vital, VitalRecord};
use crate::types::{AppError, Result};
use libsql::{Connection, Row, Value};

fn select_columns<V: Vital>() -> String {
    format!("id, patient_id, {}, recorded_at", V::COLUMNS.join(", "))
}

fn from_row<V: Vital>(row: &Row) -> Result<VitalRecord<V>> {
    let offset = 2;
    let recorded_at = offset + V::COLUMNS.len() as i32;

    Ok(VitalRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        reading: V::from_row(row, offset)?,
        recorded_at: get_timestamp(row, recorded_at)?,
    })
}

/// Stores a reading stamped with the current time.
pub async fn insert<V: Vital>(conn: &Connection, patient_id: i64, reading: &V) -> Result<VitalRecord<V>> {
    let placeholders: Vec<String> = (0..V::COLUMNS.len() + 2)
        .map(|i| format!("?{}", i + 1))
        .collect();
    let sql = format!(
        "INSERT INTO {} (patient_id, {}, recorded_at) VALUES ({}) RETURNING {}",
        V::TABLE,
        V::COLUMNS.join(", "),
        placeholders.join(", "),
        select_columns::<V>()
    );

    let mut values = Vec::with_capacity(V::COLUMNS.len() + 2);
    values.push(Value::Integer(patient_id));
    values.extend(reading.values());
    values.push(text(timestamp(&super::now())));

    let record = returning(conn, &sql, values, AppError::from, from_row::<V>)
        .await?
        .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))?;

    tracing::debug!(kind = V::LABEL, patient_id, id = record.id, "recorded vital");
    Ok(record)
}

/// A patient's readings, newest first.
pub async fn list_for_patient<V: Vital>(conn: &Connection, patient_id: i64) -> Result<Vec<VitalRecord<V>>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM {} WHERE patient_id = ?1 ORDER BY recorded_at DESC, id DESC",
                select_columns::<V>(),
                V::TABLE
            ),
            [patient_id],
        )
        .await?;
    collect(rows, from_row::<V>).await
}
