use super::{collect, date, first, flag, get_date, get_flag, get_timestamp, params, returning, text, timestamp};
use crate::models::Goal;
use crate::schemas::NewGoal;
use crate::types::{AppError, Result};
use libsql::{Connection, Row, Value};

const COLUMNS: &str =
    "id, patient_id, created_by, title, description, target_date, is_complete, created_at";

fn from_row(row: &Row) -> Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        created_by: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        target_date: get_date(row, 5)?,
        is_complete: get_flag(row, 6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

pub async fn insert(conn: &Connection, patient_id: i64, created_by: i64, new: &NewGoal) -> Result<Goal> {
    returning(
        conn,
        &format!(
            "INSERT INTO goals
             (patient_id, created_by, title, description, target_date, is_complete, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            Value::Integer(patient_id),
            Value::Integer(created_by),
            text(new.title.as_str()),
            text(new.description.as_str()),
            text(date(&new.target_date)),
            flag(new.is_complete),
            text(timestamp(&super::now())),
        ],
        AppError::from,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

pub async fn find(conn: &Connection, id: i64) -> Result<Option<Goal>> {
    let rows = conn
        .query(&format!("SELECT {} FROM goals WHERE id = ?1", COLUMNS), [id])
        .await?;
    first(rows, from_row).await
}

pub async fn get(conn: &Connection, id: i64) -> Result<Goal> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goal with ID {} not found", id)))
}

pub async fn update(conn: &Connection, goal: &Goal) -> Result<()> {
    conn.execute(
        "UPDATE goals
         SET title = ?1, description = ?2, target_date = ?3, is_complete = ?4
         WHERE id = ?5",
        params(vec![
            text(goal.title.as_str()),
            text(goal.description.as_str()),
            text(date(&goal.target_date)),
            flag(goal.is_complete),
            Value::Integer(goal.id),
        ]),
    )
    .await?;

    Ok(())
}

/// A patient's goals, soonest target first.
pub async fn list_for_patient(conn: &Connection, patient_id: i64) -> Result<Vec<Goal>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {} FROM goals WHERE patient_id = ?1 ORDER BY target_date, id",
                COLUMNS
            ),
            [patient_id],
        )
        .await?;
    collect(rows, from_row).await
}
