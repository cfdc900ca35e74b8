use super::{collect, get_flag, get_timestamp, returning, text, timestamp};
use crate::models::Notification;
use crate::types::{AppError, Result};
use libsql::{Connection, Row, Value};

const COLUMNS: &str = "id, user_id, message, is_read, created_at";

fn from_row(row: &Row) -> Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        is_read: get_flag(row, 3)?,
        created_at: get_timestamp(row, 4)?,
    })
}

pub async fn insert(conn: &Connection, user_id: i64, message: &str) -> Result<Notification> {
    returning(
        conn,
        &format!(
            "INSERT INTO notifications (user_id, message, is_read, created_at)
             VALUES (?1, ?2, 0, ?3)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            Value::Integer(user_id),
            text(message),
            text(timestamp(&super::now())),
        ],
        AppError::from,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

/// A user's notifications, newest first.
pub async fn list_for_user(conn: &Connection, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
    let sql = if unread_only {
        format!(
            "SELECT {} FROM notifications WHERE user_id = ?1 AND is_read = 0
             ORDER BY created_at DESC, id DESC",
            COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            COLUMNS
        )
    };

    let rows = conn.query(&sql, [user_id]).await?;
    collect(rows, from_row).await
}

/// Marks one of `user_id`'s notifications read. Another user's
/// notification is reported as missing.
pub async fn mark_read(conn: &Connection, id: i64, user_id: i64) -> Result<Notification> {
    returning(
        conn,
        &format!(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2 RETURNING {}",
            COLUMNS
        ),
        vec![Value::Integer(id), Value::Integer(user_id)],
        AppError::from,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Notification with ID {} not found", id)))
}
