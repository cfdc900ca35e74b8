use super::{
    collect, date, first, flag, get_flag, get_opt_date, get_opt_timestamp, get_timestamp,
    is_foreign_key_violation, is_unique_violation, opt_text, params, returning, text, timestamp,
};
use crate::models::{User, UserCredentials};
use crate::schemas::NewUser;
use crate::types::{AppError, Result, Role};
use chrono::{DateTime, Utc};
use libsql::{Connection, Row, Value};

const COLUMNS: &str = "id, name, email, dob, role, active, archived_at, created_at";

pub(crate) fn from_row(row: &Row) -> Result<User> {
    let role: String = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        dob: get_opt_date(row, 3)?,
        role: Role::parse(&role)
            .ok_or_else(|| AppError::Database(format!("Unknown role '{}'", role)))?,
        active: get_flag(row, 5)?,
        archived_at: get_opt_timestamp(row, 6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

fn duplicate_email(err: libsql::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Email already registered".to_string())
    } else {
        err.into()
    }
}

pub async fn insert(conn: &Connection, new_user: &NewUser, password_hash: &str) -> Result<User> {
    returning(
        conn,
        &format!(
            "INSERT INTO users (name, email, password_hash, dob, role, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
             RETURNING {}",
            COLUMNS
        ),
        vec![
            text(new_user.name.as_str()),
            text(new_user.email.as_str()),
            text(password_hash),
            new_user.dob.as_ref().map_or(Value::Null, |d| text(date(d))),
            text(new_user.role.as_str()),
            text(timestamp(&super::now())),
        ],
        duplicate_email,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))
}

pub async fn find(conn: &Connection, id: i64) -> Result<Option<User>> {
    let rows = conn
        .query(&format!("SELECT {} FROM users WHERE id = ?1", COLUMNS), [id])
        .await?;
    first(rows, from_row).await
}

/// Looks up a user, 404 if absent.
pub async fn get(conn: &Connection, id: i64) -> Result<User> {
    find(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))
}

/// Looks up a user that must have the patient role, 404 otherwise.
pub async fn get_patient(conn: &Connection, id: i64) -> Result<User> {
    find(conn, id)
        .await?
        .filter(User::is_patient)
        .ok_or_else(|| AppError::NotFound(format!("Patient with ID {} not found", id)))
}

/// Looks up a user that must have the doctor role, 404 otherwise.
pub async fn get_doctor(conn: &Connection, id: i64) -> Result<User> {
    find(conn, id)
        .await?
        .filter(|user| user.role == Role::Doctor)
        .ok_or_else(|| AppError::NotFound(format!("Doctor with ID {} not found", id)))
}

pub async fn credentials_by_email(conn: &Connection, email: &str) -> Result<Option<UserCredentials>> {
    let rows = conn
        .query(
            &format!(
                "SELECT {}, password_hash FROM users WHERE email = ?1",
                COLUMNS
            ),
            [email.to_lowercase()],
        )
        .await?;

    first(rows, |row| {
        Ok(UserCredentials {
            user: from_row(row)?,
            password_hash: row.get(8)?,
        })
    })
    .await
}

pub async fn list(conn: &Connection, role: Option<Role>) -> Result<Vec<User>> {
    let rows = match role {
        Some(role) => {
            conn.query(
                &format!("SELECT {} FROM users WHERE role = ?1 ORDER BY id", COLUMNS),
                [role.as_str()],
            )
            .await?
        }
        None => {
            conn.query(&format!("SELECT {} FROM users ORDER BY id", COLUMNS), ())
                .await?
        }
    };

    collect(rows, from_row).await
}

/// Writes back the profile fields of `user`, and the password hash when given.
pub async fn update(conn: &Connection, user: &User, password_hash: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE users
         SET name = ?1, email = ?2, dob = ?3, password_hash = COALESCE(?4, password_hash)
         WHERE id = ?5",
        params(vec![
            text(user.name.as_str()),
            text(user.email.as_str()),
            user.dob.as_ref().map_or(Value::Null, |d| text(date(d))),
            opt_text(password_hash),
            Value::Integer(user.id),
        ]),
    )
    .await
    .map_err(duplicate_email)?;

    Ok(())
}

/// Deactivates the account. Archiving an archived user keeps the first timestamp.
pub async fn archive(conn: &Connection, id: i64, at: DateTime<Utc>) -> Result<User> {
    returning(
        conn,
        &format!(
            "UPDATE users
             SET active = ?1, archived_at = COALESCE(archived_at, ?2)
             WHERE id = ?3
             RETURNING {}",
            COLUMNS
        ),
        vec![flag(false), text(timestamp(&at)), Value::Integer(id)],
        AppError::from,
        from_row,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found", id)))
}

/// Hard-deletes a user. Records they own as a patient go with them; records
/// they authored as a clinician block the delete.
pub async fn delete(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM users WHERE id = ?1", [id])
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Conflict(
                    "User has authored clinical records; archive the account instead".to_string(),
                )
            } else {
                e.into()
            }
        })?;

    if deleted == 0 {
        return Err(AppError::NotFound(format!("User with ID {} not found", id)));
    }
    Ok(())
}
