//! Versioned schema migrations.
//!
//! Each migration runs once, inside its own transaction, and is recorded in
//! `schema_migrations`. New migrations are appended; applied ones are never
//! edited.

use crate::types::{AppError, Result};
use libsql::Connection;

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "users_and_clinical_records",
        sql: r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                dob TEXT,
                role TEXT NOT NULL DEFAULT 'patient'
                    CHECK (role IN ('patient', 'doctor', 'admin')),
                active INTEGER NOT NULL DEFAULT 1,
                archived_at TEXT,
                created_at TEXT NOT NULL,
                CHECK (role <> 'patient' OR dob IS NOT NULL)
            );

            CREATE TABLE diagnoses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                doctor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                diagnosis_name TEXT NOT NULL,
                diagnosis_code TEXT,
                diagnosis_date TEXT NOT NULL,
                notes TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (patient_id, doctor_id, diagnosis_name)
            );
            CREATE INDEX idx_diagnoses_patient ON diagnoses(patient_id);
            CREATE INDEX idx_diagnoses_name ON diagnoses(diagnosis_name COLLATE NOCASE);

            CREATE TABLE medications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                dosage TEXT,
                frequency TEXT,
                prescribed_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                prescribed_by_name TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                deactivation_reason TEXT,
                created_at TEXT NOT NULL,
                CHECK (active = 1 OR deactivation_reason IS NOT NULL)
            );
            CREATE INDEX idx_medications_patient ON medications(patient_id);

            CREATE TABLE goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                target_date TEXT NOT NULL,
                is_complete INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX idx_goals_patient ON goals(patient_id);
        "#,
    },
    Migration {
        version: 2,
        name: "vitals",
        sql: r#"
            CREATE TABLE blood_pressures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                systolic INTEGER NOT NULL,
                diastolic INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX idx_blood_pressures_patient ON blood_pressures(patient_id, recorded_at);

            CREATE TABLE heart_rates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                value INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX idx_heart_rates_patient ON heart_rates(patient_id, recorded_at);

            CREATE TABLE weights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                value REAL NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX idx_weights_patient ON weights(patient_id, recorded_at);

            CREATE TABLE glucose (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                value INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX idx_glucose_patient ON glucose(patient_id, recorded_at);

            CREATE TABLE temperatures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                value REAL NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX idx_temperatures_patient ON temperatures(patient_id, recorded_at);
        "#,
    },
    Migration {
        version: 3,
        name: "appointments_and_notifications",
        sql: r#"
            CREATE TABLE appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                patient_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                appointment_time TEXT NOT NULL,
                notes TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled'
                    CHECK (status IN ('scheduled', 'completed', 'cancelled', 'no_show')),
                reason TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX idx_appointments_patient ON appointments(patient_id);
            CREATE UNIQUE INDEX idx_appointments_doctor_slot
                ON appointments(doctor_id, appointment_time)
                WHERE status = 'scheduled';

            CREATE TABLE notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);
        "#,
    },
    Migration {
        version: 4,
        name: "diagnosis_names_unique_ignoring_case",
        sql: r#"
            CREATE UNIQUE INDEX idx_diagnoses_unique_name
                ON diagnoses(patient_id, doctor_id, diagnosis_name COLLATE NOCASE);
        "#,
    },
];

/// Applies every migration newer than the recorded version.
///
/// Returns how many migrations were applied.
pub async fn migrate(conn: &Connection) -> Result<usize> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        (),
    )
    .await
    .map_err(|e| AppError::Database(format!("Failed to create schema_migrations table: {}", e)))?;

    let current = current_version(conn).await?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction().await?;

        tx.execute_batch(migration.sql).await.map_err(|e| {
            AppError::Database(format!(
                "Migration {} ({}) failed: {}",
                migration.version, migration.name, e
            ))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            libsql::params![
                migration.version,
                migration.name,
                super::timestamp(&super::now())
            ],
        )
        .await?;
        tx.commit().await?;

        tracing::info!(version = migration.version, name = migration.name, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Highest applied migration version, 0 for a fresh database.
pub async fn current_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", ())
        .await?;

    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_versions_are_increasing() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();

        assert_eq!(versions, sorted);
        assert_eq!(versions.first(), Some(&1));
    }
}
