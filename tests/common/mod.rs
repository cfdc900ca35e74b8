//! Shared fixtures for the integration tests.
//!
//! Each [`TestApp`] owns a fresh database file in a temporary directory, so
//! tests never share state.

#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Duration, DurationRound, Utc};
use medrec::{
    AppState, build_app,
    auth::jwt::AuthService,
    cli::admin::create_admin,
    db::Database,
    utils::MedrecConfig,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret-at-least-32-characters-long";
pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub auth: Arc<AuthService>,
    _dir: TempDir,
}

/// A registered account and a bearer token for it.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(MedrecConfig::default()).await
    }

    pub async fn with_config(config: MedrecConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("medrec.db");

        let db = Database::open(&path.to_string_lossy(), None)
            .await
            .expect("Failed to open test database");
        db.migrate().await.expect("Failed to migrate test database");

        let db = Arc::new(db);
        let auth = Arc::new(AuthService::new(TEST_SECRET.to_string(), 3600));
        let state = AppState {
            config: Arc::new(config),
            db: db.clone(),
            auth_service: auth.clone(),
        };

        let server = TestServer::new(build_app(state)).expect("Failed to create test server");

        Self {
            server,
            db,
            auth,
            _dir: dir,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/users/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string()
    }

    async fn register(&self, body: Value) -> Account {
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let response = self.server.post("/users").json(&body).await;
        response.assert_status(StatusCode::CREATED);

        let id = response.json::<Value>()["id"].as_i64().expect("user id");
        let token = self.login(&email, PASSWORD).await;
        Account { id, email, token }
    }

    pub async fn patient(&self, name: &str) -> Account {
        self.register(json!({
            "name": name,
            "email": email_for(name),
            "password": PASSWORD,
            "role": "patient",
            "dob": "1980-04-12",
        }))
        .await
    }

    pub async fn doctor(&self, name: &str) -> Account {
        self.register(json!({
            "name": name,
            "email": email_for(name),
            "password": PASSWORD,
            "role": "doctor",
        }))
        .await
    }

    pub async fn admin(&self, name: &str) -> Account {
        let email = email_for(name);
        let user = create_admin(&self.db, name.to_string(), email.clone(), PASSWORD.to_string())
            .await
            .expect("Failed to create admin");
        let token = self.login(&email, PASSWORD).await;
        Account {
            id: user.id,
            email,
            token,
        }
    }

    pub async fn diagnose(&self, doctor: &Account, patient: &Account, name: &str) -> Value {
        let response = self
            .server
            .post(&format!("/diagnoses/patients/{}", patient.id))
            .authorization_bearer(&doctor.token)
            .json(&json!({ "diagnosis_name": name, "diagnosis_date": "2024-01-15", "notes": "Seen in clinic" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    pub async fn schedule(&self, caller: &Account, doctor: &Account, patient: &Account, at: DateTime<Utc>) -> Value {
        let response = self
            .server
            .post("/appointments")
            .authorization_bearer(&caller.token)
            .json(&json!({
                "doctor_id": doctor.id,
                "patient_id": patient.id,
                "appointment_time": at.to_rfc3339(),
                "notes": "Follow-up",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

pub fn email_for(name: &str) -> String {
    format!("{}@example.com", name.to_lowercase().replace(' ', "."))
}

/// A whole-minute instant `days` from now.
pub fn days_ahead(days: i64) -> DateTime<Utc> {
    let at = Utc::now() + Duration::days(days);
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}
