//! End-to-end tests against the full router, backed by a temporary database.

mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TEST_SECRET, TestApp, days_ahead, email_for};
use medrec::{auth::jwt::AuthService, db::users, utils::MedrecConfig};
use serde_json::{Value, json};

// ============= Health & Docs =============

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/openapi.json").await;
    response.assert_status_ok();

    let doc: Value = response.json();
    assert!(doc["paths"]["/users/login"].is_object());
    assert!(doc["paths"]["/medications/patients/{patient_id}"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
}

// ============= Registration & Login =============

#[tokio::test]
async fn test_register_never_stores_plaintext_password() {
    let app = TestApp::new().await;
    let patient = app.patient("Ada Patient").await;

    let conn = app.db.connection().await.unwrap();
    let credentials = users::credentials_by_email(&conn, &patient.email)
        .await
        .unwrap()
        .expect("registered user");

    assert_ne!(credentials.password_hash, PASSWORD);
    assert!(credentials.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_register_response_omits_password() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Grace Doctor",
            "email": "Grace@Example.com",
            "password": PASSWORD,
            "role": "doctor",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let user: Value = response.json();
    assert_eq!(user["email"], "grace@example.com");
    assert_eq!(user["role"], "doctor");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_patient_requires_dob_but_doctor_does_not() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "No Dob",
            "email": "nodob@example.com",
            "password": PASSWORD,
            "role": "patient",
        }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["fields"]["dob"].is_array());

    app.doctor("Dr Nodob").await;
}

#[tokio::test]
async fn test_register_rejects_bad_payloads() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({ "name": "", "email": "not-an-email", "password": "short" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["fields"]["name"].is_array());
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());

    let response = app
        .server
        .post("/users")
        .content_type("application/json")
        .text("{not json")
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = MedrecConfig::default();
    config.server.body_limit_bytes = 512;
    let app = TestApp::with_config(config).await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "x".repeat(2048),
            "email": "big@example.com",
            "password": PASSWORD,
            "role": "doctor",
        }))
        .await;
    response.assert_status_bad_request();

    // Ordinary payloads still fit.
    app.doctor("Dr Small").await;
}

#[tokio::test]
async fn test_admin_cannot_self_register() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Sneaky",
            "email": "sneaky@example.com",
            "password": PASSWORD,
            "role": "admin",
        }))
        .await;
    response.assert_status_forbidden();
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.doctor("Dr Twice").await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "name": "Dr Twice",
            "email": email_for("Dr Twice"),
            "password": PASSWORD,
            "role": "doctor",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Login").await;

    for (email, password) in [
        (doctor.email.as_str(), "wrong password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let response = app
            .server
            .post("/users/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_unauthorized();
        assert_eq!(response.json::<Value>()["error"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_token_identifies_caller() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Me").await;

    let response = app
        .server
        .get("/users/me")
        .authorization_bearer(&doctor.token)
        .await;
    response.assert_status_ok();

    let me: Value = response.json();
    assert_eq!(me["id"], doctor.id);
    assert_eq!(me["role"], "doctor");
}

#[tokio::test]
async fn test_missing_and_expired_tokens_are_unauthorized() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Expired").await;

    app.server.get("/users/me").await.assert_status_unauthorized();
    app.server
        .get("/users/me")
        .authorization_bearer("not-a-token")
        .await
        .assert_status_unauthorized();

    let conn = app.db.connection().await.unwrap();
    let user = users::get(&conn, doctor.id).await.unwrap();
    let expired = AuthService::new(TEST_SECRET.to_string(), -3600)
        .issue(&user)
        .unwrap();

    let response = app
        .server
        .get("/users/me")
        .authorization_bearer(&expired)
        .await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "Token has expired");
}

// ============= Users =============

#[tokio::test]
async fn test_list_users_by_role() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr List").await;
    let patient = app.patient("Pat List").await;

    let response = app
        .server
        .get("/users")
        .add_query_param("role", "patient")
        .authorization_bearer(&doctor.token)
        .await;
    response.assert_status_ok();
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], patient.id);

    app.server
        .get("/users")
        .authorization_bearer(&patient.token)
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_patients_only_see_and_edit_themselves() {
    let app = TestApp::new().await;
    let alice = app.patient("Alice").await;
    let bob = app.patient("Bob").await;

    app.server
        .get(&format!("/users/{}", bob.id))
        .authorization_bearer(&alice.token)
        .await
        .assert_status_forbidden();

    let response = app
        .server
        .patch(&format!("/users/{}", alice.id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "name": "Alice Renamed" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Alice Renamed");

    app.server
        .patch(&format!("/users/{}", bob.id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "name": "Hijacked" }))
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_password_change_takes_effect() {
    let app = TestApp::new().await;
    let patient = app.patient("Pat Password").await;

    app.server
        .patch(&format!("/users/{}", patient.id))
        .authorization_bearer(&patient.token)
        .json(&json!({ "password": "a brand new password" }))
        .await
        .assert_status_ok();

    app.server
        .post("/users/login")
        .json(&json!({ "email": patient.email, "password": PASSWORD }))
        .await
        .assert_status_unauthorized();
    app.login(&patient.email, "a brand new password").await;
}

#[tokio::test]
async fn test_archived_user_cannot_login() {
    let app = TestApp::new().await;
    let admin = app.admin("Admin Archive").await;
    let doctor = app.doctor("Dr Leaving").await;

    let response = app
        .server
        .post(&format!("/users/{}/archive", doctor.id))
        .authorization_bearer(&admin.token)
        .await;
    response.assert_status_ok();
    let archived: Value = response.json();
    assert_eq!(archived["active"], false);
    assert!(archived["archived_at"].is_string());

    let response = app
        .server
        .post("/users/login")
        .json(&json!({ "email": doctor.email, "password": PASSWORD }))
        .await;
    response.assert_status_forbidden();
}

#[tokio::test]
async fn test_archived_account_loses_access_with_old_token() {
    let app = TestApp::new().await;
    let admin = app.admin("Admin Revoke").await;
    let doctor = app.doctor("Dr Revoked").await;
    let patient = app.patient("Pat Revoked").await;

    app.server
        .post(&format!("/users/{}/archive", doctor.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status_ok();

    let response = app
        .server
        .post(&format!("/medications/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Amoxicillin" }))
        .await;
    response.assert_status_forbidden();
    assert_eq!(response.json::<Value>()["error"], "Account is archived");

    app.server
        .get("/users/me")
        .authorization_bearer(&doctor.token)
        .await
        .assert_status_forbidden();

    // Nothing was written on the archived account's behalf.
    app.server
        .get(&format!("/medications/patients/{}", patient.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_json(&json!([]));
}

#[tokio::test]
async fn test_deleted_account_token_is_invalid() {
    let app = TestApp::new().await;
    let admin = app.admin("Admin Remove").await;
    let doctor = app.doctor("Dr Removed").await;
    let patient = app.patient("Pat Remains").await;

    app.server
        .delete(&format!("/users/{}", doctor.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .post(&format!("/diagnoses/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "diagnosis_name": "Flu", "diagnosis_date": "2024-01-15", "notes": "n" }))
        .await;
    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "Invalid token");
}

#[tokio::test]
async fn test_delete_patient_cascades_clinical_records() {
    let app = TestApp::new().await;
    let admin = app.admin("Admin Delete").await;
    let doctor = app.doctor("Dr Cascade").await;
    let patient = app.patient("Pat Cascade").await;

    let diagnosis = app.diagnose(&doctor, &patient, "Asthma").await;

    app.server
        .delete(&format!("/users/{}", patient.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/diagnoses/{}", diagnosis["id"]))
        .authorization_bearer(&doctor.token)
        .await
        .assert_status_not_found();
    app.server
        .get(&format!("/users/{}", patient.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_delete_author_of_records_conflicts() {
    let app = TestApp::new().await;
    let admin = app.admin("Admin Restrict").await;
    let doctor = app.doctor("Dr Author").await;
    let patient = app.patient("Pat Author").await;
    app.diagnose(&doctor, &patient, "Migraine").await;

    app.server
        .delete(&format!("/users/{}", doctor.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .delete(&format!("/users/{}", admin.id))
        .authorization_bearer(&admin.token)
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .delete("/users/9999")
        .authorization_bearer(&admin.token)
        .await
        .assert_status_not_found();

    app.server
        .delete(&format!("/users/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .await
        .assert_status_forbidden();
}

// ============= Diagnoses =============

#[tokio::test]
async fn test_duplicate_diagnosis_conflicts() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Dup").await;
    let patient = app.patient("Pat Dup").await;

    app.diagnose(&doctor, &patient, "Hypertension").await;

    let response = app
        .server
        .post(&format!("/diagnoses/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "diagnosis_name": "Hypertension", "diagnosis_date": "2024-02-01", "notes": "Seen in clinic" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    app.server
        .post(&format!("/diagnoses/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "diagnosis_name": "hypertension", "diagnosis_date": "2024-02-01", "notes": "Seen in clinic" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Another doctor may record the same diagnosis.
    let other = app.doctor("Dr Second").await;
    app.diagnose(&other, &patient, "Hypertension").await;
}

#[tokio::test]
async fn test_patient_reads_own_diagnoses_only() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr House").await;
    let alice = app.patient("Alice Dx").await;
    let bob = app.patient("Bob Dx").await;
    app.diagnose(&doctor, &alice, "Lupus").await;

    let response = app
        .server
        .get(&format!("/diagnoses/patients/{}", alice.id))
        .authorization_bearer(&alice.token)
        .await;
    response.assert_status_ok();
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["diagnosis_name"], "Lupus");
    assert_eq!(listed[0]["doctor"]["name"], "Dr House");
    assert_eq!(listed[0]["patient"]["id"], alice.id);

    app.server
        .get(&format!("/diagnoses/patients/{}", alice.id))
        .authorization_bearer(&bob.token)
        .await
        .assert_status_forbidden();

    app.server
        .post(&format!("/diagnoses/patients/{}", alice.id))
        .authorization_bearer(&alice.token)
        .json(&json!({ "diagnosis_name": "Self diagnosed", "diagnosis_date": "2024-01-01", "notes": "Seen in clinic" }))
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_diagnosis_search_and_update() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Search").await;
    let alice = app.patient("Alice Search").await;
    let bob = app.patient("Bob Search").await;
    let first = app.diagnose(&doctor, &alice, "Type 2 Diabetes").await;
    app.diagnose(&doctor, &bob, "type 2 diabetes").await;

    let response = app
        .server
        .get("/diagnoses/by-name/TYPE%202%20DIABETES")
        .authorization_bearer(&doctor.token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 2);

    let response = app
        .server
        .patch(&format!("/diagnoses/{}", first["id"]))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "notes": "Diet controlled", "diagnosis_code": "E11" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["notes"], "Diet controlled");
    assert_eq!(updated["diagnosis_code"], "E11");
    assert_eq!(updated["diagnosis_name"], "Type 2 Diabetes");
}

#[tokio::test]
async fn test_diagnosis_for_unknown_patient_is_not_found() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Nobody").await;

    app.server
        .post("/diagnoses/patients/4242")
        .authorization_bearer(&doctor.token)
        .json(&json!({ "diagnosis_name": "Flu", "diagnosis_date": "2024-01-01", "notes": "Seen in clinic" }))
        .await
        .assert_status_not_found();
}

// ============= Medications =============

#[tokio::test]
async fn test_medications_of_unknown_patient_are_not_found() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Meds").await;

    let response = app
        .server
        .get("/medications/patients/4242")
        .authorization_bearer(&doctor.token)
        .await;
    response.assert_status_not_found();

    // A doctor's id is not a patient either.
    app.server
        .get(&format!("/medications/patients/{}", doctor.id))
        .authorization_bearer(&doctor.token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_medication_deactivation_requires_reason() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Rx").await;
    let patient = app.patient("Pat Rx").await;

    let response = app
        .server
        .post(&format!("/medications/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Lisinopril", "dosage": "10mg", "frequency": "daily" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let medication: Value = response.json();
    assert_eq!(medication["active"], true);
    assert_eq!(medication["prescribed_by_id"], doctor.id);
    assert_eq!(medication["prescribed_by_name"], "Dr Rx");

    let path = format!("/medications/{}", medication["id"]);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "active": false }))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "active": false, "deactivation_reason": "Persistent cough" }))
        .await;
    response.assert_status_ok();

    let stored: Value = app
        .server
        .get(&path)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(stored["active"], false);
    assert_eq!(stored["deactivation_reason"], "Persistent cough");
}

#[tokio::test]
async fn test_active_medication_ignores_deactivation_reason() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Stale").await;
    let patient = app.patient("Pat Stale").await;

    let medication: Value = app
        .server
        .post(&format!("/medications/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Atorvastatin" }))
        .await
        .json();

    let response = app
        .server
        .patch(&format!("/medications/{}", medication["id"]))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "deactivation_reason": "stale" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["active"], true);
    assert!(updated["deactivation_reason"].is_null());
}

#[tokio::test]
async fn test_medication_list_filters_by_active() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Filter").await;
    let patient = app.patient("Pat Filter").await;
    let path = format!("/medications/patients/{}", patient.id);

    app.server
        .post(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Metformin" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Warfarin", "active": false, "deactivation_reason": "Switched" }))
        .await
        .assert_status(StatusCode::CREATED);

    let all: Vec<Value> = app
        .server
        .get(&path)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(all.len(), 2);

    let inactive: Vec<Value> = app
        .server
        .get(&path)
        .add_query_param("active", false)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0]["name"], "Warfarin");
}

#[tokio::test]
async fn test_prescription_notifies_patient() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Notify").await;
    let patient = app.patient("Pat Notify").await;

    app.server
        .post(&format!("/medications/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "name": "Amoxicillin" }))
        .await
        .assert_status(StatusCode::CREATED);

    let notifications: Vec<Value> = app
        .server
        .get("/notifications")
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0]["message"].as_str().unwrap().contains("Amoxicillin"));
}

// ============= Goals =============

#[tokio::test]
async fn test_patient_may_only_toggle_goal_completion() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Goal").await;
    let patient = app.patient("Pat Goal").await;

    let response = app
        .server
        .post(&format!("/goals/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({
            "title": "Walk daily",
            "description": "30 minutes",
            "target_date": "2031-06-01",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let goal: Value = response.json();
    assert_eq!(goal["is_complete"], false);
    let path = format!("/goals/{}", goal["id"]);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&patient.token)
        .json(&json!({ "is_complete": true }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["is_complete"], true);

    app.server
        .patch(&path)
        .authorization_bearer(&patient.token)
        .json(&json!({ "title": "Run daily" }))
        .await
        .assert_status_forbidden();

    app.server
        .post(&format!("/goals/patients/{}", patient.id))
        .authorization_bearer(&patient.token)
        .json(&json!({ "title": "Self goal", "description": "Mine", "target_date": "2031-06-01" }))
        .await
        .assert_status_forbidden();
}

// ============= Vitals =============

#[tokio::test]
async fn test_patient_records_own_vitals() {
    let app = TestApp::new().await;
    let patient = app.patient("Pat Vitals").await;
    let other = app.patient("Other Vitals").await;
    let path = format!("/bp/patients/{}", patient.id);

    let response = app
        .server
        .post(&path)
        .authorization_bearer(&patient.token)
        .json(&json!({ "systolic": 120, "diastolic": 80 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let reading: Value = response.json();
    assert_eq!(reading["systolic"], 120);
    assert_eq!(reading["patient_id"], patient.id);
    assert!(reading["recorded_at"].is_string());

    app.server
        .post(&path)
        .authorization_bearer(&patient.token)
        .json(&json!({ "systolic": 70, "diastolic": 80 }))
        .await
        .assert_status_bad_request();

    app.server
        .post(&path)
        .authorization_bearer(&other.token)
        .json(&json!({ "systolic": 120, "diastolic": 80 }))
        .await
        .assert_status_forbidden();

    let readings: Vec<Value> = app
        .server
        .get(&path)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(readings.len(), 1);
}

#[tokio::test]
async fn test_doctor_records_each_vital_kind() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Vitals").await;
    let patient = app.patient("Pat Kinds").await;

    let cases = [
        ("heartrate", json!({ "value": 72 })),
        ("weight", json!({ "value": 71.5 })),
        ("glucose", json!({ "value": 95 })),
        ("temperature", json!({ "value": 36.8 })),
    ];

    for (kind, body) in cases {
        let path = format!("/{}/patients/{}", kind, patient.id);
        app.server
            .post(&path)
            .authorization_bearer(&doctor.token)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let readings: Vec<Value> = app
            .server
            .get(&path)
            .authorization_bearer(&doctor.token)
            .await
            .json();
        assert_eq!(readings.len(), 1, "{kind}");
        assert_eq!(readings[0]["value"], body["value"], "{kind}");
    }

    app.server
        .post(&format!("/heartrate/patients/{}", patient.id))
        .authorization_bearer(&doctor.token)
        .json(&json!({ "value": -5 }))
        .await
        .assert_status_bad_request();
}

// ============= Appointments & Notifications =============

#[tokio::test]
async fn test_appointment_lifecycle() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Appt").await;
    let patient = app.patient("Pat Appt").await;
    let at = days_ahead(7);

    let appointment = app.schedule(&patient, &doctor, &patient, at).await;
    assert_eq!(appointment["status"], "scheduled");

    // Both participants are told.
    for account in [&doctor, &patient] {
        let notifications: Vec<Value> = app
            .server
            .get("/notifications")
            .authorization_bearer(&account.token)
            .await
            .json();
        assert_eq!(notifications.len(), 1);
    }

    let mine: Vec<Value> = app
        .server
        .get("/appointments/mine")
        .authorization_bearer(&doctor.token)
        .await
        .json();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["patient"]["name"], "Pat Appt");

    let path = format!("/appointments/{}", appointment["id"]);
    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "status": "completed" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "completed");

    app.server
        .patch(&path)
        .authorization_bearer(&doctor.token)
        .json(&json!({ "status": "cancelled" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_double_booking_conflicts_until_cancelled() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Busy").await;
    let alice = app.patient("Alice Appt").await;
    let bob = app.patient("Bob Appt").await;
    let at = days_ahead(3);

    let first = app.schedule(&doctor, &doctor, &alice, at).await;

    let response = app
        .server
        .post("/appointments")
        .authorization_bearer(&bob.token)
        .json(&json!({
            "doctor_id": doctor.id,
            "patient_id": bob.id,
            "appointment_time": at.to_rfc3339(),
            "notes": "Same slot",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    app.server
        .patch(&format!("/appointments/{}", first["id"]))
        .authorization_bearer(&alice.token)
        .json(&json!({ "status": "cancelled" }))
        .await
        .assert_status_ok();

    app.schedule(&bob, &doctor, &bob, at).await;
}

#[tokio::test]
async fn test_appointment_participation_rules() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Rules").await;
    let alice = app.patient("Alice Rules").await;
    let bob = app.patient("Bob Rules").await;

    // Patients book only for themselves.
    app.server
        .post("/appointments")
        .authorization_bearer(&bob.token)
        .json(&json!({
            "doctor_id": doctor.id,
            "patient_id": alice.id,
            "appointment_time": days_ahead(2).to_rfc3339(),
            "notes": "Booked by someone else",
        }))
        .await
        .assert_status_forbidden();

    // Past times are rejected.
    let response = app
        .server
        .post("/appointments")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "doctor_id": doctor.id,
            "patient_id": alice.id,
            "appointment_time": days_ahead(-2).to_rfc3339(),
            "notes": "Too late",
        }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["fields"]["appointment_time"].is_array());
    assert!(body["fields"].get("notes").is_none());

    let appointment = app.schedule(&alice, &doctor, &alice, days_ahead(2)).await;
    app.server
        .get(&format!("/appointments/{}", appointment["id"]))
        .authorization_bearer(&bob.token)
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_mark_notification_read() {
    let app = TestApp::new().await;
    let doctor = app.doctor("Dr Read").await;
    let patient = app.patient("Pat Read").await;
    app.schedule(&patient, &doctor, &patient, days_ahead(5)).await;

    let unread: Vec<Value> = app
        .server
        .get("/notifications")
        .add_query_param("unread", true)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert_eq!(unread.len(), 1);
    let path = format!("/notifications/{}/read", unread[0]["id"]);

    // Someone else's notification is invisible.
    app.server
        .post(&path)
        .authorization_bearer(&doctor.token)
        .await
        .assert_status_not_found();

    let response = app
        .server
        .post(&path)
        .authorization_bearer(&patient.token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["is_read"], true);

    let unread: Vec<Value> = app
        .server
        .get("/notifications")
        .add_query_param("unread", true)
        .authorization_bearer(&patient.token)
        .await
        .json();
    assert!(unread.is_empty());
}
