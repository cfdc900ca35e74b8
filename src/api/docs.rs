//! OpenAPI document for the whole API.

use crate::api::handlers::{
    appointments, diagnoses, goals, health, medications, notifications, users, vitals,
};
use crate::models::{
    Appointment, AppointmentDetail, BloodPressure, BloodPressureRecord, Diagnosis,
    DiagnosisDetail, Glucose, GlucoseRecord, Goal, HeartRate, HeartRateRecord, Medication,
    Notification, Temperature, TemperatureRecord, User, UserSummary, Weight, WeightRecord,
};
use crate::schemas::{
    CreateAppointmentRequest, CreateDiagnosisRequest, CreateGoalRequest, CreateMedicationRequest,
    CreateUserRequest, UpdateAppointmentRequest, UpdateDiagnosisRequest, UpdateGoalRequest,
    UpdateMedicationRequest, UpdateUserRequest,
};
use crate::types::{AppointmentStatus, LoginRequest, Role, TokenResponse};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "medrec",
        description = "Health-records portal API: users, diagnoses, medications, vitals, goals, appointments and notifications."
    ),
    paths(
        health::health,
        users::create_user,
        users::login,
        users::me,
        users::list_users,
        users::get_user,
        users::update_user,
        users::archive_user,
        users::delete_user,
        diagnoses::create_diagnosis,
        diagnoses::list_patient_diagnoses,
        diagnoses::search_diagnoses,
        diagnoses::get_diagnosis,
        diagnoses::update_diagnosis,
        medications::create_medication,
        medications::list_patient_medications,
        medications::get_medication,
        medications::update_medication,
        goals::create_goal,
        goals::list_patient_goals,
        goals::get_goal,
        goals::update_goal,
        vitals::record_blood_pressure,
        vitals::list_blood_pressure,
        vitals::record_heart_rate,
        vitals::list_heart_rate,
        vitals::record_weight,
        vitals::list_weight,
        vitals::record_glucose,
        vitals::list_glucose,
        vitals::record_temperature,
        vitals::list_temperature,
        appointments::create_appointment,
        appointments::my_appointments,
        appointments::get_appointment,
        appointments::update_appointment,
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(schemas(
        Role,
        AppointmentStatus,
        LoginRequest,
        TokenResponse,
        User,
        UserSummary,
        CreateUserRequest,
        UpdateUserRequest,
        Diagnosis,
        DiagnosisDetail,
        CreateDiagnosisRequest,
        UpdateDiagnosisRequest,
        Medication,
        CreateMedicationRequest,
        UpdateMedicationRequest,
        Goal,
        CreateGoalRequest,
        UpdateGoalRequest,
        BloodPressure,
        HeartRate,
        Weight,
        Glucose,
        Temperature,
        BloodPressureRecord,
        HeartRateRecord,
        WeightRecord,
        GlucoseRecord,
        TemperatureRecord,
        Appointment,
        AppointmentDetail,
        CreateAppointmentRequest,
        UpdateAppointmentRequest,
        Notification,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and accounts"),
        (name = "diagnoses", description = "Patient diagnoses"),
        (name = "medications", description = "Prescriptions"),
        (name = "goals", description = "Patient health goals"),
        (name = "vitals", description = "Vital-sign readings"),
        (name = "appointments", description = "Doctor/patient appointments"),
        (name = "notifications", description = "Per-user notification inbox"),
        (name = "ops", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for path in [
            "/users",
            "/users/login",
            "/diagnoses/by-name/{diagnosis_name}",
            "/medications/patients/{patient_id}",
            "/bp/patients/{patient_id}",
            "/appointments/mine",
            "/notifications/{id}/read",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing {}", path);
        }

        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("bearer"));
    }

    #[test]
    fn test_every_vital_kind_is_documented() {
        let doc = ApiDoc::openapi();

        for prefix in ["bp", "heartrate", "weight", "glucose", "temperature"] {
            let path = format!("/{}/patients/{{patient_id}}", prefix);
            let item = doc
                .paths
                .paths
                .get(&path)
                .unwrap_or_else(|| panic!("missing {}", path));
            assert!(item.get.is_some(), "{} has no list operation", path);
            assert!(item.post.is_some(), "{} has no record operation", path);
        }

        let schemas = doc.components.expect("components").schemas;
        for record in [
            "BloodPressureRecord",
            "HeartRateRecord",
            "WeightRecord",
            "GlucoseRecord",
            "TemperatureRecord",
        ] {
            assert!(schemas.contains_key(record), "missing schema {}", record);
        }
    }
}
