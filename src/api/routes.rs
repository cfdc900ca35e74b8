use crate::AppState;
use crate::api::handlers::{
    appointments, diagnoses, goals, health, medications, notifications, users, vitals,
};
use crate::auth::middleware::auth_middleware;
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn create_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/health", get(health::health))
        .route("/users", post(users::create_user))
        .route("/users/login", post(users::login));

    let protected_routes = Router::new()
        // Users
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::me))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/archive", post(users::archive_user))
        // Diagnoses
        .route(
            "/diagnoses/patients/{patient_id}",
            get(diagnoses::list_patient_diagnoses).post(diagnoses::create_diagnosis),
        )
        .route(
            "/diagnoses/by-name/{diagnosis_name}",
            get(diagnoses::search_diagnoses),
        )
        .route(
            "/diagnoses/{id}",
            get(diagnoses::get_diagnosis).patch(diagnoses::update_diagnosis),
        )
        // Medications
        .route(
            "/medications/patients/{patient_id}",
            get(medications::list_patient_medications).post(medications::create_medication),
        )
        .route(
            "/medications/{id}",
            get(medications::get_medication).patch(medications::update_medication),
        )
        // Goals
        .route(
            "/goals/patients/{patient_id}",
            get(goals::list_patient_goals).post(goals::create_goal),
        )
        .route(
            "/goals/{id}",
            get(goals::get_goal).patch(goals::update_goal),
        )
        // Vitals
        .route(
            "/bp/patients/{patient_id}",
            get(vitals::list_blood_pressure).post(vitals::record_blood_pressure),
        )
        .route(
            "/heartrate/patients/{patient_id}",
            get(vitals::list_heart_rate).post(vitals::record_heart_rate),
        )
        .route(
            "/weight/patients/{patient_id}",
            get(vitals::list_weight).post(vitals::record_weight),
        )
        .route(
            "/glucose/patients/{patient_id}",
            get(vitals::list_glucose).post(vitals::record_glucose),
        )
        .route(
            "/temperature/patients/{patient_id}",
            get(vitals::list_temperature).post(vitals::record_temperature),
        )
        // Appointments
        .route("/appointments", post(appointments::create_appointment))
        .route("/appointments/mine", get(appointments::my_appointments))
        .route(
            "/appointments/{id}",
            get(appointments::get_appointment).patch(appointments::update_appointment),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    public_routes.merge(protected_routes)
}
