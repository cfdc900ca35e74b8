//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for medrec, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each resource
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::docs`](crate::api::docs) - OpenAPI document
//!
//! # API Endpoints
//!
//! ## Users (`/users`)
//! - `POST /users` - Register a patient or doctor (public)
//! - `POST /users/login` - Login and receive a JWT (public)
//! - `GET /users/me` - The caller's account
//! - `GET /users?role=` - List users
//! - `GET|PATCH /users/{id}` - View or update a user
//! - `POST /users/{id}/archive` - Deactivate a user
//! - `DELETE /users/{id}` - Delete a user
//!
//! ## Clinical records
//! - `POST|GET /diagnoses/patients/{patient_id}`, `GET /diagnoses/by-name/{name}`,
//!   `GET|PATCH /diagnoses/{id}`
//! - `POST|GET /medications/patients/{patient_id}`, `GET|PATCH /medications/{id}`
//! - `POST|GET /goals/patients/{patient_id}`, `GET|PATCH /goals/{id}`
//! - `POST|GET /{bp,heartrate,weight,glucose,temperature}/patients/{patient_id}`
//!
//! ## Scheduling
//! - `POST /appointments`, `GET /appointments/mine`, `GET|PATCH /appointments/{id}`
//! - `GET /notifications?unread=true`, `POST /notifications/{id}/read`
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! All endpoints except registration, login and health require a valid JWT
//! in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! With the `swagger-ui` feature, interactive documentation is served at
//! `/api/docs`; without it the same path returns the OpenAPI JSON document.

/// OpenAPI document.
pub mod docs;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
