//! # medrec - health-records portal server
//!
//! A REST server for patient health records. Patients, doctors and
//! administrators authenticate with JWT bearer tokens; a static role policy
//! decides who may read or write diagnoses, medications, vital signs, goals
//! and appointments.
//!
//! ## Overview
//!
//! medrec can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `medrec-server` binary
//! 2. **As a library** - Build the router yourself, e.g. for tests
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use medrec::{AppState, build_app, auth::jwt::AuthService, db::Database, utils::MedrecConfig};
//! use std::sync::Arc;
//!
//! let config = MedrecConfig::load("medrec.toml")?;
//! let db = Database::open(&config.database_url(), config.database_auth_token()).await?;
//! db.migrate().await?;
//!
//! let state = AppState {
//!     auth_service: Arc::new(AuthService::new(config.jwt_secret()?, config.jwt_expiry_seconds())),
//!     config: Arc::new(config),
//!     db: Arc::new(db),
//! };
//! let app = build_app(state);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers, routes and OpenAPI document
//! - [`auth`] - Password hashing, JWT and the role policy
//! - [`db`] - libsql storage, migrations and repositories
//! - [`models`] - Stored entities
//! - [`schemas`] - Request payloads and their validation
//! - [`types`] - Roles, auth payloads and error handling
//! - [`utils`] - Configuration
//! - [`cli`] - Command-line interface

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// JWT authentication and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// libsql storage and repositories.
pub mod db;
/// Stored entities.
pub mod models;
/// Request payloads and validation.
pub mod schemas;
/// Core types (roles, auth payloads, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

use crate::{api::docs::ApiDoc, auth::jwt::AuthService, db::Database, utils::MedrecConfig};
use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

// Re-export commonly used types
pub use types::{AppError, Result};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MedrecConfig>,
    pub db: Arc<Database>,
    pub auth_service: Arc<AuthService>,
}

/// Assemble the full application router: API routes, OpenAPI docs and the
/// tower-http middleware stack with the configured request body limit.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::routes::create_router(state.clone()))
        .merge(docs_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes)),
        )
        .with_state(state)
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::{Json, routing::get};

    async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
        Json(ApiDoc::openapi())
    }

    Router::new()
        .route("/api/docs", get(openapi_json))
        .route("/api/openapi.json", get(openapi_json))
}
