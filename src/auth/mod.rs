//! Authentication and Authorization
//!
//! This module provides the security layer of the medrec API: password
//! hashing, JWT issuance/verification and role-based access control.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing
//! - [`auth::jwt`](crate::auth::jwt) - JWT token encoding, decoding, and claims
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and the `AuthUser` extractor
//! - [`auth::policy`](crate::auth::policy) - Role/action access table
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id (memory-hard), salted, PHC string format
//! - **JWT Tokens**: HS256 signed, `{sub, role, exp}` claims, 24h default lifetime
//! - **Roles**: closed `patient | doctor | admin` enum checked against a static policy
//!
//! # Usage
//!
//! ## Token Generation
//!
//! ```ignore
//! use medrec::auth::jwt::AuthService;
//!
//! let service = AuthService::new(secret, 24 * 3600);
//! let token = service.issue(&user)?;
//! let identity = service.verify(&token)?;
//! ```
//!
//! ## Middleware
//!
//! `auth_middleware` validates the bearer token and injects an
//! [`Identity`](crate::types::Identity) into the request extensions:
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(auth_service, auth_middleware));
//! ```
//!
//! ## Checking Roles in Handlers
//!
//! ```ignore
//! async fn prescribe(user: AuthUser, Path(patient_id): Path<i64>) -> Result<Json<Medication>> {
//!     user.authorize_for(Action::PrescribeMedication, patient_id)?;
//!     // ...
//! }
//! ```
//!
//! # Configuration
//!
//! Configure via `medrec.toml`:
//! ```toml
//! [auth]
//! jwt_secret_env = "SECRET_KEY"  # Name of the env var holding the signing secret
//! jwt_expiry_hours = 24          # Token validity duration
//! ```

/// JWT token generation and validation.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing and verification.
pub mod password;
/// Role-based access policy.
pub mod policy;
