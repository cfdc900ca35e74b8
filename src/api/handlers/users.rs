use crate::{
    AppState,
    auth::{
        middleware::AuthUser,
        password::{hash_password, verify_password},
        policy::Action,
    },
    db::{self, users},
    models::User,
    schemas::{CreateUserRequest, JsonBody, ListUsersQuery, UpdateUserRequest, ValidatedJson},
    types::{AppError, LoginRequest, Result, Role, TokenResponse, ValidationErrors},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// Register a new patient or doctor account
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin accounts cannot be self-registered"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(new_user): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if new_user.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let password_hash = hash_password(&new_user.password)?;

    let tx = state.db.begin().await?;
    let outcome = users::insert(&tx, &new_user, &password_hash).await;
    let user = db::finish(tx, outcome).await?;

    tracing::info!(user_id = user.id, role = %user.role, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is archived")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let conn = state.db.connection().await?;

    let credentials = users::credentials_by_email(&conn, payload.email.trim())
        .await?
        .filter(|c| verify_password(&payload.password, &c.password_hash))
        .ok_or_else(|| {
            tracing::warn!("failed login attempt");
            AppError::Auth("Invalid email or password".to_string())
        })?;

    if !credentials.user.active {
        return Err(AppError::Forbidden("Account is archived".to_string()));
    }

    let access_token = state.auth_service.issue(&credentials.user)?;
    tracing::info!(user_id = credentials.user.id, "user logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_service.expiry_seconds(),
    }))
}

/// The authenticated caller's own account
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn me(State(state): State<AppState>, caller: AuthUser) -> Result<Json<User>> {
    let conn = state.db.connection().await?;
    Ok(Json(users::get(&conn, caller.user_id()).await?))
}

/// List users, optionally filtered by role
#[utoipa::path(
    get,
    path = "/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users", body = Vec<User>),
        (status = 403, description = "Doctor or admin role required")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>> {
    caller.authorize(Action::ListUsers)?;

    let conn = state.db.connection().await?;
    Ok(Json(users::list(&conn, query.role).await?))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    caller.authorize_for(Action::ViewUser, id)?;

    let conn = state.db.connection().await?;
    Ok(Json(users::get(&conn, id).await?))
}

/// Update a user's profile
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    caller.authorize_for(Action::UpdateUser, id)?;

    let password_hash = changes.password.as_deref().map(hash_password).transpose()?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let mut user = users::get(&tx, id).await?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(dob) = changes.dob {
            user.dob = Some(dob);
        }
        if user.is_patient() && user.dob.is_none() {
            let mut errors = ValidationErrors::new();
            errors.add("dob", "Date of birth is required for patients.");
            return Err(AppError::Validation(errors));
        }

        users::update(&tx, &user, password_hash.as_deref()).await?;
        Ok::<_, AppError>(user)
    }
    .await;
    let user = db::finish(tx, outcome).await?;

    tracing::info!(user_id = user.id, by = caller.user_id(), "updated user");
    Ok(Json(user))
}

/// Archive (deactivate) a user
#[utoipa::path(
    post,
    path = "/users/{id}/archive",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Archived user", body = User),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn archive_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    caller.authorize(Action::ArchiveUser)?;

    let tx = state.db.begin().await?;
    let outcome = users::archive(&tx, id, db::now()).await;
    let user = db::finish(tx, outcome).await?;

    tracing::info!(user_id = user.id, by = caller.user_id(), "archived user");
    Ok(Json(user))
}

/// Permanently delete a user
///
/// Records the user owns as a patient are deleted with them. Users who
/// authored diagnoses, goals or appointments as a clinician must be
/// archived instead.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User has authored clinical records")
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    caller.authorize(Action::DeleteUser)?;

    if id == caller.user_id() {
        return Err(AppError::Conflict(
            "Cannot delete your own account".to_string(),
        ));
    }

    let tx = state.db.begin().await?;
    let outcome = users::delete(&tx, id).await;
    db::finish(tx, outcome).await?;

    tracing::info!(user_id = id, by = caller.user_id(), "deleted user");
    Ok(StatusCode::NO_CONTENT)
}
