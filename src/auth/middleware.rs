use crate::AppState;
use crate::auth::policy::{self, Access, Action};
use crate::db::users;
use crate::types::{AppError, Identity, Result, Role};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

/// Requires a valid `Authorization: Bearer <token>` header for an account
/// that still exists and is active, and stores the caller's [`Identity`] in
/// the request extensions.
///
/// The role comes from the stored account rather than the token claims.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Auth("Token is missing".to_string()))?;

    let claimed = state.auth_service.verify(token).map_err(|e| {
        tracing::warn!(reason = %e, path = %req.uri().path(), "rejected bearer token");
        AppError::from(e)
    })?;

    let conn = state.db.connection().await?;
    let Some(user) = users::find(&conn, claimed.user_id).await? else {
        tracing::warn!(user_id = claimed.user_id, "token subject no longer exists");
        return Err(AppError::Auth("Invalid token".to_string()));
    };
    if !user.active {
        tracing::warn!(user_id = user.id, "token used by archived account");
        return Err(AppError::Forbidden("Account is archived".to_string()));
    }

    req.extensions_mut().insert(Identity {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor for the authenticated caller.
///
/// Only available on routes behind [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Fails with 403 unless the caller's role may perform `action` on
    /// somebody's records. `OwnOnly` passes here; callers narrow the query
    /// to the caller's own rows or use [`AuthUser::authorize_for`].
    pub fn authorize(&self, action: Action) -> Result<Access> {
        match policy::access(self.role(), action) {
            Access::Deny => Err(AppError::Forbidden(policy::denial_message(action))),
            access => Ok(access),
        }
    }

    /// Fails with 403 unless the caller may perform `action` on records
    /// owned by `owner_id`.
    pub fn authorize_for(&self, action: Action, owner_id: i64) -> Result<()> {
        match self.authorize(action)? {
            Access::OwnOnly if owner_id != self.user_id() => Err(AppError::Forbidden(
                "Not allowed to access another user's records".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| AppError::Auth("Token is missing".to_string()))
    }
}
