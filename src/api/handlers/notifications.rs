use crate::{
    AppState,
    auth::{middleware::AuthUser, policy::Action},
    db::{self, notifications},
    models::Notification,
    types::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query string for listing notifications
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NotificationQuery {
    /// Only return unread notifications
    #[serde(default)]
    pub unread: bool,
}

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>)
    ),
    tag = "notifications",
    security(("bearer" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>> {
    caller.authorize(Action::ViewNotifications)?;

    let conn = state.db.connection().await?;
    Ok(Json(
        notifications::list_for_user(&conn, caller.user_id(), query.unread).await?,
    ))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Notification>> {
    caller.authorize(Action::ViewNotifications)?;

    let tx = state.db.begin().await?;
    let outcome = notifications::mark_read(&tx, id, caller.user_id()).await;
    Ok(Json(db::finish(tx, outcome).await?))
}
