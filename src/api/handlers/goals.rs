use crate::{
    AppState,
    auth::{middleware::AuthUser, policy::Action},
    db::{self, goals, notifications, users},
    models::Goal,
    schemas::{CreateGoalRequest, UpdateGoalRequest, ValidatedJson},
    types::{AppError, Result, Role},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Set a goal for a patient
#[utoipa::path(
    post,
    path = "/goals/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Doctor or admin role required"),
        (status = 404, description = "Patient not found")
    ),
    tag = "goals",
    security(("bearer" = []))
)]
pub async fn create_goal(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
    ValidatedJson(new): ValidatedJson<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>)> {
    caller.authorize(Action::CreateGoal)?;

    let tx = state.db.begin().await?;
    let outcome = async {
        let patient = users::get_patient(&tx, patient_id).await?;
        let goal = goals::insert(&tx, patient.id, caller.user_id(), &new).await?;

        notifications::insert(
            &tx,
            patient.id,
            &format!("New goal set: {} (target {})", goal.title, goal.target_date),
        )
        .await?;

        Ok::<_, AppError>(goal)
    }
    .await;
    let goal = db::finish(tx, outcome).await?;

    tracing::info!(goal_id = goal.id, patient_id, by = caller.user_id(), "created goal");
    Ok((StatusCode::CREATED, Json(goal)))
}

/// List a patient's goals
#[utoipa::path(
    get,
    path = "/goals/patients/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Goals, soonest target first", body = Vec<Goal>),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Patient not found")
    ),
    tag = "goals",
    security(("bearer" = []))
)]
pub async fn list_patient_goals(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Goal>>> {
    caller.authorize_for(Action::ViewGoals, patient_id)?;

    let conn = state.db.connection().await?;
    let patient = users::get_patient(&conn, patient_id).await?;
    Ok(Json(goals::list_for_patient(&conn, patient.id).await?))
}

/// Get a goal by ID
#[utoipa::path(
    get,
    path = "/goals/{id}",
    params(("id" = i64, Path, description = "Goal ID")),
    responses(
        (status = 200, description = "Goal", body = Goal),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(("bearer" = []))
)]
pub async fn get_goal(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Goal>> {
    caller.authorize(Action::ViewGoals)?;

    let conn = state.db.connection().await?;
    let goal = goals::get(&conn, id).await?;
    caller.authorize_for(Action::ViewGoals, goal.patient_id)?;

    Ok(Json(goal))
}

/// Update a goal
///
/// Patients may only change `is_complete` on their own goals.
#[utoipa::path(
    patch,
    path = "/goals/{id}",
    params(("id" = i64, Path, description = "Goal ID")),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Updated goal", body = Goal),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Goal not found")
    ),
    tag = "goals",
    security(("bearer" = []))
)]
pub async fn update_goal(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<UpdateGoalRequest>,
) -> Result<Json<Goal>> {
    caller.authorize(Action::UpdateGoal)?;

    if caller.role() == Role::Patient && !changes.only_completion() {
        return Err(AppError::Forbidden(
            "Patients may only mark goals complete or incomplete".to_string(),
        ));
    }

    let tx = state.db.begin().await?;
    let outcome = async {
        let mut goal = goals::get(&tx, id).await?;
        caller.authorize_for(Action::UpdateGoal, goal.patient_id)?;

        changes.apply(&mut goal);
        goals::update(&tx, &goal).await?;
        Ok::<_, AppError>(goal)
    }
    .await;
    let goal = db::finish(tx, outcome).await?;

    tracing::info!(goal_id = id, complete = goal.is_complete, by = caller.user_id(), "updated goal");
    Ok(Json(goal))
}
