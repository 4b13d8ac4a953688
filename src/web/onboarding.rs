use crate::db;
use crate::db::onboarding::{ReviewItem, TemplateInput};
use crate::domain::models::User;
use crate::domain::onboarding::{
    user_checklist, OnboardingChecklist, OnboardingTask, OnboardingTaskInput, OnboardingTemplate,
    ProgressAction, TaskProgress,
};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(my_checklist))
        .route("/tasks/:id/progress", post(my_action))
        .with_state(state)
}

pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/queue", get(review_queue))
        .route("/users/:id", get(user_checklist_view))
        .route("/users/:user_id/tasks/:task_id/progress", post(review_action))
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/:id", delete(delete_template))
        .route("/tasks", post(create_task))
        .route("/tasks/:id", put(update_task).delete(delete_task))
        .with_state(state)
}

async fn checklist_for(session: &UserSession, user: &User, today: NaiveDate) -> Result<OnboardingChecklist, StatusCode> {
    let (tasks, progress) = futures::try_join!(
        db::onboarding::tasks_for_user(&session.rest, user),
        db::onboarding::load_progress(&session.rest, user.id),
    )
    .map_err(internal("Failed to load onboarding"))?;
    Ok(user_checklist(&tasks, &progress, user.id, user.hire_date, today))
}

async fn find_task(session: &UserSession, id: Uuid) -> Result<OnboardingTask, StatusCode> {
    db::onboarding::find_task(&session.rest, id)
        .await
        .map_err(internal("Failed to load onboarding task"))?
        .ok_or(StatusCode::NOT_FOUND)
}

async fn my_checklist(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<OnboardingChecklist>, StatusCode> {
    Ok(Json(checklist_for(&session, &session.user, state.today()).await?))
}

async fn my_action(
    session: UserSession,
    Path(task_id): Path<Uuid>,
    Json(action): Json<ProgressAction>,
) -> Result<Json<TaskProgress>, StatusCode> {
    if action.requires_admin() {
        session.require_admin()?;
    }
    if let ProgressAction::Submit { submission } = &action {
        if submission.trim().is_empty() {
            return Err(invalid("submission is required"));
        }
    }
    let task = find_task(&session, task_id).await?;
    let progress = db::onboarding::record_action(&session.rest, &task, session.user.id, &action)
        .await
        .map_err(internal("Failed to record onboarding progress"))?;
    Ok(Json(progress))
}

async fn review_queue(session: UserSession) -> Result<Json<Vec<ReviewItem>>, StatusCode> {
    session.require_admin()?;
    let queue = db::onboarding::review_queue(&session.rest)
        .await
        .map_err(internal("Failed to load review queue"))?;
    Ok(Json(queue))
}

async fn user_checklist_view(
    session: UserSession,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<OnboardingChecklist>, StatusCode> {
    session.require_admin()?;
    let user = db::find_user_by_id(&session.rest, user_id)
        .await
        .map_err(internal("Failed to load user"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(checklist_for(&session, &user, state.today()).await?))
}

async fn review_action(
    session: UserSession,
    Path((user_id, task_id)): Path<(Uuid, Uuid)>,
    Json(action): Json<ProgressAction>,
) -> Result<Json<TaskProgress>, StatusCode> {
    session.require_admin()?;
    let task = find_task(&session, task_id).await?;
    let progress = db::onboarding::record_action(&session.rest, &task, user_id, &action)
        .await
        .map_err(internal("Failed to record review"))?;
    tracing::info!("Onboarding review by {}: task {} for {}", session.user.id, task_id, user_id);
    Ok(Json(progress))
}

async fn list_templates(session: UserSession) -> Result<Json<Vec<OnboardingTemplate>>, StatusCode> {
    session.require_admin()?;
    let templates = db::onboarding::load_templates(&session.rest)
        .await
        .map_err(internal("Failed to load onboarding templates"))?;
    Ok(Json(templates))
}

async fn create_template(
    session: UserSession,
    Json(payload): Json<TemplateInput>,
) -> Result<Json<OnboardingTemplate>, StatusCode> {
    session.require_admin()?;
    if payload.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    let template = db::onboarding::create_template(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create onboarding template"))?;
    Ok(Json(template))
}

async fn delete_template(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::onboarding::delete_template(&session.rest, id)
        .await
        .map_err(internal("Failed to delete onboarding template"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_task(
    session: UserSession,
    Json(payload): Json<OnboardingTaskInput>,
) -> Result<Json<OnboardingTask>, StatusCode> {
    session.require_admin()?;
    payload.validate().map_err(invalid)?;
    let task = db::onboarding::create_task(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create onboarding task"))?;
    Ok(Json(task))
}

async fn update_task(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<OnboardingTaskInput>,
) -> Result<Json<OnboardingTask>, StatusCode> {
    session.require_admin()?;
    payload.validate().map_err(invalid)?;
    let task = db::onboarding::update_task(&session.rest, id, &payload)
        .await
        .map_err(internal("Failed to update onboarding task"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(task))
}

async fn delete_task(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::onboarding::delete_task(&session.rest, id)
        .await
        .map_err(internal("Failed to delete onboarding task"))?;
    Ok(StatusCode::NO_CONTENT)
}
