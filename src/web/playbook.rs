use crate::db;
use crate::domain::playbook::{checklist, team_progress, Checklist, DepartmentProgress, TaskTemplate, TaskTemplateInput};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TogglePayload {
    pub template_id: Uuid,
    pub date: Option<NaiveDate>,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct TeamDashboard {
    pub date: NaiveDate,
    pub departments: Vec<DepartmentProgress>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(my_checklist))
        .route("/completions", post(toggle_completion))
        .with_state(state)
}

pub fn team_router(state: SharedState) -> Router {
    Router::new().route("/", get(team_view)).with_state(state)
}

pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/:id", put(update_template).delete(delete_template))
        .with_state(state)
}

async fn load_checklist(session: &UserSession, date: NaiveDate) -> Result<Checklist, StatusCode> {
    let (templates, completions) = futures::try_join!(
        db::playbook::load_templates(&session.rest),
        db::playbook::load_completions(&session.rest, date),
    )
    .map_err(internal("Failed to load playbook"))?;
    Ok(checklist(&templates, &completions, &session.user, date))
}

async fn my_checklist(
    session: UserSession,
    State(state): State<SharedState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Checklist>, StatusCode> {
    let date = query.date.unwrap_or_else(|| state.today());
    Ok(Json(load_checklist(&session, date).await?))
}

async fn toggle_completion(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<Checklist>, StatusCode> {
    let date = payload.date.unwrap_or_else(|| state.today());
    db::playbook::set_completion(
        &session.rest,
        payload.template_id,
        session.user.id,
        date,
        payload.completed,
    )
    .await
    .map_err(internal("Failed to record task completion"))?;
    Ok(Json(load_checklist(&session, date).await?))
}

async fn team_view(
    session: UserSession,
    State(state): State<SharedState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<TeamDashboard>, StatusCode> {
    let date = query.date.unwrap_or_else(|| state.today());
    let (users, templates, completions) = futures::try_join!(
        db::get_all_users(&session.rest),
        db::playbook::load_templates(&session.rest),
        db::playbook::load_completions(&session.rest, date),
    )
    .map_err(internal("Failed to load team dashboard"))?;

    Ok(Json(TeamDashboard {
        date,
        departments: team_progress(&users, &templates, &completions, date),
    }))
}

async fn list_templates(session: UserSession) -> Result<Json<Vec<TaskTemplate>>, StatusCode> {
    session.require_admin()?;
    let templates = db::playbook::load_all_templates(&session.rest)
        .await
        .map_err(internal("Failed to load task templates"))?;
    Ok(Json(templates))
}

async fn create_template(
    session: UserSession,
    Json(payload): Json<TaskTemplateInput>,
) -> Result<Json<TaskTemplate>, StatusCode> {
    session.require_admin()?;
    payload.validate().map_err(invalid)?;
    let template = db::playbook::create_template(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create task template"))?;
    tracing::info!("Task template {} created by {}", template.id, session.user.id);
    Ok(Json(template))
}

async fn update_template(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskTemplateInput>,
) -> Result<Json<TaskTemplate>, StatusCode> {
    session.require_admin()?;
    payload.validate().map_err(invalid)?;
    let template = db::playbook::update_template(&session.rest, id, &payload)
        .await
        .map_err(internal("Failed to update task template"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(template))
}

async fn delete_template(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::playbook::delete_template(&session.rest, id)
        .await
        .map_err(internal("Failed to delete task template"))?;
    tracing::info!("Task template {} deleted by {}", id, session.user.id);
    Ok(StatusCode::NO_CONTENT)
}
