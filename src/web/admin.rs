use crate::db;
use crate::domain::models::User;
use crate::state::SharedState;
use crate::web::internal;
use crate::web::session::UserSession;
use crate::web::{onboarding, playbook, pto, updates};
use axum::{http::StatusCode, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .with_state(state.clone())
        .nest("/templates", playbook::admin_router(state.clone()))
        .nest("/updates", updates::admin_router(state.clone()))
        .nest("/pto", pto::admin_router(state.clone()))
        .nest("/onboarding", onboarding::admin_router(state))
}

async fn list_users(session: UserSession) -> Result<Json<Vec<User>>, StatusCode> {
    session.require_admin()?;
    let users = db::get_all_users(&session.rest)
        .await
        .map_err(internal("Failed to load users"))?;
    Ok(Json(users))
}
