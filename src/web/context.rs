use crate::domain::models::{TimeSlot, User, DEPARTMENTS, TIME_SLOTS};
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct ContextPayload {
    pub user: User,
    pub departments: &'static [&'static str],
    pub time_slots: &'static [TimeSlot],
    pub crm_dashboard_url: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(context)).with_state(state)
}

async fn context(session: UserSession, State(state): State<SharedState>) -> Json<ContextPayload> {
    Json(ContextPayload {
        user: session.user,
        departments: DEPARTMENTS.as_slice(),
        time_slots: TIME_SLOTS.as_slice(),
        crm_dashboard_url: state.config.crm_dashboard_url.clone(),
    })
}
