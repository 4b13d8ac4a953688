use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct CrmEmbed {
    pub url: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(embed)).with_state(state)
}

async fn embed(_session: UserSession, State(state): State<SharedState>) -> Result<Json<CrmEmbed>, StatusCode> {
    let url = state
        .config
        .crm_dashboard_url
        .clone()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(CrmEmbed { url }))
}
