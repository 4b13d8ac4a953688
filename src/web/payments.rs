use crate::analytics::sales::PaymentsSnapshot;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(snapshot))
        .route("/refresh", post(refresh))
        .with_state(state)
}

/// Built with the anon-key client; the snapshot is shared by every user.
async fn rebuild(state: &SharedState) -> Result<Option<Arc<PaymentsSnapshot>>, StatusCode> {
    state
        .payments
        .refresh(&state.rest, state.today())
        .await
        .map_err(|e| {
            tracing::error!("Payments refresh failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Cached snapshot; built on the spot before the first scheduled run.
async fn snapshot(
    _session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Arc<PaymentsSnapshot>>, StatusCode> {
    if let Some(current) = state.payments.current().await {
        return Ok(Json(current));
    }
    match rebuild(&state).await? {
        Some(fresh) => Ok(Json(fresh)),
        None => state
            .payments
            .current()
            .await
            .map(Json)
            .ok_or(StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn refresh(
    _session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Arc<PaymentsSnapshot>>, StatusCode> {
    if let Some(fresh) = rebuild(&state).await? {
        return Ok(Json(fresh));
    }
    // A scheduled run is in flight; hand back what we have.
    state
        .payments
        .current()
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}
