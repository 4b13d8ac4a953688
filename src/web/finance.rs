use crate::services::finance::{summarize, FinanceClient, FinanceError, FinancialSummary};
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct FinanceReport {
    pub summary: FinancialSummary,
    pub data: Value,
}

#[derive(Serialize)]
pub struct AuthLink {
    pub url: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(report))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .route("/auth-url", get(auth_url))
        .with_state(state)
}

fn client(state: &SharedState) -> Result<&FinanceClient, StatusCode> {
    state.finance.as_ref().ok_or_else(|| {
        tracing::warn!("Finance proxy requested but QUICKBOOKS_PROXY_URL is not set");
        StatusCode::SERVICE_UNAVAILABLE
    })
}

fn upstream(e: FinanceError) -> StatusCode {
    tracing::error!("Finance proxy call failed: {}", e);
    StatusCode::BAD_GATEWAY
}

async fn report(session: UserSession, State(state): State<SharedState>) -> Result<Json<FinanceReport>, StatusCode> {
    session.require_admin()?;
    let data = client(&state)?.data().await.map_err(upstream)?;
    Ok(Json(FinanceReport {
        summary: summarize(&data, state.config.doo_bonus_percent),
        data,
    }))
}

async fn status(session: UserSession, State(state): State<SharedState>) -> Result<Json<Value>, StatusCode> {
    session.require_admin()?;
    Ok(Json(client(&state)?.status().await.map_err(upstream)?))
}

async fn refresh(session: UserSession, State(state): State<SharedState>) -> Result<Json<FinanceReport>, StatusCode> {
    session.require_admin()?;
    let finance = client(&state)?;
    finance.refresh().await.map_err(upstream)?;
    let data = finance.data().await.map_err(upstream)?;
    tracing::info!("Finance data refreshed by {}", session.user.id);
    Ok(Json(FinanceReport {
        summary: summarize(&data, state.config.doo_bonus_percent),
        data,
    }))
}

async fn auth_url(session: UserSession, State(state): State<SharedState>) -> Result<Json<AuthLink>, StatusCode> {
    session.require_admin()?;
    let url = client(&state)?.auth_url().await.map_err(upstream)?;
    Ok(Json(AuthLink { url }))
}
