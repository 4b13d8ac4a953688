pub mod admin;
pub mod affiliates;
pub mod context;
pub mod crm;
pub mod finance;
pub mod kb;
pub mod onboarding;
pub mod payments;
pub mod playbook;
pub mod pto;
pub mod reviews;
pub mod session;
pub mod training;
pub mod updates;

use crate::state::SharedState;
use axum::{http::StatusCode, routing::get, Router};
use std::fmt::Display;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/context", context::router(state.clone()))
        .nest("/playbook", playbook::router(state.clone()))
        .nest("/team", playbook::team_router(state.clone()))
        .nest("/updates", updates::router(state.clone()))
        .nest("/pto", pto::router(state.clone()))
        .nest("/affiliates", affiliates::router(state.clone()))
        .nest("/onboarding", onboarding::router(state.clone()))
        .nest("/training", training::router(state.clone()))
        .nest("/payments", payments::router(state.clone()))
        .nest("/reviews", reviews::router(state.clone()))
        .nest("/kb", kb::router(state.clone()))
        .nest("/finance", finance::router(state.clone()))
        .nest("/crm", crm::router(state.clone()))
        .nest("/admin", admin::router(state))
}

/// `map_err` adapter: logs the failure and answers 500.
pub(crate) fn internal<E: Display>(context: &'static str) -> impl FnOnce(E) -> StatusCode {
    move |e| {
        tracing::error!("{}: {}", context, e);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub(crate) fn invalid(reason: &str) -> StatusCode {
    tracing::warn!("Rejected request: {}", reason);
    StatusCode::BAD_REQUEST
}
