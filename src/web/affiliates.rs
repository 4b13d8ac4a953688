use crate::db;
use crate::db::affiliates::LoggedFollowup;
use crate::domain::affiliates::{board, Affiliate, AffiliateBoard, AffiliateInput, Followup, FollowupInput};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub q: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", put(update).delete(remove))
        .route("/:id/followups", get(followups).post(log_followup))
        .route("/:id/leads", post(record_lead))
        .route("/:id/sales", post(record_sale))
        .with_state(state)
}

async fn find(session: &UserSession, id: Uuid) -> Result<Affiliate, StatusCode> {
    db::affiliates::find_affiliate(&session.rest, id)
        .await
        .map_err(internal("Failed to load affiliate"))?
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<AffiliateBoard>, StatusCode> {
    let affiliates = db::affiliates::load_affiliates(&session.rest)
        .await
        .map_err(internal("Failed to load affiliates"))?;
    Ok(Json(board(&affiliates, state.today(), query.q.as_deref())))
}

async fn create(session: UserSession, Json(payload): Json<AffiliateInput>) -> Result<Json<Affiliate>, StatusCode> {
    payload.validate().map_err(invalid)?;
    let affiliate = db::affiliates::create_affiliate(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create affiliate"))?;
    Ok(Json(affiliate))
}

async fn update(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<AffiliateInput>,
) -> Result<Json<Affiliate>, StatusCode> {
    payload.validate().map_err(invalid)?;
    let affiliate = db::affiliates::update_affiliate(&session.rest, id, &payload)
        .await
        .map_err(internal("Failed to update affiliate"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(affiliate))
}

async fn remove(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::affiliates::delete_affiliate(&session.rest, id)
        .await
        .map_err(internal("Failed to delete affiliate"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn followups(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<Vec<Followup>>, StatusCode> {
    let rows = db::affiliates::load_followups(&session.rest, id)
        .await
        .map_err(internal("Failed to load follow-ups"))?;
    Ok(Json(rows))
}

async fn log_followup(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<FollowupInput>,
) -> Result<Json<LoggedFollowup>, StatusCode> {
    payload.validate().map_err(invalid)?;
    let affiliate = find(&session, id).await?;
    let logged = db::affiliates::log_followup(&session.rest, &affiliate, session.user.id, &payload)
        .await
        .map_err(internal("Failed to log follow-up"))?;
    Ok(Json(logged))
}

async fn record_lead(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<Affiliate>, StatusCode> {
    let affiliate = find(&session, id).await?;
    let affiliate = db::affiliates::record_lead(&session.rest, &affiliate)
        .await
        .map_err(internal("Failed to record lead"))?;
    Ok(Json(affiliate))
}

async fn record_sale(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<Affiliate>, StatusCode> {
    let affiliate = find(&session, id).await?;
    let affiliate = db::affiliates::record_sale(&session.rest, &affiliate)
        .await
        .map_err(internal("Failed to record sale"))?;
    Ok(Json(affiliate))
}
