use crate::db;
use crate::domain::models::targets_user;
use crate::domain::updates::{ack_stats, has_acknowledged, pending_for, AckStats, Update, UpdateInput};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct UpdateView {
    #[serde(flatten)]
    pub update: Update,
    pub acknowledged: bool,
    /// Admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<AckStats>,
}

#[derive(Serialize)]
pub struct UpdatesFeed {
    pub updates: Vec<UpdateView>,
    pub pending: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(feed))
        .route("/:id/ack", post(acknowledge))
        .with_state(state)
}

pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(create_update))
        .route("/:id", delete(delete_update))
        .with_state(state)
}

async fn load_feed(session: &UserSession) -> Result<UpdatesFeed, StatusCode> {
    let (updates, acks, users) = futures::try_join!(
        db::updates::load_updates(&session.rest),
        db::updates::load_acknowledgements(&session.rest),
        db::get_all_users(&session.rest),
    )
    .map_err(internal("Failed to load updates"))?;

    let user = &session.user;
    let is_admin = user.is_admin();
    let pending = pending_for(user, &updates, &acks).len();

    let views = updates
        .iter()
        .filter(|u| is_admin || targets_user(&u.assigned_to, user))
        .map(|u| UpdateView {
            update: u.clone(),
            acknowledged: has_acknowledged(u.id, user.id, &acks),
            stats: is_admin.then(|| ack_stats(u, &users, &acks)),
        })
        .collect();

    Ok(UpdatesFeed { updates: views, pending })
}

async fn feed(session: UserSession) -> Result<Json<UpdatesFeed>, StatusCode> {
    Ok(Json(load_feed(&session).await?))
}

async fn acknowledge(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<UpdatesFeed>, StatusCode> {
    db::updates::acknowledge(&session.rest, id, session.user.id)
        .await
        .map_err(internal("Failed to acknowledge update"))?;
    Ok(Json(load_feed(&session).await?))
}

async fn create_update(
    session: UserSession,
    Json(payload): Json<UpdateInput>,
) -> Result<Json<Update>, StatusCode> {
    session.require_admin()?;
    payload.validate().map_err(invalid)?;
    let update = db::updates::create_update(&session.rest, &payload, session.user.id)
        .await
        .map_err(internal("Failed to create update"))?;
    tracing::info!("Update {} posted to {:?}", update.id, update.assigned_to);
    Ok(Json(update))
}

async fn delete_update(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::updates::delete_update(&session.rest, id)
        .await
        .map_err(internal("Failed to delete update"))?;
    Ok(StatusCode::NO_CONTENT)
}
