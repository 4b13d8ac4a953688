use crate::db;
use crate::domain::knowledge::{group_by_category, search, Category, KbEntry, KbEntryInput};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct KbPage<'a> {
    pub total: usize,
    pub categories: Vec<Category<'a>>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", put(update).delete(remove))
        .with_state(state)
}

async fn list(session: UserSession, Query(query): Query<SearchQuery>) -> Result<Json<serde_json::Value>, StatusCode> {
    let entries = db::records::load_kb(&session.rest)
        .await
        .map_err(internal("Failed to load knowledge base"))?;
    let matching = search(&entries, query.q.as_deref().unwrap_or_default());
    let page = KbPage {
        total: matching.len(),
        categories: group_by_category(&matching),
    };
    // Serialized here since the page borrows from `entries`.
    let body = serde_json::to_value(&page).map_err(internal("Failed to encode knowledge base"))?;
    Ok(Json(body))
}

async fn create(session: UserSession, Json(payload): Json<KbEntryInput>) -> Result<Json<KbEntry>, StatusCode> {
    payload.validate().map_err(invalid)?;
    let entry = db::records::create_kb_entry(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create knowledge base entry"))?;
    Ok(Json(entry))
}

async fn update(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<KbEntryInput>,
) -> Result<Json<KbEntry>, StatusCode> {
    payload.validate().map_err(invalid)?;
    let entry = db::records::update_kb_entry(&session.rest, id, &payload)
        .await
        .map_err(internal("Failed to update knowledge base entry"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(entry))
}

async fn remove(session: UserSession, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    db::records::delete_kb_entry(&session.rest, id)
        .await
        .map_err(internal("Failed to delete knowledge base entry"))?;
    Ok(StatusCode::NO_CONTENT)
}
