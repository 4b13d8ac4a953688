use crate::analytics::reviews::{leaderboard, search, summary, Review, ReviewInput, ReviewLeader, ReviewSummary};
use crate::db;
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::{internal, invalid};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewsPage {
    pub reviews: Vec<Review>,
    pub leaderboard: Vec<ReviewLeader>,
    pub summary: ReviewSummary,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", delete(remove))
        .with_state(state)
}

async fn load_page(session: &UserSession, text: &str) -> Result<ReviewsPage, StatusCode> {
    let all = db::records::load_reviews(&session.rest)
        .await
        .map_err(internal("Failed to load reviews"))?;
    let matching = search(&all, text);
    Ok(ReviewsPage {
        leaderboard: leaderboard(&matching),
        summary: summary(&matching),
        reviews: matching.into_iter().cloned().collect(),
    })
}

async fn list(session: UserSession, Query(query): Query<SearchQuery>) -> Result<Json<ReviewsPage>, StatusCode> {
    Ok(Json(load_page(&session, query.q.as_deref().unwrap_or_default()).await?))
}

async fn create(session: UserSession, Json(payload): Json<ReviewInput>) -> Result<Json<ReviewsPage>, StatusCode> {
    payload.validate().map_err(invalid)?;
    db::records::create_review(&session.rest, &payload)
        .await
        .map_err(internal("Failed to create review"))?;
    Ok(Json(load_page(&session, "").await?))
}

async fn remove(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<ReviewsPage>, StatusCode> {
    session.require_admin()?;
    db::records::delete_review(&session.rest, id)
        .await
        .map_err(internal("Failed to delete review"))?;
    Ok(Json(load_page(&session, "").await?))
}
