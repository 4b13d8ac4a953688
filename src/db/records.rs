//! Reviews, knowledge base entries and sales rows.

use super::{KB_ENTRIES, REVIEWS, SALES};
use crate::analytics::reviews::{Review, ReviewInput};
use crate::analytics::sales::{snapshot_window_start, Sale};
use crate::domain::knowledge::{KbEntry, KbEntryInput};
use crate::postgrest::{fetch_rows, insert_row, update_rows, Direction, Query, RestStore};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

pub async fn load_reviews(store: &dyn RestStore) -> Result<Vec<Review>> {
    let rows = fetch_rows(
        store,
        REVIEWS,
        &Query::new().select("*").order("review_date", Direction::Desc),
    )
    .await?;
    Ok(rows)
}

pub async fn create_review(store: &dyn RestStore, input: &ReviewInput) -> Result<Review> {
    Ok(insert_row(store, REVIEWS, input).await?)
}

pub async fn delete_review(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store.delete(REVIEWS, &Query::new().eq("id", id)).await?;
    Ok(())
}

pub async fn load_kb(store: &dyn RestStore) -> Result<Vec<KbEntry>> {
    let rows = fetch_rows(
        store,
        KB_ENTRIES,
        &Query::new()
            .select("*")
            .order("category", Direction::Asc)
            .order("title", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

#[derive(Serialize)]
struct KbRow<'a> {
    title: &'a str,
    category: &'a str,
    content: &'a str,
    tags: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl<'a> KbRow<'a> {
    fn from_input(input: &'a KbEntryInput) -> Self {
        Self {
            title: input.title.trim(),
            category: input.category.trim(),
            content: &input.content,
            tags: input
                .tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            updated_at: Utc::now(),
        }
    }
}

pub async fn create_kb_entry(store: &dyn RestStore, input: &KbEntryInput) -> Result<KbEntry> {
    Ok(insert_row(store, KB_ENTRIES, &KbRow::from_input(input)).await?)
}

pub async fn update_kb_entry(store: &dyn RestStore, id: Uuid, input: &KbEntryInput) -> Result<Option<KbEntry>> {
    let rows: Vec<KbEntry> = update_rows(
        store,
        KB_ENTRIES,
        &Query::new().eq("id", id),
        &KbRow::from_input(input),
    )
    .await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_kb_entry(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store.delete(KB_ENTRIES, &Query::new().eq("id", id)).await?;
    Ok(())
}

/// Sales from Jan 1 of the prior year through `today`, enough for
/// year-over-year comparison.
pub async fn load_sales_window(store: &dyn RestStore, today: NaiveDate) -> Result<Vec<Sale>> {
    let rows = fetch_rows(
        store,
        SALES,
        &Query::new()
            .select("*")
            .gte("sale_date", snapshot_window_start(today))
            .lte("sale_date", today)
            .order("sale_date", Direction::Asc),
    )
    .await?;
    Ok(rows)
}
