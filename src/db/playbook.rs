use super::{TASK_COMPLETIONS, TASK_TEMPLATES};
use crate::domain::playbook::{TaskCompletion, TaskTemplate, TaskTemplateInput};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, update_rows, Direction, Query, RestStore};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

pub async fn load_templates(store: &dyn RestStore) -> Result<Vec<TaskTemplate>> {
    let rows = fetch_rows(
        store,
        TASK_TEMPLATES,
        &Query::new()
            .select("*")
            .eq("active", true)
            .order("title", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

/// Includes inactive templates, for the admin editor.
pub async fn load_all_templates(store: &dyn RestStore) -> Result<Vec<TaskTemplate>> {
    let rows = fetch_rows(
        store,
        TASK_TEMPLATES,
        &Query::new()
            .select("*")
            .order("department", Direction::Asc)
            .order("title", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

pub async fn load_completions(store: &dyn RestStore, date: NaiveDate) -> Result<Vec<TaskCompletion>> {
    let rows = fetch_rows(
        store,
        TASK_COMPLETIONS,
        &Query::new().select("*").eq("date", date),
    )
    .await?;
    Ok(rows)
}

#[derive(Serialize)]
struct CompletionRow {
    template_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

/// PATCHes the user's row for that day when one exists, otherwise POSTs it.
pub async fn set_completion(
    store: &dyn RestStore,
    template_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    completed: bool,
) -> Result<TaskCompletion> {
    let row = CompletionRow {
        template_id,
        user_id,
        date,
        completed,
        completed_at: completed.then(Utc::now),
    };

    let filter = Query::new()
        .eq("template_id", template_id)
        .eq("user_id", user_id)
        .eq("date", date);
    let existing: Option<TaskCompletion> = fetch_one(store, TASK_COMPLETIONS, filter.clone()).await?;

    if existing.is_some() {
        let updated: Vec<TaskCompletion> = update_rows(store, TASK_COMPLETIONS, &filter, &row).await?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("completion row vanished during update"))
    } else {
        Ok(insert_row(store, TASK_COMPLETIONS, &row).await?)
    }
}

pub async fn create_template(store: &dyn RestStore, input: &TaskTemplateInput) -> Result<TaskTemplate> {
    Ok(insert_row(store, TASK_TEMPLATES, input).await?)
}

pub async fn update_template(
    store: &dyn RestStore,
    id: Uuid,
    input: &TaskTemplateInput,
) -> Result<Option<TaskTemplate>> {
    let rows: Vec<TaskTemplate> =
        update_rows(store, TASK_TEMPLATES, &Query::new().eq("id", id), input).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_template(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store
        .delete(TASK_COMPLETIONS, &Query::new().eq("template_id", id))
        .await?;
    store.delete(TASK_TEMPLATES, &Query::new().eq("id", id)).await?;
    Ok(())
}
