use super::{ONBOARDING_PROGRESS, ONBOARDING_TASKS, ONBOARDING_TEMPLATES};
use crate::domain::models::User;
use crate::domain::onboarding::{
    apply_action, OnboardingTask, OnboardingTaskInput, OnboardingTemplate, ProgressAction,
    ProgressPatch, ProgressStatus, TaskProgress,
};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, update_rows, Direction, Query, RestStore};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub async fn load_templates(store: &dyn RestStore) -> Result<Vec<OnboardingTemplate>> {
    let rows = fetch_rows(
        store,
        ONBOARDING_TEMPLATES,
        &Query::new().select("*").order("name", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

pub async fn create_template(store: &dyn RestStore, input: &TemplateInput) -> Result<OnboardingTemplate> {
    Ok(insert_row(store, ONBOARDING_TEMPLATES, input).await?)
}

pub async fn delete_template(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store
        .delete(ONBOARDING_TASKS, &Query::new().eq("template_id", id))
        .await?;
    store
        .delete(ONBOARDING_TEMPLATES, &Query::new().eq("id", id))
        .await?;
    Ok(())
}

pub async fn load_tasks(store: &dyn RestStore, template_ids: &[Uuid]) -> Result<Vec<OnboardingTask>> {
    if template_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = fetch_rows(
        store,
        ONBOARDING_TASKS,
        &Query::new()
            .select("*")
            .in_list("template_id", template_ids)
            .order("order_index", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

/// Templates for the user's department plus department-less ones.
pub async fn tasks_for_user(store: &dyn RestStore, user: &User) -> Result<Vec<OnboardingTask>> {
    let ids: Vec<Uuid> = load_templates(store)
        .await?
        .iter()
        .filter(|template| template.applies_to(user))
        .map(|template| template.id)
        .collect();
    load_tasks(store, &ids).await
}

pub async fn find_task(store: &dyn RestStore, id: Uuid) -> Result<Option<OnboardingTask>> {
    Ok(fetch_one(store, ONBOARDING_TASKS, Query::new().select("*").eq("id", id)).await?)
}

pub async fn create_task(store: &dyn RestStore, input: &OnboardingTaskInput) -> Result<OnboardingTask> {
    Ok(insert_row(store, ONBOARDING_TASKS, input).await?)
}

pub async fn update_task(
    store: &dyn RestStore,
    id: Uuid,
    input: &OnboardingTaskInput,
) -> Result<Option<OnboardingTask>> {
    let rows: Vec<OnboardingTask> =
        update_rows(store, ONBOARDING_TASKS, &Query::new().eq("id", id), input).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_task(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store
        .delete(ONBOARDING_PROGRESS, &Query::new().eq("task_id", id))
        .await?;
    store.delete(ONBOARDING_TASKS, &Query::new().eq("id", id)).await?;
    Ok(())
}

pub async fn load_progress(store: &dyn RestStore, user_id: Uuid) -> Result<Vec<TaskProgress>> {
    let rows = fetch_rows(
        store,
        ONBOARDING_PROGRESS,
        &Query::new().select("*").eq("user_id", user_id),
    )
    .await?;
    Ok(rows)
}

#[derive(Serialize)]
struct NewProgress<'a> {
    user_id: Uuid,
    task_id: Uuid,
    #[serde(flatten)]
    patch: &'a ProgressPatch,
}

/// Upserts the user's progress row for `task` with the action's fields.
pub async fn record_action(
    store: &dyn RestStore,
    task: &OnboardingTask,
    user_id: Uuid,
    action: &ProgressAction,
) -> Result<TaskProgress> {
    let patch = apply_action(task, action);
    let filter = Query::new().eq("user_id", user_id).eq("task_id", task.id);
    let existing: Option<TaskProgress> =
        fetch_one(store, ONBOARDING_PROGRESS, filter.clone().select("*")).await?;

    let progress = match existing {
        Some(_) => {
            let rows: Vec<TaskProgress> = update_rows(store, ONBOARDING_PROGRESS, &filter, &patch).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| anyhow!("progress row for task {} vanished during update", task.id))?
        }
        None => {
            let row = NewProgress {
                user_id,
                task_id: task.id,
                patch: &patch,
            };
            insert_row(store, ONBOARDING_PROGRESS, &row).await?
        }
    };

    tracing::info!(
        "Onboarding task {} for user {} is now {:?}",
        task.id,
        user_id,
        progress.status
    );
    Ok(progress)
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub progress: TaskProgress,
    pub task: Option<OnboardingTask>,
    pub user: Option<User>,
}

/// Submitted items waiting on a reviewer, oldest first.
pub async fn review_queue(store: &dyn RestStore) -> Result<Vec<ReviewItem>> {
    let pending: Vec<TaskProgress> = fetch_rows(
        store,
        ONBOARDING_PROGRESS,
        &Query::new()
            .select("*")
            .eq("status", "submitted")
            .order("updated_at", Direction::Asc),
    )
    .await?;
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let task_ids: Vec<Uuid> = pending.iter().map(|p| p.task_id).collect();
    let user_ids: Vec<Uuid> = pending.iter().map(|p| p.user_id).collect();
    let task_query = Query::new().select("*").in_list("id", &task_ids);
    let user_query = Query::new().select("*").in_list("id", &user_ids);
    let (tasks, users) = futures::try_join!(
        fetch_rows::<OnboardingTask>(store, ONBOARDING_TASKS, &task_query),
        fetch_rows::<User>(store, super::USERS, &user_query),
    )?;

    Ok(pending
        .into_iter()
        .filter(|p| p.status == ProgressStatus::Submitted)
        .map(|progress| ReviewItem {
            task: tasks.iter().find(|t| t.id == progress.task_id).cloned(),
            user: users.iter().find(|u| u.id == progress.user_id).cloned(),
            progress,
        })
        .collect())
}
