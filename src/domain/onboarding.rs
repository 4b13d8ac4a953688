use crate::domain::models::User;
use crate::domain::schedule::{classify, DueStatus, ONBOARDING_DEADLINE};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

impl OnboardingTemplate {
    /// Department-less templates apply to everyone.
    pub fn applies_to(&self, user: &User) -> bool {
        match self.department.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(department) => user.in_department(department),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingTask {
    pub id: Uuid,
    pub template_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub due_offset_days: Option<i64>,
    #[serde(default)]
    pub requires_approval: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub status: ProgressStatus,
    #[serde(default)]
    pub submission: Option<String>,
    #[serde(default)]
    pub reviewer_notes: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProgressAction {
    Start,
    Submit { submission: String },
    Approve {
        #[serde(default)]
        notes: Option<String>,
    },
    Reject {
        #[serde(default)]
        notes: Option<String>,
    },
}

impl ProgressAction {
    pub fn requires_admin(&self) -> bool {
        matches!(self, ProgressAction::Approve { .. } | ProgressAction::Reject { .. })
    }
}

/// Field changes written for an action. Any action is accepted from any
/// current status; only the reviewer role is checked by the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressPatch {
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub fn apply_action(task: &OnboardingTask, action: &ProgressAction) -> ProgressPatch {
    let now = Utc::now();
    match action {
        ProgressAction::Start => ProgressPatch {
            status: ProgressStatus::InProgress,
            submission: None,
            reviewer_notes: None,
            updated_at: now,
        },
        ProgressAction::Submit { submission } => ProgressPatch {
            status: if task.requires_approval {
                ProgressStatus::Submitted
            } else {
                ProgressStatus::Approved
            },
            submission: Some(submission.trim().to_string()),
            reviewer_notes: None,
            updated_at: now,
        },
        ProgressAction::Approve { notes } => ProgressPatch {
            status: ProgressStatus::Approved,
            submission: None,
            reviewer_notes: notes.clone(),
            updated_at: now,
        },
        ProgressAction::Reject { notes } => ProgressPatch {
            status: ProgressStatus::Rejected,
            submission: None,
            reviewer_notes: notes.clone(),
            updated_at: now,
        },
    }
}

/// `None` without a hire date or offset, or when the sum leaves chrono's range.
pub fn deadline(task: &OnboardingTask, hire_date: Option<NaiveDate>) -> Option<NaiveDate> {
    let offset = Duration::try_days(task.due_offset_days?)?;
    hire_date?.checked_add_signed(offset)
}

pub fn deadline_status(
    task: &OnboardingTask,
    status: ProgressStatus,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> DueStatus {
    if status == ProgressStatus::Approved {
        return DueStatus::Ok;
    }
    classify(deadline(task, hire_date), today, &ONBOARDING_DEADLINE)
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task: OnboardingTask,
    pub status: ProgressStatus,
    pub submission: Option<String>,
    pub reviewer_notes: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub deadline_status: DueStatus,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct OnboardingProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingChecklist {
    pub tasks: Vec<TaskView>,
    pub progress: OnboardingProgress,
}

pub fn user_checklist(
    tasks: &[OnboardingTask],
    progress: &[TaskProgress],
    user_id: Uuid,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> OnboardingChecklist {
    let by_task: HashMap<Uuid, &TaskProgress> = progress
        .iter()
        .filter(|p| p.user_id == user_id)
        .map(|p| (p.task_id, p))
        .collect();

    let mut ordered: Vec<&OnboardingTask> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.order_index, t.title.clone()));

    let views: Vec<TaskView> = ordered
        .into_iter()
        .map(|task| {
            let row = by_task.get(&task.id);
            let status = row.map(|p| p.status).unwrap_or_default();
            TaskView {
                task: task.clone(),
                status,
                submission: row.and_then(|p| p.submission.clone()),
                reviewer_notes: row.and_then(|p| p.reviewer_notes.clone()),
                deadline: deadline(task, hire_date),
                deadline_status: deadline_status(task, status, hire_date, today),
            }
        })
        .collect();

    let completed = views
        .iter()
        .filter(|v| v.status == ProgressStatus::Approved)
        .count();
    let total = views.len();
    let percentage = if total == 0 {
        0
    } else {
        (100.0 * completed as f64 / total as f64).round() as u32
    };

    OnboardingChecklist {
        tasks: views,
        progress: OnboardingProgress {
            completed,
            total,
            percentage,
        },
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OnboardingTaskInput {
    pub template_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub due_offset_days: Option<i64>,
    #[serde(default)]
    pub requires_approval: bool,
}

pub const MAX_DUE_OFFSET_DAYS: i64 = 3650;

impl OnboardingTaskInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.due_offset_days.is_some_and(|d| d < 0) {
            return Err("due_offset_days cannot be negative");
        }
        if self.due_offset_days.is_some_and(|d| d > MAX_DUE_OFFSET_DAYS) {
            return Err("due_offset_days is too large");
        }
        Ok(())
    }
}
