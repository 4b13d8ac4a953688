pub mod affiliates;
pub mod onboarding;
pub mod playbook;
pub mod pto;
pub mod records;
pub mod training;
pub mod updates;

use crate::domain::models::User;
use crate::postgrest::{fetch_one, fetch_rows, Direction, Query, RestStore};
use anyhow::Result;
use uuid::Uuid;

pub const USERS: &str = "users";
pub const TASK_TEMPLATES: &str = "task_templates";
pub const TASK_COMPLETIONS: &str = "task_completions";
pub const UPDATES: &str = "updates";
pub const ACKNOWLEDGEMENTS: &str = "update_acknowledgements";
pub const PTO_POLICIES: &str = "pto_policies";
pub const PTO_BALANCES: &str = "pto_balances";
pub const PTO_TRANSACTIONS: &str = "pto_transactions";
pub const AFFILIATES: &str = "affiliates";
pub const FOLLOWUPS: &str = "affiliate_followups";
pub const ONBOARDING_TEMPLATES: &str = "onboarding_templates";
pub const ONBOARDING_TASKS: &str = "onboarding_tasks";
pub const ONBOARDING_PROGRESS: &str = "onboarding_task_progress";
pub const COURSES: &str = "training_courses";
pub const MODULES: &str = "training_modules";
pub const LESSONS: &str = "training_lessons";
pub const QUIZZES: &str = "training_quizzes";
pub const QUESTIONS: &str = "training_questions";
pub const LESSON_PROGRESS: &str = "training_lesson_progress";
pub const QUIZ_ATTEMPTS: &str = "training_quiz_attempts";
pub const KB_ENTRIES: &str = "knowledge_base";
pub const REVIEWS: &str = "reviews";
pub const SALES: &str = "sales";

pub async fn find_user_by_id(store: &dyn RestStore, id: Uuid) -> Result<Option<User>> {
    let user = fetch_one(store, USERS, Query::new().select("*").eq("id", id)).await?;
    Ok(user)
}

pub async fn get_all_users(store: &dyn RestStore) -> Result<Vec<User>> {
    let users = fetch_rows(
        store,
        USERS,
        &Query::new().select("*").order("name", Direction::Asc),
    )
    .await?;
    Ok(users)
}
