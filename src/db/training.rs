use super::{COURSES, LESSONS, LESSON_PROGRESS, MODULES, QUESTIONS, QUIZZES, QUIZ_ATTEMPTS};
use crate::domain::training::{
    score_quiz, Answer, Course, CourseModule, Lesson, LessonProgress, Question, Quiz, QuizAttempt,
};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, Direction, Query, RestStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Every course with its modules, lessons, quizzes and questions.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Catalog {
    pub courses: Vec<Course>,
    pub modules: Vec<CourseModule>,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
    pub questions: Vec<Question>,
}

fn ordered() -> Query {
    Query::new().select("*").order("order_index", Direction::Asc)
}

pub async fn load_catalog(store: &dyn RestStore) -> Result<Catalog> {
    let by_title = Query::new().select("*").order("title", Direction::Asc);
    let by_order = ordered();
    let (courses, modules, lessons, quizzes, questions) = futures::try_join!(
        fetch_rows::<Course>(store, COURSES, &by_title),
        fetch_rows::<CourseModule>(store, MODULES, &by_order),
        fetch_rows::<Lesson>(store, LESSONS, &by_order),
        fetch_rows::<Quiz>(store, QUIZZES, &by_order),
        fetch_rows::<Question>(store, QUESTIONS, &by_order),
    )?;
    Ok(Catalog {
        courses,
        modules,
        lessons,
        quizzes,
        questions,
    })
}

pub async fn load_lesson_progress(store: &dyn RestStore, user_id: Uuid) -> Result<Vec<LessonProgress>> {
    Ok(fetch_rows(store, LESSON_PROGRESS, &Query::new().select("*").eq("user_id", user_id)).await?)
}

pub async fn load_attempts(store: &dyn RestStore, user_id: Uuid) -> Result<Vec<QuizAttempt>> {
    let rows = fetch_rows(
        store,
        QUIZ_ATTEMPTS,
        &Query::new()
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", Direction::Desc),
    )
    .await?;
    Ok(rows)
}

#[derive(Serialize)]
struct LessonProgressRow {
    user_id: Uuid,
    lesson_id: Uuid,
    completed_at: DateTime<Utc>,
}

/// Returns the existing row when the lesson was already completed.
pub async fn complete_lesson(store: &dyn RestStore, user_id: Uuid, lesson_id: Uuid) -> Result<LessonProgress> {
    let existing: Option<LessonProgress> = fetch_one(
        store,
        LESSON_PROGRESS,
        Query::new()
            .select("*")
            .eq("user_id", user_id)
            .eq("lesson_id", lesson_id),
    )
    .await?;
    if let Some(row) = existing {
        return Ok(row);
    }

    let row = LessonProgressRow {
        user_id,
        lesson_id,
        completed_at: Utc::now(),
    };
    Ok(insert_row(store, LESSON_PROGRESS, &row).await?)
}

#[derive(Serialize)]
struct AttemptRow<'a> {
    user_id: Uuid,
    quiz_id: Uuid,
    score: u32,
    passed: bool,
    answers: &'a HashMap<Uuid, Answer>,
    created_at: DateTime<Utc>,
}

/// Scores the answers and stores a new attempt. `None` when the quiz does
/// not exist. Retakes add rows; nothing is overwritten.
pub async fn submit_quiz(
    store: &dyn RestStore,
    quiz_id: Uuid,
    user_id: Uuid,
    answers: &HashMap<Uuid, Answer>,
) -> Result<Option<QuizAttempt>> {
    let question_query = Query::new().select("*").eq("quiz_id", quiz_id);
    let (quiz, questions) = futures::try_join!(
        fetch_one::<Quiz>(store, QUIZZES, Query::new().select("*").eq("id", quiz_id)),
        fetch_rows::<Question>(store, QUESTIONS, &question_query),
    )?;
    let Some(quiz) = quiz else {
        return Ok(None);
    };

    let scored = score_quiz(&quiz, &questions, answers);
    let row = AttemptRow {
        user_id,
        quiz_id,
        score: scored.score,
        passed: scored.passed,
        answers,
        created_at: Utc::now(),
    };
    let attempt: QuizAttempt = insert_row(store, QUIZ_ATTEMPTS, &row).await?;

    tracing::info!(
        "Quiz {} attempt by {}: {}/{} correct, score {} ({})",
        quiz.id,
        user_id,
        scored.correct,
        scored.total,
        scored.score,
        if scored.passed { "passed" } else { "failed" }
    );
    Ok(Some(attempt))
}
