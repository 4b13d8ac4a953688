use crate::db;
use crate::db::training::Catalog;
use crate::domain::training::{
    best_attempt, course_progress, Answer, Course, CourseModule, CourseProgress, Lesson, LessonProgress,
    Question, QuestionKind, Quiz, QuizAttempt,
};
use crate::state::SharedState;
use crate::web::internal;
use crate::web::session::UserSession;
use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Question as shown to a learner; the answer key stays server-side.
#[derive(Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub prompt: String,
    pub question_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        let (question_type, options) = match &q.kind {
            QuestionKind::MultipleChoice { options, .. } => ("multiple_choice", options.clone()),
            QuestionKind::OpenEnded => ("open_ended", Vec::new()),
        };
        Self {
            id: q.id,
            prompt: q.prompt.clone(),
            question_type,
            options,
        }
    }
}

#[derive(Serialize)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionView>,
    pub best_score: Option<u32>,
    pub passed: bool,
}

#[derive(Serialize)]
pub struct ModuleView {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<LessonView>,
    pub quizzes: Vec<QuizView>,
}

#[derive(Serialize)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub progress: CourseProgress,
    pub modules: Vec<ModuleView>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptPayload {
    pub answers: HashMap<Uuid, Answer>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(courses))
        .route("/courses/:id", get(course))
        .route("/lessons/:id/complete", post(complete_lesson))
        .route("/quizzes/:id/attempts", post(submit_attempt))
        .with_state(state)
}

fn course_view(
    course: &Course,
    catalog: &Catalog,
    lesson_progress: &[LessonProgress],
    attempts: &[QuizAttempt],
    user_id: Uuid,
) -> CourseView {
    let done: HashSet<Uuid> = lesson_progress.iter().map(|p| p.lesson_id).collect();
    let modules = catalog
        .modules
        .iter()
        .filter(|m| m.course_id == course.id)
        .map(|module| ModuleView {
            module: module.clone(),
            lessons: catalog
                .lessons
                .iter()
                .filter(|l| l.module_id == module.id)
                .map(|lesson| LessonView {
                    lesson: lesson.clone(),
                    completed: done.contains(&lesson.id),
                })
                .collect(),
            quizzes: catalog
                .quizzes
                .iter()
                .filter(|q| q.module_id == module.id)
                .map(|quiz| {
                    let best = best_attempt(attempts, quiz.id, user_id);
                    QuizView {
                        quiz: quiz.clone(),
                        questions: catalog
                            .questions
                            .iter()
                            .filter(|q| q.quiz_id == quiz.id)
                            .map(QuestionView::from)
                            .collect(),
                        best_score: best.map(|a| a.score),
                        passed: attempts
                            .iter()
                            .any(|a| a.quiz_id == quiz.id && a.user_id == user_id && a.passed),
                    }
                })
                .collect(),
        })
        .collect();

    CourseView {
        course: course.clone(),
        progress: course_progress(
            course,
            &catalog.modules,
            &catalog.lessons,
            &catalog.quizzes,
            lesson_progress,
            attempts,
            user_id,
        ),
        modules,
    }
}

async fn load_views(session: &UserSession) -> Result<Vec<CourseView>, StatusCode> {
    let user_id = session.user.id;
    let (catalog, lesson_progress, attempts) = futures::try_join!(
        db::training::load_catalog(&session.rest),
        db::training::load_lesson_progress(&session.rest, user_id),
        db::training::load_attempts(&session.rest, user_id),
    )
    .map_err(internal("Failed to load training"))?;

    Ok(catalog
        .courses
        .iter()
        .filter(|c| {
            c.department
                .as_deref()
                .map_or(true, |d| session.user.is_admin() || session.user.in_department(d))
        })
        .map(|c| course_view(c, &catalog, &lesson_progress, &attempts, user_id))
        .collect())
}

async fn courses(session: UserSession) -> Result<Json<Vec<CourseView>>, StatusCode> {
    Ok(Json(load_views(&session).await?))
}

async fn course(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<CourseView>, StatusCode> {
    load_views(&session)
        .await?
        .into_iter()
        .find(|v| v.course.id == id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn complete_lesson(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<LessonProgress>, StatusCode> {
    let row = db::training::complete_lesson(&session.rest, session.user.id, id)
        .await
        .map_err(internal("Failed to complete lesson"))?;
    Ok(Json(row))
}

async fn submit_attempt(
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttemptPayload>,
) -> Result<Json<QuizAttempt>, StatusCode> {
    let attempt = db::training::submit_quiz(&session.rest, id, session.user.id, &payload.answers)
        .await
        .map_err(internal("Failed to submit quiz"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_view_hides_the_answer_key() {
        let question = Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            prompt: "Which form starts a dispute?".into(),
            kind: QuestionKind::MultipleChoice {
                options: vec!["609 letter".into(), "W-2".into()],
                correct_index: 0,
            },
            order_index: 0,
        };
        let json = serde_json::to_value(QuestionView::from(&question)).unwrap();
        assert_eq!(json["question_type"], "multiple_choice");
        assert_eq!(json["options"].as_array().map(Vec::len), Some(2));
        assert!(json.get("correct_index").is_none());
    }
}
