use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub passing_score: u32,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    OpenEnded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: u32,
    pub passed: bool,
    #[serde(default)]
    pub answers: HashMap<Uuid, Answer>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub score: u32,
    pub passed: bool,
}

/// Multiple-choice answers must match `correct_index`; an open-ended answer
/// counts as correct when it is non-empty.
pub fn score_quiz(quiz: &Quiz, questions: &[Question], answers: &HashMap<Uuid, Answer>) -> QuizScore {
    let relevant: Vec<&Question> = questions.iter().filter(|q| q.quiz_id == quiz.id).collect();
    let total = relevant.len();

    let correct = relevant
        .iter()
        .filter(|q| match (&q.kind, answers.get(&q.id)) {
            (QuestionKind::MultipleChoice { correct_index, .. }, Some(Answer::Choice(choice))) => {
                choice == correct_index
            }
            (QuestionKind::OpenEnded, Some(Answer::Text(text))) => !text.trim().is_empty(),
            _ => false,
        })
        .count();

    let score = if total == 0 {
        0
    } else {
        (100.0 * correct as f64 / total as f64).round() as u32
    };

    QuizScore {
        correct,
        total,
        score,
        passed: total > 0 && score >= quiz.passing_score,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    pub quizzes_passed: usize,
    pub quizzes_total: usize,
    pub percentage: u32,
    pub completed: bool,
}

pub fn course_progress(
    course: &Course,
    modules: &[CourseModule],
    lessons: &[Lesson],
    quizzes: &[Quiz],
    lesson_progress: &[LessonProgress],
    attempts: &[QuizAttempt],
    user_id: Uuid,
) -> CourseProgress {
    let module_ids: HashSet<Uuid> = modules
        .iter()
        .filter(|m| m.course_id == course.id)
        .map(|m| m.id)
        .collect();
    let done_lessons: HashSet<Uuid> = lesson_progress
        .iter()
        .filter(|p| p.user_id == user_id)
        .map(|p| p.lesson_id)
        .collect();
    let passed_quizzes: HashSet<Uuid> = attempts
        .iter()
        .filter(|a| a.user_id == user_id && a.passed)
        .map(|a| a.quiz_id)
        .collect();

    let course_lessons: Vec<&Lesson> = lessons.iter().filter(|l| module_ids.contains(&l.module_id)).collect();
    let course_quizzes: Vec<&Quiz> = quizzes.iter().filter(|q| module_ids.contains(&q.module_id)).collect();

    let lessons_completed = course_lessons.iter().filter(|l| done_lessons.contains(&l.id)).count();
    let quizzes_passed = course_quizzes.iter().filter(|q| passed_quizzes.contains(&q.id)).count();

    let items_total = course_lessons.len() + course_quizzes.len();
    let items_done = lessons_completed + quizzes_passed;
    let percentage = if items_total == 0 {
        0
    } else {
        (100.0 * items_done as f64 / items_total as f64).round() as u32
    };

    CourseProgress {
        course_id: course.id,
        lessons_completed,
        lessons_total: course_lessons.len(),
        quizzes_passed,
        quizzes_total: course_quizzes.len(),
        percentage,
        completed: items_total > 0 && items_done == items_total,
    }
}

pub fn best_attempt<'a>(attempts: &'a [QuizAttempt], quiz_id: Uuid, user_id: Uuid) -> Option<&'a QuizAttempt> {
    attempts
        .iter()
        .filter(|a| a.quiz_id == quiz_id && a.user_id == user_id)
        .max_by_key(|a| (a.score, a.created_at))
}
