//! Shared types used across modules
//!
//! Persisted shapes that both the store and the engines need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tree::ConceptNode;

/// One lesson's concept tree plus learner feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSession {
    /// The lesson text, trimmed; doubles as the storage key
    pub lesson: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub introduction: String,
    /// Root concepts, ids "1".."9"
    #[serde(default)]
    pub topics: Vec<ConceptNode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LessonSession {
    pub fn new(lesson: &str, grade: &str, introduction: String, topics: Vec<ConceptNode>) -> Self {
        let now = Utc::now();
        Self {
            lesson: lesson_key(lesson),
            grade: grade.to_string(),
            introduction,
            topics,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> &str {
        &self.lesson
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Storage key for a lesson
pub fn lesson_key(lesson: &str) -> String {
    lesson.trim().to_string()
}

/// A flagged concept whose quiz answer was wrong or missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectAnswerRecord {
    pub id: String,
    pub concept: String,
    /// `None` when nothing was submitted for this id
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

/// On-disk shape of the incorrect-answers artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectAnswers {
    #[serde(default)]
    pub incorrect: Vec<IncorrectAnswerRecord>,
}
