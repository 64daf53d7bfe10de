//! Session storage
//!
//! Sessions live behind [`SessionRepository`] so more than one could coexist,
//! but starting a lesson uses [`SessionRepository::replace_all`]: only one
//! session is active at a time and the last write wins.

pub mod document;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{TutorError, TutorResult};
use crate::types::{lesson_key, IncorrectAnswerRecord, IncorrectAnswers, LessonSession};

pub use document::JsonDocument;

/// Lesson key -> session
pub type SessionDocument = BTreeMap<String, LessonSession>;

const NO_SESSION: &str = "No session found.";

/// Load/save sessions by lesson key
pub trait SessionRepository: Send + Sync {
    /// Session for one lesson key
    fn load(&self, key: &str) -> TutorResult<LessonSession>;

    /// Most recently updated session
    fn load_active(&self) -> TutorResult<LessonSession>;

    /// Insert or overwrite the session under its own key
    fn save(&self, session: &LessonSession) -> TutorResult<()>;

    /// Discard every stored session and keep only this one
    fn replace_all(&self, session: &LessonSession) -> TutorResult<()>;
}

fn most_recent(doc: SessionDocument) -> TutorResult<LessonSession> {
    doc.into_values()
        .max_by_key(|s| s.updated_at)
        .ok_or_else(|| TutorError::not_found(NO_SESSION))
}

/// Sessions in one JSON file
pub struct FileSessionRepository {
    doc: JsonDocument<SessionDocument>,
}

impl FileSessionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path, "session"),
        }
    }

    fn read(&self) -> TutorResult<SessionDocument> {
        self.doc.load()
    }
}

impl SessionRepository for FileSessionRepository {
    fn load(&self, key: &str) -> TutorResult<LessonSession> {
        self.read()?
            .remove(&lesson_key(key))
            .ok_or_else(|| TutorError::not_found("No session or feedback found for this lesson."))
    }

    fn load_active(&self) -> TutorResult<LessonSession> {
        most_recent(self.read()?)
    }

    fn save(&self, session: &LessonSession) -> TutorResult<()> {
        let mut doc = match self.read() {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => SessionDocument::new(),
            Err(e) => return Err(e),
        };
        doc.insert(session.key().to_string(), session.clone());
        self.doc.save(&doc)
    }

    fn replace_all(&self, session: &LessonSession) -> TutorResult<()> {
        let mut doc = SessionDocument::new();
        doc.insert(session.key().to_string(), session.clone());
        self.doc.save(&doc)
    }
}

/// Sessions held in process memory
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<SessionDocument>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, SessionDocument> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionRepository for MemorySessionRepository {
    fn load(&self, key: &str) -> TutorResult<LessonSession> {
        self.sessions()
            .get(&lesson_key(key))
            .cloned()
            .ok_or_else(|| TutorError::not_found("No session or feedback found for this lesson."))
    }

    fn load_active(&self) -> TutorResult<LessonSession> {
        most_recent(self.sessions().clone())
    }

    fn save(&self, session: &LessonSession) -> TutorResult<()> {
        self.sessions().insert(session.key().to_string(), session.clone());
        Ok(())
    }

    fn replace_all(&self, session: &LessonSession) -> TutorResult<()> {
        let mut sessions = self.sessions();
        sessions.clear();
        sessions.insert(session.key().to_string(), session.clone());
        Ok(())
    }
}

/// The incorrect-answers artifact, rewritten or removed on every evaluation
pub struct IncorrectAnswerLog {
    doc: JsonDocument<IncorrectAnswers>,
}

impl IncorrectAnswerLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path, "false-Q file"),
        }
    }

    pub fn load(&self) -> TutorResult<Vec<IncorrectAnswerRecord>> {
        Ok(self.doc.load()?.incorrect)
    }

    pub fn save(&self, records: &[IncorrectAnswerRecord]) -> TutorResult<()> {
        self.doc.save(&IncorrectAnswers {
            incorrect: records.to_vec(),
        })
    }

    /// Remove the artifact; `false` if there was none
    pub fn clear(&self) -> TutorResult<bool> {
        match self.doc.delete() {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn exists(&self) -> bool {
        self.doc.exists()
    }
}
