//! Tutor service - one call per learner action
//!
//! Every operation reads the whole session, works on it in memory and writes
//! it back. Concurrent requests on the same session are last-writer-wins.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::TutorResult;
use crate::generator::{ContentGenerator, GeminiClient, LessonPlan, TextGenerator};
use crate::remediation::{self, ExpansionReport, FeedbackEntry, RemediationEngine};
use crate::review::{self, Evaluation, MisunderstoodRecord, QuizItem, SimpleExplanation};
use crate::store::{FileSessionRepository, IncorrectAnswerLog, SessionRepository};
use crate::tree;
use crate::types::LessonSession;

pub struct Tutor {
    generator: ContentGenerator,
    engine: RemediationEngine,
    sessions: Arc<dyn SessionRepository>,
    incorrect: IncorrectAnswerLog,
}

impl Tutor {
    pub fn new(
        backend: Arc<dyn TextGenerator>,
        sessions: Arc<dyn SessionRepository>,
        incorrect: IncorrectAnswerLog,
    ) -> Self {
        let generator = ContentGenerator::new(backend);
        Self {
            engine: RemediationEngine::new(generator.clone()),
            generator,
            sessions,
            incorrect,
        }
    }

    /// Gemini backend and file stores under the configured data dir
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GeminiClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(FileSessionRepository::new(config.storage.session_path()?)),
            IncorrectAnswerLog::new(config.storage.incorrect_path()?),
        ))
    }

    /// Generate a lesson and make it the only stored session
    pub async fn start_lesson(&self, lesson: &str, grade: &str) -> TutorResult<LessonPlan> {
        info!("Starting lesson '{}' for grade {}", lesson.trim(), grade);
        let plan = self.generator.generate_topics(lesson, grade).await?;

        let session = LessonSession::new(lesson, grade, plan.introduction.clone(), plan.topics.clone());
        self.sessions.replace_all(&session)?;
        info!("Lesson '{}' stored with {} topics", session.key(), plan.topics.len());

        Ok(plan)
    }

    /// Record feedback, then expand everything still marked "not understood".
    ///
    /// An empty `grade` falls back to the grade stored with the session.
    pub async fn submit_feedback(
        &self,
        lesson: &str,
        grade: &str,
        entries: &[FeedbackEntry],
    ) -> TutorResult<ExpansionReport> {
        let mut session = self.sessions.load(lesson)?;

        let matched = remediation::apply_feedback(&mut session.topics, entries);
        info!("Applied {}/{} feedback entries to '{}'", matched, entries.len(), session.key());

        let grade = if grade.trim().is_empty() {
            session.grade.clone()
        } else {
            grade.to_string()
        };
        let lesson_key = session.key().to_string();
        let report = self.engine.expand(&mut session.topics, &lesson_key, &grade).await;
        if report.expanded > 0 {
            info!(
                "Expanded {} concept(s), {} failed; '{}' now has {} concepts",
                report.expanded,
                report.failed,
                lesson_key,
                tree::count(&session.topics)
            );
        }

        session.touch();
        self.sessions.save(&session)?;
        Ok(report)
    }

    pub fn active_session(&self) -> TutorResult<LessonSession> {
        self.sessions.load_active()
    }

    pub fn list_misunderstood(&self) -> TutorResult<Vec<MisunderstoodRecord>> {
        Ok(review::list_misunderstood(&self.active_session()?.topics))
    }

    pub fn arrange_quiz(&self) -> TutorResult<Vec<QuizItem>> {
        Ok(review::arrange_quiz(&self.active_session()?.topics))
    }

    /// Grade answers; persist the misses, or clear them once all are right
    pub fn evaluate(&self, answers: &HashMap<String, String>) -> TutorResult<Evaluation> {
        let session = self.active_session()?;
        let evaluation = review::evaluate(&session.topics, answers);

        if evaluation.is_complete() {
            if self.incorrect.clear()? {
                info!("All answers correct, cleared incorrect answers");
            }
        } else {
            self.incorrect.save(&evaluation.incorrect)?;
            info!("{} incorrect answer(s) recorded", evaluation.incorrect.len());
        }

        Ok(evaluation)
    }

    /// One simple re-explanation per recorded incorrect answer.
    ///
    /// Generation failures become an inline "Error: ..." for that item.
    pub async fn simplify_incorrect(&self) -> TutorResult<Vec<SimpleExplanation>> {
        let records = self.incorrect.load()?;
        let mut explanations = Vec::with_capacity(records.len());

        for record in records {
            let simple_explanation = match self.generator.simple_explanation(&record.concept).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Simple explanation for {} failed: {}", record.id, e);
                    format!("Error: {}", e)
                }
            };
            explanations.push(SimpleExplanation {
                id: record.id,
                concept: record.concept,
                simple_explanation,
            });
        }

        Ok(explanations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockTextGenerator;
    use crate::store::MemorySessionRepository;
    use crate::tree::NOT_UNDERSTOOD;

    const LESSON: &str = r#"{"introduction": "Intro", "topics": [
        {"concept": "Halves", "options": ["a", "b", "c"], "correct_answer": "A"},
        {"concept": "Thirds", "options": ["a", "b", "c"], "correct_answer": "B"}
    ]}"#;

    fn tutor(mock: MockTextGenerator, dir: &tempfile::TempDir) -> Tutor {
        Tutor::new(
            Arc::new(mock),
            Arc::new(MemorySessionRepository::new()),
            IncorrectAnswerLog::new(dir.path().join("false-Q.json")),
        )
    }

    #[tokio::test]
    async fn test_feedback_without_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let tutor = tutor(MockTextGenerator::new(), &dir);
        let err = tutor
            .submit_feedback("Fractions", "4", &[FeedbackEntry::new("1", NOT_UNDERSTOOD)])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_feedback_uses_stored_grade() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains("\"topics\""))
            .returning(|_| Ok(LESSON.to_string()));
        mock.expect_generate()
            .withf(|p: &str| p.contains("simpler subtopics") && p.contains("grade 4"))
            .times(1)
            .returning(|_| Ok("[{\"concept\": \"tiny\"}]".to_string()));
        let tutor = tutor(mock, &dir);

        tutor.start_lesson(" Fractions ", "4").await.unwrap();
        let report = tutor
            .submit_feedback("Fractions", "", &[FeedbackEntry::new("2", NOT_UNDERSTOOD)])
            .await
            .unwrap();
        assert_eq!(report.first.unwrap().subtopics[0].id, "21");
    }

    #[tokio::test]
    async fn test_simplify_reports_errors_inline() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|p: &str| p.contains("\"topics\""))
            .returning(|_| Ok(LESSON.to_string()));
        mock.expect_generate()
            .withf(|p: &str| p.contains("'Halves'"))
            .returning(|_| Err(anyhow::anyhow!("quota exceeded")));
        mock.expect_generate()
            .withf(|p: &str| p.contains("'Thirds'"))
            .returning(|_| Ok("Three equal pieces.".to_string()));
        let tutor = tutor(mock, &dir);

        tutor.start_lesson("Fractions", "4").await.unwrap();
        assert!(tutor.simplify_incorrect().await.unwrap_err().is_not_found());

        // Flag both topics without expanding them
        let mut session = tutor.active_session().unwrap();
        for topic in session.topics.iter_mut() {
            topic.feedback = NOT_UNDERSTOOD.to_string();
        }
        tutor.sessions.save(&session).unwrap();

        let evaluation = tutor.evaluate(&HashMap::new()).unwrap();
        assert_eq!(evaluation.incorrect.len(), 2);

        let explanations = tutor.simplify_incorrect().await.unwrap();
        assert_eq!(explanations.len(), 2);
        assert_eq!(explanations[0].id, "1");
        assert!(explanations[0].simple_explanation.starts_with("Error: "));
        assert!(explanations[0].simple_explanation.contains("quota exceeded"));
        assert_eq!(explanations[1].simple_explanation, "Three equal pieces.");
    }
}
