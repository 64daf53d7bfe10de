//! Content generation - lessons, remediation subtopics, simple explanations
//!
//! `TextGenerator` is the single seam to the model: prompt in, raw text out.
//! `ContentGenerator` turns that text into concept nodes.

pub mod client;
pub mod extract;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{TutorError, TutorResult};
use crate::tree::{child_id, nodes_from_generated, ConceptNode};

pub use client::{GeminiClient, ProviderConfig};

/// Anything that can answer a prompt with text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A freshly generated lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlan {
    pub introduction: String,
    pub topics: Vec<ConceptNode>,
}

/// Turns model text into lesson content
#[derive(Clone)]
pub struct ContentGenerator {
    backend: Arc<dyn TextGenerator>,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Root concepts for a new lesson, ids "1".."9".
    ///
    /// Fails as a whole: a lesson with half its topics is worse than an error.
    pub async fn generate_topics(&self, lesson: &str, grade: &str) -> TutorResult<LessonPlan> {
        let text = self
            .backend
            .generate(&prompts::lesson_prompt(lesson, grade))
            .await
            .map_err(|e| TutorError::generation(e.to_string()))?;

        let parsed = extract::extract_object(&text)?;
        plan_from_value(&parsed, lesson, grade)
    }

    /// Simpler children for one concept, ids `parent_id` + position.
    ///
    /// Never fails: any problem becomes a single error node so the rest of a
    /// remediation batch can carry on.
    pub async fn generate_subtopics(
        &self,
        concept: &str,
        lesson: &str,
        grade: &str,
        parent_id: &str,
    ) -> Vec<ConceptNode> {
        match self.try_generate_subtopics(concept, lesson, grade, parent_id).await {
            Ok(nodes) => {
                debug!("Generated {} subtopics under {}", nodes.len(), parent_id);
                nodes
            }
            Err(e) => {
                warn!("Subtopic generation for {} failed: {}", parent_id, e);
                vec![ConceptNode::error(parent_id, e.to_string())]
            }
        }
    }

    async fn try_generate_subtopics(
        &self,
        concept: &str,
        lesson: &str,
        grade: &str,
        parent_id: &str,
    ) -> TutorResult<Vec<ConceptNode>> {
        let text = self
            .backend
            .generate(&prompts::subtopics_prompt(concept, lesson, grade))
            .await
            .map_err(|e| TutorError::generation(e.to_string()))?;

        let parsed = extract::extract_array(&text)?;
        let items = parsed
            .as_array()
            .ok_or_else(|| TutorError::generation("expected a JSON array of subtopics"))?;

        nodes_from_generated(items, |pos| child_id(parent_id, pos)).map_err(TutorError::Generation)
    }

    /// Very simple re-explanation, raw model text
    pub async fn simple_explanation(&self, concept: &str) -> Result<String> {
        self.backend
            .generate(&prompts::simple_explanation_prompt(concept))
            .await
    }
}

fn plan_from_value(parsed: &Value, lesson: &str, grade: &str) -> TutorResult<LessonPlan> {
    let object = parsed
        .as_object()
        .ok_or_else(|| TutorError::generation("expected a JSON object with topics"))?;

    let introduction = match object.get("introduction") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            format!("This lesson covers {} for grade {} students.", lesson, grade)
        }
        Some(other) => other.to_string(),
    };

    let items = object
        .get("topics")
        .and_then(|t| t.as_array())
        .ok_or_else(|| TutorError::generation("response has no topics array"))?;

    let topics = nodes_from_generated(items, |pos| pos.to_string()).map_err(TutorError::Generation)?;

    Ok(LessonPlan { introduction, topics })
}
