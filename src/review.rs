//! Review aggregation: misunderstood list, arranged quiz, answer evaluation
//!
//! Lists are sorted by id length then id, which puts shallower concepts
//! before their deeper, simpler descendants.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tree::{self, ConceptNode};
use crate::types::IncorrectAnswerRecord;

/// A flagged concept with the title of its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisunderstoodRecord {
    pub id: String,
    pub concept: String,
    pub explanation: String,
    pub example: String,
    pub question: String,
    /// Parent concept title; `None` for roots
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: String,
    pub concept: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Complete,
    Incomplete,
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Complete => write!(f, "complete"),
            EvaluationStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incorrect: Vec<IncorrectAnswerRecord>,
    pub message: String,
}

impl Evaluation {
    pub fn is_complete(&self) -> bool {
        self.status == EvaluationStatus::Complete
    }
}

/// Simplified re-explanation of one incorrectly answered concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleExplanation {
    pub id: String,
    pub concept: String,
    pub simple_explanation: String,
}

/// Every "not understood" concept, sorted for review
pub fn list_misunderstood(topics: &[ConceptNode]) -> Vec<MisunderstoodRecord> {
    let mut records = Vec::new();
    tree::walk(topics, &mut |node, parent| {
        if node.is_not_understood() {
            records.push(MisunderstoodRecord {
                id: node.id.clone(),
                concept: node.concept.clone(),
                explanation: node.explanation.clone(),
                example: node.example.clone(),
                question: node.question.clone(),
                parent: parent.map(|p| p.concept.clone()),
            });
        }
    });
    records.sort_by(|a, b| tree::review_order(&a.id, &b.id));
    records
}

/// Quiz over every "not understood" concept, same order as the review list
pub fn arrange_quiz(topics: &[ConceptNode]) -> Vec<QuizItem> {
    let mut items: Vec<QuizItem> = tree::flagged(topics)
        .into_iter()
        .map(|node| QuizItem {
            id: node.id.clone(),
            concept: node.concept.clone(),
            question: node.question.clone(),
            options: node.options.iter().take(3).cloned().collect(),
            correct_answer: node.correct_answer.clone(),
        })
        .collect();
    items.sort_by(|a, b| tree::review_order(&a.id, &b.id));
    items
}

/// Grade answers for every flagged concept; a missing answer is wrong.
///
/// The submitted letter must equal `correct_answer` exactly, so `" b"` is
/// wrong for `"B"`. Records keep tree order.
pub fn evaluate(topics: &[ConceptNode], answers: &HashMap<String, String>) -> Evaluation {
    let incorrect: Vec<IncorrectAnswerRecord> = tree::flagged(topics)
        .into_iter()
        .filter_map(|node| {
            let submitted = answers.get(&node.id);
            if submitted == Some(&node.correct_answer) {
                None
            } else {
                Some(IncorrectAnswerRecord {
                    id: node.id.clone(),
                    concept: node.concept.clone(),
                    user_answer: submitted.cloned(),
                    correct_answer: node.correct_answer.clone(),
                })
            }
        })
        .collect();

    if incorrect.is_empty() {
        Evaluation {
            status: EvaluationStatus::Complete,
            incorrect,
            message: "All answers correct. Session complete.".to_string(),
        }
    } else {
        Evaluation {
            status: EvaluationStatus::Incomplete,
            incorrect,
            message: "Some answers were incorrect. Very simple explanation is available.".to_string(),
        }
    }
}
