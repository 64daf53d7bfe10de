//! Concept nodes and the repair of loosely-shaped model output into them

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only feedback value that triggers remediation
pub const NOT_UNDERSTOOD: &str = "not understood";

/// Largest sibling batch a single generation call may create
pub const MAX_BATCH: usize = 9;

/// Options used when the model leaves some or all of them out
pub const PLACEHOLDER_OPTIONS: [&str; 3] = ["Option A", "Option B", "Option C"];

/// Answer used when the model gives none we can recognise
pub const DEFAULT_ANSWER: &str = "B";

const ANSWER_LETTERS: [char; 3] = ['A', 'B', 'C'];

/// One teachable unit: explanation, worked example and a quiz question.
///
/// Children live in `subtopics`, owned by value. A child's id is the parent's
/// id followed by its 1-based position, so `"3"` has children `"31"`..`"39"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub question: String,
    /// Choices labelled A/B/C by position
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
    /// Learner-set; only [`NOT_UNDERSTOOD`] means anything
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub subtopics: Vec<ConceptNode>,
}

impl ConceptNode {
    /// Build a node from one generated item, defaulting whatever is missing.
    ///
    /// Returns `None` when the item is not an object at all.
    pub fn from_generated(id: impl Into<String>, item: &Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }

        Some(Self {
            id: id.into(),
            concept: text_field(item, "concept"),
            explanation: text_field(item, "explanation"),
            example: text_field(item, "example"),
            question: text_field(item, "question"),
            options: normalize_options(item.get("options")),
            correct_answer: normalize_answer(&text_field(item, "correct_answer")),
            feedback: String::new(),
            subtopics: Vec::new(),
        })
    }

    /// Placeholder recorded in place of a batch whose generation failed.
    ///
    /// It carries no feedback, so remediation and quizzes never pick it up.
    pub fn error(parent_id: &str, message: impl Into<String>) -> Self {
        Self {
            id: format!("{}0", parent_id),
            concept: "Error".to_string(),
            explanation: message.into(),
            example: String::new(),
            question: String::new(),
            options: Vec::new(),
            correct_answer: String::new(),
            feedback: String::new(),
            subtopics: Vec::new(),
        }
    }

    pub fn is_not_understood(&self) -> bool {
        self.feedback == NOT_UNDERSTOOD
    }

    /// Flagged and not yet expanded
    pub fn needs_remediation(&self) -> bool {
        self.is_not_understood() && self.subtopics.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.concept == "Error" && self.id.ends_with('0')
    }
}

/// Id of the child at 1-based `position` under `parent_id`
pub fn child_id(parent_id: &str, position: usize) -> String {
    format!("{}{}", parent_id, position)
}

/// Turn a generated array into at most [`MAX_BATCH`] nodes.
///
/// `make_id` receives the 1-based position. Any non-object item fails the
/// whole batch, since the rest of the array can't be trusted either.
pub fn nodes_from_generated(
    items: &[Value],
    make_id: impl Fn(usize) -> String,
) -> Result<Vec<ConceptNode>, String> {
    items
        .iter()
        .take(MAX_BATCH)
        .enumerate()
        .map(|(idx, item)| {
            ConceptNode::from_generated(make_id(idx + 1), item)
                .ok_or_else(|| format!("item {} is not an object: {}", idx + 1, item))
        })
        .collect()
}

fn text_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Exactly three options: coerce to strings, cut extras, pad from the placeholders
fn normalize_options(raw: Option<&Value>) -> Vec<String> {
    let mut options: Vec<String> = match raw {
        Some(Value::Array(items)) => items.iter().take(3).map(option_text).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![option_text(other)],
    };

    for placeholder in PLACEHOLDER_OPTIONS.iter().skip(options.len()) {
        options.push(placeholder.to_string());
    }
    options
}

/// Accept "B", " c ", "b) 12", "(C)"; anything else becomes [`DEFAULT_ANSWER`]
pub fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches(&['(', '['][..]);
    match trimmed.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some(letter) if ANSWER_LETTERS.contains(&letter) => {
            // "Because..." must not read as "B"
            let rest = trimmed[1..].chars().next();
            match rest {
                Some(c) if c.is_alphanumeric() => DEFAULT_ANSWER.to_string(),
                _ => letter.to_string(),
            }
        }
        _ => DEFAULT_ANSWER.to_string(),
    }
}
