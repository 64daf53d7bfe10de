//! Remediation engine - learner feedback in, simpler subtopics out
//!
//! A node goes `unseen -> feedback-recorded -> expanded | unchanged`. Only a
//! node whose feedback is exactly "not understood" and which has no subtopics
//! yet is expanded, so each node is expanded at most once.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::generator::ContentGenerator;
use crate::tree::{self, ConceptNode};

/// One learner verdict on one concept.
///
/// Clients sometimes send partial entries; one without an id or a verdict is
/// skipped by [`apply_feedback`] rather than rejecting the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Accepts `"31"` or `31`
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl FeedbackEntry {
    pub fn new(id: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            feedback: Some(feedback.into()),
        }
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("invalid concept id: {}", other))),
    }
}

/// A node waiting for subtopics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNode {
    /// Child indexes from the roots down
    pub index_path: Vec<usize>,
    /// Ids from the root down to this node
    pub id_path: Vec<String>,
}

/// The first node expanded in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedNode {
    pub parent_id: String,
    pub path: Vec<String>,
    pub subtopics: Vec<ConceptNode>,
}

/// Outcome of one expansion batch.
///
/// Only the first expanded node is reported even though every pending node was
/// expanded; callers re-read the tree for the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpansionReport {
    pub expanded: usize,
    /// Expansions that ended in an error node
    pub failed: usize,
    pub first: Option<ExpandedNode>,
}

/// Set feedback on the first node matching each entry's id; returns how many matched
pub fn apply_feedback(topics: &mut [ConceptNode], entries: &[FeedbackEntry]) -> usize {
    let mut matched = 0;
    for entry in entries {
        let (id, feedback) = match (&entry.id, &entry.feedback) {
            (Some(id), Some(feedback)) => (id, feedback),
            _ => {
                debug!("Skipping incomplete feedback entry {:?}", entry);
                continue;
            }
        };
        match tree::find_mut(topics, id) {
            Some(node) => {
                node.feedback = feedback.clone();
                matched += 1;
            }
            None => debug!("Ignoring feedback for unknown concept {}", id),
        }
    }
    matched
}

/// Every flagged, unexpanded node in pre-order
pub fn collect_pending(topics: &[ConceptNode]) -> Vec<PendingNode> {
    let mut pending = Vec::new();
    collect_under(topics, &mut Vec::new(), &mut Vec::new(), &mut pending);
    pending
}

fn collect_under(
    nodes: &[ConceptNode],
    index_path: &mut Vec<usize>,
    id_path: &mut Vec<String>,
    out: &mut Vec<PendingNode>,
) {
    for (idx, node) in nodes.iter().enumerate() {
        index_path.push(idx);
        id_path.push(node.id.clone());

        if node.needs_remediation() {
            out.push(PendingNode {
                index_path: index_path.clone(),
                id_path: id_path.clone(),
            });
        }
        collect_under(&node.subtopics, index_path, id_path, out);

        index_path.pop();
        id_path.pop();
    }
}

/// Expands pending nodes one generation call at a time
pub struct RemediationEngine {
    generator: ContentGenerator,
}

impl RemediationEngine {
    pub fn new(generator: ContentGenerator) -> Self {
        Self { generator }
    }

    /// Expand every node pending at the time of the call.
    ///
    /// Calls run sequentially in pre-order; children created here are not
    /// part of this batch.
    pub async fn expand(&self, topics: &mut [ConceptNode], lesson: &str, grade: &str) -> ExpansionReport {
        let pending = collect_pending(topics);
        if pending.is_empty() {
            debug!("Nothing to remediate");
            return ExpansionReport::default();
        }

        info!("Remediating {} concept(s) for lesson '{}'", pending.len(), lesson);
        let mut report = ExpansionReport::default();

        for item in &pending {
            let (parent_id, concept) = match tree::node_at_mut(topics, &item.index_path) {
                Some(node) => (node.id.clone(), node.concept.clone()),
                None => continue,
            };

            let subtopics = self
                .generator
                .generate_subtopics(&concept, lesson, grade, &parent_id)
                .await;

            if let Some(node) = tree::node_at_mut(topics, &item.index_path) {
                if subtopics.iter().any(ConceptNode::is_error) {
                    report.failed += 1;
                }
                node.subtopics = subtopics;
                report.expanded += 1;

                if report.first.is_none() {
                    report.first = Some(ExpandedNode {
                        parent_id: parent_id.clone(),
                        path: item.id_path.clone(),
                        subtopics: node.subtopics.clone(),
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::MockTextGenerator;
    use crate::tree::NOT_UNDERSTOOD;
    use serde_json::json;
    use std::sync::Arc;

    fn node(id: &str) -> ConceptNode {
        ConceptNode::from_generated(id, &json!({"concept": format!("topic {}", id)})).unwrap()
    }

    fn roots() -> Vec<ConceptNode> {
        (1..=3).map(|i| node(&i.to_string())).collect()
    }

    fn three_subtopics() -> String {
        json!([{"concept": "a"}, {"concept": "b"}, {"concept": "c"}]).to_string()
    }

    #[test]
    fn test_feedback_entry_accepts_numeric_id() {
        let entry: FeedbackEntry = serde_json::from_value(json!({"id": 31, "feedback": "x"})).unwrap();
        assert_eq!(entry.id.as_deref(), Some("31"));
        assert!(serde_json::from_value::<FeedbackEntry>(json!({"id": [1], "feedback": "x"})).is_err());
    }

    #[test]
    fn test_apply_feedback_ignores_unknown_ids() {
        let mut topics = roots();
        topics[1].subtopics = vec![node("21")];
        let matched = apply_feedback(
            &mut topics,
            &[
                FeedbackEntry::new("21", NOT_UNDERSTOOD),
                FeedbackEntry::new("77", NOT_UNDERSTOOD),
                FeedbackEntry::new("3", "understood"),
            ],
        );
        assert_eq!(matched, 2);
        assert!(topics[1].subtopics[0].is_not_understood());
        assert_eq!(topics[2].feedback, "understood");
    }

    #[test]
    fn test_apply_feedback_skips_incomplete_entries() {
        let entries: Vec<FeedbackEntry> = serde_json::from_value(json!([
            {"id": "1"},
            {"feedback": NOT_UNDERSTOOD},
            {"id": "2", "feedback": NOT_UNDERSTOOD},
        ]))
        .unwrap();
        assert_eq!(entries[0].feedback, None);
        assert_eq!(entries[1].id, None);

        let mut topics = roots();
        assert_eq!(apply_feedback(&mut topics, &entries), 1);
        assert_eq!(topics[0].feedback, "");
        assert!(topics[1].is_not_understood());
    }

    #[test]
    fn test_collect_pending_preorder_with_paths() {
        let mut topics = roots();
        topics[0].feedback = NOT_UNDERSTOOD.to_string();
        topics[1].feedback = NOT_UNDERSTOOD.to_string();
        topics[1].subtopics = vec![node("21"), node("22")];
        topics[1].subtopics[1].feedback = NOT_UNDERSTOOD.to_string();
        topics[2].feedback = "fine".to_string();

        let pending = collect_pending(&topics);
        let ids: Vec<Vec<String>> = pending.iter().map(|p| p.id_path.clone()).collect();
        assert_eq!(ids, vec![vec!["1".to_string()], vec!["2".to_string(), "22".to_string()]]);
        assert_eq!(pending[1].index_path, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_expand_reports_first_and_expands_all() {
        let mut mock = MockTextGenerator::new();
        let body = three_subtopics();
        mock.expect_generate().times(2).returning(move |_| Ok(body.clone()));
        let engine = RemediationEngine::new(ContentGenerator::new(Arc::new(mock)));

        let mut topics = roots();
        apply_feedback(
            &mut topics,
            &[FeedbackEntry::new("3", NOT_UNDERSTOOD), FeedbackEntry::new("1", NOT_UNDERSTOOD)],
        );

        let report = engine.expand(&mut topics, "Fractions", "4").await;
        assert_eq!(report.expanded, 2);
        assert_eq!(report.failed, 0);
        let first = report.first.unwrap();
        assert_eq!(first.parent_id, "1");
        assert_eq!(first.path, vec!["1".to_string()]);
        let ids: Vec<&str> = first.subtopics.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "12", "13"]);

        let third: Vec<&str> = topics[2].subtopics.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(third, vec!["31", "32", "33"]);
        assert!(topics[1].subtopics.is_empty());
    }

    #[tokio::test]
    async fn test_expand_is_idempotent() {
        let mut mock = MockTextGenerator::new();
        let body = three_subtopics();
        mock.expect_generate().times(1).returning(move |_| Ok(body.clone()));
        let engine = RemediationEngine::new(ContentGenerator::new(Arc::new(mock)));

        let mut topics = roots();
        apply_feedback(&mut topics, &[FeedbackEntry::new("3", NOT_UNDERSTOOD)]);
        engine.expand(&mut topics, "Fractions", "4").await;
        let before = topics.clone();

        apply_feedback(&mut topics, &[FeedbackEntry::new("3", NOT_UNDERSTOOD)]);
        let report = engine.expand(&mut topics, "Fractions", "4").await;
        assert_eq!(report, ExpansionReport::default());
        assert_eq!(topics, before);
    }

    #[tokio::test]
    async fn test_expand_failure_does_not_stop_batch() {
        let mut mock = MockTextGenerator::new();
        let mut calls = 0;
        let body = three_subtopics();
        mock.expect_generate().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(anyhow::anyhow!("rate limited"))
            } else {
                Ok(body.clone())
            }
        });
        let engine = RemediationEngine::new(ContentGenerator::new(Arc::new(mock)));

        let mut topics = roots();
        apply_feedback(
            &mut topics,
            &[FeedbackEntry::new("1", NOT_UNDERSTOOD), FeedbackEntry::new("2", NOT_UNDERSTOOD)],
        );
        let report = engine.expand(&mut topics, "Fractions", "4").await;

        assert_eq!(report.expanded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(topics[0].subtopics.len(), 1);
        assert_eq!(topics[0].subtopics[0].id, "10");
        assert_eq!(topics[0].subtopics[0].concept, "Error");
        assert_eq!(topics[1].subtopics.len(), 3);
    }
}
