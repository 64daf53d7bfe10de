//! Mastery Tutor - adaptive lesson library
//!
//! Generates grade-appropriate lessons with an LLM, tracks which concepts a
//! learner marks "not understood", and breaks those into simpler subtopics:
//! - Gemini integration through the OpenAI-compatible endpoint
//! - Recursive concept tree with positional ids
//! - File-backed session and incorrect-answer stores
//! - Review list, arranged quiz, evaluation and simple re-explanations
//! - JSON web server and CLI
//!
//! # Example
//!
//! ```ignore
//! use mastery_tutor::{Config, Tutor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let tutor = Tutor::from_config(&Config::load()?)?;
//!     let plan = tutor.start_lesson("Fractions", "4").await?;
//!     println!("{}", plan.introduction);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod types;
pub mod error;
pub mod tree;
pub mod generator;
pub mod store;
pub mod remediation;
pub mod review;
pub mod tutor;

// Application modules
pub mod config;
pub mod security;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use error::{TutorError, TutorResult};

pub use tree::ConceptNode;

pub use generator::{ContentGenerator, GeminiClient, LessonPlan, TextGenerator};

pub use store::{FileSessionRepository, IncorrectAnswerLog, MemorySessionRepository, SessionRepository};

pub use remediation::{ExpansionReport, FeedbackEntry, RemediationEngine};

pub use review::{Evaluation, EvaluationStatus, MisunderstoodRecord, QuizItem, SimpleExplanation};

pub use types::{IncorrectAnswerRecord, LessonSession};

pub use tutor::Tutor;

pub use config::Config;

pub use server::{router, ServerState, start as start_server};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Adaptive Lesson Tutor", NAME, VERSION)
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary
pub fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
