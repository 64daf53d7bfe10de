//! Mastery Tutor - adaptive lesson tutor
//!
//! Lessons, feedback-driven remediation and quizzes over a JSON API or the CLI.

use mastery_tutor::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // INFO by default, override with RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    cli::run().await
}
