//! CLI interface for mastery-tutor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::review;
use crate::store::{FileSessionRepository, SessionRepository};
use crate::tree::ConceptNode;
use crate::tutor::Tutor;

#[derive(Parser)]
#[command(name = "mastery-tutor")]
#[command(about = "Adaptive lesson tutor that breaks misunderstood concepts into simpler ones", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,
    },
    /// Generate a lesson and make it the active session
    Lesson {
        /// Lesson topic
        topic: String,
        /// Grade level
        #[arg(short, long)]
        grade: String,
    },
    /// Show misunderstood concepts and the quiz for the active session
    Review,
    /// Configure the tutor
    Config {
        /// Set Gemini API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored Gemini API key
        #[arg(long)]
        delete_api_key: bool,
        /// Set the model used for generation
        #[arg(long)]
        set_model: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let config = Config::load()?;
            crate::server::start(config, host, port).await?;
        }
        Commands::Lesson { topic, grade } => {
            run_lesson(&topic, &grade).await?;
        }
        Commands::Review => {
            run_review()?;
        }
        Commands::Config { set_api_key, delete_api_key, set_model, show } => {
            if let Some(key) = set_api_key {
                crate::config::set_api_key(&key)?;
            } else if delete_api_key {
                crate::config::delete_api_key()?;
            } else if let Some(model) = set_model {
                crate::config::set_model(&model)?;
            } else if show {
                crate::config::show_config()?;
            } else {
                println!("Configuration options:");
                println!("  --set-api-key <key>    Set your Gemini API key");
                println!("  --delete-api-key       Remove the stored API key");
                println!("  --set-model <model>    Set the generation model");
                println!("  --show                 Display current configuration");
                println!();
                println!("The API key can also come from GEMINI_API_KEY or a 'gapi=' line in api.env.");
            }
        }
    }

    Ok(())
}

async fn run_lesson(topic: &str, grade: &str) -> Result<()> {
    let config = Config::load()?;
    let tutor = Tutor::from_config(&config)?;

    println!("Generating '{}' for grade {}...", topic.trim(), grade);
    let plan = tutor
        .start_lesson(topic, grade)
        .await
        .context("Failed to generate lesson")?;

    println!();
    println!("{}", plan.introduction);
    for node in &plan.topics {
        print_concept(node);
    }
    println!();
    println!("Saved as the active session ({} topics).", plan.topics.len());
    Ok(())
}

fn print_concept(node: &ConceptNode) {
    println!();
    println!("[{}] {}", node.id, node.concept);
    if !node.explanation.is_empty() {
        println!("    {}", node.explanation);
    }
    if !node.example.is_empty() {
        println!("    Example: {}", node.example);
    }
    if !node.question.is_empty() {
        println!("    Q: {}", node.question);
        for (letter, option) in ["A", "B", "C"].iter().zip(&node.options) {
            println!("       {}) {}", letter, option);
        }
    }
}

fn run_review() -> Result<()> {
    let config = Config::load()?;
    let sessions = FileSessionRepository::new(config.storage.session_path()?);

    let session = match sessions.load_active() {
        Ok(session) => session,
        Err(e) if e.is_not_found() => {
            println!("No active lesson. Run 'mastery-tutor lesson <topic> --grade <g>' first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Lesson: {} (grade {})", session.lesson, session.grade);

    let misunderstood = review::list_misunderstood(&session.topics);
    if misunderstood.is_empty() {
        println!("No concepts marked as not understood.");
        return Ok(());
    }

    println!();
    println!("Not understood:");
    for record in &misunderstood {
        match &record.parent {
            Some(parent) => println!("  [{}] {} (from {})", record.id, record.concept, parent),
            None => println!("  [{}] {}", record.id, record.concept),
        }
    }

    println!();
    println!("Quiz:");
    for item in review::arrange_quiz(&session.topics) {
        println!("  [{}] {}", item.id, item.question);
        for (letter, option) in ["A", "B", "C"].iter().zip(&item.options) {
            println!("       {}) {}", letter, option);
        }
    }

    Ok(())
}
