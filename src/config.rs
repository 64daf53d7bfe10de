//! Configuration management
//!
//! Model endpoint, storage locations and server binding, kept in
//! `config.toml` under the platform config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model endpoint settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Where session documents live
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP server binding
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for documents; platform data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_session_file")]
    pub session_file: String,
    #[serde(default = "default_incorrect_file")]
    pub incorrect_file: String,
}

fn default_session_file() -> String {
    "session.json".to_string()
}

fn default_incorrect_file() -> String {
    "false-Q.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            session_file: default_session_file(),
            incorrect_file: default_incorrect_file(),
        }
    }
}

impl StorageConfig {
    /// Resolved document directory
    pub fn dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir(),
        }
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        Ok(self.dir()?.join(&self.session_file))
    }

    pub fn incorrect_path(&self) -> Result<PathBuf> {
        Ok(self.dir()?.join(&self.incorrect_file))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding index.html and other static assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if absent
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;

        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "mastery-tutor", "mastery-tutor")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the configuration directory
pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!();
    println!("  Model:        {}", config.gemini.model);
    println!("  Endpoint:     {}", config.gemini.base_url);
    println!(
        "  Max tokens:   {}",
        config.gemini.max_tokens.map(|t| t.to_string()).unwrap_or_else(|| "provider default".to_string())
    );
    println!("  Data dir:     {}", config.storage.dir()?.display());
    println!("  Session file: {}", config.storage.session_file);
    println!("  Incorrect:    {}", config.storage.incorrect_file);
    println!("  Server:       {}:{}", config.server.host, config.server.port);
    println!("  Static dir:   {}", config.server.static_dir.display());
    println!(
        "  API key:      {}",
        if crate::security::resolve_api_key().is_ok() { "Configured" } else { "Not configured" }
    );

    Ok(())
}

/// Set the model used for all generation
pub fn set_model(model: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.gemini.model = model.to_string();
    config.save()?;
    println!("Model set to: {}", model);
    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Remove the stored API key
pub fn delete_api_key() -> Result<()> {
    if crate::security::delete_api_key()? {
        println!("Stored API key removed.");
    } else {
        println!("No stored API key found.");
    }
    if std::env::var(crate::security::API_KEY_ENV).is_ok() {
        println!("Note: {} is still set in the environment.", crate::security::API_KEY_ENV);
    }
    Ok(())
}
