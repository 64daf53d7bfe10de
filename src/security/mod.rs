//! API key handling
//!
//! Lookup order: `GEMINI_API_KEY`, a `gapi=` line in `api.env` in the working
//! directory, then the OS keyring (with its file fallback).

pub mod keyring;

use anyhow::{bail, Result};
use std::path::Path;
use tracing::debug;

/// Environment variable checked first
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Env-style file read from the working directory
pub const ENV_FILE: &str = "api.env";

/// Key name inside [`ENV_FILE`]
pub const ENV_FILE_KEY: &str = "gapi";

/// Set API key in secure keyring
pub fn set_api_key(key: &str) -> Result<()> {
    keyring::set_api_key(key)
}

/// Delete API key from keyring; returns whether one was stored
pub fn delete_api_key() -> Result<bool> {
    keyring::delete_api_key()
}

/// Find the Gemini API key
pub fn resolve_api_key() -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            debug!("Using API key from {}", API_KEY_ENV);
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = read_env_file(Path::new(ENV_FILE), ENV_FILE_KEY) {
        debug!("Using API key from {}", ENV_FILE);
        return Ok(key);
    }

    match keyring::get_api_key() {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => bail!(
            "Gemini API key not found. Set {}, add '{}=...' to {}, or run 'mastery-tutor config --set-api-key YOUR_KEY'",
            API_KEY_ENV,
            ENV_FILE_KEY,
            ENV_FILE
        ),
    }
}

/// Value of `name` in a `KEY=value` file, if the file exists and has it
pub fn read_env_file(path: &Path, name: &str) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_env_value(&contents, name)
}

/// `#` comments and blank lines are skipped; surrounding quotes stripped
pub fn parse_env_value(contents: &str, name: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|value| !value.is_empty())
}
