//! Gemini API key in the OS keyring
//!
//! Every write also goes to `api_key.txt` (mode 0600) in the config dir, which
//! is read when the keyring is unavailable, e.g. on headless servers.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SERVICE_NAME: &str = "mastery-tutor";
const API_KEY_USERNAME: &str = "gemini-api-key";
const API_KEY_FILE: &str = "api_key.txt";

fn entry() -> Option<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME).ok()
}

fn fallback_path() -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join(API_KEY_FILE))
}

/// Store the key in the keyring and the fallback file
pub fn set_api_key(key: &str) -> Result<()> {
    let key = key.trim();
    let stored = entry().map_or(false, |e| e.set_password(key).is_ok());
    if !stored {
        println!("Note: keyring unavailable, key kept in {}", API_KEY_FILE);
    }
    write_key_file(&fallback_path()?, key)
}

/// Keyring first, then the fallback file
pub fn get_api_key() -> Result<String> {
    if let Some(key) = entry().and_then(|e| e.get_password().ok()) {
        return Ok(key);
    }
    debug!("Keyring lookup failed, reading {}", API_KEY_FILE);
    read_key_file(&fallback_path()?)
}

/// Remove the key from both places; returns whether anything was removed
pub fn delete_api_key() -> Result<bool> {
    let from_keyring = entry().map_or(false, |e| e.delete_credential().is_ok());
    let from_file = remove_key_file(&fallback_path()?)?;
    Ok(from_keyring || from_file)
}

fn write_key_file(path: &Path, key: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create config directory")?;
    }
    fs::write(path, key).context("Failed to write API key file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

fn read_key_file(path: &Path) -> Result<String> {
    let key = fs::read_to_string(path)
        .context("No API key stored. Run 'mastery-tutor config --set-api-key YOUR_KEY' first.")?;
    Ok(key.trim().to_string())
}

fn remove_key_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).context("Failed to delete API key file")?;
    Ok(true)
}
