//! A single JSON document on disk

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{TutorError, TutorResult};

/// Whole-document load/save/delete; readers always see a complete file
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonDocument<T> {
    /// `name` shows up in not-found messages
    pub fn new(path: impl Into<PathBuf>, name: &'static str) -> Self {
        Self {
            path: path.into(),
            name,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> TutorResult<T> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TutorError::not_found(format!("No {} found.", self.name)));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, value: &T) -> TutorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved {} to {}", self.name, self.path.display());
        Ok(())
    }

    pub fn delete(&self) -> TutorResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted {} at {}", self.name, self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TutorError::not_found(format!("No {} found.", self.name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
