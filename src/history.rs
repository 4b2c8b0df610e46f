//! Durable password history
//!
//! One JSON file holds the whole list, newest entry first. New entries are
//! always prepended; the list grows without bound until the user clears it.

use crate::ToolError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPassword {
    pub password: String,
    pub timestamp: String,
    pub length: usize,
}

impl SavedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            length: password.chars().count(),
            timestamp: Utc::now().to_rfc3339(),
            password,
        }
    }
}

pub struct PasswordHistory {
    path: PathBuf,
}

impl PasswordHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<SavedPassword>, ToolError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &[SavedPassword]) -> Result<(), ToolError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    /// Prepends `password` and persists the list. Returns the stored record.
    pub fn record(&self, password: &str) -> Result<SavedPassword, ToolError> {
        let mut entries = self.load()?;
        let entry = SavedPassword::new(password);
        entries.insert(0, entry.clone());
        self.save(&entries)?;
        debug!(
            "Saved password to history ({} entries) at {}",
            entries.len(),
            self.path.display()
        );
        Ok(entry)
    }

    pub fn remove(&self, index: usize) -> Result<SavedPassword, ToolError> {
        let mut entries = self.load()?;
        if index >= entries.len() {
            return Err(ToolError::InvalidInput(format!(
                "no saved password at position {index} (history holds {})",
                entries.len()
            )));
        }
        let removed = entries.remove(index);
        self.save(&entries)?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<usize, ToolError> {
        let count = self.load()?.len();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(count)
    }
}
