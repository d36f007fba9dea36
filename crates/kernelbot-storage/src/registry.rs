//! Notebook registry: a name -> `owner/slug` map persisted as pretty JSON.
//!
//! A missing file is an empty registry, not an error. Entry order is
//! preserved on disk, so loading and saving an untouched registry writes
//! back byte-identical JSON.

use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("registry file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("a notebook named '{0}' already exists")]
    DuplicateName(String),
    #[error("'{0}' does not look like a notebook path (expected owner/slug)")]
    InvalidPath(String),
}

pub struct NotebookRegistry {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl NotebookRegistry {
    /// Load the registry from `path`. A missing file yields an empty map.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(file = %path.display(), entries = entries.len(), "registry loaded");
        Ok(Self { path, entries })
    }

    /// Write the current entries back to disk as pretty-printed JSON.
    pub fn save(&self) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut raw = serde_json::to_string_pretty(&self.entries)?;
        raw.push('\n');
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Register `name -> path` and persist. The path is only checked for an
    /// `owner/slug` shape, not for existence on Kaggle.
    pub fn add(&mut self, name: &str, path: &str) -> Result<(), RegistryError> {
        if !path.contains('/') {
            return Err(RegistryError::InvalidPath(path.to_string()));
        }
        if self.entries.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        self.entries
            .insert(name.to_string(), Value::String(path.to_string()));
        self.save()
    }

    /// Remove `name` and persist; returns the path it mapped to.
    pub fn remove(&mut self, name: &str) -> Result<Option<String>, RegistryError> {
        let removed = self
            .entries
            .remove(name)
            .and_then(|value| value.as_str().map(str::to_string));
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.entries
            .get(name)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.as_str().map(|path| (name.as_str(), path)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_in(dir: &TempDir) -> NotebookRegistry {
        NotebookRegistry::load(dir.path().join("notebooks.json")).unwrap()
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = registry_in(&temp);
        assert!(registry.is_empty());
    }

    #[test]
    fn add_and_remove_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        registry.add("sd-bot", "alice/stable-diffusion-bot").unwrap();
        assert_eq!(
            registry.get("sd-bot").as_deref(),
            Some("alice/stable-diffusion-bot")
        );

        // Reload from disk and remove
        let mut reloaded = registry_in(&temp);
        assert_eq!(reloaded.len(), 1);
        let removed = reloaded.remove("sd-bot").unwrap();
        assert_eq!(removed.as_deref(), Some("alice/stable-diffusion-bot"));
        assert!(registry_in(&temp).is_empty());
    }

    #[test]
    fn add_rejects_duplicate_name() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry.add("demo", "alice/demo-nb").unwrap();

        let err = registry.add("demo", "bob/other-nb").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "demo"));
        // The original mapping is untouched
        assert_eq!(registry.get("demo").as_deref(), Some("alice/demo-nb"));
    }

    #[test]
    fn add_rejects_path_without_separator() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let err = registry.add("demo", "not-a-path").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_unknown_name_is_none() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        assert!(registry.remove("ghost").unwrap().is_none());
    }

    #[test]
    fn save_of_loaded_registry_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notebooks.json");

        let mut registry = NotebookRegistry::load(&file).unwrap();
        registry.add("zeta", "alice/zeta-nb").unwrap();
        registry.add("alpha", "bob/alpha-nb").unwrap();
        registry.add("mid", "carol/mid-nb").unwrap();

        let before = std::fs::read(&file).unwrap();
        let reloaded = NotebookRegistry::load(&file).unwrap();
        reloaded.save().unwrap();
        let after = std::fs::read(&file).unwrap();

        assert_eq!(before, after);
        // Insertion order survives the round trip
        let names: Vec<&str> = reloaded.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notebooks.json");
        std::fs::write(&file, "not json").unwrap();
        assert!(matches!(
            NotebookRegistry::load(&file),
            Err(RegistryError::Malformed(_))
        ));
    }
}
