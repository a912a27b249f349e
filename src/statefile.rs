//! Persistent per-context state store.
//!
//! A two-level `{section -> {key -> value}}` mapping stored as YAML at
//! `<context>/.simdock/state.yaml`. The file is created lazily on the first
//! write; reads of a missing file behave like an empty store. The on-disk
//! syntax is an internal contract between simdock versions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const STATE_DIR: &str = ".simdock";
pub const STATE_FILE: &str = "state.yaml";

pub struct StateFile {
    path: PathBuf,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl StateFile {
    /// Open the store for a context directory.
    pub fn open_in(context_dir: &Path) -> Result<Self> {
        Self::open(context_dir.join(STATE_DIR).join(STATE_FILE))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let sections = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file {}", path.display()))?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&text).with_context(|| {
                    format!("state file {} is not a two-level mapping", path.display())
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(StateFile { path, sections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Set one key and persist.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Remove one key; persists only when something actually changed, so a
    /// remove against an absent store never creates the file.
    pub fn remove(&mut self, section: &str, key: &str) -> Result<()> {
        let removed = self
            .sections
            .get_mut(section)
            .map(|s| s.remove(key).is_some())
            .unwrap_or(false);
        if removed {
            self.save()?;
        }
        Ok(())
    }

    /// Drop a whole section; no-op when absent.
    pub fn remove_section(&mut self, section: &str) -> Result<()> {
        if self.sections.remove(section).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_yaml::to_string(&self.sections).context("failed to encode state file")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write state file {}", self.path.display()))?;
        Ok(())
    }
}
