use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::ui::prelude::*;

/// Round-robin position over the configured API keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRotator {
    keys: Vec<String>,
    index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationStatus {
    /// 1-based position of the current key.
    pub index: usize,
    pub total: usize,
    pub masked_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RotationState {
    index: usize,
}

impl CredentialRotator {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, index: 0 }
    }

    pub fn with_index(keys: Vec<String>, index: usize) -> Self {
        let index = if keys.is_empty() { 0 } else { index % keys.len() };
        Self { keys, index }
    }

    /// Restore the persisted position, or start at a random key when the state file is
    /// missing, unreadable or points past the end of `keys`.
    pub fn load<R: Rng>(path: &Path, keys: Vec<String>, rng: &mut R) -> Self {
        let saved = fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str::<RotationState>(&raw).ok())
            .map(|state| state.index)
            .filter(|&index| index < keys.len());

        let mut rotator = Self::new(keys);
        match saved {
            Some(index) => rotator.index = index,
            None => rotator.reset(rng),
        }
        rotator
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating state directory {}", parent.display()))?;
        }
        let state = serde_json::to_string(&RotationState { index: self.index })?;
        fs::write(path, state)
            .with_context(|| format!("writing key rotation state to {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.keys.get(self.index).map(String::as_str)
    }

    /// Move to the next key, wrapping around.
    pub fn advance(&mut self) -> Option<&str> {
        if !self.keys.is_empty() {
            self.index = (self.index + 1) % self.keys.len();
        }
        self.current()
    }

    /// Start over at a random key.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.index = if self.keys.is_empty() {
            0
        } else {
            rng.gen_range(0..self.keys.len())
        };
    }

    pub fn status(&self) -> Option<RotationStatus> {
        self.current().map(|key| RotationStatus {
            index: self.index + 1,
            total: self.keys.len(),
            masked_key: mask_key(key),
        })
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(10).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

/// A rotator shared by concurrent compositions, saved after every rotation.
#[derive(Debug)]
pub struct SharedCredentials {
    rotator: Mutex<CredentialRotator>,
    state_path: Option<PathBuf>,
}

impl SharedCredentials {
    pub fn new(rotator: CredentialRotator, state_path: Option<PathBuf>) -> Self {
        Self {
            rotator: Mutex::new(rotator),
            state_path,
        }
    }

    pub fn current(&self) -> Option<String> {
        self.lock().current().map(str::to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Switch to the next key after `failed_key` was rejected. When another composition
    /// already rotated away from it, the current key is kept.
    pub fn rotate_from(&self, failed_key: &str) {
        let mut rotator = self.lock();
        if rotator.current() != Some(failed_key) {
            return;
        }
        rotator.advance();

        if let Some(status) = rotator.status() {
            emit(
                Level::Warn,
                "video.speech.key_rotated",
                &format!(
                    "Rotated to API key {}/{} ({})",
                    status.index, status.total, status.masked_key
                ),
                None,
            );
        }

        if let Some(path) = &self.state_path
            && let Err(err) = rotator.save(path)
        {
            emit(
                Level::Warn,
                "video.speech.key_state_failed",
                &format!("Failed to persist key rotation: {err:#}"),
                None,
            );
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CredentialRotator> {
        self.rotator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
