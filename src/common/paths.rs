use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for reelsmith
const APP_DIR: &str = "reelsmith";

fn ensure_dir(dir: PathBuf, what: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating {what} directory at {}", dir.display()))?;
    Ok(dir)
}

/// Directory holding `video.toml`
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join(APP_DIR);
    ensure_dir(dir, "config")
}

/// Persistent state (credential rotation index, default exports)
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join(APP_DIR);
    ensure_dir(dir, "data")
}

pub fn cache_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .context("Unable to determine user cache directory")?
        .join(APP_DIR);
    ensure_dir(dir, "cache")
}

pub fn exports_dir() -> Result<PathBuf> {
    ensure_dir(data_dir()?.join("exports"), "exports")
}

pub fn font_cache_dir() -> Result<PathBuf> {
    ensure_dir(cache_dir()?.join("fonts"), "font cache")
}

/// Parent of the per-run temporary work directories
pub fn work_root() -> Result<PathBuf> {
    ensure_dir(cache_dir()?.join("work"), "work")
}

pub fn credential_state_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("api_key_state.json"))
}
