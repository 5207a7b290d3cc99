//! Background footage and music discovery.
//!
//! A dataset is one sub-directory of the datasets base directory. Scanning produces a
//! snapshot; picking a random file from it is a separate step so both can be tested on
//! their own.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ui::prelude::*;
use crate::video::errors::ValidationError;
use crate::video::support::utils::has_extension;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
pub const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Music,
}

impl MediaKind {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => VIDEO_EXTENSIONS,
            MediaKind::Music => MUSIC_EXTENSIONS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Music => "music",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub path: PathBuf,
    pub videos: Vec<PathBuf>,
    pub music: Vec<PathBuf>,
}

impl Dataset {
    /// Collect media files below `path`, recursively, sorted by path.
    pub fn from_directory(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut videos = Vec::new();
        let mut music = Vec::new();
        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let file = entry.into_path();
            if has_extension(&file, VIDEO_EXTENSIONS) {
                videos.push(file);
            } else if has_extension(&file, MUSIC_EXTENSIONS) {
                music.push(file);
            }
        }
        videos.sort();
        music.sort();

        Self {
            name,
            path: path.to_path_buf(),
            videos,
            music,
        }
    }

    pub fn files(&self, kind: MediaKind) -> &[PathBuf] {
        match kind {
            MediaKind::Video => &self.videos,
            MediaKind::Music => &self.music,
        }
    }

    /// Number of usable files of `kind`, or an error when there are none.
    pub fn validate(&self, kind: MediaKind) -> Result<usize, ValidationError> {
        match self.files(kind).len() {
            0 => Err(ValidationError::EmptyDataset {
                dataset: self.name.clone(),
                kind: kind.label(),
            }),
            count => Ok(count),
        }
    }
}

/// Snapshot of every dataset below one base directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetCatalog {
    pub base: PathBuf,
    pub datasets: Vec<Dataset>,
}

impl DatasetCatalog {
    pub fn scan(base: &Path) -> Self {
        if !base.is_dir() {
            emit(
                Level::Warn,
                "video.datasets.missing",
                &format!("Datasets directory {} does not exist", base.display()),
                None,
            );
            return Self {
                base: base.to_path_buf(),
                datasets: Vec::new(),
            };
        }

        let mut dirs: Vec<PathBuf> = WalkDir::new(base)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();
        dirs.sort();

        let datasets: Vec<Dataset> = dirs
            .iter()
            .map(|dir| Dataset::from_directory(dir))
            .filter(|dataset| !dataset.videos.is_empty() || !dataset.music.is_empty())
            .collect();

        emit(
            Level::Debug,
            "video.datasets.scanned",
            &format!(
                "Found {} datasets in {}",
                datasets.len(),
                base.display()
            ),
            None,
        );

        Self {
            base: base.to_path_buf(),
            datasets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|dataset| dataset.name == name)
    }

    pub fn first_with(&self, kind: MediaKind) -> Option<&Dataset> {
        self.datasets
            .iter()
            .find(|dataset| !dataset.files(kind).is_empty())
    }

    /// The dataset to draw `kind` files from: `explicit` as a directory or a dataset name
    /// when given, otherwise the first dataset that has such files.
    pub fn select(
        &self,
        explicit: Option<&Path>,
        kind: MediaKind,
    ) -> Result<Option<Dataset>, ValidationError> {
        let Some(explicit) = explicit else {
            return Ok(self.first_with(kind).cloned());
        };

        let dataset = if explicit.is_dir() {
            Dataset::from_directory(explicit)
        } else if let Some(dataset) = self.find(&explicit.to_string_lossy()) {
            dataset.clone()
        } else {
            return Err(ValidationError::MissingFile(explicit.to_path_buf()));
        };

        dataset.validate(kind)?;
        Ok(Some(dataset))
    }
}

pub fn pick_random<'a, R: Rng>(files: &'a [PathBuf], rng: &mut R) -> Option<&'a Path> {
    files.choose(rng).map(PathBuf::as_path)
}
