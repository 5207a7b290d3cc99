use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;

pub const API_KEYS_ENV: &str = "GEMINI_API_KEYS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub default_voice: String,
    pub default_aspect_ratio: String,
    pub default_quality: String,

    pub max_chars_per_line: usize,
    pub max_duration_per_line: f64,
    pub min_gap_between_lines: f64,

    pub title_duration: f64,
    pub title_fade: f64,
    pub slow_motion_factor: f64,

    pub music_volume: f64,
    pub voiceover_volume: f64,

    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub fps: u32,
    pub encoder_preset: String,
    pub encoder_threads: u32,

    pub tts_model: String,
    pub sample_rate: u32,
    pub max_retries: u32,
    pub max_concurrent_videos: usize,
    pub whisper_model: String,

    pub datasets_dir: Option<PathBuf>,
    pub exports_dir: Option<PathBuf>,
    pub api_keys: Option<Vec<String>>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            default_voice: "Puck".to_string(),
            default_aspect_ratio: "9:16".to_string(),
            default_quality: "high".to_string(),
            max_chars_per_line: 60,
            max_duration_per_line: 2.5,
            min_gap_between_lines: 1.5,
            title_duration: 4.0,
            title_fade: 0.5,
            slow_motion_factor: 0.7,
            music_volume: Self::DEFAULT_MUSIC_VOLUME,
            voiceover_volume: 1.0,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            video_bitrate: "5000k".to_string(),
            audio_bitrate: "192k".to_string(),
            fps: 30,
            encoder_preset: "medium".to_string(),
            encoder_threads: 4,
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            sample_rate: 24_000,
            max_retries: 3,
            max_concurrent_videos: 2,
            whisper_model: "tiny".to_string(),
            datasets_dir: None,
            exports_dir: None,
            api_keys: None,
        }
    }
}

documented_config!(VideoConfig {
    fields: [
        default_voice, "Narration voice used when --voice is not given",
        default_aspect_ratio, "Output aspect ratio used when --aspect is not given (9:16, 4:5, 16:9, 1:1)",
        default_quality, "Output quality used when --quality is not given (high or standard)",
        max_chars_per_line, "Maximum characters on one caption line",
        max_duration_per_line, "Maximum seconds one caption line stays on screen",
        min_gap_between_lines, "Pause in seconds that always starts a new caption line",
        title_duration, "Seconds the title card is shown before narration starts",
        title_fade, "Title fade in/out duration in seconds",
        slow_motion_factor, "Background playback speed (below 1.0 slows footage down)",
        music_volume, "Music bed gain relative to narration (0.0-1.0)",
        voiceover_volume, "Narration gain",
        video_codec, "ffmpeg video encoder",
        audio_codec, "ffmpeg audio encoder",
        video_bitrate, "Target video bitrate",
        audio_bitrate, "Target audio bitrate",
        fps, "Output frame rate",
        encoder_preset, "x264 preset",
        encoder_threads, "Encoder thread count",
        tts_model, "Gemini text-to-speech model",
        sample_rate, "Sample rate of synthesized narration in Hz",
        max_retries, "Speech synthesis attempts before giving up (rotating keys in between)",
        max_concurrent_videos, "Videos rendered at the same time during batch generation",
        whisper_model, "WhisperX model used for word timestamps",
    ],
    optional: [
        datasets_dir, "Directory containing footage/music dataset folders",
        exports_dir, "Directory rendered videos are written to",
        api_keys, "Gemini API keys (GEMINI_API_KEYS overrides this)",
    ],
    config_path: paths::config_dir().map(|dir| dir.join("video.toml")),
});

impl VideoConfig {
    pub const DEFAULT_MUSIC_VOLUME: f64 = 0.15;

    pub fn load() -> Result<Self> {
        Self::load_from_path(<Self as DocumentedConfig>::config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = <Self as DocumentedConfig>::load_from_path_documented(path.as_ref())?;
        Ok(config.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        self.save_with_documentation(&<Self as DocumentedConfig>::config_path()?)
    }

    /// Replace non-finite or out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !valid_gain(self.music_volume) {
            self.music_volume = defaults.music_volume;
        }
        if !valid_gain(self.voiceover_volume) {
            self.voiceover_volume = defaults.voiceover_volume;
        }
        if !positive(self.max_duration_per_line) {
            self.max_duration_per_line = defaults.max_duration_per_line;
        }
        if !positive(self.min_gap_between_lines) {
            self.min_gap_between_lines = defaults.min_gap_between_lines;
        }
        if !self.title_duration.is_finite() || self.title_duration < 0.0 {
            self.title_duration = defaults.title_duration;
        }
        if !self.title_fade.is_finite()
            || self.title_fade < 0.0
            || self.title_fade * 2.0 > self.title_duration
        {
            self.title_fade = defaults.title_fade.min(self.title_duration / 2.0);
        }
        if !positive(self.slow_motion_factor) {
            self.slow_motion_factor = defaults.slow_motion_factor;
        }
        if self.max_chars_per_line == 0 {
            self.max_chars_per_line = defaults.max_chars_per_line;
        }
        if self.fps == 0 {
            self.fps = defaults.fps;
        }
        if self.sample_rate == 0 {
            self.sample_rate = defaults.sample_rate;
        }
        if self.max_retries == 0 {
            self.max_retries = defaults.max_retries;
        }
        if self.max_concurrent_videos == 0 {
            self.max_concurrent_videos = defaults.max_concurrent_videos;
        }
        self
    }

    /// Keys from `GEMINI_API_KEYS` when set, otherwise from the config file.
    pub fn api_keys(&self) -> Vec<String> {
        let from_env = std::env::var(API_KEYS_ENV).ok();
        resolve_api_keys(from_env.as_deref(), self.api_keys.as_deref())
    }

    pub fn datasets_dir(&self) -> Result<PathBuf> {
        match &self.datasets_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::data_dir().map(|dir| dir.join("datasets")),
        }
    }

    pub fn exports_dir(&self) -> Result<PathBuf> {
        match &self.exports_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(dir.clone())
            }
            None => paths::exports_dir(),
        }
    }
}

fn valid_gain(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn resolve_api_keys(from_env: Option<&str>, from_config: Option<&[String]>) -> Vec<String> {
    let clean = |keys: Vec<String>| -> Vec<String> {
        keys.into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect()
    };

    if let Some(raw) = from_env {
        let keys = clean(raw.split(',').map(str::to_string).collect());
        if !keys.is_empty() {
            return keys;
        }
    }
    clean(from_config.map(<[String]>::to_vec).unwrap_or_default())
}
