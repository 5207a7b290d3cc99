//! Word-level transcription of synthesized narration.

use anyhow::{Context, Result};
use duct::cmd;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::ui::prelude::{Level, emit};
use crate::video::captions::WordTiming;
use crate::video::support::WHISPERX_UVX_ARGS;
use crate::video::support::ffmpeg::ensure_tool;
use crate::video::support::utils::canonicalize_existing;

pub trait Transcriber: Send + Sync {
    /// Timed words of `audio`, in spoken order.
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<WordTiming>>;
}

/// Runs WhisperX through `uvx` and reads back its JSON output.
#[derive(Debug, Clone)]
pub struct WhisperxTranscriber {
    model: String,
}

impl WhisperxTranscriber {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    fn run_whisperx(&self, audio: &Path, output_dir: &Path, language: Option<&str>) -> Result<()> {
        let audio = audio.to_string_lossy();
        let output_dir = output_dir.to_string_lossy();

        let mut args: Vec<&str> = WHISPERX_UVX_ARGS.to_vec();
        args.extend([
            "whisperx",
            &*audio,
            "--output_format",
            "json",
            "--output_dir",
            &*output_dir,
            "--model",
            self.model.as_str(),
            "--compute_type",
            "int8",
        ]);
        if let Some(language) = language {
            args.push("--language");
            args.push(language);
        }

        cmd("uvx", &args)
            .stdout_null()
            .run()
            .with_context(|| format!("Failed to run WhisperX for {}", audio))?;
        Ok(())
    }
}

impl Transcriber for WhisperxTranscriber {
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<WordTiming>> {
        let audio = canonicalize_existing(audio)?;
        ensure_tool("uvx")?;
        // One directory per call: WhisperX names its output after the input file.
        let output_dir = tempfile::Builder::new()
            .prefix("reelsmith-whisperx-")
            .tempdir()
            .context("Failed to create transcript directory")?;

        emit(
            Level::Info,
            "video.transcribe.start",
            &format!("Transcribing {} with WhisperX ({})...", audio.display(), self.model),
            None,
        );
        self.run_whisperx(&audio, output_dir.path(), language)?;

        let stem = audio
            .file_stem()
            .context("audio file has no name")?
            .to_string_lossy();
        let transcript_path = output_dir.path().join(format!("{stem}.json"));
        if !transcript_path.exists() {
            anyhow::bail!(
                "WhisperX did not produce the expected transcript at {}",
                transcript_path.display()
            );
        }

        let contents = fs::read_to_string(&transcript_path)
            .with_context(|| format!("Failed to read {}", transcript_path.display()))?;
        let words = parse_whisperx_json(&contents)?;

        emit(
            Level::Success,
            "video.transcribe.success",
            &format!("Transcribed {} words", words.len()),
            Some(serde_json::json!({ "words": words.len() })),
        );
        Ok(words)
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
    // Fallback if words are missing (e.g. no alignment)
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    // WhisperX leaves numerals and symbols unaligned.
    start: Option<f64>,
    end: Option<f64>,
}

pub fn parse_whisperx_json(json_str: &str) -> Result<Vec<WordTiming>> {
    let output: WhisperOutput =
        serde_json::from_str(json_str).context("Failed to parse WhisperX JSON output")?;

    let mut words = Vec::new();
    let mut previous_end = 0.0_f64;

    for segment in output.segments {
        if segment.words.is_empty() {
            let text = segment.text.trim();
            if !text.is_empty() {
                words.push(WordTiming::new(text, segment.start, segment.end));
                previous_end = segment.end;
            }
            continue;
        }

        for word in segment.words {
            let text = word.word.trim();
            if text.is_empty() {
                continue;
            }
            let start = word.start.unwrap_or(previous_end);
            let end = word.end.unwrap_or(previous_end).max(start);
            words.push(WordTiming::new(text, start, end));
            previous_end = end;
        }
    }

    Ok(words)
}
