use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::captions::{
    FontResolver, HttpFontFetcher, SegmentLimits, WordTiming, cue_words, parse_srt, save_srt,
    segment, write_srt,
};
use super::cli::{
    ConfigCommands, DatasetsArgs, GenerateArgs, KeysCommands, SegmentArgs, SubtitlesArgs,
    VideoCommands, VoiceoverArgs,
};
use super::config::VideoConfig;
use super::datasets::DatasetCatalog;
use super::errors::ValidationError;
use super::pipeline::{GenerationRequest, Generator, Services, split_batch};
use super::render::FfmpegCompositor;
use super::render::ffmpeg::compiler::EncodeSettings;
use super::speech::{
    CancellationFlag, CredentialRotator, GeminiSynthesizer, SharedCredentials, Voice,
    synthesize_with_rotation,
};
use super::support::ffmpeg::{FfprobeProber, ensure_tool};
use super::support::utils::{canonicalize_existing, file_timestamp, has_extension};
use super::transcribe::{Transcriber, WhisperxTranscriber};
use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::ui::prelude::*;

/// Run one command. `Ok(false)` means the command ran but reported a failure.
pub async fn handle_video_command(command: VideoCommands, cancel: CancellationFlag) -> Result<bool> {
    match command {
        VideoCommands::Generate(args) => handle_generate(args, cancel).await,
        VideoCommands::Voiceover(args) => handle_voiceover(args, cancel).await,
        VideoCommands::Subtitles(args) => handle_subtitles(args).await,
        VideoCommands::Segment(args) => handle_segment(args),
        VideoCommands::Datasets(args) => handle_datasets(args),
        VideoCommands::Keys { command } => handle_keys(command),
        VideoCommands::Config { command } => handle_config(command),
    }
}

fn load_credentials(config: &VideoConfig) -> Result<(CredentialRotator, PathBuf)> {
    let state_path = paths::credential_state_path()?;
    let rotator =
        CredentialRotator::load(&state_path, config.api_keys(), &mut rand::thread_rng());
    Ok((rotator, state_path))
}

fn read_script(args: &GenerateArgs) -> Result<String> {
    match (&args.script, &args.script_file) {
        (_, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read script file {}", path.display())),
        (Some(script), None) => Ok(script.clone()),
        (None, None) => Err(ValidationError::EmptyScript.into()),
    }
}

async fn handle_generate(args: GenerateArgs, cancel: CancellationFlag) -> Result<bool> {
    let config = VideoConfig::load()?;
    let scripts = split_batch(&read_script(&args)?);
    if scripts.is_empty() {
        return Err(ValidationError::EmptyScript.into());
    }

    let voice = match args.voice {
        Some(voice) => voice,
        None => config.default_voice.parse()?,
    };
    let aspect_ratio = match args.aspect {
        Some(aspect) => aspect,
        None => config.default_aspect_ratio.parse()?,
    };
    let quality = match args.quality {
        Some(quality) => quality,
        None => config.default_quality.parse()?,
    };

    ensure_tool("ffprobe")?;
    if !args.dry_run {
        ensure_tool("ffmpeg")?;
    }

    let batch = scripts.len() > 1;
    let fonts_dir = paths::font_cache_dir()?;
    let compositor = FfmpegCompositor::system(
        EncodeSettings::from_config(&config),
        Some(fonts_dir.clone()),
    )
    .verbose(args.verbose)
    .quiet(batch);
    let (rotator, state_path) = load_credentials(&config)?;

    let services = Services {
        synthesizer: Arc::new(GeminiSynthesizer::new(
            config.tts_model.clone(),
            config.sample_rate,
        )?),
        transcriber: Arc::new(WhisperxTranscriber::new(config.whisper_model.clone())),
        prober: Arc::new(FfprobeProber),
        compositor: Arc::new(compositor),
        fonts: Arc::new(FontResolver::new(
            fonts_dir,
            Box::new(HttpFontFetcher::default()),
        )),
        credentials: Arc::new(SharedCredentials::new(rotator, Some(state_path))),
        cancel,
    };

    let catalog = DatasetCatalog::scan(&config.datasets_dir()?);
    let exports_dir = config.exports_dir()?;
    let generator = Generator::new(
        config,
        services,
        catalog,
        paths::work_root()?,
        exports_dir,
    )
    .dry_run(args.dry_run);

    let template = GenerationRequest {
        script: String::new(),
        voice,
        title: args.title,
        video_dataset: args.video_dataset,
        music_dataset: args.music_dataset,
        aspect_ratio,
        quality,
        output: args.out_file,
    };

    if batch {
        let (_, summary) = generator.generate_batch(scripts, &template).await;
        return Ok(summary.all_succeeded());
    }

    let Some(script) = scripts.into_iter().next() else {
        return Err(ValidationError::EmptyScript.into());
    };
    let outcome = generator
        .generate(GenerationRequest {
            script,
            ..template
        })
        .await;

    if outcome.success && args.dry_run {
        emit(
            Level::Info,
            "video.generate.dry_run",
            &outcome.message,
            serde_json::to_value(&outcome).ok(),
        );
    } else if outcome.success {
        emit(
            Level::Success,
            "video.generate.result",
            &format!(
                "Video saved to {}",
                outcome
                    .video_path
                    .as_deref()
                    .map(Path::display)
                    .map(|path| path.to_string())
                    .unwrap_or_default()
            ),
            serde_json::to_value(&outcome).ok(),
        );
    }
    Ok(outcome.success)
}

async fn handle_voiceover(args: VoiceoverArgs, cancel: CancellationFlag) -> Result<bool> {
    let config = VideoConfig::load()?;
    let voice: Voice = match args.voice {
        Some(voice) => voice,
        None => config.default_voice.parse()?,
    };
    let (rotator, state_path) = load_credentials(&config)?;
    let credentials = SharedCredentials::new(rotator, Some(state_path));
    let synthesizer = GeminiSynthesizer::new(config.tts_model.clone(), config.sample_rate)?;

    emit(
        Level::Info,
        "video.voiceover.start",
        &format!(
            "Generating voiceover with {} ({} characters)...",
            voice.description(),
            args.text.chars().count()
        ),
        None,
    );
    let audio = synthesize_with_rotation(
        &synthesizer,
        &credentials,
        &args.text,
        voice,
        config.max_retries,
        &cancel,
    )
    .await?;

    let output = match args.out_file {
        Some(path) => path,
        None => config
            .exports_dir()?
            .join(format!("voiceover_{voice}_{}.wav", file_timestamp())),
    };
    audio.write_wav(&output)?;

    emit(
        Level::Success,
        "video.voiceover.done",
        &format!(
            "Voiceover saved to {} ({:.1}s)",
            output.display(),
            audio.duration_seconds()
        ),
        Some(serde_json::json!({
            "path": output,
            "duration": audio.duration_seconds(),
        })),
    );
    Ok(true)
}

async fn handle_subtitles(args: SubtitlesArgs) -> Result<bool> {
    let config = VideoConfig::load()?;
    let audio = canonicalize_existing(&args.audio)
        .map_err(|_| ValidationError::MissingFile(args.audio.clone()))?;
    let output = args
        .out_file
        .unwrap_or_else(|| audio.with_extension("srt"));

    let transcriber = WhisperxTranscriber::new(config.whisper_model.clone());
    let language = args.language;
    let transcribe_audio = audio.clone();
    let words = tokio::task::spawn_blocking(move || {
        transcriber.transcribe(&transcribe_audio, language.as_deref())
    })
    .await
    .context("transcription task panicked")??;

    let lines = segment(&words, &SegmentLimits::from_config(&config));
    save_srt(&lines, &output)?;

    emit(
        Level::Success,
        "video.subtitles.done",
        &format!(
            "Wrote {} caption lines to {}",
            lines.len(),
            output.display()
        ),
        Some(serde_json::json!({ "path": output, "lines": lines.len() })),
    );
    Ok(true)
}

fn handle_segment(args: SegmentArgs) -> Result<bool> {
    let raw = fs::read_to_string(&args.words)
        .with_context(|| format!("Failed to read {}", args.words.display()))?;
    let words: Vec<WordTiming> = if has_extension(&args.words, &["srt"]) {
        let cues = parse_srt(&raw)
            .with_context(|| format!("{} is not a valid SRT file", args.words.display()))?;
        cue_words(&cues)
    } else {
        serde_json::from_str(&raw).with_context(|| {
            format!("{} is not a JSON array of word timings", args.words.display())
        })?
    };

    let defaults = VideoConfig::load()
        .map(|config| SegmentLimits::from_config(&config))
        .unwrap_or_default();
    let limits = SegmentLimits {
        max_chars: args.max_chars.unwrap_or(defaults.max_chars),
        max_duration: args.max_duration.unwrap_or(defaults.max_duration),
        min_gap: args.min_gap.unwrap_or(defaults.min_gap),
    };
    if limits.max_chars == 0 || limits.max_duration <= 0.0 || limits.min_gap < 0.0 {
        bail!("segment limits must be positive");
    }

    let lines = segment(&words, &limits);
    match args.out_file {
        Some(path) => {
            save_srt(&lines, &path)?;
            emit(
                Level::Success,
                "video.segment.done",
                &format!("Wrote {} caption lines to {}", lines.len(), path.display()),
                None,
            );
        }
        None => print!("{}", write_srt(&lines)),
    }
    Ok(true)
}

fn handle_datasets(args: DatasetsArgs) -> Result<bool> {
    let base = match args.dir {
        Some(dir) => dir,
        None => VideoConfig::load()?.datasets_dir()?,
    };
    let catalog = DatasetCatalog::scan(&base);

    if catalog.is_empty() {
        emit(
            Level::Warn,
            "video.datasets.empty",
            &format!("No datasets found in {}", base.display()),
            None,
        );
        return Ok(true);
    }

    for dataset in &catalog.datasets {
        emit(
            Level::Info,
            "video.datasets.entry",
            &format!(
                "{:<24} {:>4} videos {:>4} music  {}",
                dataset.name,
                dataset.videos.len(),
                dataset.music.len(),
                dataset.path.display()
            ),
            Some(serde_json::json!({
                "name": dataset.name,
                "path": dataset.path,
                "videos": dataset.videos.len(),
                "music": dataset.music.len(),
            })),
        );
    }
    Ok(true)
}

fn handle_keys(command: KeysCommands) -> Result<bool> {
    let config = VideoConfig::load()?;
    let (mut rotator, state_path) = load_credentials(&config)?;
    if rotator.is_empty() {
        bail!("No Gemini API keys configured (set GEMINI_API_KEYS or api_keys in video.toml)");
    }

    match command {
        KeysCommands::Status => {}
        KeysCommands::Next => {
            rotator.advance();
            rotator.save(&state_path)?;
        }
        KeysCommands::Reset => {
            rotator.reset(&mut rand::thread_rng());
            rotator.save(&state_path)?;
        }
    }

    if let Some(status) = rotator.status() {
        emit(
            Level::Info,
            "video.keys.status",
            &format!(
                "Using API key {}/{}: {}",
                status.index, status.total, status.masked_key
            ),
            serde_json::to_value(&status).ok(),
        );
    }
    Ok(true)
}

fn handle_config(command: ConfigCommands) -> Result<bool> {
    let path = <VideoConfig as DocumentedConfig>::config_path()?;
    match command {
        ConfigCommands::Path => {
            emit(
                Level::Info,
                "video.config.path",
                &path.display().to_string(),
                Some(serde_json::json!({ "path": path })),
            );
        }
        ConfigCommands::Show => {
            let config = VideoConfig::load()?;
            for field in VideoConfig::field_metadata() {
                let value = match config.field_literal(field.name) {
                    Some(value) => value,
                    None if field.is_optional => "(unset)".to_string(),
                    None => continue,
                };
                emit(
                    Level::Info,
                    "video.config.field",
                    &format!("{} = {}", field.name, value),
                    Some(serde_json::json!({
                        "name": field.name,
                        "value": value,
                        "description": field.description,
                        "optional": field.is_optional,
                    })),
                );
            }
        }
    }
    Ok(true)
}
