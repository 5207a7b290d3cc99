//! One script in, one captioned video out.
//!
//! Each composition runs its stages in order inside its own work directory: synthesize
//! narration, transcribe it into timed words, segment captions, pick and probe media,
//! plan the timeline, write the caption overlay script and render.

mod batch;
mod report;

pub use batch::{BatchSummary, split_batch};

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ui::prelude::*;
use crate::video::captions::{
    CaptionLine, CaptionRenderer, FontResolver, SegmentLimits, save_srt, segment,
    write_ass_script,
};
use crate::video::config::VideoConfig;
use crate::video::datasets::{DatasetCatalog, MediaKind, pick_random};
use crate::video::errors::ValidationError;
use crate::video::planner::{
    AspectRatio, CompositionPlan, MediaSource, PlanRequest, Quality, TimelinePlanner,
    TimelinePolicy,
};
use crate::video::render::{Compositor, format_command};
use crate::video::speech::{
    CancellationFlag, SharedCredentials, SpeechSynthesizer, Voice, estimate_narration_seconds,
    synthesize_with_rotation,
};
use crate::video::support::ffmpeg::MediaProber;
use crate::video::support::utils::file_timestamp;
use crate::video::transcribe::Transcriber;

const VOICEOVER_FILE: &str = "voiceover.wav";
const SUBTITLES_SRT: &str = "subtitles.srt";
const SUBTITLES_JSON: &str = "subtitles.json";
const CAPTIONS_ASS: &str = "captions.ass";

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub script: String,
    pub voice: Voice,
    pub title: Option<String>,
    /// Dataset directory or name to take footage from.
    pub video_dataset: Option<PathBuf>,
    pub music_dataset: Option<PathBuf>,
    pub aspect_ratio: AspectRatio,
    pub quality: Quality,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOutcome {
    pub success: bool,
    pub video_path: Option<PathBuf>,
    pub message: String,
    /// Rendered length in seconds.
    pub duration: Option<f64>,
    pub subtitle_count: usize,
    pub voiceover_path: Option<PathBuf>,
    pub subtitles_path: Option<PathBuf>,
}

impl GenerationOutcome {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            ..Self::default()
        }
    }
}

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct Services {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub prober: Arc<dyn MediaProber>,
    pub compositor: Arc<dyn Compositor>,
    pub fonts: Arc<FontResolver>,
    pub credentials: Arc<SharedCredentials>,
    pub cancel: CancellationFlag,
}

pub struct Generator {
    config: VideoConfig,
    services: Services,
    catalog: DatasetCatalog,
    work_root: PathBuf,
    exports_dir: PathBuf,
    dry_run: bool,
}

impl Generator {
    pub fn new(
        config: VideoConfig,
        services: Services,
        catalog: DatasetCatalog,
        work_root: PathBuf,
        exports_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            services,
            catalog,
            work_root,
            exports_dir,
            dry_run: false,
        }
    }

    /// Plan and print the render command without calling the speech service or ffmpeg.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn default_output(&self) -> PathBuf {
        self.exports_dir
            .join(format!("video_{}.mp4", file_timestamp()))
    }

    /// Run one composition. Failures are reported in the outcome, never returned.
    pub async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        let output = request
            .output
            .clone()
            .unwrap_or_else(|| self.default_output());

        match self.generate_inner(&request, &output).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = format!("{err:#}");
                emit(
                    Level::Error,
                    "video.generate.failed",
                    &format!("Video generation failed: {message}"),
                    None,
                );
                GenerationOutcome::failed(message)
            }
        }
    }

    async fn generate_inner(
        &self,
        request: &GenerationRequest,
        output: &Path,
    ) -> Result<GenerationOutcome> {
        if request.script.trim().is_empty() {
            return Err(ValidationError::EmptyScript.into());
        }

        fs::create_dir_all(&self.work_root).with_context(|| {
            format!(
                "Failed to create work directory {}",
                self.work_root.display()
            )
        })?;
        let work_dir = tempfile::Builder::new()
            .prefix("reelsmith-")
            .tempdir_in(&self.work_root)
            .context("Failed to create per-run work directory")?;
        let mut rng = StdRng::from_entropy();

        let voiceover_path = work_dir.path().join(VOICEOVER_FILE);
        let (narration, captions) = if self.dry_run {
            let estimate = estimate_narration_seconds(&request.script);
            emit(
                Level::Info,
                "video.generate.estimate",
                &format!("Estimated narration length: {estimate:.1}s"),
                None,
            );
            (
                MediaSource {
                    path: voiceover_path.clone(),
                    duration: estimate,
                },
                Vec::new(),
            )
        } else {
            let narration = self.narrate(request, &voiceover_path).await?;
            let captions = self.caption(&voiceover_path, work_dir.path()).await?;
            (narration, captions)
        };

        let subtitles_path = work_dir.path().join(SUBTITLES_SRT);
        save_srt(&captions, &subtitles_path)?;
        fs::write(
            work_dir.path().join(SUBTITLES_JSON),
            serde_json::to_string_pretty(&captions)?,
        )
        .context("Failed to write subtitles.json")?;

        let plan_request = self
            .plan_request(request, narration, captions, &mut rng)
            .await?;
        let planner = TimelinePlanner::new(TimelinePolicy::from_config(&self.config));
        let plan = planner.plan(&plan_request, &mut rng)?;
        emit(
            Level::Debug,
            "video.generate.plan",
            &format!(
                "Planned {:.2}s at {} ({} captions, {} audio tracks)",
                plan.total_duration,
                plan.frame,
                plan.captions.len(),
                plan.audio_tracks.len()
            ),
            serde_json::to_value(&plan).ok(),
        );

        let ass_path = work_dir.path().join(CAPTIONS_ASS);
        self.write_overlays(&plan, &ass_path).await?;

        if self.dry_run {
            let args = self
                .services
                .compositor
                .command(&plan, Some(&ass_path), output)?;
            let work_path = work_dir.keep();
            return Ok(GenerationOutcome {
                success: true,
                video_path: None,
                message: format_command(&args),
                duration: Some(plan.total_duration),
                subtitle_count: plan.captions.len(),
                voiceover_path: None,
                subtitles_path: Some(work_path.join(SUBTITLES_SRT)),
            });
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        emit(
            Level::Info,
            "video.generate.render",
            &format!("Rendering {}...", output.display()),
            None,
        );
        let compositor = Arc::clone(&self.services.compositor);
        let total_duration = plan.total_duration;
        let subtitle_count = plan.captions.len();
        let render_output = output.to_path_buf();
        let render_ass = ass_path.clone();
        tokio::task::spawn_blocking(move || {
            compositor.render(&plan, Some(&render_ass), &render_output)
        })
        .await
        .context("render task panicked")??;

        let (voiceover_path, subtitles_path) =
            keep_sidecars(output, &voiceover_path, &subtitles_path)?;

        emit(
            Level::Success,
            "video.generate.done",
            &format!("Created {} ({total_duration:.1}s)", output.display()),
            None,
        );

        Ok(GenerationOutcome {
            success: true,
            video_path: Some(output.to_path_buf()),
            message: "Video generated successfully".to_string(),
            duration: Some(total_duration),
            subtitle_count,
            voiceover_path: Some(voiceover_path),
            subtitles_path: Some(subtitles_path),
        })
    }

    async fn narrate(&self, request: &GenerationRequest, path: &Path) -> Result<MediaSource> {
        emit(
            Level::Info,
            "video.generate.voiceover",
            &format!("Generating voiceover with {}...", request.voice.description()),
            None,
        );
        let audio = synthesize_with_rotation(
            self.services.synthesizer.as_ref(),
            &self.services.credentials,
            &request.script,
            request.voice,
            self.config.max_retries,
            &self.services.cancel,
        )
        .await?;
        audio.write_wav(path)?;

        Ok(MediaSource {
            path: path.to_path_buf(),
            duration: audio.duration_seconds(),
        })
    }

    async fn caption(&self, voiceover: &Path, work_dir: &Path) -> Result<Vec<CaptionLine>> {
        emit(
            Level::Info,
            "video.generate.transcribe",
            "Transcribing voiceover for captions...",
            None,
        );
        let transcriber = Arc::clone(&self.services.transcriber);
        let audio = voiceover.to_path_buf();
        let words = tokio::task::spawn_blocking(move || transcriber.transcribe(&audio, None))
            .await
            .context("transcription task panicked")??;

        let lines = segment(&words, &SegmentLimits::from_config(&self.config));
        emit(
            Level::Info,
            "video.generate.captions",
            &format!(
                "Segmented {} words into {} caption lines",
                words.len(),
                lines.len()
            ),
            None,
        );
        fs::write(
            work_dir.join("words.json"),
            serde_json::to_string_pretty(&words)?,
        )
        .context("Failed to write words.json")?;
        Ok(lines)
    }

    async fn plan_request(
        &self,
        request: &GenerationRequest,
        narration: MediaSource,
        captions: Vec<CaptionLine>,
        rng: &mut StdRng,
    ) -> Result<PlanRequest> {
        let footage_dataset = self
            .catalog
            .select(request.video_dataset.as_deref(), MediaKind::Video)?
            .with_context(|| {
                format!(
                    "No background footage found in {}",
                    self.catalog.base.display()
                )
            })?;
        let footage_path = pick_random(&footage_dataset.videos, rng)
            .context("background dataset is empty")?
            .to_path_buf();
        emit(
            Level::Info,
            "video.generate.footage",
            &format!("Selected background: {}", footage_path.display()),
            None,
        );

        let music_path = match self
            .catalog
            .select(request.music_dataset.as_deref(), MediaKind::Music)
        {
            Ok(Some(dataset)) => pick_random(&dataset.music, rng).map(Path::to_path_buf),
            Ok(None) => None,
            Err(err) => {
                emit(
                    Level::Warn,
                    "video.generate.music_unavailable",
                    &format!("{err}; continuing without music"),
                    None,
                );
                None
            }
        };
        match &music_path {
            Some(path) => emit(
                Level::Info,
                "video.generate.music",
                &format!("Selected music: {}", path.display()),
                None,
            ),
            None => emit(
                Level::Warn,
                "video.generate.no_music",
                "No music found; the video will only have narration",
                None,
            ),
        }

        let prober = Arc::clone(&self.services.prober);
        let (background, music) = tokio::task::spawn_blocking(move || -> Result<_> {
            let background = prober.footage(&footage_path)?;
            let music = music_path.and_then(|path| match prober.media(&path) {
                Ok(music) => Some(music),
                Err(err) => {
                    emit(
                        Level::Warn,
                        "video.generate.music_unreadable",
                        &format!("Could not probe {}: {err:#}; continuing without music", path.display()),
                        None,
                    );
                    None
                }
            });
            Ok((background, music))
        })
        .await
        .context("probe task panicked")??;

        if background.duration <= 0.0 || !background.duration.is_finite() {
            bail!(
                "background footage {} has no usable duration",
                background.path.display()
            );
        }

        Ok(PlanRequest {
            narration,
            background,
            music,
            title: request.title.clone(),
            captions,
            aspect: request.aspect_ratio,
            quality: request.quality,
        })
    }

    async fn write_overlays(&self, plan: &CompositionPlan, path: &Path) -> Result<()> {
        let renderer = CaptionRenderer::new(&self.services.fonts);
        let captions = renderer
            .captions(&plan.captions, &plan.caption_placement)
            .await;
        let title = match &plan.title {
            Some(window) => Some(renderer.title(window).await),
            None => None,
        };

        let script = write_ass_script(plan.frame, title.as_ref(), &captions);
        fs::write(path, script)
            .with_context(|| format!("Failed to write caption overlay {}", path.display()))
    }
}

/// Move the narration and captions next to the rendered video before the work directory
/// is cleaned up.
fn keep_sidecars(output: &Path, voiceover: &Path, subtitles: &Path) -> Result<(PathBuf, PathBuf)> {
    let voiceover_target = output.with_extension("wav");
    let subtitles_target = output.with_extension("srt");
    fs::copy(voiceover, &voiceover_target)
        .with_context(|| format!("Failed to keep voiceover at {}", voiceover_target.display()))?;
    fs::copy(subtitles, &subtitles_target)
        .with_context(|| format!("Failed to keep subtitles at {}", subtitles_target.display()))?;
    Ok((voiceover_target, subtitles_target))
}
