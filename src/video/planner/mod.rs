//! Composition timeline planning.
//!
//! Given the narration length, the background footage and the output format, the planner
//! decides how footage is cropped, zoomed, slowed and looped, where the title card and the
//! captions sit on the timeline, and how narration and music are layered. The result is a
//! [`CompositionPlan`] that the renderer turns into one ffmpeg invocation.
//!
//! The planner is pure apart from the injected random source used for background offsets.
//! An unusable music bed is dropped with a warning; only unusable footage or narration
//! fails the plan.

pub mod audio;
pub mod background;
pub mod frame;

pub use audio::{AudioRole, AudioTrack};
pub use background::BackgroundSourcePlan;
pub use frame::{AspectRatio, CropRect, FrameAdaptation, Quality, TargetFrame};

use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;

use crate::ui::prelude::*;
use crate::video::captions::CaptionLine;
use crate::video::config::VideoConfig;
use crate::video::errors::PlanError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn within(&self, start: f64, end: f64) -> bool {
        self.start >= start && self.end <= end && self.start <= self.end
    }
}

/// Fixed timing and mixing policy, normally taken from [`VideoConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePolicy {
    pub title_duration: f64,
    pub title_fade: f64,
    pub slow_motion_factor: f64,
    pub narration_gain: f64,
    pub music_gain: f64,
    /// Shortest usable footage or music source: one output frame.
    pub min_source_duration: f64,
}

impl Default for TimelinePolicy {
    fn default() -> Self {
        Self::from_config(&VideoConfig::default())
    }
}

impl TimelinePolicy {
    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            title_duration: config.title_duration,
            title_fade: config.title_fade,
            slow_motion_factor: config.slow_motion_factor,
            narration_gain: config.voiceover_volume,
            music_gain: config.music_volume,
            min_source_duration: 1.0 / config.fps.max(1) as f64,
        }
    }
}

/// A media file together with its probed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub path: PathBuf,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootageSource {
    pub path: PathBuf,
    pub duration: f64,
    pub size: TargetFrame,
}

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub narration: MediaSource,
    pub background: FootageSource,
    pub music: Option<MediaSource>,
    pub title: Option<String>,
    /// Caption lines relative to narration start.
    pub captions: Vec<CaptionLine>,
    pub aspect: AspectRatio,
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleWindow {
    pub text: String,
    pub window: TimeWindow,
    pub fade: f64,
    pub font_size: u32,
    /// Text wider than this (in pixels) wraps onto more lines.
    pub wrap_width: u32,
    pub center_x: u32,
    pub center_y: u32,
}

/// Where and how big captions are drawn. The anchor is the top center of the text block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptionPlacement {
    pub anchor_x: u32,
    pub anchor_y: u32,
    pub font_size: u32,
    pub max_width: u32,
    pub outline: u32,
}

impl CaptionPlacement {
    pub fn for_frame(frame: TargetFrame, aspect: AspectRatio) -> Self {
        let mut font_size = (frame.height as f64 * 0.05) as u32;
        if aspect.is_tallest() {
            font_size = (font_size as f64 * 1.05) as u32;
        }
        Self {
            anchor_x: frame.width / 2,
            anchor_y: (frame.height as f64 * 0.85) as u32,
            font_size,
            max_width: (frame.width as f64 * 0.9) as u32,
            outline: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPlan {
    pub frame: TargetFrame,
    pub aspect: AspectRatio,
    pub background_source: PathBuf,
    pub background: BackgroundSourcePlan,
    pub title: Option<TitleWindow>,
    /// Seconds every caption and the narration are pushed back by.
    pub caption_offset: f64,
    /// Caption lines on the composition timeline.
    pub captions: Vec<CaptionLine>,
    pub caption_placement: CaptionPlacement,
    pub audio_tracks: Vec<AudioTrack>,
    pub total_duration: f64,
}

impl CompositionPlan {
    pub fn narration(&self) -> Option<&AudioTrack> {
        self.audio_tracks
            .iter()
            .find(|track| track.role == AudioRole::Narration)
    }

    pub fn music(&self) -> Option<&AudioTrack> {
        self.audio_tracks
            .iter()
            .find(|track| track.role == AudioRole::Music)
    }
}

pub struct TimelinePlanner {
    policy: TimelinePolicy,
}

impl TimelinePlanner {
    pub fn new(policy: TimelinePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TimelinePolicy {
        &self.policy
    }

    pub fn plan<R: Rng>(
        &self,
        request: &PlanRequest,
        rng: &mut R,
    ) -> Result<CompositionPlan, PlanError> {
        let narration = request.narration.duration;
        if !narration.is_finite() || narration <= 0.0 {
            return Err(PlanError::InvalidNarration(narration));
        }

        let target = TargetFrame::for_output(request.aspect, request.quality);
        let frame = frame::adapt_frame(request.background.size, target, request.aspect)?;
        let output = frame.output;

        let title_text = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty());
        let offset = if title_text.is_some() {
            self.policy.title_duration
        } else {
            0.0
        };
        let total_duration = narration + offset;

        let background = background::plan_background(
            frame,
            request.background.duration,
            total_duration,
            self.policy.slow_motion_factor,
            self.policy.min_source_duration,
            rng,
        )?;

        let title = title_text.map(|text| TitleWindow {
            text: text.to_string(),
            window: TimeWindow::new(0.0, offset),
            fade: self.policy.title_fade.min(offset / 2.0),
            font_size: (output.height as f64 * 0.08) as u32,
            wrap_width: (output.width as f64 * 0.8) as u32,
            center_x: output.width / 2,
            center_y: output.height / 2,
        });

        let captions = request
            .captions
            .iter()
            .map(|line| place_caption(line, offset, total_duration))
            .filter(|line| line.end > line.start)
            .collect();

        let mut audio_tracks = vec![audio::narration_track(
            request.narration.path.clone(),
            narration,
            self.policy.narration_gain,
            offset,
        )];
        if let Some(music) = &request.music {
            match audio::music_track(
                music.path.clone(),
                music.duration,
                self.policy.music_gain,
                total_duration,
                self.policy.min_source_duration,
            ) {
                Ok(track) => audio_tracks.push(track),
                Err(err) => emit(
                    Level::Warn,
                    "video.plan.music_dropped",
                    &format!("{err}; skipping {}", music.path.display()),
                    None,
                ),
            }
        }

        Ok(CompositionPlan {
            frame: output,
            aspect: request.aspect,
            background_source: request.background.path.clone(),
            background,
            title,
            caption_offset: offset,
            captions,
            caption_placement: CaptionPlacement::for_frame(output, request.aspect),
            audio_tracks,
            total_duration,
        })
    }
}

/// Shift a caption onto the composition timeline and keep it inside `[0, total]`.
fn place_caption(line: &CaptionLine, offset: f64, total: f64) -> CaptionLine {
    let shifted = line.shifted(offset);
    CaptionLine {
        text: shifted.text,
        start: shifted.start.clamp(0.0, total),
        end: shifted.end.clamp(0.0, total),
    }
}

#[cfg(test)]
mod tests;
