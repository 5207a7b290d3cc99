use serde::Serialize;
use std::path::PathBuf;

use super::TimeWindow;
use crate::video::errors::PlanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioRole {
    Narration,
    Music,
}

/// An audio file placed on the composition timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrack {
    pub role: AudioRole,
    pub source: PathBuf,
    pub gain: f64,
    /// Where the track starts on the composition timeline.
    pub start_offset: f64,
    /// Times the source is repeated back to back before trimming.
    pub loop_count: u32,
    /// Part of the composition timeline this track occupies.
    pub window: TimeWindow,
}

pub fn narration_track(
    source: PathBuf,
    duration: f64,
    gain: f64,
    offset: f64,
) -> AudioTrack {
    AudioTrack {
        role: AudioRole::Narration,
        source,
        gain,
        start_offset: offset,
        loop_count: 1,
        window: TimeWindow::new(offset, offset + duration),
    }
}

/// Loop the music bed until it covers `total` seconds, trimmed to exactly `total`.
///
/// Beds shorter than `min_duration` (one output frame) are rejected.
pub fn music_track(
    source: PathBuf,
    duration: f64,
    gain: f64,
    total: f64,
    min_duration: f64,
) -> Result<AudioTrack, PlanError> {
    if !duration.is_finite() || duration < min_duration.max(f64::MIN_POSITIVE) {
        return Err(PlanError::EmptyMusic(duration));
    }

    Ok(AudioTrack {
        role: AudioRole::Music,
        source,
        gain,
        start_offset: 0.0,
        loop_count: (total / duration).floor() as u32 + 1,
        window: TimeWindow::new(0.0, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 30.0;

    #[test]
    fn narration_is_shifted_by_title() {
        let track = narration_track(PathBuf::from("voice.wav"), 10.0, 1.0, 4.0);
        assert_eq!(track.window, TimeWindow::new(4.0, 14.0));
        assert_eq!(track.loop_count, 1);
    }

    #[test]
    fn music_covers_whole_composition() {
        let track = music_track(PathBuf::from("bed.mp3"), 6.0, 0.15, 14.0, FRAME).unwrap();
        assert_eq!(track.loop_count, 3);
        assert_eq!(track.window, TimeWindow::new(0.0, 14.0));
        assert!(track.loop_count as f64 * 6.0 >= 14.0);
    }

    #[test]
    fn silent_music_is_rejected() {
        assert_eq!(
            music_track(PathBuf::from("bed.mp3"), 0.0, 0.15, 14.0, FRAME),
            Err(PlanError::EmptyMusic(0.0))
        );
        assert!(music_track(PathBuf::from("bed.mp3"), f64::NAN, 0.15, 14.0, FRAME).is_err());
    }

    #[test]
    fn music_shorter_than_a_frame_is_rejected() {
        assert_eq!(
            music_track(PathBuf::from("bed.mp3"), 1e-9, 0.15, 14.0, FRAME),
            Err(PlanError::EmptyMusic(1e-9))
        );
    }
}
