use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::video::errors::{PlanError, ValidationError};

/// Relative aspect difference below which footage is only resized.
const ASPECT_TOLERANCE: f64 = 0.01;
/// Extra zoom applied to portrait outputs before re-cropping to size.
pub const PORTRAIT_ZOOM: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum AspectRatio {
    #[value(name = "9:16", alias = "9x16")]
    #[serde(rename = "9:16")]
    Vertical,
    #[value(name = "4:5", alias = "4x5")]
    #[serde(rename = "4:5")]
    Portrait,
    #[value(name = "16:9", alias = "16x9")]
    #[serde(rename = "16:9")]
    Landscape,
    #[value(name = "1:1", alias = "1x1")]
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Vertical,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Square,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9:16",
            AspectRatio::Portrait => "4:5",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }

    /// Width divided by height.
    pub fn value(self) -> f64 {
        match self {
            AspectRatio::Vertical => 9.0 / 16.0,
            AspectRatio::Portrait => 4.0 / 5.0,
            AspectRatio::Landscape => 16.0 / 9.0,
            AspectRatio::Square => 1.0,
        }
    }

    /// Portrait outputs get the extra zoom-in.
    pub fn is_portrait(self) -> bool {
        matches!(self, AspectRatio::Vertical | AspectRatio::Portrait)
    }

    /// The tallest ratio gets slightly larger captions.
    pub fn is_tallest(self) -> bool {
        self == AspectRatio::Vertical
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('x', ":");
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownAspectRatio(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 1080p
    High,
    /// 720p
    Standard,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Standard => "standard",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.trim_end_matches(" quality") {
            "high" | "1080p" => Ok(Quality::High),
            "standard" | "720p" => Ok(Quality::Standard),
            _ => Err(ValidationError::UnknownQuality(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetFrame {
    pub width: u32,
    pub height: u32,
}

impl TargetFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn for_output(aspect: AspectRatio, quality: Quality) -> Self {
        let (width, height) = match (aspect, quality) {
            (AspectRatio::Vertical, Quality::High) => (1080, 1920),
            (AspectRatio::Vertical, Quality::Standard) => (720, 1280),
            (AspectRatio::Portrait, Quality::High) => (1080, 1350),
            (AspectRatio::Portrait, Quality::Standard) => (720, 900),
            (AspectRatio::Landscape, Quality::High) => (1920, 1080),
            (AspectRatio::Landscape, Quality::Standard) => (1280, 720),
            (AspectRatio::Square, Quality::High) => (1080, 1080),
            (AspectRatio::Square, Quality::Standard) => (720, 720),
        };
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Both dimensions rounded down to even numbers, as the encoder requires.
    pub fn even(self) -> Self {
        Self {
            width: even(self.width),
            height: even(self.height),
        }
    }
}

impl fmt::Display for TargetFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// How raw footage pixels map onto the output frame: optional centered crop to the
/// target aspect, resize to `output`, then for cropped portrait footage a zoom to `zoomed`
/// and a centered crop back to `output`. Footage already in the target aspect is only
/// resized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameAdaptation {
    pub crop: Option<CropRect>,
    pub output: TargetFrame,
    pub zoom_factor: f64,
    pub zoomed: Option<TargetFrame>,
}

pub fn even(value: u32) -> u32 {
    value - value % 2
}

pub fn adapt_frame(
    source: TargetFrame,
    target: TargetFrame,
    aspect: AspectRatio,
) -> Result<FrameAdaptation, PlanError> {
    let output = target.even();
    for frame in [source, output] {
        if frame.width == 0 || frame.height == 0 {
            return Err(PlanError::InvalidFrame {
                width: frame.width,
                height: frame.height,
            });
        }
    }

    let source_aspect = source.aspect();
    let target_aspect = output.aspect();
    let crop = if ((source_aspect - target_aspect) / target_aspect).abs() < ASPECT_TOLERANCE {
        None
    } else {
        Some(center_crop(source, target_aspect))
    };

    let (zoom_factor, zoomed) = if crop.is_some() && aspect.is_portrait() {
        let zoomed = TargetFrame::new(
            (output.width as f64 * PORTRAIT_ZOOM).round() as u32,
            (output.height as f64 * PORTRAIT_ZOOM).round() as u32,
        )
        .even();
        (PORTRAIT_ZOOM, Some(zoomed))
    } else {
        (1.0, None)
    };

    Ok(FrameAdaptation {
        crop,
        output,
        zoom_factor,
        zoomed,
    })
}

/// Crop the longer dimension (relative to the target aspect), keeping the center.
fn center_crop(source: TargetFrame, target_aspect: f64) -> CropRect {
    if source.aspect() > target_aspect {
        let width = even((source.height as f64 * target_aspect) as u32).max(2).min(source.width);
        CropRect {
            x: (source.width - width) / 2,
            y: 0,
            width,
            height: source.height,
        }
    } else {
        let height = even((source.width as f64 / target_aspect) as u32).max(2).min(source.height);
        CropRect {
            x: 0,
            y: (source.height - height) / 2,
            width: source.width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_table_matches_quality_tiers() {
        assert_eq!(
            TargetFrame::for_output(AspectRatio::Vertical, Quality::High),
            TargetFrame::new(1080, 1920)
        );
        assert_eq!(
            TargetFrame::for_output(AspectRatio::Portrait, Quality::Standard),
            TargetFrame::new(720, 900)
        );
        assert_eq!(
            TargetFrame::for_output(AspectRatio::Landscape, Quality::Standard),
            TargetFrame::new(1280, 720)
        );
        for ratio in AspectRatio::ALL {
            for quality in [Quality::High, Quality::Standard] {
                let frame = TargetFrame::for_output(ratio, quality);
                assert_eq!(frame, frame.even());
                assert!((frame.aspect() - ratio.value()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn parses_user_spellings() {
        assert_eq!("9x16".parse::<AspectRatio>().unwrap(), AspectRatio::Vertical);
        assert_eq!(" 1:1 ".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!("High Quality".parse::<Quality>().unwrap(), Quality::High);
        assert_eq!("standard".parse::<Quality>().unwrap(), Quality::Standard);
        assert_eq!(
            "3:2".parse::<AspectRatio>(),
            Err(ValidationError::UnknownAspectRatio("3:2".to_string()))
        );
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn matching_aspect_only_resizes() {
        let adaptation = adapt_frame(
            TargetFrame::new(3840, 2160),
            TargetFrame::new(1920, 1080),
            AspectRatio::Landscape,
        )
        .unwrap();
        assert_eq!(adaptation.crop, None);
        assert_eq!(adaptation.zoomed, None);
        assert_eq!(adaptation.zoom_factor, 1.0);
    }

    #[test]
    fn matching_portrait_footage_is_not_zoomed() {
        let adaptation = adapt_frame(
            TargetFrame::new(2160, 3840),
            TargetFrame::new(1080, 1920),
            AspectRatio::Vertical,
        )
        .unwrap();
        assert_eq!(adaptation.crop, None);
        assert_eq!(adaptation.zoomed, None);
        assert_eq!(adaptation.zoom_factor, 1.0);
        assert_eq!(adaptation.output, TargetFrame::new(1080, 1920));
    }

    #[test]
    fn wide_footage_is_cropped_horizontally_for_vertical_output() {
        let adaptation = adapt_frame(
            TargetFrame::new(1920, 1080),
            TargetFrame::new(1080, 1920),
            AspectRatio::Vertical,
        )
        .unwrap();

        // 1080 * 9/16 = 607.5 -> 607 -> even 606
        assert_eq!(
            adaptation.crop,
            Some(CropRect {
                x: 657,
                y: 0,
                width: 606,
                height: 1080
            })
        );
        assert_eq!(adaptation.zoomed, Some(TargetFrame::new(1134, 2016)));
        assert_eq!(adaptation.zoom_factor, PORTRAIT_ZOOM);
    }

    #[test]
    fn tall_footage_is_cropped_vertically_for_landscape_output() {
        let adaptation = adapt_frame(
            TargetFrame::new(1080, 1920),
            TargetFrame::new(1280, 720),
            AspectRatio::Landscape,
        )
        .unwrap();

        let crop = adaptation.crop.unwrap();
        assert_eq!(crop.width, 1080);
        assert_eq!(crop.height, 606);
        assert_eq!(crop.y, (1920 - 606) / 2);
    }

    #[test]
    fn odd_targets_are_made_even() {
        let adaptation = adapt_frame(
            TargetFrame::new(1001, 1001),
            TargetFrame::new(721, 721),
            AspectRatio::Square,
        )
        .unwrap();
        assert_eq!(adaptation.output, TargetFrame::new(720, 720));
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        assert_eq!(
            adapt_frame(
                TargetFrame::new(0, 1080),
                TargetFrame::new(1080, 1080),
                AspectRatio::Square
            ),
            Err(PlanError::InvalidFrame {
                width: 0,
                height: 1080
            })
        );
    }
}
