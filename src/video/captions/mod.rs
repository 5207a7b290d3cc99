//! Word-timed captions: segmentation into lines, SRT files, script detection, fonts and
//! the ASS overlay script burned into the render.

mod ass;
mod fonts;
mod overlay;
mod script;
mod segmenter;
mod srt;

pub use ass::write_ass_script;
pub use fonts::{FontFetcher, FontResolver, HttpFontFetcher, ResolvedFont};
pub use overlay::{CaptionOverlay, CaptionRenderer, TitleOverlay};
pub use script::ScriptFamily;
pub use segmenter::{SegmentLimits, segment};
pub use srt::{cue_words, parse_srt, save_srt, write_srt};

use serde::{Deserialize, Serialize};

/// One transcribed word with offsets in seconds from narration start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// One on-screen subtitle unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl CaptionLine {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            text: self.text.clone(),
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// Move every line forward by `offset` seconds (the title card duration).
pub fn shift_lines(lines: &[CaptionLine], offset: f64) -> Vec<CaptionLine> {
    lines.iter().map(|line| line.shifted(offset)).collect()
}
