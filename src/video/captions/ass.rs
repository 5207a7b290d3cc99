//! ASS (Advanced SubStation Alpha) script generation.
//!
//! The title card and all captions are written into one ASS script that ffmpeg's `ass`
//! filter burns into the background.

use std::fmt::{self, Write};

use super::{CaptionOverlay, TitleOverlay, overlay::TITLE_OUTLINE};
use crate::video::planner::TargetFrame;

const WHITE: &str = "&H00FFFFFF";
const BLACK: &str = "&H00000000";

#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// Primary color in ABGR format (e.g., &H00FFFFFF for white)
    pub primary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub bold: bool,
    pub outline: u32,
    pub shadow: u32,
    /// Alignment (numpad layout: 1-3=bottom, 4-6=mid, 7-9=top)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl AssStyle {
    /// White bold text with a black outline, wrapped to `max_width` around the center.
    fn outlined(name: &str, font_name: &str, font_size: u32, outline: u32, alignment: u8) -> Self {
        Self {
            name: name.to_string(),
            font_name: font_name.to_string(),
            font_size,
            primary_color: WHITE.to_string(),
            outline_color: BLACK.to_string(),
            back_color: BLACK.to_string(),
            bold: true,
            outline,
            shadow: 0,
            alignment,
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
        }
    }

    fn with_wrap_width(mut self, frame_width: u32, wrap_width: u32) -> Self {
        let margin = frame_width.saturating_sub(wrap_width) / 2;
        self.margin_l = margin;
        self.margin_r = margin;
        self
    }

    pub fn caption(overlay: &CaptionOverlay, frame: TargetFrame) -> Self {
        Self::outlined(
            "Caption",
            &overlay.font.family,
            overlay.font_size,
            overlay.outline,
            8,
        )
        .with_wrap_width(frame.width, overlay.max_width)
    }

    pub fn title(overlay: &TitleOverlay, frame: TargetFrame) -> Self {
        Self::outlined("Title", &overlay.font.family, overlay.font_size, TITLE_OUTLINE, 5)
            .with_wrap_width(frame.width, overlay.wrap_width)
    }

    fn to_style_line(&self) -> String {
        let bold_val = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{primary},{outline},{back},{bold},0,0,0,100,100,0,0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            outline = self.outline_color,
            back = self.back_color,
            bold = bold_val,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

/// Build the complete ASS script for one composition.
pub fn write_ass_script(
    frame: TargetFrame,
    title: Option<&TitleOverlay>,
    captions: &[CaptionOverlay],
) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = write_script(&mut output, frame, title, captions);
    output
}

fn write_script(
    output: &mut String,
    frame: TargetFrame,
    title: Option<&TitleOverlay>,
    captions: &[CaptionOverlay],
) -> fmt::Result {
    writeln!(output, "[Script Info]")?;
    writeln!(output, "; Generated by reelsmith")?;
    writeln!(output, "ScriptType: v4.00+")?;
    writeln!(output, "PlayResX: {}", frame.width)?;
    writeln!(output, "PlayResY: {}", frame.height)?;
    writeln!(output, "WrapStyle: 0")?;
    writeln!(output, "ScaledBorderAndShadow: yes")?;
    writeln!(output)?;

    let caption_style = captions.first().map(|first| AssStyle::caption(first, frame));
    let title_style = title.map(|overlay| AssStyle::title(overlay, frame));

    writeln!(output, "[V4+ Styles]")?;
    writeln!(
        output,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    )?;
    for style in caption_style.iter().chain(title_style.iter()) {
        writeln!(output, "{}", style.to_style_line())?;
    }
    writeln!(output)?;

    writeln!(output, "[Events]")?;
    writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )?;

    if let (Some(overlay), Some(style)) = (title, &title_style) {
        let fade_ms = (overlay.fade * 1000.0).round() as u32;
        writeln!(
            output,
            "Dialogue: 1,{},{},{},,0,0,0,,{{\\pos({},{})\\fad({fade_ms},{fade_ms})}}{}",
            format_ass_timestamp(overlay.start),
            format_ass_timestamp(overlay.end),
            style.name,
            overlay.center_x,
            overlay.center_y,
            escape_ass_text(&overlay.text)
        )?;
    }

    if let Some(style) = &caption_style {
        for caption in captions {
            let font_override = if caption.font.family != style.font_name {
                format!("\\fn{}", caption.font.family)
            } else {
                String::new()
            };
            writeln!(
                output,
                "Dialogue: 0,{},{},{},,0,0,0,,{{\\pos({},{}){font_override}}}{}",
                format_ass_timestamp(caption.start),
                format_ass_timestamp(caption.end),
                style.name,
                caption.anchor_x,
                caption.anchor_y,
                escape_ass_text(&caption.text)
            )?;
        }
    }

    Ok(())
}

/// `H:MM:SS.cc`
fn format_ass_timestamp(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6000;
    let secs = (total_cs % 6000) / 100;
    let centis = total_cs % 100;
    format!("{hours}:{minutes:02}:{secs:02}.{centis:02}")
}

fn escape_ass_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}
