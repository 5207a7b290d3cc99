use serde::Serialize;

use super::{CaptionLine, FontResolver, ResolvedFont, ScriptFamily};
use crate::video::planner::{CaptionPlacement, TitleWindow};

/// A caption positioned on the output frame, ready for the subtitle renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionOverlay {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub script: ScriptFamily,
    #[serde(skip)]
    pub font: ResolvedFont,
    pub font_size: u32,
    pub anchor_x: u32,
    pub anchor_y: u32,
    pub max_width: u32,
    pub outline: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleOverlay {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub fade: f64,
    pub font: ResolvedFont,
    pub font_size: u32,
    pub wrap_width: u32,
    pub center_x: u32,
    pub center_y: u32,
}

pub const TITLE_OUTLINE: u32 = 3;

/// Picks fonts for caption lines and attaches the planned placement.
pub struct CaptionRenderer<'a> {
    fonts: &'a FontResolver,
}

impl<'a> CaptionRenderer<'a> {
    pub fn new(fonts: &'a FontResolver) -> Self {
        Self { fonts }
    }

    pub async fn captions(
        &self,
        lines: &[CaptionLine],
        placement: &CaptionPlacement,
    ) -> Vec<CaptionOverlay> {
        let mut overlays = Vec::with_capacity(lines.len());
        for line in lines {
            let script = ScriptFamily::classify(&line.text);
            overlays.push(CaptionOverlay {
                text: line.text.clone(),
                start: line.start,
                end: line.end,
                script,
                font: self.fonts.resolve(script).await,
                font_size: placement.font_size,
                anchor_x: placement.anchor_x,
                anchor_y: placement.anchor_y,
                max_width: placement.max_width,
                outline: placement.outline,
            });
        }
        overlays
    }

    pub async fn title(&self, title: &TitleWindow) -> TitleOverlay {
        let script = ScriptFamily::classify(&title.text);
        TitleOverlay {
            text: title.text.clone(),
            start: title.window.start,
            end: title.window.end,
            fade: title.fade,
            font: self.fonts.resolve(script).await,
            font_size: title.font_size,
            wrap_width: title.wrap_width,
            center_x: title.center_x,
            center_y: title.center_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::captions::FontFetcher;
    use crate::video::planner::{AspectRatio, TargetFrame, TimeWindow};
    use anyhow::{Result, bail};
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl FontFetcher for Offline {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            bail!("offline")
        }
    }

    #[tokio::test]
    async fn captions_carry_placement_and_script() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontResolver::new(dir.path().to_path_buf(), Box::new(Offline))
            .with_fallbacks(Vec::new());
        let renderer = CaptionRenderer::new(&fonts);
        let placement =
            CaptionPlacement::for_frame(TargetFrame::new(1080, 1920), AspectRatio::Vertical);

        let overlays = renderer
            .captions(
                &[
                    CaptionLine {
                        text: "Hello there".into(),
                        start: 4.0,
                        end: 5.0,
                    },
                    CaptionLine {
                        text: "你好".into(),
                        start: 5.0,
                        end: 6.0,
                    },
                ],
                &placement,
            )
            .await;

        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].script, ScriptFamily::Latin);
        assert_eq!(overlays[1].script, ScriptFamily::Cjk);
        assert_eq!(overlays[0].anchor_y, placement.anchor_y);
        assert_eq!(overlays[1].font, ResolvedFont::renderer_default());
    }

    #[tokio::test]
    async fn title_keeps_its_window() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontResolver::new(dir.path().to_path_buf(), Box::new(Offline))
            .with_fallbacks(Vec::new());
        let renderer = CaptionRenderer::new(&fonts);

        let overlay = renderer
            .title(&TitleWindow {
                text: "Daily facts".into(),
                window: TimeWindow::new(0.0, 4.0),
                fade: 0.5,
                font_size: 153,
                wrap_width: 864,
                center_x: 540,
                center_y: 960,
            })
            .await;

        assert_eq!(overlay.end, 4.0);
        assert_eq!(overlay.fade, 0.5);
        assert_eq!(overlay.font.family, "Arial");
    }
}
