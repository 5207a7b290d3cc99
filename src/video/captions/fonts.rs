use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ScriptFamily;
use crate::ui::prelude::*;
use crate::video::cache::BoundedCache;

const FONT_BASE_URL: &str = "https://github.com/google/fonts/raw/main/ofl";
const DEFAULT_FAMILY: &str = "Arial";
const MEMO_CAPACITY: u64 = 16;

/// A font the subtitle renderer can use. `path` is `None` when the renderer should pick
/// its own default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    pub family: String,
    pub path: Option<PathBuf>,
}

impl ResolvedFont {
    pub fn renderer_default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            path: None,
        }
    }

    fn file(family: &str, path: PathBuf) -> Self {
        Self {
            family: family.to_string(),
            path: Some(path),
        }
    }
}

struct RemoteFont {
    family: &'static str,
    file_name: &'static str,
    url_path: &'static str,
}

fn remote_font(script: ScriptFamily) -> Option<RemoteFont> {
    match script {
        ScriptFamily::Cjk => Some(RemoteFont {
            family: "Noto Sans CJK SC",
            file_name: "NotoSansCJK-Bold.ttc",
            url_path: "notosanscjk/NotoSansCJK-Bold.ttc",
        }),
        ScriptFamily::Devanagari => Some(RemoteFont {
            family: "Noto Sans Devanagari",
            file_name: "NotoSansDevanagari-Bold.ttf",
            url_path: "notosansdevanagari/NotoSansDevanagari-Bold.ttf",
        }),
        ScriptFamily::Arabic => Some(RemoteFont {
            family: "Noto Sans Arabic",
            file_name: "NotoSansArabic-Bold.ttf",
            url_path: "notosansarabic/NotoSansArabic-Bold.ttf",
        }),
        ScriptFamily::Latin => None,
    }
}

fn system_fallbacks() -> Vec<(String, PathBuf)> {
    [
        ("DejaVu Sans", "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
        (
            "Liberation Sans",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ),
        ("Helvetica", "/System/Library/Fonts/Helvetica.ttc"),
    ]
    .into_iter()
    .map(|(family, path)| (family.to_string(), PathBuf::from(path)))
    .collect()
}

#[async_trait]
pub trait FontFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Default)]
pub struct HttpFontFetcher {
    client: reqwest::Client,
}

#[async_trait]
impl FontFetcher for HttpFontFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        if !response.status().is_success() {
            bail!("font download from {url} failed with status {}", response.status());
        }

        let bytes = response.bytes().await.context("reading font download")?;
        Ok(bytes.to_vec())
    }
}

/// Picks a font per script family: memory cache, then the on-disk font cache, then a
/// download, then installed system fonts, then the renderer default.
pub struct FontResolver {
    cache_dir: PathBuf,
    fetcher: Box<dyn FontFetcher>,
    fallbacks: Vec<(String, PathBuf)>,
    memo: BoundedCache<ScriptFamily, ResolvedFont>,
}

impl FontResolver {
    pub fn new(cache_dir: PathBuf, fetcher: Box<dyn FontFetcher>) -> Self {
        Self {
            cache_dir,
            fetcher,
            fallbacks: system_fallbacks(),
            memo: BoundedCache::new(MEMO_CAPACITY),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: Vec<(String, PathBuf)>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub async fn resolve(&self, script: ScriptFamily) -> ResolvedFont {
        if let Some(hit) = self.memo.get(&script) {
            return hit;
        }

        let resolved = self.resolve_uncached(script).await;
        emit(
            Level::Debug,
            "video.fonts.resolved",
            &format!(
                "Using font '{}' for {} captions ({} cached)",
                resolved.family,
                script,
                self.memo.entry_count() + 1
            ),
            None,
        );
        self.memo.insert(script, resolved.clone());
        resolved
    }

    async fn resolve_uncached(&self, script: ScriptFamily) -> ResolvedFont {
        if let Some(remote) = remote_font(script) {
            let cached = self.cache_dir.join(remote.file_name);
            if cached.is_file() {
                return ResolvedFont::file(remote.family, cached);
            }

            match self.download(&remote, &cached).await {
                Ok(()) => return ResolvedFont::file(remote.family, cached),
                Err(err) => emit(
                    Level::Warn,
                    "video.fonts.download_failed",
                    &format!(
                        "Could not download {} font, falling back: {err:#}",
                        remote.family
                    ),
                    None,
                ),
            }
        }

        self.system_fallback()
    }

    async fn download(&self, remote: &RemoteFont, target: &Path) -> Result<()> {
        let url = format!("{FONT_BASE_URL}/{}", remote.url_path);
        emit(
            Level::Info,
            "video.fonts.download",
            &format!("Downloading {} font...", remote.family),
            None,
        );
        let bytes = self.fetcher.fetch(&url).await?;
        persist_font(&self.cache_dir, target, &bytes)
    }

    fn system_fallback(&self) -> ResolvedFont {
        self.fallbacks
            .iter()
            .find(|(_, path)| path.is_file())
            .map(|(family, path)| ResolvedFont::file(family, path.clone()))
            .unwrap_or_else(ResolvedFont::renderer_default)
    }
}

/// Write to a temporary file in the cache directory and rename it into place, so a
/// half-written font is never picked up.
fn persist_font(cache_dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("creating font cache {}", cache_dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(cache_dir)
        .context("creating temporary font file")?;
    tmp.write_all(bytes).context("writing font data")?;
    tmp.persist(target)
        .with_context(|| format!("moving font into {}", target.display()))?;
    Ok(())
}
