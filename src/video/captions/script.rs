use serde::Serialize;
use std::fmt;

/// Unicode-block based text classification used to pick a caption font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptFamily {
    Cjk,
    Devanagari,
    Arabic,
    Latin,
}

const CJK_RANGES: &[(u32, u32)] = &[
    (0x4E00, 0x9FFF), // CJK unified ideographs
    (0x3040, 0x309F), // Hiragana
    (0x30A0, 0x30FF), // Katakana
    (0xAC00, 0xD7AF), // Hangul syllables
];
const DEVANAGARI_RANGES: &[(u32, u32)] = &[(0x0900, 0x097F)];
const ARABIC_RANGES: &[(u32, u32)] = &[(0x0600, 0x06FF)];

impl ScriptFamily {
    /// First family (cjk, devanagari, arabic) with at least one character in `text`,
    /// otherwise latin.
    pub fn classify(text: &str) -> Self {
        let checks = [
            (ScriptFamily::Cjk, CJK_RANGES),
            (ScriptFamily::Devanagari, DEVANAGARI_RANGES),
            (ScriptFamily::Arabic, ARABIC_RANGES),
        ];

        checks
            .into_iter()
            .find(|(_, ranges)| text.chars().any(|c| in_ranges(c, ranges)))
            .map(|(family, _)| family)
            .unwrap_or(ScriptFamily::Latin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScriptFamily::Cjk => "cjk",
            ScriptFamily::Devanagari => "devanagari",
            ScriptFamily::Arabic => "arabic",
            ScriptFamily::Latin => "latin",
        }
    }
}

impl fmt::Display for ScriptFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn in_ranges(c: char, ranges: &[(u32, u32)]) -> bool {
    let code = c as u32;
    ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_unicode_block() {
        assert_eq!(ScriptFamily::classify("中"), ScriptFamily::Cjk);
        assert_eq!(ScriptFamily::classify("Hello"), ScriptFamily::Latin);
        assert_eq!(ScriptFamily::classify("ا"), ScriptFamily::Arabic);
        assert_eq!(ScriptFamily::classify("नमस्ते"), ScriptFamily::Devanagari);
        assert_eq!(ScriptFamily::classify("カタカナ"), ScriptFamily::Cjk);
        assert_eq!(ScriptFamily::classify("한국어"), ScriptFamily::Cjk);
    }

    #[test]
    fn empty_text_is_latin() {
        assert_eq!(ScriptFamily::classify(""), ScriptFamily::Latin);
    }

    #[test]
    fn cjk_wins_over_later_families() {
        assert_eq!(ScriptFamily::classify("ا 中"), ScriptFamily::Cjk);
        assert_eq!(ScriptFamily::classify("नम ا"), ScriptFamily::Devanagari);
    }
}
