//! `<!-- @lang:CODE -->` markers for the single-file bilingual format.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static RE_LANG_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!--\s*@lang:(\w+)\s*-->").unwrap());

/// Raw text per language code (lowercased).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSplit {
    pub texts: BTreeMap<String, String>,
    /// False when the input had no markers and was taken as English.
    pub has_markers: bool,
}

impl LanguageSplit {
    pub fn get(&self, lang: &str) -> &str {
        self.texts.get(lang).map_or("", String::as_str)
    }
}

/// Split a merged document on its language markers.
///
/// Text before the first marker is dropped. Several blocks for the same
/// code are joined in document order. Without markers the whole input is
/// English.
pub fn split_by_language(text: &str) -> LanguageSplit {
    let markers: Vec<_> = RE_LANG_MARKER.captures_iter(text).collect();
    if markers.is_empty() {
        let mut texts = BTreeMap::new();
        texts.insert("en".to_string(), text.to_string());
        return LanguageSplit {
            texts,
            has_markers: false,
        };
    }

    let mut texts: BTreeMap<String, String> = BTreeMap::new();
    for (i, caps) in markers.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = &text[whole.end()..end];
        let code = caps[1].to_lowercase();

        let entry = texts.entry(code).or_default();
        if !entry.is_empty() {
            entry.push('\n');
        }
        entry.push_str(body);
    }

    LanguageSplit {
        texts,
        has_markers: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markers_is_english() {
        let split = split_by_language("# Hello\n\nThis is content.");
        assert!(!split.has_markers);
        assert_eq!(split.get("en"), "# Hello\n\nThis is content.");
        assert_eq!(split.get("zh"), "");
    }

    #[test]
    fn english_only() {
        let split = split_by_language("<!-- @lang:en -->\n# Hello\n\nEnglish content here.\n");
        assert!(split.has_markers);
        assert!(split.get("en").contains("English content"));
        assert_eq!(split.get("zh"), "");
    }

    #[test]
    fn both_languages() {
        let split = split_by_language(
            "<!-- @lang:en -->\n# Hello\n\nEnglish.\n\n<!-- @lang:zh -->\n# 你好\n\n中文内容。\n",
        );
        assert!(split.get("en").contains("English"));
        assert!(!split.get("en").contains("你好"));
        assert!(split.get("zh").contains("中文内容"));
        assert!(!split.get("zh").contains("Hello"));
    }

    #[test]
    fn tolerant_whitespace_and_case() {
        let split = split_by_language("<!--  @lang:EN  -->\nEnglish\n<!--   @LANG:zh   -->\nChinese\n");
        assert!(split.get("en").contains("English"));
        assert!(split.get("zh").contains("Chinese"));
    }

    #[test]
    fn repeated_blocks_concatenate() {
        let split = split_by_language(
            "<!-- @lang:en -->\nA\n<!-- @lang:zh -->\n甲\n<!-- @lang:en -->\nB\n",
        );
        let en = split.get("en");
        assert!(en.find('A').unwrap() < en.find('B').unwrap());
    }

    #[test]
    fn preamble_dropped() {
        let split = split_by_language("preamble\n<!-- @lang:en -->\nbody\n");
        assert!(!split.get("en").contains("preamble"));
    }
}
