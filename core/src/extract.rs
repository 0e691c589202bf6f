use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

use crate::urls::canonicalize;

lazy_static! {
    static ref SCRIPT_BLOCKS: Regex =
        Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex");
    static ref STYLE_BLOCKS: Regex =
        Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex");
    static ref TAGS: Regex = Regex::new(r"(?s)<.*?>").expect("valid regex");
    static ref ENTITIES: Regex =
        Regex::new(r"&[a-zA-Z][a-zA-Z0-9]*;|&#[0-9]+;|&#x[0-9a-fA-F]+;").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Script the crawl targets. Words in any other script (and anything carrying
/// digits or punctuation) are discarded, so the corpus stays single-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Latin,
    Cyrillic,
}

impl Alphabet {
    pub fn accepts(&self, word: &str) -> bool {
        !word.is_empty() && word.chars().all(|c| self.is_letter(c))
    }

    fn is_letter(&self, c: char) -> bool {
        match self {
            Alphabet::Latin => c.is_ascii_alphabetic(),
            Alphabet::Cyrillic => matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'),
        }
    }
}

impl FromStr for Alphabet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latin" => Ok(Alphabet::Latin),
            "cyrillic" => Ok(Alphabet::Cyrillic),
            other => Err(anyhow::anyhow!(
                "unknown alphabet `{other}` (expected `latin` or `cyrillic`)"
            )),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Latin => write!(f, "latin"),
            Alphabet::Cyrillic => write!(f, "cyrillic"),
        }
    }
}

fn strip_script_blocks(html: &str) -> String {
    SCRIPT_BLOCKS.replace_all(html, " ").into_owned()
}

fn strip_style_blocks(html: &str) -> String {
    STYLE_BLOCKS.replace_all(html, " ").into_owned()
}

fn strip_tags(html: &str) -> String {
    TAGS.replace_all(html, " ").into_owned()
}

fn strip_entities(text: &str) -> String {
    ENTITIES.replace_all(text, " ").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Reduces raw HTML to the words of the target alphabet, in document order,
/// without dedup. Markup, scripts, styles and character entities are removed
/// before the whitespace split; each word is NFKC-normalized before the
/// alphabet check.
pub fn extract(html: &str, alphabet: Alphabet) -> Vec<String> {
    let text = strip_script_blocks(html);
    let text = strip_style_blocks(&text);
    let text = strip_tags(&text);
    let text = strip_entities(&text);
    let text = collapse_whitespace(&text);
    text.split(' ')
        .map(|word| word.nfkc().collect::<String>())
        .filter(|word| alphabet.accepts(word))
        .collect()
}

/// Absolute http(s) anchor targets in document order, canonicalized, no dedup.
pub fn extract_links(html: &str) -> Vec<String> {
    let anchor = Selector::parse("a").expect("valid selector");
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for a in document.select(&anchor) {
        if let Some(href) = a.value().attr("href") {
            if href.starts_with("http") {
                links.push(canonicalize(href));
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_entities_are_removed() {
        let words = extract("<script>x</script><p>hello &amp; world</p>", Alphabet::Latin);
        assert_eq!(words, vec!["hello", "world"]);
    }

    #[test]
    fn style_blocks_are_removed_with_content() {
        let words = extract(
            "<style>body { color: red }</style><p>visible</p>",
            Alphabet::Latin,
        );
        assert_eq!(words, vec!["visible"]);
    }

    #[test]
    fn numerals_and_punctuation_fragments_are_discarded() {
        let words = extract("<p>release 2 of sift-core is out</p>", Alphabet::Latin);
        assert_eq!(words, vec!["release", "of", "is", "out"]);
    }

    #[test]
    fn multiline_markup_collapses_to_single_spaces() {
        let html = "<div>\n  one\n\n  two\n</div>";
        assert_eq!(extract(html, Alphabet::Latin), vec!["one", "two"]);
    }

    #[test]
    fn cyrillic_filter_drops_latin_noise() {
        let words = extract("<p>привет web мир</p>", Alphabet::Cyrillic);
        assert_eq!(words, vec!["привет", "мир"]);
    }

    #[test]
    fn word_order_is_preserved_without_dedup() {
        let words = extract("<p>tea cup tea</p>", Alphabet::Latin);
        assert_eq!(words, vec!["tea", "cup", "tea"]);
    }

    #[test]
    fn links_come_back_canonical_and_in_document_order() {
        let html = concat!(
            "<a href=\"https://a.example/x?utm=1\">one</a>",
            "<a href=\"/relative\">skip</a>",
            "<a href=\"https://b.example/y/\">two</a>",
        );
        assert_eq!(
            extract_links(html),
            vec!["https://a.example/x", "https://b.example/y"]
        );
    }

    #[test]
    fn duplicate_links_are_kept() {
        let html = "<a href=\"https://a.example\">1</a><a href=\"https://a.example\">2</a>";
        assert_eq!(extract_links(html).len(), 2);
    }
}
