//! Title and filename normalization.
//!
//! Both sides of every title comparison go through [`normalize`], so poster
//! file stems and catalogue titles end up in the same token form.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::poster::ExternalId;

/// Punctuation removed outright.
const STRIPPED_PUNCTUATION: &[char] = &[
    '*', '^', ';', '~', '\\', '`', '[', ']', '\'', '"', '/', ',', '.', '!', '?', ':', '_',
    '\u{2026}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
];

/// Characters that render like a slash.
const SLASH_VARIANTS: &[char] = &['\u{2044}', '\u{2215}', '\u{FF0F}', '\u{29F8}'];

/// Hyphen and dash variants mapped to an ASCII hyphen.
const DASH_VARIANTS: &[char] = &[
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}',
];

static FRACTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d)/(\d)").ok());
static SEPARATOR_RUN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[+\-\s]{2,}").ok());
static ID_TAG_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\{(?:imdb|tmdb|tvdb)-[^}]*\}").ok());
static ID_CAPTURE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\{(imdb|tmdb|tvdb)-([^}\s]+)\}").ok());
static YEAR_TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\((\d{4})\)").ok());
static WHITESPACE_RUN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s{2,}").ok());

/// Zero-width and bidi formatting characters.
fn is_format_char(c: char) -> bool {
    matches!(c,
        '\u{00AD}' |
        '\u{200B}'..='\u{200F}' |
        '\u{202A}'..='\u{202E}' |
        '\u{2060}'..='\u{2064}' |
        '\u{FEFF}'
    )
}

/// Emoji and pictograph bands.
fn is_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F600}'..='\u{1F64F}' |  // Emoticons
        '\u{1F300}'..='\u{1F5FF}' |  // Symbols & pictographs
        '\u{1F680}'..='\u{1F6FF}' |  // Transport & map symbols
        '\u{1F700}'..='\u{1F77F}' |  // Alchemical symbols
        '\u{1F780}'..='\u{1F7FF}' |  // Geometric shapes extended
        '\u{1F800}'..='\u{1F8FF}' |  // Supplemental arrows-C
        '\u{1F900}'..='\u{1F9FF}' |  // Supplemental symbols and pictographs
        '\u{1FA00}'..='\u{1FA6F}' |  // Chess symbols
        '\u{1FA70}'..='\u{1FAFF}' |  // Symbols and pictographs extended-A
        '\u{2700}'..='\u{27BF}' |    // Dingbats
        '\u{1F1E0}'..='\u{1F1FF}'    // Flags
    )
}

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, with: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Normalize a title or filename stem into its comparable form.
///
/// Lowercases, folds accents, maps slash and dash look-alikes, turns `N/N`
/// into `N-N`, drops zero-width characters, punctuation and emoji, spells out
/// `&`, and collapses runs of `+`, `-` and whitespace into one space.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let folded: String = lowered
        .nfc()
        .collect::<String>()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let slashed: String = folded
        .chars()
        .map(|c| if SLASH_VARIANTS.contains(&c) { '/' } else { c })
        .collect();
    let fractions = replace_all(&FRACTION_RE, &slashed, "$1-$2");

    let mut cleaned = String::with_capacity(fractions.len());
    for c in fractions.chars() {
        if is_format_char(c) || is_emoji(c) || STRIPPED_PUNCTUATION.contains(&c) {
            continue;
        }
        if DASH_VARIANTS.contains(&c) {
            cleaned.push('-');
        } else if c == '&' {
            cleaned.push_str("and");
        } else if c.is_whitespace() {
            cleaned.push(' ');
        } else {
            cleaned.push(c);
        }
    }

    replace_all(&SEPARATOR_RUN_RE, &cleaned, " ").trim().to_string()
}

/// Remove an embedded `{imdb-…}`, `{tmdb-…}` or `{tvdb-…}` tag.
pub fn strip_id(text: &str) -> String {
    let stripped = replace_all(&ID_TAG_RE, text, "");
    replace_all(&WHITESPACE_RUN_RE, &stripped, " ").trim().to_string()
}

/// Remove a parenthesized four-digit year.
pub fn strip_year(text: &str) -> String {
    let stripped = replace_all(&YEAR_TAG_RE, text, "");
    replace_all(&WHITESPACE_RUN_RE, &stripped, " ").trim().to_string()
}

/// Extract the embedded external id tag, if any.
pub fn extract_id(text: &str) -> Option<ExternalId> {
    let caps = ID_CAPTURE_RE.as_ref()?.captures(text)?;
    Some(ExternalId {
        provider: caps.get(1)?.as_str().to_lowercase(),
        value: caps.get(2)?.as_str().to_lowercase(),
    })
}

/// Extract the first parenthesized four-digit year.
pub fn extract_year(text: &str) -> Option<String> {
    let caps = YEAR_TAG_RE.as_ref()?.captures(text)?;
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Normalized comparison key for a catalogue title.
pub fn title_key(title: &str) -> String {
    normalize(&strip_id(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Inception (2010)"), "inception (2010)");
        assert_eq!(normalize("  The  Matrix  "), "the matrix");
        assert_eq!(normalize("Fast & Furious"), "fast and furious");
        assert_eq!(normalize("Mr. Robot"), "mr robot");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(
            normalize("The Office (2005) - Season 02"),
            "the office (2005) season 02"
        );
        assert_eq!(normalize("Spider-Man"), "spider-man");
        assert_eq!(normalize("Mission: Impossible – Fallout"), "mission impossible fallout");
        assert_eq!(normalize("A ++ B"), "a b");
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize("Amélie"), "amelie");
        assert_eq!(normalize("Pokémon\u{200B}"), "pokemon");
        assert_eq!(normalize("Star Wars 🚀"), "star wars");
        assert_eq!(normalize("Face\u{2215}Off"), "faceoff");
        assert_eq!(normalize("Café\u{00A0}Society"), "cafe society");
    }

    #[test]
    fn test_normalize_fraction() {
        assert_eq!(normalize("9/11"), "9-11");
        assert_eq!(normalize("24\u{2044}7"), "24-7");
        assert_eq!(normalize("Face/Off"), "faceoff");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Inception (2010)",
            "The Office (2005) - Season 02",
            "Amélie — Le Fabuleux Destin",
            "Marvel Collection 🎬",
            "9/11: The Day",
            " -Leading hyphen",
            "Trailing hyphen -",
            "İstanbul",
            "Rock & Roll++ -- Edition",
            "Tab\tSeparated\u{00A0}Title",
            "\u{FEFF}Zero\u{200D}Width",
            "Disney+",
            "a - - b",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_strip_id() {
        assert_eq!(strip_id("Inception (2010) {tmdb-27205}"), "Inception (2010)");
        assert_eq!(
            strip_id("The Office {tvdb-73244} - Season 01"),
            "The Office - Season 01"
        );
        assert_eq!(strip_id("No Tag"), "No Tag");
    }

    #[test]
    fn test_strip_year() {
        assert_eq!(strip_year("inception (2010)"), "inception");
        assert_eq!(strip_year("blade runner 2049 (2017)"), "blade runner 2049");
    }

    #[test]
    fn test_extract_id_and_year() {
        let id = extract_id("Inception (2010) {TMDB-27205}").unwrap();
        assert_eq!(id.provider, "tmdb");
        assert_eq!(id.value, "27205");
        assert!(extract_id("Inception (2010)").is_none());
        assert_eq!(extract_year("Inception (2010)"), Some("2010".to_string()));
        assert_eq!(extract_year("Marvel"), None);
    }
}
