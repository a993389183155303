//! Regex-based language detection and reading-time estimates.
//!
//! Every language has a pattern over its characteristic letters. A language
//! scores `matches / words`. Latin languages told apart only by their
//! diacritics get a 5x boost, since most of their words are plain ASCII and
//! would otherwise lose to English.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

/// Words per second used for reading time
const WORDS_PER_SECOND: f64 = 3.5;

/// Score above which a language is reported as a strong match
const STRONG_MATCH: f64 = 0.85;

/// Boost for Latin languages recognized by diacritics
const DIACRITIC_BOOST: f64 = 5.0;

const DIACRITIC_LANGUAGES: &[&str] = &["ro", "nb", "sv", "it", "es", "pl", "de", "fr"];

/// Languages written right to left
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "yi", "ps"];

/// One CJK character, or a run of letters, marks and digits
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Han}|\p{Hiragana}|\p{Katakana}|[\p{L}\p{N}][\p{L}\p{M}\p{N}'’-]*").expect("WORD regex")
});

static LANGUAGES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("en", r"(?i)\b[a-z]+\b"),
        ("ru", r"(?i)\b[а-яё]+\b"),
        ("uk", r"(?i)\b[а-щьюяґєії']*[ґєії][а-щьюяґєії']*\b"),
        ("be", r"(?i)\b[а-яёіў']*ў[а-яёіў']*\b"),
        ("ar", r"[\x{0600}-\x{06FF}]+"),
        ("fa", r"[\x{0600}-\x{06FF}]*[پچژگ][\x{0600}-\x{06FF}]*"),
        ("he", r"[\x{0590}-\x{05FF}]+"),
        ("el", r"[\x{0370}-\x{03FF}\x{1F00}-\x{1FFF}]+"),
        ("hi", r"[\x{0900}-\x{097F}]+"),
        ("bn", r"[\x{0980}-\x{09FF}]+"),
        ("ta", r"[\x{0B80}-\x{0BFF}]+"),
        ("te", r"[\x{0C00}-\x{0C7F}]+"),
        ("th", r"[\x{0E00}-\x{0E7F}]+"),
        ("ka", r"[\x{10A0}-\x{10FF}]+"),
        ("hy", r"[\x{0530}-\x{058F}]+"),
        ("ko", r"[\x{AC00}-\x{D7AF}]+"),
        ("ja", r"[\x{3040}-\x{30FF}]"),
        ("zh", r"\p{Han}"),
        ("ro", r"(?i)\b\w*[ăâîșşțţ]\w*\b"),
        ("nb", r"(?i)\b\w*[æøå]\w*\b"),
        ("sv", r"(?i)\b\w*[åäö]\w*\b"),
        ("it", r"(?i)\b\w*[àèéìòù]\w*\b"),
        ("es", r"(?i)\b\w*[áéíñóúü¿¡]\w*\b"),
        ("pl", r"(?i)\b\w*[ąćęłńóśźż]\w*\b"),
        ("de", r"(?i)\b\w*[äöüß]\w*\b"),
        ("fr", r"(?i)\b\w*[àâæçéèêëîïôœùûüÿ]\w*\b"),
        ("tr", r"(?i)\b\w*[çğışöü]\w*\b"),
        ("cs", r"(?i)\b\w*[čďěňřšťůž]\w*\b"),
        ("vi", r"(?i)\b\w*[ăđơư]\w*\b"),
    ]
    .into_iter()
    .map(|(lang, pattern)| (lang, Regex::new(pattern).expect("language regex")))
    .collect()
});

/// Number of words, counting each CJK character as one
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Score every language against `text`, in evaluation order
pub fn language_scores(text: &str) -> Vec<(&'static str, f64)> {
    let words = count_words(text);
    if words == 0 {
        return Vec::new();
    }

    LANGUAGES
        .iter()
        .map(|(lang, re)| {
            let mut score = re.find_iter(text).count() as f64 / words as f64;
            if DIACRITIC_LANGUAGES.contains(lang) {
                score *= DIACRITIC_BOOST;
            }
            (*lang, score)
        })
        .collect()
}

/// Detect the language of `text`.
///
/// The default locale seeds the result and is kept when no language scores
/// above zero. A score above 0.85 is reported as a strong match, but every
/// language is still evaluated and the highest score wins.
pub fn detect_language(text: &str, default_locale: &str) -> String {
    let mut best = (default_locale.to_string(), 0.0);

    for (lang, score) in language_scores(text) {
        if score > STRONG_MATCH {
            tracing::trace!("strong language match {lang} ({score:.2})");
        }
        if score > best.1 {
            best = (lang.to_string(), score);
        }
    }

    tracing::debug!("detected language {} ({:.2})", best.0, best.1);
    best.0
}

/// Whether a language code is written right to left
pub fn is_rtl(lang: &str) -> bool {
    RTL_LANGUAGES.contains(&lang)
}

/// Estimated reading time in whole seconds
pub fn read_seconds(words: usize) -> u64 {
    (words as f64 / WORDS_PER_SECOND).round() as u64
}

/// Format seconds as `m:ss`
pub fn format_read_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("Hello, world! It's 2024."), 4);
        assert_eq!(count_words("中文字"), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_cyrillic_majority_is_russian() {
        let text = "один два три четыре пять шесть семь восемь девять десять \
                    одиннадцать двенадцать тринадцать четырнадцать пятнадцать \
                    шестнадцать семнадцать восемнадцать hello world";
        assert_eq!(count_words(text), 20);
        let ru = language_scores(text).into_iter().find(|(l, _)| *l == "ru").unwrap().1;
        assert!((ru - 0.9).abs() < 1e-9);
        assert_eq!(detect_language(text, "en"), "ru");
    }

    #[test]
    fn test_strong_match_does_not_stop_evaluation() {
        // English is evaluated first and scores 1.0 (each hyphenated word holds
        // one ASCII match), yet the boosted German score is higher and wins.
        let text = "mädchen-haus über-alles";
        let scores = language_scores(text);
        assert_eq!(scores.len(), LANGUAGES.len());

        let en = scores.iter().find(|(l, _)| *l == "en").unwrap().1;
        let de = scores.iter().find(|(l, _)| *l == "de").unwrap().1;
        assert!(en > STRONG_MATCH);
        assert!(de > en);
        assert_eq!(detect_language(text, "en"), "de");
    }

    #[test]
    fn test_default_locale_seed() {
        assert_eq!(detect_language("", "de"), "de");
        assert_eq!(detect_language("12345", "es"), "es");
        assert_eq!(detect_language("The quick brown fox jumps over the dog", "es"), "en");
    }

    #[rstest]
    #[case(0, "0:00")]
    #[case(59, "0:59")]
    #[case(61, "1:01")]
    #[case(600, "10:00")]
    fn test_format_read_time(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_read_time(seconds), expected);
    }

    #[test]
    fn test_read_seconds() {
        assert_eq!(read_seconds(35), 10);
        assert_eq!(read_seconds(0), 0);
        assert_eq!(read_seconds(2), 1);
    }

    #[test]
    fn test_rtl() {
        assert!(is_rtl("he"));
        assert!(!is_rtl("en"));
    }
}
