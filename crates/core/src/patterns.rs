//! Compiled regex patterns used by the extraction heuristics.
//!
//! All patterns are compiled once with `LazyLock` and kept here as data, so the
//! heuristics that use them stay free of string literals and can be tuned in one
//! place.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// Class/id signals

/// Class/id names of boilerplate blocks removed while `STRIP_UNLIKELYS` is active.
pub static UNLIKELY_CANDIDATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .expect("UNLIKELY_CANDIDATES regex")
});

/// Rescues an unlikely-looking node whose class/id also hints at content.
pub static MAYBE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)and|article|body|column|content|main|shadow").expect("MAYBE_CANDIDATE regex"));

pub static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story")
        .expect("POSITIVE regex")
});

pub static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .expect("NEGATIVE regex")
});

/// Extra signal for `<img>` class/id: hero and article pictures.
pub static IMAGE_POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)figure|image|photo|picture|hero|cover|featured|wp-image|article").expect("IMAGE_POSITIVE regex")
});

/// Extra signal for `<img>` class/id: decoration and tracking pixels.
pub static IMAGE_NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)avatar|icon|logo|badge|emoji|sprite|banner|pixel|tracking|spacer|social|share|ads?\b")
        .expect("IMAGE_NEGATIVE regex")
});

pub static BYLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)byline|author|dateline|writtenby|p-author").expect("BYLINE regex"));

pub static SHARE_ELEMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\b|_)(share|sharedaddy)(\b|_)").expect("SHARE_ELEMENTS regex"));

/// Highlighted code blocks are never pruned or conditionally cleaned.
pub static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhljs\b|\bhighlight|\bprism|\blanguage-|\blang-|codehilite|sourcecode|\bsyntax")
        .expect("CODE_BLOCK regex")
});

/// Embeds from these hosts survive conditional cleaning.
pub static VIDEOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .expect("VIDEOS regex")
});

// Style and structure

pub static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").expect("HIDDEN_STYLE regex")
});

/// A sentence terminator followed by a space or the end of the text.
pub static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.( |$)").expect("SENTENCE_END regex"));

pub static HASH_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#.+").expect("HASH_URL regex"));

/// An anchor text that is just a URL.
pub static RAW_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?://|www\.)\S+$").expect("RAW_URL regex"));

// Images

/// Attribute values that look like an image URL.
pub static LAZY_IMAGE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\S+\.(jpg|jpeg|png|webp|gif|avif)\S*\s*$").expect("LAZY_IMAGE_SRC regex")
});

/// Attribute values that look like a srcset.
pub static LAZY_IMAGE_SRCSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif|avif)\S*\s+\d").expect("LAZY_IMAGE_SRCSET regex")
});

/// One candidate of a srcset: URL and optional descriptor.
pub static SRCSET_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+?)(?:\s+([\d.]+)([xw]))?\s*(?:,\s*|$)").expect("SRCSET_CANDIDATE regex")
});

pub static BASE64_DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^data:\s*([^\s;,]+)\s*;\s*base64\s*,").expect("BASE64_DATA_URL regex")
});

// Titles

/// Hierarchical separators surrounded by spaces.
pub static TITLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[|\-\\/>»]\s").expect("TITLE_SEPARATOR regex"));

/// Captures everything before the last separator, keeping the space in front of it.
pub static TITLE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)[|\-\\/>»] .*$").expect("TITLE_HEAD regex"));

/// Captures everything after the first separator.
pub static TITLE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^|\-\\/>»]*[|\-\\/>»](.*)$").expect("TITLE_TAIL regex"));

pub static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

// Metadata

/// `<meta property>` values, which may hold several space-separated names.
pub static META_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(article|dc|dcterm|og|twitter)\s*:\s*(author|creator|description|published_time|title|site_name|image)\s*",
    )
    .expect("META_PROPERTY regex")
});

/// `<meta name>` values.
pub static META_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(dc|dcterm|og|twitter|weibo:(?:article|webpage))\s*[-.:]\s*)?(author|creator|description|title|site_name|image)\s*$",
    )
    .expect("META_NAME regex")
});

pub static SCHEMA_ORG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://schema\.org/?$").expect("SCHEMA_ORG regex"));

pub static JSON_LD_ARTICLE_TYPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Article|AdvertiserContentArticle|NewsArticle|AnalysisNewsArticle|AskPublicNewsArticle|BackgroundNewsArticle|OpinionNewsArticle|ReportageNewsArticle|ReviewNewsArticle|Report|SatiricalArticle|ScholarlyArticle|MedicalScholarlyArticle|SocialMediaPosting|BlogPosting|LiveBlogPosting|DiscussionForumPosting|TechArticle|APIReference$",
    )
    .expect("JSON_LD_ARTICLE_TYPES regex")
});

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sidebar-left", true)]
    #[case("comment-list", true)]
    #[case("article-body", false)]
    fn test_unlikely_candidates(#[case] class: &str, #[case] unlikely: bool) {
        let hit = UNLIKELY_CANDIDATES.is_match(class) && !MAYBE_CANDIDATE.is_match(class);
        assert_eq!(hit, unlikely);
    }

    #[test]
    fn test_title_patterns() {
        assert!(TITLE_SEPARATOR.is_match("Breaking News - The Daily Times"));
        assert_eq!(&TITLE_HEAD.captures("Breaking News - The Daily Times").unwrap()[1], "Breaking News ");
        assert_eq!(&TITLE_TAIL.captures("Site | Story title").unwrap()[1], " Story title");
    }

    #[test]
    fn test_videos() {
        assert!(VIDEOS.is_match("https://www.youtube.com/embed/xyz"));
        assert!(VIDEOS.is_match("https://player.vimeo.com/video/1"));
        assert!(!VIDEOS.is_match("https://example.com/video"));
    }

    #[test]
    fn test_srcset_candidates() {
        let found: Vec<_> = SRCSET_CANDIDATE
            .captures_iter("a.jpg 1x, b.jpg 2x")
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(found, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_meta_name() {
        let caps = META_NAME.captures("twitter:title").unwrap();
        assert_eq!(&caps[1], "twitter");
        assert_eq!(&caps[2], "title");
        assert!(META_NAME.is_match("description"));
    }
}
