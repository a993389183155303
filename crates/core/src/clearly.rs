//! Main API for article extraction.
//!
//! [`Clearly`] ties the pipeline together: site-config resolution, the
//! element guard, metadata, preprocessing, the scoring attempts, the outline
//! and links, then language and reading time.
//!
//! # Example
//!
//! ```rust
//! use clearly_core::Clearly;
//!
//! let html = "<html><head><title>Hello</title></head><body><p>Too short</p></body></html>";
//! let article = Clearly::new().parse(html).unwrap();
//! assert!(article.is_none());
//! ```

use url::Url;

use crate::article::{Article, block_text};
use crate::dom_tree::Document;
use crate::error::{ClearlyError, Result};
use crate::extract::Extractor;
use crate::language::{count_words, detect_language, format_read_time, is_rtl, read_seconds};
use crate::outline::{build_outline, collect_links};
use crate::preprocess::prepare_document;
use crate::siteconfig::{SiteConfigMap, SiteRule};
use crate::tags::Tag;

/// Content with less text than this needs images to count as an article
const MIN_ARTICLE_TEXT: usize = 100;

/// Images that make up for too little text
const MIN_ARTICLE_IMAGES: usize = 2;

const DEFAULT_CONTENT_TYPE: &str = "article";

/// Configuration for content extraction.
///
/// # Example
///
/// ```rust
/// use clearly_core::ClearlyConfig;
///
/// let config = ClearlyConfig::default();
/// assert_eq!(config.char_threshold, 500);
/// assert_eq!(config.nb_top_candidates, 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClearlyConfig {
    /// Maximum number of elements to parse (0 = unlimited)
    pub max_elems_to_parse: usize,

    /// Number of top candidates kept while ranking
    pub nb_top_candidates: usize,

    /// Characters of text an attempt needs to be accepted
    pub char_threshold: usize,

    /// Classes kept when attributes are stripped
    pub classes_to_preserve: Vec<String>,

    /// Log pruning and cleaning of single nodes at debug level
    pub debug: bool,

    /// Language assumed when detection finds nothing
    pub default_locale: String,

    /// Keep every class attribute in the output
    pub keep_classes: bool,
}

impl Default for ClearlyConfig {
    fn default() -> Self {
        Self {
            max_elems_to_parse: 0,
            nb_top_candidates: 5,
            char_threshold: 500,
            classes_to_preserve: Vec::new(),
            debug: false,
            default_locale: "en".to_string(),
            keep_classes: false,
        }
    }
}

impl ClearlyConfig {
    /// Creates a new builder for ClearlyConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clearly_core::ClearlyConfig;
    ///
    /// let config = ClearlyConfig::builder().char_threshold(250).build();
    /// assert_eq!(config.char_threshold, 250);
    /// ```
    pub fn builder() -> ClearlyConfigBuilder {
        ClearlyConfigBuilder::new()
    }
}

/// Builder for ClearlyConfig.
///
/// # Example
///
/// ```rust
/// use clearly_core::ClearlyConfig;
///
/// let config = ClearlyConfig::builder()
///     .char_threshold(1000)
///     .nb_top_candidates(10)
///     .preserve_class("caption")
///     .default_locale("fr")
///     .build();
/// assert_eq!(config.classes_to_preserve, vec!["caption".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClearlyConfigBuilder {
    config: ClearlyConfig,
}

impl ClearlyConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ClearlyConfig::default() }
    }

    /// Sets the maximum elements to parse.
    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.config.max_elems_to_parse = value;
        self
    }

    /// Sets the number of top candidates.
    pub fn nb_top_candidates(mut self, value: usize) -> Self {
        self.config.nb_top_candidates = value;
        self
    }

    /// Sets the character threshold.
    pub fn char_threshold(mut self, value: usize) -> Self {
        self.config.char_threshold = value;
        self
    }

    /// Replaces the classes kept in the output.
    pub fn classes_to_preserve(mut self, value: Vec<String>) -> Self {
        self.config.classes_to_preserve = value;
        self
    }

    /// Adds one class to keep in the output.
    pub fn preserve_class(mut self, value: impl Into<String>) -> Self {
        self.config.classes_to_preserve.push(value.into());
        self
    }

    /// Sets whether node-level events are logged at debug level.
    pub fn debug(mut self, value: bool) -> Self {
        self.config.debug = value;
        self
    }

    /// Sets the language assumed when detection finds nothing.
    pub fn default_locale(mut self, value: impl Into<String>) -> Self {
        self.config.default_locale = value.into();
        self
    }

    /// Sets whether to preserve all class attributes in output HTML.
    pub fn keep_classes(mut self, value: bool) -> Self {
        self.config.keep_classes = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ClearlyConfig {
        self.config
    }
}

/// Main entry point for content extraction.
///
/// # Example
///
/// ```rust
/// use clearly_core::{Clearly, SiteConfigMap};
///
/// let sites = SiteConfigMap::from_json(r#"{"example.com/login": {"readable": false}}"#).unwrap();
/// let reader = Clearly::new().with_site_config(sites);
///
/// assert!(!reader.is_readable("https://example.com/login"));
/// assert!(reader.is_readable("https://example.com/blog/post"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clearly {
    config: ClearlyConfig,
    site_config: SiteConfigMap,
}

impl Clearly {
    /// Creates a new Clearly instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Clearly instance with a custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clearly_core::{Clearly, ClearlyConfig};
    ///
    /// let config = ClearlyConfig::builder().char_threshold(200).build();
    /// let reader = Clearly::with_config(config);
    /// assert_eq!(reader.config().char_threshold, 200);
    /// ```
    pub fn with_config(config: ClearlyConfig) -> Self {
        Self { config, site_config: SiteConfigMap::new() }
    }

    /// Uses `site_config` for per-site overrides.
    pub fn with_site_config(mut self, site_config: SiteConfigMap) -> Self {
        self.site_config = site_config;
        self
    }

    pub fn config(&self) -> &ClearlyConfig {
        &self.config
    }

    pub fn site_config(&self) -> &SiteConfigMap {
        &self.site_config
    }

    /// Whether the site configuration allows extraction for `url`.
    pub fn is_readable(&self, url: &str) -> bool {
        self.site_config.resolve(url).is_none_or(|(_, rule)| rule.is_readable())
    }

    /// Parses an HTML string and extracts the article.
    ///
    /// Returns `Ok(None)` when no article could be found.
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::TooManyElements`] when the page is larger than
    /// `max_elems_to_parse`.
    pub fn parse(&self, html: &str) -> Result<Option<Article>> {
        let doc = Document::parse(html)?;
        self.parse_document(&doc)
    }

    /// Parses HTML fetched from `url`. The URL resolves relative links and
    /// selects the site rule.
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::InvalidUrl`] if the URL is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use clearly_core::Clearly;
    ///
    /// let result = Clearly::new().parse_with_url("<html></html>", "not a url");
    /// assert!(result.is_err());
    /// ```
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Option<Article>> {
        let doc = Document::parse_with_url(html, url)?;
        self.parse_document(&doc)
    }

    /// Extracts the article from a parsed document, which is left untouched.
    pub fn parse_document(&self, doc: &Document) -> Result<Option<Article>> {
        let default_rule = SiteRule::default();
        let rule = match doc.base_url().and_then(|url| self.site_config.resolve(url.as_str())) {
            Some((pattern, rule)) => {
                tracing::debug!("site-config rule {pattern} matched");
                rule
            }
            None => &default_rule,
        };

        if !rule.is_readable() {
            tracing::debug!("site-config marks the page as not readable");
            return Ok(None);
        }

        let max = self.config.max_elems_to_parse;
        if max > 0 {
            let found = doc.element_count();
            if found > max {
                return Err(ClearlyError::TooManyElements { found, max });
            }
        }

        if doc.body().is_none() {
            tracing::debug!("document has no body");
            return Ok(None);
        }

        let metadata = doc.extract_metadata();
        let mut prepared = doc.clone();
        let author_name = prepare_document(&mut prepared, rule);

        let extractor =
            Extractor::new(&self.config, rule, &metadata.title).with_meta_image(metadata.image.as_deref());
        let Some(mut extracted) = extractor.extract(&prepared) else {
            tracing::debug!("no content found");
            return Ok(None);
        };

        let content = extracted.content;
        let images = extracted.doc.get_elements_by_tag(content, &[Tag::Img]).len();
        if extracted.text_length < MIN_ARTICLE_TEXT && images < MIN_ARTICLE_IMAGES {
            tracing::debug!("content too short ({} characters, {images} images)", extracted.text_length);
            return Ok(None);
        }

        let outline = build_outline(&mut extracted.doc, content, &metadata.title);
        let links = collect_links(&extracted.doc, content);
        let text = block_text(&extracted.doc, content);

        let words_count = count_words(&text);
        let lang = detect_language(&text, &self.config.default_locale);
        let seconds = read_seconds(words_count);

        let dir = extracted
            .dir
            .clone()
            .or_else(|| doc.document_element().and_then(|html| doc.attr(html, "dir")).map(str::to_string))
            .unwrap_or_else(|| if is_rtl(&lang) { "rtl" } else { "ltr" }.to_string());

        let excerpt = metadata.excerpt.clone().or_else(|| {
            extracted
                .doc
                .get_elements_by_tag(content, &[Tag::P])
                .into_iter()
                .map(|p| extracted.doc.inner_text(p))
                .find(|t| !t.is_empty())
        });

        Ok(Some(Article {
            title: metadata.title.clone(),
            html: extracted.html(),
            length: text.chars().count(),
            text,
            byline: metadata.byline.clone().or(extracted.byline.take()),
            author_name,
            cover_url: extracted.cover.take(),
            dir,
            outline,
            links,
            words_count,
            lang,
            read_seconds: seconds,
            read_time: format_read_time(seconds),
            domain: doc.base_url().and_then(domain_of),
            excerpt,
            content_type: rule.content_type.clone().unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            site_name: metadata.site_name,
            published_time: metadata.published_time,
        }))
    }
}

fn domain_of(url: &Url) -> Option<String> {
    url.host_str().map(|host| host.trim_start_matches("www.").to_string())
}

/// Convenience function to parse HTML with default settings.
///
/// # Example
///
/// ```rust
/// use clearly_core::parse;
///
/// let body = "<p>Readable text that goes on for a while, with commas, clauses and more.</p>".repeat(12);
/// let html = format!("<html><head><title>Notes</title></head><body><article>{body}</article></body></html>");
/// let article = parse(&html).unwrap().unwrap();
/// assert_eq!(article.lang, "en");
/// ```
pub fn parse(html: &str) -> Result<Option<Article>> {
    Clearly::new().parse(html)
}

/// Convenience function to parse HTML with a base URL.
pub fn parse_with_url(html: &str, url: &str) -> Result<Option<Article>> {
    Clearly::new().parse_with_url(html, url)
}
