//! Error types for Clearly operations.
//!
//! This module defines the main error type [`ClearlyError`]. Note that a page
//! the heuristics cannot make sense of is *not* an error: extraction reports
//! that case as `Ok(None)`. Errors are reserved for the resource guard, bad
//! caller input and configuration I/O.
//!
//! # Example
//!
//! ```rust
//! use clearly_core::{ClearlyError, Result};
//!
//! fn check_size(found: usize, max: usize) -> Result<()> {
//!     if max > 0 && found > max {
//!         return Err(ClearlyError::TooManyElements { found, max });
//!     }
//!     Ok(())
//! }
//! # assert!(check_size(10, 5).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for article extraction.
///
/// # Example
///
/// ```rust
/// use clearly_core::{Clearly, ClearlyConfig, ClearlyError};
///
/// let config = ClearlyConfig::builder().max_elems_to_parse(2).build();
/// let reader = Clearly::with_config(config);
///
/// match reader.parse("<html><body><div><p>Hi</p></div></body></html>") {
///     Err(ClearlyError::TooManyElements { found, max }) => assert!(found > max),
///     other => panic!("unexpected: {:?}", other.map(|a| a.is_some())),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ClearlyError {
    /// The document holds more elements than `max_elems_to_parse` allows.
    ///
    /// Raised before any processing happens.
    #[error("Aborting parsing document; {found} elements found (maximum is {max})")]
    TooManyElements { found: usize, max: usize },

    /// Invalid URL provided.
    ///
    /// Returned when a base URL cannot be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors.
    ///
    /// Returned for invalid CSS selectors handed to [`Document::select`](crate::Document::select).
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Site configuration errors.
    ///
    /// Returned when a site-config document is not a valid pattern-to-rule map.
    #[error("Site configuration error: {0}")]
    SiteConfigError(String),

    /// Configuration errors.
    ///
    /// Returned when configuration directories are missing or unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File I/O errors.
    #[error("Failed to access file: {0}")]
    WriteError(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ClearlyError.
pub type Result<T> = std::result::Result<T, ClearlyError>;
