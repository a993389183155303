/// Log a per-node event at debug level when `debug` is set, at trace otherwise
macro_rules! node_event {
    ($debug:expr, $($arg:tt)+) => {
        if $debug { tracing::debug!($($arg)+) } else { tracing::trace!($($arg)+) }
    };
}

pub mod article;
pub mod clearly;
pub mod dom_tree;
pub mod error;
pub mod extract;
pub mod language;
pub mod metadata;
pub mod outline;
pub mod parse;
pub mod patterns;
pub mod postprocess;
pub mod preprocess;
pub mod scoring;
mod select;
pub mod siteconfig;
pub mod tags;

pub use article::Article;
pub use clearly::{Clearly, ClearlyConfig, ClearlyConfigBuilder, parse, parse_with_url};
pub use dom_tree::{Document, NodeId};
pub use error::{ClearlyError, Result};
pub use extract::{Extracted, Extractor, Flags};
pub use language::detect_language;
pub use metadata::Metadata;
pub use outline::{Link, OutlineEntry};
#[cfg(feature = "siteconfig")]
pub use siteconfig::{ConfigLoader, ConfigLoaderBuilder};
pub use siteconfig::{AuthorRule, SiteConfigMap, SiteRule};
pub use tags::Tag;
