pub mod directives;
#[cfg(feature = "siteconfig")]
pub mod loader;
pub mod matcher;

pub use directives::{AuthorRule, SiteConfigMap, SiteRule};
#[cfg(feature = "siteconfig")]
pub use loader::{ConfigLoader, ConfigLoaderBuilder};
pub use matcher::pattern_matches;
