use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClearlyError, Result};
use crate::siteconfig::directives::SiteConfigMap;

const SITE_CONFIG_FILE: &str = "siteconfig.json";

/// Loads site-config JSON from disk
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Files loaded first, in order
    files: Vec<PathBuf>,
    /// Directory holding `siteconfig.json`
    config_dir: Option<PathBuf>,
    /// Parsed and merged map
    cache: Option<SiteConfigMap>,
}

impl ConfigLoader {
    /// Create a loader with no sources
    pub fn new() -> Self {
        Self { files: Vec::new(), config_dir: None, cache: None }
    }

    /// Parse a single site-config file.
    ///
    /// # Errors
    ///
    /// Returns [`ClearlyError::FileNotFound`] for a missing file and
    /// [`ClearlyError::SiteConfigError`] for invalid content.
    pub fn load_file(path: &Path) -> Result<SiteConfigMap> {
        if !path.exists() {
            return Err(ClearlyError::FileNotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        SiteConfigMap::from_json(&json)
            .map_err(|e| ClearlyError::SiteConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Load and merge every source. Keys from earlier sources take precedence;
    /// a missing `siteconfig.json` in the config directory is not an error.
    pub fn load(&mut self) -> Result<SiteConfigMap> {
        if let Some(map) = &self.cache {
            return Ok(map.clone());
        }

        let mut merged = SiteConfigMap::new();
        for file in &self.files {
            merged.merge(&Self::load_file(file)?);
        }

        if let Some(dir) = &self.config_dir {
            let path = dir.join(SITE_CONFIG_FILE);
            if path.exists() {
                merged.merge(&Self::load_file(&path)?);
            }
        }

        tracing::debug!("loaded {} site-config rules", merged.len());
        self.cache = Some(merged.clone());
        Ok(merged)
    }

    /// Clear the config cache
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Default config directory (~/.config/clearly)
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("clearly"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        let mut builder = ConfigLoaderBuilder::new();
        if let Some(dir) = Self::default_config_dir() {
            builder = builder.config_dir(dir);
        }
        builder.build()
    }
}

/// Builder for ConfigLoader
#[derive(Debug, Default)]
pub struct ConfigLoaderBuilder {
    files: Vec<PathBuf>,
    config_dir: Option<PathBuf>,
}

impl ConfigLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an explicit site-config file
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Set the directory searched for `siteconfig.json`
    pub fn config_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> ConfigLoader {
        ConfigLoader { files: self.files, config_dir: self.config_dir, cache: None }
    }
}
