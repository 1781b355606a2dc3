// src/config.rs

//! Configuration file support
//!
//! ```toml
//! [convert]
//! # Turn HTML files referenced by module items into pages
//! html_to_page = true
//! scratch_dir = "/var/tmp/cartridge"
//! course_name = "Imported Course"
//!
//! [import]
//! lock_dir = "/var/lib/cartridge/locks"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartridgeConfig {
    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

/// Converter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Promote HTML webcontent referenced by module items to pages
    #[serde(default)]
    pub html_to_page: bool,

    /// Where archives are unpacked (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Name used for the course when the package does not carry one
    #[serde(default)]
    pub course_name: Option<String>,
}

/// Importer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Directory holding per-container lock files
    #[serde(default)]
    pub lock_dir: Option<PathBuf>,
}

impl CartridgeConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }
}
