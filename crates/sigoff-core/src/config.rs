//! Run configuration
//!
//! Loaded from a TOML file; every field has a default so a partial (or
//! missing) file works.
//!
//! ```toml
//! input = "offsets.h"
//! output = "offsets.new.h"
//! version_tag = "1_5_97"
//! section = ".text"
//! address_table = "address_table.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::image::DEFAULT_SECTION;
use crate::pipeline::VersionTag;

/// Default configuration file name
pub const CONFIG_FILE: &str = "sigoff.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Annotated offsets file
    pub input: PathBuf,
    /// Rewritten offsets file
    pub output: PathBuf,
    /// Build written into the trailing comment of rewritten lines
    pub version_tag: String,
    /// Code section to scan
    pub section: String,
    /// Optional identifier to offset table enabling `TableSig` annotations
    pub address_table: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.txt"),
            output: PathBuf::from("output.txt"),
            version_tag: "1_5_73".to_string(),
            section: DEFAULT_SECTION.to_string(),
            address_table: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.version()?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn version(&self) -> Result<VersionTag> {
        VersionTag::new(&self.version_tag)
    }
}

/// Builder for Config
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    version_tag: Option<String>,
    section: Option<String>,
    address_table: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn version_tag(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = Some(tag.into());
        self
    }

    pub fn section(mut self, name: impl Into<String>) -> Self {
        self.section = Some(name.into());
        self
    }

    pub fn address_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.address_table = Some(path.into());
        self
    }

    /// Fill unset fields from `base`.
    pub fn build_on(self, base: Config) -> Config {
        Config {
            input: self.input.unwrap_or(base.input),
            output: self.output.unwrap_or(base.output),
            version_tag: self.version_tag.unwrap_or(base.version_tag),
            section: self.section.unwrap_or(base.section),
            address_table: self.address_table.or(base.address_table),
        }
    }

    pub fn build(self) -> Config {
        self.build_on(Config::default())
    }
}
