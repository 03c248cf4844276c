//! Optional TOML configuration for `emmydump dump`
//!
//! ```toml
//! [output]
//! directory = "Assets/LuaTypes"
//! chunk_threshold_kib = 500
//!
//! [flavors]
//! enabled = ["xlua", "tolua"]
//! ```
//!
//! Command-line flags take precedence over file values.

use anyhow::{bail, Context, Result};
use emmydump_codegen::chunk_writer::DEFAULT_CHUNK_THRESHOLD;
use emmydump_codegen::Flavor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    pub output: OutputConfig,
    pub flavors: FlavorsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: Option<PathBuf>,
    pub chunk_threshold_kib: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlavorsConfig {
    pub enabled: Vec<Flavor>,
}

impl DumpConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub chunk_threshold_kib: Option<usize>,
    pub flavors: Vec<Flavor>,
}

/// Fully resolved settings for one dump run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub chunk_threshold: usize,
    pub flavors: Vec<Flavor>,
}

impl Settings {
    pub fn resolve(config: &DumpConfig, overrides: Overrides) -> Result<Self> {
        let output_dir = overrides
            .output_dir
            .or_else(|| config.output.directory.clone())
            .context("No output directory given (use --output or [output] directory)")?;

        let chunk_threshold = match overrides
            .chunk_threshold_kib
            .or(config.output.chunk_threshold_kib)
        {
            Some(0) => bail!("chunk threshold must be at least 1 KiB"),
            Some(kib) => match kib.checked_mul(1024) {
                Some(bytes) => bytes,
                None => bail!("chunk threshold of {} KiB is too large", kib),
            },
            None => DEFAULT_CHUNK_THRESHOLD,
        };

        let mut flavors = if !overrides.flavors.is_empty() {
            overrides.flavors
        } else if !config.flavors.enabled.is_empty() {
            config.flavors.enabled.clone()
        } else {
            Flavor::ALL.to_vec()
        };
        let mut seen = Vec::new();
        flavors.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });

        Ok(Self {
            output_dir,
            chunk_threshold,
            flavors,
        })
    }
}
