//! Configuration file loading (site.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuration file structure (site.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub assets: Vec<AssetSection>,
}

#[derive(Debug, Deserialize)]
pub struct SiteSection {
    /// Site root holding the category directories
    #[serde(default = "default_root")]
    pub root: String,

    /// Output directory for builds, relative to the root unless absolute
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct StylesSection {
    /// Stylesheet module mounts: name -> base directory
    #[serde(default)]
    pub mounts: BTreeMap<String, String>,
}

/// One static-asset mount: a route prefix over a directory or a named
/// vendor module.
#[derive(Debug, Deserialize)]
pub struct AssetSection {
    pub route: String,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub module: Option<String>,
}

fn default_root() -> String {
    ".".to_string()
}
fn default_output() -> String {
    "_site".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

/// Load configuration from site.toml if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }

    Ok(ConfigFile::default())
}
