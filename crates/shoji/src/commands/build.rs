//! Site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use shoji_static::{BuildConfig, SiteBuilder};

/// Configuration file structure (site.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    site: SiteConfig,
    #[serde(default)]
    build: BuildSettings,
}

#[derive(Debug, Deserialize)]
struct SiteConfig {
    #[serde(default = "default_site_dir")]
    dir: String,
    #[serde(default = "default_output")]
    output: String,
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dir: default_site_dir(),
            output: default_output(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BuildSettings {
    #[serde(default = "default_fragment_dir")]
    fragment_dir: String,
    #[serde(default = "default_cache_asset")]
    cache_asset: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            fragment_dir: default_fragment_dir(),
            cache_asset: default_cache_asset(),
        }
    }
}

fn default_site_dir() -> String {
    "site".to_string()
}
fn default_output() -> String {
    "docs".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_fragment_dir() -> String {
    "_f".to_string()
}
fn default_cache_asset() -> String {
    "sw.js".to_string()
}

/// Load configuration from the config file if it exists.
/// Returns an error if the file exists but is malformed.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>, base_url: Option<String>) -> Result<()> {
    tracing::info!("Building site...");

    let file_config = load_config(config_path)?;

    // CLI flag > BASE_URL env var > config file
    let base_url = base_url
        .or_else(|| std::env::var("BASE_URL").ok())
        .unwrap_or(file_config.site.base_url);

    let site_dir = PathBuf::from(&file_config.site.dir);
    let config = BuildConfig {
        pages_dir: site_dir.join("pages"),
        components_dir: site_dir.join("components"),
        static_dir: site_dir.join("static"),
        site_dir,
        output_dir: output.unwrap_or_else(|| PathBuf::from(&file_config.site.output)),
        fragment_dir: file_config.build.fragment_dir,
        base_url,
        cache_asset: file_config.build.cache_asset,
    };

    let result = SiteBuilder::new(config).build()?;

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
