//! Site build orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use shoji_components::{ComponentRegistry, ExpandError, Expander};

use crate::assets;
use crate::fragment::extract_fragment;
use crate::stamp;

/// Placeholder in page markup replaced with the configured base URL.
pub const BASE_URL_TOKEN: &str = "{{BASE_URL}}";

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site source root; root-level `*.js` files (the service worker) are
    /// copied from here into the output root
    pub site_dir: PathBuf,

    /// Page sources directory
    pub pages_dir: PathBuf,

    /// Component templates directory
    pub components_dir: PathBuf,

    /// Static asset directory
    pub static_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Name of the output subdirectory receiving page fragments
    pub fragment_dir: String,

    /// Base URL substituted for `{{BASE_URL}}` in page markup
    pub base_url: String,

    /// File name of the client asset that receives the cache stamp
    pub cache_asset: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            site_dir: PathBuf::from("site"),
            pages_dir: PathBuf::from("site/pages"),
            components_dir: PathBuf::from("site/components"),
            static_dir: PathBuf::from("site/static"),
            output_dir: PathBuf::from("docs"),
            fragment_dir: "_f".to_string(),
            base_url: "/".to_string(),
            cache_asset: "sw.js".to_string(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages rendered
    pub pages: usize,

    /// Number of components registered
    pub components: usize,

    /// Cache stamp token, when the cache asset was present
    pub stamp: Option<String>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Pages directory not found: {0}")]
    MissingPages(String),

    #[error("Failed to expand {path}: {source}")]
    Expand {
        path: String,
        #[source]
        source: ExpandError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Static site builder.
///
/// Renders into a staging directory next to the output and publishes the
/// finished tree in one rename after the stamp pass, so a failed build
/// never leaves a half-written site behind and a stamp is never computed
/// over an incomplete output set.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Build the whole site.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let staging = staging_dir(&self.config.output_dir);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let result = self.build_into(&staging, start);
        if result.is_err() {
            let _ = fs::remove_dir_all(&staging);
        }
        let result = result?;

        let published = if self.config.output_dir.exists() {
            fs::remove_dir_all(&self.config.output_dir)
                .and_then(|()| fs::rename(&staging, &self.config.output_dir))
        } else {
            fs::rename(&staging, &self.config.output_dir)
        };
        if let Err(e) = published {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        tracing::info!(
            "Built {} pages with {} components in {}ms",
            result.pages,
            result.components,
            result.duration_ms
        );

        Ok(result)
    }

    /// Render everything into `out` (the staging directory).
    fn build_into(&self, out: &Path, start: Instant) -> Result<BuildResult, BuildError> {
        let copied = assets::copy_tree(&self.config.static_dir, &out.join("static"))?;
        if copied > 0 {
            tracing::debug!("Copied {} static files", copied);
        }
        assets::copy_root_scripts(&self.config.site_dir, out)?;

        let registry = ComponentRegistry::load(&self.config.components_dir)?;
        if registry.is_empty() {
            tracing::warn!(
                "No components registered from {}",
                self.config.components_dir.display()
            );
        } else {
            tracing::info!("Components: {}", registry.tags().join(", "));
        }
        let expander = Expander::new(&registry);

        let base_url = normalize_base_url(&self.config.base_url);
        let frag_root = out.join(&self.config.fragment_dir);
        fs::create_dir_all(&frag_root)?;

        let mut pages = 0;
        for source in self.discover_pages()? {
            let rel = source
                .strip_prefix(&self.config.pages_dir)
                .unwrap_or(&source)
                .to_path_buf();
            self.build_page(&source, &rel, &expander, &base_url, out, &frag_root)?;
            pages += 1;
        }

        // Stamp runs strictly after every page, fragment, and asset is on
        // disk; it must observe the final bytes of the whole tree.
        let stamp = stamp::apply(out, &self.config.cache_asset)?;
        match &stamp {
            Some(token) => tracing::info!("Cache stamp: {}", token),
            None => tracing::warn!(
                "Cache asset {} not found, skipping stamp",
                self.config.cache_asset
            ),
        }

        Ok(BuildResult {
            pages,
            components: registry.len(),
            stamp,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// All page sources under the pages directory, in sorted path order.
    fn discover_pages(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.config.pages_dir.is_dir() {
            return Err(BuildError::MissingPages(
                self.config.pages_dir.display().to_string(),
            ));
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(&self.config.pages_dir).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("html")
            {
                pages.push(entry.into_path());
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Render one page source: full page at the mirrored relative path,
    /// fragment at the same relative path under the fragment root.
    fn build_page(
        &self,
        source: &Path,
        rel: &Path,
        expander: &Expander<'_>,
        base_url: &str,
        out: &Path,
        frag_root: &Path,
    ) -> Result<(), BuildError> {
        let markup = fs::read_to_string(source)?;

        let html = expander.expand(&markup).map_err(|e| BuildError::Expand {
            path: source.display().to_string(),
            source: e,
        })?;
        let html = html.replace(BASE_URL_TOKEN, base_url);

        let dest = out.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &html)?;

        let fragment = match extract_fragment(&html) {
            Some(f) => f,
            None => {
                tracing::warn!(
                    "{}: no content root, fragment falls back to the full page",
                    rel.display()
                );
                html.as_str()
            }
        };
        let frag_dest = frag_root.join(rel);
        if let Some(parent) = frag_dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&frag_dest, fragment)?;

        tracing::debug!("  {}", rel.display());
        Ok(())
    }
}

/// Base URLs always end with a slash so `{{BASE_URL}}path` joins cleanly.
pub fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Staging directory next to the output: `docs` renders into `docs.staging`.
fn staging_dir(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".staging");
    output.with_file_name(name)
}
