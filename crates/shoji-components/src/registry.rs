//! Component template registry.
//!
//! Loads template files from a directory and provides lookup by tag name
//! for the expansion engine.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// A named component template.
#[derive(Debug, Clone)]
pub struct ComponentTemplate {
    /// Custom element tag name (always contains a hyphen)
    pub tag: String,

    /// Raw template markup, with `<slot>` / `<slot name="...">` placeholders
    pub markup: String,
}

/// A registry of component templates, keyed by tag name.
///
/// Loaded once per build and read-only afterwards; the builder passes it by
/// reference into the expansion engine.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    templates: HashMap<String, ComponentTemplate>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load component templates from a directory.
    ///
    /// Only `.html` files whose stem contains a hyphen register — the custom
    /// element naming rule; anything else is skipped, not an error. Files are
    /// read in sorted filename order so duplicate tags resolve deterministically
    /// (last read wins). A missing directory yields an empty registry, which
    /// makes expansion a pass-through.
    pub fn load(dir: &Path) -> io::Result<Self> {
        let mut registry = Self::new();

        if !dir.is_dir() {
            return Ok(registry);
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }

            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s,
                None => continue,
            };
            if !stem.contains('-') {
                continue;
            }

            let markup = fs::read_to_string(&path)?;
            registry.templates.insert(
                stem.to_string(),
                ComponentTemplate {
                    tag: stem.to_string(),
                    markup,
                },
            );
        }

        Ok(registry)
    }

    /// Look up a template by tag name.
    pub fn get(&self, tag: &str) -> Option<&ComponentTemplate> {
        self.templates.get(tag)
    }

    /// Check if a tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.templates.contains_key(tag)
    }

    /// All registered tag names, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry has no components.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
