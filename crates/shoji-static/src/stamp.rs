//! Output fingerprinting for cache busting.
//!
//! After the whole output tree is written, every file is digested in a
//! fixed order and the truncated hash is injected into the client cache
//! asset (the service worker), replacing a literal placeholder. The asset
//! itself is excluded from the digest — stamping it would otherwise change
//! the very bytes the stamp was computed over.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Literal token in the client asset that receives the stamp.
pub const PLACEHOLDER: &str = "{{CACHE_HASH}}";

/// Hex characters kept from the full digest.
const TOKEN_LEN: usize = 8;

/// Digest every file under `root` except those named `exclude`, in
/// lexicographic path order, and return the truncated hex token.
///
/// Identical output bytes always produce the identical token; any
/// single-byte change to any included file changes it.
pub fn compute(root: &Path, exclude: &str) -> io::Result<String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str() == Some(exclude) {
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();

    let mut hasher = Sha256::new();
    for path in files {
        hasher.update(fs::read(&path)?);
    }

    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..TOKEN_LEN].to_string())
}

/// Compute the stamp for `root` and rewrite the asset named `asset` at the
/// output root, substituting [`PLACEHOLDER`].
///
/// Returns `None` without touching anything when the asset does not exist
/// (a site may ship no service worker).
pub fn apply(root: &Path, asset: &str) -> io::Result<Option<String>> {
    let asset_path = root.join(asset);
    if !asset_path.is_file() {
        return Ok(None);
    }

    let token = compute(root, asset)?;
    let contents = fs::read_to_string(&asset_path)?;
    fs::write(&asset_path, contents.replace(PLACEHOLDER, &token))?;

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn identical_trees_produce_identical_tokens() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        for dir in [a.path(), b.path()] {
            fs::create_dir(dir.join("sub")).unwrap();
            fs::write(dir.join("index.html"), "<html>same</html>").unwrap();
            fs::write(dir.join("sub/page.html"), "<html>page</html>").unwrap();
        }

        let token_a = compute(a.path(), "sw.js").unwrap();
        let token_b = compute(b.path(), "sw.js").unwrap();

        assert_eq!(token_a, token_b);
        assert_eq!(token_a.len(), 8);
    }

    #[test]
    fn single_byte_change_changes_the_token() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "<html>aaaa</html>").unwrap();
        let before = compute(temp.path(), "sw.js").unwrap();

        fs::write(temp.path().join("index.html"), "<html>aaab</html>").unwrap();
        let after = compute(temp.path(), "sw.js").unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn excluded_asset_does_not_feed_the_digest() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "content").unwrap();
        fs::write(temp.path().join("sw.js"), "one").unwrap();
        let before = compute(temp.path(), "sw.js").unwrap();

        fs::write(temp.path().join("sw.js"), "completely different").unwrap();
        let after = compute(temp.path(), "sw.js").unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn apply_rewrites_the_placeholder() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "content").unwrap();
        fs::write(
            temp.path().join("sw.js"),
            "const CACHE = 'site-{{CACHE_HASH}}';",
        )
        .unwrap();

        let token = apply(temp.path(), "sw.js").unwrap().unwrap();

        let sw = fs::read_to_string(temp.path().join("sw.js")).unwrap();
        assert_eq!(sw, format!("const CACHE = 'site-{token}';"));
        assert!(!sw.contains(PLACEHOLDER));
    }

    #[test]
    fn apply_without_asset_is_a_no_op() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "content").unwrap();

        assert!(apply(temp.path(), "sw.js").unwrap().is_none());
    }

    #[test]
    fn rerunning_apply_on_identical_output_is_stable() {
        let make = |dir: &Path| {
            fs::write(dir.join("index.html"), "content").unwrap();
            fs::write(dir.join("sw.js"), "v={{CACHE_HASH}}").unwrap();
        };

        let a = tempdir().unwrap();
        make(a.path());
        let token_a = apply(a.path(), "sw.js").unwrap().unwrap();

        let b = tempdir().unwrap();
        make(b.path());
        let token_b = apply(b.path(), "sw.js").unwrap().unwrap();

        assert_eq!(token_a, token_b);
    }
}
