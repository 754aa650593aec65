//! Static asset copying.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Recursively copy the static tree at `src` into `dst`.
///
/// A missing source directory is fine — not every site ships static files.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walked paths start with the walk root");
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy root-level `*.js` files from the site directory into the output
/// root. This is how the service worker reaches the output tree before the
/// stamp pass rewrites it.
pub fn copy_root_scripts(site_dir: &Path, out_dir: &Path) -> io::Result<usize> {
    if !site_dir.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in fs::read_dir(site_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("js") {
            let name = entry.file_name();
            fs::copy(&path, out_dir.join(name))?;
            copied += 1;
        }
    }

    Ok(copied)
}
