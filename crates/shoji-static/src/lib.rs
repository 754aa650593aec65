//! Static site builder.
//!
//! Renders a tree of page sources through the component expansion engine,
//! derives a partial-page fragment for each page, copies static assets, and
//! fingerprints the finished output into the client cache asset.

pub mod assets;
pub mod builder;
pub mod fragment;
pub mod stamp;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
