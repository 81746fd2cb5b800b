//! Shared test utilities for the sitesync test suite.
//!
//! Provides an isolated copy of the fixture site plus small lookup helpers
//! for pages and run reports.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site();
//! let site = SiteConfig::default();
//! let docs = documents(tmp.path(), &site);
//!
//! let report = run_step(tmp.path(), &docs, &FeatureStamp, Mode::Write);
//! assert!(changed(&report).contains(&"index.html"));
//! assert!(read_page(tmp.path(), "index.html").contains("data-page=\"home\""));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::site::SitePath;
use crate::walk::{RunReport, collect_documents};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Page and report lookups (panic with a clear message on miss)
// =========================================================================

/// All content documents of the site under `root`.
pub fn documents(root: &Path, site: &SiteConfig) -> Vec<SitePath> {
    collect_documents(root, &site.excluded_dirs).unwrap()
}

/// Read a page by site-relative path. Panics if missing.
pub fn read_page(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("page '{rel}' not readable: {e}"))
}

/// Overwrite a page by site-relative path, creating parent directories.
pub fn write_page(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Relative paths of the pages a report marked as changed.
pub fn changed(report: &RunReport) -> Vec<&str> {
    report.changed.iter().map(SitePath::as_str).collect()
}

/// The text between the first occurrence of `start` and the next `end`
/// (inclusive). Panics when either marker is missing.
pub fn section<'a>(html: &'a str, start: &str, end: &str) -> &'a str {
    let from = html
        .find(start)
        .unwrap_or_else(|| panic!("'{start}' not found"));
    let to = html[from..]
        .find(end)
        .map(|i| from + i + end.len())
        .unwrap_or_else(|| panic!("'{end}' not found after '{start}'"));
    &html[from..to]
}
