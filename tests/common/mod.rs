//! Shared fixture setup for the integration tests.

// Not every test file uses every helper
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir(&fixtures, tmp.path());
    tmp
}

fn copy_dir(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            fs::create_dir_all(&target).unwrap();
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Read a page by site-relative path.
pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("page '{rel}' not readable: {e}"))
}
