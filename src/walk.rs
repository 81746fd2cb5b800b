//! Document discovery and per-document rewrite driving.
//!
//! A run is a full pass over the site: every `.html` file below the root,
//! minus the excluded top-level directories, sorted by relative path. Each
//! document is an independent unit of work, so the pass runs on the rayon
//! pool; results come back in input order, keeping reports reproducible.
//!
//! A document is read once, transformed in memory and written back only when
//! the new text differs from what is on disk. A step that fails for one
//! document (an unbalanced placeholder, an unreadable file) is recorded in the
//! report and the run moves on to the next document; nothing is written for
//! the failed document.

use crate::block::BlockError;
use crate::site::SitePath;
use rayon::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One rewrite applied to every document of a run.
///
/// `rewrite` returns `Ok(None)` when the step does not apply to the document
/// (no anchors, not a content page) and `Ok(Some(text))` with the complete new
/// text otherwise. Returning the unchanged text is fine; the walker compares.
pub trait DocumentStep: Sync {
    /// Short name used in reports and logs.
    fn name(&self) -> &'static str;

    fn rewrite(&self, path: &SitePath, html: &str) -> Result<Option<String>, WalkError>;
}

/// Whether changed documents are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    DryRun,
}

/// A document the step could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub path: SitePath,
    pub error: String,
}

/// Outcome of one step over the whole site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub step: &'static str,
    pub mode: Mode,
    pub scanned: usize,
    pub changed: Vec<SitePath>,
    pub failed: Vec<DocumentFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

/// All content documents below `root`, sorted by relative path.
pub fn collect_documents(root: &Path, excluded: &[String]) -> Result<Vec<SitePath>, WalkError> {
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() != 1 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !excluded.iter().any(|e| e.as_str() == name.as_ref())
    });

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_html(entry.path()) {
            continue;
        }
        if let Some(path) = SitePath::from_fs(root, entry.path()) {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

/// Apply `step` to one document. Returns whether its content changed.
pub fn process_document(
    root: &Path,
    path: &SitePath,
    step: &dyn DocumentStep,
    mode: Mode,
) -> Result<bool, WalkError> {
    let file = root.join(path.as_str());
    let original = fs::read_to_string(&file).map_err(|source| WalkError::Io {
        path: file.clone(),
        source,
    })?;

    let Some(updated) = step.rewrite(path, &original)? else {
        tracing::debug!("{}: {path} skipped", step.name());
        return Ok(false);
    };
    if updated == original {
        tracing::debug!("{}: {path} unchanged", step.name());
        return Ok(false);
    }

    if mode == Mode::Write {
        atomic_write(&file, &updated).map_err(|source| WalkError::Io {
            path: file.clone(),
            source,
        })?;
    }
    tracing::debug!("{}: {path} changed", step.name());
    Ok(true)
}

/// Replace `path` with `content` through a sibling temp file and a rename, so
/// the page is never left half-written. Permissions of the existing file carry
/// over.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let temp = path.with_file_name(format!(".{name}.sitesync-tmp"));

    let result = write_and_rename(&temp, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_and_rename(temp: &Path, path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::File::create(temp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp, meta.permissions())?;
    }
    fs::rename(temp, path)
}

/// Run `step` over `documents` and collect the report.
pub fn run_step(
    root: &Path,
    documents: &[SitePath],
    step: &dyn DocumentStep,
    mode: Mode,
) -> RunReport {
    let outcomes: Vec<(&SitePath, Result<bool, WalkError>)> = documents
        .par_iter()
        .map(|path| (path, process_document(root, path, step, mode)))
        .collect();

    let mut changed = Vec::new();
    let mut failed = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(true) => changed.push(path.clone()),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("{}: {path} failed: {e}", step.name());
                failed.push(DocumentFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    RunReport {
        step: step.name(),
        mode,
        scanned: documents.len(),
        changed,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Uppercases `<title>` content, fails on documents containing "BROKEN".
    struct ShoutTitle;

    impl DocumentStep for ShoutTitle {
        fn name(&self) -> &'static str {
            "shout"
        }

        fn rewrite(&self, _path: &SitePath, html: &str) -> Result<Option<String>, WalkError> {
            if html.contains("BROKEN") {
                return Err(BlockError::Unbalanced {
                    element: "div".into(),
                    id: "header-placeholder".into(),
                    offset: 0,
                }
                .into());
            }
            if !html.contains("<title>") {
                return Ok(None);
            }
            Ok(Some(html.to_uppercase()))
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn excluded() -> Vec<String> {
        vec!["partials".to_string(), "export".to_string()]
    }

    fn rels(paths: &[SitePath]) -> Vec<&str> {
        paths.iter().map(SitePath::as_str).collect()
    }

    #[test]
    fn collects_sorted_html_outside_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.html", "");
        write(tmp.path(), "b.HTML", "");
        write(tmp.path(), "a/index.html", "");
        write(tmp.path(), "a.html", "");
        write(tmp.path(), "style.css", "");
        write(tmp.path(), "partials/header-hu.html", "");
        write(tmp.path(), "export/index.html", "");
        write(tmp.path(), "pages/partials/kept.html", "");

        let docs = collect_documents(tmp.path(), &excluded()).unwrap();
        assert_eq!(
            rels(&docs),
            vec!["a.html", "a/index.html", "b.HTML", "index.html", "pages/partials/kept.html"]
        );
    }

    #[test]
    fn run_writes_only_changed_documents() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.html", "<title>a</title>");
        write(tmp.path(), "b.html", "<TITLE>B</TITLE>");
        write(tmp.path(), "c.html", "no title");

        let docs = collect_documents(tmp.path(), &excluded()).unwrap();
        let report = run_step(tmp.path(), &docs, &ShoutTitle, Mode::Write);

        assert_eq!(report.scanned, 3);
        assert_eq!(rels(&report.changed), vec!["a.html"]);
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.html")).unwrap(),
            "<TITLE>A</TITLE>"
        );
        assert_eq!(fs::read_to_string(tmp.path().join("c.html")).unwrap(), "no title");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.html", "<title>a</title>");

        let docs = collect_documents(tmp.path(), &excluded()).unwrap();
        let report = run_step(tmp.path(), &docs, &ShoutTitle, Mode::DryRun);

        assert_eq!(rels(&report.changed), vec!["a.html"]);
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.html")).unwrap(),
            "<title>a</title>"
        );
    }

    #[test]
    fn failures_are_collected_and_others_continue() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.html", "<title>a</title> BROKEN");
        write(tmp.path(), "b.html", "<title>b</title>");

        let docs = collect_documents(tmp.path(), &excluded()).unwrap();
        let report = run_step(tmp.path(), &docs, &ShoutTitle, Mode::Write);

        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path.as_str(), "a.html");
        assert!(report.failed[0].error.contains("header-placeholder"));
        assert_eq!(rels(&report.changed), vec!["b.html"]);
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.html")).unwrap(),
            "<title>a</title> BROKEN"
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.html", "<title>a</title>");
        let docs = collect_documents(tmp.path(), &excluded()).unwrap();

        run_step(tmp.path(), &docs, &ShoutTitle, Mode::Write);
        let again = run_step(tmp.path(), &docs, &ShoutTitle, Mode::Write);
        assert!(again.changed.is_empty());
    }

    #[test]
    fn unreadable_document_is_a_failure() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.html"), [0xff, 0xfe, 0x00]).unwrap();
        let docs = collect_documents(tmp.path(), &excluded()).unwrap();
        let report = run_step(tmp.path(), &docs, &ShoutTitle, Mode::Write);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.contains("bad.html"));
    }

    #[test]
    fn atomic_write_replaces_content_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.html", "<title>old</title>");
        let page = tmp.path().join("index.html");

        atomic_write(&page, "<title>new</title>").unwrap();
        assert_eq!(fs::read_to_string(&page).unwrap(), "<title>new</title>");
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["index.html"]);
    }

    #[test]
    fn atomic_write_failure_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let page = tmp.path().join("missing/index.html");
        assert!(atomic_write(&page, "x").is_err());
        assert!(!tmp.path().join("missing").exists());
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.html", "old");
        let page = tmp.path().join("index.html");
        fs::set_permissions(&page, fs::Permissions::from_mode(0o640)).unwrap();

        atomic_write(&page, "new").unwrap();
        let mode = fs::metadata(&page).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
