//! Stylesheet tooling: non-blocking `<link>` normalization and minification.
//!
//! Link normalization works line by line. A line that holds nothing but a
//! stylesheet `<link>`, a style preload, or a `<noscript>` stylesheet
//! fallback for one of the target stylesheets is collapsed into the canonical
//! pair:
//!
//! ```text
//! <link rel="preload" href="css/main.css" as="style" onload="this.onload=null;this.rel='stylesheet'">
//! <noscript><link rel="stylesheet" href="css/main.css"></noscript>
//! ```
//!
//! The pair is emitted once per href at its first link line; every other
//! line for the same href is dropped.

use crate::config::CssConfig;
use crate::site::SitePath;
use crate::walk::{DocumentStep, WalkError};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CssError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

static RE_STYLESHEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)<link\s+rel="stylesheet"\s+href="([^"]+)">\s*$"#).unwrap()
});
static RE_PRELOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)<link\s+rel="preload"\s+href="([^"]+)"\s+as="style"[^>]*>\s*$"#).unwrap()
});
static RE_NOSCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)<noscript><link\s+rel="stylesheet"\s+href="([^"]+)"></noscript>\s*$"#)
        .unwrap()
});

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([{}:;,>+~])\s*").unwrap());
static RE_TRAILING_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Stylesheet,
    Preload,
    Noscript,
}

struct LinkLine<'a> {
    kind: LinkKind,
    indent: &'a str,
    href: &'a str,
}

fn parse_link(line: &str) -> Option<LinkLine<'_>> {
    [
        (LinkKind::Stylesheet, &*RE_STYLESHEET),
        (LinkKind::Preload, &*RE_PRELOAD),
        (LinkKind::Noscript, &*RE_NOSCRIPT),
    ]
    .into_iter()
    .find_map(|(kind, re)| {
        let caps = re.captures(line)?;
        Some(LinkLine {
            kind,
            indent: caps.get(1)?.as_str(),
            href: caps.get(2)?.as_str(),
        })
    })
}

/// Whether `href` points at one of the target stylesheets, by filename.
pub fn is_target_href(href: &str, targets: &[String]) -> bool {
    targets.iter().any(|name| href.ends_with(name.as_str()))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Normalize target stylesheet links. `None` when the document has none.
pub fn normalize_links(html: &str, targets: &[String]) -> Option<String> {
    let lines: Vec<(&str, &str)> = html.split_inclusive('\n').map(split_line_ending).collect();
    let parsed: Vec<Option<LinkLine<'_>>> = lines
        .iter()
        .map(|(body, _)| parse_link(body).filter(|l| is_target_href(l.href, targets)))
        .collect();

    // Hrefs that get a canonical pair; their standalone fallbacks go away.
    let linked: HashSet<&str> = parsed
        .iter()
        .flatten()
        .filter(|l| l.kind != LinkKind::Noscript)
        .map(|l| l.href)
        .collect();
    if parsed.iter().all(Option::is_none) {
        return None;
    }

    let mut emitted: HashSet<&str> = HashSet::new();
    let mut out = String::with_capacity(html.len());
    for ((body, ending), link) in lines.iter().zip(&parsed) {
        let Some(link) = link else {
            out.push_str(body);
            out.push_str(ending);
            continue;
        };
        match link.kind {
            LinkKind::Noscript if !linked.contains(link.href) => {
                out.push_str(body);
                out.push_str(ending);
            }
            LinkKind::Noscript => {}
            LinkKind::Stylesheet | LinkKind::Preload => {
                if !emitted.insert(link.href) {
                    continue;
                }
                let (indent, href) = (link.indent, link.href);
                let newline = if ending.is_empty() { "\n" } else { *ending };
                out.push_str(&format!(
                    "{indent}<link rel=\"preload\" href=\"{href}\" as=\"style\" onload=\"this.onload=null;this.rel='stylesheet'\">{newline}"
                ));
                out.push_str(&format!(
                    "{indent}<noscript><link rel=\"stylesheet\" href=\"{href}\"></noscript>{ending}"
                ));
            }
        }
    }
    Some(out)
}

/// Link normalization as a tree-walk step.
pub struct CssLinks<'a> {
    pub targets: &'a [String],
}

impl DocumentStep for CssLinks<'_> {
    fn name(&self) -> &'static str {
        "css-links"
    }

    fn rewrite(&self, _path: &SitePath, html: &str) -> Result<Option<String>, WalkError> {
        Ok(normalize_links(html, self.targets))
    }
}

/// Minify a stylesheet: comments out, whitespace collapsed and removed around
/// punctuation, final semicolons of blocks dropped.
pub fn minify_css(css: &str) -> String {
    let css = RE_COMMENT.replace_all(css, "");
    let css = RE_WHITESPACE.replace_all(&css, " ");
    let css = RE_PUNCTUATION.replace_all(&css, "$1");
    let css = RE_TRAILING_SEMICOLON.replace_all(&css, "}");
    css.trim().to_string()
}

/// Result of minifying one configured stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinifyOutcome {
    Minified {
        name: String,
        output: PathBuf,
        original_bytes: usize,
        minified_bytes: usize,
    },
    Missing {
        name: String,
    },
}

/// Write a `.min.css` sibling for every stylesheet listed in `config.minify`.
pub fn minify_files(root: &Path, config: &CssConfig) -> Result<Vec<MinifyOutcome>, CssError> {
    let dir = root.join(&config.dir);
    let mut outcomes = Vec::with_capacity(config.minify.len());

    for name in &config.minify {
        let source = dir.join(name);
        if !source.is_file() {
            tracing::warn!("stylesheet {} not found", source.display());
            outcomes.push(MinifyOutcome::Missing { name: name.clone() });
            continue;
        }

        let css = fs::read_to_string(&source).map_err(|e| CssError::Io {
            path: source.clone(),
            source: e,
        })?;
        let minified = minify_css(&css);
        let output = source.with_extension("min.css");
        fs::write(&output, &minified).map_err(|e| CssError::Io {
            path: output.clone(),
            source: e,
        })?;
        tracing::debug!("minified {} -> {}", source.display(), output.display());

        outcomes.push(MinifyOutcome::Minified {
            name: name.clone(),
            output,
            original_bytes: css.len(),
            minified_bytes: minified.len(),
        });
    }
    Ok(outcomes)
}
