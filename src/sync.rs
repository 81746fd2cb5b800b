//! Header/footer fragment synchronization.
//!
//! Pages opt in by containing both placeholder elements. For each such page
//! the header template matching the page's language section is rendered
//! against [`resolve_variables`], the footer against [`footer_variables`],
//! and both placeholder blocks are replaced in place:
//!
//! ```text
//! partials/header-hu.html ─┐
//! partials/header-en.html ─┼─ render(ctx) ─ indent ─ splice over located block
//! partials/footer.html ────┘
//! ```
//!
//! The footer is located again after the header splice, since the header
//! replacement shifts every later offset.
//!
//! Templates contain the placeholder element themselves, so a synced page
//! still carries both placeholders and a second run reproduces the exact same
//! bytes. [`Fragments::load`] rejects templates that lack their placeholder
//! or carry anything besides it, since text outside the block would be
//! added again on every run.

use crate::block::{BlockError, PlaceholderBlock, locate_block};
use crate::config::{PlaceholderConfig, SiteConfig};
use crate::render::{render, unresolved_tokens};
use crate::resolve::{footer_variables, resolve_variables};
use crate::site::{Lang, SitePath};
use crate::walk::{DocumentStep, WalkError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot read fragment template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("fragment template {path} does not contain its own `{id}` placeholder")]
    MissingPlaceholder { path: PathBuf, id: String },
    #[error("fragment template {path} has content outside its `{id}` placeholder")]
    ContentOutsidePlaceholder { path: PathBuf, id: String },
    #[error("fragment template {path}: {source}")]
    Block { path: PathBuf, source: BlockError },
}

/// The three fragment templates, loaded once per run and shared read-only.
#[derive(Debug, Clone)]
pub struct Fragments {
    pub header_hu: String,
    pub header_en: String,
    pub footer: String,
}

impl Fragments {
    /// Read the templates named in `config` from below `root`.
    ///
    /// Each template must consist of exactly the placeholder element it
    /// replaces; only whitespace may surround it. Leading whitespace is
    /// dropped from the loaded text.
    pub fn load(root: &Path, config: &SiteConfig) -> Result<Self, SyncError> {
        let placeholders = &config.placeholders;
        let header_hu = read_template(
            &config.partials.header_hu_path(root),
            placeholders,
            &placeholders.header_id,
        )?;
        let header_en = read_template(
            &config.partials.header_en_path(root),
            placeholders,
            &placeholders.header_id,
        )?;
        let footer = read_template(
            &config.partials.footer_path(root),
            placeholders,
            &placeholders.footer_id,
        )?;
        Ok(Self {
            header_hu,
            header_en,
            footer,
        })
    }

    /// Header template for the page's language section.
    pub fn header_for(&self, path: &SitePath) -> &str {
        match path.section_lang() {
            Lang::En => &self.header_en,
            Lang::Hu => &self.header_hu,
        }
    }
}

fn read_template(
    path: &Path,
    placeholders: &PlaceholderConfig,
    id: &str,
) -> Result<String, SyncError> {
    let text = fs::read_to_string(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match locate_block(&text, &placeholders.element, id) {
        Ok(Some(block)) => {
            let outside = [&text[..block.range.start], &text[block.range.end..]];
            if outside.iter().any(|s| !s.trim().is_empty()) {
                return Err(SyncError::ContentOutsidePlaceholder {
                    path: path.to_path_buf(),
                    id: id.to_string(),
                });
            }
            Ok(text.trim_start().to_string())
        }
        Ok(None) => Err(SyncError::MissingPlaceholder {
            path: path.to_path_buf(),
            id: id.to_string(),
        }),
        Err(source) => Err(SyncError::Block {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Prefix every non-empty line with `indent`; blank lines stay empty and
/// trailing whitespace is dropped.
pub fn indent_block(block: &str, indent: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn splice(html: &str, block: &PlaceholderBlock, rendered: &str) -> String {
    let replacement = indent_block(rendered, &block.indent);
    let mut out = String::with_capacity(html.len() - block.range.len() + replacement.len());
    out.push_str(&html[..block.range.start]);
    out.push_str(&replacement);
    out.push_str(&html[block.range.end..]);
    out
}

/// Sync one page's header and footer.
///
/// Returns `Ok(None)` when the page lacks either placeholder (left untouched)
/// and `Ok(Some(text))` with the fully rewritten page otherwise; the caller
/// compares against the original to decide whether to write.
pub fn sync_document(
    html: &str,
    path: &SitePath,
    fragments: &Fragments,
    placeholders: &PlaceholderConfig,
) -> Result<Option<String>, BlockError> {
    let element = placeholders.element.as_str();

    let Some(header) = locate_block(html, element, &placeholders.header_id)? else {
        return Ok(None);
    };
    if locate_block(html, element, &placeholders.footer_id)?.is_none() {
        return Ok(None);
    }

    let header_html = render(fragments.header_for(path), &resolve_variables(path));
    let footer_html = render(&fragments.footer, &footer_variables(path));
    for name in unresolved_tokens(&header_html)
        .into_iter()
        .chain(unresolved_tokens(&footer_html))
    {
        tracing::warn!("{path}: template variable `{name}` has no value");
    }

    let with_header = splice(html, &header, &header_html);

    let Some(footer) = locate_block(&with_header, element, &placeholders.footer_id)? else {
        // The footer placeholder sat inside the replaced header block.
        tracing::warn!("{path}: footer placeholder is nested in the header, page skipped");
        return Ok(None);
    };
    Ok(Some(splice(&with_header, &footer, &footer_html)))
}

/// Fragment sync as a tree-walk step.
pub struct FragmentSync<'a> {
    pub fragments: &'a Fragments,
    pub placeholders: &'a PlaceholderConfig,
}

impl DocumentStep for FragmentSync<'_> {
    fn name(&self) -> &'static str {
        "sync"
    }

    fn rewrite(&self, path: &SitePath, html: &str) -> Result<Option<String>, WalkError> {
        Ok(sync_document(html, path, self.fragments, self.placeholders)?)
    }
}
