//! # sitesync
//!
//! Maintenance tooling for a hand-written, bilingual static HTML site.
//! Every page carries its own copy of the shared header and footer; the
//! master copies live in `partials/` and this crate keeps the pages in step
//! with them, along with the per-page metadata derived from each page's path.
//!
//! # Architecture: Independent Tree Steps
//!
//! Each maintenance task is a [`walk::DocumentStep`]: a pure function from one
//! page's text to its new text. The walker discovers pages, runs a step over
//! all of them in parallel and writes back only pages whose text changed:
//!
//! ```text
//! sync         partials/*.html  →  header + footer blocks in every page
//! breadcrumbs  page path + <h1>/<title>  →  BreadcrumbList JSON-LD in <head>
//! features     page path  →  <body data-page=… data-features=…>
//! css-links    global stylesheet links  →  preload + noscript pairs
//! ```
//!
//! Steps never depend on each other's output, so any subset can run in any
//! order, and every step is idempotent: a second run reports zero changes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Site-relative paths: language section, page category, canonical URL |
//! | [`resolve`] | Per-page template variables (`root`, language-switch links) |
//! | [`block`] | Balanced placeholder block location by depth counting |
//! | [`render`] | `{{name}}` substitution for fragment templates |
//! | [`sync`] | Header/footer fragment splicing |
//! | [`breadcrumb`] | Breadcrumb trail construction and JSON-LD upsert |
//! | [`features`] | `<body>` feature stamping |
//! | [`css`] | Stylesheet link normalization and minification |
//! | [`walk`] | Page discovery, parallel step driver, run reports |
//! | [`config`] | `sitesync.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Placeholders Survive Syncing
//!
//! Fragment templates consist of their own placeholder element and nothing
//! else, so the block spliced into a page is again a placeholder block, with
//! no stray text landing outside it. Re-running finds the same
//! boundaries and reproduces the same bytes; there is no separate "already
//! synced" marker to keep consistent.
//!
//! ## Depth Counting Instead of an HTML Parser
//!
//! Pages are edited by hand and must round-trip byte for byte outside the
//! replaced blocks. The [`block`] scanner only tracks open/close tags of the
//! placeholder element and leaves every other byte alone, which a DOM
//! parse-and-serialize cycle cannot promise.

pub mod block;
pub mod breadcrumb;
pub mod config;
pub mod css;
pub mod features;
pub mod output;
pub mod render;
pub mod resolve;
pub mod site;
pub mod sync;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
