//! Per-page template variables.
//!
//! Fragment templates are written once for the whole site, but the links they
//! contain depend on where each page sits. This module derives those values
//! from a [`SitePath`] alone:
//!
//! | Variable | Hungarian page | English page |
//! |----------|----------------|--------------|
//! | `root` | `../` per directory level | same |
//! | `huHref` | own filename (`./` for an `index.html`) | `root` + Hungarian counterpart |
//! | `enHref` | `root` + English counterpart | own filename |
//! | `enSelfHref`, `enContactHref`, `enBlogHref`, `enSitemapHref` | unset | convenience links |
//!
//! Pages without a known counterpart link to the other language's homepage.

use crate::site::SitePath;
use std::collections::BTreeMap;

pub const ROOT: &str = "root";
pub const HU_HREF: &str = "huHref";
pub const EN_HREF: &str = "enHref";
pub const EN_SELF_HREF: &str = "enSelfHref";
pub const EN_CONTACT_HREF: &str = "enContactHref";
pub const EN_BLOG_HREF: &str = "enBlogHref";
pub const EN_SITEMAP_HREF: &str = "enSitemapHref";

/// Hungarian page ↔ English page, both relative to the site root.
const LANGUAGE_PAIRS: &[(&str, &str)] = &[
    ("index.html", "pages/en/index.html"),
    ("kapcsolat.html", "pages/en/contact.html"),
    ("blog.html", "pages/en/blog.html"),
    ("sitemap.html", "pages/en/sitemap.html"),
];

const HU_HOME: &str = "index.html";
const EN_HOME: &str = "pages/en/index.html";

/// Variable name → value mapping used to render one fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    vars: BTreeMap<String, String>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// `../` repeated once per directory level. Empty at the root.
pub fn root_prefix(depth: usize) -> String {
    "../".repeat(depth)
}

/// Link from a page to itself within its own language.
///
/// Directory index pages link to `./` so the public URL stays the pretty
/// directory form; everything else links to its own filename.
pub fn self_href(path: &SitePath) -> String {
    if path.file_name() == "index.html" {
        "./".to_string()
    } else {
        path.file_name().to_string()
    }
}

/// Root-relative target of the same page in the other language.
pub fn alternate_target(path: &SitePath) -> &'static str {
    let rel = path.as_str();
    if path.is_localized() {
        LANGUAGE_PAIRS
            .iter()
            .find(|(_, en)| *en == rel)
            .map(|(hu, _)| *hu)
            .unwrap_or(HU_HOME)
    } else {
        LANGUAGE_PAIRS
            .iter()
            .find(|(hu, _)| *hu == rel)
            .map(|(_, en)| *en)
            .unwrap_or(EN_HOME)
    }
}

/// Full header context for a page.
pub fn resolve_variables(path: &SitePath) -> VariableContext {
    let root = root_prefix(path.depth());
    let alternate = format!("{root}{}", alternate_target(path));

    let mut ctx = VariableContext::new();
    if path.is_localized() {
        let own = path.file_name().to_string();
        ctx.insert(HU_HREF, alternate);
        ctx.insert(EN_HREF, own.clone());
        ctx.insert(EN_SELF_HREF, own);
        ctx.insert(EN_CONTACT_HREF, "contact.html");
        ctx.insert(EN_BLOG_HREF, "blog.html");
        ctx.insert(EN_SITEMAP_HREF, "sitemap.html");
    } else {
        ctx.insert(HU_HREF, self_href(path));
        ctx.insert(EN_HREF, alternate);
    }
    ctx.insert(ROOT, root);
    ctx
}

/// Footer context: the footer only ever needs the root prefix.
pub fn footer_variables(path: &SitePath) -> VariableContext {
    let mut ctx = VariableContext::new();
    ctx.insert(ROOT, root_prefix(path.depth()));
    ctx
}
