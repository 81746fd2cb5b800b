//! Site paths, page categories and canonical URLs.
//!
//! Every document is identified by its path relative to the site root,
//! posix-separated (`pages/en/contact.html`). Category, language section,
//! directory depth and public URL are all derived from that string alone, so
//! classification is a pure function of the path.
//!
//! ## Site Layout
//!
//! ```text
//! site/
//! ├── index.html                       # Hungarian homepage          → /
//! ├── kapcsolat.html                   # flat root page              → /kapcsolat
//! ├── blog.html                        # blog listing                → /blog
//! ├── tevekenysegeink/
//! │   ├── index.html                   # services listing            → /tevekenysegeink
//! │   └── kozbeszerzes/index.html      # service subpage             → /tevekenysegeink/kozbeszerzes
//! ├── pages/
//! │   ├── blog/my-post.html            # blog post                   → /blog/my-post (or /en/blog/my-post)
//! │   └── en/
//! │       ├── index.html               # English homepage            → /en/
//! │       └── contact.html             # English page                → /en/contact
//! └── partials/                        # excluded: fragment templates
//! ```
//!
//! Unknown shapes never fail. They classify as [`PageCategory::Other`] and
//! simply have no canonical path when no rule matches.

use std::fmt;
use std::path::Path;

/// Prefix of the English (localized) subtree.
pub const LOCALIZED_PREFIX: &str = "pages/en/";
/// Prefix of the blog post subtree.
pub const BLOG_POST_PREFIX: &str = "pages/blog/";
/// Prefix of the services subtree.
pub const SERVICES_PREFIX: &str = "tevekenysegeink/";

/// Semantic category of a page, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageCategory {
    Home,
    Pricing,
    Services,
    References,
    BlogListing,
    BlogPost,
    Contact,
    About,
    Sitemap,
    Legal,
    Other,
}

impl PageCategory {
    /// Stable name used in `data-page` attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Pricing => "pricing",
            Self::Services => "services",
            Self::References => "references",
            Self::BlogListing => "blog",
            Self::BlogPost => "blog_post",
            Self::Contact => "contact",
            Self::About => "about",
            Self::Sitemap => "sitemap",
            Self::Legal => "legal",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page language. Hungarian is the site default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    Hu,
    En,
}

impl Lang {
    /// Interpret the value of an `<html lang="…">` attribute.
    ///
    /// Only an exact `en` (case-insensitive, surrounding whitespace ignored)
    /// selects English; everything else is the Hungarian default.
    pub fn from_attr(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("en") {
            Self::En
        } else {
            Self::Hu
        }
    }
}

/// Filenames of flat root pages and their categories.
const ROOT_PAGES: &[(&str, PageCategory)] = &[
    ("index.html", PageCategory::Home),
    ("arak.html", PageCategory::Pricing),
    ("kapcsolat.html", PageCategory::Contact),
    ("bemutatkozas.html", PageCategory::About),
    ("referenciak.html", PageCategory::References),
    ("blog.html", PageCategory::BlogListing),
    ("sitemap.html", PageCategory::Sitemap),
    ("adatkezelesi-tajekoztato.html", PageCategory::Legal),
    ("cookie-policy.html", PageCategory::Legal),
];

/// Filenames inside the localized subtree and their categories.
const LOCALIZED_PAGES: &[(&str, PageCategory)] = &[
    ("index.html", PageCategory::Home),
    ("contact.html", PageCategory::Contact),
    ("blog.html", PageCategory::BlogListing),
    ("sitemap.html", PageCategory::Sitemap),
];

fn lookup(table: &[(&str, PageCategory)], name: &str) -> PageCategory {
    table
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
        .unwrap_or(PageCategory::Other)
}

/// A document path relative to the site root, posix-separated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SitePath {
    rel: String,
}

impl SitePath {
    /// Build from a relative path string. Backslashes become slashes and a
    /// leading `./` or `/` is dropped.
    pub fn new(rel: &str) -> Self {
        let normalized = rel.replace('\\', "/");
        let trimmed = normalized
            .trim_start_matches("./")
            .trim_start_matches('/')
            .to_string();
        Self { rel: trimmed }
    }

    /// Build from a filesystem path below `root`. Returns `None` when `path`
    /// is not inside `root`.
    pub fn from_fs(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            rel: parts.join("/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.rel
    }

    /// Final path segment (`contact.html`).
    pub fn file_name(&self) -> &str {
        self.rel.rsplit('/').next().unwrap_or(&self.rel)
    }

    /// Filename without its extension (`contact`).
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }

    /// Number of directory levels between the site root and this document.
    pub fn depth(&self) -> usize {
        self.rel.matches('/').count()
    }

    /// Whether the document lives in the English subtree.
    pub fn is_localized(&self) -> bool {
        self.rel.starts_with(LOCALIZED_PREFIX)
    }

    pub fn is_blog_post(&self) -> bool {
        self.rel.starts_with(BLOG_POST_PREFIX)
    }

    pub fn is_service(&self) -> bool {
        self.rel.starts_with(SERVICES_PREFIX)
    }

    /// The two language homepages get no breadcrumb trail.
    pub fn is_homepage(&self) -> bool {
        self.rel == "index.html" || self.rel == format!("{LOCALIZED_PREFIX}index.html")
    }

    /// Language implied by the path alone (the English subtree is English).
    pub fn section_lang(&self) -> Lang {
        if self.is_localized() {
            Lang::En
        } else {
            Lang::Hu
        }
    }

    /// Classify the page. First matching rule wins; unknown names are `Other`.
    pub fn category(&self) -> PageCategory {
        if self.is_localized() {
            return lookup(LOCALIZED_PAGES, self.file_name());
        }
        if self.is_blog_post() {
            return PageCategory::BlogPost;
        }
        if self.is_service() {
            return PageCategory::Services;
        }
        lookup(ROOT_PAGES, self.file_name())
    }

    /// Public URL path of the page, or `None` for shapes with no public URL.
    ///
    /// `lang` only matters for blog posts, which are shared between the two
    /// language sections and published under `/en/blog/` when written in English.
    pub fn canonical_path(&self, lang: Lang) -> Option<String> {
        let rel = self.rel.as_str();
        if !rel.ends_with(".html") {
            return None;
        }

        match rel {
            "index.html" => return Some("/".to_string()),
            "pages/en/index.html" => return Some("/en/".to_string()),
            "tevekenysegeink/index.html" => return Some("/tevekenysegeink".to_string()),
            "blog.html" => return Some("/blog".to_string()),
            "pages/en/blog.html" => return Some("/en/blog".to_string()),
            _ => {}
        }

        if self.is_service() && rel.ends_with("/index.html") {
            let slug = rel.split('/').nth(1)?;
            return Some(format!("/tevekenysegeink/{slug}"));
        }
        if self.is_blog_post() {
            return Some(match lang {
                Lang::En => format!("/en/blog/{}", self.stem()),
                Lang::Hu => format!("/blog/{}", self.stem()),
            });
        }
        if self.is_localized() {
            return Some(format!("/en/{}", self.stem()));
        }
        if !rel.contains('/') {
            return Some(format!("/{}", self.stem()));
        }
        None
    }
}

impl fmt::Display for SitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel)
    }
}
