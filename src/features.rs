//! `<body>` feature stamping.
//!
//! Front-end scripts decide what to initialize from two attributes on the
//! body tag: `data-page` (the page category) and `data-features` (a
//! space-separated list). Both are derived from the document path alone, so
//! the stamp is rewritten on every run and earlier stamps are replaced.

use crate::site::{PageCategory, SitePath};
use crate::walk::{DocumentStep, WalkError};
use regex::Regex;
use std::sync::LazyLock;

const HOME: &[&str] = &[
    "latest-blogs",
    "client-marquee",
    "client-marquee-bg",
    "text-galleries",
    "faq",
    "services-row",
    "drag-scroll",
    "square-patterns",
];
const PRICING: &[&str] = &["text-galleries", "faq", "square-patterns"];
const SERVICES: &[&str] = &["text-galleries", "faq", "square-patterns", "drag-scroll"];
const REFERENCES: &[&str] = &["reference-search", "reference-table-scrollbar", "square-patterns"];
const BLOG_LISTING: &[&str] = &["latest-blogs", "square-patterns"];
const BASE: &[&str] = &["square-patterns"];

static RE_BODY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<body([^>]*)>").unwrap());
static RE_DATA_PAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sdata-page="[^"]*""#).unwrap());
static RE_DATA_FEATURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sdata-features="[^"]*""#).unwrap());

/// Front-end features enabled for a page category.
pub fn features_for(category: PageCategory) -> &'static [&'static str] {
    match category {
        PageCategory::Home => HOME,
        PageCategory::Pricing => PRICING,
        PageCategory::Services => SERVICES,
        PageCategory::References => REFERENCES,
        PageCategory::BlogListing => BLOG_LISTING,
        PageCategory::BlogPost
        | PageCategory::Contact
        | PageCategory::About
        | PageCategory::Sitemap
        | PageCategory::Legal
        | PageCategory::Other => BASE,
    }
}

/// Rewrite the first `<body>` tag with fresh `data-page`/`data-features`
/// attributes. `None` when the document has no body tag.
pub fn stamp_body(html: &str, category: PageCategory, features: &[&str]) -> Option<String> {
    let caps = RE_BODY.captures(html)?;
    let tag = caps.get(0)?;
    let attrs = RE_DATA_PAGE.replace_all(&caps[1], "");
    let attrs = RE_DATA_FEATURES.replace_all(&attrs, "");

    let stamped = format!(
        "<body{attrs} data-page=\"{category}\" data-features=\"{}\">",
        features.join(" ")
    );
    Some(format!("{}{stamped}{}", &html[..tag.start()], &html[tag.end()..]))
}

/// Feature stamping as a tree-walk step.
pub struct FeatureStamp;

impl DocumentStep for FeatureStamp {
    fn name(&self) -> &'static str {
        "features"
    }

    fn rewrite(&self, path: &SitePath, html: &str) -> Result<Option<String>, WalkError> {
        let category = path.category();
        Ok(stamp_body(html, category, features_for(category)))
    }
}
