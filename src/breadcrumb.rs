//! Schema.org `BreadcrumbList` upsert.
//!
//! Every content page except the two homepages gets a JSON-LD breadcrumb
//! block in its `<head>`:
//!
//! ```text
//!     <!-- Breadcrumbs (JSON-LD) -->
//!     <script type="application/ld+json">
//!     {
//!       "@context": "https://schema.org",
//!       "@type": "BreadcrumbList",
//!       "itemListElement": [ … ]
//!     }
//!     </script>
//! ```
//!
//! The trail is built from the page's canonical URL: a language home, an
//! optional section entry, and the page itself. A block inserted by an
//! earlier run is found again by its comment and `BreadcrumbList` marker and
//! replaced in place, so re-running leaves the page byte-identical.

use crate::site::{Lang, SitePath};
use crate::walk::{DocumentStep, WalkError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const COMMENT_LINE: &str = "    <!-- Breadcrumbs (JSON-LD) -->";
const SCRIPT_OPEN: &str = "    <script type=\"application/ld+json\">";
const SCRIPT_CLOSE: &str = "    </script>";
const JSON_INDENT: &str = "    ";

/// Site-name suffixes removed from `<title>` text.
const TITLE_SUFFIXES: &[&str] = &[" - Sugallat Kft.", " - Sugallat Ltd.", " | Sugallat Kft."];
const TITLE_SITE_SEPARATOR: &str = " - Sugallat";

/// Navigation wording for Hungarian pages whose on-page text says otherwise.
const LABEL_OVERRIDES_HU: &[(&str, &str)] = &[
    ("/bemutatkozas", "Rólunk"),
    ("/kapcsolat", "Kapcsolat"),
    ("/referenciak", "Ügyfeleink"),
];

/// `(canonical prefix, label, section path)`: pages strictly below a section.
const SECTIONS_HU: &[(&str, &str, &str)] = &[
    ("/tevekenysegeink/", "Szolgáltatások", "/tevekenysegeink"),
    ("/blog/", "Blog", "/blog"),
];
const SECTIONS_EN: &[(&str, &str, &str)] = &[("/en/blog/", "Blog", "/en/blog")];

/// `(canonical path, label, parent path)`: standalone pages shown under a parent.
const GROUPED_HU: &[(&str, &str, &str)] = &[
    ("/kapcsolat", "Rólunk", "/bemutatkozas"),
    ("/referenciak", "Rólunk", "/bemutatkozas"),
];

static RE_HTML_LANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<html[^>]*\blang="([^"]+)""#).unwrap());
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title>(.*?)</title>").unwrap());
static RE_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_EXISTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)[ \t]*<!--\s*Breadcrumbs[^\n]*?-->\s*<script\s+type="application/ld\+json">([\s\S]*?)</script>"#,
    )
    .unwrap()
});
static RE_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""@type"\s*:\s*"BreadcrumbList""#).unwrap());
static RE_META_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+name="description"[^>]*>"#).unwrap());
static RE_TITLE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</title>").unwrap());

/// One step of a trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

impl Crumb {
    fn new(name: &str, url: String) -> Self {
        Self {
            name: name.to_string(),
            url,
        }
    }
}

/// Ordered crumbs from a language home to the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbTrail {
    pub items: Vec<Crumb>,
}

#[derive(Serialize)]
struct BreadcrumbList<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "itemListElement")]
    items: Vec<ListItem<'a>>,
}

#[derive(Serialize)]
struct ListItem<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    position: usize,
    name: &'a str,
    item: &'a str,
}

/// Language declared on the `<html>` element; Hungarian when absent.
pub fn page_lang(html: &str) -> Lang {
    RE_HTML_LANG
        .captures(html)
        .map(|c| Lang::from_attr(&c[1]))
        .unwrap_or_default()
}

/// Replace the handful of entities that show up in titles and headings.
///
/// Unknown entities are copied through unchanged.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').and_then(|semi| {
            let ch = match &after[..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                entity => numeric_entity(entity),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

/// Visible text of an HTML fragment: tags removed, entities decoded, trimmed.
fn text_content(fragment: &str) -> String {
    decode_entities(&RE_TAG.replace_all(fragment, "")).trim().to_string()
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn first_h1(html: &str) -> Option<String> {
    RE_H1.captures(html).and_then(|c| non_empty(text_content(&c[1])))
}

fn title(html: &str) -> Option<String> {
    RE_TITLE.captures(html).and_then(|c| non_empty(text_content(&c[1])))
}

/// Strip the site name from a page title.
pub fn label_from_title(title: &str) -> Option<String> {
    let title = title.trim();
    let label = TITLE_SUFFIXES
        .iter()
        .find_map(|suffix| title.strip_suffix(suffix))
        .or_else(|| title.split_once(TITLE_SITE_SEPARATOR).map(|(head, _)| head))
        .unwrap_or(title);
    non_empty(label.trim().to_string())
}

/// Display label for the current page.
pub fn page_label(path: &SitePath, html: &str, canonical: &str, lang: Lang) -> String {
    first_h1(html)
        .or_else(|| title(html).and_then(|t| label_from_title(&t)))
        .or_else(|| {
            if lang == Lang::En {
                return None;
            }
            LABEL_OVERRIDES_HU
                .iter()
                .find(|(p, _)| *p == canonical)
                .map(|(_, label)| label.to_string())
        })
        .unwrap_or_else(|| path.stem().to_string())
}

fn page_url(base_url: &str, canonical: &str) -> String {
    if canonical == "/en/" {
        return format!("{base_url}{canonical}");
    }
    format!("{base_url}{canonical}").trim_end_matches('/').to_string()
}

/// Build the trail for a document, or `None` for homepages and paths without
/// a public URL.
pub fn build_trail(path: &SitePath, html: &str, base_url: &str) -> Option<BreadcrumbTrail> {
    if path.is_homepage() {
        return None;
    }
    let lang = page_lang(html);
    let canonical = path.canonical_path(lang)?;
    let label = page_label(path, html, &canonical, lang);

    let english = lang == Lang::En && (path.is_localized() || path.is_blog_post());
    let mut items = Vec::new();
    if english {
        items.push(Crumb::new("Home", format!("{base_url}/en/")));
        for (prefix, name, section) in SECTIONS_EN {
            if canonical.starts_with(prefix) {
                items.push(Crumb::new(name, format!("{base_url}{section}")));
            }
        }
    } else {
        items.push(Crumb::new("Főoldal", format!("{base_url}/")));
        for (prefix, name, section) in SECTIONS_HU {
            if canonical.starts_with(prefix) {
                items.push(Crumb::new(name, format!("{base_url}{section}")));
            }
        }
        for (page, name, parent) in GROUPED_HU {
            if canonical == *page {
                items.push(Crumb::new(name, format!("{base_url}{parent}")));
            }
        }
    }
    items.push(Crumb {
        name: label,
        url: page_url(base_url, &canonical),
    });

    Some(BreadcrumbTrail { items })
}

/// Render the comment plus JSON-LD script, indented for `<head>`, without a
/// trailing newline.
pub fn render_jsonld(trail: &BreadcrumbTrail) -> Result<String, serde_json::Error> {
    let list = BreadcrumbList {
        context: "https://schema.org",
        kind: "BreadcrumbList",
        items: trail
            .items
            .iter()
            .enumerate()
            .map(|(i, crumb)| ListItem {
                kind: "ListItem",
                position: i + 1,
                name: &crumb.name,
                item: &crumb.url,
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&list)?;

    let mut lines = vec![COMMENT_LINE.to_string(), SCRIPT_OPEN.to_string()];
    lines.extend(json.lines().map(|line| format!("{JSON_INDENT}{line}")));
    lines.push(SCRIPT_CLOSE.to_string());
    Ok(lines.join("\n"))
}

/// Replace a previously inserted breadcrumb block, or insert `block` after the
/// meta description (else after `</title>`). `None` when there is no anchor.
pub fn upsert_block(html: &str, block: &str) -> Option<String> {
    let existing = RE_EXISTING
        .captures_iter(html)
        .find(|c| RE_LIST_MARKER.is_match(&c[1]))
        .and_then(|c| c.get(0));
    if let Some(m) = existing {
        return Some(format!("{}{block}{}", &html[..m.start()], &html[m.end()..]));
    }

    let anchor = RE_META_DESCRIPTION
        .find(html)
        .or_else(|| RE_TITLE_CLOSE.find(html))?;
    let at = anchor.end();
    Some(format!("{}\n\n{block}{}", &html[..at], &html[at..]))
}

/// Compute, render and upsert the breadcrumb block of one document.
pub fn upsert_document(
    path: &SitePath,
    html: &str,
    base_url: &str,
) -> Result<Option<String>, serde_json::Error> {
    let Some(trail) = build_trail(path, html, base_url) else {
        return Ok(None);
    };
    let block = render_jsonld(&trail)?;
    let updated = upsert_block(html, &block);
    if updated.is_none() {
        tracing::debug!("{path}: no <meta name=\"description\"> or </title> to anchor breadcrumbs");
    }
    Ok(updated)
}

/// Breadcrumb upsert as a tree-walk step.
pub struct Breadcrumbs<'a> {
    pub base_url: &'a str,
}

impl DocumentStep for Breadcrumbs<'_> {
    fn name(&self) -> &'static str {
        "breadcrumbs"
    }

    fn rewrite(&self, path: &SitePath, html: &str) -> Result<Option<String>, WalkError> {
        Ok(upsert_document(path, html, self.base_url)?)
    }
}
