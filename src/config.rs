//! Site configuration module.
//!
//! Handles loading, validating, and merging `sitesync.toml`. The file is
//! optional and lives in the site root; any key it sets overrides the stock
//! default, everything else keeps its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_url = "https://www.sugallat.hu"   # Absolute URL prefix for breadcrumb items
//! excluded_dirs = ["export", "content", "scripts", "partials", "docs"]
//!
//! [partials]
//! dir = "partials"                       # Relative to the site root
//! header_hu = "header-hu.html"
//! header_en = "header-en.html"
//! footer = "footer.html"
//!
//! [placeholders]
//! element = "div"
//! header_id = "header-placeholder"
//! footer_id = "footer-placeholder"
//!
//! [css]
//! dir = "css"
//! targets = ["main.css", "components.css", "responsive.css", "square-patterns.css", "hover-animations.css"]
//! minify = ["components.css", "responsive.css", "square-patterns.css", "hover-animations.css"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file in the site root.
pub const CONFIG_FILENAME: &str = "sitesync.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `sitesync.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute site URL without trailing slash, used for breadcrumb items.
    pub base_url: String,
    /// Top-level directories that hold no content pages.
    pub excluded_dirs: Vec<String>,
    /// Where the fragment templates live.
    pub partials: PartialsConfig,
    /// Placeholder element and ids that pages opt into.
    pub placeholders: PlaceholderConfig,
    /// Stylesheet link normalization and minification.
    pub css: CssConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.sugallat.hu".to_string(),
            excluded_dirs: ["export", "content", "scripts", "partials", "docs"]
                .into_iter()
                .map(String::from)
                .collect(),
            partials: PartialsConfig::default(),
            placeholders: PlaceholderConfig::default(),
            css: CssConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "base_url must not end with '/'".into(),
            ));
        }
        let element = &self.placeholders.element;
        if element.is_empty() || !element.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(
                "placeholders.element must be a plain tag name".into(),
            ));
        }
        if self.placeholders.header_id.is_empty() || self.placeholders.footer_id.is_empty() {
            return Err(ConfigError::Validation(
                "placeholder ids must not be empty".into(),
            ));
        }
        if self.placeholders.header_id == self.placeholders.footer_id {
            return Err(ConfigError::Validation(
                "placeholders.header_id and placeholders.footer_id must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Fragment template locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialsConfig {
    /// Directory holding the templates, relative to the site root.
    pub dir: String,
    /// Header for Hungarian pages.
    pub header_hu: String,
    /// Header for pages in the English subtree.
    pub header_en: String,
    /// Footer shared by both languages.
    pub footer: String,
}

impl Default for PartialsConfig {
    fn default() -> Self {
        Self {
            dir: "partials".to_string(),
            header_hu: "header-hu.html".to_string(),
            header_en: "header-en.html".to_string(),
            footer: "footer.html".to_string(),
        }
    }
}

impl PartialsConfig {
    pub fn header_hu_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.header_hu)
    }

    pub fn header_en_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.header_en)
    }

    pub fn footer_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dir).join(&self.footer)
    }
}

/// Placeholder elements that mark replaceable header/footer regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub element: String,
    pub header_id: String,
    pub footer_id: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            element: "div".to_string(),
            header_id: "header-placeholder".to_string(),
            footer_id: "footer-placeholder".to_string(),
        }
    }
}

/// Stylesheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    /// Directory of the stylesheets to minify, relative to the site root.
    pub dir: String,
    /// Stylesheet filenames whose `<link>` tags get the non-blocking form.
    pub targets: Vec<String>,
    /// Stylesheet filenames that get a `.min.css` sibling.
    pub minify: Vec<String>,
}

impl Default for CssConfig {
    fn default() -> Self {
        let minify: Vec<String> = [
            "components.css",
            "responsive.css",
            "square-patterns.css",
            "hover-animations.css",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let mut targets = vec!["main.css".to_string()];
        targets.extend(minify.iter().cloned());
        Self {
            dir: "css".to_string(),
            targets,
            minify,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel document workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `sitesync.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for the site rooted at `root`: stock defaults with
/// `sitesync.toml` (if any) merged on top, validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `sitesync.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitesync configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the site root
# as sitesync.toml. Unknown keys will cause an error.

# Absolute site URL used for breadcrumb items. No trailing slash.
base_url = "https://www.sugallat.hu"

# Top-level directories that contain no content pages. Pages below them are
# never classified, synced, stamped or given breadcrumbs.
excluded_dirs = ["export", "content", "scripts", "partials", "docs"]

# ---------------------------------------------------------------------------
# Fragment templates
# ---------------------------------------------------------------------------
[partials]
# Directory holding the templates, relative to the site root.
dir = "partials"
header_hu = "header-hu.html"
header_en = "header-en.html"
footer = "footer.html"

# ---------------------------------------------------------------------------
# Placeholders
# ---------------------------------------------------------------------------
# A page opts into fragment sync by containing both placeholder elements,
# each at the start of its own line, e.g. <div id="header-placeholder">.
[placeholders]
element = "div"
header_id = "header-placeholder"
footer_id = "footer-placeholder"

# ---------------------------------------------------------------------------
# Stylesheets
# ---------------------------------------------------------------------------
[css]
# Directory of the stylesheets to minify, relative to the site root.
dir = "css"
# Stylesheets loaded with a non-blocking preload + noscript fallback.
targets = ["main.css", "components.css", "responsive.css", "square-patterns.css", "hover-animations.css"]
# Stylesheets that get a .min.css sibling from `sitesync minify-css`.
minify = ["components.css", "responsive.css", "square-patterns.css", "hover-animations.css"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel document workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // Defaults and parsing
    // =========================================================================

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.base_url, "https://www.sugallat.hu");
        assert_eq!(
            config.excluded_dirs,
            vec!["export", "content", "scripts", "partials", "docs"]
        );
        assert_eq!(config.placeholders.element, "div");
        assert_eq!(config.placeholders.header_id, "header-placeholder");
        assert_eq!(config.css.targets.len(), 5);
        assert_eq!(config.css.minify.len(), 4);
    }

    #[test]
    fn partial_paths_join_root_and_dir() {
        let config = PartialsConfig::default();
        let root = Path::new("/site");
        assert_eq!(
            config.header_hu_path(root),
            Path::new("/site/partials/header-hu.html")
        );
        assert_eq!(
            config.footer_path(root),
            Path::new("/site/partials/footer.html")
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
base_url = "https://example.org"

[partials]
dir = "fragments"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "https://example.org");
        assert_eq!(config.partials.dir, "fragments");
        assert_eq!(config.partials.footer, "footer.html");
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn parse_processing_config() {
        let toml = r#"
[processing]
max_processes = 4
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.processing.max_processes, Some(4));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"base_url = "https://a.hu""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"base_url = "https://b.hu""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("base_url").unwrap().as_str(), Some("https://b.hu"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[placeholders]
element = "div"
header_id = "header-placeholder"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[placeholders]
header_id = "site-header"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let placeholders = merged.get("placeholders").unwrap();
        assert_eq!(
            placeholders.get("header_id").unwrap().as_str(),
            Some("site-header")
        );
        assert_eq!(placeholders.get("element").unwrap().as_str(), Some("div"));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"excluded_dirs = ["a", "b"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"excluded_dirs = ["c"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("excluded_dirs").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[placeholders]
header = "x"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let toml_str = r#"
[partial]
dir = "x"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "baseurl = \"https://x.hu\"\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_base_url_scheme() {
        let mut config = SiteConfig::default();
        config.base_url = "www.sugallat.hu".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn validate_base_url_trailing_slash() {
        let mut config = SiteConfig::default();
        config.base_url = "https://www.sugallat.hu/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_placeholder_ids() {
        let mut config = SiteConfig::default();
        config.placeholders.footer_id = config.placeholders.header_id.clone();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.placeholders.header_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_element_name() {
        let mut config = SiteConfig::default();
        config.placeholders.element = "div class".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "base_url = \"ftp://x\"\n").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // resolve_config / load_raw_config tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn load_config_merges_over_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[processing]\nmax_processes = 2\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.partials.dir, "partials");
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.placeholders.footer_id, "footer-placeholder");
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.excluded_dirs, defaults.excluded_dirs);
        assert_eq!(config.css.targets, defaults.css.targets);
        assert_eq!(config.css.minify, defaults.css.minify);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[partials]", "[placeholders]", "[css]", "[processing]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for key in ["base_url", "excluded_dirs", "partials", "placeholders", "css", "processing"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
