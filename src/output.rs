//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Tree steps (`sync`, `breadcrumbs`, `features`, `css-links`)
//!
//! ```text
//! sync: 2 of 14 pages updated
//!     index.html
//!     pages/en/index.html
//! sync: 1 page failed
//!     arak.html
//!         no matching </div> for placeholder `header-placeholder` opened at byte 312
//! ```
//!
//! Under `check` the verb is "would change" and nothing is written.
//!
//! ## Minify
//!
//! ```text
//! components.css → css/components.min.css
//!     Original: 12,345 bytes
//!     Minified: 9,876 bytes
//!     Saved: 2,469 bytes (20.0%)
//! responsive.css: not found
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::css::MinifyOutcome;
use crate::walk::{Mode, RunReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `3 pages`.
fn pages(n: usize) -> String {
    if n == 1 {
        "1 page".to_string()
    } else {
        format!("{n} pages")
    }
}

/// Group digits in threes: `12345` → `12,345`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Tree steps
// ============================================================================

/// Format one step's report: changed pages, then failures with their errors.
pub fn format_report(report: &RunReport) -> Vec<String> {
    let verb = match report.mode {
        Mode::Write => "updated",
        Mode::DryRun => "would change",
    };
    let mut lines = vec![format!(
        "{}: {} of {} {verb}",
        report.step,
        report.changed.len(),
        pages(report.scanned)
    )];
    for path in &report.changed {
        lines.push(format!("{}{path}", indent(1)));
    }

    if !report.failed.is_empty() {
        lines.push(format!("{}: {} failed", report.step, pages(report.failed.len())));
        for failure in &report.failed {
            lines.push(format!("{}{}", indent(1), failure.path));
            lines.push(format!("{}{}", indent(2), failure.error));
        }
    }
    lines
}

/// Print a step report to stdout.
pub fn print_report(report: &RunReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Minify
// ============================================================================

/// Format minification results. Output paths are shown relative to `root`.
pub fn format_minify_output(outcomes: &[MinifyOutcome], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in outcomes {
        match outcome {
            MinifyOutcome::Minified {
                name,
                output,
                original_bytes,
                minified_bytes,
            } => {
                let shown = output.strip_prefix(root).unwrap_or(output);
                let saved = original_bytes.saturating_sub(*minified_bytes);
                let percent = if *original_bytes > 0 {
                    saved as f64 / *original_bytes as f64 * 100.0
                } else {
                    0.0
                };
                lines.push(format!("{name} \u{2192} {}", shown.display()));
                lines.push(format!("{}Original: {} bytes", indent(1), thousands(*original_bytes)));
                lines.push(format!("{}Minified: {} bytes", indent(1), thousands(*minified_bytes)));
                lines.push(format!(
                    "{}Saved: {} bytes ({percent:.1}%)",
                    indent(1),
                    thousands(saved)
                ));
            }
            MinifyOutcome::Missing { name } => lines.push(format!("{name}: not found")),
        }
    }
    lines
}

/// Print minification results to stdout.
pub fn print_minify_output(outcomes: &[MinifyOutcome], root: &Path) {
    for line in format_minify_output(outcomes, root) {
        println!("{}", line);
    }
}
