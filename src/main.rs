use clap::{Parser, Subcommand};
use sitesync::walk::{self, DocumentStep, Mode, RunReport};
use sitesync::{breadcrumb, config, css, features, output, sync};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sitesync")]
#[command(about = "Keep the shared blocks of a hand-written HTML site in sync")]
#[command(long_about = "\
Keep the shared blocks of a hand-written HTML site in sync

Every page carries its own copy of the navigation header and the footer.
The master copies live in partials/ and are spliced into each page that
contains both placeholders, with relative links rewritten for the page's
depth and language:

  site/
  ├── sitesync.toml                # Optional config (see gen-config)
  ├── partials/
  │   ├── header-hu.html           # Hungarian header, contains <div id=\"header-placeholder\">
  │   ├── header-en.html           # English header
  │   └── footer.html              # Footer, contains <div id=\"footer-placeholder\">
  ├── index.html                   # Hungarian pages at the root …
  ├── tevekenysegeink/<slug>/index.html
  ├── pages/blog/<post>.html       # … blog posts (language from <html lang>)
  └── pages/en/*.html              # English section

Template variables: {{root}}, {{huHref}}, {{enHref}}, {{enSelfHref}},
{{enContactHref}}, {{enBlogHref}}, {{enSitemapHref}}.

Run 'sitesync gen-config' to generate a documented sitesync.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log every per-page decision
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Splice the header and footer partials into every page
    Sync,
    /// Insert or refresh breadcrumb JSON-LD in every page
    Breadcrumbs,
    /// Stamp data-page and data-features onto every <body>
    Features,
    /// Rewrite global stylesheet links to non-blocking preloads
    CssLinks,
    /// Write .min.css siblings for the configured stylesheets
    MinifyCss,
    /// Run sync → breadcrumbs → features → css-links
    All,
    /// Report pages whose header, footer or breadcrumbs are stale, without writing
    Check,
    /// Print a stock sitesync.toml with all options documented
    GenConfig,
}

/// A tree step selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Sync,
    Breadcrumbs,
    Features,
    CssLinks,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let root = cli.root.as_path();

    let success = match cli.command {
        Command::Sync => all_succeeded(&run_steps(root, &[StepKind::Sync], Mode::Write)?),
        Command::Breadcrumbs => {
            all_succeeded(&run_steps(root, &[StepKind::Breadcrumbs], Mode::Write)?)
        }
        Command::Features => all_succeeded(&run_steps(root, &[StepKind::Features], Mode::Write)?),
        Command::CssLinks => all_succeeded(&run_steps(root, &[StepKind::CssLinks], Mode::Write)?),
        Command::MinifyCss => {
            let site = config::load_config(root)?;
            let outcomes = css::minify_files(root, &site.css)?;
            output::print_minify_output(&outcomes, root);
            true
        }
        Command::All => {
            println!("==> Updating {}", root.display());
            let steps = [
                StepKind::Sync,
                StepKind::Breadcrumbs,
                StepKind::Features,
                StepKind::CssLinks,
            ];
            all_succeeded(&run_steps(root, &steps, Mode::Write)?)
        }
        Command::Check => {
            println!("==> Checking {}", root.display());
            let reports = run_steps(root, &[StepKind::Sync, StepKind::Breadcrumbs], Mode::DryRun)?;
            let clean = all_succeeded(&reports) && reports.iter().all(|r| r.changed.is_empty());
            if clean {
                println!("==> Site is in sync");
            } else {
                println!("==> Site is out of sync, run 'sitesync all'");
            }
            clean
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Load config and documents once, then run `steps` in order over the tree.
///
/// Fragment templates are loaded before any page is touched, so a broken
/// partial aborts the run instead of failing every page.
fn run_steps(
    root: &Path,
    steps: &[StepKind],
    mode: Mode,
) -> Result<Vec<RunReport>, Box<dyn std::error::Error>> {
    let site = config::load_config(root)?;
    init_thread_pool(&site.processing);

    let fragments = if steps.contains(&StepKind::Sync) {
        Some(sync::Fragments::load(root, &site)?)
    } else {
        None
    };

    let mut pipeline: Vec<Box<dyn DocumentStep + '_>> = Vec::with_capacity(steps.len());
    for kind in steps {
        match kind {
            StepKind::Sync => {
                if let Some(fragments) = &fragments {
                    pipeline.push(Box::new(sync::FragmentSync {
                        fragments,
                        placeholders: &site.placeholders,
                    }));
                }
            }
            StepKind::Breadcrumbs => pipeline.push(Box::new(breadcrumb::Breadcrumbs {
                base_url: &site.base_url,
            })),
            StepKind::Features => pipeline.push(Box::new(features::FeatureStamp)),
            StepKind::CssLinks => pipeline.push(Box::new(css::CssLinks {
                targets: &site.css.targets,
            })),
        }
    }

    let documents = walk::collect_documents(root, &site.excluded_dirs)?;
    tracing::debug!("{} documents below {}", documents.len(), root.display());

    let mut reports = Vec::with_capacity(pipeline.len());
    for step in &pipeline {
        let report = walk::run_step(root, &documents, step.as_ref(), mode);
        output::print_report(&report);
        reports.push(report);
    }
    Ok(reports)
}

fn all_succeeded(reports: &[RunReport]) -> bool {
    reports.iter().all(RunReport::is_success)
}

/// Route `tracing` output to stderr.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
/// default is `warn`.
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
