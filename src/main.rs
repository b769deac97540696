//! cxxdoc: merge analyzer passes over C++ headers into one documentation tree.
//!
//! Two modes:
//!
//! - **stdin mode**: `cxxdoc < pass.json`
//! - **file mode**: `cxxdoc -o docs/tree.json passes/*.json`

use anyhow::{Context, Result};
use clap::Parser;
use cxxdoc::{parser, pipeline, render, Config, PassInput};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `CXXDOC_LOG=debug`.
const LOG_ENV: &str = "CXXDOC_LOG";

#[derive(Parser)]
#[command(
    name = "cxxdoc",
    about = "Build a documentation tree from C++ declaration and comment streams"
)]
struct Cli {
    /// Pass files, directories or glob patterns. If omitted, one pass is read from stdin.
    files: Vec<String>,

    /// Output file (stdout when omitted)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: json (default), outline, rows
    #[arg(short = 'f', long, default_value = "json")]
    format: String,

    /// Config file (TOML). Falls back to $CXXDOC_CONFIG.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Worker threads for pass analysis (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Exit with an error if a pass could not be found, read or analysed
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(threads) = cli.threads {
        config.pipeline.threads = threads;
    }

    let renderer = render::create_renderer(&cli.format)?;

    let (passes, unusable) = if cli.files.is_empty() {
        (vec![stdin_pass()?], 0)
    } else {
        file_passes(&cli.files)?
    };

    let outcome = pipeline::run(&passes, &config).context("analysis failed")?;
    let rendered = renderer.render(&outcome.tree)?;

    match cli.output {
        Some(ref path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote documentation tree");
        }
        None => print!("{}", rendered),
    }

    let failed = outcome.failures.len() + unusable;
    info!(
        passes = outcome.reports.len(),
        failed,
        diagnostics = outcome.all_diagnostics().count(),
        "done"
    );
    if cli.strict && failed > 0 {
        anyhow::bail!("{} of {} pass(es) failed", failed, passes.len() + unusable);
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// stdin mode: a single pass as JSON.
fn stdin_pass() -> Result<PassInput> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    parser::parse_pass(Path::new("<stdin>"), &input).context("failed to parse pass from stdin")
}

/// file mode: read every matched pass file. Files that cannot be read or
/// parsed, and arguments that matched nothing, are logged and counted as
/// failed passes. The rest still run.
fn file_passes(args: &[String]) -> Result<(Vec<PassInput>, usize)> {
    let found = collect_pass_files(args)?;
    let mut passes = Vec::new();
    let mut failed = found.unmatched.len();
    for path in found.files {
        match parser::read_pass(&path) {
            Ok(pass) => passes.push(pass),
            Err(e) => {
                error!(path = %path.display(), "skipping pass: {}", e);
                failed += 1;
            }
        }
    }
    Ok((passes, failed))
}

/// File extensions recognized as pass files when scanning a directory.
const PASS_EXTENSIONS: &[&str] = &["json"];

/// Pass files named on the command line.
#[derive(Debug, Default)]
struct PassFiles {
    /// Sorted and deduplicated, so merge order does not depend on argument order.
    files: Vec<PathBuf>,
    /// Arguments that resolved to no pass file at all.
    unmatched: Vec<String>,
}

/// Resolve each argument to pass files: a file is taken as is, a directory
/// contributes its `*.json` entries (non-recursive), anything else is a glob.
fn collect_pass_files(args: &[String]) -> Result<PassFiles> {
    let mut found = PassFiles::default();
    for arg in args {
        let path = Path::new(arg);
        let matched: Vec<PathBuf> = if path.is_file() {
            vec![path.to_path_buf()]
        } else if path.is_dir() {
            fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| is_pass_file(p))
                .collect()
        } else {
            glob::glob(arg)
                .with_context(|| format!("invalid glob pattern: {}", arg))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect()
        };
        if matched.is_empty() {
            warn!(argument = %arg, "no pass files matched");
            found.unmatched.push(arg.clone());
        }
        found.files.extend(matched);
    }
    found.files.sort();
    found.files.dedup();
    Ok(found)
}

fn is_pass_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| PASS_EXTENSIONS.contains(&ext))
}
