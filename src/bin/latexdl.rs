//! CLI binary for latexdl.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use latexdl::convert::write_atomic;
use latexdl::{
    convert, convert_batch, BatchItem, ClutterSet, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, FileKeyPolicy, ProgressCallback,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: renders a live progress bar and one log line
/// per document using [indicatif]. Documents complete out of order, so start
/// times are tracked per batch index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    inputs: Mutex<HashMap<usize, String>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Flattening");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            inputs: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Seconds since `index` started, and the input it was given.
    fn finish_document(&self, index: usize) -> (f64, String) {
        let elapsed = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let input = self
            .inputs
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .unwrap_or_default();
        (elapsed, input)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_document_start(&self, index: usize, _total: usize, input: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        if let Ok(mut m) = self.inputs.lock() {
            m.insert(index, input.to_string());
        }
        self.bar.set_message(input.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, latex_len: usize) {
        let (elapsed, input) = self.finish_document(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index + 1,
            total,
            input,
            dim(&format!("{latex_len:>7} bytes")),
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let (elapsed, input) = self.finish_document(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // First line only; the full error is reported again at the end.
        let msg = error.lines().next().unwrap_or_default();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            input,
            red(msg),
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents flattened",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents flattened  ({} failed)",
                if success_count == 0 { red("✘") } else { yellow("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Flatten a project to stdout
  latexdl paper/main.tex

  # Let latexdl find the entry file of an unpacked source tree
  latexdl arxiv-2401.00001/ -o flat.tex

  # Keep everything, only splice includes
  latexdl --keep-comments --keep-whitespace --keep-clutter --keep-preamble main.tex

  # Read from stdin; includes resolve against the working directory
  cat main.tex | latexdl -

  # Many documents at once, one output file each
  latexdl papers/*/ -o flat/ -j 8

  # Structured output with included files, warnings and stats
  latexdl --json main.tex > out.json

INCLUSION DIRECTIVES:
  \input{f}, \include{f}               relative to the including file
  \import{d}{f}, \inputfrom{d}{f}      relative to --root (default: entry dir)
  \subimport{d}{f}, \subinputfrom{d}{f} relative to the including file
  \input {f} (space before the brace) and TeX's \input f also work.
  A missing `.tex` extension is added automatically. Files are inlined once;
  cycles and repeats expand to nothing.

CLUTTER CONFIG (--clutter-config):
  { "environments": ["figure", "table"], "commands": ["newcommand", "def"] }
  The file replaces the built-in lists. A field left out means an empty list,
  so {"environments": ["algorithm"]} strips no commands at all.

ENVIRONMENT VARIABLES:
  Every flag can also be set through LATEXDL_<FLAG>, e.g. LATEXDL_KEEP_PREAMBLE=true.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=latexdl=debug).
"#;

/// Flatten multi-file LaTeX projects into a single stripped document.
#[derive(Parser, Debug)]
#[command(
    name = "latexdl",
    version,
    about = "Flatten multi-file LaTeX projects into a single stripped document",
    long_about = "Resolve \\input, \\include, \\import and \\subimport into one self-contained \
LaTeX document, then strip comments, whitespace, floats, macro declarations and the preamble. \
Cycles and repeated inclusions are detected and expanded only once.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// `.tex` files, source directories, or `-` for stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (one input) or directory (several inputs). Default: stdout.
    #[arg(short, long, env = "LATEXDL_OUTPUT")]
    output: Option<PathBuf>,

    /// Keep `%` comments.
    #[arg(long, env = "LATEXDL_KEEP_COMMENTS")]
    keep_comments: bool,

    /// Keep whitespace-only text and blank-line runs.
    #[arg(long, env = "LATEXDL_KEEP_WHITESPACE")]
    keep_whitespace: bool,

    /// Keep figures, tables and macro declarations.
    #[arg(long, env = "LATEXDL_KEEP_CLUTTER")]
    keep_clutter: bool,

    /// Keep everything outside `\begin{document}…\end{document}`.
    #[arg(long, env = "LATEXDL_KEEP_PREAMBLE")]
    keep_preamble: bool,

    /// Directory `\import` resolves against (default: the entry file's directory).
    #[arg(long, env = "LATEXDL_ROOT")]
    root: Option<PathBuf>,

    /// Resolve symlinks when detecting repeated inclusion.
    #[arg(long, env = "LATEXDL_CANONICAL_PATHS")]
    canonical_paths: bool,

    /// JSON file with the environment and command names to strip as clutter.
    #[arg(long, env = "LATEXDL_CLUTTER_CONFIG")]
    clutter_config: Option<PathBuf>,

    /// Output structured JSON (ConversionOutput) instead of LaTeX.
    #[arg(long, env = "LATEXDL_JSON")]
    json: bool,

    /// Number of documents converted at once.
    #[arg(short = 'j', long, env = "LATEXDL_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LATEXDL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LATEXDL_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "LATEXDL_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let batch = cli.inputs.len() > 1;

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

/// One input: the result goes to `--output` or stdout.
async fn run_single(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let input = cli.inputs[0].clone();
    let task_config = config.clone();
    let output = tokio::task::spawn_blocking(move || convert(&input, &task_config))
        .await
        .context("Conversion task panicked")?
        .with_context(|| format!("Conversion of '{}' failed", cli.inputs[0]))?;

    if !cli.quiet {
        report_warnings(&cli.inputs[0], &output);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        emit(cli.output.as_deref(), &format!("{json}\n"))?;
    } else {
        emit(cli.output.as_deref(), &output.latex)?;
    }

    if !cli.quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {} files inlined  {} duplicates skipped  {} unresolved  {}ms{}",
            if output.warnings.is_empty() { green("✔") } else { yellow("⚠") },
            s.files_inlined,
            s.duplicate_includes,
            s.unresolved_includes,
            s.duration_ms,
            cli.output
                .as_ref()
                .map(|p| format!("  →  {}", bold(&p.display().to_string())))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

/// Several inputs: one output file each under `--output`, or all on stdout.
async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let items = convert_batch(cli.inputs.iter().cloned(), config).await;

    if let Some(dir) = cli.output.as_deref() {
        let mut used = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            let Ok(ref output) = item.result else { continue };
            let path = dir.join(output_name(&item.input, index, cli.json, &mut used));
            let contents = if cli.json {
                format!(
                    "{}\n",
                    serde_json::to_string_pretty(output).context("Failed to serialise output")?
                )
            } else {
                output.latex.clone()
            };
            write_atomic(&path, &contents)
                .with_context(|| format!("Failed to write output for '{}'", item.input))?;
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&json_items(&items))
            .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for item in &items {
            if let Ok(ref output) = item.result {
                writeln!(handle, "%% ── {} ──", item.input).context("Failed to write to stdout")?;
                handle
                    .write_all(output.latex.as_bytes())
                    .context("Failed to write to stdout")?;
            }
        }
    }

    if !cli.quiet {
        for item in &items {
            if let Ok(ref output) = item.result {
                report_warnings(&item.input, output);
            }
        }
    }

    let failures: Vec<&BatchItem> = items.iter().filter(|i| !i.is_ok()).collect();
    for item in &failures {
        if let Err(ref e) = item.result {
            eprintln!("{} {}: {}", red("error:"), item.input, e);
        }
    }
    if !failures.is_empty() {
        anyhow::bail!("{} of {} documents failed", failures.len(), items.len());
    }
    Ok(())
}

/// Write to `path` atomically, or to stdout.
fn emit(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => write_atomic(path, contents).context("Failed to write output"),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(contents.as_bytes())
                .context("Failed to write to stdout")
        }
    }
}

fn report_warnings(input: &str, output: &ConversionOutput) {
    for warning in &output.warnings {
        eprintln!("{} {}: {}", yellow("warning:"), input, warning);
    }
}

/// File name for one batch result: the input's stem, made unique.
fn output_name(input: &str, index: usize, json: bool, used: &mut HashSet<String>) -> String {
    let stem = if input == "-" {
        "stdin".to_string()
    } else {
        Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("document-{}", index + 1))
    };
    let ext = if json { "json" } else { "tex" };
    let mut name = format!("{stem}.{ext}");
    let mut suffix = index + 1;
    while !used.insert(name.clone()) {
        name = format!("{stem}-{suffix}.{ext}");
        suffix += 1;
    }
    name
}

#[derive(Serialize)]
struct JsonItem<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a ConversionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn json_items(items: &[BatchItem]) -> Vec<JsonItem<'_>> {
    items
        .iter()
        .map(|item| match &item.result {
            Ok(output) => JsonItem {
                input: &item.input,
                output: Some(output),
                error: None,
            },
            Err(e) => JsonItem {
                input: &item.input,
                output: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .strip_comments(!cli.keep_comments)
        .strip_whitespace(!cli.keep_whitespace)
        .strip_clutter(!cli.keep_clutter)
        .narrow_to_document(!cli.keep_preamble)
        .concurrency(cli.concurrency)
        .key_policy(if cli.canonical_paths {
            FileKeyPolicy::Canonical
        } else {
            FileKeyPolicy::Absolute
        });

    if let Some(ref root) = cli.root {
        builder = builder.root_directory(root);
    }

    if let Some(ref path) = cli.clutter_config {
        let clutter = ClutterSet::from_json_file(path)
            .with_context(|| format!("Failed to load clutter config from {:?}", path))?;
        builder = builder.clutter(clutter);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_never_collide() {
        let mut used = HashSet::new();
        let names: Vec<String> = ["x-3.tex", "a/x.tex", "b/x.tex"]
            .iter()
            .enumerate()
            .map(|(i, input)| output_name(input, i, false, &mut used))
            .collect();
        assert_eq!(names, vec!["x-3.tex", "x.tex", "x-4.tex"]);
    }

    #[test]
    fn output_names_use_input_stems() {
        let mut used = HashSet::new();
        assert_eq!(output_name("paper/main.tex", 0, true, &mut used), "main.json");
        assert_eq!(output_name("-", 1, false, &mut used), "stdin.tex");
        assert_eq!(output_name("other/main.tex", 2, true, &mut used), "main-3.json");
    }
}
