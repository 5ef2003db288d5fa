//! Conversion entry points.
//!
//! A single conversion is synchronous: resolving includes is a depth-first
//! walk over files that each must be read before the next directive can be
//! expanded, so there is nothing to overlap within one document. Many
//! independent documents are another matter; [`convert_batch`] runs them
//! side by side on Tokio's blocking pool.

use crate::config::ConversionConfig;
use crate::error::{LatexDlError, SourceError};
use crate::output::{BatchItem, ConversionOutput, ConversionStats};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::parse::{LatexSyntax, TexSyntax};
use crate::pipeline::resolve::{absolute_path, ResolveReport, Resolver, VisitedFiles};
use crate::pipeline::source::{ContentSource, FsSource};
use crate::pipeline::{postprocess, strip};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// File name given to a document that does not come from a file.
const IN_MEMORY_NAME: &str = "<input>";

/// Convert a LaTeX document to a single flattened, stripped document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — a `.tex` file, a directory holding an unpacked source tree
///   (the entry file is guessed), or `-` for standard input
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some inclusions could not be
/// expanded (check `output.warnings`).
///
/// # Errors
/// Returns `Err(LatexDlError)` only for fatal errors:
/// - Input not found / permission denied / no entry file in a directory
/// - Entry document not UTF-8 or not parsable
pub fn convert(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LatexDlError> {
    let input = input.as_ref();
    info!("Starting conversion: {}", input);

    match input::resolve_input(input)? {
        ResolvedInput::File(path) => convert_with(&FsSource, &path, config),
        ResolvedInput::Stdin(text) => {
            let cwd = std::env::current_dir()
                .map_err(|e| LatexDlError::Internal(format!("No working directory: {e}")))?;
            convert_str(&text, &cwd, config)
        }
    }
}

/// Convert a document held in memory.
///
/// Inclusion directives in `text` resolve against `base_dir` on the local
/// filesystem, as if `text` were a file in that directory.
pub fn convert_str(
    text: &str,
    base_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LatexDlError> {
    let base_dir = absolute_path(base_dir.as_ref());
    let identity = base_dir.join(IN_MEMORY_NAME);
    run(
        &FsSource,
        &TexSyntax,
        &identity,
        || Ok(text.to_owned()),
        &base_dir,
        config,
    )
}

/// Convert the file at `path`, reading it and everything it includes from
/// `source`.
pub fn convert_with(
    source: &dyn ContentSource,
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LatexDlError> {
    convert_with_syntax(source, &TexSyntax, path, config)
}

/// [`convert_with`] using a caller-supplied parser and renderer.
pub fn convert_with_syntax(
    source: &dyn ContentSource,
    syntax: &dyn LatexSyntax,
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LatexDlError> {
    let path = absolute_path(path.as_ref());
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    run(source, syntax, &path, || source.read(&path), &dir, config)
}

/// Convert a document and write the result directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub fn convert_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, LatexDlError> {
    let output = convert(input, config)?;
    write_atomic(output_path.as_ref(), &output.latex)?;
    Ok(output.stats)
}

/// Convert many independent documents concurrently.
///
/// At most `config.concurrency` documents are in flight at once, each on
/// Tokio's blocking pool with its own visited set. Results come back in
/// input order regardless of completion order; one document failing does
/// not affect the others.
pub async fn convert_batch<I, S>(inputs: I, config: &ConversionConfig) -> Vec<BatchItem>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
    let total = inputs.len();
    info!("Starting batch of {} documents", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut items: Vec<(usize, BatchItem)> =
        stream::iter(inputs.into_iter().enumerate().map(|(index, input)| {
            let config = config.clone();
            async move {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_start(index, total, &input);
                }
                let task_input = input.clone();
                let task_config = config.clone();
                let result =
                    match tokio::task::spawn_blocking(move || convert(&task_input, &task_config))
                        .await
                    {
                        Ok(result) => result,
                        Err(e) => Err(LatexDlError::Internal(format!(
                            "Conversion task failed: {e}"
                        ))),
                    };
                if let Some(ref cb) = config.progress_callback {
                    match &result {
                        Ok(output) => cb.on_document_complete(index, total, output.latex.len()),
                        Err(e) => cb.on_document_error(index, total, &e.to_string()),
                    }
                }
                (index, BatchItem { input, result })
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    items.sort_by_key(|(index, _)| *index);
    let succeeded = items.iter().filter(|(_, item)| item.is_ok()).count();
    info!("Batch complete: {}/{} documents converted", succeeded, total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    items.into_iter().map(|(_, item)| item).collect()
}

/// Write `contents` to `path` via a temporary file in the same directory,
/// so readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), LatexDlError> {
    let write_err = |source: std::io::Error| LatexDlError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve, strip, render and polish one document.
fn run<F>(
    source: &dyn ContentSource,
    syntax: &dyn LatexSyntax,
    identity: &Path,
    content: F,
    entry_dir: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LatexDlError>
where
    F: FnOnce() -> Result<String, SourceError>,
{
    let start = Instant::now();

    // ── Step 1: Resolve inclusions ───────────────────────────────────────
    let resolver = Resolver::from_config(source, syntax, entry_dir, config);
    let mut visited = VisitedFiles::new();
    let mut report = ResolveReport::default();
    let tree = resolver.resolve(identity, content, entry_dir, &mut visited, &mut report)?;
    let nodes_before = tree.count();
    debug!(
        "Resolved {}: {} files inlined, {} nodes",
        identity.display(),
        report.included_files.len(),
        nodes_before
    );

    // ── Step 2: Stripping passes ─────────────────────────────────────────
    let tree = strip::apply(tree, config);
    let nodes_after = tree.count();

    // ── Step 3: Render and polish ────────────────────────────────────────
    let mut latex = syntax.render(&tree);
    if config.strip_whitespace {
        latex = postprocess::polish(&latex);
    }

    let stats = ConversionStats {
        files_inlined: report.included_files.len(),
        duplicate_includes: report.duplicate_includes,
        unresolved_includes: report.unresolved_includes,
        nodes_before,
        nodes_after,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} files inlined, {} warnings, {}ms",
        stats.files_inlined,
        report.warnings.len(),
        stats.duration_ms
    );

    Ok(ConversionOutput {
        latex,
        included_files: report.included_files,
        warnings: report.warnings,
        stats,
    })
}
