//! Input resolution: normalise a user-supplied argument to a document.
//!
//! Three shapes are accepted:
//!
//! * `-` reads the whole document from standard input
//! * a path to a file is used as is
//! * a path to a directory (an unpacked source tree) is searched for its
//!   entry file with [`find_main_file`]
//!
//! ## Why guess the entry file?
//!
//! Source trees rarely say which file is the one to compile. The file that
//! holds `\documentclass` and the `document` environment usually is, and a
//! few other signals (its name, its size, how much it includes) break the
//! ties. Every `.tex` file is scored and the best one wins; equal scores go
//! to the lexicographically smaller path so the choice is deterministic.

use crate::error::LatexDlError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// The resolved input: text from stdin, or a file to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// Input was `-`; the document text has already been read.
    Stdin(String),
    /// Input was a file, or a directory whose entry file was found.
    File(PathBuf),
}

impl ResolvedInput {
    /// Label for logs and progress output.
    pub fn display_name(&self) -> String {
        match self {
            ResolvedInput::Stdin(_) => "<stdin>".to_string(),
            ResolvedInput::File(path) => path.display().to_string(),
        }
    }
}

/// Check if the input string means standard input.
pub fn is_stdin(input: &str) -> bool {
    input == "-"
}

/// Resolve the input string to a document.
pub fn resolve_input(input: &str) -> Result<ResolvedInput, LatexDlError> {
    if is_stdin(input) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(LatexDlError::Stdin)?;
        debug!("Read {} bytes from standard input", text.len());
        return Ok(ResolvedInput::Stdin(text));
    }
    resolve_path(Path::new(input)).map(ResolvedInput::File)
}

/// Resolve a local path to the file to convert.
pub fn resolve_path(path: &Path) -> Result<PathBuf, LatexDlError> {
    if path.is_file() {
        debug!("Resolved local file: {}", path.display());
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        let main = find_main_file(path)?;
        debug!("Resolved '{}' to entry file {}", path.display(), main.display());
        return Ok(main);
    }
    Err(LatexDlError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Pick the most likely entry file among the `.tex` files under `dir`.
pub fn find_main_file(dir: &Path) -> Result<PathBuf, LatexDlError> {
    let mut best: Option<(u64, PathBuf)> = None;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry while searching {}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_tex_extension(entry.path()) {
            continue;
        }
        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Skipping {}: {e}", entry.path().display());
                continue;
            }
        };
        let score = score_candidate(entry.path(), &String::from_utf8_lossy(&bytes), bytes.len());
        debug!("Entry file candidate {} scored {score}", entry.path().display());

        // Walk order is sorted, so the first path with the top score is the
        // smallest one.
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, entry.into_path()));
        }
    }

    best.map(|(_, path)| path).ok_or_else(|| LatexDlError::NoMainFile {
        dir: dir.to_path_buf(),
    })
}

fn has_tex_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tex"))
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Points are kept in thousandths so the size bonus stays an integer.
const POINT: u64 = 1000;

const MAIN_FILE_NAMES: &[&str] = &["main.tex", "paper.tex", "article.tex"];

static RE_INCLUSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(?:input|include)").unwrap());

/// Score one candidate entry file.
///
/// | Signal | Points |
/// |--------|--------|
/// | named `main.tex`, `paper.tex` or `article.tex` | 5 |
/// | contains `\documentclass` | 3 |
/// | contains both `\begin{document}` and `\end{document}` | 4 |
/// | more than one `\input` / `\include` | 2 |
/// | contains `\bibliography` or `\begin{thebibliography}` | 2 |
/// | size | 1 per 1000 bytes, at most 5 |
fn score_candidate(path: &Path, content: &str, size: usize) -> u64 {
    let mut score = 0;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if MAIN_FILE_NAMES.contains(&name.as_str()) {
        score += 5 * POINT;
    }
    if content.contains("\\documentclass") {
        score += 3 * POINT;
    }
    if content.contains("\\begin{document}") && content.contains("\\end{document}") {
        score += 4 * POINT;
    }
    if RE_INCLUSION.find_iter(content).nth(1).is_some() {
        score += 2 * POINT;
    }
    if content.contains("\\bibliography") || content.contains("\\begin{thebibliography}") {
        score += 2 * POINT;
    }
    score + (size as u64).min(5 * POINT)
}
