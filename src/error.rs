//! Error types for the latexdl library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LatexDlError`] — **Fatal**: the conversion cannot proceed at all
//!   (entry file missing, root file unreadable or unparsable, output not
//!   writable). Returned as `Err(LatexDlError)` from the `convert*` functions.
//!
//! * [`IncludeWarning`] — **Non-fatal**: one inclusion directive could not be
//!   expanded, but the rest of the document is fine. Collected into
//!   [`crate::output::ConversionOutput::warnings`] so callers can inspect a
//!   partially flattened result rather than losing the whole document to one
//!   bad `\input`.
//!
//! [`SourceError`] and [`ParseError`] are the leaf errors of the two
//! pluggable capabilities (reading content, parsing it); they are mapped into
//! one of the above depending on whether they hit the root or an inclusion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the latexdl library.
#[derive(Debug, Error)]
pub enum LatexDlError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("LaTeX file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The root file exists but is not valid UTF-8 text.
    #[error("File '{path}' is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },

    /// A directory was given but no `.tex` file in it looks like an entry file.
    #[error("No main LaTeX file found under '{dir}'")]
    NoMainFile { dir: PathBuf },

    /// Reading the root file failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading standard input failed.
    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The root document could not be parsed at all.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a clutter file could not be loaded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LatexDlError {
    /// Map a failed read of the root file to its fatal error.
    pub fn from_source(path: PathBuf, err: SourceError) -> Self {
        match err {
            SourceError::NotFound => LatexDlError::FileNotFound { path },
            SourceError::NotUtf8 => LatexDlError::NotUtf8 { path },
            SourceError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                LatexDlError::PermissionDenied { path }
            }
            SourceError::Io(source) => LatexDlError::Read { path, source },
        }
    }
}

/// Failure to read one file from a [`crate::pipeline::source::ContentSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file does not exist")]
    NotFound,

    #[error("content is not valid UTF-8")]
    NotUtf8,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the LaTeX parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Groups, arguments or environments nest deeper than the parser allows.
    #[error("nesting deeper than {limit} levels at byte {offset}")]
    TooDeep { limit: usize, offset: usize },
}

/// A non-fatal problem with one inclusion directive.
///
/// Stored in [`crate::output::ConversionOutput::warnings`]. The conversion
/// always continues past these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncludeWarning {
    /// Target not found even after appending the default extension.
    /// The directive is left in the output unchanged.
    #[error("{directive}: no file at '{path}'")]
    Unresolvable { directive: String, path: PathBuf },

    /// Wrong argument count or non-literal arguments. Left unchanged.
    #[error("{directive}: malformed inclusion directive")]
    Malformed { directive: String },

    /// Target exists but could not be read as text. Expands to nothing.
    #[error("{directive}: could not read '{path}': {detail}")]
    Undecodable {
        directive: String,
        path: PathBuf,
        detail: String,
    },

    /// Target was read but could not be parsed. Expands to nothing.
    #[error("{directive}: could not parse '{path}': {detail}")]
    Unparsable {
        directive: String,
        path: PathBuf,
        detail: String,
    },
}
