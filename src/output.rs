//! Conversion results.
//!
//! [`ConversionOutput`] and [`ConversionStats`] serialise to JSON as-is; the
//! CLI's `--json` flag prints them verbatim.

use crate::error::{IncludeWarning, LatexDlError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The flattened document and what it took to produce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The rendered, stripped LaTeX.
    pub latex: String,

    /// Files spliced into the document, in the order they were read, so a
    /// file comes before the files it includes. The entry document is not
    /// listed.
    pub included_files: Vec<PathBuf>,

    /// Inclusion directives that could not be expanded.
    ///
    /// A non-empty list does not mean the conversion failed: the output is
    /// still complete apart from the content those directives named.
    pub warnings: Vec<IncludeWarning>,

    pub stats: ConversionStats,
}

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of files spliced in.
    pub files_inlined: usize,
    /// Directives suppressed because their file was already included.
    pub duplicate_includes: usize,
    /// Directives left in place because their file does not exist.
    pub unresolved_includes: usize,
    /// Tree size after resolution, before the stripping passes.
    pub nodes_before: usize,
    /// Tree size after the stripping passes.
    pub nodes_after: usize,
    /// Wall time for the whole conversion.
    pub duration_ms: u64,
}

/// One entry of a [`crate::convert::convert_batch`] result.
#[derive(Debug)]
pub struct BatchItem {
    /// The input exactly as it was passed in.
    pub input: String,
    pub result: Result<ConversionOutput, LatexDlError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
