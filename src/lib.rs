//! # latexdl
//!
//! Flatten a multi-file LaTeX project into one self-contained document, and
//! strip it down to the text that matters.
//!
//! ## Why this crate?
//!
//! Papers and theses are rarely one file: chapters come in through
//! `\input`, figures through `\subimport`, and the preamble is a wall of
//! macro definitions. Tools that want the *content* (search indexes,
//! language models, diffing) need a single document without the
//! scaffolding. This crate parses each file into a tree, splices included
//! files in place (safe against cycles and repeated inclusion), then runs
//! a set of tree passes that remove comments, stray whitespace, floats and
//! declarations, and everything outside `\begin{document}`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .tex / dir / stdin
//!  │
//!  ├─ 1. Input    pick the entry file (directories are searched)
//!  ├─ 2. Resolve  parse + splice \input, \include, \import, \subimport
//!  ├─ 3. Strip    comments → whitespace → clutter → document narrowing
//!  ├─ 4. Render   tree back to LaTeX
//!  ├─ 5. Polish   line endings, blank lines, final newline
//!  └─ 6. Output   flattened LaTeX + included files, warnings, stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use latexdl::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("paper/main.tex", &config)?;
//!     println!("{}", output.latex);
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `latexdl` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! latexdl = { version = "0.5", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod node;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClutterSet, ConversionConfig, ConversionConfigBuilder, FileKeyPolicy};
pub use convert::{
    convert, convert_batch, convert_str, convert_to_file, convert_with, convert_with_syntax,
};
pub use error::{IncludeWarning, LatexDlError, ParseError, SourceError};
pub use node::{ArgDelim, Argument, GroupDelim, Node};
pub use output::{BatchItem, ConversionOutput, ConversionStats};
pub use pipeline::parse::{LatexSyntax, TexSyntax};
pub use pipeline::source::{ContentSource, FsSource, MemorySource};
pub use pipeline::walk::{walk, Action};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
