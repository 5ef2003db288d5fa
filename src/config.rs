//! Configuration types for LaTeX flattening.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across the batch workers and to diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on the
//! documented defaults for the rest. Every stripping pass defaults to on.

use crate::error::LatexDlError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for flattening and stripping a LaTeX document.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use latexdl::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .strip_comments(false)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Remove `%` comments. Default: true.
    pub strip_comments: bool,

    /// Remove text nodes that consist only of whitespace, and tidy blank
    /// lines in the rendered output. Default: true.
    ///
    /// Verbatim content is never touched.
    pub strip_whitespace: bool,

    /// Remove the environments and commands listed in [`Self::clutter`].
    /// Default: true.
    pub strip_clutter: bool,

    /// Keep only the first `document` environment (drops the preamble).
    /// Default: true.
    pub narrow_to_document: bool,

    /// Directory `\import{dir}{file}` resolves against.
    ///
    /// If None, the entry file's own directory is used. This matches how
    /// LaTeX itself resolves `\import` when compiling from the entry file's
    /// directory.
    pub root_directory: Option<PathBuf>,

    /// How a path is turned into the key that detects repeated inclusion.
    /// Default: [`FileKeyPolicy::Absolute`].
    pub key_policy: FileKeyPolicy,

    /// Extension appended to an inclusion target that does not exist as
    /// written. Stored without the leading dot. Default: "tex".
    pub default_extension: String,

    /// Environments and commands treated as clutter.
    pub clutter: ClutterSet,

    /// Number of documents processed at once by
    /// [`crate::convert::convert_batch`]. Default: 4.
    ///
    /// Resolution itself is single-threaded; this only bounds how many
    /// independent documents run side by side.
    pub concurrency: usize,

    /// Optional per-document progress events for batch conversion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            strip_comments: true,
            strip_whitespace: true,
            strip_clutter: true,
            narrow_to_document: true,
            root_directory: None,
            key_policy: FileKeyPolicy::default(),
            default_extension: "tex".to_string(),
            clutter: ClutterSet::default(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("strip_comments", &self.strip_comments)
            .field("strip_whitespace", &self.strip_whitespace)
            .field("strip_clutter", &self.strip_clutter)
            .field("narrow_to_document", &self.narrow_to_document)
            .field("root_directory", &self.root_directory)
            .field("key_policy", &self.key_policy)
            .field("default_extension", &self.default_extension)
            .field("clutter", &self.clutter)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn strip_comments(mut self, v: bool) -> Self {
        self.config.strip_comments = v;
        self
    }

    pub fn strip_whitespace(mut self, v: bool) -> Self {
        self.config.strip_whitespace = v;
        self
    }

    pub fn strip_clutter(mut self, v: bool) -> Self {
        self.config.strip_clutter = v;
        self
    }

    pub fn narrow_to_document(mut self, v: bool) -> Self {
        self.config.narrow_to_document = v;
        self
    }

    pub fn root_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.root_directory = Some(dir.into());
        self
    }

    pub fn key_policy(mut self, policy: FileKeyPolicy) -> Self {
        self.config.key_policy = policy;
        self
    }

    /// Accepts `"tex"` or `".tex"`.
    pub fn default_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.config.default_extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn clutter(mut self, clutter: ClutterSet) -> Self {
        self.config.clutter = clutter;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, LatexDlError> {
        let c = &self.config;
        if c.default_extension.is_empty() {
            return Err(LatexDlError::InvalidConfig(
                "Default extension must not be empty".into(),
            ));
        }
        if c.default_extension.contains(['/', '\\']) {
            return Err(LatexDlError::InvalidConfig(format!(
                "Default extension must not contain a path separator, got '{}'",
                c.default_extension
            )));
        }
        if c.concurrency == 0 {
            return Err(LatexDlError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── File identity ────────────────────────────────────────────────────────

/// How an inclusion target's path becomes its identity key.
///
/// The choice decides which "diamond" inclusions collapse into one: two
/// directives naming the same file through different spellings are only
/// recognised as the same file if their keys agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKeyPolicy {
    /// Absolute path with `.` and `..` removed lexically. (default)
    ///
    /// `sections/../intro.tex` and `intro.tex` are the same file; two
    /// symlinks to one file are not.
    #[default]
    Absolute,
    /// `std::fs::canonicalize`: symlinks resolved too. Falls back to
    /// [`FileKeyPolicy::Absolute`] for paths that cannot be canonicalised.
    Canonical,
}

// ── Clutter ──────────────────────────────────────────────────────────────

/// Names of environments and commands removed by the clutter pass.
///
/// A trailing `*` is ignored when matching, so `figure` covers `figure*`.
/// Can be loaded from JSON:
///
/// ```json
/// { "environments": ["figure", "table"], "commands": ["newcommand"] }
/// ```
///
/// A field missing from the JSON is an empty set, not the default list, so
/// a file names exactly what it removes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutterSet {
    #[serde(default)]
    pub environments: BTreeSet<String>,
    #[serde(default)]
    pub commands: BTreeSet<String>,
}

/// Floats and drawings: presentation, not content.
pub const DEFAULT_CLUTTER_ENVIRONMENTS: &[&str] = &[
    "figure",
    "table",
    "wrapfigure",
    "wraptable",
    "subfigure",
    "subtable",
    "sidewaysfigure",
    "sidewaystable",
    "tikzpicture",
    "pgfpicture",
    "picture",
];

/// Macro and environment declarations.
pub const DEFAULT_CLUTTER_COMMANDS: &[&str] = &[
    "newcommand",
    "renewcommand",
    "providecommand",
    "DeclareRobustCommand",
    "DeclareMathOperator",
    "newenvironment",
    "renewenvironment",
    "def",
    "gdef",
    "edef",
    "xdef",
    "let",
];

impl Default for ClutterSet {
    fn default() -> Self {
        Self {
            environments: DEFAULT_CLUTTER_ENVIRONMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            commands: DEFAULT_CLUTTER_COMMANDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ClutterSet {
    pub fn is_clutter_environment(&self, name: &str) -> bool {
        self.environments.contains(name)
            || self.environments.contains(crate::node::base_name(name))
    }

    pub fn is_clutter_command(&self, name: &str) -> bool {
        self.commands.contains(name) || self.commands.contains(crate::node::base_name(name))
    }

    pub fn from_json_str(json: &str) -> Result<Self, LatexDlError> {
        serde_json::from_str(json)
            .map_err(|e| LatexDlError::InvalidConfig(format!("Invalid clutter set: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LatexDlError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LatexDlError::InvalidConfig(format!(
                "Failed to read clutter set from '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }
}
