//! Import resolution: splice every included file into one tree.
//!
//! Starting from the entry document, the resolver parses each file, finds
//! its inclusion directives in document order (arguments included) and
//! replaces each one, at its exact position, with the parsed and recursively
//! resolved tree of the file it names.
//!
//! ## Cycles and repeats
//!
//! One [`VisitedFiles`] set is threaded by `&mut` through the whole
//! resolution. A file's key goes into the set *before* the file is read, so
//! a file that includes itself, directly or through a chain, sees its own
//! key and expands to nothing. The same mechanism makes a file included from
//! two places appear only once, at its first position in document order.
//!
//! ## Directives
//!
//! | Names | Arguments | Target |
//! |-------|-----------|--------|
//! | `\input`, `\include` | `{file}` | including file's directory |
//! | `\import`, `\inputfrom`, `\includefrom` | `{dir}{file}` | root directory |
//! | `\subimport`, `\subinputfrom`, `\subincludefrom` | `{dir}{file}` | including file's directory |
//!
//! Spaces and a single line break may separate a directive from its braced
//! arguments, and `\input` also accepts TeX's undelimited `\input intro`.
//! A target that does not exist as written is retried with the default
//! extension appended (`intro` → `intro.tex`).
//!
//! ## Failures
//!
//! Only the entry document can fail the resolution. Problems with an
//! included file become an [`IncludeWarning`] in the [`ResolveReport`]:
//!
//! * target missing or directive malformed → directive left as it was
//! * target unreadable or unparsable → directive replaced by nothing

use crate::config::{ConversionConfig, FileKeyPolicy};
use crate::error::{IncludeWarning, LatexDlError, ParseError, SourceError};
use crate::node::{base_name, ArgDelim, Argument, Node};
use crate::pipeline::parse::{inclusion_arity, LatexSyntax};
use crate::pipeline::source::ContentSource;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

// ── File identity ────────────────────────────────────────────────────────

/// Identity of a file for repeat detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey(PathBuf);

impl FileKey {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl FileKeyPolicy {
    /// The key `path` is tracked under.
    pub fn key_for(self, path: &Path) -> FileKey {
        let absolute = absolute_path(path);
        match self {
            FileKeyPolicy::Absolute => FileKey(absolute),
            FileKeyPolicy::Canonical => {
                FileKey(std::fs::canonicalize(&absolute).unwrap_or(absolute))
            }
        }
    }
}

/// `path` made absolute against the working directory, with `.` and `..`
/// removed lexically. Never touches the filesystem beyond reading the
/// working directory.
pub fn absolute_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_parent = matches!(out.components().next_back(), Some(Component::ParentDir));
                if at_parent || (!out.pop() && !out.has_root()) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Files already expanded during one resolution.
#[derive(Debug, Default)]
pub struct VisitedFiles {
    keys: HashSet<FileKey>,
}

impl VisitedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; false if it was already present.
    pub fn insert(&mut self, key: FileKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// What happened to the inclusion directives of one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Every file spliced into the tree, in the order it was read: a file
    /// comes before the files it includes. The entry document itself is not
    /// listed.
    pub included_files: Vec<PathBuf>,
    pub warnings: Vec<IncludeWarning>,
    /// Directives that named an already expanded file (cycles and repeats).
    pub duplicate_includes: usize,
    /// Directives left in place because their target does not exist.
    pub unresolved_includes: usize,
}

// ── Directives ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Directory of the file containing the directive.
    Including,
    /// The configured root directory.
    Root,
}

fn directive_kind(name: &str) -> Option<(Anchor, usize)> {
    let arity = inclusion_arity(name)?;
    let anchor = match base_name(name) {
        "import" | "inputfrom" | "includefrom" => Anchor::Root,
        _ => Anchor::Including,
    };
    Some((anchor, arity))
}

fn is_gap(arg: &Argument) -> bool {
    arg.delim == ArgDelim::Bare
        && arg
            .literal()
            .is_some_and(|text| text.chars().all(char::is_whitespace))
}

/// The target of a well-formed directive, relative to its anchor.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    anchor: Anchor,
    relative: PathBuf,
}

/// `None` if `node` is not an inclusion directive, `Some(Err(()))` if it is
/// one but malformed.
fn recognise(node: &Node) -> Option<Result<Target, ()>> {
    let Node::Command { name, args } = node else {
        return None;
    };
    let (anchor, arity) = directive_kind(name)?;
    // Whitespace between the name and its arguments is kept as bare text.
    let operands: Vec<&Argument> = args.iter().filter(|arg| !is_gap(arg)).collect();
    if operands.len() != arity {
        return Some(Err(()));
    }
    let mut parts = Vec::with_capacity(arity);
    for arg in operands {
        if arg.delim == ArgDelim::Bracket {
            return Some(Err(()));
        }
        match arg.literal() {
            Some(text) => parts.push(text.trim().to_string()),
            None => return Some(Err(())),
        }
    }
    let file = parts.pop().unwrap_or_default();
    if file.is_empty() {
        return Some(Err(()));
    }
    let relative = match parts.pop() {
        Some(dir) => Path::new(&dir).join(file),
        None => PathBuf::from(file),
    };
    Some(Ok(Target { anchor, relative }))
}

fn with_extension_appended(path: &Path, extension: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".");
    s.push(extension);
    PathBuf::from(s)
}

// ── Resolver ─────────────────────────────────────────────────────────────

/// Why a file could not be turned into a tree.
enum Failure {
    Read(SourceError),
    Parse(ParseError),
}

/// Recursive inclusion expander.
///
/// Holds the read-only context of one resolution; all mutable state lives in
/// the [`VisitedFiles`] and [`ResolveReport`] passed to each call.
pub struct Resolver<'a> {
    source: &'a dyn ContentSource,
    syntax: &'a dyn LatexSyntax,
    root_dir: PathBuf,
    extension: String,
    policy: FileKeyPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(
        source: &'a dyn ContentSource,
        syntax: &'a dyn LatexSyntax,
        root_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            source,
            syntax,
            root_dir: absolute_path(root_dir.as_ref()),
            extension: "tex".to_string(),
            policy: FileKeyPolicy::default(),
        }
    }

    /// A resolver using the extension and key policy from `config`.
    ///
    /// `entry_dir` is used as the root directory unless the config names one.
    pub fn from_config(
        source: &'a dyn ContentSource,
        syntax: &'a dyn LatexSyntax,
        entry_dir: &Path,
        config: &ConversionConfig,
    ) -> Self {
        let root = config.root_directory.as_deref().unwrap_or(entry_dir);
        Self::new(source, syntax, root)
            .extension(config.default_extension.clone())
            .key_policy(config.key_policy)
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn key_policy(mut self, policy: FileKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the file at `path`, read through this resolver's source.
    pub fn resolve_file(
        &self,
        path: &Path,
        visited: &mut VisitedFiles,
        report: &mut ResolveReport,
    ) -> Result<Node, LatexDlError> {
        let path = absolute_path(path);
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let source = self.source;
        self.resolve(&path, || source.read(&path), &dir, visited, report)
    }

    /// Resolve one document.
    ///
    /// `identity` is the document's path (it need not exist on disk), the
    /// text comes from `content`, and relative directives in it resolve
    /// against `including_dir`. A document already in `visited` yields an
    /// empty bare group without `content` being called.
    ///
    /// Errors reading or parsing this document are fatal; errors in the
    /// files it includes are recorded in `report`.
    pub fn resolve<F>(
        &self,
        identity: &Path,
        content: F,
        including_dir: &Path,
        visited: &mut VisitedFiles,
        report: &mut ResolveReport,
    ) -> Result<Node, LatexDlError>
    where
        F: FnOnce() -> Result<String, SourceError>,
    {
        let including_dir = absolute_path(including_dir);
        match self.load(identity, content, &including_dir, visited, report) {
            Ok(Some(tree)) => Ok(tree),
            Ok(None) => Ok(Node::empty()),
            Err(Failure::Read(e)) => Err(LatexDlError::from_source(identity.to_path_buf(), e)),
            Err(Failure::Parse(source)) => Err(LatexDlError::Parse {
                path: identity.to_path_buf(),
                source,
            }),
        }
    }

    /// Claim, read, parse and expand one file. `Ok(None)` means the file
    /// was already visited.
    fn load<F>(
        &self,
        identity: &Path,
        content: F,
        including_dir: &Path,
        visited: &mut VisitedFiles,
        report: &mut ResolveReport,
    ) -> Result<Option<Node>, Failure>
    where
        F: FnOnce() -> Result<String, SourceError>,
    {
        if !visited.insert(self.policy.key_for(identity)) {
            return Ok(None);
        }
        let text = content().map_err(Failure::Read)?;
        let mut tree = self.syntax.parse(&text).map_err(Failure::Parse)?;
        self.expand(&mut tree, including_dir, visited, report);
        Ok(Some(tree))
    }

    /// Replace every directive below `node`, in document order.
    fn expand(
        &self,
        node: &mut Node,
        including_dir: &Path,
        visited: &mut VisitedFiles,
        report: &mut ResolveReport,
    ) {
        for list in node.child_lists_mut() {
            for child in list.iter_mut() {
                match recognise(child) {
                    None => self.expand(child, including_dir, visited, report),
                    Some(Err(())) => {
                        let directive = self.syntax.render(child);
                        warn!("Malformed inclusion directive left in place: {directive}");
                        report.warnings.push(IncludeWarning::Malformed { directive });
                    }
                    Some(Ok(target)) => {
                        if let Some(tree) =
                            self.include(child, target, including_dir, visited, report)
                        {
                            *child = tree;
                        }
                    }
                }
            }
        }
    }

    /// The tree a well-formed directive expands to, or `None` to leave it.
    fn include(
        &self,
        directive: &Node,
        target: Target,
        including_dir: &Path,
        visited: &mut VisitedFiles,
        report: &mut ResolveReport,
    ) -> Option<Node> {
        let anchor = match target.anchor {
            Anchor::Including => including_dir,
            Anchor::Root => self.root_dir.as_path(),
        };
        let candidate = absolute_path(&anchor.join(&target.relative));
        let path = if self.source.is_file(&candidate) {
            candidate
        } else {
            let fallback = with_extension_appended(&candidate, &self.extension);
            if !self.source.is_file(&fallback) {
                let directive = self.syntax.render(directive);
                warn!(
                    "{directive}: no file at '{}', leaving directive in place",
                    candidate.display()
                );
                report.unresolved_includes += 1;
                report.warnings.push(IncludeWarning::Unresolvable {
                    directive,
                    path: candidate,
                });
                return None;
            }
            fallback
        };

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let source = self.source;
        // Claim a slot before recursing so files are listed in read order.
        let slot = report.included_files.len();
        report.included_files.push(path.clone());
        let loaded = self.load(&path, || source.read(&path), &dir, visited, report);
        if !matches!(loaded, Ok(Some(_))) {
            report.included_files.remove(slot);
        }
        match loaded {
            Ok(Some(tree)) => {
                debug!("Inlined '{}'", path.display());
                Some(tree)
            }
            Ok(None) => {
                debug!("Skipped '{}': already included", path.display());
                report.duplicate_includes += 1;
                Some(Node::empty())
            }
            Err(Failure::Read(e)) => {
                let directive = self.syntax.render(directive);
                warn!("{directive}: could not read '{}': {e}", path.display());
                report.warnings.push(IncludeWarning::Undecodable {
                    directive,
                    path,
                    detail: e.to_string(),
                });
                Some(Node::empty())
            }
            Err(Failure::Parse(e)) => {
                let directive = self.syntax.render(directive);
                warn!("{directive}: could not parse '{}': {e}", path.display());
                report.warnings.push(IncludeWarning::Unparsable {
                    directive,
                    path,
                    detail: e.to_string(),
                });
                Some(Node::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parse::TexSyntax;
    use crate::pipeline::render::render;
    use crate::pipeline::source::{FsSource, MemorySource};
    use pretty_assertions::assert_eq;

    fn run(source: &MemorySource, entry: &str) -> (String, ResolveReport) {
        let resolver = Resolver::new(source, &TexSyntax, "/doc");
        let mut visited = VisitedFiles::new();
        let mut report = ResolveReport::default();
        let tree = resolver
            .resolve_file(Path::new(entry), &mut visited, &mut report)
            .unwrap();
        (render(&tree), report)
    }

    #[test]
    fn normalize_removes_dots() {
        assert_eq!(
            normalize(Path::new("/doc/sec/../a/./b.tex")),
            PathBuf::from("/doc/a/b.tex")
        );
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
    }

    #[test]
    fn absolute_policy_unifies_spellings() {
        let policy = FileKeyPolicy::Absolute;
        assert_eq!(
            policy.key_for(Path::new("/doc/sec/../intro.tex")),
            policy.key_for(Path::new("/doc/intro.tex"))
        );
    }

    #[test]
    fn canonical_policy_falls_back_for_missing_files() {
        let key = FileKeyPolicy::Canonical.key_for(Path::new("/no/such/dir/../file.tex"));
        assert_eq!(key.path(), Path::new("/no/such/file.tex"));
    }

    #[cfg(unix)]
    #[test]
    fn canonical_policy_sees_through_symlinks() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real.tex");
        let link = dir.path().join("link.tex");
        std::fs::write(&real, "R").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert_eq!(
            FileKeyPolicy::Canonical.key_for(&real),
            FileKeyPolicy::Canonical.key_for(&link)
        );
        assert_ne!(
            FileKeyPolicy::Absolute.key_for(&real),
            FileKeyPolicy::Absolute.key_for(&link)
        );
    }

    #[test]
    fn recognise_directives() {
        let tree = crate::pipeline::parse::parse(
            "\\input{a}\\include{ b }\\import{dir/}{f}\\subimport{d}{f}\\textbf{x}",
        )
        .unwrap();
        let Node::Group { children, .. } = tree else {
            panic!("root is a group");
        };
        let targets: Vec<_> = children.iter().map(recognise).collect();
        assert_eq!(
            targets[0],
            Some(Ok(Target {
                anchor: Anchor::Including,
                relative: PathBuf::from("a")
            }))
        );
        assert_eq!(
            targets[1],
            Some(Ok(Target {
                anchor: Anchor::Including,
                relative: PathBuf::from("b")
            }))
        );
        assert_eq!(
            targets[2],
            Some(Ok(Target {
                anchor: Anchor::Root,
                relative: PathBuf::from("dir/f")
            }))
        );
        assert_eq!(
            targets[3],
            Some(Ok(Target {
                anchor: Anchor::Including,
                relative: PathBuf::from("d/f")
            }))
        );
        assert_eq!(targets[4], None);
    }

    #[test]
    fn no_includes_is_identity() {
        let text = "\\documentclass{article}\n% c\n\\begin{document}\nHi $x$\n\\end{document}\n";
        let src = MemorySource::new().with_file("/doc/main.tex", text);
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, text);
        assert_eq!(report, ResolveReport::default());
    }

    #[test]
    fn input_is_spliced_in_place() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "before \\input{a} after")
            .with_file("/doc/a.tex", "\\textbf{X}");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "before \\textbf{X} after");
        assert_eq!(report.included_files, vec![PathBuf::from("/doc/a.tex")]);
    }

    #[test]
    fn cycle_terminates() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{a}")
            .with_file("/doc/a.tex", "A\\input{b}")
            .with_file("/doc/b.tex", "B\\input{a}");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "AB");
        assert_eq!(report.duplicate_includes, 1);
        assert_eq!(
            report.included_files,
            vec![PathBuf::from("/doc/a.tex"), PathBuf::from("/doc/b.tex")]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn cycle_from_inside_matches_hand_stripped_tree() {
        let src = MemorySource::new()
            .with_file("/doc/a.tex", "A\\input{b}")
            .with_file("/doc/b.tex", "B\\input{a}");
        let resolver = Resolver::new(&src, &TexSyntax, "/doc");
        let tree = resolver
            .resolve_file(
                Path::new("/doc/a.tex"),
                &mut VisitedFiles::new(),
                &mut ResolveReport::default(),
            )
            .unwrap();

        // b.tex's \input{a} stripped to an empty group.
        let expected = Node::bare(vec![
            Node::text("A"),
            Node::bare(vec![Node::text("B"), Node::empty()]),
        ]);
        assert_eq!(tree, expected);
        assert_eq!(render(&tree), "AB");
    }

    #[test]
    fn included_files_follow_read_order() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{x}\\input{y}")
            .with_file("/doc/x.tex", "X\\input{z}")
            .with_file("/doc/y.tex", "Y\\input{z}")
            .with_file("/doc/z.tex", "Z");
        let (_, report) = run(&src, "/doc/main.tex");
        assert_eq!(
            report.included_files,
            vec![
                PathBuf::from("/doc/x.tex"),
                PathBuf::from("/doc/z.tex"),
                PathBuf::from("/doc/y.tex"),
            ]
        );
    }

    #[test]
    fn failed_targets_are_not_listed() {
        let deep = "{".repeat(crate::pipeline::parse::MAX_DEPTH + 1);
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{a}\\input{deep}\\input{a}")
            .with_file("/doc/a.tex", "A\\input{deep}")
            .with_file("/doc/deep.tex", deep);
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "A");
        assert_eq!(report.included_files, vec![PathBuf::from("/doc/a.tex")]);
    }

    #[test]
    fn spaced_and_undelimited_directives_are_expanded() {
        let src = MemorySource::new()
            .with_file(
                "/doc/main.tex",
                "x\\input {a}y\\input b z\\import {d/}\n{c}",
            )
            .with_file("/doc/a.tex", "A")
            .with_file("/doc/b.tex", "B")
            .with_file("/doc/d/c.tex", "C");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "xAyB zC");
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn repeated_undelimited_input_is_a_duplicate() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "x\\input {a}y\\input a z")
            .with_file("/doc/a.tex", "A");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "xAy z");
        assert_eq!(report.duplicate_includes, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn self_inclusion_expands_to_nothing() {
        let src = MemorySource::new().with_file("/doc/main.tex", "M\\input{main}");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "M");
        assert_eq!(report.duplicate_includes, 1);
    }

    #[test]
    fn diamond_appears_once_at_first_position() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{x}\\input{y}")
            .with_file("/doc/x.tex", "X\\input{z}")
            .with_file("/doc/y.tex", "Y\\input{z}")
            .with_file("/doc/z.tex", "Z");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "XZY");
        assert_eq!(report.duplicate_includes, 1);
    }

    #[test]
    fn explicit_extension_and_dotted_paths() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{a.tex}\\input{./sec/../b}")
            .with_file("/doc/a.tex", "A")
            .with_file("/doc/b.tex", "B");
        let (out, _) = run(&src, "/doc/main.tex");
        assert_eq!(out, "AB");
    }

    #[test]
    fn file_without_extension_is_preferred() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{a}")
            .with_file("/doc/a", "bare")
            .with_file("/doc/a.tex", "dotted");
        let (out, _) = run(&src, "/doc/main.tex");
        assert_eq!(out, "bare");
    }

    #[test]
    fn missing_target_is_left_in_place() {
        let src = MemorySource::new().with_file("/doc/main.tex", "a\\input{nope}b");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "a\\input{nope}b");
        assert_eq!(report.unresolved_includes, 1);
        assert_eq!(
            report.warnings,
            vec![IncludeWarning::Unresolvable {
                directive: "\\input{nope}".into(),
                path: PathBuf::from("/doc/nope"),
            }]
        );
    }

    #[test]
    fn malformed_directives_are_left_in_place() {
        let text = "\\input \\input[x]{a}\\import{a}\\input{\\jobname}\\input{ }";
        let src = MemorySource::new()
            .with_file("/doc/main.tex", text)
            .with_file("/doc/a.tex", "A");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, text);
        assert_eq!(report.warnings.len(), 5);
        assert!(report
            .warnings
            .iter()
            .all(|w| matches!(w, IncludeWarning::Malformed { .. })));
    }

    #[test]
    fn directives_inside_arguments_are_expanded() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\textbf{\\input{a}}\\begin{center}\\input{b}\\end{center}")
            .with_file("/doc/a.tex", "A")
            .with_file("/doc/b.tex", "B");
        let (out, _) = run(&src, "/doc/main.tex");
        assert_eq!(out, "\\textbf{A}\\begin{center}B\\end{center}");
    }

    #[test]
    fn nested_input_is_relative_to_including_file() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{sec/a}")
            .with_file("/doc/sec/a.tex", "A\\input{b}")
            .with_file("/doc/sec/b.tex", "B");
        let (out, _) = run(&src, "/doc/main.tex");
        assert_eq!(out, "AB");
    }

    #[test]
    fn import_uses_root_and_subimport_uses_including_dir() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{sec/a}")
            .with_file("/doc/sec/a.tex", "\\import{other/}{b}|\\subimport{deep}{c}")
            .with_file("/doc/other/b.tex", "B")
            .with_file("/doc/sec/deep/c.tex", "C");
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "B|C");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn configured_root_directory_is_used_for_import() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\import{figs}{t}")
            .with_file("/shared/figs/t.tex", "T");
        let config = ConversionConfig::builder()
            .root_directory("/shared")
            .build()
            .unwrap();
        let resolver = Resolver::from_config(&src, &TexSyntax, Path::new("/doc"), &config);
        let mut visited = VisitedFiles::new();
        let mut report = ResolveReport::default();
        let tree = resolver
            .resolve_file(Path::new("/doc/main.tex"), &mut visited, &mut report)
            .unwrap();
        assert_eq!(render(&tree), "T");
    }

    #[test]
    fn custom_extension() {
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "\\input{a}")
            .with_file("/doc/a.ltx", "L");
        let resolver = Resolver::new(&src, &TexSyntax, "/doc").extension("ltx");
        let mut visited = VisitedFiles::new();
        let mut report = ResolveReport::default();
        let tree = resolver
            .resolve_file(Path::new("/doc/main.tex"), &mut visited, &mut report)
            .unwrap();
        assert_eq!(render(&tree), "L");
    }

    #[test]
    fn undecodable_target_becomes_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.tex"), "a\\input{bin}b").unwrap();
        std::fs::write(dir.path().join("bin.tex"), [0xc3, 0x28]).unwrap();
        let resolver = Resolver::new(&FsSource, &TexSyntax, dir.path());
        let mut visited = VisitedFiles::new();
        let mut report = ResolveReport::default();
        let tree = resolver
            .resolve_file(&dir.path().join("main.tex"), &mut visited, &mut report)
            .unwrap();
        assert_eq!(render(&tree), "ab");
        assert!(matches!(
            report.warnings.as_slice(),
            [IncludeWarning::Undecodable { .. }]
        ));
        assert!(report.included_files.is_empty());
    }

    #[test]
    fn unparsable_target_becomes_empty() {
        let deep = "{".repeat(crate::pipeline::parse::MAX_DEPTH + 1);
        let src = MemorySource::new()
            .with_file("/doc/main.tex", "a\\input{deep}b")
            .with_file("/doc/deep.tex", deep);
        let (out, report) = run(&src, "/doc/main.tex");
        assert_eq!(out, "ab");
        assert!(matches!(
            report.warnings.as_slice(),
            [IncludeWarning::Unparsable { .. }]
        ));
    }

    #[test]
    fn missing_root_is_fatal() {
        let src = MemorySource::new();
        let resolver = Resolver::new(&src, &TexSyntax, "/doc");
        let err = resolver
            .resolve_file(
                Path::new("/doc/main.tex"),
                &mut VisitedFiles::new(),
                &mut ResolveReport::default(),
            )
            .unwrap_err();
        assert!(matches!(err, LatexDlError::FileNotFound { .. }));
    }

    #[test]
    fn unparsable_root_is_fatal() {
        let src = MemorySource::new();
        let resolver = Resolver::new(&src, &TexSyntax, "/doc");
        let deep = "{".repeat(crate::pipeline::parse::MAX_DEPTH + 1);
        let err = resolver
            .resolve(
                Path::new("/doc/main.tex"),
                || Ok(deep),
                Path::new("/doc"),
                &mut VisitedFiles::new(),
                &mut ResolveReport::default(),
            )
            .unwrap_err();
        assert!(matches!(err, LatexDlError::Parse { .. }));
    }

    #[test]
    fn already_visited_root_is_not_read() {
        let src = MemorySource::new();
        let resolver = Resolver::new(&src, &TexSyntax, "/doc");
        let mut visited = VisitedFiles::new();
        visited.insert(FileKeyPolicy::Absolute.key_for(Path::new("/doc/main.tex")));
        let tree = resolver
            .resolve(
                Path::new("/doc/main.tex"),
                || panic!("content must not be read"),
                Path::new("/doc"),
                &mut visited,
                &mut ResolveReport::default(),
            )
            .unwrap();
        assert!(tree.is_empty_group());
    }

    #[test]
    fn in_memory_root_includes_from_source() {
        let src = MemorySource::new().with_file("/doc/a.tex", "A");
        let resolver = Resolver::new(&src, &TexSyntax, "/doc");
        let mut report = ResolveReport::default();
        let tree = resolver
            .resolve(
                Path::new("/doc/<stdin>"),
                || Ok("x\\input{a}y".to_string()),
                Path::new("/doc"),
                &mut VisitedFiles::new(),
                &mut report,
            )
            .unwrap();
        assert_eq!(render(&tree), "xAy");
        assert_eq!(report.included_files, vec![PathBuf::from("/doc/a.tex")]);
    }
}
