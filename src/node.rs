//! The document tree.
//!
//! Every parsed LaTeX source becomes a tree of [`Node`]s. The enum is closed
//! on purpose: passes match on it exhaustively, so adding a kind forces every
//! pass to say what it does with it.
//!
//! Nodes own their children and arguments. Splicing an included file into the
//! tree moves a freshly parsed subtree into place, so no two positions in a
//! tree can ever refer to the same subtree.

/// One node of a LaTeX document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `\name` followed by its arguments, e.g. `\textbf{X}`.
    Command { name: String, args: Vec<Argument> },

    /// `\begin{name}<args><body>\end{name}`.
    Environment {
        name: String,
        args: Vec<Argument>,
        body: Vec<Node>,
    },

    /// A delimited (or bare) run of nodes.
    Group { delim: GroupDelim, children: Vec<Node> },

    /// Literal text.
    ///
    /// `preserve_whitespace` marks text whose whitespace is content
    /// (verbatim bodies, `\verb` spans).
    Text {
        raw: String,
        preserve_whitespace: bool,
    },

    /// A `%` comment, including the line break that ends it.
    Comment { raw: String },
}

/// How a [`Node::Group`] is delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupDelim {
    /// No delimiters. Used for the document root and spliced files.
    Bare,
    /// `{ … }`
    Brace,
    /// `$ … $`
    InlineMath,
    /// `$$ … $$`
    DisplayMath,
    /// `\( … \)`
    ParenMath,
    /// `\[ … \]`
    BracketMath,
}

impl GroupDelim {
    /// Opening and closing source text.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            GroupDelim::Bare => ("", ""),
            GroupDelim::Brace => ("{", "}"),
            GroupDelim::InlineMath => ("$", "$"),
            GroupDelim::DisplayMath => ("$$", "$$"),
            GroupDelim::ParenMath => ("\\(", "\\)"),
            GroupDelim::BracketMath => ("\\[", "\\]"),
        }
    }
}

/// One argument of a command or environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub delim: ArgDelim,
    pub children: Vec<Node>,
}

/// How an [`Argument`] is delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgDelim {
    /// `{ … }`
    Brace,
    /// `[ … ]`
    Bracket,
    /// Undelimited operand, e.g. the `\foo` in `\def\foo{…}`.
    Bare,
}

impl Argument {
    pub fn brace(children: Vec<Node>) -> Self {
        Self {
            delim: ArgDelim::Brace,
            children,
        }
    }

    pub fn bracket(children: Vec<Node>) -> Self {
        Self {
            delim: ArgDelim::Bracket,
            children,
        }
    }

    pub fn bare(children: Vec<Node>) -> Self {
        Self {
            delim: ArgDelim::Bare,
            children,
        }
    }

    /// The argument's content when it is plain text only.
    ///
    /// Returns `None` as soon as any child is not a [`Node::Text`].
    pub fn literal(&self) -> Option<String> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text { raw, .. } => out.push_str(raw),
                _ => return None,
            }
        }
        Some(out)
    }
}

impl Node {
    /// An empty bare group: what an inclusion expands to when suppressed.
    pub fn empty() -> Self {
        Node::Group {
            delim: GroupDelim::Bare,
            children: Vec::new(),
        }
    }

    pub fn bare(children: Vec<Node>) -> Self {
        Node::Group {
            delim: GroupDelim::Bare,
            children,
        }
    }

    pub fn text(raw: impl Into<String>) -> Self {
        Node::Text {
            raw: raw.into(),
            preserve_whitespace: false,
        }
    }

    pub fn verbatim(raw: impl Into<String>) -> Self {
        Node::Text {
            raw: raw.into(),
            preserve_whitespace: true,
        }
    }

    pub fn comment(raw: impl Into<String>) -> Self {
        Node::Comment { raw: raw.into() }
    }

    pub fn command(name: impl Into<String>, args: Vec<Argument>) -> Self {
        Node::Command {
            name: name.into(),
            args,
        }
    }

    pub fn environment(name: impl Into<String>, args: Vec<Argument>, body: Vec<Node>) -> Self {
        Node::Environment {
            name: name.into(),
            args,
            body,
        }
    }

    /// Name of a command or environment.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Command { name, .. } | Node::Environment { name, .. } => Some(name),
            Node::Group { .. } | Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    pub fn is_environment(&self, wanted: &str) -> bool {
        matches!(self, Node::Environment { name, .. } if name == wanted)
    }

    /// True for a bare group with no children.
    pub fn is_empty_group(&self) -> bool {
        matches!(self, Node::Group { delim: GroupDelim::Bare, children } if children.is_empty())
    }

    /// Every child list of this node, in document order.
    ///
    /// Arguments come before an environment's body. Leaves have none.
    pub fn child_lists(&self) -> Vec<&Vec<Node>> {
        match self {
            Node::Command { args, .. } => args.iter().map(|a| &a.children).collect(),
            Node::Environment { args, body, .. } => args
                .iter()
                .map(|a| &a.children)
                .chain(std::iter::once(body))
                .collect(),
            Node::Group { children, .. } => vec![children],
            Node::Text { .. } | Node::Comment { .. } => Vec::new(),
        }
    }

    /// Mutable counterpart of [`Node::child_lists`], same order.
    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Node>> {
        match self {
            Node::Command { args, .. } => args.iter_mut().map(|a| &mut a.children).collect(),
            Node::Environment { args, body, .. } => args
                .iter_mut()
                .map(|a| &mut a.children)
                .chain(std::iter::once(body))
                .collect(),
            Node::Group { children, .. } => vec![children],
            Node::Text { .. } | Node::Comment { .. } => Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self
            .child_lists()
            .into_iter()
            .flatten()
            .map(Node::count)
            .sum::<usize>()
    }
}

/// A command or environment name without one trailing `*`.
pub fn base_name(name: &str) -> &str {
    name.strip_suffix('*').unwrap_or(name)
}
