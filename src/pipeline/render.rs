//! [`Node`] tree → LaTeX source.
//!
//! Rendering is the exact inverse of [`crate::pipeline::parse::parse`] for
//! untouched trees. After passes have removed nodes, one repair is needed:
//! a control word must not run into letters that used to be separated from
//! it by a (now removed) space or comment, or `\item First` would turn into
//! the undefined `\itemFirst`. A single space is inserted in that case only;
//! the parser never produces such an adjacency, so untouched trees are
//! unaffected.

use crate::node::{ArgDelim, Argument, Node};

/// Render a tree to LaTeX source.
pub fn render(node: &Node) -> String {
    let mut out = Renderer::default();
    out.node(node);
    out.buf
}

/// Render a sequence of sibling nodes.
pub fn render_all(nodes: &[Node]) -> String {
    let mut out = Renderer::default();
    out.nodes(nodes);
    out.buf
}

#[derive(Default)]
struct Renderer {
    buf: String,
    /// The last thing written was a control word with nothing after it.
    after_word: bool,
}

impl Renderer {
    fn push(&mut self, s: &str) {
        let Some(first) = s.chars().next() else {
            return;
        };
        if self.after_word && first.is_ascii_alphabetic() {
            self.buf.push(' ');
        }
        self.buf.push_str(s);
        self.after_word = false;
    }

    fn nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Command { name, args } => {
                self.push("\\");
                self.buf.push_str(name);
                // Arguments that render to nothing leave the name exposed.
                self.after_word = name.ends_with(|c: char| c.is_ascii_alphabetic());
                for arg in args {
                    self.argument(arg);
                }
            }
            Node::Environment { name, args, body } => {
                self.push("\\begin{");
                self.push(name);
                self.push("}");
                for arg in args {
                    self.argument(arg);
                }
                self.nodes(body);
                self.push("\\end{");
                self.push(name);
                self.push("}");
            }
            Node::Group { delim, children } => {
                let (open, close) = delim.delimiters();
                self.push(open);
                self.nodes(children);
                self.push(close);
            }
            Node::Text { raw, .. } => self.push(raw),
            Node::Comment { raw } => self.push(raw),
        }
    }

    fn argument(&mut self, arg: &Argument) {
        let (open, close) = match arg.delim {
            ArgDelim::Brace => ("{", "}"),
            ArgDelim::Bracket => ("[", "]"),
            ArgDelim::Bare => ("", ""),
        };
        self.push(open);
        self.nodes(&arg.children);
        self.push(close);
    }
}
