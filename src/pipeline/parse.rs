//! LaTeX source → [`Node`] tree.
//!
//! The parser is deliberately forgiving: real-world LaTeX from third-party
//! packages is full of unbalanced braces, environments closed in the wrong
//! place and macros that change the meaning of characters. Nothing here
//! rejects input; the only error is excessive nesting, which protects the
//! stack.
//!
//! ## Lossless
//!
//! For any input `t`, `render(parse(t)) == t`. Every byte of the source ends
//! up in exactly one node, and structure that turns out to be unbalanced is
//! flattened back into text:
//!
//! * `{` that never closes → `Text("{")` followed by what came after it
//! * `\begin{x}` without `\end{x}` → a plain `\begin` command followed by
//!   the would-be body
//! * a stray `}` or `\end{y}` → text / a plain `\end` command
//!
//! ## Arguments
//!
//! LaTeX does not declare arity, so a control word takes as arguments every
//! `{…}` and `[…]` that follows it *immediately*. A `[` that never finds its
//! `]` is not an argument. Declaration commands (`\def`, `\let`,
//! `\newcommand`, …) additionally take an undelimited control sequence as
//! their first operand, so the clutter pass can remove the whole declaration.
//! Inclusion commands (`\input`, `\import`, …) may have whitespace before
//! their file arguments, and `\input` may take an undelimited file name.

use crate::error::ParseError;
use crate::node::{base_name, Argument, GroupDelim, Node};
use crate::pipeline::render;

/// Maximum nesting of groups, arguments and environments.
pub const MAX_DEPTH: usize = 256;

/// Environments whose body is captured raw, without parsing.
const VERBATIM_ENVIRONMENTS: &[&str] = &[
    "verbatim",
    "verbatim*",
    "Verbatim",
    "BVerbatim",
    "lstlisting",
    "minted",
    "comment",
];

/// Verbatim environments that take no arguments (a `[` right after
/// `\begin{verbatim}` is content).
const ARGLESS_VERBATIM: &[&str] = &["verbatim", "verbatim*", "comment"];

const DEF_COMMANDS: &[&str] = &["def", "gdef", "edef", "xdef"];

const NEWCOMMAND_COMMANDS: &[&str] = &[
    "newcommand",
    "renewcommand",
    "providecommand",
    "DeclareRobustCommand",
    "DeclareMathOperator",
];

/// Number of file arguments taken by an inclusion command, by base name.
pub fn inclusion_arity(name: &str) -> Option<usize> {
    match base_name(name) {
        "input" | "include" => Some(1),
        "import" | "inputfrom" | "includefrom" => Some(2),
        "subimport" | "subinputfrom" | "subincludefrom" => Some(2),
        _ => None,
    }
}

/// The parse/render capability the resolver and orchestrator depend on.
///
/// [`TexSyntax`] is the built-in implementation; callers with their own
/// LaTeX front end can plug it in through this trait.
pub trait LatexSyntax: Send + Sync {
    fn parse(&self, text: &str) -> Result<Node, ParseError>;
    fn render(&self, node: &Node) -> String;
}

/// The built-in lossless LaTeX parser and renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TexSyntax;

impl LatexSyntax for TexSyntax {
    fn parse(&self, text: &str) -> Result<Node, ParseError> {
        parse(text)
    }

    fn render(&self, node: &Node) -> String {
        render::render(node)
    }
}

/// Parse a whole document into a bare root group.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        frames: Vec::new(),
    };
    let (children, _) = parser.sequence()?;
    Ok(Node::bare(children))
}

/// An open construct waiting for its closer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Brace,
    Bracket,
    Math(GroupDelim),
    Env(String),
}

/// Why a node sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    /// Our own closer was consumed.
    Closed,
    /// A closer belonging to an enclosing frame is next; not consumed.
    Outer,
    Eof,
}

/// Where a closer found in the source belongs.
enum Owner {
    Innermost,
    Enclosing,
    Nobody,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    frames: Vec<Frame>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn owner(&self, frame: &Frame) -> Owner {
        match self.frames.last() {
            Some(last) if last == frame => Owner::Innermost,
            _ if self.frames.contains(frame) => Owner::Enclosing,
            _ => Owner::Nobody,
        }
    }

    fn enter(&mut self, frame: Frame) -> Result<(), ParseError> {
        if self.frames.len() >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                offset: self.pos,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Parse nodes until the innermost frame closes, an enclosing frame's
    /// closer shows up, or input ends.
    fn sequence(&mut self) -> Result<(Vec<Node>, Close), ParseError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            let Some(c) = self.peek() else {
                flush(&mut text, &mut nodes);
                return Ok((nodes, Close::Eof));
            };

            match c {
                '%' => {
                    flush(&mut text, &mut nodes);
                    nodes.push(self.comment());
                }
                '{' => {
                    flush(&mut text, &mut nodes);
                    self.pos += 1;
                    nodes.extend(self.group(Frame::Brace, GroupDelim::Brace)?);
                }
                '}' => match self.owner(&Frame::Brace) {
                    Owner::Innermost => {
                        flush(&mut text, &mut nodes);
                        self.pos += 1;
                        return Ok((nodes, Close::Closed));
                    }
                    Owner::Enclosing => {
                        flush(&mut text, &mut nodes);
                        return Ok((nodes, Close::Outer));
                    }
                    Owner::Nobody => {
                        text.push('}');
                        self.pos += 1;
                    }
                },
                ']' if self.frames.last() == Some(&Frame::Bracket) => {
                    flush(&mut text, &mut nodes);
                    self.pos += 1;
                    return Ok((nodes, Close::Closed));
                }
                '$' => {
                    flush(&mut text, &mut nodes);
                    if let Some(close) = self.dollar(&mut nodes)? {
                        return Ok((nodes, close));
                    }
                }
                '\\' => {
                    flush(&mut text, &mut nodes);
                    if let Some(close) = self.control(&mut nodes)? {
                        return Ok((nodes, close));
                    }
                }
                _ => {
                    let run = self
                        .rest()
                        .find(['%', '{', '}', ']', '$', '\\'])
                        .unwrap_or(self.rest().len());
                    // A lone ']' outside a bracket frame is text.
                    let run = run.max(c.len_utf8());
                    text.push_str(&self.rest()[..run]);
                    self.pos += run;
                }
            }
        }
    }

    /// `%` through the end of the line, line break included.
    fn comment(&mut self) -> Node {
        let rest = self.rest();
        let len = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        self.pos += len;
        Node::comment(&rest[..len])
    }

    /// Parse the inside of a group whose opener was just consumed.
    ///
    /// An unterminated group is flattened into its opener text followed by
    /// its children.
    fn group(&mut self, frame: Frame, delim: GroupDelim) -> Result<Vec<Node>, ParseError> {
        self.enter(frame)?;
        let (children, close) = self.sequence()?;
        self.frames.pop();

        Ok(match close {
            Close::Closed => vec![Node::Group { delim, children }],
            Close::Outer | Close::Eof => spill(delim.delimiters().0, children),
        })
    }

    fn dollar(&mut self, nodes: &mut Vec<Node>) -> Result<Option<Close>, ParseError> {
        let double = self.rest().starts_with("$$");
        match self.frames.last() {
            Some(Frame::Math(GroupDelim::InlineMath)) => {
                self.pos += 1;
                return Ok(Some(Close::Closed));
            }
            Some(Frame::Math(GroupDelim::DisplayMath)) if double => {
                self.pos += 2;
                return Ok(Some(Close::Closed));
            }
            _ => {}
        }

        let delim = if double {
            GroupDelim::DisplayMath
        } else {
            GroupDelim::InlineMath
        };
        self.pos += delim.delimiters().0.len();
        nodes.extend(self.group(Frame::Math(delim), delim)?);
        Ok(None)
    }

    /// Everything starting with a backslash.
    fn control(&mut self, nodes: &mut Vec<Node>) -> Result<Option<Close>, ParseError> {
        let start = self.pos;
        self.pos += 1;

        let Some(c) = self.peek() else {
            nodes.push(Node::text("\\"));
            return Ok(None);
        };

        if !c.is_ascii_alphabetic() {
            self.pos += c.len_utf8();
            return self.control_symbol(c, start, nodes);
        }

        let name = self.control_word();
        let base = base_name(&name).to_owned();
        match base.as_str() {
            "begin" => self.begin(name, nodes)?,
            "end" => return self.end(name, start, nodes),
            "verb" => self.verb(name, start, nodes),
            base if DEF_COMMANDS.contains(&base) => self.def(name, nodes)?,
            "let" => self.let_(name, nodes),
            base if NEWCOMMAND_COMMANDS.contains(&base) => {
                let mut args = Vec::new();
                if let Some(cs) = self.control_sequence() {
                    args.push(Argument::bare(vec![Node::command(cs, Vec::new())]));
                }
                self.command_with(name, args, nodes)?;
            }
            base => match inclusion_arity(base) {
                Some(arity) => self.inclusion(name, arity, nodes)?,
                None => self.command_with(name, Vec::new(), nodes)?,
            },
        }
        Ok(None)
    }

    /// Letters, plus one trailing `*`.
    fn control_word(&mut self) -> String {
        let rest = self.rest();
        let mut len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if rest[len..].starts_with('*') {
            len += 1;
        }
        self.pos += len;
        rest[..len].to_string()
    }

    /// `\name` or `\<symbol>` at the cursor, consumed. Name without backslash.
    fn control_sequence(&mut self) -> Option<String> {
        let mut chars = self.rest().chars();
        if chars.next() != Some('\\') {
            return None;
        }
        let c = chars.next()?;
        self.pos += 1;
        if c.is_ascii_alphabetic() {
            let rest = self.rest();
            let len = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            self.pos += len;
            Some(rest[..len].to_string())
        } else {
            self.pos += c.len_utf8();
            Some(c.to_string())
        }
    }

    fn control_symbol(
        &mut self,
        c: char,
        start: usize,
        nodes: &mut Vec<Node>,
    ) -> Result<Option<Close>, ParseError> {
        let math = match c {
            '(' => Some(GroupDelim::ParenMath),
            '[' => Some(GroupDelim::BracketMath),
            _ => None,
        };
        if let Some(delim) = math {
            nodes.extend(self.group(Frame::Math(delim), delim)?);
            return Ok(None);
        }

        let closes = match c {
            ')' => Some(GroupDelim::ParenMath),
            ']' => Some(GroupDelim::BracketMath),
            _ => None,
        };
        if let Some(delim) = closes {
            match self.owner(&Frame::Math(delim)) {
                Owner::Innermost => return Ok(Some(Close::Closed)),
                Owner::Enclosing => {
                    self.pos = start;
                    return Ok(Some(Close::Outer));
                }
                Owner::Nobody => {}
            }
        }

        nodes.push(Node::command(c.to_string(), Vec::new()));
        Ok(None)
    }

    /// Push `\name` with `args` followed by whatever arguments come next.
    fn command_with(
        &mut self,
        name: String,
        mut args: Vec<Argument>,
        nodes: &mut Vec<Node>,
    ) -> Result<(), ParseError> {
        let spilled = self.arguments(&mut args)?;
        nodes.push(Node::command(name, args));
        nodes.extend(spilled);
        Ok(())
    }

    /// Collect immediately following `{…}` / `[…]` arguments.
    ///
    /// An argument that never closes ends the argument list; its opener and
    /// contents are returned as plain nodes to follow the command.
    fn arguments(&mut self, args: &mut Vec<Argument>) -> Result<Vec<Node>, ParseError> {
        loop {
            match self.argument()? {
                Some(Ok(arg)) => args.push(arg),
                Some(Err(spilled)) => return Ok(spilled),
                None => return Ok(Vec::new()),
            }
        }
    }

    /// One `{…}` / `[…]` argument at the cursor. `Err` holds the spilled
    /// nodes of an argument that never closes.
    fn argument(&mut self) -> Result<Option<Result<Argument, Vec<Node>>>, ParseError> {
        let (frame, open) = match self.peek() {
            Some('{') => (Frame::Brace, "{"),
            Some('[') => (Frame::Bracket, "["),
            _ => return Ok(None),
        };
        self.pos += 1;
        self.enter(frame.clone())?;
        let (children, close) = self.sequence()?;
        self.frames.pop();

        Ok(Some(match (close, frame) {
            (Close::Closed, Frame::Bracket) => Ok(Argument::bracket(children)),
            (Close::Closed, _) => Ok(Argument::brace(children)),
            (Close::Outer | Close::Eof, _) => Err(spill(open, children)),
        }))
    }

    /// An inclusion command, whose file arguments TeX lets stand apart from
    /// the name.
    ///
    /// Spaces and at most one line break may precede each of the first
    /// `arity` braced arguments; the gap is kept as a bare argument. `\input`
    /// also takes TeX's undelimited form, `\input chapter`, where the file
    /// name runs to the next space or special character.
    fn inclusion(
        &mut self,
        name: String,
        arity: usize,
        nodes: &mut Vec<Node>,
    ) -> Result<(), ParseError> {
        let mut args = Vec::new();
        let mut taken = 0;
        while taken < arity {
            let gap = self.gap_len();
            let after = &self.rest()[gap..];
            if after.starts_with('{') {
                self.take_gap(gap, &mut args);
                match self.argument()? {
                    Some(Ok(arg)) => args.push(arg),
                    Some(Err(spilled)) => {
                        nodes.push(Node::command(name, args));
                        nodes.extend(spilled);
                        return Ok(());
                    }
                    None => break,
                }
                taken += 1;
                continue;
            }

            let file_len = after
                .find(|c: char| c.is_whitespace() || "%{}[]$\\".contains(c))
                .unwrap_or(after.len());
            if taken == 0 && base_name(&name) == "input" && file_len > 0 {
                let file = after[..file_len].to_string();
                self.take_gap(gap, &mut args);
                self.pos += file_len;
                args.push(Argument::bare(vec![Node::text(file)]));
            }
            break;
        }
        self.command_with(name, args, nodes)
    }

    /// Length of the spaces, tabs and single line break at the cursor.
    fn gap_len(&self) -> usize {
        let mut newline = false;
        let mut len = 0;
        for c in self.rest().chars() {
            match c {
                ' ' | '\t' | '\r' => {}
                '\n' if !newline => newline = true,
                _ => break,
            }
            len += c.len_utf8();
        }
        len
    }

    fn take_gap(&mut self, gap: usize, args: &mut Vec<Argument>) {
        if gap > 0 {
            args.push(Argument::bare(vec![Node::text(&self.rest()[..gap])]));
            self.pos += gap;
        }
    }

    /// `{name}` right at the cursor, consumed only when well-formed.
    fn environment_name(&mut self) -> Option<String> {
        let rest = self.rest().strip_prefix('{')?;
        let len = rest.find(['}', '{', '\\', '%', '\n'])?;
        if len == 0 || !rest[len..].starts_with('}') {
            return None;
        }
        self.pos += len + 2;
        Some(rest[..len].to_string())
    }

    fn begin(&mut self, command: String, nodes: &mut Vec<Node>) -> Result<(), ParseError> {
        let Some(name) = self.environment_name() else {
            return self.command_with(command, Vec::new(), nodes);
        };

        let mut args = Vec::new();
        let spilled = if ARGLESS_VERBATIM.contains(&name.as_str()) {
            Vec::new()
        } else {
            self.arguments(&mut args)?
        };

        if !spilled.is_empty() {
            // Broken argument list: treat `\begin` as an ordinary command.
            let mut all = vec![Argument::brace(vec![Node::text(name)])];
            all.extend(args);
            nodes.push(Node::command(command, all));
            nodes.extend(spilled);
            return Ok(());
        }

        if VERBATIM_ENVIRONMENTS.contains(&name.as_str()) {
            let end = format!("\\end{{{name}}}");
            if let Some(len) = self.rest().find(&end) {
                let raw = &self.rest()[..len];
                let body = if raw.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::verbatim(raw)]
                };
                self.pos += len + end.len();
                nodes.push(Node::environment(name, args, body));
                return Ok(());
            }
        }

        self.enter(Frame::Env(name.clone()))?;
        let (body, close) = self.sequence()?;
        self.frames.pop();

        match close {
            Close::Closed => nodes.push(Node::environment(name, args, body)),
            Close::Outer | Close::Eof => {
                let mut all = vec![Argument::brace(vec![Node::text(name)])];
                all.extend(args);
                nodes.push(Node::command(command, all));
                nodes.extend(body);
            }
        }
        Ok(())
    }

    fn end(
        &mut self,
        command: String,
        start: usize,
        nodes: &mut Vec<Node>,
    ) -> Result<Option<Close>, ParseError> {
        let before = self.pos;
        let Some(name) = self.environment_name() else {
            self.command_with(command, Vec::new(), nodes)?;
            return Ok(None);
        };

        match self.owner(&Frame::Env(name.clone())) {
            Owner::Innermost => Ok(Some(Close::Closed)),
            Owner::Enclosing => {
                self.pos = start;
                Ok(Some(Close::Outer))
            }
            Owner::Nobody => {
                // Not ours to close: re-read `{name}` as an ordinary argument.
                self.pos = before;
                self.command_with(command, Vec::new(), nodes)?;
                Ok(None)
            }
        }
    }

    /// `\verb<d>…<d>`, kept as one whitespace-preserving text node.
    fn verb(&mut self, name: String, start: usize, nodes: &mut Vec<Node>) {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        let spanned = match chars.next() {
            Some((_, d)) if !d.is_whitespace() && !d.is_ascii_alphabetic() => rest
                [d.len_utf8()..]
                .find([d, '\n'])
                .filter(|&i| rest[d.len_utf8() + i..].starts_with(d))
                .map(|i| d.len_utf8() + i + d.len_utf8()),
            _ => None,
        };

        match spanned {
            Some(len) => {
                self.pos += len;
                nodes.push(Node::verbatim(&self.src[start..self.pos]));
            }
            None => nodes.push(Node::command(name, Vec::new())),
        }
    }

    /// `\def\name<params>{body}` and friends.
    fn def(&mut self, name: String, nodes: &mut Vec<Node>) -> Result<(), ParseError> {
        let mut args = Vec::new();
        if let Some(cs) = self.control_sequence() {
            args.push(Argument::bare(vec![Node::command(cs, Vec::new())]));

            let rest = self.rest();
            if let Some(len) = rest.find(['{', '\\', '%', '}', '\n']) {
                if len > 0 && rest[len..].starts_with('{') {
                    args.push(Argument::bare(vec![Node::text(&rest[..len])]));
                    self.pos += len;
                }
            }
        }
        self.command_with(name, args, nodes)
    }

    /// `\let\a\b`, `\let\a=\b`, `\let\a = \b`.
    fn let_(&mut self, name: String, nodes: &mut Vec<Node>) {
        let mut args = Vec::new();
        if let Some(first) = self.control_sequence() {
            args.push(Argument::bare(vec![Node::command(first, Vec::new())]));

            let rest = self.rest();
            let len = rest
                .find(|c: char| c != ' ' && c != '=')
                .unwrap_or(rest.len());
            if rest[len..].starts_with('\\') {
                if len > 0 {
                    args.push(Argument::bare(vec![Node::text(&rest[..len])]));
                    self.pos += len;
                }
                if let Some(second) = self.control_sequence() {
                    args.push(Argument::bare(vec![Node::command(second, Vec::new())]));
                }
            }
        }
        nodes.push(Node::command(name, args));
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::text(std::mem::take(text)));
    }
}

/// The nodes an unterminated construct turns into.
fn spill(open: &str, children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len() + 1);
    out.push(Node::text(open));
    out.extend(children);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::render;
    use pretty_assertions::assert_eq;

    fn children(text: &str) -> Vec<Node> {
        match parse(text).unwrap() {
            Node::Group { children, .. } => children,
            other => panic!("root is not a group: {other:?}"),
        }
    }

    fn assert_lossless(text: &str) {
        assert_eq!(render(&parse(text).unwrap()), text);
    }

    #[test]
    fn command_with_brace_argument() {
        assert_eq!(
            children("\\textbf{X}"),
            vec![Node::command(
                "textbf",
                vec![Argument::brace(vec![Node::text("X")])]
            )]
        );
    }

    #[test]
    fn optional_and_required_arguments() {
        let nodes = children("\\documentclass[11pt]{article}");
        assert_eq!(
            nodes,
            vec![Node::command(
                "documentclass",
                vec![
                    Argument::bracket(vec![Node::text("11pt")]),
                    Argument::brace(vec![Node::text("article")]),
                ]
            )]
        );
    }

    #[test]
    fn arguments_must_be_adjacent() {
        let nodes = children("\\item [a]");
        assert_eq!(nodes[0], Node::command("item", Vec::new()));
        assert_eq!(nodes[1], Node::text(" [a]"));
    }

    #[test]
    fn unclosed_bracket_is_not_an_argument() {
        let text = "\\foo[a b";
        assert_eq!(
            children(text),
            vec![
                Node::command("foo", Vec::new()),
                Node::text("["),
                Node::text("a b")
            ]
        );
        assert_lossless(text);
    }

    #[test]
    fn comment_keeps_its_line_break() {
        let nodes = children("a% hi\nb");
        assert_eq!(
            nodes,
            vec![Node::text("a"), Node::comment("% hi\n"), Node::text("b")]
        );
    }

    #[test]
    fn escaped_percent_is_a_control_symbol() {
        let nodes = children("50\\% done");
        assert_eq!(nodes[1], Node::command("%", Vec::new()));
        assert!(nodes.iter().all(|n| !matches!(n, Node::Comment { .. })));
    }

    #[test]
    fn environment_with_arguments_and_body() {
        let nodes = children("\\begin{tabular}{cc}a & b\\end{tabular}");
        assert_eq!(
            nodes,
            vec![Node::environment(
                "tabular",
                vec![Argument::brace(vec![Node::text("cc")])],
                vec![Node::text("a & b")]
            )]
        );
    }

    #[test]
    fn nested_environments() {
        let nodes = children("\\begin{a}\\begin{b}x\\end{b}\\end{a}");
        let Node::Environment { name, body, .. } = &nodes[0] else {
            panic!("expected environment");
        };
        assert_eq!(name, "a");
        assert!(body[0].is_environment("b"));
    }

    #[test]
    fn unterminated_environment_is_flattened() {
        let text = "\\begin{itemize}\\item x";
        let nodes = children(text);
        assert_eq!(nodes[0].name(), Some("begin"));
        assert_eq!(nodes[1], Node::command("item", Vec::new()));
        assert_lossless(text);
    }

    #[test]
    fn stray_end_is_a_plain_command() {
        let text = "x\\end{itemize}y";
        let nodes = children(text);
        assert_eq!(nodes[1].name(), Some("end"));
        assert_lossless(text);
    }

    #[test]
    fn end_of_enclosing_environment_closes_inner_one() {
        let text = "\\begin{a}\\begin{b}x\\end{a}";
        let nodes = children(text);
        let Node::Environment { name, body, .. } = &nodes[0] else {
            panic!("expected environment");
        };
        assert_eq!(name, "a");
        assert_eq!(body[0].name(), Some("begin"));
        assert_lossless(text);
    }

    #[test]
    fn verbatim_body_is_raw_and_preserved() {
        let nodes = children("\\begin{verbatim}\n  \\input{x} % not a comment\n\\end{verbatim}");
        assert_eq!(
            nodes,
            vec![Node::environment(
                "verbatim",
                Vec::new(),
                vec![Node::verbatim("\n  \\input{x} % not a comment\n")]
            )]
        );
    }

    #[test]
    fn lstlisting_takes_options() {
        let nodes = children("\\begin{lstlisting}[language=C]\nint x;\n\\end{lstlisting}");
        let Node::Environment { args, body, .. } = &nodes[0] else {
            panic!("expected environment");
        };
        assert_eq!(args.len(), 1);
        assert_eq!(body, &vec![Node::verbatim("\nint x;\n")]);
    }

    #[test]
    fn verb_is_one_preserved_text() {
        let nodes = children("see \\verb|a  {b| here");
        assert_eq!(nodes[1], Node::verbatim("\\verb|a  {b|"));
        assert_eq!(nodes[2], Node::text(" here"));
    }

    #[test]
    fn math_groups() {
        let nodes = children("$x$ and $$y$$ and \\(z\\) and \\[w\\]");
        let delims: Vec<GroupDelim> = nodes
            .iter()
            .filter_map(|n| match n {
                Node::Group { delim, .. } => Some(*delim),
                _ => None,
            })
            .collect();
        assert_eq!(
            delims,
            vec![
                GroupDelim::InlineMath,
                GroupDelim::DisplayMath,
                GroupDelim::ParenMath,
                GroupDelim::BracketMath
            ]
        );
    }

    #[test]
    fn def_takes_name_params_and_body() {
        let nodes = children("\\def\\foo#1{#1!}");
        assert_eq!(
            nodes,
            vec![Node::command(
                "def",
                vec![
                    Argument::bare(vec![Node::command("foo", Vec::new())]),
                    Argument::bare(vec![Node::text("#1")]),
                    Argument::brace(vec![Node::text("#1!")]),
                ]
            )]
        );
    }

    #[test]
    fn newcommand_with_braced_and_bare_names() {
        let braced = children("\\newcommand{\\vx}{\\mathbf{x}}");
        let Node::Command { args, .. } = &braced[0] else {
            panic!("expected command");
        };
        assert_eq!(args.len(), 2);

        let bare = children("\\newcommand\\vx[1]{#1}");
        let Node::Command { name, args } = &bare[0] else {
            panic!("expected command");
        };
        assert_eq!(name, "newcommand");
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].delim, crate::node::ArgDelim::Bare);
    }

    #[test]
    fn let_takes_two_control_sequences() {
        let nodes = children("\\let\\a = \\b rest");
        let Node::Command { name, args } = &nodes[0] else {
            panic!("expected command");
        };
        assert_eq!(name, "let");
        assert_eq!(args.len(), 3);
        assert_eq!(nodes[1], Node::text(" rest"));
    }

    #[test]
    fn starred_names() {
        let nodes = children("\\section*{Intro}\\begin{figure*}x\\end{figure*}");
        assert_eq!(nodes[0].name(), Some("section*"));
        assert!(nodes[1].is_environment("figure*"));
    }

    #[test]
    fn unicode_text_survives() {
        assert_lossless("Ünïcödé — \\emph{naïve} $α+β$ 日本語");
    }

    #[test]
    fn unbalanced_inputs_are_lossless() {
        for text in [
            "}",
            "{",
            "{{}",
            "a}b{c",
            "$x",
            "$$x$",
            "\\[x",
            "x\\]",
            "\\)",
            "\\",
            "\\begin",
            "\\begin{",
            "\\begin{x}{",
            "\\end",
            "\\foo{a]b}[c{d}]",
            "[x]]",
            "{\\begin{x}}\\end{x}",
            "\\verb",
            "\\verb|abc",
            "\\def\\x",
            "\\let\\a",
            "% only a comment",
            "\\begin{verbatim}never closed",
        ] {
            assert_lossless(text);
        }
    }

    #[test]
    fn inclusion_arguments_may_follow_whitespace() {
        assert_eq!(
            children("\\input {a}"),
            vec![Node::command(
                "input",
                vec![
                    Argument::bare(vec![Node::text(" ")]),
                    Argument::brace(vec![Node::text("a")]),
                ]
            )]
        );
        assert_eq!(
            children("\\input intro z"),
            vec![
                Node::command(
                    "input",
                    vec![
                        Argument::bare(vec![Node::text(" ")]),
                        Argument::bare(vec![Node::text("intro")]),
                    ]
                ),
                Node::text(" z"),
            ]
        );
    }

    #[test]
    fn inclusion_takes_only_its_own_arguments() {
        let nodes = children("\\input{a} {b}");
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0],
            Node::command("input", vec![Argument::brace(vec![Node::text("a")])])
        );
        // Ordinary commands still need their arguments right after the name.
        assert_eq!(children("\\textbf {x}").len(), 3);
    }

    #[test]
    fn spaced_inclusions_are_lossless() {
        for text in [
            "\\input {a}",
            "\\input\n{a}",
            "\\input\n\n{a}",
            "\\input intro",
            "\\input ./dir/intro.tex\n",
            "\\import {dir/}  {file}",
            "\\subimport\t{d}\n{f}[x]",
            "\\include {",
            "\\input %c\n{a}",
            "\\input",
        ] {
            assert_lossless(text);
        }
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let text = "{".repeat(MAX_DEPTH + 10);
        assert!(matches!(parse(&text), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn nesting_within_limit_is_fine() {
        let text = format!("{}{}", "{".repeat(100), "}".repeat(100));
        assert_lossless(&text);
    }

    #[test]
    fn tex_syntax_round_trips() {
        let syntax = TexSyntax;
        let text = "\\documentclass{article}\n% hi\n\\begin{document}\n\\input{a}\n\\end{document}";
        let tree = syntax.parse(text).unwrap();
        assert_eq!(syntax.render(&tree), text);
    }
}
