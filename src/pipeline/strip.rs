//! Structural stripping passes.
//!
//! Each pass is one decision function handed to [`walk`]; none keeps state
//! between nodes. [`apply`] runs the enabled passes in their fixed order:
//!
//! 1. comments
//! 2. whitespace
//! 3. clutter
//! 4. document-root narrowing
//!
//! Comments go first so that the whitespace left on either side of a removed
//! comment is seen, and removed, by the whitespace pass.

use crate::config::{ClutterSet, ConversionConfig};
use crate::node::Node;
use crate::pipeline::walk::{walk, Action};
use tracing::debug;

/// Run every pass enabled in `config`, in order.
pub fn apply(node: Node, config: &ConversionConfig) -> Node {
    let mut node = node;
    if config.strip_comments {
        node = strip_comments(node);
    }
    if config.strip_whitespace {
        node = strip_whitespace(node);
    }
    if config.strip_clutter {
        node = strip_clutter(node, &config.clutter);
    }
    if config.narrow_to_document {
        node = narrow_to_document(node);
    }
    node
}

/// Remove every comment.
pub fn strip_comments(node: Node) -> Node {
    walk(node, &mut |node, _| match node {
        Node::Comment { .. } => Action::Remove,
        _ => Action::Continue,
    })
}

/// Remove text nodes that are nothing but whitespace.
///
/// Text flagged `preserve_whitespace` always stays, and text with any
/// non-whitespace character in it is never touched.
pub fn strip_whitespace(node: Node) -> Node {
    walk(node, &mut |node, _| match node {
        Node::Text {
            raw,
            preserve_whitespace: false,
        } if is_blank(raw) => Action::Remove,
        _ => Action::Continue,
    })
}

/// Remove presentational environments and declaration commands.
pub fn strip_clutter(node: Node, clutter: &ClutterSet) -> Node {
    walk(node, &mut |node, _| match node {
        Node::Environment { name, .. } if clutter.is_clutter_environment(name) => Action::Remove,
        Node::Command { name, .. } if clutter.is_clutter_command(name) => Action::Remove,
        _ => Action::Continue,
    })
}

/// Make the first `document` environment the root, if there is one.
///
/// The search is pre-order, so an outer `document` wins over one nested in
/// it. Without a `document` environment the tree comes back unchanged.
pub fn narrow_to_document(node: Node) -> Node {
    let mut path = Vec::new();
    if !locate(&node, "document", &mut path) {
        debug!("No document environment; keeping the whole tree");
        return node;
    }

    let mut node = node;
    for (list, index) in path {
        let taken = {
            let mut lists = node.child_lists_mut();
            std::mem::replace(&mut lists[list][index], Node::empty())
        };
        node = taken;
    }
    node
}

fn is_blank(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(char::is_whitespace)
}

/// Record the `(child list, index)` steps from `node` down to the first
/// environment called `name`.
fn locate(node: &Node, name: &str, path: &mut Vec<(usize, usize)>) -> bool {
    if node.is_environment(name) {
        return true;
    }
    for (list_index, list) in node.child_lists().into_iter().enumerate() {
        for (index, child) in list.iter().enumerate() {
            path.push((list_index, index));
            if locate(child, name, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
