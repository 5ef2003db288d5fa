//! The generic tree walker every stripping pass is built on.
//!
//! A pass is nothing but a decision function: for each node, given its
//! parent, say whether to descend into it ([`Action::Continue`]), leave it
//! alone ([`Action::Skip`]) or drop it together with everything below it
//! ([`Action::Remove`]).
//!
//! ## Removal
//!
//! All children of a node are classified first, against the intact parent,
//! and only then is the child list rebuilt from the survivors. Nothing is
//! ever deleted from a list while it is being iterated, so no sibling can be
//! skipped or visited twice.
//!
//! ## Faults
//!
//! Documents are untrusted third-party text. A decision function that panics
//! on some odd node must not take the whole walk down with it: each call runs
//! behind [`std::panic::catch_unwind`], and a panicking call counts as
//! [`Action::Skip`] for that node while the walk carries on with its
//! siblings.

use crate::node::Node;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// What the walker does with one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep the node and walk its arguments and children.
    Continue,
    /// Keep the node and its whole subtree untouched.
    Skip,
    /// Detach the node, and everything below it, from its parent.
    Remove,
}

/// Walk `node` depth-first, applying `decide` to every node.
///
/// `decide` receives the node and its parent (`None` for the root). Removing
/// the root yields an empty bare group.
pub fn walk<F>(node: Node, decide: &mut F) -> Node
where
    F: FnMut(&Node, Option<&Node>) -> Action,
{
    match guarded(decide, &node, None) {
        Action::Remove => Node::empty(),
        Action::Skip => node,
        Action::Continue => descend(node, decide),
    }
}

fn descend<F>(mut node: Node, decide: &mut F) -> Node
where
    F: FnMut(&Node, Option<&Node>) -> Action,
{
    let verdicts: Vec<Vec<Action>> = node
        .child_lists()
        .into_iter()
        .map(|list| {
            list.iter()
                .map(|child| guarded(decide, child, Some(&node)))
                .collect()
        })
        .collect();

    for (list, actions) in node.child_lists_mut().into_iter().zip(verdicts) {
        let old = std::mem::take(list);
        *list = old
            .into_iter()
            .zip(actions)
            .filter_map(|(child, action)| match action {
                Action::Remove => None,
                Action::Skip => Some(child),
                Action::Continue => Some(descend(child, decide)),
            })
            .collect();
    }
    node
}

/// Call `decide`, turning a panic into [`Action::Skip`].
fn guarded<F>(decide: &mut F, node: &Node, parent: Option<&Node>) -> Action
where
    F: FnMut(&Node, Option<&Node>) -> Action,
{
    match panic::catch_unwind(AssertUnwindSafe(|| decide(node, parent))) {
        Ok(action) => action,
        Err(_) => {
            warn!(
                "Decision function panicked on a {} node; leaving it untouched",
                kind_of(node)
            );
            Action::Skip
        }
    }
}

fn kind_of(node: &Node) -> &'static str {
    match node {
        Node::Command { .. } => "command",
        Node::Environment { .. } => "environment",
        Node::Group { .. } => "group",
        Node::Text { .. } => "text",
        Node::Comment { .. } => "comment",
    }
}
