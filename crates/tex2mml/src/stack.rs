//! The parse stack: a list of [`StackItem`]s that reduce as new items arrive.

use std::collections::VecDeque;

use tex2mml_tree::Node;

use crate::error::{TexErrKind, err};
use crate::parser::ParseResult;
use crate::stack_item::{Action, ArrayItem, ItemKind, StackItem};
use crate::tags::Numbering;

/// Settings that are scoped to a group, like the current font.
///
/// Every open item carries its own copy; everything pushed on top of it sees that copy.
#[derive(Debug, Clone, Default)]
pub(crate) struct Env {
    /// The `mathvariant` of letters and operators.
    pub font: Option<&'static str>,
    /// Whether runs of letters form a single identifier (inside `\mathrm` and friends).
    pub multi_letter: bool,
    pub color: Option<String>,
    /// Set while parsing the index of a root, where `\leftroot` and `\uproot` are allowed.
    pub in_root: bool,
}

/// State shared by the whole stack of one parse.
#[derive(Debug, Default)]
pub(crate) struct Global {
    /// Sub-parses (arguments, root indices, math inside text) are inner.
    pub is_inner: bool,
    /// Set while inside a numbered equation environment.
    pub eqnenv: bool,
    pub left_root: Option<String>,
    pub up_root: Option<String>,
}

pub(crate) struct Stack {
    items: Vec<StackItem>,
    pub global: Global,
    base_env: Env,
}

impl Stack {
    pub fn new(env: Env, is_inner: bool) -> Self {
        let mut start = StackItem::new(ItemKind::Start);
        start.env = Some(env.clone());
        Stack {
            items: vec![start],
            global: Global {
                is_inner,
                ..Default::default()
            },
            base_env: env,
        }
    }

    /// Push an item and reduce until the stack is stable again.
    ///
    /// Replacement items produced by a reduction are handled before anything else that is still
    /// pending, in the order in which they were produced.
    pub fn push(&mut self, item: StackItem, tags: &mut Numbering) -> ParseResult<()> {
        let mut pending = VecDeque::from([item]);
        while let Some(item) = pending.pop_front() {
            let Some(top) = self.items.last_mut() else {
                self.open(item);
                continue;
            };
            match top.check_item(item, &mut self.global, tags)? {
                Action::Push(item) => self.open(item),
                Action::Drop => {}
                Action::Replace(items) => {
                    self.items.pop();
                    for item in items.into_iter().rev() {
                        pending.push_front(item);
                    }
                }
                Action::Repush => {
                    if let Some(top) = self.items.pop() {
                        pending.push_front(top);
                    }
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn push_node(&mut self, node: Node, tags: &mut Numbering) -> ParseResult<()> {
        self.push(StackItem::mml(node), tags)
    }

    fn open(&mut self, mut item: StackItem) {
        if item.is_open() {
            let env = if item.copy_env() {
                self.env().clone()
            } else {
                Env::default()
            };
            item.env = Some(env);
        }
        self.items.push(item);
    }

    /// Remove the top item. The `start` item can't be removed.
    pub fn pop(&mut self) -> ParseResult<StackItem> {
        match self.items.last() {
            Some(item) if !matches!(item.kind, ItemKind::Start) => match self.items.pop() {
                Some(item) => Ok(item),
                None => err(TexErrKind::Internal),
            },
            _ => err(TexErrKind::Internal),
        }
    }

    #[inline]
    pub fn top(&self) -> Option<&StackItem> {
        self.items.last()
    }

    #[inline]
    pub fn top_mut(&mut self) -> Option<&mut StackItem> {
        self.items.last_mut()
    }

    /// The array item on top of the stack, if there is one.
    pub fn top_array_mut(&mut self) -> Option<&mut ArrayItem> {
        match &mut self.items.last_mut()?.kind {
            ItemKind::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Take the most recently finished node off the top item.
    #[inline]
    pub fn prev(&mut self) -> Option<Node> {
        self.items.last_mut()?.data.pop()
    }

    /// Look at the most recently finished node of the top item.
    #[cfg(test)]
    pub fn prev_ref(&self) -> Option<&Node> {
        self.items.last()?.data.last()
    }

    /// Put a node back into the data of the top item without reducing anything.
    pub fn restore_prev(&mut self, node: Node) {
        if let Some(top) = self.items.last_mut() {
            top.data.push(node);
        }
    }

    pub fn env(&self) -> &Env {
        self.items
            .iter()
            .rev()
            .find_map(|item| item.env.as_ref())
            .unwrap_or(&self.base_env)
    }

    pub fn env_mut(&mut self) -> &mut Env {
        match self.items.iter_mut().rev().find_map(|item| item.env.as_mut()) {
            Some(env) => env,
            None => &mut self.base_env,
        }
    }

    /// The end template of the innermost user environment, if it is called `name` and its end
    /// hasn't been expanded yet.
    pub fn take_end_def(&mut self, name: &str) -> Option<String> {
        self.items.iter_mut().rev().find_map(|item| match &mut item.kind {
            ItemKind::Begin {
                name: begin,
                end_def,
            } if begin.as_str() == name => Some(end_def.take()),
            ItemKind::Begin { .. } => Some(None),
            _ => None,
        })?
    }

    /// The finished node, once the `stop` item has been pushed.
    pub fn into_result(mut self) -> (Option<Node>, Global) {
        let node = match self.items.as_mut_slice() {
            [item] if matches!(item.kind, ItemKind::Mml) => item.data.pop(),
            _ => None,
        };
        (node, self.global)
    }
}

#[cfg(test)]
mod tests {
    use tex2mml_tree::Kind;

    use super::*;
    use crate::tags::Numbering;

    fn mi(s: &str) -> Node {
        Node::token(Kind::Mi, s)
    }

    #[test]
    fn stop_leaves_single_result() {
        let mut tags = Numbering::default();
        let mut stack = Stack::new(Env::default(), true);
        stack.push_node(mi("a"), &mut tags).unwrap();
        stack.push_node(mi("b"), &mut tags).unwrap();
        stack
            .push(StackItem::new(ItemKind::Stop), &mut tags)
            .unwrap();
        let (node, _) = stack.into_result();
        let node = node.unwrap();
        assert_eq!(node.kind, Kind::InferredMrow);
        assert_eq!(node.children.len(), 2);
    }

    #[test]
    fn groups_copy_the_env() {
        let mut tags = Numbering::default();
        let mut stack = Stack::new(Env::default(), true);
        stack.env_mut().font = Some("bold");
        stack
            .push(StackItem::new(ItemKind::Open), &mut tags)
            .unwrap();
        assert_eq!(stack.env().font, Some("bold"));
        stack.env_mut().font = Some("normal");
        stack
            .push(StackItem::new(ItemKind::Close), &mut tags)
            .unwrap();
        assert_eq!(stack.env().font, Some("bold"));
        assert_eq!(stack.prev_ref().map(|n| n.kind), Some(Kind::TeXAtom));
    }

    #[test]
    fn start_item_is_never_popped() {
        let mut stack = Stack::new(Env::default(), true);
        let err = stack.pop().unwrap_err();
        assert_eq!(err.id(), "Internal");
    }

    #[test]
    fn prev_takes_last_node() {
        let mut tags = Numbering::default();
        let mut stack = Stack::new(Env::default(), true);
        assert!(stack.prev().is_none());
        stack.push_node(mi("x"), &mut tags).unwrap();
        assert_eq!(stack.prev_ref().map(|n| n.text.as_str()), Some("x"));
        assert_eq!(stack.prev().map(|n| n.text), Some("x".to_string()));
        assert!(stack.prev_ref().is_none());
    }
}
