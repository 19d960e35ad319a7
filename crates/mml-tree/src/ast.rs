#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::IntoStaticStr;

use crate::attribute::{Attributes, Props, TexClass};

/// The kind of a node, which is also its tag name when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Math,
    Mi,
    Mo,
    Mn,
    Mtext,
    Mspace,
    Mrow,
    /// A row that exists only to group children; it has no tag of its own.
    #[strum(serialize = "mrow")]
    InferredMrow,
    Mfrac,
    Msqrt,
    Mroot,
    Mstyle,
    Merror,
    Mpadded,
    Mphantom,
    Menclose,
    Msub,
    Msup,
    Msubsup,
    Munder,
    Mover,
    Munderover,
    Mtable,
    Mtr,
    Mlabeledtr,
    Mtd,
    /// A group with an explicit TeX class, serialized as an `mrow`.
    #[strum(serialize = "TeXAtom")]
    TeXAtom,
    /// Four alternatives chosen by the style at the point of use.
    #[strum(serialize = "mathchoice")]
    MathChoice,
    Semantics,
    Annotation,
}

impl Kind {
    #[inline]
    pub fn as_str(self) -> &'static str {
        <&'static str>::from(self)
    }

    /// Token elements carry text instead of children.
    #[inline]
    pub fn is_token(self) -> bool {
        matches!(
            self,
            Kind::Mi | Kind::Mo | Kind::Mn | Kind::Mtext | Kind::Mspace | Kind::Annotation
        )
    }

    /// Nodes that lay out their children horizontally.
    #[inline]
    pub fn is_row_like(self) -> bool {
        matches!(
            self,
            Kind::Math
                | Kind::Mrow
                | Kind::InferredMrow
                | Kind::TeXAtom
                | Kind::Mstyle
                | Kind::Mpadded
                | Kind::Mphantom
                | Kind::Merror
                | Kind::Mtd
                | Kind::Msqrt
                | Kind::Menclose
        )
    }

    /// Nodes whose first child is a base decorated by scripts or limits.
    #[inline]
    pub fn is_scripted(self) -> bool {
        matches!(
            self,
            Kind::Msub | Kind::Msup | Kind::Msubsup | Kind::Munder | Kind::Mover | Kind::Munderover
        )
    }
}

/// A node of the expression tree.
///
/// Children are owned. A `None` child is a placeholder for a script slot that has not been
/// filled yet; the post-processing filters remove all of them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Node {
    pub kind: Kind,
    pub children: Vec<Option<Node>>,
    /// Text content of token elements.
    pub text: String,
    pub attributes: Attributes,
    pub props: Props,
    pub tex_class: Option<TexClass>,
}

impl Node {
    pub fn new(kind: Kind) -> Self {
        Node {
            kind,
            children: Vec::new(),
            text: String::new(),
            attributes: Attributes::default(),
            props: Props::empty(),
            tex_class: None,
        }
    }

    /// A token element with the given text.
    pub fn token(kind: Kind, text: impl Into<String>) -> Self {
        let mut node = Node::new(kind);
        node.text = text.into();
        node
    }

    pub fn with_children(kind: Kind, children: Vec<Node>) -> Self {
        let mut node = Node::new(kind);
        for child in children {
            node.push_child(child);
        }
        node
    }

    /// A node with explicit slots, some of which may still be empty.
    pub fn with_slots(kind: Kind, slots: Vec<Option<Node>>) -> Self {
        let mut node = Node::new(kind);
        node.children = slots.into_iter().map(|slot| slot.map(Node::into_slot)).collect();
        node
    }

    /// A `TeXAtom` of the given class around `children`.
    pub fn atom(class: TexClass, children: Vec<Node>) -> Self {
        let mut node = Node::with_children(Kind::TeXAtom, children);
        node.tex_class = Some(class);
        node
    }

    /// An `mrow` of the given class, used for fenced groups.
    pub fn row_with_class(class: TexClass, children: Vec<Node>) -> Self {
        let mut node = Node::with_children(Kind::Mrow, children);
        node.tex_class = Some(class);
        node
    }

    #[inline]
    pub fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    /// Append a child. An inferred row is dissolved into a row-like parent and becomes a real
    /// `mrow` anywhere else.
    pub fn push_child(&mut self, child: Node) {
        if child.kind == Kind::InferredMrow && self.kind.is_row_like() {
            self.children.extend(child.children);
        } else {
            self.children.push(Some(child.into_slot()));
        }
    }

    /// The node as it should appear in a fixed position of its parent.
    fn into_slot(mut self) -> Node {
        if self.kind == Kind::InferredMrow {
            self.kind = Kind::Mrow;
        }
        self
    }

    #[inline]
    pub fn child(&self, idx: usize) -> Option<&Node> {
        self.children.get(idx).and_then(Option::as_ref)
    }

    #[inline]
    pub fn child_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.children.get_mut(idx).and_then(Option::as_mut)
    }

    /// Put `child` into slot `idx`, growing the slot list if needed.
    pub fn set_child(&mut self, idx: usize, child: Option<Node>) {
        if self.children.len() <= idx {
            self.children.resize_with(idx + 1, || None);
        }
        self.children[idx] = child.map(Node::into_slot);
    }

    /// Whether slot `idx` exists and is filled.
    #[inline]
    pub fn has_child(&self, idx: usize) -> bool {
        self.child(idx).is_some()
    }

    pub fn set_attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn with_class(mut self, class: TexClass) -> Self {
        self.tex_class = Some(class);
        self
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props |= props;
        self
    }

    #[inline]
    pub fn has_prop(&self, prop: Props) -> bool {
        self.props.contains(prop)
    }

    #[inline]
    pub fn set_prop(&mut self, prop: Props, value: bool) {
        self.props.set(prop, value);
    }

    /// Number of filled children.
    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// A single-character token element.
    pub fn is_single_char_token(&self) -> bool {
        self.kind.is_token() && {
            let mut chars = self.text.chars();
            chars.next().is_some() && chars.next().is_none()
        }
    }

    /// The node at the heart of an embellished construct: the base of a scripted node or
    /// fraction, or the only child of a grouping node.
    pub fn core(&self) -> &Node {
        match self.kind {
            k if k.is_scripted() || k == Kind::Mfrac => match self.child(0) {
                Some(base) => base.core(),
                None => self,
            },
            Kind::InferredMrow | Kind::TeXAtom | Kind::Mstyle | Kind::Mpadded | Kind::Mphantom
                if self.children.len() == 1 =>
            {
                match self.child(0) {
                    Some(inner) => inner.core(),
                    None => self,
                }
            }
            _ => self,
        }
    }

    /// Run `f` on the core of this node (see [`Node::core`]).
    pub fn with_core_mut<F: FnOnce(&mut Node)>(&mut self, f: F) {
        let descend = match self.kind {
            k if k.is_scripted() || k == Kind::Mfrac => true,
            Kind::InferredMrow | Kind::TeXAtom | Kind::Mstyle | Kind::Mpadded | Kind::Mphantom => {
                self.children.len() == 1
            }
            _ => false,
        };
        if descend {
            if let Some(inner) = self.child_mut(0) {
                inner.with_core_mut(f);
                return;
            }
        }
        f(self);
    }

    /// The core operator if this node is an embellished operator.
    pub fn core_mo(&self) -> Option<&Node> {
        let core = self.core();
        core.is(Kind::Mo).then_some(core)
    }

    /// The TeX class of this node, derived from its kind if none was set.
    pub fn tex_class(&self) -> TexClass {
        if let Some(class) = self.tex_class {
            return class;
        }
        match self.kind {
            Kind::Mfrac => TexClass::Inner,
            k if k.is_scripted() => match self.child(0) {
                Some(base) => base.tex_class(),
                None => TexClass::Ord,
            },
            Kind::InferredMrow | Kind::Mstyle if self.children.len() == 1 => {
                self.child(0).map_or(TexClass::Ord, Node::tex_class)
            }
            _ => TexClass::Ord,
        }
    }

    /// The TeX class of the core operator, or of the node itself if it is not embellished.
    pub fn core_class(&self) -> TexClass {
        match self.core_mo() {
            Some(mo) => mo.tex_class(),
            None => self.tex_class(),
        }
    }

    /// Collect the text of all token descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in self.children.iter().flatten() {
            child.collect_text(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names() {
        assert_eq!(Kind::Munderover.as_str(), "munderover");
        assert_eq!(Kind::InferredMrow.as_str(), "mrow");
        assert_eq!(Kind::TeXAtom.as_str(), "TeXAtom");
    }

    #[test]
    fn set_child_grows_slots() {
        let mut node = Node::new(Kind::Msubsup);
        node.set_child(0, Some(Node::token(Kind::Mi, "x")));
        node.set_child(2, Some(Node::token(Kind::Mn, "2")));
        assert_eq!(node.children.len(), 3);
        assert!(node.has_child(0));
        assert!(!node.has_child(1));
        assert_eq!(node.child_count(), 2);
    }

    #[test]
    fn inferred_rows_dissolve_or_become_rows() {
        let row = || {
            Node::with_children(
                Kind::InferredMrow,
                vec![Node::token(Kind::Mi, "a"), Node::token(Kind::Mi, "b")],
            )
        };
        let atom = Node::atom(TexClass::Ord, vec![row()]);
        assert_eq!(atom.children.len(), 2);
        let frac = Node::with_children(Kind::Mfrac, vec![row(), Node::token(Kind::Mi, "c")]);
        assert_eq!(frac.children.len(), 2);
        assert_eq!(frac.child(0).map(|c| c.kind), Some(Kind::Mrow));
    }

    #[test]
    fn core_of_embellished_operator() {
        let sum = Node::token(Kind::Mo, "∑").with_class(TexClass::Op);
        let scripted = Node::with_slots(
            Kind::Munderover,
            vec![Some(sum), Some(Node::token(Kind::Mi, "i")), None],
        );
        assert_eq!(scripted.core_mo().map(|mo| mo.text.as_str()), Some("∑"));
        assert_eq!(scripted.core_class(), TexClass::Op);
        let ident = Node::token(Kind::Mi, "x");
        assert!(ident.core_mo().is_none());
        assert_eq!(ident.core_class(), TexClass::Ord);
    }

    #[test]
    fn single_char_tokens() {
        assert!(Node::token(Kind::Mo, "=").is_single_char_token());
        assert!(!Node::token(Kind::Mi, "sin").is_single_char_token());
        assert!(!Node::new(Kind::Mrow).is_single_char_token());
    }
}
