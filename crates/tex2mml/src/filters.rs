//! Clean-ups that run on the finished tree, before numbering wraps it and it is serialized.

use std::mem;

use tex2mml_tree::{Kind, Node, TexClass};

/// Run all filters on `node` and its descendants.
pub(crate) fn apply(node: &mut Node) {
    combine_relations(node);
    clean_sub_sup(node);
}

/// Merge runs of adjacent relations like `<` `=` into a single operator.
///
/// Relations that can't be merged because their attributes differ keep their neighbors
/// from adding space between them instead.
pub(crate) fn combine_relations(node: &mut Node) {
    for child in node.children.iter_mut().flatten() {
        combine_relations(child);
    }
    if !node.kind.is_row_like() {
        return;
    }
    let children = &mut node.children;
    let mut i = 0;
    while i < children.len() {
        if !is_relation(children[i].as_ref()) {
            i += 1;
            continue;
        }
        while i + 1 < children.len() && is_relation(children[i + 1].as_ref()) {
            let (Some(first), Some(second)) = (&children[i], &children[i + 1]) else {
                break;
            };
            if same_explicit_attributes(first, second) {
                if let Some(next) = children.remove(i + 1)
                    && let Some(first) = children[i].as_mut()
                {
                    merge(first, next);
                }
            } else {
                if let Some(first) = children[i].as_mut()
                    && first.attributes.get_explicit("rspace").is_none()
                {
                    first.attributes.set("rspace", "0pt");
                }
                if let Some(second) = children[i + 1].as_mut()
                    && second.attributes.get_explicit("lspace").is_none()
                {
                    second.attributes.set("lspace", "0pt");
                }
                break;
            }
        }
        i += 1;
    }
}

fn is_relation(node: Option<&Node>) -> bool {
    node.is_some_and(|n| n.is(Kind::Mo) && n.tex_class() == TexClass::Rel)
}

/// Whether two operators agree on everything that was set explicitly, apart from the
/// attributes that a merge takes from the second one.
fn same_explicit_attributes(a: &Node, b: &Node) -> bool {
    fn relevant(node: &Node) -> Vec<(&'static str, &str)> {
        let mut attrs: Vec<_> = node
            .attributes
            .iter()
            .filter(|(name, _)| !matches!(*name, "stretchy" | "rspace"))
            .collect();
        attrs.sort_unstable();
        attrs
    }
    relevant(a) == relevant(b)
}

fn merge(first: &mut Node, second: Node) {
    first.text.push_str(&second.text);
    for name in ["stretchy", "rspace"] {
        if let Some(value) = second.attributes.get_explicit(name) {
            first.attributes.set(name, value);
        }
    }
    first.props |= second.props;
}

/// Replace script nodes with an empty slot by their two-child forms, and drop the node
/// entirely when both scripts are missing.
pub(crate) fn clean_sub_sup(node: &mut Node) {
    for child in node.children.iter_mut().flatten() {
        clean_sub_sup(child);
    }
    let (low, high) = match node.kind {
        Kind::Msubsup => (Kind::Msub, Kind::Msup),
        Kind::Munderover => (Kind::Munder, Kind::Mover),
        _ => {
            node.children.retain(Option::is_some);
            return;
        }
    };
    if node.has_child(1) && node.has_child(2) {
        return;
    }
    let mut slots = mem::take(&mut node.children);
    slots.resize_with(3, || None);
    let high_script = slots.pop().flatten();
    let low_script = slots.pop().flatten();
    let base = slots.pop().flatten();
    let (kind, script) = match (low_script, high_script) {
        (Some(script), _) => (low, script),
        (None, Some(script)) => (high, script),
        (None, None) => {
            match base {
                Some(base) => *node = base,
                None => node.kind = Kind::Mrow,
            }
            return;
        }
    };
    node.kind = kind;
    node.children = vec![Some(base.unwrap_or_else(|| Node::new(Kind::Mrow))), Some(script)];
}

#[cfg(test)]
mod tests {
    use tex2mml_tree::Props;

    use super::*;

    fn rel(text: &str) -> Node {
        Node::token(Kind::Mo, text).with_class(TexClass::Rel)
    }

    fn mi(text: &str) -> Node {
        Node::token(Kind::Mi, text)
    }

    #[test]
    fn adjacent_relations_merge() {
        let mut row = Node::with_children(
            Kind::Mrow,
            vec![mi("a"), rel("<"), rel("="), rel(">"), mi("b")],
        );
        combine_relations(&mut row);
        assert_eq!(row.child_count(), 3);
        assert_eq!(row.child(1).map(|n| n.text.as_str()), Some("<=>"));
    }

    #[test]
    fn differing_relations_lose_their_space() {
        let mut row = Node::with_children(
            Kind::Mrow,
            vec![rel("="), rel(":").set_attr("mathcolor", "red")],
        );
        combine_relations(&mut row);
        assert_eq!(row.child_count(), 2);
        assert_eq!(row.child(0).unwrap().attributes.get("rspace"), Some("0pt"));
        assert_eq!(row.child(1).unwrap().attributes.get("lspace"), Some("0pt"));
    }

    #[test]
    fn merge_takes_stretchy_from_the_second() {
        let mut row = Node::with_children(
            Kind::Mrow,
            vec![rel("="), rel("\u{2192}").set_attr("stretchy", "false")],
        );
        combine_relations(&mut row);
        let merged = row.child(0).unwrap();
        assert_eq!(merged.text, "=\u{2192}");
        assert_eq!(merged.attributes.get("stretchy"), Some("false"));
    }

    #[test]
    fn relations_in_scripts_stay_apart() {
        let mut sup = Node::with_children(Kind::Msup, vec![rel("="), rel("=")]);
        combine_relations(&mut sup);
        assert_eq!(sup.child_count(), 2);
    }

    #[test]
    fn partial_scripts() {
        let mut node = Node::with_slots(Kind::Msubsup, vec![Some(mi("x")), None, Some(mi("2"))]);
        node.set_prop(Props::MOVE_SUP_SUB, true);
        clean_sub_sup(&mut node);
        assert_eq!(node.kind, Kind::Msup);
        assert_eq!(node.child(1).map(|n| n.text.as_str()), Some("2"));
        assert!(node.has_prop(Props::MOVE_SUP_SUB));

        let mut node = Node::with_slots(Kind::Munderover, vec![Some(mi("x")), Some(mi("n"))]);
        clean_sub_sup(&mut node);
        assert_eq!(node.kind, Kind::Munder);
        assert_eq!(node.child_count(), 2);
    }

    #[test]
    fn scripts_without_any_script_dissolve() {
        let inner = Node::with_slots(Kind::Munderover, vec![Some(mi("x")), None, None]);
        let mut row = Node::with_slots(Kind::Mrow, vec![Some(inner), None]);
        clean_sub_sup(&mut row);
        assert_eq!(row.child_count(), 1);
        assert_eq!(row.child(0).map(|n| n.kind), Some(Kind::Mi));
    }
}
