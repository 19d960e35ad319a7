//! Equation numbering: automatic and explicit tags, labels and references.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tex2mml_tree::{Kind, Node};

/// Which equations are numbered automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
#[non_exhaustive]
pub enum TagMode {
    /// Only `\tag` produces a tag.
    #[default]
    None,
    /// Numbered environments such as `equation` and `align` are numbered.
    Ams,
    /// Every displayed equation is numbered.
    All,
}

/// The side on which tags are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum TagSide {
    Left,
    #[default]
    Right,
}

impl TagSide {
    pub fn as_str(self) -> &'static str {
        match self {
            TagSide::Left => "left",
            TagSide::Right => "right",
        }
    }
}

/// How tags, ids and links are formatted.
///
/// All methods have defaults, so an implementation only overrides what it changes.
pub trait TagFormat: fmt::Debug + Send + Sync {
    /// The text of an automatic tag for equation `n`.
    fn format_number(&self, n: usize) -> String {
        n.to_string()
    }

    /// The text that is displayed for a tag.
    fn format_tag(&self, tag: &str) -> String {
        format!("({tag})")
    }

    /// The element id for a tag or label.
    fn format_id(&self, id: &str) -> String {
        let id: String = id
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("eqn:{id}")
    }

    /// The link target for a reference to the element with the given id.
    fn format_url(&self, id: &str, base_url: &str) -> String {
        format!("{base_url}#{}", percent_encode(id))
    }
}

#[derive(Debug, Default)]
pub struct DefaultTagFormat;

impl TagFormat for DefaultTagFormat {}

/// Encode everything except the characters JavaScript's `encodeURIComponent` leaves alone.
pub(crate) fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(char::from(b)),
            _ => {
                const HEX: &[u8; 16] = b"0123456789ABCDEF";
                out.push('%');
                out.push(char::from(HEX[usize::from(b >> 4)]));
                out.push(char::from(HEX[usize::from(b & 0xF)]));
            }
        }
    }
    out
}

/// Where a label points.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Label {
    pub tag: String,
    pub id: String,
}

impl Default for Label {
    fn default() -> Self {
        Label {
            tag: "???".to_string(),
            id: String::new(),
        }
    }
}

/// The tagging state of one numbering context (an equation or an environment within it).
#[derive(Debug, Clone, Default)]
struct TagInfo {
    env: String,
    taggable: bool,
    default_tags: bool,
    tag: Option<String>,
    tag_format: String,
    no_tag: bool,
    label: String,
    tag_id: String,
}

/// Numbering state shared by all equations of one converter.
#[derive(Debug)]
pub(crate) struct Numbering {
    mode: TagMode,
    format: Box<dyn TagFormat>,
    side: TagSide,
    indent: String,
    use_label_ids: bool,
    base_url: String,
    /// Whether the current equation is displayed.
    pub display: bool,
    counter: usize,
    all_counter: usize,
    labels: FxHashMap<String, Label>,
    all_labels: FxHashMap<String, Label>,
    ids: FxHashSet<String>,
    all_ids: FxHashSet<String>,
    /// Set when a reference could not be resolved; the equation is translated again later.
    redo: bool,
    /// Set while an equation is translated again to resolve its references.
    ref_update: bool,
    current: TagInfo,
    history: Vec<TagInfo>,
    stack: Vec<TagInfo>,
}

impl Default for Numbering {
    fn default() -> Self {
        Numbering::new(
            TagMode::default(),
            Box::new(DefaultTagFormat),
            TagSide::default(),
            "0.8em".to_string(),
            true,
            String::new(),
        )
    }
}

impl Numbering {
    pub fn new(
        mode: TagMode,
        format: Box<dyn TagFormat>,
        side: TagSide,
        indent: String,
        use_label_ids: bool,
        base_url: String,
    ) -> Self {
        Numbering {
            mode,
            format,
            side,
            indent,
            use_label_ids,
            base_url,
            display: false,
            counter: 0,
            all_counter: 0,
            labels: FxHashMap::default(),
            all_labels: FxHashMap::default(),
            ids: FxHashSet::default(),
            all_ids: FxHashSet::default(),
            redo: false,
            ref_update: false,
            current: TagInfo::default(),
            history: Vec::new(),
            stack: Vec::new(),
        }
    }

    #[inline]
    pub fn side(&self) -> TagSide {
        self.side
    }

    #[inline]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    #[inline]
    pub fn ref_update(&self) -> bool {
        self.ref_update
    }

    /// Forget all equation numbers and labels; numbering continues after `offset`.
    pub fn reset(&mut self, offset: usize) {
        self.history.clear();
        self.stack.clear();
        self.current = TagInfo::default();
        self.counter = offset;
        self.all_counter = offset;
        self.labels.clear();
        self.all_labels.clear();
        self.ids.clear();
        self.all_ids.clear();
        self.redo = false;
        self.ref_update = false;
    }

    /// Prepare for a new equation. `recompile` carries the counter the equation started with
    /// when it is translated again to resolve references.
    pub fn start_equation(&mut self, display: bool, recompile: Option<usize>) {
        self.history.clear();
        self.stack.clear();
        self.current = TagInfo::default();
        self.labels.clear();
        self.ids.clear();
        self.display = display;
        self.counter = self.all_counter;
        self.redo = false;
        self.ref_update = false;
        if let Some(counter) = recompile {
            self.ref_update = true;
            self.counter = counter;
        }
    }

    /// Commit the numbers, ids and labels of the finished equation.
    ///
    /// Returns the counter the equation has to be translated again with, if it referenced a
    /// label that was not known yet.
    pub fn finish_equation(&mut self) -> Option<usize> {
        let recompile = self.redo.then_some(self.all_counter);
        if !self.ref_update {
            self.all_counter = self.counter;
        }
        self.all_ids.extend(self.ids.drain());
        self.all_labels.extend(self.labels.drain());
        recompile
    }

    /// Enter a numbering context such as an environment.
    pub fn start(&mut self, env: &str, taggable: bool, default_tags: bool) {
        let outer = std::mem::take(&mut self.current);
        self.stack.push(outer);
        self.current = TagInfo {
            env: env.to_string(),
            taggable,
            default_tags,
            ..TagInfo::default()
        };
    }

    /// Leave the innermost numbering context.
    pub fn end(&mut self) {
        let outer = self.stack.pop().unwrap_or_default();
        let finished = std::mem::replace(&mut self.current, outer);
        self.history.push(finished);
    }

    /// Set an explicit tag. A tag with `no_format` is displayed as is.
    pub fn tag(&mut self, tag: String, no_format: bool) {
        self.current.tag_format = if no_format {
            tag.clone()
        } else {
            self.format.format_tag(&tag)
        };
        self.current.tag = Some(tag);
        self.current.no_tag = false;
    }

    pub fn notag(&mut self) {
        self.tag(String::new(), true);
        self.current.no_tag = true;
    }

    #[inline]
    pub fn has_tag(&self) -> bool {
        self.current.tag.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn clear_tag(&mut self) {
        self.current.label.clear();
        self.current.tag = None;
        self.current.tag_format.clear();
        self.current.tag_id.clear();
        self.current.no_tag = false;
    }

    /// Number the current context, unless it already has a tag.
    pub fn auto_tag(&mut self) {
        if self.mode == TagMode::None || self.current.tag.is_some() {
            return;
        }
        self.counter += 1;
        let tag = self.format.format_number(self.counter);
        self.tag(tag, false);
    }

    /// The tag cell for the current context, if it gets one. With `force`, a number is
    /// assigned if no tag was set.
    pub fn get_tag(&mut self, force: bool) -> Option<Node> {
        let mut force = force;
        if self.mode == TagMode::None {
            if !self.has_tag() {
                return None;
            }
            force = false;
        }
        if force {
            self.auto_tag();
            return Some(self.make_tag());
        }
        if self.current.taggable && !self.current.no_tag {
            if self.current.default_tags {
                self.auto_tag();
            }
            if self.has_tag() {
                return Some(self.make_tag());
            }
        }
        None
    }

    fn make_tag(&mut self) -> Node {
        self.make_id();
        if !self.current.label.is_empty() {
            let label = Label {
                tag: self.current.tag.clone().unwrap_or_default(),
                id: self.current.tag_id.clone(),
            };
            self.labels.insert(self.current.label.clone(), label);
        }
        Node::with_children(
            Kind::Mtd,
            vec![Node::token(Kind::Mtext, self.current.tag_format.as_str())],
        )
        .set_attr("id", self.current.tag_id.as_str())
    }

    fn make_id(&mut self) {
        let source = if self.use_label_ids && !self.current.label.is_empty() {
            self.current.label.as_str()
        } else {
            self.current.tag.as_deref().unwrap_or("")
        };
        let base = self.format.format_id(source);
        let mut id = base.clone();
        let mut n = 0usize;
        while self.ids.contains(&id) || (!self.ref_update && self.all_ids.contains(&id)) {
            n += 1;
            id = format!("{base}_{n}");
        }
        self.ids.insert(id.clone());
        self.current.tag_id = id;
    }

    /// Wrap `node` in a one-row table that carries `tag`.
    pub fn en_tag(&self, node: Node, tag: Node) -> Node {
        let cell = Node::with_children(Kind::Mtd, vec![node]);
        let row = Node::with_children(Kind::Mlabeledtr, vec![tag, cell]);
        Node::with_children(Kind::Mtable, vec![row])
            .set_attr("side", self.side.as_str())
            .set_attr("minlabelspacing", self.indent.as_str())
            .set_attr("displaystyle", "true")
    }

    /// Attach the tag of a displayed equation that was not tagged by an environment.
    pub fn finalize(&mut self, node: Node) -> Node {
        if !self.display {
            return node;
        }
        let tag = match self.mode {
            TagMode::All => {
                if self.history.iter().any(|info| info.taggable) {
                    return node;
                }
                self.get_tag(true)
            }
            TagMode::None | TagMode::Ams => {
                if !self.current.env.is_empty() || self.current.no_tag || !self.has_tag() {
                    return node;
                }
                Some(self.make_tag())
            }
        };
        match tag {
            Some(tag) => self.en_tag(node, tag),
            None => node,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.current.label
    }

    #[inline]
    pub fn is_label_defined(&self, label: &str) -> bool {
        self.labels.contains_key(label) || self.all_labels.contains_key(label)
    }

    /// Attach `label` to the current context and reserve it.
    pub fn set_label(&mut self, label: String) {
        self.labels.insert(label.clone(), Label::default());
        self.current.label = label;
    }

    /// Resolve a reference. An unknown label schedules the equation for another translation.
    pub fn reference(&mut self, label: &str) -> Label {
        match self.all_labels.get(label).or_else(|| self.labels.get(label)) {
            Some(found) => found.clone(),
            None => {
                if !self.ref_update {
                    self.redo = true;
                }
                Label::default()
            }
        }
    }

    #[inline]
    pub fn format_tag(&self, tag: &str) -> String {
        self.format.format_tag(tag)
    }

    #[inline]
    pub fn format_url(&self, id: &str) -> String {
        self.format.format_url(id, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ams() -> Numbering {
        Numbering::new(
            TagMode::Ams,
            Box::new(DefaultTagFormat),
            TagSide::Right,
            "0.8em".to_string(),
            true,
            String::new(),
        )
    }

    fn tag_text(node: &Node) -> String {
        node.text_content()
    }

    #[test]
    fn default_format() {
        let format = DefaultTagFormat;
        assert_eq!(format.format_tag("3"), "(3)");
        assert_eq!(format.format_id("my label"), "eqn:my_label");
        assert_eq!(format.format_url("eqn:1", "page.html"), "page.html#eqn%3A1");
        assert_eq!(percent_encode("a b/ü"), "a%20b%2F%C3%BC");
    }

    #[test]
    fn numbered_environment_counts() {
        let mut tags = ams();
        tags.start_equation(true, None);
        tags.start("align", true, true);
        let first = tags.get_tag(false).unwrap();
        assert_eq!(tag_text(&first), "(1)");
        assert_eq!(first.attributes.get("id"), Some("eqn:1"));
        tags.clear_tag();
        tags.notag();
        assert!(tags.get_tag(false).is_none());
        tags.clear_tag();
        assert_eq!(tag_text(&tags.get_tag(false).unwrap()), "(2)");
        tags.end();
        assert_eq!(tags.finish_equation(), None);

        tags.start_equation(true, None);
        tags.start("equation", true, true);
        assert_eq!(tag_text(&tags.get_tag(false).unwrap()), "(3)");
    }

    #[test]
    fn labels_and_references() {
        let mut tags = ams();
        tags.start_equation(true, None);
        assert_eq!(tags.reference("later"), Label::default());
        assert_eq!(tags.finish_equation(), Some(0));

        tags.start_equation(true, None);
        tags.start("equation", true, true);
        tags.set_label("later".to_string());
        let tag = tags.get_tag(false).unwrap();
        assert_eq!(tag.attributes.get("id"), Some("eqn:later"));
        tags.end();
        tags.finish_equation();

        tags.start_equation(true, Some(0));
        let label = tags.reference("later");
        assert_eq!(label.tag, "1");
        assert_eq!(label.id, "eqn:later");
        assert_eq!(tags.finish_equation(), None);
    }

    #[test]
    fn explicit_tags_without_numbering() {
        let mut tags = Numbering::default();
        tags.start_equation(true, None);
        tags.tag("A".to_string(), false);
        let node = tags.finalize(Node::token(Kind::Mi, "x"));
        assert_eq!(node.kind, Kind::Mtable);
        assert_eq!(node.text_content(), "(A)x");

        tags.start_equation(false, None);
        tags.tag("A".to_string(), false);
        let node = tags.finalize(Node::token(Kind::Mi, "x"));
        assert_eq!(node.kind, Kind::Mi);
    }

    #[test]
    fn duplicate_ids_are_made_unique() {
        let mut tags = ams();
        tags.start_equation(true, None);
        tags.tag("A".to_string(), false);
        tags.finalize(Node::new(Kind::Mrow));
        tags.finish_equation();
        tags.start_equation(true, None);
        tags.tag("A".to_string(), false);
        let node = tags.finalize(Node::new(Kind::Mrow));
        let row = node.child(0).unwrap();
        assert_eq!(row.child(0).unwrap().attributes.get("id"), Some("eqn:A_1"));
    }

    #[test]
    fn all_mode_numbers_every_display() {
        let mut tags = Numbering::new(
            TagMode::All,
            Box::new(DefaultTagFormat),
            TagSide::Left,
            "1em".to_string(),
            true,
            String::new(),
        );
        tags.reset(4);
        tags.start_equation(true, None);
        let node = tags.finalize(Node::token(Kind::Mi, "x"));
        assert_eq!(node.attributes.get("side"), Some("left"));
        assert_eq!(node.text_content(), "(5)x");
    }
}
