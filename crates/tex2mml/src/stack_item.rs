//! Stack items and the rules by which the item on top of the stack absorbs, rejects or
//! reduces with a newly pushed item.

use std::mem;

use tex2mml_tree::length::{em, parse_dimension};
use tex2mml_tree::table::{ColumnAlign, Frame, LineType};
use tex2mml_tree::{Kind, Node, Props, TexClass};

use crate::error::{TexErrKind, err};
use crate::parser::ParseResult;
use crate::stack::{Env, Global};
use crate::symbols::NOT_REMAP;
use crate::tags::Numbering;

/// What the stack should do with a pushed item after the top item has looked at it.
pub(crate) enum Action {
    /// Put the item on top of the stack.
    Push(StackItem),
    /// Discard the item; the top has absorbed it.
    Drop,
    /// Pop the top and push these items in its place, in order.
    Replace(Vec<StackItem>),
    /// Pop the top and push it again, so that it picks up a fresh environment.
    Repush,
}

#[derive(Debug)]
pub(crate) struct StackItem {
    pub kind: ItemKind,
    /// Finished nodes collected by this item.
    pub data: Vec<Node>,
    /// Set for open items only.
    pub env: Option<Env>,
}

#[derive(Debug)]
pub(crate) enum ItemKind {
    Start,
    Stop,
    Open,
    Close,
    /// A base and its primes, waiting for a possible script. `data` holds both.
    Prime,
    /// A scripted base in `data`, waiting for the script in `position`.
    SubSup {
        position: usize,
        primes: Option<Node>,
        movesupsub: bool,
    },
    Over(Box<OverItem>),
    Left {
        delim: &'static str,
    },
    Middle {
        delim: &'static str,
        color: Option<String>,
    },
    Right {
        delim: &'static str,
        color: Option<String>,
    },
    Begin {
        name: String,
        /// The end template of a user environment, until `\end` expands it.
        end_def: Option<String>,
    },
    End {
        name: String,
    },
    Style {
        attrs: Vec<(&'static str, String)>,
    },
    Position {
        name: String,
        shift: Shift,
    },
    Array(Box<ArrayItem>),
    /// `&`, `\\` or `\cr`.
    Cell {
        name: &'static str,
        row: bool,
        linebreak: bool,
    },
    /// A finished node, in `data`.
    Mml,
    Fn,
    Not,
    Dots,
    Equation {
        name: String,
    },
}

#[derive(Debug)]
pub(crate) struct OverItem {
    pub name: String,
    pub num: Option<Node>,
    pub thickness: Option<String>,
    pub open: Option<&'static str>,
    pub close: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) enum Shift {
    Vertical { height: String, depth: String },
    Horizontal { left: String, right: String },
}

impl StackItem {
    pub fn new(kind: ItemKind) -> Self {
        StackItem {
            kind,
            data: Vec::new(),
            env: None,
        }
    }

    pub fn with_data(kind: ItemKind, data: Vec<Node>) -> Self {
        StackItem {
            kind,
            data,
            env: None,
        }
    }

    #[inline]
    pub fn mml(node: Node) -> Self {
        StackItem::with_data(ItemKind::Mml, vec![node])
    }

    pub fn array(array: ArrayItem) -> Self {
        StackItem::new(ItemKind::Array(Box::new(array)))
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Start
                | ItemKind::Open
                | ItemKind::Left { .. }
                | ItemKind::Begin { .. }
                | ItemKind::Array(_)
                | ItemKind::Equation { .. }
        )
    }

    pub fn is_close(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Stop
                | ItemKind::Close
                | ItemKind::Over(_)
                | ItemKind::Right { .. }
                | ItemKind::Middle { .. }
                | ItemKind::End { .. }
                | ItemKind::Cell { .. }
        )
    }

    /// Tables start from an empty environment instead of inheriting one.
    #[inline]
    pub fn copy_env(&self) -> bool {
        !matches!(self.kind, ItemKind::Array(_))
    }

    fn into_node(mut self) -> Node {
        self.data.pop().unwrap_or_else(|| Node::new(Kind::Mrow))
    }

    /// Offer `item` to this item, which is on top of the stack.
    pub fn check_item(
        &mut self,
        item: StackItem,
        global: &mut Global,
        tags: &mut Numbering,
    ) -> ParseResult<Action> {
        match &mut self.kind {
            ItemKind::Start => {
                if matches!(item.kind, ItemKind::Stop) {
                    let mut node = to_mml(mem::take(&mut self.data), true);
                    if !global.is_inner {
                        node = tags.finalize(node);
                    }
                    return Ok(Action::Replace(vec![StackItem::mml(node)]));
                }
            }
            ItemKind::Open => {
                if matches!(item.kind, ItemKind::Close) {
                    let node = to_mml(mem::take(&mut self.data), true);
                    let atom = Node::atom(TexClass::Ord, vec![node]);
                    return Ok(Action::Replace(vec![StackItem::mml(atom)]));
                }
            }
            ItemKind::Prime => {
                let mut data = mem::take(&mut self.data);
                let primes = data.pop().unwrap_or_else(|| Node::new(Kind::Mrow));
                let mut base = data.pop().unwrap_or_else(|| Node::new(Kind::Mi));
                let fill_sup = match base.kind {
                    Kind::Msubsup => !base.has_child(2),
                    Kind::Munderover => {
                        !base.has_child(2) && !base.has_prop(Props::SUB_SUP_OK)
                    }
                    _ => false,
                };
                let node = if fill_sup {
                    base.set_child(2, Some(primes));
                    base
                } else {
                    let kind = if base.has_prop(Props::MOVE_SUP_SUB) {
                        Kind::Mover
                    } else {
                        Kind::Msup
                    };
                    Node::with_slots(kind, vec![Some(base), Some(primes)])
                };
                return Ok(Action::Replace(vec![StackItem::mml(node), item]));
            }
            ItemKind::SubSup {
                position,
                primes,
                movesupsub,
            } => {
                match item.kind {
                    ItemKind::Open | ItemKind::Left { .. } => return Ok(Action::Push(item)),
                    ItemKind::Mml => {
                        let mut script = item.into_node();
                        let mut base = self.data.pop().unwrap_or_else(|| Node::new(Kind::Mi));
                        if let Some(primes) = primes.take() {
                            if *position != 2 {
                                base.set_child(2, Some(primes));
                            } else {
                                script = Node::with_children(Kind::Mrow, vec![primes, script]);
                            }
                        }
                        base.set_child(*position, Some(script));
                        if *movesupsub {
                            base.set_prop(Props::MOVE_SUP_SUB, true);
                        }
                        return Ok(Action::Replace(vec![StackItem::mml(base)]));
                    }
                    _ => {}
                }
                let position = *position;
                return match self.check_base(item)? {
                    Action::Push(_) if position == 1 => err(TexErrKind::MissingOpenForSub),
                    Action::Push(_) => err(TexErrKind::MissingOpenForSup),
                    action => Ok(action),
                };
            }
            ItemKind::Over(over) => {
                if let ItemKind::Over(other) = &item.kind {
                    return err(TexErrKind::AmbiguousUseOf(other.name.as_str().into()));
                }
                if item.is_close() {
                    let den = to_mml(mem::take(&mut self.data), false);
                    let num = over.num.take().unwrap_or_else(|| Node::new(Kind::Mrow));
                    let mut frac = Node::with_slots(Kind::Mfrac, vec![Some(num), Some(den)]);
                    if let Some(thickness) = over.thickness.take() {
                        frac.attributes.set("linethickness", thickness);
                    }
                    let node = if over.open.is_some() || over.close.is_some() {
                        fixed_fence(over.open.unwrap_or(""), frac, over.close.unwrap_or(""))
                    } else {
                        frac
                    };
                    return Ok(Action::Replace(vec![StackItem::mml(node), item]));
                }
            }
            ItemKind::Left { delim } => match &item.kind {
                ItemKind::Right { delim: close, color } => {
                    let body = to_mml(mem::take(&mut self.data), true);
                    let node = fenced(delim, body, close, color.as_deref());
                    return Ok(Action::Replace(vec![StackItem::mml(node)]));
                }
                ItemKind::Middle { delim, color } => {
                    self.data.push(Node::atom(TexClass::Close, Vec::new()));
                    let mut mo = Node::token(Kind::Mo, *delim).set_attr("stretchy", "true");
                    if let Some(color) = color {
                        mo.attributes.set("mathcolor", color.as_str());
                    }
                    self.data.push(mo);
                    self.data.push(Node::atom(TexClass::Open, Vec::new()));
                    return Ok(Action::Repush);
                }
                _ => {}
            },
            ItemKind::Begin { name, .. } => {
                if let ItemKind::End { name: end } = &item.kind {
                    if end.as_str() != name.as_str() {
                        return err(TexErrKind::EnvBadEnd {
                            begin: name.as_str().into(),
                            end: end.as_str().into(),
                        });
                    }
                    let node = to_mml(mem::take(&mut self.data), true);
                    return Ok(Action::Replace(vec![StackItem::mml(node)]));
                }
            }
            ItemKind::Style { attrs } => {
                if item.is_close() {
                    let mut node = Node::with_children(Kind::Mstyle, mem::take(&mut self.data));
                    for (name, value) in mem::take(attrs) {
                        node.attributes.set(name, value);
                    }
                    return Ok(Action::Replace(vec![StackItem::mml(node), item]));
                }
            }
            ItemKind::Position { name, shift } => {
                if item.is_close() {
                    return err(TexErrKind::MissingBoxFor(name.as_str().into()));
                }
                if matches!(item.kind, ItemKind::Mml) {
                    return Ok(Action::Replace(match shift {
                        Shift::Vertical { height, depth } => {
                            let padded = Node::with_children(Kind::Mpadded, vec![item.into_node()])
                                .set_attr("height", height.as_str())
                                .set_attr("depth", depth.as_str())
                                .set_attr("voffset", height.as_str());
                            vec![StackItem::mml(padded)]
                        }
                        Shift::Horizontal { left, right } => vec![
                            StackItem::mml(Node::new(Kind::Mspace).set_attr("width", left.as_str())),
                            item,
                            StackItem::mml(
                                Node::new(Kind::Mspace).set_attr("width", right.as_str()),
                            ),
                        ],
                    }));
                }
            }
            ItemKind::Fn => {
                if let Some(function) = self.data.pop() {
                    if item.is_open() {
                        self.data.push(function);
                        return Ok(Action::Push(item));
                    }
                    return Ok(Action::Replace(apply_function(function, item)));
                }
            }
            ItemKind::Not => {
                return Ok(match item.kind {
                    ItemKind::Open | ItemKind::Left { .. } => Action::Push(item),
                    _ => Action::Replace(negate(item)),
                });
            }
            ItemKind::Dots => {
                return Ok(match item.kind {
                    ItemKind::Open | ItemKind::Left { .. } => Action::Push(item),
                    _ => {
                        let centered = matches!(item.kind, ItemKind::Mml)
                            && item.data.last().and_then(Node::core_mo).is_some_and(|mo| {
                                matches!(mo.tex_class(), TexClass::Bin | TexClass::Rel)
                            });
                        let dots = if centered { "\u{22EF}" } else { "\u{2026}" };
                        Action::Replace(vec![
                            StackItem::mml(Node::token(Kind::Mo, dots).set_attr("stretchy", "false")),
                            item,
                        ])
                    }
                });
            }
            ItemKind::Equation { .. } => {
                if matches!(item.kind, ItemKind::End { .. }) {
                    let node = to_mml(mem::take(&mut self.data), true);
                    let tag = tags.get_tag(false);
                    tags.end();
                    global.eqnenv = false;
                    let node = match tag {
                        Some(tag) => tags.en_tag(node, tag),
                        None => node,
                    };
                    return Ok(Action::Replace(vec![StackItem::mml(node), item]));
                }
            }
            ItemKind::Array(array) => {
                if item.is_close() && !matches!(item.kind, ItemKind::Over(_)) {
                    if let ItemKind::Cell { row, .. } = item.kind {
                        array.end_entry(mem::take(&mut self.data));
                        if row {
                            array.end_row(tags)?;
                        }
                        self.env = Some(Env::default());
                        return Ok(Action::Drop);
                    }
                    array.end_table(mem::take(&mut self.data), tags, global)?;
                    self.env = Some(Env::default());
                    let node = array.create_mml();
                    if array.require_close {
                        if matches!(item.kind, ItemKind::Close) {
                            return Ok(Action::Replace(vec![StackItem::mml(node)]));
                        }
                        return err(TexErrKind::MissingCloseBrace);
                    }
                    return Ok(Action::Replace(vec![StackItem::mml(node), item]));
                }
            }
            ItemKind::Stop
            | ItemKind::Close
            | ItemKind::Middle { .. }
            | ItemKind::Right { .. }
            | ItemKind::End { .. }
            | ItemKind::Cell { .. }
            | ItemKind::Mml => {}
        }
        self.check_base(item)
    }

    /// The rules every item falls back on.
    fn check_base(&mut self, mut item: StackItem) -> ParseResult<Action> {
        if self.is_open() {
            if let ItemKind::Over(over) = &mut item.kind {
                over.num = Some(to_mml(mem::take(&mut self.data), false));
            }
            if let ItemKind::Cell {
                name, linebreak, ..
            } = item.kind
            {
                if linebreak {
                    return Ok(Action::Drop);
                }
                return err(TexErrKind::Misplaced(name.into()));
            }
        }
        if item.is_close() {
            if let Some(kind) = self.close_error(&item) {
                return err(kind);
            }
        }
        if matches!(item.kind, ItemKind::Mml) {
            self.data.append(&mut item.data);
            return Ok(Action::Drop);
        }
        Ok(Action::Push(item))
    }

    /// The error raised when `item` closes something this item can't be closed by.
    fn close_error(&self, item: &StackItem) -> Option<TexErrKind> {
        Some(match &item.kind {
            ItemKind::Stop => match &self.kind {
                ItemKind::Open => TexErrKind::ExtraOpenMissingClose,
                ItemKind::Left { .. } => TexErrKind::ExtraLeftOrMissingRight,
                ItemKind::Begin { name, .. } | ItemKind::Equation { name } => {
                    TexErrKind::EnvMissingEnd(name.as_str().into())
                }
                ItemKind::SubSup { .. } => TexErrKind::MissingScript,
                _ => return None,
            },
            ItemKind::End { name } => TexErrKind::MissingBeginExtraEnd(name.as_str().into()),
            ItemKind::Close => TexErrKind::ExtraCloseMissingOpen,
            ItemKind::Right { .. } => TexErrKind::MissingLeftOrExtraRight,
            ItemKind::Middle { .. } => TexErrKind::OrphanMiddle,
            _ => return None,
        })
    }
}

/// Combine a list of nodes into one: a single node stays as it is, anything else becomes a
/// row (inferred if `inferred` is set).
pub(crate) fn to_mml(mut nodes: Vec<Node>, inferred: bool) -> Node {
    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    let kind = if inferred {
        Kind::InferredMrow
    } else {
        Kind::Mrow
    };
    Node::with_children(kind, nodes)
}

/// Classes after which no `ApplyFunction` is inserted, indexed by [`TexClass`] ordinal.
const NO_APPLY: [bool; 10] = [
    false, false, true, true, false, true, true, false, false, false,
];

fn apply_function(function: Node, item: StackItem) -> Vec<StackItem> {
    let apply = || {
        Node::token(Kind::Mo, "\u{2061}").with_class(TexClass::None)
    };
    match &item.kind {
        ItemKind::Fn => {}
        ItemKind::Mml => {
            if let Some(next) = item.data.last() {
                let is_space = next.is(Kind::Mspace)
                    || (next.is(Kind::Mstyle)
                        && next.child(0).is_some_and(|c| c.is(Kind::Mspace)));
                let no_apply = next
                    .core_mo()
                    .is_some_and(|mo| NO_APPLY[mo.tex_class() as usize]);
                if is_space || no_apply {
                    return vec![StackItem::mml(function), item];
                }
            }
        }
        _ => return vec![StackItem::mml(function), item],
    }
    vec![StackItem::mml(function), StackItem::mml(apply()), item]
}

fn negate(mut item: StackItem) -> Vec<StackItem> {
    if matches!(item.kind, ItemKind::Mml) {
        if let Some(node) = item.data.last_mut() {
            if matches!(node.kind, Kind::Mo | Kind::Mi | Kind::Mtext)
                && node.is_single_char_token()
                && !node.has_prop(Props::MOVE_SUP_SUB)
            {
                let negated = node.text.chars().next().and_then(|c| NOT_REMAP.get(&c));
                match negated {
                    Some(c) => node.text = c.to_string(),
                    None => node.text.push('\u{0338}'),
                }
                return vec![item];
            }
        }
    }
    let slash = Node::with_children(Kind::Mpadded, vec![Node::token(Kind::Mtext, "\u{29F8}")])
        .set_attr("width", "0");
    vec![
        StackItem::mml(Node::atom(TexClass::Rel, vec![slash])),
        item,
    ]
}

fn fence(text: &str, class: TexClass) -> Node {
    Node::token(Kind::Mo, text)
        .set_attr("fence", "true")
        .set_attr("stretchy", "true")
        .set_attr("symmetric", "true")
        .with_class(class)
}

/// `body` between stretchy delimiters, as produced by `\left ... \right`.
pub(crate) fn fenced(open: &str, body: Node, close: &str, color: Option<&str>) -> Node {
    let mut row = Node::row_with_class(TexClass::Inner, Vec::new());
    row.push_child(fence(open, TexClass::Open));
    row.push_child(body);
    let mut close = fence(close, TexClass::Close);
    if let Some(color) = color {
        close.attributes.set("mathcolor", color);
    }
    row.push_child(close);
    row
}

/// A delimiter of a fixed size, as produced by `\big` and friends.
pub(crate) fn big_delimiter(delim: &str, size: f64, class: TexClass) -> Node {
    let size = em(size);
    let mo = Node::token(Kind::Mo, delim)
        .set_attr("minsize", size.as_str())
        .set_attr("maxsize", size)
        .set_attr("fence", "true")
        .set_attr("stretchy", "true")
        .set_attr("symmetric", "true");
    Node::atom(class, vec![mo])
}

/// A delimiter whose size depends only on the style, used by `\choose` and friends.
fn math_palette(delim: &str, class: TexClass) -> Node {
    let mut choice = Node::new(Kind::MathChoice);
    choice.push_child(big_delimiter(delim, 2.047, class));
    for _ in 0..3 {
        choice.push_child(big_delimiter(delim, 1.2, class));
    }
    choice
}

/// `body` between delimiters whose size depends only on the style.
pub(crate) fn fixed_fence(open: &str, body: Node, close: &str) -> Node {
    let mut row = Node::row_with_class(TexClass::Inner, Vec::new());
    if !open.is_empty() {
        row.push_child(math_palette(open, TexClass::Open));
    }
    if body.is(Kind::Mrow) {
        row.children.extend(body.children);
    } else {
        row.push_child(body);
    }
    if !close.is_empty() {
        row.push_child(math_palette(close, TexClass::Close));
    }
    row
}

/// How the rows of a table are finished.
#[derive(Debug)]
pub(crate) enum ArrayRows {
    Plain,
    /// The AMS alignment environments, which number their rows.
    Ams { max_row: usize, taggable: bool },
    Multline { shove: Option<ColumnAlign> },
}

/// A table under construction.
#[derive(Debug)]
pub(crate) struct ArrayItem {
    pub table: Vec<Node>,
    pub row: Vec<Node>,
    pub frame: Frame,
    pub dashed: bool,
    /// Positions in the current cell where `\hfill` appeared.
    pub hfill: Vec<usize>,
    /// Attributes of the `mtable`, in order.
    pub arraydef: Vec<(&'static str, String)>,
    /// Tables from `\matrix` and friends end at a close brace instead of `\end`.
    pub require_close: bool,
    /// Rows of three cells have their last cell moved to the front as a label.
    pub is_numbered: bool,
    pub open: &'static str,
    pub close: &'static str,
    /// The default row spacing in em, once extra spacing has been requested.
    pub row_spacing: Option<f64>,
    pub rows: ArrayRows,
}

impl ArrayItem {
    pub fn new(rows: ArrayRows) -> Self {
        ArrayItem {
            table: Vec::new(),
            row: Vec::new(),
            frame: Frame::empty(),
            dashed: false,
            hfill: Vec::new(),
            arraydef: Vec::new(),
            require_close: false,
            is_numbered: false,
            open: "",
            close: "",
            row_spacing: None,
            rows,
        }
    }

    pub fn def(&self, name: &str) -> Option<&str> {
        self.arraydef
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_def(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.arraydef.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.arraydef.push((name, value)),
        }
    }

    fn remove_def(&mut self, name: &str) -> Option<String> {
        let idx = self.arraydef.iter().position(|(n, _)| *n == name)?;
        Some(self.arraydef.remove(idx).1)
    }

    #[inline]
    pub fn is_multline(&self) -> bool {
        matches!(self.rows, ArrayRows::Multline { .. })
    }

    pub fn set_shove(&mut self, align: ColumnAlign) {
        if let ArrayRows::Multline { shove } = &mut self.rows {
            *shove = Some(align);
        }
    }

    fn end_entry(&mut self, mut nodes: Vec<Node>) {
        match &mut self.rows {
            ArrayRows::Plain => {
                let size = nodes.len();
                let mut cell = Node::with_children(Kind::Mtd, nodes);
                if let (Some(&first), Some(&last)) = (self.hfill.first(), self.hfill.last()) {
                    if first == 0 {
                        cell.attributes.set("columnalign", "right");
                    }
                    if last == size {
                        let align = if cell.attributes.get("columnalign").is_some() {
                            "center"
                        } else {
                            "left"
                        };
                        cell.attributes.set("columnalign", align);
                    }
                }
                self.row.push(cell);
            }
            ArrayRows::Ams { .. } => {
                if !self.row.is_empty() {
                    fix_initial_mo(&mut nodes);
                }
                self.row.push(Node::with_children(Kind::Mtd, nodes));
            }
            ArrayRows::Multline { shove } => {
                if !self.table.is_empty() {
                    fix_initial_mo(&mut nodes);
                }
                let mut cell = Node::with_children(Kind::Mtd, nodes);
                if let Some(align) = shove.take() {
                    cell.attributes.set("columnalign", align.as_str());
                }
                self.row.push(cell);
            }
        }
        self.hfill.clear();
    }

    fn end_row(&mut self, tags: &mut Numbering) -> ParseResult<()> {
        let mut row = mem::take(&mut self.row);
        let node = match &mut self.rows {
            ArrayRows::Plain => {
                if self.is_numbered && row.len() == 3 {
                    row.rotate_right(1);
                    Node::with_children(Kind::Mlabeledtr, row)
                } else {
                    Node::with_children(Kind::Mtr, row)
                }
            }
            ArrayRows::Ams { max_row, .. } => {
                *max_row = (*max_row).max(row.len());
                let tag = tags.get_tag(false);
                tags.clear_tag();
                match tag {
                    Some(tag) => {
                        row.insert(0, tag);
                        Node::with_children(Kind::Mlabeledtr, row)
                    }
                    None => Node::with_children(Kind::Mtr, row),
                }
            }
            ArrayRows::Multline { .. } => {
                if row.len() != 1 {
                    return err(TexErrKind::MultlineRowsMustHaveOneColumn);
                }
                Node::with_children(Kind::Mtr, row)
            }
        };
        self.table.push(node);
        Ok(())
    }

    fn end_table(
        &mut self,
        nodes: Vec<Node>,
        tags: &mut Numbering,
        global: &mut Global,
    ) -> ParseResult<()> {
        if !nodes.is_empty() || !self.row.is_empty() {
            self.end_entry(nodes);
            self.end_row(tags)?;
        }
        self.check_lines();
        match self.rows {
            ArrayRows::Plain => {}
            ArrayRows::Ams { max_row, taggable } => {
                tags.end();
                if taggable {
                    global.eqnenv = false;
                }
                self.extend_array("columnalign", max_row);
                self.extend_array("columnwidth", max_row);
                self.extend_array("columnspacing", max_row.saturating_sub(1));
            }
            ArrayRows::Multline { .. } => {
                let last = self.table.len().saturating_sub(1);
                if let Some(first) = self.table.first_mut().and_then(|row| row.child_mut(0)) {
                    if first.attributes.get("columnalign").is_none() {
                        first.attributes.set("columnalign", "left");
                    }
                }
                if let Some(cell) = self.table.get_mut(last).and_then(|row| row.child_mut(0)) {
                    if cell.attributes.get("columnalign").is_none() {
                        cell.attributes.set("columnalign", "right");
                    }
                }
                if let Some(tag) = tags.get_tag(false) {
                    let idx = if self.def("side") == Some("left") {
                        0
                    } else {
                        last
                    };
                    if let Some(row) = self.table.get_mut(idx) {
                        row.kind = Kind::Mlabeledtr;
                        row.children.insert(0, Some(tag));
                    }
                }
                tags.end();
                global.eqnenv = false;
            }
        }
        Ok(())
    }

    /// Make `rowlines` and `rowspacing` match the number of rows.
    fn check_lines(&mut self) {
        if let Some(lines) = self.def("rowlines").map(str::to_owned) {
            let mut lines: Vec<&str> = lines.split(' ').collect();
            if lines.len() == self.table.len() {
                self.frame |= Frame::BOTTOM;
                lines.pop();
                if lines.is_empty() {
                    self.remove_def("rowlines");
                } else {
                    self.set_def("rowlines", lines.join(" "));
                }
            } else if lines.len() + 1 < self.table.len() {
                lines.push("none");
                self.set_def("rowlines", lines.join(" "));
            }
        }
        if let Some(spacing) = self.row_spacing {
            let mut rows: Vec<String> = self
                .def("rowspacing")
                .map(|s| s.split(' ').map(str::to_owned).collect())
                .unwrap_or_default();
            while rows.len() < self.table.len() {
                rows.push(em(spacing));
            }
            self.set_def("rowspacing", rows.join(" "));
        }
    }

    /// Add `spacing` (in em) below the row that was just finished.
    pub fn add_row_spacing(&mut self, spacing: f64) {
        let Some(current) = self.def("rowspacing") else {
            return;
        };
        let mut rows: Vec<String> = current.split(' ').map(str::to_owned).collect();
        let base = match self.row_spacing {
            Some(base) => base,
            None => {
                let base = rows
                    .first()
                    .and_then(|r| parse_dimension(r))
                    .map_or(0.0, |d| d.to_em());
                self.row_spacing = Some(base);
                base
            }
        };
        while rows.len() < self.table.len() {
            rows.push(em(base));
        }
        if let Some(last) = self.table.len().checked_sub(1).and_then(|i| rows.get_mut(i)) {
            *last = em((base + spacing).max(0.0));
        }
        self.set_def("rowspacing", rows.join(" "));
    }

    /// Record a horizontal rule at the current position.
    pub fn add_hline(&mut self, line: LineType) {
        if self.table.is_empty() {
            self.frame |= Frame::TOP;
            return;
        }
        let mut lines: Vec<String> = self
            .def("rowlines")
            .map(|s| s.split(' ').map(str::to_owned).collect())
            .unwrap_or_default();
        while lines.len() < self.table.len() {
            lines.push(LineType::None.as_str().to_owned());
        }
        if let Some(last) = lines.get_mut(self.table.len() - 1) {
            *last = line.as_str().to_owned();
        }
        self.set_def("rowlines", lines.join(" "));
    }

    /// Repeat a space-separated list attribute cyclically until it has `max` entries.
    fn extend_array(&mut self, name: &'static str, max: usize) {
        let Some(value) = self.def(name) else {
            return;
        };
        let repeat: Vec<&str> = value.split(' ').collect();
        if repeat.len() > 1 && max > 0 {
            let columns = repeat.iter().cycle().take(max).copied().collect::<Vec<_>>().join(" ");
            self.set_def(name, columns);
        }
    }

    fn create_mml(&mut self) -> Node {
        let scriptlevel = self.remove_def("scriptlevel");
        let full_frame = self.frame == Frame::all();
        if !full_frame && !self.frame.is_empty() {
            if let Some(lines) = self.def("rowlines") {
                let mut trimmed = lines;
                while let Some(rest) = trimmed.strip_suffix(" none") {
                    if !rest.ends_with("none") {
                        break;
                    }
                    trimmed = rest;
                }
                let trimmed = trimmed.to_owned();
                self.set_def("rowlines", trimmed);
            }
        }
        let mut table = Node::with_children(Kind::Mtable, mem::take(&mut self.table));
        for (name, value) in &self.arraydef {
            table.attributes.set(*name, value.as_str());
        }
        if full_frame {
            table
                .attributes
                .set("frame", if self.dashed { "dashed" } else { "solid" });
        } else if !self.frame.is_empty() {
            let plain = |name: &str| self.def(name).is_none_or(|v| v.split(' ').all(|l| l == "none"));
            let padded = !(plain("columnlines") && plain("rowlines"));
            let mut enclose = Node::with_children(Kind::Menclose, vec![table])
                .set_attr("notation", self.frame.notation());
            if padded {
                enclose.attributes.set("data-padding", "0");
            }
            table = enclose;
        }
        if let Some(level) = scriptlevel {
            table = Node::with_children(Kind::Mstyle, vec![table]).set_attr("scriptlevel", level);
        }
        if !self.open.is_empty() || !self.close.is_empty() {
            table = fenced(self.open, table, self.close, None);
        }
        table
    }
}

/// Put an empty identifier in front of a cell that starts with a relation or an operator,
/// so that it is spaced like a binary operator with something on its left.
fn fix_initial_mo(nodes: &mut Vec<Node>) {
    let first = nodes
        .iter()
        .find(|node| !node.is(Kind::Mspace) && !(node.is(Kind::TeXAtom) && node.children.is_empty()));
    let needs_base = first.is_some_and(|node| {
        node.core_mo().is_some() || (node.is(Kind::TeXAtom) && node.tex_class() == TexClass::Rel)
    });
    if needs_base {
        nodes.insert(0, Node::new(Kind::Mi));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mi(s: &str) -> Node {
        Node::token(Kind::Mi, s)
    }

    fn mo(s: &str, class: TexClass) -> Node {
        Node::token(Kind::Mo, s).with_class(class)
    }

    #[test]
    fn single_nodes_are_not_wrapped() {
        assert_eq!(to_mml(vec![mi("x")], true).kind, Kind::Mi);
        assert_eq!(to_mml(vec![mi("x"), mi("y")], true).kind, Kind::InferredMrow);
        assert_eq!(to_mml(Vec::new(), false).kind, Kind::Mrow);
    }

    #[test]
    fn relation_at_start_of_cell_gets_a_base() {
        let mut nodes = vec![Node::new(Kind::Mspace), mo("=", TexClass::Rel), mi("x")];
        fix_initial_mo(&mut nodes);
        assert_eq!(nodes.len(), 4);
        assert!(nodes[0].is(Kind::Mi) && nodes[0].text.is_empty());

        let mut nodes = vec![mi("x"), mo("=", TexClass::Rel)];
        fix_initial_mo(&mut nodes);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn hlines_and_frames() {
        let mut array = ArrayItem::new(ArrayRows::Plain);
        array.add_hline(LineType::Solid);
        assert_eq!(array.frame, Frame::TOP);
        array.table.push(Node::new(Kind::Mtr));
        array.table.push(Node::new(Kind::Mtr));
        array.add_hline(LineType::Dashed);
        assert_eq!(array.def("rowlines"), Some("none dashed"));
        array.check_lines();
        assert_eq!(array.def("rowlines"), Some("none"));
        assert!(array.frame.contains(Frame::BOTTOM));
    }

    #[test]
    fn row_spacing_accumulates() {
        let mut array = ArrayItem::new(ArrayRows::Plain);
        array.set_def("rowspacing", "4pt");
        array.table.push(Node::new(Kind::Mtr));
        array.table.push(Node::new(Kind::Mtr));
        array.add_row_spacing(1.0);
        assert_eq!(array.row_spacing, Some(0.4));
        assert_eq!(array.def("rowspacing"), Some("4pt 1.4em"));
    }

    #[test]
    fn lists_are_extended_cyclically() {
        let mut array = ArrayItem::new(ArrayRows::Plain);
        array.set_def("columnalign", "right left");
        array.set_def("columnspacing", "1em");
        array.extend_array("columnalign", 5);
        array.extend_array("columnspacing", 4);
        assert_eq!(array.def("columnalign"), Some("right left right left right"));
        assert_eq!(array.def("columnspacing"), Some("1em"));
    }

    #[test]
    fn negation_of_single_characters() {
        let items = negate(StackItem::mml(mo("=", TexClass::Rel)));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data[0].text, "≠");
        let items = negate(StackItem::mml(mo("⊏", TexClass::Rel)));
        assert_eq!(items[0].data[0].text, "⊏\u{0338}");
        let items = negate(StackItem::mml(mi("ab")));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].data[0].tex_class, Some(TexClass::Rel));
    }

    #[test]
    fn function_application() {
        let sin = || mi("sin").with_class(TexClass::Op);
        let items = apply_function(sin(), StackItem::mml(mi("x")));
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].data[0].text, "\u{2061}");
        let items = apply_function(sin(), StackItem::mml(mo("+", TexClass::Bin)));
        assert_eq!(items.len(), 2);
        let items = apply_function(sin(), StackItem::new(ItemKind::Stop));
        assert_eq!(items.len(), 2);
    }
}
