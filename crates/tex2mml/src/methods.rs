//! Handlers for the built-in commands.

use tex2mml_tree::length::{em, parse_dimension};
use tex2mml_tree::table::{ColumnAlign, LineType};
use tex2mml_tree::{Kind, Node, Props, TexClass};

use crate::commands::{Command, MatrixSpec, OverDelims, OverKind};
use crate::error::{TexErrKind, err};
use crate::parser::{ParseResult, TexParser};
use crate::stack::Env;
use crate::stack_item::{
    ArrayItem, ArrayRows, ItemKind, OverItem, Shift, StackItem, big_delimiter, fixed_fence,
};
use crate::symbols;

impl TexParser<'_> {
    pub(super) fn command(&mut self, command: Command) -> ParseResult<()> {
        let name = self.current_cs.clone();
        let name = name.as_str();
        match command {
            Command::Frac => {
                let num = self.parse_arg(name)?;
                let den = self.parse_arg(name)?;
                self.push_node(Node::with_slots(Kind::Mfrac, vec![Some(num), Some(den)]))
            }
            Command::Genfrac => self.genfrac(name),
            Command::Over(kind, delims) => self.over(name, kind, delims),
            Command::Sqrt => self.sqrt(name),
            Command::Root => {
                let index = self.cursor.get_up_to(name, "\\of")?;
                let base = self.parse_arg(name)?;
                let root = self.parse_root(&index)?;
                self.push_node(Node::with_slots(Kind::Mroot, vec![Some(base), Some(root)]))
            }
            Command::LeftRoot => self.move_root(name, false),
            Command::UpRoot => self.move_root(name, true),

            Command::Left => {
                let delim = self.cursor.get_delimiter(name)?;
                self.push(StackItem::new(ItemKind::Left { delim }))
            }
            Command::Right => {
                let delim = self.cursor.get_delimiter(name)?;
                let color = self.stack.env().color.clone();
                self.push(StackItem::new(ItemKind::Right { delim, color }))
            }
            Command::Middle => {
                let delim = self.cursor.get_delimiter(name)?;
                let color = self.stack.env().color.clone();
                self.push(StackItem::new(ItemKind::Middle { delim, color }))
            }
            Command::Big(size, class) => {
                let delim = self.cursor.get_delimiter(name)?;
                self.push_node(big_delimiter(delim, size, class))
            }

            Command::NamedFn => {
                let mi = Node::token(Kind::Mi, &name[1..])
                    .with_class(TexClass::Op)
                    .with_props(Props::FN_OP);
                self.push(StackItem::with_data(ItemKind::Fn, vec![mi]))
            }
            Command::NamedOp(text) => {
                let mo = Node::token(Kind::Mo, text)
                    .set_attr("movablelimits", "true")
                    .with_class(TexClass::Op)
                    .with_props(Props::MOVABLE_LIMITS | Props::MOVE_SUP_SUB);
                self.push_node(mo)
            }
            Command::Limits(limits) => self.limits(name, limits),
            Command::OperatorName => self.operator_name(name),

            Command::MathFont(font) => {
                let arg = self.cursor.get_arg(name)?;
                let env = Env {
                    font: Some(font),
                    multi_letter: true,
                    ..self.stack.env().clone()
                };
                let node = self.parse_with_env(&arg, env)?;
                self.push_node(Node::atom(TexClass::Ord, vec![node]))
            }
            Command::SetFont(font) => {
                self.stack.env_mut().font = Some(font);
                Ok(())
            }
            Command::SetStyle(display, level) => self.push(StackItem::new(ItemKind::Style {
                attrs: vec![
                    ("displaystyle", display.to_string()),
                    ("scriptlevel", level.to_string()),
                ],
            })),
            Command::SetSize(size) => self.push(StackItem::new(ItemKind::Style {
                attrs: vec![("mathsize", em(size))],
            })),
            Command::Color => {
                let color = self.color_arg(name)?;
                self.stack.env_mut().color = Some(color.clone());
                self.push(StackItem::new(ItemKind::Style {
                    attrs: vec![("mathcolor", color)],
                }))
            }
            Command::TextColor => {
                let color = self.color_arg(name)?;
                let arg = self.cursor.get_arg(name)?;
                let env = Env {
                    color: Some(color.clone()),
                    ..self.stack.env().clone()
                };
                let node = self.parse_with_env(&arg, env)?;
                self.push_node(Node::with_children(Kind::Mstyle, vec![node]).set_attr("mathcolor", color))
            }

            Command::Text(level, font) => {
                let arg = self.cursor.get_arg(name)?;
                match self.internal_math(&arg, level, font)? {
                    Some(node) => self.push_node(node),
                    None => Ok(()),
                }
            }
            Command::FBox => {
                let arg = self.cursor.get_arg(name)?;
                let inner = self.internal_math(&arg, None, None)?;
                let mut node = Node::new(Kind::Menclose).set_attr("notation", "box");
                if let Some(inner) = inner {
                    node.push_child(inner);
                }
                self.push_node(node)
            }
            Command::Nbsp => self.push_node(Node::token(Kind::Mtext, "\u{A0}")),

            Command::Accent(accent, stretchy) => self.accent(name, accent, stretchy),
            Command::UnderOver(c, stack) => self.under_over(name, c, stack),
            Command::Overset => self.overset(name, Kind::Mover),
            Command::Underset => self.overset(name, Kind::Munder),
            Command::Atom(class) => self.atom(name, class),

            Command::Lap(left) => {
                let arg = self.parse_arg(name)?;
                let mut padded = Node::with_children(Kind::Mpadded, vec![arg]).set_attr("width", "0");
                if left {
                    padded.attributes.set("lspace", "-1width");
                }
                self.push_node(Node::atom(TexClass::Ord, vec![padded]))
            }
            Command::Phantom(keep_height, keep_width) => {
                let arg = self.parse_arg(name)?;
                let mut node = Node::with_children(Kind::Mphantom, vec![arg]);
                if !(keep_height && keep_width) {
                    node = Node::with_children(Kind::Mpadded, vec![node]);
                    if !keep_height {
                        node.attributes.set("height", "0");
                        node.attributes.set("depth", "0");
                    }
                    if !keep_width {
                        node.attributes.set("width", "0");
                    }
                }
                self.push_node(Node::atom(TexClass::Ord, vec![node]))
            }
            Command::Smash => {
                let which = self.cursor.get_brackets(name)?.unwrap_or_default();
                let arg = self.parse_arg(name)?;
                let mut smash = Node::with_children(Kind::Mpadded, vec![arg]);
                match which.trim() {
                    "b" => smash.attributes.set("depth", "0"),
                    "t" => smash.attributes.set("height", "0"),
                    _ => {
                        smash.attributes.set("height", "0");
                        smash.attributes.set("depth", "0");
                    }
                }
                self.push_node(Node::atom(TexClass::Ord, vec![smash]))
            }
            Command::Href => {
                let url = self.cursor.get_arg(name)?;
                let mut node = self.parse_arg(name)?;
                if node.is(Kind::InferredMrow) {
                    node.kind = Kind::Mrow;
                }
                node.attributes.set("href", url);
                self.push_node(node)
            }
            Command::MathChoice => {
                let mut choice = Node::new(Kind::MathChoice);
                for _ in 0..4 {
                    let arg = self.parse_arg(name)?;
                    choice.push_child(arg);
                }
                self.push_node(choice)
            }
            Command::Raise(raise) => self.raise(name, raise),
            Command::MoveLeft(left) => {
                let h = self.cursor.get_dimen(name)?.to_attribute();
                let negated = match h.strip_prefix('-') {
                    Some(h) => h.to_string(),
                    None => format!("-{h}"),
                };
                let (left, right) = if left { (negated, h) } else { (h, negated) };
                self.push(StackItem::new(ItemKind::Position {
                    name: name.to_string(),
                    shift: Shift::Horizontal { left, right },
                }))
            }

            Command::Spacer(width) => {
                let space = Node::new(Kind::Mspace).set_attr("width", em(width));
                self.push_node(Node::with_children(Kind::Mstyle, vec![space]).set_attr("scriptlevel", "0"))
            }
            Command::Skip => {
                let width = self.cursor.get_dimen(name)?.to_attribute();
                self.push_node(Node::new(Kind::Mspace).set_attr("width", width))
            }

            Command::Not => self.push(StackItem::new(ItemKind::Not)),
            Command::Dots => self.push(StackItem::new(ItemKind::Dots)),

            Command::CrLaTeX => self.cr_latex(name),
            Command::Cr => self.push(StackItem::new(ItemKind::Cell {
                name: "\\cr",
                row: true,
                linebreak: false,
            })),
            Command::HLine(line) => self.hline(name, line),
            Command::HFill => {
                if let Some(top) = self.stack.top_mut() {
                    let size = top.data.len();
                    if let ItemKind::Array(array) = &mut top.kind {
                        array.hfill.push(size);
                        return Ok(());
                    }
                }
                err(TexErrKind::Misplaced(name.into()))
            }
            Command::Begin => self.begin(),
            Command::End => self.end(),
            Command::Matrix(spec) => self.matrix(name, spec),
            Command::Shove(align) => self.shove(name, align),

            Command::Label => self.label(name),
            Command::Ref(eqref) => self.reference(name, eqref),
            Command::Tag => self.tag(name),
            Command::NoTag => {
                self.ctx.tags.notag();
                Ok(())
            }

            Command::NewCommand => self.new_command(name),
            Command::NewEnvironment => self.new_environment(name),
            Command::Def => self.def(name),
            Command::Let => self.let_(name),
        }
    }

    /// Consume a `*` if it comes next.
    pub(crate) fn star(&mut self) -> bool {
        if self.cursor.next_non_space() == Some('*') {
            self.cursor.next_char();
            return true;
        }
        false
    }

    fn genfrac(&mut self, name: &str) -> ParseResult<()> {
        let open = self.delimiter_arg(name)?;
        let close = self.delimiter_arg(name)?;
        let thickness = self.cursor.get_arg(name)?;
        let style = self.cursor.get_arg(name)?;
        let num = self.parse_arg(name)?;
        let den = self.parse_arg(name)?;

        let mut frac = Node::with_slots(Kind::Mfrac, vec![Some(num), Some(den)]);
        if !thickness.is_empty() {
            frac.attributes.set("linethickness", thickness);
        }
        if !open.is_empty() || !close.is_empty() {
            frac = fixed_fence(open, frac, close);
        }
        let style = style.trim();
        if !style.is_empty() {
            let (display, level) = match style {
                "0" => ("true", "0"),
                "1" => ("false", "0"),
                "2" => ("false", "1"),
                "3" => ("false", "2"),
                _ => return err(TexErrKind::BadMathStyleFor(name.into())),
            };
            frac = Node::with_children(Kind::Mstyle, vec![frac])
                .set_attr("displaystyle", display)
                .set_attr("scriptlevel", level);
        }
        self.push_node(frac)
    }

    /// A braced delimiter argument. An empty argument means no delimiter.
    fn delimiter_arg(&mut self, name: &str) -> ParseResult<&'static str> {
        let arg = self.cursor.get_arg(name)?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Ok("");
        }
        match symbols::delimiter(arg) {
            Some(delim) => Ok(delim),
            None => err(TexErrKind::MissingOrUnrecognizedDelimiter(name.into())),
        }
    }

    fn over(&mut self, name: &str, kind: OverKind, delims: OverDelims) -> ParseResult<()> {
        let (open, close) = match delims {
            OverDelims::None => (None, None),
            OverDelims::Read => {
                let open = self.cursor.get_delimiter(name)?;
                let close = self.cursor.get_delimiter(name)?;
                (Some(open), Some(close))
            }
            OverDelims::Fixed(open, close) => (Some(open), Some(close)),
        };
        let thickness = match kind {
            OverKind::Above => Some(self.cursor.get_dimen(name)?.to_attribute()),
            OverKind::Atop => Some("0".to_string()),
            OverKind::Over => None,
        };
        self.push(StackItem::new(ItemKind::Over(Box::new(OverItem {
            name: name.to_string(),
            num: None,
            thickness,
            open,
            close,
        }))))
    }

    fn sqrt(&mut self, name: &str) -> ParseResult<()> {
        let index = self.cursor.get_brackets(name)?;
        let mut arg = self.cursor.get_arg(name)?;
        if arg == "\\frac" {
            let num = self.cursor.get_arg(&arg)?;
            let den = self.cursor.get_arg(&arg)?;
            arg = format!("\\frac{{{num}}}{{{den}}}");
        }
        let env = self.stack.env().clone();
        let base = self.parse_with_env(&arg, env)?;
        let node = match index {
            Some(index) if !index.is_empty() => {
                let root = self.parse_root(&index)?;
                Node::with_slots(Kind::Mroot, vec![Some(base), Some(root)])
            }
            _ => Node::with_children(Kind::Msqrt, vec![base]),
        };
        self.push_node(node)
    }

    /// Parse the index of a root. `\leftroot` and `\uproot` inside it move the index.
    fn parse_root(&mut self, index: &str) -> ParseResult<Node> {
        let env = Env {
            in_root: true,
            ..self.stack.env().clone()
        };
        let (node, global) = self.sub_parse(index, env)?;
        let node = node.unwrap_or_else(|| Node::new(Kind::Mrow));
        if global.left_root.is_none() && global.up_root.is_none() {
            return Ok(node);
        }
        let mut padded = Node::with_children(Kind::Mpadded, vec![node]);
        if let Some(left) = global.left_root {
            padded.attributes.set("width", left);
        }
        if let Some(up) = global.up_root {
            padded.attributes.set("voffset", up.as_str());
            padded.attributes.set("height", up);
        }
        Ok(padded)
    }

    fn move_root(&mut self, name: &str, up: bool) -> ParseResult<()> {
        if !self.stack.env().in_root {
            return err(TexErrKind::MisplacedMoveRoot(name.into()));
        }
        let global = &self.stack.global;
        let used = if up { &global.up_root } else { &global.left_root };
        if used.is_some() {
            return err(TexErrKind::MultipleMoveRoot(name.into()));
        }
        let arg = self.cursor.get_arg(name)?;
        let Ok(n) = arg.trim().parse::<i32>() else {
            return err(TexErrKind::IntegerArg(name.into()));
        };
        let mut shift = em(f64::from(n) / 15.0);
        if !shift.starts_with('-') {
            shift.insert(0, '+');
        }
        let global = &mut self.stack.global;
        if up {
            global.up_root = Some(shift);
        } else {
            global.left_root = Some(shift);
        }
        Ok(())
    }

    fn limits(&mut self, name: &str, limits: bool) -> ParseResult<()> {
        let Some(mut op) = self.stack.prev() else {
            return err(TexErrKind::MisplacedLimits(name.into()));
        };
        if op.core_class() != TexClass::Op && !op.has_prop(Props::MOVE_SUP_SUB) {
            return err(TexErrKind::MisplacedLimits(name.into()));
        }
        match op.kind {
            Kind::Munderover if !limits => op.kind = Kind::Msubsup,
            Kind::Msubsup if limits => op.kind = Kind::Munderover,
            _ => {}
        }
        op.set_prop(Props::MOVE_SUP_SUB, limits);
        op.with_core_mut(clear_movable_limits);
        if op.has_prop(Props::MOVABLE_LIMITS) || op.attributes.get_explicit("movablelimits").is_some() {
            clear_movable_limits(&mut op);
        }
        self.stack.restore_prev(op);
        Ok(())
    }

    fn operator_name(&mut self, name: &str) -> ParseResult<()> {
        let star = self.star();
        let arg = self.cursor.get_arg(name)?;
        let env = Env {
            font: Some("normal"),
            multi_letter: true,
            ..self.stack.env().clone()
        };
        let node = self.parse_with_env(arg.trim(), env)?;
        let mut node = if node.is(Kind::Mi) {
            node
        } else {
            Node::atom(TexClass::Op, vec![node])
        };
        node.tex_class = Some(TexClass::Op);
        node.set_prop(Props::MOVE_SUP_SUB, star);
        node.set_prop(Props::MOVABLE_LIMITS, true);
        if !star {
            // A following `\limits` is swallowed.
            let pos = self.cursor.pos();
            if self.cursor.next_non_space() == Some('\\') {
                self.cursor.next_char();
                if self.cursor.get_cs() != "limits" {
                    self.cursor.rewind(pos);
                }
            }
        }
        self.push(StackItem::with_data(ItemKind::Fn, vec![node]))
    }

    /// The color argument of `\color` and `\textcolor`, with an optional color model.
    fn color_arg(&mut self, name: &str) -> ParseResult<String> {
        let model = self.cursor.get_brackets(name)?;
        let spec = self.cursor.get_arg(name)?;
        Ok(color_value(model.as_deref().map(str::trim), spec.trim()))
    }

    fn accent(&mut self, name: &str, accent: char, stretchy: bool) -> ParseResult<()> {
        let mut base = self.parse_arg(name)?;
        let mut mo = Node::token(Kind::Mo, accent);
        if let Some(font) = self.stack.env().font {
            mo.attributes.set("mathvariant", font);
        }
        mo.attributes.set("accent", "true");
        mo.attributes.set("stretchy", if stretchy { "true" } else { "false" });
        base.with_core_mut(|core| {
            if core.is(Kind::Mo) || core.has_prop(Props::MOVABLE_LIMITS) {
                clear_movable_limits(core);
            }
        });
        let over = Node::with_slots(Kind::Munderover, vec![Some(base), None, Some(mo)]);
        self.push_node(Node::atom(TexClass::Ord, vec![over]))
    }

    fn under_over(&mut self, name: &str, c: char, stack: bool) -> ParseResult<()> {
        let position = if name.starts_with("\\over") { 2 } else { 1 };
        let mut base = self.parse_arg(name)?;
        check_movable_limits(&mut base);
        if base.is(Kind::Munderover) && base.core_mo().is_some() {
            base.with_core_mut(|mo| {
                mo.attributes.set("lspace", "0");
                mo.attributes.set("rspace", "0");
            });
            let spacer = Node::new(Kind::Mo).set_attr("rspace", "0");
            base = Node::with_children(Kind::Mrow, vec![spacer, base]);
        }
        let script = Node::token(Kind::Mo, c)
            .set_attr("stretchy", "true")
            .set_attr("accent", "true");
        let mut node = Node::with_slots(Kind::Munderover, vec![Some(base)]);
        node.set_child(position, Some(script));
        if stack {
            node = Node::atom(TexClass::Op, vec![node]).with_props(Props::MOVE_SUP_SUB);
        }
        node.set_prop(Props::SUB_SUP_OK, true);
        self.push_node(node)
    }

    /// `\overset` and `\underset`: the first argument goes over (or under) the second.
    fn overset(&mut self, name: &str, kind: Kind) -> ParseResult<()> {
        let mut script = self.parse_arg(name)?;
        let mut base = self.parse_arg(name)?;
        check_movable_limits(&mut base);
        if script.is(Kind::Mo) {
            script.attributes.set("accent", "false");
        }
        self.push_node(Node::with_slots(kind, vec![Some(base), Some(script)]))
    }

    fn atom(&mut self, name: &str, class: TexClass) -> ParseResult<()> {
        if class != TexClass::Op {
            let arg = self.parse_arg(name)?;
            return self.push_node(Node::atom(class, vec![arg]));
        }
        let props = Props::MOVE_SUP_SUB | Props::MOVABLE_LIMITS;
        let arg = self.cursor.get_arg(name)?;
        let node = match roman_name(&arg) {
            Some(text) => Node::token(Kind::Mi, text)
                .set_attr("mathvariant", "normal")
                .with_class(TexClass::Op),
            None => {
                let env = self.stack.env().clone();
                let inner = self.parse_with_env(&arg, env)?;
                Node::atom(TexClass::Op, vec![inner])
            }
        };
        self.push_node(node.with_props(props))
    }

    fn raise(&mut self, name: &str, raise: bool) -> ParseResult<()> {
        let h = self.cursor.get_dimen(name)?.to_attribute();
        let (h, raise) = match h.strip_prefix('-') {
            Some(h) => (h.to_string(), !raise),
            None => (h, raise),
        };
        let (height, depth) = if raise {
            (format!("+{h}"), format!("-{h}"))
        } else {
            (format!("-{h}"), format!("+{h}"))
        };
        self.push(StackItem::new(ItemKind::Position {
            name: name.to_string(),
            shift: Shift::Vertical { height, depth },
        }))
    }

    /// `\\`, with an optional `*` and extra space in brackets.
    fn cr_latex(&mut self, name: &str) -> ParseResult<()> {
        if self.cursor.peek() == Some('*') {
            self.cursor.next_char();
        }
        let mut spacing = None;
        if self.cursor.peek() == Some('[') {
            let dim = self.cursor.get_brackets(name)?.unwrap_or_default();
            if !dim.trim().is_empty() {
                match parse_dimension(&dim) {
                    Some(dim) => spacing = Some(dim),
                    None => return err(TexErrKind::MissingDimensionOrUnits(name.into())),
                }
            }
        }
        self.push(StackItem::new(ItemKind::Cell {
            name: "\\\\",
            row: true,
            linebreak: true,
        }))?;
        if let Some(array) = self.stack.top_array_mut() {
            if let Some(dim) = spacing {
                array.add_row_spacing(dim.to_em());
            }
            return Ok(());
        }
        if let Some(dim) = spacing {
            self.push_node(Node::new(Kind::Mspace).set_attr("depth", dim.to_attribute()))?;
        }
        self.push_node(Node::new(Kind::Mspace).set_attr("linebreak", "newline"))
    }

    fn hline(&mut self, name: &str, line: LineType) -> ParseResult<()> {
        if let Some(top) = self.stack.top_mut() {
            if top.data.is_empty() {
                if let ItemKind::Array(array) = &mut top.kind {
                    array.add_hline(line);
                    return Ok(());
                }
            }
        }
        err(TexErrKind::Misplaced(name.into()))
    }

    /// The plain TeX tables, whose body is the next argument.
    fn matrix(&mut self, name: &str, spec: &MatrixSpec) -> ParseResult<()> {
        match self.cursor.next_non_space() {
            None => return err(TexErrKind::MissingArgument(name.into())),
            Some('{') => {
                self.cursor.next_char();
            }
            Some(c) => {
                self.cursor.next_char();
                self.cursor.splice(&format!("{c}}}"))?;
            }
        }
        let mut array = ArrayItem::new(ArrayRows::Plain);
        array.require_close = true;
        array.set_def("rowspacing", spec.vspacing.unwrap_or("4pt"));
        array.set_def("columnspacing", spec.spacing.unwrap_or("1em"));
        if let Some(side) = spec.numbered {
            array.is_numbered = true;
            array.set_def("side", side);
        }
        array.open = spec.open;
        array.close = spec.close;
        if spec.display {
            array.set_def("displaystyle", "true");
        }
        if let Some(align) = spec.align {
            array.set_def("columnalign", align);
        }
        self.push(StackItem::array(array))
    }

    fn shove(&mut self, name: &str, align: ColumnAlign) -> ParseResult<()> {
        if let Some(top) = self.stack.top_mut() {
            let at_line_start = top.data.is_empty();
            if let ItemKind::Array(array) = &mut top.kind {
                if array.is_multline() {
                    if !at_line_start {
                        return err(TexErrKind::CommandMustComeAtBeginningOfLine(name.into()));
                    }
                    array.set_shove(align);
                    return Ok(());
                }
            }
        }
        err(TexErrKind::CommandOnlyAllowedInEnv {
            command: name.into(),
            env: "multline".into(),
        })
    }
}

fn clear_movable_limits(node: &mut Node) {
    if node.is(Kind::Mo) {
        node.attributes.set("movablelimits", "false");
    }
    node.set_prop(Props::MOVABLE_LIMITS, false);
}

/// Limits of a base that gets something over or under it stay where they are.
fn check_movable_limits(base: &mut Node) {
    if base.has_prop(Props::MOVABLE_LIMITS) {
        clear_movable_limits(base);
    }
}

/// The name in `\mathop{\rm name}`, if that is all the argument contains.
fn roman_name(arg: &str) -> Option<&str> {
    let rest = arg.trim_start().strip_prefix("\\rm")?;
    let name = rest.trim_start();
    let valid = name.len() < rest.len()
        && !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b' ');
    valid.then_some(name)
}

/// A color in one of the models of the `color` package, as a CSS color.
///
/// Values that don't fit the model are passed through unchanged.
fn color_value(model: Option<&str>, spec: &str) -> String {
    let channels = |max: f64| -> Option<Vec<u8>> {
        spec.split(',')
            .map(|part| {
                let value: f64 = part.trim().parse().ok()?;
                (0.0..=max)
                    .contains(&value)
                    .then(|| (value / max * 255.0).round() as u8)
            })
            .collect()
    };
    let hex = |values: &[u8]| {
        values
            .iter()
            .fold(String::from("#"), |s, v| s + &format!("{v:02X}"))
    };
    match model {
        Some("rgb") => match channels(1.0) {
            Some(values) if values.len() == 3 => hex(&values),
            _ => spec.to_string(),
        },
        Some("RGB") => match channels(255.0) {
            Some(values) if values.len() == 3 => hex(&values),
            _ => spec.to_string(),
        },
        Some("gray") => match channels(1.0) {
            Some(values) if values.len() == 1 => hex(&[values[0]; 3]),
            _ => spec.to_string(),
        },
        Some("HTML") if spec.len() == 6 && spec.bytes().all(|b| b.is_ascii_hexdigit()) => {
            format!("#{}", spec.to_ascii_uppercase())
        }
        _ => spec.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Definitions, MacroBudget};
    use crate::parser::ParseContext;
    use crate::tags::Numbering;

    fn parse(tex: &str) -> ParseResult<Node> {
        let mut ctx = ParseContext {
            defs: Definitions::default(),
            tags: Numbering::default(),
            budget: MacroBudget::new(100),
            max_buffer: 4096,
        };
        let (node, _) = TexParser::new(tex, Env::default(), false, &mut ctx).parse()?;
        Ok(node.unwrap_or_else(|| Node::new(Kind::Mrow)))
    }

    #[test]
    fn fractions() {
        let node = parse(r"\frac12").unwrap();
        assert_eq!(node.kind, Kind::Mfrac);
        let node = parse(r"\tfrac{a}{b}").unwrap();
        assert_eq!(node.kind, Kind::Mstyle);
        assert_eq!(node.attributes.get("scriptlevel"), Some("0"));
        assert_eq!(node.attributes.get("displaystyle"), Some("false"));
        let node = parse(r"a \above 2pt b").unwrap();
        assert_eq!(node.attributes.get("linethickness"), Some("2pt"));
        assert_eq!(parse(r"\genfrac{}{}{}{5}{a}{b}").unwrap_err().id(), "BadMathStyleFor");
        assert_eq!(parse(r"a \over b \over c").unwrap_err().id(), "AmbiguousUseOf");
    }

    #[test]
    fn binomials_get_fixed_fences() {
        let node = parse(r"\binom{n}{k}").unwrap();
        assert_eq!(node.kind, Kind::Mrow);
        assert_eq!(node.tex_class, Some(TexClass::Inner));
        assert_eq!(node.child(0).map(|n| n.kind), Some(Kind::MathChoice));
        let frac = node.child(1).unwrap();
        assert_eq!(frac.attributes.get("linethickness"), Some("0"));
    }

    #[test]
    fn roots() {
        assert_eq!(parse(r"\sqrt x").unwrap().kind, Kind::Msqrt);
        let node = parse(r"\sqrt[3]{x}").unwrap();
        assert_eq!(node.kind, Kind::Mroot);
        assert_eq!(node.child(1).map(|n| n.text.as_str()), Some("3"));
        let node = parse(r"\root n \of x").unwrap();
        assert_eq!(node.kind, Kind::Mroot);
    }

    #[test]
    fn moved_root_index() {
        let node = parse(r"\sqrt[\leftroot{-2}\uproot{3} n]{x}").unwrap();
        let index = node.child(1).unwrap();
        assert_eq!(index.kind, Kind::Mpadded);
        assert_eq!(index.attributes.get("width"), Some("-0.133em"));
        assert_eq!(index.attributes.get("voffset"), Some("+0.2em"));
        assert_eq!(index.attributes.get("height"), Some("+0.2em"));

        assert_eq!(parse(r"\uproot{2}").unwrap_err().id(), "MisplacedMoveRoot");
        assert_eq!(
            parse(r"\sqrt[\uproot1\uproot2 n]{x}").unwrap_err().id(),
            "MultipleMoveRoot"
        );
        assert_eq!(parse(r"\sqrt[\uproot{a} n]{x}").unwrap_err().id(), "IntegerArg");
    }

    #[test]
    fn left_middle_right() {
        let node = parse(r"\left( a \middle| b \right)").unwrap();
        assert_eq!(node.tex_class, Some(TexClass::Inner));
        assert_eq!(node.child(0).map(|n| n.text.as_str()), Some("("));
        assert_eq!(parse(r"\right)").unwrap_err().id(), "MissingLeftOrExtraRight");
        assert_eq!(parse(r"\left(").unwrap_err().id(), "ExtraLeftOrMissingRight");
        assert_eq!(parse(r"a \middle|").unwrap_err().id(), "OrphanMiddle");
    }

    #[test]
    fn function_names() {
        let node = parse(r"\sin x").unwrap();
        let texts: Vec<_> = node.children.iter().flatten().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["sin", "\u{2061}", "x"]);
        let node = parse(r"\lim_{n}").unwrap();
        assert_eq!(node.kind, Kind::Munderover);
        assert_eq!(node.child(0).and_then(|n| n.attributes.get("movablelimits")), Some("true"));
    }

    #[test]
    fn limits_switch_script_placement() {
        let node = parse(r"\int\limits_0^1").unwrap();
        assert_eq!(node.kind, Kind::Munderover);
        let node = parse(r"\sum\nolimits_i").unwrap();
        assert_eq!(node.kind, Kind::Msubsup);
        assert_eq!(
            node.child(0).and_then(|n| n.attributes.get("movablelimits")),
            Some("false")
        );
        assert_eq!(parse(r"x\limits").unwrap_err().id(), "MisplacedLimits");
    }

    #[test]
    fn operator_names() {
        let node = parse(r"\operatorname{rank} A").unwrap();
        let first = node.child(0).unwrap();
        assert_eq!(first.kind, Kind::Mi);
        assert_eq!(first.text, "rank");
        assert_eq!(first.attributes.get("mathvariant"), Some("normal"));
        let node = parse(r"\operatorname*{arg\,max}_x").unwrap();
        assert_eq!(node.kind, Kind::Munderover);
    }

    #[test]
    fn fonts_and_styles() {
        let node = parse(r"\mathrm{dx}").unwrap();
        assert_eq!(node.tex_class, Some(TexClass::Ord));
        let mi = node.child(0).unwrap();
        assert_eq!(mi.text, "dx");
        assert_eq!(mi.attributes.get("mathvariant"), Some("normal"));

        let node = parse(r"{\bf x}").unwrap();
        assert_eq!(node.child(0).and_then(|n| n.attributes.get("mathvariant")), Some("bold"));

        let node = parse(r"\displaystyle x").unwrap();
        assert_eq!(node.kind, Kind::Mstyle);
        assert_eq!(node.attributes.get("displaystyle"), Some("true"));

        let node = parse(r"\large x").unwrap();
        assert_eq!(node.attributes.get("mathsize"), Some("1.2em"));
    }

    #[test]
    fn colors() {
        let node = parse(r"\color{red} x").unwrap();
        assert_eq!(node.attributes.get("mathcolor"), Some("red"));
        let node = parse(r"\textcolor[rgb]{1,0,0}{x}").unwrap();
        assert_eq!(node.attributes.get("mathcolor"), Some("#FF0000"));
        assert_eq!(color_value(Some("HTML"), "00ff80"), "#00FF80");
        assert_eq!(color_value(Some("gray"), "0.5"), "#808080");
        assert_eq!(color_value(Some("rgb"), "2,0,0"), "2,0,0");
    }

    #[test]
    fn accents_and_braces() {
        let node = parse(r"\hat x").unwrap();
        assert_eq!(node.tex_class, Some(TexClass::Ord));
        let over = node.child(0).unwrap();
        assert_eq!(over.kind, Kind::Munderover);
        assert!(!over.has_child(1));
        let accent = over.child(2).unwrap();
        assert_eq!(accent.attributes.get("accent"), Some("true"));
        assert_eq!(accent.attributes.get("stretchy"), Some("false"));

        let node = parse(r"\underbrace{a+b}_{n}").unwrap();
        assert_eq!(node.kind, Kind::Munderover);
        let atom = node.child(0).unwrap();
        assert_eq!(atom.tex_class, Some(TexClass::Op));

        let node = parse(r"\overset{!}{=}").unwrap();
        assert_eq!(node.kind, Kind::Mover);
        assert_eq!(node.child(0).map(|n| n.text.as_str()), Some("="));
    }

    #[test]
    fn atoms() {
        let node = parse(r"\mathbin{x}").unwrap();
        assert_eq!(node.tex_class, Some(TexClass::Bin));
        let node = parse(r"\mathop{\rm sgn}").unwrap();
        assert_eq!(node.kind, Kind::Mi);
        assert_eq!(node.text, "sgn");
        assert!(node.has_prop(Props::MOVABLE_LIMITS));
    }

    #[test]
    fn boxes() {
        let node = parse(r"\rlap{x}").unwrap();
        let padded = node.child(0).unwrap();
        assert_eq!(padded.attributes.get("width"), Some("0"));
        assert_eq!(padded.attributes.get("lspace"), None);

        let node = parse(r"\vphantom{x}").unwrap();
        let padded = node.child(0).unwrap();
        assert_eq!(padded.kind, Kind::Mpadded);
        assert_eq!(padded.attributes.get("width"), Some("0"));
        assert_eq!(padded.attributes.get("height"), None);

        let node = parse(r"\phantom{x}").unwrap();
        assert_eq!(node.child(0).map(|n| n.kind), Some(Kind::Mphantom));

        let node = parse(r"\smash[b]{x}").unwrap();
        let padded = node.child(0).unwrap();
        assert_eq!(padded.attributes.get("depth"), Some("0"));
        assert_eq!(padded.attributes.get("height"), None);
    }

    #[test]
    fn positioning() {
        let node = parse(r"\raise 2pt {x}").unwrap();
        assert_eq!(node.kind, Kind::Mpadded);
        assert_eq!(node.attributes.get("height"), Some("+2pt"));
        assert_eq!(node.attributes.get("depth"), Some("-2pt"));
        let node = parse(r"\lower -1em x").unwrap();
        assert_eq!(node.attributes.get("voffset"), Some("+1em"));
        let node = parse(r"\moveleft 1em x").unwrap();
        assert_eq!(node.child(0).and_then(|n| n.attributes.get("width")), Some("-1em"));
        assert_eq!(node.child(2).and_then(|n| n.attributes.get("width")), Some("1em"));
        assert_eq!(parse(r"\raise 1em }").unwrap_err().id(), "MissingBoxFor");
    }

    #[test]
    fn spaces() {
        let node = parse(r"\,").unwrap();
        assert_eq!(node.kind, Kind::Mstyle);
        assert_eq!(node.child(0).and_then(|n| n.attributes.get("width")), Some("0.167em"));
        let node = parse(r"\hspace{3mu}").unwrap();
        assert_eq!(node.attributes.get("width"), Some("0.167em"));
    }

    #[test]
    fn line_breaks_outside_tables() {
        let node = parse(r"a \\[2pt] b").unwrap();
        let kinds: Vec<_> = node.children.iter().flatten().map(|n| n.kind).collect();
        assert_eq!(kinds, [Kind::Mi, Kind::Mspace, Kind::Mspace, Kind::Mi]);
        assert_eq!(node.child(2).and_then(|n| n.attributes.get("linebreak")), Some("newline"));
        assert_eq!(parse(r"a \\[x] b").unwrap_err().id(), "MissingDimensionOrUnits");
        assert_eq!(parse(r"a & b").unwrap_err().id(), "Misplaced");
        assert_eq!(parse(r"\hline").unwrap_err().id(), "Misplaced");
    }

    #[test]
    fn plain_matrices() {
        let node = parse(r"\pmatrix{a & b \cr c & d}").unwrap();
        assert_eq!(node.kind, Kind::Mrow);
        let table = node.child(1).unwrap();
        assert_eq!(table.kind, Kind::Mtable);
        assert_eq!(table.child_count(), 2);
        assert_eq!(table.attributes.get("rowspacing"), Some("4pt"));
        assert_eq!(parse(r"\matrix").unwrap_err().id(), "MissingArgument");
    }

    #[test]
    fn shove_outside_multline() {
        let error = parse(r"\shoveleft x").unwrap_err();
        assert_eq!(error.id(), "CommandOnlyAllowedInEnv");
        assert_eq!(error.message(), r"\shoveleft only allowed in multline environment");
    }

    #[test]
    fn roman_operator_names() {
        assert_eq!(roman_name(r" \rm  sgn"), Some("sgn"));
        assert_eq!(roman_name(r"\rmx"), None);
        assert_eq!(roman_name(r"\rm x+y"), None);
    }
}
