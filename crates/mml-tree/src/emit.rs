use std::fmt::{self, Write};

use crate::ast::{Kind, Node};
use crate::fmt::{escape_attribute, escape_text, new_line_and_indent};

/// The part of the rendering style that decides between `\mathchoice` alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Style {
    display: bool,
    level: u8,
}

impl Style {
    fn script(self, by: u8) -> Style {
        Style {
            display: false,
            level: self.level.saturating_add(by),
        }
    }

    /// Index into the four alternatives of a `mathchoice`.
    fn choice(self) -> usize {
        match (self.display, self.level) {
            (true, _) => 0,
            (false, 0) => 1,
            (false, 1) => 2,
            _ => 3,
        }
    }
}

impl Node {
    /// Serialize this node as MathML into `s`.
    ///
    /// A `base_indent` of zero writes everything on one line; otherwise children are put on
    /// their own lines, indented one level deeper than their parent.
    pub fn emit(&self, s: &mut String, base_indent: usize) -> fmt::Result {
        let style = Style {
            display: self.attributes.get("display") == Some("block"),
            level: 0,
        };
        emit_node(s, self, base_indent, style)
    }

    /// Record on every node the display style and script level it inherits from its
    /// ancestors, as the inherited attributes `displaystyle` and `scriptlevel`.
    ///
    /// Explicit attributes are left alone, so the serialized output doesn't change.
    pub fn inherit_style(&mut self) {
        let style = Style {
            display: self.attributes.get_explicit("display") == Some("block"),
            level: 0,
        };
        set_inherited_style(self, style);
    }
}

fn set_inherited_style(node: &mut Node, style: Style) {
    let display = if style.display { "true" } else { "false" };
    node.attributes.set_inherited("displaystyle", display);
    node.attributes
        .set_inherited("scriptlevel", style.level.to_string());
    let display_table = node.attributes.get_explicit("displaystyle") == Some("true");
    let styles: Vec<Style> = (0..node.children.len())
        .map(|idx| child_style(node, idx, style, display_table))
        .collect();
    for (child, child_style) in node.children.iter_mut().zip(styles) {
        if let Some(child) = child {
            set_inherited_style(child, child_style);
        }
    }
}

fn emit_node(s: &mut String, node: &Node, base_indent: usize, style: Style) -> fmt::Result {
    // The root starts the output, so it gets no line of its own and its children are not
    // indented further.
    let is_root = node.kind == Kind::Math;
    let child_indent = if base_indent > 0 && !is_root {
        base_indent.saturating_add(1)
    } else {
        base_indent
    };

    match node.kind {
        Kind::InferredMrow => {
            for child in &node.children {
                emit_slot(s, child.as_ref(), base_indent, style)?;
            }
            return Ok(());
        }
        Kind::MathChoice => {
            let idx = style.choice();
            let choice = node.child(idx).or_else(|| node.child(0));
            return match choice {
                Some(choice) => emit_node(s, choice, base_indent, style),
                None => Ok(()),
            };
        }
        _ => {}
    }

    if !is_root {
        new_line_and_indent(s, base_indent);
    }
    let tag = match node.kind {
        Kind::TeXAtom => "mrow",
        kind => kind.as_str(),
    };
    write!(s, "<{tag}")?;
    if let Some(class) = node.tex_class
        && matches!(node.kind, Kind::TeXAtom | Kind::Mrow)
    {
        write!(s, " data-mjx-texclass=\"{}\"", class.as_str())?;
    }
    for (name, value) in node.attributes.iter() {
        write!(s, " {name}=\"")?;
        escape_attribute(s, value);
        s.push('"');
    }

    if node.kind.is_token() {
        if node.kind == Kind::Mspace && node.text.is_empty() {
            s.push_str("/>");
        } else {
            s.push('>');
            escape_text(s, &node.text);
            write!(s, "</{tag}>")?;
        }
        return Ok(());
    }

    s.push('>');
    if node.children.is_empty() {
        write!(s, "</{tag}>")?;
        return Ok(());
    }
    let display_table = node.attributes.get_explicit("displaystyle") == Some("true");
    for (idx, child) in node.children.iter().enumerate() {
        let child_style = child_style(node, idx, style, display_table);
        emit_slot(s, child.as_ref(), child_indent, child_style)?;
    }
    if is_root {
        if base_indent > 0 {
            s.push('\n');
        }
    } else {
        new_line_and_indent(s, base_indent);
    }
    write!(s, "</{tag}>")?;
    Ok(())
}

fn emit_slot(s: &mut String, slot: Option<&Node>, indent: usize, style: Style) -> fmt::Result {
    match slot {
        Some(node) => emit_node(s, node, indent, style),
        None => {
            new_line_and_indent(s, indent);
            s.push_str("<mrow></mrow>");
            Ok(())
        }
    }
}

fn child_style(parent: &Node, idx: usize, style: Style, display_table: bool) -> Style {
    match parent.kind {
        Kind::Mfrac if style.display => Style {
            display: false,
            level: style.level,
        },
        Kind::Mfrac => style.script(1),
        k if k.is_scripted() && idx > 0 => style.script(1),
        Kind::Mroot if idx == 1 => style.script(2),
        Kind::Mtable => Style {
            display: display_table,
            level: style.level,
        },
        Kind::Mstyle => {
            let display = match parent.attributes.get_explicit("displaystyle") {
                Some("true") => true,
                Some("false") => false,
                _ => style.display,
            };
            let level = match parent.attributes.get_explicit("scriptlevel") {
                Some(level) => level.trim_start_matches('+').parse().unwrap_or(style.level),
                None => style.level,
            };
            Style { display, level }
        }
        _ => style,
    }
}
