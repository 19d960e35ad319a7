//! Text boxes (`\text`, `\mbox`, `\fbox`, ...), which may contain math in `$...$` or
//! `\(...\)` and references.

use tex2mml_tree::{Kind, Node, TexClass};

use crate::error::{TexErrKind, err};
use crate::parser::{ParseResult, TexParser};
use crate::stack::Env;

impl TexParser<'_> {
    /// Turn the contents of a text box into a node, or `None` if it is empty.
    ///
    /// With a `level`, the result is set in that script level.
    pub(super) fn internal_math(
        &mut self,
        text: &str,
        level: Option<u8>,
        font: Option<&'static str>,
    ) -> ParseResult<Option<Node>> {
        let variant = font.or(self.stack.env().font);
        let mut text: Vec<char> = text.chars().collect();
        let mut nodes = Vec::new();
        // What ends the math that is being read: `$`, `)` (for `\)`) or `}` (for `\ref{...}`).
        let mut close: Option<char> = None;
        let mut braces = 0usize;
        let mut start = 0;
        let mut i = 0;
        while i < text.len() {
            let c = text[i];
            i += 1;
            match c {
                '$' => match close {
                    Some('$') if braces == 0 => {
                        nodes.push(self.text_math(&text[start..i - 1])?);
                        close = None;
                        start = i;
                    }
                    None => {
                        if start + 1 < i {
                            nodes.push(text_node(&text[start..i - 1], variant));
                        }
                        close = Some('$');
                        start = i;
                    }
                    Some(_) => {}
                },
                '{' if close.is_some() => braces += 1,
                '}' => match close {
                    Some('}') if braces == 0 => {
                        nodes.push(self.text_math(&text[start..i])?);
                        close = None;
                        start = i;
                    }
                    Some(_) => braces = braces.saturating_sub(1),
                    None => {}
                },
                '\\' => {
                    if let (None, Some(len)) = (close, reference_prefix(&text[i..])) {
                        if start + 1 < i {
                            nodes.push(text_node(&text[start..i - 1], variant));
                        }
                        close = Some('}');
                        start = i - 1;
                        i += len;
                        continue;
                    }
                    let next = text.get(i).copied();
                    i += 1;
                    match next {
                        Some('(') if close.is_none() => {
                            if start + 2 < i {
                                nodes.push(text_node(&text[start..i - 2], variant));
                            }
                            close = Some(')');
                            start = i;
                        }
                        Some(')') if close == Some(')') && braces == 0 => {
                            nodes.push(self.text_math(&text[start..i - 2])?);
                            close = None;
                            start = i;
                        }
                        Some('$' | '{' | '}' | '\\') if close.is_none() => {
                            // Drop the backslash of an escaped character.
                            i -= 1;
                            text.remove(i - 1);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        if close.is_some() {
            return err(TexErrKind::MathNotTerminated);
        }
        if start < text.len() {
            nodes.push(text_node(&text[start..], variant));
        }
        Ok(match level {
            Some(level) => Some(
                Node::with_children(Kind::Mstyle, nodes)
                    .set_attr("displaystyle", "false")
                    .set_attr("scriptlevel", level.to_string()),
            ),
            None if nodes.len() > 1 => Some(Node::with_children(Kind::Mrow, nodes)),
            None => nodes.pop(),
        })
    }

    /// Math inside a text box starts from a fresh environment.
    fn text_math(&mut self, math: &[char]) -> ParseResult<Node> {
        let math: String = math.iter().collect();
        let node = self.parse_with_env(&math, Env::default())?;
        Ok(Node::atom(TexClass::Ord, vec![node]))
    }
}

/// The length of `ref{` or `eqref{` (with optional spaces before the brace) at the start
/// of `rest`.
fn reference_prefix(rest: &[char]) -> Option<usize> {
    let mut len = if rest.starts_with(&['e', 'q']) { 2 } else { 0 };
    if !rest[len..].starts_with(&['r', 'e', 'f']) {
        return None;
    }
    len += 3;
    while rest.get(len).is_some_and(|c| c.is_whitespace()) {
        len += 1;
    }
    (rest.get(len) == Some(&'{')).then_some(len + 1)
}

/// An `mtext`. Leading and trailing whitespace become a single no-break space each.
fn text_node(chars: &[char], variant: Option<&str>) -> Node {
    let text: String = chars.iter().collect();
    let rest = text.trim_start();
    let core = rest.trim_end();
    let mut s = String::with_capacity(text.len() + 4);
    if rest.len() < text.len() {
        s.push('\u{A0}');
    }
    s.push_str(core);
    if core.len() < rest.len() {
        s.push('\u{A0}');
    }
    let mut node = Node::token(Kind::Mtext, s);
    if let Some(variant) = variant {
        node.attributes.set("mathvariant", variant);
    }
    node
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
    fn plain_text() {
        let node = parse(r"\text{ if }").unwrap();
        assert_eq!(node.kind, Kind::Mtext);
        assert_eq!(node.text, "\u{A0}if\u{A0}");
        let node = parse(r"\textbf{A}").unwrap();
        assert_eq!(node.attributes.get("mathvariant"), Some("bold"));
    }

    #[test]
    fn math_in_text() {
        let node = parse(r"\text{for $x>0$}").unwrap();
        assert_eq!(node.kind, Kind::Mrow);
        assert_eq!(node.child(0).map(|n| n.text.as_str()), Some("for\u{A0}"));
        let math = node.child(1).unwrap();
        assert_eq!(math.tex_class, Some(TexClass::Ord));
        assert_eq!(math.child_count(), 3);

        let node = parse(r"\text{a \(b\) c}").unwrap();
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn escapes() {
        let node = parse(r"\text{\$5 \{x\}}").unwrap();
        assert_eq!(node.text, "$5 {x}");
    }

    #[test]
    fn unterminated_math() {
        assert_eq!(parse(r"\text{$x}").unwrap_err().id(), "MathNotTerminated");
    }

    #[test]
    fn boxes_set_their_level() {
        let node = parse(r"\mbox{a}").unwrap();
        assert_eq!(node.kind, Kind::Mstyle);
        assert_eq!(node.attributes.get("scriptlevel"), Some("0"));
        let node = parse(r"\fbox{a}").unwrap();
        assert_eq!(node.kind, Kind::Menclose);
        assert_eq!(node.child(0).map(|n| n.kind), Some(Kind::Mtext));
    }

    #[test]
    fn references_in_text() {
        assert_eq!(reference_prefix(&['r', 'e', 'f', ' ', '{', 'a']), Some(5));
        assert_eq!(reference_prefix(&['e', 'q', 'r', 'e', 'f', '{']), Some(6));
        assert_eq!(reference_prefix(&['r', 'e', 'x']), None);
        let node = parse(r"\text{see \ref{x}}").unwrap();
        let link = node.child(1).unwrap().child(0).unwrap();
        assert_eq!(link.attributes.get("href"), Some("#"));
        assert_eq!(link.text_content(), "???");
    }
}
