//! Labels, references and explicit tags.

use tex2mml_tree::{Kind, Node};

use crate::error::{TexErrKind, err};
use crate::parser::{ParseResult, TexParser};

impl TexParser<'_> {
    pub(super) fn label(&mut self, name: &str) -> ParseResult<()> {
        let label = self.cursor.get_arg(name)?;
        if label.is_empty() {
            return Ok(());
        }
        let tags = &mut self.ctx.tags;
        // A second translation sees its own labels as already defined.
        if !tags.ref_update() {
            if !tags.label().is_empty() {
                return err(TexErrKind::MultipleCommand(name.into()));
            }
            if tags.is_label_defined(&label) {
                return err(TexErrKind::MultipleLabel(label.into()));
            }
        }
        tags.set_label(label);
        Ok(())
    }

    /// `\ref` and `\eqref`: a link to the tagged equation.
    pub(super) fn reference(&mut self, name: &str, eqref: bool) -> ParseResult<()> {
        let label = self.cursor.get_arg(name)?;
        let found = self.ctx.tags.reference(&label);
        let tag = if eqref {
            self.ctx.tags.format_tag(&found.tag)
        } else {
            found.tag
        };
        let href = self.ctx.tags.format_url(&found.id);
        let mut link = Node::new(Kind::Mrow).set_attr("href", href);
        if let Some(text) = self.internal_math(&tag, None, None)? {
            link.push_child(text);
        }
        self.push_node(link)
    }

    pub(super) fn tag(&mut self, name: &str) -> ParseResult<()> {
        if self.ctx.tags.has_tag() {
            return err(TexErrKind::MultipleTag);
        }
        let star = self.star();
        let tag = self.cursor.get_arg(name)?;
        self.ctx.tags.tag(tag.trim().to_string(), star);
        Ok(())
    }
}
