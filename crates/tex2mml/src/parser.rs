//! The main loop. The parser reads the input one token at a time and turns each token into
//! nodes or stack items; the stack does the rest.

use tex2mml_tree::{Kind, Node, Props, TexClass};

use crate::cursor::Cursor;
use crate::dispatch::{Definitions, Macro, MacroBudget, Meaning};
use crate::error::{TexErrKind, TexError, err};
use crate::newcommand::substitute_args;
use crate::stack::{Env, Global, Stack};
use crate::stack_item::{ItemKind, StackItem};
use crate::symbols::{self, OpKind};
use crate::tags::Numbering;

pub(crate) type ParseResult<T> = Result<T, Box<TexError>>;

/// State shared by the parser of an equation and every parser it starts for a part of it.
#[derive(Debug)]
pub(crate) struct ParseContext {
    pub defs: Definitions,
    pub tags: Numbering,
    pub budget: MacroBudget,
    pub max_buffer: usize,
}

pub(crate) struct TexParser<'ctx> {
    pub(crate) cursor: Cursor,
    pub(crate) stack: Stack,
    pub(crate) ctx: &'ctx mut ParseContext,
    /// The control sequence that is being handled, including the backslash.
    pub(crate) current_cs: String,
}

impl<'ctx> TexParser<'ctx> {
    pub(crate) fn new(tex: &str, env: Env, is_inner: bool, ctx: &'ctx mut ParseContext) -> Self {
        TexParser {
            cursor: Cursor::new(tex, ctx.max_buffer),
            stack: Stack::new(env, is_inner),
            ctx,
            current_cs: String::new(),
        }
    }

    /// Parse the whole input. Returns the node it produced and the final parse-wide state.
    pub(crate) fn parse(mut self) -> ParseResult<(Option<Node>, Global)> {
        while let Some(c) = self.cursor.next_char() {
            self.parse_char(c)?;
        }
        self.push(StackItem::new(ItemKind::Stop))?;
        Ok(self.stack.into_result())
    }

    #[inline]
    pub(crate) fn push(&mut self, item: StackItem) -> ParseResult<()> {
        self.stack.push(item, &mut self.ctx.tags)
    }

    #[inline]
    pub(crate) fn push_node(&mut self, node: Node) -> ParseResult<()> {
        self.stack.push_node(node, &mut self.ctx.tags)
    }

    fn parse_char(&mut self, c: char) -> ParseResult<()> {
        match c {
            '\\' => {
                let name = self.cursor.get_cs();
                self.control_sequence(&name)
            }
            '{' => self.push(StackItem::new(ItemKind::Open)),
            '}' => self.push(StackItem::new(ItemKind::Close)),
            '^' => self.script(2),
            '_' => self.script(1),
            '\'' | '\u{2019}' => self.prime(),
            '&' => self.push(StackItem::new(ItemKind::Cell {
                name: "&",
                row: false,
                linebreak: false,
            })),
            '#' => err(TexErrKind::CantUseHash),
            '%' => {
                while let Some(c) = self.cursor.next_char() {
                    if c == '\n' {
                        break;
                    }
                }
                Ok(())
            }
            '~' => self.push_node(Node::token(Kind::Mtext, "\u{A0}")),
            c if c.is_whitespace() => Ok(()),
            c if c.is_ascii_alphabetic() => self.variable(c),
            c if c.is_ascii_digit() || c == '.' => self.number(c),
            c if c.is_alphabetic() => self.variable(c),
            c => self.other(c),
        }
    }

    fn variable(&mut self, c: char) -> ParseResult<()> {
        let env = self.stack.env();
        let font = env.font;
        let text = if env.multi_letter && font.is_some() && c.is_ascii_alphabetic() {
            self.cursor.letters_from_prev(c)
        } else {
            c.to_string()
        };
        let mut mi = Node::token(Kind::Mi, text);
        if let Some(font) = font {
            mi.attributes.set("mathvariant", font);
        }
        self.push_node(mi)
    }

    fn number(&mut self, c: char) -> ParseResult<()> {
        let number = self.cursor.number_from_prev(c);
        if number == "." {
            return self.other(c);
        }
        let mut mn = Node::token(Kind::Mn, number);
        if let Some(font) = self.stack.env().font {
            mn.attributes.set("mathvariant", font);
        }
        self.push_node(mn)
    }

    fn other(&mut self, c: char) -> ParseResult<()> {
        let c = symbols::remap(c);
        let text = c.to_string();
        let class = symbols::operator_class(&text);
        let mut mo = Node::token(Kind::Mo, text).with_class(class);
        if let Some(font) = self.stack.env().font {
            mo.attributes.set("mathvariant", font);
        }
        // Delimiters typed directly never stretch; only `\left` and friends make them stretchy.
        if matches!(c, '(' | ')' | '[' | ']' | '|' | '\u{2016}') {
            mo.attributes.set("stretchy", "false");
        }
        self.push_node(mo)
    }

    fn control_sequence(&mut self, name: &str) -> ParseResult<()> {
        self.current_cs = format!("\\{name}");
        let Some(meaning) = self.ctx.defs.lookup(name, &mut self.ctx.budget)? else {
            return err(TexErrKind::UndefinedControlSequence(
                self.current_cs.as_str().into(),
            ));
        };
        match meaning {
            Meaning::Macro(mac) => self.expand_macro(&mac),
            Meaning::Command(command) => self.command(command),
            Meaning::Identifier(c) => self.push_node(Node::token(Kind::Mi, c)),
            Meaning::Upright(c) => {
                let variant = self.stack.env().font.unwrap_or("normal");
                self.push_node(Node::token(Kind::Mi, c).set_attr("mathvariant", variant))
            }
            Meaning::Operator(c, kind) => {
                let mo = Node::token(Kind::Mo, c);
                let mo = match kind {
                    OpKind::Limits => mo
                        .with_class(TexClass::Op)
                        .with_props(Props::MOVABLE_LIMITS | Props::MOVE_SUP_SUB),
                    OpKind::NoLimits => mo.with_class(TexClass::Op),
                    OpKind::Normal => mo.with_class(symbols::operator_class(&c.to_string())),
                };
                self.push_node(mo)
            }
            Meaning::Delimiter(delim) => {
                let mo = Node::token(Kind::Mo, delim)
                    .set_attr("fence", "false")
                    .set_attr("stretchy", "false")
                    .with_class(symbols::operator_class(delim));
                self.push_node(mo)
            }
        }
    }

    /// Replace a macro call by its template, with the arguments filled in.
    fn expand_macro(&mut self, mac: &Macro) -> ParseResult<()> {
        let text = if mac.arity > 0 {
            let mut args = Vec::with_capacity(mac.arity);
            if let Some(default) = &mac.default {
                let optional = self.cursor.get_brackets(&self.current_cs)?;
                args.push(optional.unwrap_or_else(|| default.clone()));
            }
            while args.len() < mac.arity {
                args.push(self.cursor.get_arg(&self.current_cs)?);
            }
            substitute_args(&args, &mac.template)?
        } else {
            mac.template.clone()
        };
        self.cursor.splice(&text)?;
        self.ctx.budget.charge()
    }

    /// Handle `^` (position 2) and `_` (position 1).
    fn script(&mut self, position: usize) -> ParseResult<()> {
        self.cursor.isolate_digit();
        let after_prime = self
            .stack
            .top()
            .is_some_and(|top| matches!(top.kind, ItemKind::Prime));
        let (base, primes) = if after_prime {
            let mut item = self.stack.pop()?;
            let primes = item.data.pop();
            (item.data.pop(), primes)
        } else {
            (self.stack.prev(), None)
        };
        let mut base = base.unwrap_or_else(|| Node::token(Kind::Mi, ""));
        let movesupsub = base.has_prop(Props::MOVE_SUP_SUB);
        let double = match base.kind {
            Kind::Msubsup => base.has_child(position),
            Kind::Munderover => base.has_child(position) && !base.has_prop(Props::SUB_SUP_OK),
            _ => false,
        };
        if double {
            return err(if position == 2 {
                TexErrKind::DoubleExponent
            } else {
                TexErrKind::DoubleSubscripts
            });
        }
        let keep = match base.kind {
            Kind::Msubsup => true,
            Kind::Munderover => movesupsub && !base.has_child(position),
            _ => false,
        };
        if !keep {
            base = if movesupsub {
                if base.is(Kind::Mi) && base.has_prop(Props::MOVABLE_LIMITS) {
                    base = mi_to_mo(base);
                }
                Node::with_slots(Kind::Munderover, vec![Some(base)])
                    .with_props(Props::MOVE_SUP_SUB)
            } else {
                Node::with_slots(Kind::Msubsup, vec![Some(base)])
            };
        }
        self.push(StackItem::with_data(
            ItemKind::SubSup {
                position,
                primes,
                movesupsub,
            },
            vec![base],
        ))
    }

    /// Handle `'`. Consecutive primes combine into one symbol.
    fn prime(&mut self) -> ParseResult<()> {
        let base = self.stack.prev().unwrap_or_else(|| Node::new(Kind::Mi));
        if base.is(Kind::Msubsup) && base.has_child(2) {
            return err(TexErrKind::DoubleExponentPrime);
        }
        let mut count = 1usize;
        while matches!(self.cursor.next_non_space(), Some('\'' | '\u{2019}')) {
            self.cursor.next_char();
            count += 1;
        }
        let primes = match count {
            1 => "\u{2032}".to_string(),
            2 => "\u{2033}".to_string(),
            3 => "\u{2034}".to_string(),
            4 => "\u{2057}".to_string(),
            n => "\u{2032}".repeat(n),
        };
        self.push(StackItem::with_data(
            ItemKind::Prime,
            vec![base, Node::token(Kind::Mo, primes)],
        ))
    }

    /// Parse `text` on its own, starting from `env`. Definitions, numbering and the macro
    /// budget are shared with this parser.
    pub(crate) fn sub_parse(&mut self, text: &str, env: Env) -> ParseResult<(Option<Node>, Global)> {
        TexParser::new(text, env, true, self.ctx).parse()
    }

    /// Parse `text` with `env` and return its node, or an empty row.
    pub(crate) fn parse_with_env(&mut self, text: &str, env: Env) -> ParseResult<Node> {
        let (node, _) = self.sub_parse(text, env)?;
        Ok(node.unwrap_or_else(|| Node::new(Kind::Mrow)))
    }

    /// Read an argument and parse it in the current environment.
    pub(crate) fn parse_arg(&mut self, name: &str) -> ParseResult<Node> {
        let arg = self.cursor.get_arg(name)?;
        let env = self.stack.env().clone();
        self.parse_with_env(&arg, env)
    }
}

/// Turn an identifier with movable limits into an operator, so that its scripts can move.
fn mi_to_mo(mi: Node) -> Node {
    let mut mo = Node::token(Kind::Mo, mi.text);
    mo.attributes = mi.attributes;
    mo.tex_class = mi.tex_class;
    mo.props = mi.props - Props::MOVE_SUP_SUB;
    mo.set_attr("lspace", "0").set_attr("rspace", "0")
}
