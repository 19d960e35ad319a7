//! Convert TeX math into a MathML expression tree.
//!
//! The parser follows the TeX input semantics of MathJax: it reads the input one token at a
//! time and pushes typed items on a stack, which reduce to MathML nodes as soon as enough of
//! their context is known. The result is a [`Node`] tree that can be inspected or serialized.
//!
//! # Usage
//!
//! The main struct of this library is [`Converter`]. It is created from a [`Config`] and keeps
//! user definitions, equation numbers and labels across the formulas of one document.
//!
//! ```rust
//! use tex2mml::{Config, Converter, MathDisplay};
//!
//! let mut converter = Converter::new(Config::default()).unwrap();
//! let mathml = converter.convert(r"\frac{n}{k}", MathDisplay::Inline).unwrap();
//! assert_eq!(mathml, "<math><mfrac><mi>n</mi><mi>k</mi></mfrac></math>");
//! ```
//!
//! References to labels that are defined further down in a document can only be resolved once
//! the whole document has been seen. Such formulas are remembered and can be translated again
//! with [`Converter::rerun_pending`].
//!
//! # Features
//!
//! - `serde`: With this feature, `Config` implements serde's `Deserialize`.
//!
mod ams_methods;
mod commands;
mod cursor;
mod dispatch;
mod environments;
mod error;
mod filters;
mod methods;
mod newcommand;
mod parser;
mod specifications;
mod stack;
mod stack_item;
mod symbols;
mod tags;
mod text_parser;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use tex2mml_tree::{Kind, Node, TexClass};

pub use self::error::{TexErrKind, TexError};
pub use self::tags::{DefaultTagFormat, TagFormat, TagMode, TagSide};
use self::dispatch::{Definition, Definitions, Macro, MacroBudget, Meaning};
use self::parser::{ParseContext, ParseResult, TexParser};
use self::stack::Env;
use self::tags::Numbering;

/// Display mode for the TeX math equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathDisplay {
    /// For inline equations, like those in `$...$` in LaTeX.
    Inline,
    /// For block equations (or "display style" equations), like those in `$$...$$` in LaTeX.
    Block,
}

/// Configuration for pretty-printing the MathML output.
///
/// Pretty-printing means that newlines and indentation is added to the MathML output, to make it
/// easier to read.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[non_exhaustive]
pub enum PrettyPrint {
    /// Never pretty print.
    #[default]
    Never,
    /// Always pretty print.
    Always,
    /// Pretty print for block equations only.
    Auto,
}

/// Configuration object for the conversion.
///
/// # Example usage
///
/// ```rust
/// use tex2mml::{Config, PrettyPrint, TagMode};
///
/// // Number `equation`, `align` and the other numbered environments.
/// let config = Config {
///     tags: TagMode::Ams,
///     ..Default::default()
/// };
///
/// // Custom macros, with and without arguments.
/// let macros = vec![
///     ("d".to_string(), r"\mathrm{d}".to_string()),
///     ("bb".to_string(), r"\mathbb{#1}".to_string()),
/// ];
/// let config = Config {
///     pretty_print: PrettyPrint::Auto,
///     macros,
///     ..Default::default()
/// };
/// ```
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct Config {
    /// A configuration for pretty-printing the MathML output. See [`PrettyPrint`] for details.
    pub pretty_print: PrettyPrint,
    /// A list of macros; each tuple contains (macro_name, macro_definition). The definition
    /// refers to its arguments as `#1` to `#9`.
    #[cfg_attr(feature = "serde", serde(with = "tuple_vec_map"))]
    pub macros: Vec<(String, String)>,
    /// If `true`, include `xmlns="http://www.w3.org/1998/Math/MathML"` in the `<math>` tag.
    pub xml_namespace: bool,
    /// If `true`, wrap the MathML output in `<semantics>` tags with an
    /// `<annotation encoding="application/x-tex">` child containing the TeX source.
    pub annotation: bool,
    /// Which equations are numbered automatically.
    pub tags: TagMode,
    pub tag_side: TagSide,
    /// The minimum space between an equation and its tag.
    pub tag_indent: String,
    /// If `true`, the element ids of tags are made from their labels when they have one.
    pub use_label_ids: bool,
    /// The number after which automatic numbering starts.
    pub start_number: usize,
    /// The maximum number of macro substitutions in one formula.
    pub max_macros: usize,
    /// The maximum size, in bytes, that the input of one formula may grow to through macro
    /// substitution.
    pub max_buffer: usize,
    /// Prefix of the links that references point to.
    pub base_url: String,
    /// How tags, ids and links are formatted.
    #[cfg_attr(feature = "serde", serde(skip, default = "default_tag_format"))]
    pub tag_format: Box<dyn TagFormat>,
}

fn default_tag_format() -> Box<dyn TagFormat> {
    Box::new(DefaultTagFormat)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pretty_print: PrettyPrint::default(),
            macros: Vec::new(),
            xml_namespace: false,
            annotation: false,
            tags: TagMode::default(),
            tag_side: TagSide::default(),
            tag_indent: "0.8em".to_string(),
            use_label_ids: true,
            start_number: 0,
            max_macros: 10000,
            max_buffer: 5 * 1024,
            base_url: String::new(),
            tag_format: default_tag_format(),
        }
    }
}

/// This struct contains those fields from `Config` that only affect the output.
#[derive(Debug, Default)]
struct Flags {
    pretty_print: PrettyPrint,
    xml_namespace: bool,
    annotation: bool,
}

impl From<&Config> for Flags {
    fn from(config: &Config) -> Self {
        Self {
            pretty_print: config.pretty_print,
            xml_namespace: config.xml_namespace,
            annotation: config.annotation,
        }
    }
}

/// The result of translating one formula.
#[derive(Debug, Clone)]
pub struct Translation {
    /// The `math` element. If the translation failed, it holds a single `merror`.
    pub root: Node,
    pub error: Option<Box<TexError>>,
    /// The position of the formula among all formulas translated by the converter, so that
    /// the results of [`Converter::rerun_pending`] can be matched to the first results.
    pub index: usize,
}

/// A formula that referenced a label that was not defined yet.
#[derive(Debug)]
struct Pending {
    tex: String,
    display: MathDisplay,
    counter: usize,
    index: usize,
}

/// A converter that transforms TeX math into MathML trees.
#[derive(Debug)]
pub struct Converter {
    flags: Flags,
    ctx: ParseContext,
    start_number: usize,
    translated: usize,
    pending: Vec<Pending>,
}

impl Converter {
    /// Create a new converter with the given configuration.
    ///
    /// This function returns an error if one of the macros in the configuration is invalid.
    /// The error contains the parsing error, the macro index and the macro definition that
    /// caused the error.
    pub fn new(config: Config) -> Result<Self, (Box<TexError>, usize, String)> {
        let flags = Flags::from(&config);
        let defs = parse_custom_commands(config.macros)?;
        let mut tags = Numbering::new(
            config.tags,
            config.tag_format,
            config.tag_side,
            config.tag_indent,
            config.use_label_ids,
            config.base_url,
        );
        tags.reset(config.start_number);
        Ok(Converter {
            flags,
            ctx: ParseContext {
                defs,
                tags,
                budget: MacroBudget::new(config.max_macros),
                max_buffer: config.max_buffer,
            },
            start_number: config.start_number,
            translated: 0,
            pending: Vec::new(),
        })
    }

    /// Translate a formula into a `math` tree.
    ///
    /// Errors don't abort the translation: the tree then holds an `merror` element with the
    /// error message, and [`Translation::error`] is set.
    pub fn translate(&mut self, tex: &str, display: MathDisplay) -> Translation {
        let index = self.translated;
        self.translated += 1;
        self.run(tex, display, None, index)
    }

    /// Translate a formula, returning the error instead of an `merror` tree.
    pub fn try_translate(&mut self, tex: &str, display: MathDisplay) -> Result<Node, Box<TexError>> {
        let translation = self.translate(tex, display);
        match translation.error {
            Some(error) => Err(error),
            None => Ok(translation.root),
        }
    }

    /// Convert a formula to a MathML string.
    ///
    /// ```rust
    /// use tex2mml::{Config, Converter, MathDisplay};
    ///
    /// let mut converter = Converter::new(Config::default()).unwrap();
    /// let mathml = converter.convert(r"x^2", MathDisplay::Block).unwrap();
    /// assert_eq!(mathml, r#"<math display="block"><msup><mi>x</mi><mn>2</mn></msup></math>"#);
    /// ```
    pub fn convert(&mut self, tex: &str, display: MathDisplay) -> Result<String, Box<TexError>> {
        let root = self.try_translate(tex, display)?;
        Ok(self.to_mathml(&root))
    }

    /// Serialize a tree produced by this converter.
    pub fn to_mathml(&self, root: &Node) -> String {
        let block = root.attributes.get("display") == Some("block");
        let pretty_print = matches!(self.flags.pretty_print, PrettyPrint::Always)
            || (matches!(self.flags.pretty_print, PrettyPrint::Auto) && block);
        let mut output = String::new();
        // Writing to a `String` never fails.
        let _ = root.emit(&mut output, if pretty_print { 1 } else { 0 });
        output
    }

    /// Forget all equation numbers, labels and pending formulas. Numbering starts again after
    /// the configured start number. Macro definitions are kept.
    pub fn reset_equation_numbers(&mut self) {
        self.ctx.tags.reset(self.start_number);
        self.pending.clear();
    }

    /// Translate again all formulas that referenced labels that were unknown at the time, now
    /// that the labels are known. Equation numbers don't change.
    pub fn rerun_pending(&mut self) -> Vec<Translation> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|p| self.run(&p.tex, p.display, Some(p.counter), p.index))
            .collect()
    }

    /// The number of formulas waiting for [`Converter::rerun_pending`].
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn run(
        &mut self,
        tex: &str,
        display: MathDisplay,
        recompile: Option<usize>,
        index: usize,
    ) -> Translation {
        self.ctx.budget.reset();
        self.ctx
            .tags
            .start_equation(display == MathDisplay::Block, recompile);
        let result = parse(tex, &mut self.ctx);
        let redo = self.ctx.tags.finish_equation();
        let (content, error) = match result {
            Ok(node) => {
                if let Some(counter) = redo {
                    self.pending.push(Pending {
                        tex: tex.to_string(),
                        display,
                        counter,
                        index,
                    });
                }
                (node, None)
            }
            Err(error) => (Some(error_node(&error)), Some(error)),
        };
        Translation {
            root: self.math_root(content, tex, display),
            error,
            index,
        }
    }

    fn math_root(&self, content: Option<Node>, tex: &str, display: MathDisplay) -> Node {
        let content = content.unwrap_or_else(|| Node::new(Kind::InferredMrow));
        let content = if self.flags.annotation {
            let annotation = Node::token(Kind::Annotation, tex).set_attr("encoding", "application/x-tex");
            Node::with_children(Kind::Semantics, vec![content, annotation])
        } else {
            content
        };
        let mut math = Node::new(Kind::Math);
        if self.flags.xml_namespace {
            math.attributes
                .set("xmlns", "http://www.w3.org/1998/Math/MathML");
        }
        if display == MathDisplay::Block {
            math.attributes.set("display", "block");
        }
        math.push_child(content);
        math.inherit_style();
        math
    }
}

fn parse(tex: &str, ctx: &mut ParseContext) -> ParseResult<Option<Node>> {
    let (node, _) = TexParser::new(tex, Env::default(), false, ctx).parse()?;
    Ok(node.map(|mut node| {
        filters::apply(&mut node);
        node
    }))
}

fn error_node(error: &TexError) -> Node {
    let message = error.message();
    Node::with_children(Kind::Merror, vec![Node::token(Kind::Mtext, message.as_str())])
        .set_attr("data-mjx-error", message)
}

fn parse_custom_commands(
    macros: Vec<(String, String)>,
) -> Result<Definitions, (Box<TexError>, usize, String)> {
    let mut defs = Definitions::default();
    for (idx, (name, definition)) in macros.into_iter().enumerate() {
        let name = name.strip_prefix('\\').unwrap_or(&name).to_string();
        if !newcommand::is_valid_macro_name(&name) {
            return Err((
                TexError::new(TexErrKind::IllegalControlSequenceName(name.into())),
                idx,
                definition,
            ));
        }
        let arity = newcommand::arity(&definition);
        // Check the parameter references once, with placeholder arguments.
        let placeholders = vec![String::new(); arity];
        if let Err(err) = newcommand::substitute_args(&placeholders, &definition) {
            return Err((err, idx, definition));
        }
        defs.define(
            name,
            Definition::Meaning(Meaning::Macro(Macro::new(definition, arity))),
        );
    }
    Ok(defs)
}

static_assertions::assert_impl_all!(Converter: Send, Sync);
static_assertions::assert_impl_all!(Translation: Send, Sync);
