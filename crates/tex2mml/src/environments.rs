//! `\begin` and `\end`, and the built-in environments.

use phf::phf_map;

use crate::error::{TexErrKind, err};
use crate::newcommand::substitute_args;
use crate::parser::{ParseResult, TexParser};
use crate::specifications::{parse_column_specification, parse_vertical_align};
use crate::stack_item::{ArrayItem, ArrayRows, ItemKind, StackItem};
use crate::symbols;

/// A table environment built from a column specification.
#[derive(Debug, PartialEq)]
pub(crate) struct ArrayEnv {
    pub open: &'static str,
    pub close: &'static str,
    /// `None` means the specification is read as an argument.
    pub align: Option<&'static str>,
    pub spacing: Option<&'static str>,
    pub vspacing: Option<&'static str>,
    /// `D`, `T` or `S` for display, text or script style.
    pub style: Option<char>,
    /// Whether a `[t]`/`[b]` argument is read.
    pub valign: bool,
}

/// An AMS alignment environment.
#[derive(Debug, PartialEq)]
pub(crate) struct EqnArrayEnv<'a> {
    pub numbered: bool,
    pub taggable: bool,
    pub align: &'a str,
    pub spacing: Option<&'a str>,
    pub vspacing: Option<&'a str>,
    pub display: bool,
    pub valign: bool,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Environment {
    Array(&'static ArrayEnv),
    EqnArray(&'static EqnArrayEnv<'static>),
    AlignAt { numbered: bool, taggable: bool },
    Equation { numbered: bool },
    Multline { numbered: bool },
}

const ARRAY: ArrayEnv = ArrayEnv {
    open: "",
    close: "",
    align: None,
    spacing: None,
    vspacing: None,
    style: None,
    valign: true,
};

const MATRIX: ArrayEnv = ArrayEnv {
    align: Some("c"),
    valign: false,
    ..ARRAY
};

const PMATRIX: ArrayEnv = ArrayEnv {
    open: "(",
    close: ")",
    ..MATRIX
};

const BMATRIX: ArrayEnv = ArrayEnv {
    open: "[",
    close: "]",
    ..MATRIX
};

const BRACE_MATRIX: ArrayEnv = ArrayEnv {
    open: "\\{",
    close: "\\}",
    ..MATRIX
};

const VMATRIX: ArrayEnv = ArrayEnv {
    open: "\\vert",
    close: "\\vert",
    ..MATRIX
};

const DOUBLE_VMATRIX: ArrayEnv = ArrayEnv {
    open: "\\Vert",
    close: "\\Vert",
    ..MATRIX
};

const SMALLMATRIX: ArrayEnv = ArrayEnv {
    spacing: Some("0.333em"),
    vspacing: Some(".2em"),
    style: Some('S'),
    ..MATRIX
};

const CASES: ArrayEnv = ArrayEnv {
    open: "\\{",
    close: ".",
    align: Some("ll"),
    vspacing: Some(".2em"),
    style: Some('T'),
    ..MATRIX
};

const SUBARRAY: ArrayEnv = ArrayEnv {
    spacing: Some("0.333em"),
    vspacing: Some(".1em"),
    style: Some('S'),
    valign: false,
    ..ARRAY
};

const ALIGN: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: true,
    taggable: true,
    align: "rl",
    spacing: Some("0em 2em"),
    vspacing: None,
    display: true,
    valign: false,
};

const ALIGN_STAR: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: false,
    ..ALIGN
};

const GATHER: EqnArrayEnv<'static> = EqnArrayEnv {
    align: "c",
    spacing: None,
    ..ALIGN
};

const GATHER_STAR: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: false,
    ..GATHER
};

const EQNARRAY: EqnArrayEnv<'static> = EqnArrayEnv {
    align: "rcl",
    spacing: Some("0em 0.278em"),
    vspacing: Some(".5em"),
    ..ALIGN
};

const EQNARRAY_STAR: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: false,
    ..EQNARRAY
};

const SPLIT: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: false,
    taggable: false,
    spacing: Some("0em"),
    ..ALIGN
};

const ALIGNED: EqnArrayEnv<'static> = EqnArrayEnv {
    numbered: false,
    taggable: false,
    vspacing: Some(".5em"),
    valign: true,
    ..ALIGN
};

const GATHERED: EqnArrayEnv<'static> = EqnArrayEnv {
    align: "c",
    spacing: None,
    ..ALIGNED
};

static ENVIRONMENTS: phf::Map<&'static str, Environment> = phf_map! {
    "array" => Environment::Array(&ARRAY),
    "matrix" => Environment::Array(&MATRIX),
    "pmatrix" => Environment::Array(&PMATRIX),
    "bmatrix" => Environment::Array(&BMATRIX),
    "Bmatrix" => Environment::Array(&BRACE_MATRIX),
    "vmatrix" => Environment::Array(&VMATRIX),
    "Vmatrix" => Environment::Array(&DOUBLE_VMATRIX),
    "smallmatrix" => Environment::Array(&SMALLMATRIX),
    "cases" => Environment::Array(&CASES),
    "subarray" => Environment::Array(&SUBARRAY),
    "equation" => Environment::Equation { numbered: true },
    "equation*" => Environment::Equation { numbered: false },
    "align" => Environment::EqnArray(&ALIGN),
    "align*" => Environment::EqnArray(&ALIGN_STAR),
    "gather" => Environment::EqnArray(&GATHER),
    "gather*" => Environment::EqnArray(&GATHER_STAR),
    "eqnarray" => Environment::EqnArray(&EQNARRAY),
    "eqnarray*" => Environment::EqnArray(&EQNARRAY_STAR),
    "split" => Environment::EqnArray(&SPLIT),
    "aligned" => Environment::EqnArray(&ALIGNED),
    "gathered" => Environment::EqnArray(&GATHERED),
    "alignat" => Environment::AlignAt { numbered: true, taggable: true },
    "alignat*" => Environment::AlignAt { numbered: false, taggable: true },
    "alignedat" => Environment::AlignAt { numbered: false, taggable: false },
    "multline" => Environment::Multline { numbered: true },
    "multline*" => Environment::Multline { numbered: false },
};

impl Environment {
    pub(crate) fn from_str(s: &str) -> Option<&'static Self> {
        ENVIRONMENTS.get(s)
    }
}

fn expand_align(spec: &str) -> String {
    spec.chars()
        .filter_map(tex2mml_tree::table::ColumnAlign::from_char)
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl TexParser<'_> {
    pub(super) fn begin(&mut self) -> ParseResult<()> {
        let name = self.cursor.get_arg("\\begin")?.trim().to_string();
        self.ctx.budget.charge()?;
        if let Some(user) = self.ctx.defs.environment(&name).cloned() {
            let (begin, end) = if user.arity > 0 {
                let context = format!("\\begin{{{name}}}");
                let mut args = Vec::with_capacity(user.arity);
                if let Some(default) = &user.default {
                    let arg = self.cursor.get_brackets(&context)?;
                    args.push(arg.unwrap_or_else(|| default.clone()));
                }
                while args.len() < user.arity {
                    args.push(self.cursor.get_arg(&context)?);
                }
                // The end code can't refer to the arguments.
                (substitute_args(&args, &user.begin)?, substitute_args(&[], &user.end)?)
            } else {
                (user.begin, user.end)
            };
            self.push(StackItem::new(ItemKind::Begin {
                name,
                end_def: Some(end),
            }))?;
            return self.cursor.splice(&begin);
        }
        let Some(env) = Environment::from_str(&name) else {
            return err(TexErrKind::UnknownEnvironment(name.into()));
        };
        match env {
            Environment::Array(spec) => self.array_env(name, spec),
            Environment::EqnArray(spec) => self.eqn_array_env(name, spec),
            Environment::AlignAt { numbered, taggable } => self.align_at_env(name, *numbered, *taggable),
            Environment::Equation { numbered } => self.equation_env(name, *numbered),
            Environment::Multline { numbered } => self.multline_env(name, *numbered),
        }
    }

    pub(super) fn end(&mut self) -> ParseResult<()> {
        let name = self.cursor.get_arg("\\end")?.trim().to_string();
        if let Some(end_def) = self.stack.take_end_def(&name) {
            self.ctx.budget.charge()?;
            return self.cursor.splice(&format!("{end_def}\\end{{{name}}}"));
        }
        if self.ctx.defs.environment(&name).is_none() && Environment::from_str(&name).is_none() {
            return err(TexErrKind::UnknownEnvironment(name.into()));
        }
        self.push(StackItem::new(ItemKind::End { name }))
    }

    fn push_begin(&mut self, name: &str) -> ParseResult<()> {
        self.push(StackItem::new(ItemKind::Begin {
            name: name.to_string(),
            end_def: None,
        }))
    }

    fn check_eqn_env(&mut self, name: &str) -> ParseResult<()> {
        if self.stack.global.eqnenv {
            return err(TexErrKind::ErroneousNesting(name.into()));
        }
        self.stack.global.eqnenv = true;
        Ok(())
    }

    fn array_env(&mut self, name: String, spec: &ArrayEnv) -> ParseResult<()> {
        let context = format!("\\begin{{{name}}}");
        let valign = if spec.valign {
            self.cursor.get_brackets(&context)?
        } else {
            None
        };
        let columns = match spec.align {
            Some(align) => parse_column_specification(align),
            None => parse_column_specification(&self.cursor.get_arg(&context)?),
        };
        let mut array = ArrayItem::new(ArrayRows::Plain);
        array.set_def("columnalign", columns.align);
        array.set_def("columnspacing", spec.spacing.unwrap_or("1em"));
        array.set_def("rowspacing", spec.vspacing.unwrap_or("4pt"));
        array.frame = columns.frame;
        array.dashed = columns.dashed;
        if let Some(lines) = columns.lines {
            array.set_def("columnlines", lines);
        }
        array.open = symbols::delimiter(spec.open).unwrap_or("");
        array.close = symbols::delimiter(spec.close).unwrap_or("");
        match spec.style {
            Some('D') => array.set_def("displaystyle", "true"),
            Some('S') => {
                array.set_def("displaystyle", "false");
                array.set_def("scriptlevel", "1");
            }
            Some(_) => array.set_def("displaystyle", "false"),
            None => {}
        }
        if let Some(align) = valign.as_deref().and_then(parse_vertical_align) {
            array.set_def("align", align);
        }
        self.push_begin(&name)?;
        self.push(StackItem::array(array))
    }

    fn eqn_array_env(&mut self, name: String, spec: &EqnArrayEnv<'_>) -> ParseResult<()> {
        let valign = if spec.valign {
            self.cursor.get_brackets(&format!("\\begin{{{name}}}"))?
        } else {
            None
        };
        self.eqn_array(name, spec, valign)
    }

    fn eqn_array(
        &mut self,
        name: String,
        spec: &EqnArrayEnv<'_>,
        valign: Option<String>,
    ) -> ParseResult<()> {
        if spec.taggable {
            self.check_eqn_env(&name)?;
        }
        self.push_begin(&name)?;
        self.ctx.tags.start(&name, spec.taggable, spec.numbered);
        let mut array = ArrayItem::new(ArrayRows::Ams {
            max_row: 0,
            taggable: spec.taggable,
        });
        if spec.display {
            array.set_def("displaystyle", "true");
        }
        array.set_def("columnalign", expand_align(spec.align));
        array.set_def("columnspacing", spec.spacing.unwrap_or("1em"));
        array.set_def("rowspacing", spec.vspacing.unwrap_or("3pt"));
        if spec.taggable {
            array.set_def("side", self.ctx.tags.side().as_str());
            array.set_def("minlabelspacing", self.ctx.tags.indent().to_string());
        }
        if let Some(align) = valign.as_deref().and_then(parse_vertical_align) {
            array.set_def("align", align);
        }
        self.push(StackItem::array(array))
    }

    fn align_at_env(&mut self, name: String, numbered: bool, taggable: bool) -> ParseResult<()> {
        let context = format!("\\begin{{{name}}}");
        let valign = if taggable {
            None
        } else {
            self.cursor.get_brackets(&context)?
        };
        let n = self.cursor.get_arg(&context)?;
        let n = n.trim();
        let columns = match n.parse::<usize>() {
            Ok(columns) if columns > 0 && n.bytes().all(|b| b.is_ascii_digit()) => columns,
            _ => return err(TexErrKind::PositiveIntegerArgumentRequired(context.into())),
        };
        let align = "rl".repeat(columns);
        let spacing = vec!["0em 0em"; columns].join(" ");
        let spec = EqnArrayEnv {
            numbered,
            taggable,
            align: &align,
            spacing: Some(&spacing),
            vspacing: None,
            display: true,
            valign: !taggable,
        };
        self.eqn_array(name, &spec, valign)
    }

    fn equation_env(&mut self, name: String, numbered: bool) -> ParseResult<()> {
        self.check_eqn_env(&name)?;
        self.push_begin(&name)?;
        self.ctx.tags.start("equation", true, numbered);
        self.push(StackItem::new(ItemKind::Equation { name }))
    }

    fn multline_env(&mut self, name: String, numbered: bool) -> ParseResult<()> {
        self.check_eqn_env(&name)?;
        self.push_begin(&name)?;
        self.ctx.tags.start("multline", true, numbered);
        let mut array = ArrayItem::new(ArrayRows::Multline { shove: None });
        array.set_def("displaystyle", "true");
        array.set_def("rowspacing", ".5em");
        array.set_def("columnspacing", "100%");
        array.set_def("width", "100%");
        array.set_def("side", self.ctx.tags.side().as_str());
        array.set_def("minlabelspacing", self.ctx.tags.indent().to_string());
        array.set_def("framespacing", "1em 0");
        self.push(StackItem::array(array))
    }
}
