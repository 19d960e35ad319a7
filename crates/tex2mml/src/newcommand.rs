//! User definitions: `\newcommand`, `\newenvironment`, `\def` and `\let`.

use crate::cursor::add_args;
use crate::dispatch::{self, Definition, Macro, Meaning, UserEnvironment};
use crate::error::{TexErrKind, err};
use crate::parser::{ParseResult, TexParser};
use crate::symbols;

/// Replace `#1`..`#9` in `template` by the arguments. `##` stands for `#`.
pub(crate) fn substitute_args(args: &[String], template: &str) -> ParseResult<String> {
    let mut result = String::new();
    let mut text = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                text.push(c);
                if let Some(next) = chars.next() {
                    text.push(next);
                }
            }
            '#' => match chars.next() {
                Some('#') => text.push('#'),
                next => {
                    let arg = next
                        .and_then(|d| d.to_digit(10))
                        .filter(|&n| n > 0)
                        .and_then(|n| args.get(n as usize - 1));
                    let Some(arg) = arg else {
                        return err(TexErrKind::IllegalMacroParameterReference);
                    };
                    result = add_args(&add_args(&result, &text), arg);
                    text.clear();
                }
            },
            _ => text.push(c),
        }
    }
    Ok(add_args(&result, &text))
}

/// Names of user macros: a single character, or a run of letters.
pub(crate) fn is_valid_macro_name(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(_), None) => true,
        _ => s.bytes().all(|b| b.is_ascii_alphabetic()),
    }
}

/// The number of arguments a macro body uses: the highest `#n` in it.
pub(crate) fn arity(template: &str) -> usize {
    let mut max = 0;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '#' => {
                if let Some(n) = chars.next().and_then(|d| d.to_digit(10)) {
                    max = max.max(n as usize);
                }
            }
            _ => {}
        }
    }
    max
}

impl TexParser<'_> {
    /// `\newcommand{\name}[n][default]{body}`, and `\renewcommand`.
    pub(super) fn new_command(&mut self, name: &str) -> ParseResult<()> {
        let cs = self.cs_name_arg(name)?;
        let arity = self.arg_count(name)?;
        let default = self.cursor.get_brackets(name)?;
        let template = self.cursor.get_arg(name)?;
        self.ctx.defs.define(
            cs,
            Definition::Meaning(Meaning::Macro(Macro {
                template,
                arity,
                default,
            })),
        );
        Ok(())
    }

    /// `\newenvironment{name}[n][default]{begin}{end}`, and `\renewenvironment`.
    pub(super) fn new_environment(&mut self, name: &str) -> ParseResult<()> {
        let env = self.cursor.get_arg(name)?.trim().to_string();
        let arity = self.arg_count(name)?;
        let default = self.cursor.get_brackets(name)?;
        let begin = self.cursor.get_arg(name)?;
        let end = self.cursor.get_arg(name)?;
        self.ctx.defs.define_environment(
            env,
            UserEnvironment {
                begin,
                end,
                arity,
                default,
            },
        );
        Ok(())
    }

    /// `\def\name#1#2{body}`. Parameters must be numbered in order and undelimited.
    pub(super) fn def(&mut self, name: &str) -> ParseResult<()> {
        let cs = self.cs_name(name)?;
        let mut arity = 0;
        loop {
            match self.cursor.next_non_space() {
                Some('{') => break,
                Some('#') => {
                    self.cursor.next_char();
                    match self.cursor.next_char().and_then(|d| d.to_digit(10)) {
                        Some(n) if n as usize == arity + 1 => arity += 1,
                        Some(n) if n > 0 => {
                            return err(TexErrKind::SequentialParam(format!("\\{cs}").into()));
                        }
                        _ => return err(TexErrKind::IllegalMacroParameterReference),
                    }
                }
                Some(_) => return err(TexErrKind::IllegalParamNumber(name.into())),
                None => return err(TexErrKind::MissingReplacementString(name.into())),
            }
        }
        let template = self.cursor.get_arg(name)?;
        self.ctx.defs.define(
            cs,
            Definition::Meaning(Meaning::Macro(Macro::new(template, arity))),
        );
        Ok(())
    }

    /// `\let\name=\other` or `\let\name=c`.
    ///
    /// Letting to a user definition makes an alias that follows later redefinitions of
    /// it; letting to a built-in copies what the built-in means.
    pub(super) fn let_(&mut self, name: &str) -> ParseResult<()> {
        let cs = self.cs_name(name)?;
        let mut next = self.cursor.next_non_space();
        if next == Some('=') {
            self.cursor.next_char();
            next = self.cursor.next_non_space();
        }
        let definition = match next {
            Some('\\') => {
                let target = self.cs_name(name)?;
                if self.ctx.defs.is_user_defined(&target) {
                    Definition::Alias(target)
                } else {
                    match dispatch::builtin(&target) {
                        Some(meaning) => Definition::Meaning(meaning),
                        None => return Ok(()),
                    }
                }
            }
            Some(c) => {
                self.cursor.next_char();
                let text = c.to_string();
                Definition::Meaning(match symbols::delimiter(&text) {
                    Some(delim) => Meaning::Delimiter(delim),
                    None => Meaning::Macro(Macro::new(text, 0)),
                })
            }
            None => Definition::Meaning(Meaning::Macro(Macro::new("", 0))),
        };
        self.ctx.defs.define(cs, definition);
        Ok(())
    }

    /// A control sequence that must come next, without its backslash.
    fn cs_name(&mut self, name: &str) -> ParseResult<String> {
        if self.cursor.next_non_space() != Some('\\') {
            return err(TexErrKind::MissingCS(name.into()));
        }
        let cs = self.cursor.get_arg(name)?;
        Ok(cs.trim()[1..].to_string())
    }

    /// The name argument of `\newcommand`, with or without its backslash.
    fn cs_name_arg(&mut self, name: &str) -> ParseResult<String> {
        let arg = self.cursor.get_arg(name)?;
        let arg = arg.trim();
        let cs = arg.strip_prefix('\\').unwrap_or(arg);
        if !is_valid_macro_name(cs) {
            return err(TexErrKind::IllegalControlSequenceName(name.into()));
        }
        Ok(cs.to_string())
    }

    fn arg_count(&mut self, name: &str) -> ParseResult<usize> {
        match self.cursor.get_brackets(name)? {
            None => Ok(0),
            Some(n) => match n.trim() {
                "" => Ok(0),
                n if n.bytes().all(|b| b.is_ascii_digit()) => {
                    n.parse().or_else(|_| err(TexErrKind::IllegalParamNumber(name.into())))
                }
                _ => err(TexErrKind::IllegalParamNumber(name.into())),
            },
        }
    }
}
