//! Resolution of control sequences: user definitions first, then the built-in tables.

use rustc_hash::FxHashMap;

use crate::commands::{COMMANDS, Command, MACROS};
use crate::error::{TexErrKind, err};
use crate::parser::ParseResult;
use crate::symbols::{self, MATHCHAR0MI, MATHCHAR0MO, MATHCHAR7, OpKind};

/// A macro body with `#1`..`#9` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Macro {
    pub template: String,
    pub arity: usize,
    /// Default for an optional first argument.
    pub default: Option<String>,
}

impl Macro {
    pub fn new(template: impl Into<String>, arity: usize) -> Self {
        Macro {
            template: template.into(),
            arity,
            default: None,
        }
    }
}

/// What a control sequence does.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Meaning {
    Macro(Macro),
    Command(Command),
    Identifier(char),
    /// An upright identifier, such as a capital Greek letter.
    Upright(char),
    Operator(char, OpKind),
    Delimiter(&'static str),
}

#[derive(Debug, Clone)]
pub(crate) enum Definition {
    Meaning(Meaning),
    /// `\let` to another user definition, followed every time the name is used.
    Alias(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UserEnvironment {
    pub begin: String,
    pub end: String,
    pub arity: usize,
    pub default: Option<String>,
}

/// Counts macro expansions so that recursive definitions terminate.
#[derive(Debug)]
pub(crate) struct MacroBudget {
    count: usize,
    max: usize,
}

impl MacroBudget {
    pub fn new(max: usize) -> Self {
        MacroBudget { count: 0, max }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn charge(&mut self) -> ParseResult<()> {
        self.count += 1;
        if self.count > self.max {
            return err(TexErrKind::MaxMacroSubstitutionExceeded);
        }
        Ok(())
    }
}

/// Commands and environments defined by the user. They shadow the built-in ones.
#[derive(Debug, Default)]
pub(crate) struct Definitions {
    commands: FxHashMap<String, Definition>,
    environments: FxHashMap<String, UserEnvironment>,
}

impl Definitions {
    pub fn define(&mut self, name: String, def: Definition) {
        self.commands.insert(name, def);
    }

    #[inline]
    pub fn is_user_defined(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn define_environment(&mut self, name: String, env: UserEnvironment) {
        self.environments.insert(name, env);
    }

    #[inline]
    pub fn environment(&self, name: &str) -> Option<&UserEnvironment> {
        self.environments.get(name)
    }

    /// What `\name` means right now. Every alias that is followed is charged to `budget`.
    pub fn lookup(&self, name: &str, budget: &mut MacroBudget) -> ParseResult<Option<Meaning>> {
        let mut name = name;
        loop {
            match self.commands.get(name) {
                Some(Definition::Meaning(meaning)) => return Ok(Some(meaning.clone())),
                Some(Definition::Alias(target)) => {
                    budget.charge()?;
                    name = target;
                }
                None => return Ok(builtin(name)),
            }
        }
    }
}

/// The built-in meaning of `\name`.
pub(crate) fn builtin(name: &str) -> Option<Meaning> {
    if let Some((template, arity)) = MACROS.get(name) {
        return Some(Meaning::Macro(Macro::new(*template, *arity)));
    }
    if let Some(command) = COMMANDS.get(name) {
        return Some(Meaning::Command(*command));
    }
    if let Some(c) = MATHCHAR0MI.get(name) {
        return Some(Meaning::Identifier(*c));
    }
    if let Some((c, kind)) = MATHCHAR0MO.get(name) {
        return Some(Meaning::Operator(*c, *kind));
    }
    if let Some(c) = MATHCHAR7.get(name) {
        return Some(Meaning::Upright(*c));
    }
    symbols::delimiter(&format!("\\{name}")).map(Meaning::Delimiter)
}
