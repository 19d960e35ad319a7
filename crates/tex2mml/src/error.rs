use std::fmt;

use strum_macros::IntoStaticStr;

/// An error that aborted the conversion of an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TexError(pub(crate) TexErrKind);

/// The kinds of errors. The variant name doubles as the stable error id.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[non_exhaustive]
pub enum TexErrKind {
    // Argument and group syntax.
    MissingArgument(Box<str>),
    ExtraCloseMissingOpen,
    MissingCloseBrace,
    MissingCloseBracket(Box<str>),
    MissingOrUnrecognizedDelimiter(Box<str>),
    MissingDimensionOrUnits(Box<str>),
    TokenNotFound { token: Box<str>, name: Box<str> },
    ExtraCloseLooking(Box<str>),
    // Scripts.
    DoubleExponent,
    DoubleSubscripts,
    DoubleExponentPrime,
    MissingScript,
    MissingOpenForSub,
    MissingOpenForSup,
    // Structure.
    ErroneousNesting(Box<str>),
    EnvBadEnd { begin: Box<str>, end: Box<str> },
    EnvMissingEnd(Box<str>),
    UnknownEnvironment(Box<str>),
    Misplaced(Box<str>),
    MissingBeginExtraEnd(Box<str>),
    MissingLeftOrExtraRight,
    ExtraLeftOrMissingRight,
    OrphanMiddle,
    ExtraOpenMissingClose,
    AmbiguousUseOf(Box<str>),
    MissingBoxFor(Box<str>),
    // Macros.
    UndefinedControlSequence(Box<str>),
    MaxMacroSubstitutionExceeded,
    MaxBufferSizeExceeded,
    IllegalMacroParameterReference,
    IllegalControlSequenceName(Box<str>),
    IllegalParamNumber(Box<str>),
    SequentialParam(Box<str>),
    CantUseHash,
    MissingCS(Box<str>),
    MissingReplacementString(Box<str>),
    // Equation numbering and AMS structures.
    MultipleLabel(Box<str>),
    MultipleTag,
    MultipleCommand(Box<str>),
    CommandMustComeAtBeginningOfLine(Box<str>),
    CommandOnlyAllowedInEnv { command: Box<str>, env: Box<str> },
    MultlineRowsMustHaveOneColumn,
    PositiveIntegerArgumentRequired(Box<str>),
    // Everything else.
    MisplacedLimits(Box<str>),
    BadMathStyleFor(Box<str>),
    MisplacedMoveRoot(Box<str>),
    MultipleMoveRoot(Box<str>),
    IntegerArg(Box<str>),
    MathNotTerminated,
    Internal,
}

impl TexErrKind {
    fn template(&self) -> (&'static str, [&str; 2]) {
        use TexErrKind::*;
        match self {
            MissingArgument(name) => ("Missing argument for %1", [&**name, ""]),
            ExtraCloseMissingOpen => ("Extra close brace or missing open brace", ["", ""]),
            MissingCloseBrace => ("Missing close brace", ["", ""]),
            MissingCloseBracket(name) => {
                ("Could not find closing ']' for argument to %1", [&**name, ""])
            }
            MissingOrUnrecognizedDelimiter(name) => {
                ("Missing or unrecognized delimiter for %1", [&**name, ""])
            }
            MissingDimensionOrUnits(name) => ("Missing dimension or its units for %1", [&**name, ""]),
            TokenNotFound { token, name } => ("Could not find %1 for %2", [&**token, &**name]),
            ExtraCloseLooking(token) => ("Extra close brace while looking for %1", [&**token, ""]),
            DoubleExponent => ("Double exponent: use braces to clarify", ["", ""]),
            DoubleSubscripts => ("Double subscripts: use braces to clarify", ["", ""]),
            DoubleExponentPrime => {
                ("Prime causes double exponent: use braces to clarify", ["", ""])
            }
            MissingScript => ("Missing superscript or subscript argument", ["", ""]),
            MissingOpenForSub => ("Missing open brace for subscript", ["", ""]),
            MissingOpenForSup => ("Missing open brace for superscript", ["", ""]),
            ErroneousNesting(env) => ("Erroneous nesting of equation structures in %1", [&**env, ""]),
            EnvBadEnd { begin, end } => (r"\begin{%1} ended with \end{%2}", [&**begin, &**end]),
            EnvMissingEnd(env) => (r"Missing \end{%1}", [&**env, ""]),
            UnknownEnvironment(env) => ("Unknown environment '%1'", [&**env, ""]),
            Misplaced(what) => ("Misplaced %1", [&**what, ""]),
            MissingBeginExtraEnd(env) => (r"Missing \begin{%1} or extra \end{%1}", [&**env, ""]),
            MissingLeftOrExtraRight => (r"Missing \left or extra \right", ["", ""]),
            ExtraLeftOrMissingRight => (r"Extra \left or missing \right", ["", ""]),
            OrphanMiddle => (r"Missing \left or extra \middle", ["", ""]),
            ExtraOpenMissingClose => ("Extra open brace or missing close brace", ["", ""]),
            AmbiguousUseOf(name) => ("Ambiguous use of %1", [&**name, ""]),
            MissingBoxFor(name) => ("Missing box for %1", [&**name, ""]),
            UndefinedControlSequence(name) => ("Undefined control sequence %1", [&**name, ""]),
            MaxMacroSubstitutionExceeded => (
                "Maximum macro substitution count exceeded; is there a recursive macro call?",
                ["", ""],
            ),
            MaxBufferSizeExceeded => (
                "Internal buffer size exceeded; is there a recursive macro call?",
                ["", ""],
            ),
            IllegalMacroParameterReference => ("Illegal macro parameter reference", ["", ""]),
            IllegalControlSequenceName(name) => {
                ("Illegal control sequence name for %1", [&**name, ""])
            }
            IllegalParamNumber(name) => {
                ("Illegal number of parameters specified in %1", [&**name, ""])
            }
            SequentialParam(name) => {
                ("Parameters for %1 must be numbered sequentially", [&**name, ""])
            }
            CantUseHash => (
                "You can't use 'macro parameter character #' in math mode",
                ["", ""],
            ),
            MissingCS(name) => ("%1 must be followed by a control sequence", [&**name, ""]),
            MissingReplacementString(name) => {
                ("Missing replacement string for definition of %1", [&**name, ""])
            }
            MultipleLabel(label) => ("Label '%1' multiply defined", [&**label, ""]),
            MultipleTag => (r"Multiple \tag", ["", ""]),
            MultipleCommand(name) => ("Multiple %1", [&**name, ""]),
            CommandMustComeAtBeginningOfLine(name) => {
                ("%1 must come at the beginning of the line", [&**name, ""])
            }
            CommandOnlyAllowedInEnv { command, env } => {
                ("%1 only allowed in %2 environment", [&**command, &**env])
            }
            MultlineRowsMustHaveOneColumn => {
                ("Multline rows must have exactly one column", ["", ""])
            }
            PositiveIntegerArgumentRequired(name) => {
                ("Argument to %1 must be a positive integer", [&**name, ""])
            }
            MisplacedLimits(name) => ("%1 is allowed only on operators", [&**name, ""]),
            BadMathStyleFor(name) => ("Bad math style for %1", [&**name, ""]),
            MisplacedMoveRoot(name) => ("%1 can appear only within a root", [&**name, ""]),
            MultipleMoveRoot(name) => ("Multiple use of %1", [&**name, ""]),
            IntegerArg(name) => ("The argument to %1 must be an integer", [&**name, ""]),
            MathNotTerminated => ("Math not terminated in text box", ["", ""]),
            Internal => ("Internal parser error", ["", ""]),
        }
    }
}

/// Replace `%1`, `%2`, ... in `template` by the corresponding entry of `args`.
/// `%%` stands for a literal percent sign; unknown placeholders are left alone.
pub fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(idx) = memchr::memchr(b'%', rest.as_bytes()) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        match after.as_bytes().first() {
            Some(b'%') => {
                out.push('%');
                rest = &after[1..];
            }
            Some(d @ b'1'..=b'9') => {
                let n = usize::from(d - b'1');
                match args.get(n) {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str(&rest[idx..idx + 2]),
                }
                rest = &after[1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl TexError {
    #[inline]
    pub(crate) fn new(kind: TexErrKind) -> Box<Self> {
        Box::new(TexError(kind))
    }

    /// The human-readable error message.
    pub fn message(&self) -> String {
        let (template, args) = self.0.template();
        substitute(template, &args)
    }

    /// A stable identifier for the kind of error, e.g. `"DoubleExponent"`.
    pub fn id(&self) -> &'static str {
        <&'static str>::from(&self.0)
    }

    pub fn kind(&self) -> &TexErrKind {
        &self.0
    }
}

impl fmt::Display for TexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for TexError {}

/// Shorthand for building a boxed error from a kind.
pub(crate) fn err<T>(kind: TexErrKind) -> Result<T, Box<TexError>> {
    Err(TexError::new(kind))
}
