//! The built-in control sequences that are handled by code, and the ones that are
//! defined as macro templates.

use phf::phf_map;
use tex2mml_tree::TexClass;
use tex2mml_tree::table::{ColumnAlign, LineType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OverKind {
    Over,
    Atop,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OverDelims {
    None,
    /// `\overwithdelims` and friends read two delimiters.
    Read,
    /// `\choose` and friends.
    Fixed(&'static str, &'static str),
}

/// Parameters of the plain TeX matrix macros (`\matrix`, `\cases`, ...).
#[derive(Debug, PartialEq)]
pub(crate) struct MatrixSpec {
    pub open: &'static str,
    pub close: &'static str,
    pub align: Option<&'static str>,
    pub spacing: Option<&'static str>,
    pub vspacing: Option<&'static str>,
    pub display: bool,
    /// The label side, for the numbered variants.
    pub numbered: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    // Fractions and roots.
    Frac,
    Genfrac,
    Over(OverKind, OverDelims),
    Sqrt,
    Root,
    LeftRoot,
    UpRoot,
    // Delimiters.
    Left,
    Right,
    Middle,
    Big(f64, TexClass),
    // Operators.
    NamedFn,
    NamedOp(&'static str),
    Limits(bool),
    OperatorName,
    // Fonts, styles and color.
    MathFont(&'static str),
    SetFont(&'static str),
    SetStyle(bool, u8),
    SetSize(f64),
    Color,
    TextColor,
    // Text.
    /// A text box: the script level it is set in, and its font.
    Text(Option<u8>, Option<&'static str>),
    FBox,
    Nbsp,
    // Accents and stacking.
    Accent(char, bool),
    UnderOver(char, bool),
    Overset,
    Underset,
    Atom(TexClass),
    // Boxes and positioning.
    Lap(bool),
    Phantom(bool, bool),
    Smash,
    Href,
    MathChoice,
    Raise(bool),
    MoveLeft(bool),
    // Spacing.
    Spacer(f64),
    Skip,
    // Negation and dots.
    Not,
    Dots,
    // Tables.
    CrLaTeX,
    Cr,
    HLine(LineType),
    HFill,
    Begin,
    End,
    Matrix(&'static MatrixSpec),
    Shove(ColumnAlign),
    // Equation numbering.
    Label,
    Ref(bool),
    Tag,
    NoTag,
    // Definitions.
    NewCommand,
    NewEnvironment,
    Def,
    Let,
}

const MATRIX: MatrixSpec = MatrixSpec {
    open: "",
    close: "",
    align: None,
    spacing: None,
    vspacing: None,
    display: false,
    numbered: None,
};

const PMATRIX: MatrixSpec = MatrixSpec {
    open: "(",
    close: ")",
    ..MATRIX
};

const CASES: MatrixSpec = MatrixSpec {
    open: "{",
    close: "",
    align: Some("left left"),
    vspacing: Some(".1em"),
    ..MATRIX
};

const EQALIGN: MatrixSpec = MatrixSpec {
    align: Some("right left"),
    spacing: Some("0.278em"),
    vspacing: Some(".5em"),
    display: true,
    ..MATRIX
};

const EQALIGNNO: MatrixSpec = MatrixSpec {
    align: Some("right left"),
    spacing: Some("0.278em"),
    vspacing: Some(".5em"),
    display: true,
    numbered: Some("right"),
    ..MATRIX
};

const LEQALIGNNO: MatrixSpec = MatrixSpec {
    numbered: Some("left"),
    ..EQALIGNNO
};

const DISPLAYLINES: MatrixSpec = MatrixSpec {
    align: Some("center"),
    vspacing: Some(".5em"),
    display: true,
    ..MATRIX
};

pub(crate) static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "frac" => Command::Frac,
    "genfrac" => Command::Genfrac,
    "over" => Command::Over(OverKind::Over, OverDelims::None),
    "atop" => Command::Over(OverKind::Atop, OverDelims::None),
    "above" => Command::Over(OverKind::Above, OverDelims::None),
    "overwithdelims" => Command::Over(OverKind::Over, OverDelims::Read),
    "atopwithdelims" => Command::Over(OverKind::Atop, OverDelims::Read),
    "abovewithdelims" => Command::Over(OverKind::Above, OverDelims::Read),
    "choose" => Command::Over(OverKind::Atop, OverDelims::Fixed("(", ")")),
    "brack" => Command::Over(OverKind::Atop, OverDelims::Fixed("[", "]")),
    "brace" => Command::Over(OverKind::Atop, OverDelims::Fixed("{", "}")),
    "sqrt" => Command::Sqrt,
    "root" => Command::Root,
    "leftroot" => Command::LeftRoot,
    "uproot" => Command::UpRoot,

    "left" => Command::Left,
    "right" => Command::Right,
    "middle" => Command::Middle,
    "big" => Command::Big(1.2, TexClass::Ord),
    "Big" => Command::Big(1.623, TexClass::Ord),
    "bigg" => Command::Big(2.047, TexClass::Ord),
    "Bigg" => Command::Big(2.470, TexClass::Ord),
    "bigl" => Command::Big(1.2, TexClass::Open),
    "Bigl" => Command::Big(1.623, TexClass::Open),
    "biggl" => Command::Big(2.047, TexClass::Open),
    "Biggl" => Command::Big(2.470, TexClass::Open),
    "bigr" => Command::Big(1.2, TexClass::Close),
    "Bigr" => Command::Big(1.623, TexClass::Close),
    "biggr" => Command::Big(2.047, TexClass::Close),
    "Biggr" => Command::Big(2.470, TexClass::Close),
    "bigm" => Command::Big(1.2, TexClass::Rel),
    "Bigm" => Command::Big(1.623, TexClass::Rel),
    "biggm" => Command::Big(2.047, TexClass::Rel),
    "Biggm" => Command::Big(2.470, TexClass::Rel),

    "sin" => Command::NamedFn, "cos" => Command::NamedFn, "tan" => Command::NamedFn,
    "cot" => Command::NamedFn, "sec" => Command::NamedFn, "csc" => Command::NamedFn,
    "sinh" => Command::NamedFn, "cosh" => Command::NamedFn, "tanh" => Command::NamedFn,
    "coth" => Command::NamedFn, "arcsin" => Command::NamedFn, "arccos" => Command::NamedFn,
    "arctan" => Command::NamedFn, "exp" => Command::NamedFn, "log" => Command::NamedFn,
    "ln" => Command::NamedFn, "lg" => Command::NamedFn, "ker" => Command::NamedFn,
    "hom" => Command::NamedFn, "dim" => Command::NamedFn, "arg" => Command::NamedFn,
    "deg" => Command::NamedFn,
    "lim" => Command::NamedOp("lim"),
    "limsup" => Command::NamedOp("lim\u{2006}sup"),
    "liminf" => Command::NamedOp("lim\u{2006}inf"),
    "max" => Command::NamedOp("max"),
    "min" => Command::NamedOp("min"),
    "sup" => Command::NamedOp("sup"),
    "inf" => Command::NamedOp("inf"),
    "det" => Command::NamedOp("det"),
    "Pr" => Command::NamedOp("Pr"),
    "gcd" => Command::NamedOp("gcd"),
    "limits" => Command::Limits(true),
    "nolimits" => Command::Limits(false),
    "operatorname" => Command::OperatorName,

    "mathrm" => Command::MathFont("normal"),
    "mathup" => Command::MathFont("normal"),
    "mathbf" => Command::MathFont("bold"),
    "mathit" => Command::MathFont("italic"),
    "mathsf" => Command::MathFont("sans-serif"),
    "mathtt" => Command::MathFont("monospace"),
    "mathcal" => Command::MathFont("script"),
    "mathscr" => Command::MathFont("script"),
    "mathbb" => Command::MathFont("double-struck"),
    "mathfrak" => Command::MathFont("fraktur"),
    "boldsymbol" => Command::MathFont("bold-italic"),
    "rm" => Command::SetFont("normal"),
    "bf" => Command::SetFont("bold"),
    "it" => Command::SetFont("italic"),
    "sf" => Command::SetFont("sans-serif"),
    "tt" => Command::SetFont("monospace"),
    "cal" => Command::SetFont("script"),
    "displaystyle" => Command::SetStyle(true, 0),
    "textstyle" => Command::SetStyle(false, 0),
    "scriptstyle" => Command::SetStyle(false, 1),
    "scriptscriptstyle" => Command::SetStyle(false, 2),
    "tiny" => Command::SetSize(0.5),
    "Tiny" => Command::SetSize(0.6),
    "scriptsize" => Command::SetSize(0.7),
    "small" => Command::SetSize(0.85),
    "normalsize" => Command::SetSize(1.0),
    "large" => Command::SetSize(1.2),
    "Large" => Command::SetSize(1.44),
    "LARGE" => Command::SetSize(1.73),
    "huge" => Command::SetSize(2.07),
    "Huge" => Command::SetSize(2.49),
    "color" => Command::Color,
    "textcolor" => Command::TextColor,

    "text" => Command::Text(None, None),
    "mbox" => Command::Text(Some(0), None),
    "hbox" => Command::Text(Some(0), None),
    "textrm" => Command::Text(None, Some("normal")),
    "textup" => Command::Text(None, Some("normal")),
    "textbf" => Command::Text(None, Some("bold")),
    "textit" => Command::Text(None, Some("italic")),
    "textsf" => Command::Text(None, Some("sans-serif")),
    "texttt" => Command::Text(None, Some("monospace")),
    "fbox" => Command::FBox,
    " " => Command::Nbsp,
    "nobreakspace" => Command::Nbsp,

    "hat" => Command::Accent('\u{02C6}', false),
    "check" => Command::Accent('\u{02C7}', false),
    "tilde" => Command::Accent('\u{02DC}', false),
    "acute" => Command::Accent('\u{00B4}', false),
    "grave" => Command::Accent('\u{0060}', false),
    "dot" => Command::Accent('\u{02D9}', false),
    "ddot" => Command::Accent('\u{00A8}', false),
    "breve" => Command::Accent('\u{02D8}', false),
    "bar" => Command::Accent('\u{02C9}', false),
    "vec" => Command::Accent('\u{2192}', false),
    "mathring" => Command::Accent('\u{02DA}', false),
    "widehat" => Command::Accent('\u{02C6}', true),
    "widetilde" => Command::Accent('\u{02DC}', true),
    "overline" => Command::UnderOver('\u{2015}', false),
    "underline" => Command::UnderOver('\u{2015}', false),
    "overbrace" => Command::UnderOver('\u{23DE}', true),
    "underbrace" => Command::UnderOver('\u{23DF}', true),
    "overrightarrow" => Command::UnderOver('\u{2192}', false),
    "underrightarrow" => Command::UnderOver('\u{2192}', false),
    "overleftarrow" => Command::UnderOver('\u{2190}', false),
    "underleftarrow" => Command::UnderOver('\u{2190}', false),
    "overleftrightarrow" => Command::UnderOver('\u{2194}', false),
    "underleftrightarrow" => Command::UnderOver('\u{2194}', false),
    "overset" => Command::Overset,
    "underset" => Command::Underset,
    "mathord" => Command::Atom(TexClass::Ord),
    "mathop" => Command::Atom(TexClass::Op),
    "mathbin" => Command::Atom(TexClass::Bin),
    "mathrel" => Command::Atom(TexClass::Rel),
    "mathopen" => Command::Atom(TexClass::Open),
    "mathclose" => Command::Atom(TexClass::Close),
    "mathpunct" => Command::Atom(TexClass::Punct),
    "mathinner" => Command::Atom(TexClass::Inner),

    "llap" => Command::Lap(true),
    "rlap" => Command::Lap(false),
    "phantom" => Command::Phantom(true, true),
    "vphantom" => Command::Phantom(true, false),
    "hphantom" => Command::Phantom(false, true),
    "smash" => Command::Smash,
    "href" => Command::Href,
    "mathchoice" => Command::MathChoice,
    "raise" => Command::Raise(true),
    "lower" => Command::Raise(false),
    "moveleft" => Command::MoveLeft(true),
    "moveright" => Command::MoveLeft(false),

    "," => Command::Spacer(3.0 / 18.0),
    ":" => Command::Spacer(4.0 / 18.0),
    ">" => Command::Spacer(4.0 / 18.0),
    ";" => Command::Spacer(5.0 / 18.0),
    "!" => Command::Spacer(-3.0 / 18.0),
    "thinspace" => Command::Spacer(3.0 / 18.0),
    "medspace" => Command::Spacer(4.0 / 18.0),
    "thickspace" => Command::Spacer(5.0 / 18.0),
    "negthinspace" => Command::Spacer(-3.0 / 18.0),
    "enspace" => Command::Spacer(0.5),
    "quad" => Command::Spacer(1.0),
    "qquad" => Command::Spacer(2.0),
    "hspace" => Command::Skip,
    "hskip" => Command::Skip,
    "kern" => Command::Skip,
    "mskip" => Command::Skip,
    "mkern" => Command::Skip,

    "not" => Command::Not,
    "dots" => Command::Dots,

    "\\" => Command::CrLaTeX,
    "cr" => Command::Cr,
    "hline" => Command::HLine(LineType::Solid),
    "hdashline" => Command::HLine(LineType::Dashed),
    "hfill" => Command::HFill,
    "begin" => Command::Begin,
    "end" => Command::End,
    "matrix" => Command::Matrix(&MATRIX),
    "pmatrix" => Command::Matrix(&PMATRIX),
    "cases" => Command::Matrix(&CASES),
    "eqalign" => Command::Matrix(&EQALIGN),
    "eqalignno" => Command::Matrix(&EQALIGNNO),
    "leqalignno" => Command::Matrix(&LEQALIGNNO),
    "displaylines" => Command::Matrix(&DISPLAYLINES),
    "shoveleft" => Command::Shove(ColumnAlign::Left),
    "shoveright" => Command::Shove(ColumnAlign::Right),

    "label" => Command::Label,
    "ref" => Command::Ref(false),
    "eqref" => Command::Ref(true),
    "tag" => Command::Tag,
    "notag" => Command::NoTag,
    "nonumber" => Command::NoTag,

    "newcommand" => Command::NewCommand,
    "renewcommand" => Command::NewCommand,
    "newenvironment" => Command::NewEnvironment,
    "renewenvironment" => Command::NewEnvironment,
    "def" => Command::Def,
    "let" => Command::Let,
};

/// Built-in commands that expand to other TeX: `(template, number of arguments)`.
pub(crate) static MACROS: phf::Map<&'static str, (&'static str, usize)> = phf_map! {
    "iff" => (r"\;\Longleftrightarrow\;", 0),
    "implies" => (r"\;\Longrightarrow\;", 0),
    "impliedby" => (r"\;\Longleftarrow\;", 0),
    "ne" => (r"\neq", 0),
    "le" => (r"\leq", 0),
    "ge" => (r"\geq", 0),
    "bmod" => (r"\mathbin{\mathrm{mod}}", 0),
    "pmod" => (r"\quad(\mathrm{mod}\,\,#1)", 1),
    "mod" => (r"\mathchoice{\kern18mu}{\kern12mu}{\kern12mu}{\kern12mu}\mathrm{mod}\,\,#1", 1),
    "stackrel" => (r"\mathrel{\mathop{#2}\limits^{#1}}", 2),
    "dfrac" => (r"\genfrac{}{}{}{0}{#1}{#2}", 2),
    "tfrac" => (r"\genfrac{}{}{}{1}{#1}{#2}", 2),
    "binom" => (r"\genfrac(){0}{}{#1}{#2}", 2),
    "dbinom" => (r"\genfrac(){0}{0}{#1}{#2}", 2),
    "tbinom" => (r"\genfrac(){0}{1}{#1}{#2}", 2),
    "boxed" => (r"\fbox{$\displaystyle{#1}$}", 1),
    "mathstrut" => (r"\vphantom{(}", 0),
};
