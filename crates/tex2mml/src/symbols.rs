//! Static character tables: identifiers, operators, delimiters and remappings.

use phf::phf_map;
use tex2mml_tree::TexClass;

/// Control sequences that produce an italic identifier.
pub(crate) static MATHCHAR0MI: phf::Map<&'static str, char> = phf_map! {
    "alpha" => 'α', "beta" => 'β', "gamma" => 'γ', "delta" => 'δ',
    "epsilon" => 'ϵ', "zeta" => 'ζ', "eta" => 'η', "theta" => 'θ',
    "iota" => 'ι', "kappa" => 'κ', "lambda" => 'λ', "mu" => 'μ',
    "nu" => 'ν', "xi" => 'ξ', "omicron" => 'ο', "pi" => 'π',
    "rho" => 'ρ', "sigma" => 'σ', "tau" => 'τ', "upsilon" => 'υ',
    "phi" => 'ϕ', "chi" => 'χ', "psi" => 'ψ', "omega" => 'ω',
    "varepsilon" => 'ε', "vartheta" => 'ϑ', "varpi" => 'ϖ', "varrho" => 'ϱ',
    "varsigma" => 'ς', "varphi" => 'φ',
    "S" => '§', "aleph" => 'ℵ', "hbar" => 'ℏ', "imath" => 'ı', "jmath" => 'ȷ',
    "ell" => 'ℓ', "wp" => '℘', "Re" => 'ℜ', "Im" => 'ℑ', "partial" => '∂',
    "infty" => '∞', "prime" => '′', "emptyset" => '∅', "nabla" => '∇',
    "top" => '⊤', "bot" => '⊥', "angle" => '∠', "triangle" => '△',
    "forall" => '∀', "exists" => '∃', "neg" => '¬', "lnot" => '¬',
    "flat" => '♭', "natural" => '♮', "sharp" => '♯', "clubsuit" => '♣',
    "diamondsuit" => '♢', "heartsuit" => '♡', "spadesuit" => '♠',
};

/// Control sequences that produce an upright identifier.
pub(crate) static MATHCHAR7: phf::Map<&'static str, char> = phf_map! {
    "Gamma" => 'Γ', "Delta" => 'Δ', "Theta" => 'Θ', "Lambda" => 'Λ',
    "Xi" => 'Ξ', "Pi" => 'Π', "Sigma" => 'Σ', "Upsilon" => 'Υ',
    "Phi" => 'Φ', "Psi" => 'Ψ', "Omega" => 'Ω',
    "_" => '_', "#" => '#', "$" => '$', "%" => '%', "&" => '&',
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OpKind {
    Normal,
    /// Large operator whose scripts become limits in display style.
    Limits,
    /// Large operator that keeps its scripts at the side.
    NoLimits,
}

/// Control sequences that produce an operator.
pub(crate) static MATHCHAR0MO: phf::Map<&'static str, (char, OpKind)> = phf_map! {
    "sum" => ('∑', OpKind::Limits), "prod" => ('∏', OpKind::Limits),
    "coprod" => ('∐', OpKind::Limits), "bigcup" => ('⋃', OpKind::Limits),
    "bigcap" => ('⋂', OpKind::Limits), "bigvee" => ('⋁', OpKind::Limits),
    "bigwedge" => ('⋀', OpKind::Limits), "bigoplus" => ('⨁', OpKind::Limits),
    "bigotimes" => ('⨂', OpKind::Limits), "bigodot" => ('⨀', OpKind::Limits),
    "biguplus" => ('⨄', OpKind::Limits), "bigsqcup" => ('⨆', OpKind::Limits),
    "int" => ('∫', OpKind::NoLimits), "iint" => ('∬', OpKind::NoLimits),
    "iiint" => ('∭', OpKind::NoLimits), "oint" => ('∮', OpKind::NoLimits),
    "pm" => ('±', OpKind::Normal), "mp" => ('∓', OpKind::Normal),
    "times" => ('×', OpKind::Normal), "div" => ('÷', OpKind::Normal),
    "cdot" => ('⋅', OpKind::Normal), "ast" => ('∗', OpKind::Normal),
    "star" => ('⋆', OpKind::Normal), "circ" => ('∘', OpKind::Normal),
    "bullet" => ('∙', OpKind::Normal), "cap" => ('∩', OpKind::Normal),
    "cup" => ('∪', OpKind::Normal), "sqcap" => ('⊓', OpKind::Normal),
    "sqcup" => ('⊔', OpKind::Normal), "vee" => ('∨', OpKind::Normal),
    "wedge" => ('∧', OpKind::Normal), "lor" => ('∨', OpKind::Normal),
    "land" => ('∧', OpKind::Normal), "setminus" => ('∖', OpKind::Normal),
    "oplus" => ('⊕', OpKind::Normal), "ominus" => ('⊖', OpKind::Normal),
    "otimes" => ('⊗', OpKind::Normal), "oslash" => ('⊘', OpKind::Normal),
    "odot" => ('⊙', OpKind::Normal), "uplus" => ('⊎', OpKind::Normal),
    "wr" => ('≀', OpKind::Normal), "diamond" => ('⋄', OpKind::Normal),
    "dagger" => ('†', OpKind::Normal), "ddagger" => ('‡', OpKind::Normal),
    "amalg" => ('⨿', OpKind::Normal), "bigtriangleup" => ('△', OpKind::Normal),
    "bigtriangledown" => ('▽', OpKind::Normal),
    "leq" => ('≤', OpKind::Normal),
    "geq" => ('≥', OpKind::Normal),
    "neq" => ('≠', OpKind::Normal),
    "equiv" => ('≡', OpKind::Normal), "sim" => ('∼', OpKind::Normal),
    "simeq" => ('≃', OpKind::Normal), "approx" => ('≈', OpKind::Normal),
    "cong" => ('≅', OpKind::Normal), "asymp" => ('≍', OpKind::Normal),
    "propto" => ('∝', OpKind::Normal), "subset" => ('⊂', OpKind::Normal),
    "supset" => ('⊃', OpKind::Normal), "subseteq" => ('⊆', OpKind::Normal),
    "supseteq" => ('⊇', OpKind::Normal), "in" => ('∈', OpKind::Normal),
    "ni" => ('∋', OpKind::Normal), "owns" => ('∋', OpKind::Normal),
    "notin" => ('∉', OpKind::Normal), "prec" => ('≺', OpKind::Normal),
    "succ" => ('≻', OpKind::Normal), "preceq" => ('⪯', OpKind::Normal),
    "succeq" => ('⪰', OpKind::Normal), "ll" => ('≪', OpKind::Normal),
    "gg" => ('≫', OpKind::Normal), "perp" => ('⊥', OpKind::Normal),
    "mid" => ('∣', OpKind::Normal), "parallel" => ('∥', OpKind::Normal),
    "models" => ('⊨', OpKind::Normal), "vdash" => ('⊢', OpKind::Normal),
    "dashv" => ('⊣', OpKind::Normal), "doteq" => ('≐', OpKind::Normal),
    "bowtie" => ('⋈', OpKind::Normal), "smile" => ('⌣', OpKind::Normal),
    "frown" => ('⌢', OpKind::Normal), "sqsubseteq" => ('⊑', OpKind::Normal),
    "sqsupseteq" => ('⊒', OpKind::Normal),
    "to" => ('→', OpKind::Normal), "rightarrow" => ('→', OpKind::Normal),
    "leftarrow" => ('←', OpKind::Normal), "gets" => ('←', OpKind::Normal),
    "leftrightarrow" => ('↔', OpKind::Normal), "Rightarrow" => ('⇒', OpKind::Normal),
    "Leftarrow" => ('⇐', OpKind::Normal), "Leftrightarrow" => ('⇔', OpKind::Normal),
    "longrightarrow" => ('⟶', OpKind::Normal), "longleftarrow" => ('⟵', OpKind::Normal),
    "longleftrightarrow" => ('⟷', OpKind::Normal),
    "Longrightarrow" => ('⟹', OpKind::Normal), "Longleftarrow" => ('⟸', OpKind::Normal),
    "Longleftrightarrow" => ('⟺', OpKind::Normal), "mapsto" => ('↦', OpKind::Normal),
    "longmapsto" => ('⟼', OpKind::Normal), "hookrightarrow" => ('↪', OpKind::Normal),
    "hookleftarrow" => ('↩', OpKind::Normal), "nearrow" => ('↗', OpKind::Normal),
    "searrow" => ('↘', OpKind::Normal), "swarrow" => ('↙', OpKind::Normal),
    "nwarrow" => ('↖', OpKind::Normal),
    "colon" => (':', OpKind::Normal), "ldotp" => ('.', OpKind::Normal),
    "cdotp" => ('⋅', OpKind::Normal), "ldots" => ('…', OpKind::Normal),
    "cdots" => ('⋯', OpKind::Normal), "vdots" => ('⋮', OpKind::Normal),
    "ddots" => ('⋱', OpKind::Normal), "surd" => ('√', OpKind::Normal),
};

/// Delimiters accepted by `\left`, `\right`, `\big` and friends, keyed by how they are
/// written. The null delimiter `.` maps to the empty string.
pub(crate) static DELIMITERS: phf::Map<&'static str, &'static str> = phf_map! {
    "(" => "(", ")" => ")", "[" => "[", "]" => "]", "<" => "\u{27E8}", ">" => "\u{27E9}",
    "/" => "/", "|" => "|", "." => "",
    "\\\\" => "\\", "\\backslash" => "\\", "\\/" => "/",
    "\\{" => "{", "\\}" => "}", "\\lbrace" => "{", "\\rbrace" => "}",
    "\\lbrack" => "[", "\\rbrack" => "]",
    "\\langle" => "\u{27E8}", "\\rangle" => "\u{27E9}",
    "\\lceil" => "\u{2308}", "\\rceil" => "\u{2309}",
    "\\lfloor" => "\u{230A}", "\\rfloor" => "\u{230B}",
    "\\|" => "\u{2016}", "\\Vert" => "\u{2016}", "\\vert" => "|",
    "\\lvert" => "|", "\\rvert" => "|", "\\lVert" => "\u{2016}", "\\rVert" => "\u{2016}",
    "\\uparrow" => "\u{2191}", "\\downarrow" => "\u{2193}", "\\updownarrow" => "\u{2195}",
    "\\Uparrow" => "\u{21D1}", "\\Downarrow" => "\u{21D3}", "\\Updownarrow" => "\u{21D5}",
    "\\ulcorner" => "\u{231C}", "\\urcorner" => "\u{231D}",
    "\\llcorner" => "\u{231E}", "\\lrcorner" => "\u{231F}",
    "\\lgroup" => "\u{27EE}", "\\rgroup" => "\u{27EF}",
    "\\lmoustache" => "\u{23B0}", "\\rmoustache" => "\u{23B1}",
};

/// Look up a delimiter by how it is written.
#[inline]
pub(crate) fn delimiter(name: &str) -> Option<&'static str> {
    DELIMITERS.get(name).copied()
}

/// Characters that are replaced when they appear as operators.
pub(crate) fn remap(c: char) -> char {
    match c {
        '-' => '\u{2212}',
        '*' => '\u{2217}',
        '`' => '\u{2018}',
        _ => c,
    }
}

/// Negated forms used by `\not`.
pub(crate) static NOT_REMAP: phf::Map<char, char> = phf_map! {
    '←' => '↚', '→' => '↛', '↔' => '↮', '⇐' => '⇍', '⇒' => '⇏', '⇔' => '⇎',
    '∈' => '∉', '∋' => '∌', '∣' => '∤', '∥' => '∦', '∼' => '≁', '~' => '≁',
    '≃' => '≄', '≅' => '≇', '≈' => '≉', '≍' => '≭', '=' => '≠', '≡' => '≢',
    '<' => '≮', '>' => '≯', '≤' => '≰', '≥' => '≱', '≲' => '≴', '≳' => '≵',
    '≶' => '≸', '≷' => '≹', '≺' => '⊀', '≻' => '⊁', '⊂' => '⊄', '⊃' => '⊅',
    '⊆' => '⊈', '⊇' => '⊉', '⊢' => '⊬', '⊨' => '⊭', '⊩' => '⊮', '⊫' => '⊯',
    '≼' => '⋠', '≽' => '⋡', '⊑' => '⋢', '⊒' => '⋣', '⊲' => '⋪', '⊳' => '⋫',
    '⊴' => '⋬', '⊵' => '⋭', '∃' => '∄',
};

static OPERATOR_CLASS: phf::Map<char, TexClass> = phf_map! {
    '+' => TexClass::Bin, '−' => TexClass::Bin, '±' => TexClass::Bin, '∓' => TexClass::Bin,
    '×' => TexClass::Bin, '÷' => TexClass::Bin, '⋅' => TexClass::Bin, '∗' => TexClass::Bin,
    '⋆' => TexClass::Bin, '∘' => TexClass::Bin, '∙' => TexClass::Bin, '∩' => TexClass::Bin,
    '∪' => TexClass::Bin, '⊓' => TexClass::Bin, '⊔' => TexClass::Bin, '∨' => TexClass::Bin,
    '∧' => TexClass::Bin, '∖' => TexClass::Bin, '⊕' => TexClass::Bin, '⊖' => TexClass::Bin,
    '⊗' => TexClass::Bin, '⊘' => TexClass::Bin, '⊙' => TexClass::Bin, '⊎' => TexClass::Bin,
    '≀' => TexClass::Bin, '⋄' => TexClass::Bin, '†' => TexClass::Bin, '‡' => TexClass::Bin,
    '⨿' => TexClass::Bin, '△' => TexClass::Bin, '▽' => TexClass::Bin,
    '=' => TexClass::Rel, '<' => TexClass::Rel, '>' => TexClass::Rel, ':' => TexClass::Rel,
    '≤' => TexClass::Rel, '≥' => TexClass::Rel, '≠' => TexClass::Rel, '≡' => TexClass::Rel,
    '∼' => TexClass::Rel, '≃' => TexClass::Rel, '≈' => TexClass::Rel, '≅' => TexClass::Rel,
    '≍' => TexClass::Rel, '∝' => TexClass::Rel, '⊂' => TexClass::Rel, '⊃' => TexClass::Rel,
    '⊆' => TexClass::Rel, '⊇' => TexClass::Rel, '∈' => TexClass::Rel, '∋' => TexClass::Rel,
    '∉' => TexClass::Rel, '≺' => TexClass::Rel, '≻' => TexClass::Rel, '⪯' => TexClass::Rel,
    '⪰' => TexClass::Rel, '≪' => TexClass::Rel, '≫' => TexClass::Rel, '⊥' => TexClass::Rel,
    '∣' => TexClass::Rel, '∥' => TexClass::Rel, '⊨' => TexClass::Rel, '⊢' => TexClass::Rel,
    '⊣' => TexClass::Rel, '≐' => TexClass::Rel, '⋈' => TexClass::Rel, '⌣' => TexClass::Rel,
    '⌢' => TexClass::Rel, '⊑' => TexClass::Rel, '⊒' => TexClass::Rel,
    '→' => TexClass::Rel, '←' => TexClass::Rel, '↔' => TexClass::Rel, '⇒' => TexClass::Rel,
    '⇐' => TexClass::Rel, '⇔' => TexClass::Rel, '⟶' => TexClass::Rel, '⟵' => TexClass::Rel,
    '⟷' => TexClass::Rel, '⟹' => TexClass::Rel, '⟸' => TexClass::Rel, '⟺' => TexClass::Rel,
    '↦' => TexClass::Rel, '⟼' => TexClass::Rel, '↪' => TexClass::Rel, '↩' => TexClass::Rel,
    '↗' => TexClass::Rel, '↘' => TexClass::Rel, '↙' => TexClass::Rel, '↖' => TexClass::Rel,
    '≮' => TexClass::Rel, '≯' => TexClass::Rel, '≰' => TexClass::Rel, '≱' => TexClass::Rel,
    '≢' => TexClass::Rel, '≉' => TexClass::Rel, '≁' => TexClass::Rel, '↛' => TexClass::Rel,
    '↚' => TexClass::Rel, '⇏' => TexClass::Rel, '⇍' => TexClass::Rel, '⊄' => TexClass::Rel,
    '⊅' => TexClass::Rel, '⊈' => TexClass::Rel, '⊉' => TexClass::Rel, '∌' => TexClass::Rel,
    '(' => TexClass::Open, '[' => TexClass::Open, '{' => TexClass::Open,
    '\u{27E8}' => TexClass::Open, '\u{2308}' => TexClass::Open, '\u{230A}' => TexClass::Open,
    '\u{231C}' => TexClass::Open, '\u{231E}' => TexClass::Open,
    ')' => TexClass::Close, ']' => TexClass::Close, '}' => TexClass::Close,
    '\u{27E9}' => TexClass::Close, '\u{2309}' => TexClass::Close, '\u{230B}' => TexClass::Close,
    '\u{231D}' => TexClass::Close, '\u{231F}' => TexClass::Close,
    '!' => TexClass::Close, '?' => TexClass::Close,
    ',' => TexClass::Punct, ';' => TexClass::Punct,
    '∑' => TexClass::Op, '∏' => TexClass::Op, '∐' => TexClass::Op, '⋃' => TexClass::Op,
    '⋂' => TexClass::Op, '⋁' => TexClass::Op, '⋀' => TexClass::Op, '⨁' => TexClass::Op,
    '⨂' => TexClass::Op, '⨀' => TexClass::Op, '⨄' => TexClass::Op, '⨆' => TexClass::Op,
    '∫' => TexClass::Op, '∬' => TexClass::Op, '∭' => TexClass::Op, '∮' => TexClass::Op,
    '\u{2061}' => TexClass::None,
};

/// The TeX class of an operator made from `text`.
pub(crate) fn operator_class(text: &str) -> TexClass {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => OPERATOR_CLASS.get(&c).copied().unwrap_or(TexClass::Ord),
        _ => TexClass::Ord,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_delimiters() {
        assert_eq!(delimiter("\\ulcorner"), Some("\u{231C}"));
        assert_eq!(delimiter("\\urcorner"), Some("\u{231D}"));
        assert_eq!(delimiter("x"), None);
        assert_eq!(operator_class("\u{231C}"), TexClass::Open);
        assert_eq!(operator_class("\u{231D}"), TexClass::Close);
    }

    #[test]
    fn operator_classes() {
        assert_eq!(operator_class("="), TexClass::Rel);
        assert_eq!(operator_class("+"), TexClass::Bin);
        assert_eq!(operator_class(","), TexClass::Punct);
        assert_eq!(operator_class("/"), TexClass::Ord);
        assert_eq!(operator_class("lim"), TexClass::Ord);
    }

    #[test]
    fn negations() {
        assert_eq!(NOT_REMAP.get(&'='), Some(&'≠'));
        assert_eq!(NOT_REMAP.get(&'x'), None);
        assert_eq!(remap('-'), '−');
    }
}
