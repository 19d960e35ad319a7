use tex2mml::{Config, Converter, Kind, MathDisplay, TagMode};

fn error_id(tex: &str) -> &'static str {
    let mut converter = Converter::new(Config {
        tags: TagMode::Ams,
        ..Default::default()
    })
    .unwrap();
    match converter.try_translate(tex, MathDisplay::Block) {
        Ok(_) => panic!("{tex:?} translated without an error"),
        Err(error) => error.id(),
    }
}

#[test]
fn main() {
    let problems = [
        ("double_exponent", "x^1^2", "DoubleExponent"),
        ("double_exponent_braced", "x^{1}^{2}", "DoubleExponent"),
        ("double_subscripts", "x_1_2", "DoubleSubscripts"),
        ("prime_after_exponent", "x^2'", "DoubleExponentPrime"),
        ("incomplete_sup", "x^", "MissingScript"),
        ("unclosed_brace", "{x", "ExtraOpenMissingClose"),
        ("extra_close", "x}", "ExtraCloseMissingOpen"),
        ("unclosed_left", r"\left( x", "ExtraLeftOrMissingRight"),
        ("right_without_left", r"x \right)", "MissingLeftOrExtraRight"),
        ("orphan_middle", r"a \middle| b", "OrphanMiddle"),
        ("bad_delimiter", r"\left x \right)", "MissingOrUnrecognizedDelimiter"),
        ("unclosed_env", r"\begin{matrix} x", "EnvMissingEnd"),
        ("mismatched_env", r"\begin{matrix} x \end{pmatrix}", "EnvBadEnd"),
        ("end_without_begin", r"\end{matrix}", "MissingBeginExtraEnd"),
        ("unknown_env", r"\begin{xmatrix} x \end{xmatrix}", "UnknownEnvironment"),
        ("unknown_command", r"\asdf", "UndefinedControlSequence"),
        ("frac_missing_argument", r"\frac{a}", "MissingArgument"),
        ("unclosed_argument", r"\frac{a", "MissingCloseBrace"),
        ("unclosed_bracket", r"\sqrt[3", "MissingCloseBracket"),
        ("ambiguous_over", r"a \over b \over c", "AmbiguousUseOf"),
        ("hash", "#", "CantUseHash"),
        ("ampersand_outside_table", "a & b", "Misplaced"),
        ("hline_outside_table", r"\hline", "Misplaced"),
        ("unterminated_text_math", r"\text{$x}", "MathNotTerminated"),
        ("limits_on_identifier", r"x\limits", "MisplacedLimits"),
        ("uproot_outside_root", r"\uproot{2}", "MisplacedMoveRoot"),
        ("non_integer_uproot", r"\sqrt[\uproot{a}3]{x}", "IntegerArg"),
        ("double_tag", r"x \tag{1} \tag{2}", "MultipleTag"),
        ("double_label", r"x \label{a} \label{b}", "MultipleCommand"),
        ("nested_align", r"\begin{align}\begin{align}x\end{align}\end{align}", "ErroneousNesting"),
        ("align_in_equation", r"\begin{equation}\begin{align}x\end{align}\end{equation}", "ErroneousNesting"),
        ("zero_alignat", r"\begin{alignat}{0}x\end{alignat}", "PositiveIntegerArgumentRequired"),
        ("multline_columns", r"\begin{multline}a&b\end{multline}", "MultlineRowsMustHaveOneColumn"),
        ("shove_outside_multline", r"\shoveright x", "CommandOnlyAllowedInEnv"),
        ("shove_mid_line", r"\begin{multline}a\shoveleft b\end{multline}", "CommandMustComeAtBeginningOfLine"),
        ("bad_genfrac_style", r"\genfrac(){0pt}{7}{a}{b}", "BadMathStyleFor"),
        ("bad_skip", r"\\[x]", "MissingDimensionOrUnits"),
        ("raise_without_box", r"{\raise{2pt}}", "MissingBoxFor"),
    ];

    let mut failures = Vec::new();
    for (name, tex, id) in problems {
        let found = error_id(tex);
        if found != id {
            failures.push(format!("{name}: {tex:?} gave {found}, expected {id}"));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn error_messages() {
    let mut converter = Converter::new(Config::default()).unwrap();
    let error = converter
        .try_translate(r"\asdf", MathDisplay::Inline)
        .unwrap_err();
    assert_eq!(error.message(), r"Undefined control sequence \asdf");
    assert_eq!(error.to_string(), error.message());

    let error = converter
        .try_translate(r"\begin{matrix}x\end{cases}", MathDisplay::Inline)
        .unwrap_err();
    assert_eq!(error.message(), r"\begin{matrix} ended with \end{cases}");
}

#[test]
fn errors_render_as_merror() {
    let mut converter = Converter::new(Config::default()).unwrap();
    let translation = converter.translate("x_1_2", MathDisplay::Block);
    assert_eq!(
        translation.error.as_ref().map(|e| e.id()),
        Some("DoubleSubscripts")
    );
    let merror = translation.root.child(0).unwrap();
    assert_eq!(merror.kind, Kind::Merror);
    assert_eq!(
        converter.to_mathml(&translation.root),
        r#"<math display="block"><merror data-mjx-error="Double subscripts: use braces to clarify"><mtext>Double subscripts: use braces to clarify</mtext></merror></math>"#
    );
}

#[test]
fn later_formulas_are_unaffected() {
    let mut converter = Converter::new(Config::default()).unwrap();
    assert!(converter.try_translate("{", MathDisplay::Inline).is_err());
    assert_eq!(
        converter.convert("x", MathDisplay::Inline).unwrap(),
        "<math><mi>x</mi></math>"
    );
}
