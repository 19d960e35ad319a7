use insta::assert_snapshot;
use tex2mml::{Config, Converter, MathDisplay, PrettyPrint};

fn converter_with(macros: &[(&str, &str)]) -> Converter {
    let macros = macros
        .iter()
        .map(|(name, def)| ((*name).to_string(), (*def).to_string()))
        .collect();
    Converter::new(Config {
        macros,
        ..Default::default()
    })
    .unwrap()
}

fn convert(converter: &mut Converter, tex: &str) -> String {
    converter.convert(tex, MathDisplay::Inline).unwrap()
}

#[test]
fn zero_arg() {
    let mut converter = converter_with(&[("half", r"\frac{1}{2}")]);
    assert_snapshot!(
        convert(&mut converter, r"x\half"),
        @"<math><mi>x</mi><mfrac><mn>1</mn><mn>2</mn></mfrac></math>"
    );
}

#[test]
fn one_arg() {
    let mut converter = converter_with(&[("sq", r"#1^2")]);
    assert_snapshot!(
        convert(&mut converter, r"\sq{y}"),
        @"<math><msup><mi>y</mi><mn>2</mn></msup></math>"
    );
}

#[test]
fn pretty_printed() {
    let mut converter = Converter::new(Config {
        macros: vec![("half".to_string(), r"\frac{1}{2}".to_string())],
        pretty_print: PrettyPrint::Always,
        ..Default::default()
    })
    .unwrap();
    let mathml = converter.convert(r"\half", MathDisplay::Inline).unwrap();
    assert_snapshot!(mathml, @r"
    <math>
      <mfrac>
        <mn>1</mn>
        <mn>2</mn>
      </mfrac>
    </math>
    ");
}

#[test]
fn invalid_parameter() {
    let macros = vec![("mycmd".to_string(), r"\sqrt{#}".to_string())];
    let (error, idx, definition) = Converter::new(Config {
        macros,
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(error.id(), "IllegalMacroParameterReference");
    assert_eq!(idx, 0);
    assert_eq!(definition, r"\sqrt{#}");
}

#[test]
fn newcommand() {
    let mut converter = converter_with(&[]);
    assert_eq!(
        convert(&mut converter, r"\newcommand{\pair}[2]{#2#1}\pair{a}{b}"),
        convert(&mut converter, "ba")
    );
    // Definitions outlive the formula they were made in.
    assert_eq!(convert(&mut converter, r"\pair{1}{x}"), convert(&mut converter, "x1"));
}

#[test]
fn newcommand_with_default() {
    let mut converter = converter_with(&[]);
    let defined = convert(
        &mut converter,
        r"\newcommand{\e}[2][e]{#1^{#2}}\e{x}\e[y]{z}",
    );
    assert_eq!(defined, convert(&mut converter, "e^{x}y^{z}"));
}

#[test]
fn def_and_let() {
    let mut converter = converter_with(&[]);
    assert_eq!(
        convert(&mut converter, r"\def\f#1#2{#1+#2}\f ab"),
        convert(&mut converter, "a+b")
    );
    assert_eq!(
        convert(&mut converter, r"\let\plus=+ 1\plus2"),
        convert(&mut converter, "1+2")
    );
    assert_eq!(
        convert(&mut converter, r"\let\fraction\frac \fraction12"),
        convert(&mut converter, r"\frac12")
    );
}

#[test]
fn let_follows_redefinitions_of_macros() {
    let mut converter = converter_with(&[]);
    convert(&mut converter, r"\def\a{x}\let\b\a");
    convert(&mut converter, r"\def\a{y}");
    assert_eq!(convert(&mut converter, r"\b"), convert(&mut converter, "y"));
}

#[test]
fn let_to_an_undefined_name_is_ignored() {
    let mut converter = converter_with(&[]);
    assert_eq!(
        convert(&mut converter, r"\def\a{x}\let\a=\nope\a"),
        convert(&mut converter, "x")
    );
    assert_eq!(convert(&mut converter, r"\a"), convert(&mut converter, "x"));
}

#[test]
fn new_environment() {
    let mut converter = converter_with(&[]);
    assert_eq!(
        convert(
            &mut converter,
            r"\newenvironment{braced}{\left\{}{\right.}\begin{braced}x\end{braced}"
        ),
        convert(&mut converter, r"\left\{x\right.")
    );
    assert_eq!(
        convert(
            &mut converter,
            r"\newenvironment{scaled}[1]{#1\cdot}{}\begin{scaled}{2}x\end{scaled}"
        ),
        convert(&mut converter, r"2\cdot x")
    );
}

#[test]
fn recursion_is_bounded() {
    let mut converter = converter_with(&[]);
    let error = converter
        .try_translate(r"\newcommand{\x}{\x}\x", MathDisplay::Inline)
        .unwrap_err();
    assert_eq!(error.id(), "MaxMacroSubstitutionExceeded");

    let error = converter
        .try_translate(r"\def\a{x}\let\b\a\let\a\b\a", MathDisplay::Inline)
        .unwrap_err();
    assert_eq!(error.id(), "MaxMacroSubstitutionExceeded");

    let error = converter
        .try_translate(r"\def\g{\g\g}\g", MathDisplay::Inline)
        .unwrap_err();
    assert!(matches!(
        error.id(),
        "MaxBufferSizeExceeded" | "MaxMacroSubstitutionExceeded"
    ));
}

#[test]
fn config_macro_cycles_are_bounded() {
    let mut converter = converter_with(&[("a", r"\b"), ("b", r"\a")]);
    let error = converter.try_translate(r"\a", MathDisplay::Inline).unwrap_err();
    assert_eq!(error.id(), "MaxMacroSubstitutionExceeded");
}
