use std::{
    io::Read,
    path::{Path, PathBuf},
};

use clap::Parser;

use tex2mml::{Converter, MathDisplay, Node, TexError};

mod config_file;
mod replace;

use replace::{Piece, Splitter, line_and_col};

/// Converts TeX formulas to MathML
#[derive(Parser, Debug)]
#[command(version, about = "Converts TeX formulas to MathML", long_about = None)]
struct Args {
    /// A document with formulas between delimiters; `-` reads it from stdin
    #[arg(conflicts_with = "formula", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Reads the converter configuration from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sets the custom delimiter for inline formulas
    #[arg(
        long,
        default_value = "$",
        conflicts_with = "formula",
        value_name = "STR"
    )]
    inline_del: String,

    /// Sets the custom delimiter for block formulas
    #[arg(
        long,
        default_value = "$$",
        conflicts_with = "formula",
        value_name = "STR"
    )]
    block_del: String,

    /// Sets the custom opening delimiter for inline formulas
    #[arg(
        long,
        conflicts_with = "inline_del",
        requires = "inline_close",
        value_name = "STR"
    )]
    inline_open: Option<String>,

    /// Sets the custom closing delimiter for inline formulas
    #[arg(
        long,
        conflicts_with = "inline_del",
        requires = "inline_open",
        value_name = "STR"
    )]
    inline_close: Option<String>,

    /// Sets the custom opening delimiter for block formulas
    #[arg(
        long,
        conflicts_with = "block_del",
        requires = "block_close",
        value_name = "STR"
    )]
    block_open: Option<String>,

    /// Sets the custom closing delimiter for block formulas
    #[arg(
        long,
        conflicts_with = "block_del",
        requires = "block_open",
        value_name = "STR"
    )]
    block_close: Option<String>,

    /// If true, delimiters are ignored that are preceded by a backslash
    #[arg(long, conflicts_with = "formula")]
    ignore_escaped_delim: bool,

    /// If true, formulas with errors are output as `merror` and conversion continues
    #[arg(long, conflicts_with = "formula")]
    continue_on_error: bool,

    /// Specifies a single TeX formula
    #[arg(short, long, conflicts_with = "file")]
    formula: Option<String>,

    /// Sets the display style for the formula to "inline"
    #[arg(short, long, conflicts_with = "file", group = "mode")]
    inline: bool,

    /// Sets the display style for the formula to "block"
    #[arg(short, long, conflicts_with = "file", group = "mode")]
    block: bool,
}

fn main() {
    let args = Args::parse();
    let config = match args.config {
        Some(ref path) => config_file::load_config_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading '{}': {}", path.display(), e);
            std::process::exit(1);
        }),
        None => config_file::Config::default(),
    };
    let mut converter = Converter::new(config.tex2mml).unwrap_or_else(|(e, idx, definition)| {
        eprintln!("Invalid macro #{} ({:?}): {}", idx + 1, definition, e);
        std::process::exit(1);
    });

    if let Some(ref fpath) = args.file {
        let input = if fpath == &PathBuf::from("-") {
            read_stdin()
        } else {
            std::fs::read_to_string(fpath).unwrap_or_else(|e| exit_io_error(e))
        };
        let inline_delim: (&str, &str) = match (&args.inline_open, &args.inline_close) {
            (Some(open), Some(close)) => (open, close),
            _ => (&args.inline_del, &args.inline_del),
        };
        let block_delim: (&str, &str) = match (&args.block_open, &args.block_close) {
            (Some(open), Some(close)) => (open, close),
            _ => (&args.block_del, &args.block_del),
        };
        let splitter = Splitter::new(inline_delim, block_delim, args.ignore_escaped_delim);
        let path = (fpath != &PathBuf::from("-")).then_some(fpath.as_path());
        let output = convert_document(
            &splitter,
            &input,
            &mut converter,
            args.continue_on_error,
            path,
        );
        print!("{output}");
    } else {
        let display = if args.block {
            MathDisplay::Block
        } else {
            MathDisplay::Inline
        };
        let tex = match args.formula {
            Some(ref formula) => formula.clone(),
            None => read_stdin(),
        };
        match convert_formula(&tex, display, &mut converter) {
            Ok(mathml) => println!("{mathml}"),
            Err(e) => exit_tex_error(&e, None, None),
        }
    }
}

fn read_stdin() -> String {
    let mut buffer = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
        exit_io_error(e);
    }
    buffer
}

/// Converts a single formula, including the second pass for references to its own labels.
fn convert_formula(
    tex: &str,
    display: MathDisplay,
    converter: &mut Converter,
) -> Result<String, Box<TexError>> {
    let first = converter.translate(tex, display);
    if let Some(error) = first.error {
        return Err(error);
    }
    let root = converter
        .rerun_pending()
        .pop()
        .map_or(first.root, |rerun| rerun.root);
    Ok(converter.to_mathml(&root))
}

/// Replaces all formulas in a document with MathML.
///
/// All formulas are translated in document order, so that equation numbers follow the
/// document. Formulas that referenced a label defined further down are translated again
/// once the whole document has been seen.
fn convert_document(
    splitter: &Splitter,
    input: &str,
    converter: &mut Converter,
    continue_on_error: bool,
    fp: Option<&Path>,
) -> String {
    let pieces = splitter.split(input).unwrap_or_else(|e| {
        eprint_location(fp);
        eprintln!("{e}");
        std::process::exit(2);
    });

    // The converter's translation index of each formula, with its tree.
    let mut formulas: Vec<(usize, Node)> = Vec::new();
    for piece in &pieces {
        if let Piece::Math {
            tex,
            display,
            offset,
        } = *piece
        {
            let translation = converter.translate(tex, display);
            if let Some(ref error) = translation.error {
                if !continue_on_error {
                    exit_tex_error(error, fp, Some((offset, input)));
                }
            }
            formulas.push((translation.index, translation.root));
        }
    }
    for rerun in converter.rerun_pending() {
        if let Some(slot) = formulas.iter_mut().find(|(idx, _)| *idx == rerun.index) {
            slot.1 = rerun.root;
        }
    }

    let mut output = String::with_capacity(input.len());
    let mut formulas = formulas.into_iter();
    for piece in pieces {
        match piece {
            Piece::Text(text) => output.push_str(text),
            Piece::Math { .. } => {
                if let Some((_, root)) = formulas.next() {
                    output.push_str(&converter.to_mathml(&root));
                }
            }
        }
    }
    output
}

fn eprint_location(fp: Option<&Path>) {
    if let Some(fp) = fp {
        eprint!("In '{}': ", fp.display());
    }
}

fn exit_tex_error(e: &TexError, fp: Option<&Path>, at: Option<(usize, &str)>) -> ! {
    eprint!("Conversion error");
    if let Some(fp) = fp {
        eprint!(" in '{}'", fp.display());
    }
    if let Some((offset, input)) = at {
        let (line, col) = line_and_col(offset, input);
        eprint!(" at line {line}, column {col}");
    }
    eprintln!(": {} ({})", e, e.id());
    std::process::exit(2);
}

fn exit_io_error(e: std::io::Error) -> ! {
    eprintln!("IO Error: {e}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use tex2mml::{Config, Converter, MathDisplay, TagMode};

    use crate::replace::Splitter;

    fn ams() -> Converter {
        Converter::new(Config {
            tags: TagMode::Ams,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn document() {
        let text = r"Consider $x^2$ and
$$\frac{a}{b}$$
done.";
        let mut converter = Converter::new(Config::default()).unwrap();
        let splitter = Splitter::new(("$", "$"), ("$$", "$$"), false);
        let output = crate::convert_document(&splitter, text, &mut converter, false, None);
        assert_eq!(
            output,
            "Consider <math><msup><mi>x</mi><mn>2</mn></msup></math> and\n<math display=\"block\"><mfrac><mi>a</mi><mi>b</mi></mfrac></math>\ndone."
        );
    }

    #[test]
    fn forward_references_in_documents() {
        let text = r"See $\ref{last}$.
$$\begin{equation}x\end{equation}$$
$$\begin{equation}y\label{last}\end{equation}$$";
        let mut converter = ams();
        let splitter = Splitter::new(("$", "$"), ("$$", "$$"), false);
        let output = crate::convert_document(&splitter, text, &mut converter, false, None);
        assert!(output.starts_with("See <math>"));
        assert!(!output.contains("???"));
        assert!(output.contains("(2)"));
        assert_eq!(converter.pending_count(), 0);
    }

    #[test]
    fn errors_stay_in_place() {
        let mut converter = Converter::new(Config::default()).unwrap();
        let splitter = Splitter::new(("$", "$"), ("$$", "$$"), false);
        let output = crate::convert_document(&splitter, "$x^1^2$ $y$", &mut converter, true, None);
        assert!(output.starts_with("<math><merror"));
        assert!(output.ends_with(" <math><mi>y</mi></math>"));
    }

    #[test]
    fn formula_with_its_own_label() {
        let mut converter = ams();
        let mathml = crate::convert_formula(
            r"\begin{align}a\label{p}\\b=\ref{p}\end{align}",
            MathDisplay::Block,
            &mut converter,
        )
        .unwrap();
        assert!(mathml.contains("<mtext>1</mtext>"));
        assert!(!mathml.contains("???"));
    }
}
