use std::fmt;

use memchr::memmem::Finder;

use tex2mml::MathDisplay;

/// A piece of a document: either plain text or a formula between delimiters.
#[derive(Debug, PartialEq)]
pub enum Piece<'source> {
    Text(&'source str),
    Math {
        tex: &'source str,
        display: MathDisplay,
        /// Byte offset of the opening delimiter.
        offset: usize,
    },
}

#[derive(Debug)]
pub struct DelimiterError<'source>(pub usize, pub DelimErrKind, pub &'source str);

#[derive(Debug)]
pub enum DelimErrKind {
    UnclosedDelimiter,
    NestedDelimiters,
    MismatchedDelimiters(usize),
}

impl fmt::Display for DelimiterError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (line, col) = line_and_col(self.0, self.2);
        match &self.1 {
            DelimErrKind::UnclosedDelimiter => {
                write!(f, "Unclosed delimiter on line {line}, column {col}.")
            }
            DelimErrKind::NestedDelimiters => {
                write!(
                    f,
                    "Nested delimiters are not allowed (on line {line}, column {col})."
                )
            }
            DelimErrKind::MismatchedDelimiters(close) => {
                let (close_line, close_col) = line_and_col(*close, self.2);
                write!(
                    f,
                    "Mismatched delimiters: opening at line {line}, column {col}, closing at line {close_line}, column {close_col}."
                )
            }
        }
    }
}

impl std::error::Error for DelimiterError<'_> {}

/// Determine line and column numbers of `loc` within the input string.
pub fn line_and_col(loc: usize, input: &str) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in input.char_indices() {
        if i >= loc {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

pub struct Splitter<'args> {
    opening_finders: (Finder<'args>, Finder<'args>),
    closing_finders: (Finder<'args>, Finder<'args>),
    opening_lengths: (usize, usize),
    closing_lengths: (usize, usize),
    closing_identical: bool,
    ignore_escaped_delim: bool,
}

impl<'args> Splitter<'args> {
    pub fn new(
        inline_delim: (&'args str, &'args str),
        block_delim: (&'args str, &'args str),
        ignore_escaped_delim: bool,
    ) -> Self {
        Self {
            opening_finders: (Finder::new(inline_delim.0), Finder::new(block_delim.0)),
            closing_finders: (Finder::new(inline_delim.1), Finder::new(block_delim.1)),
            opening_lengths: (inline_delim.0.len(), block_delim.0.len()),
            closing_lengths: (inline_delim.1.len(), block_delim.1.len()),
            closing_identical: inline_delim.1 == block_delim.1,
            ignore_escaped_delim,
        }
    }

    /// Splits a document into text and the formulas between inline and block delimiters.
    ///
    /// Delimiters may not nest.
    pub fn split<'source>(
        &self,
        input: &'source str,
    ) -> Result<Vec<Piece<'source>>, DelimiterError<'source>> {
        let mut pieces = Vec::new();
        let mut current_pos = 0;

        while current_pos < input.len() {
            let remaining = &input[current_pos..];

            let Some((open_typ, idx)) = self.find_next_delimiter(remaining, true) else {
                pieces.push(Piece::Text(remaining));
                break;
            };

            let open_pos = current_pos + idx;
            if open_pos > current_pos {
                pieces.push(Piece::Text(&input[current_pos..open_pos]));
            }
            let start = open_pos
                + match open_typ {
                    MathDisplay::Inline => self.opening_lengths.0,
                    MathDisplay::Block => self.opening_lengths.1,
                };

            let Some((close_typ, idx)) = self.find_next_delimiter(&input[start..], false) else {
                return Err(DelimiterError(
                    open_pos,
                    DelimErrKind::UnclosedDelimiter,
                    input,
                ));
            };

            if !self.closing_identical && open_typ != close_typ {
                return Err(DelimiterError(
                    open_pos,
                    DelimErrKind::MismatchedDelimiters(start + idx),
                    input,
                ));
            }

            let end = start + idx;
            let content = &input[start..end];
            if let Some((_, idx)) = self.find_next_delimiter(content, true) {
                return Err(DelimiterError(
                    start + idx,
                    DelimErrKind::NestedDelimiters,
                    input,
                ));
            }
            pieces.push(Piece::Math {
                tex: content,
                display: open_typ,
                offset: open_pos,
            });

            current_pos = end
                + match close_typ {
                    MathDisplay::Inline => self.closing_lengths.0,
                    MathDisplay::Block => self.closing_lengths.1,
                };
        }

        Ok(pieces)
    }

    /// Finds the next occurrence of either an inline or block delimiter.
    fn find_next_delimiter(&self, input: &str, opening: bool) -> Option<(MathDisplay, usize)> {
        let input = input.as_bytes();
        let (finders, lengths) = if opening {
            (&self.opening_finders, self.opening_lengths)
        } else {
            (&self.closing_finders, self.closing_lengths)
        };

        let inline_result = self.find_delimiter_position(input, &finders.0, lengths.0);
        let block_result = self.find_delimiter_position(input, &finders.1, lengths.1);

        // Block delimiters win ties, so that `$$` isn't read as two `$`.
        match (inline_result, block_result) {
            (Some(inline_pos), Some(block_pos)) => {
                if block_pos <= inline_pos {
                    Some((MathDisplay::Block, block_pos))
                } else {
                    Some((MathDisplay::Inline, inline_pos))
                }
            }
            (Some(pos), None) => Some((MathDisplay::Inline, pos)),
            (None, Some(pos)) => Some((MathDisplay::Block, pos)),
            (None, None) => None,
        }
    }

    fn find_delimiter_position(
        &self,
        input: &[u8],
        finder: &Finder,
        delimiter_len: usize,
    ) -> Option<usize> {
        if !self.ignore_escaped_delim {
            return finder.find(input);
        }

        let mut offset = 0;
        while let Some(relative_pos) = finder.find(&input[offset..]) {
            let absolute_pos = offset + relative_pos;
            if absolute_pos > 0 && input[absolute_pos - 1] == b'\\' {
                offset = absolute_pos + delimiter_len;
                continue;
            }
            return Some(absolute_pos);
        }
        None
    }
}
