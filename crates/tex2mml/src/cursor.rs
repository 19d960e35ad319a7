//! A cursor over the TeX source that is currently being parsed.
//!
//! All reads move forward. The only way to revisit text is [`Cursor::splice`], which replaces
//! the unread remainder of the input (this is how macros expand).

use tex2mml_tree::length::{Dimension, match_dimension, parse_dimension};

use crate::error::{TexErrKind, TexError, err};
use crate::symbols;

pub(crate) struct Cursor {
    string: String,
    pos: usize,
    max_buffer: usize,
}

impl Cursor {
    pub fn new(string: impl Into<String>, max_buffer: usize) -> Self {
        Cursor {
            string: string.into(),
            pos: 0,
            max_buffer,
        }
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.string.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move back to a position returned by [`Cursor::pos`] earlier.
    #[inline]
    pub fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos);
        self.pos = pos;
    }

    /// The unread part of the input.
    #[inline]
    pub fn rest(&self) -> &str {
        &self.string[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the next character without consuming it.
    pub fn next_non_space(&mut self) -> Option<char> {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                return Some(c);
            }
            self.pos += c.len_utf8();
        }
        None
    }

    /// Read a control sequence name; the backslash has already been consumed.
    ///
    /// A name is a run of ASCII letters (one following space is skipped) or a single other
    /// character. At the end of the input the name is a single space.
    pub fn get_cs(&mut self) -> String {
        let letters = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        if letters > 0 {
            let name = self.rest()[..letters].to_string();
            self.pos += letters;
            if self.peek() == Some(' ') {
                self.pos += 1;
            }
            return name;
        }
        match self.next_char() {
            Some(c) => c.to_string(),
            None => " ".to_string(),
        }
    }

    /// Read a required argument: a single character, a control sequence, or a braced group
    /// (returned without the braces).
    pub fn get_arg(&mut self, name: &str) -> Result<String, Box<TexError>> {
        match self.get_arg_or_none()? {
            Some(arg) => Ok(arg),
            None => err(TexErrKind::MissingArgument(name.into())),
        }
    }

    /// Like [`Cursor::get_arg`], but returns `None` at the end of the input or at a group end.
    pub fn get_arg_or_none(&mut self) -> Result<Option<String>, Box<TexError>> {
        match self.next_non_space() {
            None | Some('}') => Ok(None),
            Some('\\') => {
                self.pos += 1;
                Ok(Some(format!("\\{}", self.get_cs())))
            }
            Some('{') => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 1usize;
                while let Some(c) = self.next_char() {
                    match c {
                        '\\' => {
                            self.next_char();
                        }
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(Some(self.string[start..self.pos - 1].to_string()));
                            }
                        }
                        _ => {}
                    }
                }
                err(TexErrKind::MissingCloseBrace)
            }
            Some(c) => {
                self.pos += c.len_utf8();
                Ok(Some(c.to_string()))
            }
        }
    }

    /// Read an optional argument in brackets. Braces inside the brackets nest.
    pub fn get_brackets(&mut self, name: &str) -> Result<Option<String>, Box<TexError>> {
        if self.next_non_space() != Some('[') {
            return Ok(None);
        }
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.next_char() {
            match c {
                '{' => depth += 1,
                '\\' => {
                    self.next_char();
                }
                '}' => {
                    if depth == 0 {
                        return err(TexErrKind::ExtraCloseLooking("']'".into()));
                    }
                    depth -= 1;
                }
                ']' if depth == 0 => {
                    return Ok(Some(self.string[start..self.pos - 1].to_string()));
                }
                _ => {}
            }
        }
        err(TexErrKind::MissingCloseBracket(name.into()))
    }

    /// Read a delimiter and return the character(s) it stands for. The null delimiter `.`
    /// yields an empty string.
    pub fn get_delimiter(&mut self, name: &str) -> Result<&'static str, Box<TexError>> {
        let delim = match self.next_non_space() {
            Some('\\') => {
                self.pos += 1;
                format!("\\{}", self.get_cs())
            }
            Some('{') => self.get_arg(name)?.trim().to_string(),
            Some(c) => {
                self.pos += c.len_utf8();
                c.to_string()
            }
            None => String::new(),
        };
        match symbols::delimiter(&delim) {
            Some(d) => Ok(d),
            None => err(TexErrKind::MissingOrUnrecognizedDelimiter(name.into())),
        }
    }

    /// Read a dimension, either braced or directly from the input.
    pub fn get_dimen(&mut self, name: &str) -> Result<Dimension, Box<TexError>> {
        let dimen = if self.next_non_space() == Some('{') {
            let arg = self.get_arg(name)?;
            parse_dimension(&arg)
        } else {
            match match_dimension(self.rest()) {
                Some((dim, used)) => {
                    self.pos += used;
                    Some(dim)
                }
                None => None,
            }
        };
        match dimen {
            Some(dim) => Ok(dim),
            None => err(TexErrKind::MissingDimensionOrUnits(name.into())),
        }
    }

    /// Read up to (not including) `token` at brace depth zero and skip the token.
    pub fn get_up_to(&mut self, name: &str, token: &str) -> Result<String, Box<TexError>> {
        self.next_non_space();
        let start = self.pos;
        let mut depth = 0usize;
        while !self.at_end() {
            self.next_non_space();
            let before = self.pos;
            let Some(c) = self.next_char() else {
                break;
            };
            let mut tok = c.to_string();
            match c {
                '\\' => tok.push_str(&self.get_cs()),
                '{' => depth += 1,
                '}' => {
                    if depth == 0 {
                        return err(TexErrKind::ExtraCloseLooking(token.into()));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            if depth == 0 && tok == token {
                return Ok(self.string[start..before].to_string());
            }
        }
        err(TexErrKind::TokenNotFound {
            token: token.into(),
            name: name.into(),
        })
    }

    /// Read a number starting at the character that was just consumed.
    pub fn number_from_prev(&mut self, prev: char) -> String {
        let start = self.pos - prev.len_utf8();
        let bytes = self.string.as_bytes();
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            let mut frac_end = end + 1;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if frac_end > end + 1 || end > start {
                end = frac_end;
            }
        }
        let end = end.max(self.pos);
        let number = self.string[start..end].to_string();
        self.pos = end;
        number
    }

    /// Read a run of ASCII letters starting at the character that was just consumed.
    pub fn letters_from_prev(&mut self, prev: char) -> String {
        let start = self.pos - prev.len_utf8();
        let letters = self.string[start..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count()
            .max(prev.len_utf8());
        self.pos = start + letters;
        self.string[start..self.pos].to_string()
    }

    /// Put a space after the digit at the front of the remaining input, so that a script
    /// only takes one digit.
    pub fn isolate_digit(&mut self) {
        if self.next_non_space().is_some_and(|c| c.is_ascii_digit()) {
            self.string.insert(self.pos + 1, ' ');
        }
    }

    /// Replace the unread input by `text` followed by the unread input.
    pub fn splice(&mut self, text: &str) -> Result<(), Box<TexError>> {
        let spliced = add_args(text, self.rest());
        if spliced.len() > self.max_buffer {
            return err(TexErrKind::MaxBufferSizeExceeded);
        }
        self.string = spliced;
        self.pos = 0;
        Ok(())
    }
}

/// Concatenate two pieces of TeX, inserting a space if `first` ends with a control word and
/// `second` starts with a letter.
pub(crate) fn add_args(first: &str, second: &str) -> String {
    let mut out = String::with_capacity(first.len() + second.len() + 1);
    out.push_str(first);
    if second.starts_with(|c: char| c.is_ascii_alphabetic()) && ends_with_control_word(first) {
        out.push(' ');
    }
    out.push_str(second);
    out
}

fn ends_with_control_word(s: &str) -> bool {
    let trimmed = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if trimmed.len() == s.len() || !trimmed.ends_with('\\') {
        return false;
    }
    // An even number of backslashes means the last one is escaped.
    let backslashes = trimmed.bytes().rev().take_while(|b| *b == b'\\').count();
    backslashes % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(s: &str) -> Cursor {
        Cursor::new(s, 1024)
    }

    #[test]
    fn control_sequence_names() {
        let mut c = cursor("alpha beta");
        assert_eq!(c.get_cs(), "alpha");
        assert_eq!(c.rest(), "beta");
        let mut c = cursor("{x");
        assert_eq!(c.get_cs(), "{");
        let mut c = cursor("");
        assert_eq!(c.get_cs(), " ");
    }

    #[test]
    fn arguments() {
        let mut c = cursor(" {a{b}\\}c} x \\beta y");
        assert_eq!(c.get_arg("f").unwrap(), "a{b}\\}c");
        assert_eq!(c.get_arg("f").unwrap(), "x");
        assert_eq!(c.get_arg("f").unwrap(), "\\beta");
        assert_eq!(c.rest(), "y");
    }

    #[test]
    fn missing_arguments() {
        let mut c = cursor("  ");
        assert_eq!(c.get_arg("\\frac").unwrap_err().id(), "MissingArgument");
        let mut c = cursor("}");
        assert_eq!(c.get_arg("\\frac").unwrap_err().id(), "MissingArgument");
        assert_eq!(c.get_arg_or_none().unwrap(), None);
        let mut c = cursor("{ab");
        assert_eq!(c.get_arg("\\frac").unwrap_err().id(), "MissingCloseBrace");
    }

    #[test]
    fn brackets() {
        let mut c = cursor("[a{]}b]x");
        assert_eq!(c.get_brackets("\\sqrt").unwrap().as_deref(), Some("a{]}b"));
        assert_eq!(c.rest(), "x");
        let mut c = cursor("x");
        assert_eq!(c.get_brackets("\\sqrt").unwrap(), None);
        let mut c = cursor("[abc");
        assert_eq!(c.get_brackets("\\sqrt").unwrap_err().id(), "MissingCloseBracket");
    }

    #[test]
    fn delimiters() {
        let mut c = cursor("\\langle x");
        assert_eq!(c.get_delimiter("\\left").unwrap(), "\u{27E8}");
        let mut c = cursor(".");
        assert_eq!(c.get_delimiter("\\left").unwrap(), "");
        let mut c = cursor("x");
        assert_eq!(
            c.get_delimiter("\\left").unwrap_err().id(),
            "MissingOrUnrecognizedDelimiter"
        );
    }

    #[test]
    fn dimensions() {
        let mut c = cursor("2.5pt x");
        assert_eq!(c.get_dimen("\\raise").unwrap().to_attribute(), "2.5pt");
        assert_eq!(c.rest(), " x");
        let mut c = cursor("{-1em}");
        assert_eq!(c.get_dimen("\\raise").unwrap().to_attribute(), "-1em");
        let mut c = cursor("3 apples");
        assert_eq!(
            c.get_dimen("\\raise").unwrap_err().id(),
            "MissingDimensionOrUnits"
        );
    }

    #[test]
    fn up_to_token() {
        let mut c = cursor("3 {\\of} \\of x");
        assert_eq!(c.get_up_to("\\root", "\\of").unwrap(), "3 {\\of} ");
        assert_eq!(c.rest(), "x");
        let mut c = cursor("3 x");
        assert_eq!(c.get_up_to("\\root", "\\of").unwrap_err().id(), "TokenNotFound");
    }

    #[test]
    fn numbers_and_letters() {
        let mut c = cursor("12.5+x");
        let first = c.next_char().unwrap();
        assert_eq!(c.number_from_prev(first), "12.5");
        assert_eq!(c.rest(), "+x");
        let mut c = cursor("abc1");
        let first = c.next_char().unwrap();
        assert_eq!(c.letters_from_prev(first), "abc");
    }

    #[test]
    fn splicing() {
        let mut c = cursor("\\foo x");
        c.get_cs();
        c.splice("\\alpha").unwrap();
        assert_eq!(c.rest(), "\\alpha x");
        let mut c = Cursor::new("abc", 5);
        assert_eq!(c.splice("defg").unwrap_err().id(), "MaxBufferSizeExceeded");
        let mut c = cursor("^12");
        c.next_char();
        c.isolate_digit();
        assert_eq!(c.rest(), "1 2");
    }

    #[test]
    fn control_words_get_separated() {
        assert_eq!(add_args("\\alpha", "b"), "\\alpha b");
        assert_eq!(add_args("\\\\", "b"), "\\\\b");
        assert_eq!(add_args("x", "b"), "xb");
        assert_eq!(add_args("\\alpha", "1"), "\\alpha1");
    }
}
