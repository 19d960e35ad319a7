//! Helpers for writing markup.

const INDENT: &str = "  ";

/// Start a new line indented by `indent_num` levels. An indent of zero means the output is
/// not pretty-printed, so nothing is written.
pub fn new_line_and_indent(s: &mut String, indent_num: usize) {
    if indent_num > 0 {
        s.push('\n');
    }
    for _ in 0..indent_num {
        s.push_str(INDENT);
    }
}

/// Escape `&`, `<` and `>` in text content.
pub fn escape_text(output: &mut String, input: &str) {
    let mut rest = input;
    while let Some(index) = memchr::memchr3(b'&', b'<', b'>', rest.as_bytes()) {
        let (before, after) = rest.split_at(index);
        output.push_str(before);
        let replacement = match after.as_bytes()[0] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            _ => "&gt;",
        };
        output.push_str(replacement);
        rest = &after[1..];
    }
    output.push_str(rest);
}

/// Escape a value that goes between double quotes.
pub fn escape_attribute(output: &mut String, input: &str) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escaping() {
        let mut output = "x: ".to_string();
        escape_text(&mut output, "a<b>c&d 世界 &");
        assert_eq!(output, "x: a&lt;b&gt;c&amp;d 世界 &amp;");
    }

    #[test]
    fn text_without_specials() {
        let mut output = String::new();
        escape_text(&mut output, "plain");
        assert_eq!(output, "plain");
    }

    #[test]
    fn attribute_escaping() {
        let mut output = String::new();
        escape_attribute(&mut output, r#"say "x<y" & go"#);
        assert_eq!(output, "say &quot;x&lt;y&quot; &amp; go");
    }

    #[test]
    fn indentation() {
        let mut s = String::new();
        new_line_and_indent(&mut s, 0);
        assert_eq!(s, "");
        new_line_and_indent(&mut s, 3);
        assert_eq!(s, "\n      ");
    }
}
