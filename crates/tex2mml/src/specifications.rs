//! Functions for parsing specifications in LaTeX commands.

use tex2mml_tree::table::{ColumnAlign, Frame, LineType};

/// A parsed `array` column specification such as `|c|l:r|`.
#[derive(Debug, PartialEq)]
pub(crate) struct ColumnSpec {
    /// Value for `columnalign`.
    pub align: String,
    pub frame: Frame,
    /// Whether the outer frame is dashed.
    pub dashed: bool,
    /// Value for `columnlines`, if there are any lines.
    pub lines: Option<String>,
}

#[inline]
fn line(c: char) -> Option<LineType> {
    LineType::from_char(c)
}

pub(crate) fn parse_column_specification(spec: &str) -> ColumnSpec {
    let align = spec
        .chars()
        .filter_map(ColumnAlign::from_char)
        .map(ColumnAlign::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    // A line belongs to the column before it; runs of lines count as one.
    let filtered: Vec<char> = std::iter::once('c')
        .chain(spec.chars())
        .filter(|c| ColumnAlign::from_char(*c).is_some() || line(*c).is_some())
        .collect();
    let mut columns = Vec::with_capacity(filtered.len());
    let mut i = 0;
    while i < filtered.len() {
        let c = filtered[i];
        let mut j = i + 1;
        if line(c).is_none() {
            while j < filtered.len() && line(filtered[j]).is_some() {
                j += 1;
            }
        }
        columns.push(filtered[j - 1]);
        i = j;
    }

    let mut result = ColumnSpec {
        align,
        frame: Frame::empty(),
        dashed: false,
        lines: None,
    };
    if !columns.iter().any(|c| line(*c).is_some()) {
        return result;
    }
    if let Some(&first) = columns.first() {
        if line(first).is_some() {
            result.frame |= Frame::LEFT;
            result.dashed = first == ':';
        }
    }
    if columns.last().is_some_and(|c| line(*c).is_some()) {
        result.frame |= Frame::RIGHT;
    }
    if columns.len() > 2 {
        let inner = &columns[1..columns.len() - 1];
        result.lines = Some(
            inner
                .iter()
                .map(|c| line(*c).unwrap_or_default().as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    result
}

/// The `align` attribute for the optional `[t]`, `[c]` or `[b]` argument of a table.
pub(crate) fn parse_vertical_align(spec: &str) -> Option<String> {
    match spec.trim() {
        "" => None,
        "t" => Some("baseline 1".to_string()),
        "b" => Some("baseline -1".to_string()),
        "c" => Some("axis".to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_columns() {
        let spec = parse_column_specification("lcr");
        assert_eq!(spec.align, "left center right");
        assert_eq!(spec.frame, Frame::empty());
        assert_eq!(spec.lines, None);
    }

    #[test]
    fn inner_lines() {
        let spec = parse_column_specification("c|cc");
        assert_eq!(spec.align, "center center center");
        assert_eq!(spec.lines.as_deref(), Some("solid none"));
        assert!(spec.frame.is_empty());

        let spec = parse_column_specification("c:c||c");
        assert_eq!(spec.lines.as_deref(), Some("dashed solid"));
    }

    #[test]
    fn outer_lines_become_frame() {
        let spec = parse_column_specification("|c|c|");
        assert_eq!(spec.frame, Frame::LEFT | Frame::RIGHT);
        assert!(!spec.dashed);
        assert_eq!(spec.lines.as_deref(), Some("solid"));

        let spec = parse_column_specification(":l r");
        assert_eq!(spec.frame, Frame::LEFT);
        assert!(spec.dashed);
        assert_eq!(spec.lines.as_deref(), Some("none"));
    }

    #[test]
    fn vertical_alignment() {
        assert_eq!(parse_vertical_align(" t ").as_deref(), Some("baseline 1"));
        assert_eq!(parse_vertical_align("b").as_deref(), Some("baseline -1"));
        assert_eq!(parse_vertical_align(""), None);
    }
}
