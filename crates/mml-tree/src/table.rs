use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "lowercase")]
pub enum ColumnAlign {
    Left,
    Center,
    Right,
}

impl ColumnAlign {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'l' => Some(ColumnAlign::Left),
            'c' => Some(ColumnAlign::Center),
            'r' => Some(ColumnAlign::Right),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        <&'static str>::from(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "lowercase")]
pub enum LineType {
    #[default]
    None,
    Solid,
    Dashed,
}

impl LineType {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '|' => Some(LineType::Solid),
            ':' => Some(LineType::Dashed),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        <&'static str>::from(self)
    }
}

bitflags! {
    /// The sides of a table that carry a border.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct Frame: u8 {
        const TOP = 1;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Frame {
    /// The `menclose` notation for a partial frame.
    pub fn notation(self) -> String {
        let mut parts = Vec::new();
        for (flag, name) in [
            (Frame::LEFT, "left"),
            (Frame::RIGHT, "right"),
            (Frame::TOP, "top"),
            (Frame::BOTTOM, "bottom"),
        ] {
            if self.contains(flag) {
                parts.push(name);
            }
        }
        parts.join(" ")
    }
}

/// Join line types the way `rowlines` and `columnlines` expect them.
pub fn join_lines(lines: &[LineType]) -> String {
    lines
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
