use bitflags::bitflags;
use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::IntoStaticStr;

/// The TeX classes that drive spacing and script placement.
///
/// The discriminants are the ordinals used by lookup tables indexed by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[repr(u8)]
pub enum TexClass {
    #[strum(serialize = "ORD")]
    Ord = 0,
    #[strum(serialize = "OP")]
    Op = 1,
    #[strum(serialize = "BIN")]
    Bin = 2,
    #[strum(serialize = "REL")]
    Rel = 3,
    #[strum(serialize = "OPEN")]
    Open = 4,
    #[strum(serialize = "CLOSE")]
    Close = 5,
    #[strum(serialize = "PUNCT")]
    Punct = 6,
    #[strum(serialize = "INNER")]
    Inner = 7,
    #[strum(serialize = "VCENTER")]
    Vcenter = 8,
    #[strum(serialize = "NONE")]
    None = 9,
}

impl TexClass {
    #[inline]
    pub fn as_str(self) -> &'static str {
        <&'static str>::from(self)
    }
}

bitflags! {
    /// Parser-only metadata attached to a node. Never serialized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct Props: u8 {
        /// Limits of this operator are stacked in display style only.
        const MOVABLE_LIMITS = 1;
        /// Scripts on this node go above/below instead of to the side.
        const MOVE_SUP_SUB = 1 << 1;
        /// A second script of the same kind is allowed (e.g. after `\limits`).
        const SUB_SUP_OK = 1 << 2;
        /// The node names a function, so an `ApplyFunction` may follow.
        const FN_OP = 1 << 3;
    }
}

/// Attributes of a node.
///
/// Explicit attributes keep their insertion order, which is also their serialization order.
/// Inherited attributes are only visible through [`Attributes::get`] and are not serialized.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Attributes {
    explicit: Vec<(&'static str, String)>,
    inherited: FxHashMap<&'static str, String>,
}

impl Attributes {
    /// Set an explicit attribute, replacing an earlier value in place.
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.explicit.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.explicit.push((name, value)),
        }
    }

    /// Set a value that this node inherits from its ancestors. Explicit values shadow it.
    pub fn set_inherited(&mut self, name: &'static str, value: impl Into<String>) {
        self.inherited.insert(name, value.into());
    }

    /// The explicit value if there is one, else the inherited one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_explicit(name).or_else(|| self.get_inherited(name))
    }

    pub fn get_explicit(&self, name: &str) -> Option<&str> {
        self.explicit
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_inherited(&self, name: &str) -> Option<&str> {
        self.inherited.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.explicit.iter().position(|(n, _)| *n == name)?;
        Some(self.explicit.remove(idx).1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.explicit.iter().map(|(n, v)| (*n, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_shadows_inherited() {
        let mut attrs = Attributes::default();
        attrs.set_inherited("mathvariant", "bold");
        assert_eq!(attrs.get("mathvariant"), Some("bold"));
        assert_eq!(attrs.get_explicit("mathvariant"), None);
        attrs.set("mathvariant", "normal");
        assert_eq!(attrs.get("mathvariant"), Some("normal"));
        assert_eq!(attrs.get_inherited("mathvariant"), Some("bold"));
    }

    #[test]
    fn set_keeps_order() {
        let mut attrs = Attributes::default();
        attrs.set("fence", "true");
        attrs.set("stretchy", "true");
        attrs.set("fence", "false");
        let collected: Vec<_> = attrs.iter().collect();
        assert_eq!(collected, vec![("fence", "false"), ("stretchy", "true")]);
        assert_eq!(attrs.remove("fence").as_deref(), Some("false"));
        assert_eq!(attrs.iter().count(), 1);
    }

    #[test]
    fn class_names() {
        assert_eq!(TexClass::Rel.as_str(), "REL");
        assert_eq!(TexClass::None as u8, 9);
    }
}
