//! The MathML expression tree produced by `tex2mml`, and its serialization.
pub mod ast;
pub mod attribute;
mod emit;
pub mod fmt;
pub mod length;
pub mod table;

pub use ast::{Kind, Node};
pub use attribute::{Attributes, Props, TexClass};

static_assertions::assert_impl_all!(Node: Send, Sync);
