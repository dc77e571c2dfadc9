//! Source text to syntax tree.
//!
//! Only the eight command characters are significant; everything else is a
//! comment. The parser's one failure mode is malformed bracket structure,
//! reported as a [`SyntaxError`] carrying the offending position.

pub mod parser;
pub mod tree;

pub use bfwasm_core::SyntaxError;
pub use parser::parse;
pub use tree::{Command, Node, SyntaxTree};
