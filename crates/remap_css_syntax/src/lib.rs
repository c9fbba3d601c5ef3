//! Tolerant CSS syntax tree used by `remap_css`.
//!
//! The tree is deliberately small: rules, at-rules, declarations and comments.
//! Parsing never fails, malformed fragments are skipped, and the
//! [`stringifier`] writes the tree back out in either a compact or a
//! stylistic layout.

pub mod ast;
pub mod list;
mod parse;
pub mod stringifier;
pub mod value_parser;

pub use ast::{AtRule, Comment, Declaration, Node, Root, Rule};
pub use parse::{declaration, parse, split_important, Stop, Tokenizer};
pub use stringifier::{stringify, FormatOptions};
