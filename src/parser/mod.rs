// Parser module for extracting class structure from source files

pub mod ast;
mod php;

pub use ast::*;
pub use php::PhpParser;

use crate::error::Result;

/// A language parser that can report the classes in a source text.
///
/// Implementations keep their syntax tree private; callers only ever see
/// [`ClassRecord`]s, delivered in source order.
pub trait ClassParser {
    /// File extensions this parser understands, without the dot
    fn extensions(&self) -> &[&'static str];

    /// Parse `source` and call `visit` once per class declaration.
    ///
    /// Fails without visiting anything if the source has a syntax error.
    fn for_each_class(&mut self, source: &str, visit: &mut dyn FnMut(ClassRecord)) -> Result<()>;
}
