//! Docscribe - Generate Markdown API docs for PHP codebases
//!
//! Walks a PHP source tree, extracts classes and methods with tree-sitter,
//! asks a language model to document each one, and writes a single
//! Markdown file.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{discover_files, Extraction, Extractor};
pub use config::Config;
pub use error::{BackendError, Error, Result};
pub use llm::{build_prompt, CompletionBackend, CompletionClient, RetryPolicy, SegmentKind};
pub use output::{AssemblyReport, Document, DocumentAssembler, DocumentSettings};
pub use parser::{ClassParser, ClassRecord, MethodRecord, ParseFailure, PhpParser};
