//! Indentation-sensitive, schema-driven configuration file parser.
//!
//! Input is a tree of `name:` sections and options, where nesting is
//! given by indentation. Identifiers are resolved against a caller
//! supplied [`Schema`] while lexing, and the schema's callbacks are
//! invoked as sections, options and values are seen.
//!
//! ```text
//! # zones
//! zone:
//!     file: db.example.com
//!     class: IN internal=yes
//! include: zones.d/*.conf
//! ```
#[macro_use]
extern crate log;

mod cfg;
mod class;
mod error;
mod file;
mod include;
mod parser;
mod schema;
mod scope;
mod tokenizer;
mod tokens;

pub use cfg::{parse_bytes, parse_file, parse_str, Builder};
pub use error::{Error, ErrorKind, Result};
pub use include::{Canonicalize, FileFinder, FileKind, FoundFile, GlobFinder, PathResolver};
pub use schema::{Callback, Lexeme, NodeKind, Schema, SchemaNode};
pub use tokenizer::TokenPos;
