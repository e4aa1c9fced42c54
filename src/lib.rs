//! # amiscript
//!
//! Interpreter for the Amiga Installer scripting language: a Lisp-like,
//! dynamically typed S-expression language used by installation scripts to
//! copy files, edit startup sequences, mutate icon metadata, and prompt the
//! user through a handful of dialogs.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ops       → built-in operators (~100, grouped by family)
//!   ↓
//! eval      → Evaluator: run/invoke/resolve, coercions, environment
//!   ↓
//! parser    → Logos lexer, recursive-descent S-expression parser
//!   ↓
//! ast       → arena node model, operator/option tags, builder API
//!   ↓
//! error     → error taxonomy, fault slot, trap bits
//!   ↓
//! dialog    → typed prompt backend (trait + headless AutoDialog)
//!   ↓
//! host      → file system, Amiga patterns, version scan, icons
//! ```
//!
//! The evaluator never depends on the parser; trees can be built through
//! the `ast` constructors alone. The parser exists so scripts can be run
//! from source text.

/// Host adapter: file system, pattern matching, version scan, icons
pub mod host;

/// Dialog backend: typed prompts, headless implementation
pub mod dialog;

/// Error taxonomy, fault slot, trap bits
pub mod error;

/// Arena node model, operator and option tags, builder API
pub mod ast;

/// Logos lexer and recursive-descent parser for the S-expression syntax
pub mod parser;

/// Evaluator: run/invoke/resolve, coercions, symbol environment
pub mod eval;

/// Built-in operators
pub mod ops;

// Re-export the types an embedder touches first.
pub use ast::{Node, NodeId, NodeKind, OpCode, OptTag, Tree};
pub use dialog::{AutoDialog, Dialog};
pub use error::{ErrorCode, Fault};
pub use eval::{Config, Evaluator, Outcome, Value};
pub use host::{FsHost, Host};
pub use parser::parse;
