/// Dialect-neutral SQL tree and its traversal.
///
/// This module provides the pipeline that every tailor runs inside:
///
/// ```text
/// SQL text
///       ↓
/// Parser (parser.rs)          sqlparser AST → neutral tree (types.rs)
///       ↓
/// Traversal (visitor.rs)      before/after hooks, slot replacement
///       ↓
/// Parent tracking (ancestry.rs)
///       ↓
/// SQL Compiler (compiler.rs)
/// ```
pub mod ancestry;
pub mod compiler;
pub mod parser;
pub mod types;
pub mod visitor;

// Re-export key types for convenience
pub use ancestry::{Ancestry, Frame, Traced, TracedVisitor};
pub use compiler::compile;
pub use parser::{parse_single, parse_sql};
pub use types::*;
pub use visitor::{walk_node, walk_statement, Action, Visitor};
