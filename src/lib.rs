//! Visitor-based traversal and rewriting of ECMAScript syntax trees.
//!
//! A [`Walker`] drives a [`Visitor`] over an arena-backed [`Ast`], handing
//! each operation a persistent stack of per-node [`Metadata`] frames with the
//! variable scopes collected so far. [`BlockNormalizer`] is the rewriting
//! visitor shipped with the crate.

pub mod ast;
pub mod error;
pub mod hooks;
pub mod metadata;
pub mod passes;
pub mod source;
pub mod utils;
pub mod walker;

pub use ast::{Ast, NodeId, NodeKind};
pub use error::{Fault, HookError, WalkError};
pub use hooks::{Hook, HookRegistry};
pub use metadata::{Ancestors, Metadata, Scope};
pub use passes::{DefaultVisitor, Visitor, block_normalize::BlockNormalizer};
pub use walker::{WalkResult, Walker, WalkerConfig};
