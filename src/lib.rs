//! Mergetree - flatten a directory tree into one Markdown document.
//!
//! Mergetree renders the visible directory structure and concatenates the
//! contents of recognized files into fenced, labelled sections, producing a
//! single artifact suitable for reading or feeding to language models.
//!
//! # Quick Start
//!
//! ```no_run
//! use mergetree::builder::MergeTree;
//!
//! let result = MergeTree::new("./my-project").build().unwrap();
//!
//! println!("{}", result.tree);
//! println!("{} files, {} unrecognized", result.records().len(), result.unrecognized().len());
//! std::fs::write("merged_output.md", result.document()).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`policy`] - Ignore rules merged from every `.gitignore` in the tree
//! - [`walker`] - Policy-filtered directory traversal
//! - [`tree`] - File tree representation and rendering
//! - [`language`] - File classification for code fences
//! - [`collect`] - Content collection pass
//! - [`output`] - Document assembly
//! - [`tokens`] - Token estimate for the written document
//! - [`builder`] - Fluent API tying the passes together

pub mod policy;
pub mod language;
pub mod errors;
pub mod walker;
pub mod tree;
pub mod collect;
pub mod output;
pub mod tokens;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::{MergeResult, MergeTree, Summary};
pub use collect::{Collection, FileRecord, SkippedFile};
pub use errors::MergeError;
pub use language::{Classifier, Language, UnknownMode};
pub use output::OutputError;
pub use policy::{IgnoreRule, PatternPolicy, RuleMatch};
pub use tree::{FileNode, NodeKind};
pub use walker::WalkError;
